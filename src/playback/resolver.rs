use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::playback::ClipRequest;

/// Maps an opaque clip id to a playable file.
pub trait ClipResolver {
    fn resolve(&self, request: &ClipRequest) -> Result<PathBuf>;
}

/// Resolves `<root>/<id>.<ext>`, trying each extension in order.
#[derive(Debug, Clone)]
pub struct AssetDirectory {
    root: PathBuf,
    extensions: Vec<String>,
}

impl AssetDirectory {
    pub fn new(root: impl Into<PathBuf>, extensions: Vec<String>) -> Self {
        Self {
            root: root.into(),
            extensions,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ClipResolver for AssetDirectory {
    fn resolve(&self, request: &ClipRequest) -> Result<PathBuf> {
        let id = request.id();
        // Ids are bare names; anything that could escape the root is rejected.
        if id.is_empty() || id.contains(['/', '\\']) || id.starts_with('.') {
            return Err(Error::ResourceUnavailable(format!("invalid clip id {:?}", id)));
        }

        self.extensions
            .iter()
            .map(|ext| self.root.join(format!("{}.{}", id, ext)))
            .find(|candidate| candidate.is_file())
            .ok_or_else(|| {
                Error::ResourceUnavailable(format!(
                    "no asset for {} under {}",
                    id,
                    self.root.display()
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn exts() -> Vec<String> {
        vec!["ogg".to_string(), "wav".to_string()]
    }

    #[test]
    fn resolves_first_matching_extension() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("color_red.wav"), b"").unwrap();
        std::fs::write(dir.path().join("color_red.ogg"), b"").unwrap();

        let assets = AssetDirectory::new(dir.path(), exts());
        let path = assets.resolve(&ClipRequest::new("color_red")).unwrap();

        assert_eq!(path, dir.path().join("color_red.ogg"));
    }

    #[test]
    fn missing_clip_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let assets = AssetDirectory::new(dir.path(), exts());

        let result = assets.resolve(&ClipRequest::new("color_red"));
        assert!(matches!(result, Err(Error::ResourceUnavailable(_))));
    }

    #[test]
    fn rejects_ids_outside_the_root() {
        let dir = TempDir::new().unwrap();
        let assets = AssetDirectory::new(dir.path().join("clips"), exts());
        std::fs::write(dir.path().join("secret.wav"), b"").unwrap();

        for id in ["../secret", "", ".hidden", "a\\b"] {
            let result = assets.resolve(&ClipRequest::new(id));
            assert!(matches!(result, Err(Error::ResourceUnavailable(_))), "{id}");
        }
    }
}

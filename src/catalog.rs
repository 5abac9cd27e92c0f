//! Static word lists, one per category screen.

use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::playback::ClipRequest;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Word {
    /// The word in the learner's language.
    pub default_translation: String,
    pub miwok_translation: String,
    #[serde(default)]
    pub image: Option<String>,
    pub audio: ClipRequest,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Category {
    pub name: String,
    #[serde(default)]
    pub words: Vec<Word>,
}

impl Category {
    /// Clip for the list row at `index`.
    pub fn clip_for(&self, index: usize) -> Option<ClipRequest> {
        self.words.get(index).map(|word| word.audio.clone())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Catalog {
    #[serde(default, rename = "category")]
    pub categories: Vec<Category>,
}

impl Catalog {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
            .map_err(|e| Error::Config(format!("catalog {}: {}", path.display(), e)))
    }

    pub fn parse(text: &str) -> Result<Self> {
        let catalog: Catalog =
            toml::from_str(text).map_err(|e| Error::Config(e.to_string()))?;

        for (i, category) in catalog.categories.iter().enumerate() {
            if catalog.categories[..i].iter().any(|c| c.name == category.name) {
                return Err(Error::Config(format!("duplicate category {:?}", category.name)));
            }
        }
        Ok(catalog)
    }

    pub fn category(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FAMILY: &str = r#"
        [[category]]
        name = "family"

        [[category.words]]
        default_translation = "father"
        miwok_translation = "әpә"
        image = "family_father"
        audio = "family_father"

        [[category.words]]
        default_translation = "mother"
        miwok_translation = "әṭa"
        audio = "family_mother"

        [[category]]
        name = "phrases"
    "#;

    #[test]
    fn parses_categories_and_words() {
        let catalog = Catalog::parse(FAMILY).unwrap();

        let family = catalog.category("family").unwrap();
        assert_eq!(family.words.len(), 2);
        assert_eq!(family.words[0].image.as_deref(), Some("family_father"));
        assert_eq!(family.words[1].image, None);
        assert!(catalog.category("phrases").unwrap().words.is_empty());
        assert!(catalog.category("numbers").is_none());
    }

    #[test]
    fn maps_list_position_to_clip() {
        let catalog = Catalog::parse(FAMILY).unwrap();
        let family = catalog.category("family").unwrap();

        assert_eq!(family.clip_for(1), Some(ClipRequest::new("family_mother")));
        assert_eq!(family.clip_for(2), None);
    }

    #[test]
    fn rejects_duplicate_categories() {
        let text = "[[category]]\nname = \"colors\"\n[[category]]\nname = \"colors\"\n";
        assert!(matches!(Catalog::parse(text), Err(Error::Config(_))));
    }

    #[test]
    fn rejects_word_without_audio() {
        let text = r#"
            [[category]]
            name = "colors"
            [[category.words]]
            default_translation = "red"
            miwok_translation = "weṭeṭṭi"
        "#;
        assert!(matches!(Catalog::parse(text), Err(Error::Config(_))));
    }
}

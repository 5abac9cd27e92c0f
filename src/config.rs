//! vocab-audio configuration
//!
//! Loaded from a TOML file; every key has a default so an empty file is
//! a valid configuration.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::engine::EngineSettings;
use crate::error::{Error, Result};
use crate::focus::{CoordinatorSettings, StreamKind};
use crate::playback::AssetDirectory;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub catalog: PathBuf,
    pub assets: AssetsConfig,
    pub playback: PlaybackConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssetsConfig {
    pub root: PathBuf,
    /// Tried in order when resolving a clip id.
    pub extensions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlaybackConfig {
    pub stream: StreamKind,
    /// Volume while another holder lets us duck, in (0, 1].
    pub duck_volume: f32,
    pub buffer_ms: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog: PathBuf::from("assets/catalog.toml"),
            assets: AssetsConfig::default(),
            playback: PlaybackConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("assets/clips"),
            extensions: ["ogg", "mp3", "wav", "flac"].map(String::from).to_vec(),
        }
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            stream: StreamKind::Music,
            duck_volume: 0.5,
            buffer_ms: 500,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "vocab_audio=info".to_string(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        let mut config = Self::parse(&text)?;

        // Relative paths are taken from the config file's directory.
        if let Some(base) = path.parent() {
            config.catalog = base.join(&config.catalog);
            config.assets.root = base.join(&config.assets.root);
        }
        Ok(config)
    }

    pub fn parse(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let duck = self.playback.duck_volume;
        if !(duck > 0.0 && duck <= 1.0) {
            return Err(Error::Config(format!(
                "playback.duck_volume must be in (0, 1], got {}",
                duck
            )));
        }
        if self.playback.buffer_ms == 0 {
            return Err(Error::Config("playback.buffer_ms must be positive".into()));
        }
        if self.assets.extensions.is_empty() {
            return Err(Error::Config("assets.extensions must not be empty".into()));
        }
        Ok(())
    }

    pub fn asset_directory(&self) -> AssetDirectory {
        AssetDirectory::new(&self.assets.root, self.assets.extensions.clone())
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            buffer_ms: self.playback.buffer_ms,
        }
    }

    pub fn coordinator_settings(&self) -> CoordinatorSettings {
        CoordinatorSettings {
            stream: self.playback.stream,
            duck_volume: self.playback.duck_volume,
        }
    }
}

//! Pronunciation playback for categorized word lists.
//!
//! Each category screen owns a [`CategoryScreen`]: a [`FocusCoordinator`]
//! that leases audio focus and a [`PlaybackResource`] that keeps at most
//! one clip alive, both fed from the screen's single event queue.

pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod focus;
pub mod playback;
pub mod screen;

pub use catalog::{Catalog, Category, Word};
pub use config::Config;
pub use engine::AudioEngine;
pub use error::{Error, Result};
pub use events::{FocusChange, PlaybackEvent, PlaybackToken, ScreenEvent};
pub use focus::{CoordinatorState, FocusCoordinator, LocalAudioFocus};
pub use playback::{ClipRequest, Playback, PlaybackResource};
pub use screen::{screen_queue, CategoryScreen};

//! Exclusive playback of one pronunciation clip at a time.
//!
//! [`PlaybackResource`] owns the single live session of a screen. The
//! rendering backend sits behind [`AudioBackend`] so the resource can be
//! exercised without an audio device, and the focus coordinator drives the
//! resource through the [`Playback`] trait so it can be tested with a fake.

pub mod resolver;
pub mod resource;

pub use resolver::{AssetDirectory, ClipResolver};
pub use resource::PlaybackResource;

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::events::{EventSender, PlaybackEvent, PlaybackToken, ScreenEvent};

/// Opaque identifier of a bundled clip, e.g. `family_father`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClipRequest(String);

impl ClipRequest {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn id(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClipRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Commands the focus coordinator issues to the playback side.
pub trait Playback {
    /// Starts `request`, releasing any live session first.
    /// The caller must already hold playback focus.
    fn play(&mut self, request: &ClipRequest) -> Result<PlaybackToken>;

    /// Releases the live session, if any. Idempotent.
    fn stop(&mut self);

    /// Pauses the live session and moves it back to the first frame.
    /// No-op when nothing is live. A backend error releases the session.
    fn pause(&mut self) -> Result<()>;

    /// Restarts a paused session. No-op when nothing is paused.
    /// A backend error releases the session.
    fn resume(&mut self) -> Result<()>;

    fn set_volume(&mut self, volume: f32);

    /// True while a session is live, paused or not.
    fn is_active(&self) -> bool;

    /// Applies a completion report. Returns true if it belonged to the
    /// live session, which has then been released.
    fn complete(&mut self, event: &PlaybackEvent) -> bool;
}

/// A rendering backend able to open one session per clip.
pub trait AudioBackend {
    type Session: PlaybackSession;

    /// Allocates a session for `request` without starting it.
    /// The session reports its end through `notifier`.
    fn open(&mut self, request: &ClipRequest, notifier: CompletionNotifier)
        -> Result<Self::Session>;
}

/// One live, backend-owned playback session.
pub trait PlaybackSession {
    fn start(&mut self) -> Result<()>;

    fn pause(&mut self) -> Result<()>;

    /// Moves the session back to the first frame without starting it.
    fn rewind(&mut self) -> Result<()>;

    fn set_volume(&mut self, volume: f32);

    /// Frees every backend resource held by the session.
    fn release(self);
}

/// Posts a session's end onto the owning screen's queue, at most once
/// per run of the clip. Safe to call from backend threads.
#[derive(Clone)]
pub struct CompletionNotifier {
    token: PlaybackToken,
    events: EventSender,
    fired: Arc<AtomicBool>,
}

impl CompletionNotifier {
    pub fn new(token: PlaybackToken, events: EventSender) -> Self {
        Self {
            token,
            events,
            fired: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn token(&self) -> PlaybackToken {
        self.token
    }

    pub fn finished(&self) {
        self.fire(PlaybackEvent::Finished(self.token));
    }

    pub fn failed(&self, reason: impl Into<String>) {
        self.fire(PlaybackEvent::Failed {
            token: self.token,
            reason: reason.into(),
        });
    }

    /// Allows another report after the clip was restarted from the top.
    pub fn rearm(&self) {
        self.fired.store(false, Ordering::Release);
    }

    fn fire(&self, event: PlaybackEvent) {
        if self.fired.swap(true, Ordering::AcqRel) {
            return;
        }
        if self.events.send(ScreenEvent::Playback(event)).is_err() {
            debug!("Screen queue closed, dropping report for {}", self.token);
        }
    }
}

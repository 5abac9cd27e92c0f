//! Events delivered to a screen's single-threaded queue.
//!
//! Selection, focus notifications, playback completion and lifecycle all
//! arrive here, so every state transition is applied in one serial order.

use std::fmt;
use std::sync::mpsc::Sender;

use crate::focus::FocusState;

/// Identifies one allocation made by a `PlaybackResource`.
///
/// Completion reports carry the token of the session that produced them,
/// which lets the resource discard reports from a session it already
/// released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlaybackToken(pub(crate) u64);

impl PlaybackToken {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for PlaybackToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Focus-change notification from the arbitration service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusChange {
    Gain,
    PermanentLoss,
    TransientLoss,
    TransientLossDuckable,
}

impl FocusChange {
    /// The focus condition this notification puts the receiver in.
    pub fn focus_state(self) -> FocusState {
        match self {
            FocusChange::Gain => FocusState::Granted,
            FocusChange::PermanentLoss => FocusState::LostPermanent,
            FocusChange::TransientLoss => FocusState::LostTransient,
            FocusChange::TransientLossDuckable => FocusState::LostTransientDuckable,
        }
    }
}

/// Reported by a rendering session, possibly from a backend thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackEvent {
    /// The clip played to its end.
    Finished(PlaybackToken),
    /// The backend gave up mid-playback. Handled like a natural finish.
    Failed { token: PlaybackToken, reason: String },
}

impl PlaybackEvent {
    pub fn token(&self) -> PlaybackToken {
        match self {
            PlaybackEvent::Finished(token) => *token,
            PlaybackEvent::Failed { token, .. } => *token,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScreenEvent {
    /// A list row was clicked.
    ItemSelected(usize),
    FocusChanged(FocusChange),
    Playback(PlaybackEvent),
    /// The host screen left the foreground.
    ScreenStopped,
}

/// Producer side of a screen queue.
pub type EventSender = Sender<ScreenEvent>;

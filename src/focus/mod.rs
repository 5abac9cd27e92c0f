//! Audio focus: leased playback rights arbitrated among competing holders.

pub mod coordinator;
pub mod local;

pub use coordinator::{CoordinatorSettings, CoordinatorState, FocusCoordinator, Input};
pub use local::{FocusClient, LocalAudioFocus};

use serde::{Deserialize, Serialize};

/// Output stream a focus request is made for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamKind {
    Music,
    Notification,
    Alarm,
    /// While a call holds focus every other request is denied.
    VoiceCall,
}

/// How long the requester expects to keep focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationHint {
    /// Indefinitely; current holders lose focus for good.
    Gain,
    /// Briefly; current holder pauses.
    Transient,
    /// Briefly, and the current holder may keep playing quieter.
    TransientMayDuck,
    TransientExclusive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusGrant {
    Granted,
    Denied,
}

/// Focus condition of a screen, derived from its coordinator state or
/// from the last notification it received.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusState {
    None,
    Requested,
    Granted,
    LostPermanent,
    LostTransient,
    LostTransientDuckable,
}

/// Host arbitration service, as seen by one screen.
pub trait FocusArbiter {
    fn request_focus(&mut self, stream: StreamKind, hint: DurationHint) -> FocusGrant;

    /// Gives focus back. Harmless when nothing is held.
    fn abandon_focus(&mut self);
}

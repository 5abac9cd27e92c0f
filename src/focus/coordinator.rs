use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::events::{FocusChange, PlaybackEvent};
use crate::focus::{DurationHint, FocusArbiter, FocusGrant, FocusState, StreamKind};
use crate::playback::{ClipRequest, Playback};

pub const NORMAL_VOLUME: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorState {
    /// No focus held.
    Idle,
    /// Focus granted, clip playing.
    Active,
    /// Focus held at reduced volume, still playing.
    Ducked,
    /// Focus temporarily lost, clip paused at its start.
    PausedTransient,
}

impl CoordinatorState {
    pub fn focus(self) -> FocusState {
        match self {
            CoordinatorState::Idle => FocusState::None,
            CoordinatorState::Active => FocusState::Granted,
            CoordinatorState::Ducked => FocusState::LostTransientDuckable,
            CoordinatorState::PausedTransient => FocusState::LostTransient,
        }
    }
}

/// One input to the transition function.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Select(ClipRequest),
    Focus(FocusChange),
    Playback(PlaybackEvent),
    Teardown,
}

#[derive(Debug, Clone, Copy)]
pub struct CoordinatorSettings {
    pub stream: StreamKind,
    /// Output volume while ducked.
    pub duck_volume: f32,
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        Self {
            stream: StreamKind::Music,
            duck_volume: 0.5,
        }
    }
}

/// Requests and abandons focus for a screen and drives its playback
/// through focus changes. Every input goes through [`handle`], one at a
/// time, from the screen's queue.
///
/// [`handle`]: FocusCoordinator::handle
pub struct FocusCoordinator<P, A> {
    playback: P,
    arbiter: A,
    settings: CoordinatorSettings,
    state: CoordinatorState,
}

impl<P: Playback, A: FocusArbiter> FocusCoordinator<P, A> {
    pub fn new(playback: P, arbiter: A, settings: CoordinatorSettings) -> Self {
        Self {
            playback,
            arbiter,
            settings,
            state: CoordinatorState::Idle,
        }
    }

    pub fn state(&self) -> CoordinatorState {
        self.state
    }

    pub fn playback(&self) -> &P {
        &self.playback
    }

    pub fn playback_mut(&mut self) -> &mut P {
        &mut self.playback
    }

    pub fn arbiter(&self) -> &A {
        &self.arbiter
    }

    pub fn handle(&mut self, input: Input) -> CoordinatorState {
        let before = self.state;
        match input {
            Input::Select(request) => self.select(request),
            Input::Focus(change) => self.on_focus_change(change),
            Input::Playback(event) => self.on_playback_event(event),
            Input::Teardown => self.teardown(),
        }
        if before != self.state {
            debug!("Focus state {:?} -> {:?}", before, self.state);
        }
        self.state
    }

    fn select(&mut self, request: ClipRequest) {
        // The previous clip is gone before focus is asked for the next one.
        if self.state != CoordinatorState::Idle || self.playback.is_active() {
            self.release();
        }

        match self.begin(&request) {
            Ok(()) => self.state = CoordinatorState::Active,
            Err(Error::FocusDenied) => debug!("Focus denied, not playing {}", request),
            Err(err) => {
                warn!("Cannot play {}: {}", request, err);
                self.arbiter.abandon_focus();
            }
        }
    }

    fn begin(&mut self, request: &ClipRequest) -> Result<()> {
        debug!("Focus {:?} for {}", FocusState::Requested, request);
        let grant = self
            .arbiter
            .request_focus(self.settings.stream, DurationHint::Transient);
        if grant == FocusGrant::Denied {
            return Err(Error::FocusDenied);
        }
        self.playback.play(request)?;
        Ok(())
    }

    fn on_focus_change(&mut self, change: FocusChange) {
        use CoordinatorState::*;

        if self.state == Idle {
            debug!("Ignoring {:?} while idle", change);
            return;
        }
        if !self.playback.is_active() {
            debug!("Focus {:?} with no live clip, giving focus back", change);
            self.abandon();
            return;
        }

        debug!("Focus {:?} in {:?}", change.focus_state(), self.state);
        match (self.state, change) {
            (_, FocusChange::PermanentLoss) => self.release(),
            (Active | Ducked, FocusChange::TransientLoss) => match self.playback.pause() {
                Ok(()) => self.state = PausedTransient,
                Err(err) => {
                    warn!("Pause failed: {}", err);
                    self.release();
                }
            },
            (Active, FocusChange::TransientLossDuckable) => {
                self.playback.set_volume(self.settings.duck_volume);
                self.state = Ducked;
            }
            (PausedTransient, FocusChange::Gain) => match self.playback.resume() {
                Ok(()) => {
                    self.playback.set_volume(NORMAL_VOLUME);
                    self.state = Active;
                }
                Err(err) => {
                    warn!("Resume failed: {}", err);
                    self.release();
                }
            },
            (Ducked, FocusChange::Gain) => {
                self.playback.set_volume(NORMAL_VOLUME);
                self.state = Active;
            }
            (state, change) => debug!("{:?} has no effect in {:?}", change, state),
        }
    }

    fn on_playback_event(&mut self, event: PlaybackEvent) {
        // Completion and backend failure end the clip the same way.
        if self.playback.complete(&event) {
            self.abandon();
        }
    }

    fn teardown(&mut self) {
        debug!("Screen stopped in {:?}", self.state);
        self.release();
    }

    fn release(&mut self) {
        self.playback.stop();
        self.abandon();
    }

    fn abandon(&mut self) {
        self.arbiter.abandon_focus();
        self.state = CoordinatorState::Idle;
    }
}

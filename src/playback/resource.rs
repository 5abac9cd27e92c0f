use std::mem;

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::events::{EventSender, PlaybackEvent, PlaybackToken};
use crate::playback::{AudioBackend, ClipRequest, CompletionNotifier, Playback, PlaybackSession};

struct LiveClip<S> {
    token: PlaybackToken,
    request: ClipRequest,
    session: S,
    paused: bool,
}

/// At most one session exists, and it can only leave the slot through
/// `release`, which consumes it.
enum Slot<S> {
    Empty,
    Live(LiveClip<S>),
}

type FinishedHook = Box<dyn FnMut(&ClipRequest)>;

/// Owns the single live playback session of a screen.
pub struct PlaybackResource<B: AudioBackend> {
    backend: B,
    events: EventSender,
    slot: Slot<B::Session>,
    next_token: u64,
    on_finished: Option<FinishedHook>,
}

impl<B: AudioBackend> PlaybackResource<B> {
    /// `events` is the owning screen's queue; completion reports land there.
    pub fn new(backend: B, events: EventSender) -> Self {
        Self {
            backend,
            events,
            slot: Slot::Empty,
            next_token: 1,
            on_finished: None,
        }
    }

    /// Registers the hook run once for every clip that ends on its own,
    /// whether it played out or the backend gave up on it.
    pub fn set_on_finished(&mut self, hook: impl FnMut(&ClipRequest) + 'static) {
        self.on_finished = Some(Box::new(hook));
    }

    pub fn current_clip(&self) -> Option<&ClipRequest> {
        match &self.slot {
            Slot::Live(clip) => Some(&clip.request),
            Slot::Empty => None,
        }
    }

    pub fn current_token(&self) -> Option<PlaybackToken> {
        match &self.slot {
            Slot::Live(clip) => Some(clip.token),
            Slot::Empty => None,
        }
    }

    pub fn is_paused(&self) -> bool {
        matches!(&self.slot, Slot::Live(clip) if clip.paused)
    }

    /// Releases the live session after a backend error and reports it.
    fn fail(&mut self, action: &str, err: Error) -> Error {
        debug!("Clip {} failed, releasing it", action);
        self.stop();
        match err {
            Error::BackendFailure(_) => err,
            other => Error::BackendFailure(other.to_string()),
        }
    }
}

impl<B: AudioBackend> Playback for PlaybackResource<B> {
    fn play(&mut self, request: &ClipRequest) -> Result<PlaybackToken> {
        self.stop();

        let token = PlaybackToken(self.next_token);
        self.next_token += 1;

        let notifier = CompletionNotifier::new(token, self.events.clone());
        let mut session = self.backend.open(request, notifier)?;

        if let Err(err) = session.start() {
            session.release();
            return Err(Error::ResourceUnavailable(format!("{}: {}", request, err)));
        }

        info!("Playing clip {} ({})", request, token);
        self.slot = Slot::Live(LiveClip {
            token,
            request: request.clone(),
            session,
            paused: false,
        });
        Ok(token)
    }

    fn stop(&mut self) {
        if let Slot::Live(clip) = mem::replace(&mut self.slot, Slot::Empty) {
            debug!("Releasing clip {} ({})", clip.request, clip.token);
            clip.session.release();
        }
    }

    fn pause(&mut self) -> Result<()> {
        let Slot::Live(clip) = &mut self.slot else {
            return Ok(());
        };
        if clip.paused {
            return Ok(());
        }

        // Interrupted words restart from the top rather than mid-word.
        let outcome = clip.session.pause().and_then(|_| clip.session.rewind());
        match outcome {
            Ok(()) => {
                clip.paused = true;
                debug!("Paused clip {} at start", clip.request);
                Ok(())
            }
            Err(err) => Err(self.fail("pause", err)),
        }
    }

    fn resume(&mut self) -> Result<()> {
        let Slot::Live(clip) = &mut self.slot else {
            return Ok(());
        };
        if !clip.paused {
            return Ok(());
        }

        match clip.session.start() {
            Ok(()) => {
                clip.paused = false;
                debug!("Resumed clip {}", clip.request);
                Ok(())
            }
            Err(err) => Err(self.fail("resume", err)),
        }
    }

    fn set_volume(&mut self, volume: f32) {
        if let Slot::Live(clip) = &mut self.slot {
            clip.session.set_volume(volume);
        }
    }

    fn is_active(&self) -> bool {
        matches!(self.slot, Slot::Live(_))
    }

    fn complete(&mut self, event: &PlaybackEvent) -> bool {
        let token = event.token();
        let clip = match mem::replace(&mut self.slot, Slot::Empty) {
            Slot::Live(clip) if clip.token == token => clip,
            other => {
                self.slot = other;
                debug!("Ignoring stale report for {}", token);
                return false;
            }
        };

        match event {
            PlaybackEvent::Finished(_) => info!("Clip {} finished", clip.request),
            PlaybackEvent::Failed { reason, .. } => {
                warn!("Clip {} stopped by backend: {}", clip.request, reason)
            }
        }
        if let Some(hook) = self.on_finished.as_mut() {
            hook(&clip.request);
        }
        clip.session.release();
        true
    }
}

impl<B: AudioBackend> Drop for PlaybackResource<B> {
    fn drop(&mut self) {
        self.stop();
    }
}

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::events::{EventSender, FocusChange, ScreenEvent};
use crate::focus::{DurationHint, FocusArbiter, FocusGrant, StreamKind};

struct Holder {
    id: u64,
    stream: StreamKind,
    events: EventSender,
}

impl Holder {
    fn notify(&self, change: FocusChange) {
        debug!("Focus holder {} gets {:?}", self.id, change);
        if self.events.send(ScreenEvent::FocusChanged(change)).is_err() {
            debug!("Focus holder {} has no queue anymore", self.id);
        }
    }
}

#[derive(Default)]
struct FocusStack {
    next_id: u64,
    /// Last entry holds focus; the ones below wait for it back.
    holders: Vec<Holder>,
}

/// In-process audio focus service shared by every screen.
///
/// Focus is a stack: a transient request pauses (or ducks) the current
/// holder until the requester abandons, a `Gain` request evicts every
/// holder, and a voice call blocks all other requests.
#[derive(Clone, Default)]
pub struct LocalAudioFocus {
    inner: Arc<Mutex<FocusStack>>,
}

impl LocalAudioFocus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a client whose notifications are posted to `events`.
    pub fn client(&self, events: EventSender) -> FocusClient {
        let mut stack = self.inner.lock();
        stack.next_id += 1;
        FocusClient {
            service: self.clone(),
            id: stack.next_id,
            events,
        }
    }

    pub fn holder_count(&self) -> usize {
        self.inner.lock().holders.len()
    }

    /// Stream of the current focus holder, if any.
    pub fn current_stream(&self) -> Option<StreamKind> {
        self.inner.lock().holders.last().map(|h| h.stream)
    }

    fn request(
        &self,
        id: u64,
        events: &EventSender,
        stream: StreamKind,
        hint: DurationHint,
    ) -> FocusGrant {
        let mut stack = self.inner.lock();

        if let Some(top) = stack.holders.last() {
            let in_call = top.stream == StreamKind::VoiceCall;
            if top.id != id && in_call && stream != StreamKind::VoiceCall {
                debug!("Focus request from {} denied during call", id);
                return FocusGrant::Denied;
            }
        }

        // A holder asking again just moves to the top.
        stack.holders.retain(|h| h.id != id);

        match hint {
            DurationHint::Gain => {
                for holder in stack.holders.drain(..) {
                    holder.notify(FocusChange::PermanentLoss);
                }
            }
            DurationHint::TransientMayDuck => {
                if let Some(top) = stack.holders.last() {
                    top.notify(FocusChange::TransientLossDuckable);
                }
            }
            DurationHint::Transient | DurationHint::TransientExclusive => {
                if let Some(top) = stack.holders.last() {
                    top.notify(FocusChange::TransientLoss);
                }
            }
        }

        stack.holders.push(Holder {
            id,
            stream,
            events: events.clone(),
        });
        debug!("Focus granted to {} ({:?}, {:?})", id, stream, hint);
        FocusGrant::Granted
    }

    fn abandon(&self, id: u64) {
        let mut stack = self.inner.lock();
        let Some(pos) = stack.holders.iter().position(|h| h.id == id) else {
            return;
        };

        let was_top = pos + 1 == stack.holders.len();
        stack.holders.remove(pos);
        debug!("Focus abandoned by {}", id);

        if was_top {
            if let Some(next) = stack.holders.last() {
                next.notify(FocusChange::Gain);
            }
        }
    }
}

/// One screen's handle on [`LocalAudioFocus`]. Dropping it abandons focus.
pub struct FocusClient {
    service: LocalAudioFocus,
    id: u64,
    events: EventSender,
}

impl FocusArbiter for FocusClient {
    fn request_focus(&mut self, stream: StreamKind, hint: DurationHint) -> FocusGrant {
        self.service.request(self.id, &self.events, stream, hint)
    }

    fn abandon_focus(&mut self) {
        self.service.abandon(self.id);
    }
}

impl Drop for FocusClient {
    fn drop(&mut self) {
        self.service.abandon(self.id);
    }
}

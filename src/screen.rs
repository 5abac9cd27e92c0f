//! One word-list screen: a category, its coordinator and its event queue.
//!
//! The same component serves every category. The host forwards list
//! clicks and lifecycle callbacks; backend threads and the focus service
//! post into the queue; [`CategoryScreen::pump`] applies everything in
//! arrival order on the owning thread.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::catalog::Category;
use crate::events::{EventSender, ScreenEvent};
use crate::focus::{CoordinatorState, FocusArbiter, FocusCoordinator, Input};
use crate::playback::Playback;

/// Creates the queue a screen, its playback resource and its focus
/// client share.
pub fn screen_queue() -> (EventSender, Receiver<ScreenEvent>) {
    mpsc::channel()
}

pub struct CategoryScreen<P, A> {
    category: Category,
    coordinator: FocusCoordinator<P, A>,
    sender: EventSender,
    events: Receiver<ScreenEvent>,
}

impl<P: Playback, A: FocusArbiter> CategoryScreen<P, A> {
    pub fn new(
        category: Category,
        coordinator: FocusCoordinator<P, A>,
        sender: EventSender,
        events: Receiver<ScreenEvent>,
    ) -> Self {
        Self {
            category,
            coordinator,
            sender,
            events,
        }
    }

    pub fn category(&self) -> &Category {
        &self.category
    }

    pub fn coordinator(&self) -> &FocusCoordinator<P, A> {
        &self.coordinator
    }

    pub fn state(&self) -> CoordinatorState {
        self.coordinator.state()
    }

    /// Handle for posting events to this screen from elsewhere.
    pub fn sender(&self) -> EventSender {
        self.sender.clone()
    }

    pub fn on_item_selected(&mut self, index: usize) -> CoordinatorState {
        self.dispatch(ScreenEvent::ItemSelected(index))
    }

    pub fn on_screen_stopped(&mut self) -> CoordinatorState {
        self.dispatch(ScreenEvent::ScreenStopped)
    }

    pub fn dispatch(&mut self, event: ScreenEvent) -> CoordinatorState {
        let input = match event {
            ScreenEvent::ItemSelected(index) => match self.category.clip_for(index) {
                Some(request) => Input::Select(request),
                None => {
                    warn!("No word at row {} of {}", index, self.category.name);
                    return self.state();
                }
            },
            ScreenEvent::FocusChanged(change) => Input::Focus(change),
            ScreenEvent::Playback(event) => Input::Playback(event),
            ScreenEvent::ScreenStopped => Input::Teardown,
        };
        self.coordinator.handle(input)
    }

    /// Applies every queued event. Returns how many were handled.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.events.try_recv() {
            self.dispatch(event);
            handled += 1;
        }
        handled
    }

    /// Blocks on the queue until the screen is idle again.
    /// Returns false if `timeout` ran out first.
    pub fn wait_until_idle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.state() == CoordinatorState::Idle {
                return true;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.events.recv_timeout(remaining) {
                Ok(event) => {
                    debug!("{} handling {:?}", self.category.name, event);
                    self.dispatch(event);
                }
                Err(RecvTimeoutError::Timeout) => return false,
                Err(RecvTimeoutError::Disconnected) => {
                    return self.state() == CoordinatorState::Idle;
                }
            }
        }
    }
}

//! Category screens driven end to end through their event queues, with
//! the real focus service and a recording backend in place of cpal.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::mpsc;

use vocab_audio::focus::{DurationHint, FocusArbiter, FocusClient, FocusGrant, StreamKind};
use vocab_audio::playback::{AudioBackend, CompletionNotifier, PlaybackSession};
use vocab_audio::{
    screen_queue, Catalog, Category, CategoryScreen, ClipRequest, CoordinatorState, Error,
    FocusCoordinator, LocalAudioFocus, PlaybackResource, Result, ScreenEvent, Word,
};

#[derive(Default)]
struct Log {
    entries: Vec<String>,
    live: usize,
    max_live: usize,
    notifiers: Vec<CompletionNotifier>,
    volume: Option<f32>,
    starts: u32,
    rewinds: u32,
    missing: Vec<String>,
}

struct RecordingBackend(Rc<RefCell<Log>>);

struct RecordingSession {
    id: String,
    log: Rc<RefCell<Log>>,
}

impl AudioBackend for RecordingBackend {
    type Session = RecordingSession;

    fn open(
        &mut self,
        request: &ClipRequest,
        notifier: CompletionNotifier,
    ) -> Result<RecordingSession> {
        let mut log = self.0.borrow_mut();
        if log.missing.iter().any(|id| id == request.id()) {
            return Err(Error::ResourceUnavailable(request.to_string()));
        }
        log.entries.push(format!("open {}", request));
        log.live += 1;
        log.max_live = log.max_live.max(log.live);
        log.notifiers.push(notifier);
        Ok(RecordingSession {
            id: request.id().to_string(),
            log: self.0.clone(),
        })
    }
}

impl PlaybackSession for RecordingSession {
    fn start(&mut self) -> Result<()> {
        self.log.borrow_mut().starts += 1;
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        Ok(())
    }

    fn rewind(&mut self) -> Result<()> {
        self.log.borrow_mut().rewinds += 1;
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) {
        self.log.borrow_mut().volume = Some(volume);
    }

    fn release(self) {
        let mut log = self.log.borrow_mut();
        log.live -= 1;
        log.entries.push(format!("release {}", self.id));
    }
}

type Screen = CategoryScreen<PlaybackResource<RecordingBackend>, FocusClient>;

fn category(name: &str, ids: &[&str]) -> Category {
    Category {
        name: name.to_string(),
        words: ids
            .iter()
            .map(|id| Word {
                default_translation: id.to_string(),
                miwok_translation: id.to_string(),
                image: None,
                audio: ClipRequest::new(*id),
            })
            .collect(),
    }
}

fn open_screen(focus: &LocalAudioFocus, category: Category) -> (Screen, Rc<RefCell<Log>>) {
    let log = Rc::new(RefCell::new(Log::default()));
    let (sender, events) = screen_queue();
    let playback = PlaybackResource::new(RecordingBackend(log.clone()), sender.clone());
    let coordinator = FocusCoordinator::new(
        playback,
        focus.client(sender.clone()),
        Default::default(),
    );
    (CategoryScreen::new(category, coordinator, sender, events), log)
}

fn family(focus: &LocalAudioFocus) -> (Screen, Rc<RefCell<Log>>) {
    open_screen(
        focus,
        category("family", &["family_father", "family_mother", "family_son"]),
    )
}

fn finish_latest(log: &Rc<RefCell<Log>>) {
    log.borrow().notifiers.last().expect("a clip was opened").finished();
}

fn other_app(focus: &LocalAudioFocus) -> FocusClient {
    let (sender, _) = mpsc::channel();
    focus.client(sender)
}

#[test]
fn clip_plays_to_the_end_and_focus_is_returned() {
    let focus = LocalAudioFocus::new();
    let (mut screen, log) = family(&focus);

    assert_eq!(screen.on_item_selected(0), CoordinatorState::Active);
    assert_eq!(focus.holder_count(), 1);

    finish_latest(&log);
    assert_eq!(screen.pump(), 1);

    assert_eq!(screen.state(), CoordinatorState::Idle);
    assert_eq!(focus.holder_count(), 0);
    assert_eq!(log.borrow().entries, vec!["open family_father", "release family_father"]);
}

#[test]
fn interruption_restarts_the_word_from_the_top() {
    let focus = LocalAudioFocus::new();
    let (mut screen, log) = family(&focus);
    screen.on_item_selected(1);

    let mut notification = other_app(&focus);
    notification.request_focus(StreamKind::Notification, DurationHint::Transient);
    screen.pump();

    assert_eq!(screen.state(), CoordinatorState::PausedTransient);
    assert_eq!(log.borrow().rewinds, 1);

    notification.abandon_focus();
    screen.pump();

    assert_eq!(screen.state(), CoordinatorState::Active);
    assert_eq!(log.borrow().starts, 2);
    assert_eq!(log.borrow().volume, Some(1.0));
    assert_eq!(log.borrow().live, 1);
}

#[test]
fn new_selection_releases_the_old_clip_first() {
    let focus = LocalAudioFocus::new();
    let (mut screen, log) = family(&focus);

    screen.on_item_selected(0);
    screen.on_item_selected(2);

    let log = log.borrow();
    assert_eq!(
        log.entries,
        vec!["open family_father", "release family_father", "open family_son"]
    );
    assert_eq!(log.max_live, 1);
    assert_eq!(focus.holder_count(), 1);
    assert_eq!(
        screen.coordinator().playback().current_clip(),
        Some(&ClipRequest::new("family_son"))
    );
}

#[test]
fn queued_events_apply_in_arrival_order() {
    let focus = LocalAudioFocus::new();
    let (mut screen, log) = family(&focus);

    let sender = screen.sender();
    sender.send(ScreenEvent::ItemSelected(0)).unwrap();
    sender.send(ScreenEvent::ItemSelected(1)).unwrap();
    sender.send(ScreenEvent::ScreenStopped).unwrap();
    assert_eq!(screen.pump(), 3);

    assert_eq!(screen.state(), CoordinatorState::Idle);
    assert_eq!(
        log.borrow().entries,
        vec![
            "open family_father",
            "release family_father",
            "open family_mother",
            "release family_mother",
        ]
    );
    assert_eq!(focus.holder_count(), 0);
}

#[test]
fn late_finish_of_replaced_clip_is_ignored() {
    let focus = LocalAudioFocus::new();
    let (mut screen, log) = family(&focus);

    screen.on_item_selected(0);
    let first = log.borrow().notifiers[0].clone();
    screen.on_item_selected(1);

    first.finished();
    screen.pump();

    assert_eq!(screen.state(), CoordinatorState::Active);
    assert_eq!(log.borrow().live, 1);
}

#[test]
fn stopping_a_ducked_screen_releases_everything() {
    let focus = LocalAudioFocus::new();
    let (mut screen, log) = family(&focus);
    screen.on_item_selected(0);

    let mut navigation = other_app(&focus);
    navigation.request_focus(StreamKind::Notification, DurationHint::TransientMayDuck);
    screen.pump();
    assert_eq!(screen.state(), CoordinatorState::Ducked);
    assert_eq!(log.borrow().volume, Some(0.5));

    assert_eq!(screen.on_screen_stopped(), CoordinatorState::Idle);

    assert_eq!(log.borrow().live, 0);
    assert_eq!(focus.holder_count(), 1);
    assert_eq!(focus.current_stream(), Some(StreamKind::Notification));
}

#[test]
fn permanent_loss_ends_playback() {
    let focus = LocalAudioFocus::new();
    let (mut screen, log) = family(&focus);
    screen.on_item_selected(0);

    let mut player = other_app(&focus);
    player.request_focus(StreamKind::Music, DurationHint::Gain);
    screen.pump();

    assert_eq!(screen.state(), CoordinatorState::Idle);
    assert_eq!(log.borrow().live, 0);
    assert_eq!(focus.holder_count(), 1);
}

#[test]
fn two_screens_share_the_device() {
    let focus = LocalAudioFocus::new();
    let (mut colors, colors_log) =
        open_screen(&focus, category("colors", &["color_red", "color_green"]));
    let (mut family, family_log) = family(&focus);

    colors.on_item_selected(0);
    family.on_item_selected(0);
    colors.pump();
    assert_eq!(colors.state(), CoordinatorState::PausedTransient);

    finish_latest(&family_log);
    family.pump();
    colors.pump();

    assert_eq!(family.state(), CoordinatorState::Idle);
    assert_eq!(colors.state(), CoordinatorState::Active);
    assert_eq!(colors_log.borrow().starts, 2);
}

#[test]
fn nothing_plays_during_a_call() {
    let focus = LocalAudioFocus::new();
    let (mut screen, log) = family(&focus);

    let mut call = other_app(&focus);
    assert_eq!(
        call.request_focus(StreamKind::VoiceCall, DurationHint::Gain),
        FocusGrant::Granted
    );

    assert_eq!(screen.on_item_selected(0), CoordinatorState::Idle);
    assert!(log.borrow().entries.is_empty());
}

#[test]
fn missing_clip_degrades_to_silence() {
    let focus = LocalAudioFocus::new();
    let (mut screen, log) = family(&focus);
    log.borrow_mut().missing.push("family_mother".into());

    assert_eq!(screen.on_item_selected(1), CoordinatorState::Idle);
    assert_eq!(focus.holder_count(), 0);

    assert_eq!(screen.on_item_selected(0), CoordinatorState::Active);
}

#[test]
fn rows_past_the_end_are_ignored() {
    let focus = LocalAudioFocus::new();
    let (mut screen, log) = family(&focus);
    screen.on_item_selected(0);

    assert_eq!(screen.on_item_selected(42), CoordinatorState::Active);
    assert_eq!(log.borrow().entries, vec!["open family_father"]);
}

#[test]
fn shipped_catalog_covers_every_category() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("assets/catalog.toml");
    let catalog = Catalog::load(&path).unwrap();

    let family = catalog.category("family").unwrap();
    assert_eq!(family.words.len(), 10);
    assert_eq!(family.clip_for(0), Some(ClipRequest::new("family_father")));
    assert_eq!(catalog.category("colors").unwrap().words.len(), 8);
}

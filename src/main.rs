//! vocab-audio - play word pronunciations from the command line
//!
//! Drives one category screen the way a list UI would: each row given on
//! the command line is a click, and the screen is stopped at the end.

use std::path::PathBuf;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vocab_audio::focus::{DurationHint, FocusArbiter, StreamKind};
use vocab_audio::{
    screen_queue, AudioEngine, Catalog, CategoryScreen, ClipRequest, Config, CoordinatorState,
    FocusCoordinator, LocalAudioFocus, PlaybackResource,
};

#[derive(Parser, Debug)]
#[command(name = "vocab-audio")]
#[command(about = "Pronunciation player for categorized word lists")]
#[command(version)]
struct Args {
    /// Configuration file
    #[arg(short, long, default_value = "vocab.toml", env = "VOCAB_AUDIO_CONFIG")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every category and its words
    List,

    /// Select rows of a category one after another
    Play {
        category: String,

        #[arg(required = true)]
        rows: Vec<usize>,

        /// Let another holder take transient focus this long into each clip
        #[arg(long)]
        interrupt_after_ms: Option<u64>,

        /// Give up waiting for a clip after this long
        #[arg(long, default_value = "10000")]
        timeout_ms: u64,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config_found = args.config.exists();
    let config = if config_found {
        Config::load(&args.config)
            .with_context(|| format!("Failed to load {}", args.config.display()))?
    } else {
        Config::default()
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.filter.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if !config_found {
        warn!("{} not found, using defaults", args.config.display());
    }

    let catalog = Catalog::load(&config.catalog)
        .with_context(|| format!("Failed to load catalog {}", config.catalog.display()))?;

    match args.command {
        Command::List => {
            for category in &catalog.categories {
                println!("{}", category.name);
                for (row, word) in category.words.iter().enumerate() {
                    println!(
                        "  {:>2}  {:<18} {:<14} [{}]",
                        row, word.default_translation, word.miwok_translation, word.audio
                    );
                }
            }
            Ok(())
        }
        Command::Play {
            category,
            rows,
            interrupt_after_ms,
            timeout_ms,
        } => play(
            &config,
            &catalog,
            &category,
            &rows,
            interrupt_after_ms.map(Duration::from_millis),
            Duration::from_millis(timeout_ms),
        ),
    }
}

fn play(
    config: &Config,
    catalog: &Catalog,
    category: &str,
    rows: &[usize],
    interrupt_after: Option<Duration>,
    timeout: Duration,
) -> Result<()> {
    let category = catalog
        .category(category)
        .cloned()
        .with_context(|| format!("Unknown category {:?}", category))?;

    let focus = LocalAudioFocus::new();
    let (sender, events) = screen_queue();

    let engine = AudioEngine::new(config.asset_directory(), config.engine_settings());
    let mut playback = PlaybackResource::new(engine, sender.clone());
    playback.set_on_finished(|clip: &ClipRequest| info!("Done with {}", clip));

    let arbiter = focus.client(sender.clone());
    let coordinator = FocusCoordinator::new(playback, arbiter, config.coordinator_settings());
    let mut screen = CategoryScreen::new(category, coordinator, sender, events);
    info!(
        "Screen {} with {} words",
        screen.category().name,
        screen.category().words.len()
    );

    for &row in rows {
        if screen.on_item_selected(row) == CoordinatorState::Idle {
            warn!("Row {} produced no sound", row);
            continue;
        }
        let interruption =
            interrupt_after.map(|delay| Interruption::schedule(focus.clone(), delay));
        if !screen.wait_until_idle(timeout) {
            warn!("Row {} still playing after {:?}", row, timeout);
        }
        if let Some(interruption) = interruption {
            interruption.finish();
        }
    }

    screen.on_screen_stopped();
    Ok(())
}

/// Plays the part of another app grabbing focus for a short notification
/// some time into the current clip.
struct Interruption {
    cancel: mpsc::Sender<()>,
    handle: JoinHandle<()>,
}

impl Interruption {
    fn schedule(focus: LocalAudioFocus, delay: Duration) -> Self {
        let (cancel, cancelled) = mpsc::channel::<()>();
        let handle = thread::spawn(move || {
            // Any outcome other than the timer running out means the clip
            // is already over.
            if cancelled.recv_timeout(delay) != Err(RecvTimeoutError::Timeout) {
                debug!("Clip ended before the interruption");
                return;
            }
            let (sender, _ignored) = mpsc::channel();
            let mut other = focus.client(sender);
            other.request_focus(StreamKind::Notification, DurationHint::Transient);
            thread::sleep(Duration::from_millis(300));
            other.abandon_focus();
        });
        Self { cancel, handle }
    }

    /// Cancels a pending interruption and waits for a running one.
    fn finish(self) {
        drop(self.cancel);
        if self.handle.join().is_err() {
            warn!("Interruption thread panicked");
        }
    }
}

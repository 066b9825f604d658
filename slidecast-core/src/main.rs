//! Slidecast - headless shell
//!
//! Lists sessions, loads a generated presentation, or drives the preparation
//! wizard end to end against the configured backend.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use slidecast_common::config::{load_config, TomlConfig};
use slidecast_common::events::EventBus;
use slidecast_common::Level;
use slidecast_core::http::ApiClient;
use slidecast_core::loader::{FallbackPolicy, LoadReport, SlideAudioLoader};
use slidecast_core::playback::{PlaybackConfig, SilentBackend};
use slidecast_core::sessions::{SessionListView, SortKey, StatusFilter};
use slidecast_core::wizard::{FixedCountdown, PreparationWizard, WizardUpdate};
use slidecast_core::SessionStore;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for slidecast
#[derive(Parser, Debug)]
#[command(name = "slidecast")]
#[command(about = "Prepare and review narrated slide presentations")]
#[command(version)]
struct Args {
    /// Config file path
    #[arg(short, long, env = "SLIDECAST_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Backend base URL
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List sessions
    Sessions {
        /// all, pending, validated or available
        #[arg(long, default_value = "all")]
        status: StatusFilter,

        /// Only sessions owned by this teacher id
        #[arg(long)]
        teacher: Option<i64>,

        /// teacher, course, groups or status
        #[arg(long)]
        sort: Option<SortKey>,
    },

    /// Load a generated presentation and list its slides
    Load { session_id: i64 },

    /// Run the preparation wizard for a session up to review
    Prepare {
        session_id: i64,

        #[arg(long)]
        topic: Option<String>,

        /// Repeat for each axis, in order
        #[arg(long = "axis")]
        axes: Vec<String>,

        #[arg(long)]
        level: Option<Level>,

        #[arg(long)]
        language: Option<String>,

        /// Mark the session VALIDATED once slides load
        #[arg(long)]
        validate: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(args.config.as_deref()).context("Failed to load configuration")?;
    init_tracing(&config)?;

    let client = ApiClient::from_config(&config, args.api_url.as_deref())
        .context("Failed to create API client")?
        .shared();
    info!(base_url = %client.base_url(), "Using backend");

    let event_bus = Arc::new(EventBus::default());

    match args.command {
        Command::Sessions {
            status,
            teacher,
            sort,
        } => list_sessions(client.as_ref(), status, teacher, sort).await,
        Command::Load { session_id } => {
            let loader = SlideAudioLoader::new(client.clone())
                .with_policy(FallbackPolicy::from(&config.loader))
                .with_event_bus(event_bus);
            let report = loader
                .load(session_id)
                .await
                .with_context(|| format!("Failed to load session {}", session_id))?;
            print_report(&report);
            Ok(())
        }
        Command::Prepare {
            session_id,
            topic,
            axes,
            level,
            language,
            validate,
        } => {
            let request = PrepareRequest {
                session_id,
                topic,
                axes,
                level,
                language,
                validate,
            };
            prepare(client, &config, event_bus, request).await
        }
    }
}

fn init_tracing(config: &TomlConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "slidecast_core={level},slidecast_common={level}",
            level = config.logging.level
        )
        .into()
    });

    match &config.logging.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(Mutex::new(file)),
                )
                .init();
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
    Ok(())
}

async fn list_sessions(
    store: &dyn SessionStore,
    status: StatusFilter,
    teacher: Option<i64>,
    sort: Option<SortKey>,
) -> Result<()> {
    let mut view = match teacher {
        Some(id) => SessionListView::for_teacher(id),
        None => SessionListView::new(),
    };
    view.set_status_filter(status);
    view.set_sort(sort);
    view.refresh(store).await.context("Failed to fetch sessions")?;

    for session in view.visible() {
        println!(
            "{:>5}  {:<10} {:<30} {:<16} {}",
            session.id,
            session.status,
            view.course_title(session),
            view.teacher_name(session.teacher_id),
            view.group_names(session),
        );
    }
    Ok(())
}

struct PrepareRequest {
    session_id: i64,
    topic: Option<String>,
    axes: Vec<String>,
    level: Option<Level>,
    language: Option<String>,
    validate: bool,
}

async fn prepare(
    client: Arc<ApiClient>,
    config: &TomlConfig,
    event_bus: Arc<EventBus>,
    request: PrepareRequest,
) -> Result<()> {
    let mut view = SessionListView::new();
    view.refresh(client.as_ref())
        .await
        .context("Failed to fetch sessions")?;
    let selection = view
        .selection(request.session_id)
        .ok_or_else(|| anyhow!("Session {} not found", request.session_id))?;

    let loader = SlideAudioLoader::new(client.clone())
        .with_policy(FallbackPolicy::from(&config.loader))
        .with_event_bus(Arc::clone(&event_bus));
    let mut wizard = PreparationWizard::new(
        client.clone(),
        client.clone(),
        Arc::new(loader),
        Arc::new(SilentBackend),
    )
    .with_completion_signal(Arc::new(FixedCountdown::new(config.wizard.countdown_secs)))
    .with_playback_config(PlaybackConfig::from(&config.playback))
    .with_event_bus(event_bus);

    wizard.select_session(selection)?;
    if let Some(language) = &request.language {
        wizard.set_language(language)?;
    }
    if let Some(topic) = &request.topic {
        wizard.set_topic(topic)?;
    }
    if let Some(level) = request.level {
        wizard.set_level(level)?;
    }
    for axis in &request.axes {
        wizard.add_axis(axis)?;
    }
    wizard.confirm_content()?;

    while let Some(update) = wizard.next_update().await {
        match update {
            WizardUpdate::CountdownTick { remaining_secs } if remaining_secs % 5 == 0 => {
                println!("Generating... {}s", remaining_secs);
            }
            WizardUpdate::Warning(warning) => eprintln!("warning: {}", warning),
            WizardUpdate::PresentationLoaded {
                slide_count,
                strategy,
            } => println!("Loaded {} slides ({})", slide_count, strategy),
            _ => {}
        }
    }

    let Some(playback) = wizard.playback() else {
        return Err(anyhow!("No slides available for session {}", request.session_id));
    };
    for slide in playback.presentation().iter() {
        println!(
            "{:>3}  {}{}",
            slide.index,
            slide.title,
            if slide.has_audio() { "" } else { "  (no narration)" }
        );
    }
    for warning in wizard.load_warnings() {
        eprintln!("warning: {}", warning);
    }

    if request.validate {
        wizard.validate().await?;
        println!("Session {} validated", request.session_id);
    }
    Ok(())
}

fn print_report(report: &LoadReport) {
    println!(
        "Session {}: {} slides via {}",
        report.presentation.session_id(),
        report.presentation.len(),
        report.strategy
    );
    for slide in report.presentation.iter() {
        let audio = match slide.audio.as_ref().and_then(|a| a.buffered_len()) {
            Some(bytes) => format!("{} bytes narration", bytes),
            None if slide.has_audio() => "remote narration".to_string(),
            None => "no narration".to_string(),
        };
        println!("{:>3}  {:<40} {}", slide.index, slide.title, audio);
    }
    for warning in &report.warnings {
        eprintln!("warning: {}", warning);
    }
}

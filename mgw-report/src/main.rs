//! mgw-report - Mangrove Watch report client
//!
//! Submits photo reports to the Mangrove Watch backend from the command line
//! and manages the locally stored login session.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use mgw_common::config::{config_file_path, load_toml_config, RootFolderInitializer, TomlConfig};
use mgw_common::events::EventBus;
use mgw_common::session::{AuthSession, SessionContext, SessionStore};
use mgw_report::capture::{MediaCapture, NoCamera, StillImageCamera};
use mgw_report::config::{ConfigOverrides, ReportConfig, MODULE_NAME};
use mgw_report::geolocation::{FixedLocation, LocationProvider, UnsupportedLocation};
use mgw_report::{
    ApiClient, CaptureMode, Coordinates, ReportPage, SelectedFile, StatsWatcher, SubmitResult,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mgw-report", about = "Report mangrove issues to Mangrove Watch")]
#[command(version)]
struct Cli {
    /// Backend base URL
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Folder holding the login session
    #[arg(long, global = true)]
    root_folder: Option<PathBuf>,

    /// TOML config file (default: <config dir>/mangrove-watch/mgw-report.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a photo report
    Submit(SubmitArgs),
    /// Store a login session
    Login(LoginArgs),
    /// Remove the login session
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Show conservation points for the logged-in user
    Points,
    /// Check that the backend is reachable
    Health,
}

#[derive(Args)]
struct SubmitArgs {
    /// Photo to report (max 5MB)
    #[arg(long)]
    image: PathBuf,

    /// What is wrong at this site
    #[arg(long)]
    description: String,

    /// Treat the photo as a camera capture (re-encoded, device location attached)
    #[arg(long)]
    camera: bool,

    /// Device latitude, used with --camera
    #[arg(long, requires = "lon", allow_hyphen_values = true)]
    lat: Option<f64>,

    /// Device longitude, used with --camera
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    lon: Option<f64>,
}

#[derive(Args)]
struct LoginArgs {
    #[arg(long)]
    username: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    user_id: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let toml_config = load_config(cli.config.as_ref());
    let overrides = ConfigOverrides {
        api_base_url: cli.api_url.clone(),
        root_folder: cli.root_folder.clone(),
    };
    let config = ReportConfig::resolve(&overrides, &toml_config);

    let level = if cli.verbose {
        "debug"
    } else {
        config.log_level.as_str()
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("mgw_report={level},mgw_common={level}")));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting {} {}", MODULE_NAME, env!("CARGO_PKG_VERSION"));

    let initializer = RootFolderInitializer::new(config.root_folder.clone());
    initializer
        .ensure_directory_exists()
        .context("Failed to initialize root folder")?;

    let event_bus = EventBus::new(64);
    let session = Arc::new(SessionStore::new(config.session_path(), event_bus.clone()));
    let client = Arc::new(
        ApiClient::new(&config.api_base_url, config.connect_timeout)
            .context("Failed to create backend client")?,
    );

    match cli.command {
        Commands::Submit(args) => submit(args, client, session, event_bus).await,
        Commands::Login(args) => {
            session.set_auth(&AuthSession {
                username: args.username,
                email: args.email,
                user_id: args.user_id,
            })?;
            println!("Logged in");
            Ok(())
        }
        Commands::Logout => {
            session.clear_auth()?;
            println!("Logged out");
            Ok(())
        }
        Commands::Whoami => {
            match session.get_auth() {
                Some(auth) => println!("{} <{}> (user {})", auth.username, auth.email, auth.user_id),
                None => println!("Not logged in"),
            }
            Ok(())
        }
        Commands::Points => {
            let watcher = StatsWatcher::new(client, session.clone());
            watcher.refresh().await;
            match watcher.points().await {
                Some(p) => println!("Points: {}  Reports: {}", p.points, p.total_reports),
                None if session.is_authenticated() => bail!("Could not fetch points"),
                None => println!("Not logged in"),
            }
            Ok(())
        }
        Commands::Health => {
            let message = client.health().await?;
            println!("{}", message);
            Ok(())
        }
    }
}

fn load_config(explicit: Option<&PathBuf>) -> TomlConfig {
    let path = match explicit {
        Some(path) => path.clone(),
        None => match config_file_path(MODULE_NAME) {
            Ok(path) => path,
            Err(e) => {
                eprintln!("Warning: {} (using defaults)", e);
                return TomlConfig::default();
            }
        },
    };
    // Logging is not up yet; report problems on stderr
    load_toml_config(&path).unwrap_or_else(|e| {
        eprintln!("Warning: {} (using defaults)", e);
        TomlConfig::default()
    })
}

async fn submit(
    args: SubmitArgs,
    client: Arc<ApiClient>,
    session: Arc<SessionStore>,
    event_bus: EventBus,
) -> Result<()> {
    let media: Arc<dyn MediaCapture> = if args.camera {
        Arc::new(StillImageCamera::from_path(&args.image)?)
    } else {
        Arc::new(NoCamera)
    };
    let location: Arc<dyn LocationProvider> = match (args.lat, args.lon) {
        (Some(latitude), Some(longitude)) => Arc::new(FixedLocation(Coordinates {
            latitude,
            longitude,
        })),
        _ => Arc::new(UnsupportedLocation),
    };

    let stats = Arc::new(StatsWatcher::new(client.clone(), session.clone()));
    let mut stats_rx = event_bus.subscribe();

    let page = ReportPage::new(media, location, client, session, event_bus);
    page.mount().await;
    if let Some(advisory) = page.advisory_message() {
        if args.camera {
            warn!(%advisory, "Submitting without device location");
        }
    }

    if args.camera {
        page.select_mode(CaptureMode::Camera);
        page.start_capture().await?;
        page.capture_photo()?;
    } else {
        let file = SelectedFile::from_path(&args.image)
            .with_context(|| format!("Failed to read {}", args.image.display()))?;
        page.select_file(file)?;
    }
    page.set_description(args.description);

    let result = page.submit().await;
    page.unmount();

    match result {
        Ok(SubmitResult::Resolved { message }) => {
            println!("{}", message);
            if stats_rx.try_recv().is_ok() {
                stats.refresh().await;
                if let Some(p) = stats.points().await {
                    println!("Points: {}  Reports: {}", p.points, p.total_reports);
                }
            }
            Ok(())
        }
        Ok(SubmitResult::Ignored) => bail!("A submission is already in progress"),
        Err(e) => {
            let message = page
                .toast()
                .map(|t| t.message)
                .unwrap_or_else(|| e.to_string());
            bail!(message)
        }
    }
}

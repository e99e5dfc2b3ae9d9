use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use newsfeed_notifications::badge::{format_badge, BadgeDriver, BadgeOptions};
use newsfeed_notifications::config::{AppConfig, CliConfig, FileConfig};
use newsfeed_notifications::local_notifications::{
    sample_notification, LocalNotificationScheduler, NotificationPlatform, PermissionState,
    SimulatedPlatform,
};
use newsfeed_notifications::notifications::{
    FilterSelection, NotificationRecord, NotificationService, NotificationType,
};
use newsfeed_notifications::remote::{
    HttpNotificationsApi, InMemoryNotificationsApi, NotificationsApi,
};
use newsfeed_notifications::settings::{NotificationSetting, SettingsSync};
use newsfeed_notifications::NotificationCenter;

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to a TOML config file. Values in the file override CLI arguments.
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// Base URL of the news API.
    #[clap(long)]
    pub api_base_url: Option<String>,

    /// Bearer token sent with every API request.
    #[clap(long)]
    pub api_token: Option<String>,

    /// Timeout in seconds for API requests.
    #[clap(long)]
    pub api_timeout_sec: Option<u64>,

    /// Interval in seconds between badge count refreshes.
    #[clap(long)]
    pub badge_poll_interval_secs: Option<u64>,

    /// Interval in seconds between list refreshes while watching. 0 disables it.
    #[clap(long)]
    pub list_refresh_interval_secs: Option<u64>,

    /// Use a built-in in-memory feed instead of the remote API.
    #[clap(long)]
    pub demo: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Shows the notification list, optionally filtered by category
    /// (comma-separated, e.g. `news,like`).
    List {
        #[clap(long)]
        filter: Option<FilterSelection>,

        /// Keep the list open and print it again whenever it changes.
        #[clap(long)]
        watch: bool,
    },

    /// Marks a single notification as read.
    MarkRead { id: String },

    /// Marks every notification as read.
    MarkAllRead,

    /// Shows the unread badge.
    Badge {
        /// Keep polling and print every badge change.
        #[clap(long)]
        watch: bool,
    },

    /// Schedules a sample local notification of the given category and waits
    /// for it to be delivered. Categories muted in the settings are skipped.
    TestNotification {
        notification_type: NotificationType,

        /// Delay in seconds before delivery.
        #[clap(long, default_value_t = 2)]
        delay: u64,
    },

    /// Shows the notification settings, applying any `--set key=value` first.
    Settings {
        #[clap(long = "set")]
        set: Vec<NotificationSetting>,
    },
}

struct Runtime {
    api: Arc<dyn NotificationsApi>,
    badge_options: BadgeOptions,
    list_refresh_interval: Option<Duration>,
}

fn build_runtime(cli_args: &CliArgs) -> Result<Runtime> {
    if cli_args.demo {
        info!("Running against the in-memory demo feed");
        return Ok(Runtime {
            api: Arc::new(InMemoryNotificationsApi::with_demo_feed()),
            badge_options: BadgeOptions::default(),
            list_refresh_interval: cli_args
                .list_refresh_interval_secs
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
        });
    }

    let file_config = match &cli_args.config {
        Some(path) => Some(FileConfig::load(path)?),
        None => None,
    };
    let cli_config = CliConfig {
        api_base_url: cli_args.api_base_url.clone(),
        api_token: cli_args.api_token.clone(),
        api_timeout_sec: cli_args.api_timeout_sec,
        badge_poll_interval_secs: cli_args.badge_poll_interval_secs,
        list_refresh_interval_secs: cli_args.list_refresh_interval_secs,
    };
    let config = AppConfig::resolve(&cli_config, file_config)?;

    info!("Using news API at {}", config.api_base_url);
    let api = HttpNotificationsApi::new(
        config.api_base_url.clone(),
        config.api_token.clone(),
        config.api_timeout_sec,
    )?;
    Ok(Runtime {
        api: Arc::new(api),
        badge_options: config.badge_options(),
        list_refresh_interval: config.list_refresh_interval,
    })
}

fn print_list(records: &[NotificationRecord]) {
    if records.is_empty() {
        println!("No notifications.");
        return;
    }
    for n in records {
        let marker = if n.read { " " } else { "*" };
        let action = if n.is_actionable() { " [action]" } else { "" };
        println!(
            "{} {:<12} {:<8} {}{}",
            marker, n.id, n.notification_type, n.title, action
        );
    }
}

async fn load_center(api: Arc<dyn NotificationsApi>) -> Result<NotificationCenter> {
    let center = NotificationCenter::new(api);
    if !center.refresh().await {
        bail!("Failed to load notifications");
    }
    Ok(center)
}

async fn run_list(runtime: Runtime, filter: Option<FilterSelection>, watch: bool) -> Result<()> {
    let center = load_center(runtime.api).await?;
    if let Some(filter) = filter {
        center.set_filter(filter);
    }
    print_list(&center.visible());
    println!("{} unread", center.unread_count());

    if !watch {
        return Ok(());
    }
    let Some(interval) = runtime.list_refresh_interval else {
        bail!("--watch requires a list refresh interval greater than 0");
    };

    let mut snapshots = center.store().subscribe();
    let refresh = center.start_auto_refresh(interval);
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                println!();
                print_list(&center.visible());
                println!("{} unread", center.unread_count());
            }
        }
    }
    refresh.stop().await;
    Ok(())
}

async fn run_mark_read(runtime: Runtime, id: &str) -> Result<()> {
    let center = load_center(runtime.api).await?;
    match center.mark_one_read(id) {
        Some(confirmation) => {
            confirmation.confirmed().await?;
            println!("Marked {} as read", id);
        }
        None => println!("Nothing to do: {} is unknown or already read", id),
    }
    Ok(())
}

async fn run_mark_all_read(runtime: Runtime) -> Result<()> {
    let center = load_center(runtime.api).await?;
    match center.mark_all_read() {
        Some(confirmation) => {
            confirmation.confirmed().await?;
            println!("All notifications marked as read");
        }
        None => println!("Mark-all already in progress"),
    }
    Ok(())
}

async fn run_badge(runtime: Runtime, watch: bool) -> Result<()> {
    let service = Arc::new(NotificationService::new(runtime.api));
    if !watch {
        let count = service.get_unread_count().await;
        println!("{}", format_badge(count).unwrap_or_else(|| "(no badge)".to_string()));
        return Ok(());
    }

    let driver = BadgeDriver::mount(service, runtime.badge_options);
    let mut states = driver.subscribe();
    let mut last_pulses = 0;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = *states.borrow_and_update();
                let pulse = if state.pulses > last_pulses { " (pulse)" } else { "" };
                last_pulses = state.pulses;
                println!(
                    "{}{}",
                    state.label().unwrap_or_else(|| "(no badge)".to_string()),
                    pulse
                );
            }
        }
    }
    driver.teardown().await;
    Ok(())
}

async fn run_test_notification(
    runtime: Runtime,
    notification_type: NotificationType,
    delay: u64,
) -> Result<()> {
    let sync = SettingsSync::new(runtime.api);
    if let Err(e) = sync.hydrate().await {
        warn!("Could not load settings, using defaults: {:#}", e);
    }
    if !sync.allows(notification_type) {
        println!("{} notifications are turned off in settings.", notification_type);
        return Ok(());
    }

    // No device here: the simulated platform asks for permission once and
    // gets it.
    let platform = Arc::new(SimulatedPlatform::new(
        PermissionState::Undetermined,
        PermissionState::Granted,
    ));
    let mut responses = platform.subscribe_responses();
    let scheduler = LocalNotificationScheduler::new(platform);

    let sample = sample_notification(notification_type);
    let scheduled = scheduler
        .schedule(sample.title, sample.body, sample.data, delay)
        .await?;
    let Some(schedule_id) = scheduled else {
        println!("Notification permission not granted.");
        return Ok(());
    };
    println!("Scheduled {} in {}s", schedule_id, delay);

    let response = tokio::time::timeout(Duration::from_secs(delay + 5), responses.recv())
        .await
        .context("Timed out waiting for the notification")?
        .context("Notification platform closed")?;
    println!(
        "Delivered \"{}\": {}",
        response.content.title, response.content.body
    );
    println!("Route: {}", serde_json::to_string(&response.route())?);
    Ok(())
}

async fn run_settings(runtime: Runtime, updates: Vec<NotificationSetting>) -> Result<()> {
    let sync = SettingsSync::new(runtime.api);
    if let Err(e) = sync.hydrate().await {
        warn!("Could not load settings, showing defaults: {:#}", e);
    }
    for setting in updates {
        sync.update(setting).await?;
    }
    for setting in sync.current().all() {
        println!("{:<14} {}", setting.key(), setting.value());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    let runtime = build_runtime(&cli_args)?;
    match cli_args.command {
        Command::List { filter, watch } => run_list(runtime, filter, watch).await,
        Command::MarkRead { id } => run_mark_read(runtime, &id).await,
        Command::MarkAllRead => run_mark_all_read(runtime).await,
        Command::Badge { watch } => run_badge(runtime, watch).await,
        Command::Settings { set } => run_settings(runtime, set).await,
        Command::TestNotification {
            notification_type,
            delay,
        } => run_test_notification(runtime, notification_type, delay).await,
    }
}

// wallpanel — turn a spare screen into a presence-aware wall display

use anyhow::{Context, Result};
use clap::Parser;
use dirs::home_dir;
use port_check::is_local_ipv4_port_free;
use std::fs;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::signal;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};
use wallpanel_core::{DisplayDriver, SettingsStore};
use wallpanel_server::display::{LoggingDisplay, SysfsBacklight};
use wallpanel_server::{serve, Cli, Session};

const DISPLAY: &str = r"
                _ _                         _
 __      ____ _| | |_ __   __ _ _ __   ___| |
 \ \ /\ / / _` | | | '_ \ / _` | '_ \ / _ \ |
  \ V  V / (_| | | | |_) | (_| | | | |  __/ |
   \_/\_/ \__,_|_|_| .__/ \__,_|_| |_|\___|_|
                   |_|
";

fn get_base_dir(custom: &Option<PathBuf>) -> Result<PathBuf> {
    let default_path = home_dir()
        .ok_or_else(|| anyhow::anyhow!("failed to get home directory"))?
        .join(".wallpanel");
    let base_dir = custom.clone().unwrap_or(default_path);
    fs::create_dir_all(base_dir.join("logs"))?;
    Ok(base_dir)
}

fn setup_logging(base_dir: &Path, cli: &Cli) -> Result<WorkerGuard> {
    let file_appender = tracing_appender::rolling::daily(base_dir.join("logs"), "wallpanel.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let make_env_filter = || {
        let filter = EnvFilter::from_default_env().add_directive("info".parse().unwrap());
        if cli.debug {
            filter
                .add_directive("wallpanel_core=debug".parse().unwrap())
                .add_directive("wallpanel_server=debug".parse().unwrap())
        } else {
            filter
        }
    };

    let timer = fmt::time::ChronoLocal::new("%Y-%m-%dT%H:%M:%S%.6fZ".to_string());

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stdout)
                .with_timer(timer.clone())
                .with_filter(make_env_filter()),
        )
        .with(
            fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false)
                .with_timer(timer)
                .with_filter(make_env_filter()),
        )
        .try_init()
        .context("failed to initialize tracing subscriber")?;

    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let base_dir = get_base_dir(&cli.data_dir)?;
    let _guard = setup_logging(&base_dir, &cli)?;

    println!("{}", DISPLAY);

    if !is_local_ipv4_port_free(cli.port) {
        anyhow::bail!("control port {} is already in use", cli.port);
    }

    let display: Arc<dyn DisplayDriver> = match &cli.backlight {
        Some(device) => Arc::new(SysfsBacklight::open(device)?),
        None => Arc::new(LoggingDisplay),
    };

    let store = SettingsStore::new(base_dir.join("settings.json"));
    let session = Session::start(store, display).await;

    let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), cli.port);
    let teardown = session.clone();
    serve(addr, session, async {
        let _ = signal::ctrl_c().await;
        info!("shutdown signal received");
    })
    .await?;

    // The API has drained: no more sensor input can arrive. Tear down the
    // controller and the stream server.
    teardown.shutdown().await;
    info!("wallpanel stopped");
    Ok(())
}

use anyhow::{Context, Result};
use badlads_runtime::{metrics, shared, NullGame, PluginHost, RuntimeConfig, RuntimeError};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use std::time::Instant;
use tokio::signal;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, info, warn, Level};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan a plugin module and print what the host would wire up.
    Inspect {
        /// Plugin `.wasm` (or `.wat`) file.
        #[clap(value_parser)]
        plugin: PathBuf,

        /// Accept imports this host does not provide.
        #[clap(long)]
        lenient: bool,
    },
    /// Run a plugin against an empty game, reloading it when the file changes.
    Run {
        /// Path to the runner configuration file.
        #[clap(short, long, value_parser, default_value = "badlads-host.toml")]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    match args.command {
        Command::Inspect { plugin, lenient } => {
            init_tracing(None);
            inspect(plugin, lenient)
        }
        Command::Run { config } => {
            let config = RuntimeConfig::load(&config)
                .with_context(|| format!("Failed to load configuration file: {:?}", config))?;
            init_tracing(config.log_level.as_deref());
            run(config).await
        }
    }
}

fn init_tracing(log_level: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level.unwrap_or("info")))
        .unwrap_or_else(|_| EnvFilter::new(Level::INFO.to_string()));

    fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn inspect(plugin: PathBuf, lenient: bool) -> Result<()> {
    let bytes = fs::read(&plugin).with_context(|| format!("Failed to read plugin: {:?}", plugin))?;
    let host = PluginHost::new(shared(NullGame), !lenient)?;
    let report = host.inspect(&bytes)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn run(config: RuntimeConfig) -> Result<()> {
    info!("Loading plugin from: {:?}", config.plugin_path);
    let mut host = PluginHost::new(shared(NullGame), config.strict_imports)?;
    host.load_file(&config.plugin_path)?;
    host.start()?;

    let mut ticker = time::interval(config.tick_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut watcher = time::interval(config.watch_interval());
    watcher.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut ticks: u64 = 0;
    let mut last_tick = Instant::now();
    loop {
        if config.max_ticks.is_some_and(|max| ticks >= max) {
            info!(ticks, "Tick limit reached.");
            break;
        }
        tokio::select! {
            _ = ticker.tick() => {
                let now = Instant::now();
                let delta = now.duration_since(last_tick).as_secs_f32();
                last_tick = now;
                ticks += 1;
                if let Err(e) = host.tick(delta) {
                    error!("Plugin tick failed: {}", e);
                }
            }
            _ = watcher.tick() => {
                match host.reload_if_changed() {
                    Ok(true) => info!("Plugin reloaded from {:?}", config.plugin_path),
                    Ok(false) => {}
                    Err(e @ RuntimeError::ReloadStart(_)) => {
                        error!("New plugin build is running but did not start cleanly: {}", e)
                    }
                    Err(e) => warn!("Plugin reload failed, still running the previous build: {}", e),
                }
            }
            _ = signal::ctrl_c() => {
                info!("Received shutdown signal (Ctrl+C).");
                break;
            }
        }
    }

    info!("Shutting down plugin host...");
    if let Err(e) = host.stop() {
        error!("Plugin onStop failed: {}", e);
    }
    debug!("Final metrics:\n{}", metrics::gather_text());
    Ok(())
}

use arachne_dashboard::client::AnalyticsClient;
use arachne_dashboard::config::{ConfigLoader, DashboardConfig};
use arachne_dashboard::dashboard::Dashboard;
use arachne_dashboard::models::TimeRange;
use arachne_dashboard::output::DashboardRenderer;
use arachne_dashboard::output::console::ConsoleOutput;
use arachne_dashboard::output::json::JsonOutput;
use arachne_dashboard::proxy::{self, ProxyState};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::LinesStream;

#[derive(Parser)]
#[command(name = "arachne-dashboard")]
#[command(version = "0.1.0")]
#[command(about = "Analytics dashboard and jobs proxy for the Arachne scraping service", long_about = None)]
struct Cli {
    /// Path to a configuration file (JSON/YAML/TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the analytics once and render them
    Show {
        /// Lookback window in days (7, 30 or 90)
        #[arg(short, long)]
        days: Option<TimeRange>,

        #[arg(short, long, value_enum, default_value_t = Format::Console)]
        format: Format,

        /// Write JSON output to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Hide the loading spinner
        #[arg(short, long)]
        quiet: bool,
    },
    /// Keep the dashboard open: type 7/30/90 to switch range, r to retry, q to quit
    Interactive {
        #[arg(short, long)]
        days: Option<TimeRange>,
    },
    /// Serve the jobs proxy
    Proxy {
        /// Address to bind, overrides the config file
        #[arg(short, long)]
        listen: Option<String>,
    },
    /// Validate the configuration
    Check,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Console,
    Json,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let logger = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .build();
    let multi = Arc::new(MultiProgress::new());

    let with_spinner = matches!(
        cli.command,
        Commands::Show { quiet: false, .. } | Commands::Interactive { .. }
    );
    if with_spinner {
        indicatif_log_bridge::LogWrapper::new((*multi).clone(), logger).try_init()?;
    } else {
        let level = logger.filter();
        log::set_boxed_logger(Box::new(logger))?;
        log::set_max_level(level);
    }

    match cli.command {
        Commands::Show {
            days,
            format,
            output,
            quiet,
        } => {
            let config = load_config(cli.config.as_deref())?;
            let dashboard = build_dashboard(&config, days)?;

            let state = if quiet {
                dashboard.load().await
            } else {
                spin(&multi, dashboard.load()).await
            };

            let mut renderer: Box<dyn DashboardRenderer> = match format {
                Format::Console => Box::new(ConsoleOutput::new(None)),
                Format::Json => Box::new(JsonOutput::new(output)),
            };
            renderer.render(&dashboard.view().await).await?;

            if state.error().is_some() {
                std::process::exit(1);
            }
        }
        Commands::Interactive { days } => {
            let config = load_config(cli.config.as_deref())?;
            let dashboard = build_dashboard(&config, days)?;
            interactive(&dashboard, multi).await?;
        }
        Commands::Proxy { listen } => {
            let config = load_config(cli.config.as_deref())?;
            let addr = listen.unwrap_or_else(|| config.listen_addr.clone());
            let state = ProxyState::from_config(&config)?;
            let listener = tokio::net::TcpListener::bind(&addr).await?;

            proxy::serve(listener, state, async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    log::error!("Failed to listen for Ctrl-C: {}", e);
                }
                log::info!("Shutting down...");
            })
            .await?;
        }
        Commands::Check => match load_config(cli.config.as_deref()) {
            Ok(cfg) => {
                println!("✅ Config is valid:");
                println!("   Analytics API: {}", cfg.analytics_base()?);
                println!("   Jobs backend:  {}", cfg.jobs_backend());
                println!("   Listen:        {}", cfg.listen_addr);
                println!("   Time range:    {}", cfg.time_range);
            }
            Err(e) => {
                eprintln!("❌ Config error: {}", e);
                std::process::exit(1);
            }
        },
    }

    Ok(())
}

fn load_config(path: Option<&std::path::Path>) -> arachne_dashboard::Result<DashboardConfig> {
    if let Some(path) = path {
        log::info!("Loading config from {:?}", path);
    }
    ConfigLoader::load(path)
}

fn build_dashboard(config: &DashboardConfig, days: Option<TimeRange>) -> anyhow::Result<Dashboard> {
    let client = AnalyticsClient::from_config(config)?;
    log::info!("Analytics API: {}", client.base());
    Ok(Dashboard::new(
        Arc::new(client),
        days.unwrap_or(config.time_range),
    ))
}

async fn spin<F: Future>(multi: &MultiProgress, fut: F) -> F::Output {
    let pb = multi.add(ProgressBar::new_spinner());
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message("Loading analytics...");
    pb.enable_steady_tick(Duration::from_millis(100));
    let out = fut.await;
    pb.finish_and_clear();
    out
}

async fn interactive(dashboard: &Dashboard, multi: Arc<MultiProgress>) -> anyhow::Result<()> {
    let mut renderer = ConsoleOutput::new(Some(multi.clone()));

    spin(&multi, dashboard.load()).await;
    renderer.render(&dashboard.view().await).await?;

    let mut lines = LinesStream::new(BufReader::new(tokio::io::stdin()).lines());
    multi.println("[7|30|90] change range, [r] retry, [q] quit")?;

    while let Some(line) = lines.next().await {
        let line = line?;
        match line.trim() {
            "" => continue,
            "q" | "quit" => break,
            "r" | "retry" => {
                spin(&multi, dashboard.retry()).await;
            }
            other => match other.parse::<TimeRange>() {
                Ok(range) => {
                    spin(&multi, dashboard.set_time_range(range)).await;
                }
                Err(e) => {
                    multi.println(format!("{}", e))?;
                    continue;
                }
            },
        }
        renderer.render(&dashboard.view().await).await?;
    }

    Ok(())
}

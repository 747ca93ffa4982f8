//! `onebot-image-check` - run the endpoint checks against a live service

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use onebot_image_e2e::{report, HarnessConfig, Suite, TestRunner};

#[derive(Parser, Debug)]
#[command(name = "onebot-image-check")]
#[command(about = "Contract checks for the OneBot Info Image API")]
struct Args {
    /// TOML config file; command-line values take precedence
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Service address, e.g. http://localhost:8805
    #[arg(long)]
    base_url: Option<String>,

    /// Path prefix the API is mounted under
    #[arg(long)]
    root_router: Option<String>,

    /// Artifact root directory
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Which cases to run
    #[arg(short, long, value_enum, default_value_t = Suite::Full)]
    suite: Suite,

    /// Also write <output>/test-results.json
    #[arg(long)]
    report: bool,

    /// Enable debug output (full response bodies)
    #[arg(short, long)]
    verbose: bool,
}

fn load_config(args: &Args) -> anyhow::Result<HarnessConfig> {
    let mut config = match &args.config {
        Some(path) => HarnessConfig::from_file(path)?,
        None => HarnessConfig::default(),
    };
    if let Some(base_url) = &args.base_url {
        config.base_url = base_url.clone();
    }
    if let Some(root_router) = &args.root_router {
        config.root_router = root_router.clone();
    }
    if let Some(output) = &args.output {
        config.output_dir = output.clone();
    }
    config.validate()?;
    Ok(config)
}

async fn async_main(args: Args) -> anyhow::Result<bool> {
    let config = load_config(&args)?;
    let runner = TestRunner::new(config)?;

    let results = runner.run(args.suite).await;
    println!("{}", report::render_summary(&results));

    if args.report {
        runner.write_report(&results)?;
    }

    Ok(!results.is_aborted())
}

fn main() {
    let args = Args::parse();

    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)),
        )
        .with_target(false)
        .init();

    // Calls are strictly sequential; one thread is enough.
    let rt = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: failed to create tokio runtime: {}", e);
            std::process::exit(2);
        }
    };

    match rt.block_on(async_main(args)) {
        Ok(true) => std::process::exit(0),
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(2);
        }
    }
}

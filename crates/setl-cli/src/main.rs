//! 🚀 setl-cli: the front door of the sales ETL.
//!
//! 🎬 *[narrator voice]* "It all started with a simple main() function..."
//! 📦 This binary sets up logging, loads config, runs the pipeline once and
//! prints the receipt. Then it idles until someone presses Ctrl+C, unless
//! `--once` says to leave right away. 🦆

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// 🚀 Batch sales ETL: CSV files, staging table and remote provider in, one rollup out.
#[derive(Debug, Parser)]
#[command(name = "setl", version)]
struct Args {
    /// 🔧 TOML config file. Defaults to ./setl.toml when it exists, env vars (SETL_*) otherwise.
    #[arg(short, long, env = "SETL_CONFIG")]
    config: Option<PathBuf>,

    /// 🏁 Exit after the run instead of idling until Ctrl+C.
    #[arg(long)]
    once: bool,
}

const DEFAULT_CONFIG_FILE: &str = "setl.toml";

/// 🔍 Explicit path must exist. The default path is optional.
fn resolve_config_path(explicit: Option<PathBuf>) -> Result<Option<PathBuf>> {
    match explicit {
        Some(path) => {
            let exists = path.try_exists().with_context(|| {
                format!("💀 Could not check whether the config file '{}' exists", path.display())
            })?;
            if !exists {
                anyhow::bail!(
                    "💀 Config file '{}' was not found. Relative paths resolve against the current directory; \
                     when in doubt, use an absolute path.",
                    path.display()
                );
            }
            Ok(Some(path))
        }
        None => {
            let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
            Ok(fallback.try_exists().unwrap_or(false).then_some(fallback))
        }
    }
}

/// 💀 Print the error and each cause, with a hint when it smells like a network problem.
fn report_bootstrap_failure(err: &anyhow::Error) {
    error!("💀 error: {}", err);
    let mut the_vibes_are_giving_connection_issues = false;
    for cause in err.chain().skip(1) {
        error!("⚠️  cause: {}", cause);
        let cause_str = cause.to_string();
        if cause_str.contains("error sending request")
            || cause_str.contains("connection refused")
            || cause_str.contains("Connection refused")
            || cause_str.contains("tcp connect error")
            || cause_str.contains("dns error")
        {
            the_vibes_are_giving_connection_issues = true;
        }
    }
    if the_vibes_are_giving_connection_issues {
        error!(
            "🔧 hint: looks like a service isn't reachable. Check that PostgreSQL (or the remote \
             sales provider) is actually running. `docker ps` is a good first question."
        );
    }
}

/// ⚠️ The table says "load failed" quietly; this says it in the log too.
fn flag_failed_load(report: &setl::RunReport) -> bool {
    let failed = report.load_failed();
    if failed {
        warn!("💀 the load step failed this run, staging and the rollup were not updated (see the error above)");
    }
    failed
}

async fn bootstrap_and_run(args: Args) -> Result<setl::RunReport> {
    let config_path = resolve_config_path(args.config)?;
    let app_config = setl::app_config::load_config(config_path.as_deref())
        .context("💀 Could not load the configuration. Check the TOML file and any SETL_* variables.")?;
    setl::run(app_config).await
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let once = args.once;

    let report = match bootstrap_and_run(args).await {
        Ok(report) => report,
        Err(err) => {
            report_bootstrap_failure(&err);
            std::process::exit(1);
        }
    };

    println!("{}", report.render_table());
    flag_failed_load(&report);

    if once {
        return Ok(());
    }

    info!("💤 run complete, idling until Ctrl+C");
    tokio::signal::ctrl_c()
        .await
        .context("💀 Could not listen for Ctrl+C")?;
    info!("👋 shutting down");
    Ok(())
}

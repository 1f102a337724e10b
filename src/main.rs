//! `court-reserver` binary.

use std::cell::RefCell;
use std::process::ExitCode;

use chrono::Local;
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use court_reserver::{AgentLauncher, ChromeLauncher, Cli, Engine, Error, Result};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Run aborted");
            ExitCode::FAILURE
        }
    }
}

/// Installs the log sink. `RUST_LOG` overrides the flag-derived filter.
fn init_logging(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let config = cli.to_config(Local::now().date_naive())?;
    let trigger = cli.trigger()?;

    let mut builder = ChromeLauncher::builder().options(cli.chrome_options());
    if let Some(path) = &cli.browser {
        builder = builder.binary(path);
    }
    let launcher = builder.build()?;

    // Fail before waiting on a schedule.
    launcher.preflight().await?;

    let engine = Engine::new(launcher, config);
    let fatal: RefCell<Option<Error>> = RefCell::new(None);
    let fatal_slot = &fatal;

    trigger
        .run(move || {
            let engine = engine.clone();
            async move {
                if let Err(e) = engine.run().await {
                    error!(error = %e, "Browser engine unavailable");
                    fatal_slot.borrow_mut().get_or_insert(e);
                }
            }
        })
        .await?;

    fatal.into_inner().map_or(Ok(()), Err)
}

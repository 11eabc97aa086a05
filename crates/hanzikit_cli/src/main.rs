//! `hanzikit` binary: Traditional/Simplified Chinese conversion over files and trees.

mod cli;
mod conf;
mod run;

use std::io;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use hanzikit_text::ZhConverter;
use tracing::{debug, warn};

use crate::cli::Cli;
use crate::conf::resolve_input_path;
use crate::run::{run_interactive, run_path, write_summary};

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    debug!("{cli:?}");
    let converter = ZhConverter;
    let mut stdout = io::stdout().lock();

    if cli.interactive {
        let n_failed = run_interactive(&cli, io::stdin().lock(), &mut stdout, &converter)?;
        return Ok(exit_code(n_failed > 0));
    }

    let path_source = resolve_input_path(&cli)?;
    let report = run_path(&cli, &path_source, &converter)?;
    write_summary(&mut stdout, &report, cli.dry_run)?;
    if report.error_count() > 0 {
        warn!("{} file(s) or directories failed", report.error_count());
    }
    Ok(exit_code(report.error_count() > 0))
}

fn exit_code(if_has_errors: bool) -> ExitCode {
    if if_has_errors {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

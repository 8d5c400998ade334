mod cli;
mod cli_utils;
mod commands;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use cli::{Args, Command};
use owo_colors::OwoColorize;
use tracing_subscriber::EnvFilter;

/// Exit code for command-line usage errors.
const USAGE_EXIT_CODE: u8 = 64;

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::from(USAGE_EXIT_CODE)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    // RUST_LOG overrides; warnings only by default
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("savediff=warn,savediff_core=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            ExitCode::from(cli_utils::exit_code(&e))
        }
    }
}

fn run(args: Args) -> Result<()> {
    let config = cli_utils::load_config(args.config.as_deref())?;

    match args.command {
        Command::Decompress {
            save,
            frame,
            largest: _,
            output,
        } => commands::decompress::run(&config, &save, frame, &output),
        Command::Frames { save } => commands::frames::run(&config, &save),
        Command::Anchors {
            buffer,
            key,
            strings,
            min_len,
            max_len,
            radius,
            limit,
        } => {
            if strings {
                commands::anchors::run_strings(&config, &buffer, min_len, max_len, limit)
            } else {
                let key = key.unwrap_or_default();
                commands::anchors::run_key(&config, &buffer, &key, radius, limit)
            }
        }
        Command::Diff {
            baseline,
            probe,
            anchor,
            width,
            signed,
            window,
            limit,
        } => commands::diff::run(
            &config,
            &baseline,
            &probe,
            &anchor,
            width,
            signed,
            window,
            limit,
        ),
        Command::InferSchema {
            baseline,
            probes,
            anchor,
            output,
            window,
        } => commands::infer_schema::run(config, &baseline, &probes, &anchor, &output, window),
    }
}

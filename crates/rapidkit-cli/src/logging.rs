//! Tracing subscriber initialisation.
//!
//! Only the CLI crate is allowed to call [`init_logging`]; `rapidkit-core`
//! and `rapidkit-adapters` only *emit* spans and events.
//!
//! # Verbosity mapping
//!
//! | Flag(s)   | Filter level |
//! |-----------|--------------|
//! | (none)    | WARN         |
//! | `-v`      | INFO         |
//! | `-vv`     | DEBUG        |
//! | `-vvv`    | TRACE        |
//! | `--quiet` | ERROR        |
//! | `--debug` | at least DEBUG |
//!
//! `RUST_LOG` overrides all of the above if set.

use std::io::IsTerminal as _;

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::GlobalArgs;

/// Initialise the global tracing subscriber.
///
/// With `--log-file`, a second plain-text layer writes through a
/// non-blocking appender; the returned guard flushes it on drop and must be
/// held until the process exits.
pub fn init_logging(args: &GlobalArgs, force_debug: bool) -> anyhow::Result<Option<WorkerGuard>> {
    let level = derive_level(args, force_debug);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "rapidkit={level},rapidkit_cli={level},rapidkit_core={level},rapidkit_adapters={level}"
        ))
    });

    let use_ansi = !args.no_color && std::io::stderr().is_terminal();

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_ansi(use_ansi)
        .with_writer(std::io::stderr);

    let (file_layer, guard) = match &args.log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| std::path::Path::new("."));
            let file_name = path
                .file_name()
                .with_context(|| format!("Invalid log file path: {}", path.display()))?;
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

            let appender = tracing_appender::rolling::never(dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialise tracing: {e}"))?;

    Ok(guard)
}

/// Translate the verbosity counter, quiet flag and `--debug` to a level.
fn derive_level(args: &GlobalArgs, force_debug: bool) -> &'static str {
    if args.quiet {
        return "error";
    }
    match args.verbose {
        0 | 1 if force_debug => "debug",
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

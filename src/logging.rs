//! Diagnostic logging for the `totes` binary.
//!
//! Log lines go to stderr so they never mix with command output on stdout.
//! `TOTES_LOG` takes an `EnvFilter` directive (e.g. `tote_catalog_core=debug`)
//! and overrides `-v`.

use tracing_subscriber::{fmt, EnvFilter};

pub const LOG_ENV: &str = "TOTES_LOG";

fn default_directive(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info,sqlx=warn",
        2 => "debug,sqlx=warn",
        _ => "trace",
    }
}

pub fn init_logging(verbose: u8) {
    let filter = match std::env::var(LOG_ENV) {
        Ok(directive) if !directive.trim().is_empty() => EnvFilter::new(directive),
        _ => EnvFilter::new(default_directive(verbose)),
    };

    // A second init (e.g. from tests) keeps the first subscriber.
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

// SPDX-License-Identifier: GPL-2.0-or-later
use clap::{Parser, Subcommand};

use crate::config::{load_config, Config};

/// CLI to start the clipshare service and tidy its database.
///
/// # Logging
///
/// When running the service, log levels and filtering are controlled by tracing_subscriber's
/// EnvFilter using the RUST_LOG environment variable. Refer to the documentation at
/// https://docs.rs/tracing-subscriber/0.3.1/tracing_subscriber/filter/struct.EnvFilter.html
/// for complete details.
///
/// The most basic form is one of "trace", "debug", "info", "warn", or "error". For example:
///
/// RUST_LOG=warn
///
/// # Configuration
///
/// The configuration file is expected to be in TOML format.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Clipshare {
    /// Path to the clipshare configuration file; see clipshare.toml.example for details
    #[arg(value_parser = load_config, env = "CLIPSHARE_CONFIG")]
    pub config: Config,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP API
    Run {},
    /// Delete every clip whose expiry time has passed. The service does this on its own every
    /// `clips.purge_interval_secs`; this is for when it isn't running or the sweep is disabled.
    Purge {},
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use clap::CommandFactory;

    use super::*;

    #[test]
    fn verify_cli() {
        Clipshare::command().debug_assert();
    }

    #[test]
    fn parse_purge() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "data_directory = \"/tmp/clipshare\"").unwrap();

        let opts = Clipshare::try_parse_from([
            "clipshare-server",
            file.path().to_str().unwrap(),
            "purge",
        ])
        .unwrap();

        assert!(matches!(opts.command, Command::Purge {}));
    }
}

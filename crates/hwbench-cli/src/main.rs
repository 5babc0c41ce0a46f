mod cli;

use std::io::{self, Write};
use std::path::Path;

use anyhow::{bail, Result};
use clap::Parser;
use tracing::{debug, warn};

use hwbench_core::logging::{self, FilterHandle};
use hwbench_core::{Config, ConfigBuilder, LoggingConfig};
use hwbench_engine::{Bench, FileLogSink, Line};

/// Prefix of environment variables overriding the configuration
const ENV_PREFIX: &str = "HWBENCH";

/// Load the configuration, falling back to an empty bench when it cannot be read.
///
/// With a `logs` handle the configured log level is applied once loaded.
fn load_config(path: &Path, logs: Option<&FilterHandle>) -> Result<Config> {
    let loaded = ConfigBuilder::new()
        .with_config_file(path)
        .with_environment_prefix(ENV_PREFIX)
        .build();

    match loaded {
        Ok(config) => {
            if let Some(logs) = logs {
                logs.set_filter(&config.logging.level)?;
            }
            Ok(config)
        }
        Err(err) => {
            eprintln!("Error: {}", err);
            warn!(path = %path.display(), "Continuing with the default configuration");
            Ok(Config::default())
        }
    }
}

fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    if cli.config_example {
        println!("{}", Config::example().to_toml_pretty()?);
        return Ok(());
    }

    let (Some(config_path), Some(log_dir)) = (cli.config, cli.log_dir) else {
        bail!("both a configuration file and a log directory are required");
    };

    // Logging comes first so that configuration loading is traced too
    let logs = logging::init_with_filter(
        cli.log_level
            .as_deref()
            .unwrap_or(&LoggingConfig::default().level),
    )?;
    let config = load_config(&config_path, cli.log_level.is_none().then_some(&logs))?;

    debug!(config = ?config, log_dir = %log_dir.display(), "Starting bench");
    let mut bench = Bench::from_config(&config.bench, FileLogSink::new(&log_dir));

    let mut stdout = io::stdout().lock();
    let mut stderr = io::stderr().lock();
    let summary = bench.run(io::stdin().lock(), |line| {
        let written = match line {
            Line::Out(text) => writeln!(stdout, "{}", text),
            Line::Err(text) => writeln!(stderr, "{}", text),
        };
        if let Err(err) = written {
            warn!(error = %err, "Failed to print command output");
        }
    })?;
    stdout.flush()?;

    debug!(
        executed = summary.executed,
        saw_exit = summary.saw_exit,
        "Bench finished"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;
    use tempfile::tempdir;
    use tracing::Level;

    #[test]
    fn test_configured_level_applies_after_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bench.toml");
        fs::write(
            &path,
            "[bench]\nports = [\"I2C\"]\nmax_sensors = 1\n\n[logging]\nlevel = \"debug\"\n",
        )
        .unwrap();

        let logs = logging::init_with_filter("warn").unwrap();
        let config = load_config(&path, Some(&logs)).unwrap();

        assert_eq!(config.bench.ports, vec!["I2C"]);
        assert_eq!(config.logging.level, "debug");
        if env::var_os("RUST_LOG").is_none() {
            assert!(tracing::enabled!(Level::DEBUG));
        }
    }

    #[test]
    fn test_missing_config_falls_back_to_empty_bench() {
        let dir = tempdir().unwrap();
        let config = load_config(&dir.path().join("absent.cfg"), None).unwrap();
        assert_eq!(config, Config::default());
    }
}

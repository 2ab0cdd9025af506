//! Start-up plumbing shared by the `metrika-report` and `vk-likes` binaries.
use anyhow::{Context, Result};
use reachstat_common::observability::{LogConfig, init_logging};
use reachstat_config::{ReachConfig, ReachConfigLoader};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Picked up from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "reachstat.yaml";

/// Load `.env` into the environment and queue the config file (explicit or default).
fn config_loader(explicit: Option<&Path>) -> ReachConfigLoader {
    let loader = ReachConfigLoader::new().with_dotenv();
    match explicit {
        Some(path) => loader.with_file(path),
        None => loader.with_optional_file(DEFAULT_CONFIG_FILE),
    }
}

/// Load `.env`, then the config file, then env overlays.
pub fn load_config(explicit: Option<&Path>) -> Result<ReachConfig> {
    config_loader(explicit)
        .load()
        .context("failed to load configuration")
}

/// Common start of both binaries. `.env` is read before logging starts, so
/// `RUST_LOG` and `REACHSTAT_LOG_DIR` set there take effect.
///
/// Returns the configuration and the current log file.
pub fn bootstrap(
    app_name: &'static str,
    verbose: bool,
    explicit: Option<&Path>,
) -> Result<(ReachConfig, PathBuf)> {
    let loader = config_loader(explicit);
    let log_file = setup_logging(app_name, verbose)?;
    tracing::debug!(log_file = %log_file.display(), "app.logging.ready");
    let config = loader.load().context("failed to load configuration")?;
    Ok((config, log_file))
}

/// File logging for `app_name`; `verbose` mirrors debug events to stderr.
pub fn setup_logging(app_name: &'static str, verbose: bool) -> Result<PathBuf> {
    init_logging(LogConfig {
        app_name,
        emit_stderr: verbose,
        default_filter: if verbose { "debug" } else { "info" },
        ..LogConfig::default()
    })
}

pub fn request_timeout(config: &ReachConfig) -> Option<Duration> {
    config.http.timeout_secs.map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;

    #[test]
    #[serial]
    fn dotenv_is_read_before_logging_starts() {
        let tmp = tempfile::tempdir().unwrap();
        let log_dir = tmp.path().join("logs");
        fs::write(
            tmp.path().join(".env"),
            format!("REACHSTAT_LOG_DIR={}\n", log_dir.display()),
        )
        .unwrap();
        let previous = std::env::current_dir().unwrap();

        temp_env::with_vars(
            [
                ("REACHSTAT_LOG_DIR", None::<&str>),
                ("API_TOKEN", None),
                ("COUNTER_ID", None),
                ("VK_ACCESS_TOKEN", None),
            ],
            || {
                std::env::set_current_dir(tmp.path()).unwrap();
                let outcome = bootstrap("reachstat-app-test", false, None);
                std::env::set_current_dir(&previous).unwrap();

                let (_, log_file) = outcome.unwrap();
                assert!(log_file.starts_with(&log_dir), "{}", log_file.display());
                assert!(log_dir.is_dir());
            },
        );
    }

    #[test]
    #[serial]
    fn explicit_config_file_is_required() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("nope.yaml");
        assert!(load_config(Some(missing.as_path())).is_err());
    }

    #[test]
    #[serial]
    fn explicit_config_file_is_read() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("custom.yaml");
        fs::write(&path, "http:\n  timeout_secs: 12\nvk:\n  api_version: '5.131'\n").unwrap();
        temp_env::with_vars(
            [
                ("API_TOKEN", None::<&str>),
                ("COUNTER_ID", None),
                ("VK_ACCESS_TOKEN", None),
            ],
            || {
                let cfg = load_config(Some(path.as_path())).unwrap();
                assert_eq!(request_timeout(&cfg), Some(Duration::from_secs(12)));
                assert_eq!(cfg.vk.api_version, "5.131");
            },
        );
    }
}

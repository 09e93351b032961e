//! Tracing subscriber setup for applications embedding the sync controller.
//!
//! Environment variables:
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | RUST_LOG | notekeep_sync=info,notekeep_remote=info | Standard env filter |
//! | LOG_FORMAT | text | `json` or `text` |
//! | LOG_FILE | (stdout) | Log to this file with daily rotation |
//! | LOG_ANSI | auto | `true`/`false` to force ANSI colors |
//!
//! Every span opened by the library carries `subsystem` (`remote` or `sync`),
//! `component`, and `op` fields. Remote failures and partial failures log at
//! WARN, completed mutations at INFO, per-request detail at DEBUG.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "notekeep_sync=info,notekeep_remote=info";
const DEFAULT_LOG_FILE: &str = "notekeep.log";

/// Logging options, normally read from the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogSettings {
    pub json: bool,
    pub file: Option<String>,
    pub ansi: Option<bool>,
}

impl LogSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            json: lookup("LOG_FORMAT").as_deref() == Some("json"),
            file: lookup("LOG_FILE").filter(|f| !f.trim().is_empty()),
            ansi: lookup("LOG_ANSI").map(|v| v == "true" || v == "1"),
        }
    }
}

/// Install the global subscriber from the environment.
///
/// Returns the file writer guard when logging to a file; keep it alive for
/// the life of the process. Does nothing if a subscriber is already set.
pub fn init_tracing() -> Option<WorkerGuard> {
    init_tracing_with(&LogSettings::from_env())
}

/// Install the global subscriber from explicit settings.
pub fn init_tracing_with(settings: &LogSettings) -> Option<WorkerGuard> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let registry = tracing_subscriber::registry().with(env_filter);

    let (guard, result) = if let Some(ref path) = settings.file {
        let path = Path::new(path);
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let file_name = path
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or(DEFAULT_LOG_FILE);
        let appender = tracing_appender::rolling::daily(dir, file_name);
        let (writer, guard) = tracing_appender::non_blocking(appender);

        let result = if settings.json {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_writer(writer))
                .try_init()
        } else {
            // no ANSI in files unless forced
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(settings.ansi.unwrap_or(false));
            registry.with(layer).try_init()
        };
        (Some(guard), result)
    } else {
        let result = if settings.json {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .try_init()
        } else {
            let mut layer = tracing_subscriber::fmt::layer();
            if let Some(ansi) = settings.ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).try_init()
        };
        (None, result)
    };

    match result {
        Ok(()) => {
            tracing::info!(
                log_format = if settings.json { "json" } else { "text" },
                log_file = settings.file.as_deref().unwrap_or("(stdout)"),
                "Logging initialized"
            );
            guard
        }
        Err(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_defaults() {
        let settings = LogSettings::from_lookup(|_| None);
        assert_eq!(settings, LogSettings::default());
    }

    #[test]
    fn test_settings_from_lookup() {
        let settings = LogSettings::from_lookup(|key| match key {
            "LOG_FORMAT" => Some("json".to_string()),
            "LOG_FILE" => Some("/tmp/notekeep/app.log".to_string()),
            "LOG_ANSI" => Some("0".to_string()),
            _ => None,
        });
        assert!(settings.json);
        assert_eq!(settings.file.as_deref(), Some("/tmp/notekeep/app.log"));
        assert_eq!(settings.ansi, Some(false));
    }

    #[test]
    fn test_blank_log_file_means_stdout() {
        let settings = LogSettings::from_lookup(|key| match key {
            "LOG_FILE" => Some("  ".to_string()),
            _ => None,
        });
        assert!(settings.file.is_none());
    }

    #[test]
    fn test_second_init_is_noop() {
        let settings = LogSettings::default();
        let _ = init_tracing_with(&settings);
        assert!(init_tracing_with(&settings).is_none());
    }
}

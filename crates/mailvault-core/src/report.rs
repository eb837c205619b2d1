//! The process-wide error funnel.
//!
//! Unexpected storage failures are reported here in addition to being
//! returned, so nothing is lost when a caller drops an error on the floor.

use std::sync::Arc;

use chrono::Utc;

use crate::error::{Result, VaultError};
use crate::storage::settings::SettingsStore;

/// Global settings key holding the error log.
pub const ERROR_LOG_KEY: &str = "errors";

/// Maximum number of lines kept in the error log.
pub const MAX_ERROR_LOG_LINES: usize = 100;

/// Sink for unexpected failures.
pub trait ErrorReporter: Send + Sync {
    fn report(&self, error: &VaultError);
}

/// Reporter that only logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn report(&self, error: &VaultError) {
        tracing::error!(kind = error.kind(), "{}", error);
    }
}

/// Reporter that logs and appends to the global error log setting.
pub struct ErrorLog {
    settings: SettingsStore,
}

impl ErrorLog {
    pub fn new(settings: SettingsStore) -> Self {
        Self { settings }
    }

    /// Read the logged lines, oldest first.
    pub fn entries(&self) -> Result<Vec<String>> {
        let stored = self.settings.get(None, &[ERROR_LOG_KEY])?;
        match stored.get(ERROR_LOG_KEY) {
            Some(value) => Ok(serde_json::from_value(value.clone())?),
            None => Ok(Vec::new()),
        }
    }

    pub fn clear(&self) -> Result<()> {
        self.settings.remove(None, &[ERROR_LOG_KEY])
    }

    fn append(&self, line: String) -> Result<()> {
        let mut lines = self.entries()?;
        lines.push(line);
        let overflow = lines.len().saturating_sub(MAX_ERROR_LOG_LINES);
        lines.drain(..overflow);

        let mut values = serde_json::Map::new();
        values.insert(ERROR_LOG_KEY.to_string(), serde_json::to_value(lines)?);
        self.settings.set(None, &values)
    }
}

impl ErrorReporter for ErrorLog {
    fn report(&self, error: &VaultError) {
        TracingReporter.report(error);
        let line = format!("{} [{}] {}", Utc::now().to_rfc3339(), error.kind(), error);
        if let Err(err) = self.append(line) {
            tracing::warn!("could not persist error log entry: {}", err);
        }
    }
}

/// Route a result through the funnel: non-recoverable errors are reported,
/// then returned unchanged.
pub fn funnel<T>(reporter: &dyn ErrorReporter, result: Result<T>) -> Result<T> {
    if let Err(ref err) = result {
        if !err.is_recoverable() {
            reporter.report(err);
        }
    }
    result
}

/// One open attempt. `fail` consumes it, so an attempt reports at most one
/// failure no matter how many steps of the open go wrong.
pub(crate) struct OpenAttempt {
    reporter: Arc<dyn ErrorReporter>,
}

impl OpenAttempt {
    pub(crate) fn new(reporter: Arc<dyn ErrorReporter>) -> Self {
        Self { reporter }
    }

    /// Settle the attempt with a failure and hand the error back.
    pub(crate) fn fail(self, error: VaultError) -> VaultError {
        if !error.is_recoverable() {
            self.reporter.report(&error);
        }
        error
    }
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingReporter;
    use super::*;

    #[test]
    fn test_funnel_skips_recoverable() {
        let reporter = RecordingReporter::default();
        let _ = funnel::<()>(&reporter, Err(VaultError::Blocked));
        assert_eq!(reporter.count(), 0);

        let result = funnel::<()>(&reporter, Err(VaultError::Write("abort".into())));
        assert!(matches!(result, Err(VaultError::Write(_))));
        assert_eq!(reporter.count(), 1);
    }

    #[test]
    fn test_open_attempt_reports_unexpected_failure() {
        let reporter = Arc::new(RecordingReporter::default());
        let err = OpenAttempt::new(reporter.clone()).fail(VaultError::Storage("first".into()));
        assert!(matches!(err, VaultError::Storage(_)));
        assert_eq!(reporter.count(), 1);
    }

    #[test]
    fn test_open_attempt_blocked_is_not_reported() {
        let reporter = Arc::new(RecordingReporter::default());
        let err = OpenAttempt::new(reporter.clone()).fail(VaultError::Blocked);
        assert!(err.is_recoverable());
        assert_eq!(reporter.count(), 0);
    }

    #[test]
    fn test_error_log_keeps_recent_lines() {
        let dir = tempfile::tempdir().unwrap();
        let settings = SettingsStore::open(&dir.path().join("vault.db")).unwrap();
        let log = ErrorLog::new(settings);

        for i in 0..(MAX_ERROR_LOG_LINES + 5) {
            log.report(&VaultError::Storage(format!("failure {}", i)));
        }

        let entries = log.entries().unwrap();
        assert_eq!(entries.len(), MAX_ERROR_LOG_LINES);
        assert!(entries[0].contains("failure 5"));
        assert!(entries.last().unwrap().contains(&format!("failure {}", MAX_ERROR_LOG_LINES + 4)));

        log.clear().unwrap();
        assert!(log.entries().unwrap().is_empty());
    }
}

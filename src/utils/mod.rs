// Utility functions

use chrono::NaiveDate;
use std::path::PathBuf;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Directory name under the home directory holding global settings
pub const APP_DIR_NAME: &str = ".project-estimator";

/// Get the global settings directory (`~/.project-estimator`).
///
/// Returns `None` when the home directory cannot be resolved.
pub fn app_config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(APP_DIR_NAME))
}

/// Extension trait for Result that provides convenient error context methods.
/// Converts any error to a String with a descriptive message prefix.
///
/// # Example
/// ```ignore
/// use crate::utils::ResultExt;
///
/// let text = std::fs::read_to_string("rates.toml")
///     .with_context("Failed to read rates file")?;
/// ```
pub trait ResultExt<T> {
    /// Converts the error to a String with context message.
    fn with_context(self, msg: &str) -> Result<T, String>;
}

impl<T, E: std::fmt::Display> ResultExt<T> for Result<T, E> {
    fn with_context(self, msg: &str) -> Result<T, String> {
        self.map_err(|e| format!("{}: {}", msg, e))
    }
}

/// Acquire a read lock, recovering from poisoning by returning the guard.
/// A panicked writer leaves the map itself intact, so readers carry on.
pub fn read_recover<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    match lock.read() {
        Ok(guard) => guard,
        Err(poisoned) => {
            log::warn!("RwLock was poisoned, recovering: {}", poisoned);
            poisoned.into_inner()
        }
    }
}

/// Acquire a write lock, recovering from poisoning by returning the guard.
pub fn write_recover<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    match lock.write() {
        Ok(guard) => guard,
        Err(poisoned) => {
            log::warn!("RwLock was poisoned, recovering: {}", poisoned);
            poisoned.into_inner()
        }
    }
}

/// Generate a unique ID for conversations and stored estimates.
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .with_context(&format!("Invalid date '{}', expected YYYY-MM-DD", value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_id() {
        let id1 = generate_id();
        let id2 = generate_id();
        assert_ne!(id1, id2);
        assert_eq!(id1.len(), 36);
    }

    #[test]
    fn test_with_context() {
        let result: Result<(), std::fmt::Error> = Err(std::fmt::Error);
        let err = result.with_context("Failed to render").unwrap_err();
        assert!(err.starts_with("Failed to render: "));
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2025-02-28").unwrap(),
            NaiveDate::from_ymd_opt(2025, 2, 28).unwrap()
        );
        assert!(parse_date("28/02/2025").unwrap_err().contains("YYYY-MM-DD"));
        assert!(parse_date("2025-02-30").is_err());
    }

    #[test]
    fn test_app_config_dir() {
        if let Some(dir) = app_config_dir() {
            assert!(dir.ends_with(APP_DIR_NAME));
        }
    }

    #[test]
    fn test_poisoned_lock_recovers() {
        let lock = std::sync::Arc::new(RwLock::new(1));
        let cloned = lock.clone();
        let _ = std::thread::spawn(move || {
            let _guard = cloned.write().unwrap();
            panic!("poison");
        })
        .join();

        assert!(lock.is_poisoned());
        assert_eq!(*read_recover(&lock), 1);
        *write_recover(&lock) = 2;
        assert_eq!(*read_recover(&lock), 2);
    }
}

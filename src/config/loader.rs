use anyhow::{Context, Result, anyhow};
use serde_valid::Validate;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

use super::models::Settings;

/// Load settings from a string slice.
pub fn load_from_str(s: &str) -> Result<Settings> {
    let settings: Settings =
        serde_json::from_str(s).context("Failed to parse JSON settings string")?;
    validate_settings(&settings)?;
    Ok(settings)
}

/// Load settings from any reader (e.g., a file).
pub fn load_from_reader<R: Read>(reader: R) -> Result<Settings> {
    let settings: Settings =
        serde_json::from_reader(reader).context("Failed to parse JSON settings from reader")?;
    validate_settings(&settings)?;
    Ok(settings)
}

/// Load settings from a file path synchronously.
pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let path_ref = path.as_ref();
    let file = File::open(path_ref)
        .with_context(|| format!("Failed to open settings file {}", path_ref.display()))?;
    let settings = load_from_reader(file)?;
    debug!(target: "macroqueue::config", path = %path_ref.display(), "Loaded settings");
    Ok(settings)
}

/// Load settings from a file path asynchronously (Tokio).
pub async fn load_from_path_async<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let path_ref = path.as_ref();
    let bytes = tokio::fs::read(path_ref)
        .await
        .with_context(|| format!("Failed to read settings file {}", path_ref.display()))?;
    let settings: Settings = serde_json::from_slice(&bytes)
        .with_context(|| format!("Failed to parse JSON settings from {}", path_ref.display()))?;
    validate_settings(&settings)?;
    debug!(target: "macroqueue::config", path = %path_ref.display(), "Loaded settings");
    Ok(settings)
}

/// Range checks declared on [`Settings`].
pub fn validate_settings(settings: &Settings) -> Result<()> {
    settings
        .validate()
        .map_err(|errors| anyhow!("Invalid settings: {errors}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_yields_defaults() {
        assert_eq!(load_from_str("{}").unwrap(), Settings::default());
    }

    #[test]
    fn partial_settings_keep_other_defaults() {
        let s = load_from_str(r#"{"speed": 2.5, "dry_run": true}"#).unwrap();
        assert_eq!(s.speed, 2.5);
        assert!(s.dry_run);
        assert_eq!(s.pause_poll_ms, 100);
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        assert!(load_from_str(r#"{"speed": 0}"#).is_err());
        assert!(load_from_str(r#"{"jitter": 1.5}"#).is_err());
        assert!(load_from_str(r#"{"pause_poll_ms": 1}"#).is_err());
        assert!(load_from_str(r#"{"event_buffer": 0}"#).is_err());
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(load_from_str("{").is_err());
        assert!(load_from_reader("\"text\"".as_bytes()).is_err());
    }
}

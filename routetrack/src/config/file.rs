//! Configuration file handling for ~/.routetrack/config.ini.
//!
//! Missing files and missing keys fall back to [`TrackingConfig::default`].
//! Values are range-checked with [`TrackingConfig::validate`] after parsing.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use ini::{Ini, Properties};
use thiserror::Error;

use super::TrackingConfig;

const SECTION_TRACKING: &str = "tracking";
const SECTION_HEADING: &str = "heading";
const SECTION_ANIMATION: &str = "animation";

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// Failed to write config file
    #[error("Failed to write config file: {0}")]
    WriteError(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    /// Failed to create config directory
    #[error("Failed to create config directory: {0}")]
    DirectoryError(std::io::Error),
}

/// Load configuration from the default path (~/.routetrack/config.ini).
pub fn load() -> Result<TrackingConfig, ConfigFileError> {
    load_from(&config_file_path())
}

/// Load configuration from a specific path.
///
/// If the file doesn't exist, returns defaults.
pub fn load_from(path: &Path) -> Result<TrackingConfig, ConfigFileError> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "Config file not found, using defaults");
        return Ok(TrackingConfig::default());
    }

    let ini = Ini::load_from_file(path)?;
    let config = parse_ini(&ini)?;
    tracing::info!(path = %path.display(), "Loaded tracking configuration");
    Ok(config)
}

/// Save configuration to a specific path, creating parent directories.
pub fn save_to(config: &TrackingConfig, path: &Path) -> Result<(), ConfigFileError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(ConfigFileError::DirectoryError)?;
    }

    to_ini(config)
        .write_to_file(path)
        .map_err(|e| ConfigFileError::WriteError(e.to_string()))
}

/// Get the path to the config directory (~/.routetrack).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".routetrack")
}

/// Get the path to the config file (~/.routetrack/config.ini).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}

/// Build a config from parsed INI contents.
pub fn parse_ini(ini: &Ini) -> Result<TrackingConfig, ConfigFileError> {
    let mut config = TrackingConfig::default();

    if let Some(section) = ini.section(Some(SECTION_TRACKING)) {
        let reader = SectionReader::new(SECTION_TRACKING, section);
        reader.float("snap_threshold_m", &mut config.snap_threshold)?;
        reader.float("arrival_threshold_m", &mut config.arrival_threshold)?;
        reader.float(
            "connector_hide_threshold_m",
            &mut config.connector_hide_threshold,
        )?;
        reader.parsed("snap_marker_to_route", &mut config.snap_marker_to_route)?;
    }

    if let Some(section) = ini.section(Some(SECTION_HEADING)) {
        let reader = SectionReader::new(SECTION_HEADING, section);
        reader.parsed("strategy", &mut config.default_strategy)?;
        reader.float("smoothing_factor", &mut config.heading_smoothing_factor)?;
        reader.float("look_ahead_m", &mut config.heading_look_ahead_distance)?;
        reader.float(
            "min_course_speed_mps",
            &mut config.min_reliable_course_speed,
        )?;
        reader.float("max_turn_rate_dps", &mut config.max_heading_turn_rate)?;
        reader.seconds(
            "server_heading_max_age_secs",
            &mut config.server_heading_max_age,
        )?;
        reader.float("movement_threshold_m", &mut config.movement_threshold)?;
        reader.float("primary_weight", &mut config.primary_segment_weight)?;
        reader.float("secondary_weight", &mut config.secondary_segment_weight)?;
    }

    if let Some(section) = ini.section(Some(SECTION_ANIMATION)) {
        let reader = SectionReader::new(SECTION_ANIMATION, section);
        reader.seconds(
            "min_duration_secs",
            &mut config.marker_animation_min_duration,
        )?;
        reader.seconds(
            "fallback_duration_secs",
            &mut config.marker_animation_fallback_duration,
        )?;
        reader.seconds(
            "max_duration_secs",
            &mut config.marker_animation_max_duration,
        )?;
    }

    config
        .validate()
        .map_err(|e| ConfigFileError::InvalidValue {
            section: section_of(e.field).to_string(),
            key: e.field.to_string(),
            value: e.value.to_string(),
            reason: e.reason.to_string(),
        })?;

    Ok(config)
}

/// Serialize a config into INI form.
pub fn to_ini(config: &TrackingConfig) -> Ini {
    let mut ini = Ini::new();

    ini.with_section(Some(SECTION_TRACKING))
        .set("snap_threshold_m", config.snap_threshold.to_string())
        .set("arrival_threshold_m", config.arrival_threshold.to_string())
        .set(
            "connector_hide_threshold_m",
            config.connector_hide_threshold.to_string(),
        )
        .set(
            "snap_marker_to_route",
            config.snap_marker_to_route.to_string(),
        );

    ini.with_section(Some(SECTION_HEADING))
        .set("strategy", config.default_strategy.to_string())
        .set(
            "smoothing_factor",
            config.heading_smoothing_factor.to_string(),
        )
        .set(
            "look_ahead_m",
            config.heading_look_ahead_distance.to_string(),
        )
        .set(
            "min_course_speed_mps",
            config.min_reliable_course_speed.to_string(),
        )
        .set(
            "max_turn_rate_dps",
            config.max_heading_turn_rate.to_string(),
        )
        .set(
            "server_heading_max_age_secs",
            config.server_heading_max_age.as_secs_f64().to_string(),
        )
        .set("movement_threshold_m", config.movement_threshold.to_string())
        .set("primary_weight", config.primary_segment_weight.to_string())
        .set(
            "secondary_weight",
            config.secondary_segment_weight.to_string(),
        );

    ini.with_section(Some(SECTION_ANIMATION))
        .set(
            "min_duration_secs",
            config.marker_animation_min_duration.as_secs_f64().to_string(),
        )
        .set(
            "fallback_duration_secs",
            config
                .marker_animation_fallback_duration
                .as_secs_f64()
                .to_string(),
        )
        .set(
            "max_duration_secs",
            config.marker_animation_max_duration.as_secs_f64().to_string(),
        );

    ini
}

/// Map a validated field back to the INI section it is written in.
fn section_of(field: &str) -> &'static str {
    match field {
        "snap_threshold" | "arrival_threshold" | "connector_hide_threshold" => SECTION_TRACKING,
        f if f.starts_with("marker_animation") => SECTION_ANIMATION,
        _ => SECTION_HEADING,
    }
}

/// Typed accessors over one INI section.
struct SectionReader<'a> {
    name: &'static str,
    properties: &'a Properties,
}

impl<'a> SectionReader<'a> {
    fn new(name: &'static str, properties: &'a Properties) -> Self {
        Self { name, properties }
    }

    fn invalid(&self, key: &str, value: &str, reason: &str) -> ConfigFileError {
        ConfigFileError::InvalidValue {
            section: self.name.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Overwrite `target` if `key` is present and non-empty.
    fn parsed<T: FromStr>(&self, key: &str, target: &mut T) -> Result<(), ConfigFileError> {
        let Some(raw) = self.properties.get(key).map(str::trim) else {
            return Ok(());
        };
        if raw.is_empty() {
            return Ok(());
        }
        *target = raw
            .parse()
            .map_err(|_| self.invalid(key, raw, "unrecognized value"))?;
        Ok(())
    }

    fn float(&self, key: &str, target: &mut f64) -> Result<(), ConfigFileError> {
        let mut value = *target;
        self.parsed(key, &mut value)?;
        if !value.is_finite() {
            return Err(self.invalid(key, &value.to_string(), "must be a finite number"));
        }
        *target = value;
        Ok(())
    }

    fn seconds(&self, key: &str, target: &mut Duration) -> Result<(), ConfigFileError> {
        let mut secs = target.as_secs_f64();
        self.float(key, &mut secs)?;
        if secs < 0.0 {
            return Err(self.invalid(key, &secs.to_string(), "must not be negative"));
        }
        *target = Duration::try_from_secs_f64(secs)
            .map_err(|_| self.invalid(key, &secs.to_string(), "out of range"))?;
        Ok(())
    }
}

use crate::animator::{DEFAULT_STEP_COUNT, DEFAULT_TICK_MS};
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080";
pub const DEFAULT_UPLOAD_SIZE_BYTES: usize = 5 * 1024 * 1024;
pub const DEFAULT_INTER_PHASE_DELAY_MS: u64 = 500;
const ENV_PREFIX: &str = "FASTGAUGE";

/// Whether the upload phase moves real bytes or reports a placeholder speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum UploadMode {
    #[default]
    Real,
    Simulated,
}

impl UploadMode {
    pub fn toggle(self) -> Self {
        match self {
            UploadMode::Real => UploadMode::Simulated,
            UploadMode::Simulated => UploadMode::Real,
        }
    }
}

impl fmt::Display for UploadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadMode::Real => f.write_str("real"),
            UploadMode::Simulated => f.write_str("simulated"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Settings {
    pub base_url: String,
    pub upload_size_bytes: usize,
    pub animation_step_count: u32,
    pub animation_tick_ms: u64,
    pub inter_phase_delay_ms: u64,
    pub upload_mode: UploadMode,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            upload_size_bytes: DEFAULT_UPLOAD_SIZE_BYTES,
            animation_step_count: DEFAULT_STEP_COUNT,
            animation_tick_ms: DEFAULT_TICK_MS,
            inter_phase_delay_ms: DEFAULT_INTER_PHASE_DELAY_MS,
            upload_mode: UploadMode::Real,
            request_timeout_secs: None,
        }
    }
}

impl Settings {
    /// Layers built-in defaults, an optional file and `FASTGAUGE_*` variables.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("base_url", DEFAULT_BASE_URL)?
            .set_default("upload_size_bytes", DEFAULT_UPLOAD_SIZE_BYTES as i64)?
            .set_default("animation_step_count", DEFAULT_STEP_COUNT as i64)?
            .set_default("animation_tick_ms", DEFAULT_TICK_MS as i64)?
            .set_default("inter_phase_delay_ms", DEFAULT_INTER_PHASE_DELAY_MS as i64)?
            .set_default("upload_mode", "real")?;

        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path));
        }

        builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true));

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::Message("base_url must not be empty".into()));
        }
        if self.upload_size_bytes == 0 {
            return Err(ConfigError::Message("upload_size_bytes must be positive".into()));
        }
        if self.animation_step_count == 0 {
            return Err(ConfigError::Message("animation_step_count must be positive".into()));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn upload_size_mib(&self) -> f64 {
        self.upload_size_bytes as f64 / (1024.0 * 1024.0)
    }
}

/// Fields editable from the settings screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsField {
    UploadSize,
    UploadMode,
    InterPhaseDelay,
    AnimationSteps,
}

impl SettingsField {
    pub fn next(self) -> Self {
        match self {
            SettingsField::UploadSize => SettingsField::UploadMode,
            SettingsField::UploadMode => SettingsField::InterPhaseDelay,
            SettingsField::InterPhaseDelay => SettingsField::AnimationSteps,
            SettingsField::AnimationSteps => SettingsField::UploadSize,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            SettingsField::UploadSize => SettingsField::AnimationSteps,
            SettingsField::UploadMode => SettingsField::UploadSize,
            SettingsField::InterPhaseDelay => SettingsField::UploadMode,
            SettingsField::AnimationSteps => SettingsField::InterPhaseDelay,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_applied() {
        let settings = Settings::load(None).expect("failed to build settings");

        assert_eq!(settings.upload_size_bytes, 5_242_880);
        assert_eq!(settings.animation_step_count, 45);
        assert_eq!(settings.animation_tick_ms, 18);
        assert_eq!(settings.inter_phase_delay_ms, 500);
        assert_eq!(settings.upload_mode, UploadMode::Real);
        assert_eq!(settings.request_timeout(), None);
    }

    #[test]
    fn loaded_defaults_match_default_impl() {
        assert_eq!(Settings::load(None).unwrap(), Settings::default());
    }

    #[test]
    fn file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "base_url = \"http://speed.example:9000\"\nupload_mode = \"simulated\"\nrequest_timeout_secs = 15\nanimation_step_count = 30"
        )
        .unwrap();

        let settings = Settings::load(Some(file.path())).unwrap();
        assert_eq!(settings.base_url, "http://speed.example:9000");
        assert_eq!(settings.upload_mode, UploadMode::Simulated);
        assert_eq!(settings.request_timeout(), Some(Duration::from_secs(15)));
        assert_eq!(settings.animation_step_count, 30);
        assert_eq!(settings.inter_phase_delay_ms, 500);
    }

    #[test]
    fn zero_step_count_is_rejected() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "animation_step_count = 0").unwrap();

        assert!(Settings::load(Some(file.path())).is_err());
    }

    #[test]
    fn validate_rejects_empty_url_and_payload() {
        let mut settings = Settings::default();
        settings.base_url = "  ".into();
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.upload_size_bytes = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn settings_fields_cycle() {
        let mut field = SettingsField::UploadSize;
        for _ in 0..4 {
            field = field.next();
        }
        assert_eq!(field, SettingsField::UploadSize);
        assert_eq!(SettingsField::UploadSize.prev(), SettingsField::AnimationSteps);
    }
}

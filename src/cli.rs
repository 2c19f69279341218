use crate::settings::{Settings, UploadMode};
use clap::Parser;
use log::LevelFilter;
use std::path::PathBuf;

/// Command-line options. Anything given here wins over the config file and
/// `FASTGAUGE_*` environment variables.
#[derive(Parser, Debug)]
#[command(version)]
#[command(about = "Internet speed test with an animated throughput gauge")]
pub struct Cli {
    /// Configuration file (TOML, JSON, YAML, ...)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Root URL of the test endpoints (`/testfile`, `/upload`)
    #[arg(short = 'u', long)]
    pub base_url: Option<String>,

    /// Real transfer or randomized placeholder for the upload phase
    #[arg(long, value_enum)]
    pub upload_mode: Option<UploadMode>,

    /// Upload payload size in bytes
    #[arg(long)]
    pub upload_size: Option<usize>,

    /// Abort each transfer after this many seconds (counts as 0 Mbps)
    #[arg(short, long)]
    pub timeout: Option<u64>,

    /// Print results line by line instead of starting the terminal UI
    #[arg(long)]
    pub plain: bool,

    #[arg(long, default_value = "info")]
    pub log_level: LevelFilter,

    /// Write logs to this file; required for logging in terminal UI mode
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    pub fn apply_overrides(&self, settings: &mut Settings) {
        if let Some(url) = &self.base_url {
            settings.base_url = url.clone();
        }
        if let Some(mode) = self.upload_mode {
            settings.upload_mode = mode;
        }
        if let Some(size) = self.upload_size {
            settings.upload_size_bytes = size;
        }
        if let Some(secs) = self.timeout {
            settings.request_timeout_secs = Some(secs);
        }
    }

    /// The terminal UI draws over stderr, so it only logs to a file.
    pub fn effective_log_level(&self) -> LevelFilter {
        if self.plain || self.log_file.is_some() {
            self.log_level
        } else {
            LevelFilter::Off
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_replace_loaded_values() {
        let cli = Cli::parse_from([
            "fastgauge",
            "--base-url",
            "http://10.0.0.2:3000",
            "--upload-mode",
            "simulated",
            "--timeout",
            "20",
        ]);
        let mut settings = Settings::default();
        cli.apply_overrides(&mut settings);

        assert_eq!(settings.base_url, "http://10.0.0.2:3000");
        assert_eq!(settings.upload_mode, UploadMode::Simulated);
        assert_eq!(settings.request_timeout_secs, Some(20));
        assert_eq!(settings.upload_size_bytes, 5_242_880);
    }

    #[test]
    fn tui_without_log_file_is_silent() {
        let cli = Cli::parse_from(["fastgauge", "--log-level", "debug"]);
        assert_eq!(cli.effective_log_level(), LevelFilter::Off);

        let cli = Cli::parse_from(["fastgauge", "--plain", "--log-level", "debug"]);
        assert_eq!(cli.effective_log_level(), LevelFilter::Debug);
    }
}

pub mod download;
pub mod upload;

use crate::error::{InitializationError, MeasurementError};
use crate::settings::Settings;
use async_trait::async_trait;
use download::DownloadTest;
use std::time::Duration;
use upload::UploadTest;

/// Bits per binary megabit (1024 * 1024).
pub const BITS_PER_MEGABIT: f64 = 1_048_576.0;

/// One throughput measurement in binary megabits per second.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SpeedSample {
    megabits_per_second: f64,
}

impl SpeedSample {
    pub fn zero() -> Self {
        Self::default()
    }

    /// Rounds to two decimals and clamps negatives to zero.
    pub fn from_mbps(mbps: f64) -> Self {
        let rounded = round_to(mbps, 2);
        Self {
            megabits_per_second: if rounded > 0.0 { rounded } else { 0.0 },
        }
    }

    /// Speed of a transfer of `bytes` that took `elapsed`.
    pub fn from_transfer(bytes: u64, elapsed: Duration) -> Result<Self, MeasurementError> {
        let secs = elapsed.as_secs_f64();
        if secs <= 0.0 {
            return Err(MeasurementError::ZeroElapsed);
        }
        Ok(Self::from_mbps(bytes as f64 * 8.0 / secs / BITS_PER_MEGABIT))
    }

    pub fn mbps(&self) -> f64 {
        self.megabits_per_second
    }
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SpeedTestResult {
    pub download: SpeedSample,
    pub upload: SpeedSample,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestPhase {
    Idle,
    DownloadTesting,
    DownloadAnimating,
    PauseAnimatingToZero,
    UploadTesting,
    UploadAnimating,
    Complete,
}

impl TestPhase {
    pub fn status(self) -> PhaseStatus {
        match self {
            TestPhase::Idle => PhaseStatus::Idle,
            TestPhase::DownloadTesting
            | TestPhase::DownloadAnimating
            | TestPhase::PauseAnimatingToZero => PhaseStatus::TestingDownload,
            TestPhase::UploadTesting | TestPhase::UploadAnimating => PhaseStatus::TestingUpload,
            TestPhase::Complete => PhaseStatus::Complete,
        }
    }
}

/// The coarse status shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseStatus {
    Idle,
    TestingDownload,
    TestingUpload,
    Complete,
}

impl PhaseStatus {
    pub fn text(self) -> &'static str {
        match self {
            PhaseStatus::Idle => "Ready",
            PhaseStatus::TestingDownload => "Testing download speed...",
            PhaseStatus::TestingUpload => "Testing upload speed...",
            PhaseStatus::Complete => "Test complete ✅",
        }
    }
}

/// Performs single throughput measurements.
///
/// Implementations are fail-soft: a transfer that fails for any reason
/// yields a zero sample instead of an error.
#[async_trait]
pub trait Sampler: Send + Sync {
    async fn measure_download(&self) -> SpeedSample;
    async fn measure_upload(&self) -> SpeedSample;
}

/// Measures against a live HTTP test endpoint.
pub struct HttpSampler {
    download: DownloadTest,
    upload: UploadTest,
}

impl HttpSampler {
    pub fn new(settings: &Settings) -> Result<Self, InitializationError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = settings.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self {
            download: DownloadTest::new(client.clone(), &settings.base_url),
            upload: UploadTest::new(
                client,
                &settings.base_url,
                settings.upload_size_bytes,
                settings.upload_mode,
            ),
        })
    }
}

#[async_trait]
impl Sampler for HttpSampler {
    async fn measure_download(&self) -> SpeedSample {
        self.download.measure().await
    }

    async fn measure_upload(&self) -> SpeedSample {
        self.upload.measure().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn five_mebibytes_in_one_second_is_forty_megabits() {
        let sample = SpeedSample::from_transfer(5_242_880, Duration::from_secs(1)).unwrap();
        assert_eq!(sample.mbps(), 40.0);
    }

    #[test]
    fn uses_binary_megabits() {
        // 1,000,000 bytes/s would be 8.00 with a decimal divisor.
        let sample = SpeedSample::from_transfer(1_000_000, Duration::from_secs(1)).unwrap();
        assert_eq!(sample.mbps(), 7.63);
    }

    #[test]
    fn rounds_to_two_decimals() {
        assert_eq!(SpeedSample::from_mbps(39.999).mbps(), 40.0);
        assert_eq!(SpeedSample::from_mbps(12.344).mbps(), 12.34);
        assert_eq!(SpeedSample::from_mbps(0.004).mbps(), 0.0);
    }

    #[test]
    fn zero_elapsed_is_a_failure() {
        let err = SpeedSample::from_transfer(1024, Duration::ZERO).unwrap_err();
        assert!(matches!(err, MeasurementError::ZeroElapsed));
    }

    #[test]
    fn slow_transfer_keeps_precision() {
        let sample = SpeedSample::from_transfer(5_242_880, Duration::from_millis(4000)).unwrap();
        assert_eq!(sample.mbps(), 10.0);
    }

    #[test]
    fn phase_status_groups_animation_phases() {
        assert_eq!(TestPhase::PauseAnimatingToZero.status(), PhaseStatus::TestingDownload);
        assert_eq!(TestPhase::UploadAnimating.status(), PhaseStatus::TestingUpload);
        assert_eq!(TestPhase::Complete.status(), PhaseStatus::Complete);
    }
}

use super::SpeedSample;
use crate::delay::delay;
use crate::error::MeasurementError;
use crate::settings::UploadMode;
use log::{debug, info, warn};
use rand::{Rng, SeedableRng};
use std::ops::Range;
use std::time::Instant;

const UPLOAD_PATH: &str = "/upload";

/// How long the simulated upload pretends to take.
pub const SIMULATED_DURATION_MS: u64 = 1500;
/// Range of speeds the simulated upload reports, in Mbps.
pub const SIMULATED_RANGE: Range<f64> = 5.0..15.0;

pub struct UploadTest {
    client: reqwest::Client,
    url: String,
    upload_size: usize,
    mode: UploadMode,
}

impl UploadTest {
    pub fn new(client: reqwest::Client, base_url: &str, upload_size: usize, mode: UploadMode) -> Self {
        Self {
            client,
            url: format!("{}{}", base_url.trim_end_matches('/'), UPLOAD_PATH),
            upload_size,
            mode,
        }
    }

    /// Runs one upload measurement. Failures become a zero sample.
    pub async fn measure(&self) -> SpeedSample {
        match self.mode {
            UploadMode::Real => match self.run().await {
                Ok(sample) => sample,
                Err(err) => {
                    warn!("Upload test failed: {}", err);
                    SpeedSample::zero()
                }
            },
            UploadMode::Simulated => simulate().await,
        }
    }

    async fn run(&self) -> Result<SpeedSample, MeasurementError> {
        let data = random_payload(self.upload_size);

        let start = Instant::now();
        let response = self.client.post(&self.url).body(data).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(MeasurementError::Status(status));
        }
        let elapsed = start.elapsed();

        let sample = SpeedSample::from_transfer(self.upload_size as u64, elapsed)?;
        info!("Uploaded: {} bytes", self.upload_size);
        debug!("Duration: {:.2} s", elapsed.as_secs_f64());
        info!("Upload speed: {:.2} Mbps", sample.mbps());

        Ok(sample)
    }
}

fn random_payload(size: usize) -> Vec<u8> {
    let mut rng = rand::rngs::StdRng::from_entropy();
    let mut data = vec![0u8; size];
    rng.fill(&mut data[..]);
    data
}

async fn simulate() -> SpeedSample {
    let mbps = rand::thread_rng().gen_range(SIMULATED_RANGE);
    delay(SIMULATED_DURATION_MS).await;
    debug!("Simulated upload speed: {:.2} Mbps", mbps);
    SpeedSample::from_mbps(mbps)
}

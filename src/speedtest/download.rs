use super::SpeedSample;
use crate::error::MeasurementError;
use futures::StreamExt;
use log::{debug, info, warn};
use rand::Rng;
use std::time::Instant;

const DOWNLOAD_PATH: &str = "/testfile";

pub struct DownloadTest {
    client: reqwest::Client,
    url: String,
}

impl DownloadTest {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            url: format!("{}{}", base_url.trim_end_matches('/'), DOWNLOAD_PATH),
        }
    }

    /// Downloads the test file once. Failures become a zero sample.
    pub async fn measure(&self) -> SpeedSample {
        match self.run().await {
            Ok(sample) => sample,
            Err(err) => {
                warn!("Download test failed: {}", err);
                SpeedSample::zero()
            }
        }
    }

    async fn run(&self) -> Result<SpeedSample, MeasurementError> {
        // Fresh value per call so no cache can answer for the server.
        let cache_buster: u64 = rand::thread_rng().gen();

        let start = Instant::now();
        let response = self
            .client
            .get(&self.url)
            .query(&[("cache", cache_buster)])
            .send()
            .await?;

        // Any status is measured; only the body size and timing matter.
        let status = response.status();
        if !status.is_success() {
            debug!("Test file served with status {}", status);
        }

        let mut stream = response.bytes_stream();
        let mut downloaded: u64 = 0;
        while let Some(chunk) = stream.next().await {
            downloaded += chunk?.len() as u64;
        }
        let elapsed = start.elapsed();

        let sample = SpeedSample::from_transfer(downloaded, elapsed)?;
        info!("Downloaded: {} bytes", downloaded);
        debug!("Duration: {:.2} s", elapsed.as_secs_f64());
        info!("Download speed: {:.2} Mbps", sample.mbps());

        Ok(sample)
    }
}

//! Sequences one full test run: download, pause, back to zero, upload.

use crate::animator::Animator;
use crate::delay::delay;
use crate::presentation::Presentation;
use crate::settings::Settings;
use crate::speedtest::{PhaseStatus, Sampler, SpeedSample, SpeedTestResult, TestPhase};
use log::{debug, info};
use std::future::Future;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

pub const STATUS_CANCELLED: &str = "Test cancelled";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RunOutcome {
    Completed(SpeedTestResult),
    Cancelled,
    /// A run was already in progress; nothing was touched.
    AlreadyRunning,
}

pub fn download_label(sample: SpeedSample) -> String {
    format!("Download: {} Mbps", sample.mbps())
}

pub fn upload_label(sample: SpeedSample) -> String {
    format!("Upload: {} Mbps", sample.mbps())
}

/// State that belongs to the run in progress.
struct RunState {
    animator: Animator,
    phase: TestPhase,
}

pub struct Orchestrator<S, P> {
    sampler: S,
    presentation: P,
    inter_phase_delay_ms: u64,
    // Held for the whole run; `try_lock` failing means a run is active.
    state: Mutex<RunState>,
}

impl<S: Sampler, P: Presentation> Orchestrator<S, P> {
    pub fn new(sampler: S, presentation: P, animator: Animator, inter_phase_delay_ms: u64) -> Self {
        Self {
            sampler,
            presentation,
            inter_phase_delay_ms,
            state: Mutex::new(RunState {
                animator,
                phase: TestPhase::Idle,
            }),
        }
    }

    pub fn from_settings(sampler: S, presentation: P, settings: &Settings) -> Self {
        Self::new(
            sampler,
            presentation,
            Animator::from_settings(settings),
            settings.inter_phase_delay_ms,
        )
    }

    pub fn presentation(&self) -> &P {
        &self.presentation
    }

    /// Runs a complete test unless one is already in progress.
    ///
    /// Cancelling `cancel` stops the run at its next suspension point.
    pub async fn run(&self, cancel: CancellationToken) -> RunOutcome {
        let Ok(mut state) = self.state.try_lock() else {
            debug!("Start ignored, a test is already running");
            return RunOutcome::AlreadyRunning;
        };

        self.presentation.set_control_enabled(false);
        let outcome = match self.drive(&mut state, &cancel).await {
            Some(result) => {
                info!(
                    "Test complete: download {} Mbps, upload {} Mbps",
                    result.download.mbps(),
                    result.upload.mbps()
                );
                RunOutcome::Completed(result)
            }
            None => {
                info!("Test cancelled during {:?}", state.phase);
                self.enter(&mut state, TestPhase::Idle);
                self.presentation.set_status(STATUS_CANCELLED);
                RunOutcome::Cancelled
            }
        };
        self.presentation.set_control_enabled(true);
        outcome
    }

    async fn drive(&self, state: &mut RunState, cancel: &CancellationToken) -> Option<SpeedTestResult> {
        let p = &self.presentation;

        state.animator.reset(p);
        p.set_download_label(&download_label(SpeedSample::zero()));
        p.set_upload_label(&upload_label(SpeedSample::zero()));

        self.enter(state, TestPhase::DownloadTesting);
        p.set_status(PhaseStatus::TestingDownload.text());
        let download = until_cancelled(cancel, self.sampler.measure_download()).await?;
        p.set_download_label(&download_label(download));

        self.enter(state, TestPhase::DownloadAnimating);
        until_cancelled(cancel, state.animator.animate_to(download.mbps(), p)).await?;

        self.enter(state, TestPhase::PauseAnimatingToZero);
        until_cancelled(cancel, delay(self.inter_phase_delay_ms)).await?;
        until_cancelled(cancel, state.animator.animate_to(0.0, p)).await?;

        self.enter(state, TestPhase::UploadTesting);
        p.set_status(PhaseStatus::TestingUpload.text());
        let upload = until_cancelled(cancel, self.sampler.measure_upload()).await?;
        p.set_upload_label(&upload_label(upload));

        self.enter(state, TestPhase::UploadAnimating);
        until_cancelled(cancel, state.animator.animate_to(upload.mbps(), p)).await?;

        self.enter(state, TestPhase::Complete);
        p.set_status(PhaseStatus::Complete.text());

        Some(SpeedTestResult { download, upload })
    }

    fn enter(&self, state: &mut RunState, phase: TestPhase) {
        debug!("Phase {:?} -> {:?}", state.phase, phase);
        state.phase = phase;
        self.presentation.set_phase(phase);
    }
}

/// Resolves to `None` if `cancel` fires first; the future is dropped then.
async fn until_cancelled<F: Future>(cancel: &CancellationToken, fut: F) -> Option<F::Output> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        out = fut => Some(out),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presentation::testing::{Event, Recorder};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::Instant;

    struct FixedSampler {
        download: f64,
        upload: f64,
        latency: Duration,
        calls: AtomicUsize,
    }

    impl FixedSampler {
        fn new(download: f64, upload: f64) -> Self {
            Self {
                download,
                upload,
                latency: Duration::from_millis(300),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Sampler for FixedSampler {
        async fn measure_download(&self) -> SpeedSample {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.latency).await;
            SpeedSample::from_mbps(self.download)
        }

        async fn measure_upload(&self) -> SpeedSample {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.latency).await;
            SpeedSample::from_mbps(self.upload)
        }
    }

    fn orchestrator(download: f64, upload: f64) -> Orchestrator<FixedSampler, Recorder> {
        Orchestrator::new(
            FixedSampler::new(download, upload),
            Recorder::default(),
            Animator::new(45, Duration::from_millis(18)),
            500,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn phases_follow_the_protocol_in_order() {
        let orch = orchestrator(40.0, 12.34);

        let outcome = orch.run(CancellationToken::new()).await;

        assert_eq!(
            outcome,
            RunOutcome::Completed(SpeedTestResult {
                download: SpeedSample::from_mbps(40.0),
                upload: SpeedSample::from_mbps(12.34),
            })
        );
        assert_eq!(
            orch.presentation().phases(),
            vec![
                TestPhase::DownloadTesting,
                TestPhase::DownloadAnimating,
                TestPhase::PauseAnimatingToZero,
                TestPhase::UploadTesting,
                TestPhase::UploadAnimating,
                TestPhase::Complete,
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn control_is_disabled_for_the_whole_run() {
        let orch = orchestrator(40.0, 12.34);
        orch.run(CancellationToken::new()).await;

        let events = orch.presentation().events();
        assert_eq!(events.first(), Some(&Event::ControlEnabled(false)));
        assert_eq!(events.last(), Some(&Event::ControlEnabled(true)));
        let toggles = events
            .iter()
            .filter(|e| matches!(e, Event::ControlEnabled(_)))
            .count();
        assert_eq!(toggles, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn labels_and_status_follow_the_source_texts() {
        let orch = orchestrator(40.0, 12.34);
        orch.run(CancellationToken::new()).await;

        let texts: Vec<Event> = orch
            .presentation()
            .events()
            .into_iter()
            .filter(|e| {
                matches!(
                    e,
                    Event::Status(_) | Event::DownloadLabel(_) | Event::UploadLabel(_)
                )
            })
            .collect();

        assert_eq!(
            texts,
            vec![
                Event::DownloadLabel("Download: 0 Mbps".into()),
                Event::UploadLabel("Upload: 0 Mbps".into()),
                Event::Status("Testing download speed...".into()),
                Event::DownloadLabel("Download: 40 Mbps".into()),
                Event::Status("Testing upload speed...".into()),
                Event::UploadLabel("Upload: 12.34 Mbps".into()),
                Event::Status("Test complete ✅".into()),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn display_settles_on_each_target() {
        let orch = orchestrator(40.0, 12.34);
        orch.run(CancellationToken::new()).await;

        let displays = orch.presentation().displays();
        // reset, 45 up, 45 down, 45 up
        assert_eq!(displays.len(), 1 + 45 * 3);
        assert_eq!(displays[0], 0.0);
        assert_eq!(displays[45], 40.0);
        assert_eq!(displays[90], 0.0);
        assert_eq!(displays[135], 12.3);
        assert!(displays.iter().all(|v| *v >= 0.0));
    }

    #[tokio::test(start_paused = true)]
    async fn pause_separates_download_and_upload() {
        let orch = orchestrator(40.0, 12.34);
        let start = Instant::now();
        orch.run(CancellationToken::new()).await;

        // two transfers, three animations, one pause
        let expected = Duration::from_millis(300 * 2 + 45 * 18 * 3 + 500);
        let elapsed = start.elapsed();
        assert!(elapsed >= expected, "{elapsed:?}");
        assert!(elapsed < expected + Duration::from_millis(20), "{elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn zero_download_skips_the_animation_ticks() {
        let orch = orchestrator(0.0, 5.0);
        let outcome = orch.run(CancellationToken::new()).await;

        assert!(matches!(outcome, RunOutcome::Completed(_)));
        let displays = orch.presentation().displays();
        // reset, instant 0, instant 0, 45 up
        assert_eq!(displays.len(), 3 + 45);
        assert_eq!(*displays.last().unwrap(), 5.0);
    }

    #[tokio::test(start_paused = true)]
    async fn second_start_while_running_has_no_effect() {
        let orch = orchestrator(40.0, 12.34);
        let token = CancellationToken::new();

        let (first, second) = tokio::join!(orch.run(token.clone()), orch.run(token.clone()));

        assert!(matches!(first, RunOutcome::Completed(_)));
        assert_eq!(second, RunOutcome::AlreadyRunning);
        assert_eq!(orch.sampler.calls.load(Ordering::SeqCst), 2);
        assert_eq!(orch.presentation().phases().len(), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn can_run_again_after_completion() {
        let orch = orchestrator(40.0, 12.34);
        orch.run(CancellationToken::new()).await;
        let again = orch.run(CancellationToken::new()).await;

        assert!(matches!(again, RunOutcome::Completed(_)));
        assert_eq!(orch.sampler.calls.load(Ordering::SeqCst), 4);
        // the second run restarts from zero
        let displays = orch.presentation().displays();
        assert_eq!(displays[1 + 45 * 3], 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_stops_the_run_and_reenables_control() {
        let orch = Arc::new(orchestrator(40.0, 12.34));
        let token = CancellationToken::new();

        let handle = {
            let orch = Arc::clone(&orch);
            let token = token.clone();
            tokio::spawn(async move { orch.run(token).await })
        };

        // somewhere inside the first animation
        tokio::time::sleep(Duration::from_millis(300 + 10 * 18 + 9)).await;
        token.cancel();
        let outcome = handle.await.unwrap();

        assert_eq!(outcome, RunOutcome::Cancelled);
        assert_eq!(orch.sampler.calls.load(Ordering::SeqCst), 1);

        let events = orch.presentation().events();
        assert_eq!(events.last(), Some(&Event::ControlEnabled(true)));
        assert!(events.contains(&Event::Status(STATUS_CANCELLED.into())));
        assert_eq!(orch.presentation().phases().last(), Some(&TestPhase::Idle));

        let restarted = orch.run(CancellationToken::new()).await;
        assert!(matches!(restarted, RunOutcome::Completed(_)));
    }

    #[test]
    fn labels_use_shortest_number_form() {
        assert_eq!(download_label(SpeedSample::from_mbps(40.0)), "Download: 40 Mbps");
        assert_eq!(upload_label(SpeedSample::from_mbps(7.5)), "Upload: 7.5 Mbps");
    }
}

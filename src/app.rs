use crate::orchestrator::{download_label, upload_label, Orchestrator, RunOutcome};
use crate::presentation::{format_display, Presentation};
use crate::settings::{Settings, SettingsField, UploadMode};
use crate::speedtest::{PhaseStatus, Sampler, SpeedSample, TestPhase};
use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use log::debug;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

const UPLOAD_SIZE_STEP: usize = 1024 * 1024;
const MAX_UPLOAD_SIZE: usize = 100 * 1024 * 1024;
const DELAY_STEP_MS: u64 = 100;
const MAX_DELAY_MS: u64 = 5_000;
const STEP_COUNT_STEP: u32 = 5;
const MAX_STEP_COUNT: u32 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppView {
    Main,
    Settings,
}

/// Everything the terminal shows, fed by [`UiUpdate`]s from the running test.
pub struct App {
    pub phase: TestPhase,
    pub should_quit: bool,
    pub view: AppView,

    pub display_value: f64,
    pub status_text: String,
    pub download_text: String,
    pub upload_text: String,
    pub control_enabled: bool,

    pub settings: Settings,
    pub selected_setting: SettingsField,

    cancel: Option<CancellationToken>,
}

impl App {
    pub fn new(settings: Settings) -> Self {
        Self {
            phase: TestPhase::Idle,
            should_quit: false,
            view: AppView::Main,
            display_value: 0.0,
            status_text: PhaseStatus::Idle.text().to_string(),
            download_text: download_label(SpeedSample::zero()),
            upload_text: upload_label(SpeedSample::zero()),
            control_enabled: true,
            settings,
            selected_setting: SettingsField::UploadSize,
            cancel: None,
        }
    }

    /// The gauge text, e.g. `"12.3"`.
    pub fn display_text(&self) -> String {
        format_display(self.display_value)
    }

    /// A test is in flight; drives the gauge's "active" look.
    pub fn is_active(&self) -> bool {
        !self.control_enabled
    }

    pub fn handle_key_event(&mut self, key: event::KeyEvent) -> Option<AppAction> {
        if key.kind != KeyEventKind::Press {
            return None;
        }

        match self.view {
            AppView::Main => self.handle_main_key(key),
            AppView::Settings => self.handle_settings_key(key),
        }
    }

    fn handle_main_key(&mut self, key: event::KeyEvent) -> Option<AppAction> {
        match key.code {
            KeyCode::Char('q') => {
                self.should_quit = true;
                Some(AppAction::Quit)
            }
            KeyCode::Char('s') => {
                if self.control_enabled {
                    self.view = AppView::Settings;
                }
                None
            }
            KeyCode::Enter | KeyCode::Char(' ') => {
                if self.control_enabled {
                    Some(AppAction::StartTest)
                } else {
                    None
                }
            }
            KeyCode::Esc => {
                if self.control_enabled {
                    None
                } else {
                    Some(AppAction::CancelTest)
                }
            }
            _ => None,
        }
    }

    fn handle_settings_key(&mut self, key: event::KeyEvent) -> Option<AppAction> {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc | KeyCode::Enter => {
                self.view = AppView::Main;
                Some(AppAction::ApplySettings)
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected_setting = self.selected_setting.prev();
                None
            }
            KeyCode::Down | KeyCode::Char('j') | KeyCode::Tab => {
                self.selected_setting = self.selected_setting.next();
                None
            }
            KeyCode::Left | KeyCode::Char('h') => {
                self.decrease_setting();
                None
            }
            KeyCode::Right | KeyCode::Char('l') => {
                self.increase_setting();
                None
            }
            _ => None,
        }
    }

    fn increase_setting(&mut self) {
        let s = &mut self.settings;
        match self.selected_setting {
            SettingsField::UploadSize => {
                s.upload_size_bytes = (s.upload_size_bytes + UPLOAD_SIZE_STEP).min(MAX_UPLOAD_SIZE);
            }
            SettingsField::UploadMode => s.upload_mode = s.upload_mode.toggle(),
            SettingsField::InterPhaseDelay => {
                s.inter_phase_delay_ms = (s.inter_phase_delay_ms + DELAY_STEP_MS).min(MAX_DELAY_MS);
            }
            SettingsField::AnimationSteps => {
                s.animation_step_count = (s.animation_step_count + STEP_COUNT_STEP).min(MAX_STEP_COUNT);
            }
        }
    }

    fn decrease_setting(&mut self) {
        let s = &mut self.settings;
        match self.selected_setting {
            SettingsField::UploadSize => {
                s.upload_size_bytes = s
                    .upload_size_bytes
                    .saturating_sub(UPLOAD_SIZE_STEP)
                    .max(UPLOAD_SIZE_STEP);
            }
            SettingsField::UploadMode => s.upload_mode = s.upload_mode.toggle(),
            SettingsField::InterPhaseDelay => {
                s.inter_phase_delay_ms = s.inter_phase_delay_ms.saturating_sub(DELAY_STEP_MS);
            }
            SettingsField::AnimationSteps => {
                s.animation_step_count = s
                    .animation_step_count
                    .saturating_sub(STEP_COUNT_STEP)
                    .max(STEP_COUNT_STEP);
            }
        }
    }

    pub fn apply_update(&mut self, update: UiUpdate) {
        match update {
            UiUpdate::Display(value) => self.display_value = value,
            UiUpdate::Status(text) => self.status_text = text,
            UiUpdate::DownloadLabel(text) => self.download_text = text,
            UiUpdate::UploadLabel(text) => self.upload_text = text,
            UiUpdate::ControlEnabled(enabled) => {
                self.control_enabled = enabled;
                if enabled {
                    self.cancel = None;
                }
            }
            UiUpdate::Phase(phase) => self.phase = phase,
        }
    }

    pub fn set_cancel_token(&mut self, token: CancellationToken) {
        self.cancel = Some(token);
    }

    pub fn cancel_test(&mut self) {
        if let Some(token) = self.cancel.take() {
            token.cancel();
        }
    }

    pub fn upload_mode(&self) -> UploadMode {
        self.settings.upload_mode
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppAction {
    Quit,
    StartTest,
    CancelTest,
    ApplySettings,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UiUpdate {
    Display(f64),
    Status(String),
    DownloadLabel(String),
    UploadLabel(String),
    ControlEnabled(bool),
    Phase(TestPhase),
}

/// Forwards presentation calls to the UI loop.
pub struct ChannelPresentation {
    tx: mpsc::UnboundedSender<UiUpdate>,
}

impl ChannelPresentation {
    pub fn new(tx: mpsc::UnboundedSender<UiUpdate>) -> Self {
        Self { tx }
    }

    fn send(&self, update: UiUpdate) {
        // The UI may already be gone when quitting mid-test.
        let _ = self.tx.send(update);
    }
}

impl Presentation for ChannelPresentation {
    fn set_display(&self, value: f64) {
        self.send(UiUpdate::Display(value));
    }

    fn set_status(&self, text: &str) {
        self.send(UiUpdate::Status(text.to_string()));
    }

    fn set_download_label(&self, text: &str) {
        self.send(UiUpdate::DownloadLabel(text.to_string()));
    }

    fn set_upload_label(&self, text: &str) {
        self.send(UiUpdate::UploadLabel(text.to_string()));
    }

    fn set_control_enabled(&self, enabled: bool) {
        self.send(UiUpdate::ControlEnabled(enabled));
    }

    fn set_phase(&self, phase: TestPhase) {
        self.send(UiUpdate::Phase(phase));
    }
}

/// Runs a test started from the UI, which locks its control before spawning.
///
/// A refused start never reaches the presentation, so the control is handed
/// back here.
pub async fn run_test<S: Sampler>(
    orchestrator: Arc<Orchestrator<S, ChannelPresentation>>,
    cancel: CancellationToken,
) -> RunOutcome {
    let outcome = orchestrator.run(cancel).await;
    if outcome == RunOutcome::AlreadyRunning {
        debug!("Start refused, releasing the control");
        orchestrator.presentation().set_control_enabled(true);
    }
    outcome
}

pub fn poll_event(timeout: Duration) -> Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}

use anyhow::Result;
use clap::Parser;
use crossterm::event::Event;
use fastgauge::app::{poll_event, run_test, App, AppAction, ChannelPresentation, UiUpdate};
use fastgauge::cli::Cli;
use fastgauge::error::InitializationError;
use fastgauge::logging::init_logger;
use fastgauge::orchestrator::{Orchestrator, RunOutcome};
use fastgauge::presentation::ConsolePresentation;
use fastgauge::settings::Settings;
use fastgauge::speedtest::HttpSampler;
use fastgauge::ui::draw_ui;
use log::{error, info};
use ratatui::DefaultTerminal;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

type TuiOrchestrator = Orchestrator<HttpSampler, ChannelPresentation>;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(cli.effective_log_level(), cli.log_file.as_deref())?;

    let mut settings = Settings::load(cli.config.as_deref()).map_err(InitializationError::from)?;
    cli.apply_overrides(&mut settings);
    settings.validate().map_err(InitializationError::from)?;
    info!(
        "Testing against {} (upload: {}, {} bytes)",
        settings.base_url, settings.upload_mode, settings.upload_size_bytes
    );

    if cli.plain {
        return run_plain(&settings).await;
    }

    let mut terminal = ratatui::init();
    terminal.clear()?;

    let result = run_app(&mut terminal, settings).await;

    ratatui::restore();
    result
}

async fn run_plain(settings: &Settings) -> Result<()> {
    let sampler = HttpSampler::new(settings)?;
    let orchestrator =
        Orchestrator::from_settings(sampler, ConsolePresentation::new(std::io::stdout()), settings);

    let token = CancellationToken::new();
    let ctrl_c = {
        let token = token.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                token.cancel();
            }
        })
    };

    let outcome = orchestrator.run(token).await;
    ctrl_c.abort();

    if let RunOutcome::Completed(result) = outcome {
        info!(
            "Result: {} Mbps down, {} Mbps up",
            result.download.mbps(),
            result.upload.mbps()
        );
    }
    Ok(())
}

fn build_orchestrator(
    settings: &Settings,
    ui_tx: &mpsc::UnboundedSender<UiUpdate>,
) -> Result<Arc<TuiOrchestrator>, InitializationError> {
    let sampler = HttpSampler::new(settings)?;
    let presentation = ChannelPresentation::new(ui_tx.clone());
    Ok(Arc::new(Orchestrator::from_settings(sampler, presentation, settings)))
}

async fn run_app(terminal: &mut DefaultTerminal, settings: Settings) -> Result<()> {
    let (ui_tx, mut ui_rx) = mpsc::unbounded_channel();
    let mut app = App::new(settings);
    let mut orchestrator = build_orchestrator(&app.settings, &ui_tx)?;

    loop {
        terminal.draw(|frame| draw_ui(frame, &app))?;

        // Handle test updates
        while let Ok(update) = ui_rx.try_recv() {
            app.apply_update(update);
        }

        // Handle input
        if let Some(Event::Key(key)) = poll_event(Duration::from_millis(15))? {
            if let Some(action) = app.handle_key_event(key) {
                match action {
                    AppAction::Quit => {
                        app.cancel_test();
                        break;
                    }
                    AppAction::StartTest => {
                        let token = CancellationToken::new();
                        app.set_cancel_token(token.clone());
                        // Lock the control now rather than when the first update lands.
                        app.apply_update(UiUpdate::ControlEnabled(false));

                        tokio::spawn(run_test(Arc::clone(&orchestrator), token));
                    }
                    AppAction::CancelTest => app.cancel_test(),
                    AppAction::ApplySettings => match build_orchestrator(&app.settings, &ui_tx) {
                        Ok(rebuilt) => orchestrator = rebuilt,
                        Err(err) => error!("Keeping previous settings: {}", err),
                    },
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

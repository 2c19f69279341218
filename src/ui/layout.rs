use crate::app::{App, AppView};
use crate::settings::{SettingsField, UploadMode};
use crate::speedtest::{PhaseStatus, TestPhase};
use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
    Frame,
};

// Phase colors
const DOWNLOAD: Color = Color::Rgb(134, 194, 156);
const UPLOAD: Color = Color::Rgb(147, 180, 220);
const RESULT: Color = Color::Rgb(100, 149, 237);

const TEXT: Color = Color::Rgb(230, 230, 230);
const TEXT_DIM: Color = Color::Rgb(160, 160, 160);
const TEXT_FAINT: Color = Color::Rgb(100, 100, 100);
const FRAME: Color = Color::Rgb(60, 60, 65);
const FRAME_LIVE: Color = Color::Rgb(100, 100, 110);
const GAUGE_TRACK: Color = Color::Rgb(45, 45, 50);

/// Full-scale values the gauge snaps to, in Mbps.
const GAUGE_SCALES: [f64; 9] = [10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 10000.0];

pub fn draw_ui(frame: &mut Frame, app: &App) {
    let area = frame.area();

    match app.view {
        AppView::Main => draw_main_view(frame, area, app),
        AppView::Settings => draw_settings_view(frame, area, app),
    }
}

fn draw_main_view(frame: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(7),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .split(area);

    draw_header(frame, chunks[0], app);
    draw_gauge(frame, chunks[1], app);
    draw_results(frame, chunks[2], app);
    draw_help(frame, chunks[3], app);
}

fn draw_header(frame: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(Style::default().fg(FRAME));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::horizontal([
        Constraint::Length(12),
        Constraint::Min(10),
        Constraint::Length(12),
    ])
    .split(inner);

    // Title
    let title = Paragraph::new("fastgauge")
        .style(Style::default().fg(TEXT).add_modifier(Modifier::BOLD));
    frame.render_widget(title, chunks[0]);

    // Status
    let color = match app.phase.status() {
        PhaseStatus::Idle => TEXT_FAINT,
        status => phase_color(status),
    };

    let status_text = Paragraph::new(app.status_text.as_str())
        .style(Style::default().fg(color))
        .alignment(Alignment::Center);
    frame.render_widget(status_text, chunks[1]);

    // Phase indicator
    frame.render_widget(
        Paragraph::new(create_phase_text(app.phase)).alignment(Alignment::Right),
        chunks[2],
    );
}

fn create_phase_text(phase: TestPhase) -> Line<'static> {
    let phases = [
        (PhaseStatus::TestingDownload, "down"),
        (PhaseStatus::TestingUpload, "up"),
    ];
    let current = phase.status();

    let mut spans = Vec::new();

    for (i, (p, label)) in phases.iter().enumerate() {
        let is_active = current == *p;
        let is_complete = match current {
            PhaseStatus::TestingUpload => *p == PhaseStatus::TestingDownload,
            PhaseStatus::Complete => true,
            _ => false,
        };

        let style = if is_active {
            Style::default().fg(RESULT).add_modifier(Modifier::BOLD)
        } else if is_complete {
            Style::default().fg(TEXT_DIM)
        } else {
            Style::default().fg(TEXT_FAINT)
        };

        spans.push(Span::styled(*label, style));

        if i < phases.len() - 1 {
            spans.push(Span::styled(" / ", Style::default().fg(TEXT_FAINT)));
        }
    }

    Line::from(spans)
}

fn draw_gauge(frame: &mut Frame, area: Rect, app: &App) {
    let active = app.is_active();
    let color = phase_color(app.phase.status());

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if active { FRAME_LIVE } else { FRAME }))
        .title(Span::styled(
            " Speed ",
            Style::default().fg(if active { color } else { TEXT_DIM }),
        ));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::vertical([
        Constraint::Min(1),
        Constraint::Length(2),
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Min(1),
    ])
    .split(inner);

    // Value
    let value = Line::from(vec![
        Span::styled(
            app.display_text(),
            Style::default().fg(TEXT).add_modifier(Modifier::BOLD),
        ),
        Span::styled(" Mbps", Style::default().fg(TEXT_FAINT)),
    ]);
    frame.render_widget(Paragraph::new(value).alignment(Alignment::Center), chunks[1]);

    // Bar
    let bar_area = Layout::horizontal([
        Constraint::Length(2),
        Constraint::Min(4),
        Constraint::Length(2),
    ])
    .split(chunks[2])[1];

    let scale = gauge_scale(app.display_value);
    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(if active { color } else { TEXT_DIM }).bg(GAUGE_TRACK))
        .ratio(gauge_ratio(app.display_value, scale))
        .label("");
    frame.render_widget(gauge, bar_area);

    // Scale
    frame.render_widget(
        Paragraph::new(format!("0 … {} Mbps", scale))
            .style(Style::default().fg(TEXT_FAINT))
            .alignment(Alignment::Center),
        chunks[3],
    );
}

fn draw_results(frame: &mut Frame, area: Rect, app: &App) {
    let panels = Layout::horizontal([Constraint::Ratio(1, 2), Constraint::Ratio(1, 2)]).split(area);

    draw_result_panel(frame, panels[0], &app.download_text, DOWNLOAD);
    draw_result_panel(frame, panels[1], &app.upload_text, UPLOAD);
}

fn draw_result_panel(frame: &mut Frame, area: Rect, text: &str, color: Color) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(FRAME));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    frame.render_widget(
        Paragraph::new(text)
            .style(Style::default().fg(color))
            .alignment(Alignment::Center),
        inner,
    );
}

// Settings
fn draw_settings_view(frame: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(10),
        Constraint::Length(1),
    ])
    .split(area);

    // Header
    let header_block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(Style::default().fg(FRAME));
    let header_inner = header_block.inner(chunks[0]);
    frame.render_widget(header_block, chunks[0]);

    frame.render_widget(
        Paragraph::new("Settings")
            .style(Style::default().fg(TEXT).add_modifier(Modifier::BOLD)),
        header_inner,
    );

    // Settings content
    let content_area = Layout::horizontal([
        Constraint::Length(2),
        Constraint::Min(30),
        Constraint::Length(2),
    ])
    .split(chunks[1])[1];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(FRAME));
    let inner = block.inner(content_area);
    frame.render_widget(block, content_area);

    let rows = Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Min(0),
    ])
    .split(inner);

    let fields = [
        (SettingsField::UploadSize, "Upload size"),
        (SettingsField::UploadMode, "Upload mode"),
        (SettingsField::InterPhaseDelay, "Pause"),
        (SettingsField::AnimationSteps, "Gauge steps"),
    ];

    for (row, (field, label)) in rows.iter().zip(fields) {
        let selected = app.selected_setting == field;
        draw_setting_row(frame, *row, label, setting_value(app, field, selected), selected);
    }

    // Help
    let help = "↑↓ select · ←→ adjust · enter done";
    frame.render_widget(
        Paragraph::new(help)
            .style(Style::default().fg(TEXT_FAINT))
            .alignment(Alignment::Center),
        chunks[2],
    );
}

fn draw_setting_row(frame: &mut Frame, area: Rect, label: &str, value: Line<'static>, selected: bool) {
    let chunks = Layout::horizontal([Constraint::Length(16), Constraint::Min(10)]).split(area);

    let label = if selected {
        Line::from(vec![
            Span::styled("› ", Style::default().fg(RESULT)),
            Span::styled(label.to_string(), Style::default().fg(TEXT)),
        ])
    } else {
        Line::styled(format!("  {}", label), Style::default().fg(TEXT_DIM))
    };

    frame.render_widget(Paragraph::new(label), chunks[0]);
    frame.render_widget(Paragraph::new(value), chunks[1]);
}

/// The editable value of one settings row. Numbers get arrows while
/// selected; the upload mode lists both choices with the active one lit.
fn setting_value(app: &App, field: SettingsField, selected: bool) -> Line<'static> {
    let settings = &app.settings;
    let text = match field {
        SettingsField::UploadMode => return upload_mode_choices(app.upload_mode(), selected),
        SettingsField::UploadSize => format!("{:.0} MiB", settings.upload_size_mib()),
        SettingsField::InterPhaseDelay => format!("{} ms", settings.inter_phase_delay_ms),
        SettingsField::AnimationSteps => settings.animation_step_count.to_string(),
    };

    if selected {
        Line::from(vec![
            Span::styled("◂ ", Style::default().fg(TEXT_FAINT)),
            Span::styled(text, Style::default().fg(TEXT).add_modifier(Modifier::BOLD)),
            Span::styled(" ▸", Style::default().fg(TEXT_FAINT)),
        ])
    } else {
        Line::styled(text, Style::default().fg(TEXT_DIM))
    }
}

fn upload_mode_choices(current: UploadMode, selected: bool) -> Line<'static> {
    let mut spans = Vec::new();
    for (i, mode) in [UploadMode::Real, UploadMode::Simulated].into_iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" · ", Style::default().fg(TEXT_FAINT)));
        }
        let style = match (mode == current, selected) {
            (true, true) => Style::default().fg(RESULT).add_modifier(Modifier::BOLD),
            (true, false) => Style::default().fg(TEXT),
            (false, _) => Style::default().fg(TEXT_FAINT),
        };
        spans.push(Span::styled(mode.to_string(), style));
    }
    Line::from(spans)
}

fn draw_help(frame: &mut Frame, area: Rect, app: &App) {
    let help = if app.control_enabled {
        "enter start · s settings · q quit"
    } else {
        "esc cancel · q quit"
    };

    frame.render_widget(
        Paragraph::new(help)
            .style(Style::default().fg(TEXT_FAINT))
            .alignment(Alignment::Center),
        area,
    );
}

// Helpers
fn phase_color(status: PhaseStatus) -> Color {
    match status {
        PhaseStatus::TestingDownload => DOWNLOAD,
        PhaseStatus::TestingUpload => UPLOAD,
        PhaseStatus::Idle | PhaseStatus::Complete => RESULT,
    }
}

fn gauge_scale(mbps: f64) -> f64 {
    GAUGE_SCALES
        .iter()
        .copied()
        .find(|scale| mbps <= *scale)
        .unwrap_or(mbps)
}

fn gauge_ratio(mbps: f64, scale: f64) -> f64 {
    if scale <= 0.0 {
        return 0.0;
    }
    (mbps / scale).clamp(0.0, 1.0)
}

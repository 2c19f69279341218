//! The seam between the measurement core and whatever renders it.
//!
//! The orchestrator and animator only ever talk to a [`Presentation`]; the
//! terminal UI and the plain console output are two implementations of it.

use crate::speedtest::TestPhase;
use std::io::Write;
use std::sync::Mutex;

/// Receives every user-visible change a test run makes.
pub trait Presentation: Send + Sync {
    /// The gauge value, already rounded to one decimal.
    fn set_display(&self, value: f64);
    fn set_status(&self, text: &str);
    fn set_download_label(&self, text: &str);
    fn set_upload_label(&self, text: &str);
    /// `false` while a run is in progress; doubles as the "active" indicator.
    fn set_control_enabled(&self, enabled: bool);
    fn set_phase(&self, _phase: TestPhase) {}
}

/// Formats a display value the way every renderer shows it.
pub fn format_display(value: f64) -> String {
    format!("{:.1}", value)
}

/// Line-oriented output for terminals without the full UI.
///
/// Gauge frames are not printed; only labels and status changes are.
pub struct ConsolePresentation<W: Write + Send> {
    out: Mutex<W>,
}

impl<W: Write + Send> ConsolePresentation<W> {
    pub fn new(out: W) -> Self {
        Self { out: Mutex::new(out) }
    }

    fn line(&self, text: &str) {
        if let Ok(mut out) = self.out.lock() {
            // Nowhere to report a broken stdout to.
            let _ = writeln!(out, "{}", text);
        }
    }
}

impl<W: Write + Send> Presentation for ConsolePresentation<W> {
    fn set_display(&self, _value: f64) {}

    fn set_status(&self, text: &str) {
        self.line(text);
    }

    fn set_download_label(&self, text: &str) {
        self.line(text);
    }

    fn set_upload_label(&self, text: &str) {
        self.line(text);
    }

    fn set_control_enabled(&self, _enabled: bool) {}
}

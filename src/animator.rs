//! Smooth transitions of the displayed speed.
//!
//! [`interpolate`] decides which values to show; [`Animator`] decides when to
//! show them and owns the value currently on screen.

use crate::presentation::Presentation;
use crate::settings::Settings;
use crate::speedtest::round_to;
use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Differences below this are applied without animating.
pub const SHORT_CIRCUIT_THRESHOLD: f64 = 0.05;

pub const DEFAULT_STEP_COUNT: u32 = 45;
pub const DEFAULT_TICK_MS: u64 = 18;

/// One animation from the current value to a new target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationTarget {
    pub start_value: f64,
    pub target_value: f64,
    pub step_count: u32,
}

impl AnimationTarget {
    pub fn new(start_value: f64, target_value: f64, step_count: u32) -> Self {
        Self {
            start_value,
            target_value,
            step_count: step_count.max(1),
        }
    }

    /// True when the change is too small to be worth animating.
    pub fn is_imperceptible(&self) -> bool {
        (self.target_value - self.start_value).abs() < SHORT_CIRCUIT_THRESHOLD
    }

    /// The value the display must hold once this animation settles.
    pub fn settled_value(&self) -> f64 {
        round_to(self.target_value, 1)
    }

    /// One rendered value per tick. The last frame is always the settled value.
    pub fn frames(&self) -> Vec<f64> {
        let increment = (self.target_value - self.start_value) / self.step_count as f64;
        (1..=self.step_count)
            .map(|i| {
                if i == self.step_count {
                    self.settled_value()
                } else {
                    let v = self.start_value + increment * i as f64;
                    // Also catches -0.0, which would render as "-0.0".
                    if v > 0.0 {
                        round_to(v, 1)
                    } else {
                        0.0
                    }
                }
            })
            .collect()
    }
}

/// The ordered values an animation from `start` to `target` renders.
pub fn interpolate(start: f64, target: f64, steps: u32) -> Vec<f64> {
    AnimationTarget::new(start, target, steps).frames()
}

/// Drives the displayed value, one frame per tick.
#[derive(Debug)]
pub struct Animator {
    step_count: u32,
    tick: Duration,
    displayed: f64,
}

impl Animator {
    pub fn new(step_count: u32, tick: Duration) -> Self {
        Self {
            step_count: step_count.max(1),
            tick,
            displayed: 0.0,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.animation_step_count,
            Duration::from_millis(settings.animation_tick_ms),
        )
    }

    pub fn displayed(&self) -> f64 {
        self.displayed
    }

    /// Jumps straight to zero without animating.
    pub fn reset<P: Presentation + ?Sized>(&mut self, presentation: &P) {
        self.displayed = 0.0;
        presentation.set_display(0.0);
    }

    /// Moves the display to `target`, returning once it shows the target.
    ///
    /// Dropping the future mid-way leaves the display on the last frame shown.
    pub async fn animate_to<P: Presentation + ?Sized>(&mut self, target: f64, presentation: &P) {
        let animation = AnimationTarget::new(self.displayed, target, self.step_count);

        if animation.is_imperceptible() {
            self.show(animation.settled_value(), presentation);
            return;
        }

        let mut ticks = interval_at(Instant::now() + self.tick, self.tick);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

        for frame in animation.frames() {
            ticks.tick().await;
            self.show(frame, presentation);
        }
    }

    fn show<P: Presentation + ?Sized>(&mut self, value: f64, presentation: &P) {
        self.displayed = value;
        presentation.set_display(value);
    }
}

impl Default for Animator {
    fn default() -> Self {
        Self::new(DEFAULT_STEP_COUNT, Duration::from_millis(DEFAULT_TICK_MS))
    }
}

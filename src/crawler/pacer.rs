//! Human-like pacing between crawl actions
//!
//! Delays follow a clipped normal distribution mapped into
//! `[min_delay, max_delay]`, stretched by a fatigue factor that grows with the
//! number of actions taken. Every `coffee_break_interval` actions a long
//! pause is inserted.

use crate::config::TimingConfig;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

/// Relative spread of a coffee break around its nominal duration
const COFFEE_BREAK_SPREAD: f64 = 0.3;

/// Fatigue slowdown reached after 100 actions
const FATIGUE_PER_HUNDRED: f64 = 0.5;

/// Source of uniform random numbers in `[0, 1)`
pub trait UniformSource: Send {
    fn next_unit(&mut self) -> f64;
}

/// `UniformSource` backed by the standard RNG
pub struct StdUniform(StdRng);

impl StdUniform {
    pub fn from_entropy() -> Self {
        Self(StdRng::from_entropy())
    }

    pub fn seeded(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl UniformSource for StdUniform {
    fn next_unit(&mut self) -> f64 {
        self.0.gen::<f64>()
    }
}

/// Decides how long to wait before the next action
pub struct Pacer {
    timing: TimingConfig,
    enabled: bool,
    action_count: u64,
    source: Box<dyn UniformSource>,
}

impl Pacer {
    /// Creates a pacer with an entropy-seeded random source
    ///
    /// # Arguments
    ///
    /// * `timing` - Delay bounds and coffee break settings
    /// * `enabled` - When false, `before_action` never waits
    pub fn new(timing: TimingConfig, enabled: bool) -> Self {
        Self::with_source(timing, enabled, Box::new(StdUniform::from_entropy()))
    }

    pub fn with_source(timing: TimingConfig, enabled: bool, source: Box<dyn UniformSource>) -> Self {
        Self {
            timing,
            enabled,
            action_count: 0,
            source,
        }
    }

    pub fn action_count(&self) -> u64 {
        self.action_count
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Forgets accumulated fatigue
    pub fn reset(&mut self) {
        self.action_count = 0;
    }

    /// Waits before an item action
    ///
    /// Sleeps for the next action delay, takes a coffee break when one is
    /// due, then counts the action. No-op when pacing is disabled.
    pub async fn before_action(&mut self) {
        if !self.enabled {
            return;
        }

        let delay = self.next_action_delay();
        tracing::trace!("Pacing delay {:?} (action {})", delay, self.action_count);
        tokio::time::sleep(delay).await;

        if self.coffee_break_due() {
            let pause = self.coffee_break_duration();
            tracing::info!(
                "Taking a {}s break after {} actions",
                pause.as_secs(),
                self.action_count
            );
            tokio::time::sleep(pause).await;
        }

        self.action_count += 1;
    }

    /// Waits the configured pause before moving to another page
    pub async fn page_delay(&mut self) {
        tokio::time::sleep(self.timing.page_delay()).await;
    }

    /// Waits between discovery polls that found nothing new
    pub async fn stall_wait(&mut self) {
        tokio::time::sleep(self.stall_duration()).await;
    }

    /// Draws the delay for the next action, including fatigue
    pub fn next_action_delay(&mut self) -> Duration {
        let min = self.timing.min_delay as f64;
        let span = self.timing.max_delay.saturating_sub(self.timing.min_delay) as f64;
        let fatigue = 1.0 + FATIGUE_PER_HUNDRED * self.action_count as f64 / 100.0;

        let millis = (min + span * self.gaussian_unit()) * fatigue;
        Duration::from_secs_f64(millis.max(0.0) / 1000.0)
    }

    /// True when the action about to be counted falls on a break boundary
    pub fn coffee_break_due(&self) -> bool {
        let interval = u64::from(self.timing.coffee_break_interval);
        interval > 0 && self.action_count > 0 && self.action_count % interval == 0
    }

    /// Draws a coffee break length within the configured spread
    pub fn coffee_break_duration(&mut self) -> Duration {
        let nominal = self.timing.coffee_break_duration as f64;
        let offset = (2.0 * self.source.next_unit() - 1.0) * COFFEE_BREAK_SPREAD * nominal;
        Duration::from_secs_f64((nominal + offset).max(0.0) / 1000.0)
    }

    /// Stall delay plus up to a third of it as jitter
    pub fn stall_duration(&mut self) -> Duration {
        let base = self.timing.stall_delay as f64;
        let jitter = self.source.next_unit() * base / 3.0;
        Duration::from_secs_f64((base + jitter) / 1000.0)
    }

    /// Box-Muller normal sample clipped at three sigma and mapped to `[0, 1]`
    fn gaussian_unit(&mut self) -> f64 {
        let u = self.nonzero_unit();
        let v = self.nonzero_unit();
        let normal = (-2.0 * u.ln()).sqrt() * (2.0 * std::f64::consts::PI * v).cos();
        ((normal + 3.0) / 6.0).clamp(0.0, 1.0)
    }

    fn nonzero_unit(&mut self) -> f64 {
        loop {
            let value = self.source.next_unit();
            if value > 0.0 {
                return value;
            }
        }
    }
}

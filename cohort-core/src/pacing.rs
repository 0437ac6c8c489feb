use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SchedulerError};

/// Fixed inter-batch delay used when ban prevention is switched off.
const FAST_INTER_BATCH_DELAY: Duration = Duration::from_secs(5);

/// Inclusive `[min, max]` delay bounds in seconds.
///
/// Draws are uniform continuous, so two draws from the same range almost
/// never coincide; a zero-width range is the deterministic escape hatch for
/// tests and headless profiles.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DelayRange {
    pub min_secs: f64,
    pub max_secs: f64,
}

impl DelayRange {
    pub const fn new(min_secs: f64, max_secs: f64) -> Self {
        Self { min_secs, max_secs }
    }

    pub const ZERO: Self = Self::new(0.0, 0.0);

    pub fn validate(&self, field: &str) -> Result<()> {
        if !self.min_secs.is_finite() || !self.max_secs.is_finite() {
            return Err(SchedulerError::InvalidConfiguration(format!(
                "{field}: delay bounds must be finite"
            )));
        }
        if self.min_secs < 0.0 {
            return Err(SchedulerError::InvalidConfiguration(format!(
                "{field}: delay bounds must be non-negative"
            )));
        }
        if self.min_secs > self.max_secs {
            return Err(SchedulerError::InvalidConfiguration(format!(
                "{field}: min delay {} exceeds max delay {}",
                self.min_secs, self.max_secs
            )));
        }
        Ok(())
    }

    pub(crate) fn sample(&self, rng: &mut impl Rng) -> Duration {
        if self.max_secs <= self.min_secs {
            return Duration::from_secs_f64(self.min_secs);
        }
        Duration::from_secs_f64(rng.random_range(self.min_secs..=self.max_secs))
    }
}

/// Timing knobs for the anti-detection pacing policy.
///
/// Defaults are the conservative profile observed to survive abuse
/// detection: seconds between member adds, tens of seconds between batches,
/// and a twenty-minute cooldown every ten batches. The headless "fast"
/// profile is the same structure with narrow ranges, not a different code
/// path.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    /// Delay drawn before every member-add or promotion action.
    pub inter_contact: DelayRange,
    /// Delay drawn between consecutive batches.
    pub inter_batch: DelayRange,
    /// Batches allowed per rolling session window before a cooldown.
    pub max_batches_per_window: u32,
    /// Cooldown length in seconds once the window limit is reached.
    pub cooldown_secs: u64,
    /// When disabled, inter-batch pacing degrades to a short fixed delay.
    pub ban_prevention_enabled: bool,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            inter_contact: DelayRange::new(2.0, 6.0),
            inter_batch: DelayRange::new(30.0, 90.0),
            max_batches_per_window: 10,
            cooldown_secs: 1_200,
            ban_prevention_enabled: true,
        }
    }
}

impl PacingConfig {
    pub fn validate(&self) -> Result<()> {
        self.inter_contact.validate("inter_contact")?;
        self.inter_batch.validate("inter_batch")?;
        if self.max_batches_per_window == 0 {
            return Err(SchedulerError::InvalidConfiguration(
                "max_batches_per_window must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }
}

/// Rolling session window tracked across batches.
///
/// Mutated only by [`PacingPolicy`]; reset when a cooldown completes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub batches_completed_in_window: u32,
    pub cooldown_active: bool,
}

/// Computes inter-action delays and session cooldowns for one run.
///
/// The random source is owned by the policy so tests can seed it and replay
/// the exact draw sequence.
#[derive(Debug)]
pub struct PacingPolicy {
    config: PacingConfig,
    rng: StdRng,
    session: SessionState,
}

impl PacingPolicy {
    pub fn new(config: PacingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            rng: StdRng::from_os_rng(),
            session: SessionState::default(),
        })
    }

    pub fn seeded(config: PacingConfig, seed: u64) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            rng: StdRng::seed_from_u64(seed),
            session: SessionState::default(),
        })
    }

    pub fn config(&self) -> &PacingConfig {
        &self.config
    }

    pub fn session(&self) -> SessionState {
        self.session
    }

    /// Fresh uniform draw for the pause before a member-add or promotion.
    /// Never cached: every action gets an independent delay.
    pub fn inter_contact_delay(&mut self) -> Duration {
        self.config.inter_contact.sample(&mut self.rng)
    }

    /// Pause between consecutive batches. Zero after the last batch; a
    /// short fixed delay when ban prevention is off.
    pub fn inter_batch_delay(&mut self, is_last_batch: bool) -> Duration {
        if is_last_batch {
            return Duration::ZERO;
        }
        if !self.config.ban_prevention_enabled {
            return FAST_INTER_BATCH_DELAY;
        }
        self.config.inter_batch.sample(&mut self.rng)
    }

    pub fn should_cooldown(&self) -> bool {
        self.session.batches_completed_in_window >= self.config.max_batches_per_window
    }

    pub fn record_batch_completed(&mut self) {
        self.session.batches_completed_in_window =
            self.session.batches_completed_in_window.saturating_add(1);
    }

    /// Suspends the caller for the configured cooldown, then opens a fresh
    /// session window.
    pub async fn enter_cooldown(&mut self) {
        self.session.cooldown_active = true;
        let cooldown = self.config.cooldown();
        tracing::info!(
            target: "cohort::pacing",
            batches_in_window = self.session.batches_completed_in_window,
            cooldown_secs = cooldown.as_secs(),
            "session window limit reached, entering cooldown"
        );
        tokio::time::sleep(cooldown).await;
        self.session.batches_completed_in_window = 0;
        self.session.cooldown_active = false;
        tracing::info!(target: "cohort::pacing", "cooldown complete, session window reset");
    }
}

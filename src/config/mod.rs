//! Engine tunables.
//!
//! Every constant the motion and layout algorithms rely on lives here so hosts
//! can override them from JSON. Missing sections or fields keep their defaults.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::persistence::SLIDE_INDEX_KEY;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub stabilizer: StabilizerConfig,
    pub anchor: AnchorConfig,
    pub orbit: OrbitConfig,
    pub controller: ControllerConfig,
}

impl EngineConfig {
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.orbit.validate()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StabilizerConfig {
    /// Delay between height samples.
    pub interval_ms: u64,
    /// Two maxima closer than this count as unchanged.
    pub tolerance: f64,
    /// Consecutive unchanged samples required to settle.
    pub required_stable: u32,
    /// Retry ceiling; the loop publishes once this many retries have run.
    pub max_retries: u32,
}

impl StabilizerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for StabilizerConfig {
    fn default() -> Self {
        Self {
            interval_ms: 300,
            tolerance: 2.0,
            required_stable: 2,
            max_retries: 15,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnchorConfig {
    /// Added to each axis after rounding up.
    pub padding: f64,
}

impl Default for AnchorConfig {
    fn default() -> Self {
        Self { padding: 20.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbitConfig {
    pub initial_deg: f64,
    pub sweep_deg: f64,
    pub sweep_duration_ms: u64,
    pub golden_ratio: f64,
    /// Degrees removed per unit of ratio deficit.
    pub ratio_scale: f64,
    pub min_deg: f64,
    pub max_deg: f64,
}

impl OrbitConfig {
    pub fn sweep_duration(&self) -> Duration {
        Duration::from_millis(self.sweep_duration_ms)
    }

    /// Resting-angle bounds must be finite and ordered.
    pub fn validate(&self) -> Result<()> {
        if !self.min_deg.is_finite() || !self.max_deg.is_finite() {
            return Err(EngineError::InvalidConfig(
                "orbit bounds must be finite".to_string(),
            ));
        }
        if self.min_deg > self.max_deg {
            return Err(EngineError::InvalidConfig(format!(
                "orbit min_deg {} exceeds max_deg {}",
                self.min_deg, self.max_deg
            )));
        }
        Ok(())
    }
}

impl Default for OrbitConfig {
    fn default() -> Self {
        Self {
            initial_deg: -65.0,
            sweep_deg: 360.0,
            sweep_duration_ms: 2000,
            golden_ratio: 1.618,
            ratio_scale: 3.0,
            min_deg: -85.0,
            max_deg: -65.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Delay after initialization before pointer effects are enabled.
    pub settle_delay_ms: u64,
    /// Used for deferred work when the host has no idle callback.
    pub idle_fallback_ms: u64,
    pub storage_key: String,
}

impl ControllerConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn idle_fallback(&self) -> Duration {
        Duration::from_millis(self.idle_fallback_ms)
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: 1000,
            idle_fallback_ms: 1000,
            storage_key: SLIDE_INDEX_KEY.to_string(),
        }
    }
}

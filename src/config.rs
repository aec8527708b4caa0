use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Largest accepted grid side. Keeps every dense buffer well under i32 indexing
/// and bounds a single allocation to 256 MiB of f32.
pub const MAX_GRID_SIZE: usize = 8192;
/// Largest accepted step budget.
pub const MAX_TIME_STEPS: usize = 1 << 16;
/// Path tracing keeps one byte per cell per step; cap the total.
pub const MAX_TRACE_BYTES: usize = 1 << 32;

/// All tunable parameters. The CLI loads them from JSON, the server
/// accepts them as per-request overrides.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    // Grid and budget
    pub grid_size: usize,
    pub time_steps: usize,

    // Wave equation
    pub attack_factor: f32,
    pub energy_preservation_factor: f32,

    // Passability
    pub land_threshold: f32,
    pub ship_threshold: f32,

    // Worker threads, 0 = rayon default
    pub threads: usize,

    // Problem generator
    pub num_storms: usize,
    pub storm_radius: f32,
    pub island_scale: f32,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            grid_size: 512,
            time_steps: 1024,
            attack_factor: 0.2,
            energy_preservation_factor: 1.99,
            land_threshold: 0.5,
            ship_threshold: 0.2,
            threads: 0,
            num_storms: 12,
            storm_radius: 12.0,
            island_scale: 4.0,
        }
    }
}

impl Params {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid_size < 3 {
            return Err(ConfigError::GridTooSmall(self.grid_size));
        }
        if self.grid_size > MAX_GRID_SIZE {
            return Err(ConfigError::GridTooLarge {
                size: self.grid_size,
                max: MAX_GRID_SIZE,
            });
        }
        if self.time_steps < 2 {
            return Err(ConfigError::StepBudget(self.time_steps));
        }
        if self.time_steps > MAX_TIME_STEPS {
            return Err(ConfigError::StepBudgetTooLarge {
                steps: self.time_steps,
                max: MAX_TIME_STEPS,
            });
        }
        for (name, v) in [
            ("attack_factor", self.attack_factor),
            ("energy_preservation_factor", self.energy_preservation_factor),
            ("land_threshold", self.land_threshold),
            ("storm_radius", self.storm_radius),
            ("island_scale", self.island_scale),
        ] {
            if !v.is_finite() || v < 0.0 {
                return Err(ConfigError::InvalidFactor { name, value: v });
            }
        }
        if !(self.ship_threshold > 0.0 && self.ship_threshold <= 1.0) {
            return Err(ConfigError::ShipThreshold(self.ship_threshold));
        }
        Ok(())
    }

    /// Worst-case memory of a traced run must stay under `MAX_TRACE_BYTES`.
    pub fn validate_trace(&self) -> Result<(), ConfigError> {
        let bytes = self
            .grid_size
            .saturating_mul(self.grid_size)
            .saturating_mul(self.time_steps);
        if bytes > MAX_TRACE_BYTES {
            return Err(ConfigError::TraceTooLarge {
                bytes,
                max: MAX_TRACE_BYTES,
            });
        }
        Ok(())
    }

    /// Parse from JSON; missing fields keep their defaults.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let params: Params = serde_json::from_str(text)?;
        params.validate()?;
        Ok(params)
    }
}

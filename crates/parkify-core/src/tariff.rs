//! Exit fee calculation

use chrono::Duration;
use serde::{Deserialize, Serialize};

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Flat hourly tariff with a minimum charge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tariff {
    /// Currency units charged per hour parked
    pub hourly_rate: u64,
    /// Floor applied to every exit
    pub minimum_fee: u64,
}

impl Default for Tariff {
    fn default() -> Self {
        Self {
            hourly_rate: 20,
            minimum_fee: 10,
        }
    }
}

impl Tariff {
    pub fn new(hourly_rate: u64, minimum_fee: u64) -> Self {
        Self {
            hourly_rate,
            minimum_fee,
        }
    }

    /// Fee owed for a stay of `parked`.
    ///
    /// Computed as `max(minimum_fee, round(hours * hourly_rate))`, rounding
    /// half-units up. Negative durations count as zero.
    pub fn fee_for(&self, parked: Duration) -> u64 {
        // Milliseconds keep half-unit boundaries exact in f64.
        let millis = parked.num_milliseconds().max(0) as f64;
        let charged = (millis * self.hourly_rate as f64 / MILLIS_PER_HOUR).round() as u64;
        charged.max(self.minimum_fee)
    }
}

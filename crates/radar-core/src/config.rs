use serde::{Deserialize, Serialize};

/// Immutable threshold set for the detection engine.
///
/// Every component takes this by reference; nothing reads thresholds from
/// globals, so tests can run the engine under alternative threshold sets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    // Fear & greed bands
    pub fear_deep: u32,
    pub fear_euphoria: u32,
    /// Upper edge of the "healthy" fear band used by the confidence score
    pub fear_healthy_max: u32,

    // Funding bands (signed fractions)
    pub funding_retail: f64,
    pub funding_euphoria: f64,
    /// "Effectively flat" funding ceiling for the bear-lag condition
    pub funding_lag_max: f64,

    // Volume-ratio bands
    pub volume_prestart: f64,
    pub volume_start: f64,
    pub volume_retail: f64,
    pub volume_normal: f64,
    pub volume_capitulation: f64,

    // 5-day change gates
    pub capitulation_change_max: f64,
    pub bull_lag_change_max: f64,

    // Glitch window
    pub glitch_window_days: i64,
    pub wick_confirm: f64,
    pub range_spike: f64,

    // Bias scoring
    pub bias_upper: f64,
    pub bias_lower: f64,
    pub hysteresis_runs: u32,

    // Alert deltas
    pub delta_confidence: f64,
    pub delta_health: f64,
    pub delta_bias: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            fear_deep: 30,
            fear_euphoria: 75,
            fear_healthy_max: 55,

            funding_retail: 0.02,
            funding_euphoria: 0.05,
            funding_lag_max: 0.005,

            volume_prestart: 1.2,
            volume_start: 1.5,
            volume_retail: 1.8,
            volume_normal: 1.2,
            volume_capitulation: 2.0,

            capitulation_change_max: -3.0,
            bull_lag_change_max: 1.0,

            glitch_window_days: 4,
            wick_confirm: 0.6,
            range_spike: 2.0,

            bias_upper: 65.0,
            bias_lower: 35.0,
            hysteresis_runs: 2,

            delta_confidence: 10.0,
            delta_health: 10.0,
            delta_bias: 10.0,
        }
    }
}

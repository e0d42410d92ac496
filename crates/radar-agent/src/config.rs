use anyhow::Result;
use radar_core::DetectorConfig;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Symbol tracked on both the spot and futures endpoints
    pub symbol: String,
    /// Daily candles requested per run
    pub candle_limit: u32,

    // Telegram notifications (both unset => notifications skipped)
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<String>,

    // Persisted state
    pub database_url: String,

    // Detection thresholds
    pub detector: DetectorConfig,
}

impl AgentConfig {
    pub fn from_env() -> Result<Self> {
        let config = Self {
            symbol: env::var("RADAR_SYMBOL").unwrap_or_else(|_| "BTCUSDT".to_string()),
            candle_limit: env::var("RADAR_CANDLE_LIMIT")
                .unwrap_or_else(|_| "60".to_string())
                .parse()?,

            telegram_bot_token: env::var("TELEGRAM_BOT_TOKEN")
                .ok()
                .filter(|s| !s.is_empty()),
            telegram_chat_id: env::var("TELEGRAM_CHAT_ID")
                .ok()
                .filter(|s| !s.is_empty()),

            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:radar.db".to_string()),

            detector: detector_from_env()?,
        };

        Ok(config)
    }
}

/// Detector thresholds: defaults from DetectorConfig, each overridable from
/// the environment for experimentation without a rebuild.
fn detector_from_env() -> Result<DetectorConfig> {
    let mut cfg = DetectorConfig::default();

    if let Ok(v) = env::var("FEAR_DEEP") {
        cfg.fear_deep = v.parse()?;
    }
    if let Ok(v) = env::var("FEAR_EUPHORIA") {
        cfg.fear_euphoria = v.parse()?;
    }
    if let Ok(v) = env::var("FEAR_HEALTHY_MAX") {
        cfg.fear_healthy_max = v.parse()?;
    }
    if let Ok(v) = env::var("FUNDING_RETAIL") {
        cfg.funding_retail = v.parse()?;
    }
    if let Ok(v) = env::var("FUNDING_EUPHORIA") {
        cfg.funding_euphoria = v.parse()?;
    }
    if let Ok(v) = env::var("FUNDING_LAG_MAX") {
        cfg.funding_lag_max = v.parse()?;
    }
    if let Ok(v) = env::var("VOLUME_PRESTART") {
        cfg.volume_prestart = v.parse()?;
    }
    if let Ok(v) = env::var("VOLUME_START") {
        cfg.volume_start = v.parse()?;
    }
    if let Ok(v) = env::var("VOLUME_RETAIL") {
        cfg.volume_retail = v.parse()?;
    }
    if let Ok(v) = env::var("VOLUME_NORMAL") {
        cfg.volume_normal = v.parse()?;
    }
    if let Ok(v) = env::var("VOLUME_CAPITULATION") {
        cfg.volume_capitulation = v.parse()?;
    }
    if let Ok(v) = env::var("CAPITULATION_CHANGE_MAX") {
        cfg.capitulation_change_max = v.parse()?;
    }
    if let Ok(v) = env::var("BULL_LAG_CHANGE_MAX") {
        cfg.bull_lag_change_max = v.parse()?;
    }
    if let Ok(v) = env::var("GLITCH_WINDOW_DAYS") {
        cfg.glitch_window_days = v.parse()?;
    }
    if let Ok(v) = env::var("WICK_CONFIRM") {
        cfg.wick_confirm = v.parse()?;
    }
    if let Ok(v) = env::var("RANGE_SPIKE") {
        cfg.range_spike = v.parse()?;
    }
    if let Ok(v) = env::var("BIAS_UPPER") {
        cfg.bias_upper = v.parse()?;
    }
    if let Ok(v) = env::var("BIAS_LOWER") {
        cfg.bias_lower = v.parse()?;
    }
    if let Ok(v) = env::var("HYSTERESIS_RUNS") {
        cfg.hysteresis_runs = v.parse()?;
    }
    if let Ok(v) = env::var("DELTA_CONFIDENCE") {
        cfg.delta_confidence = v.parse()?;
    }
    if let Ok(v) = env::var("DELTA_HEALTH") {
        cfg.delta_health = v.parse()?;
    }
    if let Ok(v) = env::var("DELTA_BIAS") {
        cfg.delta_bias = v.parse()?;
    }

    Ok(cfg)
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// OHLCV candle, one daily bar
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candle {
    pub open_time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// 3-point directional classification of closing prices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Trend {
    Up,
    Down,
    Range,
}

/// Coarse market mode, derived 1:1 from trend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Regime {
    BullMode,
    BearMode,
    ChopMode,
}

impl Regime {
    pub fn from_trend(trend: Trend) -> Self {
        match trend {
            Trend::Up => Regime::BullMode,
            Trend::Down => Regime::BearMode,
            Trend::Range => Regime::ChopMode,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Regime::BullMode => "BULL_MODE",
            Regime::BearMode => "BEAR_MODE",
            Regime::ChopMode => "CHOP_MODE",
        }
    }
}

/// Discrete market state label emitted by the classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarketState {
    CapitulationRisk,
    AbsorptionDetected,
    GlitchWindowActive,
    LagWindowActive,
    DeepFear,
    LiquidityTrap,
    StartConfirmed,
    PreStart,
    Euphoria,
    Neutral,
}

impl MarketState {
    /// Get human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            MarketState::CapitulationRisk => "CAPITULATION_RISK",
            MarketState::AbsorptionDetected => "ABSORPTION_DETECTED",
            MarketState::GlitchWindowActive => "GLITCH_WINDOW_ACTIVE",
            MarketState::LagWindowActive => "LAG_WINDOW_ACTIVE",
            MarketState::DeepFear => "DEEP_FEAR",
            MarketState::LiquidityTrap => "LIQUIDITY_TRAP",
            MarketState::StartConfirmed => "START_CONFIRMED",
            MarketState::PreStart => "PRE_START",
            MarketState::Euphoria => "EUPHORIA",
            MarketState::Neutral => "NEUTRAL",
        }
    }

    /// Get recommended action for this state
    pub fn action(&self) -> &'static str {
        match self {
            MarketState::CapitulationRisk => "Do not catch the knife. Wait for absorption.",
            MarketState::AbsorptionDetected => "Best R/R zone. Controlled adds.",
            MarketState::GlitchWindowActive => "Distrust short-term moves. No chasing.",
            MarketState::LagWindowActive => "Sentiment lags price. Size down.",
            MarketState::DeepFear => "Accumulate slowly. x2 max.",
            MarketState::LiquidityTrap => "DO NOTHING. Expect pullback.",
            MarketState::StartConfirmed => "Hold/add on pullbacks. x3 allowed.",
            MarketState::PreStart => "Accumulate. No aggression.",
            MarketState::Euphoria => "Scale out. Protect capital.",
            MarketState::Neutral => "Stand by.",
        }
    }
}

/// Smoothed directional lean for one bias track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Bias {
    Bullish,
    Bearish,
    Neutral,
}

impl Bias {
    pub fn name(&self) -> &'static str {
        match self {
            Bias::Bullish => "BULLISH",
            Bias::Bearish => "BEARISH",
            Bias::Neutral => "NEUTRAL",
        }
    }
}

/// Direction of an open glitch watch window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GlitchDirection {
    BearGlitch,
    BullGlitch,
}

impl GlitchDirection {
    pub fn name(&self) -> &'static str {
        match self {
            GlitchDirection::BearGlitch => "BEAR_GLITCH",
            GlitchDirection::BullGlitch => "BULL_GLITCH",
        }
    }
}

/// Shape metrics of the most recent candle
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CandleShape {
    /// (range - |body|) / range, 0.0 for an all-body candle
    pub wick_ratio: f64,
    pub is_green: bool,
    pub is_red: bool,
}

/// Derived features, recomputed every invocation from the candle history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSet {
    pub trend: Trend,
    pub regime: Regime,
    /// Last bar volume / mean volume of the prior 20 bars
    pub volume_ratio: f64,
    /// Percent change of close over the last 5 bars
    pub change_5d: f64,
    pub last_candle: CandleShape,
    /// Last bar high-low range / mean range of the prior 20 bars
    pub range_multiplier: f64,
}

impl Default for FeatureSet {
    /// Neutral fallback used whenever the candle history is too short
    fn default() -> Self {
        Self {
            trend: Trend::Range,
            regime: Regime::ChopMode,
            volume_ratio: 1.0,
            change_5d: 0.0,
            last_candle: CandleShape::default(),
            range_multiplier: 1.0,
        }
    }
}

/// Hysteresis state for one bias track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiasTrack {
    pub confirmed: Bias,
    #[serde(default)]
    pub pending: Option<Bias>,
    #[serde(default)]
    pub pending_count: u32,
}

impl Default for BiasTrack {
    fn default() -> Self {
        Self {
            confirmed: Bias::Neutral,
            pending: None,
            pending_count: 0,
        }
    }
}

/// The only entity with lifetime longer than one invocation.
/// Read at the start of a run, mutated once, persisted whole at the end.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetaState {
    #[serde(default)]
    pub glitch_start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub glitch_direction: Option<GlitchDirection>,
    #[serde(default)]
    pub glitch_confirmed: bool,
    /// Sticky flag bridging capitulation detection to later absorption
    /// detection; set on a capitulation cycle, cleared only by absorption.
    #[serde(default)]
    pub capitulation_recent: bool,
    #[serde(default)]
    pub asset_bias: BiasTrack,
    #[serde(default)]
    pub market_bias: BiasTrack,
}

/// Full computed output of the most recent invocation. Overwritten every run
/// and used only as the comparison baseline for the alert decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub state: MarketState,
    pub regime: Regime,
    pub trend: Trend,
    pub confidence: f64,
    pub health: f64,
    pub asset_bias: Bias,
    pub asset_bias_score: f64,
    pub market_bias: Bias,
    pub market_bias_score: f64,
    pub glitch_open: bool,
    pub glitch_confirmed: bool,
    #[serde(default)]
    pub glitch_direction: Option<GlitchDirection>,
    pub volume_ratio: f64,
    pub change_5d: f64,
    pub fear: u32,
    pub funding: f64,
    /// UTC date (YYYY-MM-DD) of the last sent notification
    #[serde(default)]
    pub heartbeat_day: Option<String>,
    pub observed_at: DateTime<Utc>,
}

/// The last emitted label alone, persisted separately for external readers
/// that only care about the state name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateRecord {
    pub state: MarketState,
}

/// Global-market snapshot. Absent values stay absent; zero is a meaningful
/// reading for both fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalSnapshot {
    pub market_cap_change_24h: Option<f64>,
    pub btc_dominance: Option<f64>,
}

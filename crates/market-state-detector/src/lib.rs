pub mod alert;
pub mod bias;
pub mod classifier;
pub mod features;
pub mod glitch;
pub mod scores;

use chrono::{DateTime, Utc};
use radar_core::{Candle, DetectorConfig, FeatureSet, GlobalSnapshot, MetaState, Snapshot};
use serde::{Deserialize, Serialize};

pub use alert::{decide, next_heartbeat_day, AlertOutcome};
pub use glitch::RiskFlags;

/// Raw inputs for one detection cycle, as fetched from the providers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorInputs {
    /// Daily candles, chronological, oldest first
    pub candles: Vec<Candle>,
    /// Signed funding-rate fraction, 0.0 when unavailable
    pub funding: f64,
    /// Fear & greed index in [0, 100], 50 when unavailable
    pub fear: u32,
    pub global: GlobalSnapshot,
}

/// Full product of one engine run: the snapshot to persist and compare,
/// plus the intermediate flags the renderer and tests inspect.
#[derive(Debug, Clone)]
pub struct Observation {
    pub snapshot: Snapshot,
    pub features: FeatureSet,
    pub flags: RiskFlags,
    pub absorption: bool,
}

/// Market state detection engine.
///
/// One `observe` call runs the fixed pipeline (features, bias, glitch
/// window, classifier, scores) over the inputs and the persisted MetaState.
/// Pure apart from the documented in-place MetaState mutation; no I/O.
pub struct MarketStateDetector {
    config: DetectorConfig,
}

impl MarketStateDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Run one detection cycle at time `now`, mutating `meta` exactly once.
    /// The returned snapshot carries no heartbeat marker yet; the alert
    /// layer stamps it once the notify decision is made.
    pub fn observe(
        &self,
        inputs: &DetectorInputs,
        meta: &mut MetaState,
        now: DateTime<Utc>,
    ) -> Observation {
        let cfg = &self.config;

        let features = features::extract_features(&inputs.candles);

        let asset_score = bias::asset_score(&features, inputs.fear, inputs.funding, cfg);
        let market_score = bias::market_score(&inputs.global);
        bias::apply_hysteresis(
            &mut meta.asset_bias,
            bias::instant_bias(asset_score, cfg),
            cfg.hysteresis_runs,
        );
        bias::apply_hysteresis(
            &mut meta.market_bias,
            bias::instant_bias(market_score, cfg),
            cfg.hysteresis_runs,
        );

        let flags = glitch::evaluate_risk(&features, inputs.fear, inputs.funding, cfg);
        glitch::GlitchWindowMachine::new(cfg).step(meta, &features, &flags, now);

        let outcome =
            classifier::classify(meta, &features, inputs.fear, inputs.funding, &flags, cfg);

        let confidence =
            scores::confidence(&features, inputs.fear, inputs.funding, flags.retail_entry, cfg);
        let health = scores::health(
            &features,
            &flags,
            outcome.absorption,
            meta.glitch_confirmed,
            meta.glitch_direction,
            inputs.funding,
            cfg,
        );

        let snapshot = Snapshot {
            state: outcome.state,
            regime: features.regime,
            trend: features.trend,
            confidence,
            health,
            asset_bias: meta.asset_bias.confirmed,
            asset_bias_score: asset_score,
            market_bias: meta.market_bias.confirmed,
            market_bias_score: market_score,
            glitch_open: meta.glitch_start_time.is_some(),
            glitch_confirmed: meta.glitch_confirmed,
            glitch_direction: meta.glitch_direction,
            volume_ratio: features.volume_ratio,
            change_5d: features.change_5d,
            fear: inputs.fear,
            funding: inputs.funding,
            heartbeat_day: None,
            observed_at: now,
        };

        Observation {
            snapshot,
            features,
            flags,
            absorption: outcome.absorption,
        }
    }
}

#[cfg(test)]
pub(crate) mod testutil {
    use chrono::{Duration, TimeZone, Utc};
    use radar_core::Candle;

    /// One synthetic daily candle with a 2-point range around the close.
    pub fn candle(i: i64, close: f64, volume: f64) -> Candle {
        Candle {
            open_time: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::days(i),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume,
        }
    }

    pub fn flat_candles(count: usize, close: f64, volume: f64) -> Vec<Candle> {
        (0..count as i64).map(|i| candle(i, close, volume)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::flat_candles;
    use chrono::{Duration, TimeZone};
    use radar_core::{Bias, GlitchDirection, MarketState, Regime, Trend};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
    }

    fn capitulation_inputs() -> DetectorInputs {
        // Deep fear, spiking volume, 5-day slide: the capitulation scenario
        let mut candles = flat_candles(30, 100.0, 1000.0);
        for (i, c) in candles.iter_mut().enumerate() {
            c.close = 130.0 - i as f64;
            c.open = c.close + 0.5;
            c.high = c.close + 1.0;
            c.low = c.close - 1.0;
        }
        let last = candles.last_mut().unwrap();
        last.volume = 2500.0;
        last.close = 96.0;
        last.low = 95.0;

        DetectorInputs {
            candles,
            funding: 0.0,
            fear: 20,
            global: GlobalSnapshot::default(),
        }
    }

    fn calm_inputs() -> DetectorInputs {
        DetectorInputs {
            candles: flat_candles(30, 100.0, 1000.0),
            funding: 0.01,
            fear: 35,
            global: GlobalSnapshot::default(),
        }
    }

    #[test]
    fn test_capitulation_cycle_opens_bear_watch() {
        let detector = MarketStateDetector::new(DetectorConfig::default());
        let mut meta = MetaState::default();

        let observation = detector.observe(&capitulation_inputs(), &mut meta, t0());

        assert_eq!(observation.snapshot.state, MarketState::CapitulationRisk);
        assert!(observation.flags.capitulation_risk);
        assert!(meta.capitulation_recent);
        assert_eq!(meta.glitch_start_time, Some(t0()));
        assert_eq!(meta.glitch_direction, Some(GlitchDirection::BearGlitch));
        assert!(observation.snapshot.glitch_open);
    }

    #[test]
    fn test_absorption_follows_capitulation() {
        let detector = MarketStateDetector::new(DetectorConfig::default());
        let mut meta = MetaState::default();

        detector.observe(&capitulation_inputs(), &mut meta, t0());
        let observation =
            detector.observe(&calm_inputs(), &mut meta, t0() + Duration::days(1));

        assert_eq!(observation.snapshot.state, MarketState::AbsorptionDetected);
        assert!(observation.absorption);
        assert!(!meta.capitulation_recent);
        // Absorption force-closes the watch regardless of elapsed time
        assert_eq!(meta.glitch_start_time, None);
        assert!(!observation.snapshot.glitch_open);
    }

    #[test]
    fn test_empty_history_still_classifies() {
        let detector = MarketStateDetector::new(DetectorConfig::default());
        let mut meta = MetaState::default();

        let inputs = DetectorInputs {
            candles: Vec::new(),
            funding: 0.0,
            fear: 50,
            global: GlobalSnapshot::default(),
        };
        let observation = detector.observe(&inputs, &mut meta, t0());

        assert_eq!(observation.snapshot.regime, Regime::ChopMode);
        assert_eq!(observation.snapshot.trend, Trend::Range);
        assert_eq!(observation.snapshot.volume_ratio, 1.0);
    }

    #[test]
    fn test_bias_tracks_survive_across_cycles() {
        let detector = MarketStateDetector::new(DetectorConfig::default());
        let mut meta = MetaState::default();

        // Two consecutive strongly bearish cycles flip the confirmed bias
        let inputs = capitulation_inputs();
        detector.observe(&inputs, &mut meta, t0());
        assert_eq!(meta.asset_bias.confirmed, Bias::Neutral);
        assert_eq!(meta.asset_bias.pending, Some(Bias::Bearish));

        detector.observe(&inputs, &mut meta, t0() + Duration::days(1));
        assert_eq!(meta.asset_bias.confirmed, Bias::Bearish);
    }
}

use radar_core::{Bias, BiasTrack, DetectorConfig, FeatureSet, GlobalSnapshot, Trend};

// Scorer weights. These are heuristic contributions around a 50 midpoint;
// the bands the engine exposes as configuration live in DetectorConfig.
const TREND_WEIGHT: f64 = 15.0;
const FEAR_BAND_WEIGHT: f64 = 10.0;
const FUNDING_NEGATIVE_PENALTY: f64 = 10.0;
const FUNDING_CROWDED_BONUS: f64 = 5.0;
const VOLUME_AMPLIFIER: f64 = 10.0;
const CHANGE_WEIGHT: f64 = 10.0;
const CHANGE_BAND: f64 = 3.0;

const MCAP_STRONG_BAND: f64 = 2.0;
const MCAP_STRONG_WEIGHT: f64 = 15.0;
const MCAP_SOFT_BAND: f64 = 0.5;
const MCAP_SOFT_WEIGHT: f64 = 5.0;
const DOMINANCE_HIGH: f64 = 55.0;
const DOMINANCE_LOW: f64 = 45.0;
const DOMINANCE_WEIGHT: f64 = 10.0;

/// Asset-specific 0-100 bias score from trend, sentiment, funding, volume
/// and the 5-day change.
pub fn asset_score(features: &FeatureSet, fear: u32, funding: f64, cfg: &DetectorConfig) -> f64 {
    let mut score: f64 = 50.0;

    match features.trend {
        Trend::Up => score += TREND_WEIGHT,
        Trend::Down => score -= TREND_WEIGHT,
        Trend::Range => {}
    }

    if fear >= cfg.fear_euphoria {
        score += FEAR_BAND_WEIGHT;
    } else if fear < cfg.fear_deep {
        score -= FEAR_BAND_WEIGHT;
    }

    if funding < 0.0 {
        score -= FUNDING_NEGATIVE_PENALTY;
    } else if funding >= cfg.funding_retail {
        score += FUNDING_CROWDED_BONUS;
    }

    // Elevated volume amplifies whichever way price is already leaning
    if features.volume_ratio >= cfg.volume_start {
        match features.trend {
            Trend::Up => score += VOLUME_AMPLIFIER,
            Trend::Down => score -= VOLUME_AMPLIFIER,
            Trend::Range => {}
        }
    }

    if features.change_5d > CHANGE_BAND {
        score += CHANGE_WEIGHT;
    } else if features.change_5d < -CHANGE_BAND {
        score -= CHANGE_WEIGHT;
    }

    score.clamp(0.0, 100.0)
}

/// Broad-market 0-100 bias score from the global snapshot. Absent inputs
/// contribute nothing, since unknown is not zero.
pub fn market_score(global: &GlobalSnapshot) -> f64 {
    let mut score: f64 = 50.0;

    if let Some(change) = global.market_cap_change_24h {
        if change >= MCAP_STRONG_BAND {
            score += MCAP_STRONG_WEIGHT;
        } else if change >= MCAP_SOFT_BAND {
            score += MCAP_SOFT_WEIGHT;
        } else if change <= -MCAP_STRONG_BAND {
            score -= MCAP_STRONG_WEIGHT;
        } else if change <= -MCAP_SOFT_BAND {
            score -= MCAP_SOFT_WEIGHT;
        }
    }

    if let Some(dominance) = global.btc_dominance {
        if dominance >= DOMINANCE_HIGH {
            score += DOMINANCE_WEIGHT;
        } else if dominance <= DOMINANCE_LOW {
            score -= DOMINANCE_WEIGHT;
        }
    }

    score.clamp(0.0, 100.0)
}

/// Raw instant category by simple thresholding.
pub fn instant_bias(score: f64, cfg: &DetectorConfig) -> Bias {
    if score >= cfg.bias_upper {
        Bias::Bullish
    } else if score <= cfg.bias_lower {
        Bias::Bearish
    } else {
        Bias::Neutral
    }
}

/// Advance one bias track by one cycle of hysteresis.
///
/// The confirmed category flips only after the instant category has proposed
/// the same new target for `runs` consecutive cycles. A different new target
/// restarts the count at 1; instant matching the confirmed category clears
/// any pending transition.
pub fn apply_hysteresis(track: &mut BiasTrack, instant: Bias, runs: u32) {
    if instant == track.confirmed {
        track.pending = None;
        track.pending_count = 0;
        return;
    }

    if track.pending == Some(instant) {
        track.pending_count += 1;
    } else {
        track.pending = Some(instant);
        track.pending_count = 1;
    }

    if track.pending_count >= runs {
        track.confirmed = instant;
        track.pending = None;
        track.pending_count = 0;
    }
}

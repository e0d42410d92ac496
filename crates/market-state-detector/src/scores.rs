use radar_core::{DetectorConfig, FeatureSet, GlitchDirection, Regime, Trend};

use crate::glitch::RiskFlags;

/// Confidence score in [0, 100].
///
/// Pure function of the cycle's features and the retail-entry flag; glitch,
/// absorption and regime do not influence it.
pub fn confidence(
    features: &FeatureSet,
    fear: u32,
    funding: f64,
    retail_entry: bool,
    cfg: &DetectorConfig,
) -> f64 {
    let mut score: f64 = 0.0;

    match features.trend {
        Trend::Up => score += 25.0,
        Trend::Range => score += 10.0,
        Trend::Down => {}
    }

    if fear >= cfg.fear_deep && fear <= cfg.fear_healthy_max {
        score += 20.0;
    } else {
        score += 5.0;
    }

    if features.volume_ratio > cfg.volume_start {
        score += 20.0;
    } else if features.volume_ratio > cfg.volume_prestart {
        score += 10.0;
    }

    if funding < cfg.funding_retail {
        score += 20.0;
    } else if funding < cfg.funding_euphoria {
        score += 10.0;
    }

    if retail_entry {
        score -= 25.0;
    }

    score.clamp(0.0, 100.0)
}

/// Health score in [0, 100].
///
/// Confidence plus structural risk: capitulation and a confirmed glitch pull
/// it down (a bear glitch harder than a bull one, which only means missed
/// upside), absorption and negative funding push it up, and the regime adds
/// a small adjustment.
pub fn health(
    features: &FeatureSet,
    flags: &RiskFlags,
    absorption: bool,
    glitch_confirmed: bool,
    glitch_direction: Option<GlitchDirection>,
    funding: f64,
    cfg: &DetectorConfig,
) -> f64 {
    let mut score: f64 = 50.0;

    if flags.capitulation_risk {
        score -= 25.0;
    }

    if glitch_confirmed {
        score -= match glitch_direction {
            Some(GlitchDirection::BullGlitch) => 10.0,
            _ => 20.0,
        };
    }

    if absorption {
        score += 20.0;
    }

    if funding < 0.0 {
        score += 10.0;
    } else if funding < cfg.funding_retail {
        score += 5.0;
    }

    if features.regime == Regime::BearMode && !absorption {
        score -= 10.0;
    }
    if features.regime == Regime::BullMode && !flags.retail_entry {
        score += 10.0;
    }

    score.clamp(0.0, 100.0)
}

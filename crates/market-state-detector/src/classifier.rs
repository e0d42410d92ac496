use radar_core::{DetectorConfig, FeatureSet, MarketState, MetaState, Trend};
use tracing::info;

use crate::glitch::{self, RiskFlags};

/// Result of one classification pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifierOutcome {
    pub state: MarketState,
    /// Absorption fired this cycle (sticky capitulation flag was consumed)
    pub absorption: bool,
}

/// Reduce the cycle's features and flags to one label.
///
/// Strictly priority-ordered, first match wins. Risk-of-loss states pre-empt
/// opportunity states: a false "accumulate" during a risk regime costs more
/// than a missed entry.
///
/// Mutates `meta`: sets the sticky capitulation flag on a capitulation
/// cycle, and on absorption clears it and force-closes the glitch watch.
pub fn classify(
    meta: &mut MetaState,
    features: &FeatureSet,
    fear: u32,
    funding: f64,
    flags: &RiskFlags,
    cfg: &DetectorConfig,
) -> ClassifierOutcome {
    // The sticky flag read here is last cycle's value; this cycle's
    // capitulation only becomes visible to absorption on the next run.
    let prior_capitulation = meta.capitulation_recent;

    if flags.capitulation_risk {
        meta.capitulation_recent = true;
        return ClassifierOutcome {
            state: MarketState::CapitulationRisk,
            absorption: false,
        };
    }

    let absorption = prior_capitulation
        && features.volume_ratio <= cfg.volume_normal
        && funding < cfg.funding_retail
        && matches!(features.trend, Trend::Range | Trend::Up);

    if absorption {
        meta.capitulation_recent = false;
        glitch::force_close(meta);
        info!("absorption detected, capitulation flag cleared and glitch watch closed");
        return ClassifierOutcome {
            state: MarketState::AbsorptionDetected,
            absorption: true,
        };
    }

    let state = if meta.glitch_start_time.is_some() && meta.glitch_confirmed {
        MarketState::GlitchWindowActive
    } else if flags.bear_lag || flags.bull_lag {
        MarketState::LagWindowActive
    } else if fear < cfg.fear_deep && funding <= 0.0 {
        MarketState::DeepFear
    } else if flags.retail_entry {
        MarketState::LiquidityTrap
    } else if features.trend == Trend::Up
        && features.volume_ratio > cfg.volume_start
        && funding < cfg.funding_retail
    {
        MarketState::StartConfirmed
    } else if features.trend == Trend::Up && features.volume_ratio > cfg.volume_prestart {
        MarketState::PreStart
    } else if fear > cfg.fear_euphoria && funding >= cfg.funding_euphoria {
        MarketState::Euphoria
    } else {
        MarketState::Neutral
    };

    ClassifierOutcome {
        state,
        absorption: false,
    }
}

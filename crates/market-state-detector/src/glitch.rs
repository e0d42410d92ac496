use chrono::{DateTime, Duration, Utc};
use radar_core::{DetectorConfig, FeatureSet, GlitchDirection, MetaState, Regime, Trend};
use tracing::{debug, info};

/// High-risk conditions recomputed fresh every cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RiskFlags {
    pub capitulation_risk: bool,
    pub bear_lag: bool,
    pub bull_lag: bool,
    pub retail_entry: bool,
}

impl RiskFlags {
    pub fn any(&self) -> bool {
        self.capitulation_risk || self.bear_lag || self.bull_lag || self.retail_entry
    }
}

/// Evaluate the four independent watch-trigger conditions for this cycle.
pub fn evaluate_risk(
    features: &FeatureSet,
    fear: u32,
    funding: f64,
    cfg: &DetectorConfig,
) -> RiskFlags {
    let down_or_range = matches!(features.trend, Trend::Down | Trend::Range);

    let capitulation_risk = fear < cfg.fear_deep
        && features.volume_ratio > cfg.volume_capitulation
        && down_or_range
        && features.change_5d < cfg.capitulation_change_max;

    // Capitulation pre-empts bear-lag; the milder condition only fires alone
    let bear_lag = !capitulation_risk
        && fear < cfg.fear_deep
        && funding <= cfg.funding_lag_max
        && down_or_range;

    let bull_lag = features.regime == Regime::BullMode
        && funding < cfg.funding_retail
        && fear < cfg.fear_euphoria
        && features.change_5d < cfg.bull_lag_change_max;

    let retail_entry =
        funding >= cfg.funding_retail && features.volume_ratio >= cfg.volume_retail;

    RiskFlags {
        capitulation_risk,
        bear_lag,
        bull_lag,
        retail_entry,
    }
}

/// Two-layer glitch window machine persisted in MetaState.
///
/// The watch layer is time-boxed: it opens on any risk condition when no
/// watch is open and expires on its own once the window elapses. The confirm
/// layer is re-derived every cycle from the current candle shape and regime.
pub struct GlitchWindowMachine<'a> {
    cfg: &'a DetectorConfig,
}

impl<'a> GlitchWindowMachine<'a> {
    pub fn new(cfg: &'a DetectorConfig) -> Self {
        Self { cfg }
    }

    /// Whether a watch opened at `start` is still open at query time `t`.
    /// The window covers [start, start + window] inclusive of the boundary.
    pub fn watch_open(&self, start: DateTime<Utc>, t: DateTime<Utc>) -> bool {
        t - start <= Duration::days(self.cfg.glitch_window_days)
    }

    /// Advance the machine by one cycle: expire, maybe open, re-confirm.
    pub fn step(
        &self,
        meta: &mut MetaState,
        features: &FeatureSet,
        flags: &RiskFlags,
        now: DateTime<Utc>,
    ) {
        if let Some(start) = meta.glitch_start_time {
            if !self.watch_open(start, now) {
                debug!("glitch watch opened at {} expired", start);
                force_close(meta);
            }
        }

        if meta.glitch_start_time.is_none() && flags.any() {
            let direction = if features.regime == Regime::BearMode
                || flags.bear_lag
                || flags.capitulation_risk
            {
                GlitchDirection::BearGlitch
            } else if features.regime == Regime::BullMode {
                GlitchDirection::BullGlitch
            } else {
                GlitchDirection::BearGlitch
            };

            meta.glitch_start_time = Some(now);
            meta.glitch_direction = Some(direction);
            info!("glitch watch opened, direction {}", direction.name());
        }

        // Confirmation is never sticky: with no open watch it is forced
        // false, otherwise it reflects only this cycle's candle evidence.
        meta.glitch_confirmed = match (meta.glitch_start_time, meta.glitch_direction) {
            (Some(_), Some(direction)) => self.confirm(direction, features),
            _ => false,
        };
    }

    fn confirm(&self, direction: GlitchDirection, features: &FeatureSet) -> bool {
        if features.range_multiplier >= self.cfg.range_spike {
            return true;
        }

        let shape = features.last_candle;
        match direction {
            GlitchDirection::BearGlitch => {
                matches!(features.regime, Regime::BearMode | Regime::ChopMode)
                    && shape.is_green
                    && shape.wick_ratio >= self.cfg.wick_confirm
            }
            GlitchDirection::BullGlitch => {
                features.regime == Regime::BullMode
                    && shape.is_red
                    && shape.wick_ratio >= self.cfg.wick_confirm
            }
        }
    }
}

/// Close the watch immediately, clearing start time, direction and
/// confirmation. Used on expiry and on absorption detection.
pub fn force_close(meta: &mut MetaState) {
    meta.glitch_start_time = None;
    meta.glitch_direction = None;
    meta.glitch_confirmed = false;
}

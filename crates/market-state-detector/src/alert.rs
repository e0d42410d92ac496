use chrono::{DateTime, Utc};
use radar_core::{DetectorConfig, Snapshot};

/// Outcome of the alert decision with the reasons that fired.
#[derive(Debug, Clone, Default)]
pub struct AlertOutcome {
    pub notify: bool,
    pub reasons: Vec<&'static str>,
}

/// Decide whether the new observation warrants a notification, independent
/// of whether the label itself changed.
pub fn decide(
    current: &Snapshot,
    previous: Option<&Snapshot>,
    now: DateTime<Utc>,
    cfg: &DetectorConfig,
) -> AlertOutcome {
    let prev = match previous {
        Some(p) => p,
        None => {
            return AlertOutcome {
                notify: true,
                reasons: vec!["first run"],
            }
        }
    };

    let mut reasons = Vec::new();

    if current.state != prev.state {
        reasons.push("state changed");
    }
    if current.regime != prev.regime {
        reasons.push("regime changed");
    }
    if current.glitch_confirmed != prev.glitch_confirmed {
        reasons.push("glitch confirmation changed");
    }
    if (current.confidence - prev.confidence).abs() >= cfg.delta_confidence {
        reasons.push("confidence moved");
    }
    if (current.health - prev.health).abs() >= cfg.delta_health {
        reasons.push("health moved");
    }
    if (current.asset_bias_score - prev.asset_bias_score).abs() >= cfg.delta_bias {
        reasons.push("asset bias moved");
    }
    if (current.market_bias_score - prev.market_bias_score).abs() >= cfg.delta_bias {
        reasons.push("market bias moved");
    }
    let today = utc_day(now);
    if prev.heartbeat_day.as_deref() != Some(today.as_str()) {
        reasons.push("daily heartbeat");
    }

    AlertOutcome {
        notify: !reasons.is_empty(),
        reasons,
    }
}

/// Heartbeat marker for the snapshot about to be persisted: today when a
/// notification fired, otherwise the previous marker carried over.
pub fn next_heartbeat_day(
    previous: Option<&Snapshot>,
    notified: bool,
    now: DateTime<Utc>,
) -> Option<String> {
    if notified {
        Some(utc_day(now))
    } else {
        previous.and_then(|p| p.heartbeat_day.clone())
    }
}

fn utc_day(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%d").to_string()
}

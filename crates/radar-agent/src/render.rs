use radar_core::Snapshot;

/// Build the outbound state-update message. Pure formatting; every number
/// in here was decided by the engine before this point.
pub fn state_update(snapshot: &Snapshot, reasons: &[&'static str]) -> String {
    let glitch_line = if snapshot.glitch_open {
        let direction = snapshot
            .glitch_direction
            .map(|d| d.name())
            .unwrap_or("UNKNOWN");
        if snapshot.glitch_confirmed {
            format!("open ({}, confirmed)", direction)
        } else {
            format!("open ({}, unconfirmed)", direction)
        }
    } else {
        "closed".to_string()
    };

    format!(
        "\u{1F4E1} MARKET STATE UPDATE\n\n\
         State: {}\n\
         Action: {}\n\
         Regime: {}\n\
         Confidence: {:.0}/100\n\
         Health: {:.0}/100\n\
         Asset bias: {} ({:.0})\n\
         Market bias: {} ({:.0})\n\
         Glitch window: {}\n\n\
         Fear & Greed: {}\n\
         Funding: {:.4}\n\
         Volume ratio: {:.2}\n\
         5d change: {:+.2}%\n\n\
         Why: {}\n\
         Time: {} UTC",
        snapshot.state.name(),
        snapshot.state.action(),
        snapshot.regime.name(),
        snapshot.confidence,
        snapshot.health,
        snapshot.asset_bias.name(),
        snapshot.asset_bias_score,
        snapshot.market_bias.name(),
        snapshot.market_bias_score,
        glitch_line,
        snapshot.fear,
        snapshot.funding,
        snapshot.volume_ratio,
        snapshot.change_5d,
        reasons.join(", "),
        snapshot.observed_at.format("%Y-%m-%d %H:%M"),
    )
}

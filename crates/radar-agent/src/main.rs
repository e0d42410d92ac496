use anyhow::Result;
use chrono::Utc;
use market_data_client::MarketDataClient;
use market_state_detector::{alert, DetectorInputs, MarketStateDetector};
use radar_core::{MetaState, Snapshot, StateRecord};
use state_store::{StateStore, META_KEY, SNAPSHOT_KEY, STATE_KEY};

mod config;
mod render;
mod telegram;

use config::AgentConfig;
use telegram::TelegramNotifier;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load .env, init tracing
    dotenvy::dotenv().ok();

    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();
    }

    tracing::info!("Starting Market Radar");

    // 2. Configuration
    let config = AgentConfig::from_env()?;
    tracing::info!("  Symbol: {}", config.symbol);
    tracing::info!("  Candle history: {} bars", config.candle_limit);
    tracing::info!(
        "  Telegram: {}",
        if config.telegram_bot_token.is_some() && config.telegram_chat_id.is_some() {
            "configured"
        } else {
            "disabled"
        }
    );

    // 3. Persisted state store, the only collaborator allowed to fail the run
    let store = StateStore::connect(&config.database_url).await?;
    tracing::info!("State store ready ({})", config.database_url);

    // 4. Fetch inputs; every provider degrades to its neutral fallback
    let client = MarketDataClient::new();
    let candles = client.daily_candles(&config.symbol, config.candle_limit).await;
    let funding = client.funding_rate(&config.symbol).await;
    let fear = client.fear_greed().await;
    let global = client.global_snapshot().await;
    tracing::info!(
        "Inputs: {} candles, funding {:.4}, fear {}, mcap 24h {:?}, dominance {:?}",
        candles.len(),
        funding,
        fear,
        global.market_cap_change_24h,
        global.btc_dominance
    );

    // 5. Load persisted state (corrupt blobs reset to defaults inside the store)
    let mut meta = store
        .load_json::<MetaState>(META_KEY)
        .await?
        .unwrap_or_default();
    let previous: Option<Snapshot> = store.load_json(SNAPSHOT_KEY).await?;

    // 6. Run the engine
    let now = Utc::now();
    let detector = MarketStateDetector::new(config.detector.clone());
    let inputs = DetectorInputs {
        candles,
        funding,
        fear,
        global,
    };
    let observation = detector.observe(&inputs, &mut meta, now);

    // 7. Alert decision against the previous snapshot
    let outcome = alert::decide(
        &observation.snapshot,
        previous.as_ref(),
        now,
        detector.config(),
    );
    tracing::info!(
        "State {} ({}), confidence {:.0}, health {:.0}, notify: {}",
        observation.snapshot.state.name(),
        observation.snapshot.regime.name(),
        observation.snapshot.confidence,
        observation.snapshot.health,
        outcome.notify
    );

    let mut snapshot = observation.snapshot.clone();
    snapshot.heartbeat_day = alert::next_heartbeat_day(previous.as_ref(), outcome.notify, now);

    // 8. Notify; delivery faults are logged and swallowed, never fatal
    if outcome.notify {
        let notifier = TelegramNotifier::new(
            config.telegram_bot_token.clone(),
            config.telegram_chat_id.clone(),
        );
        let message = render::state_update(&snapshot, &outcome.reasons);
        if let Err(e) = notifier.send_message(&message).await {
            tracing::warn!("Notification delivery failed: {}", e);
        }
    }

    // 9. Persist all three blobs regardless of the notify decision
    store.save_json(META_KEY, &meta).await?;
    store.save_json(SNAPSHOT_KEY, &snapshot).await?;
    store
        .save_json(
            STATE_KEY,
            &StateRecord {
                state: snapshot.state,
            },
        )
        .await?;
    tracing::info!("State persisted");

    Ok(())
}

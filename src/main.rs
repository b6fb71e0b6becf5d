//! Fight Core - headless match runner
//!
//! Loads the roster, pretends to load assets in the background, and plays a
//! CPU-versus-CPU match by calling the session once per simulated display
//! refresh. The final match summary is printed as JSON.

use std::time::Duration;

use anyhow::Context;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fight_core::app::AppState;
use fight_core::config::Config;
use fight_core::game::Screen;
use fight_core::host::load_assets;

/// Simulated per-asset load time
const ASSET_LOAD_STEP: Duration = Duration::from_millis(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    init_tracing(&config.log_level);

    let seed = config.match_seed.unwrap_or_else(rand::random);
    info!("Starting Fight Core");
    info!(
        seed,
        speed = ?config.settings.speed,
        difficulty = ?config.settings.difficulty,
        frame_rate = config.frame_rate,
        "Match configuration"
    );

    let state = AppState::new(config).context("Failed to load character roster")?;

    let loader = tokio::spawn(load_assets(state.assets.clone(), ASSET_LOAD_STEP));

    let mut session = state.build_session(seed);
    let frame = Duration::from_secs_f64(1.0 / state.config.frame_rate as f64);
    let mut refresh = interval(frame);
    refresh.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    let mut last_frame = Instant::now();
    loop {
        tokio::select! {
            _ = refresh.tick() => {
                let now = Instant::now();
                let report = session.on_frame(now - last_frame);
                last_frame = now;
                if report.screen == Screen::GameOver {
                    break;
                }
            }
            _ = &mut shutdown => break,
        }
    }

    loader.abort();

    match session.summary() {
        Some(summary) => {
            info!(
                match_id = %summary.match_id,
                winner = ?summary.winner,
                rounds = summary.rounds.len(),
                "Match complete"
            );
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        None => info!("Stopped before the match finished"),
    }

    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Ctrl+C or SIGTERM. A handler that cannot be installed never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, stopping match");
        }
        _ = terminate => {
            info!("Received terminate signal, stopping match");
        }
    }
}

// adhan-notify - prayer-time notification daemon
// Entry point and application setup

use adhan_notify::{app, commands, config};
use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "adhan_notify=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting adhan-notify");

    let state = app::setup(config::data_dir())
        .await
        .context("failed to initialize")?;

    let info = commands::get_app_info(&state);
    tracing::info!(
        "Version {}, persistent notifications: {}",
        info.version,
        info.persistent_notifications
    );

    match commands::get_today(&state) {
        Ok(today) => {
            tracing::info!("Today is {} ({})", today.date, today.hijri_label);
            if let Some(bearing) = today.qibla_bearing {
                tracing::info!("Qibla bearing {:.1} degrees from true north", bearing);
            }
        }
        Err(e) => tracing::warn!("No overview for today: {}", e),
    }

    match state.refresh.reschedule_today().await {
        Ok(report) => tracing::info!("Initial schedule: {:?}", report.armed),
        Err(e) => tracing::error!("Initial scheduling failed: {}", e),
    }

    state
        .refresh
        .start(&state.config.refresh_cron)
        .await
        .context("failed to start refresh tick")?;
    if let Err(e) = state.refresh.watch_settings(state.settings_file.path()) {
        tracing::warn!("Settings changes won't be picked up live: {}", e);
    }

    let refresh = state.refresh.clone();
    let refresh_loop = tokio::spawn(async move {
        if let Err(e) = refresh.run().await {
            tracing::error!("Refresh loop stopped: {}", e);
        }
    });

    for entry in commands::list_scheduled_notifications(&state).await {
        tracing::info!("{} armed for {} ({})", entry.prayer_id, entry.fire_at, entry.sound);
    }

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    tracing::info!("Shutting down");

    refresh_loop.abort();
    state.refresh.shutdown().await?;
    if !state.scheduler.adapter().capabilities().persistent {
        tracing::warn!("Pending in-process notifications will not fire until restart");
    }
    Ok(())
}

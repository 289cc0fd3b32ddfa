//!   traffic-interpolator:   synthetic traffic driver
//!
//!  Feeds generated remote aircraft through the interpolation engine the way
//!  a simulator client does: a network side pushing sparse updates and a
//!  frame loop asking for fresh situations every frame.

mod config;
mod traffic;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, bounded};
use parking_lot::Mutex;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use traffic_interpolator::{
    Callsign, InterpolationEngine, InterpolationHints, InterpolationLogger, InterpolationSetup, RemoteAircraftProvider,
};

use crate::config::Config;
use crate::traffic::{FeedSettings, TrafficFeed, TrafficUpdate, now_ms};

/// Counters of the frame loop since the last report
#[derive(Debug, Default)]
struct FrameStats {
    frames: u64,
    interpolated: u64,
    failed: u64,
    unchanged: u64,
    without_parts: u64,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_args();

    let default_level = if config.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber).ok();
    info!("traffic-interpolator starting...");
    info!("Configuration: {:?}", config);

    let provider = Arc::new(RemoteAircraftProvider::new(
        config.situation_limits(),
        config.parts_limits(),
    ));
    let engine = Arc::new(InterpolationEngine::new(provider));

    let logger = config.log_dir.as_ref().map(|_| {
        let logger = Arc::new(InterpolationLogger::default());
        engine.attach_logger(Arc::clone(&logger));
        logger
    });

    let settings = FeedSettings {
        aircraft: config.aircraft,
        update_interval_ms: config.update_interval_ms,
        jitter_ms: config.jitter_ms,
        reorder_probability: config.reorder_probability,
    };
    let feed = TrafficFeed::new(settings);
    let hints: HashMap<Callsign, InterpolationHints> = feed
        .aircraft()
        .iter()
        .map(|a| (a.callsign().clone(), a.hints()))
        .collect();

    let (update_tx, update_rx): (Sender<TrafficUpdate>, Receiver<TrafficUpdate>) = bounded(1024);
    let stats = Arc::new(Mutex::new(FrameStats::default()));

    let rt = tokio::runtime::Runtime::new()?;

    rt.block_on(async {
        // Ingestion blocks on the channel, keep it off the async workers
        let ingest_handle = {
            let engine = Arc::clone(&engine);
            tokio::task::spawn_blocking(move || process_updates(update_rx, engine))
        };

        let feed_handle = tokio::spawn(traffic::run_feed(
            feed,
            update_tx,
            Duration::from_millis(config.update_interval_ms.max(1)),
        ));

        let frame_handle = {
            let engine = Arc::clone(&engine);
            let stats = Arc::clone(&stats);
            let setup = config.to_setup();
            let frame_interval = config.frame_interval();
            tokio::spawn(async move {
                run_frames(engine, setup, hints, stats, frame_interval).await;
            })
        };

        let report_handle = {
            let engine = Arc::clone(&engine);
            let stats = Arc::clone(&stats);
            let report_interval = Duration::from_secs(config.report_interval_secs.max(1));
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(report_interval);
                interval.tick().await;
                loop {
                    interval.tick().await;
                    report(&engine, &stats);
                }
            })
        };

        // Stale aircraft removal task
        let cleanup_handle = {
            let engine = Arc::clone(&engine);
            let max_age_ms = config.situation_limits().max_age_ms;
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(Duration::from_secs(1));
                loop {
                    interval.tick().await;
                    remove_stale(&engine, now_ms() - max_age_ms);
                }
            })
        };

        match config.duration() {
            Some(duration) => {
                tokio::select! {
                    _ = tokio::time::sleep(duration) => info!("Run time elapsed"),
                    _ = tokio::signal::ctrl_c() => info!("Interrupted"),
                }
            }
            None => {
                info!("Running, Ctrl+C to exit");
                tokio::signal::ctrl_c().await.ok();
            }
        }

        // Cleanup
        feed_handle.abort();
        frame_handle.abort();
        report_handle.abort();
        cleanup_handle.abort();
        // the aborted feed drops its sender, which ends ingestion
        if let Err(e) = ingest_handle.await {
            warn!("Ingestion task failed: {}", e);
        }
    });

    report(&engine, &stats);

    if let (Some(logger), Some(dir)) = (logger, config.log_dir.as_ref()) {
        let files = logger.write_log_files(dir)?;
        info!(
            "Wrote {} situation and {} parts logs to {} and {}",
            logger.situation_log_count(),
            logger.parts_log_count(),
            files.interpolation.display(),
            files.parts.display()
        );
    }

    Ok(())
}

fn process_updates(rx: Receiver<TrafficUpdate>, engine: Arc<InterpolationEngine>) {
    while let Ok(update) = rx.recv() {
        let result = match update {
            TrafficUpdate::Situation(situation) => engine.add_aircraft_situation(situation),
            TrafficUpdate::Parts(callsign, parts) => engine.add_aircraft_parts(&callsign, parts),
        };
        if let Err(e) = result {
            warn!("Rejected update: {}", e);
        }
    }
    debug!("Update channel closed");
}

async fn run_frames(
    engine: Arc<InterpolationEngine>,
    setup: InterpolationSetup,
    hints: HashMap<Callsign, InterpolationHints>,
    stats: Arc<Mutex<FrameStats>>,
    frame_interval: Duration,
) {
    let no_hints = InterpolationHints::default();
    let mut interval = tokio::time::interval(frame_interval);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        interval.tick().await;
        let now = now_ms();
        let mut frame = FrameStats {
            frames: 1,
            ..Default::default()
        };

        for callsign in engine.callsigns() {
            let aircraft_hints = hints.get(&callsign).unwrap_or(&no_hints);
            let (situation, status) = engine.get_interpolated_situation(&callsign, now, &setup, aircraft_hints);
            if !status.did_interpolation_succeed() {
                frame.failed += 1;
                continue;
            }
            frame.interpolated += 1;
            if !status.has_changed_position() {
                frame.unchanged += 1;
            }

            let offset = situation.time_offset_ms().unwrap_or(setup.default_time_offset_ms);
            let (_, parts_status) = engine.get_interpolated_parts(&callsign, now - offset, &setup);
            if !parts_status.is_supporting_parts() {
                frame.without_parts += 1;
            }
        }

        let mut stats = stats.lock();
        stats.frames += frame.frames;
        stats.interpolated += frame.interpolated;
        stats.failed += frame.failed;
        stats.unchanged += frame.unchanged;
        stats.without_parts += frame.without_parts;
    }
}

fn report(engine: &InterpolationEngine, stats: &Mutex<FrameStats>) {
    let stats = std::mem::take(&mut *stats.lock());
    let callsigns = engine.callsigns();
    info!(
        "Aircraft: {} | frames {} | interpolated {} | failed {} | unchanged {} | without parts {}",
        callsigns.len(),
        stats.frames,
        stats.interpolated,
        stats.failed,
        stats.unchanged,
        stats.without_parts
    );

    if let Some(logger) = engine.logger() {
        for callsign in &callsigns {
            if let Some(situation) = logger.last_situation(Some(callsign)) {
                debug!("{}", situation);
            }
        }
    }
}

fn remove_stale(engine: &InterpolationEngine, cutoff_ms: i64) {
    for callsign in engine.callsigns() {
        let stale = engine
            .provider()
            .latest_situation(&callsign)
            .is_none_or(|s| s.timestamp_ms() < cutoff_ms);
        if stale && engine.remove_aircraft(&callsign) {
            info!(callsign = %callsign, "Removed stale aircraft");
        }
    }
}

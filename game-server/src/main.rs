use std::sync::Arc;
use std::time::Duration;

use tokio::signal;
use tracing::{error, info};

use game_persistence::{MemoryStore, PostRepository, ScoreRepository};
use game_server::{
    config::Config,
    create_routes,
    game_service::GameService,
    jobs::{LocalScheduler, MaintenanceJobs},
    platform::LoggingPlatform,
};
use game_types::GameSettings;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    info!("Starting Two Truths One Lie server...");

    let config = Config::new();

    // The hosting platform's store and APIs are capability interfaces; the
    // standalone binary runs against in-memory stand-ins.
    let store = Arc::new(MemoryStore::new());
    let posts = Arc::new(PostRepository::new(store.clone()));
    let scores = Arc::new(ScoreRepository::new(store));
    let platform = Arc::new(LoggingPlatform::new());

    let jobs = Arc::new(MaintenanceJobs::new(
        posts.clone(),
        scores.clone(),
        platform.clone(),
    ));
    let scheduler = Arc::new(LocalScheduler::new(jobs.clone(), platform.clone()));
    let service = Arc::new(GameService::new(posts, scores, platform, scheduler));

    let settings = GameSettings {
        subreddit_name: config.subreddit_name.clone(),
    };
    match service.install(&settings).await {
        Ok(true) => info!("Installed for r/{}", settings.subreddit_name),
        Ok(false) => info!("Already installed for r/{}", settings.subreddit_name),
        Err(e) => {
            error!("Failed to install game settings: {}", e);
            std::process::exit(1);
        }
    }

    let routes = create_routes(service, config.leaderboard_limit);

    // Periodic maintenance: frequent flair sync plus the weekly rollover at
    // the week boundary.
    let maintenance = jobs.clone();
    let flair_interval = Duration::from_secs(config.flair_sync_minutes * 60);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(flair_interval);
        let mut last_week = game_core::current_week_number();
        loop {
            interval.tick().await;

            let now = chrono::Utc::now();
            let week = game_core::week_number(now);
            if week != last_week {
                if let Err(e) = maintenance.weekly_rollover(now).await {
                    error!("Weekly rollover failed: {}", e);
                    continue;
                }
                last_week = week;
            } else if let Err(e) = maintenance.sync_flair().await {
                error!("Flair sync failed: {}", e);
            }
        }
    });

    info!("Server starting on {}:{}", config.host, config.port);

    let addr = (
        config.host.parse::<std::net::IpAddr>().expect("Invalid HOST"),
        config.port,
    );

    let (addr, server) = warp::serve(routes).bind_with_graceful_shutdown(addr, async {
        // Wait for SIGINT (Ctrl+C) or SIGTERM
        #[cfg(unix)]
        {
            let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt()).unwrap();
            let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate()).unwrap();

            tokio::select! {
                _ = sigint.recv() => {
                    info!("Received SIGINT, shutting down gracefully...");
                }
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down gracefully...");
                }
            }
        }

        #[cfg(not(unix))]
        {
            signal::ctrl_c().await.expect("Failed to listen for ctrl+c");
            info!("Received Ctrl+C, shutting down gracefully...");
        }
    });

    info!(
        "Server started successfully on {}. Press Ctrl+C to stop.",
        addr
    );
    server.await;
    info!("Server shutdown complete.");
}

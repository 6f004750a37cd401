use clap::Parser; // for cli
use log::info;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::time::Duration;

use restaurant_gateway::bookings::Repository;
use restaurant_gateway::config::Args;
use restaurant_gateway::handlers;
use restaurant_gateway::notify::Notifier;
use restaurant_gateway::rate_limit::{Admission, Sweeper};
use restaurant_gateway::state::AppState;

// this is main async function with tokio
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // RUST_LOG overrides the default level
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // parse cli arguments
    let args = Args::parse();
    let policies = args.policy_table()?;

    for policy in policies.iter() {
        info!(
            "Rate limit '{}': {} requests per {}s{}",
            policy.endpoint,
            policy.max_requests,
            policy.window_secs(),
            if policy.skip_successful_requests { " (successful requests not counted)" } else { "" }
        );
    }

    // creating shared state
    let admission = Arc::new(Admission::new(policies));
    let state = Arc::new(AppState::new(
        Arc::clone(&admission),
        Repository::new(args.seats_per_slot),
        Notifier::new(args.notify_webhook.clone()),
    ));

    // spawn the background sweep
    let sweeper = Sweeper::start(Arc::clone(&admission), Duration::from_secs(args.cleanup_interval));

    let app = handlers::router(state);

    let addr = format!("{}:{}", args.bind, args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Restaurant API running on http://{}", addr);
    match &args.notify_webhook {
        Some(url) => info!("Staff notifications go to {}", url),
        None => info!("No notification webhook configured, notifications are logged"),
    }

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.stop().await;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Could not listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}

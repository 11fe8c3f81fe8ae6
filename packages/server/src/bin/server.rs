//! Mood-based pair matching and WebRTC signaling server.
//!
//! Pairs waiting users two at a time by mood and relays offer/answer/ICE
//! between the matched pair. Media never passes through this server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin musubi-server
//! cargo run --bin musubi-server -- --host 0.0.0.0 --port 3000
//! ```

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::Notify;

use musubi_server::{
    infrastructure::{
        registry::WebSocketConnectionRegistry,
        repository::{InMemoryQueueRepository, InMemorySessionRepository},
    },
    scheduler::MatchingScheduler,
    ui::{AppState, Server},
    usecase::{
        DisconnectUseCase, EndCallUseCase, JoinQueueUseCase, LeaveQueueUseCase, RelaySignalUseCase,
        RunMatchingCycleUseCase,
    },
};
use musubi_shared::{logger::setup_logger, time::SystemClock};

#[derive(Parser, Debug)]
#[command(name = "server")]
#[command(about = "Mood-based pair matching and WebRTC signaling server", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,

    /// Periodic matching/eviction interval in seconds
    #[arg(long, default_value = "5")]
    match_interval_secs: u64,

    /// Maximum queue wait before an entry is evicted, in seconds
    #[arg(long, default_value = "300")]
    max_wait_secs: u64,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();

    // Initialize dependencies in order:
    // 1. Repositories
    // 2. Connection registry
    // 3. UseCases (sharing the matching trigger)
    // 4. Matching scheduler
    // 5. AppState + Server

    // 1. Create repositories (in-memory stores)
    let queue_repository = Arc::new(InMemoryQueueRepository::new());
    let session_repository = Arc::new(InMemorySessionRepository::new());

    // 2. Create the connection registry (WebSocket implementation)
    let connection_registry = Arc::new(WebSocketConnectionRegistry::new());

    // 3. Create UseCases
    let clock = Arc::new(SystemClock);
    let match_trigger = Arc::new(Notify::new());
    let join_queue_usecase = Arc::new(JoinQueueUseCase::new(
        queue_repository.clone(),
        clock.clone(),
        match_trigger.clone(),
    ));
    let leave_queue_usecase = Arc::new(LeaveQueueUseCase::new(queue_repository.clone()));
    let relay_signal_usecase = Arc::new(RelaySignalUseCase::new(connection_registry.clone()));
    let end_call_usecase = Arc::new(EndCallUseCase::new(
        session_repository.clone(),
        connection_registry.clone(),
        clock.clone(),
    ));
    let disconnect_usecase = Arc::new(DisconnectUseCase::new(
        queue_repository.clone(),
        session_repository.clone(),
        connection_registry.clone(),
        clock.clone(),
    ));
    let matching_usecase = Arc::new(RunMatchingCycleUseCase::new(
        queue_repository.clone(),
        session_repository.clone(),
        connection_registry.clone(),
        clock,
        (args.max_wait_secs * 1000) as i64,
    ));

    // 4. Spawn the matching scheduler (periodic tick + join-triggered wake-up)
    let scheduler = MatchingScheduler::new(
        matching_usecase,
        match_trigger,
        Duration::from_secs(args.match_interval_secs),
    );
    let scheduler_handle = scheduler.spawn();

    // 5. Create and run the server
    let state = Arc::new(AppState {
        join_queue_usecase,
        leave_queue_usecase,
        relay_signal_usecase,
        end_call_usecase,
        disconnect_usecase,
        connection_registry,
        queue_repository,
        session_repository,
    });
    let server = Server::new(state, scheduler_handle);
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

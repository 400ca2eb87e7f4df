// region:    --- Imports
use crate::clock::SystemClock;
use crate::database::DatabaseManager;
use crate::hub::NotificationHub;
use crate::scheduler::LifecycleScheduler;
use crate::store::PostgresAuctionStore;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};
// endregion: --- Imports

// region:    --- Modules
mod auction;
mod bidding;
mod clock;
mod database;
mod display;
mod handlers;
mod hub;
mod scheduler;
mod store;

// endregion: --- Modules

// region:    --- Main
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // logging 초기화
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .without_time()
        .with_target(false)
        .init();

    // DatabaseManager 생성
    let db_manager = Arc::new(DatabaseManager::new().await);

    // 데이터베이스 초기화
    if let Err(e) = db_manager.initialize_database().await {
        error!("{:<12} --> 데이터베이스 초기화 실패: {:?}", "Main", e);
        return Err(e.into());
    }
    info!("{:<12} --> 데이터베이스 초기화 성공", "Main");

    // 시계, 스토어, 알림 허브 생성 (프로세스 범위 상태)
    let clock: Arc<dyn clock::Clock> = Arc::new(SystemClock);
    let auction_store: Arc<dyn store::AuctionStore> = Arc::new(PostgresAuctionStore::new(
        db_manager.get_pool(),
        Arc::clone(&clock),
    ));
    let notification_hub = Arc::new(NotificationHub::new());

    // 생애주기 스케줄러 시작 (기본 주기 1분)
    let cadence_secs = std::env::var("SCHEDULER_INTERVAL_SECS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(60);
    let lifecycle_scheduler = LifecycleScheduler::new(
        Arc::clone(&auction_store),
        Arc::clone(&notification_hub) as Arc<dyn hub::EventPublisher>,
        Arc::clone(&clock),
        Duration::from_secs(cadence_secs),
    );
    lifecycle_scheduler.start().await;
    info!(
        "{:<12} --> 생애주기 스케줄러 시작: 주기 {}초",
        "Main", cadence_secs
    );

    // 테스트 페이지를 위한 cors 설정
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // 라우터 설정
    let routes_all = Router::new()
        .route(
            "/auctions",
            get(handlers::handle_get_auctions).post(handlers::handle_create_auction),
        )
        .route("/auction/:id", get(handlers::handle_get_auction))
        .route("/auction/:id/bids", get(handlers::handle_get_bids))
        .route("/bid", post(handlers::handle_bid))
        .route("/ws", get(handlers::handle_ws))
        .layer(cors)
        .with_state((auction_store, notification_hub, clock));

    // 리스너 생성
    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = TcpListener::bind(&bind_addr).await?;
    info!(
        "{:<12} --> Web Server: Listening on {}",
        "Main",
        listener.local_addr()?
    );

    // 서버 실행
    if let Err(err) = axum::serve(listener, routes_all.into_make_service()).await {
        error!("{:<12} --> Server error: {}", "Main", err);
    }
    Ok(())
}
// endregion: --- Main

// region:    --- Imports
use crate::auction::model::{Auction, AuctionStatus};
use crate::bidding::commands::{
    handle_create_auction as command_create_auction, handle_place_bid, CreateAuctionCommand,
    PlaceBidCommand,
};
use crate::clock::{self, Clock};
use crate::display;
use crate::hub::{ws, NotificationHub};
use crate::store::{AuctionStore, StoreError};
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

// endregion: --- Imports

/// 핸들러가 공유하는 애플리케이션 상태
pub type AppState = (Arc<dyn AuctionStore>, Arc<NotificationHub>, Arc<dyn Clock>);

// region:    --- Views

/// 화면 표시용 경매 상태 뷰
/// 카운트다운 문자열과 가격 라벨, 기준 시간대(Asia/Karachi) 표기를 포함한다.
#[derive(Debug, Serialize)]
pub struct AuctionStateView {
    #[serde(flatten)]
    pub auction: Auction,
    pub countdown: String,
    pub start_time_pk: String,
    pub end_time_pk: String,
    pub highest_bid_label: Option<String>,
}

/// 경매 레코드를 표시용 뷰로 변환
pub fn to_state_view(auction: Auction, clock: &dyn Clock) -> AuctionStateView {
    let now = clock.now();
    // SCHEDULED는 시작까지, 그 외에는 종료까지 남은 시간
    let target = match auction.status {
        AuctionStatus::Scheduled => auction.start_time,
        _ => auction.end_time,
    };
    let countdown = display::format_countdown(&clock::breakdown(now, target));
    let highest_bid_label = auction
        .highest_bid
        .and_then(|amount| display::format_price(amount).ok());

    AuctionStateView {
        countdown,
        start_time_pk: clock::format_karachi(auction.start_time),
        end_time_pk: clock::format_karachi(auction.end_time),
        highest_bid_label,
        auction,
    }
}

// endregion: --- Views

// region:    --- Command Handlers

/// 입찰 요청 처리
pub async fn handle_bid(
    State((store, hub, clock)): State<AppState>,
    Json(cmd): Json<PlaceBidCommand>,
) -> impl IntoResponse {
    match handle_place_bid(cmd, store.as_ref(), hub.as_ref(), clock.as_ref()).await {
        Ok(auction) => (
            axum::http::StatusCode::OK,
            Json(serde_json::json!({
                "message": "입찰이 성공적으로 처리되었습니다.",
                "current_price": auction.highest_bid,
            })),
        )
            .into_response(),
        Err(e) => (axum::http::StatusCode::BAD_REQUEST, Json(e)).into_response(),
    }
}

/// 경매 등록 요청 처리
pub async fn handle_create_auction(
    State((store, _, _)): State<AppState>,
    Json(cmd): Json<CreateAuctionCommand>,
) -> impl IntoResponse {
    match command_create_auction(cmd, store.as_ref()).await {
        Ok(auction) => (axum::http::StatusCode::CREATED, Json(auction)).into_response(),
        Err(e) => (axum::http::StatusCode::BAD_REQUEST, Json(e)).into_response(),
    }
}

// endregion: --- Command Handlers

// region:    --- Query Handlers

/// 진행 중/예정 경매 목록 조회
pub async fn handle_get_auctions(State((store, _, clock)): State<AppState>) -> impl IntoResponse {
    info!("{:<12} --> 경매 목록 조회", "HandlerQuery");
    match store.list_non_terminal().await {
        Ok(auctions) => {
            let views: Vec<AuctionStateView> = auctions
                .into_iter()
                .map(|a| to_state_view(a, clock.as_ref()))
                .collect();
            Json(views).into_response()
        }
        Err(e) => store_error_response(e),
    }
}

/// 경매 상태 조회
pub async fn handle_get_auction(
    State((store, _, clock)): State<AppState>,
    Path(auction_id): Path<i64>,
) -> impl IntoResponse {
    info!("{:<12} --> 경매 상태 조회 id: {}", "HandlerQuery", auction_id);
    match store.get(auction_id).await {
        Ok(auction) => Json(to_state_view(auction, clock.as_ref())).into_response(),
        Err(e) => store_error_response(e),
    }
}

/// 입찰 이력 조회
pub async fn handle_get_bids(
    State((store, _, _)): State<AppState>,
    Path(auction_id): Path<i64>,
) -> impl IntoResponse {
    info!("{:<12} --> 입찰 이력 조회 id: {}", "HandlerQuery", auction_id);
    match store.list_bids(auction_id).await {
        Ok(bids) => Json(bids).into_response(),
        Err(e) => store_error_response(e),
    }
}

/// WebSocket 연결 수락
pub async fn handle_ws(
    State((_, hub, _)): State<AppState>,
    upgrade: WebSocketUpgrade,
) -> impl IntoResponse {
    ws::handle_ws(upgrade, hub).await
}

/// 스토어 오류를 HTTP 응답으로 변환
fn store_error_response(e: StoreError) -> axum::response::Response {
    match e {
        StoreError::NotFound(id) => (
            axum::http::StatusCode::NOT_FOUND,
            Json(serde_json::json!({
                "error": format!("경매를 찾을 수 없음: {}", id),
                "code": "NOT_FOUND"
            })),
        )
            .into_response(),
        other => (
            axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"error": other.to_string()})),
        )
            .into_response(),
    }
}

// endregion: --- Query Handlers

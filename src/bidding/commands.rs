/// 입찰 관련 커맨드 처리
/// 1. 입찰 (최고가 갱신 + 룸으로 BidPlaced 발행)
/// 2. 경매 등록
// region:    --- Imports
use crate::auction::events::AuctionEvent;
use crate::auction::model::{Auction, AuctionStatus};
use crate::clock::Clock;
use crate::hub::EventPublisher;
use crate::store::AuctionStore;
use serde::{Deserialize, Serialize};
use tracing::info;

// endregion: --- Imports

// region:    --- Commands

/// 입찰 명령
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PlaceBidCommand {
    pub auction_id: i64,
    pub bidder_id: i64,
    pub bid_amount: i64,
}

/// 경매 등록 명령
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CreateAuctionCommand {
    pub vehicle_title: String,
    pub seller: String,
    pub start_time: chrono::DateTime<chrono::Utc>,
    pub end_time: chrono::DateTime<chrono::Utc>,
}

/// 1. 입찰
/// 상태/시간 검증 후 조건부 최고가 갱신을 시도하고, 성공하면 해당 경매
/// 룸의 모든 구독자에게 BidPlaced 이벤트를 발행한다.
pub async fn handle_place_bid(
    cmd: PlaceBidCommand,
    store: &dyn AuctionStore,
    publisher: &dyn EventPublisher,
    clock: &dyn Clock,
) -> Result<Auction, serde_json::Value> {
    info!("{:<12} --> 입찰 요청 처리 시작: {:?}", "Command", cmd);

    let auction = store
        .get(cmd.auction_id)
        .await
        .map_err(|e| serde_json::json!({"error": e.to_string(), "code": "NOT_FOUND"}))?;

    let now = clock.now();

    // 경매 상태 및 시간 검증
    if auction.status == AuctionStatus::Scheduled || now < auction.start_time {
        return Err(serde_json::json!({
            "error": "경매가 아직 시작되지 않았습니다.",
            "code": "NOT_STARTED"
        }));
    }
    if auction.status == AuctionStatus::Ended || now > auction.end_time {
        return Err(serde_json::json!({
            "error": "경매가 이미 종료되었습니다.",
            "code": "ALREADY_ENDED"
        }));
    }
    if cmd.bid_amount <= auction.highest_bid.unwrap_or(0) {
        return Err(serde_json::json!({
            "error": "입찰 금액이 현재 가격보다 낮습니다.",
            "code": "LOW_BID",
            "bid_amount": cmd.bid_amount,
        }));
    }

    // 조건부 갱신. 검증과 쓰기 사이에 끼어든 입찰이나 종료 전이는
    // 여기서 false로 드러난다.
    let accepted = store
        .record_bid(cmd.auction_id, cmd.bidder_id, cmd.bid_amount, now)
        .await
        .map_err(|e| serde_json::json!({"error": e.to_string(), "code": "STORE_ERROR"}))?;

    if !accepted {
        // 어느 경합에서 밀렸는지 현재 저장 상태로 구분한다
        let current = store
            .get(cmd.auction_id)
            .await
            .map_err(|e| serde_json::json!({"error": e.to_string(), "code": "NOT_FOUND"}))?;
        if current.status != AuctionStatus::Active {
            return Err(serde_json::json!({
                "error": "경매가 이미 종료되었습니다.",
                "code": "ALREADY_ENDED"
            }));
        }
        return Err(serde_json::json!({
            "error": "입찰 금액이 현재 가격보다 낮습니다.",
            "code": "LOW_BID",
            "current_price": current.highest_bid,
        }));
    }

    publisher.publish(AuctionEvent::BidPlaced {
        auction_id: cmd.auction_id,
        bidder_id: cmd.bidder_id,
        bid_amount: cmd.bid_amount,
        occurred_at: now,
    });

    let updated = store
        .get(cmd.auction_id)
        .await
        .map_err(|e| serde_json::json!({"error": e.to_string(), "code": "NOT_FOUND"}))?;
    info!(
        "{:<12} --> 입찰 성공: 경매 {}, 현재 가격 {:?}",
        "Command", updated.id, updated.highest_bid
    );
    Ok(updated)
}

/// 2. 경매 등록
/// 판매자가 차량의 입찰 기간을 등록한다. SCHEDULED 상태로 생성된다.
pub async fn handle_create_auction(
    cmd: CreateAuctionCommand,
    store: &dyn AuctionStore,
) -> Result<Auction, serde_json::Value> {
    info!("{:<12} --> 경매 등록 요청 처리 시작: {:?}", "Command", cmd);

    if cmd.start_time >= cmd.end_time {
        return Err(serde_json::json!({
            "error": "종료 시각은 시작 시각보다 늦어야 합니다.",
            "code": "INVALID_WINDOW"
        }));
    }

    store
        .create(&cmd.vehicle_title, &cmd.seller, cmd.start_time, cmd.end_time)
        .await
        .map_err(|e| serde_json::json!({"error": e.to_string(), "code": "STORE_ERROR"}))
}

// endregion: --- Commands

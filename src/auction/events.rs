use crate::auction::model::{Auction, AuctionStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AuctionEvent {
    // 상태 전이 이벤트 (실현된 전이당 정확히 한 번 발행)
    #[serde(rename_all = "camelCase")]
    LifecycleChanged {
        auction_id: i64,
        previous_status: AuctionStatus,
        new_status: AuctionStatus,
        occurred_at: DateTime<Utc>,
        snapshot: Auction,
    },
    // 최고 입찰가 갱신 이벤트
    #[serde(rename_all = "camelCase")]
    BidPlaced {
        auction_id: i64,
        bidder_id: i64,
        bid_amount: i64,
        occurred_at: DateTime<Utc>,
    },
}

impl AuctionEvent {
    /// 이벤트가 속한 경매(룸) 식별자
    pub fn auction_id(&self) -> i64 {
        match self {
            AuctionEvent::LifecycleChanged { auction_id, .. } => *auction_id,
            AuctionEvent::BidPlaced { auction_id, .. } => *auction_id,
        }
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// region:    --- Auction Status

/// 경매 상태
/// SCHEDULED -> ACTIVE -> ENDED 순서로만 이동하며 역행하지 않는다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "auction_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum AuctionStatus {
    Scheduled,
    Active,
    Ended,
}

impl AuctionStatus {
    /// 종료 상태 여부
    pub fn is_terminal(&self) -> bool {
        matches!(self, AuctionStatus::Ended)
    }
}

// endregion: --- Auction Status

// region:    --- Models

// 차량 경매 모델
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Auction {
    pub id: i64,
    pub vehicle_title: String,
    pub seller: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: AuctionStatus,
    pub highest_bid: Option<i64>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Auction {
    /// 시작/종료 시각 불변식 검사
    pub fn has_valid_window(&self) -> bool {
        self.start_time < self.end_time
    }
}

// 입찰 모델
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Bid {
    pub id: i64,
    pub auction_id: i64,
    pub bidder_id: i64,
    pub bid_amount: i64,
    pub bid_time: DateTime<Utc>,
}

// endregion: --- Models

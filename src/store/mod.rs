/// 경매 스토어
/// 코어가 저장소에 요구하는 유일한 계약이다. 상태/최고가에 대한 모든 쓰기는
/// 조건부 갱신을 거치며 블라인드 덮어쓰기는 없다.
// region:    --- Imports
use crate::auction::model::{Auction, AuctionStatus, Bid};
use crate::clock::Clock;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

pub mod memory;
pub mod queries;

// endregion: --- Imports

// region:    --- Store Error

/// 스토어 오류
/// 일시적 저장소 오류는 호출 측에서 로깅 후 다음 틱에 재시도된다.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("경매를 찾을 수 없음: {0}")]
    NotFound(i64),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

// endregion: --- Store Error

// region:    --- Auction Store Trait

/// 경매 스토어 트레이트
#[async_trait]
pub trait AuctionStore: Send + Sync {
    /// 비종료(SCHEDULED, ACTIVE) 경매 전체 조회
    async fn list_non_terminal(&self) -> Result<Vec<Auction>, StoreError>;

    /// 경매 단건 조회
    async fn get(&self, auction_id: i64) -> Result<Auction, StoreError>;

    /// 조건부 상태 전이
    /// 저장된 상태가 `expected`와 일치할 때만 성공한다.
    /// 다른 쓰기가 먼저 전이시킨 경우 false를 반환하며 덮어쓰지 않는다.
    async fn try_transition(
        &self,
        auction_id: i64,
        expected: AuctionStatus,
        target: AuctionStatus,
    ) -> Result<bool, StoreError>;

    /// 조건부 최고 입찰가 갱신 + 입찰 기록
    /// ACTIVE 상태이면서 기존 최고가보다 높을 때만 성공한다.
    async fn record_bid(
        &self,
        auction_id: i64,
        bidder_id: i64,
        bid_amount: i64,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    /// 입찰 이력 조회
    async fn list_bids(&self, auction_id: i64) -> Result<Vec<Bid>, StoreError>;

    /// 경매 등록 (SCHEDULED 상태로 생성)
    async fn create(
        &self,
        vehicle_title: &str,
        seller: &str,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Result<Auction, StoreError>;
}

// endregion: --- Auction Store Trait

// region:    --- Postgres Auction Store

/// 경매 스토어 구현체
pub struct PostgresAuctionStore {
    pool: Arc<PgPool>,
    clock: Arc<dyn Clock>,
}

/// 경매 스토어 생성
impl PostgresAuctionStore {
    pub fn new(pool: Arc<PgPool>, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }
}

/// 경매 스토어 메서드 구현
#[async_trait]
impl AuctionStore for PostgresAuctionStore {
    async fn list_non_terminal(&self) -> Result<Vec<Auction>, StoreError> {
        let auctions = sqlx::query_as::<_, Auction>(queries::LIST_NON_TERMINAL)
            .fetch_all(&*self.pool)
            .await?;
        Ok(auctions)
    }

    async fn get(&self, auction_id: i64) -> Result<Auction, StoreError> {
        sqlx::query_as::<_, Auction>(queries::GET_AUCTION)
            .bind(auction_id)
            .fetch_optional(&*self.pool)
            .await?
            .ok_or(StoreError::NotFound(auction_id))
    }

    async fn try_transition(
        &self,
        auction_id: i64,
        expected: AuctionStatus,
        target: AuctionStatus,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(queries::TRY_TRANSITION)
            .bind(target)
            .bind(self.clock.now())
            .bind(auction_id)
            .bind(expected)
            .execute(&*self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn record_bid(
        &self,
        auction_id: i64,
        bidder_id: i64,
        bid_amount: i64,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        // 최고가 갱신과 입찰 기록을 한 트랜잭션으로 묶는다
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(queries::RECORD_BID)
            .bind(bid_amount)
            .bind(now)
            .bind(auction_id)
            .execute(&mut *tx)
            .await?;

        if updated.rows_affected() == 0 {
            // 경쟁 입찰에 밀렸거나 이미 종료된 경매
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query(queries::INSERT_BID)
            .bind(auction_id)
            .bind(bidder_id)
            .bind(bid_amount)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        info!(
            "{:<12} --> 최고 입찰가 갱신: 경매 {}, 금액 {}",
            "Store", auction_id, bid_amount
        );
        Ok(true)
    }

    async fn list_bids(&self, auction_id: i64) -> Result<Vec<Bid>, StoreError> {
        let bids = sqlx::query_as::<_, Bid>(queries::LIST_BIDS)
            .bind(auction_id)
            .fetch_all(&*self.pool)
            .await?;
        Ok(bids)
    }

    async fn create(
        &self,
        vehicle_title: &str,
        seller: &str,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Result<Auction, StoreError> {
        let auction = sqlx::query_as::<_, Auction>(queries::CREATE_AUCTION)
            .bind(vehicle_title)
            .bind(seller)
            .bind(start_time)
            .bind(end_time)
            .bind(self.clock.now())
            .fetch_one(&*self.pool)
            .await?;

        info!(
            "{:<12} --> 경매 등록: id {}, {} ~ {}",
            "Store", auction.id, auction.start_time, auction.end_time
        );
        Ok(auction)
    }
}

// endregion: --- Postgres Auction Store

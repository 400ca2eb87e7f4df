/// 인메모리 경매 스토어
/// 통합 테스트가 외부 데이터베이스 없이 스케줄러/허브 경로를 구동하기 위한 구현체.
/// Postgres 구현체와 같은 조건부 갱신 계약을 지킨다.
// region:    --- Imports
use crate::auction::model::{Auction, AuctionStatus, Bid};
use crate::store::{AuctionStore, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

// endregion: --- Imports

// region:    --- Memory Auction Store

#[derive(Default)]
struct MemoryInner {
    auctions: HashMap<i64, Auction>,
    bids: Vec<Bid>,
    next_auction_id: i64,
    next_bid_id: i64,
}

/// 인메모리 경매 스토어
#[derive(Default)]
pub struct MemoryAuctionStore {
    inner: Mutex<MemoryInner>,
}

impl MemoryAuctionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// 인메모리 경매 스토어 메서드 구현
#[async_trait]
impl AuctionStore for MemoryAuctionStore {
    async fn list_non_terminal(&self) -> Result<Vec<Auction>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut auctions: Vec<Auction> = inner
            .auctions
            .values()
            .filter(|a| !a.status.is_terminal())
            .cloned()
            .collect();
        auctions.sort_by_key(|a| a.start_time);
        Ok(auctions)
    }

    async fn get(&self, auction_id: i64) -> Result<Auction, StoreError> {
        let inner = self.inner.lock().unwrap();
        inner
            .auctions
            .get(&auction_id)
            .cloned()
            .ok_or(StoreError::NotFound(auction_id))
    }

    async fn try_transition(
        &self,
        auction_id: i64,
        expected: AuctionStatus,
        target: AuctionStatus,
    ) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let auction = inner
            .auctions
            .get_mut(&auction_id)
            .ok_or(StoreError::NotFound(auction_id))?;

        if auction.status != expected {
            return Ok(false);
        }

        auction.status = target;
        auction.version += 1;
        auction.updated_at = Utc::now();
        Ok(true)
    }

    async fn record_bid(
        &self,
        auction_id: i64,
        bidder_id: i64,
        bid_amount: i64,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let bid_id = inner.next_bid_id + 1;
        let auction = inner
            .auctions
            .get_mut(&auction_id)
            .ok_or(StoreError::NotFound(auction_id))?;

        if auction.status != AuctionStatus::Active {
            return Ok(false);
        }
        if auction.highest_bid.is_some_and(|current| current >= bid_amount) {
            return Ok(false);
        }

        auction.highest_bid = Some(bid_amount);
        auction.version += 1;
        auction.updated_at = now;

        inner.next_bid_id = bid_id;
        inner.bids.push(Bid {
            id: bid_id,
            auction_id,
            bidder_id,
            bid_amount,
            bid_time: now,
        });
        Ok(true)
    }

    async fn list_bids(&self, auction_id: i64) -> Result<Vec<Bid>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut bids: Vec<Bid> = inner
            .bids
            .iter()
            .filter(|b| b.auction_id == auction_id)
            .cloned()
            .collect();
        bids.sort_by(|a, b| b.bid_time.cmp(&a.bid_time));
        Ok(bids)
    }

    async fn create(
        &self,
        vehicle_title: &str,
        seller: &str,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Result<Auction, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.next_auction_id += 1;
        let id = inner.next_auction_id;
        let now = Utc::now();

        let auction = Auction {
            id,
            vehicle_title: vehicle_title.to_string(),
            seller: seller.to_string(),
            start_time,
            end_time,
            status: AuctionStatus::Scheduled,
            highest_bid: None,
            version: 0,
            created_at: now,
            updated_at: now,
        };
        inner.auctions.insert(id, auction.clone());
        Ok(auction)
    }
}

// endregion: --- Memory Auction Store

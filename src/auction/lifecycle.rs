/// 경매 생애주기 판정
/// 순수 함수만 두고 I/O는 스케줄러와 스토어에 맡긴다.
// region:    --- Imports
use crate::auction::model::{Auction, AuctionStatus};
use chrono::{DateTime, Utc};

// endregion: --- Imports

// region:    --- Evaluate

/// 현재 시각 기준 목표 상태 판정
/// 전이가 필요 없으면 None을 반환한다.
///
/// 단계적 전이 정책: 한 번의 평가에서 최대 한 단계만 이동한다.
/// 시작/종료 시각이 모두 지난 SCHEDULED 경매도 먼저 ACTIVE로만 올리고,
/// ENDED는 다음 평가에서 처리한다. 구독자는 항상 ACTIVE 이벤트를
/// 관측한 뒤에 ENDED 이벤트를 받는다.
pub fn evaluate(auction: &Auction, now: DateTime<Utc>) -> Option<AuctionStatus> {
    match auction.status {
        AuctionStatus::Scheduled if now >= auction.start_time => Some(AuctionStatus::Active),
        AuctionStatus::Active if now >= auction.end_time => Some(AuctionStatus::Ended),
        _ => None,
    }
}

// endregion: --- Evaluate

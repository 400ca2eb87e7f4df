/// 비종료 경매 조회 (SCHEDULED, ACTIVE)
pub const LIST_NON_TERMINAL: &str = r#"
    SELECT id, vehicle_title, seller, start_time, end_time, status, highest_bid, version, created_at, updated_at
    FROM auctions
    WHERE status IN ('SCHEDULED', 'ACTIVE')
    ORDER BY start_time ASC
"#;

/// 경매 단건 조회
pub const GET_AUCTION: &str = "SELECT id, vehicle_title, seller, start_time, end_time, status, highest_bid, version, created_at, updated_at FROM auctions WHERE id = $1";

/// 조건부 상태 전이
/// 저장된 상태가 기대값과 일치할 때만 갱신된다 (낙관적 동시성 제어)
pub const TRY_TRANSITION: &str = r#"
    UPDATE auctions
    SET status = $1, version = version + 1, updated_at = $2
    WHERE id = $3 AND status = $4
"#;

/// 조건부 최고 입찰가 갱신
/// ACTIVE 상태이면서 기존 최고가보다 높을 때만 갱신된다
pub const RECORD_BID: &str = r#"
    UPDATE auctions
    SET highest_bid = $1, version = version + 1, updated_at = $2
    WHERE id = $3 AND status = 'ACTIVE' AND (highest_bid IS NULL OR highest_bid < $1)
"#;

/// 입찰 기록 추가
pub const INSERT_BID: &str =
    "INSERT INTO bids (auction_id, bidder_id, bid_amount, bid_time) VALUES ($1, $2, $3, $4)";

/// 입찰 이력 조회
pub const LIST_BIDS: &str = r#"
    SELECT id, auction_id, bidder_id, bid_amount, bid_time
    FROM bids
    WHERE auction_id = $1
    ORDER BY bid_time DESC
"#;

/// 경매 등록 (SCHEDULED 상태로 생성)
pub const CREATE_AUCTION: &str = r#"
    INSERT INTO auctions (vehicle_title, seller, start_time, end_time, status, highest_bid, version, created_at, updated_at)
    VALUES ($1, $2, $3, $4, 'SCHEDULED', NULL, 0, $5, $5)
    RETURNING id, vehicle_title, seller, start_time, end_time, status, highest_bid, version, created_at, updated_at
"#;

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::{Arc, Mutex};
use vehicle_auction_service::auction::events::AuctionEvent;
use vehicle_auction_service::auction::lifecycle;
use vehicle_auction_service::auction::model::{Auction, AuctionStatus};
use vehicle_auction_service::bidding::commands::{handle_place_bid, PlaceBidCommand};
use vehicle_auction_service::clock::{breakdown, format_karachi, Clock, TimeRemaining};
use vehicle_auction_service::display::{format_countdown, format_price, PriceFormatError};
use vehicle_auction_service::hub::{EventPublisher, NotificationHub};
use vehicle_auction_service::scheduler::LifecycleScheduler;
use vehicle_auction_service::store::memory::MemoryAuctionStore;
use vehicle_auction_service::store::AuctionStore;

/// 테스트용 고정 시계
struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap() = now;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// 기준 시각 (임의의 고정 시각)
fn base_instant() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 8, 7, 10, 0, 0).unwrap()
}

/// 스케줄러 테스트 구성: 인메모리 스토어 + 허브 + 고정 시계
fn scheduler_setup(
    now: DateTime<Utc>,
) -> (
    Arc<MemoryAuctionStore>,
    Arc<NotificationHub>,
    Arc<FixedClock>,
    LifecycleScheduler,
) {
    let store = Arc::new(MemoryAuctionStore::new());
    let hub = Arc::new(NotificationHub::new());
    let clock = Arc::new(FixedClock::new(now));
    let scheduler = LifecycleScheduler::new(
        Arc::clone(&store) as Arc<dyn AuctionStore>,
        Arc::clone(&hub) as Arc<dyn EventPublisher>,
        Arc::clone(&clock) as Arc<dyn Clock>,
        tokio::time::Duration::from_secs(60),
    );
    (store, hub, clock, scheduler)
}

/// 테스트용 경매 생성
async fn create_test_auction(
    store: &MemoryAuctionStore,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
) -> Auction {
    store
        .create("테스트 차량", "TestSeller", start_time, end_time)
        .await
        .unwrap()
}

// region:    --- Clock / Display

/// 남은 시간 분해 테스트
#[test]
fn test_breakdown() {
    let from = base_instant();

    // 90061000ms = 1일 1시간 1분 1초
    let to = from + Duration::milliseconds(90_061_000);
    assert_eq!(
        breakdown(from, to),
        TimeRemaining::Remaining {
            days: 1,
            hours: 1,
            minutes: 1,
            seconds: 1,
            total_seconds: 90_061,
        }
    );

    // 목표 시각이 지났으면 음수 대신 Expired
    assert_eq!(breakdown(from, from), TimeRemaining::Expired);
    assert_eq!(
        breakdown(from, from - Duration::seconds(10)),
        TimeRemaining::Expired
    );
}

/// 카운트다운 표기 테스트
#[test]
fn test_format_countdown() {
    let from = base_instant();
    let to = from + Duration::milliseconds(90_061_000);
    assert_eq!(format_countdown(&breakdown(from, to)), "1d 1h 1m 1s");
    assert_eq!(format_countdown(&breakdown(from, from)), "Time expired");
}

/// 기준 시간대(Asia/Karachi) 표기 테스트
#[test]
fn test_format_karachi() {
    // UTC 10:00 == PKT 15:00
    assert_eq!(format_karachi(base_instant()), "2026-08-07T15:00");
}

/// 가격 라벨 자릿수 표 테스트
#[test]
fn test_format_price_bands() {
    assert_eq!(format_price(350).unwrap(), "3 Hundred and 50");
    assert_eq!(format_price(300).unwrap(), "3 Hundred");
    assert_eq!(format_price(1500).unwrap(), "1 Thousand and 500");
    assert_eq!(format_price(12300).unwrap(), "12 Thousand and 300");
    assert_eq!(format_price(150000).unwrap(), "1.50 Lac");
    assert_eq!(format_price(2500000).unwrap(), "25.00 Lac");
    assert_eq!(format_price(12345678).unwrap(), "1.23 Crore");
    assert_eq!(format_price(123456789).unwrap(), "12.34 Crore");
    assert_eq!(format_price(9900000000).unwrap(), "990.00 Crore");
}

/// 가격 라벨 도메인 오류 테스트
#[test]
fn test_format_price_errors() {
    assert_eq!(format_price(-5), Err(PriceFormatError::InvalidAmount(-5)));
    assert_eq!(format_price(0), Err(PriceFormatError::InvalidAmount(0)));
    assert_eq!(
        format_price(99),
        Err(PriceFormatError::UnsupportedRange { digits: 2 })
    );
    assert_eq!(
        format_price(12_345_678_901),
        Err(PriceFormatError::UnsupportedRange { digits: 11 })
    );
}

// endregion: --- Clock / Display

// region:    --- Lifecycle Evaluator

/// 생애주기 판정 테스트
#[tokio::test]
async fn test_evaluate_transitions() {
    let now = base_instant();
    let store = MemoryAuctionStore::new();
    let auction = create_test_auction(
        &store,
        now + Duration::minutes(10),
        now + Duration::minutes(70),
    )
    .await;

    // 시작 전: 전이 없음
    assert_eq!(lifecycle::evaluate(&auction, now), None);

    // 시작 시각 도달: SCHEDULED -> ACTIVE
    assert_eq!(
        lifecycle::evaluate(&auction, now + Duration::minutes(10)),
        Some(AuctionStatus::Active)
    );

    // ACTIVE 상태에서 종료 전: 전이 없음
    let mut active = auction.clone();
    active.status = AuctionStatus::Active;
    assert_eq!(
        lifecycle::evaluate(&active, now + Duration::minutes(30)),
        None
    );

    // 종료 시각 도달: ACTIVE -> ENDED
    assert_eq!(
        lifecycle::evaluate(&active, now + Duration::minutes(70)),
        Some(AuctionStatus::Ended)
    );

    // ENDED는 더 이상 움직이지 않는다
    let mut ended = auction.clone();
    ended.status = AuctionStatus::Ended;
    assert_eq!(
        lifecycle::evaluate(&ended, now + Duration::hours(24)),
        None
    );
}

/// 단계적 전이 정책 테스트
/// 두 경계가 모두 지난 SCHEDULED 경매도 한 번의 판정에서는 ACTIVE까지만 간다.
#[tokio::test]
async fn test_evaluate_is_staged() {
    let now = base_instant();
    let store = MemoryAuctionStore::new();
    let auction = create_test_auction(
        &store,
        now - Duration::hours(2),
        now - Duration::hours(1),
    )
    .await;

    assert_eq!(
        lifecycle::evaluate(&auction, now),
        Some(AuctionStatus::Active)
    );
}

// endregion: --- Lifecycle Evaluator

// region:    --- Store

/// 조건부 전이 경합 테스트
/// 같은 전이를 두 쓰기가 경쟁하면 정확히 하나만 성공한다.
#[tokio::test]
async fn test_try_transition_race() {
    let now = base_instant();
    let store = Arc::new(MemoryAuctionStore::new());
    let auction =
        create_test_auction(&store, now - Duration::minutes(1), now + Duration::hours(1)).await;

    let (a, b) = tokio::join!(
        store.try_transition(auction.id, AuctionStatus::Scheduled, AuctionStatus::Active),
        store.try_transition(auction.id, AuctionStatus::Scheduled, AuctionStatus::Active),
    );
    let results = [a.unwrap(), b.unwrap()];
    assert_eq!(results.iter().filter(|ok| **ok).count(), 1);

    // 저장된 상태는 덮어써지지 않는다
    let stored = store.get(auction.id).await.unwrap();
    assert_eq!(stored.status, AuctionStatus::Active);
    assert_eq!(stored.version, auction.version + 1);

    // 기대 상태가 어긋난 늦은 쓰기는 거부된다
    let stale = store
        .try_transition(auction.id, AuctionStatus::Scheduled, AuctionStatus::Active)
        .await
        .unwrap();
    assert!(!stale);
}

/// 종료된 경매의 최고가 갱신 금지 테스트
#[tokio::test]
async fn test_record_bid_rejected_after_ended() {
    let now = base_instant();
    let store = MemoryAuctionStore::new();
    let auction =
        create_test_auction(&store, now - Duration::hours(2), now - Duration::hours(1)).await;

    store
        .try_transition(auction.id, AuctionStatus::Scheduled, AuctionStatus::Active)
        .await
        .unwrap();
    store
        .try_transition(auction.id, AuctionStatus::Active, AuctionStatus::Ended)
        .await
        .unwrap();

    let accepted = store.record_bid(auction.id, 1, 500_000, now).await.unwrap();
    assert!(!accepted);
    assert_eq!(store.get(auction.id).await.unwrap().highest_bid, None);
}

// endregion: --- Store

// region:    --- Notification Hub

/// 룸 입장/퇴장 왕복 테스트
#[tokio::test]
async fn test_hub_subscribe_unsubscribe() {
    let hub = NotificationHub::new();
    let (conn_a, mut rx_a) = hub.register();
    let (conn_b, mut rx_b) = hub.register();

    hub.subscribe(conn_a, 7);
    hub.subscribe(conn_b, 7);
    // 중복 입장은 no-op
    hub.subscribe(conn_a, 7);
    assert_eq!(hub.room_size(7), 2);

    hub.publish(bid_event(7, 100_000));
    assert!(matches!(
        rx_a.try_recv().unwrap(),
        AuctionEvent::BidPlaced { auction_id: 7, .. }
    ));
    // 중복 입장했어도 전달은 한 번
    assert!(rx_a.try_recv().is_err());
    assert!(rx_b.try_recv().is_ok());

    // 퇴장한 연결은 더 이상 받지 못한다
    hub.unsubscribe(conn_a, 7);
    assert_eq!(hub.room_size(7), 1);
    hub.publish(bid_event(7, 110_000));
    assert!(rx_a.try_recv().is_err());
    assert!(rx_b.try_recv().is_ok());
}

/// 연결 종료 시 모든 룸에서 제거되는지 테스트
#[tokio::test]
async fn test_hub_connection_closed() {
    let hub = NotificationHub::new();
    let (conn, mut rx) = hub.register();
    let (other, mut other_rx) = hub.register();

    hub.subscribe(conn, 1);
    hub.subscribe(conn, 2);
    hub.subscribe(other, 1);

    hub.connection_closed(conn);
    assert_eq!(hub.room_size(1), 1);
    assert_eq!(hub.room_size(2), 0);

    // 닫힌 연결에는 도달하지 않고 나머지 전달은 계속된다
    hub.publish(bid_event(1, 100_000));
    hub.publish(bid_event(2, 200_000));
    assert!(rx.try_recv().is_err());
    assert!(other_rx.try_recv().is_ok());
}

/// 구독자 하나의 전달 실패 격리 테스트
/// 수신측이 죽은 연결이 있어도 나머지 구독자 전달은 계속된다.
#[tokio::test]
async fn test_hub_dead_subscriber_isolation() {
    let hub = NotificationHub::new();
    let (dead, dead_rx) = hub.register();
    let (alive, mut alive_rx) = hub.register();

    hub.subscribe(dead, 5);
    hub.subscribe(alive, 5);

    // 종료 처리 없이 수신 채널만 닫힌 연결
    drop(dead_rx);

    hub.publish(bid_event(5, 100_000));
    assert!(alive_rx.try_recv().is_ok());
}

/// 같은 룸 안에서 발행 순서가 보존되는지 테스트
#[tokio::test]
async fn test_hub_delivery_order() {
    let hub = NotificationHub::new();
    let (conn, mut rx) = hub.register();
    hub.subscribe(conn, 3);

    hub.publish(bid_event(3, 100_000));
    hub.publish(bid_event(3, 110_000));

    let first = rx.try_recv().unwrap();
    let second = rx.try_recv().unwrap();
    match (first, second) {
        (
            AuctionEvent::BidPlaced {
                bid_amount: amount_1,
                ..
            },
            AuctionEvent::BidPlaced {
                bid_amount: amount_2,
                ..
            },
        ) => {
            assert_eq!(amount_1, 100_000);
            assert_eq!(amount_2, 110_000);
        }
        other => panic!("예상하지 못한 이벤트 순서: {:?}", other),
    }
}

// endregion: --- Notification Hub

// region:    --- Scheduler

/// 경매 사이클 테스트
/// 시작 전에 입장한 구독자는 ACTIVE 이벤트를 정확히 한 번 받고,
/// 종료 후 한 주기 안에 ENDED 이벤트를 받는다.
#[tokio::test]
async fn test_auction_lifecycle_with_subscriber() {
    let start = base_instant();
    let end = start + Duration::seconds(3600);
    let (store, hub, clock, scheduler) = scheduler_setup(start - Duration::seconds(1));
    let auction = create_test_auction(&store, start, end).await;

    // 시작 전 입장
    let (conn, mut rx) = hub.register();
    hub.subscribe(conn, auction.id);

    // T-1초: 전이 없음
    assert_eq!(scheduler.run_pass().await.unwrap(), 0);
    assert!(rx.try_recv().is_err());
    assert_eq!(store.get(auction.id).await.unwrap().status, AuctionStatus::Scheduled);

    // T: SCHEDULED -> ACTIVE, 이벤트 정확히 한 번
    clock.set(start);
    assert_eq!(scheduler.run_pass().await.unwrap(), 1);
    match rx.try_recv().unwrap() {
        AuctionEvent::LifecycleChanged {
            previous_status,
            new_status,
            snapshot,
            ..
        } => {
            assert_eq!(previous_status, AuctionStatus::Scheduled);
            assert_eq!(new_status, AuctionStatus::Active);
            assert_eq!(snapshot.status, AuctionStatus::Active);
        }
        other => panic!("예상하지 못한 이벤트: {:?}", other),
    }
    assert!(rx.try_recv().is_err());

    // 같은 시각의 재평가는 아무것도 다시 발행하지 않는다
    assert_eq!(scheduler.run_pass().await.unwrap(), 0);
    assert!(rx.try_recv().is_err());

    // T+3601초: ACTIVE -> ENDED
    clock.set(end + Duration::seconds(1));
    assert_eq!(scheduler.run_pass().await.unwrap(), 1);
    match rx.try_recv().unwrap() {
        AuctionEvent::LifecycleChanged {
            previous_status,
            new_status,
            ..
        } => {
            assert_eq!(previous_status, AuctionStatus::Active);
            assert_eq!(new_status, AuctionStatus::Ended);
        }
        other => panic!("예상하지 못한 이벤트: {:?}", other),
    }
    assert_eq!(store.get(auction.id).await.unwrap().status, AuctionStatus::Ended);
}

/// 단계적 전이 테스트
/// 두 경계가 모두 지난 경매는 두 번의 패스에 걸쳐 ACTIVE, ENDED를 차례로
/// 발행하며 SCHEDULED에서 ENDED로 건너뛰지 않는다.
#[tokio::test]
async fn test_scheduler_staged_transition_when_both_elapsed() {
    let now = base_instant();
    let (store, hub, _clock, scheduler) = scheduler_setup(now);
    let auction =
        create_test_auction(&store, now - Duration::hours(2), now - Duration::hours(1)).await;

    let (conn, mut rx) = hub.register();
    hub.subscribe(conn, auction.id);

    // 첫 패스: ACTIVE까지만
    assert_eq!(scheduler.run_pass().await.unwrap(), 1);
    assert_eq!(store.get(auction.id).await.unwrap().status, AuctionStatus::Active);

    // 둘째 패스: ENDED
    assert_eq!(scheduler.run_pass().await.unwrap(), 1);
    assert_eq!(store.get(auction.id).await.unwrap().status, AuctionStatus::Ended);

    // 구독자는 ACTIVE, ENDED 순서로 관측한다
    let statuses: Vec<AuctionStatus> = std::iter::from_fn(|| rx.try_recv().ok())
        .map(|event| match event {
            AuctionEvent::LifecycleChanged { new_status, .. } => new_status,
            other => panic!("예상하지 못한 이벤트: {:?}", other),
        })
        .collect();
    assert_eq!(statuses, vec![AuctionStatus::Active, AuctionStatus::Ended]);
}

/// 손상된 레코드 격리 테스트
/// end_time <= start_time 인 경매는 건너뛰고 나머지는 정상 평가된다.
#[tokio::test]
async fn test_scheduler_skips_malformed_record() {
    let now = base_instant();
    let (store, _hub, _clock, scheduler) = scheduler_setup(now);

    // 손상된 레코드 (시작/종료 역전)
    create_test_auction(&store, now - Duration::hours(1), now - Duration::hours(2)).await;
    // 정상 레코드
    let valid =
        create_test_auction(&store, now - Duration::minutes(1), now + Duration::hours(1)).await;

    assert_eq!(scheduler.run_pass().await.unwrap(), 1);
    assert_eq!(store.get(valid.id).await.unwrap().status, AuctionStatus::Active);
}

// endregion: --- Scheduler

// region:    --- Bidding

/// 입찰 경로 테스트
/// 최고가 갱신과 BidPlaced 팬아웃이 한 경로로 묶여 동작한다.
#[tokio::test]
async fn test_place_bid_publishes_to_room() {
    let now = base_instant();
    let (store, hub, clock, scheduler) = scheduler_setup(now);
    let auction =
        create_test_auction(&store, now - Duration::minutes(1), now + Duration::hours(1)).await;
    scheduler.run_pass().await.unwrap();

    let (conn, mut rx) = hub.register();
    hub.subscribe(conn, auction.id);

    let updated = handle_place_bid(
        PlaceBidCommand {
            auction_id: auction.id,
            bidder_id: 11,
            bid_amount: 150_000,
        },
        store.as_ref(),
        hub.as_ref(),
        clock.as_ref(),
    )
    .await
    .unwrap();
    assert_eq!(updated.highest_bid, Some(150_000));

    match rx.try_recv().unwrap() {
        AuctionEvent::BidPlaced {
            auction_id,
            bidder_id,
            bid_amount,
            ..
        } => {
            assert_eq!(auction_id, auction.id);
            assert_eq!(bidder_id, 11);
            assert_eq!(bid_amount, 150_000);
        }
        other => panic!("예상하지 못한 이벤트: {:?}", other),
    }

    // 현재 가격보다 낮은 입찰은 거부된다
    let err = handle_place_bid(
        PlaceBidCommand {
            auction_id: auction.id,
            bidder_id: 12,
            bid_amount: 120_000,
        },
        store.as_ref(),
        hub.as_ref(),
        clock.as_ref(),
    )
    .await
    .unwrap_err();
    assert_eq!(err["code"], "LOW_BID");

    // 입찰 이력은 최고가 갱신과 함께 기록된다
    let bids = store.list_bids(auction.id).await.unwrap();
    assert_eq!(bids.len(), 1);
    assert_eq!(bids[0].bid_amount, 150_000);
}

/// 시작 전/종료 후 입찰 거부 테스트
#[tokio::test]
async fn test_place_bid_outside_window() {
    let now = base_instant();
    let (store, hub, clock, scheduler) = scheduler_setup(now);

    // 아직 시작되지 않은 경매
    let scheduled =
        create_test_auction(&store, now + Duration::hours(1), now + Duration::hours(2)).await;
    let err = handle_place_bid(
        PlaceBidCommand {
            auction_id: scheduled.id,
            bidder_id: 1,
            bid_amount: 100_000,
        },
        store.as_ref(),
        hub.as_ref(),
        clock.as_ref(),
    )
    .await
    .unwrap_err();
    assert_eq!(err["code"], "NOT_STARTED");

    // 이미 종료된 경매
    let elapsed =
        create_test_auction(&store, now - Duration::hours(2), now - Duration::hours(1)).await;
    scheduler.run_pass().await.unwrap();
    scheduler.run_pass().await.unwrap();
    assert_eq!(store.get(elapsed.id).await.unwrap().status, AuctionStatus::Ended);

    let err = handle_place_bid(
        PlaceBidCommand {
            auction_id: elapsed.id,
            bidder_id: 1,
            bid_amount: 100_000,
        },
        store.as_ref(),
        hub.as_ref(),
        clock.as_ref(),
    )
    .await
    .unwrap_err();
    assert_eq!(err["code"], "ALREADY_ENDED");
}

// endregion: --- Bidding

/// 테스트용 입찰 이벤트 구성
fn bid_event(auction_id: i64, bid_amount: i64) -> AuctionEvent {
    AuctionEvent::BidPlaced {
        auction_id,
        bidder_id: 1,
        bid_amount,
        occurred_at: base_instant(),
    }
}

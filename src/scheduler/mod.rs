/// 경매 생애주기 스케줄러
/// 고정 주기(기본 1분)마다 평가 패스를 한 번 돌린다. 패스는 비종료 경매를
/// 전부 읽어 현재 시각 기준 목표 상태를 판정하고, 조건부 전이에 성공한
/// 경매마다 이벤트 하나를 허브에 넘긴다.
// region:    --- Imports
use crate::auction::events::AuctionEvent;
use crate::auction::lifecycle;
use crate::auction::model::{Auction, AuctionStatus};
use crate::clock::Clock;
use chrono::{DateTime, Utc};
use crate::hub::EventPublisher;
use crate::store::{AuctionStore, StoreError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, error, info, warn};

// endregion: --- Imports

// region:    --- Lifecycle Scheduler

/// 경매 생애주기 스케줄러
#[derive(Clone)]
pub struct LifecycleScheduler {
    store: Arc<dyn AuctionStore>,
    publisher: Arc<dyn EventPublisher>,
    clock: Arc<dyn Clock>,
    cadence: Duration,
    // 패스 중복 실행 방지 플래그. 프로세스 시작 시 생성되어 종료까지 유지된다.
    pass_running: Arc<AtomicBool>,
}

/// 경매 생애주기 스케줄러 구현
impl LifecycleScheduler {
    pub fn new(
        store: Arc<dyn AuctionStore>,
        publisher: Arc<dyn EventPublisher>,
        clock: Arc<dyn Clock>,
        cadence: Duration,
    ) -> Self {
        Self {
            store,
            publisher,
            clock,
            cadence,
            pass_running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// 스케줄러 시작
    /// 패스에서 올라온 오류는 여기서 흡수하고 다음 틱에 계속한다.
    /// 놓친 틱은 몰아서 실행하지 않는다. 다음 틱이 더 큰 시간 차를
    /// 관측할 뿐이며 단계적 전이 정책이 이를 한 주기 안에 해소한다.
    pub async fn start(&self) {
        let scheduler = self.clone();
        tokio::spawn(async move {
            let mut ticker = interval(scheduler.cadence);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                match scheduler.run_pass().await {
                    Ok(0) => debug!("{:<12} --> 평가 패스 완료: 전이 없음", "Scheduler"),
                    Ok(n) => info!("{:<12} --> 평가 패스 완료: {}건 전이", "Scheduler", n),
                    Err(e) => error!(
                        "{:<12} --> 평가 패스 중 오류 발생, 다음 틱에 재시도: {:?}",
                        "Scheduler", e
                    ),
                }
            }
        });
    }

    /// 평가 패스 한 번 실행
    /// 이전 패스가 아직 돌고 있으면 이번 틱은 건너뛴다 (큐잉하지 않음).
    pub async fn run_pass(&self) -> Result<usize, StoreError> {
        if self
            .pass_running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("{:<12} --> 이전 패스 진행 중, 이번 틱 생략", "Scheduler");
            return Ok(0);
        }

        let result = self.evaluate_all().await;
        self.pass_running.store(false, Ordering::SeqCst);
        result
    }

    /// 비종료 경매 전체 평가
    async fn evaluate_all(&self) -> Result<usize, StoreError> {
        let now = self.clock.now();
        let auctions = self.store.list_non_terminal().await?;
        let mut transitioned = 0;

        for auction in auctions {
            // 손상된 레코드는 건너뛰고 나머지 평가를 계속한다
            if !auction.has_valid_window() {
                warn!(
                    "{:<12} --> 손상된 경매 레코드 생략: id {}, {} >= {}",
                    "Scheduler", auction.id, auction.start_time, auction.end_time
                );
                continue;
            }

            let Some(target) = lifecycle::evaluate(&auction, now) else {
                continue;
            };

            match self
                .store
                .try_transition(auction.id, auction.status, target)
                .await
            {
                Ok(true) => {
                    info!(
                        "{:<12} --> 상태 전이: 경매 {}, {:?} -> {:?}",
                        "Scheduler", auction.id, auction.status, target
                    );
                    self.publisher
                        .publish(transition_event(&auction, target, now));
                    transitioned += 1;
                }
                Ok(false) => {
                    // 다른 쓰기가 먼저 전이시킨 경우. 다음 패스가 현재
                    // 저장 상태를 기준으로 다시 평가한다.
                    debug!(
                        "{:<12} --> 전이 경합에서 밀림: 경매 {}",
                        "Scheduler", auction.id
                    );
                }
                Err(e) => {
                    // 경매 하나의 오류가 패스 전체를 중단시키지 않는다
                    error!(
                        "{:<12} --> 경매 {} 전이 중 오류: {:?}",
                        "Scheduler", auction.id, e
                    );
                }
            }
        }

        Ok(transitioned)
    }
}

/// 실현된 전이에 대한 이벤트 구성
fn transition_event(auction: &Auction, target: AuctionStatus, now: DateTime<Utc>) -> AuctionEvent {
    let mut snapshot = auction.clone();
    snapshot.status = target;
    snapshot.version = auction.version + 1;
    snapshot.updated_at = now;

    AuctionEvent::LifecycleChanged {
        auction_id: auction.id,
        previous_status: auction.status,
        new_status: target,
        occurred_at: now,
        snapshot,
    }
}

// endregion: --- Lifecycle Scheduler

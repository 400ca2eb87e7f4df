/// 알림 허브 (pub/sub)
/// 경매 id를 키로 하는 룸과 현재 구독 중인 연결 집합을 관리한다.
/// 전송 계층(WebSocket)과 분리되어 있으며, 전달은 연결별 채널로의
/// fire-and-forget 송신이다. 느린 구독자가 다른 구독자나 스케줄러를
/// 지연시키지 않는다.
// region:    --- Imports
use crate::auction::events::AuctionEvent;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

pub mod ws;

// endregion: --- Imports

// region:    --- Event Publisher Trait

/// 이벤트 발행 트레이트
/// 스케줄러와 입찰 경로는 이 인터페이스에만 의존한다.
pub trait EventPublisher: Send + Sync {
    fn publish(&self, event: AuctionEvent);
}

// endregion: --- Event Publisher Trait

// region:    --- Notification Hub

/// 연결 식별자
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(pub u64);

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn_{}", self.0)
    }
}

/// 연결 하나의 허브 측 상태
struct Peer {
    sender: UnboundedSender<AuctionEvent>,
    // 연결 종료 시 모든 룸에서 제거하기 위한 역참조
    joined: HashSet<i64>,
}

#[derive(Default)]
struct HubInner {
    rooms: HashMap<i64, HashSet<ConnectionId>>,
    peers: HashMap<ConnectionId, Peer>,
}

/// 알림 허브
/// 프로세스 시작 시 생성되어 종료까지 유지되는 프로세스 범위 상태.
/// 내부 맵은 잠금으로 보호되며 잠금은 await를 가로지르지 않는다.
#[derive(Default)]
pub struct NotificationHub {
    inner: RwLock<HubInner>,
    next_id: AtomicU64,
}

impl NotificationHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// 연결 등록
    /// 연결 식별자와 이벤트 수신 채널을 돌려준다.
    pub fn register(&self) -> (ConnectionId, UnboundedReceiver<AuctionEvent>) {
        let id = ConnectionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::unbounded_channel();

        let mut inner = self.inner.write().unwrap();
        inner.peers.insert(
            id,
            Peer {
                sender: tx,
                joined: HashSet::new(),
            },
        );
        info!("{:<12} --> 새 연결 등록: {}", "Hub", id);
        (id, rx)
    }

    /// 룸 입장 (멱등)
    /// 이미 입장한 연결을 다시 넣는 것은 no-op이다.
    pub fn subscribe(&self, conn: ConnectionId, auction_id: i64) {
        let mut inner = self.inner.write().unwrap();
        let Some(peer) = inner.peers.get_mut(&conn) else {
            warn!("{:<12} --> 미등록 연결의 입장 요청 무시: {}", "Hub", conn);
            return;
        };
        peer.joined.insert(auction_id);
        inner.rooms.entry(auction_id).or_default().insert(conn);
        info!(
            "{:<12} --> {} 룸 입장: vehicle_{}",
            "Hub", conn, auction_id
        );
    }

    /// 룸 퇴장 (멱등)
    pub fn unsubscribe(&self, conn: ConnectionId, auction_id: i64) {
        let mut inner = self.inner.write().unwrap();
        if let Some(peer) = inner.peers.get_mut(&conn) {
            peer.joined.remove(&auction_id);
        }
        if let Some(room) = inner.rooms.get_mut(&auction_id) {
            room.remove(&conn);
            if room.is_empty() {
                inner.rooms.remove(&auction_id);
            }
        }
        info!(
            "{:<12} --> {} 룸 퇴장: vehicle_{}",
            "Hub", conn, auction_id
        );
    }

    /// 연결 종료 처리
    /// 연결이 입장해 있던 모든 룸에서 동기적으로 제거한다.
    /// 이 호출이 반환된 뒤의 publish는 해당 연결에 도달하지 않는다.
    pub fn connection_closed(&self, conn: ConnectionId) {
        let mut inner = self.inner.write().unwrap();
        let Some(peer) = inner.peers.remove(&conn) else {
            return;
        };
        for auction_id in peer.joined {
            if let Some(room) = inner.rooms.get_mut(&auction_id) {
                room.remove(&conn);
                if room.is_empty() {
                    inner.rooms.remove(&auction_id);
                }
            }
        }
        info!("{:<12} --> 연결 종료: {}", "Hub", conn);
    }

    /// 룸의 현재 구독자 수
    pub fn room_size(&self, auction_id: i64) -> usize {
        let inner = self.inner.read().unwrap();
        inner.rooms.get(&auction_id).map_or(0, |room| room.len())
    }
}

/// 허브의 이벤트 발행 구현
/// 호출 시점에 룸에 있는 연결에게만 전달한다. 이후에 입장한 연결은
/// 이 이벤트를 받지 못하며 현재 상태는 별도로 조회해야 한다.
impl EventPublisher for NotificationHub {
    fn publish(&self, event: AuctionEvent) {
        let auction_id = event.auction_id();
        let inner = self.inner.read().unwrap();
        let Some(room) = inner.rooms.get(&auction_id) else {
            debug!(
                "{:<12} --> 구독자 없는 룸, 발행 생략: vehicle_{}",
                "Hub", auction_id
            );
            return;
        };

        let mut delivered = 0;
        for conn in room {
            let Some(peer) = inner.peers.get(conn) else {
                continue;
            };
            // 한 구독자에 대한 실패가 나머지 전달을 막지 않는다
            if peer.sender.send(event.clone()).is_err() {
                warn!(
                    "{:<12} --> 닫힌 연결로의 전달 실패: {} (vehicle_{})",
                    "Hub", conn, auction_id
                );
            } else {
                delivered += 1;
            }
        }
        info!(
            "{:<12} --> 이벤트 발행: vehicle_{}, 전달 {}건",
            "Hub", auction_id, delivered
        );
    }
}

// endregion: --- Notification Hub

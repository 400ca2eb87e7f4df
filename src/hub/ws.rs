/// WebSocket 전송 계층
/// 허브의 룸 이벤트를 브라우저까지 실어 나른다. 제어 메시지는
/// joinVehicleRoom / leaveVehicleRoom 두 가지이며 차량 id를 키로 한다.
// region:    --- Imports
use crate::hub::NotificationHub;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, warn};

// endregion: --- Imports

// region:    --- Client Messages

/// 클라이언트 제어 메시지
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum ClientMessage {
    #[serde(rename_all = "camelCase")]
    JoinVehicleRoom { vehicle_id: i64 },
    #[serde(rename_all = "camelCase")]
    LeaveVehicleRoom { vehicle_id: i64 },
}

// endregion: --- Client Messages

// region:    --- WebSocket Handler

/// WebSocket 업그레이드 처리
pub async fn handle_ws(ws: WebSocketUpgrade, hub: Arc<NotificationHub>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, hub))
}

/// 연결 하나의 수명 처리
/// 수신 채널을 소켓으로 밀어주는 쓰기 태스크와 제어 메시지를 읽는
/// 루프로 나뉜다. 루프가 끝나면 먼저 모든 룸에서 제거한 뒤 정리한다.
async fn handle_socket(socket: WebSocket, hub: Arc<NotificationHub>) {
    let (conn_id, mut rx) = hub.register();
    let (mut sink, mut stream) = socket.split();

    // 허브 채널 -> 소켓 전달 태스크
    let writer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let payload = match serde_json::to_string(&event) {
                Ok(payload) => payload,
                Err(e) => {
                    error!("{:<12} --> 이벤트 직렬화 오류: {:?}", "Transport", e);
                    continue;
                }
            };
            if sink.send(Message::Text(payload)).await.is_err() {
                break;
            }
        }
    });

    // 제어 메시지 루프
    while let Some(Ok(msg)) = stream.next().await {
        match msg {
            Message::Text(text) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(ClientMessage::JoinVehicleRoom { vehicle_id }) => {
                    hub.subscribe(conn_id, vehicle_id);
                }
                Ok(ClientMessage::LeaveVehicleRoom { vehicle_id }) => {
                    hub.unsubscribe(conn_id, vehicle_id);
                }
                Err(e) => {
                    warn!(
                        "{:<12} --> 해석할 수 없는 제어 메시지: {} ({:?})",
                        "Transport", conn_id, e
                    );
                }
            },
            Message::Close(_) => break,
            _ => {}
        }
    }

    // 이후의 publish가 이 연결에 도달하지 않도록 먼저 제거한다
    hub.connection_closed(conn_id);
    writer.abort();
}

// endregion: --- WebSocket Handler

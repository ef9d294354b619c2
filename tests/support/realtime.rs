//! Loopback Phoenix-channel server standing in for the realtime endpoint.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;

/// Handle to a server that accepts one socket at a time.
///
/// Joins are confirmed and heartbeats acknowledged automatically; frames
/// sent through [`PhoenixServer::push_change`] go to the joined topic.
pub struct PhoenixServer {
    pub url: String,
    pushes: mpsc::UnboundedSender<Value>,
    joins: mpsc::UnboundedReceiver<Value>,
    task: JoinHandle<()>,
}

impl PhoenixServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let (push_tx, push_rx) = mpsc::unbounded_channel();
        let (join_tx, join_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(serve(listener, push_rx, join_tx));

        Self {
            url: format!("http://{addr}"),
            pushes: push_tx,
            joins: join_rx,
            task,
        }
    }

    /// Wait for the next join payload.
    pub async fn joined(&mut self) -> Value {
        tokio::time::timeout(Duration::from_secs(5), self.joins.recv())
            .await
            .expect("no join within 5s")
            .expect("server stopped")
    }

    /// Push a `postgres_changes` frame.
    pub fn push_change(&self, kind: &str, record: Value, old_record: Value) {
        let _ = self.pushes.send(json!({
            "type": kind,
            "record": record,
            "old_record": old_record,
        }));
    }
}

impl Drop for PhoenixServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn serve(
    listener: TcpListener,
    mut pushes: mpsc::UnboundedReceiver<Value>,
    joins: mpsc::UnboundedSender<Value>,
) {
    while let Ok((stream, _)) = listener.accept().await {
        let Ok(ws) = tokio_tungstenite::accept_async(stream).await else {
            continue;
        };
        session(ws, &mut pushes, &joins).await;
    }
}

async fn session(
    mut ws: WebSocketStream<TcpStream>,
    pushes: &mut mpsc::UnboundedReceiver<Value>,
    joins: &mpsc::UnboundedSender<Value>,
) {
    let mut topic: Option<String> = None;

    loop {
        tokio::select! {
            frame = ws.next() => {
                let text = match frame {
                    Some(Ok(Message::Text(text))) => text,
                    Some(Ok(_)) => continue,
                    _ => return,
                };
                let Ok(message) = serde_json::from_str::<Value>(&text) else {
                    continue;
                };
                let event = message["event"].as_str().unwrap_or_default();
                let reply = match event {
                    "phx_join" => {
                        topic = message["topic"].as_str().map(str::to_string);
                        let _ = joins.send(message["payload"].clone());
                        json!({"status": "ok", "response": {"postgres_changes": []}})
                    }
                    "heartbeat" | "phx_leave" => json!({"status": "ok", "response": {}}),
                    _ => continue,
                };
                let frame = json!({
                    "topic": message["topic"],
                    "event": "phx_reply",
                    "ref": message["ref"],
                    "payload": reply,
                });
                if ws.send(Message::Text(frame.to_string())).await.is_err() {
                    return;
                }
            }
            Some(data) = pushes.recv(), if topic.is_some() => {
                let frame = json!({
                    "topic": topic,
                    "event": "postgres_changes",
                    "ref": null,
                    "payload": {"data": data, "ids": [1]},
                });
                if ws.send(Message::Text(frame.to_string())).await.is_err() {
                    return;
                }
            }
        }
    }
}

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};
use url::Url;

use super::{RealtimeEvent, RealtimeSource, Subscription};
use crate::config::BackendConfig;
use crate::error::{ParlorError, ParlorResult};

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(20);
const EVENT_BUFFER: usize = 64;

/// Websocket subscriber for the backend's realtime endpoint.
#[derive(Debug, Clone)]
pub struct AppwriteRealtime {
    endpoint: String,
    project_id: String,
}

#[derive(Debug, Deserialize)]
struct Frame {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Value,
}

impl AppwriteRealtime {
    pub fn new(config: &BackendConfig) -> Self {
        Self {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            project_id: config.project_id.clone(),
        }
    }

    /// `https://host/v1` becomes `wss://host/v1/realtime?project=..&channels[]=..`.
    pub fn socket_url(&self, channels: &[String]) -> ParlorResult<Url> {
        let base = if let Some(rest) = self.endpoint.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = self.endpoint.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            self.endpoint.clone()
        };

        let mut url = Url::parse(&format!("{}/realtime", base))
            .map_err(|e| ParlorError::RealtimeConnectionFailed(e.to_string()))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("project", &self.project_id);
            for channel in channels {
                pairs.append_pair("channels[]", channel);
            }
        }
        Ok(url)
    }
}

/// Decodes one text frame into an event, ignoring control frames.
pub fn parse_frame(text: &str) -> Option<RealtimeEvent> {
    let frame: Frame = match serde_json::from_str(text) {
        Ok(f) => f,
        Err(e) => {
            debug!("Ignoring undecodable realtime frame: {}", e);
            return None;
        }
    };
    match frame.kind.as_str() {
        "event" => serde_json::from_value(frame.data).ok(),
        "error" => {
            warn!(data = %frame.data, "Realtime endpoint reported an error");
            None
        }
        "connected" => {
            debug!(data = %frame.data, "Realtime connected");
            None
        }
        _ => None,
    }
}

#[async_trait]
impl RealtimeSource for AppwriteRealtime {
    async fn subscribe(&self, channels: Vec<String>) -> ParlorResult<Subscription> {
        let url = self.socket_url(&channels)?;
        let (socket, _) = connect_async(url.as_str()).await?;
        info!(channels = channels.len(), "Realtime subscription opened");

        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let (mut sink, mut stream) = socket.split();

        let task = tokio::spawn(async move {
            let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
            heartbeat.tick().await;

            loop {
                tokio::select! {
                    frame = stream.next() => {
                        match frame {
                            Some(Ok(Message::Text(text))) => {
                                if let Some(event) = parse_frame(&text) {
                                    if tx.send(event).await.is_err() {
                                        break;
                                    }
                                }
                            }
                            Some(Ok(Message::Close(_))) | None => {
                                debug!("Realtime socket closed");
                                break;
                            }
                            Some(Ok(_)) => {}
                            Some(Err(e)) => {
                                warn!("Realtime socket error: {}", e);
                                break;
                            }
                        }
                    }
                    _ = heartbeat.tick() => {
                        let ping = json!({ "type": "ping" }).to_string();
                        if sink.send(Message::Text(ping.into())).await.is_err() {
                            break;
                        }
                    }
                    _ = tx.closed() => break,
                }
            }
            let _ = sink.close().await;
        });

        Ok(Subscription::new(rx, Some(task)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_url() {
        let mut config = BackendConfig::default();
        config.project_id = "proj".to_string();
        let realtime = AppwriteRealtime::new(&config);
        let url = realtime
            .socket_url(&["databases.chat.collections.messages.documents".to_string()])
            .unwrap();
        assert_eq!(url.scheme(), "wss");
        assert_eq!(url.path(), "/v1/realtime");
        let query = url.query().unwrap_or_default();
        assert!(query.contains("project=proj"));
        assert!(query.contains("channels%5B%5D=databases.chat.collections.messages.documents"));
    }

    #[test]
    fn test_parse_frame() {
        let text = r#"{"type":"event","data":{"events":["databases.chat.collections.messages.documents.m1.create"],"channels":["databases.chat.collections.messages.documents"],"timestamp":"2025-08-26 09:12:44.123","payload":{"$id":"m1","chatRoomId":"r1"}}}"#;
        let event = parse_frame(text).unwrap();
        assert!(event.concerns_room("r1"));
        assert_eq!(event.events.len(), 1);

        assert!(parse_frame(r#"{"type":"connected","data":{"channels":[]}}"#).is_none());
        assert!(parse_frame(r#"{"type":"pong"}"#).is_none());
        assert!(parse_frame("garbage").is_none());
    }
}

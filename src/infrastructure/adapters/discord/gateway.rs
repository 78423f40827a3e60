//! Minimal Discord gateway client
//!
//! Covers the parts of the protocol needed to receive messages: Hello,
//! Identify, Resume, heartbeats and the `READY` / `RESUMED` /
//! `MESSAGE_CREATE` dispatches. When Discord recycles or drops the
//! connection, `next_event` yields `GatewayEvent::Reconnect` and the caller
//! opens a new session, resuming when it can.

use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio::time::{interval_at, Duration, Instant, Interval};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use super::{DiscordMessage, DiscordUser};
use crate::application::errors::BotError;
use crate::domain::entities::Message;
use crate::domain::traits::BotInfo;

/// Gateway endpoint, API v10 with JSON encoding
pub const GATEWAY_URL: &str = "wss://gateway.discord.gg/?v=10&encoding=json";

/// GUILD_MESSAGES | MESSAGE_CONTENT
pub const INTENTS: u64 = (1 << 9) | (1 << 15);

const OP_DISPATCH: u8 = 0;
const OP_HEARTBEAT: u8 = 1;
const OP_IDENTIFY: u8 = 2;
const OP_RESUME: u8 = 6;
const OP_RECONNECT: u8 = 7;
const OP_INVALID_SESSION: u8 = 9;
const OP_HELLO: u8 = 10;
const OP_HEARTBEAT_ACK: u8 = 11;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Gateway payload envelope
#[derive(Debug, Deserialize)]
struct Payload {
    op: u8,
    #[serde(default)]
    d: Option<Value>,
    #[serde(default)]
    s: Option<u64>,
    #[serde(default)]
    t: Option<String>,
}

/// Events surfaced to the bot loop
#[derive(Debug)]
pub enum GatewayEvent {
    Ready(BotInfo),
    Resumed,
    MessageCreate(Message),
    /// The connection is finished; open a new one, resuming if `resumable`
    Reconnect { resumable: bool },
}

/// What a new connection needs to pick up where an old one stopped
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub session_id: String,
    pub resume_url: String,
    pub sequence: Option<u64>,
}

/// A live gateway connection
pub struct Gateway {
    stream: WsStream,
    heartbeat: Interval,
    sequence: Option<u64>,
    awaiting_ack: bool,
    session_id: Option<String>,
    resume_url: Option<String>,
    closed: bool,
}

impl Gateway {
    /// Connect, wait for Hello and identify
    pub async fn connect(url: &str, token: &str, intents: u64) -> Result<Self, BotError> {
        let mut gateway = Self::open(url).await?;
        gateway.send(identify_payload(token, intents)).await?;
        Ok(gateway)
    }

    /// Connect to the session's resume URL and replay from its last sequence
    pub async fn resume(session: &Session, token: &str) -> Result<Self, BotError> {
        let url = format!("{}/?v=10&encoding=json", session.resume_url.trim_end_matches('/'));
        let mut gateway = Self::open(&url).await?;
        gateway.sequence = session.sequence;
        gateway.session_id = Some(session.session_id.clone());
        gateway.resume_url = Some(session.resume_url.clone());
        gateway.send(resume_payload(token, session)).await?;
        Ok(gateway)
    }

    async fn open(url: &str) -> Result<Self, BotError> {
        let (mut stream, _) = connect_async(url)
            .await
            .map_err(|e| BotError::Gateway(e.to_string()))?;

        let hello = loop {
            match stream.next().await {
                Some(Ok(WsMessage::Text(text))) => break parse_payload(&text)?,
                Some(Ok(WsMessage::Close(frame))) => {
                    return Err(BotError::Gateway(format!("Closed before hello: {:?}", frame)));
                }
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(BotError::Gateway(e.to_string())),
                None => return Err(BotError::Gateway("Closed before hello".to_string())),
            }
        };

        let period = heartbeat_interval(&hello)?;
        tracing::debug!("Gateway hello, heartbeat every {:?}", period);

        Ok(Self {
            stream,
            heartbeat: interval_at(Instant::now() + period, period),
            sequence: None,
            awaiting_ack: false,
            session_id: None,
            resume_url: None,
            closed: false,
        })
    }

    /// Resume state, known once `READY` has been received
    pub fn session(&self) -> Option<Session> {
        Some(Session {
            session_id: self.session_id.clone()?,
            resume_url: self.resume_url.clone()?,
            sequence: self.sequence,
        })
    }

    async fn send(&mut self, payload: Value) -> Result<(), BotError> {
        self.stream
            .send(WsMessage::Text(payload.to_string()))
            .await
            .map_err(|e| BotError::Gateway(e.to_string()))
    }

    async fn send_heartbeat(&mut self) -> Result<(), BotError> {
        let payload = json!({ "op": OP_HEARTBEAT, "d": self.sequence });
        self.awaiting_ack = true;
        self.send(payload).await
    }

    /// Wait for the next event, answering heartbeats in between.
    ///
    /// Errors only on close codes that a new connection cannot fix.
    pub async fn next_event(&mut self) -> Result<GatewayEvent, BotError> {
        loop {
            let frame = tokio::select! {
                _ = self.heartbeat.tick() => None,
                frame = self.stream.next() => Some(frame),
            };

            let Some(frame) = frame else {
                if self.awaiting_ack {
                    tracing::warn!("Heartbeat was not acknowledged");
                    return Ok(GatewayEvent::Reconnect { resumable: true });
                }
                if let Err(e) = self.send_heartbeat().await {
                    tracing::warn!("Failed to send heartbeat: {}", e);
                    return Ok(GatewayEvent::Reconnect { resumable: true });
                }
                continue;
            };

            match frame {
                None => {
                    tracing::warn!("Gateway stream ended");
                    return Ok(GatewayEvent::Reconnect { resumable: true });
                }
                Some(Err(e)) => {
                    tracing::warn!("Gateway connection error: {}", e);
                    return Ok(GatewayEvent::Reconnect { resumable: true });
                }
                Some(Ok(WsMessage::Close(frame))) => {
                    tracing::warn!("Gateway closed by server: {:?}", frame);
                    return close_event(frame.as_ref());
                }
                Some(Ok(WsMessage::Text(text))) => match parse_payload(&text) {
                    Ok(payload) => {
                        if let Some(event) = self.handle_payload(payload).await {
                            return Ok(event);
                        }
                    }
                    Err(e) => tracing::warn!("Skipping malformed gateway payload: {}", e),
                },
                Some(Ok(_)) => {}
            }
        }
    }

    async fn handle_payload(&mut self, payload: Payload) -> Option<GatewayEvent> {
        if let Some(seq) = payload.s {
            self.sequence = Some(seq);
        }

        match payload.op {
            OP_DISPATCH => {
                if payload.t.as_deref() == Some("READY") {
                    self.remember_session(payload.d.as_ref());
                }
                parse_dispatch(payload.t.as_deref(), payload.d)
            }
            OP_HEARTBEAT => match self.send_heartbeat().await {
                Ok(()) => None,
                Err(e) => {
                    tracing::warn!("Failed to send heartbeat: {}", e);
                    Some(GatewayEvent::Reconnect { resumable: true })
                }
            },
            OP_HEARTBEAT_ACK => {
                self.awaiting_ack = false;
                None
            }
            OP_RECONNECT => {
                tracing::info!("Gateway requested reconnect");
                Some(GatewayEvent::Reconnect { resumable: true })
            }
            OP_INVALID_SESSION => {
                let resumable = payload.d.as_ref().and_then(Value::as_bool).unwrap_or(false);
                tracing::warn!("Gateway session invalidated (resumable: {})", resumable);
                Some(GatewayEvent::Reconnect { resumable })
            }
            other => {
                tracing::debug!("Ignoring gateway opcode {}", other);
                None
            }
        }
    }

    fn remember_session(&mut self, data: Option<&Value>) {
        let field = |name: &str| {
            data.and_then(|d| d.get(name))
                .and_then(Value::as_str)
                .map(str::to_string)
        };
        self.session_id = field("session_id");
        self.resume_url = field("resume_gateway_url");
    }

    /// Close the connection with a normal close frame, ending the session
    pub async fn close(&mut self) -> Result<(), BotError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let frame = CloseFrame {
            code: CloseCode::Normal,
            reason: "".into(),
        };
        self.stream
            .close(Some(frame))
            .await
            .map_err(|e| BotError::Gateway(e.to_string()))
    }
}

fn parse_payload(text: &str) -> Result<Payload, BotError> {
    serde_json::from_str(text).map_err(|e| BotError::Parse(e.to_string()))
}

fn heartbeat_interval(hello: &Payload) -> Result<Duration, BotError> {
    if hello.op != OP_HELLO {
        return Err(BotError::Gateway(format!("Expected hello, got opcode {}", hello.op)));
    }
    hello
        .d
        .as_ref()
        .and_then(|d| d.get("heartbeat_interval"))
        .and_then(Value::as_u64)
        .map(Duration::from_millis)
        .ok_or_else(|| BotError::Parse("Hello without heartbeat_interval".to_string()))
}

fn identify_payload(token: &str, intents: u64) -> Value {
    json!({
        "op": OP_IDENTIFY,
        "d": {
            "token": token,
            "intents": intents,
            "properties": {
                "os": std::env::consts::OS,
                "browser": env!("CARGO_PKG_NAME"),
                "device": env!("CARGO_PKG_NAME"),
            }
        }
    })
}

fn resume_payload(token: &str, session: &Session) -> Value {
    json!({
        "op": OP_RESUME,
        "d": {
            "token": token,
            "session_id": session.session_id,
            "seq": session.sequence,
        }
    })
}

/// Map a server close frame to the next step.
///
/// 4004 (bad token) and 4010-4014 (bad shard, version or intents) are fatal.
/// 4007 and 4009 invalidate the session; anything else can be resumed.
fn close_event(frame: Option<&CloseFrame<'_>>) -> Result<GatewayEvent, BotError> {
    let Some(frame) = frame else {
        return Ok(GatewayEvent::Reconnect { resumable: true });
    };

    match u16::from(frame.code) {
        4004 => Err(BotError::Auth("Gateway rejected the bot token".to_string())),
        code @ 4010..=4014 => Err(BotError::Gateway(format!(
            "Gateway closed with code {}: {}",
            code, frame.reason
        ))),
        4007 | 4009 => Ok(GatewayEvent::Reconnect { resumable: false }),
        _ => Ok(GatewayEvent::Reconnect { resumable: true }),
    }
}

/// Map a dispatch to an event; unknown or malformed dispatches are dropped
fn parse_dispatch(event: Option<&str>, data: Option<Value>) -> Option<GatewayEvent> {
    #[derive(Deserialize)]
    struct Ready {
        user: DiscordUser,
    }

    match event? {
        "READY" => match serde_json::from_value::<Ready>(data?) {
            Ok(ready) => Some(GatewayEvent::Ready(ready.user.to_bot_info())),
            Err(e) => {
                tracing::warn!("Malformed READY payload: {}", e);
                None
            }
        },
        "RESUMED" => Some(GatewayEvent::Resumed),
        "MESSAGE_CREATE" => match serde_json::from_value::<DiscordMessage>(data?) {
            Ok(message) => Some(GatewayEvent::MessageCreate(message.into_message())),
            Err(e) => {
                tracing::warn!("Malformed MESSAGE_CREATE payload: {}", e);
                None
            }
        },
        _ => None,
    }
}

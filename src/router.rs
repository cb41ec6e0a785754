use crate::channels::MessagingPlatform;
use crate::error::{Error, KindScope, Result};
use crate::resolver::ReplyResolver;
use crate::types::{EventKind, InboundEvent, InboundMessage, OutboundMessage, ReplyMessage};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use percent_encoding::percent_decode_str;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

#[derive(Debug)]
pub struct BatchOutcome {
    pub batch_id: Uuid,
    pub results: Vec<Result<Value>>,
}

impl BatchOutcome {
    pub fn is_success(&self) -> bool {
        self.results.iter().all(|r| r.is_ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = (usize, &Error)> {
        self.results
            .iter()
            .enumerate()
            .filter_map(|(idx, r)| r.as_ref().err().map(|err| (idx, err)))
    }

    pub fn into_values(self) -> Option<Vec<Value>> {
        self.results.into_iter().collect::<Result<Vec<_>>>().ok()
    }
}

#[derive(Clone)]
pub struct EventRouter {
    resolver: ReplyResolver,
    platform: Arc<dyn MessagingPlatform>,
    max_concurrency: usize,
    event_timeout: Option<Duration>,
}

impl EventRouter {
    pub fn new(resolver: ReplyResolver, platform: Arc<dyn MessagingPlatform>) -> Self {
        Self {
            resolver,
            platform,
            max_concurrency: 16,
            event_timeout: None,
        }
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    pub fn with_event_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.event_timeout = timeout;
        self
    }

    pub fn resolver(&self) -> &ReplyResolver {
        &self.resolver
    }

    pub async fn dispatch(&self, events: Vec<Value>) -> BatchOutcome {
        let batch_id = Uuid::new_v4();
        info!(%batch_id, events = events.len(), "webhook batch received");

        let results = stream::iter(events.into_iter().enumerate())
            .map(|(index, raw)| {
                self.handle_with_deadline(raw)
                    .instrument(info_span!("event", %batch_id, index))
            })
            .buffered(self.max_concurrency)
            .collect::<Vec<_>>()
            .await;

        let outcome = BatchOutcome { batch_id, results };
        for (index, err) in outcome.failures() {
            error!(%batch_id, index, "event failed: {err}");
        }
        outcome
    }

    async fn handle_with_deadline(&self, raw: Value) -> Result<Value> {
        match self.event_timeout {
            Some(limit) => tokio::time::timeout(limit, self.handle_event(raw))
                .await
                .map_err(|_| Error::Timeout {
                    after_ms: limit.as_millis() as u64,
                })?,
            None => self.handle_event(raw).await,
        }
    }

    /// Returns the platform's reply response, or `null` when nothing was sent.
    pub async fn handle_event(&self, raw: Value) -> Result<Value> {
        // Verification requests are acknowledged before decoding, whatever their shape.
        if let Some(token) = raw
            .get("replyToken")
            .and_then(Value::as_str)
            .filter(|t| is_probe_token(t))
        {
            let message = raw.get("message").cloned().unwrap_or_default();
            info!(reply_token = token, %message, "test hook received");
            return Ok(Value::Null);
        }

        let event = InboundEvent::deserialize(&raw)?;

        let source_kind = event.source.as_ref().map(|s| s.kind()).unwrap_or("none");
        let user_id = event
            .source
            .as_ref()
            .and_then(|s| s.user_id())
            .unwrap_or("-");
        let received_at = event
            .timestamp
            .and_then(DateTime::<Utc>::from_timestamp_millis);
        info!(
            source = source_kind,
            user_id,
            kind = event.kind.name(),
            redelivery = event.is_redelivery(),
            received_at = ?received_at,
            "dispatching event"
        );

        let result = self.handle(&event, &raw).await;
        if let Err(Error::UnrecognizedKind { scope, kind }) = &result {
            warn!(%scope, kind = %kind, event = %raw, "unrecognized kind");
        }
        result
    }

    async fn handle(&self, event: &InboundEvent, raw: &Value) -> Result<Value> {
        let source_kind = event.source.as_ref().map(|s| s.kind()).unwrap_or("unknown");
        match &event.kind {
            EventKind::Message { message } => {
                if let InboundMessage::Unknown = message {
                    return Err(Error::unrecognized(
                        KindScope::Message,
                        type_tag(raw.get("message")),
                    ));
                }
                let messages = self.resolver.resolve(message).await?;
                self.reply(event, messages).await
            }
            EventKind::Follow => self.reply_text(event, "Got followed event").await,
            EventKind::Unfollow => {
                info!("unfollowed");
                Ok(Value::Null)
            }
            EventKind::Join => self.reply_text(event, format!("Joined {source_kind}")).await,
            EventKind::Leave => {
                info!("left");
                Ok(Value::Null)
            }
            EventKind::MemberJoined { joined } => {
                info!(members = joined.members.len(), "members joined");
                self.reply_text(event, format!("MemberJoined {source_kind}"))
                    .await
            }
            EventKind::MemberLeft { left } => {
                info!(members = left.members.len(), "members left");
                Ok(Value::Null)
            }
            EventKind::Postback { postback } => {
                let data = parse_postback_data(&postback.data);
                let rendered = serde_json::to_string(&data)?;
                self.reply_text(event, format!("Got postback: {rendered}"))
                    .await
            }
            EventKind::Beacon { beacon } => {
                self.reply_text(event, format!("Got beacon: {}", beacon.hwid))
                    .await
            }
            EventKind::Unknown => Err(Error::unrecognized(KindScope::Event, type_tag(Some(raw)))),
        }
    }

    async fn reply_text(&self, event: &InboundEvent, text: impl Into<String>) -> Result<Value> {
        self.reply(event, vec![OutboundMessage::text(text).into()])
            .await
    }

    async fn reply(&self, event: &InboundEvent, messages: Vec<ReplyMessage>) -> Result<Value> {
        let token = event
            .reply_token
            .as_deref()
            .ok_or_else(|| Error::reply_delivery(None, "event carries no reply token"))?;
        self.platform.reply(token, &messages).await
    }
}

fn type_tag(value: Option<&Value>) -> &str {
    value
        .and_then(|v| v.get("type"))
        .and_then(Value::as_str)
        .unwrap_or("<missing>")
}

/// A reply token made of one repeated character marks a platform
/// verification request. Line terminators never count as that character.
pub fn is_probe_token(token: &str) -> bool {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) => !is_line_terminator(first) && chars.all(|c| c == first),
        None => false,
    }
}

fn is_line_terminator(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

/// Parses `a=1&b=2&a=3` into `{"a": ["1", "3"], "b": "2"}`, keeping first-seen
/// key order.
pub fn parse_postback_data(data: &str) -> Map<String, Value> {
    let mut out = Map::new();
    for pair in data.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        let key = decode_component(key);
        let value = Value::String(decode_component(value));
        match out.get_mut(&key) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                out.insert(key, value);
            }
        }
    }
    out
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}

pub mod line;

use crate::error::Result;
use crate::types::ReplyMessage;
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use serde_json::Value;

pub type ContentStream = BoxStream<'static, Result<Bytes>>;

/// The two platform operations the responder needs.
#[async_trait]
pub trait MessagingPlatform: Send + Sync {
    async fn reply(&self, reply_token: &str, messages: &[ReplyMessage]) -> Result<Value>;

    async fn content(&self, message_id: &str) -> Result<ContentStream>;
}

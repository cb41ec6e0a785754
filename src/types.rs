//! Wire types for LINE webhook batches and reply payloads.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of one webhook delivery. Events stay raw so each one decodes
/// independently and a bad event only fails itself.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookBody {
    #[serde(default)]
    pub destination: Option<String>,
    pub events: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InboundEvent {
    #[serde(rename = "replyToken", default)]
    pub reply_token: Option<String>,
    #[serde(default)]
    pub source: Option<Source>,
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(rename = "webhookEventId", default)]
    pub webhook_event_id: Option<String>,
    #[serde(rename = "deliveryContext", default)]
    pub delivery_context: Option<DeliveryContext>,
    #[serde(flatten)]
    pub kind: EventKind,
}

impl InboundEvent {
    pub fn is_redelivery(&self) -> bool {
        self.delivery_context
            .as_ref()
            .map(|ctx| ctx.is_redelivery)
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EventKind {
    Message { message: InboundMessage },
    Follow,
    Unfollow,
    Join,
    Leave,
    MemberJoined { joined: Members },
    MemberLeft { left: Members },
    Postback { postback: Postback },
    Beacon { beacon: Beacon },
    #[serde(other)]
    Unknown,
}

impl EventKind {
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::Message { .. } => "message",
            EventKind::Follow => "follow",
            EventKind::Unfollow => "unfollow",
            EventKind::Join => "join",
            EventKind::Leave => "leave",
            EventKind::MemberJoined { .. } => "memberJoined",
            EventKind::MemberLeft { .. } => "memberLeft",
            EventKind::Postback { .. } => "postback",
            EventKind::Beacon { .. } => "beacon",
            EventKind::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DeliveryContext {
    #[serde(rename = "isRedelivery", default)]
    pub is_redelivery: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Source {
    User {
        #[serde(rename = "userId", default)]
        user_id: Option<String>,
    },
    Group {
        #[serde(rename = "groupId")]
        group_id: String,
        #[serde(rename = "userId", default)]
        user_id: Option<String>,
    },
    Room {
        #[serde(rename = "roomId")]
        room_id: String,
        #[serde(rename = "userId", default)]
        user_id: Option<String>,
    },
}

impl Source {
    pub fn kind(&self) -> &'static str {
        match self {
            Source::User { .. } => "user",
            Source::Group { .. } => "group",
            Source::Room { .. } => "room",
        }
    }

    pub fn user_id(&self) -> Option<&str> {
        match self {
            Source::User { user_id } | Source::Group { user_id, .. } | Source::Room { user_id, .. } => {
                user_id.as_deref()
            }
        }
    }

    pub fn target_id(&self) -> Option<&str> {
        match self {
            Source::User { user_id } => user_id.as_deref(),
            Source::Group { group_id, .. } => Some(group_id.as_str()),
            Source::Room { room_id, .. } => Some(room_id.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Members {
    #[serde(default)]
    pub members: Vec<Source>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Postback {
    pub data: String,
    #[serde(default)]
    pub params: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Beacon {
    pub hwid: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub dm: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InboundMessage {
    Text {
        id: String,
        text: String,
    },
    Image {
        id: String,
        #[serde(rename = "contentProvider")]
        content_provider: ContentProvider,
    },
    Video {
        id: String,
        #[serde(default)]
        duration: Option<u64>,
        #[serde(rename = "contentProvider")]
        content_provider: ContentProvider,
    },
    Audio {
        id: String,
        #[serde(default)]
        duration: Option<u64>,
        #[serde(rename = "contentProvider")]
        content_provider: ContentProvider,
    },
    Location {
        id: String,
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        address: Option<String>,
        latitude: f64,
        longitude: f64,
    },
    Sticker {
        id: String,
        #[serde(rename = "packageId")]
        package_id: String,
        #[serde(rename = "stickerId")]
        sticker_id: String,
    },
    #[serde(other)]
    Unknown,
}

impl InboundMessage {
    pub fn name(&self) -> &'static str {
        match self {
            InboundMessage::Text { .. } => "text",
            InboundMessage::Image { .. } => "image",
            InboundMessage::Video { .. } => "video",
            InboundMessage::Audio { .. } => "audio",
            InboundMessage::Location { .. } => "location",
            InboundMessage::Sticker { .. } => "sticker",
            InboundMessage::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ContentProvider {
    Line,
    External {
        #[serde(rename = "originalContentUrl")]
        original_content_url: String,
        #[serde(rename = "previewImageUrl", default)]
        preview_image_url: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum OutboundMessage {
    Text {
        text: String,
    },
    Image {
        #[serde(rename = "originalContentUrl")]
        original_content_url: String,
        #[serde(rename = "previewImageUrl")]
        preview_image_url: String,
    },
    Video {
        #[serde(rename = "originalContentUrl")]
        original_content_url: String,
        #[serde(rename = "previewImageUrl")]
        preview_image_url: String,
    },
    Audio {
        #[serde(rename = "originalContentUrl")]
        original_content_url: String,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        duration: Option<u64>,
    },
    Location {
        #[serde(skip_serializing_if = "Option::is_none", default)]
        title: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        address: Option<String>,
        latitude: f64,
        longitude: f64,
    },
    Sticker {
        #[serde(rename = "packageId")]
        package_id: String,
        #[serde(rename = "stickerId")]
        sticker_id: String,
    },
}

impl OutboundMessage {
    pub fn text(text: impl Into<String>) -> Self {
        OutboundMessage::Text { text: text.into() }
    }
}

/// One entry of a reply: either built here or taken verbatim from the catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ReplyMessage {
    Built(OutboundMessage),
    Catalog(Value),
}

impl From<OutboundMessage> for ReplyMessage {
    fn from(message: OutboundMessage) -> Self {
        ReplyMessage::Built(message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentDescriptor {
    Rehosted {
        original: String,
        preview: Option<String>,
    },
    External {
        original: String,
        preview: Option<String>,
    },
}

impl ContentDescriptor {
    pub fn original(&self) -> &str {
        match self {
            ContentDescriptor::Rehosted { original, .. }
            | ContentDescriptor::External { original, .. } => original,
        }
    }

    pub fn preview(&self) -> Option<&str> {
        match self {
            ContentDescriptor::Rehosted { preview, .. }
            | ContentDescriptor::External { preview, .. } => preview.as_deref(),
        }
    }

    pub fn is_rehosted(&self) -> bool {
        matches!(self, ContentDescriptor::Rehosted { .. })
    }
}

use crate::catalog::ReplyCatalog;
use crate::channels::MessagingPlatform;
use crate::error::{Error, KindScope, Result};
use crate::media::{MediaKind, MediaStore};
use crate::types::{ContentDescriptor, ContentProvider, InboundMessage, OutboundMessage, ReplyMessage};
use std::sync::Arc;
use tracing::debug;

#[derive(Clone)]
pub struct ReplyResolver {
    catalog: Arc<ReplyCatalog>,
    media: MediaStore,
    platform: Arc<dyn MessagingPlatform>,
    video_preview_url: String,
}

impl ReplyResolver {
    pub fn new(
        catalog: Arc<ReplyCatalog>,
        media: MediaStore,
        platform: Arc<dyn MessagingPlatform>,
        video_preview_url: impl Into<String>,
    ) -> Self {
        Self {
            catalog,
            media,
            platform,
            video_preview_url: video_preview_url.into(),
        }
    }

    pub fn catalog(&self) -> &ReplyCatalog {
        &self.catalog
    }

    pub async fn resolve(&self, message: &InboundMessage) -> Result<Vec<ReplyMessage>> {
        let reply = match message {
            InboundMessage::Text { text, .. } => return Ok(self.resolve_text(text)),
            InboundMessage::Image {
                id,
                content_provider,
            } => {
                let content = self.resolve_content(id, MediaKind::Image, content_provider).await?;
                let original = content.original().to_string();
                OutboundMessage::Image {
                    preview_image_url: content.preview().unwrap_or(&original).to_string(),
                    original_content_url: original,
                }
            }
            InboundMessage::Video {
                id,
                content_provider,
                ..
            } => {
                let content = self.resolve_content(id, MediaKind::Video, content_provider).await?;
                OutboundMessage::Video {
                    original_content_url: content.original().to_string(),
                    preview_image_url: content
                        .preview()
                        .unwrap_or(&self.video_preview_url)
                        .to_string(),
                }
            }
            InboundMessage::Audio {
                id,
                duration,
                content_provider,
            } => {
                let content = self.resolve_content(id, MediaKind::Audio, content_provider).await?;
                OutboundMessage::Audio {
                    original_content_url: content.original().to_string(),
                    duration: *duration,
                }
            }
            InboundMessage::Location {
                title,
                address,
                latitude,
                longitude,
                ..
            } => OutboundMessage::Location {
                title: title.clone(),
                address: address.clone(),
                latitude: *latitude,
                longitude: *longitude,
            },
            InboundMessage::Sticker {
                package_id,
                sticker_id,
                ..
            } => OutboundMessage::Sticker {
                package_id: package_id.clone(),
                sticker_id: sticker_id.clone(),
            },
            InboundMessage::Unknown => {
                return Err(Error::unrecognized(KindScope::Message, message.name()))
            }
        };
        Ok(vec![reply.into()])
    }

    pub fn resolve_text(&self, text: &str) -> Vec<ReplyMessage> {
        match self.catalog.lookup(text) {
            Some(payloads) => {
                debug!(key = %text, messages = payloads.len(), "catalog reply");
                payloads.iter().cloned().map(ReplyMessage::Catalog).collect()
            }
            None => {
                debug!(text = %text, "echo reply");
                vec![OutboundMessage::text(text).into()]
            }
        }
    }

    pub async fn resolve_content(
        &self,
        message_id: &str,
        kind: MediaKind,
        provider: &ContentProvider,
    ) -> Result<ContentDescriptor> {
        match provider {
            ContentProvider::Line => {
                crate::media::ensure_file_token(message_id)?;
                let stream = self.platform.content(message_id).await?;
                let path = self.media.persist(message_id, kind, stream).await?;
                let url = self.media.public_url(&path)?;
                debug!(message_id, path = %path.display(), "content rehosted");
                let preview = match kind {
                    MediaKind::Image => Some(url.clone()),
                    MediaKind::Video => Some(self.video_preview_url.clone()),
                    MediaKind::Audio => None,
                };
                Ok(ContentDescriptor::Rehosted {
                    original: url,
                    preview,
                })
            }
            ContentProvider::External {
                original_content_url,
                preview_image_url,
            } => Ok(ContentDescriptor::External {
                original: original_content_url.clone(),
                preview: preview_image_url.clone(),
            }),
        }
    }
}

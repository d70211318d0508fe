// src/services/message.rs
use crate::{
    config::{MessageConfig, UrlPolicy},
    types::{GifResult, MessageError, MessageInfo, OutboundMessage, Provenance},
};
use tokio::sync::mpsc;

/// One-way delivery of sticker messages to the host.
pub trait StickerSink: Send + Sync {
    fn send(&self, message: OutboundMessage);
}

/// Hands messages to whoever holds the receiving end.
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<OutboundMessage>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::UnboundedSender<OutboundMessage>) -> Self {
        Self { tx }
    }
}

impl StickerSink for ChannelSink {
    fn send(&self, message: OutboundMessage) {
        let id = message.id.clone();
        if self.tx.send(message).is_err() {
            tracing::warn!(%id, "sticker receiver closed, message dropped");
        }
    }
}

/// Maps a selected result back to the fields of its provider.
pub struct MessageBuilder {
    config: MessageConfig,
}

impl MessageBuilder {
    pub fn new(config: MessageConfig) -> Self {
        Self { config }
    }

    /// Build the sticker message for `result`. `media_prefix` is the prefix
    /// configured for the result's provider.
    pub fn build(
        &self,
        result: &GifResult,
        media_prefix: &str,
    ) -> Result<OutboundMessage, MessageError> {
        let invalid = || MessageError::InvalidMedia {
            id: result.id.clone(),
        };

        let variant = match result.provenance {
            Provenance::Giphy => result.variant("original"),
            Provenance::Tenor => result.variants.first(),
        }
        .ok_or_else(invalid)?;

        let (Some(w), Some(h), Some(size)) = (variant.width, variant.height, variant.byte_size)
        else {
            return Err(invalid());
        };

        let url = match self.config.url_policy {
            UrlPolicy::MediaPrefix if !media_prefix.is_empty() && !result.id.is_empty() => {
                format!("{}{}", media_prefix, result.id)
            }
            UrlPolicy::MediaPrefix => return Err(invalid()),
            UrlPolicy::Direct => variant.url.clone(),
        };
        if url.is_empty() {
            return Err(invalid());
        }

        Ok(OutboundMessage {
            body: result.label().to_string(),
            info: MessageInfo {
                h,
                w,
                size,
                mimetype: self.config.mimetype.as_str().to_string(),
            },
            msgtype: self.config.msgtype.as_str().to_string(),
            url,
            id: result.id.clone(),
            filename: format!("{}.{}", result.id, self.config.mimetype.extension()),
        })
    }

    pub fn can_build(&self, result: &GifResult, media_prefix: &str) -> bool {
        self.build(result, media_prefix).is_ok()
    }
}

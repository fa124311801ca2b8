use parity_scale_codec::{DecodeAll, Encode};
use sha2::{Digest, Sha256};

use super::error::MessageError;
use super::types::{Message, MessageId, MilestoneIndex, MilestonePayload};
use super::validation::{self, DeserializationMode, MAX_MESSAGE_LENGTH};

/// A message whose wire form has been fixed.
///
/// Fresh messages are only sealed by the builder, after proof of work has
/// completed. Stored or received messages are sealed again through
/// [`SealedMessage::from_bytes`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedMessage {
    id: MessageId,
    message: Message,
    bytes: Vec<u8>,
}

impl SealedMessage {
    /// Seal a message that just finished proof of work.
    ///
    /// The message goes through the same decode path a peer would use, so a
    /// structurally broken message never leaves the builder.
    pub(crate) fn seal(message: Message, mode: DeserializationMode) -> Result<Self, MessageError> {
        Self::from_bytes(message.encode(), mode)
    }

    /// Decode a message from its wire bytes
    pub fn from_bytes(bytes: Vec<u8>, mode: DeserializationMode) -> Result<Self, MessageError> {
        if mode.validates() && bytes.len() > MAX_MESSAGE_LENGTH {
            return Err(MessageError::MessageTooLarge {
                size: bytes.len(),
                max: MAX_MESSAGE_LENGTH,
            });
        }

        let message = Message::decode_all(&mut bytes.as_slice())
            .map_err(|e| MessageError::Decode(e.to_string()))?;

        if mode.validates() {
            validation::validate_message(&message)?;
        }

        Ok(Self {
            id: message_id(&bytes),
            message,
            bytes,
        })
    }

    pub fn id(&self) -> MessageId {
        self.id
    }

    pub fn message(&self) -> &Message {
        &self.message
    }

    /// Wire bytes the id was computed from
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn milestone(&self) -> Option<&MilestonePayload> {
        self.message.milestone()
    }

    pub fn milestone_index(&self) -> Option<MilestoneIndex> {
        self.milestone().map(MilestonePayload::index)
    }

    pub fn into_message(self) -> Message {
        self.message
    }
}

/// Compute the id of a message from its wire bytes
pub fn message_id(bytes: &[u8]) -> MessageId {
    MessageId(Sha256::digest(bytes).into())
}

use crate::message::{Message, MessageResponse};

use super::connection::ConnectionRegistry;
use super::types::WsMessage;

/// Pushes freshly stored messages to their recipient's live connection.
///
/// Delivery is best effort and at most once. A recipient without a connection
/// simply picks the message up on the next conversation fetch.
#[derive(Clone)]
pub struct DeliveryRelay {
    registry: ConnectionRegistry,
}

impl DeliveryRelay {
    pub fn new(registry: ConnectionRegistry) -> Self {
        Self { registry }
    }

    /// Returns whether a live connection accepted the push.
    pub fn deliver(&self, message: &Message) -> bool {
        let recipient_id = message.recipient_id;
        let event = WsMessage::ReceiveMessage(MessageResponse::from(message.clone()));
        let delivered = self.registry.send_to_user(recipient_id, event);

        if delivered {
            tracing::debug!(message_id = %message.id, %recipient_id, "Message pushed to recipient");
        } else {
            tracing::debug!(message_id = %message.id, %recipient_id, "Recipient offline, push skipped");
        }

        delivered
    }
}

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::types::WsMessage;

pub type WsSender = mpsc::UnboundedSender<WsMessage>;

struct Connection {
    id: Uuid,
    sender: WsSender,
}

/// Maps each connected user to their single live connection.
///
/// A later registration for the same user replaces the earlier one. Removal is
/// keyed on the connection id so a stale socket closing never evicts a newer one.
#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    connections: Arc<DashMap<Uuid, Connection>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a fresh connection for `user_id` and returns its id.
    pub fn register(&self, user_id: Uuid, sender: WsSender) -> Uuid {
        let connection_id = Uuid::new_v4();
        self.claim(user_id, connection_id, sender);
        connection_id
    }

    /// Points `user_id` at an existing connection, replacing whatever was there.
    pub fn claim(&self, user_id: Uuid, connection_id: Uuid, sender: WsSender) {
        let previous = self.connections.insert(
            user_id,
            Connection {
                id: connection_id,
                sender,
            },
        );

        if let Some(previous) = previous {
            if previous.id != connection_id {
                tracing::debug!(%user_id, replaced = %previous.id, %connection_id, "Connection replaced");
            }
        }
    }

    /// Removes the entry for `user_id` if it still belongs to `connection_id`.
    pub fn unregister(&self, user_id: Uuid, connection_id: Uuid) -> bool {
        self.connections
            .remove_if(&user_id, |_, conn| conn.id == connection_id)
            .is_some()
    }

    /// Pushes `message` to the user's live connection.
    ///
    /// Returns false when the user has no connection or the connection has gone
    /// away; a dead handle is dropped from the registry.
    pub fn send_to_user(&self, user_id: Uuid, message: WsMessage) -> bool {
        let delivered = match self.connections.get(&user_id) {
            Some(conn) => conn.sender.send(message).is_ok(),
            None => return false,
        };

        if !delivered {
            self.connections
                .remove_if(&user_id, |_, conn| conn.sender.is_closed());
        }

        delivered
    }

    pub fn is_connected(&self, user_id: Uuid) -> bool {
        self.connections.contains_key(&user_id)
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }
}

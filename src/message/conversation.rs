//! Conversation listing as an explicit aggregation.
//!
//! Active messages touching a user are partitioned by counterpart, each
//! partition is reduced to its newest message plus the number of unread
//! messages addressed to the user, and partitions are ordered newest first.

use std::collections::HashMap;
use uuid::Uuid;

use super::message_models::{ConversationSummary, Message};

pub fn aggregate_conversations<'a, I>(user_id: Uuid, messages: I) -> Vec<ConversationSummary>
where
    I: IntoIterator<Item = &'a Message>,
{
    let mut partitions: HashMap<Uuid, ConversationSummary> = HashMap::new();

    for message in messages {
        if !message.is_active || !message.involves(user_id) {
            continue;
        }

        let counterpart_id = message.counterpart_of(user_id);
        let unread = message.recipient_id == user_id && !message.is_read;

        partitions
            .entry(counterpart_id)
            .and_modify(|summary| {
                if message.created_at > summary.last_message.created_at {
                    summary.last_message = message.clone();
                }
                if unread {
                    summary.unread_count += 1;
                }
            })
            .or_insert_with(|| ConversationSummary {
                counterpart_id,
                last_message: message.clone(),
                unread_count: i64::from(unread),
            });
    }

    let mut summaries: Vec<ConversationSummary> = partitions.into_values().collect();
    summaries.sort_by(|a, b| b.last_message.created_at.cmp(&a.last_message.created_at));
    summaries
}

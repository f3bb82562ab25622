pub mod conversation;
pub mod message_dto;
pub mod message_handlers;
pub mod message_memory;
pub mod message_models;
pub mod message_repository;
pub mod message_service;

pub use conversation::aggregate_conversations;
pub use message_dto::{ConversationEntry, SendMessageRequest};
pub use message_memory::InMemoryMessageStore;
pub use message_models::{conversation_id, Message, MessageResponse, MessageType, NewMessage};
pub use message_repository::{MessageRepository, MessageStore};
pub use message_service::MessageService;

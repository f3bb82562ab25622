pub mod chatbot_dto;
pub mod chatbot_handlers;
pub mod chatbot_service;

pub use chatbot_service::ChatbotService;

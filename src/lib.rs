pub mod ai;
pub mod auth;
pub mod chatbot;
pub mod db;
pub mod error;
pub mod extract;
pub mod interview;
pub mod message;
pub mod middleware;
pub mod pagination;
pub mod routes;
pub mod state;
pub mod upload;
pub mod user;
pub mod websocket;

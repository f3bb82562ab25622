pub mod upload_handlers;
pub mod upload_service;

pub use upload_service::{UploadResponse, UploadService, MAX_UPLOAD_BYTES};

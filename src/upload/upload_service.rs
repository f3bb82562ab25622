use std::path::{Path, PathBuf};

use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{AppError, Result};

pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadResponse {
    pub url: String,
    pub message: String,
}

/// Stores message attachments on local disk and hands back their public URL.
#[derive(Clone)]
pub struct UploadService {
    dir: PathBuf,
    public_base_url: String,
}

impl UploadService {
    pub fn new(dir: impl Into<PathBuf>, public_base_url: &str) -> Self {
        Self {
            dir: dir.into(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn ensure_dir(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    pub fn validate(content_type: &str, size: usize) -> Result<()> {
        if size == 0 {
            return Err(AppError::Validation("No file uploaded".to_string()));
        }
        if size > MAX_UPLOAD_BYTES {
            return Err(AppError::PayloadTooLarge(
                "File exceeds the 10 MB limit".to_string(),
            ));
        }

        let content_type = content_type.trim().to_ascii_lowercase();
        if !(content_type.starts_with("image/") || content_type == "application/pdf") {
            return Err(AppError::Validation(
                "Only images and PDF files are allowed".to_string(),
            ));
        }

        Ok(())
    }

    pub async fn save(
        &self,
        original_name: Option<&str>,
        content_type: &str,
        data: &[u8],
    ) -> Result<UploadResponse> {
        Self::validate(content_type, data.len())?;

        let file_name = stored_name(original_name);
        self.ensure_dir().await?;
        tokio::fs::write(self.dir.join(&file_name), data).await?;

        tracing::info!(%file_name, size = data.len(), %content_type, "File uploaded");

        Ok(UploadResponse {
            url: format!("{}/uploads/{}", self.public_base_url, file_name),
            message: "File uploaded successfully".to_string(),
        })
    }
}

/// `file-{millis}-{random}{ext}`, keeping only a short alphanumeric extension
/// from the client-supplied name.
fn stored_name(original_name: Option<&str>) -> String {
    let ext = original_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.len() <= 10 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_default();

    let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000_000);
    format!("file-{}-{}{}", Utc::now().timestamp_millis(), suffix, ext)
}

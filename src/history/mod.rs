mod conversation;
mod file;
mod memory;

pub use conversation::{ ConversationStore, ExpiryPolicy, CHAT_HISTORY_KEY, LAST_CLEAR_KEY };
pub use file::FileKvStore;
pub use memory::MemoryKvStore;

use async_trait::async_trait;
use log::info;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use crate::cli::Args;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("message id must not be empty")]
    EmptyId,
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("snapshot serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported store type: {0}")]
    UnsupportedType(String),
}

/// Per-device string key-value storage backing the conversation snapshot.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}

pub fn default_profile_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".dcet-chat")
}

pub fn create_kv_store(args: &Args) -> Result<Arc<dyn KeyValueStore>, StoreError> {
    match args.store_type.to_lowercase().as_str() {
        "file" => {
            let dir = args.store_path.clone().map(PathBuf::from).unwrap_or_else(default_profile_dir);
            info!("Chat history will be stored in: {}", dir.display());
            Ok(Arc::new(FileKvStore::new(dir)))
        }
        "memory" => {
            info!("Chat history will be kept in memory only");
            Ok(Arc::new(MemoryKvStore::default()))
        }
        other => Err(StoreError::UnsupportedType(other.to_string())),
    }
}

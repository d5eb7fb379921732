use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// The shared code document each room edits.
///
/// Live cursor/OT sync is someone else's job; the game only needs to
/// replace the text at round boundaries and read it back at round end.
#[async_trait]
pub trait DocumentService: Send + Sync {
    /// Replaces the whole document atomically, creating it if needed
    async fn reset_document(&self, room_code: &str, text: &str);

    /// Current full text, or `None` if the room has no document
    async fn get_document_text(&self, room_code: &str) -> Option<String>;

    async fn dispose_document(&self, room_code: &str);
}

/// In-memory document store, one string per room
pub struct InMemoryDocumentService {
    documents: Arc<RwLock<HashMap<String, String>>>,
}

impl InMemoryDocumentService {
    pub fn new() -> Self {
        Self {
            documents: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryDocumentService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentService for InMemoryDocumentService {
    async fn reset_document(&self, room_code: &str, text: &str) {
        debug!(room_code = %room_code, len = text.len(), "Resetting document");
        let mut documents = self.documents.write().await;
        documents.insert(room_code.to_string(), text.to_string());
    }

    async fn get_document_text(&self, room_code: &str) -> Option<String> {
        let documents = self.documents.read().await;
        documents.get(room_code).cloned()
    }

    async fn dispose_document(&self, room_code: &str) {
        debug!(room_code = %room_code, "Disposing document");
        let mut documents = self.documents.write().await;
        documents.remove(room_code);
    }
}

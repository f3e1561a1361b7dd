use boardview_models::{Thread, ThreadCreate, decode_threads};
use tracing::{debug, info};

use super::{ProxyService, decode_one};
use crate::error::{Result, require};

/// Page requested when listing threads; the dashboard shows one page.
pub const THREAD_LISTING_LIMIT: usize = 1000;

impl ProxyService {
    pub async fn list_threads(&self) -> Result<Vec<Thread>> {
        let raw = self.client.list_threads(0, THREAD_LISTING_LIMIT).await?;
        let threads = decode_threads(&raw);
        if threads.len() < raw.len() {
            debug!(
                received = raw.len(),
                kept = threads.len(),
                "Dropped unreadable threads"
            );
        }
        Ok(threads)
    }

    /// Threads owned by `assistant_id`, plus threads whose owner the
    /// platform did not report.
    pub async fn list_assistant_threads(&self, assistant_id: &str) -> Result<Vec<Thread>> {
        let assistant_id = require(Some(assistant_id), "assistant_id")?;
        let threads = self.list_threads().await?;
        Ok(threads
            .into_iter()
            .filter(|thread| thread.belongs_to(assistant_id))
            .collect())
    }

    pub async fn get_thread(&self, thread_id: &str) -> Result<Thread> {
        let thread_id = require(Some(thread_id), "thread_id")?;
        let raw = self.client.get_thread(thread_id).await?;
        decode_one(&raw, Thread::decode)
    }

    /// Create a thread under `assistant_id`. Only the metadata of `request`
    /// is forwarded; the platform titles threads itself.
    pub async fn create_thread(
        &self,
        assistant_id: &str,
        request: &ThreadCreate,
    ) -> Result<Thread> {
        let assistant_id = require(Some(assistant_id), "assistant_id")?;
        let raw = self
            .client
            .create_thread(assistant_id, request.metadata.as_ref())
            .await?;
        let thread = decode_one(&raw, Thread::decode)?;
        info!(assistant_id, thread_id = ?thread.id, "Created thread");
        Ok(thread)
    }

    pub async fn delete_thread(&self, thread_id: &str) -> Result<()> {
        let thread_id = require(Some(thread_id), "thread_id")?;
        self.client.delete_thread(thread_id).await?;
        Ok(())
    }
}

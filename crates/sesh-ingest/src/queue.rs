use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use bytes::Bytes;
use uuid::Uuid;

use sesh_core::{AdmissionError, IngestConfig, ItemOutcome, ItemState, SourceFile, UploadItem};
use sesh_processing::FileValidator;

/// A file exactly as handed over by the caller, before admission.
#[derive(Debug, Clone)]
pub struct RawFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

#[derive(Default)]
struct QueueInner {
    items: HashMap<Uuid, UploadItem>,
    order: Vec<Uuid>,
}

/// Ordered collection of upload items for one session draft.
///
/// Items are keyed by a stable id. Generators settle by id, and settling
/// an id that has been removed is a no-op rather than an error, which is
/// what makes removal safe while processing is still in flight.
#[derive(Clone)]
pub struct IngestionQueue {
    inner: Arc<Mutex<QueueInner>>,
    validator: Arc<FileValidator>,
    max_items: usize,
    max_total_bytes: u64,
}

impl IngestionQueue {
    pub fn new(config: &IngestConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(QueueInner::default())),
            validator: Arc::new(FileValidator::new(config)),
            max_items: config.max_session_items,
            max_total_bytes: config.max_session_size_bytes,
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueInner> {
        // A panicked generator must not wedge the queue
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Admit a batch of files against the session budgets. The batch is
    /// atomic: if it would overflow the item count or total size, nothing
    /// from it is admitted.
    ///
    /// Every admitted file becomes a listed item. Files that fail per-file
    /// validation settle as failed immediately and never reach a
    /// generator; the returned ids cover both, in batch order.
    pub fn admit_batch(&self, files: Vec<RawFile>) -> Result<Vec<Uuid>, AdmissionError> {
        let mut inner = self.lock();

        let current_count = inner.order.len();
        let current_bytes: u64 = inner.items.values().map(|item| item.source.size()).sum();
        let incoming_count = files.len();
        let incoming_bytes: u64 = files.iter().map(|file| file.bytes.len() as u64).sum();

        if current_count + incoming_count > self.max_items {
            return Err(AdmissionError::TooManyItems {
                current: current_count,
                incoming: incoming_count,
                max: self.max_items,
            });
        }

        if current_bytes + incoming_bytes > self.max_total_bytes {
            return Err(AdmissionError::SessionSizeExceeded {
                current_bytes,
                incoming_bytes,
                max_bytes: self.max_total_bytes,
            });
        }

        let mut admitted = Vec::with_capacity(incoming_count);
        for file in files {
            let item = self.admit_one(file);
            tracing::debug!(
                item_id = %item.id,
                file_name = %item.source.file_name,
                state = %item.state,
                "Admitted file"
            );
            admitted.push(item.id);
            inner.order.push(item.id);
            inner.items.insert(item.id, item);
        }

        Ok(admitted)
    }

    fn admit_one(&self, file: RawFile) -> UploadItem {
        let size = file.bytes.len() as u64;
        match self
            .validator
            .validate(&file.file_name, &file.content_type, size)
        {
            Ok(kind) => UploadItem::new(SourceFile {
                file_name: file.file_name,
                content_type: file.content_type,
                kind,
                bytes: file.bytes,
            }),
            Err(error) => {
                tracing::warn!(
                    file_name = %file.file_name,
                    error = %error,
                    "File failed validation"
                );
                let kind = self
                    .validator
                    .declared_kind(&file.file_name, &file.content_type);
                UploadItem::failed(
                    SourceFile {
                        file_name: file.file_name,
                        content_type: file.content_type,
                        kind,
                        bytes: file.bytes,
                    },
                    error.to_string(),
                )
            }
        }
    }

    /// Snapshot of all items in admission order.
    pub fn items(&self) -> Vec<UploadItem> {
        let inner = self.lock();
        inner
            .order
            .iter()
            .filter_map(|id| inner.items.get(id))
            .cloned()
            .collect()
    }

    pub fn item(&self, id: Uuid) -> Option<UploadItem> {
        self.lock().items.get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().order.is_empty()
    }

    /// Total source bytes currently admitted, the figure the session size
    /// budget is enforced against.
    pub fn total_bytes(&self) -> u64 {
        self.lock().items.values().map(|item| item.source.size()).sum()
    }

    /// Claim a queued item for processing. Returns its source when the
    /// transition `Queued -> Processing` applied; `None` when the item is
    /// gone or already past queued.
    pub fn begin_processing(&self, id: Uuid) -> Option<SourceFile> {
        let mut inner = self.lock();
        let item = inner.items.get_mut(&id)?;
        match item.state {
            ItemState::Queued => {
                item.state = ItemState::Processing;
                Some(item.source.clone())
            }
            _ => None,
        }
    }

    /// Settle a processing item with its outcome. Returns whether the
    /// settle applied; settles for removed or already-settled items are
    /// ignored.
    pub fn settle(&self, id: Uuid, outcome: ItemOutcome) -> bool {
        let mut inner = self.lock();
        let Some(item) = inner.items.get_mut(&id) else {
            tracing::debug!(item_id = %id, "Ignoring settle for removed item");
            return false;
        };

        match item.state {
            ItemState::Processing => {
                item.state = ItemState::from(outcome);
                tracing::debug!(item_id = %id, state = %item.state, "Item settled");
                true
            }
            _ => {
                tracing::warn!(
                    item_id = %id,
                    state = %item.state,
                    "Ignoring settle for item not in processing"
                );
                false
            }
        }
    }

    /// Remove one item, whatever its state. In-flight processing for it is
    /// not interrupted; its eventual settle is simply dropped.
    pub fn remove(&self, id: Uuid) -> bool {
        let mut inner = self.lock();
        let removed = inner.items.remove(&id).is_some();
        if removed {
            inner.order.retain(|other| *other != id);
            tracing::debug!(item_id = %id, "Removed item");
        }
        removed
    }

    /// Drop every item, settled or not.
    pub fn clear(&self) {
        let mut inner = self.lock();
        let count = inner.order.len();
        inner.items.clear();
        inner.order.clear();
        tracing::debug!(count, "Cleared queue");
    }
}

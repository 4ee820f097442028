use std::sync::Arc;

use tokio::sync::{mpsc, Semaphore};
use uuid::Uuid;

use crate::processor::ItemProcessor;
use crate::queue::IngestionQueue;

/// Notified with the item id after every applied settle. Callers typically
/// re-evaluate the publish gate on each message.
pub type ItemSettledSender = mpsc::Sender<Uuid>;

/// Fans admitted items out to the processor under a concurrency cap, so a
/// full batch does not decode 150 files at once.
///
/// There is no cancellation: removing an item lets its generator run to
/// completion, and the queue drops the late settle.
pub struct Dispatcher {
    queue: IngestionQueue,
    processor: Arc<dyn ItemProcessor>,
    semaphore: Arc<Semaphore>,
    settled_tx: Option<ItemSettledSender>,
}

impl Dispatcher {
    pub fn new(queue: IngestionQueue, processor: Arc<dyn ItemProcessor>, max_workers: usize) -> Self {
        Self {
            queue,
            processor,
            semaphore: Arc::new(Semaphore::new(max_workers.max(1))),
            settled_tx: None,
        }
    }

    pub fn with_settled_notifications(mut self, settled_tx: ItemSettledSender) -> Self {
        self.settled_tx = Some(settled_tx);
        self
    }

    /// Queue one admitted item for processing and return immediately. The
    /// generator runs once a worker permit frees up.
    pub fn dispatch(&self, id: Uuid) {
        let queue = self.queue.clone();
        let processor = Arc::clone(&self.processor);
        let semaphore = Arc::clone(&self.semaphore);
        let settled_tx = self.settled_tx.clone();

        tokio::spawn(async move {
            let Ok(permit) = semaphore.acquire_owned().await else {
                return;
            };
            let _permit = permit;

            // Claim may fail: the item was removed while waiting, or it
            // settled at admission and has nothing to process.
            let Some(source) = queue.begin_processing(id) else {
                tracing::debug!(item_id = %id, "Skipping dispatch for absent or settled item");
                return;
            };

            tracing::debug!(
                item_id = %id,
                kind = %source.kind,
                size = source.bytes.len(),
                "Processing item"
            );

            let outcome = processor.process(source.kind, source.bytes).await;
            if queue.settle(id, outcome) {
                if let Some(ref tx) = settled_tx {
                    let _ = tx.send(id).await;
                }
            }
        });
    }

    /// Dispatch a whole admitted batch in order.
    pub fn dispatch_all(&self, ids: &[Uuid]) {
        for &id in ids {
            self.dispatch(id);
        }
    }
}

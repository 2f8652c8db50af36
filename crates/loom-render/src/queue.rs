//! Render Queue
//!
//! Collects render requests until the next flush. Requests for the same key
//! collapse into one unit of work (the most recently supplied work item) and
//! every requester of that key shares a single [`Completion`].

use indexmap::IndexMap;
use smol::channel::{self, Receiver, Sender};
use std::cell::RefCell;
use std::hash::Hash;
use std::rc::Rc;

/// Why a completion resolved without a value
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompletionError {
    #[error("render request was cancelled")]
    Cancelled,

    #[error("render failed: {0}")]
    Failed(String),
}

struct Shared<T> {
    outcome: RefCell<Option<Result<T, CompletionError>>>,
    done_tx: Sender<()>,
    done_rx: Receiver<()>,
}

/// Completion signal shared by every requester of one key
pub struct Completion<T> {
    shared: Rc<Shared<T>>,
}

impl<T> Clone for Completion<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl<T> std::fmt::Debug for Completion<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Completion").field("done", &self.is_done()).finish()
    }
}

impl<T> Completion<T> {
    fn new() -> Self {
        let (done_tx, done_rx) = channel::bounded(1);
        Self {
            shared: Rc::new(Shared {
                outcome: RefCell::new(None),
                done_tx,
                done_rx,
            }),
        }
    }

    pub fn is_done(&self) -> bool {
        self.shared.outcome.borrow().is_some()
    }

    /// Whether two handles refer to the same completion
    pub fn same_as(&self, other: &Completion<T>) -> bool {
        Rc::ptr_eq(&self.shared, &other.shared)
    }

    /// Resolve once; later resolutions are ignored
    fn complete(&self, outcome: Result<T, CompletionError>) {
        let mut slot = self.shared.outcome.borrow_mut();
        if slot.is_none() {
            *slot = Some(outcome);
            self.shared.done_tx.close();
        }
    }
}

impl<T: Clone> Completion<T> {
    /// Outcome, if already resolved
    pub fn try_get(&self) -> Option<Result<T, CompletionError>> {
        self.shared.outcome.borrow().clone()
    }

    /// Wait until the owning batch has been committed
    pub async fn wait(&self) -> Result<T, CompletionError> {
        if !self.is_done() {
            // Closing the channel is the wake-up signal
            let _ = self.shared.done_rx.recv().await;
        }
        self.try_get().unwrap_or(Err(CompletionError::Cancelled))
    }
}

/// Work item taken from the queue for one flush.
///
/// Dropping it without resolving resolves its completion as cancelled.
pub struct QueuedWork<K, W, T> {
    key: K,
    work: W,
    completion: Completion<T>,
}

impl<K, W, T> QueuedWork<K, W, T> {
    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn work(&self) -> &W {
        &self.work
    }

    pub fn completion(&self) -> &Completion<T> {
        &self.completion
    }

    pub fn resolve(&self, value: T) {
        self.completion.complete(Ok(value));
    }

    pub fn fail(&self, reason: impl Into<String>) {
        self.completion.complete(Err(CompletionError::Failed(reason.into())));
    }
}

impl<K, W, T> Drop for QueuedWork<K, W, T> {
    fn drop(&mut self) {
        self.completion.complete(Err(CompletionError::Cancelled));
    }
}

struct Pending<W, T> {
    work: W,
    completion: Completion<T>,
    requests: usize,
}

/// Dedupe-by-key queue of render requests
pub struct RenderQueue<K, W, T> {
    pending: IndexMap<K, Pending<W, T>>,
}

impl<K, W, T> Default for RenderQueue<K, W, T> {
    fn default() -> Self {
        Self {
            pending: IndexMap::new(),
        }
    }
}

impl<K: Hash + Eq + Clone + std::fmt::Debug, W, T> RenderQueue<K, W, T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue work under `key`. A request for a key that is already pending
    /// replaces its work and shares its completion.
    pub fn enqueue(&mut self, key: K, work: W) -> Completion<T> {
        if let Some(pending) = self.pending.get_mut(&key) {
            tracing::trace!("Deduplicating render request for {:?}", key);
            pending.work = work;
            pending.requests += 1;
            return pending.completion.clone();
        }

        let completion = Completion::new();
        self.pending.insert(
            key,
            Pending {
                work,
                completion: completion.clone(),
                requests: 1,
            },
        );
        completion
    }

    /// Remove a pending request; its completion resolves as cancelled
    pub fn cancel(&mut self, key: &K) -> bool {
        match self.pending.shift_remove(key) {
            Some(pending) => {
                pending.completion.complete(Err(CompletionError::Cancelled));
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, key: &K) -> bool {
        self.pending.contains_key(key)
    }

    /// Number of requests folded into `key` so far
    pub fn requests(&self, key: &K) -> usize {
        self.pending.get(key).map(|p| p.requests).unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Take everything queued so far, in first-request order
    pub fn take_batch(&mut self) -> Vec<QueuedWork<K, W, T>> {
        self.pending
            .drain(..)
            .map(|(key, pending)| QueuedWork {
                key,
                work: pending.work,
                completion: pending.completion,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_key_shares_completion() {
        let mut queue: RenderQueue<&str, u32, u32> = RenderQueue::new();
        let first = queue.enqueue("a", 1);
        let second = queue.enqueue("a", 2);
        assert!(first.same_as(&second));
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.requests(&"a"), 2);

        let batch = queue.take_batch();
        assert_eq!(batch.len(), 1);
        assert_eq!(*batch[0].work(), 2);
        batch[0].resolve(10);

        assert_eq!(first.try_get(), Some(Ok(10)));
        assert_eq!(second.try_get(), Some(Ok(10)));
    }

    #[test]
    fn test_cancel() {
        let mut queue: RenderQueue<&str, u32, u32> = RenderQueue::new();
        let done = queue.enqueue("a", 1);
        assert!(queue.cancel(&"a"));
        assert!(!queue.cancel(&"a"));
        assert_eq!(done.try_get(), Some(Err(CompletionError::Cancelled)));
        assert!(queue.take_batch().is_empty());
    }

    #[test]
    fn test_dropped_work_is_cancelled() {
        let mut queue: RenderQueue<&str, u32, u32> = RenderQueue::new();
        let done = queue.enqueue("a", 1);
        drop(queue.take_batch());
        assert_eq!(done.try_get(), Some(Err(CompletionError::Cancelled)));
    }

    #[test]
    fn test_wait() {
        let mut queue: RenderQueue<&str, u32, u32> = RenderQueue::new();
        let done = queue.enqueue("a", 1);
        let batch = queue.take_batch();
        batch[0].resolve(7);
        assert_eq!(smol::block_on(done.wait()), Ok(7));
    }
}

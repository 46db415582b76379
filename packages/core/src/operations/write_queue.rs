//! Serializing write queue
//!
//! Every write to the navigation store goes through a single background
//! worker. Producers (the tree's observers, background reconciliation) may
//! submit from any thread; the worker runs the writes one at a time in
//! submission order, so a later position write for a node can never be
//! overtaken by an earlier one.
//!
//! # Outcomes
//!
//! - The operation's own result is delivered through its [`WriteHandle`].
//! - An operation cancelled before it starts, or one that returns
//!   [`StoreError::Cancelled`], resolves as [`WriteError::Cancelled`].
//! - Failures and panics resolve that handle only; the worker keeps draining.
//! - After [`WriteQueue::shutdown`] new submissions resolve as
//!   [`WriteError::QueueClosed`] while already queued writes still run.
//!
//! # Example
//!
//! ```rust
//! use mynotes_core::operations::WriteQueue;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let queue = WriteQueue::spawn();
//! let handle = queue.submit(|| async { Ok(1) });
//! assert_eq!(handle.wait().await.unwrap(), 1);
//! queue.shutdown().await;
//! # }
//! ```

use crate::db::StoreError;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};

type WriteFuture = Pin<Box<dyn Future<Output = Result<u64, StoreError>> + Send + 'static>>;
type WriteOperation = Box<dyn FnOnce() -> WriteFuture + Send + 'static>;

/// Why a queued write did not produce a result
#[derive(Error, Debug)]
pub enum WriteError {
    /// Cancelled by the caller before it started, or by the operation itself
    #[error("Write cancelled")]
    Cancelled,

    /// The operation ran and failed
    #[error("Write failed: {0}")]
    Failed(#[source] StoreError),

    /// The operation panicked; the worker recovered
    #[error("Write panicked: {0}")]
    Panicked(String),

    /// The queue no longer accepts writes
    #[error("Write queue is closed")]
    QueueClosed,
}

struct QueuedWrite {
    sequence: u64,
    operation: WriteOperation,
    cancelled: Arc<AtomicBool>,
    reply: oneshot::Sender<Result<u64, WriteError>>,
}

/// Handle to a submitted write
///
/// Dropping the handle does not cancel the write; it only discards the
/// outcome (fire-and-forget).
#[derive(Debug)]
pub struct WriteHandle {
    sequence: u64,
    cancelled: Arc<AtomicBool>,
    receiver: oneshot::Receiver<Result<u64, WriteError>>,
}

impl WriteHandle {
    fn closed() -> Self {
        let (reply, receiver) = oneshot::channel();
        let _ = reply.send(Err(WriteError::QueueClosed));
        Self {
            sequence: 0,
            cancelled: Arc::new(AtomicBool::new(false)),
            receiver,
        }
    }

    /// Submission sequence number (0 for writes rejected by a closed queue)
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Cancel the write if the worker has not started it yet
    ///
    /// A write that is already running completes normally.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Wait for the write to finish and return its outcome
    pub async fn wait(self) -> Result<u64, WriteError> {
        self.receiver.await.unwrap_or(Err(WriteError::QueueClosed))
    }
}

struct QueueInner {
    sender: RwLock<Option<mpsc::UnboundedSender<QueuedWrite>>>,
    // Flips to true once the worker has run its last write
    drained: watch::Receiver<bool>,
    next_sequence: AtomicU64,
    pending: Arc<AtomicUsize>,
}

/// Multi-producer, single-consumer FIFO of store writes
#[derive(Clone)]
pub struct WriteQueue {
    inner: Arc<QueueInner>,
}

impl WriteQueue {
    /// Create the queue and start its worker task
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let pending = Arc::new(AtomicUsize::new(0));
        let (drained_tx, drained) = watch::channel(false);
        let worker_pending = pending.clone();
        tokio::spawn(async move {
            run_worker(receiver, worker_pending).await;
            let _ = drained_tx.send(true);
        });
        tracing::debug!("Write queue worker started");

        Self {
            inner: Arc::new(QueueInner {
                sender: RwLock::new(Some(sender)),
                drained,
                next_sequence: AtomicU64::new(1),
                pending,
            }),
        }
    }

    /// Enqueue a write; never blocks
    pub fn submit<F, Fut>(&self, operation: F) -> WriteHandle
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<u64, StoreError>> + Send + 'static,
    {
        let guard = self
            .inner
            .sender
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let Some(sender) = guard.as_ref() else {
            tracing::debug!("Write submitted after shutdown; rejecting");
            return WriteHandle::closed();
        };

        let sequence = self.inner.next_sequence.fetch_add(1, Ordering::Relaxed);
        let cancelled = Arc::new(AtomicBool::new(false));
        let (reply, receiver) = oneshot::channel();
        let write = QueuedWrite {
            sequence,
            operation: Box::new(move || Box::pin(operation()) as WriteFuture),
            cancelled: cancelled.clone(),
            reply,
        };

        self.inner.pending.fetch_add(1, Ordering::AcqRel);
        if sender.send(write).is_err() {
            self.inner.pending.fetch_sub(1, Ordering::AcqRel);
            tracing::warn!("Write queue worker is gone; rejecting write #{}", sequence);
            return WriteHandle::closed();
        }

        WriteHandle {
            sequence,
            cancelled,
            receiver,
        }
    }

    /// Number of writes submitted but not yet finished
    pub fn pending(&self) -> usize {
        self.inner.pending.load(Ordering::Acquire)
    }

    /// Whether [`shutdown`](Self::shutdown) has been called
    pub fn is_closed(&self) -> bool {
        self.inner
            .sender
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .is_none()
    }

    /// Stop accepting writes and wait until everything already queued has run
    ///
    /// Every caller, from any clone, returns only after the worker has
    /// drained. Dropping one caller's future does not affect the others.
    pub async fn shutdown(&self) {
        let sender = self
            .inner
            .sender
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if sender.is_some() {
            tracing::info!("Write queue closing; draining {} pending write(s)", self.pending());
        }
        drop(sender);

        let mut drained = self.inner.drained.clone();
        while !*drained.borrow_and_update() {
            // Sender dropped without signalling: the worker task is gone
            if drained.changed().await.is_err() {
                tracing::error!("Write queue worker terminated abnormally");
                break;
            }
        }
    }
}

async fn run_worker(mut receiver: mpsc::UnboundedReceiver<QueuedWrite>, pending: Arc<AtomicUsize>) {
    while let Some(write) = receiver.recv().await {
        let QueuedWrite {
            sequence,
            operation,
            cancelled,
            reply,
        } = write;

        let outcome = if cancelled.load(Ordering::Acquire) {
            tracing::debug!("Write #{} cancelled before start", sequence);
            Err(WriteError::Cancelled)
        } else {
            // Run in its own task so a panic surfaces as a JoinError
            match tokio::spawn(async move { operation().await }).await {
                Ok(Ok(rows)) => {
                    tracing::debug!("Write #{} applied ({} row(s))", sequence, rows);
                    Ok(rows)
                }
                Ok(Err(StoreError::Cancelled)) => {
                    tracing::debug!("Write #{} cancelled by its operation", sequence);
                    Err(WriteError::Cancelled)
                }
                Ok(Err(e)) => {
                    tracing::warn!("Write #{} failed: {}", sequence, e);
                    Err(WriteError::Failed(e))
                }
                Err(e) => {
                    tracing::warn!("Write #{} panicked: {}", sequence, e);
                    Err(WriteError::Panicked(e.to_string()))
                }
            }
        };

        pending.fetch_sub(1, Ordering::AcqRel);
        // A dropped handle means the caller did not want the outcome
        let _ = reply.send(outcome);
    }
    tracing::debug!("Write queue drained; worker exiting");
}

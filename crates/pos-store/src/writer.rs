//! Background writer that mirrors store writes into the durable backend.
//!
//! Writes are queued and applied by one dedicated thread in the order they
//! were queued, so the durable backend converges to the last write by call
//! order. Failures are logged and dropped; the caller never waits.

use std::sync::Arc;
use std::thread::JoinHandle;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace, warn};

use crate::durable::{DurableBackend, Entry};
use crate::error::Result;

/// One queued durable operation.
#[derive(Debug)]
pub(crate) enum WriteOp {
    Put(Entry),
    PutBatch(Vec<Entry>),
    Delete(String),
    Clear,
    Flush(oneshot::Sender<()>),
}

/// Handle to the writer thread.
pub(crate) struct DurableWriter {
    tx: Option<mpsc::UnboundedSender<WriteOp>>,
    handle: Option<JoinHandle<()>>,
}

impl DurableWriter {
    /// Start the writer thread.
    pub(crate) fn spawn(backend: Arc<dyn DurableBackend>) -> Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = std::thread::Builder::new()
            .name("pos-durable-writer".into())
            .spawn(move || run(backend.as_ref(), rx))?;

        Ok(Self {
            tx: Some(tx),
            handle: Some(handle),
        })
    }

    /// Queue an operation.
    pub(crate) fn enqueue(&self, op: WriteOp) {
        let sent = self.tx.as_ref().map(|tx| tx.send(op));
        if !matches!(sent, Some(Ok(()))) {
            warn!("durable writer stopped, write dropped");
        }
    }

    /// Wait until everything queued so far has been applied.
    pub(crate) async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        self.enqueue(WriteOp::Flush(done_tx));
        // An error means the writer is gone; nothing is left to wait for.
        let _ = done_rx.await;
    }
}

impl Drop for DurableWriter {
    fn drop(&mut self) {
        // Closing the queue lets the thread drain and exit.
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("durable writer thread panicked");
            }
        }
    }
}

fn run(backend: &dyn DurableBackend, mut rx: mpsc::UnboundedReceiver<WriteOp>) {
    debug!("durable writer started");
    while let Some(op) = rx.blocking_recv() {
        apply(backend, op);
    }
    debug!("durable writer stopped");
}

fn apply(backend: &dyn DurableBackend, op: WriteOp) {
    match op {
        WriteOp::Put(entry) => {
            trace!(key = %entry.key, "durable put");
            if let Err(e) = backend.put(&entry) {
                warn!(key = %entry.key, error = %e, "durable write failed");
            }
        }
        WriteOp::PutBatch(entries) => {
            trace!(count = entries.len(), "durable batch put");
            if let Err(e) = backend.put_batch(&entries) {
                warn!(count = entries.len(), error = %e, "durable batch write failed");
            }
        }
        WriteOp::Delete(key) => {
            trace!(key = %key, "durable delete");
            if let Err(e) = backend.delete(&key) {
                warn!(key = %key, error = %e, "durable delete failed");
            }
        }
        WriteOp::Clear => {
            trace!("durable clear");
            if let Err(e) = backend.clear() {
                warn!(error = %e, "durable clear failed");
            }
        }
        WriteOp::Flush(done) => {
            let _ = done.send(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::durable::MemoryBackend;
    use serde_json::json;

    #[tokio::test]
    async fn applies_in_order() {
        let backend = Arc::new(MemoryBackend::new());
        let writer = DurableWriter::spawn(backend.clone()).unwrap();

        writer.enqueue(WriteOp::Put(Entry::now("k", json!(1))));
        writer.enqueue(WriteOp::Put(Entry::now("k", json!(2))));
        writer.enqueue(WriteOp::Delete("k".into()));
        writer.enqueue(WriteOp::PutBatch(vec![
            Entry::now("k", json!(3)),
            Entry::now("j", json!(4)),
        ]));
        writer.flush().await;

        assert_eq!(backend.get("k").unwrap().unwrap().value, json!(3));
        assert_eq!(backend.len(), 2);

        writer.enqueue(WriteOp::Clear);
        writer.flush().await;
        assert!(backend.is_empty());
    }

    #[tokio::test]
    async fn failures_do_not_stop_the_writer() {
        let backend = Arc::new(MemoryBackend::new());
        let writer = DurableWriter::spawn(backend.clone()).unwrap();

        backend.set_failing(true);
        writer.enqueue(WriteOp::Put(Entry::now("lost", json!(1))));
        writer.flush().await;

        backend.set_failing(false);
        writer.enqueue(WriteOp::Put(Entry::now("kept", json!(2))));
        writer.flush().await;

        assert!(backend.get("lost").unwrap().is_none());
        assert!(backend.get("kept").unwrap().is_some());
    }
}

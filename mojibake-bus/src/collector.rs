use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use tokio::{sync::Mutex, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::stage::{StageCmd, StageReceiver};

/// Gathers the last stage's output until the pipeline flushes it.
///
/// The collector answers `Finish` with `Ok(())` once everything queued ahead
/// of it is in the buffer, which is what lets a flush drain the buffer safely.
pub struct Collector {
    cancel: CancellationToken,
    buffer: Arc<Mutex<BytesMut>>,
    handle: Option<JoinHandle<()>>,
}

impl Collector {
    pub fn start(input: StageReceiver, cancel: CancellationToken) -> Self {
        let buffer = Arc::new(Mutex::new(BytesMut::new()));
        let cancel_clone = cancel.clone();
        let buffer_clone = Arc::clone(&buffer);
        let handle = tokio::spawn(async move {
            Self::collect_loop(input, buffer_clone, cancel_clone).await;
        });
        Self {
            cancel,
            buffer,
            handle: Some(handle),
        }
    }

    async fn collect_loop(
        mut input: StageReceiver,
        buffer: Arc<Mutex<BytesMut>>,
        cancel: CancellationToken,
    ) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    break;
                }
                cmd = input.recv() => {
                    match cmd {
                        Some(StageCmd::Data(chunk)) => {
                            buffer.lock().await.extend_from_slice(&chunk);
                        }
                        Some(StageCmd::Finish(ack)) => {
                            let _ = ack.send(Ok(()));
                        }
                        None => break,
                    }
                }
            }
        }
        log::debug!("collector: stopped");
    }

    /// Drains the buffer.
    pub async fn take(&self) -> Bytes {
        self.buffer.lock().await.split().freeze()
    }

    /// Drops whatever the buffer holds, returning how many bytes were discarded.
    pub async fn discard(&self) -> usize {
        let mut buffer = self.buffer.lock().await;
        let len = buffer.len();
        buffer.clear();
        len
    }

    pub async fn len(&self) -> usize {
        self.buffer.lock().await.len()
    }

    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub async fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                log::error!("collector task error: {:#?}", e);
            }
        }
    }
}

impl Drop for Collector {
    fn drop(&mut self) {
        self.stop();
    }
}

use bytes::{Bytes, BytesMut};
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;

use crate::{error::Result, transcoder::Transcoder};

/// Every edge holds at most one message, so a sender waits for its consumer.
pub const EDGE_CAPACITY: usize = 1;

pub type StageSender = mpsc::Sender<StageCmd>;
pub type StageReceiver = mpsc::Receiver<StageCmd>;
pub type FinishAck = oneshot::Sender<Result<()>>;

/// What travels along an edge. `Finish` is sent in-band, so it reaches a stage
/// only after every byte queued ahead of it.
#[derive(Debug)]
pub enum StageCmd {
    Data(Bytes),
    Finish(FinishAck),
}

pub fn edge() -> (StageSender, StageReceiver) {
    mpsc::channel(EDGE_CAPACITY)
}

/// A transcoder running in its own task between two edges.
pub struct StageTask {
    name: String,
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl StageTask {
    /// Spawns the stage. Must be called from within a Tokio runtime.
    pub fn start(
        transcoder: Box<dyn Transcoder>,
        input: StageReceiver,
        output: StageSender,
        cancel: CancellationToken,
    ) -> Self {
        let name = transcoder.name().to_string();
        let cancel_clone = cancel.clone();
        let handle = tokio::spawn(async move {
            Self::stage_loop(transcoder, input, output, cancel_clone).await;
        });
        Self {
            name,
            cancel,
            handle: Some(handle),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.handle.as_ref().is_none_or(|h| h.is_finished())
    }

    /// Waits for the stage task to exit.
    pub async fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                log::error!("stage {} task error: {:#?}", self.name, e);
            }
        }
    }

    async fn stage_loop(
        mut transcoder: Box<dyn Transcoder>,
        mut input: StageReceiver,
        output: StageSender,
        cancel: CancellationToken,
    ) {
        let name = transcoder.name().to_string();
        let mut out = BytesMut::new();
        log::debug!("stage {}: started", name);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    break;
                }
                cmd = input.recv() => {
                    match cmd {
                        Some(StageCmd::Data(chunk)) => {
                            transcoder.push_slice(&chunk, &mut out);
                            if out.is_empty() {
                                continue;
                            }
                            let data = StageCmd::Data(out.split().freeze());
                            tokio::select! {
                                _ = cancel.cancelled() => {
                                    break;
                                }
                                sent = output.send(data) => {
                                    if sent.is_err() {
                                        log::debug!("stage {}: downstream closed", name);
                                        break;
                                    }
                                }
                            }
                        }
                        Some(StageCmd::Finish(ack)) => {
                            let result = transcoder.finish();
                            if let Err(e) = &result {
                                log::debug!("stage {}: finish failed: {}", name, e);
                            }
                            let _ = ack.send(result);
                        }
                        None => {
                            let held = transcoder.pending();
                            if held > 0 {
                                log::warn!(
                                    "stage {}: input closed mid-sequence, dropping {} held byte(s)",
                                    name,
                                    held
                                );
                            }
                            break;
                        }
                    }
                }
            }
        }

        log::debug!("stage {}: stopped", name);
    }
}

impl Drop for StageTask {
    fn drop(&mut self) {
        self.stop();
    }
}

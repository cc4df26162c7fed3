//! The decode pipeline coordinator.
//!
//! Data flow:
//! ```text
//! write() ──► stage 1 ──► stage 2 ──► … ──► stage N ──► collector buffer
//!                                                            │
//!                                              flush() ──────┴──► sink
//! ```
//!
//! Every arrow is a capacity-1 channel, so a write waits until the head of the
//! chain has room and the chain runs at the speed of its slowest stage. A flush
//! walks the chain front to back: it sends `Finish` to a stage, waits for the
//! acknowledgement and only then moves on, so no stage is asked to finish before
//! the bytes upstream of it have arrived.

use std::{
    io,
    pin::Pin,
    task::{Context, Poll, ready},
};

use bytes::Bytes;
use futures::future::join_all;
use tokio::{
    io::{AsyncRead, AsyncWrite, AsyncWriteExt},
    sync::oneshot,
};
use tokio_util::sync::{CancellationToken, PollSender};

use crate::{
    collector::Collector,
    encoding::Encoding,
    error::{DecodeError, Result},
    stage::{StageCmd, StageSender, StageTask, edge},
    transcoder::{Transcoder, transcoders_for},
};

pub struct Pipeline<W> {
    sink: W,
    encodings: Vec<Encoding>,
    cancel: CancellationToken,
    /// `inputs[i]` feeds `stages[i]`.
    inputs: Vec<StageSender>,
    /// Second handle on `inputs[0]` for `poll_write`.
    head: PollSender<StageCmd>,
    stages: Vec<StageTask>,
    collector_input: StageSender,
    collector: Collector,
    unflushed: bool,
    closed: bool,
}

impl<W: AsyncWrite + Unpin> Pipeline<W> {
    /// Builds one stage per encoding, in the order the encodings were applied
    /// to undo them. Must be called from within a Tokio runtime.
    pub fn new(sink: W, encodings: &[Encoding]) -> Result<Self> {
        let mut pipeline = Self::with_stages(sink, transcoders_for(encodings))?;
        pipeline.encodings = encodings.to_vec();
        Ok(pipeline)
    }

    /// Builds a pipeline over caller-supplied transcoders.
    pub fn with_stages(sink: W, transcoders: Vec<Box<dyn Transcoder>>) -> Result<Self> {
        if transcoders.is_empty() {
            return Err(DecodeError::NoEncodings);
        }

        let cancel = CancellationToken::new();
        let (collector_input, collector_output) = edge();
        let collector = Collector::start(collector_output, cancel.child_token());

        // wire from the tail so each stage can be handed its downstream sender
        let mut downstream = collector_input.clone();
        let mut inputs = Vec::with_capacity(transcoders.len());
        let mut stages = Vec::with_capacity(transcoders.len());
        for transcoder in transcoders.into_iter().rev() {
            let (tx, rx) = edge();
            stages.push(StageTask::start(
                transcoder,
                rx,
                downstream,
                cancel.child_token(),
            ));
            inputs.push(tx.clone());
            downstream = tx;
        }
        inputs.reverse();
        stages.reverse();
        let head = PollSender::new(inputs[0].clone());

        log::debug!(
            "pipeline: started with stages [{}]",
            stages.iter().map(|s| s.name()).collect::<Vec<_>>().join(" -> ")
        );

        Ok(Self {
            sink,
            encodings: Vec::new(),
            cancel,
            inputs,
            head,
            stages,
            collector_input,
            collector,
            unflushed: false,
            closed: false,
        })
    }

    /// Feeds bytes to the head of the chain. Waits until the first stage has
    /// taken them; decoded output is held until the next flush.
    pub async fn write(&mut self, buf: &[u8]) -> Result<usize> {
        self.ensure_open()?;
        if buf.is_empty() {
            return Ok(0);
        }
        self.head.abort_send();

        let first = &self.inputs[0];
        first.send(StageCmd::Data(Bytes::copy_from_slice(buf)))
            .await
            .map_err(|_| DecodeError::disconnected(self.stages[0].name()))?;
        self.unflushed = true;
        Ok(buf.len())
    }

    /// Finishes every stage in order and moves the decoded bytes to the sink.
    ///
    /// If any stage was holding an incomplete sequence the buffered output is
    /// discarded and the first such error is returned. The pipeline stays usable.
    pub async fn flush(&mut self) -> Result<usize> {
        self.ensure_open()?;
        self.flush_inner().await
    }

    /// Flushes whatever was written since the last flush, then stops every stage
    /// and the collector. The pipeline is closed even when that flush fails.
    pub async fn close(&mut self) -> Result<()> {
        self.ensure_open()?;

        let flushed = if self.unflushed {
            self.flush_inner().await.map(|_| ())
        } else {
            Ok(())
        };

        for stage in &self.stages {
            stage.stop();
        }
        self.collector.stop();
        join_all(self.stages.iter_mut().map(|s| s.join())).await;
        self.collector.join().await;
        self.closed = true;
        log::debug!("pipeline: closed");

        flushed
    }

    /// Streams `reader` into the pipeline until EOF. Nothing is flushed.
    pub async fn copy_from<R: AsyncRead + Unpin>(&mut self, reader: &mut R) -> Result<u64> {
        self.ensure_open()?;
        Ok(tokio::io::copy(reader, self).await?)
    }

    async fn flush_inner(&mut self) -> Result<usize> {
        // a poll_write abandoned mid-reservation must not hold the head's only slot
        self.head.abort_send();
        let mut first_err = None;
        for (input, stage) in self.inputs.iter().zip(&self.stages) {
            if let Err(e) = Self::finish_stage(input, stage.name()).await {
                log::trace!("pipeline: stage {} finished with error: {}", stage.name(), e);
                if first_err.is_none() {
                    first_err = Some(e);
                }
            }
        }
        // once the collector acknowledges, everything the last stage sent is buffered
        let barrier = Self::finish_stage(&self.collector_input, "collector").await;
        self.unflushed = false;

        if let Some(e) = first_err.or(barrier.err()) {
            let dropped = self.collector.discard().await;
            log::trace!("pipeline: flush failed, discarded {} byte(s)", dropped);
            return Err(e);
        }

        let data = self.collector.take().await;
        self.sink.write_all(&data).await?;
        self.sink.flush().await?;
        log::trace!("pipeline: flushed {} byte(s)", data.len());
        Ok(data.len())
    }

    async fn finish_stage(input: &StageSender, name: &str) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        input
            .send(StageCmd::Finish(tx))
            .await
            .map_err(|_| DecodeError::disconnected(name))?;
        rx.await.map_err(|_| DecodeError::disconnected(name))?
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(DecodeError::Closed);
        }
        Ok(())
    }
}

impl<W> Pipeline<W> {
    /// The encodings this pipeline undoes, empty when built from custom stages.
    pub fn encodings(&self) -> &[Encoding] {
        &self.encodings
    }

    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn get_ref(&self) -> &W {
        &self.sink
    }
}

/// Byte-level entry point for `tokio::io::copy` and friends.
///
/// `poll_write` has the same effect as [`Pipeline::write`]. Decoded output only
/// reaches the sink through [`Pipeline::flush`] and [`Pipeline::close`]: their
/// handshakes report malformed input, which `poll_flush`/`poll_shutdown` cannot,
/// so those two only confirm that every written byte was handed to the chain.
impl<W: AsyncWrite + Unpin> AsyncWrite for Pipeline<W> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        if this.closed {
            return Poll::Ready(Err(io::Error::other(DecodeError::Closed)));
        }
        if buf.is_empty() {
            return Poll::Ready(Ok(0));
        }

        let stages = &this.stages;
        let gone = || {
            io::Error::new(
                io::ErrorKind::BrokenPipe,
                DecodeError::disconnected(stages[0].name()),
            )
        };
        ready!(this.head.poll_reserve(cx)).map_err(|_| gone())?;
        this.head
            .send_item(StageCmd::Data(Bytes::copy_from_slice(buf)))
            .map_err(|_| gone())?;
        this.unflushed = true;
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

impl<W> Drop for Pipeline<W> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod pipeline_test;

//! Chunked recorder for a composite stream
//!
//! Every timeslice the recorder drains what each track produced and appends
//! it to that track's ordered, append-only chunk buffer. Stopping flushes once
//! more and hands the buffers back for encoding.

use super::composite::CompositeStream;
use crate::capture::{TrackFormat, TrackKind};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

/// Ordered, append-only sequence of recorded chunks
#[derive(Debug, Default)]
pub struct ChunkBuffer {
    chunks: Vec<Vec<u8>>,
}

impl ChunkBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk; empty chunks are dropped
    pub fn push(&mut self, chunk: Vec<u8>) {
        if !chunk.is_empty() {
            self.chunks.push(chunk);
        }
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn total_bytes(&self) -> usize {
        self.chunks.iter().map(Vec::len).sum()
    }

    /// Concatenate every chunk, in order
    pub fn concat(self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.total_bytes());
        for chunk in self.chunks {
            out.extend_from_slice(&chunk);
        }
        out
    }
}

/// What one track produced while recording
#[derive(Debug)]
pub struct RecordedTrack {
    pub kind: TrackKind,
    pub label: String,
    pub format: Option<TrackFormat>,
    pub chunks: ChunkBuffer,
}

/// Everything a recorder captured, one entry per composite track, in order
#[derive(Debug, Default)]
pub struct RecordedMedia {
    pub tracks: Vec<RecordedTrack>,
}

impl RecordedMedia {
    pub fn chunk_count(&self) -> usize {
        self.tracks.iter().map(|t| t.chunks.len()).sum()
    }

    pub fn total_bytes(&self) -> usize {
        self.tracks.iter().map(|t| t.chunks.total_bytes()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.iter().all(|t| t.chunks.is_empty())
    }
}

fn flush(stream: &CompositeStream, buffers: &Mutex<Vec<ChunkBuffer>>) {
    let mut buffers = buffers.lock();
    for (track, buffer) in stream.tracks().iter().zip(buffers.iter_mut()) {
        let chunk = track.source().take_pending();
        if !chunk.is_empty() {
            tracing::debug!("Recorded {} chunk of {} bytes", track.label(), chunk.len());
            buffer.push(chunk);
        }
    }
}

/// Records a composite stream into per-track [`ChunkBuffer`]s
#[derive(Debug)]
pub struct MediaRecorder {
    buffers: Arc<Mutex<Vec<ChunkBuffer>>>,
    stop_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
    stream: CompositeStream,
}

impl MediaRecorder {
    /// Attach to every track of `stream` and start cutting chunks every
    /// `timeslice` on `runtime`
    pub fn start(runtime: &Handle, stream: CompositeStream, timeslice: Duration) -> Self {
        for track in stream.tracks() {
            track.source().attach();
        }

        let buffers = Arc::new(Mutex::new(
            stream.tracks().iter().map(|_| ChunkBuffer::new()).collect(),
        ));
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

        let task_stream = stream.clone();
        let task_buffers = buffers.clone();
        let task = runtime.spawn(async move {
            let mut interval = time::interval_at(Instant::now() + timeslice, timeslice);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = interval.tick() => flush(&task_stream, &task_buffers),
                    _ = &mut stop_rx => {
                        flush(&task_stream, &task_buffers);
                        break;
                    }
                }
            }
        });

        tracing::info!("Recorder started on {} tracks", stream.tracks().len());

        Self {
            buffers,
            stop_tx: Some(stop_tx),
            task: Some(task),
            stream,
        }
    }

    /// Stop recording, flush the final chunk and return what was recorded
    pub async fn stop(mut self) -> RecordedMedia {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!("Recorder task ended abnormally: {}", e);
                flush(&self.stream, &self.buffers);
            }
        }

        let buffers = std::mem::take(&mut *self.buffers.lock());
        let media = RecordedMedia {
            tracks: self
                .stream
                .tracks()
                .iter()
                .zip(buffers)
                .map(|(track, chunks)| RecordedTrack {
                    kind: track.kind(),
                    label: track.label().to_string(),
                    format: track.format().cloned(),
                    chunks,
                })
                .collect(),
        };

        tracing::info!(
            "Recorder stopped: {} chunks, {} bytes",
            media.chunk_count(),
            media.total_bytes()
        );
        media
    }
}

impl Drop for MediaRecorder {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        for track in self.stream.tracks() {
            track.source().detach();
        }
    }
}

//! Chunked delivery of large payloads.
//!
//! Several RPCs return payloads far larger than a single gRPC message should
//! carry, so payloads are split into bounded frames and sent strictly in
//! order over an abstract sink. Frames are sliced out of the source `Bytes`
//! without copying.

use async_trait::async_trait;
use bytes::Bytes;
use ces_control_core::proto::ChunkedDataResponse;
use ces_control_core::{Error, Result};
use tokio::sync::mpsc;
use tonic::Status;

/// Abstract destination for payload frames.
#[async_trait]
pub trait ChunkSink: Send {
    async fn send(&mut self, frame: Bytes) -> Result<()>;
}

/// Sink feeding frames into a gRPC server-stream response channel.
pub struct GrpcChunkSink {
    tx: mpsc::Sender<core::result::Result<ChunkedDataResponse, Status>>,
}

impl GrpcChunkSink {
    pub fn new(tx: mpsc::Sender<core::result::Result<ChunkedDataResponse, Status>>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl ChunkSink for GrpcChunkSink {
    async fn send(&mut self, frame: Bytes) -> Result<()> {
        self.tx
            .send(Ok(ChunkedDataResponse { data: frame }))
            .await
            .map_err(|e| Error::ChannelError {
                context: format!("failed to forward chunk: {e}"),
            })
    }
}

/// Splits a byte payload into consecutive frames of at most `chunk_bytes`
/// bytes and writes them, strictly in order, to a [`ChunkSink`].
pub struct ChunkedStreamWriter<S> {
    sink: S,
    chunk_bytes: usize,
}

impl<S: ChunkSink> ChunkedStreamWriter<S> {
    /// `chunk_bytes` must be greater than zero.
    pub fn new(sink: S, chunk_bytes: usize) -> Self {
        debug_assert!(chunk_bytes > 0);
        Self { sink, chunk_bytes }
    }

    /// Sends `payload` as frames. An empty payload sends nothing and
    /// succeeds; otherwise every frame is non-empty and only the last one
    /// may be shorter than `chunk_bytes`. The first send failure aborts the
    /// remaining frames and is returned unchanged.
    pub async fn write_all(&mut self, payload: Bytes) -> Result<()> {
        let mut remaining = payload;
        while !remaining.is_empty() {
            let take = remaining.len().min(self.chunk_bytes);
            let frame = remaining.split_to(take);
            self.sink.send(frame).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHUNK: usize = 16;

    /// Records every frame it receives.
    #[derive(Default)]
    struct RecordingSink {
        frames: Vec<Bytes>,
    }

    #[async_trait]
    impl ChunkSink for RecordingSink {
        async fn send(&mut self, frame: Bytes) -> Result<()> {
            self.frames.push(frame);
            Ok(())
        }
    }

    /// Counts send attempts and fails on the `fail_on`-th one (1-based).
    struct FailingSink {
        sends: usize,
        fail_on: usize,
    }

    #[async_trait]
    impl ChunkSink for FailingSink {
        async fn send(&mut self, _frame: Bytes) -> Result<()> {
            self.sends += 1;
            if self.sends == self.fail_on {
                return Err(Error::ChannelError {
                    context: "receiver dropped".to_string(),
                });
            }
            Ok(())
        }
    }

    fn payload(len: usize) -> Bytes {
        Bytes::from((0..len).map(|i| (i % 251) as u8).collect::<Vec<u8>>())
    }

    #[tokio::test]
    async fn empty_payload_sends_nothing() {
        let mut writer = ChunkedStreamWriter::new(RecordingSink::default(), CHUNK);
        writer.write_all(Bytes::new()).await.unwrap();
        assert!(writer.sink.frames.is_empty());
    }

    #[tokio::test]
    async fn frames_reassemble_to_the_payload() {
        for len in [1, CHUNK - 1, CHUNK, CHUNK + 1, 5 * CHUNK + 7] {
            let input = payload(len);
            let mut writer = ChunkedStreamWriter::new(RecordingSink::default(), CHUNK);
            writer.write_all(input.clone()).await.unwrap();

            let frames = &writer.sink.frames;
            assert!(frames.iter().all(|f| !f.is_empty() && f.len() <= CHUNK));
            // Only the last frame may be short.
            for frame in &frames[..frames.len() - 1] {
                assert_eq!(frame.len(), CHUNK);
            }

            let rebuilt: Vec<u8> = frames.iter().flat_map(|f| f.iter().copied()).collect();
            assert_eq!(rebuilt, input.to_vec(), "payload of {len} bytes");
        }
    }

    #[tokio::test]
    async fn frame_count_is_the_rounded_up_quotient() {
        let mut writer = ChunkedStreamWriter::new(RecordingSink::default(), CHUNK);
        writer.write_all(payload(5 * CHUNK + 7)).await.unwrap();
        assert_eq!(writer.sink.frames.len(), 6);
    }

    #[tokio::test]
    async fn stops_at_the_first_failed_send() {
        for fail_on in [1, 2, 4] {
            let sink = FailingSink { sends: 0, fail_on };
            let mut writer = ChunkedStreamWriter::new(sink, CHUNK);

            let err = writer.write_all(payload(6 * CHUNK)).await.unwrap_err();

            assert!(matches!(
                err,
                Error::ChannelError { ref context } if context == "receiver dropped"
            ));
            assert_eq!(writer.sink.sends, fail_on, "exactly {fail_on} send attempts");
        }
    }
}

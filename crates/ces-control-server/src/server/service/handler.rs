//! gRPC service implementation for chunked dogu log retrieval.
//!
//! This module defines [`LogMessageService`], the concrete implementation of
//! the [`DoguLogMessages`] gRPC service defined in the protobuf
//! specification. It validates the request, retrieves the historical lines
//! through a [`LogProvider`], gzip-compresses them into one document and
//! streams that document back to the client in bounded chunks.

use crate::server::logging::{LogLine, LogProvider};
use crate::server::streaming::chunked::{ChunkedStreamWriter, GrpcChunkSink};
use bytes::Bytes;
use ces_control_core::Error;
use ces_control_core::proto::dogu_log_messages_server::DoguLogMessages;
use ces_control_core::proto::{ChunkedDataResponse, DoguLogMessageRequest};
use core::pin::Pin;
use flate2::Compression;
use flate2::write::GzEncoder;
use std::io::Write;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::{Stream, wrappers::ReceiverStream};
use tonic::{Request, Response, Status};

/// Response channel capacity. With at most one frame in flight per request,
/// a small buffer keeps the feeder and the transport decoupled.
const STREAM_BUFFER_SIZE: usize = 16;

/// gRPC service delivering dogu logs as a chunked, compressed stream.
pub struct LogMessageService {
    provider: Arc<dyn LogProvider>,
    chunk_bytes: usize,
}

impl LogMessageService {
    pub fn new(provider: Arc<dyn LogProvider>, chunk_bytes: usize) -> Self {
        Self {
            provider,
            chunk_bytes,
        }
    }
}

#[tonic::async_trait]
impl DoguLogMessages for LogMessageService {
    type GetForDoguStream = Pin<Box<dyn Stream<Item = Result<ChunkedDataResponse, Status>> + Send>>;

    /// Handles a request for the most recent log lines of a dogu.
    ///
    /// Retrieval and compression run inside this handler, so a client
    /// cancellation drops the work at the next await point without sending a
    /// partial stream. Only the chunk feeder is spawned; it stops at the
    /// first failed send once the client is gone.
    #[tracing::instrument(skip_all, fields(dogu = %req.get_ref().dogu_name, lines = req.get_ref().line_count))]
    async fn get_for_dogu(
        &self,
        req: Request<DoguLogMessageRequest>,
    ) -> Result<Response<Self::GetForDoguStream>, Status> {
        let request = req.into_inner();
        if request.dogu_name.is_empty() {
            return Err(Error::InvalidRequest {
                reason: "Dogu name must not be empty".to_string(),
            }
            .into());
        }

        let lines = self
            .provider
            .get_logs(&request.dogu_name, i64::from(request.line_count))
            .await
            .map_err(Status::from)?;
        tracing::debug!("Retrieved {} log lines for {}", lines.len(), request.dogu_name);

        let payload = compress_lines(&lines)
            .map_err(|e| Status::internal(format!("Failed to compress log payload: {e}")))?;

        let (resp_tx, resp_rx) = mpsc::channel(STREAM_BUFFER_SIZE);
        let chunk_bytes = self.chunk_bytes;

        tokio::spawn(async move {
            let mut writer = ChunkedStreamWriter::new(GrpcChunkSink::new(resp_tx), chunk_bytes);
            if let Err(e) = writer.write_all(payload).await {
                // The receiver is gone when the client disconnects; there is
                // no one left to notify.
                tracing::debug!("Aborted chunk stream: {e}");
            }
        });

        Ok(Response::new(Box::pin(ReceiverStream::new(resp_rx))))
    }
}

/// Renders the lines oldest-first, one value per line, and gzip-compresses
/// the resulting document.
fn compress_lines(lines: &[LogLine]) -> std::io::Result<Bytes> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    for line in lines {
        encoder.write_all(line.value.as_bytes())?;
        encoder.write_all(b"\n")?;
    }
    Ok(Bytes::from(encoder.finish()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ces_control_core::Result;
    use chrono::DateTime;
    use flate2::read::GzDecoder;
    use std::io::Read;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio_stream::StreamExt;

    struct FakeProvider {
        lines: Result<Vec<LogLine>>,
        calls: AtomicUsize,
        seen_max_lines: AtomicUsize,
    }

    impl FakeProvider {
        fn with_lines(values: &[(i64, &str)]) -> Self {
            Self {
                lines: Ok(values
                    .iter()
                    .map(|(nanos, value)| LogLine {
                        timestamp: DateTime::from_timestamp_nanos(*nanos),
                        value: value.to_string(),
                    })
                    .collect()),
                calls: AtomicUsize::new(0),
                seen_max_lines: AtomicUsize::new(0),
            }
        }

        fn failing(err: Error) -> Self {
            Self {
                lines: Err(err),
                calls: AtomicUsize::new(0),
                seen_max_lines: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait::async_trait]
    impl LogProvider for FakeProvider {
        async fn get_logs(&self, _dogu_name: &str, max_lines: i64) -> Result<Vec<LogLine>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen_max_lines
                .store(max_lines.max(0) as usize, Ordering::SeqCst);
            self.lines.clone()
        }
    }

    async fn collect_payload(
        response: Response<<LogMessageService as DoguLogMessages>::GetForDoguStream>,
    ) -> Vec<u8> {
        let mut stream = response.into_inner();
        let mut payload = Vec::new();
        let mut frames = 0usize;
        while let Some(item) = stream.next().await {
            let chunk = item.expect("stream item");
            assert!(!chunk.data.is_empty());
            payload.extend_from_slice(&chunk.data);
            frames += 1;
        }
        assert!(frames > 0);
        payload
    }

    fn gunzip(payload: &[u8]) -> String {
        let mut text = String::new();
        GzDecoder::new(payload)
            .read_to_string(&mut text)
            .expect("valid gzip payload");
        text
    }

    #[tokio::test]
    async fn empty_dogu_name_is_rejected_without_retrieval() {
        let provider = Arc::new(FakeProvider::with_lines(&[]));
        let service = LogMessageService::new(provider.clone(), 8);

        let status = service
            .get_for_dogu(Request::new(DoguLogMessageRequest {
                dogu_name: String::new(),
                line_count: 10,
            }))
            .await
            .err()
            .unwrap();

        assert_eq!(status.code(), tonic::Code::InvalidArgument);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn streams_the_compressed_lines_in_bounded_chunks() {
        let provider = Arc::new(FakeProvider::with_lines(&[(1, "first"), (2, "second")]));
        // A tiny chunk size forces the payload across several frames.
        let service = LogMessageService::new(provider.clone(), 4);

        let response = service
            .get_for_dogu(Request::new(DoguLogMessageRequest {
                dogu_name: "my-dogu".to_string(),
                line_count: 25,
            }))
            .await
            .unwrap();

        let payload = collect_payload(response).await;
        assert_eq!(gunzip(&payload), "first\nsecond\n");
        assert_eq!(provider.seen_max_lines.load(Ordering::SeqCst), 25);
    }

    #[tokio::test]
    async fn provider_errors_map_to_internal() {
        let provider = Arc::new(FakeProvider::failing(Error::BackendProtocol {
            context: "unexpected result type \"matrix\"".to_string(),
        }));
        let service = LogMessageService::new(provider, 8);

        let status = service
            .get_for_dogu(Request::new(DoguLogMessageRequest {
                dogu_name: "my-dogu".to_string(),
                line_count: 10,
            }))
            .await
            .err()
            .unwrap();

        assert_eq!(status.code(), tonic::Code::Internal);
        assert!(status.message().contains("matrix"));
    }

    #[tokio::test]
    async fn no_lines_still_yield_a_valid_empty_document() {
        let provider = Arc::new(FakeProvider::with_lines(&[]));
        let service = LogMessageService::new(provider, 64);

        let response = service
            .get_for_dogu(Request::new(DoguLogMessageRequest {
                dogu_name: "my-dogu".to_string(),
                line_count: 0,
            }))
            .await
            .unwrap();

        let payload = collect_payload(response).await;
        assert_eq!(gunzip(&payload), "");
    }
}

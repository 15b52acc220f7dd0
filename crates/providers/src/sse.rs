//! Shared SSE streaming infrastructure for all provider adapters.
//!
//! Every provider follows the same pattern: receive a `reqwest::Response`,
//! buffer body bytes, split complete lines, extract `data:` payloads, and
//! feed each payload to a provider-specific parser that returns an
//! [`SseFrame`].
//!
//! - [`drain_data_lines`] pulls complete `data:` payloads from a byte buffer
//! - [`sse_response_stream`] builds a `BoxStream` from a response + parser

use crate::util::from_reqwest;
use sm_domain::error::{Error, Result};
use sm_domain::provider::ProviderId;
use sm_domain::stream::{BoxStream, StreamChunk};
use std::time::Duration;

/// What a provider parser made of one `data:` payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SseFrame {
    /// A non-empty text fragment.
    Text(String),
    /// Valid payload carrying no text (role header, usage, ping...).
    Skip,
    /// End-of-stream sentinel.
    Done,
}

/// Extract complete `data:` payloads from an SSE byte buffer.
///
/// Only lines terminated by `\n` are consumed; a trailing partial line
/// stays in the buffer for the next call. Lines without the `data:` marker
/// (`event:`, `id:`, comments, blank separators) are dropped. Splitting on
/// raw bytes keeps multi-byte characters intact across network chunks.
pub(crate) fn drain_data_lines(buffer: &mut Vec<u8>) -> Vec<String> {
    let mut data_lines = Vec::new();

    while let Some(pos) = buffer.iter().position(|&b| b == b'\n') {
        let line: Vec<u8> = buffer.drain(..=pos).collect();
        let line = String::from_utf8_lossy(&line);
        let line = line.trim();
        if let Some(data) = line.strip_prefix("data:") {
            let data = data.trim();
            if !data.is_empty() {
                data_lines.push(data.to_string());
            }
        }
    }

    data_lines
}

/// Build a [`BoxStream`] of text fragments from an SSE `reqwest::Response`.
///
/// The stream ends after the parser reports [`SseFrame::Done`], when the
/// body closes, or after the first error. Each wait for the next body chunk
/// is bounded by `idle_timeout`.
pub(crate) fn sse_response_stream<F>(
    response: reqwest::Response,
    provider: ProviderId,
    idle_timeout: Duration,
    mut parse_data: F,
) -> BoxStream<'static, Result<StreamChunk>>
where
    F: FnMut(&str) -> Result<SseFrame> + Send + 'static,
{
    let stream = async_stream::stream! {
        let mut response = response;
        let mut buffer: Vec<u8> = Vec::new();

        'read: loop {
            let (lines, eof) = match tokio::time::timeout(idle_timeout, response.chunk()).await {
                Ok(Ok(Some(bytes))) => {
                    buffer.extend_from_slice(&bytes);
                    (drain_data_lines(&mut buffer), false)
                }
                Ok(Ok(None)) => {
                    // Body closed: flush a final unterminated line.
                    buffer.push(b'\n');
                    (drain_data_lines(&mut buffer), true)
                }
                Ok(Err(e)) => {
                    yield Err(from_reqwest(provider, e));
                    break 'read;
                }
                Err(_) => {
                    yield Err(Error::ProviderTimeout {
                        provider: provider.to_string(),
                        message: format!(
                            "no stream data within {} ms",
                            idle_timeout.as_millis()
                        ),
                    });
                    break 'read;
                }
            };

            for data in lines {
                match parse_data(&data) {
                    Ok(SseFrame::Text(text)) => yield Ok(StreamChunk::new(text)),
                    Ok(SseFrame::Skip) => {}
                    Ok(SseFrame::Done) => break 'read,
                    Err(e) => {
                        tracing::warn!(provider = %provider, error = %e, "aborting provider stream");
                        yield Err(e);
                        break 'read;
                    }
                }
            }

            if eof {
                break 'read;
            }
        }
    };

    Box::pin(stream)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

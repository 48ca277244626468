//! SSE stream parsing for incrementally-delivered chat replies.

use futures::{Stream, StreamExt};
use std::pin::Pin;

use upkeep_core::{Error, Result, SourceRef};

use crate::types::GenerateContentResponse;

/// One increment of a streamed chat reply.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatChunk {
    /// A text fragment to append to the reply.
    Text(String),
    /// Attribution sources carried by a chunk, typically the final one.
    Sources(Vec<SourceRef>),
}

/// Stream of chat increments.
pub type ChatStream = Pin<Box<dyn Stream<Item = Result<ChatChunk>> + Send>>;

/// Parse an SSE byte stream from the `streamGenerateContent` endpoint.
pub fn parse_sse_stream(
    stream: impl Stream<Item = std::result::Result<bytes::Bytes, reqwest::Error>> + Send + 'static,
) -> ChatStream {
    let chunks = stream
        .map(|chunk_result| {
            chunk_result.map_err(|e| Error::Inference(format!("Stream error: {}", e)))
        })
        .flat_map(|result| {
            let items = match result {
                Ok(bytes) => parse_sse_chunk(&String::from_utf8_lossy(&bytes)),
                Err(e) => vec![Err(e)],
            };
            futures::stream::iter(items)
        });

    Box::pin(chunks)
}

/// Parse a single SSE payload, which may carry several `data:` lines.
fn parse_sse_chunk(chunk: &str) -> Vec<Result<ChatChunk>> {
    let mut items = Vec::new();

    for line in chunk.lines() {
        let line = line.trim();

        // Skip empty lines and comments
        if line.is_empty() || line.starts_with(':') {
            continue;
        }

        let Some(data) = line.strip_prefix("data: ") else {
            continue;
        };

        match serde_json::from_str::<GenerateContentResponse>(data) {
            Ok(response) => {
                if let Some(text) = response.first_text() {
                    items.push(Ok(ChatChunk::Text(text)));
                }
                let sources = response.sources();
                if !sources.is_empty() {
                    items.push(Ok(ChatChunk::Sources(sources)));
                }
            }
            Err(e) => {
                items.push(Err(Error::Inference(format!(
                    "Failed to parse SSE chunk: {}",
                    e
                ))));
            }
        }
    }

    items
}

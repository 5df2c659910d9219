//! Streaming response handling for LLM generation

use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;

/// Tokens in arrival order; the stream ends when the sender is dropped.
pub struct TokenStream {
    receiver: mpsc::Receiver<String>,
}

impl TokenStream {
    pub fn new(receiver: mpsc::Receiver<String>) -> Self {
        Self { receiver }
    }

    /// A stream that yields `chunks` and then ends.
    pub fn from_chunks(chunks: Vec<String>) -> Self {
        let (sender, receiver) = mpsc::channel(chunks.len().max(1));
        for chunk in chunks {
            // Capacity covers every chunk
            let _ = sender.try_send(chunk);
        }
        Self::new(receiver)
    }

    pub async fn next(&mut self) -> Option<String> {
        self.receiver.recv().await
    }

    pub async fn collect(mut self) -> String {
        let mut result = String::new();
        while let Some(token) = self.next().await {
            result.push_str(&token);
        }
        result
    }
}

impl Stream for TokenStream {
    type Item = String;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

/// Incremental parser for `text/event-stream` bodies from OpenAI-compatible
/// chat endpoints. Feed raw network chunks; get content deltas back.
///
/// Bytes are buffered until a full line arrives, so a multi-byte character
/// split across chunks is decoded whole.
#[derive(Debug, Default)]
pub struct SseParser {
    buffer: Vec<u8>,
    done: bool,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut deltas = Vec::new();
        if self.done {
            return deltas;
        }
        self.buffer.extend_from_slice(chunk);

        while let Some(line_end) = self.buffer.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=line_end).collect();
            let line = match std::str::from_utf8(&raw) {
                Ok(line) => line.trim(),
                Err(e) => {
                    tracing::debug!(error = %e, "Skipping non-UTF-8 SSE line");
                    continue;
                }
            };

            let Some(data) = line.strip_prefix("data:") else {
                continue;
            };
            let data = data.trim();
            if data == "[DONE]" {
                self.done = true;
                break;
            }

            match serde_json::from_str::<serde_json::Value>(data) {
                Ok(parsed) => {
                    if let Some(content) = parsed["choices"][0]["delta"]["content"].as_str() {
                        if !content.is_empty() {
                            deltas.push(content.to_string());
                        }
                    }
                }
                Err(e) => tracing::debug!(error = %e, "Skipping unparsable SSE line"),
            }
        }

        deltas
    }
}

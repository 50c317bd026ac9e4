//! Response body decoding.
//!
//! Kismet answers either with one JSON document (`.json`) or with
//! line-delimited documents (`.itjson` / `.ekjson`), one complete JSON value
//! per line. The line decoder pulls the body a chunk at a time and only
//! parses a line when the consumer asks for the next value.
//!
//! A malformed document is fatal for the call: there is no skip-and-continue.

use std::pin::Pin;
use std::task::{Context, Poll};

use async_stream::try_stream;
use futures_util::{Stream, StreamExt};
use serde_json::Value;

use crate::error::Error;

/// Decode a complete body as one JSON value.
pub fn decode_bulk(path: &str, body: &str) -> Result<Value, Error> {
    serde_json::from_str(body).map_err(|e| Error::deserialization(path, &e, body))
}

/// Hand each element of a bulk document to `visitor`.
///
/// Arrays are visited element by element; any other document is visited
/// once as a single item.
pub fn visit_bulk<F>(value: Value, mut visitor: F)
where
    F: FnMut(Value),
{
    match value {
        Value::Array(items) => items.into_iter().for_each(&mut visitor),
        other => visitor(other),
    }
}

/// Lazily decode a line-delimited JSON body.
///
/// `body` is any chunked byte stream (a reqwest body in practice). Lines
/// may span chunks; a trailing `\r` is dropped, whitespace-only lines are
/// skipped, and a final unterminated line is decoded at end of body.
pub fn decode_lines<S, B, E>(path: String, body: S) -> impl Stream<Item = Result<Value, Error>>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    Error: From<E>,
{
    try_stream! {
        let mut buf: Vec<u8> = Vec::new();
        for await chunk in body {
            let chunk = chunk?;
            buf.extend_from_slice(chunk.as_ref());
            while let Some(pos) = buf.iter().position(|&b| b == b'\n') {
                let line: Vec<u8> = buf.drain(..=pos).collect();
                if let Some(value) = parse_line(&path, &line)? {
                    yield value;
                }
            }
        }
        if let Some(value) = parse_line(&path, &buf)? {
            yield value;
        }
    }
}

fn parse_line(path: &str, raw: &[u8]) -> Result<Option<Value>, Error> {
    let text = std::str::from_utf8(raw).map_err(|e| Error::Deserialization {
        message: format!("{path}: invalid UTF-8 in line: {e}"),
        body: String::from_utf8_lossy(raw).into_owned(),
    })?;
    let text = text.trim_end_matches(['\n', '\r']);
    if text.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(text)
        .map(Some)
        .map_err(|e| Error::deserialization(path, &e, text))
}

// ── ItJsonStream ─────────────────────────────────────────────────────

/// A finite, single-pass stream of decoded values from one request.
///
/// Not restartable: once it yields `None` it keeps yielding `None`, and a
/// fresh request is needed to read the resource again.
pub struct ItJsonStream {
    inner: Pin<Box<dyn Stream<Item = Result<Value, Error>> + Send>>,
}

impl ItJsonStream {
    pub fn new<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<Value, Error>> + Send + 'static,
    {
        Self {
            inner: Box::pin(stream),
        }
    }

    /// Drive the stream to completion, handing every value to `visitor`.
    pub async fn for_each_value<F>(mut self, mut visitor: F) -> Result<(), Error>
    where
        F: FnMut(Value),
    {
        while let Some(value) = self.next().await {
            visitor(value?);
        }
        Ok(())
    }

    /// Collect every value, stopping at the first error.
    pub async fn try_collect_values(mut self) -> Result<Vec<Value>, Error> {
        let mut out = Vec::new();
        while let Some(value) = self.next().await {
            out.push(value?);
        }
        Ok(out)
    }
}

impl Stream for ItJsonStream {
    type Item = Result<Value, Error>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl std::fmt::Debug for ItJsonStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ItJsonStream").finish_non_exhaustive()
    }
}

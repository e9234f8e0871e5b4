//! Body capture.
//!
//! `CaptureBody` wraps a body and forwards every frame unchanged while
//! appending data frames to a buffer. When the body ends, errors, or is
//! dropped early (client went away), the buffered bytes are handed to a
//! completion callback exactly once.
//!
//! The buffer is bounded by an optional limit. Frames past the limit are
//! still forwarded but no longer copied, and the capture is flagged as
//! truncated.

use axum::body::Body;
use bytes::Bytes;
use http_body::{Body as HttpBody, Frame, SizeHint};
use std::pin::Pin;
use std::task::{Context, Poll};

type OnComplete = Box<dyn FnOnce(Captured) + Send + 'static>;

/// What a capture saw.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Captured {
    pub bytes: Bytes,
    /// More data passed through than the limit allowed to keep.
    pub truncated: bool,
}

pub struct CaptureBody {
    inner: Body,
    buffer: Vec<u8>,
    limit: Option<usize>,
    truncated: bool,
    on_complete: Option<OnComplete>,
}

impl CaptureBody {
    pub fn new<F>(inner: Body, on_complete: F) -> Self
    where
        F: FnOnce(Captured) + Send + 'static,
    {
        Self {
            inner,
            buffer: Vec::new(),
            limit: None,
            truncated: false,
            on_complete: Some(Box::new(on_complete)),
        }
    }

    /// Keep at most `limit` bytes.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Wrap and convert back into an axum body.
    pub fn wrap<F>(inner: Body, on_complete: F) -> Body
    where
        F: FnOnce(Captured) + Send + 'static,
    {
        Body::new(Self::new(inner, on_complete))
    }

    /// Like [`CaptureBody::wrap`] with a capture limit.
    pub fn wrap_limited<F>(inner: Body, limit: usize, on_complete: F) -> Body
    where
        F: FnOnce(Captured) + Send + 'static,
    {
        Body::new(Self::new(inner, on_complete).limit(limit))
    }

    fn keep(&mut self, data: &[u8]) {
        let room = match self.limit {
            Some(limit) => limit.saturating_sub(self.buffer.len()),
            None => data.len(),
        };
        if data.len() > room {
            self.truncated = true;
        }
        self.buffer.extend_from_slice(&data[..data.len().min(room)]);
    }

    fn finish(&mut self) {
        if let Some(on_complete) = self.on_complete.take() {
            on_complete(Captured {
                bytes: Bytes::from(std::mem::take(&mut self.buffer)),
                truncated: self.truncated,
            });
        }
    }
}

impl HttpBody for CaptureBody {
    type Data = Bytes;
    type Error = axum::Error;

    fn poll_frame(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = &mut *self;
        match Pin::new(&mut this.inner).poll_frame(cx) {
            Poll::Ready(Some(Ok(frame))) => {
                if let Some(data) = frame.data_ref() {
                    this.keep(data);
                }
                Poll::Ready(Some(Ok(frame)))
            }
            Poll::Ready(Some(Err(err))) => {
                this.finish();
                Poll::Ready(Some(Err(err)))
            }
            Poll::Ready(None) => {
                this.finish();
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

impl Drop for CaptureBody {
    fn drop(&mut self) {
        self.finish();
    }
}

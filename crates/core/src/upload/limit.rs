//! Per-file size limit applied while the body streams.

use std::io;

use futures::StreamExt;
use thiserror::Error;

use crate::storage::ByteStream;

/// Raised inside the body stream once more than `max` bytes were seen.
#[derive(Debug, Clone, Copy, Error)]
#[error("file exceeds maximum size of {max} bytes")]
pub struct LimitExceeded {
    /// Maximum allowed size.
    pub max: u64,
}

/// Wrap `body` so it fails as soon as it yields more than `max` bytes.
///
/// The failure is an `io::Error` carrying [`LimitExceeded`], which storage
/// backends report as `StorageError::FileTooLarge`.
#[must_use]
pub fn limit_stream(body: ByteStream<'_>, max: u64) -> ByteStream<'_> {
    let mut seen: u64 = 0;
    body.map(move |chunk| {
        let chunk = chunk?;
        seen = seen.saturating_add(chunk.len() as u64);
        if seen > max {
            return Err(io::Error::other(LimitExceeded { max }));
        }
        Ok(chunk)
    })
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{byte_stream, collect_bytes};
    use bytes::Bytes;
    use futures::stream;

    #[tokio::test]
    async fn test_within_limit_passes_through() {
        let body = limit_stream(byte_stream("12345"), 5);
        assert_eq!(collect_bytes(body).await.unwrap(), b"12345");
    }

    #[tokio::test]
    async fn test_over_limit_fails_mid_stream() {
        let body: ByteStream<'_> = stream::iter(vec![
            Ok(Bytes::from_static(b"1234")),
            Ok(Bytes::from_static(b"5678")),
        ])
        .boxed();

        let err = collect_bytes(limit_stream(body, 6)).await.unwrap_err();

        let limit = err
            .get_ref()
            .and_then(|inner| inner.downcast_ref::<LimitExceeded>())
            .unwrap();
        assert_eq!(limit.max, 6);
    }
}

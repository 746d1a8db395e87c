//! Storage key allocation.
//!
//! Keys look like `{prefix}{hex4}/{hex4}/{hex4}-{unix_millis}`. Three random
//! 16-bit segments plus a millisecond timestamp make collisions negligible
//! without a central allocator, so existence is never checked.

use chrono::Utc;
use uuid::Uuid;

/// Allocate a fresh storage key under `prefix`.
///
/// `prefix` is expected to be empty or to end with `/`, as produced by
/// `StorageConfig`.
#[must_use]
pub fn allocate(prefix: &str) -> String {
    let [a, b, c] = random_segments();
    format!(
        "{prefix}{a:04x}/{b:04x}/{c:04x}-{}",
        Utc::now().timestamp_millis()
    )
}

/// Three independent random 16-bit values.
fn random_segments() -> [u16; 3] {
    let bytes = Uuid::new_v4().into_bytes();
    [
        u16::from_be_bytes([bytes[0], bytes[1]]),
        u16::from_be_bytes([bytes[2], bytes[3]]),
        u16::from_be_bytes([bytes[10], bytes[11]]),
    ]
}

//! Decoding of the binary feedback tuple.
//!
//! Each tuple is 38 bytes, big-endian:
//!
//! | offset | size | field                     |
//! |--------|------|---------------------------|
//! | 0      | 4    | failure time (unix secs)  |
//! | 4      | 2    | token length (always 32)  |
//! | 6      | 32   | device token              |

use crate::domain::FeedbackRecord;
use time::OffsetDateTime;

pub const TOKEN_LEN: usize = 32;
pub const TUPLE_LEN: usize = 4 + 2 + TOKEN_LEN;

/// Decodes one feedback tuple.
///
/// The length field is read but not checked; the fixed tuple size already implies a 32-byte token.
#[must_use]
pub fn decode(tuple: &[u8; TUPLE_LEN]) -> FeedbackRecord {
    let timestamp = u32::from_be_bytes([tuple[0], tuple[1], tuple[2], tuple[3]]);
    let _token_len = u16::from_be_bytes([tuple[4], tuple[5]]);

    // Any u32 is well inside OffsetDateTime's range.
    let failed_at = OffsetDateTime::from_unix_timestamp(i64::from(timestamp)).unwrap_or(OffsetDateTime::UNIX_EPOCH);

    FeedbackRecord { failed_at, device_token: hex::encode(&tuple[6..]) }
}

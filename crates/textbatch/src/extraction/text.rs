//! Plain text decoding.

use crate::error::{Result, TextbatchError};

/// Decode `bytes` as UTF-8 without altering them.
///
/// Unlike lossy decoding this refuses invalid input, so the text written out
/// is byte-identical to what was read.
pub fn decode_utf8(bytes: &[u8]) -> Result<String> {
    String::from_utf8(bytes.to_vec()).map_err(|e| {
        let offset = e.utf8_error().valid_up_to();
        TextbatchError::decoding_with_source(format!("Invalid UTF-8 at byte {}", offset), e)
    })
}

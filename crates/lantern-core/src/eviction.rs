//! Capacity enforcement for the token cache.
//!
//! Preference order: discard whole conversational turns (everything before
//! the earliest boundary whose tail fits) so the surviving context stays
//! coherent for attention. When no boundary satisfies the capacity, or
//! fewer than two boundaries were ever recorded, fall back to a hard front
//! truncation that may split a message.

use crate::buffer::TokenBuffer;

/// Number of front tokens to drop so `len` fits within `max_size`.
/// Returns 0 when the buffer already fits.
pub fn plan_trim(len: usize, boundaries: &[usize], max_size: usize) -> usize {
    if len <= max_size {
        return 0;
    }

    if boundaries.len() > 1 {
        for &b in boundaries {
            if len - b <= max_size {
                return b;
            }
        }
    }

    // Hard truncation. Known trade-off inherited from the original design:
    // this can cut tokens out of the middle of a single long message.
    len - max_size
}

/// Trim `buffer` down to `max_size`, re-basing surviving boundaries.
pub fn evict(buffer: &mut TokenBuffer, max_size: usize) {
    let cut = plan_trim(buffer.len(), buffer.boundaries(), max_size);
    if cut > 0 {
        log::debug!(
            "evicting {cut} of {} cached tokens (capacity {max_size})",
            buffer.len()
        );
        buffer.trim(cut);
    }
}

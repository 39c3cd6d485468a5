//! In-place, length-changing replacement of a byte range inside a bounded buffer.

use crate::matcher::Match;

/// Size of the buffer after replacing `victim` with `replacement_len` bytes, if the
/// result stays within `max_size`.
pub fn spliced_size(
    size: usize,
    victim: Match,
    replacement_len: usize,
    max_size: usize,
) -> Option<usize> {
    size.checked_sub(victim.len)
        .and_then(|rest| rest.checked_add(replacement_len))
        .filter(|&new_size| new_size <= max_size)
}

pub fn fits(size: usize, victim: Match, replacement_len: usize, max_size: usize) -> bool {
    spliced_size(size, victim, replacement_len, max_size).is_some()
}

/// Overwrites `data[victim.range()]` with `literal`, shifting the tail of the
/// buffer so that everything after the victim keeps its relative order.
///
/// `data` is the whole caller buffer; only the first `size` bytes are meaningful.
/// Returns `size - victim.len + literal.len()`.
///
/// # Panics
/// The caller must guarantee that the victim lies within `size`, that `literal` is
/// not empty and that the result fits in both `max_size` and `data`. Violating any
/// of these is a bug in the caller and aborts the mutation.
pub fn replace(
    data: &mut [u8],
    size: usize,
    max_size: usize,
    victim: Match,
    literal: &[u8],
) -> usize {
    assert!(
        victim.end() <= size && size <= data.len(),
        "victim {victim:?} outside buffer of size {size}"
    );
    assert!(!literal.is_empty(), "replacement literal must not be empty");
    let new_size = spliced_size(size, victim, literal.len(), max_size)
        .filter(|&new_size| new_size <= data.len())
        .unwrap_or_else(|| {
            panic!(
                "splicing {} bytes over {victim:?} exceeds capacity {max_size}",
                literal.len()
            )
        });

    let literal_end = victim.position + literal.len();
    if literal.len() != victim.len {
        // Overlapping move, same as memmove.
        data.copy_within(victim.end()..size, literal_end);
    }
    data[victim.position..literal_end].copy_from_slice(literal);

    new_size
}

use crate::dictionary::{Dictionary, Literal};
use std::ops::Range;

/// A byte range `[position, position + len)` inside a caller's buffer.
///
/// Produced either by [`find_literal`] or derived from a seed. It only describes
/// the buffer it was computed from and is meaningless once that buffer changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    pub position: usize,
    pub len: usize,
}

impl Match {
    pub fn new(position: usize, len: usize) -> Self {
        Self { position, len }
    }

    pub fn end(&self) -> usize {
        self.position + self.len
    }

    pub fn range(&self) -> Range<usize> {
        self.position..self.end()
    }
}

/// Leftmost occurrence of `needle` in `haystack`.
pub fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    if needle.len() > haystack.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Returns the first dictionary literal, in dictionary order, that occurs anywhere
/// in `haystack`, together with its leftmost occurrence.
///
/// Priority follows the dictionary and not the buffer: a later literal that shows
/// up earlier in `haystack` is never preferred over an earlier literal.
pub fn find_literal<'d>(
    haystack: &[u8],
    dictionary: &'d Dictionary,
) -> Option<(&'d Literal, Match)> {
    dictionary.iter().find_map(|literal| {
        find_subslice(haystack, literal.as_bytes())
            .map(|position| (literal, Match::new(position, literal.len())))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dictionary(words: &[&str]) -> Dictionary {
        words
            .iter()
            .filter_map(|word| Literal::new(word.as_bytes()))
            .collect()
    }

    #[test]
    fn dictionary_priority_beats_buffer_position() {
        let dictionary = dictionary(&["ab", "xy"]);
        let (literal, found) = find_literal(b"zzxyzzabzz", &dictionary).unwrap();
        assert_eq!(literal.as_bytes(), b"ab");
        assert_eq!(found, Match::new(6, 2));
    }

    #[test]
    fn falls_through_to_later_literals() {
        let dictionary = dictionary(&["missing", "xy"]);
        let (literal, found) = find_literal(b"zzxyzzxy", &dictionary).unwrap();
        assert_eq!(literal.as_bytes(), b"xy");
        assert_eq!(found, Match::new(2, 2));
    }

    #[test]
    fn reports_leftmost_occurrence() {
        let dictionary = dictionary(&["foo"]);
        let (_, found) = find_literal(b"foofoofoo", &dictionary).unwrap();
        assert_eq!(found, Match::new(0, 3));
    }

    #[test]
    fn no_match_for_absent_or_oversized_literals() {
        let dictionary = dictionary(&["elephant", "dog"]);
        assert!(find_literal(b"the cat", &dictionary).is_none());
        assert!(find_literal(b"", &dictionary).is_none());
        assert!(find_literal(b"anything", &Dictionary::new()).is_none());
    }

    #[test]
    fn matches_binary_literals() {
        let dictionary: Dictionary = [vec![0x00, 0xff], vec![0x7f]]
            .into_iter()
            .filter_map(|bytes| Literal::new(bytes))
            .collect();
        let (literal, found) = find_literal(&[0x7f, 0x01, 0x00, 0xff], &dictionary).unwrap();
        assert_eq!(literal.as_bytes(), &[0x00, 0xff]);
        assert_eq!(found.range(), 2..4);
    }

    #[test]
    fn find_subslice_edges() {
        assert_eq!(find_subslice(b"abc", b"abc"), Some(0));
        assert_eq!(find_subslice(b"abc", b"c"), Some(2));
        assert_eq!(find_subslice(b"ab", b"abc"), None);
        assert_eq!(find_subslice(b"abc", b""), Some(0));
    }
}

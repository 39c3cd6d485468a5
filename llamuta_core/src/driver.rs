use crate::dictionary::{Dictionary, LazyDictionary, Repr};
use crate::matcher::{Match, find_literal};
use crate::mutator::CustomMutator;
use crate::splice;
use log::{debug, trace};
use std::path::PathBuf;

/// Dictionary-guided mutator.
///
/// Looks for a known literal in the test case and swaps it for another literal picked
/// by the seed. Without a match, even seeds splice a literal over a seed-derived range;
/// everything else is handed to the engine's generic mutator.
#[derive(Debug, Default)]
pub struct DictionaryMutator {
    dictionary: LazyDictionary,
}

impl DictionaryMutator {
    /// A mutator whose dictionary is read from `source` on the first mutation.
    pub fn new(source: Option<PathBuf>) -> Self {
        Self {
            dictionary: LazyDictionary::new(source),
        }
    }

    pub fn with_dictionary(dictionary: Dictionary) -> Self {
        Self {
            dictionary: LazyDictionary::preloaded(dictionary),
        }
    }

    pub fn dictionary(&self) -> &Dictionary {
        self.dictionary.get()
    }
}

/// The range overwritten when no literal matched: `position = seed mod size` and
/// `len = seed mod (size - position)`. `size` must be non-zero.
pub fn seeded_victim(seed: u32, size: usize) -> Match {
    let seed = seed as usize;
    let position = seed % size;
    Match::new(position, seed % (size - position))
}

impl CustomMutator for DictionaryMutator {
    fn name(&self) -> &'static str {
        "dictionary"
    }

    fn mutate<D>(
        &self,
        data: &mut [u8],
        size: usize,
        max_size: usize,
        seed: u32,
        mut delegate: D,
    ) -> usize
    where
        D: FnMut(&mut [u8], usize, usize) -> usize,
    {
        let dictionary = self.dictionary.get();
        if dictionary.is_empty() {
            trace!("no literals available, delegating");
            return delegate(data, size, max_size);
        }
        if size == 0 {
            trace!("empty test case, delegating");
            return delegate(data, size, max_size);
        }

        let victim = match find_literal(&data[..size], dictionary) {
            Some((literal, found)) => {
                trace!("matched `{literal}` at {}", found.position);
                found
            }
            None if seed % 2 == 0 => seeded_victim(seed, size),
            None => {
                trace!("no literal matched and seed {seed} is odd, delegating");
                return delegate(data, size, max_size);
            }
        };

        let target = dictionary.literal_at(seed);
        let capacity = max_size.min(data.len());
        if !splice::fits(size, victim, target.len(), capacity) {
            debug!(
                "replacing {} bytes at {} with `{target}` would exceed {capacity} bytes, delegating",
                victim.len, victim.position
            );
            return delegate(data, size, max_size);
        }

        debug!(
            "replacing `{}` at {} with `{target}`",
            Repr(&data[victim.range()]),
            victim.position
        );
        splice::replace(data, size, capacity, victim, target.as_bytes())
    }
}

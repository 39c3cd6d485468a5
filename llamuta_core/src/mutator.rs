use log::info;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rand_core::SeedableRng;

/// A `CustomMutator` rewrites a test case in place inside a buffer owned by the fuzzing engine.
///
/// This is the Rust side of the engine's custom-mutator contract: the engine hands over a
/// buffer, its current length, a hard capacity and a seed, and gets back the new length.
/// Implementations may fall back to the engine's own generic mutator, which is passed in
/// explicitly on every call.
pub trait CustomMutator {
    /// Short identifier used in logs and CLI output.
    fn name(&self) -> &'static str;

    /// Mutates `data[..size]` in place and returns the new length.
    ///
    /// # Arguments
    /// * `data`: The engine's buffer. Its length is at least `max_size`; bytes past `size`
    ///   are scratch space.
    /// * `size`: Number of meaningful bytes at the start of `data`.
    /// * `max_size`: Hard upper bound for the returned length.
    /// * `seed`: The only source of randomness. Equal inputs and seeds must give equal outputs.
    /// * `delegate`: The engine's generic mutator, called as `delegate(data, size, max_size)`.
    ///   Its return value may be passed through verbatim.
    ///
    /// # Returns
    /// The new length, never larger than `max_size`.
    fn mutate<D>(
        &self,
        data: &mut [u8],
        size: usize,
        max_size: usize,
        seed: u32,
        delegate: D,
    ) -> usize
    where
        D: FnMut(&mut [u8], usize, usize) -> usize;
}

/// A `CustomMutator` that always hands the buffer to the engine's generic mutator.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughMutator;

impl CustomMutator for PassthroughMutator {
    fn name(&self) -> &'static str {
        "placeholder"
    }

    fn mutate<D>(
        &self,
        data: &mut [u8],
        size: usize,
        max_size: usize,
        _seed: u32,
        mut delegate: D,
    ) -> usize
    where
        D: FnMut(&mut [u8], usize, usize) -> usize,
    {
        info!("Using the engine's default mutator");
        delegate(data, size, max_size)
    }
}

/// A stand-in for the engine's generic mutator when no engine is around,
/// e.g. when replaying mutations from the command line.
///
/// Each call picks one byte and adds a small random value (1-15) to it, with wrapping.
/// An empty buffer first gets a single zero byte if capacity allows.
#[derive(Debug, Clone)]
pub struct ByteFlipDelegate {
    rng: ChaCha8Rng,
}

impl ByteFlipDelegate {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn mutate(&mut self, data: &mut [u8], size: usize, max_size: usize) -> usize {
        let mut size = size;
        if size == 0 {
            if max_size == 0 || data.is_empty() {
                return 0;
            }
            data[0] = 0;
            size = 1;
        }

        let random_add_value = self.rng.random_range(1u8..=15u8);
        let byte_index_to_mutate = self.rng.random_range(0..size);
        data[byte_index_to_mutate] = data[byte_index_to_mutate].wrapping_add(random_add_value);

        size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passthrough_returns_delegate_result_verbatim() {
        let mut data = *b"abcd\0\0\0\0";
        let mut calls = Vec::new();
        let new_size = PassthroughMutator.mutate(&mut data, 4, 8, 1234, |buf, size, max| {
            calls.push((size, max));
            buf[size] = b'e';
            size + 1
        });
        assert_eq!(new_size, 5);
        assert_eq!(&data[..5], b"abcde");
        assert_eq!(calls, vec![(4, 8)]);
    }

    #[test]
    fn byte_flip_delegate_mutates_one_byte() {
        let mut delegate = ByteFlipDelegate::new(0);
        let original = [10u8, 20, 30];
        let mut data = original;

        let new_size = delegate.mutate(&mut data, 3, 3);

        assert_eq!(new_size, 3, "Length should remain the same for this mutator");
        let changed = original
            .iter()
            .zip(data.iter())
            .filter(|(before, after)| before != after)
            .count();
        assert_eq!(changed, 1, "Exactly one byte should differ");
    }

    #[test]
    fn byte_flip_delegate_handles_empty_input() {
        let mut delegate = ByteFlipDelegate::new(1);
        let mut data = [0xFFu8; 4];
        assert_eq!(delegate.mutate(&mut data, 0, 4), 1);
        assert_ne!(data[0], 0, "The fresh zero byte should have been bumped");

        let mut no_room: [u8; 0] = [];
        assert_eq!(delegate.mutate(&mut no_room, 0, 0), 0);
    }

    #[test]
    fn byte_flip_delegate_is_reproducible() {
        let mut first = *b"reproducible";
        let mut second = first;
        ByteFlipDelegate::new(42).mutate(&mut first, 12, 12);
        ByteFlipDelegate::new(42).mutate(&mut second, 12, 12);
        assert_eq!(first, second);
    }
}

use crate::mutator::CustomMutator;
use log::trace;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rand_core::SeedableRng;

/// Written over inputs that are too short to be interesting XML.
pub const SEED_DOCUMENT: &[u8] = b"<person id=\"1\"><name>John Doe</name><age>30</age>\
<email>john.doe@example.com</email></person>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BracketEdit {
    /// Drop everything between a random `<` and a random `>`, both included.
    DeleteBracketRange,
    /// Drop one random `/`.
    DeleteSlash,
    /// Turn one random `<` into `>` or the other way round.
    FlipBracket,
    /// Insert a `<` and then a `>` at random positions.
    InsertPair,
}

impl BracketEdit {
    fn pick<R: Rng + ?Sized>(rng: &mut R) -> Self {
        match rng.random_range(0..4u8) {
            0 => BracketEdit::DeleteBracketRange,
            1 => BracketEdit::DeleteSlash,
            2 => BracketEdit::FlipBracket,
            _ => BracketEdit::InsertPair,
        }
    }
}

/// Heuristic mutator for XML-ish inputs that edits angle brackets and slashes,
/// then lets the engine's generic mutator finish the job.
///
/// All choices come from a ChaCha8 stream seeded with the call's seed.
#[derive(Debug, Default, Clone, Copy)]
pub struct XmlBracketMutator;

fn positions_of(bytes: &[u8], wanted: impl Fn(u8) -> bool) -> Vec<usize> {
    bytes
        .iter()
        .enumerate()
        .filter(|&(_, &byte)| wanted(byte))
        .map(|(index, _)| index)
        .collect()
}

fn pick_one<R: Rng + ?Sized>(rng: &mut R, candidates: &[usize]) -> usize {
    candidates[rng.random_range(0..candidates.len())]
}

impl CustomMutator for XmlBracketMutator {
    fn name(&self) -> &'static str {
        "xml"
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
        let capacity = max_size.min(data.len());
        if size < SEED_DOCUMENT.len() && capacity >= SEED_DOCUMENT.len() {
            trace!("input of {size} bytes replaced by the seed document");
            data[..SEED_DOCUMENT.len()].copy_from_slice(SEED_DOCUMENT);
            return SEED_DOCUMENT.len();
        }

        let mut rng = ChaCha8Rng::seed_from_u64(u64::from(seed));
        let edit = BracketEdit::pick(&mut rng);
        trace!("applying {edit:?} to {size} bytes");

        match edit {
            BracketEdit::DeleteBracketRange => {
                let lefts = positions_of(&data[..size], |byte| byte == b'<');
                let rights = positions_of(&data[..size], |byte| byte == b'>');
                if lefts.is_empty() || rights.is_empty() {
                    return delegate(data, size, max_size);
                }
                let left = pick_one(&mut rng, &lefts);
                let right = pick_one(&mut rng, &rights);
                let (low, high) = (left.min(right), left.max(right));
                data.copy_within(high + 1..size, low);
                delegate(data, size - (high - low) - 1, max_size)
            }
            BracketEdit::DeleteSlash => {
                let slashes = positions_of(&data[..size], |byte| byte == b'/');
                if slashes.is_empty() {
                    return size;
                }
                let slash = pick_one(&mut rng, &slashes);
                data.copy_within(slash + 1..size, slash);
                delegate(data, size - 1, max_size)
            }
            BracketEdit::FlipBracket => {
                let brackets = positions_of(&data[..size], |byte| byte == b'<' || byte == b'>');
                if brackets.is_empty() {
                    return size;
                }
                let bracket = pick_one(&mut rng, &brackets);
                data[bracket] = if data[bracket] == b'<' { b'>' } else { b'<' };
                delegate(data, size, max_size)
            }
            BracketEdit::InsertPair => {
                if capacity < size + 2 {
                    return size;
                }
                let left = if size == 0 {
                    0
                } else {
                    rng.random_range(0..size)
                };
                data.copy_within(left..size, left + 1);
                data[left] = b'<';

                let right = rng.random_range(0..=size);
                data.copy_within(right..size + 1, right + 1);
                data[right] = b'>';
                delegate(data, size + 2, max_size)
            }
        }
    }
}

//! libFuzzer custom-mutator hook.
//!
//! Build as a shared object and inject it into an instrumented target (for example with
//! `LD_PRELOAD`); libFuzzer then calls [`LLVMFuzzerCustomMutator`] instead of its own
//! mutation logic. The strategy is chosen once per process from the `LLAMUTA_*`
//! environment variables.

use llamuta_core::{CustomMutator, LlamutaConfig, LogSettings, MutationStrategy, logging};
use log::{info, warn};
use std::os::raw::c_uint;
use std::sync::OnceLock;

unsafe extern "C" {
    /// libFuzzer's generic mutator, resolved from the host binary.
    fn LLVMFuzzerMutate(data: *mut u8, size: usize, max_size: usize) -> usize;
}

static STRATEGY: OnceLock<MutationStrategy> = OnceLock::new();

fn strategy() -> &'static MutationStrategy {
    STRATEGY.get_or_init(|| {
        let config = match LlamutaConfig::from_env() {
            Ok(config) => config,
            Err(e) => {
                logging::init(&LogSettings::default());
                warn!("{e:#}; using built-in defaults");
                LlamutaConfig::default()
            }
        };
        logging::init(&config.log);

        let strategy = MutationStrategy::from_config(&config);
        info!(
            "custom mutator `{}` ready (dictionary: {:?})",
            strategy.name(),
            config.dictionary
        );
        strategy
    })
}

fn engine_mutate(data: &mut [u8], size: usize, max_size: usize) -> usize {
    // SAFETY: `data` is the engine's own buffer, which holds at least `max_size` bytes.
    unsafe { LLVMFuzzerMutate(data.as_mut_ptr(), size, max_size) }
}

/// Entry point called by libFuzzer for every mutation.
///
/// # Safety
/// `data` must point to a writable buffer of at least `max(size, max_size)` bytes that
/// nothing else touches for the duration of the call.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn LLVMFuzzerCustomMutator(
    data: *mut u8,
    size: usize,
    max_size: usize,
    seed: c_uint,
) -> usize {
    let strategy = strategy();
    if data.is_null() {
        // SAFETY: forwarded untouched, libFuzzer decides what a null buffer means.
        return unsafe { LLVMFuzzerMutate(data, size, max_size) };
    }

    // SAFETY: guaranteed by the caller, see above.
    let buffer = unsafe { std::slice::from_raw_parts_mut(data, size.max(max_size)) };
    strategy.mutate(buffer, size, max_size, seed, engine_mutate)
}

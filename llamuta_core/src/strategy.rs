use crate::config::{LlamutaConfig, StrategyKind};
use crate::driver::DictionaryMutator;
use crate::mutator::{CustomMutator, PassthroughMutator};
use crate::xml::XmlBracketMutator;

/// The mutator selected by configuration.
#[derive(Debug)]
pub enum MutationStrategy {
    Dictionary(DictionaryMutator),
    Placeholder(PassthroughMutator),
    Xml(XmlBracketMutator),
}

impl MutationStrategy {
    /// Builds the configured mutator. The dictionary, if any, is not read until the
    /// first mutation.
    pub fn from_config(config: &LlamutaConfig) -> Self {
        match config.strategy {
            StrategyKind::Dictionary => {
                MutationStrategy::Dictionary(DictionaryMutator::new(config.dictionary.clone()))
            }
            StrategyKind::Placeholder => MutationStrategy::Placeholder(PassthroughMutator),
            StrategyKind::Xml => MutationStrategy::Xml(XmlBracketMutator),
        }
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            MutationStrategy::Dictionary(_) => StrategyKind::Dictionary,
            MutationStrategy::Placeholder(_) => StrategyKind::Placeholder,
            MutationStrategy::Xml(_) => StrategyKind::Xml,
        }
    }
}

impl CustomMutator for MutationStrategy {
    fn name(&self) -> &'static str {
        match self {
            MutationStrategy::Dictionary(mutator) => mutator.name(),
            MutationStrategy::Placeholder(mutator) => mutator.name(),
            MutationStrategy::Xml(mutator) => mutator.name(),
        }
    }

    fn mutate<D>(
        &self,
        data: &mut [u8],
        size: usize,
        max_size: usize,
        seed: u32,
        delegate: D,
    ) -> usize
    where
        D: FnMut(&mut [u8], usize, usize) -> usize,
    {
        match self {
            MutationStrategy::Dictionary(mutator) => {
                mutator.mutate(data, size, max_size, seed, delegate)
            }
            MutationStrategy::Placeholder(mutator) => {
                mutator.mutate(data, size, max_size, seed, delegate)
            }
            MutationStrategy::Xml(mutator) => mutator.mutate(data, size, max_size, seed, delegate),
        }
    }
}

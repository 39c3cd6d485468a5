pub mod config;
pub mod dictionary;
pub mod driver;
pub mod logging;
pub mod matcher;
pub mod mutator;
pub mod splice;
pub mod strategy;
pub mod xml;

pub use config::{LlamutaConfig, LogSettings, StrategyKind};
pub use dictionary::{Dictionary, DictionaryError, EscapeError, LazyDictionary, Literal, Repr};
pub use driver::DictionaryMutator;
pub use matcher::{Match, find_literal};
pub use mutator::{ByteFlipDelegate, CustomMutator, PassthroughMutator};
pub use strategy::MutationStrategy;
pub use xml::XmlBracketMutator;

use llamuta_core::config::{LlamutaConfig, StrategyKind};
use llamuta_core::dictionary::{Dictionary, Repr};
use llamuta_core::logging;
use llamuta_core::mutator::{ByteFlipDelegate, CustomMutator};
use llamuta_core::strategy::MutationStrategy;

use anyhow::Context;
use clap::{Parser, Subcommand};
use log::debug;
use serde::Serialize;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[clap(
    author,
    version,
    about = "Inspect mutation dictionaries and replay custom mutations offline",
    long_about = None
)]
struct Cli {
    /// TOML config file. Without it, LLAMUTA_CONFIG and the other LLAMUTA_* variables apply.
    #[clap(short, long, value_parser, global = true)]
    config_file: Option<PathBuf>,
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a dictionary and list its literals in escaped form.
    Inspect {
        dictionary: PathBuf,
        /// Fail on the first malformed line instead of skipping it.
        #[clap(long)]
        strict: bool,
    },
    /// Run the configured mutator on a file, with a byte-flip stand-in for the engine.
    Mutate {
        input: PathBuf,
        #[clap(short, long)]
        dictionary: Option<PathBuf>,
        #[clap(long)]
        strategy: Option<StrategyKind>,
        #[clap(short, long, default_value_t = 0)]
        seed: u32,
        /// Buffer capacity; defaults to 4096 or the input length, whichever is larger.
        #[clap(short, long)]
        max_size: Option<usize>,
        #[clap(short, long, default_value_t = 1)]
        iterations: u32,
        #[clap(short, long)]
        output: Option<PathBuf>,
        /// Print a JSON report instead of the mutated bytes.
        #[clap(long)]
        json: bool,
    },
}

#[derive(Serialize, Debug)]
struct MutationReport {
    strategy: &'static str,
    seed: u32,
    iterations: u32,
    max_size: usize,
    input_size: usize,
    output_size: usize,
    input_md5: String,
    output_md5: String,
    output: String,
}

const DEFAULT_MAX_SIZE: usize = 4096;

fn load_config(config_file: Option<PathBuf>) -> Result<LlamutaConfig, anyhow::Error> {
    match config_file {
        Some(config_path) => LlamutaConfig::load_from_file(&config_path),
        None => LlamutaConfig::from_env(),
    }
}

fn inspect(path: &Path, strict: bool) -> Result<(), anyhow::Error> {
    let file = File::open(path).with_context(|| format!("Failed to open dictionary {path:?}"))?;
    let reader = BufReader::new(file);
    let dictionary = if strict {
        Dictionary::parse_strict(reader)?
    } else {
        Dictionary::parse(reader)?
    };

    println!("Dictionary: {path:?}");
    println!("  Literals: {}", dictionary.len());
    println!("  Fingerprint: {}", dictionary.fingerprint());
    for (index, literal) in dictionary.iter().enumerate() {
        println!("  [{index:>4}] ({:>3} bytes) {literal}", literal.len());
    }
    Ok(())
}

fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();
    let mut config = load_config(cli.config_file)?;
    logging::init(&config.log);
    debug!("Effective configuration: {config:#?}");

    match cli.command {
        Command::Inspect { dictionary, strict } => inspect(&dictionary, strict),
        Command::Mutate {
            input,
            dictionary,
            strategy,
            seed,
            max_size,
            iterations,
            output,
            json,
        } => {
            if let Some(path) = dictionary {
                config.dictionary = Some(path);
            }
            if let Some(kind) = strategy {
                config.strategy = kind;
            }

            let original = std::fs::read(&input)
                .with_context(|| format!("Failed to read input file {input:?}"))?;
            let max_size = max_size.unwrap_or(DEFAULT_MAX_SIZE).max(original.len());

            let mutator = MutationStrategy::from_config(&config);
            let mut delegate = ByteFlipDelegate::new(u64::from(seed));
            let mut buffer = vec![0u8; max_size];
            buffer[..original.len()].copy_from_slice(&original);
            let mut size = original.len();

            for i in 0..iterations {
                let round_seed = seed.wrapping_add(i);
                size = mutator.mutate(&mut buffer, size, max_size, round_seed, |data, size, max| {
                    delegate.mutate(data, size, max)
                });
                debug!("Iteration {i} (seed {round_seed}): {size} bytes");
            }
            let mutated = &buffer[..size];

            if let Some(path) = &output {
                std::fs::write(path, mutated)
                    .with_context(|| format!("Failed to write output file {path:?}"))?;
            }

            if json {
                let report = MutationReport {
                    strategy: mutator.name(),
                    seed,
                    iterations,
                    max_size,
                    input_size: original.len(),
                    output_size: size,
                    input_md5: format!("{:x}", md5::compute(&original)),
                    output_md5: format!("{:x}", md5::compute(mutated)),
                    output: Repr(mutated).to_string(),
                };
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("Strategy: {}", mutator.name());
                println!("  Size: {} -> {} (max {max_size})", original.len(), size);
                println!("  Hash: {:x}", md5::compute(mutated));
                println!("  Output: {}", Repr(mutated));
            }
            Ok(())
        }
    }
}

use clap::{Parser, Subcommand};
use scaling_bloom_rs::{BloomChain, ChainSnapshot};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the chain snapshot file
    #[arg(short, long)]
    db_path: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Insert elements into the chain, creating the snapshot if missing
    Add {
        /// Target error rate; only valid before the first insert
        #[arg(long)]
        error: Option<f64>,

        /// Elements to insert, in order
        elements: Vec<String>,
    },

    /// Check whether an element might be in the chain
    Exists {
        /// Element to check
        element: String,
    },

    /// Estimate the number of distinct elements
    Count,

    /// Display chain-level information
    Info,

    /// Display one filter's counters
    Filter {
        /// Filter position, oldest first
        index: usize,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Add { error, elements } => {
            let mut chain = load_or_create(&cli.db_path)?;
            if let Some(rate) = error {
                chain.set_error_rate(*rate)?;
            }
            let mut novel = 0u64;
            for element in elements {
                if chain.add(element.as_bytes()) {
                    novel += 1;
                }
            }
            save(&cli.db_path, &chain)?;
            println!("{novel} of {} elements were new", elements.len());
        }
        Commands::Exists { element } => {
            let chain = load(&cli.db_path)?;
            if chain.contains(element.as_bytes()) {
                println!("Element '{element}' may exist in the chain");
            } else {
                println!("Element '{element}' does not exist in the chain");
            }
        }
        Commands::Count => {
            let chain = load(&cli.db_path)?;
            println!("{}", chain.estimate_cardinality());
        }
        Commands::Info => {
            let chain = load(&cli.db_path)?;
            println!("Bloom Chain:");
            println!("  Snapshot path: {}", cli.db_path.display());
            println!("  Error rate: {}", chain.error_rate());
            println!("  Filters: {}", chain.num_filters());
            println!("  Estimated cardinality: {}", chain.estimate_cardinality());
            for index in 0..chain.num_filters() {
                let filter = chain.filter(index)?;
                println!(
                    "  Filter {index}: k={} s={} b={}/{}",
                    filter.params().num_partitions,
                    filter.params().partition_bits,
                    filter.bits_set(),
                    filter.params().max_bits_set,
                );
            }
        }
        Commands::Filter { index } => {
            let chain = load(&cli.db_path)?;
            let filter = chain.filter(*index)?;
            println!(
                "k:{} s:{} b:{}",
                filter.params().num_partitions,
                filter.params().partition_bits,
                filter.bits_set()
            );
        }
    }

    Ok(())
}

fn load(path: &Path) -> Result<BloomChain, Box<dyn std::error::Error>> {
    let bytes = fs::read(path)?;
    let chain = ChainSnapshot::from_bytes(&bytes)?.try_into()?;
    Ok(chain)
}

fn load_or_create(path: &Path) -> Result<BloomChain, Box<dyn std::error::Error>> {
    if path.exists() {
        load(path)
    } else {
        Ok(BloomChain::new())
    }
}

fn save(path: &Path, chain: &BloomChain) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = ChainSnapshot::from(chain).to_bytes()?;
    fs::write(path, bytes)?;
    Ok(())
}

//! EmbeDB Command-Line Interface
//!
//! A CLI tool for inspecting and exercising EmbeDB cache files.
//!
//! # Commands
//!
//! - `info` - Display store information
//! - `get` - Get a vector by key
//! - `put` - Insert a vector
//! - `similar` - Find the nearest stored vector to a query
//!
//! Keys are hashed before they hit the file, so there is no way to list
//! them back; lookups require the original key text.

use std::path::Path;

use clap::{Parser, Subcommand};
use embedb::types::{FileHeader, HEADER_SIZE};
use embedb::EmbedStore;

/// EmbeDB CLI - Command-line interface for EmbeDB embedding caches
#[derive(Parser, Debug)]
#[command(name = "embedb")]
#[command(author, version, about = "EmbeDB embedding cache CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show store info
    Info {
        /// Path to store file
        path: String,
    },
    /// Get a vector by key
    Get {
        /// Path to store file
        path: String,
        /// Key to retrieve
        key: String,
    },
    /// Insert a vector
    Put {
        /// Path to store file
        path: String,
        /// Key to insert under
        key: String,
        /// Vector as comma-separated floats
        vector: String,
        /// Vector dimensions (used when creating a new store)
        #[arg(short, long, default_value = "1536")]
        dimensions: u32,
    },
    /// Find the stored vector most similar to a query
    Similar {
        /// Path to store file
        path: String,
        /// Query vector as comma-separated floats
        #[arg(short, long)]
        query: String,
        /// Minimum cosine score to accept
        #[arg(short, long, default_value = "0.8")]
        threshold: f32,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Info { path } => cmd_info(&path),
        Commands::Get { path, key } => cmd_get(&path, &key),
        Commands::Put {
            path,
            key,
            vector,
            dimensions,
        } => cmd_put(&path, &key, &vector, dimensions),
        Commands::Similar {
            path,
            query,
            threshold,
        } => cmd_similar(&path, &query, threshold),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Reads the on-disk header to learn the store's dimension, so commands
/// other than `put` don't need a --dimensions flag.
fn read_dimension(path: &str) -> Result<u32, Box<dyn std::error::Error>> {
    if !Path::new(path).exists() {
        return Err(format!("Store not found: {}", path).into());
    }

    let bytes = std::fs::read(path)?;
    if bytes.len() < HEADER_SIZE {
        return Err(format!("File too short to be an EmbeDB store: {}", path).into());
    }

    let buf: &[u8; HEADER_SIZE] = bytes[..HEADER_SIZE].try_into()?;
    let header = FileHeader::decode(buf)?;
    Ok(header.dimension)
}

/// Display store information
fn cmd_info(path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let dimension = read_dimension(path)?;
    let store = EmbedStore::open(path, dimension)?;
    let stats = store.stats()?;

    println!("Store: {}", path);
    println!(
        "File size: {} bytes ({:.2} KB)",
        stats.file_size,
        stats.file_size as f64 / 1024.0
    );
    println!("Dimension: {}", stats.dimension);
    println!("Records: {}", stats.records);
    println!(
        "Cache: {}/{} vectors",
        stats.cache_size, stats.cache_capacity
    );
    println!("\n{}", serde_json::to_string_pretty(&stats)?);

    Ok(())
}

/// Get a vector by key
fn cmd_get(path: &str, key: &str) -> Result<(), Box<dyn std::error::Error>> {
    let dimension = read_dimension(path)?;
    let store = EmbedStore::open(path, dimension)?;

    match store.get(key) {
        Ok(vector) => println!("{}", format_vector(&vector)),
        Err(embedb::EmbedError::NotFound) => println!("Key not found: {}", key),
        Err(e) => return Err(e.into()),
    }

    Ok(())
}

/// Insert a vector
fn cmd_put(
    path: &str,
    key: &str,
    vector: &str,
    dimensions: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let values = parse_vector(vector)?;

    // An existing store dictates its own dimension.
    let dimension = if Path::new(path).exists() {
        read_dimension(path)?
    } else {
        dimensions
    };

    let store = EmbedStore::open(path, dimension)?;
    store.insert(key, &values)?;
    store.close()?;

    println!("Inserted {} ({} dims)", key, values.len());
    Ok(())
}

/// Find the most similar stored vector
fn cmd_similar(path: &str, query: &str, threshold: f32) -> Result<(), Box<dyn std::error::Error>> {
    let values = parse_vector(query)?;
    let dimension = read_dimension(path)?;
    let store = EmbedStore::open(path, dimension)?;

    match store.find_similar(&values, threshold) {
        Ok((vector, score)) => {
            println!("Score: {:.6}", score);
            println!("{}", format_vector(&vector));
        }
        Err(embedb::EmbedError::NotFound) => {
            println!("No vector met threshold {:.4}", threshold);
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}

/// Parses a comma-separated float list like "0.1,0.2,0.3".
fn parse_vector(input: &str) -> Result<Vec<f32>, Box<dyn std::error::Error>> {
    input
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<f32>()
                .map_err(|_| format!("Invalid float: {}", part).into())
        })
        .collect()
}

/// Formats a vector for terminal output, eliding long tails.
fn format_vector(vector: &[f32]) -> String {
    const SHOWN: usize = 8;
    let shown: Vec<String> = vector.iter().take(SHOWN).map(|v| format!("{:.6}", v)).collect();
    if vector.len() > SHOWN {
        format!(
            "[{}, ... {} more] ({} dims)",
            shown.join(", "),
            vector.len() - SHOWN,
            vector.len()
        )
    } else {
        format!("[{}] ({} dims)", shown.join(", "), vector.len())
    }
}

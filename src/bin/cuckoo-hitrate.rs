//! Hit-rate driver for the cuckoo table.
//!
//! Loads a tab-separated `key<TAB>value` file, inserts every entry into a
//! table, then reads every key back and reports how often `get` returns the
//! exact value and how often `contains` finds the key.

use anyhow::{Context, Result, bail};
use clap::Parser;
use cuckoo_table::{CuckooTable, DEFAULT_BUCKET_SIZE, DEFAULT_FINGERPRINT_LEN, DEFAULT_MAX_KICKS};
use log::{info, warn};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Command line arguments for the hit-rate driver.
#[derive(Parser, Debug)]
#[command(name = "cuckoo-hitrate", version, about)]
struct Args {
    /// Tab-separated file of `key<TAB>value` lines
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Number of buckets, rounded up to a power of two
    #[arg(short, long, default_value_t = 1 << 22)]
    capacity: usize,

    /// Fingerprint length in bytes (1 to 8)
    #[arg(short, long, default_value_t = DEFAULT_FINGERPRINT_LEN)]
    fingerprint_len: usize,

    /// Slots per bucket
    #[arg(short, long, default_value_t = DEFAULT_BUCKET_SIZE)]
    bucket_size: usize,

    /// Relocation budget per insert
    #[arg(short, long, default_value_t = DEFAULT_MAX_KICKS)]
    max_kicks: usize,

    /// Seed for the relocation rng; random when omitted
    #[arg(short, long)]
    seed: Option<u64>,
}

/// Outcome of loading a data set into a table and reading it back.
#[derive(Debug, PartialEq)]
struct Report {
    entries: usize,
    failed_inserts: usize,
    value_misses: usize,
    existence_misses: usize,
    load_factor: f64,
}

impl Report {
    fn rate(&self, misses: usize) -> f64 {
        if self.entries == 0 {
            return 1.0;
        }
        (self.entries - misses) as f64 / self.entries as f64
    }
}

/// Parse `key<TAB>value` lines. Blank lines are skipped and fields after the
/// second are ignored; a later line for the same key replaces the earlier one.
fn parse_entries<R: BufRead>(reader: R) -> Result<HashMap<String, f64>> {
    let mut entries = HashMap::new();
    for (index, line) in reader.lines().enumerate() {
        let number = index + 1;
        let line = line.with_context(|| format!("failed to read line {number}"))?;
        if line.trim().is_empty() {
            continue;
        }
        let mut fields = line.split('\t');
        let (Some(key), Some(value)) = (fields.next(), fields.next()) else {
            bail!("line {number}: expected key<TAB>value");
        };
        let value: f64 = value
            .trim()
            .parse()
            .with_context(|| format!("line {number}: invalid value {value:?}"))?;
        entries.insert(key.to_string(), value);
    }
    Ok(entries)
}

fn read_entries(path: &Path) -> Result<HashMap<String, f64>> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    parse_entries(BufReader::new(file))
}

/// Insert every entry, then look every key up again.
fn measure(table: &mut CuckooTable, entries: &HashMap<String, f64>) -> Report {
    let failed_inserts = entries
        .iter()
        .filter(|(key, value)| table.insert(key.as_str(), **value).is_err())
        .count();
    if failed_inserts > 0 {
        warn!("{failed_inserts} of {} inserts failed", entries.len());
    }

    let value_misses = entries
        .iter()
        .filter(|(key, value)| table.get(key.as_str()) != Some(**value))
        .count();
    let existence_misses = entries
        .keys()
        .filter(|key| !table.contains(key.as_str()))
        .count();

    Report {
        entries: entries.len(),
        failed_inserts,
        value_misses,
        existence_misses,
        load_factor: table.load_factor(),
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let mut builder = CuckooTable::builder()
        .capacity(args.capacity)
        .fingerprint_len(args.fingerprint_len)
        .bucket_size(args.bucket_size)
        .max_kicks(args.max_kicks);
    if let Some(seed) = args.seed {
        builder = builder.seed(seed);
    }
    let mut table = builder.build().context("invalid table configuration")?;

    let entries = read_entries(&args.input)?;
    info!("loaded {} entries from {}", entries.len(), args.input.display());

    let report = measure(&mut table, &entries);

    println!("get value rate");
    println!("  misses: {}", report.value_misses);
    println!("  rate:   {:.6}", report.rate(report.value_misses));
    println!();
    println!("contains rate");
    println!("  misses: {}", report.existence_misses);
    println!("  rate:   {:.6}", report.rate(report.existence_misses));
    println!();
    println!("failed inserts: {}", report.failed_inserts);
    println!("load factor:    {:.4}", report.load_factor);

    Ok(())
}

//! # Morphogen IO
//!
//! Persistence for genomes and developed phenotypes.
//!
//! This crate provides:
//! - Structured error handling with a crate-wide error type
//! - The line-oriented genome file format
//! - JSON and HexDNA encodings of whole genomes
//! - rkyv archives for handing phenotypes to a simulation runtime

/// Error types and result aliases for I/O operations
pub mod error;
/// Line-oriented `OPEN`/`ARGS`/`CLOSE` genome file format
pub mod genome_file;
/// rkyv archives of developed phenotypes
pub mod persistence;
/// Validated JSON and HexDNA helpers for genomes
pub mod serialization;

pub use error::{IoError, Result};
pub use genome_file::{parse_forest, read_genome_file, render_forest, write_genome_file};
pub use persistence::{load_phenotype, phenotype_from_bytes, phenotype_to_bytes, save_phenotype};
pub use serialization::{
    genome_digest, genome_from_hex, genome_from_json, genome_to_hex, genome_to_json, read_genome_json,
    write_genome_json,
};

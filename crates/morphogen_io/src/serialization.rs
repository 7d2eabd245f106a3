//! Whole-genome JSON and HexDNA encodings.
//!
//! Unlike the genome file format these keep the id, lineage and mutation
//! intensity. Every decode re-validates the forest, so a hand-edited genome
//! cannot smuggle in an arity violation.

use crate::error::{IoError, Result};
use morphogen_core::genome::Genome;
use std::path::Path;

fn checked(genome: Genome) -> Result<Genome> {
    genome
        .forest
        .validate()
        .map_err(|e| IoError::validation(e.to_string()))?;
    if genome.avg_mutations == 0 {
        return Err(IoError::validation("avg_mutations must be at least 1"));
    }
    Ok(genome)
}

pub fn genome_to_json(genome: &Genome) -> Result<String> {
    serde_json::to_string_pretty(genome)
        .map_err(|e| IoError::serialization(format!("JSON serialization failed: {}", e)))
}

pub fn genome_from_json(json: &str) -> Result<Genome> {
    if json.trim().is_empty() {
        return Err(IoError::validation("Empty JSON string"));
    }
    let genome: Genome = serde_json::from_str(json)?;
    checked(genome)
}

/// Base16 of the compact JSON encoding.
pub fn genome_to_hex(genome: &Genome) -> Result<String> {
    let json = serde_json::to_vec(genome)
        .map_err(|e| IoError::serialization(format!("JSON serialization failed: {}", e)))?;
    Ok(hex::encode(json))
}

pub fn genome_from_hex(hex_str: &str) -> Result<Genome> {
    let hex_str = hex_str.trim();
    if hex_str.is_empty() {
        return Err(IoError::validation("Empty hex string"));
    }
    let bytes = hex::decode(hex_str)
        .map_err(|e| IoError::validation(format!("Invalid hex encoding: {}", e)))?;
    let genome: Genome = serde_json::from_slice(&bytes)?;
    checked(genome)
}

/// Short content hash for log lines and file names.
pub fn genome_digest(genome: &Genome) -> Result<String> {
    use sha2::{Digest, Sha256};
    let json = serde_json::to_vec(&genome.forest)
        .map_err(|e| IoError::serialization(format!("JSON serialization failed: {}", e)))?;
    let digest = Sha256::digest(&json);
    Ok(hex::encode(&digest[..8]))
}

pub fn write_genome_json<P: AsRef<Path>>(genome: &Genome, path: P) -> Result<()> {
    let json = genome_to_json(genome)?;
    std::fs::write(&path, json).map_err(|e| {
        IoError::FileSystem(e).with_context(format!("writing JSON to {:?}", path.as_ref()))
    })?;
    Ok(())
}

pub fn read_genome_json<P: AsRef<Path>>(path: P) -> Result<Genome> {
    let json = std::fs::read_to_string(&path).map_err(|e| {
        IoError::FileSystem(e).with_context(format!("reading JSON from {:?}", path.as_ref()))
    })?;
    genome_from_json(&json)
}

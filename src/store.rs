//! Genome storage chosen by file extension.
//!
//! | Extension | Encoding |
//! |---|---|
//! | `.json` | whole genome as JSON |
//! | `.hex` | whole genome as HexDNA |
//! | anything else | forest only, in the line-oriented genome file format |
//!
//! The genome file format carries no id or mutation intensity; loading one
//! assigns the given id and intensity.

use morphogen_core::genome::{Genome, GenomeId};
use morphogen_data::CellOp;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenomeEncoding {
    Json,
    Hex,
    Text,
}

impl GenomeEncoding {
    #[must_use]
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::Json,
            Some("hex") => Self::Hex,
            _ => Self::Text,
        }
    }
}

/// Loads a genome; `id` and `avg_mutations` only apply to text files.
pub fn load_genome(path: &Path, id: GenomeId, avg_mutations: u32) -> anyhow::Result<Genome> {
    let genome = match GenomeEncoding::for_path(path) {
        GenomeEncoding::Json => morphogen_io::read_genome_json(path)?,
        GenomeEncoding::Hex => {
            let text = std::fs::read_to_string(path)?;
            morphogen_io::genome_from_hex(&text)?
        }
        GenomeEncoding::Text => {
            let forest = morphogen_io::read_genome_file::<CellOp, _>(path)?;
            Genome::from_forest(id, forest, avg_mutations)
        }
    };
    Ok(genome)
}

pub fn save_genome(genome: &Genome, path: &Path) -> anyhow::Result<()> {
    match GenomeEncoding::for_path(path) {
        GenomeEncoding::Json => morphogen_io::write_genome_json(genome, path)?,
        GenomeEncoding::Hex => std::fs::write(path, morphogen_io::genome_to_hex(genome)?)?,
        GenomeEncoding::Text => morphogen_io::write_genome_file(&genome.forest, path)?,
    }
    Ok(())
}

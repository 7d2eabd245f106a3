//! rkyv archives of developed phenotypes.
//!
//! A phenotype is immutable once developed; the archive is the handoff format
//! to whatever runtime simulates it. Archives are validated on read.

use crate::error::{IoError, Result};
use morphogen_data::Phenotype;
use rkyv::de::deserializers::SharedDeserializeMap;
use rkyv::ser::serializers::AllocSerializer;
use rkyv::ser::Serializer;
use rkyv::Deserialize;
use std::path::Path;

pub fn phenotype_to_bytes(phenotype: &Phenotype) -> Result<Vec<u8>> {
    let mut serializer = AllocSerializer::<4096>::default();
    serializer
        .serialize_value(phenotype)
        .map_err(|e| IoError::rkyv(format!("serialization failed: {:?}", e)))?;
    Ok(serializer.into_serializer().into_inner().to_vec())
}

/// Validates and deserializes an archive, then checks the CSR layout.
pub fn phenotype_from_bytes(bytes: &[u8]) -> Result<Phenotype> {
    let mut aligned = rkyv::AlignedVec::with_capacity(bytes.len());
    aligned.extend_from_slice(bytes);
    let archived = rkyv::check_archived_root::<Phenotype>(&aligned)
        .map_err(|e| IoError::rkyv(format!("validation failed: {:?}", e)))?;
    let mut deserializer = SharedDeserializeMap::default();
    let phenotype: Phenotype = archived
        .deserialize(&mut deserializer)
        .map_err(|e| IoError::rkyv(format!("deserialization failed: {:?}", e)))?;
    phenotype
        .validate()
        .map_err(|e| IoError::validation(e.to_string()))?;
    Ok(phenotype)
}

pub fn save_phenotype<P: AsRef<Path>>(phenotype: &Phenotype, path: P) -> Result<()> {
    let bytes = phenotype_to_bytes(phenotype)?;
    std::fs::write(&path, &bytes).map_err(|e| {
        IoError::FileSystem(e).with_context(format!("writing phenotype to {:?}", path.as_ref()))
    })?;
    tracing::debug!(
        path = %path.as_ref().display(),
        bytes = bytes.len(),
        neurons = phenotype.neuron_count(),
        "Phenotype archived"
    );
    Ok(())
}

pub fn load_phenotype<P: AsRef<Path>>(path: P) -> Result<Phenotype> {
    let bytes = std::fs::read(&path).map_err(|e| {
        IoError::FileSystem(e).with_context(format!("reading phenotype from {:?}", path.as_ref()))
    })?;
    phenotype_from_bytes(&bytes)
}

//! # Morphogen
//!
//! Cellular-encoding neuroevolution: genomes made of instruction trees that
//! develop into neural networks.
//!
//! The work is split across three crates, re-exported here:
//! - [`morphogen_data`]: instruction set and phenotype records
//! - [`morphogen_core`]: trees, genetic operators and the development engine
//! - [`morphogen_io`]: genome files, JSON/HexDNA and phenotype archives

pub mod store;

pub use morphogen_core::config::{AppConfig, DevelopmentConfig, EvolutionConfig};
pub use morphogen_core::develop::{BodyPlan, DevelopmentStats, Embryo};
pub use morphogen_core::genome::{
    DevelopCpu, Genome, GenomeId, GenomeLogic, IdAllocator, MutationReport,
};
pub use morphogen_core::program::{Forest, NodeId, ProgramTree};
pub use morphogen_core::{init_logging, metrics};
pub use morphogen_data::{
    CellOp, CoefEdit, CoefTarget, Instruction, LabelTable, NeuronClass, Phenotype, RegisterEdit,
};
pub use morphogen_io::{IoError, Result as IoResult};

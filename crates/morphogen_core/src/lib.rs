//! # Morphogen Core
//!
//! Cellular-encoding genomes and the developmental engine that grows them
//! into neural networks.
//!
//! This crate contains:
//! - Arity-typed instruction trees and forests
//! - Mutation and crossover operators that keep every tree well-formed
//! - The tick-based cell development engine
//! - Flattening of developed cells into a compact phenotype
//! - Configuration and structured logging
//!
//! ## Example
//!
//! ```
//! use morphogen_core::config::{DevelopmentConfig, EvolutionConfig};
//! use morphogen_core::develop::BodyPlan;
//! use morphogen_core::genome::{DevelopCpu, Genome, GenomeLogic, IdAllocator};
//! use morphogen_data::LabelTable;
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! let mut rng = ChaCha8Rng::seed_from_u64(42);
//! let mut ids = IdAllocator::new();
//! let genome = Genome::new_random_with_rng(&EvolutionConfig::default(), &mut ids, &mut rng);
//!
//! let body = BodyPlan::new().sensor("knee").motor("hip");
//! let mut labels = LabelTable::new();
//! let net = genome.develop(&body, &DevelopmentConfig::default(), &mut labels);
//! assert!(net.neuron_count() >= 3);
//! ```

/// Genetic operator and development parameters
pub mod config;
/// Cell population, development ticks and phenotype flattening
pub mod develop;
/// Genome type, genetic operators and the develop contract
pub mod genome;
/// Structured logging setup
pub mod metrics;
/// Arena-backed instruction trees, structural edits and random generation
pub mod program;

pub use config::AppConfig;
pub use develop::{BodyPlan, DevelopmentStats, Embryo};
pub use genome::{DevelopCpu, Genome, GenomeId, GenomeLogic, IdAllocator};
pub use metrics::init_logging;
pub use morphogen_data::{CellOp, Instruction, LabelTable, Phenotype};
pub use program::{Forest, NodeId, ProgramTree};

//! Core data structures shared by the development engine and its consumers.

pub mod instruction;
pub mod phenotype;

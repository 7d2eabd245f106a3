pub mod crossover;
pub mod mutation;

pub use crossover::{forest_crossover, node_swap_crossover};
pub use mutation::{mutate_forest, mutate_node, resolve_kind, MutationKind, MutationReport};

use crate::config::{DevelopmentConfig, EvolutionConfig};
use crate::develop::{BodyPlan, DevelopmentStats, Embryo};
use crate::program::{random_tree, Forest};
use morphogen_data::{CellOp, LabelTable, Phenotype};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Stable identity of a genome across generations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GenomeId(pub u64);

/// Hands out fresh genome ids. Owned by the evolutionary loop and passed to
/// every operation that creates a genome.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Continues numbering after `last`.
    #[must_use]
    pub fn starting_after(last: GenomeId) -> Self {
        Self { next: last.0 + 1 }
    }

    pub fn next_id(&mut self) -> GenomeId {
        let id = GenomeId(self.next);
        self.next += 1;
        id
    }
}

/// A cellular-encoding genome: a forest of cell programs plus the
/// self-adapting mutation intensity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genome {
    pub id: GenomeId,
    pub parents: Vec<GenomeId>,
    pub forest: Forest<CellOp>,
    /// Expected number of node mutations per mutation pass. Never below 1.
    pub avg_mutations: u32,
}

impl Genome {
    #[must_use]
    pub fn from_forest(id: GenomeId, forest: Forest<CellOp>, avg_mutations: u32) -> Self {
        Self {
            id,
            parents: Vec::new(),
            forest,
            avg_mutations: avg_mutations.max(1),
        }
    }

    /// Develops into a phenotype and also returns the development counters.
    pub fn develop_with_stats(
        &self,
        body: &BodyPlan,
        config: &DevelopmentConfig,
        labels: &mut LabelTable,
    ) -> (Phenotype, DevelopmentStats) {
        let mut embryo = Embryo::new(&self.forest, config, body);
        let stats = embryo.run();
        let phenotype = embryo.flatten(labels);
        tracing::debug!(
            genome = self.id.0,
            ticks = stats.ticks,
            divisions = stats.divisions,
            neurons = phenotype.neuron_count(),
            synapses = phenotype.synapse_count(),
            "Genome developed"
        );
        (phenotype, stats)
    }

    pub fn to_hex(&self) -> String {
        let bytes = serde_json::to_vec(self).unwrap_or_default();
        hex::encode(bytes)
    }

    pub fn from_hex(hex_str: &str) -> anyhow::Result<Self> {
        let bytes = hex::decode(hex_str)?;
        let genome: Self = serde_json::from_slice(&bytes)?;
        genome.forest.validate()?;
        Ok(genome)
    }
}

/// Genetic operators every genome representation provides.
pub trait GenomeLogic: Sized {
    fn new_random_with_rng<R: Rng + ?Sized>(
        config: &EvolutionConfig,
        ids: &mut IdAllocator,
        rng: &mut R,
    ) -> Self;

    /// Mutates in place and returns what was done.
    fn mutate_with_config<R: Rng + ?Sized>(
        &mut self,
        config: &EvolutionConfig,
        rng: &mut R,
    ) -> MutationReport;

    /// Two offspring from crossing `self` with `other`. Parents are untouched.
    fn reproduce_with_rng<R: Rng + ?Sized>(
        &self,
        other: &Self,
        config: &EvolutionConfig,
        ids: &mut IdAllocator,
        rng: &mut R,
    ) -> (Self, Self);

    /// Exact copy under a fresh id, recording `self` as the only parent.
    fn clone_offspring(&self, ids: &mut IdAllocator) -> Self;

    /// Total node count.
    fn size(&self) -> usize;
}

/// Turns a genome into a flat network.
pub trait DevelopCpu {
    fn develop(
        &self,
        body: &BodyPlan,
        config: &DevelopmentConfig,
        labels: &mut LabelTable,
    ) -> Phenotype;
}

impl GenomeLogic for Genome {
    fn new_random_with_rng<R: Rng + ?Sized>(
        config: &EvolutionConfig,
        ids: &mut IdAllocator,
        rng: &mut R,
    ) -> Self {
        let trees = (0..config.initial_trees)
            .map(|i| {
                random_tree(
                    i,
                    config.initial_depth,
                    config.terminal_chance,
                    config.arg_spread,
                    rng,
                )
            })
            .collect();
        Self::from_forest(
            ids.next_id(),
            Forest::new(trees),
            config.initial_avg_mutations,
        )
    }

    fn mutate_with_config<R: Rng + ?Sized>(
        &mut self,
        config: &EvolutionConfig,
        rng: &mut R,
    ) -> MutationReport {
        let mut report = mutate_forest(&mut self.forest, self.avg_mutations, config, rng);

        if self.forest.len() < config.max_trees && rng.gen_bool(config.add_tree_rate) {
            let tree = random_tree(
                self.forest.len(),
                config.initial_depth,
                config.terminal_chance,
                config.arg_spread,
                rng,
            );
            self.forest.push(tree);
            report.trees_added += 1;
        }

        if rng.gen_bool(config.avg_mutation_drift_rate) {
            self.avg_mutations = if rng.gen_bool(0.5) {
                self.avg_mutations + 1
            } else {
                self.avg_mutations.saturating_sub(1).max(1)
            };
        }

        tracing::trace!(
            genome = self.id.0,
            applied = report.applied(),
            avg_mutations = self.avg_mutations,
            "Genome mutated"
        );
        report
    }

    fn reproduce_with_rng<R: Rng + ?Sized>(
        &self,
        other: &Self,
        config: &EvolutionConfig,
        ids: &mut IdAllocator,
        rng: &mut R,
    ) -> (Self, Self) {
        let (first, second) = if rng.gen_bool(config.forest_crossover_rate) {
            forest_crossover(&self.forest, &other.forest, rng)
        } else {
            node_swap_crossover(&self.forest, &other.forest, rng)
        };
        let parents = vec![self.id, other.id];
        let child = |id: GenomeId, forest: Forest<CellOp>, avg: u32| Self {
            id,
            parents: parents.clone(),
            forest,
            avg_mutations: avg,
        };
        (
            child(ids.next_id(), first, self.avg_mutations),
            child(ids.next_id(), second, other.avg_mutations),
        )
    }

    fn clone_offspring(&self, ids: &mut IdAllocator) -> Self {
        Self {
            id: ids.next_id(),
            parents: vec![self.id],
            forest: self.forest.clone(),
            avg_mutations: self.avg_mutations,
        }
    }

    fn size(&self) -> usize {
        self.forest.size()
    }
}

impl DevelopCpu for Genome {
    fn develop(
        &self,
        body: &BodyPlan,
        config: &DevelopmentConfig,
        labels: &mut LabelTable,
    ) -> Phenotype {
        self.develop_with_stats(body, config, labels).0
    }
}

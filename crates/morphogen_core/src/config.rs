//! Configuration for the genetic operators and the development engine.
//!
//! All parameters map onto a `config.toml` file; missing sections fall back
//! to the `Default` impls.
//!
//! ## Example `config.toml`
//!
//! ```toml
//! [evolution]
//! initial_avg_mutations = 3
//! instruction_change_rate = 0.5
//! arg_spread = 2
//!
//! [development]
//! initial_life = 4
//! register_step = 0.1
//! ```

use serde::{Deserialize, Serialize};

/// Genetic operator parameters.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct EvolutionConfig {
    /// Expected mutations per genome for freshly created genomes.
    pub initial_avg_mutations: u32,
    /// Chance per mutation pass that the genome's own average drifts by one.
    pub avg_mutation_drift_rate: f64,
    /// Chance that a "change" mutation replaces the instruction rather than
    /// one argument.
    pub instruction_change_rate: f64,
    /// Longest instruction chain spliced in by an "insert" mutation.
    pub max_insert_chain: usize,
    /// Fresh arguments are drawn from `[-arg_spread, arg_spread]`.
    pub arg_spread: i32,
    /// Chance per mutation pass of appending a fresh random tree.
    pub add_tree_rate: f64,
    pub max_trees: usize,
    pub initial_trees: usize,
    pub initial_depth: usize,
    /// Chance that a non-root slot closes with a terminal during random growth.
    pub terminal_chance: f64,
    /// Chance that reproduction uses the forest segment crossover instead of
    /// the single-node swap.
    pub forest_crossover_rate: f64,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            initial_avg_mutations: 3,
            avg_mutation_drift_rate: 0.1,
            instruction_change_rate: 0.5,
            max_insert_chain: 2,
            arg_spread: 2,
            add_tree_rate: 0.02,
            max_trees: 8,
            initial_trees: 2,
            initial_depth: 5,
            terminal_chance: 0.3,
            forest_crossover_rate: 0.2,
        }
    }
}

/// Development engine parameters: initial cell registers and edit steps.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct DevelopmentConfig {
    /// Jumps a cell may take before it is forced to end.
    pub initial_life: i32,
    /// Increment used by bias/threshold/sigmoid/adaptation/decay edits.
    pub register_step: f32,
    /// Increment used by coefficient and learning-rate edits.
    pub coefficient_step: f32,
    pub initial_threshold: f32,
    pub initial_bias: f32,
    pub initial_sigmoid_alpha: f32,
    pub initial_adaptation: f32,
    pub initial_decay: f32,
    /// Coefficients A..D of newly created synapses.
    pub synapse_coefficients: [f32; 4],
    pub synapse_learning_rate: f32,
}

impl Default for DevelopmentConfig {
    fn default() -> Self {
        Self {
            initial_life: 4,
            register_step: 0.1,
            coefficient_step: 0.1,
            initial_threshold: 0.0,
            initial_bias: 0.0,
            initial_sigmoid_alpha: 1.0,
            initial_adaptation: 0.0,
            initial_decay: 0.0,
            synapse_coefficients: [1.0, 0.0, 0.0, 0.0],
            synapse_learning_rate: 0.0,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub evolution: EvolutionConfig,
    pub development: DevelopmentConfig,
}

impl AppConfig {
    /// Validates all configuration parameters.
    ///
    /// Returns `Ok(())` if all parameters are valid, or `Err` with a
    /// description of the first validation failure.
    pub fn validate(&self) -> anyhow::Result<()> {
        let evo = &self.evolution;
        anyhow::ensure!(
            evo.initial_avg_mutations >= 1,
            "Initial average mutations must be at least 1"
        );
        for (name, rate) in [
            ("Average mutation drift rate", evo.avg_mutation_drift_rate),
            ("Instruction change rate", evo.instruction_change_rate),
            ("Add tree rate", evo.add_tree_rate),
            ("Terminal chance", evo.terminal_chance),
            ("Forest crossover rate", evo.forest_crossover_rate),
        ] {
            anyhow::ensure!(
                (0.0..=1.0).contains(&rate),
                "{} must be in [0.0, 1.0]",
                name
            );
        }
        anyhow::ensure!(evo.max_insert_chain >= 1, "Max insert chain must be positive");
        anyhow::ensure!(evo.arg_spread >= 1, "Argument spread must be positive");
        anyhow::ensure!(evo.initial_trees >= 1, "Genomes need at least one tree");
        anyhow::ensure!(
            evo.max_trees >= evo.initial_trees,
            "Max trees must be at least the initial tree count"
        );
        anyhow::ensure!(evo.initial_depth >= 1, "Initial depth must be positive");
        anyhow::ensure!(
            evo.initial_depth <= 64,
            "Initial depth too large (max 64)"
        );

        let dev = &self.development;
        anyhow::ensure!(dev.initial_life >= 0, "Initial life must be non-negative");
        anyhow::ensure!(
            dev.register_step.is_finite() && dev.coefficient_step.is_finite(),
            "Edit steps must be finite"
        );
        anyhow::ensure!(
            dev.synapse_coefficients.iter().all(|c| c.is_finite()),
            "Synapse coefficients must be finite"
        );
        Ok(())
    }

    /// Parses and validates a TOML document.
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config = toml::from_str::<Self>(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "Config file missing, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    #[must_use]
    pub fn fingerprint(&self) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(format!("{:?}", self.evolution).as_bytes());
        hasher.update(format!("{:?}", self.development).as_bytes());
        hex::encode(hasher.finalize())
    }
}

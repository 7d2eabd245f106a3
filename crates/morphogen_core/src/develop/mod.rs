//! Developmental engine: grows a neuron/synapse graph by running a forest of
//! Cellular Encoding trees over a population of cells, then flattens the
//! result into a [`Phenotype`](morphogen_data::Phenotype).
//!
//! Cells and their synapses live in an arena indexed by [`CellId`]; a synapse
//! names its source by id, so self-loops and mutual links are ordinary id
//! comparisons.

pub mod cell;
pub mod engine;
pub mod flatten;

pub use cell::{Cell, CellId, DevSynapse, Pointer, Registers, SynapseSource};
pub use engine::Embryo;
pub use flatten::parse_extradata;

use morphogen_data::{NeuronClass, MOTOR_TAG, SENSOR_TAG};
use serde::{Deserialize, Serialize};

/// A body attachment point inserted as an already-finalized neuron.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// `Sensor` or `Motor`.
    pub role: NeuronClass,
    /// Joint key reported in the label table.
    pub key: String,
}

impl Attachment {
    /// Extradata tag recognised by the flattener.
    #[must_use]
    pub fn tag(&self) -> String {
        match self.role {
            NeuronClass::Sensor => format!("{}_{}", SENSOR_TAG, self.key),
            NeuronClass::Motor => format!("{}_{}", MOTOR_TAG, self.key),
            NeuronClass::Hidden => self.key.clone(),
        }
    }
}

/// Sensor and motor attachment points of the body being wired.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BodyPlan {
    pub attachments: Vec<Attachment>,
}

impl BodyPlan {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn sensor(mut self, key: &str) -> Self {
        self.attachments.push(Attachment {
            role: NeuronClass::Sensor,
            key: key.to_string(),
        });
        self
    }

    #[must_use]
    pub fn motor(mut self, key: &str) -> Self {
        self.attachments.push(Attachment {
            role: NeuronClass::Motor,
            key: key.to_string(),
        });
        self
    }

    pub fn sensors(&self) -> impl Iterator<Item = &Attachment> {
        self.attachments
            .iter()
            .filter(|a| a.role == NeuronClass::Sensor)
    }

    pub fn motors(&self) -> impl Iterator<Item = &Attachment> {
        self.attachments
            .iter()
            .filter(|a| a.role == NeuronClass::Motor)
    }
}

/// Counters for one development pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevelopmentStats {
    pub ticks: usize,
    pub divisions: usize,
    pub jumps: usize,
    /// Cells ended because their life counter ran out.
    pub forced_ends: usize,
    pub out_of_bounds_jumps: usize,
    pub finalized: usize,
    pub peak_active: usize,
}

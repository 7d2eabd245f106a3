use rkyv::{Archive, Deserialize as RkyvDeserialize, Serialize as RkyvSerialize};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Tag marking a sensor attachment inside a cell's extradata.
pub const SENSOR_TAG: &str = "SENSOR";
/// Tag marking a motor attachment inside a cell's extradata.
pub const MOTOR_TAG: &str = "MOTOR";

/// `"SENSOR" | "MOTOR"` -> joint key -> neuron index.
pub type LabelTable = HashMap<String, HashMap<String, usize>>;

/// Role of a neuron in the body controller.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Archive,
    RkyvSerialize,
    RkyvDeserialize,
)]
#[archive(check_bytes)]
pub enum NeuronClass {
    /// Reads a body sensor.
    Sensor,
    /// Drives a body actuator.
    Motor,
    /// Internal neuron.
    Hidden,
}

/// A flattened neuron ready for the simulation runtime.
#[derive(
    Clone, Debug, Serialize, Deserialize, PartialEq, Archive, RkyvSerialize, RkyvDeserialize,
)]
#[archive(check_bytes)]
pub struct Neuron {
    /// Firing threshold.
    pub threshold: f32,
    /// Constant input offset.
    pub bias: f32,
    /// Output sign, `1.0` or `-1.0`.
    pub sign: f32,
    /// Adaptation rate.
    pub adaptation: f32,
    /// Activation decay per step.
    pub decay: f32,
    /// Sigmoid steepness.
    pub sigmoid_alpha: f32,
    /// Sensor, motor or hidden.
    pub class: NeuronClass,
    /// First incoming synapse in the flat synapse array.
    pub synapse_start_idx: usize,
    /// Number of incoming synapses.
    pub synapse_count: usize,
}

/// A flattened synapse. Stored grouped by destination neuron.
#[derive(
    Clone, Debug, Serialize, Deserialize, PartialEq, Archive, RkyvSerialize, RkyvDeserialize,
)]
#[archive(check_bytes)]
pub struct Synapse {
    /// Source neuron index.
    pub from_idx: usize,
    /// Destination neuron index.
    pub to_idx: usize,
    /// Hebbian update coefficients A..D.
    pub coefficients: [f32; 4],
    /// Plasticity rate.
    pub learning_rate: f32,
    /// Whether the synapse is active.
    pub enabled: bool,
}

/// The developed network, handed to the simulation runtime as an immutable snapshot.
#[derive(
    Clone, Debug, Default, Serialize, Deserialize, PartialEq, Archive, RkyvSerialize, RkyvDeserialize,
)]
#[archive(check_bytes)]
pub struct Phenotype {
    pub neurons: Vec<Neuron>,
    pub synapses: Vec<Synapse>,
}

impl Phenotype {
    #[must_use]
    pub fn neuron_count(&self) -> usize {
        self.neurons.len()
    }

    #[must_use]
    pub fn synapse_count(&self) -> usize {
        self.synapses.len()
    }

    /// Incoming synapses of neuron `idx`.
    #[must_use]
    pub fn incoming(&self, idx: usize) -> &[Synapse] {
        match self.neurons.get(idx) {
            Some(n) => {
                let end = (n.synapse_start_idx + n.synapse_count).min(self.synapses.len());
                let start = n.synapse_start_idx.min(end);
                &self.synapses[start..end]
            }
            None => &[],
        }
    }

    /// Synapses whose source is neuron `idx`.
    pub fn outgoing(&self, idx: usize) -> impl Iterator<Item = &Synapse> {
        self.synapses.iter().filter(move |s| s.from_idx == idx)
    }

    #[must_use]
    pub fn count_class(&self, class: NeuronClass) -> usize {
        self.neurons.iter().filter(|n| n.class == class).count()
    }

    /// Checks the contiguous per-neuron synapse layout and index bounds.
    pub fn validate(&self) -> anyhow::Result<()> {
        let mut cursor = 0;
        for (idx, neuron) in self.neurons.iter().enumerate() {
            anyhow::ensure!(
                neuron.synapse_start_idx == cursor,
                "Neuron {} synapse range starts at {}, expected {}",
                idx,
                neuron.synapse_start_idx,
                cursor
            );
            cursor += neuron.synapse_count;
            for syn in self.incoming(idx) {
                anyhow::ensure!(
                    syn.to_idx == idx,
                    "Synapse in range of neuron {} targets {}",
                    idx,
                    syn.to_idx
                );
            }
        }
        anyhow::ensure!(
            cursor == self.synapses.len(),
            "Synapse ranges cover {} of {} synapses",
            cursor,
            self.synapses.len()
        );
        for syn in &self.synapses {
            anyhow::ensure!(
                syn.from_idx < self.neurons.len(),
                "Synapse source {} out of range",
                syn.from_idx
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn neuron(start: usize, count: usize) -> Neuron {
        Neuron {
            threshold: 0.0,
            bias: 0.0,
            sign: 1.0,
            adaptation: 0.0,
            decay: 0.0,
            sigmoid_alpha: 1.0,
            class: NeuronClass::Hidden,
            synapse_start_idx: start,
            synapse_count: count,
        }
    }

    fn synapse(from_idx: usize, to_idx: usize) -> Synapse {
        Synapse {
            from_idx,
            to_idx,
            coefficients: [1.0, 0.0, 0.0, 0.0],
            learning_rate: 0.0,
            enabled: true,
        }
    }

    #[test]
    fn test_validate_accepts_contiguous_layout() {
        let p = Phenotype {
            neurons: vec![neuron(0, 1), neuron(1, 2)],
            synapses: vec![synapse(0, 0), synapse(0, 1), synapse(1, 1)],
        };
        assert!(p.validate().is_ok());
        assert_eq!(p.incoming(1).len(), 2);
        assert_eq!(p.outgoing(0).count(), 2);
    }

    #[test]
    fn test_validate_rejects_gap() {
        let p = Phenotype {
            neurons: vec![neuron(0, 1), neuron(2, 1)],
            synapses: vec![synapse(0, 0), synapse(0, 1), synapse(1, 1)],
        };
        assert!(p.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_dangling_source() {
        let p = Phenotype {
            neurons: vec![neuron(0, 1)],
            synapses: vec![synapse(3, 0)],
        };
        assert!(p.validate().is_err());
    }
}

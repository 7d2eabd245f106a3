pub mod data;

pub use data::instruction::{CellOp, CoefEdit, CoefTarget, Instruction, RegisterEdit};
pub use data::phenotype::{
    LabelTable, Neuron, NeuronClass, Phenotype, Synapse, MOTOR_TAG, SENSOR_TAG,
};

use super::cell::SynapseSource;
use super::engine::Embryo;
use morphogen_data::{
    LabelTable, Neuron, NeuronClass, Phenotype, Synapse, MOTOR_TAG, SENSOR_TAG,
};
use std::collections::HashMap;

/// Reads the role and joint key out of an underscore-delimited extradata tag.
///
/// The last `SENSOR`/`MOTOR` token decides the role; the tokens after it form
/// the joint key. Tags without a role token, or with nothing after it, are
/// hidden neurons.
#[must_use]
pub fn parse_extradata(extradata: &str) -> Option<(NeuronClass, String)> {
    let tokens: Vec<&str> = extradata.split('_').filter(|t| !t.is_empty()).collect();
    let (pos, class) = tokens
        .iter()
        .enumerate()
        .rev()
        .find_map(|(i, &t)| match t {
            SENSOR_TAG => Some((i, NeuronClass::Sensor)),
            MOTOR_TAG => Some((i, NeuronClass::Motor)),
            _ => None,
        })?;
    let key = tokens[pos + 1..].join("_");
    if key.is_empty() {
        return None;
    }
    Some((class, key))
}

fn tag_for(class: NeuronClass) -> &'static str {
    match class {
        NeuronClass::Motor => MOTOR_TAG,
        _ => SENSOR_TAG,
    }
}

impl Embryo<'_> {
    /// Converts the finalized cells into neuron and synapse arrays.
    ///
    /// Neurons follow finalization order; each neuron's incoming synapses are
    /// laid out contiguously. Inputs whose source is not a finalized cell are
    /// dropped. `labels` is cleared and then filled with this embryo's
    /// sensor/motor neurons; a repeated joint key gets a `#n` suffix.
    pub fn flatten(&self, labels: &mut LabelTable) -> Phenotype {
        labels.clear();
        let index: HashMap<usize, usize> = self
            .finalized()
            .iter()
            .enumerate()
            .map(|(idx, id)| (id.0, idx))
            .collect();

        let mut neurons = Vec::with_capacity(self.finalized().len());
        let mut synapses = Vec::new();

        for (to_idx, &id) in self.finalized().iter().enumerate() {
            let cell = self.cell(id);
            let class = match parse_extradata(&cell.extradata) {
                Some((class, key)) => {
                    let table = labels.entry(tag_for(class).to_string()).or_default();
                    let mut label = key.clone();
                    let mut n = 1;
                    while table.contains_key(&label) {
                        n += 1;
                        label = format!("{}#{}", key, n);
                    }
                    table.insert(label, to_idx);
                    class
                }
                None => NeuronClass::Hidden,
            };

            let start = synapses.len();
            for syn in &cell.inputs {
                let SynapseSource::Cell(source) = syn.from else {
                    continue;
                };
                let Some(&from_idx) = index.get(&source.0) else {
                    continue;
                };
                synapses.push(Synapse {
                    from_idx,
                    to_idx,
                    coefficients: syn.coefficients,
                    learning_rate: syn.learning_rate,
                    enabled: true,
                });
            }

            let regs = &cell.registers;
            neurons.push(Neuron {
                threshold: regs.threshold,
                bias: regs.bias,
                sign: regs.sign,
                adaptation: regs.adaptation,
                decay: regs.decay,
                sigmoid_alpha: regs.sigmoid_alpha,
                class,
                synapse_start_idx: start,
                synapse_count: synapses.len() - start,
            });
        }

        Phenotype { neurons, synapses }
    }
}

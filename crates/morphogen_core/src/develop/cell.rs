use crate::config::DevelopmentConfig;
use crate::program::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId(pub usize);

/// Where a synapse reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynapseSource {
    Cell(CellId),
    /// Reserved environment input; never clipped and never exported.
    External,
}

/// Development-time synapse, owned by the destination cell's input list.
#[derive(Debug, Clone, PartialEq)]
pub struct DevSynapse {
    pub from: SynapseSource,
    pub coefficients: [f32; 4],
    pub learning_rate: f32,
}

impl DevSynapse {
    #[must_use]
    pub fn new(from: SynapseSource, config: &DevelopmentConfig) -> Self {
        Self {
            from,
            coefficients: config.synapse_coefficients,
            learning_rate: config.synapse_learning_rate,
        }
    }

    /// Same parameters, different source.
    #[must_use]
    pub fn with_source(&self, from: SynapseSource) -> Self {
        Self {
            from,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn is_from(&self, id: CellId) -> bool {
        self.from == SynapseSource::Cell(id)
    }
}

/// Instruction pointer: a node within one forest tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pointer {
    pub tree: usize,
    pub node: NodeId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Registers {
    /// Selects the input synapse targeted by coefficient edits and clips.
    pub link_register: i32,
    pub threshold: f32,
    pub bias: f32,
    pub sign: f32,
    pub adaptation: f32,
    pub decay: f32,
    pub sigmoid_alpha: f32,
    /// Remaining jumps before the cell is forced to end.
    pub life: i32,
}

impl Registers {
    #[must_use]
    pub fn initial(config: &DevelopmentConfig) -> Self {
        Self {
            link_register: 0,
            threshold: config.initial_threshold,
            bias: config.initial_bias,
            sign: 1.0,
            adaptation: config.initial_adaptation,
            decay: config.initial_decay,
            sigmoid_alpha: config.initial_sigmoid_alpha,
            life: config.initial_life,
        }
    }
}

/// A growing (or finished) cell.
#[derive(Debug, Clone)]
pub struct Cell {
    /// `None` once finalized, or for attachment cells that never run.
    pub pointer: Option<Pointer>,
    pub registers: Registers,
    pub inputs: Vec<DevSynapse>,
    /// Underscore-delimited tags collected from taken jumps.
    pub extradata: String,
    pub finalized: bool,
}

impl Cell {
    /// Index of the input selected by the link register.
    #[must_use]
    pub fn selected_input(&self) -> Option<usize> {
        if self.inputs.is_empty() {
            return None;
        }
        let len = self.inputs.len() as i32;
        Some(self.registers.link_register.rem_euclid(len) as usize)
    }

    #[must_use]
    pub fn has_self_loop(&self, id: CellId) -> bool {
        self.inputs.iter().any(|s| s.is_from(id))
    }

    pub fn append_tag(&mut self, tag: &str) {
        if tag.is_empty() {
            return;
        }
        self.extradata.push('_');
        self.extradata.push_str(tag);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell_with_inputs(n: usize) -> Cell {
        let config = DevelopmentConfig::default();
        Cell {
            pointer: None,
            registers: Registers::initial(&config),
            inputs: (0..n)
                .map(|i| DevSynapse::new(SynapseSource::Cell(CellId(i)), &config))
                .collect(),
            extradata: String::new(),
            finalized: false,
        }
    }

    #[test]
    fn test_selected_input_wraps_link_register() {
        let mut cell = cell_with_inputs(3);
        assert_eq!(cell.selected_input(), Some(0));
        cell.registers.link_register = 4;
        assert_eq!(cell.selected_input(), Some(1));
        cell.registers.link_register = -1;
        assert_eq!(cell.selected_input(), Some(2));
    }

    #[test]
    fn test_selected_input_none_without_inputs() {
        let cell = cell_with_inputs(0);
        assert_eq!(cell.selected_input(), None);
    }

    #[test]
    fn test_append_tag_skips_empty() {
        let mut cell = cell_with_inputs(0);
        cell.append_tag("");
        cell.append_tag("SENSOR");
        cell.append_tag("knee");
        assert_eq!(cell.extradata, "_SENSOR_knee");
    }
}

use super::cell::{Cell, CellId, DevSynapse, Pointer, Registers, SynapseSource};
use super::{BodyPlan, DevelopmentStats};
use crate::config::DevelopmentConfig;
use crate::program::Forest;
use morphogen_data::{CellOp, CoefEdit, CoefTarget, RegisterEdit};

/// The live cell population of one development pass.
///
/// Each tick runs exactly one instruction for every cell that was active at
/// the start of the tick; cells created during a tick first run on the next
/// one. Development stops when no active cell remains.
pub struct Embryo<'a> {
    forest: &'a Forest<CellOp>,
    config: &'a DevelopmentConfig,
    cells: Vec<Cell>,
    active: Vec<CellId>,
    finalized: Vec<CellId>,
    stats: DevelopmentStats,
}

impl<'a> Embryo<'a> {
    /// Seeds the population.
    ///
    /// Body attachments become finalized cells first (sensors, then motors,
    /// in plan order). The ancestor cell starts at the root of tree 0 with a
    /// self-recurrent input, plus one input per sensor, or a single external
    /// placeholder input when the plan has no sensors. Each motor reads from
    /// the ancestor.
    pub fn new(
        forest: &'a Forest<CellOp>,
        config: &'a DevelopmentConfig,
        body: &BodyPlan,
    ) -> Self {
        let mut embryo = Self {
            forest,
            config,
            cells: Vec::new(),
            active: Vec::new(),
            finalized: Vec::new(),
            stats: DevelopmentStats::default(),
        };

        let sensors: Vec<CellId> = body
            .sensors()
            .map(|a| embryo.spawn_attachment(a.tag()))
            .collect();
        let motors: Vec<CellId> = body
            .motors()
            .map(|a| embryo.spawn_attachment(a.tag()))
            .collect();

        let Some(tree) = forest.tree(0) else {
            tracing::warn!("Developing an empty forest, no ancestor cell");
            return embryo;
        };

        let ancestor = CellId(embryo.cells.len());
        let mut inputs = vec![DevSynapse::new(SynapseSource::Cell(ancestor), config)];
        if sensors.is_empty() {
            inputs.push(DevSynapse::new(SynapseSource::External, config));
        }
        for &sensor in &sensors {
            inputs.push(DevSynapse::new(SynapseSource::Cell(sensor), config));
        }
        embryo.cells.push(Cell {
            pointer: Some(Pointer {
                tree: 0,
                node: tree.root(),
            }),
            registers: Registers::initial(config),
            inputs,
            extradata: String::new(),
            finalized: false,
        });
        embryo.active.push(ancestor);

        for motor in motors {
            embryo.cells[motor.0]
                .inputs
                .push(DevSynapse::new(SynapseSource::Cell(ancestor), config));
        }
        embryo.stats.peak_active = embryo.active.len();
        embryo
    }

    fn spawn_attachment(&mut self, tag: String) -> CellId {
        let id = CellId(self.cells.len());
        self.cells.push(Cell {
            pointer: None,
            registers: Registers::initial(self.config),
            inputs: Vec::new(),
            extradata: tag,
            finalized: true,
        });
        self.finalized.push(id);
        id
    }

    /// Runs ticks until no active cell remains.
    ///
    /// Termination relies on the life counter, which only jumps consume.
    pub fn run(&mut self) -> DevelopmentStats {
        while self.tick() {}
        self.stats
    }

    /// Executes one instruction per currently active cell. Returns whether
    /// any cell is still active afterwards.
    pub fn tick(&mut self) -> bool {
        if self.active.is_empty() {
            return false;
        }
        self.stats.ticks += 1;
        let snapshot = self.active.clone();
        for id in snapshot {
            self.step(id);
        }
        self.stats.peak_active = self.stats.peak_active.max(self.active.len());
        !self.active.is_empty()
    }

    fn step(&mut self, id: CellId) {
        let Some(pointer) = self.cells[id.0].pointer else {
            self.finalize(id);
            return;
        };
        if self.cells[id.0].registers.life <= 0 {
            self.stats.forced_ends += 1;
            self.finalize(id);
            return;
        }
        let forest = self.forest;
        let Some(node) = forest
            .tree(pointer.tree)
            .and_then(|tree| tree.get(pointer.node))
        else {
            tracing::warn!(
                cell = id.0,
                tree = pointer.tree,
                "Instruction pointer out of range, ending cell"
            );
            self.finalize(id);
            return;
        };

        match node.instruction {
            CellOp::End => self.finalize(id),
            CellOp::SeqDivision => {
                let clone = self.divide_sequential(id);
                self.advance(id, 0);
                self.advance(clone, 1);
            }
            CellOp::ParDivision => {
                let clone = self.divide_parallel(id);
                self.advance(id, 0);
                self.advance(clone, 1);
            }
            CellOp::SeqClone => {
                let clone = self.divide_sequential(id);
                self.advance(id, 0);
                self.advance(clone, 0);
            }
            CellOp::ParClone => {
                let clone = self.divide_parallel(id);
                self.advance(id, 0);
                self.advance(clone, 0);
            }
            CellOp::Jump => {
                let offset = node.args.first().copied().unwrap_or(0);
                self.jump(id, pointer.tree, offset, &node.extra);
            }
            CellOp::Wait => self.advance(id, 0),
            CellOp::Clip => {
                self.clip(id);
                self.advance(id, 0);
            }
            CellOp::Register(edit) => {
                self.edit_register(id, edit);
                self.advance(id, 0);
            }
            CellOp::Coefficient { target, edit } => {
                self.edit_coefficient(id, target, edit);
                self.advance(id, 0);
            }
        }
    }

    /// Moves the pointer to child `slot` of the current node.
    fn advance(&mut self, id: CellId, slot: usize) {
        let Some(pointer) = self.cells[id.0].pointer else {
            return;
        };
        let child = self
            .forest
            .tree(pointer.tree)
            .and_then(|tree| tree.get(pointer.node))
            .and_then(|node| node.children.get(slot).copied());
        match child {
            Some(node) => {
                self.cells[id.0].pointer = Some(Pointer {
                    tree: pointer.tree,
                    node,
                });
            }
            None => {
                tracing::warn!(cell = id.0, slot, "Missing child slot, ending cell");
                self.finalize(id);
            }
        }
    }

    fn finalize(&mut self, id: CellId) {
        let cell = &mut self.cells[id.0];
        if cell.finalized {
            return;
        }
        cell.finalized = true;
        cell.pointer = None;
        self.active.retain(|&c| c != id);
        self.finalized.push(id);
        self.stats.finalized += 1;
    }

    /// New active cell sharing `id`'s registers, pointer and tags but no inputs.
    fn spawn_clone(&mut self, id: CellId) -> CellId {
        let source = &self.cells[id.0];
        let clone = Cell {
            pointer: source.pointer,
            registers: source.registers.clone(),
            inputs: Vec::new(),
            extradata: source.extradata.clone(),
            finalized: false,
        };
        let clone_id = CellId(self.cells.len());
        self.cells.push(clone);
        self.active.push(clone_id);
        self.stats.divisions += 1;
        clone_id
    }

    /// Serial split: `original -> clone`, the clone takes over every output.
    ///
    /// Synapses elsewhere that read from the original are re-sourced to the
    /// clone; a cell holding several of them keeps only the first. A
    /// self-loop on the original becomes a self-loop on the clone. The
    /// original keeps all its other inputs.
    fn divide_sequential(&mut self, original: CellId) -> CellId {
        let clone = self.spawn_clone(original);
        let to_clone = SynapseSource::Cell(clone);

        let self_loops: Vec<DevSynapse> = self.cells[original.0]
            .inputs
            .iter()
            .filter(|s| s.is_from(original))
            .cloned()
            .collect();
        self.cells[original.0]
            .inputs
            .retain(|s| !s.is_from(original));

        for (idx, cell) in self.cells.iter_mut().enumerate() {
            if idx == original.0 || idx == clone.0 {
                continue;
            }
            let mut redirected = false;
            cell.inputs.retain_mut(|syn| {
                if !syn.is_from(original) {
                    return true;
                }
                if redirected {
                    return false;
                }
                syn.from = to_clone;
                redirected = true;
                true
            });
        }

        let clone_cell = &mut self.cells[clone.0];
        if let Some(syn) = self_loops.first() {
            clone_cell.inputs.push(syn.with_source(to_clone));
        }
        clone_cell.inputs.push(DevSynapse::new(
            SynapseSource::Cell(original),
            self.config,
        ));
        clone
    }

    /// Parallel split: the clone copies every input and output of the original.
    ///
    /// A self-loop on the original is expanded into a cross-connected pair
    /// instead of a second self-loop: the clone reads from the original and
    /// the original additionally reads from the clone, keeping its own loop.
    fn divide_parallel(&mut self, original: CellId) -> CellId {
        let clone = self.spawn_clone(original);
        let to_clone = SynapseSource::Cell(clone);

        let original_inputs = self.cells[original.0].inputs.clone();
        let self_loop = original_inputs.iter().find(|s| s.is_from(original)).cloned();
        self.cells[clone.0].inputs = original_inputs
            .iter()
            .filter(|s| !s.is_from(original))
            .cloned()
            .collect();

        for (idx, cell) in self.cells.iter_mut().enumerate() {
            if idx == original.0 || idx == clone.0 {
                continue;
            }
            let copies: Vec<DevSynapse> = cell
                .inputs
                .iter()
                .filter(|s| s.is_from(original))
                .map(|s| s.with_source(to_clone))
                .collect();
            cell.inputs.extend(copies);
        }

        if let Some(syn) = self_loop {
            self.cells[original.0].inputs.push(syn.with_source(to_clone));
            self.cells[clone.0]
                .inputs
                .push(syn.with_source(SynapseSource::Cell(original)));
        }
        clone
    }

    fn jump(&mut self, id: CellId, current_tree: usize, offset: i32, extra: &str) {
        self.stats.jumps += 1;
        self.cells[id.0].registers.life -= 1;
        match self.forest.resolve_jump(current_tree, offset) {
            Some(target) => {
                let Some(tree) = self.forest.tree(target) else {
                    self.finalize(id);
                    return;
                };
                let cell = &mut self.cells[id.0];
                cell.append_tag(extra);
                cell.pointer = Some(Pointer {
                    tree: target,
                    node: tree.root(),
                });
            }
            None => {
                self.stats.out_of_bounds_jumps += 1;
                tracing::warn!(
                    cell = id.0,
                    tree = current_tree,
                    offset,
                    forest_len = self.forest.len(),
                    "Jump target outside forest, ending cell"
                );
                self.finalize(id);
            }
        }
    }

    fn clip(&mut self, id: CellId) {
        let cell = &mut self.cells[id.0];
        if let Some(idx) = cell.selected_input() {
            if cell.inputs[idx].from != SynapseSource::External {
                cell.inputs.remove(idx);
            }
        }
    }

    fn edit_register(&mut self, id: CellId, edit: RegisterEdit) {
        let step = self.config.register_step;
        let regs = &mut self.cells[id.0].registers;
        match edit {
            RegisterEdit::IncLink => regs.link_register = regs.link_register.wrapping_add(1),
            RegisterEdit::DecLink => regs.link_register = regs.link_register.wrapping_sub(1),
            RegisterEdit::IncBias => regs.bias += step,
            RegisterEdit::DecBias => regs.bias -= step,
            RegisterEdit::IncSigmoid => regs.sigmoid_alpha += step,
            RegisterEdit::DecSigmoid => regs.sigmoid_alpha -= step,
            RegisterEdit::ToggleSign => regs.sign = -regs.sign,
            RegisterEdit::IncThreshold => regs.threshold += step,
            RegisterEdit::DecThreshold => regs.threshold -= step,
            RegisterEdit::IncAdaptation => regs.adaptation += step,
            RegisterEdit::DecAdaptation => regs.adaptation -= step,
            RegisterEdit::IncDecay => regs.decay += step,
            RegisterEdit::DecDecay => regs.decay -= step,
        }
    }

    fn edit_coefficient(&mut self, id: CellId, target: CoefTarget, edit: CoefEdit) {
        let step = self.config.coefficient_step;
        let cell = &mut self.cells[id.0];
        let Some(idx) = cell.selected_input() else {
            return;
        };
        let syn = &mut cell.inputs[idx];
        match target.coefficient_index() {
            Some(c) => syn.coefficients[c] = edit.apply(syn.coefficients[c], step),
            None => syn.learning_rate = edit.apply(syn.learning_rate, step),
        }
    }

    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    #[must_use]
    pub fn cell(&self, id: CellId) -> &Cell {
        &self.cells[id.0]
    }

    #[must_use]
    pub fn active(&self) -> &[CellId] {
        &self.active
    }

    /// Finalized cells in finalization order; this is the neuron order.
    #[must_use]
    pub fn finalized(&self) -> &[CellId] {
        &self.finalized
    }

    #[must_use]
    pub fn stats(&self) -> DevelopmentStats {
        self.stats
    }

    /// Cells holding an input synapse from `id`.
    #[must_use]
    pub fn outputs_of(&self, id: CellId) -> Vec<CellId> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, c)| c.inputs.iter().any(|s| s.is_from(id)))
            .map(|(idx, _)| CellId(idx))
            .collect()
    }
}

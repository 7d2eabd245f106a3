use crate::config::EvolutionConfig;
use crate::program::{random_chain, Forest, NodeId, ProgramTree};
use morphogen_data::Instruction;
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MutationKind {
    Change,
    Insert,
    Delete,
}

impl MutationKind {
    pub const ALL: [MutationKind; 3] = [
        MutationKind::Change,
        MutationKind::Insert,
        MutationKind::Delete,
    ];
}

/// What a mutation pass actually did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationReport {
    pub changes: usize,
    pub inserts: usize,
    pub deletes: usize,
    /// Targets drawn but already detached by an earlier edit in the pass.
    pub skipped: usize,
    pub trees_added: usize,
}

impl MutationReport {
    /// Node-level mutations applied.
    #[must_use]
    pub fn applied(&self) -> usize {
        self.changes + self.inserts + self.deletes
    }

    /// Nodes drawn for mutation, whether or not they were still attached.
    #[must_use]
    pub fn selected(&self) -> usize {
        self.applied() + self.skipped
    }
}

/// Coerces a drawn mutation kind into one that is legal for `instruction`.
///
/// Protected instructions are never deleted; they are only changed when they
/// carry an argument to perturb, and are otherwise mutated by inserting above
/// them. A terminal has no child to promote, so deleting it becomes a change.
/// The terminator can neither gain nor lose children, so every draw on it
/// becomes a change to another terminal.
#[must_use]
pub fn resolve_kind<I: Instruction>(instruction: I, drawn: MutationKind) -> MutationKind {
    if instruction.is_terminator() {
        return MutationKind::Change;
    }
    match drawn {
        MutationKind::Delete if instruction.is_protected() => MutationKind::Insert,
        MutationKind::Change if instruction.is_protected() && instruction.arg_count() == 0 => {
            MutationKind::Insert
        }
        MutationKind::Delete if instruction.arity() == 0 => MutationKind::Change,
        other => other,
    }
}

/// Visits every node of every tree and mutates each one independently with
/// probability `avg_mutations / forest.size()`.
///
/// Targets are drawn up front; a target already detached by an earlier edit
/// in the same pass is skipped. Trees are compacted afterwards.
pub fn mutate_forest<I: Instruction, R: Rng + ?Sized>(
    forest: &mut Forest<I>,
    avg_mutations: u32,
    config: &EvolutionConfig,
    rng: &mut R,
) -> MutationReport {
    let mut report = MutationReport::default();
    let size = forest.size();
    if size == 0 {
        return report;
    }
    let rate = (f64::from(avg_mutations) / size as f64).min(1.0);

    for tree in forest.trees_mut() {
        let targets: Vec<NodeId> = tree
            .preorder()
            .into_iter()
            .filter(|_| rng.gen_bool(rate))
            .collect();
        for id in targets {
            if tree.is_attached(id) {
                mutate_node(tree, id, config, rng, &mut report);
            } else {
                report.skipped += 1;
            }
        }
        tree.compact();
    }
    report
}

/// Applies one randomly drawn (and coerced) mutation at `id`.
pub fn mutate_node<I: Instruction, R: Rng + ?Sized>(
    tree: &mut ProgramTree<I>,
    id: NodeId,
    config: &EvolutionConfig,
    rng: &mut R,
    report: &mut MutationReport,
) {
    let instruction = tree.node(id).instruction;
    let drawn = MutationKind::ALL[rng.gen_range(0..MutationKind::ALL.len())];
    match resolve_kind(instruction, drawn) {
        MutationKind::Change => {
            let arg_count = instruction.arg_count();
            if instruction.is_terminator() {
                let replacement = instruction.random_other_terminal(rng);
                let args = replacement.random_args(config.arg_spread, rng);
                tree.change_instruction(id, replacement, args, rng);
                report.changes += 1;
                return;
            }
            let wholesale = !instruction.is_protected()
                && (arg_count == 0 || rng.gen_bool(config.instruction_change_rate));
            if wholesale {
                let replacement = I::random(rng);
                let args = replacement.random_args(config.arg_spread, rng);
                tree.change_instruction(id, replacement, args, rng);
            } else if arg_count > 0 {
                let slot = rng.gen_range(0..arg_count);
                let value = instruction.random_arg(slot, config.arg_spread, rng);
                if let Some(arg) = tree.node_mut(id).args.get_mut(slot) {
                    *arg = value;
                }
            }
            report.changes += 1;
        }
        MutationKind::Insert => {
            for (op, args) in random_chain::<I, R>(config.max_insert_chain, config.arg_spread, rng) {
                tree.insert_node(id, op, args, rng);
            }
            report.inserts += 1;
        }
        MutationKind::Delete => {
            tree.delete_node(id, rng);
            report.deletes += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::random_tree;
    use morphogen_data::{CellOp, RegisterEdit};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_resolve_kind_protects_structural_ops() {
        use MutationKind::*;
        assert_eq!(resolve_kind(CellOp::End, Delete), Change);
        assert_eq!(resolve_kind(CellOp::End, Change), Change);
        assert_eq!(resolve_kind(CellOp::End, Insert), Change);
        assert_eq!(resolve_kind(CellOp::Jump, Delete), Insert);
        assert_eq!(resolve_kind(CellOp::Jump, Insert), Insert);
        assert_eq!(resolve_kind(CellOp::Jump, Change), Change);
        assert_eq!(resolve_kind(CellOp::SeqDivision, Delete), Insert);
        assert_eq!(resolve_kind(CellOp::SeqDivision, Change), Insert);
        assert_eq!(resolve_kind(CellOp::Wait, Delete), Delete);
        assert_eq!(resolve_kind(CellOp::Wait, Change), Change);
    }

    #[test]
    fn test_protected_jump_only_changes_argument() {
        let mut rng = ChaCha8Rng::seed_from_u64(12);
        let config = EvolutionConfig {
            arg_spread: 5,
            ..Default::default()
        };
        for _ in 0..50 {
            let mut tree = ProgramTree::new(CellOp::Jump, vec![0], 0);
            let root = tree.root();
            let mut report = MutationReport::default();
            mutate_node(&mut tree, root, &config, &mut rng, &mut report);
            assert!(tree.validate().is_ok());
            assert_eq!(report.deletes, 0);
            if report.changes == 1 {
                assert_eq!(tree.node(tree.root()).instruction, CellOp::Jump);
            }
        }
    }

    #[test]
    fn test_end_becomes_jump_with_fresh_argument() {
        let mut rng = ChaCha8Rng::seed_from_u64(21);
        let config = EvolutionConfig {
            arg_spread: 3,
            ..Default::default()
        };
        for _ in 0..50 {
            let mut tree = ProgramTree::<CellOp>::leaf(0);
            let root = tree.root();
            let mut report = MutationReport::default();
            mutate_node(&mut tree, root, &config, &mut rng, &mut report);
            assert_eq!(report.changes, 1);
            assert_eq!(report.inserts, 0);
            let node = tree.node(root);
            assert_eq!(node.instruction, CellOp::Jump);
            assert_eq!(node.args.len(), 1);
            assert!((-3..=3).contains(&node.args[0]));
            assert!(node.children.is_empty());
            assert_eq!(tree.size(), 1);
        }
    }

    #[test]
    fn test_mutate_forest_keeps_arity_invariant() {
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        let config = EvolutionConfig::default();
        let mut forest: Forest<CellOp> = Forest::new(
            (0..3)
                .map(|i| random_tree(i, 6, 0.2, 2, &mut rng))
                .collect(),
        );
        for _ in 0..200 {
            mutate_forest(&mut forest, 4, &config, &mut rng);
            assert!(forest.validate().is_ok());
        }
    }

    #[test]
    fn test_high_rate_touches_every_node() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let config = EvolutionConfig::default();
        let mut forest = Forest::new(vec![ProgramTree::new(
            CellOp::Register(RegisterEdit::IncBias),
            Vec::new(),
            0,
        )]);
        let report = mutate_forest(&mut forest, 100, &config, &mut rng);
        assert_eq!(report.selected(), 2);
        assert!(forest.validate().is_ok());
    }
}

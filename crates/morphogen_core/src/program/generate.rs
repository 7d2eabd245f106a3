use super::{NodeId, ProgramTree};
use morphogen_data::Instruction;
use rand::Rng;

/// Grows a random tree no deeper than `max_depth` nodes.
///
/// Below the depth limit each child slot becomes a terminal with probability
/// `terminal_chance`, otherwise a uniformly drawn instruction; at the limit
/// every open slot is closed with a terminal.
pub fn random_tree<I: Instruction, R: Rng + ?Sized>(
    tree_index: usize,
    max_depth: usize,
    terminal_chance: f64,
    arg_spread: i32,
    rng: &mut R,
) -> ProgramTree<I> {
    let max_depth = max_depth.max(1);
    let root_op = if max_depth == 1 {
        I::random_terminal(rng)
    } else {
        I::random(rng)
    };
    let args = root_op.random_args(arg_spread, rng);
    let mut tree = ProgramTree {
        nodes: vec![super::ProgramNode {
            instruction: root_op,
            args,
            extra: String::new(),
            children: Vec::new(),
            parent: None,
            size: 1,
            tree_index,
        }],
        root: NodeId(0),
    };

    let mut worklist = vec![(tree.root(), 1usize)];
    while let Some((id, depth)) = worklist.pop() {
        for _ in 0..tree.node(id).instruction.arity() {
            let op = if depth + 1 >= max_depth || rng.gen_bool(terminal_chance.clamp(0.0, 1.0)) {
                I::random_terminal(rng)
            } else {
                I::random(rng)
            };
            let args = op.random_args(arg_spread, rng);
            let child = tree.add_node(op, args, String::new());
            tree.attach_child(id, child);
            worklist.push((child, depth + 1));
        }
    }
    tree.recalculate_size();
    tree
}

/// Short sequence of non-terminal instructions (with fresh arguments) for
/// splicing above an existing node.
pub fn random_chain<I: Instruction, R: Rng + ?Sized>(
    max_len: usize,
    arg_spread: i32,
    rng: &mut R,
) -> Vec<(I, Vec<i32>)> {
    let len = rng.gen_range(1..=max_len.max(1));
    let mut chain = Vec::with_capacity(len);
    for _ in 0..len {
        if let Some(op) = I::random_with_min_arity(rng, 1) {
            let args = op.random_args(arg_spread, rng);
            chain.push((op, args));
        }
    }
    chain
}

#[cfg(test)]
mod tests {
    use super::*;
    use morphogen_data::CellOp;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_random_tree_respects_depth_and_arity() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        for depth in 1..8 {
            let tree: ProgramTree<CellOp> = random_tree(4, depth, 0.2, 3, &mut rng);
            assert!(tree.depth() <= depth, "depth {} > {}", tree.depth(), depth);
            assert!(tree.validate().is_ok());
            assert_eq!(tree.tree_index(), 4);
        }
    }

    #[test]
    fn test_random_tree_jump_args_within_spread() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..20 {
            let tree: ProgramTree<CellOp> = random_tree(0, 6, 0.3, 2, &mut rng);
            for id in tree.preorder() {
                for &arg in &tree.node(id).args {
                    assert!((-2..=2).contains(&arg));
                }
            }
        }
    }

    #[test]
    fn test_random_chain_is_non_terminal() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let chain: Vec<(CellOp, Vec<i32>)> = random_chain(3, 2, &mut rng);
        assert!(!chain.is_empty() && chain.len() <= 3);
        assert!(chain.iter().all(|(op, _)| op.arity() >= 1));
    }
}

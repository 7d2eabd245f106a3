use crate::program::Forest;
use morphogen_data::Instruction;
use rand::Rng;

/// Single-point subtree swap.
///
/// One node is drawn uniformly over each parent's whole forest; the two
/// offspring are copies of the parents with those subtrees exchanged. A
/// swapped-in subtree adopts the index of the tree it lands in.
pub fn node_swap_crossover<I: Instruction, R: Rng + ?Sized>(
    a: &Forest<I>,
    b: &Forest<I>,
    rng: &mut R,
) -> (Forest<I>, Forest<I>) {
    let mut first = a.clone();
    let mut second = b.clone();
    if first.size() == 0 || second.size() == 0 {
        return (first, second);
    }

    let pick_a = first.select_node(rng.gen_range(1..=first.size()));
    let pick_b = second.select_node(rng.gen_range(1..=second.size()));
    let (Some((tree_a, node_a)), Some((tree_b, node_b))) = (pick_a, pick_b) else {
        return (first, second);
    };

    let sub_a = first.trees()[tree_a].clone_subtree(node_a);
    let sub_b = second.trees()[tree_b].clone_subtree(node_b);
    if let Some(tree) = first.tree_mut(tree_a) {
        tree.graft(node_a, &sub_b);
        tree.compact();
    }
    if let Some(tree) = second.tree_mut(tree_b) {
        tree.graft(node_b, &sub_a);
        tree.compact();
    }
    (first, second)
}

/// Two-point crossover over whole trees.
///
/// Cut points `x1 < x2` are drawn inside `[1, min_len)`; trees whose slot
/// falls in `[x1, x2)` are exchanged, all others are copied from the
/// offspring's own parent. Slots a parent does not have are omitted on that
/// side. Falls back to plain copies when the shorter forest has fewer than
/// three trees, since no such pair of cuts exists.
pub fn forest_crossover<I: Instruction, R: Rng + ?Sized>(
    a: &Forest<I>,
    b: &Forest<I>,
    rng: &mut R,
) -> (Forest<I>, Forest<I>) {
    let min_len = a.len().min(b.len());
    if min_len < 3 {
        return (a.clone(), b.clone());
    }
    let x1 = rng.gen_range(1..min_len - 1);
    let x2 = rng.gen_range(x1 + 1..min_len);
    let max_len = a.len().max(b.len());

    let mut first = Vec::with_capacity(max_len);
    let mut second = Vec::with_capacity(max_len);
    for i in 0..max_len {
        let swapped = (x1..x2).contains(&i);
        let (for_first, for_second) = if swapped {
            (b.tree(i), a.tree(i))
        } else {
            (a.tree(i), b.tree(i))
        };
        if let Some(tree) = for_first {
            first.push(tree.clone());
        }
        if let Some(tree) = for_second {
            second.push(tree.clone());
        }
    }
    (Forest::new(first), Forest::new(second))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::{random_tree, ProgramTree};
    use morphogen_data::{CellOp, RegisterEdit};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn tagged(op: CellOp, n: usize) -> Forest<CellOp> {
        Forest::new((0..n).map(|i| ProgramTree::new(op, Vec::new(), i)).collect())
    }

    #[test]
    fn test_node_swap_conserves_total_size() {
        let mut rng = ChaCha8Rng::seed_from_u64(21);
        for _ in 0..100 {
            let a: Forest<CellOp> = Forest::new(vec![random_tree(0, 6, 0.3, 2, &mut rng)]);
            let b: Forest<CellOp> = Forest::new(vec![
                random_tree(0, 5, 0.3, 2, &mut rng),
                random_tree(1, 5, 0.3, 2, &mut rng),
            ]);
            let (c, d) = node_swap_crossover(&a, &b, &mut rng);
            assert!(c.validate().is_ok());
            assert!(d.validate().is_ok());
            assert_eq!(c.len(), a.len());
            assert_eq!(d.len(), b.len());
            assert_eq!(c.size() + d.size(), a.size() + b.size());
        }
    }

    #[test]
    fn test_node_swap_leaves_parents_untouched() {
        let mut rng = ChaCha8Rng::seed_from_u64(22);
        let a = tagged(CellOp::SeqDivision, 1);
        let b = tagged(CellOp::Register(RegisterEdit::IncBias), 1);
        let (a0, b0) = (a.clone(), b.clone());
        let _ = node_swap_crossover(&a, &b, &mut rng);
        assert_eq!(a, a0);
        assert_eq!(b, b0);
    }

    #[test]
    fn test_forest_crossover_exchanges_window() {
        let mut rng = ChaCha8Rng::seed_from_u64(23);
        let a = tagged(CellOp::Wait, 4);
        let b = tagged(CellOp::Clip, 6);
        for _ in 0..50 {
            let (c, d) = forest_crossover(&a, &b, &mut rng);
            assert_eq!(c.len(), 4);
            assert_eq!(d.len(), 6);
            assert!(c.validate().is_ok());
            assert!(d.validate().is_ok());
            let root_op = |f: &Forest<CellOp>, i: usize| {
                let t = f.tree(i).expect("tree");
                t.node(t.root()).instruction
            };
            assert_eq!(root_op(&c, 0), CellOp::Wait);
            assert_eq!(root_op(&d, 0), CellOp::Clip);
            assert_eq!(root_op(&d, 5), CellOp::Clip);
            assert_eq!(root_op(&c, 3), CellOp::Wait);
            assert_eq!(root_op(&d, 3), CellOp::Clip);
            let swapped = (1..4).filter(|&i| root_op(&c, i) == CellOp::Clip).count();
            assert!(swapped >= 1);
            let swapped_back = (1..4).filter(|&i| root_op(&d, i) == CellOp::Wait).count();
            assert_eq!(swapped, swapped_back);
        }
    }

    #[test]
    fn test_forest_crossover_short_parent_copies() {
        let mut rng = ChaCha8Rng::seed_from_u64(24);
        for short in 1..3 {
            let a = tagged(CellOp::Wait, short);
            let b = tagged(CellOp::Clip, 3);
            let (c, d) = forest_crossover(&a, &b, &mut rng);
            assert_eq!(c, a);
            assert_eq!(d, b);
        }
    }
}

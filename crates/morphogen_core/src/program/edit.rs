//! Structural edits. Every edit leaves the arity invariant intact and
//! refreshes `size` along the touched ancestor path.

use super::{NodeId, ProgramTree};
use morphogen_data::Instruction;
use rand::seq::index::sample;
use rand::Rng;

impl<I: Instruction> ProgramTree<I> {
    /// Replaces the instruction at `id` and repairs its child list.
    ///
    /// Growing arity appends placeholder terminals; shrinking arity keeps a
    /// uniformly chosen subset of the existing children (in their original
    /// order) and detaches the rest together with their subtrees.
    pub fn change_instruction<R: Rng + ?Sized>(
        &mut self,
        id: NodeId,
        instruction: I,
        args: Vec<i32>,
        rng: &mut R,
    ) {
        let new_arity = instruction.arity();
        let old_children = std::mem::take(&mut self.node_mut(id).children);
        {
            let node = self.node_mut(id);
            node.instruction = instruction;
            node.args = args;
        }

        if new_arity >= old_children.len() {
            for &child in &old_children {
                self.node_mut(id).children.push(child);
            }
            for _ in old_children.len()..new_arity {
                let leaf = self.add_node(I::placeholder(), Vec::new(), String::new());
                self.attach_child(id, leaf);
            }
        } else {
            let mut keep = sample(rng, old_children.len(), new_arity).into_vec();
            keep.sort_unstable();
            for (slot, &child) in old_children.iter().enumerate() {
                if keep.contains(&slot) {
                    self.node_mut(id).children.push(child);
                } else {
                    self.node_mut(child).parent = None;
                }
            }
        }
        self.refresh_sizes_upward(id);
    }

    /// Splices a new node into the slot currently held by `target`; `target`
    /// becomes one of the new node's children (a random slot when the new
    /// instruction has several), other slots get placeholder terminals.
    ///
    /// Returns `None` for zero-arity instructions, which have nowhere to put
    /// the demoted subtree.
    pub fn insert_node<R: Rng + ?Sized>(
        &mut self,
        target: NodeId,
        instruction: I,
        args: Vec<i32>,
        rng: &mut R,
    ) -> Option<NodeId> {
        let arity = instruction.arity();
        if arity == 0 {
            return None;
        }
        let new_id = self.add_node(instruction, args, String::new());
        self.replace_in_parent(target, new_id);

        let demoted_slot = rng.gen_range(0..arity);
        for slot in 0..arity {
            if slot == demoted_slot {
                self.attach_child(new_id, target);
            } else {
                let leaf = self.add_node(I::placeholder(), Vec::new(), String::new());
                self.attach_child(new_id, leaf);
            }
        }
        self.refresh_sizes_upward(new_id);
        Some(new_id)
    }

    /// Removes `id`, promoting one uniformly chosen child into its slot (or
    /// to the root). Other children are detached with their subtrees.
    ///
    /// Returns the promoted child, or `None` when `id` has no children.
    pub fn delete_node<R: Rng + ?Sized>(&mut self, id: NodeId, rng: &mut R) -> Option<NodeId> {
        let children = self.node(id).children.clone();
        if children.is_empty() {
            return None;
        }
        let promoted = children[rng.gen_range(0..children.len())];
        self.replace_in_parent(id, promoted);
        self.node_mut(id).children.clear();
        for child in children {
            if child != promoted {
                self.node_mut(child).parent = None;
            }
        }
        match self.node(promoted).parent {
            Some(parent) => self.refresh_sizes_upward(parent),
            None => self.refresh_sizes_upward(promoted),
        }
        Some(promoted)
    }

    /// Maps `k` in `[1, size]` to a node by size-weighted descent.
    ///
    /// `k == 1` is the current node; otherwise `k - 1` is matched against the
    /// children's subtree sizes in order. Every node corresponds to exactly
    /// one `k`, so a uniform `k` gives a uniform node regardless of depth.
    #[must_use]
    pub fn select_random_node(&self, mut k: usize) -> Option<NodeId> {
        if k == 0 || k > self.size() {
            return None;
        }
        let mut current = self.root();
        'descend: loop {
            if k == 1 {
                return Some(current);
            }
            k -= 1;
            for &child in &self.node(current).children {
                let size = self.node(child).size;
                if k <= size {
                    current = child;
                    continue 'descend;
                }
                k -= size;
            }
            return None;
        }
    }

    /// Uniformly random reachable node.
    pub fn random_node<R: Rng + ?Sized>(&self, rng: &mut R) -> NodeId {
        let k = rng.gen_range(1..=self.size());
        self.select_random_node(k).unwrap_or_else(|| self.root())
    }

    /// Deep copy of the subtree at `id` as a standalone, compact tree.
    #[must_use]
    pub fn clone_subtree(&self, id: NodeId) -> ProgramTree<I> {
        let source = self.node(id);
        let mut out = ProgramTree {
            nodes: vec![super::ProgramNode {
                instruction: source.instruction,
                args: source.args.clone(),
                extra: source.extra.clone(),
                children: Vec::new(),
                parent: None,
                size: 1,
                tree_index: source.tree_index,
            }],
            root: NodeId(0),
        };
        let mut stack = vec![(id, out.root())];
        while let Some((src, dst)) = stack.pop() {
            for &child in &self.node(src).children {
                let c = self.node(child);
                let copy = out.add_node(c.instruction, c.args.clone(), c.extra.clone());
                out.attach_child(dst, copy);
                stack.push((child, copy));
            }
        }
        out.recalculate_size();
        out
    }

    /// Replaces the subtree at `target` with a copy of `subtree`, adopting
    /// this tree's index. Returns the id of the grafted root.
    pub fn graft(&mut self, target: NodeId, subtree: &ProgramTree<I>) -> NodeId {
        let src_root = subtree.root();
        let r = subtree.node(src_root);
        let new_root = self.add_node(r.instruction, r.args.clone(), r.extra.clone());
        let mut stack = vec![(src_root, new_root)];
        while let Some((src, dst)) = stack.pop() {
            for &child in &subtree.node(src).children {
                let c = subtree.node(child);
                let copy = self.add_node(c.instruction, c.args.clone(), c.extra.clone());
                self.attach_child(dst, copy);
                stack.push((child, copy));
            }
        }
        for id in self.preorder_from(new_root).into_iter().rev() {
            let size = 1 + self
                .node(id)
                .children
                .iter()
                .map(|c| self.node(*c).size)
                .sum::<usize>();
            self.node_mut(id).size = size;
        }
        self.replace_in_parent(target, new_root);
        if let Some(parent) = self.node(new_root).parent {
            self.refresh_sizes_upward(parent);
        }
        new_root
    }
}

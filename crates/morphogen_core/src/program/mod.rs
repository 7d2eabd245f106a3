//! Arity-typed instruction trees and the forests that make up a genome.
//!
//! A [`ProgramTree`] is an arena of [`ProgramNode`]s addressed by [`NodeId`].
//! Parent links are plain ids, so swapping or splicing subtrees only rewrites
//! a couple of slots. Structural edits can leave detached nodes behind in the
//! arena; they are unreachable from the root and are dropped by
//! [`ProgramTree::compact`]. All traversals are iterative.

pub mod edit;
pub mod generate;

use morphogen_data::Instruction;
use serde::{Deserialize, Serialize};

pub use generate::{random_chain, random_tree};

/// Index of a node inside its tree's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

/// One instruction node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramNode<I> {
    pub instruction: I,
    /// Instruction-defined argument vector (e.g. jump offset).
    pub args: Vec<i32>,
    /// Free-form tag; appended to a cell's extradata when a jump is taken.
    pub extra: String,
    pub children: Vec<NodeId>,
    pub parent: Option<NodeId>,
    /// Number of nodes in the subtree rooted here.
    pub size: usize,
    /// Forest slot of the tree this node belongs to.
    pub tree_index: usize,
}

impl<I: Instruction> ProgramNode<I> {
    fn detached(instruction: I, args: Vec<i32>, extra: String, tree_index: usize) -> Self {
        Self {
            instruction,
            args,
            extra,
            children: Vec::new(),
            parent: None,
            size: 1,
            tree_index,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramTree<I> {
    nodes: Vec<ProgramNode<I>>,
    root: NodeId,
}

impl<I: Instruction> ProgramTree<I> {
    /// Single-node tree holding `instruction`, with placeholder children if it
    /// needs any.
    pub fn new(instruction: I, args: Vec<i32>, tree_index: usize) -> Self {
        let mut tree = Self {
            nodes: vec![ProgramNode::detached(
                instruction,
                args,
                String::new(),
                tree_index,
            )],
            root: NodeId(0),
        };
        for _ in 0..instruction.arity() {
            let leaf = tree.add_node(I::placeholder(), Vec::new(), String::new());
            tree.attach_child(NodeId(0), leaf);
        }
        tree.recalculate_size();
        tree
    }

    /// Root-only tree with no children attached yet, for builders that add
    /// the children themselves. The arity invariant holds only once they have.
    pub fn from_root(instruction: I, args: Vec<i32>, extra: String, tree_index: usize) -> Self {
        Self {
            nodes: vec![ProgramNode::detached(instruction, args, extra, tree_index)],
            root: NodeId(0),
        }
    }

    /// Tree consisting of one placeholder terminal.
    pub fn leaf(tree_index: usize) -> Self {
        Self::new(I::placeholder(), Vec::new(), tree_index)
    }

    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> &ProgramNode<I> {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut ProgramNode<I> {
        &mut self.nodes[id.0]
    }

    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&ProgramNode<I>> {
        self.nodes.get(id.0)
    }

    /// Number of nodes reachable from the root.
    #[must_use]
    pub fn size(&self) -> usize {
        self.nodes[self.root.0].size
    }

    /// Arena length, including detached nodes awaiting compaction.
    #[must_use]
    pub fn arena_len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn tree_index(&self) -> usize {
        self.nodes[self.root.0].tree_index
    }

    /// Propagates `index` to every node in the arena.
    pub fn set_tree_index(&mut self, index: usize) {
        for node in &mut self.nodes {
            node.tree_index = index;
        }
    }

    /// Appends a detached node to the arena.
    pub fn add_node(&mut self, instruction: I, args: Vec<i32>, extra: String) -> NodeId {
        let tree_index = self.tree_index();
        self.nodes
            .push(ProgramNode::detached(instruction, args, extra, tree_index));
        NodeId(self.nodes.len() - 1)
    }

    /// Appends `child` to the end of `parent`'s child list.
    pub fn attach_child(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].parent = Some(parent);
    }

    /// Node ids reachable from the root, in preorder.
    #[must_use]
    pub fn preorder(&self) -> Vec<NodeId> {
        self.preorder_from(self.root)
    }

    #[must_use]
    pub fn preorder_from(&self, start: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            order.push(id);
            for &child in self.nodes[id.0].children.iter().rev() {
                stack.push(child);
            }
        }
        order
    }

    /// Length of the longest root-to-leaf path, counted in nodes.
    #[must_use]
    pub fn depth(&self) -> usize {
        let mut max = 0;
        let mut stack = vec![(self.root, 1)];
        while let Some((id, d)) = stack.pop() {
            max = max.max(d);
            for &child in &self.nodes[id.0].children {
                stack.push((child, d + 1));
            }
        }
        max
    }

    /// Recomputes every reachable `size` field bottom-up.
    pub fn recalculate_size(&mut self) {
        for id in self.preorder().into_iter().rev() {
            let size = 1 + self.nodes[id.0]
                .children
                .iter()
                .map(|c| self.nodes[c.0].size)
                .sum::<usize>();
            self.nodes[id.0].size = size;
        }
    }

    /// Recomputes `size` on `id` and every ancestor of it.
    pub fn refresh_sizes_upward(&mut self, id: NodeId) {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let size = 1 + self.nodes[current.0]
                .children
                .iter()
                .map(|c| self.nodes[c.0].size)
                .sum::<usize>();
            self.nodes[current.0].size = size;
            cursor = self.nodes[current.0].parent;
        }
    }

    /// Whether `id` is still reachable from the root.
    #[must_use]
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut cursor = id;
        let mut steps = 0;
        loop {
            if cursor == self.root {
                return true;
            }
            match self.nodes[cursor.0].parent {
                Some(p) => cursor = p,
                None => return false,
            }
            steps += 1;
            if steps > self.nodes.len() {
                return false;
            }
        }
    }

    /// Parent of `id` and the child slot `id` occupies there.
    #[must_use]
    pub fn slot_of(&self, id: NodeId) -> Option<(NodeId, usize)> {
        let parent = self.nodes[id.0].parent?;
        let slot = self.nodes[parent.0].children.iter().position(|&c| c == id)?;
        Some((parent, slot))
    }

    /// Puts `replacement` where `old` currently sits (a parent slot or the
    /// root) and detaches `old`.
    pub(crate) fn replace_in_parent(&mut self, old: NodeId, replacement: NodeId) {
        match self.slot_of(old) {
            Some((parent, slot)) => {
                self.nodes[parent.0].children[slot] = replacement;
                self.nodes[replacement.0].parent = Some(parent);
            }
            None if old == self.root => {
                self.root = replacement;
                self.nodes[replacement.0].parent = None;
            }
            None => return,
        }
        if old != replacement {
            self.nodes[old.0].parent = None;
        }
    }

    /// Rebuilds the arena densely in preorder, dropping detached nodes.
    pub fn compact(&mut self) {
        let order = self.preorder();
        let mut remap = vec![usize::MAX; self.nodes.len()];
        for (new_idx, id) in order.iter().enumerate() {
            remap[id.0] = new_idx;
        }
        let mut nodes = Vec::with_capacity(order.len());
        for id in &order {
            let old = &self.nodes[id.0];
            nodes.push(ProgramNode {
                instruction: old.instruction,
                args: old.args.clone(),
                extra: old.extra.clone(),
                children: old.children.iter().map(|c| NodeId(remap[c.0])).collect(),
                parent: old.parent.map(|p| NodeId(remap[p.0])),
                size: old.size,
                tree_index: old.tree_index,
            });
        }
        if let Some(root) = nodes.first_mut() {
            root.parent = None;
        }
        self.nodes = nodes;
        self.root = NodeId(0);
        self.recalculate_size();
    }

    /// Checks that the root and every reachable child id lie inside the
    /// arena and that no node is reachable twice, so traversals terminate.
    /// Runs before anything else indexes a deserialized tree.
    fn check_links(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.root.0 < self.nodes.len(),
            "Root {:?} outside arena of {} nodes",
            self.root,
            self.nodes.len()
        );
        let mut seen = vec![false; self.nodes.len()];
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            anyhow::ensure!(!seen[id.0], "Node {:?} is reachable twice", id);
            seen[id.0] = true;
            for &child in &self.nodes[id.0].children {
                anyhow::ensure!(child.0 < self.nodes.len(), "Dangling child {:?}", child);
                stack.push(child);
            }
        }
        Ok(())
    }

    /// Checks arity, parent links, sizes and tree-index propagation for every
    /// reachable node.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.check_links()?;
        let tree_index = self.tree_index();
        anyhow::ensure!(
            self.nodes[self.root.0].parent.is_none(),
            "Root has a parent"
        );
        for id in self.preorder() {
            let node = &self.nodes[id.0];
            anyhow::ensure!(
                node.children.len() == node.instruction.arity(),
                "Node {:?} ({:?}) has {} children, arity is {}",
                id,
                node.instruction,
                node.children.len(),
                node.instruction.arity()
            );
            anyhow::ensure!(
                node.args.len() == node.instruction.arg_count(),
                "Node {:?} ({:?}) has {} args, expected {}",
                id,
                node.instruction,
                node.args.len(),
                node.instruction.arg_count()
            );
            anyhow::ensure!(
                node.tree_index == tree_index,
                "Node {:?} tree index {} differs from root {}",
                id,
                node.tree_index,
                tree_index
            );
            let mut expected = 1;
            for &child in &node.children {
                anyhow::ensure!(child.0 < self.nodes.len(), "Dangling child {:?}", child);
                anyhow::ensure!(
                    self.nodes[child.0].parent == Some(id),
                    "Child {:?} does not point back to {:?}",
                    child,
                    id
                );
                expected += self.nodes[child.0].size;
            }
            anyhow::ensure!(
                node.size == expected,
                "Node {:?} size {} should be {}",
                id,
                node.size,
                expected
            );
        }
        Ok(())
    }
}

/// Structural equality: same instructions, args, extras and child order.
impl<I: Instruction> PartialEq for ProgramTree<I> {
    fn eq(&self, other: &Self) -> bool {
        let a = self.preorder();
        let b = other.preorder();
        a.len() == b.len()
            && a.iter().zip(&b).all(|(x, y)| {
                let (x, y) = (self.node(*x), other.node(*y));
                x.instruction == y.instruction
                    && x.args == y.args
                    && x.extra == y.extra
                    && x.children.len() == y.children.len()
            })
    }
}

/// Ordered list of trees; JUMP instructions address trees by offset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Forest<I> {
    trees: Vec<ProgramTree<I>>,
}

impl<I: Instruction> PartialEq for Forest<I> {
    fn eq(&self, other: &Self) -> bool {
        self.trees == other.trees
    }
}

impl<I: Instruction> Forest<I> {
    /// Builds a forest, renumbering each tree to its slot.
    pub fn new(trees: Vec<ProgramTree<I>>) -> Self {
        let mut forest = Self { trees };
        forest.reindex();
        forest
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.trees.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    /// Total node count over all trees.
    #[must_use]
    pub fn size(&self) -> usize {
        self.trees.iter().map(ProgramTree::size).sum()
    }

    #[must_use]
    pub fn tree(&self, index: usize) -> Option<&ProgramTree<I>> {
        self.trees.get(index)
    }

    pub fn tree_mut(&mut self, index: usize) -> Option<&mut ProgramTree<I>> {
        self.trees.get_mut(index)
    }

    #[must_use]
    pub fn trees(&self) -> &[ProgramTree<I>] {
        &self.trees
    }

    pub fn trees_mut(&mut self) -> &mut [ProgramTree<I>] {
        &mut self.trees
    }

    pub fn push(&mut self, mut tree: ProgramTree<I>) {
        tree.set_tree_index(self.trees.len());
        self.trees.push(tree);
    }

    /// Sets every tree's index to its position.
    pub fn reindex(&mut self) {
        for (i, tree) in self.trees.iter_mut().enumerate() {
            tree.set_tree_index(i);
        }
    }

    /// Target of a jump by `offset` from tree `current`, if it exists.
    #[must_use]
    pub fn resolve_jump(&self, current: usize, offset: i32) -> Option<usize> {
        let target = current as i64 + i64::from(offset);
        if target >= 0 && (target as usize) < self.trees.len() {
            Some(target as usize)
        } else {
            None
        }
    }

    pub fn compact(&mut self) {
        for tree in &mut self.trees {
            tree.compact();
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate()?;
            anyhow::ensure!(
                tree.tree_index() == i,
                "Tree in slot {} carries index {}",
                i,
                tree.tree_index()
            );
        }
        Ok(())
    }

    /// Maps a 1-based position over all nodes of the forest to a tree and node.
    #[must_use]
    pub fn select_node(&self, mut k: usize) -> Option<(usize, NodeId)> {
        for (i, tree) in self.trees.iter().enumerate() {
            if k <= tree.size() {
                return tree.select_random_node(k).map(|id| (i, id));
            }
            k -= tree.size();
        }
        None
    }
}

use morphogen_lib::{
    BodyPlan, CellOp, DevelopmentConfig, DevelopmentStats, EvolutionConfig, Forest, Genome,
    GenomeLogic, IdAllocator, Instruction, LabelTable, Phenotype, ProgramTree,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// One link of a hand-written chain: instruction, args, extra.
pub type Link = (CellOp, Vec<i32>, &'static str);

#[allow(dead_code)]
pub fn op(instruction: CellOp) -> Link {
    (instruction, Vec::new(), "")
}

#[allow(dead_code)]
pub fn jump(offset: i32, extra: &'static str) -> Link {
    (CellOp::Jump, vec![offset], extra)
}

/// Builds a tree where each link is child 0 of the previous one. Child slots
/// left open (the second branch of a division, or the tail) are closed with
/// `End`.
#[allow(dead_code)]
pub fn chain(links: &[Link], tree_index: usize) -> ProgramTree<CellOp> {
    let (first, rest) = links.split_first().expect("chain needs at least one link");
    let mut tree = ProgramTree::from_root(first.0, first.1.clone(), first.2.to_string(), tree_index);
    let mut prev = tree.root();
    for (instruction, args, extra) in rest {
        let id = tree.add_node(*instruction, args.clone(), extra.to_string());
        tree.attach_child(prev, id);
        close_open_slots(&mut tree, prev);
        prev = id;
    }
    close_open_slots(&mut tree, prev);
    tree.recalculate_size();
    tree
}

#[allow(dead_code)]
fn close_open_slots(tree: &mut ProgramTree<CellOp>, id: morphogen_lib::NodeId) {
    while tree.node(id).children.len() < tree.node(id).instruction.arity() {
        let end = tree.add_node(CellOp::End, Vec::new(), String::new());
        tree.attach_child(id, end);
    }
}

#[allow(dead_code)]
pub fn forest(trees: Vec<ProgramTree<CellOp>>) -> Forest<CellOp> {
    Forest::new(trees)
}

#[allow(dead_code)]
pub struct Developed {
    pub phenotype: Phenotype,
    pub stats: DevelopmentStats,
    pub labels: LabelTable,
}

#[allow(dead_code)]
pub fn develop(forest: Forest<CellOp>, body: &BodyPlan) -> Developed {
    develop_with(forest, body, &DevelopmentConfig::default())
}

#[allow(dead_code)]
pub fn develop_with(forest: Forest<CellOp>, body: &BodyPlan, config: &DevelopmentConfig) -> Developed {
    let genome = Genome::from_forest(morphogen_lib::GenomeId(0), forest, 1);
    let mut labels = LabelTable::new();
    let (phenotype, stats) = genome.develop_with_stats(body, config, &mut labels);
    Developed {
        phenotype,
        stats,
        labels,
    }
}

#[allow(dead_code)]
pub struct GenomeBuilder {
    config: EvolutionConfig,
    seed: u64,
}

#[allow(dead_code)]
impl GenomeBuilder {
    pub fn new() -> Self {
        Self {
            config: EvolutionConfig::default(),
            seed: 0,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_config<F>(mut self, modifier: F) -> Self
    where
        F: FnOnce(&mut EvolutionConfig),
    {
        modifier(&mut self.config);
        self
    }

    pub fn build(self) -> Genome {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut ids = IdAllocator::new();
        Genome::new_random_with_rng(&self.config, &mut ids, &mut rng)
    }
}

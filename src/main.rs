use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use morphogen_lib::store::{load_genome, save_genome};
use morphogen_lib::{
    AppConfig, BodyPlan, Genome, GenomeId, GenomeLogic, IdAllocator, Instruction, LabelTable,
    NeuronClass,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Custom config file path
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: PathBuf,

    /// RNG seed; random if omitted
    #[arg(short, long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a fresh random genome
    Random {
        #[arg(short, long)]
        out: PathBuf,
    },
    /// Develop a genome into a network
    Develop {
        input: PathBuf,
        /// Sensor attachment keys, in order
        #[arg(long = "sensor")]
        sensors: Vec<String>,
        /// Motor attachment keys, in order
        #[arg(long = "motor")]
        motors: Vec<String>,
        /// Write the phenotype as an rkyv archive
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Write the sensor/motor label table as JSON
        #[arg(long)]
        labels: Option<PathBuf>,
    },
    /// Apply mutation passes to a genome
    Mutate {
        input: PathBuf,
        #[arg(short, long)]
        out: PathBuf,
        #[arg(short, long, default_value_t = 1)]
        rounds: usize,
    },
    /// Cross two genomes into two offspring
    Cross {
        first: PathBuf,
        second: PathBuf,
        #[arg(long)]
        out_first: PathBuf,
        #[arg(long)]
        out_second: PathBuf,
    },
    /// Print a genome's trees
    Inspect { input: PathBuf },
}

fn main() -> Result<()> {
    morphogen_lib::init_logging();
    let args = Args::parse();

    let config = AppConfig::load(&args.config)
        .with_context(|| format!("loading config from {}", args.config.display()))?;
    tracing::debug!(fingerprint = %config.fingerprint(), "Configuration loaded");

    let mut rng = match args.seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };
    let avg = config.evolution.initial_avg_mutations;

    match args.command {
        Command::Random { out } => {
            let mut ids = IdAllocator::new();
            let genome = Genome::new_random_with_rng(&config.evolution, &mut ids, &mut rng);
            save_genome(&genome, &out)?;
            println!(
                "Wrote genome {} ({} trees, {} nodes) to {}",
                genome.id.0,
                genome.forest.len(),
                genome.size(),
                out.display()
            );
        }
        Command::Develop {
            input,
            sensors,
            motors,
            out,
            labels,
        } => {
            let genome = load_genome(&input, GenomeId(0), avg)?;
            let mut body = BodyPlan::new();
            for key in &sensors {
                body = body.sensor(key);
            }
            for key in &motors {
                body = body.motor(key);
            }
            let mut table = LabelTable::new();
            let (phenotype, stats) =
                genome.develop_with_stats(&body, &config.development, &mut table);
            morphogen_lib::metrics::log_development(&input.display().to_string(), &stats);

            println!(
                "{} neurons ({} sensor, {} motor, {} hidden), {} synapses",
                phenotype.neuron_count(),
                phenotype.count_class(NeuronClass::Sensor),
                phenotype.count_class(NeuronClass::Motor),
                phenotype.count_class(NeuronClass::Hidden),
                phenotype.synapse_count()
            );
            if let Some(path) = out {
                morphogen_io::save_phenotype(&phenotype, &path)?;
            }
            if let Some(path) = labels {
                std::fs::write(&path, serde_json::to_string_pretty(&table)?)?;
            }
        }
        Command::Mutate { input, out, rounds } => {
            let parent = load_genome(&input, GenomeId(0), avg)?;
            let mut ids = IdAllocator::starting_after(parent.id);
            let mut child = parent.clone_offspring(&mut ids);
            let mut applied = 0;
            for _ in 0..rounds {
                applied += child.mutate_with_config(&config.evolution, &mut rng).applied();
            }
            save_genome(&child, &out)?;
            println!(
                "Applied {} mutations over {} rounds; genome {} has {} nodes (parent {})",
                applied,
                rounds,
                child.id.0,
                child.size(),
                parent.size()
            );
        }
        Command::Cross {
            first,
            second,
            out_first,
            out_second,
        } => {
            let a = load_genome(&first, GenomeId(0), avg)?;
            let b = load_genome(&second, GenomeId(1), avg)?;
            let mut ids = IdAllocator::starting_after(a.id.max(b.id));
            let (c, d) = a.reproduce_with_rng(&b, &config.evolution, &mut ids, &mut rng);
            save_genome(&c, &out_first)?;
            save_genome(&d, &out_second)?;
            println!(
                "Offspring sizes: {} and {} (parents {} and {})",
                c.size(),
                d.size(),
                a.size(),
                b.size()
            );
        }
        Command::Inspect { input } => {
            let genome = load_genome(&input, GenomeId(0), avg)?;
            println!(
                "Genome {} | avg mutations {} | digest {}",
                genome.id.0,
                genome.avg_mutations,
                morphogen_io::serialization::genome_digest(&genome)?
            );
            for tree in genome.forest.trees() {
                println!(
                    "tree {}: {} nodes, depth {}",
                    tree.tree_index(),
                    tree.size(),
                    tree.depth()
                );
                let mut stack = vec![(tree.root(), 0usize)];
                while let Some((id, indent)) = stack.pop() {
                    let node = tree.node(id);
                    println!(
                        "{:width$}{:?} [{}] {:?} {}",
                        "",
                        node.instruction,
                        node.instruction.code(),
                        node.args,
                        node.extra,
                        width = indent * 2 + 2
                    );
                    for &child in node.children.iter().rev() {
                        stack.push((child, indent + 1));
                    }
                }
            }
        }
    }

    Ok(())
}

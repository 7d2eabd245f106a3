mod common;

use common::{chain, develop, develop_with, forest, jump, op};
use morphogen_lib::{BodyPlan, CellOp, DevelopmentConfig, NeuronClass, RegisterEdit};

#[test]
fn test_trivial_genome_single_self_recurrent_neuron() {
    let dev = develop(forest(vec![chain(&[op(CellOp::End)], 0)]), &BodyPlan::new());
    assert_eq!(dev.phenotype.neuron_count(), 1);
    assert_eq!(dev.phenotype.synapse_count(), 1);
    let syn = &dev.phenotype.synapses[0];
    assert_eq!((syn.from_idx, syn.to_idx), (0, 0));
    assert_eq!(dev.stats.ticks, 1);
    assert!(dev.phenotype.validate().is_ok());
}

#[test]
fn test_sequential_division_moves_self_loop_to_clone() {
    let dev = develop(
        forest(vec![chain(&[op(CellOp::SeqDivision)], 0)]),
        &BodyPlan::new(),
    );
    let p = &dev.phenotype;
    assert_eq!(p.neuron_count(), 2);
    assert_eq!(dev.stats.divisions, 1);
    assert_eq!(dev.stats.ticks, 2);
    assert!(p.incoming(0).is_empty());
    let from_first: Vec<usize> = p.outgoing(0).map(|s| s.to_idx).collect();
    assert_eq!(from_first, vec![1]);
    let mut into_clone: Vec<usize> = p.incoming(1).iter().map(|s| s.from_idx).collect();
    into_clone.sort_unstable();
    assert_eq!(into_clone, vec![0, 1]);
}

#[test]
fn test_parallel_division_cross_connects_self_loop() {
    let dev = develop(
        forest(vec![chain(&[op(CellOp::ParDivision)], 0)]),
        &BodyPlan::new(),
    );
    let p = &dev.phenotype;
    assert_eq!(p.neuron_count(), 2);
    let mut into_original: Vec<usize> = p.incoming(0).iter().map(|s| s.from_idx).collect();
    into_original.sort_unstable();
    assert_eq!(into_original, vec![0, 1]);
    let into_clone: Vec<usize> = p.incoming(1).iter().map(|s| s.from_idx).collect();
    assert_eq!(into_clone, vec![0]);
}

#[test]
fn test_clone_chain_doubles_population() {
    let ops = [op(CellOp::SeqClone), op(CellOp::ParClone), op(CellOp::SeqClone)];
    let dev = develop(forest(vec![chain(&ops, 0)]), &BodyPlan::new());
    assert_eq!(dev.phenotype.neuron_count(), 8);
    assert_eq!(dev.stats.divisions, 7);
    assert_eq!(dev.stats.peak_active, 8);
    assert!(dev.phenotype.validate().is_ok());
}

#[test]
fn test_out_of_bounds_jump_only_ends_that_cell() {
    let tree = chain(&[op(CellOp::SeqDivision), jump(5, "")], 0);
    let dev = develop(forest(vec![tree]), &BodyPlan::new());
    assert_eq!(dev.stats.out_of_bounds_jumps, 1);
    assert_eq!(dev.phenotype.neuron_count(), 2);
    assert!(dev.phenotype.validate().is_ok());
}

#[test]
fn test_negative_jump_below_zero_is_out_of_bounds() {
    let dev = develop(forest(vec![chain(&[jump(-1, "")], 0)]), &BodyPlan::new());
    assert_eq!(dev.stats.out_of_bounds_jumps, 1);
    assert_eq!(dev.phenotype.neuron_count(), 1);
}

#[test]
fn test_jump_loop_ends_when_life_runs_out() {
    let config = DevelopmentConfig {
        initial_life: 3,
        ..Default::default()
    };
    let dev = develop_with(
        forest(vec![chain(&[op(CellOp::Wait), jump(0, "")], 0)]),
        &BodyPlan::new(),
        &config,
    );
    assert_eq!(dev.stats.jumps, 3);
    assert_eq!(dev.stats.forced_ends, 1);
    assert_eq!(dev.phenotype.neuron_count(), 1);
}

#[test]
fn test_jump_extra_tags_label_neurons() {
    let trees = vec![
        chain(&[op(CellOp::ParDivision), jump(1, "MOTOR_arm")], 0),
        chain(&[op(CellOp::End)], 1),
    ];
    let dev = develop(forest(trees), &BodyPlan::new());
    assert_eq!(dev.phenotype.count_class(NeuronClass::Motor), 1);
    assert_eq!(dev.phenotype.count_class(NeuronClass::Hidden), 1);
    let idx = dev.labels["MOTOR"]["arm"];
    assert_eq!(dev.phenotype.neurons[idx].class, NeuronClass::Motor);
}

#[test]
fn test_body_attachments_wire_to_ancestor() {
    let body = BodyPlan::new().sensor("left").sensor("right").motor("tail");
    let dev = develop(forest(vec![chain(&[op(CellOp::End)], 0)]), &body);
    let p = &dev.phenotype;
    assert_eq!(p.neuron_count(), 4);
    assert_eq!(dev.labels["SENSOR"]["left"], 0);
    assert_eq!(dev.labels["SENSOR"]["right"], 1);
    assert_eq!(dev.labels["MOTOR"]["tail"], 2);

    let mut into_ancestor: Vec<usize> = p.incoming(3).iter().map(|s| s.from_idx).collect();
    into_ancestor.sort_unstable();
    assert_eq!(into_ancestor, vec![0, 1, 3]);
    let into_motor: Vec<usize> = p.incoming(2).iter().map(|s| s.from_idx).collect();
    assert_eq!(into_motor, vec![3]);
}

#[test]
fn test_register_edits_reach_neuron() {
    let ops = [
        op(CellOp::Register(RegisterEdit::IncBias)),
        op(CellOp::Register(RegisterEdit::IncBias)),
        op(CellOp::Register(RegisterEdit::ToggleSign)),
    ];
    let dev = develop(forest(vec![chain(&ops, 0)]), &BodyPlan::new());
    let neuron = &dev.phenotype.neurons[0];
    assert!((neuron.bias - 0.2).abs() < 1e-6);
    assert_eq!(neuron.sign, -1.0);
}

#[test]
fn test_empty_forest_develops_only_attachments() {
    let body = BodyPlan::new().sensor("s").motor("m");
    let dev = develop(forest(Vec::new()), &body);
    assert_eq!(dev.phenotype.neuron_count(), 2);
    assert_eq!(dev.phenotype.synapse_count(), 0);
    assert_eq!(dev.stats.ticks, 0);
}

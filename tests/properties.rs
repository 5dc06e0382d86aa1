mod common;

use aigfraig::{
    Aig, AigEdge, NodeId,
    sim::{PatternBatch, SimWord},
};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

const SEEDS: [u64; 4] = [1, 2, 3, 42];

fn output_values(aig: &mut Aig, batch: &PatternBatch) -> Vec<SimWord> {
    aig.simulate(batch);
    aig.get_outputs()
        .iter()
        .map(|&id| aig.get_node(id).unwrap().value())
        .collect()
}

fn random_batch(n_inputs: usize, seed: u64) -> PatternBatch {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let mut batch = PatternBatch::new(n_inputs);
    batch.randomize(&mut rng);
    batch
}

#[test]
fn merge_conserves_fanouts() {
    // 3 = 1 & 2 and 4 = 2 & !1, both read by 5 and 6, 4 also drives an output
    let mut aig = Aig::from_aag_str(
        "aag 6 2 0 3 4\n2\n4\n10\n12\n9\n6 2 4\n8 4 3\n10 6 9\n12 8 7\n",
    )
    .unwrap();
    let fanouts = |aig: &Aig, id: NodeId| -> Vec<AigEdge> {
        let mut fanouts = aig.get_node(id).unwrap().fanouts().to_vec();
        fanouts.sort();
        fanouts
    };
    let alive_before = fanouts(&aig, 3);
    let dead_before = fanouts(&aig, 4);

    aig.merge(3, 4, true);

    let mut expected: Vec<AigEdge> = alive_before
        .into_iter()
        .chain(dead_before.into_iter().map(|edge| !edge))
        .collect();
    expected.sort();
    assert_eq!(fanouts(&aig, 3), expected);
    assert!(aig.get_node(4).is_none());
    // 1 and 2 no longer feed the removed gate
    assert!(fanouts(&aig, 1).iter().all(|edge| edge.get_node_id() != 4));
    assert!(fanouts(&aig, 2).iter().all(|edge| edge.get_node_id() != 4));
    assert_eq!(aig.output_fanin(2), Some(AigEdge::new(3, false)));
    aig.check_integrity().unwrap();
}

#[test]
fn file_simulation_is_deterministic() {
    let circuit = common::random_circuit(5, 6, 80, 4);
    let patterns: String = (0..150u32)
        .map(|k| format!("{:06b}\n", (k * 37 + 11) % 64))
        .collect();

    let run = || {
        let mut aig = Aig::from_aag_str(&circuit).unwrap();
        let mut log = Vec::new();
        let n = aig
            .file_sim(patterns.as_bytes(), Some(&mut log as &mut dyn std::io::Write))
            .unwrap();
        let values: Vec<SimWord> = aig.iter_nodes().map(|node| node.value()).collect();
        (n, values, log)
    };
    let (n, values, log) = run();
    assert_eq!(n, 150);
    assert_eq!(String::from_utf8(log.clone()).unwrap().lines().count(), 150);
    assert_eq!(run(), (n, values, log));
}

#[test]
fn fec_groups_are_sound() {
    for seed in SEEDS {
        let mut aig = Aig::from_aag_str(&common::random_circuit(seed, 5, 60, 5)).unwrap();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        aig.random_sim(&mut rng, None, None).unwrap();

        for (_, group) in aig.fec_groups().iter() {
            assert!(group.is_valid());
            let words: Vec<SimWord> = group
                .live_members()
                .map(|member| {
                    let value = aig.get_node(member.get_node_id()).unwrap().value();
                    if member.get_complement() { !value } else { value }
                })
                .collect();
            assert!(words.iter().all(|&word| word == words[0]), "seed {}", seed);
            for member in group.live_members() {
                assert!(aig.fec_slot(member.get_node_id()).is_some());
            }
        }
        aig.check_integrity().unwrap();
    }
}

#[test]
fn fraig_converges_and_keeps_functions() {
    common::init_logger();
    for seed in SEEDS {
        let circuit = common::random_circuit(seed, 4, 80, 6);
        let mut original = Aig::from_aag_str(&circuit).unwrap();
        let mut reduced = Aig::from_aag_str(&circuit).unwrap();

        reduced.fraig().unwrap();
        assert!(reduced.fec_groups().is_empty(), "seed {}", seed);
        assert!(reduced.n_dfs_ands() <= original.n_dfs_ands());
        reduced.check_integrity().unwrap();

        for k in 0..4 {
            let batch = random_batch(4, seed * 10 + k);
            assert_eq!(
                output_values(&mut original, &batch),
                output_values(&mut reduced, &batch),
                "seed {}",
                seed
            );
        }

        // Simulating the reduced circuit leaves nothing to prove
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        reduced.random_sim(&mut rng, None, None).unwrap();
        let stats = reduced.fraig().unwrap();
        assert_eq!(stats.merges, 0);
        assert_eq!(stats.proven, 0);
    }
}

#[test]
fn write_then_read_back() {
    for seed in SEEDS {
        let mut aig = Aig::from_aag_str(&common::random_circuit(seed, 6, 50, 5)).unwrap();
        aig.sweep();
        let mut out = Vec::new();
        aig.write_aag(&mut out).unwrap();
        let mut back = Aig::from_aag_str(std::str::from_utf8(&out).unwrap()).unwrap();

        assert_eq!(back.get_inputs().len(), aig.get_inputs().len());
        assert_eq!(back.get_outputs().len(), aig.get_outputs().len());
        assert_eq!(back.n_ands(), aig.n_ands());
        assert_eq!(back.dfs_list(), aig.dfs_list());
        for k in 0..3 {
            let batch = random_batch(6, seed + k);
            assert_eq!(
                output_values(&mut back, &batch),
                output_values(&mut aig, &batch)
            );
        }
    }
}

mod common;

use aigfraig::{
    Aig, AigEdge, AigError,
    aig::ParserError,
    fraig::{CancelToken, FraigConfig},
    sat::VarisatOracle,
};

#[test]
fn load_half_adder() {
    common::init_logger();
    let mut aig = Aig::from_file("tests/circuits/half-adder.aag").unwrap();
    assert_eq!(aig.get_inputs(), &[1, 2]);
    assert_eq!(aig.get_outputs(), &[6, 7]);
    assert_eq!(aig.n_ands(), 3);
    assert_eq!(aig.comment(), Some("half adder"));
    aig.check_integrity().unwrap();

    // Nothing to reduce in a half adder
    let stats = aig.fraig().unwrap();
    assert_eq!(stats.merges, 0);
    assert_eq!(aig.n_ands(), 3);
}

#[test]
fn strash_duplicate_and() {
    common::init_logger();
    // Two structurally identical gates computing in1 & in2, one per output
    let mut aig = Aig::from_aag_str("aag 4 2 0 2 2\n2\n4\n6\n8\n6 2 4\n8 4 2\n").unwrap();
    assert_eq!(aig.n_ands(), 2);
    assert_eq!(aig.strash(), 1);
    assert_eq!(aig.n_ands(), 1);
    assert!(aig.get_node(4).is_none());
    assert_eq!(aig.output_fanin(0), aig.output_fanin(1));
    assert_eq!(aig.get_node(3).unwrap().fanouts().len(), 2);
    aig.check_integrity().unwrap();
}

#[test]
fn duplicate_definition_is_rejected() {
    // Both gates on the same variable: a redefinition, not a structural duplicate
    let err = Aig::from_aag_str("aag 3 2 0 1 2\n2\n4\n6\n6 2 4\n6 2 4\n").unwrap_err();
    assert!(matches!(err, AigError::Parser(_)));
    let err = Aig::from_aag_str("aag 4 2 0 1 2\n2\n4\n6\n6 2 4\n6 2 4\n").unwrap_err();
    assert!(matches!(
        err,
        AigError::Parser(ParserError::RedefGate {
            line: 6,
            previous_line: 5,
            ..
        })
    ));
}

#[test]
fn optimize_constant_fanin() {
    common::init_logger();
    // 3 = 1 & false drives the first output, 4 = 1 & 2 the second one
    let mut aig = Aig::from_aag_str("aag 4 2 0 2 2\n2\n4\n6\n8\n6 2 0\n8 2 4\n").unwrap();
    let before = aig.n_ands();
    assert_eq!(aig.optimize(), 1);
    assert_eq!(aig.n_ands(), before - 1);
    assert!(aig.get_node(3).is_none());
    assert_eq!(aig.output_fanin(0), Some(AigEdge::new(0, false)));
    assert_eq!(aig.output_fanin(1), Some(AigEdge::new(4, false)));
    assert_eq!(aig.get_node(0).unwrap().fanouts(), &[AigEdge::new(5, false)]);
    aig.check_integrity().unwrap();
}

/// `3 = a & b`, `4 = !a & !b`, `5 = b & !4` is `b`, `6 = 5 & a` is `a & b` again.
const SAME_FUNCTION: &str = "aag 6 2 0 2 4\n2\n4\n6\n12\n6 2 4\n8 3 5\n10 4 9\n12 10 2\n";

#[test]
fn fraig_merges_equivalent_gates() {
    common::init_logger();
    let mut aig = Aig::from_aag_str(SAME_FUNCTION).unwrap();
    let rank3 = aig.get_node(3).unwrap().dfs_order().unwrap();
    let rank6 = aig.get_node(6).unwrap().dfs_order().unwrap();
    assert!(rank3 < rank6);

    let stats = aig.fraig().unwrap();
    assert_eq!(stats.merges, 1);
    assert!(stats.proven >= 1);
    // The survivor is the gate ranked first
    assert!(aig.get_node(6).is_none());
    assert_eq!(aig.output_fanin(0), Some(AigEdge::new(3, false)));
    assert_eq!(aig.output_fanin(1), Some(AigEdge::new(3, false)));
    assert_eq!(aig.n_dfs_ands(), 1);
    assert!(aig.fec_groups().is_empty());
    aig.check_integrity().unwrap();

    // 4 and 5 are left dangling, sweeping removes them
    assert_eq!(aig.sweep(), 2);
    assert_eq!(aig.n_ands(), 1);
}

#[test]
fn fraig_is_reproducible() {
    let run = |seed| {
        let mut aig = Aig::from_aag_str(&common::random_circuit(7, 4, 60, 6)).unwrap();
        let config = FraigConfig {
            seed,
            ..FraigConfig::default()
        };
        let stats = aig.fraig_with(VarisatOracle::new(), config).unwrap();
        let mut out = Vec::new();
        aig.write_aag(&mut out).unwrap();
        (stats, out)
    };
    assert_eq!(run(1), run(1));
}

#[test]
fn cancelled_random_simulation() {
    let mut aig = Aig::from_aag_str(SAME_FUNCTION).unwrap();
    let cancel = CancelToken::new();
    cancel.cancel();
    let config = FraigConfig {
        cancel: Some(cancel),
        ..FraigConfig::default()
    };
    let result = aig.fraig_with(VarisatOracle::new(), config);
    assert!(matches!(result, Err(AigError::Cancelled)));
    assert_eq!(aig.n_ands(), 4);
    aig.check_integrity().unwrap();
}

#[test]
fn fraig_splits_rare_pattern_gates() {
    common::init_logger();
    let circuit = common::rare_pattern_circuit(11, 90);
    let run = |config: FraigConfig| {
        let mut aig = Aig::from_aag_str(&circuit).unwrap();
        let stats = aig.fraig_with(VarisatOracle::new(), config).unwrap();
        assert!(aig.fec_groups().is_empty());
        aig.check_integrity().unwrap();
        // Only the two planted pairs are equivalent
        assert_eq!(stats.merges, 2);
        assert!(aig.get_node(common::RARE_INPUTS + 2).is_none());
        assert!(stats.disproven >= 64, "{:?}", stats);
        // One batch of counterexamples fills up during the sweep, the rest at its end
        assert!(stats.resimulations > 1, "{:?}", stats);
        stats
    };

    // The early pair is applied once a fifth of the order is walked,
    // long before the trees are split and resimulated
    let stats = run(FraigConfig::default());
    assert_eq!(stats.merge_batches, 2);

    // Without a threshold everything waits for the end of the sweep
    let stats = run(FraigConfig {
        merge_threshold_start: 1.0,
        ..FraigConfig::default()
    });
    assert_eq!(stats.merge_batches, 1);
}

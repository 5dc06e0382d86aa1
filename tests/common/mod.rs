use std::fmt::Write;

use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A random combinational circuit in the .aag format.
///
/// Each AND gate reads two random literals of lower variables, so few inputs
/// and many gates give a lot of equivalent and constant gates. Outputs are
/// the last gates, with a random polarity.
pub fn random_circuit(seed: u64, n_inputs: usize, n_ands: usize, n_outputs: usize) -> String {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let max_var = n_inputs + n_ands;
    let mut s = format!("aag {} {} 0 {} {}\n", max_var, n_inputs, n_outputs, n_ands);
    for var in 1..=n_inputs {
        writeln!(s, "{}", 2 * var).unwrap();
    }
    for k in 0..n_outputs {
        let var = max_var - (k % n_ands);
        writeln!(s, "{}", 2 * var + rng.gen_range(0..2)).unwrap();
    }
    for var in n_inputs + 1..=max_var {
        let lit0 = rng.gen_range(2..2 * var);
        let lit1 = rng.gen_range(2..2 * var);
        writeln!(s, "{} {} {}", 2 * var, lit0, lit1).unwrap();
    }
    s
}

/// Inputs of [`rare_pattern_circuit`]: 1 to 4 feed two equivalent pairs, the rest the trees.
#[allow(dead_code)]
pub const RARE_INPUTS: usize = 28;

/// Balanced AND trees over 24 inputs with random polarities, which random
/// simulation sees as constant 0 while they are all satisfiable.
///
/// The first output is `(1 & 2) & 1`, equivalent to `1 & 2`, and the last one
/// `(3 & 4) & 4`, equivalent to `3 & 4`, so one pair is proven at the start of
/// the topological order and one at its end. Every tree groups its leaves the
/// same way, so trees only share functions that structural hashing finds.
#[allow(dead_code)]
pub fn rare_pattern_circuit(seed: u64, n_trees: usize) -> String {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let mut var = RARE_INPUTS as u64;
    let mut gates = Vec::new();
    let mut and = |lit0: u64, lit1: u64, gates: &mut Vec<(u64, u64, u64)>| {
        var += 1;
        gates.push((2 * var, lit0, lit1));
        2 * var
    };

    let mut outputs = Vec::new();
    let early = and(2, 4, &mut gates);
    outputs.push(and(early, 2, &mut gates));
    for _ in 0..n_trees {
        let mut level: Vec<u64> = (5..=RARE_INPUTS as u64)
            .map(|input| 2 * input + rng.gen_range(0..2))
            .collect();
        while level.len() > 1 {
            let mut next = Vec::new();
            for pair in level.chunks(2) {
                match *pair {
                    [lit0, lit1] => next.push(and(lit0, lit1, &mut gates)),
                    [lit] => next.push(lit),
                    _ => unreachable!(),
                }
            }
            level = next;
        }
        outputs.push(level[0]);
    }
    let late = and(6, 8, &mut gates);
    outputs.push(and(late, 8, &mut gates));

    let mut s = format!(
        "aag {} {} 0 {} {}\n",
        var,
        RARE_INPUTS,
        outputs.len(),
        gates.len()
    );
    for input in 1..=RARE_INPUTS {
        writeln!(s, "{}", 2 * input).unwrap();
    }
    for lit in outputs {
        writeln!(s, "{}", lit).unwrap();
    }
    for (lhs, lit0, lit1) in gates {
        writeln!(s, "{} {} {}", lhs, lit0, lit1).unwrap();
    }
    s
}

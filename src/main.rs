//! Batch driver: reads an .aag circuit, runs the requested passes in a fixed
//! order (sweep, optimize, strash, simulation, fraig) and writes the result.
//!
//! Logs go through `env_logger`, set `RUST_LOG=info` to follow the merges.

use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::PathBuf,
    process::ExitCode,
};

use aigfraig::{
    Aig, NodeId, Result,
    fraig::FraigConfig,
    sat::VarisatOracle,
};
use clap::Parser;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

/// Functional reduction of combinational AIGs.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Circuit to load, in the ASCII AIGER (.aag) format
    input: PathBuf,

    /// Remove the gates not reachable from any output
    #[arg(long)]
    sweep: bool,

    /// Apply the trivial simplifications (constant and identical fanins)
    #[arg(long)]
    optimize: bool,

    /// Merge structurally identical gates
    #[arg(long)]
    strash: bool,

    /// Simulate random patterns until the FEC groups stop splitting
    #[arg(long)]
    random: bool,

    /// Simulate the patterns of this file
    #[arg(long, value_name = "FILE")]
    patterns: Option<PathBuf>,

    /// Write every simulated pattern with the output values to this file
    #[arg(long, value_name = "FILE")]
    sim_log: Option<PathBuf>,

    /// Prove the FEC groups with the SAT solver and merge equivalent gates
    #[arg(long)]
    fraig: bool,

    /// Seed of the random simulation
    #[arg(long, default_value_t = 0x5eed)]
    seed: u64,

    /// Print the circuit summary, netlist and FEC groups
    #[arg(long)]
    report: bool,

    /// Write the resulting circuit to this file
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Print the cone of a single gate (or output) in the .aag format
    #[arg(long, value_name = "ID")]
    write_gate: Option<NodeId>,
}

fn run(args: &Args) -> Result<()> {
    let mut aig = Aig::from_file(&args.input)?;

    if args.sweep {
        aig.sweep();
    }
    if args.optimize {
        aig.optimize();
    }
    if args.strash {
        aig.strash();
    }

    let mut sim_log = match &args.sim_log {
        Some(path) => Some(BufWriter::new(File::create(path)?)),
        None => None,
    };
    if args.random {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(args.seed);
        let log = sim_log.as_mut().map(|w| w as &mut dyn Write);
        aig.random_sim(&mut rng, log, None)?;
    }
    if let Some(path) = &args.patterns {
        let reader = BufReader::new(File::open(path)?);
        let log = sim_log.as_mut().map(|w| w as &mut dyn Write);
        aig.file_sim(reader, log)?;
    }
    if let Some(mut w) = sim_log {
        w.flush()?;
    }

    if args.fraig {
        let config = FraigConfig {
            seed: args.seed,
            ..FraigConfig::default()
        };
        let stats = aig.fraig_with(VarisatOracle::new(), config)?;
        log::info!("{:?}", stats);
    }

    if args.report {
        aig.sort_fec_groups_by_var();
        print!("{}", aig.summary_report());
        print!("{}", aig.netlist_report());
        print!("{}", aig.pi_report());
        print!("{}", aig.po_report());
        print!("{}", aig.floating_report());
        print!("{}", aig.fec_report());
    }

    if let Some(id) = args.write_gate {
        let stdout = std::io::stdout();
        aig.write_gate(id, &mut stdout.lock())?;
    }
    if let Some(path) = &args.output {
        let mut w = BufWriter::new(File::create(path)?);
        aig.write_aag(&mut w)?;
        w.flush()?;
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

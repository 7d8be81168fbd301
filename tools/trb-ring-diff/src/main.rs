//! Cross-check and time the TRB range evaluators.
//!
//! Runs the acceptance matrix against every evaluator, then the exhaustive boundary and random
//! differential runs on a ring of the requested shape, then (unless skipped) a throughput
//! comparison. Exits nonzero on any failure or mismatch; documented divergences of the segment
//! walk are reported but do not fail the run.

use anyhow::{bail, Context};
use clap::Parser;
use trb_ring::harness::{
    harness_ring, measure, run_acceptance, seeded_rng, CrossChecked, Differential,
    DifferentialReport,
};
use trb_ring::reference::{CaseTable, SegmentWalk};
use trb_ring::{Linearized, RangeEvaluator, RingGeometry, TRBS_PER_SEGMENT, TRB_LEN};

#[derive(Parser, Debug)]
#[command(
    name = "trb-ring-diff",
    about = "Differential test and benchmark of xHCI TD span membership evaluators."
)]
struct Args {
    /// Number of segments in the ring used for the differential runs
    #[arg(long, default_value_t = 6)]
    segments: usize,

    /// TRBs per segment
    #[arg(long, value_name = "COUNT", default_value_t = TRBS_PER_SEGMENT)]
    trbs_per_segment: u32,

    /// Random differential trials
    #[arg(long, default_value_t = 100_000)]
    trials: u64,

    /// Seed for the random runs
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Input sets timed per evaluator; each set is evaluated 10 times
    #[arg(long, value_name = "COUNT", default_value_t = 100_000)]
    bench_iterations: u64,

    /// Skip the throughput comparison
    #[arg(long, action = clap::ArgAction::SetTrue)]
    skip_bench: bool,
}

const BENCH_REPEATS: u32 = 10;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    run(Args::parse())
}

fn run(args: Args) -> anyhow::Result<()> {
    let checked: [&dyn CrossChecked; 3] = [&Linearized, &SegmentWalk, &CaseTable];

    let mut failed = false;
    for eval in checked {
        let report = run_acceptance(eval).context("build acceptance rings")?;
        println!(
            "acceptance {:<12} passed {:>2}, tolerated {}, failed {}",
            eval.name(),
            report.passed,
            report.tolerated.len(),
            report.failures.len()
        );
        for label in &report.tolerated {
            println!("  known blind spot: {label}");
        }
        for failure in &report.failures {
            println!("  FAIL {failure}");
        }
        failed |= !report.is_clean();
    }

    let geometry = RingGeometry::new(args.trbs_per_segment, TRB_LEN)
        .context("invalid --trbs-per-segment")?;
    let ring = harness_ring(geometry, args.segments).with_context(|| {
        format!(
            "build a {}-segment ring of {} TRBs per segment",
            args.segments, args.trbs_per_segment
        )
    })?;
    tracing::info!(
        segments = ring.segment_count(),
        trbs_per_segment = geometry.trbs_per_segment(),
        seed = args.seed,
        "starting differential runs"
    );

    let diff = Differential::new(&ring);
    let exhaustive = diff.run_exhaustive();
    let random = diff.run_random(&mut seeded_rng(args.seed), args.trials);
    for (label, report) in [("exhaustive", &exhaustive), ("random", &random)] {
        print_differential(label, report);
    }
    let mut total = exhaustive;
    total.merge(random);
    println!(
        "{:<10} trials {}, agree {}, documented divergences {}, mismatches {}",
        "total", total.trials, total.agreements, total.documented_divergences, total.mismatch_count
    );
    failed |= !total.is_clean();

    if !args.skip_bench {
        let evaluators: [&dyn RangeEvaluator; 3] = [&Linearized, &SegmentWalk, &CaseTable];
        let report = measure(
            &evaluators,
            &ring,
            &mut seeded_rng(args.seed.wrapping_add(1)),
            args.bench_iterations,
            BENCH_REPEATS,
        );
        println!(
            "throughput: {} input sets, {} calls per evaluator",
            report.iterations, report.calls
        );
        for (name, elapsed) in &report.timings {
            let per_call = if report.calls == 0 {
                0.0
            } else {
                elapsed.as_nanos() as f64 / report.calls as f64
            };
            println!("  {name:<12} {elapsed:?} ({per_call:.1} ns/call)");
        }
    }

    if failed {
        bail!("evaluators disagree; see the report above");
    }
    Ok(())
}

fn print_differential(label: &str, report: &DifferentialReport) {
    println!(
        "{label:<10} trials {}, agree {}, documented divergences {}, mismatches {}",
        report.trials, report.agreements, report.documented_divergences, report.mismatch_count
    );
    for m in &report.mismatches {
        println!("  MISMATCH {m}");
    }
}

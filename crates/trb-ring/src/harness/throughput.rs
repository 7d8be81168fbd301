//! Wall-clock comparison of evaluators on identical inputs.

use std::hint::black_box;
use std::time::{Duration, Instant};

use rand::Rng;

use crate::{RangeDescriptor, RangeEvaluator, Ring, SegmentId, TrbRef};

/// Calls made per evaluator per repeat of one iteration.
pub const CALLS_PER_ITERATION: u64 = 6;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ThroughputReport {
    pub iterations: u64,
    /// Calls made to each evaluator.
    pub calls: u64,
    pub timings: Vec<(&'static str, Duration)>,
}

impl ThroughputReport {
    pub fn timing(&self, name: &str) -> Option<Duration> {
        self.timings
            .iter()
            .find(|(n, _)| *n == name)
            .map(|&(_, d)| d)
    }
}

type Call = (RangeDescriptor, u64);

/// Three rotations of (start, end, target) index within segment 0, then three with the segments
/// rotated as well.
fn arrangements<R: Rng + ?Sized>(ring: &Ring, segs: &[SegmentId], rng: &mut R) -> Option<[Call; 6]> {
    let tps = ring.geometry().trbs_per_segment();
    let (s, e, x) = (
        rng.gen_range(0..tps),
        rng.gen_range(0..tps),
        rng.gen_range(0..tps),
    );
    let mut pick = || segs[rng.gen_range(0..segs.len())];
    let (start, end, target) = (pick(), pick(), pick());
    let first = *segs.first()?;

    let call = |a: (SegmentId, u32), b: (SegmentId, u32), t: (SegmentId, u32)| -> Option<Call> {
        let range = RangeDescriptor::new(TrbRef::new(a.0, a.1), TrbRef::new(b.0, b.1));
        let dma = ring.trb_dma(TrbRef::new(t.0, t.1))?;
        Some((range, dma))
    };
    Some([
        call((first, s), (first, e), (first, x))?,
        call((first, x), (first, s), (first, e))?,
        call((first, e), (first, x), (first, s))?,
        call((start, s), (end, e), (target, x))?,
        call((target, s), (start, e), (end, x))?,
        call((end, s), (target, e), (start, x))?,
    ])
}

/// Time every evaluator over `iterations` random input sets, each evaluated `repeats` times.
///
/// Inputs are generated before timing starts so that every evaluator sees the same calls and the
/// generator does not count against anyone.
pub fn measure<R: Rng + ?Sized>(
    evaluators: &[&dyn RangeEvaluator],
    ring: &Ring,
    rng: &mut R,
    iterations: u64,
    repeats: u32,
) -> ThroughputReport {
    let segs: Vec<SegmentId> = ring.segment_ids().collect();
    let inputs: Vec<[Call; 6]> = (0..iterations)
        .filter_map(|_| arrangements(ring, &segs, rng))
        .collect();

    let timings = evaluators
        .iter()
        .map(|eval| {
            let mut total = Duration::ZERO;
            for set in &inputs {
                let begin = Instant::now();
                for _ in 0..repeats {
                    for (range, dma) in set {
                        black_box(eval.evaluate(ring, black_box(range), black_box(*dma)));
                    }
                }
                total += begin.elapsed();
            }
            tracing::debug!(evaluator = eval.name(), ?total, "timed evaluator");
            (eval.name(), total)
        })
        .collect();

    let iterations = inputs.len() as u64;
    ThroughputReport {
        iterations,
        calls: iterations * CALLS_PER_ITERATION * u64::from(repeats),
        timings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::{harness_ring, seeded_rng};
    use crate::reference::{CaseTable, SegmentWalk};
    use crate::{Linearized, RingGeometry};

    #[test]
    fn reports_every_evaluator_in_order() {
        let ring = harness_ring(RingGeometry::default(), 3).unwrap();
        let evals: [&dyn RangeEvaluator; 3] = [&Linearized, &SegmentWalk, &CaseTable];
        let report = measure(&evals, &ring, &mut seeded_rng(1), 50, 2);
        assert_eq!(report.iterations, 50);
        assert_eq!(report.calls, 50 * 6 * 2);
        let names: Vec<_> = report.timings.iter().map(|(n, _)| *n).collect();
        assert_eq!(names, ["linearized", "segment-walk", "case-table"]);
        assert!(report.timing("case-table").is_some());
        assert!(report.timing("nope").is_none());
    }

    #[test]
    fn zero_iterations_is_empty() {
        let ring = harness_ring(RingGeometry::default(), 1).unwrap();
        let report = measure(&[&Linearized], &ring, &mut seeded_rng(1), 0, 10);
        assert_eq!(report.calls, 0);
        assert_eq!(report.timings, vec![("linearized", Duration::ZERO)]);
    }
}

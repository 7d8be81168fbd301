//! Differential runs: the canonical evaluator against the reference evaluators.

use core::fmt;

use rand::Rng;

use crate::reference::{CaseTable, SegmentWalk};
use crate::{Linearized, RangeDescriptor, RangeEvaluator, Ring, SegmentId, TrbRef};

use super::{outside_address, CrossChecked};
use super::topology::Topology;

/// Cap on mismatches kept for display; all of them are still counted.
const MAX_REPORTED_MISMATCHES: usize = 16;

/// Out of every this many random targets, one is an address outside the ring.
const OUTSIDE_TARGET_ODDS: u32 = 32;

/// A disagreement between an oracle and the canonical evaluator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mismatch {
    pub oracle: &'static str,
    pub range: RangeDescriptor,
    pub dma: u64,
    pub target: Option<TrbRef>,
    pub canonical: Option<u32>,
    pub oracle_result: Option<u32>,
}

fn fmt_end(f: &mut fmt::Formatter<'_>, seg: Option<SegmentId>, idx: u32) -> fmt::Result {
    match seg {
        Some(seg) => write!(f, "{}[{}]", seg.ordinal(), idx),
        None => write!(f, "NULL[{idx}]"),
    }
}

fn fmt_seg(f: &mut fmt::Formatter<'_>, seg: Option<u32>) -> fmt::Result {
    match seg {
        Some(s) => write!(f, "seg {s}"),
        None => write!(f, "none"),
    }
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} disagrees: ", self.oracle)?;
        fmt_end(f, self.range.start_seg, self.range.start_idx)?;
        write!(f, " -> ")?;
        fmt_end(f, self.range.end_seg, self.range.end_idx)?;
        match self.target {
            Some(t) => write!(f, " dma: {}[{}]", t.seg.ordinal(), t.index)?,
            None => write!(f, " dma: {:#x}", self.dma)?,
        }
        write!(f, " (canonical ")?;
        fmt_seg(f, self.canonical)?;
        write!(f, ", {} ", self.oracle)?;
        fmt_seg(f, self.oracle_result)?;
        write!(f, ")")
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    Agree,
    /// The oracle missed a target in a case it is documented not to handle.
    DocumentedDivergence,
    Mismatch(Vec<Mismatch>),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DifferentialReport {
    pub trials: u64,
    pub agreements: u64,
    pub documented_divergences: u64,
    pub mismatch_count: u64,
    /// The first few mismatches, for display.
    pub mismatches: Vec<Mismatch>,
}

impl DifferentialReport {
    pub fn is_clean(&self) -> bool {
        self.mismatch_count == 0
    }

    fn record(&mut self, verdict: Verdict) {
        self.trials += 1;
        match verdict {
            Verdict::Agree => self.agreements += 1,
            Verdict::DocumentedDivergence => self.documented_divergences += 1,
            Verdict::Mismatch(found) => {
                self.mismatch_count += 1;
                let room = MAX_REPORTED_MISMATCHES.saturating_sub(self.mismatches.len());
                self.mismatches.extend(found.into_iter().take(room));
            }
        }
    }

    pub fn merge(&mut self, other: DifferentialReport) {
        self.trials += other.trials;
        self.agreements += other.agreements;
        self.documented_divergences += other.documented_divergences;
        self.mismatch_count += other.mismatch_count;
        let room = MAX_REPORTED_MISMATCHES.saturating_sub(self.mismatches.len());
        self.mismatches
            .extend(other.mismatches.into_iter().take(room));
    }
}

/// Runs [`Linearized`] against [`SegmentWalk`] and [`CaseTable`] on one ring.
pub struct Differential<'a> {
    ring: &'a Ring,
    oracles: [&'static dyn CrossChecked; 2],
}

impl<'a> Differential<'a> {
    pub fn new(ring: &'a Ring) -> Self {
        Self {
            ring,
            oracles: [&SegmentWalk, &CaseTable],
        }
    }

    /// Compare every evaluator on one input.
    ///
    /// `target` is the TRB the address was derived from, if any; it is only used to recognise
    /// documented divergences and to label mismatches.
    pub fn check(&self, range: &RangeDescriptor, dma: u64, target: Option<TrbRef>) -> Verdict {
        let canonical = Linearized.evaluate(self.ring, range, dma);
        let mut divergent = false;
        let mut found = Vec::new();
        for oracle in self.oracles {
            let got = oracle.evaluate(self.ring, range, dma);
            if got == canonical {
                continue;
            }
            let documented = got.is_none()
                && canonical.is_some_and(|seg| oracle.is_known_blind_spot(range, seg));
            if documented {
                divergent = true;
                continue;
            }
            found.push(Mismatch {
                oracle: oracle.name(),
                range: *range,
                dma,
                target,
                canonical: canonical.map(|s| s.ordinal()),
                oracle_result: got.map(|s| s.ordinal()),
            });
        }
        if !found.is_empty() {
            for m in &found {
                tracing::warn!("{m}");
            }
            Verdict::Mismatch(found)
        } else if divergent {
            Verdict::DocumentedDivergence
        } else {
            Verdict::Agree
        }
    }

    /// Every segment triple crossed with every triple of boundary TRB indices.
    pub fn run_exhaustive(&self) -> DifferentialReport {
        let indices = boundary_indices(self.ring.geometry().trbs_per_segment());
        let segs: Vec<SegmentId> = self.ring.segment_ids().collect();
        let mut report = DifferentialReport::default();
        for &s in &segs {
            for &e in &segs {
                for &t in &segs {
                    for &si in &indices {
                        for &ei in &indices {
                            let range = RangeDescriptor::new(TrbRef::new(s, si), TrbRef::new(e, ei));
                            for &ti in &indices {
                                let target = TrbRef::new(t, ti);
                                let Some(dma) = self.ring.trb_dma(target) else {
                                    continue;
                                };
                                report.record(self.check(&range, dma, Some(target)));
                            }
                        }
                    }
                }
            }
        }
        tracing::debug!(
            trials = report.trials,
            mismatches = report.mismatch_count,
            "exhaustive boundary run finished"
        );
        report
    }

    /// `trials` random descriptors drawn evenly from every [`Topology`] of the ring.
    pub fn run_random<R: Rng + ?Sized>(&self, rng: &mut R, trials: u64) -> DifferentialReport {
        let topologies = Topology::all_for(self.ring);
        let segs: Vec<SegmentId> = self.ring.segment_ids().collect();
        let tps = self.ring.geometry().trbs_per_segment();
        let outside = outside_address(self.ring);

        let mut report = DifferentialReport::default();
        if topologies.is_empty() || segs.is_empty() {
            return report;
        }
        for trial in 0..trials {
            let topo = topologies[(trial % topologies.len() as u64) as usize];
            let Some(range) = topo.sample(self.ring, rng) else {
                continue;
            };
            if rng.gen_range(0..OUTSIDE_TARGET_ODDS) == 0 {
                report.record(self.check(&range, outside, None));
                continue;
            }
            let target = TrbRef::new(segs[rng.gen_range(0..segs.len())], rng.gen_range(0..tps));
            let Some(dma) = self.ring.trb_dma(target) else {
                continue;
            };
            report.record(self.check(&range, dma, Some(target)));
        }
        tracing::debug!(
            trials = report.trials,
            divergences = report.documented_divergences,
            mismatches = report.mismatch_count,
            "random run finished"
        );
        report
    }
}

/// First, second, middle and last TRB indices of a segment, deduplicated.
pub fn boundary_indices(trbs_per_segment: u32) -> Vec<u32> {
    let last = trbs_per_segment.saturating_sub(1);
    let mid = trbs_per_segment / 2;
    let mut out: Vec<u32> = [
        0,
        1,
        mid.saturating_sub(1),
        mid,
        mid + 1,
        last.saturating_sub(1),
        last,
    ]
    .into_iter()
    .filter(|&i| i < trbs_per_segment)
    .collect();
    out.sort_unstable();
    out.dedup();
    out
}

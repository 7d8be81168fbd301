//! The labelled acceptance matrix.
//!
//! Cases 1-6 run on a single self-linked segment, 7-15 on a three-segment ring. The remaining
//! cases feed malformed or missing input and must all come back as no match. Segment numbers in
//! the cases are ring ordinals.

use core::fmt;

use thiserror::Error;

use crate::{RangeDescriptor, RangeEvaluator, Ring, RingError, RingGeometry, SegmentId, TrbRef};

use super::{harness_ring, CrossChecked};

/// A case that cannot be set up on the rings it asks for.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AcceptanceError {
    #[error(transparent)]
    Ring(#[from] RingError),

    #[error("case {label:?} names segment {segment} of a {segments}-segment ring")]
    NoSuchSegment {
        label: &'static str,
        segment: u32,
        segments: usize,
    },

    #[error("case {label:?} targets TRB {index} of segment {segment}, which does not exist")]
    NoSuchTarget {
        label: &'static str,
        segment: u32,
        index: u32,
    },
}

/// One end of a TD span as written in the matrix.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Endpoint {
    Trb(u32, u32),
    /// A null segment reference.
    Missing,
    /// A handle from an unrelated ring of the same shape.
    Foreign(u32, u32),
}

/// The completion address of a case.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Target {
    Trb(u32, u32),
    /// An address between two segments.
    Gap,
    Dma(u64),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Expect {
    Segment(u32),
    NoMatch,
}

#[derive(Clone, Copy, Debug)]
pub struct AcceptanceCase {
    pub label: &'static str,
    pub segments: usize,
    pub start: Endpoint,
    pub end: Endpoint,
    pub target: Target,
    pub expect: Expect,
}

use Endpoint::{Foreign, Missing, Trb as E};
use Expect::{NoMatch, Segment as Hit};

const fn case(
    label: &'static str,
    segments: usize,
    start: Endpoint,
    end: Endpoint,
    target: Target,
    expect: Expect,
) -> AcceptanceCase {
    AcceptanceCase {
        label,
        segments,
        start,
        end,
        target,
        expect,
    }
}

#[rustfmt::skip]
pub const CASES: &[AcceptanceCase] = &[
    case("1. [Start -> TRB -> End]", 1, E(0, 0), E(0, 100), Target::Trb(0, 50), Hit(0)),
    case("2. [End - Start -> TRB]", 1, E(0, 50), E(0, 0), Target::Trb(0, 100), Hit(0)),
    case("3. [Start -> End - TRB]", 1, E(0, 0), E(0, 50), Target::Trb(0, 100), NoMatch),
    case("4. [TRB -> End - Start]", 1, E(0, 100), E(0, 50), Target::Trb(0, 0), Hit(0)),
    case("5. [End - TRB - Start]", 1, E(0, 100), E(0, 0), Target::Trb(0, 50), NoMatch),
    case("6. [TRB - Start -> End]", 1, E(0, 50), E(0, 100), Target::Trb(0, 0), NoMatch),
    case("7. [Start -> TRB]", 3, E(0, 0), E(1, 0), Target::Trb(0, 100), Hit(0)),
    case("8. [Start -> End]", 3, E(0, 0), E(0, 100), Target::Trb(1, 0), NoMatch),
    case("9. [End - Start]", 3, E(0, 100), E(0, 0), Target::Trb(1, 100), Hit(1)),
    case("10. [End - TRB]", 3, E(0, 0), E(1, 0), Target::Trb(1, 100), NoMatch),
    case("11. [TRB -> End]", 3, E(0, 0), E(1, 100), Target::Trb(1, 0), Hit(1)),
    case("12. [TRB - Start]", 3, E(0, 100), E(2, 0), Target::Trb(0, 0), NoMatch),
    case("13. [Start] -> [End]", 3, E(0, 0), E(1, 100), Target::Trb(2, 0), NoMatch),
    case("14. [Start] -> [TRB] -> [End]", 3, E(0, 0), E(2, 0), Target::Trb(1, 0), Hit(1)),
    case("15. [Start] -> [End] - [TRB]", 3, E(0, 0), E(1, 0), Target::Trb(2, 0), NoMatch),
    case("start TRB not in start segment", 3, E(0, 256), E(0, 100), Target::Trb(0, 50), NoMatch),
    case("end TRB not in end segment", 3, E(0, 0), E(0, 256), Target::Trb(0, 50), NoMatch),
    case("start TRB index is garbage", 3, E(0, u32::MAX), E(1, 0), Target::Trb(0, 100), NoMatch),
    case("DMA is not a TRB", 3, E(0, 0), E(1, 0), Target::Gap, NoMatch),
    case("DMA is below the ring", 3, E(0, 0), E(1, 0), Target::Dma(0x10), NoMatch),
    case("start segment is NULL", 3, Missing, E(1, 0), Target::Trb(0, 100), NoMatch),
    case("end segment is NULL", 3, E(0, 0), Missing, Target::Trb(0, 100), NoMatch),
    case("both segments are NULL", 3, Missing, Missing, Target::Trb(0, 100), NoMatch),
    case("DMA is NULL", 3, E(0, 0), E(1, 0), Target::Dma(0), NoMatch),
    case("start segment from another ring", 3, Foreign(0, 0), E(1, 0), Target::Trb(0, 100), NoMatch),
    case("end segment from another ring", 3, E(0, 0), Foreign(1, 0), Target::Trb(0, 100), NoMatch),
];

/// A case whose result differed from the matrix.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaseFailure {
    pub label: &'static str,
    pub evaluator: &'static str,
    pub expected: Expect,
    pub got: Option<u32>,
}

impl fmt::Display for CaseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: case {:?} expected ", self.evaluator, self.label)?;
        match self.expected {
            Expect::Segment(s) => write!(f, "segment {s}")?,
            Expect::NoMatch => write!(f, "no match")?,
        }
        match self.got {
            Some(s) => write!(f, ", got segment {s}"),
            None => write!(f, ", got no match"),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct AcceptanceReport {
    pub passed: usize,
    /// Cases the evaluator reports as a known blind spot and that it did miss.
    pub tolerated: Vec<&'static str>,
    pub failures: Vec<CaseFailure>,
}

impl AcceptanceReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// A case instantiated on real rings.
struct Instance {
    ring: Ring,
    range: RangeDescriptor,
    dma: u64,
}

impl AcceptanceCase {
    fn instantiate(&self) -> Result<Instance, AcceptanceError> {
        let geometry = RingGeometry::default();
        let ring = harness_ring(geometry, self.segments)?;
        let foreign = harness_ring(geometry, self.segments)?;

        // Only TRB indices may be out of range on purpose; segment numbers must exist.
        let segment = |r: &Ring, segment: u32| {
            r.segment_id(segment).ok_or(AcceptanceError::NoSuchSegment {
                label: self.label,
                segment,
                segments: self.segments,
            })
        };
        let resolve = |ep: Endpoint| -> Result<(Option<SegmentId>, u32), AcceptanceError> {
            Ok(match ep {
                Endpoint::Trb(seg, idx) => (Some(segment(&ring, seg)?), idx),
                Endpoint::Missing => (None, 0),
                Endpoint::Foreign(seg, idx) => (Some(segment(&foreign, seg)?), idx),
            })
        };
        let (start_seg, start_idx) = resolve(self.start)?;
        let (end_seg, end_idx) = resolve(self.end)?;
        let range = RangeDescriptor {
            start_seg,
            start_idx,
            end_seg,
            end_idx,
        };

        let dma = match self.target {
            Target::Trb(seg, index) => ring
                .trb_dma(TrbRef::new(segment(&ring, seg)?, index))
                .ok_or(AcceptanceError::NoSuchTarget {
                    label: self.label,
                    segment: seg,
                    index,
                })?,
            // Harness rings leave a segment-sized hole after each segment.
            Target::Gap => super::HARNESS_BASE + geometry.segment_len_bytes() + 8,
            Target::Dma(dma) => dma,
        };
        Ok(Instance { ring, range, dma })
    }
}

/// Run every case in [`CASES`] against `evaluator`.
pub fn run_acceptance(evaluator: &dyn CrossChecked) -> Result<AcceptanceReport, AcceptanceError> {
    run_cases(CASES, evaluator)
}

pub fn run_cases(
    cases: &[AcceptanceCase],
    evaluator: &dyn CrossChecked,
) -> Result<AcceptanceReport, AcceptanceError> {
    let mut report = AcceptanceReport::default();
    for case in cases {
        let inst = case.instantiate()?;
        let got = evaluator.evaluate(&inst.ring, &inst.range, inst.dma);
        let got_ordinal = got.map(|s| s.ordinal());
        let ok = match case.expect {
            Expect::Segment(s) => got_ordinal == Some(s),
            Expect::NoMatch => got.is_none(),
        };
        if ok {
            report.passed += 1;
            continue;
        }

        let blind = match case.expect {
            Expect::Segment(s) => {
                got.is_none()
                    && inst
                        .ring
                        .segment_id(s)
                        .is_some_and(|target| evaluator.is_known_blind_spot(&inst.range, target))
            }
            Expect::NoMatch => false,
        };
        if blind {
            tracing::debug!(evaluator = evaluator.name(), case = case.label, "known blind spot");
            report.tolerated.push(case.label);
        } else {
            report.failures.push(CaseFailure {
                label: case.label,
                evaluator: evaluator.name(),
                expected: case.expect,
                got: got_ordinal,
            });
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::SegmentWalk;
    use crate::Linearized;

    #[test]
    fn every_case_instantiates() {
        for case in CASES {
            assert!(case.instantiate().is_ok(), "{}", case.label);
        }
    }

    #[test]
    fn target_outside_its_segment_is_an_error() {
        let bad = [case("typo", 3, E(0, 0), E(1, 0), Target::Trb(0, 256), NoMatch)];
        assert_eq!(
            run_cases(&bad, &Linearized).unwrap_err(),
            AcceptanceError::NoSuchTarget {
                label: "typo",
                segment: 0,
                index: 256
            }
        );
    }

    #[test]
    fn unknown_segment_is_an_error() {
        let bad = [case("typo", 3, E(0, 0), E(3, 0), Target::Trb(0, 1), NoMatch)];
        assert_eq!(
            run_cases(&bad, &SegmentWalk).unwrap_err(),
            AcceptanceError::NoSuchSegment {
                label: "typo",
                segment: 3,
                segments: 3
            }
        );
        let bad = [case("typo", 1, E(0, 0), E(0, 1), Target::Trb(2, 1), NoMatch)];
        assert!(matches!(
            run_cases(&bad, &SegmentWalk),
            Err(AcceptanceError::NoSuchSegment { segment: 2, .. })
        ));
    }

    #[test]
    fn empty_ring_case_reports_the_ring_error() {
        let bad = [case("empty", 0, Missing, Missing, Target::Dma(0), NoMatch)];
        assert_eq!(
            run_cases(&bad, &Linearized).unwrap_err(),
            AcceptanceError::Ring(RingError::NoSegments)
        );
    }
}

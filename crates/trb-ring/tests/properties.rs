#![cfg(not(target_arch = "wasm32"))]

use proptest::prelude::*;
use trb_ring::reference::CaseTable;
use trb_ring::{LookupError, Linearizer, RangeDescriptor, RangeEvaluator, Ring, RingGeometry, TrbRef};

const BASE: u64 = 0x40_0000;

fn ring(segments: usize, tps: u32) -> Ring {
    let geometry = RingGeometry::new(tps, 16).unwrap();
    // Segments in descending address order with a gap after each one.
    let mut builder = Ring::builder(geometry);
    for ord in 0..segments as u64 {
        let slot = segments as u64 - 1 - ord;
        builder = builder.segment(BASE + slot * 2 * geometry.segment_len_bytes());
    }
    builder.build().unwrap()
}

fn geometry_and_ring() -> impl Strategy<Value = (usize, u32)> {
    (1usize..=6, prop_oneof![Just(1u32), Just(2), Just(3), Just(16), Just(256)])
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    #[test]
    fn linearize_is_strictly_monotonic(
        segments in 1u32..64,
        tps in 1u32..=4096,
        a in (0u32..64, 0u32..4096),
        b in (0u32..64, 0u32..4096),
    ) {
        let lin = Linearizer::for_geometry(segments, RingGeometry::new(tps, 16).unwrap());
        let (a, b) = ((a.0, a.1 % tps), (b.0, b.1 % tps));
        prop_assert_eq!(a.cmp(&b), lin.linearize(a.0, a.1).cmp(&lin.linearize(b.0, b.1)));
    }

    #[test]
    fn resolve_rounds_down_and_inverts_trb_dma(
        (segments, tps) in geometry_and_ring(),
        ord in 0u32..6,
        idx in 0u32..256,
        offset in 0u64..16,
        entry in 0u32..6,
    ) {
        let r = ring(segments, tps);
        let ord = ord % segments as u32;
        let idx = idx % tps;
        let seg = r.segment_id(ord).unwrap();
        let dma = r.trb_dma(TrbRef::new(seg, idx)).unwrap() + offset;
        let entry = r.segment_id(entry % segments as u32);
        prop_assert_eq!(r.resolve(entry, dma), Ok(TrbRef::new(seg, idx)));
    }

    #[test]
    fn addresses_outside_every_segment_are_unresolvable(
        (segments, tps) in geometry_and_ring(),
        dma in any::<u64>(),
    ) {
        let r = ring(segments, tps);
        let inside = r.segment_ids().any(|id| r.segment(id).unwrap().contains_dma(dma));
        prop_assume!(!inside);
        prop_assert_eq!(
            r.resolve(r.segment_id(0), dma),
            Err(LookupError::Unresolvable { dma })
        );
    }

    #[test]
    fn canonical_agrees_with_case_table(
        (segments, tps) in geometry_and_ring(),
        s in (0u32..6, 0u32..256),
        e in (0u32..6, 0u32..256),
        t in (0u32..6, 0u32..256),
    ) {
        let r = ring(segments, tps);
        let at = |(o, i): (u32, u32)| {
            TrbRef::new(r.segment_id(o % segments as u32).unwrap(), i % tps)
        };
        let range = RangeDescriptor::new(at(s), at(e));
        let dma = r.trb_dma(at(t)).unwrap();
        prop_assert_eq!(r.dma_in_range(&range, dma), CaseTable.evaluate(&r, &range, dma));
    }

    #[test]
    fn a_match_is_the_target_segment(
        (segments, tps) in geometry_and_ring(),
        s in (0u32..6, 0u32..256),
        e in (0u32..6, 0u32..256),
        t in (0u32..6, 0u32..256),
    ) {
        let r = ring(segments, tps);
        let at = |(o, i): (u32, u32)| {
            TrbRef::new(r.segment_id(o % segments as u32).unwrap(), i % tps)
        };
        let target = at(t);
        let range = RangeDescriptor::new(at(s), at(e));
        if let Some(seg) = r.dma_in_range(&range, r.trb_dma(target).unwrap()) {
            prop_assert_eq!(seg, target.seg);
        }
        // The endpoints of a span are always inside it.
        prop_assert_eq!(r.dma_in_range(&range, r.trb_dma(at(s)).unwrap()), Some(at(s).seg));
        prop_assert_eq!(r.dma_in_range(&range, r.trb_dma(at(e)).unwrap()), Some(at(e).seg));
    }

    #[test]
    fn out_of_range_indices_never_match(
        (segments, tps) in geometry_and_ring(),
        bad in any::<u32>(),
        dma in any::<u64>(),
    ) {
        prop_assume!(bad >= tps);
        let r = ring(segments, tps);
        let s0 = r.segment_id(0).unwrap();
        let range = RangeDescriptor::new(TrbRef::new(s0, bad), TrbRef::new(s0, 0));
        prop_assert_eq!(r.dma_in_range(&range, dma), None);
        let range = RangeDescriptor::new(TrbRef::new(s0, 0), TrbRef::new(s0, bad));
        prop_assert_eq!(r.dma_in_range(&range, dma), None);
    }
}

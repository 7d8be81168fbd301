#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(not(target_arch = "wasm32"))]
use std::time::Duration;

#[cfg(not(target_arch = "wasm32"))]
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
#[cfg(not(target_arch = "wasm32"))]
use trb_ring::harness::harness_ring;
#[cfg(not(target_arch = "wasm32"))]
use trb_ring::reference::{CaseTable, SegmentWalk};
#[cfg(not(target_arch = "wasm32"))]
use trb_ring::{Linearized, RangeDescriptor, RangeEvaluator, RingGeometry, TrbRef};

#[cfg(not(target_arch = "wasm32"))]
fn criterion_config() -> Criterion {
    match std::env::var("TRB_RING_BENCH_PROFILE").as_deref() {
        Ok("ci") => Criterion::default()
            // Keep PR runtime low.
            .warm_up_time(Duration::from_millis(200))
            .measurement_time(Duration::from_secs(1))
            .sample_size(10)
            .noise_threshold(0.05),
        _ => Criterion::default()
            .warm_up_time(Duration::from_secs(1))
            .measurement_time(Duration::from_secs(2))
            .sample_size(30)
            .noise_threshold(0.03),
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn bench_dma_in_range(c: &mut Criterion) {
    let ring = harness_ring(RingGeometry::default(), 6).unwrap();
    let at = |seg, index| TrbRef::new(ring.segment_id(seg).unwrap(), index);

    // (label, span, target) covering the one-segment, multi-segment and wrapped shapes.
    let inputs = [
        ("one_segment", RangeDescriptor::new(at(2, 10), at(2, 200)), at(2, 100)),
        ("two_segments", RangeDescriptor::new(at(1, 200), at(2, 30)), at(2, 5)),
        ("wrapped", RangeDescriptor::new(at(5, 100), at(1, 50)), at(0, 128)),
        ("whole_ring_minus_one", RangeDescriptor::new(at(3, 101), at(3, 99)), at(1, 7)),
        ("miss", RangeDescriptor::new(at(0, 0), at(1, 0)), at(4, 4)),
    ];
    let evaluators: [&dyn RangeEvaluator; 3] = [&Linearized, &SegmentWalk, &CaseTable];

    let mut group = c.benchmark_group("dma_in_range");
    group.throughput(Throughput::Elements(1));
    for (label, range, target) in inputs {
        let dma = ring.trb_dma(target).unwrap();
        for eval in evaluators {
            group.bench_function(format!("{}/{label}", eval.name()), |b| {
                b.iter(|| eval.evaluate(&ring, black_box(&range), black_box(dma)))
            });
        }
    }
    group.finish();
}

#[cfg(not(target_arch = "wasm32"))]
criterion_group! {
    name = benches;
    config = criterion_config();
    targets = bench_dma_in_range
}
#[cfg(not(target_arch = "wasm32"))]
criterion_main!(benches);

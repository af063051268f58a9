//! Criterion benchmarks for frame reassembly throughput.
//!
//! Feeds two full-size RGBA frames (710x1080x4) through a reassembler in
//! chunks of various sizes, from small WebSocket-sized messages up to whole
//! frames.

use std::num::NonZeroUsize;

use criterion::{BenchmarkId, Criterion, Throughput, black_box};
use framerelay::{FrameGeometry, FrameReassembler};

const CHUNK_SIZES: [usize; 4] = [1_024, 16 * 1_024, 256 * 1_024, 3_067_200];

fn benchmark_push(c: &mut Criterion) {
    let geometry = match FrameGeometry::new(710, 1080, 4) {
        Ok(geometry) => geometry,
        Err(err) => panic!("benchmark geometry invalid: {err}"),
    };
    let stream = vec![0x5A_u8; geometry.frame_size().get() * 2];

    let mut group = c.benchmark_group("reassembly/push");
    group.throughput(Throughput::Bytes(stream.len() as u64));

    for chunk_size in CHUNK_SIZES {
        group.bench_function(BenchmarkId::from_parameter(chunk_size), |b| {
            let mut reassembler = FrameReassembler::new(geometry.frame_size());
            b.iter(|| {
                let mut frames = 0_usize;
                for chunk in stream.chunks(chunk_size) {
                    match reassembler.push_with(chunk, |frame| {
                        black_box(frame);
                    }) {
                        Ok(n) => frames += n,
                        Err(err) => panic!("reassembly failed: {err}"),
                    }
                }
                black_box(frames)
            });
        });
    }

    group.finish();
}

fn benchmark_reset(c: &mut Criterion) {
    let frame_size = NonZeroUsize::new(3_067_200).unwrap_or(NonZeroUsize::MIN);
    let half = vec![0_u8; frame_size.get() / 2];
    c.bench_function("reassembly/reset_half_frame", |b| {
        let mut reassembler = FrameReassembler::new(frame_size);
        b.iter(|| {
            if let Err(err) = reassembler.push(&half) {
                panic!("reassembly failed: {err}");
            }
            black_box(reassembler.reset())
        });
    });
}

/// Entrypoint for reassembly benchmarks.
fn main() {
    let mut criterion = Criterion::default().configure_from_args();
    benchmark_push(&mut criterion);
    benchmark_reset(&mut criterion);
    criterion.final_summary();
}

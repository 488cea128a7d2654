use criterion::{criterion_group, criterion_main, Criterion, black_box};
use boardlens::board::cozy::Position;
use boardlens::eval::{ControlMap, MobilityMap, Overlay, WeakSquares};

const MIDDLEGAME: &str = "r1bq1rk1/pp2bppp/2n1pn2/3p4/2PP4/2N1PN2/PP2BPPP/R2QKB1R w KQ - 0 8";

fn bench_overlay(c: &mut Criterion) {
    let start = Position::startpos();
    let mid = Position::from_fen(MIDDLEGAME).expect("valid fen");
    c.bench_function("control_startpos", |ben| {
        ben.iter(|| black_box(ControlMap::evaluate(black_box(&start))))
    });
    c.bench_function("weak_middlegame", |ben| {
        ben.iter(|| black_box(WeakSquares::evaluate(black_box(&mid))))
    });
    c.bench_function("mobility_middlegame", |ben| {
        ben.iter(|| black_box(MobilityMap::evaluate(black_box(&mid))))
    });
    c.bench_function("overlay_middlegame", |ben| {
        ben.iter(|| black_box(Overlay::compute(black_box(&mid))))
    });
}

criterion_group!(benches, bench_overlay);
criterion_main!(benches);

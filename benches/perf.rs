use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use fantasy_forecast::dataset::TrainingRecord;
use fantasy_forecast::predictor::train;

const POSITIONS: [&str; 4] = ["QB", "RB", "WR", "TE"];

fn synthetic_records(players: usize, seasons: usize) -> Vec<TrainingRecord> {
    let mut records = Vec::with_capacity(players * seasons);
    for p in 0..players {
        for s in 0..seasons {
            let season = 2024 - s as i32;
            records.push(TrainingRecord {
                player: format!("Player {p:03}"),
                position: POSITIONS[p % POSITIONS.len()].to_string(),
                age: Some(22.0 + (p % 12) as f64 - s as f64),
                season: Some(season),
                points: Some(80.0 + ((p * 37 + s * 11) % 240) as f64),
            });
        }
    }
    records
}

fn bench_train(c: &mut Criterion) {
    let records = synthetic_records(60, 10);
    c.bench_function("train_600_rows", |b| {
        b.iter(|| {
            let model = train(black_box(&records)).expect("synthetic rows train");
            black_box(model.summary().rows_used);
        })
    });
}

fn bench_predict(c: &mut Criterion) {
    let records = synthetic_records(60, 10);
    let model = train(&records).expect("synthetic rows train");
    c.bench_function("predict_one", |b| {
        b.iter(|| {
            let points = model
                .predict(black_box("Player 010"), 26.0, "WR")
                .expect("known player");
            black_box(points);
        })
    });
}

criterion_group!(benches, bench_train, bench_predict);
criterion_main!(benches);

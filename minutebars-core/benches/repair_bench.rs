//! Criterion benchmarks for the per-day hot path.
//!
//! Benchmarks:
//! 1. Series repair at several gap densities
//! 2. Projection of a full repaired day onto the publish window

use chrono::{DateTime, Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use minutebars_core::{project, repair_series, MinuteBar, SessionWindow};

// ── Helpers ──────────────────────────────────────────────────────────

fn fetch_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 5, 13, 0, 0).unwrap()
}

fn fetch_window() -> SessionWindow {
    SessionWindow::new(fetch_start(), fetch_start() + Duration::minutes(480))
}

/// A day of bars keeping one minute out of every `stride`.
fn sparse_day(stride: usize) -> Vec<MinuteBar> {
    (0..481)
        .step_by(stride)
        .map(|i| {
            let close = 100.0 + (i as f64 * 0.1).sin() * 10.0;
            MinuteBar {
                timestamp: fetch_start() + Duration::minutes(i as i64),
                open: close - 0.3,
                high: close + 0.5,
                low: close - 0.5,
                close,
                volume: 1_000 + i as u64,
                trade_count: Some(10),
                vwap: Some(close),
            }
        })
        .collect()
}

// ── 1. Repair ────────────────────────────────────────────────────────

fn bench_repair(c: &mut Criterion) {
    let mut group = c.benchmark_group("repair_series");
    let window = fetch_window();

    for &stride in &[1usize, 2, 10, 60] {
        let raw = sparse_day(stride);
        group.bench_with_input(BenchmarkId::new("stride", stride), &raw, |b, raw| {
            b.iter(|| repair_series(black_box(raw), black_box(&window)))
        });
    }

    group.finish();
}

// ── 2. Projection ────────────────────────────────────────────────────

fn bench_project(c: &mut Criterion) {
    let window = fetch_window();
    let publish = SessionWindow::new(window.start + Duration::minutes(30), window.end);
    let repaired = match repair_series(&sparse_day(3), &window) {
        Ok(r) => r,
        Err(e) => panic!("benchmark fixture must repair cleanly: {e}"),
    };

    c.bench_function("project_full_day", |b| {
        b.iter(|| {
            project(
                black_box(&repaired.bars),
                black_box(&publish),
                chrono_tz::America::New_York,
            )
        })
    });
}

criterion_group!(benches, bench_repair, bench_project);
criterion_main!(benches);

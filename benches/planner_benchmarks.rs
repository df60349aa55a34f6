use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use fuelrs::catalog::builtin_catalog;
use fuelrs::models::{AthleteProfile, Intensity, RaceProfile, Sport, TemperatureBand};
use fuelrs::{compute_targets, generate_plan};

/// Performance benchmarks for the nutrition planner
///
/// Planning is a pure in-memory computation; these benchmarks track the
/// cost of a full planning call across race durations and catalog sizes.

fn bench_athlete() -> AthleteProfile {
    AthleteProfile::new(dec!(75))
}

fn bench_race(sport: Sport, hours: Decimal) -> RaceProfile {
    RaceProfile {
        sport,
        duration_hours: hours,
        temperature: TemperatureBand::Moderate,
        intensity: Intensity::Hard,
    }
}

fn bench_target_computation(c: &mut Criterion) {
    let athlete = bench_athlete();
    let race = bench_race(Sport::Triathlon, dec!(4));

    c.bench_function("compute_targets", |b| {
        b.iter(|| compute_targets(black_box(&race), black_box(&athlete), true))
    });
}

fn bench_plan_generation(c: &mut Criterion) {
    let athlete = bench_athlete();
    let products = builtin_catalog();

    let mut group = c.benchmark_group("Plan Generation");

    for &hours in &[1u32, 3, 6, 12] {
        let race = bench_race(Sport::Triathlon, Decimal::from(hours));

        group.throughput(Throughput::Elements(hours as u64));
        group.bench_with_input(
            BenchmarkId::new("generate_plan", hours),
            &race,
            |b, race| {
                b.iter(|| generate_plan(black_box(race), &athlete, &products, true));
            },
        );
    }

    group.finish();
}

fn bench_catalog_scaling(c: &mut Criterion) {
    let athlete = bench_athlete();
    let race = bench_race(Sport::Bike, dec!(4));

    let mut group = c.benchmark_group("Catalog Scaling");

    for &copies in &[1usize, 4, 16] {
        let mut products = Vec::new();
        for i in 0..copies {
            for mut product in builtin_catalog() {
                product.name = format!("{} #{}", product.name, i);
                products.push(product);
            }
        }

        group.throughput(Throughput::Elements(products.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("generate_plan", products.len()),
            &products,
            |b, products| {
                b.iter(|| generate_plan(black_box(&race), &athlete, products, false));
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_target_computation,
    bench_plan_generation,
    bench_catalog_scaling
);
criterion_main!(benches);

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use spotkick::resolve::{ProbabilityTable, ResolverConfig, WinProbabilityResolver};
use spotkick::shootout::{ScoreState, ShootoutState};
use spotkick::simulate::{run_simulation, SimulationConfig};

/// A complete table with observed values on every other kick, so both the
/// lookup and the recursive fallback get exercised.
fn half_observed_table() -> ProbabilityTable {
    ProbabilityTable::from_entries(
        ScoreState::reachable()
            .into_iter()
            .filter(|s| s.kicks_taken() > 0)
            .map(|s| {
                let p = if s.kicks_taken() % 2 == 0 { Some(0.5) } else { None };
                (s, p)
            }),
    )
}

fn bench_resolve_opening_kick(c: &mut Criterion) {
    let table = ProbabilityTable::empty();
    let resolver = WinProbabilityResolver::new(&table, ResolverConfig::default());
    let state = ScoreState::new(1, 1, 0).unwrap();
    c.bench_function("resolve_opening_kick_empty_table", |b| {
        b.iter(|| resolver.resolve(black_box(state)))
    });
}

fn bench_resolve_all_states(c: &mut Criterion) {
    let states: Vec<ScoreState> = ScoreState::reachable()
        .into_iter()
        .filter(|s| s.kicks_taken() > 0)
        .collect();

    let empty = ProbabilityTable::empty();
    let resolver = WinProbabilityResolver::new(&empty, ResolverConfig::default());
    c.bench_function("resolve_all_reachable_empty_table", |b| {
        b.iter(|| {
            for &s in &states {
                black_box(resolver.resolve(s));
            }
        })
    });

    let table = half_observed_table();
    let resolver = WinProbabilityResolver::new(&table, ResolverConfig::default());
    c.bench_function("resolve_all_reachable_half_observed", |b| {
        b.iter(|| {
            for &s in &states {
                black_box(resolver.resolve(s));
            }
        })
    });
}

fn bench_full_shootout(c: &mut Criterion) {
    let table = ProbabilityTable::empty();
    let resolver = WinProbabilityResolver::new(&table, ResolverConfig::default());
    let kicks = [true, true, true, false, true, true, false, true, true, true];
    c.bench_function("ten_kick_shootout", |b| {
        b.iter(|| {
            let mut state = ShootoutState::new();
            for &k in &kicks {
                state.kick(black_box(k), &resolver);
            }
            state
        })
    });
}

fn bench_simulation_batch(c: &mut Criterion) {
    let table = ProbabilityTable::empty();
    let config = SimulationConfig {
        num_shootouts: 1000,
        threads: 1,
        seed: 42,
        quiet: true,
        ..SimulationConfig::default()
    };
    let mut group = c.benchmark_group("simulation");
    group.sample_size(20);
    group.bench_function("1000_shootouts_sequential", |b| {
        b.iter(|| run_simulation(black_box(&table), &config))
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_resolve_opening_kick,
    bench_resolve_all_states,
    bench_full_shootout,
    bench_simulation_batch
);
criterion_main!(benches);

//! Random shootout generation.
//!
//! Plays many shootouts with a fixed per-kick success rate, recording the
//! win-probability trace of each one. Every shootout owns its own state; all
//! of them read the same table.

use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::resolve::{ProbabilityTable, ResolverConfig, WinProbabilityResolver};
use crate::shootout::{KickRecord, PerTeam, ShootoutState, Status, Team};

/// Configuration for a batch of random shootouts.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// Number of shootouts to play.
    pub num_shootouts: usize,
    /// Chance that each simulated kick is scored.
    pub kick_success_rate: f64,
    /// Calibration used for the win probabilities.
    pub resolver: ResolverConfig,
    /// Number of parallel threads.
    pub threads: usize,
    /// Random seed (0 = use entropy).
    pub seed: u64,
    /// Suppress per-shootout progress logging.
    pub quiet: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        let resolver = ResolverConfig::default();
        SimulationConfig {
            num_shootouts: 100,
            kick_success_rate: resolver.make_probability,
            resolver,
            threads: 4,
            seed: 0,
            quiet: false,
        }
    }
}

/// A complete simulated shootout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShootoutRecord {
    /// Sequential shootout ID.
    pub shootout_id: usize,
    /// The winner; `None` for a level score after ten kicks.
    pub winner: Option<Team>,
    pub status: Status,
    pub kicks_taken: u8,
    pub final_scores: PerTeam<u8>,
    /// Every kick with the probabilities after it.
    pub kicks: Vec<KickRecord>,
}

/// Win counts over a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SimulationSummary {
    pub shootouts: usize,
    pub wins: PerTeam<usize>,
    pub regulation_ties: usize,
}

fn seeded_rng(seed: u64, index: usize) -> SmallRng {
    if seed != 0 {
        SmallRng::seed_from_u64(seed.wrapping_add(index as u64))
    } else {
        SmallRng::from_entropy()
    }
}

/// Plays one shootout to the end with random kicks.
pub fn play_shootout<R: Rng>(
    resolver: &WinProbabilityResolver<'_>,
    shootout_id: usize,
    kick_success_rate: f64,
    rng: &mut R,
) -> ShootoutRecord {
    let mut state = ShootoutState::new();
    while !state.is_over() {
        let success = rng.gen_bool(kick_success_rate.clamp(0.0, 1.0));
        state.kick(success, resolver);
    }
    ShootoutRecord {
        shootout_id,
        winner: state.winner(),
        status: state.status(),
        kicks_taken: state.kicks_taken(),
        final_scores: state.score_state().scores(),
        kicks: state.history().to_vec(),
    }
}

/// Runs a batch, returning records ordered by shootout ID.
pub fn run_simulation(
    table: &ProbabilityTable,
    config: &SimulationConfig,
) -> Result<Vec<ShootoutRecord>, rayon::ThreadPoolBuildError> {
    let mut records = Vec::with_capacity(config.num_shootouts);
    run_simulation_with_callback(table, config, |record| records.push(record))?;
    records.sort_by_key(|r| r.shootout_id);
    Ok(records)
}

/// Runs a batch, calling `on_record` with each finished shootout as it
/// completes. Parallel runs deliver records out of order.
pub fn run_simulation_with_callback<F>(
    table: &ProbabilityTable,
    config: &SimulationConfig,
    on_record: F,
) -> Result<(), rayon::ThreadPoolBuildError>
where
    F: FnMut(ShootoutRecord) + Send,
{
    let resolver = WinProbabilityResolver::new(table, config.resolver);
    if config.threads > 1 {
        run_parallel(&resolver, config, on_record)
    } else {
        run_sequential(&resolver, config, on_record);
        Ok(())
    }
}

fn log_record(record: &ShootoutRecord, done: usize, total: usize) {
    let outcome = match record.winner {
        Some(w) => format!("{} wins", w),
        None => "level after regulation".to_string(),
    };
    log::info!(
        "shootout {}/{}: {} {}-{} after {} kicks",
        done,
        total,
        outcome,
        record.final_scores.team_1,
        record.final_scores.team_2,
        record.kicks_taken,
    );
}

fn run_sequential<F>(resolver: &WinProbabilityResolver<'_>, config: &SimulationConfig, mut on_record: F)
where
    F: FnMut(ShootoutRecord),
{
    for i in 0..config.num_shootouts {
        let mut rng = seeded_rng(config.seed, i);
        let record = play_shootout(resolver, i, config.kick_success_rate, &mut rng);
        if !config.quiet {
            log_record(&record, i + 1, config.num_shootouts);
        }
        on_record(record);
    }
}

/// Plays shootouts on a rayon pool and hands them to the callback on the
/// calling thread through a channel.
fn run_parallel<F>(
    resolver: &WinProbabilityResolver<'_>,
    config: &SimulationConfig,
    mut on_record: F,
) -> Result<(), rayon::ThreadPoolBuildError>
where
    F: FnMut(ShootoutRecord) + Send,
{
    use rayon::prelude::*;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.threads)
        .build()?;
    let completed = AtomicUsize::new(0);
    let (tx, rx) = mpsc::channel::<ShootoutRecord>();

    std::thread::scope(|scope| {
        scope.spawn(|| {
            pool.install(|| {
                (0..config.num_shootouts)
                    .into_par_iter()
                    .for_each_with(tx, |tx, i| {
                        let mut rng = seeded_rng(config.seed, i);
                        let record = play_shootout(resolver, i, config.kick_success_rate, &mut rng);
                        if !config.quiet {
                            let n = completed.fetch_add(1, Ordering::Relaxed) + 1;
                            log_record(&record, n, config.num_shootouts);
                        }
                        let _ = tx.send(record);
                    });
            });
        });

        for record in rx {
            on_record(record);
        }
    });
    Ok(())
}

/// Counts wins and regulation ties over a batch.
pub fn summarize(records: &[ShootoutRecord]) -> SimulationSummary {
    let mut summary = SimulationSummary {
        shootouts: records.len(),
        ..SimulationSummary::default()
    };
    for record in records {
        match record.winner {
            Some(team) => summary.wins[team] += 1,
            None => summary.regulation_ties += 1,
        }
    }
    summary
}

/// Writes records as JSONL (one JSON object per shootout, one per line).
pub fn write_jsonl<W: Write>(records: &[ShootoutRecord], out: &mut W) -> std::io::Result<()> {
    for record in records {
        write_record_json(record, out)?;
    }
    out.flush()
}

/// Writes a single record as one JSON line.
pub fn write_record_json<W: Write>(record: &ShootoutRecord, out: &mut W) -> std::io::Result<()> {
    serde_json::to_writer(&mut *out, record)?;
    writeln!(out)
}

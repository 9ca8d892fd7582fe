use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;
use std::path::PathBuf;

use tilemerge::config::Config;
use tilemerge::engine::{Direction, Score};
use tilemerge::game::{Game, GameMode, GameOver};
use tilemerge::leaderboard::Leaderboard;

#[derive(Debug, Parser)]
#[command(name = "autoplay", about = "Play many random-policy games in parallel and record the scores")]
struct Args {
    /// Number of games to play
    #[arg(long, default_value_t = 100)]
    games: u64,

    /// Base seed; game i uses seed + i
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Stop a game after this many commands even if it is not over
    #[arg(long, default_value_t = 100_000)]
    max_steps: u64,

    /// TOML config file; defaults are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Game mode override
    #[arg(long)]
    mode: Option<GameMode>,

    /// Leaderboard file to use instead of searching the configured root
    #[arg(long)]
    leaderboard: Option<PathBuf>,

    /// Do not submit scores to the leaderboard
    #[arg(long)]
    dry_run: bool,

    /// Suppress the progress bar
    #[arg(long)]
    quiet: bool,
}

#[derive(Debug, Clone, Copy)]
struct Outcome {
    score: Score,
    moves: u32,
    over: Option<GameOver>,
}

fn play_one(cfg: &Config, seed: u64, max_steps: u64) -> anyhow::Result<Outcome> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut game = Game::new(cfg.board.size, cfg.game.mode, cfg.limits(), &mut rng)?;
    for _ in 0..max_steps {
        let Some(&direction) = Direction::ALL.choose(&mut rng) else { break };
        if game.step(direction, &mut rng).over.is_some() {
            break;
        }
    }
    Ok(Outcome { score: game.final_score(), moves: game.board().moves(), over: game.over() })
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let mut cfg = match &args.config {
        Some(path) => Config::from_toml(path).with_context(|| format!("loading {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(mode) = args.mode {
        cfg.game.mode = mode;
    }
    cfg.validate()?;

    let pb = if args.quiet { ProgressBar::hidden() } else { ProgressBar::new(args.games) };
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} games ({eta})")?
            .progress_chars("=>-"),
    );

    let outcomes: Vec<Outcome> = (0..args.games)
        .into_par_iter()
        .map(|i| {
            let r = play_one(&cfg, args.seed.wrapping_add(i), args.max_steps);
            pb.inc(1);
            r
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    pb.finish_and_clear();

    if outcomes.is_empty() {
        eprintln!("No games played");
        return Ok(());
    }

    let n = outcomes.len() as f64;
    let mean_score = outcomes.iter().map(|o| o.score as f64).sum::<f64>() / n;
    let mean_moves = outcomes.iter().map(|o| o.moves as f64).sum::<f64>() / n;
    let max_score = outcomes.iter().map(|o| o.score).max().unwrap_or(0);
    let max_moves = outcomes.iter().map(|o| o.moves).max().unwrap_or(0);
    let unfinished = outcomes.iter().filter(|o| o.over.is_none()).count();
    eprintln!(
        "Games: {} | score mean {:.1} max {} | moves mean {:.1} max {} | unfinished {}",
        outcomes.len(),
        mean_score,
        max_score,
        mean_moves,
        max_moves,
        unfinished
    );

    if args.dry_run {
        return Ok(());
    }

    let mut leaderboard = match &args.leaderboard {
        Some(path) => Leaderboard::open(path, cfg.leaderboard_options()),
        None => Leaderboard::discover(
            &cfg.leaderboard.search_root,
            &cfg.leaderboard.file_name,
            cfg.leaderboard_options(),
        ),
    }
    .context("opening leaderboard")?;

    // One writer: submit from this thread after the parallel phase.
    let mut kept = 0usize;
    for outcome in outcomes.iter().filter(|o| o.over.is_some()) {
        if leaderboard.submit_score(outcome.score)? {
            kept += 1;
        }
    }
    info!("{kept} scores entered the leaderboard");
    println!("{leaderboard}");
    Ok(())
}

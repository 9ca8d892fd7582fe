use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use tilemerge::config::Config;
use tilemerge::engine::Direction;
use tilemerge::game::{Game, GameMode};
use tilemerge::leaderboard::Leaderboard;

#[derive(Debug, Parser)]
#[command(name = "tilemerge", about = "Play the tile-merging game in the terminal")]
struct Args {
    /// TOML config file; defaults are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Game mode: traditional, time_trial or move_limit
    #[arg(long)]
    mode: Option<GameMode>,

    /// Board side length
    #[arg(long)]
    size: Option<usize>,

    /// Seed for reproducible spawns
    #[arg(long)]
    seed: Option<u64>,

    /// Leaderboard file to use instead of searching the configured root
    #[arg(long)]
    leaderboard: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut cfg = match &args.config {
        Some(path) => Config::from_toml(path).with_context(|| format!("loading {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(size) = args.size {
        cfg.board.size = size;
    }
    if let Some(mode) = args.mode {
        cfg.game.mode = mode;
    }
    cfg.validate()?;

    let mut leaderboard = match &args.leaderboard {
        Some(path) => Leaderboard::open(path, cfg.leaderboard_options()),
        None => Leaderboard::discover(
            &cfg.leaderboard.search_root,
            &cfg.leaderboard.file_name,
            cfg.leaderboard_options(),
        ),
    }
    .context("opening leaderboard")?;

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut game = Game::new(cfg.board.size, cfg.game.mode, cfg.limits(), &mut rng)?;

    println!("{}: {}", game.mode(), game.mode().description());
    println!("Commands: w/a/s/d or Up/Down/Left/Right to move, r to restart, q to quit.");
    print_status(&game);

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line.context("reading stdin")?;
        let key = line.trim();
        match key {
            "" => continue,
            "q" | "Q" => break,
            "r" | "R" => {
                game.reset(&mut rng);
                print_status(&game);
                continue;
            }
            _ => {}
        }
        let Some(direction) = Direction::from_key(key) else {
            println!("unknown command {key:?}");
            continue;
        };

        let step = game.step(direction, &mut rng);
        print_status(&game);
        if let Some(reason) = step.over {
            println!("{reason}. Final score: {}", game.final_score());
            if let Some(kept) = game.finish_into(&mut leaderboard)? {
                if kept {
                    println!("New leaderboard entry!");
                }
            }
            println!("{leaderboard}");
            println!("Press r to play again or q to quit.");
        }
    }
    Ok(())
}

fn print_status(game: &Game) {
    print!("{}", game.board());
    let mut status = format!("Score: {} | Best: {} | Moves: {}", game.score(), game.best(), game.board().moves());
    if let Some(left) = game.remaining_moves() {
        status.push_str(&format!(" | Moves left: {left}"));
    }
    if let Some(left) = game.time_left() {
        status.push_str(&format!(" | Time left: {}s", left.as_secs()));
    }
    println!("{status}");
    let _ = io::stdout().flush();
}

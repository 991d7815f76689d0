//! Tictac-Minimax: play tic-tac-toe against an unbeatable engine.
//!
//! ## Usage
//!
//! - `tictac-minimax` - Play as X against the engine
//! - `tictac-minimax play --human o` - Play as O
//! - `tictac-minimax selfplay --games 10` - Engine against itself
//! - `tictac-minimax bench --games 200` - Engine against a random player
//! - `tictac-minimax hint "XX. .O. ..."` - Score every move in a position

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use tictac_minimax::arbiter::{Arbiter, Outcome};
use tictac_minimax::board::{Mark, numbering_guide};
use tictac_minimax::minimax::{Engine, EngineConfig, OpeningPolicy};
use tictac_minimax::player::{Automated, Interactive, MoveSource, RandomPlayer};
use tictac_minimax::state::GameState;

/// Tictac-Minimax: an unbeatable tic-tac-toe engine
#[derive(Parser)]
#[command(name = "tictac-minimax")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    engine: EngineArgs,

    /// Log search decisions to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(clap::Args, Clone, Copy)]
struct EngineArgs {
    /// Seed for the engine's random opening move
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Search the opening move instead of picking it at random
    #[arg(long, global = true)]
    full_search: bool,

    /// Evaluate root moves in parallel
    #[arg(long, global = true)]
    parallel: bool,
}

impl EngineArgs {
    fn config(self) -> EngineConfig {
        let opening = if self.full_search {
            OpeningPolicy::FullSearch
        } else {
            OpeningPolicy::Random
        };
        let config = EngineConfig::default()
            .with_opening(opening)
            .with_parallel(self.parallel);
        match self.seed {
            Some(seed) => config.with_seed(seed),
            None => config,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Human {
    X,
    O,
    None,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a game at the terminal
    Play {
        /// Which mark the human plays
        #[arg(long, value_enum, default_value = "x")]
        human: Human,
    },
    /// Let the engine play itself
    Selfplay {
        #[arg(long, default_value_t = 1)]
        games: usize,
    },
    /// Play the engine against a random player, alternating sides
    Bench {
        #[arg(long, default_value_t = 100)]
        games: usize,
    },
    /// Score every legal move in a position, e.g. "XX. .O. ..."
    Hint { board: String },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = cli.engine.config();
    match cli.command {
        Some(Commands::Play { human }) => run_play(human, config),
        Some(Commands::Selfplay { games }) => run_selfplay(games, config),
        Some(Commands::Bench { games }) => run_bench(games, config),
        Some(Commands::Hint { board }) => run_hint(&board, config),
        None => run_play(Human::X, config),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn source_for(mark: Mark, human: Human, config: EngineConfig) -> Box<dyn MoveSource> {
    let is_human = matches!((human, mark), (Human::X, Mark::X) | (Human::O, Mark::O));
    if is_human {
        Box::new(Interactive::stdio())
    } else {
        Box::new(Automated::new(config))
    }
}

fn run_play(human: Human, config: EngineConfig) -> Result<()> {
    println!("Welcome to Tic-Tac-Toe!");
    if human != Human::None {
        println!("You'll be playing against an unbeatable AI.");
    }
    println!("Here are the positions on the board:");
    print!("{}", numbering_guide());
    println!();

    let mut x = source_for(Mark::X, human, config);
    let mut o = source_for(Mark::O, human, config);
    let mut arbiter = Arbiter::new().with_observer(|state, mark, cell| {
        println!("{mark} makes a move to square {cell}");
        println!("{state}");
    });
    let record = arbiter
        .play(x.as_mut(), o.as_mut())
        .context("game aborted")?;
    println!("{}", record.outcome);
    Ok(())
}

fn run_selfplay(games: usize, config: EngineConfig) -> Result<()> {
    let mut tally = Tally::default();
    for game in 0..games {
        let mut x = Automated::new(config);
        let mut o = Automated::new(config);
        let record = Arbiter::new()
            .play(&mut x, &mut o)
            .with_context(|| format!("self-play game {game} failed"))?;
        let moves: Vec<String> = record.moves.iter().map(|(_, c)| c.to_string()).collect();
        println!("game {game}: {} [{}]", record.outcome, moves.join(" "));
        tally.record(record.outcome, Mark::X);
    }
    println!("X: {} wins, {} draws, {} losses", tally.wins, tally.draws, tally.losses);
    Ok(())
}

fn run_bench(games: usize, config: EngineConfig) -> Result<()> {
    let mut rng = match config.seed {
        Some(seed) => fastrand::Rng::with_seed(seed),
        None => fastrand::Rng::new(),
    };
    let mut tally = Tally::default();
    for game in 0..games {
        let engine_mark = if game % 2 == 0 { Mark::X } else { Mark::O };
        let mut engine = Automated::new(config);
        let mut random = RandomPlayer::new(rng.fork());
        let (x, o): (&mut dyn MoveSource, &mut dyn MoveSource) = match engine_mark {
            Mark::X => (&mut engine, &mut random),
            Mark::O => (&mut random, &mut engine),
        };
        let record = Arbiter::new()
            .play(x, o)
            .with_context(|| format!("bench game {game} failed"))?;
        tally.record(record.outcome, engine_mark);
    }
    println!(
        "engine vs random over {games} games: {} wins, {} draws, {} losses",
        tally.wins, tally.draws, tally.losses
    );
    if tally.losses > 0 {
        bail!("engine lost {} games", tally.losses);
    }
    Ok(())
}

fn run_hint(board: &str, config: EngineConfig) -> Result<()> {
    let mut state = GameState::from_cells(board)?;
    if state.is_terminal() {
        bail!("position is already over");
    }
    let mark = state.to_move();
    let mut engine = Engine::new(config.with_opening(OpeningPolicy::FullSearch));

    print!("{state}");
    println!("{mark} to move");
    for result in engine.score_moves(&mut state, mark)? {
        if let Some(cell) = result.cell {
            println!("  {cell}: {:+}", result.score);
        }
    }
    let best = engine.choose_move(&mut state, mark)?;
    println!("best: {best} ({} nodes)", engine.nodes_visited());
    Ok(())
}

#[derive(Default)]
struct Tally {
    wins: usize,
    draws: usize,
    losses: usize,
}

impl Tally {
    fn record(&mut self, outcome: Outcome, perspective: Mark) {
        match outcome.winner() {
            Some(mark) if mark == perspective => self.wins += 1,
            Some(_) => self.losses += 1,
            None => self.draws += 1,
        }
    }
}

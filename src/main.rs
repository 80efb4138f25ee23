use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};

use ai_threes::agent::{Action, Agent};
use ai_threes::config::{AgentConfig, Role};
use ai_threes::engine::{self as GameEngine, Board};
use ai_threes::stats::{block_report, write_summary_to_path, EpisodeStat, TrainingSummary};

#[derive(Debug, Parser)]
#[command(name = "ai-threes", about = "Self-play TD(0) trainer for a Threes!-like puzzle")]
struct Args {
    /// Number of self-play episodes
    #[arg(long, default_value_t = 1000)]
    total: u32,

    /// Episodes per statistics block
    #[arg(long, default_value_t = 100)]
    block: u32,

    /// Slider options, e.g. "alpha=0.0025 load=weights.bin save=weights.bin"
    #[arg(long, default_value = "")]
    play: String,

    /// Placer options, e.g. "seed=42"
    #[arg(long, default_value = "")]
    evil: String,

    /// Write a postcard training summary to this path after the run
    #[arg(long)]
    summary: Option<PathBuf>,

    /// Suppress progress and statistics output
    #[arg(long)]
    quiet: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    GameEngine::new();

    let play_cfg = AgentConfig::parse(Role::Slider, &args.play).context("invalid --play options")?;
    let evil_cfg = AgentConfig::parse(Role::Placer, &args.evil).context("invalid --evil options")?;
    let alpha = play_cfg.alpha;
    let mut slider = Agent::from_config(play_cfg).context("failed to construct slider")?;
    let mut placer = Agent::from_config(evil_cfg).context("failed to construct placer")?;

    let pb = if args.quiet {
        None
    } else {
        let style = ProgressStyle::with_template("{bar:40} {pos}/{len} | {msg}")?;
        Some(ProgressBar::new(args.total as u64).with_style(style))
    };

    let mut stats: Vec<EpisodeStat> = Vec::with_capacity(args.total as usize);
    for episode in 1..=args.total {
        slider.open_episode();
        placer.open_episode();
        let stat = run_episode(&mut slider, &mut placer);
        slider.close_episode();
        placer.close_episode();
        stats.push(stat);

        if let Some(pb) = &pb {
            pb.inc(1);
            if args.block > 0 && episode % args.block == 0 {
                let block = &stats[(episode - args.block) as usize..];
                pb.println(block_report(episode, block));
                pb.set_message(format!("score {}", stat.score));
            }
        }
    }
    if let Some(pb) = &pb {
        pb.finish_and_clear();
    }

    slider.finish().context("failed to save weights")?;

    if let Some(path) = &args.summary {
        let summary = TrainingSummary { alpha, episodes: args.total, stats: stats.clone() };
        write_summary_to_path(path, &summary)
            .with_context(|| format!("failed to write summary to {}", path.display()))?;
    }

    if !args.quiet {
        let best = stats.iter().map(|s| s.score).max().unwrap_or(0);
        println!("episodes: {} | best score: {}", stats.len(), best);
    }
    Ok(())
}

/// Play one episode: nine opening placements, then alternate slide and
/// placement until the slider gives up or a placement fails.
fn run_episode(slider: &mut Agent, placer: &mut Agent) -> EpisodeStat {
    let mut board = Board::new();
    for _ in 0..9 {
        let Some(Action::Place { pos, tile, hint }) = placer.take_action(&board) else { break };
        if board.place(pos, tile, hint) == -1 {
            break;
        }
    }

    let mut moves = 0u32;
    loop {
        let Some(Action::Slide(dir)) = slider.take_action(&board) else { break };
        if board.slide(dir) == -1 {
            break;
        }
        moves += 1;
        let Some(Action::Place { pos, tile, hint }) = placer.take_action(&board) else { break };
        if board.place(pos, tile, hint) == -1 {
            break;
        }
    }
    EpisodeStat { score: board.score(), moves, max_rank: board.max_rank() }
}

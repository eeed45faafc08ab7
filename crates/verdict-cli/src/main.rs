use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use verdict_core::RankTable;
use verdict_source::{
    CaseSampler, DEFAULT_REGION, DataSource, GameSession, SourceConfig, load_charge_catalog, source_for,
};
use verdict_store::{JsonFileStore, Persistence, PlayHistory};

mod display;
mod play;

/// Namespace of every key this game writes to the state file.
const NAMESPACE: &str = "verdict";

#[derive(Parser)]
#[command(name = "verdict", version, about = "Judge real criminal cases and climb the judicial ranks")]
struct Cli {
    /// Data root: a local directory or an http(s) base URL
    #[arg(long, env = "VERDICT_DATA", default_value = ".")]
    data: String,

    /// JSON file holding player progress
    #[arg(long, env = "VERDICT_STATE", default_value = "verdict-state.json")]
    state: PathBuf,

    /// JSON rank table replacing the built-in ladder
    #[arg(long, env = "VERDICT_RANKS")]
    ranks: Option<PathBuf>,

    /// Seed for reproducible case draws
    #[arg(long)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Judge cases interactively
    Play {
        #[arg(long, default_value = DEFAULT_REGION)]
        region: String,
    },
    /// Draw one case and print its dossier
    Draw {
        #[arg(long, default_value = DEFAULT_REGION)]
        region: String,
    },
    /// Show rank, progress, and statistics
    Status,
    /// Show recent judgments, newest first
    History {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Forget all progress
    Reset,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();
    tracing::info!("verdict v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    let history = open_history(&cli.state)?;
    let ranks = load_ranks(cli.ranks.as_deref())?;

    match cli.command {
        Command::Play { region } => {
            let mut session = new_session(&cli.data, cli.seed, history, ranks).await;
            play::run(&mut session, &region).await?;
        }
        Command::Draw { region } => {
            let sampler = new_sampler(source_for(&cli.data), cli.seed, history);
            let case = sampler.sample_case(&region).await?;
            display::print_dossier(&case);
        }
        Command::Status => {
            let total = history.total_score();
            display::print_status(&ranks.tier_for(total), total, &history.statistics());
        }
        Command::History { limit } => {
            let records: Vec<_> = history.history().into_iter().rev().take(limit).collect();
            display::print_history(&records);
        }
        Command::Reset => {
            history.reset();
            println!("Progress cleared.");
        }
    }
    Ok(())
}

fn open_history(state: &Path) -> anyhow::Result<PlayHistory> {
    let store = JsonFileStore::open(state)
        .with_context(|| format!("opening state file {}", state.display()))?;
    Ok(PlayHistory::new(Persistence::new(Arc::new(store), NAMESPACE)))
}

fn load_ranks(path: Option<&Path>) -> anyhow::Result<RankTable> {
    let Some(path) = path else {
        return Ok(RankTable::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading rank table {}", path.display()))?;
    RankTable::from_json(&text).with_context(|| format!("loading rank table {}", path.display()))
}

fn new_sampler(
    source: Arc<dyn DataSource>,
    seed: Option<u64>,
    history: PlayHistory,
) -> CaseSampler {
    let sampler = CaseSampler::new(source, SourceConfig::default(), history);
    match seed {
        Some(seed) => sampler.with_seed(seed),
        None => sampler,
    }
}

async fn new_session(
    data: &str,
    seed: Option<u64>,
    history: PlayHistory,
    ranks: RankTable,
) -> GameSession {
    let source = source_for(data);
    let config = SourceConfig::default();
    let charges = load_charge_catalog(source.as_ref(), &config.charges_path).await;
    let sampler = new_sampler(source, seed, history);
    GameSession::new(Arc::new(sampler), ranks).with_charges(charges)
}

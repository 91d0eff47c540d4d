//! Command-line front end: binds flags to one `PathGroup::explore` run and
//! reports the concretized witness or failure.

use std::collections::VecDeque;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};

use whitesymex::error::EngineError;
use whitesymex::parser::parse;
use whitesymex::path_group::{ExploreConfig, PathGroup, Strategy};
use whitesymex::state::create_entry_state;
use whitesymex::value::Value;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StrategyArg {
    Bfs,
    Dfs,
    Random,
}

impl From<StrategyArg> for Strategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Bfs => Strategy::Bfs,
            StrategyArg::Dfs => Strategy::Dfs,
            StrategyArg::Random => Strategy::Random,
        }
    }
}

/// Symbolic execution engine for the Whitespace programming language.
#[derive(Parser)]
#[command(name = "whitesymex", version, about, long_about = None)]
struct Cli {
    /// Whitespace program to explore.
    file: PathBuf,

    /// Goal substring to search for on stdout; accepts a plain string or
    /// `\xHH`-escaped bytes.
    #[arg(long)]
    find: Option<String>,

    /// Forbidden substring; a path whose stdout could produce it is pruned.
    #[arg(long)]
    avoid: Option<String>,

    /// Order in which live states are explored.
    #[arg(long, value_enum, default_value = "bfs")]
    strategy: StrategyArg,

    /// Bound on how many times a backward jump may repeat before a state is
    /// deadended.
    #[arg(long, default_value_t = whitesymex::consts::DEFAULT_LOOP_LIMIT)]
    loop_limit: u64,

    /// Overall interpreter step budget across every state in the run.
    #[arg(long)]
    max_steps: Option<u64>,

    /// RNG seed for `--strategy random`.
    #[arg(long)]
    seed: Option<u64>,

    /// Number of leading stdin bytes to treat as symbolic.
    #[arg(long, default_value_t = 0)]
    stdin_len: usize,
}

fn parse_pattern(raw: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' && chars.peek() == Some(&'x') {
            chars.next();
            let hi = chars.next();
            let lo = chars.next();
            if let (Some(hi), Some(lo)) = (hi, lo) {
                if let Ok(byte) = u8::from_str_radix(&format!("{hi}{lo}"), 16) {
                    bytes.push(byte);
                    continue;
                }
            }
        }
        let mut buf = [0u8; 4];
        bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
    }
    bytes
}

fn run(cli: &Cli) -> Result<bool, EngineError> {
    let source = fs::read(&cli.file)?;
    let program = parse(&source)?;

    let ctx = whitesymex::solver::new_context();
    let stdin: VecDeque<Value<'_>> = (0..cli.stdin_len)
        .map(|i| Value::fresh_symbolic_byte(&ctx, &format!("stdin[{i}]")))
        .collect();
    let entry = create_entry_state(&ctx, stdin);

    let config = ExploreConfig {
        find: cli.find.as_deref().map(parse_pattern).unwrap_or_default(),
        avoid: cli.avoid.as_deref().map(parse_pattern).unwrap_or_default(),
        strategy: cli.strategy.into(),
        loop_limit: cli.loop_limit,
        max_steps: cli.max_steps,
        seed: cli.seed,
    };

    let mut group = PathGroup::new(program, entry, &config);

    tracing::info!(file = %cli.file.display(), strategy = ?cli.strategy, "starting exploration");
    group.explore(&config);
    tracing::info!(
        steps = group.steps_taken(),
        found = group.found().len(),
        active = group.active().len(),
        errored = group.errored().len(),
        "exploration finished"
    );

    match group.found().first() {
        Some(state) => {
            let witness = state.concretize_stdin().unwrap_or_default();
            println!("{}", String::from_utf8_lossy(&witness));
            Ok(true)
        }
        None => Ok(false),
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match run(&cli) {
        Ok(true) => ExitCode::from(0),
        Ok(false) => {
            eprintln!("no solution found");
            ExitCode::from(1)
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(2)
        }
    }
}

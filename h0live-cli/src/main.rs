mod config;
mod output;

use clap::Parser;
use h0live_core::{run_analysis, AnalysisOptions, LikelihoodTable, Prior, ZeroPolicy};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use crate::config::H0liveConfig;

pub fn bail(msg: impl std::fmt::Display) -> ! {
    eprintln!("Error: {msg}");
    std::process::exit(1);
}

#[derive(Parser)]
#[command(
    name = "h0live",
    version,
    about = "Combine gravitational-wave H0 likelihoods into a posterior with a credible interval"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log pipeline steps to stderr (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// List the events and counterparts available in a likelihood table
    Events(EventsArgs),
    /// Combine the selected events and report the H0 estimate
    Run(RunArgs),
    /// Create a default config file at ~/.config/h0live/config.toml
    Init,
}

#[derive(Parser)]
struct EventsArgs {
    /// Likelihood table CSV (H0 column plus one <Event>_<Counterpart> column each)
    #[arg(long)]
    table: Option<PathBuf>,

    /// Output JSON instead of a table
    #[arg(long)]
    json: bool,

    /// Path to config file (default: ~/.config/h0live/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Parser)]
struct RunArgs {
    /// Likelihood table CSV (H0 column plus one <Event>_<Counterpart> column each)
    #[arg(long)]
    table: Option<PathBuf>,

    /// Column id or bare event name to combine (repeatable).
    /// A bare event name uses its first counterpart. Default: first column.
    #[arg(long = "select")]
    select: Vec<String>,

    /// Prior on H0: "uniform" or "log"
    #[arg(long)]
    prior: Option<String>,

    /// Credible level for the highest-density interval. Default: 0.9.
    #[arg(long)]
    level: Option<f64>,

    /// Report the Planck reference band
    #[arg(long)]
    planck: bool,

    /// Report the SH0ES reference band
    #[arg(long)]
    shoes: bool,

    /// Include each selected event's own normalized likelihood
    #[arg(long)]
    individual: bool,

    /// Raise zero likelihood values to a tiny floor instead of failing
    #[arg(long)]
    clamp_zeros: bool,

    /// Output JSON instead of text
    #[arg(long)]
    json: bool,

    /// Write the sampled curves (H0, posterior, prior, individual) to this CSV file
    #[arg(long)]
    curve_out: Option<PathBuf>,

    /// Path to config file (default: ~/.config/h0live/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Events(args) => run_events(args),
        Commands::Run(args) => run_h0(args),
        Commands::Init => {
            let path = config::config_path();
            config::create_default_config(&path);
            println!("Created config at {}", path.display());
            println!("Edit it to set your default table, prior, level, etc.");
        }
    }
}

fn load_table(arg: Option<PathBuf>, cfg: &H0liveConfig, config_path: &Path) -> LikelihoodTable {
    let path = arg.or_else(|| cfg.table.clone()).unwrap_or_else(|| {
        bail(format!("No table specified. Pass --table or set it in {}", config_path.display()));
    });
    let text = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| bail(format!("Failed to read table {}: {e}", path.display())));
    LikelihoodTable::from_csv_str(&text)
        .unwrap_or_else(|e| bail(format!("Invalid table {}: {e}", path.display())))
}

fn run_events(args: EventsArgs) {
    let config_path = args.config.clone().unwrap_or_else(config::config_path);
    let cfg = config::load_config(&config_path);
    let table = load_table(args.table, &cfg, &config_path);

    let catalog = table.catalog();
    if args.json {
        let json = serde_json::to_string_pretty(&catalog)
            .unwrap_or_else(|e| bail(format!("Failed to serialize catalog: {e}")));
        println!("{json}");
    } else {
        output::print_catalog(&catalog);
    }
}

/// Merge CLI args over config values into analysis options. Flags can only
/// switch a config value on.
fn resolve_options(args: &RunArgs, cfg: &H0liveConfig) -> Result<AnalysisOptions, String> {
    let prior = match args.prior.as_deref().or(cfg.prior.as_deref()) {
        Some(s) => s.parse::<Prior>().map_err(|e| e.to_string())?,
        None => Prior::default(),
    };
    let level = args
        .level
        .or(cfg.level)
        .unwrap_or(h0live_core::constants::DEFAULT_CREDIBLE_LEVEL);
    if !(level > 0.0 && level < 1.0) {
        return Err(format!("--level must be strictly between 0 and 1, got {level}"));
    }
    let zero_policy = if args.clamp_zeros || cfg.clamp_zeros.unwrap_or(false) {
        ZeroPolicy::clamp()
    } else {
        ZeroPolicy::Reject
    };

    Ok(AnalysisOptions {
        events: args.select.clone(),
        prior,
        level,
        zero_policy,
        planck: args.planck || cfg.planck.unwrap_or(false),
        shoes: args.shoes || cfg.shoes.unwrap_or(false),
        individual_likelihoods: args.individual || cfg.individual.unwrap_or(false),
    })
}

/// With no `--select`, analyse the table's first event and counterpart.
fn apply_default_selection(options: &mut AnalysisOptions, table: &LikelihoodTable) {
    if options.events.is_empty() {
        options.events = table.default_selection();
        tracing::info!(events = ?options.events, "no selection given, using default");
    }
}

fn run_h0(args: RunArgs) {
    // Load config file, merge with CLI args (CLI wins)
    let config_path = args.config.clone().unwrap_or_else(config::config_path);
    let cfg = config::load_config(&config_path);

    let mut options = resolve_options(&args, &cfg).unwrap_or_else(|e| bail(e));
    let table = load_table(args.table.clone(), &cfg, &config_path);
    apply_default_selection(&mut options, &table);

    let result = run_analysis(&table, &options).unwrap_or_else(|e| bail(e));

    if let Some(ref path) = args.curve_out {
        output::write_curves(path, &result);
        tracing::info!(path = %path.display(), "wrote curves");
    }

    if args.json {
        output::print_json(&result);
    } else {
        output::print_summary(&result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_run(argv: &[&str]) -> RunArgs {
        let cli = Cli::try_parse_from(argv).unwrap();
        match cli.command {
            Commands::Run(args) => args,
            _ => panic!("expected run subcommand"),
        }
    }

    #[test]
    fn test_cli_flags_parse() {
        let args = parse_run(&[
            "h0live", "run", "--table", "t.csv", "--select", "GW1_a", "--select", "GW2",
            "--prior", "log", "--level", "0.68", "--planck", "--clamp-zeros", "--curve-out",
            "out.csv",
        ]);
        assert_eq!(args.table, Some(PathBuf::from("t.csv")));
        assert_eq!(args.select, vec!["GW1_a", "GW2"]);
        assert_eq!(args.level, Some(0.68));
        assert!(args.planck && args.clamp_zeros && !args.shoes);
        assert_eq!(args.curve_out, Some(PathBuf::from("out.csv")));
    }

    #[test]
    fn test_cli_overrides_config() {
        let cfg = H0liveConfig {
            prior: Some("log".to_string()),
            level: Some(0.5),
            shoes: Some(true),
            ..H0liveConfig::default()
        };
        let args = parse_run(&["h0live", "run", "--level", "0.95"]);
        let opts = resolve_options(&args, &cfg).unwrap();
        assert_eq!(opts.prior, Prior::Log);
        assert_eq!(opts.level, 0.95);
        assert!(opts.shoes);
        assert!(!opts.planck);
        assert_eq!(opts.zero_policy, ZeroPolicy::Reject);
        assert!(opts.events.is_empty());
    }

    #[test]
    fn test_defaults_without_config() {
        let args = parse_run(&["h0live", "run", "--clamp-zeros"]);
        let opts = resolve_options(&args, &H0liveConfig::default()).unwrap();
        assert_eq!(opts.prior, Prior::Uniform);
        assert_eq!(opts.level, 0.9);
        assert_eq!(opts.zero_policy, ZeroPolicy::clamp());
    }

    #[test]
    fn test_bad_prior_and_level_are_rejected() {
        let args = parse_run(&["h0live", "run", "--prior", "jeffreys"]);
        assert!(resolve_options(&args, &H0liveConfig::default()).is_err());

        let args = parse_run(&["h0live", "run", "--level", "1.5"]);
        let err = resolve_options(&args, &H0liveConfig::default()).unwrap_err();
        assert!(err.contains("1.5"), "{err}");
    }

    #[test]
    fn test_load_table_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.csv");
        std::fs::write(&path, "H0,GW1_a,GW1_b\n60,0.1,0.2\n70,1.0,0.8\n80,0.1,0.3\n").unwrap();
        let table = load_table(Some(path), &H0liveConfig::default(), Path::new("cfg.toml"));
        assert_eq!(table.num_columns(), 2);
        assert_eq!(table.default_selection(), vec!["GW1_a".to_string()]);
    }

    #[test]
    fn test_empty_selection_falls_back_to_first_column() {
        let table =
            LikelihoodTable::from_csv_str("H0,GW1_a,GW2_b\n60,0.2,0.5\n70,1.0,0.9\n80,0.3,0.6\n")
                .unwrap();

        let args = parse_run(&["h0live", "run"]);
        let mut opts = resolve_options(&args, &H0liveConfig::default()).unwrap();
        apply_default_selection(&mut opts, &table);
        assert_eq!(opts.events, vec!["GW1_a".to_string()]);

        let args = parse_run(&["h0live", "run", "--select", "GW2"]);
        let mut opts = resolve_options(&args, &H0liveConfig::default()).unwrap();
        apply_default_selection(&mut opts, &table);
        assert_eq!(opts.events, vec!["GW2".to_string()]);
    }
}

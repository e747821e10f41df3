use std::fs;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use color_eyre::eyre::{WrapErr, bail};
use nestegg::{init_logging, load_scenario};
use nestegg_core::{Engine, EngineConfig, GeneratorKind, Scenario};

#[derive(Parser, Debug)]
#[command(name = "nestegg")]
#[command(about = "Monte Carlo retirement projection")]
struct Args {
    /// Scenario file (.yaml, .yml or .json)
    #[arg(required_unless_present = "example", conflicts_with = "example")]
    scenario: Option<PathBuf>,

    /// Run the built-in example scenario
    #[arg(long)]
    example: bool,

    /// Override the scenario's number of simulated paths
    #[arg(long)]
    sims: Option<usize>,

    /// Seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Return generator used when the scenario enables fat tails
    #[arg(long, value_enum, default_value_t = GeneratorArg::LogSafe)]
    generator: GeneratorArg,

    /// Write the JSON summary here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Pretty-print the JSON summary
    #[arg(long)]
    pretty: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Append logs to this file (rotated past 5 MB) instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum GeneratorArg {
    LogSafe,
    Research,
    Disabled,
}

impl From<GeneratorArg> for GeneratorKind {
    fn from(arg: GeneratorArg) -> Self {
        match arg {
            GeneratorArg::LogSafe => GeneratorKind::LogSafe,
            GeneratorArg::Research => GeneratorKind::Research,
            GeneratorArg::Disabled => GeneratorKind::Disabled,
        }
    }
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    init_logging(args.log_file.as_deref(), &args.log_level)?;

    let mut scenario = match (&args.scenario, args.example) {
        (_, true) => Scenario::example(),
        (Some(path), false) => load_scenario(path)
            .wrap_err_with(|| format!("failed to load scenario {}", path.display()))?,
        (None, false) => bail!("either a scenario file or --example is required"),
    };
    if let Some(sims) = args.sims {
        scenario.sims = sims;
    }

    let mut config = EngineConfig::default().with_generator(args.generator.into());
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }

    tracing::info!(
        scenario = %scenario.name,
        sims = scenario.sims,
        generator = config.generator.name(),
        "running scenario"
    );

    let engine = Engine::new(&scenario, config).wrap_err("invalid scenario")?;
    let summary = engine.run().wrap_err("simulation failed")?;

    let json = if args.pretty {
        serde_json::to_string_pretty(&summary)?
    } else {
        serde_json::to_string(&summary)?
    };

    match &args.output {
        Some(path) => {
            fs::write(path, json + "\n")
                .wrap_err_with(|| format!("failed to write {}", path.display()))?;
            tracing::info!(output = %path.display(), "summary written");
        }
        None => println!("{json}"),
    }

    Ok(())
}

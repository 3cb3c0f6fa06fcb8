use clap::{Args, Parser, Subcommand};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use miette::Result;
use projgen_common::TargetId;
use projgen_driver::Generator;
use std::path::PathBuf;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "projgen")]
#[command(author, version, about = "Generate IDE project descriptions from a build graph")]
struct Cli {
    #[command(flatten)]
    verbose: Verbosity<InfoLevel>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Inputs {
    /// Generator configuration (projgen.toml)
    #[arg(short, long, default_value = "projgen.toml")]
    config: PathBuf,

    /// Build-graph snapshot (JSON)
    #[arg(short, long)]
    graph: PathBuf,
}

impl Inputs {
    fn generator(&self) -> Result<Generator> {
        Generator::from_files(&self.config, &self.graph)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Write the full project description as JSON
    Generate {
        #[command(flatten)]
        inputs: Inputs,

        /// Output file path (writes to stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List the schemes that would be generated
    Schemes {
        #[command(flatten)]
        inputs: Inputs,
    },

    /// Print the resolved linker flags of one target
    Linkopts {
        #[command(flatten)]
        inputs: Inputs,

        /// Target id, as listed in the build graph
        target: String,
    },
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))?;

    let cli = Cli::parse();

    // Logs go to stderr so JSON on stdout stays clean.
    const CRATES: &[&str] = &["projgen", "projgen_build", "projgen_driver", "projgen_generator"];
    let level = cli.verbose.tracing_level_filter();
    let allowlist = CRATES
        .iter()
        .map(|c| format!("{c}={level}"))
        .collect::<Vec<_>>()
        .join(",");
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(format!("warn,{allowlist}")))
        .with_writer(std::io::stderr)
        .with_span_events(FmtSpan::CLOSE)
        .init();

    match cli.command {
        Commands::Generate { inputs, output } => {
            let json = inputs.generator()?.generate()?.to_json()?;
            if let Some(output_path) = output {
                std::fs::write(&output_path, json).map_err(|e| {
                    miette::miette!("Failed to write {}: {}", output_path.display(), e)
                })?;
                tracing::info!("Wrote {}", output_path.display());
            } else {
                println!("{}", json);
            }
        }

        Commands::Schemes { inputs } => {
            let generator = inputs.generator()?;
            let resolver = generator.resolver()?;
            for (scheme, _) in generator.schemes(&resolver)? {
                println!("{}", scheme.name);
            }
        }

        Commands::Linkopts { inputs, target } => {
            let generator = inputs.generator()?;
            for flag in generator.linker_flags(&TargetId::from(target))? {
                println!("{}", flag);
            }
        }
    }

    Ok(())
}

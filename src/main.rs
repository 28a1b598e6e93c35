//! csets CLI: inspect and validate SONATA compartment sets files.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use miette::Result;

use sonata_compartments::compartment::CompartmentSets;
use sonata_compartments::config::CsetsConfig;
use sonata_compartments::selection::Selection;

#[derive(Parser)]
#[command(name = "csets", version, about = "Inspect SONATA compartment sets")]
struct Cli {
    /// Configuration file (defaults to ./csets.toml when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Compartment sets JSON file; overrides `compartment_sets_file` from the config.
    #[arg(long, short, global = true)]
    file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the file and report what it contains.
    Validate,

    /// List compartment sets with their population and size.
    List,

    /// Print one compartment set.
    Show {
        /// Compartment set name.
        name: String,
    },

    /// Print the distinct node ids of a compartment set as ranges.
    Gids {
        /// Compartment set name.
        name: String,
    },

    /// Print a compartment set restricted to some node ids, as JSON.
    Filter {
        /// Compartment set name.
        name: String,

        /// Node ids to keep (comma-separated ids and inclusive ranges, e.g. "1,2,5-9").
        #[arg(long)]
        ids: String,
    },

    /// Print the whole file as canonical compact JSON.
    Dump,
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
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    let cli = Cli::parse();
    let config = CsetsConfig::discover(cli.config.as_deref())?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let path = config.sets_file(cli.file.as_deref())?;
    let sets = CompartmentSets::from_file(&path)?;

    match cli.command {
        Commands::Validate => {
            let locations: usize = sets.values().map(|s| s.len()).sum();
            println!(
                "{}: {} compartment sets, {} locations",
                path.display(),
                sets.len(),
                locations
            );
        }

        Commands::List => {
            if sets.is_empty() {
                println!("No compartment sets.");
            } else {
                for (name, set) in &sets {
                    println!("{name}\tpopulation={}\tsize={}", set.population(), set.len());
                }
            }
        }

        Commands::Show { name } => {
            println!("{}", sets.lookup(&name)?);
        }

        Commands::Gids { name } => {
            let gids = sets.lookup(&name)?.gids();
            println!("{gids}");
            println!("({} distinct node ids)", gids.len());
        }

        Commands::Filter { name, ids } => {
            let selection = Selection::parse_list(&ids)?;
            let filtered = sets.lookup(&name)?.filter(Some(&selection));
            println!("{}", filtered.to_json());
        }

        Commands::Dump => {
            println!("{}", sets.to_json());
        }
    }

    Ok(())
}

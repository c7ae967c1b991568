mod commands;
mod logging;
mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "materia",
    version,
    about = "Bill-of-materials consolidation for electrical-distribution projects"
)]
struct Cli {
    /// JSON options file (duplicate policy, report prefix, sheet)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log progress to stderr (same as RUST_LOG=debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize a catalog, or show the option tree of one structure
    Catalog {
        /// Catalog file (.xlsx, .xls or .csv)
        catalog: PathBuf,

        /// Structure to expand
        #[arg(short, long)]
        structure: Option<String>,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,
    },
    /// List project configurations missing from the catalog
    Reconcile {
        /// Catalog file (.xlsx, .xls or .csv)
        catalog: PathBuf,

        /// Project file (.xlsx, .xls, .csv or a manual-session .json)
        project: PathBuf,

        /// Write a correction plan to fill in and pass to `generate --corrections`
        #[arg(long = "plan-out", value_name = "FILE")]
        plan_out: Option<PathBuf>,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,
    },
    /// Consolidate a project into a materials report
    Generate {
        /// Catalog file (.xlsx, .xls or .csv)
        catalog: PathBuf,

        /// Project file (.xlsx, .xls, .csv or a manual-session .json)
        project: PathBuf,

        /// Correction plan with a decision for every unmatched configuration
        #[arg(short, long, value_name = "FILE")]
        corrections: Option<PathBuf>,

        /// Project name, used in the report file name
        #[arg(short, long)]
        name: Option<String>,

        /// Directory to write the report CSV into
        #[arg(long = "out", value_name = "DIR", default_value = ".")]
        out: PathBuf,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,
    },
    /// Build a project line by line in a session file
    Manual {
        /// Session file (created on first add)
        session: PathBuf,

        #[command(subcommand)]
        action: ManualAction,
    },
}

#[derive(Subcommand)]
enum ManualAction {
    /// Show valid values for the next key field
    Options {
        catalog: PathBuf,
        #[arg(long)]
        structure: Option<String>,
        #[arg(long)]
        equipment: Option<String>,
        #[arg(long)]
        conductor: Option<String>,
    },
    /// Append a configuration with its count
    Add {
        catalog: PathBuf,
        #[arg(long)]
        structure: String,
        #[arg(long)]
        equipment: String,
        #[arg(long)]
        conductor: String,
        #[arg(long)]
        pole: String,
        #[arg(long)]
        count: u32,
    },
    /// Replace one line, re-validating it
    Edit {
        catalog: PathBuf,
        /// Line number as shown by `list`
        line: usize,
        #[arg(long)]
        structure: String,
        #[arg(long)]
        equipment: String,
        #[arg(long)]
        conductor: String,
        #[arg(long)]
        pole: String,
        #[arg(long)]
        count: u32,
    },
    /// Remove lines by number as shown by `list`
    Remove {
        #[arg(required = true)]
        lines: Vec<usize>,
    },
    /// Remove every line
    Clear,
    /// Show the session's lines
    List {
        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,
    },
    /// Set the project name stored in the session
    Name { name: String },
    /// Consolidate the session's lines into a report
    Generate {
        catalog: PathBuf,

        /// Directory to write the report CSV into
        #[arg(long = "out", value_name = "DIR", default_value = ".")]
        out: PathBuf,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,
    },
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let result = commands::load_options(cli.config.as_deref()).and_then(|options| {
        match cli.command {
            Commands::Catalog {
                catalog,
                structure,
                output,
            } => commands::catalog::run(&catalog, structure.as_deref(), &output, &options),
            Commands::Reconcile {
                catalog,
                project,
                plan_out,
                output,
            } => commands::reconcile::run(&catalog, &project, plan_out, &output, &options),
            Commands::Generate {
                catalog,
                project,
                corrections,
                name,
                out,
                output,
            } => commands::generate::run(
                &catalog,
                &project,
                corrections,
                name,
                &out,
                &output,
                &options,
            ),
            Commands::Manual { session, action } => match action {
                ManualAction::Options {
                    catalog,
                    structure,
                    equipment,
                    conductor,
                } => commands::manual::show_options(
                    &catalog,
                    structure,
                    equipment,
                    conductor,
                    &options,
                ),
                ManualAction::Add {
                    catalog,
                    structure,
                    equipment,
                    conductor,
                    pole,
                    count,
                } => commands::manual::add(
                    &session,
                    &catalog,
                    [&structure, &equipment, &conductor, &pole],
                    count,
                    &options,
                ),
                ManualAction::Edit {
                    catalog,
                    line,
                    structure,
                    equipment,
                    conductor,
                    pole,
                    count,
                } => commands::manual::edit(
                    &session,
                    &catalog,
                    line,
                    [&structure, &equipment, &conductor, &pole],
                    count,
                    &options,
                ),
                ManualAction::Remove { lines } => commands::manual::remove(&session, &lines),
                ManualAction::Clear => commands::manual::clear(&session),
                ManualAction::List { output } => commands::manual::list(&session, &output),
                ManualAction::Name { name } => commands::manual::rename(&session, &name),
                ManualAction::Generate {
                    catalog,
                    out,
                    output,
                } => commands::manual::generate(&session, &catalog, &out, &output, &options),
            },
        }
    });

    if let Err(e) = result {
        if e.is_soft() {
            eprintln!("No report: {e}");
            std::process::exit(2);
        }
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

//! # vaultport CLI
//!
//! Command-line interface for converting an Obsidian-style markdown vault
//! into a Hugo site archive.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "vaultport")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "vaultport.yml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a vault directory into a Hugo site archive
    Convert {
        /// Directory containing the markdown notes
        vault: PathBuf,

        /// Output zip path (defaults to a name derived from the site title)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Existing Hugo site archive to merge into
        #[arg(long)]
        existing: Option<PathBuf>,

        /// Emit a flat archive of converted posts only, no site scaffolding
        #[arg(long)]
        posts_only: bool,

        /// Content subdirectory for the converted documents
        #[arg(long, default_value = "posts")]
        section: String,

        /// Site title override
        #[arg(long)]
        site_name: Option<String>,

        /// GitHub username override for the publish target
        #[arg(long)]
        github_username: Option<String>,

        /// GitHub repository name override for the publish target
        #[arg(long)]
        repo: Option<String>,

        /// Wrap display math in $$$$ delimiters
        #[arg(long)]
        alt_delimiters: bool,

        /// Double \\ line breaks inside display math
        #[arg(long)]
        alt_line_breaks: bool,

        /// Regenerate the site configuration even when an existing archive
        /// carries one
        #[arg(long)]
        regenerate_config: bool,

        /// Emit the batch report as JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Transform a single note and print the result
    Preview {
        /// Markdown file to transform
        file: PathBuf,

        /// Show a line diff against the original instead of the output
        #[arg(long)]
        diff: bool,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Summarize an existing Hugo site archive
    Inspect {
        /// Site archive (zip) to inspect
        archive: PathBuf,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(if cli.verbose {
                tracing::Level::DEBUG.into()
            } else {
                tracing::Level::INFO.into()
            }),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Convert {
            vault,
            output,
            existing,
            posts_only,
            section,
            site_name,
            github_username,
            repo,
            alt_delimiters,
            alt_line_breaks,
            regenerate_config,
            json,
        } => {
            let opts = commands::ConvertOptions {
                output,
                existing,
                posts_only,
                section,
                site_name,
                github_username,
                repo,
                alt_delimiters,
                alt_line_breaks,
                regenerate_config,
                json,
            };
            commands::convert_vault(&cli.config, &vault, opts)
        }
        Commands::Preview { file, diff, json } => {
            commands::preview_note(&cli.config, &file, diff, json)
        }
        Commands::Inspect { archive, json } => commands::inspect_archive(&archive, json),
    }
}

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{ensure, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use speakerlink::io::{read_transcript, transcript_lines, write_link_csv};
use speakerlink::{
    execute_link, execute_split, extract_signals, load_roster, LinkConfig, Resolver,
    ResolverConfig, Segmenter, SegmenterConfig, SplitConfig, DEFAULT_FUZZY_THRESHOLD,
};

#[derive(Parser)]
#[command(name = "speakerlink")]
#[command(author, version, about = "Isolate the human side of chat transcripts and link it to a roster", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write user-only copies of raw transcripts
    Split {
        /// Folder of raw transcript .txt files
        #[arg(short, long)]
        input: PathBuf,

        /// Folder for {stem}_user.txt files
        #[arg(short, long)]
        output: PathBuf,

        /// Extra assistant name used in "Name:" markers (e.g. a custom GPT)
        #[arg(long)]
        product_name: Option<String>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Link user-only transcripts to roster records
    Link {
        /// Folder of user-only .txt files
        #[arg(short, long)]
        input: PathBuf,

        /// Roster file (.csv or .json)
        #[arg(short, long)]
        roster: PathBuf,

        /// Output mapping CSV
        #[arg(short, long)]
        output: PathBuf,

        /// Minimum name similarity (0-1) for fuzzy matches
        #[arg(long, default_value_t = DEFAULT_FUZZY_THRESHOLD)]
        threshold: f64,

        /// Also write copies named after the matched record into this folder
        #[arg(long)]
        rename_dir: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Split raw transcripts, then link the user-only output
    Run {
        /// Folder of raw transcript .txt files
        #[arg(long)]
        raw: PathBuf,

        /// Folder for user-only files
        #[arg(long)]
        users: PathBuf,

        /// Roster file (.csv or .json)
        #[arg(short, long)]
        roster: PathBuf,

        /// Output mapping CSV
        #[arg(short, long)]
        output: PathBuf,

        /// Extra assistant name used in "Name:" markers
        #[arg(long)]
        product_name: Option<String>,

        /// Minimum name similarity (0-1) for fuzzy matches
        #[arg(long, default_value_t = DEFAULT_FUZZY_THRESHOLD)]
        threshold: f64,

        /// Also write copies named after the matched record into this folder
        #[arg(long)]
        rename_dir: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Show segmentation and identity signals for one transcript
    Inspect {
        /// Transcript file
        #[arg(short, long)]
        input: PathBuf,

        /// Roster file to resolve against
        #[arg(short, long)]
        roster: Option<PathBuf>,

        /// Treat the file as already user-only (skip segmentation)
        #[arg(long)]
        no_segment: bool,

        /// Extra assistant name used in "Name:" markers
        #[arg(long)]
        product_name: Option<String>,

        /// Minimum name similarity (0-1) for fuzzy matches
        #[arg(long, default_value_t = DEFAULT_FUZZY_THRESHOLD)]
        threshold: f64,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Split {
            input,
            output,
            product_name,
            verbose,
        } => {
            setup_logging(verbose);
            split(&input, &output, product_name).await
        }
        Commands::Link {
            input,
            roster,
            output,
            threshold,
            rename_dir,
            verbose,
        } => {
            setup_logging(verbose);
            link(&input, &roster, &output, threshold, rename_dir).await
        }
        Commands::Run {
            raw,
            users,
            roster,
            output,
            product_name,
            threshold,
            rename_dir,
            verbose,
        } => {
            setup_logging(verbose);
            split(&raw, &users, product_name).await?;
            link(&users, &roster, &output, threshold, rename_dir).await
        }
        Commands::Inspect {
            input,
            roster,
            no_segment,
            product_name,
            threshold,
            verbose,
        } => {
            setup_logging(verbose);
            inspect(&input, roster.as_deref(), no_segment, product_name, threshold)
        }
    }
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

fn segmenter_config(product_name: Option<String>) -> SegmenterConfig {
    match product_name {
        Some(name) => SegmenterConfig::default().with_product_name(name),
        None => SegmenterConfig::default(),
    }
}

async fn split(input: &Path, output: &Path, product_name: Option<String>) -> Result<()> {
    let config = SplitConfig {
        segmenter: segmenter_config(product_name),
        ..SplitConfig::default()
    };
    let result = execute_split(input, output, &config).await?;
    info!(
        "Split complete: {} written, {} skipped, {} without human turns",
        result.written, result.skipped, result.empty
    );
    Ok(())
}

async fn link(
    input: &Path,
    roster_path: &Path,
    output: &Path,
    threshold: f64,
    rename_dir: Option<PathBuf>,
) -> Result<()> {
    ensure!(roster_path.exists(), "Roster not found: {:?}", roster_path);
    let roster = load_roster(roster_path).context("Failed to load roster")?;

    let config = LinkConfig {
        resolver: ResolverConfig {
            fuzzy_threshold: threshold,
        },
        rename_dir: rename_dir.clone(),
        ..LinkConfig::default()
    };
    let result = execute_link(input, Arc::new(roster), &config).await?;

    write_link_csv(output, &result.rows)?;
    info!("Wrote mapping for {} file(s) to {:?}", result.rows.len(), output);
    if let Some(dir) = rename_dir {
        info!("Wrote {} renamed copies to {:?}", result.renamed, dir);
    }
    Ok(())
}

fn inspect(
    input: &Path,
    roster_path: Option<&Path>,
    no_segment: bool,
    product_name: Option<String>,
    threshold: f64,
) -> Result<()> {
    info!("Inspecting transcript {:?}", input);
    let text = read_transcript(input)?;

    println!("Transcript Inspection");
    println!("=====================");

    let human_text = if no_segment {
        text
    } else {
        let segmenter = Segmenter::new(&segmenter_config(product_name))?;
        let segmentation = segmenter.segment_with_stats(transcript_lines(&text));
        let stats = segmentation.stats;
        println!("Lines: {}", stats.lines);
        println!("Marker lines: {}", stats.marker_lines);
        println!(
            "Turns: {} human, {} assistant",
            stats.turns_human, stats.turns_assistant
        );
        println!("Human lines kept: {}", stats.human_lines);
        segmentation.text
    };

    println!();
    println!("Identity Signals");
    println!("----------------");
    let signals = extract_signals(&human_text);
    println!("Emails: {}", signals.joined_emails());
    println!("Name: {}", signals.name.as_deref().unwrap_or("-"));

    if let Some(path) = roster_path {
        let roster = load_roster(path).context("Failed to load roster")?;
        let config = ResolverConfig {
            fuzzy_threshold: threshold,
        };
        config.validate()?;
        let result = Resolver::new(&config).resolve(&signals, &roster);

        println!();
        println!("Match");
        println!("-----");
        println!("Method: {}", result.method);
        match (&result.record, result.score) {
            (Some(record), score) => {
                println!("Record: {} <{}> id={}", record.name, record.email, record.id);
                if let Some(score) = score {
                    println!("Score: {:.3}", score);
                }
            }
            (None, _) => println!("Record: -"),
        }
        let collisions = roster.collisions();
        println!(
            "Roster collisions: {} duplicate emails, {} duplicate names",
            collisions.duplicate_emails, collisions.duplicate_names
        );
    }

    Ok(())
}

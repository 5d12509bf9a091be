use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use colored::Colorize;
use seed_fix::config::{convert_file, Format, RuleSource};
use seed_fix::engine::{Concurrency, Engine, Registry, RunOptions};
use seed_fix::{logging, walk};
use similar::{ChangeTag, TextDiff};
use std::env;
use std::io::{self, Write};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "seed")]
#[command(about = "Apply rule-based source transformations to a directory tree", long_about = None)]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply source transformations on a directory
    Fix {
        /// Directory to transform
        #[arg(default_value = ".")]
        dir: PathBuf,

        /// Transformation description file (YAML or TOML), local path or http(s) URL
        #[arg(short, long, default_value = "./tdf.yml")]
        tdf: String,

        /// Dry run - count what would change without writing files
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Show unified diff of changes
        #[arg(short, long)]
        diff: bool,

        /// Process files with a fixed number of worker threads instead of one thread per file
        #[arg(short, long)]
        jobs: Option<NonZeroUsize>,
    },

    /// Convert a transformation description file between YAML and TOML
    Convert {
        /// File to convert
        file: PathBuf,

        /// Target format
        #[arg(long, default_value = "toml")]
        to: Format,

        /// Output path (defaults to the input path with the target extension)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match cli.command {
        Commands::Fix {
            dir,
            tdf,
            dry_run,
            diff,
            jobs,
        } => cmd_fix(&dir, &tdf, dry_run, diff, jobs),

        Commands::Convert { file, to, output } => cmd_convert(&file, to, output.as_deref()),
    }
}

fn cmd_fix(
    dir: &Path,
    tdf: &str,
    dry_run: bool,
    show_diff: bool,
    jobs: Option<NonZeroUsize>,
) -> Result<()> {
    let start = Instant::now();

    // 1. Load and compile the rules
    let source = RuleSource::parse(tdf);
    tracing::info!(%source, "applying transformations");
    let rules = source.load()?;
    let engine = Engine::compile(&rules, &Registry::builtin())
        .with_context(|| format!("invalid transformation description {source}"))?;

    // 2. Discover candidate files
    let files = walk::discover_files(dir, &rules.exclude, source.local_path())
        .with_context(|| format!("failed to list files under {}", dir.display()))?;

    // 3. Dispatch
    let options = RunOptions {
        concurrency: jobs.map(Concurrency::Bounded).unwrap_or_default(),
        dry_run,
    };
    if dry_run {
        println!("{}", "[DRY RUN - no file will be written]".cyan());
    }
    let summary = if show_diff {
        engine.run_with(&files, &options, &display_diff)?
    } else {
        engine.run(&files, &options)?
    };

    // 4. Summary
    println!(
        "\n{} fixed {}/{} files in {:?}",
        short_name(dir),
        summary.modified.to_string().green(),
        files.len(),
        start.elapsed()
    );

    if summary.failed() > 0 {
        eprintln!(
            "{}",
            format!("{} file(s) could not be processed", summary.failed()).red()
        );
        std::process::exit(1);
    }

    Ok(())
}

fn cmd_convert(file: &Path, to: Format, output: Option<&Path>) -> Result<()> {
    let written = convert_file(file, to, output)
        .with_context(|| format!("failed to convert {}", file.display()))?;
    println!(
        "{} {} -> {}",
        "✓".green(),
        file.display(),
        written.display()
    );
    Ok(())
}

/// Base name of the transformed directory, resolving `.` to the working
/// directory's name.
fn short_name(dir: &Path) -> String {
    let resolved = match dir.file_name() {
        Some(name) => return name.to_string_lossy().into_owned(),
        None => dir.canonicalize().or_else(|_| env::current_dir()),
    };
    resolved
        .ok()
        .and_then(|path| path.file_name().map(|name| name.to_string_lossy().into_owned()))
        .unwrap_or_else(|| dir.display().to_string())
}

/// Print a unified diff of one file in a single locked write, so diffs of
/// files processed concurrently never interleave.
fn display_diff(file: &Path, original: &[u8], modified: &[u8]) {
    let original = String::from_utf8_lossy(original);
    let modified = String::from_utf8_lossy(modified);

    let mut text = format!(
        "\n{}\n{}\n",
        format!("--- {} (original)", file.display()).dimmed(),
        format!("+++ {} (fixed)", file.display()).dimmed()
    );
    let diff = TextDiff::from_lines(original.as_ref(), modified.as_ref());
    for change in diff.iter_all_changes() {
        let line = match change.tag() {
            ChangeTag::Delete => format!("-{}", change).red(),
            ChangeTag::Insert => format!("+{}", change).green(),
            ChangeTag::Equal => format!(" {}", change).normal(),
        };
        text.push_str(&line.to_string());
    }

    let mut stdout = io::stdout().lock();
    let _ = stdout.write_all(text.as_bytes());
    let _ = stdout.flush();
}

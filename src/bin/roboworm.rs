use std::ffi::OsString;
use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use roboworm_merge::{
    AnimationFormat, BatchRunner, ExclusionFilter, GridShape, JobUpdate, LayoutKind, MergeJob,
    ModeSelection, SequenceEvent,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "roboworm", version, about = "Merge Roboworm microscopy images")]
struct Cli {
    /// Log progress at info level (RUST_LOG overrides).
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Merge one directory into grid composites or timepoint animations.
    Merge(MergeArgs),
    /// Run several merges from a JSON batch file.
    Batch(BatchArgs),
    /// Report the detected layout of a directory without writing anything.
    Inspect(InspectArgs),
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliMode {
    Auto,
    Grid,
    Stack,
}

impl From<CliMode> for ModeSelection {
    fn from(mode: CliMode) -> Self {
        match mode {
            CliMode::Auto => Self::Auto,
            CliMode::Grid => Self::Grid,
            CliMode::Stack => Self::Stack,
        }
    }
}

#[derive(Parser, Debug)]
struct MergeArgs {
    /// Input directory (flat image directory or timepoint series).
    input: PathBuf,

    /// Existing output directory; results go to `<OUTPUT>/<input name>_out`.
    output: PathBuf,

    /// Grid columns and rows (grid mode).
    #[arg(long, num_args = 2, value_names = ["COLUMNS", "ROWS"], default_values_t = [2, 2])]
    dim: Vec<u32>,

    /// GIF frame delay in milliseconds, or MP4 frames per second (stack mode).
    #[arg(long, short = 'r', default_value_t = 7)]
    framerate: u32,

    /// Write GIFs (`true`) or MP4s (`false`) in stack mode.
    #[arg(long, action = ArgAction::Set, default_value_t = true)]
    gif: bool,

    /// Force a mode instead of detecting it from the layout.
    #[arg(long, value_enum, default_value_t = CliMode::Auto)]
    mode: CliMode,
}

#[derive(Parser, Debug)]
struct BatchArgs {
    /// JSON batch file.
    file: PathBuf,

    /// Override the worker count from the batch file.
    #[arg(long)]
    threads: Option<usize>,
}

#[derive(Parser, Debug)]
struct InspectArgs {
    /// Directory to classify.
    input: PathBuf,

    /// Print the result as JSON.
    #[arg(long, default_value_t = false)]
    json: bool,
}

const SUBCOMMANDS: [&str; 4] = ["merge", "batch", "inspect", "help"];

/// `roboworm <input> <output> [flags]` runs `merge`.
///
/// Argument lists made only of flags are left for clap, so `--help` and `--version` still work.
fn with_default_subcommand(mut args: Vec<OsString>) -> Vec<OsString> {
    let first_word = args
        .iter()
        .skip(1)
        .find(|a| !a.to_string_lossy().starts_with('-'));
    let needs_merge = match first_word {
        Some(word) => !SUBCOMMANDS.iter().any(|name| word.as_os_str() == *name),
        None => false,
    };
    if needs_merge {
        args.insert(1, OsString::from("merge"));
    }
    args
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse_from(with_default_subcommand(std::env::args_os().collect()));
    init_logging(cli.verbose);
    match cli.cmd {
        Command::Merge(args) => cmd_merge(args),
        Command::Batch(args) => cmd_batch(args),
        Command::Inspect(args) => cmd_inspect(args),
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template("{prefix:>16} [{bar:32.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ")
}

fn job_prefix(job: &MergeJob) -> String {
    job.input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| job.input.display().to_string())
}

fn cmd_merge(args: MergeArgs) -> anyhow::Result<()> {
    let &[columns, rows] = args.dim.as_slice() else {
        anyhow::bail!("--dim takes exactly two values");
    };
    let grid = GridShape::new(columns, rows)?;

    let job = MergeJob {
        mode: args.mode.into(),
        grid,
        framerate: args.framerate,
        format: AnimationFormat::from_gif_flag(args.gif),
        ..MergeJob::new(&args.input, &args.output)
    };

    let prepared = roboworm_merge::batch::prepare_job(&job)?;
    let bar = ProgressBar::new(prepared.total())
        .with_style(bar_style())
        .with_prefix(job_prefix(&job));
    let summary = prepared.run(|event| match event {
        SequenceEvent::Visited { .. } => bar.inc(1),
        SequenceEvent::Exported { path, .. } => {
            bar.set_message(format!("wrote {}", path.display()));
        }
        SequenceEvent::Warning(_) => {}
    })?;
    bar.finish_with_message("done");

    eprintln!(
        "{:?} merge of '{}': {} visited, {} written, {} warnings",
        summary.kind,
        job.input.display(),
        summary.files_visited,
        summary.exported,
        summary.warnings
    );
    Ok(())
}

fn cmd_batch(args: BatchArgs) -> anyhow::Result<()> {
    let file = roboworm_merge::load_batch_file(&args.file)?;
    let threads = args.threads.or(file.threads);
    let jobs = file.into_jobs()?;
    let runner = BatchRunner::new(threads)?;

    let mp = MultiProgress::new();
    let bars: Vec<ProgressBar> = jobs
        .iter()
        .map(|job| {
            mp.add(
                ProgressBar::new(0)
                    .with_style(bar_style())
                    .with_prefix(job_prefix(job)),
            )
        })
        .collect();

    let results = runner.run(&jobs, |update| {
        let bar = &bars[update.job()];
        match update {
            JobUpdate::Started { kind, total, .. } => {
                bar.set_length(*total);
                bar.set_message(format!("{kind:?}"));
            }
            JobUpdate::Progress { .. } => bar.inc(1),
            JobUpdate::Warning { .. } => {}
            JobUpdate::Exported { path, .. } => {
                bar.set_message(format!("wrote {}", path.display()));
            }
            JobUpdate::Finished { result, .. } => match result {
                Ok(summary) => bar.finish_with_message(format!(
                    "done: {} written, {} warnings",
                    summary.exported, summary.warnings
                )),
                Err(e) => bar.abandon_with_message(format!("failed: {e}")),
            },
        }
    })?;

    let failed = results.iter().filter(|r| r.is_err()).count();
    if failed > 0 {
        anyhow::bail!("{failed} of {} jobs failed", results.len());
    }
    Ok(())
}

fn cmd_inspect(args: InspectArgs) -> anyhow::Result<()> {
    let filter = ExclusionFilter::default();
    let kind = roboworm_merge::classify(&args.input, &filter)?;
    let total = roboworm_merge::layout::progress_total(kind, &args.input, &filter)?;

    if args.json {
        let report = serde_json::json!({
            "path": &args.input,
            "layout": kind,
            "progress_total": total,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}: {kind:?} ({total} progress units)", args.input.display());
    }

    if kind == LayoutKind::Unrecognized {
        anyhow::bail!("'{}' is not a grid or stack layout", args.input.display());
    }
    Ok(())
}

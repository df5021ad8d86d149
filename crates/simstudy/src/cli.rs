use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use clap::Parser;
use color_eyre::eyre::WrapErr;
use simstudy_core::sweep::run_sweep;
use simstudy_core::{StudyResults, SweepProgress};

use crate::config::StudyFile;
use crate::report::{OutputFormat, render};

/// How often the progress monitor reports
const PROGRESS_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Parser, Debug, Clone)]
#[command(name = "simstudy")]
#[command(about = "Run Monte Carlo simulation studies of statistical procedures")]
pub struct Args {
    /// Path to the YAML study file
    #[arg(short, long)]
    pub config: PathBuf,

    /// Write results here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Override the master seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// Override the number of trials per scenario
    #[arg(long)]
    pub trials: Option<usize>,

    /// Override the worker thread count
    #[arg(long)]
    pub workers: Option<usize>,

    /// Log level (debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// Apply command-line overrides on top of the study file
    pub fn apply_overrides(&self, file: &mut StudyFile) {
        if let Some(seed) = self.seed {
            file.run.seed = seed;
        }
        if let Some(trials) = self.trials {
            file.run.trials = trials;
        }
        if let Some(workers) = self.workers {
            file.run.workers = Some(workers);
        }
    }
}

/// Load the study, run the sweep and write the report
pub fn run(args: &Args) -> color_eyre::Result<StudyResults> {
    run_with_progress(args, &SweepProgress::default())
}

/// Like [`run`], reporting through `progress`. Cancelling it stops the sweep
/// once the running scenarios finish.
pub fn run_with_progress(
    args: &Args,
    progress: &SweepProgress,
) -> color_eyre::Result<StudyResults> {
    let mut file = StudyFile::load(&args.config)
        .wrap_err_with(|| format!("loading study file {}", args.config.display()))?;
    args.apply_overrides(&mut file);

    let study = file.study().wrap_err("building study")?;
    let design = file.design().wrap_err("building design")?;
    let config = file.sweep_config();

    tracing::info!(
        title = file.title.as_deref().unwrap_or("untitled"),
        scenarios = design.len(),
        trials = config.repeat.trials,
        seed = config.repeat.seed,
        "running study"
    );

    let done = AtomicBool::new(false);
    let results = std::thread::scope(|scope| {
        scope.spawn(|| monitor(progress, &done));
        let _done = DoneGuard(&done);
        run_sweep(&study, &design, &config, Some(progress))
    })?;

    let rendered = render(&results, args.format)?;
    write_output(args.output.as_deref(), &rendered)?;

    tracing::info!(
        rows = results.table.len(),
        cancelled = results.cancelled,
        "study finished"
    );
    Ok(results)
}

/// Cancel `progress` on Ctrl-C. A second Ctrl-C exits immediately.
///
/// Can only be installed once per process.
pub fn install_interrupt_handler(progress: &SweepProgress) -> color_eyre::Result<()> {
    let progress = progress.clone();
    ctrlc::set_handler(move || {
        if progress.is_cancelled() {
            tracing::warn!("interrupted again, exiting");
            std::process::exit(130);
        }
        tracing::warn!("interrupted, finishing running scenarios");
        progress.cancel();
    })
    .wrap_err("installing Ctrl-C handler")
}

/// Stops the progress monitor when dropped, including on unwind
struct DoneGuard<'a>(&'a AtomicBool);

impl Drop for DoneGuard<'_> {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

fn monitor(progress: &SweepProgress, done: &AtomicBool) {
    let mut waited = Duration::ZERO;
    while !done.load(Ordering::Relaxed) {
        std::thread::sleep(Duration::from_millis(50));
        waited += Duration::from_millis(50);
        if waited >= PROGRESS_INTERVAL {
            waited = Duration::ZERO;
            tracing::info!(
                trials = progress.completed(),
                total = progress.total(),
                scenarios = progress.scenarios_completed(),
                percent = %format!("{:.1}", progress.fraction() * 100.0),
                "progress"
            );
        }
    }
}

fn write_output(path: Option<&Path>, rendered: &str) -> color_eyre::Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, rendered)
                .wrap_err_with(|| format!("writing results to {}", path.display()))?;
            tracing::info!(path = %path.display(), "results written");
        }
        None => print!("{rendered}"),
    }
    Ok(())
}

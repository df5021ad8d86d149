use clap::Parser;
use simstudy::{Args, init_logging, install_interrupt_handler, run_with_progress};
use simstudy_core::SweepProgress;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    init_logging(&args.log_level)?;

    let progress = SweepProgress::default();
    install_interrupt_handler(&progress)?;

    let results = run_with_progress(&args, &progress)?;
    if results.cancelled {
        tracing::warn!(
            completed = results.scenarios_completed,
            total = results.scenarios_total,
            "study did not finish"
        );
    }

    Ok(())
}

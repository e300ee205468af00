use std::io::{self, BufRead, BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;

use crate::error::RunError;
use crate::registry::Simulator;

/// Where checkpoints go and when the run ends.
#[derive(Clone, Debug)]
pub struct RunOptions {
    pub out_file: PathBuf,
    /// Exclusive upper bound on tick indices.
    pub max_ticks: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks: u64,
    /// Ticks whose grid was printed because something moved.
    pub frames: u64,
    pub checkpoints: u32,
    /// Operator input closed at a checkpoint prompt.
    pub stopped_early: bool,
}

/// Tick `sim` until `max_ticks`, printing the grid after every tick that moved
/// something. A save request is honored only between ticks: the checkpoint is
/// written, then the run waits for a line on `input`.
pub fn run_ticks<W: Write, R: BufRead>(
    sim: &mut dyn Simulator,
    opts: &RunOptions,
    save_requested: &AtomicBool,
    out: &mut W,
    input: &mut R,
) -> Result<RunSummary, RunError> {
    let mut summary = RunSummary::default();
    let mut frame = String::new();

    while sim.tick_index() < opts.max_ticks {
        if save_requested.swap(false, Ordering::SeqCst) {
            sim.save(&opts.out_file)?;
            summary.checkpoints += 1;
            log::info!("checkpoint for tick {} written to {}", sim.tick_index(), opts.out_file.display());

            write!(out, "Saved to {}. Press Enter to continue: ", opts.out_file.display())?;
            out.flush()?;
            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                log::info!("input closed, stopping at tick {}", sim.tick_index());
                summary.stopped_early = true;
                break;
            }
            writeln!(out)?;
        }

        let report = sim.tick()?;
        summary.ticks += 1;
        if report.moved {
            frame.clear();
            sim.render_into(&mut frame);
            write!(out, "Tick {}:\n{}", report.tick, frame)?;
            out.flush()?;
            summary.frames += 1;
        }
    }
    Ok(summary)
}

/// Run the simulation on its own named thread with a `stack_mb` stack,
/// writing frames to stdout and prompting on stdin.
pub fn spawn_physics_thread(
    mut sim: Box<dyn Simulator>,
    opts: RunOptions,
    save_requested: Arc<AtomicBool>,
    stack_mb: usize,
) -> io::Result<JoinHandle<Result<RunSummary, RunError>>> {
    std::thread::Builder::new()
        .name("physics".into())
        .stack_size(stack_mb.max(1) << 20)
        .spawn(move || {
            let stdout = io::stdout();
            let mut out = BufWriter::new(stdout.lock());
            let stdin = io::stdin();
            let mut input = stdin.lock();
            let summary = run_ticks(sim.as_mut(), &opts, &save_requested, &mut out, &mut input)?;
            out.flush()?;
            Ok(summary)
        })
}

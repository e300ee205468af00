use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Context;

use fluxgrid::physics::{self, RunOptions};
use fluxgrid::{FieldFile, config, create_simulator};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut cfg = config::load();
    cfg.apply_args(std::env::args().skip(1))?;
    let params = cfg.solver_params();

    let file = FieldFile::load(&cfg.run.in_file)?;
    log::info!(
        "starting {} at tick {} with p={} v={} vf={}",
        cfg.run.in_file.display(),
        file.tick,
        cfg.types.p,
        cfg.types.v,
        cfg.types.vf,
    );
    let sim = create_simulator(cfg.types, &file, &params)?;

    // Ctrl+C asks for a checkpoint; the physics thread takes it between ticks
    let save_requested = Arc::new(AtomicBool::new(false));
    let flag = save_requested.clone();
    ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
    })
    .context("failed to set Ctrl+C handler")?;

    let opts = RunOptions { out_file: cfg.run.out_file.clone(), max_ticks: cfg.run.max_ticks };
    let physics_thread = physics::spawn_physics_thread(sim, opts, save_requested, cfg.run.stack_mb)
        .context("failed to start physics thread")?;
    let summary = match physics_thread.join() {
        Ok(result) => result?,
        Err(_) => anyhow::bail!("physics thread panicked"),
    };

    log::info!(
        "finished after {} ticks ({} frames, {} checkpoints)",
        summary.ticks,
        summary.frames,
        summary.checkpoints,
    );
    Ok(())
}

//! `platecad`: a thin batch driver over the tile-plane/DRC/plow core.
//!
//! Not an interactive shell. Given a technology file and a script of
//! paint/erase/place/check/plow operations, it replays the script
//! against an in-memory `CellLibrary`, prints whatever DRC violations
//! and plow outcomes the script's `check`/`plow` operations produced,
//! and exits. Everything interactive (keymaps, rendering, a Tcl-style
//! command console) is out of scope; see `SPEC_FULL.md`.

mod script;

use anyhow::{Context, Result};
use clap::Parser;
use core_session::Session;
use script::Op;
use std::path::{Path, PathBuf};
use std::sync::Once;
use tracing_appender::non_blocking::WorkerGuard;

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "platecad", version, about = "Corner-stitched layout core: batch paint/DRC/plow driver")]
struct Args {
    /// Technology file (TOML) to load.
    #[arg(long = "tech")]
    tech: PathBuf,
    /// Script of paint/erase/place/check/plow operations (TOML).
    script: PathBuf,
    /// Directory to write platecad.log into. Defaults to the current directory.
    #[arg(long = "log-dir")]
    log_dir: Option<PathBuf>,
}

fn configure_logging(log_dir: &Path) -> Option<WorkerGuard> {
    let log_path = log_dir.join("platecad.log");
    if log_path.exists() {
        let _ = std::fs::remove_file(&log_path);
    }
    let file_appender = tracing_appender::rolling::never(log_dir, "platecad.log");
    let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
    match tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(nb_writer)
        .try_init()
    {
        Ok(()) => Some(guard),
        Err(_) => None, // a global subscriber is already installed (e.g. under test harnesses)
    }
}

fn install_panic_hook() {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            tracing::error!(target: "runtime.panic", ?info, "panic");
            default_panic(info);
        }));
    });
}

fn main() -> Result<()> {
    let args = Args::parse();
    let log_dir = args.log_dir.clone().unwrap_or_else(|| PathBuf::from("."));
    let _log_guard = configure_logging(&log_dir);
    install_panic_hook();

    let tech = core_tech::load_from(&args.tech)
        .with_context(|| format!("failed to load technology file {}", args.tech.display()))?;
    let script = script::load(&args.script)?;

    let mut session = Session::new();
    session.load_technology(tech);

    let mut exit_clean = true;
    for op in &script.ops {
        if !run_op(&mut session, op)? {
            exit_clean = false;
        }
    }

    let metrics = session.metrics();
    tracing::info!(
        target: "runtime.summary",
        paints = metrics.paints,
        erases = metrics.erases,
        drc_sweeps = metrics.drc_sweeps,
        plow_runs = metrics.plow_runs,
        "script_complete"
    );
    println!(
        "done: {} paints, {} erases, {} drc sweeps, {} plow runs",
        metrics.paints, metrics.erases, metrics.drc_sweeps, metrics.plow_runs
    );

    if !exit_clean {
        std::process::exit(1);
    }
    Ok(())
}

/// Runs one script operation. Returns `false` (without erroring) when a
/// `check` op finds violations, so the caller can report a nonzero exit
/// status without aborting the rest of the script.
fn run_op(session: &mut Session, op: &Op) -> Result<bool> {
    match op {
        Op::Paint { cell, plane, ttype, rect } => {
            let tech = session.technology.as_ref().context("no technology loaded")?;
            let plane_id = tech.plane_named(plane).with_context(|| format!("unknown plane {plane:?}"))?;
            let ttype = tech.type_named(ttype).with_context(|| format!("unknown type {ttype:?}"))?;
            let cell_id = script::cell_named(&mut session.library, cell);
            session
                .library
                .def_mut(cell_id)
                .paint_checked(plane_id, script::rect_of(*rect), ttype, &tech.types)?;
            session.note_paint();
            Ok(true)
        }
        Op::Erase { cell, plane, rect } => {
            let tech = session.technology.as_ref().context("no technology loaded")?;
            let plane_id = tech.plane_named(plane).with_context(|| format!("unknown plane {plane:?}"))?;
            let cell_id = script::cell_named(&mut session.library, cell);
            session.library.def_mut(cell_id).erase(plane_id, script::rect_of(*rect))?;
            session.note_erase();
            Ok(true)
        }
        Op::Place { parent, child, orientation, dx, dy } => {
            let parent_id = script::cell_named(&mut session.library, parent);
            let child_id = script::cell_named(&mut session.library, child);
            let transform = core_cell::Transform2D {
                orientation: script::parse_orientation(orientation)?,
                translate: core_tile::Point::new(*dx, *dy),
            };
            session.library.place(parent_id, child_id, transform, None)?;
            Ok(true)
        }
        Op::Check { cell, plane, rect } => {
            let tech = session.technology.take().context("no technology loaded")?;
            let plane_id = tech.plane_named(plane).with_context(|| format!("unknown plane {plane:?}"))?;
            let cell_id = script::cell_named(&mut session.library, cell);
            let rect = script::rect_of(*rect);
            session.enqueue_check(cell_id, rect);

            let mut clean = true;
            let drain_result = (|| -> Result<()> {
                while session.idle_step(|def, r| {
                    match core_drc::basic::basic_check(def, plane_id, &tech, r) {
                        Ok(report) => {
                            let event = core_events::DrcReportEvent::from_report(cell_id, r, &report);
                            if !event.all.is_empty() {
                                clean = false;
                                for v in &event.why_summary {
                                    println!("violation: {} {:?}", v.why, v.rect);
                                }
                            }
                            Ok(())
                        }
                        Err(e) => {
                            tracing::error!(target: "drc", error = %e, "check failed");
                            Ok(())
                        }
                    }
                })? {}
                Ok(())
            })();
            session.technology = Some(tech);
            drain_result?;
            Ok(clean)
        }
        Op::Plow { cell, plane, direction, rect, distance } => {
            let tech = session.technology.take().context("no technology loaded")?;
            let plane_id = tech.plane_named(plane).with_context(|| format!("unknown plane {plane:?}"))?;
            let direction = script::parse_direction(direction)?;
            let cell_id = script::cell_named(&mut session.library, cell);

            let outcome = core_plow::plow(&mut session.library, cell_id, plane_id, &tech, direction, script::rect_of(*rect), *distance);
            session.technology = Some(tech);
            let outcome = outcome?;
            session.note_plow();
            println!("plowed: swept {:?}, {} cell(s) moved", outcome.swept, outcome.cells_moved.len());
            Ok(true)
        }
    }
}

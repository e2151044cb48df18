use std::process::ExitCode;

use brick_engine::{
    build_scenes, layers_are_contiguous, BindContext, BindError, CooperativeScheduler,
    ImageCache, SceneDirectory, SceneGraph, Scheduler, TickReport, Translator,
};
use thiserror::Error;
use tracing::{error, info, warn};

use super::bootstrap::AppWiring;
use super::program_file::{load_program, ProgramFileError};

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error(transparent)]
    ProgramFile(#[from] ProgramFileError),
    #[error("program cannot start: {0}")]
    Bind(#[from] BindError),
}

pub(crate) fn run(app: AppWiring) -> ExitCode {
    match run_program(&app) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "startup_failed");
            ExitCode::FAILURE
        }
    }
}

fn run_program(app: &AppWiring) -> Result<TickReport, AppError> {
    let program = load_program(&app.paths.program_file)?;
    let images = ImageCache::shared();
    let scenes = build_scenes(&program, &images, &app.paths.image_dir)?;

    let ctx = BindContext {
        program: &program,
        scenes: &scenes,
        images,
        image_dir: &app.paths.image_dir,
    };
    let scripts = Translator::with_builtin_bricks().translate_program(&ctx)?;

    let mut scheduler = CooperativeScheduler::new(&app.config);
    for script in scripts {
        scheduler.schedule(script);
    }
    let report = scheduler.run(&app.config);
    report_stages(&scenes);
    Ok(report)
}

fn report_stages(scenes: &SceneDirectory) {
    for scene in scenes.iter() {
        scene.with_graph(|graph| {
            let draw_order = back_to_front(&*graph);
            if layers_are_contiguous(&*graph) {
                info!(scene = scene.name(), ?draw_order, "stage_final_layers");
            } else {
                warn!(scene = scene.name(), ?draw_order, "stage_layers_not_contiguous");
            }
        });
    }
}

// Live sprite ids with their layers, back to front.
fn back_to_front(graph: &dyn SceneGraph) -> Vec<(u32, f64)> {
    let mut order = graph
        .sprite_ids()
        .into_iter()
        .filter_map(|sprite| graph.layer(sprite).map(|layer| (sprite.0, layer)))
        .collect::<Vec<_>>();
    order.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
    order
}

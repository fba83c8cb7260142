//! Headless playback of the sample project.
//!
//! `RUST_LOG=debug cargo run -p vizij-composition-core --example playback`

use vizij_composition_core::{AlwaysReady, EngineConfig, EngineContext, LayerContent};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let json = vizij_test_fixtures::projects::json("sample")?;
    let mut host = AlwaysReady;
    let mut ctx = EngineContext::new(EngineConfig::default());
    ctx.load_project(&json, &mut host)?;
    ctx.play();

    let dt = 1.0 / ctx.playback.fps();
    let frames = (ctx.playback.duration() / dt).ceil() as usize + 2;
    for _ in 0..frames {
        let report = ctx.tick(dt);
        for event in &report.events {
            log::debug!("{event:?}");
        }
        let scene = ctx.render_current(&host)?;
        let summary: Vec<String> = scene
            .layers
            .iter()
            .map(|l| match &l.content {
                LayerContent::ClipFrame {
                    motion, frame_index, ..
                } => format!("{}[{motion}#{frame_index}]", l.name),
                LayerContent::Placeholder { reason } => format!("{}[{reason:?}]", l.name),
                _ => l.name.clone(),
            })
            .collect();
        println!("t={:.3} {}", scene.time, summary.join(" "));
    }
    Ok(())
}

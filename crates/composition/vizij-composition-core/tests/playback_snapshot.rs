use indexmap::IndexMap;
use vizij_composition_core::{
    props, AlwaysReady, AssetId, EngineConfig, EngineContext, FrameRect, KeyValue, LayerContent,
    LayerId, LoadTracker, MotionClip, PlaceholderReason, PlaybackEvent, PlaybackState,
    SceneSnapshot, Vec2,
};

fn approx(a: f64, b: f64) {
    assert!((a - b).abs() < 1e-9, "left={a} right={b}");
}

fn lid(s: &str) -> LayerId {
    LayerId::from(s)
}

fn aid(s: &str) -> AssetId {
    AssetId::from(s)
}

fn sample(host: &mut LoadTracker) -> EngineContext {
    let json = vizij_test_fixtures::projects::json("sample").unwrap();
    let mut ctx = EngineContext::default();
    ctx.load_project(&json, host).unwrap();
    ctx
}

fn ready_sample() -> (EngineContext, LoadTracker) {
    let mut host = LoadTracker::new();
    let ctx = sample(&mut host);
    host.mark_ready(aid("img-hero"), None);
    host.mark_ready(aid("clip-walker"), None);
    (ctx, host)
}

#[test]
fn loading_requests_each_drawn_asset_once() {
    let mut host = LoadTracker::new();
    let _ctx = sample(&mut host);
    let requested: Vec<(&str, &str)> = host
        .requested()
        .iter()
        .map(|(id, src)| (id.as_str(), src.as_str()))
        .collect();
    assert_eq!(
        requested,
        vec![
            ("img-hero", "media/hero.png"),
            ("clip-walker", "media/walker-sheet.png")
        ]
    );
}

#[test]
fn unloaded_assets_render_as_loading_placeholders() {
    let mut host = LoadTracker::new();
    let ctx = sample(&mut host);
    let scene = ctx.render_snapshot(1.0, &host).unwrap();
    for id in ["layer-hero", "layer-walker"] {
        assert_eq!(
            scene.layer(&lid(id)).unwrap().content,
            LayerContent::Placeholder {
                reason: PlaceholderReason::Loading
            },
            "{id}"
        );
    }
}

#[test]
fn snapshot_resolves_transforms_and_draw_order() {
    let (ctx, host) = ready_sample();
    let scene = ctx.render_snapshot(1.0, &host).unwrap();
    assert_eq!((scene.width, scene.height), (640.0, 360.0));

    let order: Vec<&str> = scene.layers.iter().map(|l| l.layer_id.as_str()).collect();
    assert_eq!(order, vec!["layer-hero", "layer-badge", "layer-walker"]);

    let hero = scene.layer(&lid("layer-hero")).unwrap();
    approx(hero.transform.origin.x, 370.0);
    approx(hero.transform.origin.y, 180.0);
    approx(hero.transform.rotation_deg, 90.0);
    assert_eq!(hero.opacity, 1.0);
    assert_eq!(hero.size, Vec2::new(64.0, 48.0));
    assert_eq!(hero.properties[props::ROTATION], KeyValue::Scalar(90.0));

    let walker = scene.layer(&lid("layer-walker")).unwrap();
    approx(walker.transform.origin.x, 370.0);
    approx(walker.transform.origin.y, 230.0);
    approx(walker.transform.rotation_deg, 90.0);
}

#[test]
fn hold_key_keeps_opacity_until_next_key() {
    let (ctx, host) = ready_sample();
    let at = |t: f64| {
        ctx.render_snapshot(t, &host)
            .unwrap()
            .layer(&lid("layer-hero"))
            .unwrap()
            .opacity
    };
    assert_eq!(at(2.9), 1.0);
    assert_eq!(at(3.0), 0.5);
}

#[test]
fn clip_layers_pick_frames_from_selected_motion() {
    let (ctx, host) = ready_sample();
    let walker = |t: f64| {
        ctx.render_snapshot(t, &host)
            .unwrap()
            .layer(&lid("layer-walker"))
            .map(|l| (l.content.clone(), l.size))
    };

    // Clip starts at 0.5s.
    assert_eq!(walker(0.25), None);

    let (content, size) = walker(0.75).unwrap();
    assert_eq!(size, Vec2::new(32.0, 32.0));
    match content {
        LayerContent::ClipFrame {
            motion,
            frame_index,
            frame,
            ..
        } => {
            assert_eq!(motion, "walk");
            assert_eq!(frame_index, 2);
            assert_eq!(frame.x, 64.0);
        }
        other => panic!("expected a clip frame, got {other:?}"),
    }

    let (content, _) = walker(2.5).unwrap();
    assert!(matches!(
        content,
        LayerContent::ClipFrame { ref motion, frame_index: 0, .. } if motion == "idle"
    ));
}

#[test]
fn nested_compositions_render_in_local_time() {
    let (ctx, host) = ready_sample();
    let badge_opacity = |t: f64| {
        let scene = ctx.render_snapshot(t, &host).unwrap();
        let layer = scene.layer(&lid("layer-badge")).unwrap();
        assert_eq!(layer.size, Vec2::new(200.0, 200.0));
        match &layer.content {
            LayerContent::Composition { scene, .. } => {
                scene.layer(&lid("badge-icon")).unwrap().opacity
            }
            other => panic!("expected nested scene, got {other:?}"),
        }
    };
    // The badge layer starts at 1s, so its own 0..1s fade plays over 1..2s.
    assert_eq!(badge_opacity(1.0), 0.0);
    approx(badge_opacity(1.5), 0.5);
    assert_eq!(badge_opacity(2.0), 1.0);
}

fn nesting_depth(scene: &SceneSnapshot) -> usize {
    match scene.layers.first().map(|l| &l.content) {
        Some(LayerContent::Composition { scene, .. }) => 1 + nesting_depth(scene),
        _ => 0,
    }
}

#[test]
fn self_nesting_stops_at_depth_limit() {
    let config = EngineConfig::from_json(
        &vizij_test_fixtures::configs::json("compact-timeline").unwrap(),
    )
    .unwrap();
    assert_eq!(config.max_nesting_depth, 2);
    let mut ctx = EngineContext::new(config);
    let comp = ctx
        .create_composition("Loop", 100.0, 100.0, 1.0, 24.0, None)
        .unwrap();
    ctx.add_layer("Self", &comp).unwrap();
    ctx.sync_active();

    let scene = ctx.render_snapshot(0.0, &AlwaysReady).unwrap();
    assert_eq!(nesting_depth(&scene), 2);

    let mut innermost = &scene;
    while let Some(LayerContent::Composition { scene, .. }) =
        innermost.layers.first().map(|l| &l.content)
    {
        innermost = &**scene;
    }
    assert_eq!(
        innermost.layers[0].content,
        LayerContent::Placeholder {
            reason: PlaceholderReason::NotDrawable
        }
    );
}

#[test]
fn clip_layers_created_from_clip_assets() {
    let mut host = AlwaysReady;
    let mut ctx = EngineContext::default();
    ctx.create_composition("Main", 320.0, 240.0, 2.0, 30.0, None)
        .unwrap();
    let mut motions = IndexMap::new();
    motions.insert(
        "spin".to_string(),
        MotionClip {
            frames: vec![FrameRect { x: 0.0, y: 0.0, w: 16.0, h: 24.0 }; 3],
            fps: 10.0,
            looping: false,
        },
    );
    let clip = ctx
        .create_animation_clip("Spinner", "spin.png", motions, None, &mut host)
        .unwrap();
    let layer = ctx.add_layer("Spinner", &clip).unwrap();

    let fields = ctx
        .active_composition()
        .unwrap()
        .layer(&layer)
        .unwrap()
        .animated_layer_fields
        .clone()
        .unwrap();
    assert_eq!(fields.clip_asset_id, clip);
    assert!(!fields.looping);
    assert_eq!(
        ctx.evaluate(&layer, props::MOTION, 0.0).unwrap(),
        KeyValue::Text("spin".into())
    );

    // Non-looping clips hold their last frame.
    let scene = ctx.render_snapshot(1.5, &host).unwrap();
    assert!(matches!(
        scene.layer(&layer).unwrap().content,
        LayerContent::ClipFrame { frame_index: 2, .. }
    ));

    ctx.upsert_keyframe(&layer, props::MOTION, 1.0, KeyValue::Text("run".into()))
        .unwrap();
    let scene = ctx.render_snapshot(1.5, &host).unwrap();
    assert_eq!(
        scene.layer(&layer).unwrap().content,
        LayerContent::Placeholder {
            reason: PlaceholderReason::UnknownMotion
        }
    );
}

#[test]
fn playback_loops_and_reports_events() {
    let (mut ctx, _) = ready_sample();
    assert_eq!(ctx.playback.state, PlaybackState::Stopped);
    assert_eq!(ctx.play(), Some(PlaybackEvent::Started));
    assert_eq!(ctx.play(), None);

    let report = ctx.tick(1.5);
    assert!(report.errors.is_empty());
    assert_eq!(
        report.events,
        vec![PlaybackEvent::TimeChanged {
            old_time: 0.0,
            new_time: 1.5
        }]
    );

    let report = ctx.tick(3.0);
    assert!(report.events.contains(&PlaybackEvent::Looped));
    assert_eq!(ctx.playback.current_time, 0.0);

    ctx.tick(0.5);
    assert_eq!(ctx.pause(), Some(PlaybackEvent::Paused));
    ctx.tick(1.0);
    assert_eq!(ctx.playback.current_time, 0.5);
}

#[test]
fn seek_snaps_to_composition_frames() {
    let (mut ctx, _) = ready_sample();
    approx(ctx.seek(0.034).unwrap(), 1.0 / 30.0);
    assert_eq!(ctx.seek(99.0).unwrap(), 4.0);
    assert!(ctx.seek(f64::INFINITY).is_err());
}

#[test]
fn context_pick_uses_rendered_sizes() {
    let (ctx, host) = ready_sample();
    // Hero sits at (370, 180) at t=1, rotated 90 degrees: its 64x48 box spans 48 wide, 64 tall.
    assert_eq!(
        ctx.pick(Vec2::new(370.0 + 20.0, 180.0 - 28.0), 1.0, &host)
            .unwrap(),
        Some(lid("layer-hero"))
    );
    assert_eq!(
        ctx.pick(Vec2::new(370.0 + 30.0, 180.0), 1.0, &host).unwrap(),
        None
    );
}

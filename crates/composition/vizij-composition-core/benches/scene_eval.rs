use criterion::{black_box, criterion_group, criterion_main, Criterion};
use vizij_composition_core::{
    props, AlwaysReady, Asset, AssetStore, Composition, EngineConfig, KeyValue, LayerId,
    SceneRenderer, Vec2,
};

/// `count` image layers, each parented to the one above it, with moving keys.
fn build(count: usize) -> (AssetStore, Composition, LayerId) {
    let image = Asset::image("sprite", "sprite.png").with_id("img");
    let mut comp = Composition::new(1920.0, 1080.0, 10.0, 30.0);
    let mut parent: Option<LayerId> = None;
    let mut deepest = None;
    for i in 0..count {
        let id = comp.add_layer(format!("layer-{i}"), image.id.clone()).id.clone();
        for k in 0..8 {
            let t = k as f64;
            comp.upsert_keyframe(&id, props::POSITION, t, KeyValue::Vector2(Vec2::new(t * 10.0, i as f64)))
                .unwrap();
            comp.upsert_keyframe(&id, props::ROTATION, t, KeyValue::Scalar(t * 15.0))
                .unwrap();
        }
        if let Some(p) = parent.take() {
            comp.set_parent(&id, Some(p)).unwrap();
        }
        parent = Some(id.clone());
        deepest = Some(id);
    }
    (AssetStore::from_assets(vec![image]), comp, deepest.unwrap())
}

fn render_snapshot_benchmark(c: &mut Criterion) {
    let config = EngineConfig::default();
    let mut group = c.benchmark_group("render_snapshot");
    for count in [10, 100, 500] {
        let (store, comp, _) = build(count);
        let renderer = SceneRenderer::new(&store, &AlwaysReady, &config);
        group.bench_function(format!("{count}_layers"), |b| {
            b.iter(|| black_box(renderer.render(&comp, black_box(3.3))))
        });
    }
    group.finish();
}

fn resolve_transform_benchmark(c: &mut Criterion) {
    let (_, comp, deepest) = build(100);
    c.bench_function("resolve_transform_depth_100", |b| {
        b.iter(|| black_box(comp.resolve_transform(&deepest, black_box(4.5))))
    });
}

criterion_group!(benches, render_snapshot_benchmark, resolve_transform_benchmark);
criterion_main!(benches);

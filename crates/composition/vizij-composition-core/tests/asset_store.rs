use vizij_composition_core::{
    AlwaysReady, Asset, AssetId, AssetKind, AssetStore, CompositionError, EngineContext,
    LayerContent, PlaceholderReason,
};

fn id(s: &str) -> AssetId {
    AssetId::from(s)
}

/// A ⊃ B ⊃ C
fn nested_folders() -> AssetStore {
    let mut store = AssetStore::new();
    store.add(Asset::folder("A").with_id("A"), None).unwrap();
    store.add(Asset::folder("B").with_id("B"), Some(&id("A"))).unwrap();
    store.add(Asset::folder("C").with_id("C"), Some(&id("B"))).unwrap();
    store
}

#[test]
fn moving_folder_into_its_grandchild_is_a_cycle() {
    let mut store = nested_folders();
    let before = store.clone();
    let err = store.move_to(&id("A"), Some(&id("C"))).unwrap_err();
    assert!(matches!(err, CompositionError::Cycle { .. }));
    assert_eq!(store, before);
}

#[test]
fn every_asset_has_one_parent_after_moves() {
    let mut store = nested_folders();
    store.add(Asset::image("img", "a.png").with_id("img"), Some(&id("C"))).unwrap();
    store.move_to(&id("img"), Some(&id("A"))).unwrap();
    store.move_to(&id("C"), None).unwrap();
    store.move_to(&id("img"), Some(&id("C"))).unwrap();

    let ids: Vec<&str> = store.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, vec!["A", "B", "C", "img"]);
    assert_eq!(
        store.path_to(&id("img")).unwrap(),
        vec![id("C"), id("img")]
    );
}

#[test]
fn unknown_ids_are_reported() {
    let mut store = nested_folders();
    assert!(matches!(
        store.move_to(&id("nope"), None),
        Err(CompositionError::AssetNotFound(_))
    ));
    assert!(matches!(
        store.move_to(&id("A"), Some(&id("nope"))),
        Err(CompositionError::AssetNotFound(_))
    ));
    assert!(matches!(
        store.add(Asset::folder("x"), Some(&id("nope"))),
        Err(CompositionError::AssetNotFound(_))
    ));
}

#[test]
fn remove_detaches_whole_subtree() {
    let mut store = nested_folders();
    let removed = store.remove(&id("B")).unwrap();
    assert_eq!(removed.children().len(), 1);
    assert!(!store.contains(&id("C")));
    assert_eq!(store.iter().count(), 1);
}

#[test]
fn first_composition_is_found_depth_first() {
    let mut store = nested_folders();
    let comp = |name: &str| {
        Asset::composition(name, vizij_composition_core::Composition::new(10.0, 10.0, 1.0, 30.0))
            .with_id(name)
    };
    store.add(comp("root-comp"), None).unwrap();
    store.add(comp("deep-comp"), Some(&id("C"))).unwrap();
    assert_eq!(store.find_first_composition().unwrap().id, id("deep-comp"));
}

#[test]
fn deleting_a_referenced_asset_leaves_a_placeholder() {
    let mut host = AlwaysReady;
    let mut ctx = EngineContext::default();
    ctx.create_composition("Main", 640.0, 360.0, 2.0, 30.0, None).unwrap();
    let folder = ctx.add_folder("Media", None).unwrap();
    let img = ctx.import_image("Hero", "hero.png", Some(&folder), &mut host).unwrap();
    let layer = ctx.add_layer("Hero", &img).unwrap();

    ctx.sync_active();
    assert_eq!(ctx.store().referencing_layers(&img).len(), 1);
    assert!(matches!(
        ctx.store().find(&folder).unwrap().kind,
        AssetKind::Folder { expanded: true, .. }
    ));

    ctx.remove_asset(&img).unwrap();
    let scene = ctx.render_snapshot(0.0, &host).unwrap();
    let snap = scene.layer(&layer).unwrap();
    assert_eq!(
        snap.content,
        LayerContent::Placeholder {
            reason: PlaceholderReason::MissingAsset
        }
    );
    assert_eq!(snap.size, ctx.config.placeholder_size);
}

#[test]
fn removing_the_active_composition_closes_it() {
    let mut ctx = EngineContext::default();
    let comp = ctx
        .create_composition("Main", 640.0, 360.0, 2.0, 30.0, None)
        .unwrap();
    assert_eq!(ctx.active_composition_id(), Some(&comp));
    ctx.remove_asset(&comp).unwrap();
    assert!(ctx.active_composition_id().is_none());
    assert!(matches!(
        ctx.render_snapshot(0.0, &AlwaysReady),
        Err(CompositionError::NoActiveComposition)
    ));
}

//! Integration tests: actions applied to a scene loaded from disk

use std::path::Path;

use layer_stack::{
    apply, format_summary, validate_order, Action, ActionOutcome, Alignment, EngineConfig, Layer,
    Scene, SelectionState, SequentialIds,
};

fn load_board() -> Scene {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/board.toml");
    Scene::from_file(&path).expect("Should load board fixture")
}

fn run(scene: &Scene, selection: &SelectionState, action: Action) -> ActionOutcome {
    let config = EngineConfig::default().with_check_invariants(true);
    let outcome = apply(
        &scene.layers,
        selection,
        action,
        &config,
        &mut SequentialIds::new("copy"),
    );
    assert_eq!(validate_order(&outcome.layers), Ok(()));
    outcome
}

fn find<'a>(layers: &'a [Layer], id: &str) -> &'a Layer {
    layers
        .iter()
        .find(|l| l.id.as_str() == id)
        .expect("Should find layer")
}

#[test]
fn test_board_fixture_loads() {
    let scene = load_board();
    insta::assert_snapshot!(format_summary(&scene.layers, &scene.selection), @r###"
    layers (back to front):
      m1 rectangle frame=f
      m2 ellipse frame=f
      f frame
      a rectangle groups=g
      b diamond groups=g
      note rectangle
      caption text
    selected layers: note
    selected groups: -
    editing group: -
    "###);
}

#[test]
fn test_send_backward_jumps_the_whole_group() {
    let scene = load_board();
    let outcome = run(&scene, &scene.selection, Action::SendBackward);
    assert!(outcome.commit);
    insta::assert_snapshot!(format_summary(&outcome.layers, &outcome.selection), @r###"
    layers (back to front):
      m1 rectangle frame=f
      m2 ellipse frame=f
      f frame
      note rectangle
      caption text
      a rectangle groups=g
      b diamond groups=g
    selected layers: note
    selected groups: -
    editing group: -
    "###);
    assert_eq!(find(&outcome.layers, "note").version, 2);
    assert_eq!(find(&outcome.layers, "caption").version, 2);
    assert_eq!(find(&outcome.layers, "a").version, 1);
}

#[test]
fn test_send_to_back_passes_the_frame_block() {
    let scene = load_board();
    let outcome = run(&scene, &scene.selection, Action::SendToBack);
    insta::assert_snapshot!(format_summary(&outcome.layers, &outcome.selection), @r###"
    layers (back to front):
      note rectangle
      caption text
      m1 rectangle frame=f
      m2 ellipse frame=f
      f frame
      a rectangle groups=g
      b diamond groups=g
    selected layers: note
    selected groups: -
    editing group: -
    "###);
}

#[test]
fn test_bring_forward_at_front_is_not_committed() {
    let scene = load_board();
    let outcome = run(&scene, &scene.selection, Action::BringForward);
    assert!(!outcome.commit);
    assert_eq!(outcome.layers, scene.layers);
    assert_eq!(outcome.selection, scene.selection);
}

#[test]
fn test_bring_to_front_inside_frame() {
    let scene = load_board();
    let selection = scene.select(&["m1"], None).expect("Should select m1");
    let outcome = run(&scene, &selection, Action::BringToFront);
    let order: Vec<&str> = outcome.layers.iter().map(|l| l.id.as_str()).collect();
    assert_eq!(order, vec!["m2", "m1", "f", "a", "b", "note", "caption"]);
}

#[test]
fn test_duplicate_keeps_caption_with_its_container() {
    let scene = load_board();
    let outcome = run(&scene, &scene.selection, Action::Duplicate);
    insta::assert_snapshot!(format_summary(&outcome.layers, &outcome.selection), @r###"
    layers (back to front):
      m1 rectangle frame=f
      m2 ellipse frame=f
      f frame
      a rectangle groups=g
      b diamond groups=g
      note rectangle
      caption text
      copy-1 rectangle
      copy-2 text
    selected layers: copy-1
    selected groups: -
    editing group: -
    "###);

    let caption_copy = find(&outcome.layers, "copy-2");
    assert_eq!(caption_copy.container_id().map(|c| c.as_str()), Some("copy-1"));
    assert_eq!(caption_copy.x, 315.0);
    assert_eq!(find(&outcome.layers, "copy-1").bound_text_id().map(|t| t.as_str()), Some("copy-2"));
}

#[test]
fn test_group_nests_existing_group() {
    let scene = load_board();
    let selection = scene.select(&["a", "note"], None).expect("Should select");
    assert!(selection.is_group_selected(&"g".into()));

    let outcome = run(&scene, &selection, Action::Group);
    insta::assert_snapshot!(format_summary(&outcome.layers, &outcome.selection), @r###"
    layers (back to front):
      m1 rectangle frame=f
      m2 ellipse frame=f
      f frame
      a rectangle groups=g>copy-1
      b diamond groups=g>copy-1
      note rectangle groups=copy-1
      caption text groups=copy-1
    selected layers: a, b, caption, note
    selected groups: copy-1
    editing group: -
    "###);

    let ungrouped = run(
        &Scene {
            layers: outcome.layers.clone(),
            selection: outcome.selection.clone(),
        },
        &outcome.selection,
        Action::Ungroup,
    );
    for (before, after) in scene.layers.iter().zip(&ungrouped.layers) {
        assert_eq!(before.group_ids, after.group_ids);
    }
}

#[test]
fn test_align_top_moves_caption_with_note() {
    let scene = load_board();
    let selection = scene.select(&["a", "note"], None).expect("Should select");
    let outcome = run(&scene, &selection, Action::Align(Alignment::top()));
    assert!(outcome.commit);
    assert_eq!(find(&outcome.layers, "note").y, 0.0);
    assert_eq!(find(&outcome.layers, "caption").y, 5.0);
    assert_eq!(find(&outcome.layers, "a").version, 1);
    assert_eq!(outcome.selection, selection);
}

use super::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct TestShape {
    id: Uuid,
    label: String,
}

impl TestShape {
    fn new(label: &str) -> Self {
        Self { id: Uuid::new_v4(), label: label.to_owned() }
    }

    fn relabeled(&self, label: &str) -> Self {
        Self { id: self.id, label: label.to_owned() }
    }
}

impl Drawable for TestShape {
    fn drawable_id(&self) -> Uuid {
        self.id
    }
}

/// Stand-in for the external drawable codec.
struct JsonShapeCodec;

impl DrawableCodec for JsonShapeCodec {
    type Drawable = TestShape;
    type Error = serde_json::Error;

    fn encode(&self, drawables: &[TestShape]) -> Vec<u8> {
        serde_json::to_vec(drawables).unwrap_or_default()
    }

    fn decode(&self, bytes: &[u8]) -> Result<Vec<TestShape>, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

fn store() -> PageStore<JsonShapeCodec> {
    PageStore::new(JsonShapeCodec)
}

fn labels(store: &PageStore<JsonShapeCodec>, page: u32) -> Vec<String> {
    store
        .page(page)
        .expect("page")
        .drawables
        .iter()
        .map(|d| d.label.clone())
        .collect()
}

#[test]
fn new_store_has_one_default_page() {
    let store = store();
    assert_eq!(store.page_count(), 1);
    let page = store.page(0).expect("page 0");
    assert!(page.drawables.is_empty());
    assert!((page.grid_spacing - DEFAULT_GRID_SPACING).abs() < f32::EPSILON);
    assert!(page.grid_visible);
}

#[test]
fn add_objects_applies_locally_and_yields_one_envelope() {
    let mut local = store();
    let mut remote = store();

    let envelope = local
        .add_objects(0, vec![TestShape::new("circle"), TestShape::new("cone")])
        .expect("page 0 exists");
    assert_eq!(envelope.action, Action::AddObjects);
    assert_eq!(labels(&local, 0), vec!["circle", "cone"]);

    remote.apply(&envelope).expect("apply");
    assert_eq!(labels(&remote, 0), labels(&local, 0));
}

#[test]
fn update_objects_replaces_by_id_and_ignores_unknown_ids() {
    let mut store = store();
    let shape = TestShape::new("before");
    store.add_objects(0, vec![shape.clone()]).expect("add");

    let stranger = TestShape::new("never seen");
    let envelope = Envelope::new(
        0,
        Action::UpdateObjects,
        JsonShapeCodec.encode(&[shape.relabeled("after"), stranger]),
    );
    store.apply(&envelope).expect("apply");

    assert_eq!(labels(&store, 0), vec!["after"]);
}

#[test]
fn last_write_wins_is_order_sensitive() {
    let shape = TestShape::new("original");
    let a = Envelope::new(0, Action::UpdateObjects, JsonShapeCodec.encode(&[shape.relabeled("A")]));
    let b = Envelope::new(0, Action::UpdateObjects, JsonShapeCodec.encode(&[shape.relabeled("B")]));

    // A then B equals applying B alone.
    let mut ab = store();
    ab.add_objects(0, vec![shape.clone()]).expect("add");
    ab.apply(&a).expect("apply A");
    ab.apply(&b).expect("apply B");

    let mut b_only = store();
    b_only.add_objects(0, vec![shape.clone()]).expect("add");
    b_only.apply(&b).expect("apply B");

    assert_eq!(labels(&ab, 0), labels(&b_only, 0));
    assert_eq!(labels(&ab, 0), vec!["B"]);

    // Reversed order produces a different result. Expected, not a bug.
    let mut ba = store();
    ba.add_objects(0, vec![shape.clone()]).expect("add");
    ba.apply(&b).expect("apply B");
    ba.apply(&a).expect("apply A");
    assert_eq!(labels(&ba, 0), vec!["A"]);
}

#[test]
fn delete_objects_removes_by_id() {
    let mut store = store();
    let keep = TestShape::new("keep");
    let drop = TestShape::new("drop");
    store.add_objects(0, vec![keep.clone(), drop.clone()]).expect("add");

    let envelope = Envelope::new(0, Action::DeleteObjects, wire::encode_object_ids(&[drop.id]));
    store.apply(&envelope).expect("apply");

    assert_eq!(labels(&store, 0), vec!["keep"]);
}

#[test]
fn clear_page_empties_regardless_of_prior_contents() {
    let mut store = store();
    store
        .add_objects(0, vec![TestShape::new("a"), TestShape::new("b"), TestShape::new("c")])
        .expect("add");

    store.apply(&Envelope::clear_page(0)).expect("apply");
    assert!(store.page(0).expect("page").drawables.is_empty());
}

#[test]
fn replace_page_discards_prior_contents() {
    let mut store = store();
    store.add_objects(0, vec![TestShape::new("old")]).expect("add");

    let envelope = Envelope::new(
        0,
        Action::ReplacePage,
        JsonShapeCodec.encode(&[TestShape::new("new")]),
    );
    store.apply(&envelope).expect("apply");
    assert_eq!(labels(&store, 0), vec!["new"]);
}

#[test]
fn update_grid_sets_exact_spacing_on_addressed_page() {
    let mut store = store();
    store.apply(&Envelope::add_new_page(1)).expect("apply");
    store.apply(&Envelope::add_new_page(2)).expect("apply");

    store.apply(&Envelope::update_grid(2, 25.0)).expect("apply");

    assert!((store.page(2).expect("page 2").grid_spacing - 25.0).abs() < f32::EPSILON);
    // Other pages untouched.
    assert!((store.page(0).expect("page 0").grid_spacing - DEFAULT_GRID_SPACING).abs() < f32::EPSILON);
}

#[test]
fn update_grid_visibility_toggles_flag() {
    let mut store = store();
    store
        .apply(&Envelope::update_grid_visibility(0, false))
        .expect("apply");
    assert!(!store.page(0).expect("page").grid_visible);
}

#[test]
fn unknown_page_index_is_a_graceful_no_op() {
    let mut store = store();
    store.add_objects(0, vec![TestShape::new("kept")]).expect("add");

    let envelope = Envelope::new(
        99,
        Action::AddObjects,
        JsonShapeCodec.encode(&[TestShape::new("lost")]),
    );
    store.apply(&envelope).expect("unknown page must not error");
    store.apply(&Envelope::clear_page(42)).expect("unknown page must not error");
    store.apply(&Envelope::delete_page(42)).expect("unknown page must not error");

    assert_eq!(store.page_count(), 1);
    assert_eq!(labels(&store, 0), vec!["kept"]);
}

#[test]
fn malformed_drawable_data_errors_without_mutating() {
    let mut store = store();
    store.add_objects(0, vec![TestShape::new("kept")]).expect("add");

    let envelope = Envelope::new(0, Action::AddObjects, b"not json".to_vec());
    let err = store.apply(&envelope).expect_err("garbage must not apply");
    assert!(matches!(err, ApplyError::Drawable(_)));
    assert_eq!(labels(&store, 0), vec!["kept"]);

    let envelope = Envelope::new(0, Action::DeleteObjects, vec![0; 5]);
    let err = store.apply(&envelope).expect_err("ragged id set must not apply");
    assert!(matches!(err, ApplyError::Codec(CodecError::InvalidIdSet(5))));
}

#[test]
fn add_and_delete_page_reshape_the_document() {
    let mut store = store();
    store.add_objects(0, vec![TestShape::new("page zero")]).expect("add");

    // Insert before page 0: old content shifts to index 1.
    store.apply(&Envelope::add_new_page(0)).expect("apply");
    assert_eq!(store.page_count(), 2);
    assert!(store.page(0).expect("page 0").drawables.is_empty());
    assert_eq!(labels(&store, 1), vec!["page zero"]);

    store.apply(&Envelope::delete_page(0)).expect("apply");
    assert_eq!(store.page_count(), 1);
    assert_eq!(labels(&store, 0), vec!["page zero"]);
}

#[test]
fn undo_is_local_until_shared() {
    let mut local = store();
    let mut remote = store();

    let envelope = local.add_objects(0, vec![TestShape::new("survives")]).expect("add");
    remote.apply(&envelope).expect("apply");

    let checkpoint = local.snapshot(0).expect("snapshot");
    let envelope = local.add_objects(0, vec![TestShape::new("mistake")]).expect("add");
    remote.apply(&envelope).expect("apply");

    // Undo locally: no envelope exists, so the peer still sees the mistake.
    assert!(local.restore(0, checkpoint));
    assert_eq!(labels(&local, 0), vec!["survives"]);
    assert_eq!(labels(&remote, 0), vec!["survives", "mistake"]);

    // Sharing the revert is an explicit full-page replace.
    let share = local.share_page(0).expect("share");
    assert_eq!(share.action, Action::ReplacePage);
    remote.apply(&share).expect("apply");
    assert_eq!(labels(&remote, 0), vec!["survives"]);
}

#[test]
fn local_edit_on_unknown_page_mutates_nothing_and_sends_nothing() {
    let mut store = store();
    assert!(store.add_objects(7, vec![TestShape::new("x")]).is_none());
    assert!(store.clear_page(7).is_none());
    assert!(store.set_grid_spacing(7, 10.0).is_none());
    assert!(store.remove_page(7).is_none());
    assert_eq!(store.page_count(), 1);
}

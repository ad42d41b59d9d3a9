//! View semantics: forking, isolation, time resolution, and the
//! consumer-facing object API.

use ndl_core::LATEST;
use ndl_db::{Database, MemoryFetcher};
use std::sync::Arc;

fn load(files: &[(&str, &str)]) -> Arc<Database> {
    let mut fetcher = MemoryFetcher::new();
    for (name, content) in files {
        fetcher.insert(*name, *content);
    }
    Database::load(files[0].0, &fetcher).expect("load should succeed")
}

const PATCHABLE: &str = "A():\n    hp : int = 10\nBuff<A>():\n    hp += 5\n";

#[test]
fn fork_isolation_child_patch_invisible_in_parent() {
    let db = load(&[("game.ndl", PATCHABLE)]);
    let parent = db.new_view();
    let child = parent.fork();

    let t1 = child.apply_patch("game.Buff").unwrap();

    assert_eq!(
        child.get("game.A").unwrap().get_int("hp", t1).unwrap(),
        15
    );
    // the parent never sees the child's commit, at any time
    let parent_a = parent.get("game.A").unwrap();
    assert_eq!(parent_a.get_int("hp", LATEST).unwrap(), 10);
    assert_eq!(parent_a.get_int("hp", t1).unwrap(), 10);
    assert_eq!(parent.current_t(), 0);
}

#[test]
fn fork_isolation_parent_patch_invisible_in_child() {
    let db = load(&[("game.ndl", PATCHABLE)]);
    let parent = db.new_view();
    let child = parent.fork();

    let t1 = parent.apply_patch("game.Buff").unwrap();

    assert_eq!(parent.get("game.A").unwrap().get_int("hp", t1).unwrap(), 15);
    // the child is pinned to the fork point
    let child_a = child.get("game.A").unwrap();
    assert_eq!(child_a.get_int("hp", LATEST).unwrap(), 10);
    assert_eq!(child_a.get_int("hp", t1).unwrap(), 10);
}

#[test]
fn fork_sees_state_up_to_the_fork_point() {
    let db = load(&[("game.ndl", PATCHABLE)]);
    let parent = db.new_view();
    let t1 = parent.apply_patch("game.Buff").unwrap();

    let child = parent.fork();
    let child_a = child.get("game.A").unwrap();
    // history up to the fork is shared
    assert_eq!(child_a.get_int("hp", t1).unwrap(), 15);
    assert_eq!(child_a.get_int("hp", 0).unwrap(), 10);

    // both sides continue independently from there
    let t2 = child.apply_patch("game.Buff").unwrap();
    assert_eq!(child_a.get_int("hp", t2).unwrap(), 20);
    assert_eq!(parent.get("game.A").unwrap().get_int("hp", LATEST).unwrap(), 15);
}

#[test]
fn query_consistency_under_repetition() {
    let db = load(&[("game.ndl", PATCHABLE)]);
    let view = db.new_view();
    let a = view.get("game.A").unwrap();

    // repeated queries at a fixed time return the same value, cached or
    // not, across an unrelated later commit
    assert_eq!(a.get_int("hp", 0).unwrap(), 10);
    let t1 = view.apply_patch("game.Buff").unwrap();
    assert_eq!(a.get_int("hp", 0).unwrap(), 10);
    for _ in 0..3 {
        assert_eq!(a.get_int("hp", t1).unwrap(), 15);
    }
}

#[test]
fn latest_tracks_the_view_clock() {
    let db = load(&[("game.ndl", PATCHABLE)]);
    let view = db.new_view();
    let a = view.get("game.A").unwrap();

    assert_eq!(a.get_int("hp", LATEST).unwrap(), 10);
    view.apply_patch("game.Buff").unwrap();
    assert_eq!(a.get_int("hp", LATEST).unwrap(), 15);
}

#[test]
fn queries_beyond_the_clock_see_the_latest_state() {
    let db = load(&[("game.ndl", PATCHABLE)]);
    let view = db.new_view();
    let a = view.get("game.A").unwrap();
    assert_eq!(a.get_int("hp", 1_000_000).unwrap(), 10);

    let t1 = view.apply_patch("game.Buff").unwrap();
    assert_eq!(a.get_int("hp", t1 + 100).unwrap(), 15);
}

#[test]
fn object_api_surface() {
    let source = "\
Unit():
    hp : int = 10
Knight(Unit):
    hp = 20
Buff<Knight>():
    hp += 1
";
    let db = load(&[("game.ndl", source)]);
    let view = db.new_view();

    let knight = view.get("game.Knight").unwrap();
    assert_eq!(knight.name().as_str(), "game.Knight");
    assert!(knight.has("hp", LATEST).unwrap());
    assert!(!knight.has("mana", LATEST).unwrap());
    assert!(knight.extends("game.Unit", LATEST).unwrap());
    assert!(knight.extends("game.Knight", LATEST).unwrap());
    assert!(!knight.extends("game.Buff", LATEST).unwrap());
    assert!(!knight.is_patch());
    assert!(knight.target().is_none());

    let parents: Vec<String> = knight
        .parents(LATEST)
        .unwrap()
        .iter()
        .map(|f| f.to_string())
        .collect();
    assert_eq!(parents, ["game.Unit"]);

    let buff = view.get("game.Buff").unwrap();
    assert!(buff.is_patch());
    assert_eq!(buff.target().unwrap().as_str(), "game.Knight");
}

#[test]
fn unknown_object_and_member_are_api_errors() {
    let db = load(&[("game.ndl", "A():\n    hp : int = 10\n")]);
    let view = db.new_view();

    let err = view.get("game.Ghost").unwrap_err();
    assert!(err.to_string().contains("unknown object"), "{err}");

    let a = view.get("game.A").unwrap();
    let err = a.value("ghost", LATEST).unwrap_err();
    assert!(err.to_string().contains("has no member"), "{err}");
}

#[test]
fn typed_accessor_mismatch_is_an_api_error() {
    let db = load(&[("game.ndl", "A():\n    hp : int = 10\n")]);
    let view = db.new_view();
    let a = view.get("game.A").unwrap();

    let err = a.get_text("hp", LATEST).unwrap_err();
    assert!(err.to_string().contains("expected text"), "{err}");
    assert_eq!(a.get_int("hp", LATEST).unwrap(), 10);
}

#[test]
fn views_share_the_database_but_not_the_clock() {
    let db = load(&[("game.ndl", PATCHABLE)]);
    let one = db.new_view();
    let two = db.new_view();

    one.apply_patch("game.Buff").unwrap();
    assert_eq!(one.get("game.A").unwrap().get_int("hp", LATEST).unwrap(), 15);
    assert_eq!(two.get("game.A").unwrap().get_int("hp", LATEST).unwrap(), 10);
    assert_eq!(two.current_t(), 0);
}

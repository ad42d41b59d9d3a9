//! Runtime patch application: time travel, inheritance patching,
//! rejection, nested patches, and subscriptions.

use ndl_core::{Value, LATEST};
use ndl_db::{Database, MemoryFetcher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn load(files: &[(&str, &str)]) -> Arc<Database> {
    let mut fetcher = MemoryFetcher::new();
    for (name, content) in files {
        fetcher.insert(*name, *content);
    }
    Database::load(files[0].0, &fetcher).expect("load should succeed")
}

#[test]
fn patch_at_runtime_with_time_travel() {
    let source = "A():\n    hp : int = 10\nBuff<A>():\n    hp += 5\n";
    let db = load(&[("game.ndl", source)]);
    let view = db.new_view();
    let a = view.get("game.A").unwrap();

    let t0 = view.current_t();
    assert_eq!(a.get_int("hp", t0).unwrap(), 10);

    let t1 = view.apply_patch("game.Buff").unwrap();
    assert!(t1 > t0);
    assert_eq!(a.get_int("hp", t1).unwrap(), 15);
    assert_eq!(a.get_int("hp", LATEST).unwrap(), 15);
    // the past is unchanged
    assert_eq!(a.get_int("hp", t0).unwrap(), 10);
}

#[test]
fn reapplying_a_patch_keeps_taking_effect() {
    let source = "A():\n    hp : int = 10\nBuff<A>():\n    hp += 5\n";
    let db = load(&[("game.ndl", source)]);
    let view = db.new_view();
    let a = view.get("game.A").unwrap();

    view.apply_patch("game.Buff").unwrap();
    assert_eq!(a.get_int("hp", LATEST).unwrap(), 15);
    view.apply_patch("game.Buff").unwrap();
    assert_eq!(a.get_int("hp", LATEST).unwrap(), 20);
}

#[test]
fn patch_overrides_descendant_values_too() {
    let source = "A():\n    hp : int = 10\nB(A):\n    hp += 1\nBuff<A>():\n    hp += 5\n";
    let db = load(&[("game.ndl", source)]);
    let view = db.new_view();
    let b = view.get("game.B").unwrap();

    assert_eq!(b.get_int("hp", LATEST).unwrap(), 11);
    view.apply_patch("game.Buff").unwrap();
    // A now folds to 15, B adds 1 on top
    assert_eq!(b.get_int("hp", LATEST).unwrap(), 16);
}

#[test]
fn inheritance_patching() {
    let source = "Mixin():\n    bonus : int = 3\nKnight():\n    hp : int = 10\nPromote<Knight>[+Mixin]():\n    pass\n";
    let db = load(&[("game.ndl", source)]);
    let view = db.new_view();
    let knight = view.get("game.Knight").unwrap();

    assert!(!knight.extends("game.Mixin", LATEST).unwrap());
    assert!(knight.value("bonus", LATEST).is_err());

    let t1 = view.apply_patch("game.Promote").unwrap();

    assert!(knight.extends("game.Mixin", t1).unwrap());
    assert_eq!(knight.get_int("bonus", t1).unwrap(), 3);
    let lin: Vec<String> = knight
        .linearized(t1)
        .unwrap()
        .iter()
        .map(|f| f.to_string())
        .collect();
    assert_eq!(lin, ["game.Knight", "game.Mixin"]);

    // before the commit the hierarchy is the old one
    assert!(!knight.extends("game.Mixin", t1 - 1).unwrap());
}

#[test]
fn conflicting_inheritance_patch_is_rejected_atomically() {
    let source = "\
Base1():
    pass
Base2():
    pass
Child(Base1, Base2):
    hp : int = 1
Evil(Base2, Base1):
    pass
Conflict<Child>[+Evil]():
    pass
";
    let db = load(&[("game.ndl", source)]);
    let view = db.new_view();
    let child = view.get("game.Child").unwrap();

    let t0 = view.current_t();
    let err = view.apply_patch("game.Conflict").unwrap_err();
    assert!(err.to_string().contains("patch rejected"), "{err}");

    // nothing changed
    assert_eq!(view.current_t(), t0);
    assert_eq!(child.get_int("hp", LATEST).unwrap(), 1);
    assert_eq!(
        child.parents(LATEST).unwrap().len(),
        2,
        "parents must be untouched after a rejected patch"
    );
}

#[test]
fn applying_a_non_patch_is_rejected() {
    let db = load(&[("game.ndl", "A():\n    pass\n")]);
    let view = db.new_view();
    let err = view.apply_patch("game.A").unwrap_err();
    assert!(err.to_string().contains("is not a patch"), "{err}");
}

#[test]
fn patches_can_be_patched() {
    let source = "\
A():
    hp : int = 10
Buff<A>():
    hp += 5
Stronger<Buff>():
    hp += 7
";
    let db = load(&[("game.ndl", source)]);
    let view = db.new_view();
    let a = view.get("game.A").unwrap();
    let buff = view.get("game.Buff").unwrap();
    assert!(buff.is_patch());
    assert_eq!(buff.target().unwrap().as_str(), "game.A");

    // strengthen the buff, then apply it
    view.apply_patch("game.Stronger").unwrap();
    view.apply_patch("game.Buff").unwrap();
    assert_eq!(a.get_int("hp", LATEST).unwrap(), 22);
}

#[test]
fn set_member_patch() {
    let source = "A():\n    tags : set(text) = {\"x\"}\nTagger<A>():\n    tags |= {\"y\"}\n";
    let db = load(&[("game.ndl", source)]);
    let view = db.new_view();
    view.apply_patch("game.Tagger").unwrap();

    let tags = view.get("game.A").unwrap().get_set("tags", LATEST).unwrap();
    let expected: hashbrown::HashSet<Value> =
        ["x", "y"].iter().map(|v| Value::Text(Arc::from(*v))).collect();
    assert_eq!(tags, expected);
}

#[test]
fn subscriptions_fire_for_target_and_descendants() {
    let source = "A():\n    hp : int = 10\nB(A):\n    pass\nBuff<A>():\n    hp += 5\n";
    let db = load(&[("game.ndl", source)]);
    let view = db.new_view();

    let fired = Arc::new(AtomicUsize::new(0));
    let fired_cb = fired.clone();
    let b = view.get("game.B").unwrap();
    let handle = b.subscribe(move |_t, _affected| {
        fired_cb.fetch_add(1, Ordering::SeqCst);
    });

    view.apply_patch("game.Buff").unwrap();
    assert_eq!(fired.load(Ordering::SeqCst), 1, "descendant must be notified");

    // dropping the handle unregisters
    drop(handle);
    view.apply_patch("game.Buff").unwrap();
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

#[test]
fn subscriptions_do_not_fire_for_unrelated_objects() {
    let source = "A():\n    hp : int = 10\nOther():\n    pass\nBuff<A>():\n    hp += 5\n";
    let db = load(&[("game.ndl", source)]);
    let view = db.new_view();

    let fired = Arc::new(AtomicUsize::new(0));
    let fired_cb = fired.clone();
    let other = view.get("game.Other").unwrap();
    let _handle = other.subscribe(move |_t, _affected| {
        fired_cb.fetch_add(1, Ordering::SeqCst);
    });

    view.apply_patch("game.Buff").unwrap();
    assert_eq!(fired.load(Ordering::SeqCst), 0);
}

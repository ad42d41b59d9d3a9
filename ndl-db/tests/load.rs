//! End-to-end load pipeline tests: inheritance, type resolution,
//! value composition, and load-time failures.

use ndl_core::{Value, LATEST};
use ndl_db::{Database, MemoryFetcher};
use std::sync::Arc;

fn try_load(files: &[(&str, &str)]) -> ndl_db::Result<Arc<Database>> {
    let mut fetcher = MemoryFetcher::new();
    for (name, content) in files {
        fetcher.insert(*name, *content);
    }
    Database::load(files[0].0, &fetcher)
}

fn load(files: &[(&str, &str)]) -> Arc<Database> {
    try_load(files).expect("load should succeed")
}

fn texts(values: &[&str]) -> hashbrown::HashSet<Value> {
    values
        .iter()
        .map(|v| Value::Text(Arc::from(*v)))
        .collect()
}

#[test]
fn inheritance_override() {
    let db = load(&[(
        "game.ndl",
        "A():\n    hp : int = 10\nB(A):\n    hp = 20\n",
    )]);
    let view = db.new_view();

    let a = view.get("game.A").unwrap();
    let b = view.get("game.B").unwrap();
    assert_eq!(a.get_int("hp", LATEST).unwrap(), 10);
    assert_eq!(b.get_int("hp", LATEST).unwrap(), 20);

    let lin: Vec<String> = b
        .linearized(LATEST)
        .unwrap()
        .iter()
        .map(|f| f.to_string())
        .collect();
    assert_eq!(lin, ["game.B", "game.A"]);
}

#[test]
fn set_composition() {
    let db = load(&[(
        "game.ndl",
        "A():\n    tags : set(text) = {\"x\"}\nB(A):\n    tags += {\"y\"}\n",
    )]);
    let view = db.new_view();

    let a_tags = view.get("game.A").unwrap().get_set("tags", LATEST).unwrap();
    assert_eq!(a_tags, texts(&["x"]));

    let b_tags = view.get("game.B").unwrap().get_set("tags", LATEST).unwrap();
    assert_eq!(b_tags, texts(&["x", "y"]));
}

#[test]
fn diamond_c3() {
    let source = "A():\n    x : int = 1\nB(A):\n    x = 2\nC(A):\n    x = 3\nD(B, C):\n    pass\n";
    let db = load(&[("game.ndl", source)]);
    let view = db.new_view();
    let d = view.get("game.D").unwrap();

    let lin: Vec<String> = d
        .linearized(LATEST)
        .unwrap()
        .iter()
        .map(|f| f.to_string())
        .collect();
    assert_eq!(lin, ["game.D", "game.B", "game.C", "game.A"]);
    assert_eq!(d.get_int("x", LATEST).unwrap(), 2);
}

#[test]
fn type_conflict_between_unrelated_ancestors() {
    let source = "A():\n    m : int = 1\nB():\n    m : int = 2\nC(A, B):\n    pass\n";
    let err = try_load(&[("game.ndl", source)]).unwrap_err();
    assert!(
        err.to_string().contains("already defines type of 'm'"),
        "{err}"
    );
}

#[test]
fn member_type_from_unique_ancestor() {
    // B redefines without a type; the type handle comes from A.
    let source = "A():\n    speed : float = 1.5\nB(A):\n    speed = 3\n";
    let db = load(&[("game.ndl", source)]);
    let view = db.new_view();
    assert_eq!(
        view.get("game.B").unwrap().get_float("speed", LATEST).unwrap(),
        3.0
    );
}

#[test]
fn no_type_anywhere_fails() {
    let err = try_load(&[("game.ndl", "A():\n    hp = 10\n")]).unwrap_err();
    assert!(
        err.to_string().contains("no parent defines the type of 'hp'"),
        "{err}"
    );
}

#[test]
fn imports_and_aliases() {
    let units = "import game.tech as tech\n\nKnight(tech.Mounted):\n    hp : int = 40\n";
    let tech = "Mounted():\n    speed : float = 2.0\n";
    let db = load(&[("game/units.ndl", units), ("game/tech.ndl", tech)]);
    let view = db.new_view();

    let knight = view.get("game.units.Knight").unwrap();
    assert!(knight.extends("game.tech.Mounted", LATEST).unwrap());
    assert_eq!(knight.get_float("speed", LATEST).unwrap(), 2.0);
}

#[test]
fn nested_objects_and_sibling_references() {
    let source = "Outer():\n    Inner():\n        x : int = 1\nUser():\n    friend : Outer.Inner = Outer.Inner\n";
    let db = load(&[("game.ndl", source)]);
    let view = db.new_view();

    let inner = view.get("game.Outer.Inner").unwrap();
    assert_eq!(inner.get_int("x", LATEST).unwrap(), 1);

    let user = view.get("game.User").unwrap();
    let friend = user.get_object("friend", LATEST).unwrap();
    assert_eq!(friend.name().as_str(), "game.Outer.Inner");
}

#[test]
fn missing_import_is_located() {
    let err = try_load(&[("game.ndl", "import missing.ns\n\nA():\n    pass\n")]).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("missing/ns.ndl"), "{message}");
    assert!(message.contains("game.ndl:1:8"), "{message}");
}

#[test]
fn unknown_parent_fails() {
    let err = try_load(&[("game.ndl", "A(Ghost):\n    pass\n")]).unwrap_err();
    assert!(err.to_string().contains("cannot resolve 'Ghost'"), "{err}");
}

#[test]
fn duplicate_object_fails() {
    let err = try_load(&[("game.ndl", "A():\n    pass\nA():\n    pass\n")]).unwrap_err();
    assert!(err.to_string().contains("already defined"), "{err}");
}

#[test]
fn object_name_conflicting_with_alias_fails() {
    let files = [
        ("game.ndl", "import game.tech as T\n\nT():\n    pass\n"),
        ("game/tech.ndl", "X():\n    pass\n"),
    ];
    let err = try_load(&files).unwrap_err();
    assert!(err.to_string().contains("conflicts with an import alias"), "{err}");
}

#[test]
fn neutral_element_starts_the_fold() {
    // No ancestor assigns tags; the empty set is the neutral root.
    let source = "A():\n    tags : set(text)\nB(A):\n    tags += {\"x\"}\n";
    let db = load(&[("game.ndl", source)]);
    let view = db.new_view();
    assert_eq!(
        view.get("game.B").unwrap().get_set("tags", LATEST).unwrap(),
        texts(&["x"])
    );
}

#[test]
fn non_assign_root_without_neutral_fails_at_query() {
    let source = "A():\n    flag : bool |= True\n";
    let db = load(&[("game.ndl", source)]);
    let view = db.new_view();
    let err = view.get("game.A").unwrap().value("flag", LATEST).unwrap_err();
    assert!(err.to_string().contains("no neutral element"), "{err}");
}

#[test]
fn object_ref_must_extend_required_type() {
    let good = "Unit():\n    pass\nKnight(Unit):\n    pass\nArmy():\n    leader : Unit = Knight\n";
    let db = load(&[("game.ndl", good)]);
    let view = db.new_view();
    let leader = view.get("game.Army").unwrap().get_object("leader", LATEST).unwrap();
    assert_eq!(leader.name().as_str(), "game.Knight");

    let bad = "Unit():\n    pass\nRock():\n    pass\nArmy():\n    leader : Unit = Rock\n";
    let err = try_load(&[("game.ndl", bad)]).unwrap_err();
    assert!(err.to_string().contains("does not extend"), "{err}");
}

#[test]
fn file_member() {
    let db = load(&[("game.ndl", "A():\n    icon : file = \"sprites/a.png\"\n")]);
    let view = db.new_view();
    assert_eq!(
        view.get("game.A").unwrap().get_file("icon", LATEST).unwrap().as_ref(),
        "sprites/a.png"
    );
}

#[test]
fn int_literal_for_float_member() {
    let db = load(&[("game.ndl", "A():\n    speed : float = 2\n")]);
    let view = db.new_view();
    assert_eq!(view.get("game.A").unwrap().get_float("speed", LATEST).unwrap(), 2.0);
}

#[test]
fn ordered_set_member_keeps_order() {
    let db = load(&[("game.ndl", "A():\n    seq : orderedset(int) = <3, 1, 2>\n")]);
    let view = db.new_view();
    let seq = view.get("game.A").unwrap().get_ordered_set("seq", LATEST).unwrap();
    let order: Vec<i64> = seq.iter().map(|v| v.as_int().unwrap()).collect();
    assert_eq!(order, [3, 1, 2]);
}

#[test]
fn ordered_set_intersection_via_inheritance() {
    let source =
        "A():\n    seq : orderedset(int) = <1, 2, 3, 4>\nB(A):\n    seq &= <4, 2, 5>\n";
    let db = load(&[("game.ndl", source)]);
    let view = db.new_view();
    let seq = view.get("game.B").unwrap().get_ordered_set("seq", LATEST).unwrap();
    let order: Vec<i64> = seq.iter().map(|v| v.as_int().unwrap()).collect();
    assert_eq!(order, [2, 4]);
}

#[test]
fn text_concat_via_inheritance() {
    let source = "A():\n    title : text = \"kni\"\nB(A):\n    title += \"ght\"\n";
    let db = load(&[("game.ndl", source)]);
    let view = db.new_view();
    assert_eq!(
        view.get("game.B").unwrap().get_text("title", LATEST).unwrap().as_ref(),
        "knight"
    );
}

#[test]
fn operator_not_allowed_for_type_fails() {
    let err = try_load(&[("game.ndl", "A():\n    name : text -= \"x\"\n")]).unwrap_err();
    assert!(err.to_string().contains("not allowed"), "{err}");
}

#[test]
fn nested_container_type_fails() {
    let err = try_load(&[("game.ndl", "A():\n    m : set(set(int)) = {}\n")]).unwrap_err();
    assert!(err.to_string().contains("container"), "{err}");
}

#[test]
fn declared_but_never_valued_member() {
    let db = load(&[("game.ndl", "A():\n    hp : int\n")]);
    let view = db.new_view();
    let a = view.get("game.A").unwrap();
    assert!(!a.has("hp", LATEST).unwrap());
    let err = a.value("hp", LATEST).unwrap_err();
    assert!(err.to_string().contains("has no value"), "{err}");
}

#[test]
fn patch_member_must_exist_on_target() {
    let source = "A():\n    hp : int = 10\nBuff<A>():\n    mana : int = 5\n";
    let err = try_load(&[("game.ndl", source)]).unwrap_err();
    assert!(
        err.to_string().contains("does not exist on target"),
        "{err}"
    );
}

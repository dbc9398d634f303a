use ai_core::{compare, CompareOp, Structure, TypeRegistry, Variant, Vec3};

fn guard_board() -> Variant {
    Variant::Structure(
        Structure::new("GuardBoard")
            .with_field("Alert", 0.5f32)
            .with_field("Post", Vec3::new(1.0, 0.0, 2.0))
            .with_field(
                "Squad",
                Structure::new("Squad")
                    .with_field("Size", 4i32)
                    .with_field("Leader", Variant::Actor(9)),
            ),
    )
}

#[test]
fn nested_paths_resolve_through_structures_and_vectors() {
    let board = guard_board();
    assert_eq!(board.get_path(&["Alert"]), Some(Variant::Float(0.5)));
    assert_eq!(board.get_path(&["Post", "z"]), Some(Variant::Float(2.0)));
    assert_eq!(board.get_path(&["Squad", "Leader"]), Some(Variant::Actor(9)));
    assert_eq!(board.get_path(&["Squad", "Missing"]), None);
    assert_eq!(board.get_path(&["Post", "z", "deeper"]), None);
    assert_eq!(board.get_path(&[]), Some(board.clone()));
}

#[test]
fn writes_keep_the_existing_shape() {
    let mut board = guard_board();

    assert!(board.set_path(&["Alert"], Variant::Int(3)));
    assert_eq!(board.get_path(&["Alert"]), Some(Variant::Float(3.0)));

    assert!(board.set_path(&["Post", "y"], Variant::Float(4.0)));
    assert_eq!(
        board.get_path(&["Post"]).and_then(|v| v.as_vec3()),
        Some(Vec3::new(1.0, 4.0, 2.0))
    );

    assert!(!board.set_path(&["Squad", "Leader"], Variant::from("nobody")));
    assert!(!board.set_path(&["Unknown"], Variant::Bool(true)));
    assert!(!board.set_path(&["Squad"], Variant::Structure(Structure::new("Other"))));
    assert_eq!(board.get_path(&["Squad", "Leader"]), Some(Variant::Actor(9)));
}

#[test]
fn derived_boards_are_assignable_to_their_bases() {
    let types = TypeRegistry::new()
        .with("GuardBoard", "Board")
        .with("EliteGuardBoard", "GuardBoard");

    assert!(types.is_assignable("EliteGuardBoard", "Board"));
    assert!(types.is_assignable("GuardBoard", "GuardBoard"));
    assert!(!types.is_assignable("Board", "GuardBoard"));
    assert!(!types.is_assignable("PatrolBoard", "Board"));
    assert_eq!(types.base_of("EliteGuardBoard"), Some("GuardBoard"));
}

#[test]
fn comparisons_coerce_knowledge_values() {
    let board = guard_board();
    let size = board.get_path(&["Squad", "Size"]).unwrap_or_default();

    assert!(compare(&size, &Variant::Float(4.0), CompareOp::Equal));
    assert!(compare(&Variant::Bool(true), &Variant::Int(1), CompareOp::Equal));
    assert!(compare(&size, &Variant::Null, CompareOp::NotEqual));
    assert!(!compare(&size, &Variant::Null, CompareOp::Less));
    assert!(compare(
        &Variant::from("alpha"),
        &Variant::from("alpha"),
        CompareOp::Equal
    ));
}

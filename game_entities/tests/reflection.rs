//! Scenarios exercising reflected entities through a scope arena.

use attributed_core::{
    Datum, DatumType, Error, ErrorKind, Pointer, ScopeArena, ScopeId, SignatureRegistry, Vec4,
    THIS_KEY,
};
use game_entities::{register_entities, unregister_entities, Monster, Thing};

fn registry() -> SignatureRegistry {
    let mut registry = SignatureRegistry::new();
    register_entities(&mut registry).unwrap();
    registry
}

fn goblin(arena: &mut ScopeArena, registry: &SignatureRegistry) -> ScopeId {
    let mut monster = Monster::new("Goblin", "A goblin blocks the way");
    monster.thing.health = 12;
    monster.thing.speed = 1.5;
    arena.create_attributed(registry, monster).unwrap()
}

#[test]
fn test_monster_has_eight_prescribed_attributes() {
    let registry = registry();
    let mut arena = ScopeArena::new();
    let id = goblin(&mut arena, &registry);

    assert_eq!(arena.prescribed_attribute_count(id).unwrap(), 8);
    assert_eq!(
        arena.prescribed_keys(id).unwrap(),
        vec![
            THIS_KEY,
            Thing::NAME,
            Thing::HEALTH,
            Thing::SPEED,
            Thing::POSITION,
            Thing::TRANSFORM,
            Monster::ENTRY_MESSAGE,
            Monster::REWARD,
        ]
    );
    assert_eq!(arena.auxiliary_attribute_count(id).unwrap(), 0);
}

#[test]
fn test_keyed_and_native_access_alias() {
    let registry = registry();
    let mut arena = ScopeArena::new();
    let id = goblin(&mut arena, &registry);

    arena.at_mut(id, Thing::HEALTH).unwrap().set(0, 3).unwrap();
    assert_eq!(arena.native::<Monster>(id).unwrap().thing.health, 3);

    arena.native_mut::<Monster>(id).unwrap().thing.name = "Hobgoblin".to_string();
    let name = arena.at(id, Thing::NAME).unwrap();
    assert_eq!(name.get::<String>(0).unwrap(), "Hobgoblin");

    arena
        .at_mut(id, Thing::POSITION)
        .unwrap()
        .set_from_string(0, "vector<1|2|3|1>")
        .unwrap();
    assert_eq!(
        arena.native::<Monster>(id).unwrap().thing.position,
        Vec4::new(1.0, 2.0, 3.0, 1.0)
    );
}

#[test]
fn test_prescribed_storage_is_fixed() {
    let registry = registry();
    let mut arena = ScopeArena::new();
    let id = goblin(&mut arena, &registry);

    let mut health = arena.at_mut(id, Thing::HEALTH).unwrap();
    assert!(health.is_external());
    let err = health.resize(4).unwrap_err();
    assert!(matches!(err, Error::ExternalStorage { .. }));
    assert_eq!(err.kind(), ErrorKind::Logic);

    let err = health.set(0, 1.0f32).unwrap_err();
    assert!(matches!(err, Error::TypeMismatch { .. }));
    assert_eq!(health.get::<i32>(0).unwrap(), &12);
}

#[test]
fn test_copy_is_independent() {
    let registry = registry();
    let mut arena = ScopeArena::new();
    let id = goblin(&mut arena, &registry);
    arena
        .append_auxiliary_attribute(id, "Loot")
        .unwrap()
        .push_back("gold".to_string())
        .unwrap();

    let copy = arena.deep_copy(id).unwrap();
    assert!(arena.scope_eq(id, copy));
    assert_eq!(
        arena.native::<Monster>(copy).unwrap().thing.id,
        arena.native::<Monster>(id).unwrap().thing.id
    );

    let this = arena.at(copy, THIS_KEY).unwrap();
    assert_eq!(this.get::<Pointer>(0).unwrap().as_scope(), Some(copy));

    arena
        .at_mut(copy, Thing::NAME)
        .unwrap()
        .set(0, "Copy".to_string())
        .unwrap();
    arena.at_mut(copy, "Loot").unwrap().set(0, "silver".to_string()).unwrap();

    assert_eq!(arena.native::<Monster>(id).unwrap().thing.name, "Goblin");
    assert_eq!(
        arena.at(id, "Loot").unwrap().get::<String>(0).unwrap(),
        "gold"
    );
    assert!(!arena.scope_eq(id, copy));
}

#[test]
fn test_search_from_grandchild() {
    let registry = registry();
    let mut arena = ScopeArena::new();
    let root = arena.create_scope();
    arena.append(root, "Gravity").unwrap().push_back(9.8f32).unwrap();

    let monster = goblin(&mut arena, &registry);
    arena.adopt(root, monster, "Children").unwrap();
    let minion = arena.append_auxiliary_scope(monster, "Minions").unwrap();

    let children = arena.at(root, "Children").unwrap();
    assert_eq!(children.get::<ScopeId>(0).unwrap(), &monster);

    let (gravity, owner) = arena.search(minion, "Gravity").unwrap();
    assert_eq!(owner, root);
    assert_eq!(gravity.get::<f32>(0).unwrap(), &9.8);

    let (health, owner) = arena.search(minion, Thing::HEALTH).unwrap();
    assert_eq!(owner, monster);
    assert_eq!(health.get::<i32>(0).unwrap(), &12);

    assert!(arena.is_ancestor_of(root, minion));
    assert_eq!(arena.find_contained_scope(monster, minion), Some(("Minions", 0)));
}

#[test]
fn test_rewards_reference_other_scopes() {
    let registry = registry();
    let mut arena = ScopeArena::new();
    let id = goblin(&mut arena, &registry);
    let chest = arena.create_scope();
    arena.append(chest, "Gold").unwrap().push_back(100).unwrap();

    arena.native_mut::<Monster>(id).unwrap().add_reward(chest);
    let reward = arena.at(id, Monster::REWARD).unwrap();
    assert_eq!(reward.datum_type(), DatumType::ExternalTable);
    assert_eq!(reward.size(), 1);
    assert_eq!(reward.get::<ScopeId>(0).unwrap(), &chest);

    arena.destroy(id).unwrap();
    assert!(arena.contains(chest));
}

#[test]
fn test_reward_cycle_compares_by_reference() {
    let registry = registry();
    let mut arena = ScopeArena::new();
    let id = goblin(&mut arena, &registry);
    let chest = arena.create_scope();
    arena.append(chest, "Guardian").unwrap().push_back(id).unwrap();
    arena.native_mut::<Monster>(id).unwrap().add_reward(chest);

    let copy = arena.deep_copy(id).unwrap();
    assert!(arena.scope_eq(id, copy));

    let other = arena.create_scope();
    arena.native_mut::<Monster>(copy).unwrap().reward[0] = other;
    assert!(!arena.scope_eq(id, copy));
}

#[test]
fn test_unregistered_construction_fails() {
    let registry = SignatureRegistry::new();
    let mut arena = ScopeArena::new();
    let err = arena
        .create_attributed(&registry, Monster::default())
        .unwrap_err();
    assert!(matches!(err, Error::UnregisteredType { type_name: "Monster" }));
    assert!(arena.is_empty());
}

#[test]
fn test_unregistering_base_keeps_monster() {
    let mut registry = registry();
    assert!(registry.unregister_signatures::<Thing>());

    let mut arena = ScopeArena::new();
    let id = goblin(&mut arena, &registry);
    assert_eq!(arena.prescribed_attribute_count(id).unwrap(), 8);
    assert!(arena.create_attributed(&registry, Thing::new("Rock")).is_err());

    assert!(registry.unregister_signatures::<Monster>());
    let err = registry
        .register_derived_signatures::<Monster, Thing>()
        .unwrap_err();
    assert!(matches!(err, Error::BaseNotRegistered { .. }));
    assert!(arena.create_attributed(&registry, Monster::default()).is_err());

    unregister_entities(&mut registry);
    assert!(registry.is_empty());
}

#[test]
fn test_dump_names_the_native_type() {
    let registry = registry();
    let mut arena = ScopeArena::new();
    let id = goblin(&mut arena, &registry);

    let dump = arena.to_json(id).unwrap();
    assert_eq!(dump["type"], "Monster");
    assert_eq!(dump["entries"][1]["key"], Thing::NAME);
    assert_eq!(dump["entries"][1]["values"][0], "Goblin");
    assert!(arena.dump(id).unwrap().contains("EntryMessage"));
}

#[test]
fn test_detached_datum_from_entry() {
    let registry = registry();
    let mut arena = ScopeArena::new();
    let id = goblin(&mut arena, &registry);

    let snapshot: Datum<'static> = arena.at(id, Thing::SPEED).unwrap().to_owned_datum();
    arena.at_mut(id, Thing::SPEED).unwrap().set(0, 4.0f32).unwrap();
    assert_eq!(snapshot.get::<f32>(0).unwrap(), &1.5);
    assert!(!snapshot.is_external());
}

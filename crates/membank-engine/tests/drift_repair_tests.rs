#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{Dog, OldDog, OwnedDog};
use membank_core::Value;
use membank_engine::Memory;

fn populated_with_old_dogs() -> Memory {
    let mut memory = Memory::open_in_memory().unwrap();
    memory.put(&mut OldDog::new("Lab")).unwrap();
    memory.put(&mut OldDog::new("Pug")).unwrap();
    memory
}

#[test]
fn test_put_of_grown_type_adds_columns_and_keeps_rows() {
    // Given: A dog table written under the breed-only shape
    let mut memory = populated_with_old_dogs();

    // When: The grown shape is stored
    let mut collie = Dog::new("Collie").weighing(20.0);
    memory.put(&mut collie).unwrap();

    // Then: Old rows keep their values and pick up the new defaults
    let dogs = memory.all::<Dog>().unwrap();
    let summary: Vec<_> = dogs
        .iter()
        .map(|d| (d.breed.as_str(), d.color.as_deref(), d.weight))
        .collect();
    assert_eq!(
        summary,
        [
            ("Lab", Some("black"), Some(0.0)),
            ("Pug", Some("black"), Some(0.0)),
            ("Collie", Some("black"), Some(20.0)),
        ]
    );
    assert_eq!(collie.id, Some(3));

    // And: The stored shape now matches the grown type
    let stored = memory.get_schema("dog").unwrap();
    assert_eq!(
        stored.field_names().collect::<Vec<_>>(),
        ["breed", "color", "weight"]
    );
}

#[test]
fn test_read_of_grown_type_repairs_table() {
    // Given: A dog table written under the breed-only shape
    let mut memory = populated_with_old_dogs();

    // When: The grown shape is read first
    let dogs = memory.all::<Dog>().unwrap();

    // Then: The read repairs the table instead of failing
    assert_eq!(dogs.len(), 2);
    assert_eq!(dogs[0].color.as_deref(), Some("black"));

    let lab = memory.get_one("dog", &[("breed", Value::from("Lab"))]).unwrap();
    assert_eq!(lab.unwrap().get("weight"), Some(&Value::Real(0.0)));
}

#[test]
fn test_find_of_grown_type_repairs_table() {
    let mut memory = populated_with_old_dogs();

    let pug = memory
        .find::<Dog>(&[("breed", Value::from("Pug"))])
        .unwrap()
        .expect("pug survives repair");
    assert_eq!(pug.id, Some(2));
    assert_eq!(pug.weight, Some(0.0));
}

#[test]
fn test_sync_to_smaller_type_drops_columns() {
    // Given: A dog table in the grown shape
    let mut memory = Memory::open_in_memory().unwrap();
    memory.put(&mut Dog::new("Lab").weighing(30.0)).unwrap();

    // When: The table is synchronized back to the breed-only shape
    memory.sync::<OldDog>().unwrap();

    // Then: Only the declared field remains next to the implicit id
    let records = memory.list("dog").unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].get("weight"), None);
    assert_eq!(records[0].text("breed"), Some("Lab"));
    assert_eq!(records[0].id(), Some(1));
    assert_eq!(
        memory.get_schema("dog").unwrap().field_names().count(),
        1
    );
}

#[test]
fn test_sync_is_idempotent() {
    let mut memory = Memory::open_in_memory().unwrap();
    memory.sync::<Dog>().unwrap();
    memory.sync::<Dog>().unwrap();
    assert_eq!(memory.tables(), ["dog"]);
    assert!(memory.list("dog").unwrap().is_empty());
}

#[test]
fn test_old_type_still_reads_after_growth() {
    let mut memory = populated_with_old_dogs();
    memory.put(&mut Dog::new("Collie")).unwrap();

    let old = memory.all::<OldDog>().unwrap();
    let breeds: Vec<_> = old.iter().map(|d| d.breed.as_str()).collect();
    assert_eq!(breeds, ["Lab", "Pug", "Collie"]);
}

#[test]
fn test_read_of_new_text_field_repairs_instead_of_echoing_name() {
    // Given: A dog table written under the breed-only shape
    let mut memory = populated_with_old_dogs();

    // When: A shape with an extra text field is read
    let dogs = memory.all::<OwnedDog>().unwrap();

    // Then: The new column is added and reads back empty
    assert_eq!(dogs.len(), 2);
    assert!(dogs.iter().all(|d| d.owner.is_none()));
    assert_eq!(
        memory.get_schema("dog").unwrap().field_names().collect::<Vec<_>>(),
        ["breed", "owner"]
    );
}

#[test]
fn test_filter_on_new_text_field_repairs_before_matching() {
    let mut memory = populated_with_old_dogs();

    let found = memory
        .find::<OwnedDog>(&[("owner", Value::from("owner"))])
        .unwrap();
    assert!(found.is_none());
    assert_eq!(
        memory.get_schema("dog").unwrap().field_names().count(),
        2
    );
}

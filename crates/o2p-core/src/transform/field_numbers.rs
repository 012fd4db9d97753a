use std::collections::BTreeSet;
use std::ops::RangeInclusive;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::ir::Message;

/// Largest field number protobuf accepts.
pub const MAX_FIELD_NUMBER: u32 = 536_870_911;

/// Numbers reserved for the protobuf implementation.
pub const RESERVED_RANGE: RangeInclusive<u32> = 19_000..=19_999;

/// Field numbers of a previous run, keyed by dotted message path and then
/// field name. Serialized as a plain nested map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldNumberMap {
    messages: IndexMap<String, IndexMap<String, u32>>,
}

impl FieldNumberMap {
    pub fn get(&self, message: &str, field: &str) -> Option<u32> {
        self.messages.get(message)?.get(field).copied()
    }

    pub fn message(&self, message: &str) -> Option<&IndexMap<String, u32>> {
        self.messages.get(message)
    }

    pub fn insert(&mut self, message: &str, field: &str, number: u32) {
        self.messages
            .entry(message.to_string())
            .or_default()
            .insert(field.to_string(), number);
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// The lock to persist after a run: `current` plus every remembered
    /// number that no current field took over, so retired numbers stay
    /// reserved in later runs too.
    pub fn merged(&self, current: &FieldNumberMap) -> FieldNumberMap {
        let mut merged = current.clone();
        for (message, fields) in &self.messages {
            for (field, &number) in fields {
                let taken = merged
                    .message(message)
                    .is_some_and(|m| m.contains_key(field) || m.values().any(|&n| n == number));
                if !taken {
                    merged.insert(message, field, number);
                }
            }
        }
        merged
    }
}

/// True when `number` may be used as a field number.
pub fn is_valid_number(number: u32) -> bool {
    (1..=MAX_FIELD_NUMBER).contains(&number) && !RESERVED_RANGE.contains(&number)
}

/// Number every field of `message` and of its nested messages.
///
/// Explicit numbers come first, then numbers remembered in `previous`, then
/// fresh numbers counting up from the previous maximum. Remembered numbers
/// that no field uses any more become `reserved`.
pub fn allocate(message: &mut Message, path: &str, previous: &FieldNumberMap) {
    let remembered = previous.message(path);
    let mut used = BTreeSet::new();

    for field in &mut message.fields {
        if let Some(number) = field.explicit_number {
            field.number = number;
            used.insert(number);
        }
    }

    if let Some(remembered) = remembered {
        for field in message.fields.iter_mut().filter(|f| f.number == 0) {
            if let Some(&number) = remembered.get(&field.name)
                && !used.contains(&number)
            {
                field.number = number;
                used.insert(number);
            }
        }
    }

    let mut next = remembered
        .and_then(|numbers| numbers.values().max())
        .map_or(1, |max| max + 1);
    for field in message.fields.iter_mut().filter(|f| f.number == 0) {
        while used.contains(&next) || RESERVED_RANGE.contains(&next) {
            next += 1;
        }
        field.number = next;
        used.insert(next);
        log::debug!("{path}.{} = {next}", field.name);
    }

    message.reserved = remembered
        .map(|numbers| {
            numbers
                .values()
                .filter(|n| !used.contains(*n))
                .copied()
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect()
        })
        .unwrap_or_default();

    for nested in &mut message.messages {
        let nested_path = format!("{path}.{}", nested.name);
        allocate(nested, &nested_path, previous);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Field, FieldType, Scalar};

    fn message(names: &[&str]) -> Message {
        Message {
            name: "Pet".into(),
            fields: names
                .iter()
                .map(|n| Field::new(*n, *n, FieldType::Scalar(Scalar::String)))
                .collect(),
            ..Default::default()
        }
    }

    fn numbers(message: &Message) -> Vec<(&str, u32)> {
        message
            .fields
            .iter()
            .map(|f| (f.name.as_str(), f.number))
            .collect()
    }

    #[test]
    fn test_sequential_without_previous() {
        let mut pet = message(&["id", "name", "tag"]);
        allocate(&mut pet, "Pet", &FieldNumberMap::default());
        assert_eq!(numbers(&pet), vec![("id", 1), ("name", 2), ("tag", 3)]);
        assert!(pet.reserved.is_empty());
    }

    #[test]
    fn test_explicit_numbers_first() {
        let mut pet = message(&["id", "name", "tag"]);
        pet.fields[1].explicit_number = Some(1);
        allocate(&mut pet, "Pet", &FieldNumberMap::default());
        assert_eq!(numbers(&pet), vec![("id", 2), ("name", 1), ("tag", 3)]);
    }

    #[test]
    fn test_previous_numbers_are_stable() {
        let mut previous = FieldNumberMap::default();
        previous.insert("Pet", "id", 1);
        previous.insert("Pet", "name", 2);
        previous.insert("Pet", "tag", 3);

        // `name` removed, `owner` added in front of `tag`.
        let mut pet = message(&["id", "owner", "tag"]);
        allocate(&mut pet, "Pet", &previous);
        assert_eq!(numbers(&pet), vec![("id", 1), ("owner", 4), ("tag", 3)]);
        assert_eq!(pet.reserved, vec![2]);
    }

    #[test]
    fn test_skips_reserved_range() {
        let mut previous = FieldNumberMap::default();
        previous.insert("Pet", "id", 18_999);
        let mut pet = message(&["id", "name"]);
        allocate(&mut pet, "Pet", &previous);
        assert_eq!(numbers(&pet), vec![("id", 18_999), ("name", 20_000)]);
    }

    #[test]
    fn test_nested_paths() {
        let mut previous = FieldNumberMap::default();
        previous.insert("Pet.Owner", "name", 5);
        let mut pet = message(&["id"]);
        let mut owner = message(&["name", "email"]);
        owner.name = "Owner".into();
        pet.messages.push(owner);
        allocate(&mut pet, "Pet", &previous);
        assert_eq!(
            numbers(&pet.messages[0]),
            vec![("name", 5), ("email", 6)]
        );
    }

    #[test]
    fn test_merged_keeps_retired_numbers() {
        let mut previous = FieldNumberMap::default();
        previous.insert("Pet", "id", 1);
        previous.insert("Pet", "name", 2);
        previous.insert("Gone", "id", 1);

        let mut pet = message(&["id", "tag"]);
        allocate(&mut pet, "Pet", &previous);
        let mut current = FieldNumberMap::default();
        for field in &pet.fields {
            current.insert("Pet", &field.name, field.number);
        }

        let lock = previous.merged(&current);
        assert_eq!(lock.get("Pet", "tag"), Some(3));
        assert_eq!(lock.get("Pet", "name"), Some(2));
        assert_eq!(lock.get("Gone", "id"), Some(1));

        // A third run still treats 2 as reserved.
        let mut pet = message(&["id", "tag", "owner"]);
        allocate(&mut pet, "Pet", &lock);
        assert_eq!(numbers(&pet), vec![("id", 1), ("tag", 3), ("owner", 4)]);
        assert_eq!(pet.reserved, vec![2]);
    }

    #[test]
    fn test_valid_numbers() {
        assert!(is_valid_number(1));
        assert!(is_valid_number(MAX_FIELD_NUMBER));
        assert!(!is_valid_number(0));
        assert!(!is_valid_number(19_500));
        assert!(!is_valid_number(MAX_FIELD_NUMBER + 1));
    }

    #[test]
    fn test_map_serializes_as_nested_mapping() {
        let mut map = FieldNumberMap::default();
        map.insert("Pet", "id", 1);
        let yaml = serde_yaml_ng::to_string(&map).unwrap();
        assert_eq!(yaml, "Pet:\n  id: 1\n");
        let back: FieldNumberMap = serde_yaml_ng::from_str(&yaml).unwrap();
        assert_eq!(back, map);
    }
}

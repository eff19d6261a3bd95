//! PropertyMap: the key-value bag on nodes and dependencies.

use hashbrown::HashMap;
use tracing::warn;

use super::Value;
use crate::{Error, Result};

/// The reserved identity key. Present on every node, never writable.
pub const NAME_KEY: &str = "name";

/// A map of property names to values.
pub type PropertyMap = HashMap<String, Value>;

/// Write `value` under `key`. `Null` removes the key.
pub(crate) fn set_property(props: &mut PropertyMap, key: &str, value: Value) -> Result<()> {
    if key == NAME_KEY {
        return Err(Error::ImmutableName);
    }
    if value.is_null() {
        props.remove(key);
    } else {
        props.insert(key.to_owned(), value);
    }
    Ok(())
}

/// List-append with promotion and deduplication.
///
/// A list `value` appends each of its elements. An existing scalar equal to
/// `value` is left alone; any other scalar is promoted to a singleton list
/// before appending.
pub(crate) fn add_list_property(props: &mut PropertyMap, key: &str, value: Value) -> Result<()> {
    if key == NAME_KEY {
        return Err(Error::ImmutableName);
    }
    if value.is_null() {
        return Ok(());
    }
    let items = match value {
        Value::List(items) => items,
        scalar => vec![scalar],
    };

    match props.get_mut(key) {
        None => {
            let mut list = Value::List(Vec::with_capacity(items.len()));
            for item in items {
                list.push_unique(item);
            }
            props.insert(key.to_owned(), list);
        }
        Some(existing) => {
            if !existing.is_list() {
                if items.len() == 1 && *existing == items[0] {
                    return Ok(());
                }
                warn!("Property {} was not a list, replacing with a list.", key);
                let scalar = std::mem::replace(existing, Value::Null);
                *existing = Value::List(vec![scalar]);
            }
            for item in items {
                existing.push_unique(item);
            }
        }
    }
    Ok(())
}

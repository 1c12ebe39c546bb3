//! Expansion of `generate` entries
//!
//! A partition or logical volume list may hold an entry such as
//! `{ "generate": "default" }`, which stands for one volume per product path
//! not already mounted elsewhere in the document. The expansion works on the
//! raw document, before decoding: `generate` is not part of the typed model.
//!
//! Only the first container holding a `generate` entry is expanded (drives
//! first, then MD RAIDs, then volume groups); entries anywhere else are
//! dropped with a warning. Every entry must still name `default` or
//! `mandatory`.

use serde_json::{Map, Value};
use storage_contracts::SchemaError;
use storage_types::{ProductDefaults, same_path};

use super::reader::JsonPath;

const CONTAINERS: [&str; 3] = ["drives", "mdRaids", "volumeGroups"];
const VOLUME_LISTS: [&str; 2] = ["partitions", "logicalVolumes"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Generate {
    Default,
    Mandatory,
}

/// Replace `generate` entries with the volumes they stand for
pub fn expand(doc: &Value, product: &ProductDefaults) -> Result<Value, SchemaError> {
    check_entries(doc)?;
    let mut doc = doc.clone();

    let Some(first) = containers(&doc).into_iter().find(|(key, index)| {
        volume_list(&doc, key, *index).is_some_and(|(_, volumes)| volumes.iter().any(is_generate))
    }) else {
        return Ok(doc);
    };

    let present = mount_paths(&doc);

    for (key, index) in containers(&doc) {
        let expand_here = (key, index) == first;
        let Some(volumes) = volume_list_mut(&mut doc, key, index) else {
            continue;
        };

        let mut expanded = Vec::with_capacity(volumes.len());
        let mut done = false;
        for volume in volumes.drain(..) {
            if !is_generate(&volume) {
                expanded.push(volume);
                continue;
            }
            if !expand_here || done {
                tracing::warn!("Dropping generate entry in {key}[{index}], only the first one is expanded");
                continue;
            }
            done = true;
            expanded.extend(generated_volumes(&volume, product, &present));
        }
        *volumes = expanded;
    }

    Ok(doc)
}

/// Reject `generate` values other than `default` and `mandatory`
fn check_entries(doc: &Value) -> Result<(), SchemaError> {
    for (key, index) in containers(doc) {
        let Some((list, volumes)) = volume_list(doc, key, index) else {
            continue;
        };
        for (position, volume) in volumes.iter().enumerate() {
            let Some(generate) = volume.get("generate") else {
                continue;
            };
            if generate_kind(generate).is_none() {
                let path = JsonPath::root()
                    .key(key)
                    .index(index)
                    .key(list)
                    .index(position)
                    .key("generate");
                return Err(path.error(format!(
                    "expected \"default\" or \"mandatory\", got {generate}"
                )));
            }
        }
    }
    Ok(())
}

fn containers(doc: &Value) -> Vec<(&'static str, usize)> {
    CONTAINERS
        .iter()
        .flat_map(|key| {
            let count = doc
                .get(*key)
                .and_then(Value::as_array)
                .map_or(0, Vec::len);
            (0..count).map(move |index| (*key, index))
        })
        .collect()
}

fn volume_list<'a>(
    doc: &'a Value,
    key: &str,
    index: usize,
) -> Option<(&'static str, &'a Vec<Value>)> {
    let container = doc.get(key)?.get(index)?;
    VOLUME_LISTS.iter().find_map(|list| {
        container
            .get(*list)
            .and_then(Value::as_array)
            .map(|volumes| (*list, volumes))
    })
}

fn volume_list_mut<'a>(doc: &'a mut Value, key: &str, index: usize) -> Option<&'a mut Vec<Value>> {
    let container = doc.get_mut(key)?.get_mut(index)?.as_object_mut()?;
    let list = VOLUME_LISTS.iter().find(|list| {
        container
            .get(**list)
            .is_some_and(Value::is_array)
    })?;
    container.get_mut(*list)?.as_array_mut()
}

fn is_generate(volume: &Value) -> bool {
    volume.get("generate").is_some()
}

fn generate_kind(value: &Value) -> Option<Generate> {
    let text = match value {
        Value::Object(object) => VOLUME_LISTS
            .iter()
            .find_map(|list| object.get(*list).and_then(Value::as_str))?,
        other => other.as_str()?,
    };

    match text {
        "default" => Some(Generate::Default),
        "mandatory" => Some(Generate::Mandatory),
        _ => None,
    }
}

/// Mount paths of everything that can hold a filesystem
fn mount_paths(doc: &Value) -> Vec<String> {
    let path_of = |node: &Value| {
        node.get("filesystem")
            .and_then(|fs| fs.get("path"))
            .and_then(Value::as_str)
            .map(str::to_string)
    };

    let mut paths = Vec::new();
    for key in CONTAINERS {
        for container in doc.get(key).and_then(Value::as_array).into_iter().flatten() {
            paths.extend(path_of(container));
            for list in VOLUME_LISTS {
                for volume in container.get(list).and_then(Value::as_array).into_iter().flatten() {
                    paths.extend(path_of(volume));
                }
            }
        }
    }
    paths
}

fn generated_volumes(entry: &Value, product: &ProductDefaults, present: &[String]) -> Vec<Value> {
    let Some(generate) = entry.get("generate") else {
        return Vec::new();
    };

    let Some(kind) = generate_kind(generate) else {
        return Vec::new();
    };

    let wanted = match kind {
        Generate::Default => &product.default_paths,
        Generate::Mandatory => &product.mandatory_paths,
    };

    // Extra settings given next to the generate value apply to every volume
    let mut extra = match generate {
        Value::Object(object) => object.clone(),
        _ => Map::new(),
    };
    for list in VOLUME_LISTS {
        extra.remove(list);
    }

    wanted
        .iter()
        .filter(|path| !present.iter().any(|p| same_path(p, path)))
        .map(|path| {
            let mut volume = Map::new();
            volume.insert(
                "filesystem".to_string(),
                serde_json::json!({ "path": path }),
            );
            for (key, value) in &extra {
                volume.insert(key.clone(), value.clone());
            }
            Value::Object(volume)
        })
        .collect()
}

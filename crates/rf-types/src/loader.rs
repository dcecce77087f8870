use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::directive::{DirectiveTree, CHOICE_KEY};
use crate::errors::{RfError, RfResult};

/// Load a directive file into a [`DirectiveTree`].
///
/// Files ending in `.json` are parsed as JSON, everything else as YAML.
pub fn load_directive_file(path: &Path) -> RfResult<DirectiveTree> {
    if !path.is_file() {
        return Err(RfError::ConfigNotFound {
            path: path.display().to_string(),
        });
    }

    let content = std::fs::read_to_string(path)?;
    let is_json = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let root = if is_json {
        serde_json::from_str::<Value>(&content).map_err(|e| parse_error(path, e))?
    } else {
        parse_yaml(&content, &path.display().to_string())?
    };

    debug!("Loaded directive file {}", path.display());
    Ok(DirectiveTree::new(root))
}

/// YAML admits `.inf` and `.nan`, which have no JSON form and would otherwise
/// turn into `null`; they are rejected here.
fn parse_yaml(source: &str, origin: &str) -> RfResult<Value> {
    let parse_error = |e: serde_yaml::Error| RfError::ConfigParse {
        path: origin.to_string(),
        message: e.to_string(),
    };

    let document: serde_yaml::Value = serde_yaml::from_str(source).map_err(parse_error)?;
    reject_non_finite(&document, String::new())?;
    serde_yaml::from_value(document).map_err(parse_error)
}

fn reject_non_finite(node: &serde_yaml::Value, path: String) -> RfResult<()> {
    match node {
        serde_yaml::Value::Number(n) if n.as_f64().is_some_and(|f| !f.is_finite()) => {
            Err(RfError::InvalidValue {
                path,
                message: format!("non-finite number {n} is not allowed"),
            })
        }
        serde_yaml::Value::Sequence(items) => items
            .iter()
            .enumerate()
            .try_for_each(|(i, item)| reject_non_finite(item, child_path(&path, &i.to_string()))),
        serde_yaml::Value::Mapping(map) => map.iter().try_for_each(|(key, value)| {
            let key = match key {
                serde_yaml::Value::String(s) => s.clone(),
                other => serde_yaml::to_string(other)
                    .map(|s| s.trim_end().to_string())
                    .unwrap_or_default(),
            };
            // Leaf errors name the directive, not its envelope.
            let path = if key == CHOICE_KEY {
                path.clone()
            } else {
                child_path(&path, &key)
            };
            reject_non_finite(value, path)
        }),
        serde_yaml::Value::Tagged(tagged) => reject_non_finite(&tagged.value, path),
        _ => Ok(()),
    }
}

fn child_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}

fn parse_error(path: &Path, err: impl std::fmt::Display) -> RfError {
    RfError::ConfigParse {
        path: path.display().to_string(),
        message: err.to_string(),
    }
}

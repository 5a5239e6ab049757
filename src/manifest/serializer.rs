//! Manifest serialization formats.
//!
//! Every format can be written and parsed back, so amend mode works regardless of which
//! one a project picked.

use anyhow::{Context, Result, anyhow};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{HashError, HashResult};
use crate::models::{EntryFields, HASHED_PATH_FIELD, ManifestEntry, PATH_FIELD};

/// Converts manifest entries to and from a persisted text format.
pub trait ManifestSerializer {
  /// Format name as accepted by [`serializer_for`].
  fn name(&self) -> &'static str;

  /// File extension, including the dot, used for the default manifest file name.
  fn extension(&self) -> &'static str;

  /// Render entries. Internal-only fields are never written.
  fn serialize(&self, entries: &[ManifestEntry]) -> Result<String>;

  /// Parse previously rendered text back into entries with virtual paths only.
  fn parse(&self, text: &str) -> Result<Vec<ManifestEntry>>;
}

/// Look up the serializer registered under `format` (case-insensitive, default `json`).
pub fn serializer_for(format: &str) -> HashResult<Box<dyn ManifestSerializer>> {
  let normalized = format.trim().to_ascii_lowercase();
  match normalized.as_str() {
    "" | "json" => Ok(Box::new(JsonArraySerializer)),
    "tab" => Ok(Box::new(TabSerializer)),
    "json-object" => Ok(Box::new(JsonObjectSerializer)),
    "json-symfony" => Ok(Box::new(JsonSymfonySerializer)),
    _ => Err(HashError::UnknownFormat {
      format: format.to_string(),
    }),
  }
}

/// JSON array of entry objects, indented with four spaces.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonArraySerializer;

impl ManifestSerializer for JsonArraySerializer {
  fn name(&self) -> &'static str {
    "json"
  }

  fn extension(&self) -> &'static str {
    ".json"
  }

  fn serialize(&self, entries: &[ManifestEntry]) -> Result<String> {
    to_indented_json(&entries)
  }

  fn parse(&self, text: &str) -> Result<Vec<ManifestEntry>> {
    serde_json::from_str(text).context("failed to parse manifest JSON array")
  }
}

/// JSON object keyed by virtual path; each value holds the hashed path under `path`
/// alongside the plugin fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonObjectSerializer;

impl ManifestSerializer for JsonObjectSerializer {
  fn name(&self) -> &'static str {
    "json-object"
  }

  fn extension(&self) -> &'static str {
    ".json"
  }

  fn serialize(&self, entries: &[ManifestEntry]) -> Result<String> {
    let mut object = Map::new();
    for entry in entries {
      let mut value = entry.fields.clone();
      value.insert(PATH_FIELD.into(), Value::String(entry.hashed_path.clone()));
      object.insert(entry.path.clone(), Value::Object(value));
    }
    to_indented_json(&object)
  }

  fn parse(&self, text: &str) -> Result<Vec<ManifestEntry>> {
    let object: Map<String, Value> =
      serde_json::from_str(text).context("failed to parse manifest JSON object")?;

    object
      .into_iter()
      .map(|(path, value)| {
        let Value::Object(mut fields) = value else {
          return Err(anyhow!("manifest value for '{path}' is not an object"));
        };
        let hashed_path = match fields.remove(PATH_FIELD) {
          Some(Value::String(hashed)) => hashed,
          _ => return Err(anyhow!("manifest value for '{path}' has no hashed path")),
        };
        Ok(ManifestEntry {
          path,
          hashed_path,
          fields,
          ..ManifestEntry::default()
        })
      })
      .collect()
  }
}

/// JSON object mapping virtual path to hashed path, as consumed by Symfony's JSON
/// manifest version strategy. Plugin fields are not written.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSymfonySerializer;

impl ManifestSerializer for JsonSymfonySerializer {
  fn name(&self) -> &'static str {
    "json-symfony"
  }

  fn extension(&self) -> &'static str {
    ".json"
  }

  fn serialize(&self, entries: &[ManifestEntry]) -> Result<String> {
    let object: Map<String, Value> = entries
      .iter()
      .map(|entry| (entry.path.clone(), Value::String(entry.hashed_path.clone())))
      .collect();
    to_indented_json(&object)
  }

  fn parse(&self, text: &str) -> Result<Vec<ManifestEntry>> {
    let object: Map<String, Value> =
      serde_json::from_str(text).context("failed to parse symfony manifest")?;

    object
      .into_iter()
      .map(|(path, value)| match value {
        Value::String(hashed_path) => Ok(ManifestEntry {
          path,
          hashed_path,
          ..ManifestEntry::default()
        }),
        _ => Err(anyhow!("manifest value for '{path}' is not a string")),
      })
      .collect()
  }
}

/// Tab-delimited table with a header row. The columns are `path`, `hashedPath` and the
/// union of plugin fields in first-seen order; missing fields are left empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct TabSerializer;

impl ManifestSerializer for TabSerializer {
  fn name(&self) -> &'static str {
    "tab"
  }

  fn extension(&self) -> &'static str {
    ".tab"
  }

  fn serialize(&self, entries: &[ManifestEntry]) -> Result<String> {
    let mut columns: Vec<String> = vec![PATH_FIELD.into(), HASHED_PATH_FIELD.into()];
    for entry in entries {
      for key in entry.fields.keys() {
        if !columns.contains(key) {
          columns.push(key.clone());
        }
      }
    }

    let mut lines = vec![columns.join("\t")];
    for entry in entries {
      let cells: Vec<String> = columns
        .iter()
        .map(|column| entry.field(column).map(render_cell).unwrap_or_default())
        .collect();
      lines.push(cells.join("\t"));
    }

    let mut text = lines.join("\n");
    text.push('\n');
    Ok(text)
  }

  fn parse(&self, text: &str) -> Result<Vec<ManifestEntry>> {
    let mut lines = text.lines().filter(|line| !line.trim().is_empty());
    let Some(header) = lines.next() else {
      return Ok(Vec::new());
    };
    let columns: Vec<&str> = header.split('\t').collect();
    if !columns.contains(&PATH_FIELD) || !columns.contains(&HASHED_PATH_FIELD) {
      return Err(anyhow!("tab manifest header lacks path columns"));
    }

    lines
      .enumerate()
      .map(|(index, line)| {
        let mut entry = ManifestEntry::default();
        let mut fields = EntryFields::new();
        for (column, cell) in columns.iter().zip(line.split('\t')) {
          if cell.is_empty() {
            continue;
          }
          match *column {
            PATH_FIELD => entry.path = cell.to_string(),
            HASHED_PATH_FIELD => entry.hashed_path = cell.to_string(),
            other => {
              fields.insert(other.to_string(), parse_cell(cell));
            }
          }
        }
        if entry.path.is_empty() || entry.hashed_path.is_empty() {
          return Err(anyhow!("tab manifest row {} lacks a path", index + 1));
        }
        entry.fields = fields;
        Ok(entry)
      })
      .collect()
  }
}

fn to_indented_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
  let mut buffer = Vec::new();
  let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
  let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
  value
    .serialize(&mut serializer)
    .context("failed to serialize manifest")?;
  String::from_utf8(buffer).context("manifest JSON is not UTF-8")
}

fn render_cell(value: Value) -> String {
  let text = match value {
    Value::Null => String::new(),
    Value::String(text) => text,
    other => other.to_string(),
  };
  text.replace(['\t', '\r', '\n'], " ")
}

fn parse_cell(cell: &str) -> Value {
  match serde_json::from_str::<Value>(cell) {
    Ok(value @ (Value::Number(_) | Value::Bool(_))) => value,
    _ => Value::String(cell.to_string()),
  }
}

//! Item records and the file metadata carried in their `extra` field.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Item types whose `extra` carries stored-file metadata.
///
/// Each storage backend owns one type, and the metadata lives under a
/// backend-specific key inside `extra`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileItemType {
    /// File stored on the local filesystem.
    #[serde(rename = "file")]
    Local,
    /// File stored in an S3-compatible object store.
    #[serde(rename = "s3File")]
    S3,
}

impl FileItemType {
    /// Item type string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "file",
            Self::S3 => "s3File",
        }
    }

    /// Key of the file metadata object inside `extra`.
    #[must_use]
    pub fn extra_key(&self) -> &'static str {
        // Same spelling as the type tag.
        self.as_str()
    }

    /// Parse from an item type string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "file" => Some(Self::Local),
            "s3File" => Some(Self::S3),
            _ => None,
        }
    }
}

/// Stored-file metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileExtra {
    /// Original file name as uploaded.
    pub name: String,
    /// Storage key.
    pub path: String,
    /// MIME type.
    pub mimetype: String,
    /// Size in bytes.
    pub size: u64,
    /// Transfer encoding declared by the client.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
}

/// Generic item record, owned by the item engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Unique identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Item type tag, e.g. `folder` or `file`.
    #[serde(rename = "type")]
    pub item_type: String,
    /// Type-specific data.
    #[serde(default)]
    pub extra: Map<String, Value>,
    /// Presentation settings.
    #[serde(default)]
    pub settings: Map<String, Value>,
}

impl Item {
    /// File metadata, if this item is a file of type `file_type`.
    ///
    /// Returns `None` for other item types and for file items whose
    /// `extra` lacks well-formed metadata.
    #[must_use]
    pub fn file_extra(&self, file_type: FileItemType) -> Option<FileExtra> {
        if self.item_type != file_type.as_str() {
            return None;
        }
        let value = self.extra.get(file_type.extra_key())?;
        serde_json::from_value(value.clone()).ok()
    }

    /// Storage key of this item's content, if it is a file of type
    /// `file_type` with a `path` under its metadata key.
    ///
    /// Unlike [`Item::file_extra`] the other metadata fields may be
    /// missing or loosely typed.
    #[must_use]
    pub fn file_path(&self, file_type: FileItemType) -> Option<&str> {
        if self.item_type != file_type.as_str() {
            return None;
        }
        self.extra
            .get(file_type.extra_key())?
            .get("path")?
            .as_str()
            .filter(|path| !path.is_empty())
    }

    /// Point the file metadata under `file_type`'s key at `path`, keeping
    /// every other field as it is.
    pub fn set_file_path(&mut self, file_type: FileItemType, path: impl Into<String>) {
        let entry = self
            .extra
            .entry(file_type.extra_key())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        if let Value::Object(file) = entry {
            file.insert("path".to_string(), Value::String(path.into()));
        }
    }
}

/// Data for an item the engine has not created yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewItem {
    /// Display name.
    pub name: String,
    /// Item type tag.
    #[serde(rename = "type")]
    pub item_type: String,
    /// Type-specific data.
    pub extra: Map<String, Value>,
    /// Presentation settings.
    pub settings: Map<String, Value>,
}

impl NewItem {
    /// A file item carrying `extra` under `file_type`'s key.
    #[must_use]
    pub fn file(name: impl Into<String>, file_type: FileItemType, extra: &FileExtra) -> Self {
        let mut map = Map::new();
        map.insert(
            file_type.extra_key().to_string(),
            serde_json::to_value(extra).unwrap_or(Value::Null),
        );
        Self {
            name: name.into(),
            item_type: file_type.as_str().to_string(),
            extra: map,
            settings: Map::new(),
        }
    }
}

/// Authenticated member performing an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Actor {
    /// Member ID.
    pub id: Uuid,
}

impl Actor {
    /// Create an actor for member `id`.
    #[must_use]
    pub const fn new(id: Uuid) -> Self {
        Self { id }
    }
}

/// Who is asking: a member, or an anonymous caller on the public surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requester {
    /// Authenticated member.
    Member(Actor),
    /// Anonymous caller, limited to public items.
    Public,
}

//! Attached-file descriptors.
//!
//! The hosted backend and the uploader widget use two incompatible shapes
//! for the same entity: API records carry capitalized keys (`Id`, `Name`,
//! `Type`, `Size`) while the widget's display shape uses lowercase keys.
//! Instead of sniffing key casing at runtime, the shape is an explicit
//! tagged union produced at the collaborator boundary; lists are expected
//! to be shape-homogeneous (mixed lists are unsupported and only tolerated
//! pass-through, see [`crate::files::reconcile`]).

use serde::{Deserialize, Serialize};

/// Which of the two record shapes a descriptor uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileShape {
    /// Backend record shape: capitalized keys.
    Api,
    /// Widget display shape: lowercase keys.
    Ui,
}

/// Backend-shaped file record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiFile {
    #[serde(rename = "Id")]
    pub id: i64,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Type")]
    pub file_type: String,
    #[serde(rename = "Size")]
    pub size: u64,
    /// Backend fields the core does not interpret.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Widget-shaped file record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiFile {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub file_type: String,
    pub size: u64,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// One attached file, in either shape.
///
/// Equality is structural and shape-sensitive: an API record and its UI
/// conversion are *not* equal. Serialization is untagged, so each shape
/// round-trips with its native key casing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FileDescriptor {
    Api(ApiFile),
    Ui(UiFile),
}

impl FileDescriptor {
    /// Build a UI-shaped descriptor.
    pub fn ui(id: i64, name: impl Into<String>, file_type: impl Into<String>, size: u64) -> Self {
        Self::Ui(UiFile {
            id,
            name: name.into(),
            file_type: file_type.into(),
            size,
            extra: serde_json::Map::new(),
        })
    }

    /// Build an API-shaped descriptor.
    pub fn api(id: i64, name: impl Into<String>, file_type: impl Into<String>, size: u64) -> Self {
        Self::Api(ApiFile {
            id,
            name: name.into(),
            file_type: file_type.into(),
            size,
            extra: serde_json::Map::new(),
        })
    }

    /// The shape this descriptor uses.
    pub fn shape(&self) -> FileShape {
        match self {
            Self::Api(_) => FileShape::Api,
            Self::Ui(_) => FileShape::Ui,
        }
    }

    /// Record identity, shape-independent.
    pub fn id(&self) -> i64 {
        match self {
            Self::Api(f) => f.id,
            Self::Ui(f) => f.id,
        }
    }

    /// File name, shape-independent.
    pub fn name(&self) -> &str {
        match self {
            Self::Api(f) => &f.name,
            Self::Ui(f) => &f.name,
        }
    }

    /// MIME type, shape-independent.
    pub fn file_type(&self) -> &str {
        match self {
            Self::Api(f) => &f.file_type,
            Self::Ui(f) => &f.file_type,
        }
    }

    /// Size in bytes, shape-independent.
    pub fn size(&self) -> u64 {
        match self {
            Self::Api(f) => f.size,
            Self::Ui(f) => f.size,
        }
    }

    /// Convert to the widget display shape. UI records pass through.
    pub fn into_ui(self) -> Self {
        match self {
            Self::Api(f) => Self::Ui(UiFile {
                id: f.id,
                name: f.name,
                file_type: f.file_type,
                size: f.size,
                extra: f.extra,
            }),
            ui @ Self::Ui(_) => ui,
        }
    }

    /// Convert to the backend record shape. API records pass through.
    pub fn into_api(self) -> Self {
        match self {
            Self::Ui(f) => Self::Api(ApiFile {
                id: f.id,
                name: f.name,
                file_type: f.file_type,
                size: f.size,
                extra: f.extra,
            }),
            api @ Self::Api(_) => api,
        }
    }
}

/// Shape classification of a whole list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListShape {
    Empty,
    Uniform(FileShape),
    /// Elements disagree on shape. Unsupported input.
    Mixed,
}

/// Classify a file list's shape.
pub fn list_shape(files: &[FileDescriptor]) -> ListShape {
    let mut shapes = files.iter().map(FileDescriptor::shape);
    match shapes.next() {
        None => ListShape::Empty,
        Some(first) => {
            if shapes.all(|s| s == first) {
                ListShape::Uniform(first)
            } else {
                ListShape::Mixed
            }
        }
    }
}

//! Task categories.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::store::Record;
use crate::wire::{lenient_bool, lenient_u64};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskCategory {
    #[serde(default, deserialize_with = "lenient_u64")]
    pub id: u64,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_featured: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record for TaskCategory {
    fn record_id(&self) -> u64 {
        self.id
    }
}

/// Fields an admin submits to create or update a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryDraft {
    pub label: String,
    pub description: String,
    pub status: String,
    pub is_featured: bool,
}

impl Default for CategoryDraft {
    fn default() -> Self {
        CategoryDraft {
            label: String::new(),
            description: String::new(),
            status: "active".to_string(),
            is_featured: false,
        }
    }
}

impl From<&TaskCategory> for CategoryDraft {
    fn from(category: &TaskCategory) -> Self {
        CategoryDraft {
            label: category.label.clone(),
            description: category.description.clone().unwrap_or_default(),
            status: category.status.clone().unwrap_or_else(|| "active".to_string()),
            is_featured: category.is_featured,
        }
    }
}

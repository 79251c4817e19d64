//! Tasks users complete for rewards, and the admin draft used to edit them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::store::Record;
use crate::timestamp::{serialize_opt_rfc3339, Timestamp};
use crate::wire::{lenient_bool, lenient_opt_u64, lenient_u64};

/// A task as returned by `/tasks`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(default, deserialize_with = "lenient_u64")]
    pub id: u64,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub reward_amount: u64,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(rename = "type", default)]
    pub task_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_u64")]
    pub task_category_id: Option<u64>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub requires_proof: bool,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub auto_approve: bool,
    #[serde(default)]
    pub expires_at: Option<Timestamp>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record for Task {
    fn record_id(&self) -> u64 {
        self.id
    }
}

impl Task {
    /// Whether the task can still be attempted at `now`.
    pub fn is_open(&self, now: Timestamp) -> bool {
        let active = self.status.as_deref().map_or(true, |s| s == "active");
        let unexpired = self.expires_at.map_or(true, |end| now < end);
        active && unexpired
    }
}

/// Fields an admin submits to create or update a task.
///
/// Sent as multipart form fields; `None` fields are left out and booleans
/// go over the wire as `1`/`0`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskDraft {
    pub label: String,
    pub description: Option<String>,
    pub link: Option<String>,
    pub reward_amount: Option<u64>,
    pub status: String,
    #[serde(rename = "type")]
    pub task_type: String,
    pub task_category_id: Option<u64>,
    pub max_attempts_per_user: Option<u64>,
    pub cooldown_minutes: Option<u64>,
    pub requires_proof: bool,
    pub auto_approve: bool,
    #[serde(serialize_with = "serialize_opt_rfc3339", default)]
    pub expires_at: Option<Timestamp>,
}

impl Default for TaskDraft {
    fn default() -> Self {
        TaskDraft {
            label: String::new(),
            description: None,
            link: None,
            reward_amount: None,
            status: "active".to_string(),
            task_type: "video".to_string(),
            task_category_id: None,
            max_attempts_per_user: None,
            cooldown_minutes: None,
            requires_proof: true,
            auto_approve: false,
            expires_at: None,
        }
    }
}

impl TaskDraft {
    /// Client-side check before submitting.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.label.trim().is_empty() {
            return Err("Task label is required");
        }
        Ok(())
    }
}

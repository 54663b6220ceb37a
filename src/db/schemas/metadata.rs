//! Creation/update timestamps shared by every top-level document

use bson::DateTime;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Metadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime>,
}

impl Metadata {
    /// Metadata stamped with the current time
    pub fn new() -> Self {
        let now = DateTime::now();
        Self {
            created_at: Some(now),
            updated_at: Some(now),
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Some(DateTime::now());
    }
}

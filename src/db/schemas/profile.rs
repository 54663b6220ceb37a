//! Profile document schema
//!
//! One profile per user. Experience and education are embedded sequences,
//! newest entry first.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for profiles
pub const PROFILE_COLLECTION: &str = "profiles";

/// Social network links
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Social {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub youtube: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facebook: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instagram: Option<String>,
}

/// Scalar profile fields, replaced wholesale on create-or-update
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct ProfileFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    /// Upper-cased on write
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub status: String,
    /// Each skill trimmed and upper-cased on write
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub githubusername: Option<String>,
    #[serde(default)]
    pub social: Social,
}

/// A job held by the profile owner
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Experience {
    pub _id: ObjectId,
    pub title: String,
    pub company: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub from: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(default)]
    pub current: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A school attended by the profile owner
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Education {
    pub _id: ObjectId,
    pub school: String,
    pub degree: String,
    #[serde(rename = "fieldofstudy")]
    pub field_of_study: String,
    pub from: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(default)]
    pub current: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Profile document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ProfileDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    /// Owning user (unique across profiles)
    pub user: ObjectId,

    #[serde(flatten)]
    pub fields: ProfileFields,

    #[serde(default)]
    pub experience: Vec<Experience>,

    #[serde(default)]
    pub education: Vec<Education>,
}

impl ProfileDoc {
    /// A fresh profile with empty history
    pub fn new(user: ObjectId, fields: ProfileFields) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            user,
            fields,
            experience: Vec::new(),
            education: Vec::new(),
        }
    }
}

impl IntoIndexes for ProfileDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "user": 1 },
            Some(
                IndexOptions::builder()
                    .unique(true)
                    .name("user_unique".to_string())
                    .build(),
            ),
        )]
    }
}

impl MutMetadata for ProfileDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_flatten_into_document() {
        let profile = ProfileDoc::new(
            ObjectId::new(),
            ProfileFields {
                status: "Developer".into(),
                skills: vec!["RUST".into()],
                ..ProfileFields::default()
            },
        );

        let doc = bson::to_document(&profile).unwrap();
        assert_eq!(doc.get_str("status").unwrap(), "Developer");
        assert!(doc.get_array("experience").unwrap().is_empty());
        assert!(!doc.contains_key("fields"));
        assert!(!doc.contains_key("company"));
    }

    #[test]
    fn test_education_field_of_study_wire_name() {
        let entry = Education {
            _id: ObjectId::new(),
            school: "MIT".into(),
            degree: "BSc".into(),
            field_of_study: "CS".into(),
            from: "2010-09-01".into(),
            to: None,
            current: true,
            description: None,
        };
        let doc = bson::to_document(&entry).unwrap();
        assert_eq!(doc.get_str("fieldofstudy").unwrap(), "CS");
    }
}

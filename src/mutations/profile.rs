//! Experience and education entries on a profile

use bson::oid::ObjectId;

use crate::db::schemas::{Education, Experience, ProfileDoc};
use crate::mutations::{prepend, remove_by_key};
use crate::types::ConnectorError;

pub fn add_experience(profile: &mut ProfileDoc, entry: Experience) {
    prepend(&mut profile.experience, entry);
}

pub fn remove_experience(
    profile: &mut ProfileDoc,
    id: &ObjectId,
) -> Result<Experience, ConnectorError> {
    remove_by_key(&mut profile.experience, id, "experience")
}

pub fn add_education(profile: &mut ProfileDoc, entry: Education) {
    prepend(&mut profile.education, entry);
}

pub fn remove_education(
    profile: &mut ProfileDoc,
    id: &ObjectId,
) -> Result<Education, ConnectorError> {
    remove_by_key(&mut profile.education, id, "education")
}

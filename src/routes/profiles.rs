//! Profile endpoints
//!
//! - GET    /api/profiles                        - All profiles (public)
//! - GET    /api/profiles/user/:user_id          - One user's profile (public)
//! - GET    /api/profiles/me                     - Caller's profile
//! - POST   /api/profiles                        - Create or update caller's profile
//! - DELETE /api/profiles/me                     - Delete profile, posts and account
//! - PUT    /api/profiles/me/experience          - Add experience
//! - DELETE /api/profiles/me/experience/:exp_id  - Remove experience
//! - PUT    /api/profiles/me/education           - Add education
//! - DELETE /api/profiles/me/education/:edu_id   - Remove education

use bson::oid::ObjectId;
use bytes::Bytes;
use hyper::{HeaderMap, Response};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::auth::authenticate;
use crate::db::schemas::{Education, Experience, ProfileDoc, ProfileFields, Social};
use crate::routes::response::{ok_json, parse_json, parse_object_id, BoxBody};
use crate::routes::views::{education_list, experience_list, ProfileView};
use crate::server::AppState;
use crate::types::{ConnectorError, Result};
use crate::validation::{clean, SkillsInput, Validator};

#[derive(Debug, Default, Deserialize)]
pub struct ProfileRequest {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub skills: Option<SkillsInput>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub githubusername: Option<String>,
    #[serde(default)]
    pub youtube: Option<String>,
    #[serde(default)]
    pub twitter: Option<String>,
    #[serde(default)]
    pub facebook: Option<String>,
    #[serde(default)]
    pub linkedin: Option<String>,
    #[serde(default)]
    pub instagram: Option<String>,
}

impl ProfileRequest {
    fn validate(&self) -> Result<()> {
        let mut validator = Validator::new();
        validator.required("status", self.status.as_deref(), "Status is required");
        if self.skills.as_ref().map_or(true, |s| s.normalize().is_empty()) {
            validator.fail("skills", "Skills is required");
        }
        validator.finish()
    }

    fn into_fields(self) -> ProfileFields {
        ProfileFields {
            company: clean(self.company),
            website: clean(self.website),
            location: clean(self.location).map(|l| l.to_uppercase()),
            status: self.status.unwrap_or_default().trim().to_string(),
            skills: self.skills.map(|s| s.normalize()).unwrap_or_default(),
            bio: clean(self.bio),
            githubusername: clean(self.githubusername),
            social: Social {
                youtube: clean(self.youtube),
                twitter: clean(self.twitter),
                facebook: clean(self.facebook),
                linkedin: clean(self.linkedin),
                instagram: clean(self.instagram),
            },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ExperienceRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub current: Option<bool>,
    #[serde(default)]
    pub description: Option<String>,
}

impl ExperienceRequest {
    fn into_entry(self) -> Result<Experience> {
        Validator::new()
            .required("title", self.title.as_deref(), "Title is required")
            .required("company", self.company.as_deref(), "Company is required")
            .required("from", self.from.as_deref(), "From date is required")
            .finish()?;

        Ok(Experience {
            _id: ObjectId::new(),
            title: self.title.unwrap_or_default().trim().to_string(),
            company: self.company.unwrap_or_default().trim().to_string(),
            location: clean(self.location),
            from: self.from.unwrap_or_default().trim().to_string(),
            to: clean(self.to),
            current: self.current.unwrap_or(false),
            description: clean(self.description),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct EducationRequest {
    #[serde(default)]
    pub school: Option<String>,
    #[serde(default)]
    pub degree: Option<String>,
    #[serde(default)]
    pub fieldofstudy: Option<String>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub current: Option<bool>,
    #[serde(default)]
    pub description: Option<String>,
}

impl EducationRequest {
    fn into_entry(self) -> Result<Education> {
        Validator::new()
            .required("school", self.school.as_deref(), "School is required")
            .required("degree", self.degree.as_deref(), "Degree is required")
            .required(
                "fieldofstudy",
                self.fieldofstudy.as_deref(),
                "Field of study is required",
            )
            .required("from", self.from.as_deref(), "From date is required")
            .finish()?;

        Ok(Education {
            _id: ObjectId::new(),
            school: self.school.unwrap_or_default().trim().to_string(),
            degree: self.degree.unwrap_or_default().trim().to_string(),
            field_of_study: self.fieldofstudy.unwrap_or_default().trim().to_string(),
            from: self.from.unwrap_or_default().trim().to_string(),
            to: clean(self.to),
            current: self.current.unwrap_or(false),
            description: clean(self.description),
        })
    }
}

fn no_profile() -> ConnectorError {
    ConnectorError::NotFound("There is no profile for this user".into())
}

/// Render one profile with its owner looked up now
async fn render(state: &AppState, profile: &ProfileDoc) -> Result<ProfileView> {
    let owner = state.store.find_user(&profile.user).await?;
    Ok(ProfileView::new(profile, owner.as_ref()))
}

/// GET /api/profiles/me
pub async fn my_profile(state: &AppState, headers: &HeaderMap) -> Result<Response<BoxBody>> {
    let caller = authenticate(headers, &state.jwt)?;
    let profile = state
        .store
        .find_profile_by_user(&caller.id)
        .await?
        .ok_or_else(no_profile)?;

    Ok(ok_json(&render(state, &profile).await?))
}

/// POST /api/profiles
pub async fn upsert_profile(
    state: &AppState,
    headers: &HeaderMap,
    body: &Bytes,
) -> Result<Response<BoxBody>> {
    let caller = authenticate(headers, &state.jwt)?;
    let req: ProfileRequest = parse_json(body)?;
    req.validate()?;

    let profile = state
        .store
        .upsert_profile(&caller.id, req.into_fields())
        .await?;

    info!(user = %caller.id, "Saved profile");
    Ok(ok_json(&render(state, &profile).await?))
}

/// GET /api/profiles
pub async fn list_profiles(state: &AppState) -> Result<Response<BoxBody>> {
    let profiles = state.store.list_profiles().await?;
    let owner_ids: Vec<ObjectId> = profiles.iter().map(|p| p.user).collect();
    let owners = state.store.find_users(&owner_ids).await?;

    Ok(ok_json(&ProfileView::populate(&profiles, &owners)))
}

/// GET /api/profiles/user/:user_id
pub async fn profile_by_user(state: &AppState, raw_user_id: &str) -> Result<Response<BoxBody>> {
    let user_id = parse_object_id(raw_user_id, "Profile")?;
    let profile = state
        .store
        .find_profile_by_user(&user_id)
        .await?
        .ok_or_else(|| ConnectorError::NotFound("Profile not found".into()))?;

    Ok(ok_json(&render(state, &profile).await?))
}

/// DELETE /api/profiles/me
///
/// Posts go first, then the profile, then the account itself.
pub async fn delete_account(state: &AppState, headers: &HeaderMap) -> Result<Response<BoxBody>> {
    let caller = authenticate(headers, &state.jwt)?;

    let posts = state.store.delete_posts_by_user(&caller.id).await?;
    state.store.delete_profile_by_user(&caller.id).await?;
    state.store.delete_user(&caller.id).await?;

    info!(user = %caller.id, posts, "Deleted account");
    Ok(ok_json(&json!({ "msg": "User deleted" })))
}

/// PUT /api/profiles/me/experience
pub async fn add_experience(
    state: &AppState,
    headers: &HeaderMap,
    body: &Bytes,
) -> Result<Response<BoxBody>> {
    let caller = authenticate(headers, &state.jwt)?;
    let req: ExperienceRequest = parse_json(body)?;
    let entry = req.into_entry()?;

    let profile = state.store.push_experience(&caller.id, entry).await?;
    Ok(ok_json(&experience_list(&profile.experience)))
}

/// DELETE /api/profiles/me/experience/:exp_id
pub async fn remove_experience(
    state: &AppState,
    headers: &HeaderMap,
    raw_id: &str,
) -> Result<Response<BoxBody>> {
    let caller = authenticate(headers, &state.jwt)?;
    let id = parse_object_id(raw_id, "Experience")?;

    let profile = state.store.pull_experience(&caller.id, &id).await?;
    Ok(ok_json(&experience_list(&profile.experience)))
}

/// PUT /api/profiles/me/education
pub async fn add_education(
    state: &AppState,
    headers: &HeaderMap,
    body: &Bytes,
) -> Result<Response<BoxBody>> {
    let caller = authenticate(headers, &state.jwt)?;
    let req: EducationRequest = parse_json(body)?;
    let entry = req.into_entry()?;

    let profile = state.store.push_education(&caller.id, entry).await?;
    Ok(ok_json(&education_list(&profile.education)))
}

/// DELETE /api/profiles/me/education/:edu_id
pub async fn remove_education(
    state: &AppState,
    headers: &HeaderMap,
    raw_id: &str,
) -> Result<Response<BoxBody>> {
    let caller = authenticate(headers, &state.jwt)?;
    let id = parse_object_id(raw_id, "Education")?;

    let profile = state.store.pull_education(&caller.id, &id).await?;
    Ok(ok_json(&education_list(&profile.education)))
}

//! JSON shapes returned to clients
//!
//! Documents are stored with BSON ids and dates; clients see hex `_id`
//! strings and RFC 3339 timestamps. Password hashes never leave the store.

use std::collections::HashMap;

use bson::{oid::ObjectId, DateTime};
use serde::Serialize;

use crate::db::schemas::{
    Comment, Education, Experience, Like, Metadata, PostDoc, ProfileDoc, Social, UserDoc,
};

fn hex(id: &ObjectId) -> String {
    id.to_hex()
}

fn hex_opt(id: &Option<ObjectId>) -> String {
    id.as_ref().map(hex).unwrap_or_default()
}

fn rfc3339(date: &DateTime) -> String {
    date.to_chrono().to_rfc3339()
}

fn created(metadata: &Metadata) -> Option<String> {
    metadata.created_at.as_ref().map(rfc3339)
}

/// The signed-in user, as returned by `GET /api/auth`
#[derive(Debug, Serialize)]
pub struct UserView {
    pub _id: String,
    pub name: String,
    pub email: String,
    pub avatar: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

impl From<&UserDoc> for UserView {
    fn from(user: &UserDoc) -> Self {
        Self {
            _id: hex_opt(&user._id),
            name: user.name.clone(),
            email: user.email.clone(),
            avatar: user.avatar.clone(),
            date: created(&user.metadata),
        }
    }
}

/// Profile owner, resolved by reference at read time
#[derive(Debug, Serialize)]
pub struct UserRef {
    pub _id: String,
    pub name: String,
    pub avatar: String,
}

impl From<&UserDoc> for UserRef {
    fn from(user: &UserDoc) -> Self {
        Self {
            _id: hex_opt(&user._id),
            name: user.name.clone(),
            avatar: user.avatar.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ExperienceView {
    pub _id: String,
    pub title: String,
    pub company: String,
    pub location: Option<String>,
    pub from: String,
    pub to: Option<String>,
    pub current: bool,
    pub description: Option<String>,
}

impl From<&Experience> for ExperienceView {
    fn from(e: &Experience) -> Self {
        Self {
            _id: hex(&e._id),
            title: e.title.clone(),
            company: e.company.clone(),
            location: e.location.clone(),
            from: e.from.clone(),
            to: e.to.clone(),
            current: e.current,
            description: e.description.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EducationView {
    pub _id: String,
    pub school: String,
    pub degree: String,
    pub fieldofstudy: String,
    pub from: String,
    pub to: Option<String>,
    pub current: bool,
    pub description: Option<String>,
}

impl From<&Education> for EducationView {
    fn from(e: &Education) -> Self {
        Self {
            _id: hex(&e._id),
            school: e.school.clone(),
            degree: e.degree.clone(),
            fieldofstudy: e.field_of_study.clone(),
            from: e.from.clone(),
            to: e.to.clone(),
            current: e.current,
            description: e.description.clone(),
        }
    }
}

pub fn experience_list(entries: &[Experience]) -> Vec<ExperienceView> {
    entries.iter().map(ExperienceView::from).collect()
}

pub fn education_list(entries: &[Education]) -> Vec<EducationView> {
    entries.iter().map(EducationView::from).collect()
}

#[derive(Debug, Serialize)]
pub struct ProfileView {
    pub _id: String,
    /// `null` when the owning account no longer exists
    pub user: Option<UserRef>,
    pub company: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,
    pub status: String,
    pub skills: Vec<String>,
    pub bio: Option<String>,
    pub githubusername: Option<String>,
    pub social: Social,
    pub experience: Vec<ExperienceView>,
    pub education: Vec<EducationView>,
    pub date: Option<String>,
}

impl ProfileView {
    pub fn new(profile: &ProfileDoc, owner: Option<&UserDoc>) -> Self {
        let fields = &profile.fields;
        Self {
            _id: hex_opt(&profile._id),
            user: owner.map(UserRef::from),
            company: fields.company.clone(),
            website: fields.website.clone(),
            location: fields.location.clone(),
            status: fields.status.clone(),
            skills: fields.skills.clone(),
            bio: fields.bio.clone(),
            githubusername: fields.githubusername.clone(),
            social: fields.social.clone(),
            experience: experience_list(&profile.experience),
            education: education_list(&profile.education),
            date: created(&profile.metadata),
        }
    }

    /// Render many profiles against a pre-fetched set of owners
    pub fn populate(profiles: &[ProfileDoc], owners: &[UserDoc]) -> Vec<Self> {
        let by_id: HashMap<ObjectId, &UserDoc> = owners
            .iter()
            .filter_map(|u| u._id.map(|id| (id, u)))
            .collect();

        profiles
            .iter()
            .map(|p| Self::new(p, by_id.get(&p.user).copied()))
            .collect()
    }
}

#[derive(Debug, Serialize)]
pub struct LikeView {
    pub user: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl From<&Like> for LikeView {
    fn from(like: &Like) -> Self {
        Self {
            user: hex(&like.user),
            name: like.name.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CommentView {
    pub _id: String,
    pub user: String,
    pub text: String,
    pub name: String,
    pub avatar: String,
    pub date: String,
}

impl From<&Comment> for CommentView {
    fn from(c: &Comment) -> Self {
        Self {
            _id: hex(&c._id),
            user: hex(&c.user),
            text: c.text.clone(),
            name: c.name.clone(),
            avatar: c.avatar.clone(),
            date: rfc3339(&c.date),
        }
    }
}

pub fn comment_list(comments: &[Comment]) -> Vec<CommentView> {
    comments.iter().map(CommentView::from).collect()
}

#[derive(Debug, Serialize)]
pub struct PostView {
    pub _id: String,
    pub user: String,
    pub text: String,
    pub name: String,
    pub avatar: String,
    pub likes: Vec<LikeView>,
    pub comments: Vec<CommentView>,
    pub date: String,
}

impl From<&PostDoc> for PostView {
    fn from(p: &PostDoc) -> Self {
        Self {
            _id: hex_opt(&p._id),
            user: hex(&p.user),
            text: p.text.clone(),
            name: p.name.clone(),
            avatar: p.avatar.clone(),
            likes: p.likes.iter().map(LikeView::from).collect(),
            comments: comment_list(&p.comments),
            date: rfc3339(&p.date),
        }
    }
}

pub fn post_list(posts: &[PostDoc]) -> Vec<PostView> {
    posts.iter().map(PostView::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schemas::ProfileFields;

    #[test]
    fn test_user_view_hides_password_hash() {
        let mut user = UserDoc::new("Ann".into(), "ann@example.com", "secret-hash".into());
        user._id = Some(ObjectId::new());

        let json = serde_json::to_value(UserView::from(&user)).unwrap();
        assert_eq!(json["_id"], user._id.unwrap().to_hex());
        assert!(json.get("password_hash").is_none());
        assert!(!json.to_string().contains("secret-hash"));
    }

    #[test]
    fn test_populate_resolves_current_owner() {
        let mut owner = UserDoc::new("Ann".into(), "ann@example.com", "h".into());
        let owner_id = ObjectId::new();
        owner._id = Some(owner_id);

        let profile = ProfileDoc::new(
            owner_id,
            ProfileFields {
                status: "Dev".into(),
                ..ProfileFields::default()
            },
        );
        let orphan = ProfileDoc::new(
            ObjectId::new(),
            ProfileFields {
                status: "Gone".into(),
                ..ProfileFields::default()
            },
        );

        // Rename after the profile was created: reads see the new name
        owner.name = "Ann Renamed".into();
        let views = ProfileView::populate(&[profile, orphan], &[owner]);

        assert_eq!(views[0].user.as_ref().unwrap().name, "Ann Renamed");
        assert!(views[1].user.is_none());
    }

    #[test]
    fn test_post_view_ids_are_hex() {
        let author = UserDoc::new("Ann".into(), "ann@example.com", "h".into());
        let author_id = ObjectId::new();
        let mut post = PostDoc::by(&author, author_id, "hi".into());
        post._id = Some(ObjectId::new());
        post.comments.push(Comment::by(&author, author_id, "c".into()));

        let json = serde_json::to_value(PostView::from(&post)).unwrap();
        assert_eq!(json["user"], author_id.to_hex());
        assert!(json["comments"][0]["_id"].is_string());
        assert!(json["date"].as_str().unwrap().contains('T'));
    }
}

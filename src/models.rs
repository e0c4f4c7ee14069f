use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

// --- Identity ---

/// Role
///
/// The RBAC field carried by every user. Decides which dashboard shell and link set the
/// user sees; the client never changes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, Default)]
#[ts(export)]
pub enum Role {
    Admin,
    #[default]
    User,
}

/// UserStatus
///
/// Account activation flag, toggled by administrators from the Users panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, Default)]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub enum UserStatus {
    #[default]
    Active,
    Inactive,
}

impl UserStatus {
    pub fn toggled(self) -> Self {
        match self {
            UserStatus::Active => UserStatus::Inactive,
            UserStatus::Inactive => UserStatus::Active,
        }
    }
}

/// User
///
/// The identity returned by `GET /user/me` and listed in the admin Users panel.
/// A missing `status` from the backend means the account is active.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub status: UserStatus,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
}

// --- Resource Items ---

/// Blog
///
/// A blog post. `author_id` is only present on caller-scoped listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Blog {
    pub id: i64,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub cover_image: String,
    #[serde(default)]
    pub published: bool,
    #[serde(default)]
    pub author_id: Option<String>,
}

/// Project
///
/// A portfolio project card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Project {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
    #[serde(default)]
    pub thumbnail: String,
    #[serde(default)]
    pub live_url: Option<String>,
    #[serde(default)]
    pub repo_url: Option<String>,
    #[serde(default)]
    pub features: Vec<String>,
}

/// Message
///
/// A contact-form submission, read by administrators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Message {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub content: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

// --- Response Envelopes ---

/// DataEnvelope
///
/// The `{ data, message }` wrapper the backend puts around single payloads.
/// `data` is optional because the identity check answers `{ data: null }` for anonymous
/// visitors.
#[derive(Debug, Clone, Deserialize)]
pub struct DataEnvelope<T> {
    pub data: Option<T>,
    pub message: Option<String>,
}

/// PageEnvelope
///
/// The `{ data: [...], total }` wrapper returned by list endpoints. Unpaginated endpoints
/// (`my-*`, `/message/get`) omit `total`.
#[derive(Debug, Clone, Deserialize)]
pub struct PageEnvelope<T> {
    pub data: Vec<T>,
    pub total: Option<u64>,
}

/// AccessToken
///
/// Payload of a successful `POST /auth/login`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessToken {
    pub access_token: String,
}

// --- Request Payloads ---

/// LoginRequest
#[derive(Debug, Clone, Serialize, Default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// RegisterUserRequest
///
/// Input for `POST /user/create-user`. New accounts are standard, active users unless
/// the caller says otherwise.
#[derive(Debug, Clone, Serialize, Default)]
pub struct RegisterUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    pub role: Role,
    pub status: UserStatus,
}

/// UpdateProfileRequest
///
/// Body of `PATCH /user/update-profile`. Only `name` and `phone` are editable.
#[derive(Debug, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub user_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// UpdateUserRequest
///
/// Partial admin-side update of another account (`PATCH /user/update-user/{id}`).
#[derive(Debug, Clone, Serialize, Default)]
pub struct UpdateUserRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<UserStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CreateBlogRequest {
    pub title: String,
    pub content: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub excerpt: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub cover_image: String,
    pub published: bool,
}

/// UpdateBlogRequest
///
/// Partial update: `None` fields are omitted from the JSON body and left untouched
/// server-side.
#[derive(Debug, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBlogRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    pub title: String,
    pub slug: String,
    pub description: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub thumbnail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub live_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo_url: Option<String>,
    pub features: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProjectRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub live_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<String>>,
}

/// CreateMessageRequest
///
/// The public contact form.
#[derive(Debug, Clone, Serialize, Default)]
pub struct CreateMessageRequest {
    pub name: String,
    pub email: String,
    pub content: String,
}

/// split_features
///
/// Turns the comma-separated feature input of the project form into a list,
/// dropping blank entries.
pub fn split_features(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|feature| !feature.is_empty())
        .map(str::to_string)
        .collect()
}

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt::Display;
use std::hash::Hash;

use crate::backend::ApiRequest;
use crate::error::ApiError;
use crate::models::{
    Blog, CreateBlogRequest, CreateMessageRequest, CreateProjectRequest, Message, Project,
    RegisterUserRequest, UpdateBlogRequest, UpdateProjectRequest, UpdateUserRequest, User,
};

/// ResourceKind
///
/// The backend collections a panel can manage. The URL segment doubles as the
/// collection's name in endpoint paths (`/blog/all-blogs`, `/project/create`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Blog,
    Project,
    Message,
    User,
}

impl ResourceKind {
    pub fn segment(self) -> &'static str {
        match self {
            ResourceKind::Blog => "blog",
            ResourceKind::Project => "project",
            ResourceKind::Message => "message",
            ResourceKind::User => "user",
        }
    }
}

/// ListScope
///
/// `All` lists the whole collection page by page; `Mine` lists only the caller's own
/// items through the unpaginated `my-*` endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListScope {
    #[default]
    All,
    Mine,
}

/// Validate
///
/// Client-side checks run before a create request leaves the dashboard.
pub trait Validate {
    fn validate(&self) -> Result<(), ApiError>;
}

/// require
///
/// Fails with a validation error naming `field` when `value` is blank.
pub fn require(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::Validation(format!("{field} is required")));
    }
    Ok(())
}

/// Resource
///
/// Binds an item type to its identifier and the endpoints every panel needs: listing and
/// removal. The default endpoint layout is the backend's common one; resources that
/// deviate override the individual request builders. Creation and editing are separate
/// capabilities (`Creatable`, `Updatable`) because not every collection supports them.
pub trait Resource: Clone + DeserializeOwned + Send + Sync + 'static {
    type Id: Clone + Eq + Hash + Display + Send + Sync + 'static;

    const KIND: ResourceKind;
    /// Human name used in notices ("Blog created successfully").
    const LABEL: &'static str;

    fn id(&self) -> &Self::Id;

    fn list_request(scope: ListScope, page: u32, limit: u32) -> ApiRequest {
        let segment = Self::KIND.segment();
        match scope {
            ListScope::All => ApiRequest::get(format!("/{segment}/all-{segment}s"))
                .query("page", page)
                .query("limit", limit),
            ListScope::Mine => ApiRequest::get(format!("/{segment}/my-{segment}s")),
        }
    }

    fn delete_request(id: &Self::Id) -> ApiRequest {
        ApiRequest::delete(format!("/{}/delete/{}", Self::KIND.segment(), id))
    }
}

/// Creatable
///
/// Collections whose create endpoint answers with the stored item (`{ data: Item }`).
pub trait Creatable: Resource {
    type Create: Serialize + Validate + Send + Sync;

    fn create_request() -> ApiRequest {
        ApiRequest::post(format!("/{}/create", Self::KIND.segment()))
    }
}

/// Updatable
///
/// Collections that accept partial updates and answer with the updated item.
pub trait Updatable: Resource {
    type Update: Serialize + Send + Sync;

    fn update_request(id: &Self::Id) -> ApiRequest {
        ApiRequest::patch(format!("/{}/update/{}", Self::KIND.segment(), id))
    }
}

impl Validate for CreateBlogRequest {
    fn validate(&self) -> Result<(), ApiError> {
        require("Title", &self.title)?;
        require("Content", &self.content)
    }
}

impl Validate for CreateProjectRequest {
    fn validate(&self) -> Result<(), ApiError> {
        if [&self.title, &self.slug, &self.description]
            .iter()
            .any(|value| value.trim().is_empty())
        {
            return Err(ApiError::Validation(
                "Title, slug, and description are required".to_string(),
            ));
        }
        Ok(())
    }
}

impl Validate for CreateMessageRequest {
    fn validate(&self) -> Result<(), ApiError> {
        require("Name", &self.name)?;
        require("Email", &self.email)?;
        require("Message", &self.content)
    }
}

impl Validate for RegisterUserRequest {
    fn validate(&self) -> Result<(), ApiError> {
        require("Name", &self.name)?;
        require("Email", &self.email)?;
        require("Password", &self.password)
    }
}

impl Resource for Blog {
    type Id = i64;

    const KIND: ResourceKind = ResourceKind::Blog;
    const LABEL: &'static str = "Blog";

    fn id(&self) -> &i64 {
        &self.id
    }
}

impl Resource for Project {
    type Id = i64;

    const KIND: ResourceKind = ResourceKind::Project;
    const LABEL: &'static str = "Project";

    fn id(&self) -> &i64 {
        &self.id
    }
}

impl Creatable for Blog {
    type Create = CreateBlogRequest;
}

impl Updatable for Blog {
    type Update = UpdateBlogRequest;
}

impl Creatable for Project {
    type Create = CreateProjectRequest;
}

impl Updatable for Project {
    type Update = UpdateProjectRequest;
}

/// Messages arrive through the public contact form (`ApiClient::send_message`), which the
/// backend only acknowledges, and are never edited. The inbox can list and delete them.
impl Resource for Message {
    type Id = i64;

    const KIND: ResourceKind = ResourceKind::Message;
    const LABEL: &'static str = "Message";

    fn id(&self) -> &i64 {
        &self.id
    }

    // The inbox has a single read endpoint; it honours paging when the backend supports it.
    fn list_request(_scope: ListScope, page: u32, limit: u32) -> ApiRequest {
        ApiRequest::get("/message/get")
            .query("page", page)
            .query("limit", limit)
    }
}

impl Resource for User {
    type Id = String;

    const KIND: ResourceKind = ResourceKind::User;
    const LABEL: &'static str = "User";

    fn id(&self) -> &String {
        &self.id
    }

    // The account endpoints predate the common layout: `/user/all`, `/user/create-user`,
    // `/user/update-user/{id}`. There is no caller-scoped account listing.
    fn list_request(_scope: ListScope, page: u32, limit: u32) -> ApiRequest {
        ApiRequest::get("/user/all")
            .query("page", page)
            .query("limit", limit)
    }
}

impl Creatable for User {
    type Create = RegisterUserRequest;

    fn create_request() -> ApiRequest {
        ApiRequest::post("/user/create-user")
    }
}

impl Updatable for User {
    type Update = UpdateUserRequest;

    fn update_request(id: &String) -> ApiRequest {
        ApiRequest::patch(format!("/user/update-user/{id}"))
    }
}

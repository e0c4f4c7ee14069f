use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::backend::{ApiRequest, BackendState};
use crate::error::ApiError;
use crate::models::{
    AccessToken, CreateMessageRequest, DataEnvelope, LoginRequest, PageEnvelope,
    UpdateProfileRequest, User,
};
use crate::resource::{Creatable, ListScope, Resource, Updatable, Validate, require};

/// Page
///
/// One page of a collection as the backend reported it. `total` counts the whole
/// collection, not just `items`. `paginated` is false when the endpoint returned the
/// whole collection without a `total`.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub paginated: bool,
}

/// LoginReply
#[derive(Debug, Clone, PartialEq)]
pub struct LoginReply {
    pub access_token: String,
    pub message: Option<String>,
}

/// ApiClient
///
/// Typed view of the portfolio REST API. Owns no state beyond the shared backend
/// handle, so it is cheap to clone into every panel.
#[derive(Clone)]
pub struct ApiClient {
    backend: BackendState,
}

impl ApiClient {
    pub fn new(backend: BackendState) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &BackendState {
        &self.backend
    }

    // --- Session ---

    /// me
    ///
    /// The identity check. `Ok(None)` means the backend answered but knows no user.
    pub async fn me(&self) -> Result<Option<User>, ApiError> {
        let body = self.backend.send(ApiRequest::get("/user/me")).await?;
        data_of(body)
    }

    pub async fn login(&self, credentials: &LoginRequest) -> Result<LoginReply, ApiError> {
        require("Email", &credentials.email)?;
        require("Password", &credentials.password)?;

        let body = self
            .backend
            .send(ApiRequest::post("/auth/login").json(to_json(credentials)?))
            .await?;
        let envelope: DataEnvelope<AccessToken> = serde_json::from_value(body)?;
        let token = envelope
            .data
            .ok_or_else(|| ApiError::Decode("login response carried no access token".into()))?;

        Ok(LoginReply {
            access_token: token.access_token,
            message: envelope.message,
        })
    }

    pub async fn logout(&self) -> Result<(), ApiError> {
        self.backend
            .send(ApiRequest::post("/auth/logout").json(Value::Object(Default::default())))
            .await
            .map(|_| ())
    }

    /// update_profile
    ///
    /// Returns the server's copy of the user when it sent one back.
    pub async fn update_profile(
        &self,
        update: &UpdateProfileRequest,
    ) -> Result<Option<User>, ApiError> {
        require("Name", &update.name)?;
        let body = self
            .backend
            .send(ApiRequest::patch("/user/update-profile").json(to_json(update)?))
            .await?;
        // Some deployments answer with a bare 200.
        if body.is_null() {
            return Ok(None);
        }
        data_of(body)
    }

    /// send_message
    ///
    /// The public contact form. The backend only acknowledges; nothing is returned.
    pub async fn send_message(&self, message: &CreateMessageRequest) -> Result<(), ApiError> {
        message.validate()?;
        self.backend
            .send(ApiRequest::post("/message/create").json(to_json(message)?))
            .await
            .map(|_| ())
    }

    // --- Resources ---

    /// list
    ///
    /// Fetches one page of `R`. Endpoints that do not report `total` are treated as a
    /// single page holding the whole result.
    pub async fn list<R: Resource>(
        &self,
        scope: ListScope,
        page: u32,
        limit: u32,
    ) -> Result<Page<R>, ApiError> {
        let body = self
            .backend
            .send(R::list_request(scope, page, limit))
            .await?;
        let envelope: PageEnvelope<R> = serde_json::from_value(body)?;
        let paginated = envelope.total.is_some();
        let total = envelope.total.unwrap_or(envelope.data.len() as u64);
        Ok(Page {
            items: envelope.data,
            total,
            paginated,
        })
    }

    /// create
    ///
    /// Validates `fields` and posts them. The returned item carries the server-assigned id.
    pub async fn create<R: Creatable>(&self, fields: &R::Create) -> Result<R, ApiError> {
        fields.validate()?;
        let body = self
            .backend
            .send(R::create_request().json(to_json(fields)?))
            .await?;
        required_data(body)
    }

    pub async fn update<R: Updatable>(
        &self,
        id: &R::Id,
        fields: &R::Update,
    ) -> Result<R, ApiError> {
        let body = self
            .backend
            .send(R::update_request(id).json(to_json(fields)?))
            .await?;
        required_data(body)
    }

    pub async fn delete<R: Resource>(&self, id: &R::Id) -> Result<(), ApiError> {
        self.backend.send(R::delete_request(id)).await.map(|_| ())
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Value, ApiError> {
    Ok(serde_json::to_value(value)?)
}

fn data_of<T: DeserializeOwned>(body: Value) -> Result<Option<T>, ApiError> {
    let envelope: DataEnvelope<T> = serde_json::from_value(body)?;
    Ok(envelope.data)
}

fn required_data<T: DeserializeOwned>(body: Value) -> Result<T, ApiError> {
    data_of(body)?.ok_or_else(|| ApiError::Decode("response carried no data".into()))
}

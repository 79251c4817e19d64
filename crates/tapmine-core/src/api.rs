//! Typed REST endpoints over a pluggable transport.
//!
//! [`Transport`] is the only part that touches the network. The browser
//! build implements it with `fetch`; tests use an in-memory double.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::airdrop::{Airdrop, AirdropCriterion};
use crate::category::{CategoryDraft, TaskCategory};
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::session::{CollectResponse, MiningStatus, StartResponse};
use crate::store::MiningOp;
use crate::task::{Task, TaskDraft};
use crate::user::{AuthResponse, TelegramIdentity, User};
use crate::wallet::WalletConnection;
use crate::wire::unwrap_data;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

/// Request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    Empty,
    /// Serialized JSON, sent as `application/json`.
    Json(String),
    /// Multipart form fields.
    Form(Vec<(String, String)>),
}

/// A fully resolved request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub body: Body,
    /// Error text used when a failure response has no message of its own.
    pub fallback: &'static str,
}

/// Sends requests and returns the body of successful responses.
///
/// Implementations map non-2xx statuses with [`ApiError::from_body`] and
/// attach the bearer token, once set, to every request.
#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn send(&self, request: ApiRequest) -> Result<String, ApiError>;

    fn set_bearer_token(&self, token: Option<String>);
}

/// Flatten a draft into multipart fields.
///
/// `null` fields are skipped, booleans become `1`/`0` and nested values
/// are sent as JSON text.
pub fn form_fields<T: Serialize>(draft: &T) -> Result<Vec<(String, String)>, ApiError> {
    let Value::Object(map) = serde_json::to_value(draft)? else {
        return Err(ApiError::Decode("form body must be an object".into()));
    };

    Ok(map
        .into_iter()
        .filter_map(|(key, value)| {
            let text = match value {
                Value::Null => return None,
                Value::Bool(b) => (if b { "1" } else { "0" }).to_string(),
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                nested => nested.to_string(),
            };
            Some((key, text))
        })
        .collect())
}

/// Decode a body, stripping a `{ "data": ... }` envelope first.
pub fn decode_data<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    let value: Value = serde_json::from_str(body)?;
    Ok(serde_json::from_value(unwrap_data(value))?)
}

/// Decode a created/updated record if the body actually contains one.
///
/// Some admin endpoints answer with just `{ "message": ... }`.
pub fn decode_record<T: DeserializeOwned>(body: &str) -> Result<Option<T>, ApiError> {
    if body.trim().is_empty() {
        return Ok(None);
    }

    let value = unwrap_data(serde_json::from_str(body)?);
    if value.get("id").is_none() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_value(value)?))
}

/// The game's REST API.
#[derive(Debug)]
pub struct GameApi<T> {
    transport: T,
    config: ClientConfig,
}

impl<T: Transport> GameApi<T> {
    pub fn new(transport: T, config: ClientConfig) -> Self {
        GameApi { transport, config }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    // ---- mining ----

    pub async fn mining_status(&self) -> Result<MiningStatus, ApiError> {
        let fallback = MiningOp::Status.fallback_message();
        let body = self.call(Method::Get, "/mining/status", Body::Empty, fallback).await?;
        Ok(serde_json::from_str(&body)?)
    }

    pub async fn start_mining(&self) -> Result<StartResponse, ApiError> {
        let fallback = MiningOp::Start.fallback_message();
        let body = self.call(Method::Post, "/mining/start", Body::Empty, fallback).await?;
        Ok(serde_json::from_str(&body)?)
    }

    pub async fn collect_mining(&self) -> Result<CollectResponse, ApiError> {
        let fallback = MiningOp::Collect.fallback_message();
        let body = self.call(Method::Post, "/mining/collect", Body::Empty, fallback).await?;
        Ok(serde_json::from_str(&body)?)
    }

    // ---- users ----

    pub async fn telegram_auth(&self, identity: &TelegramIdentity) -> Result<User, ApiError> {
        let body = self
            .call(Method::Post, "/admin/auth/telegram", json_body(identity)?, "Auth failed")
            .await?;
        Ok(serde_json::from_str::<AuthResponse>(&body)?.into_user())
    }

    pub async fn fetch_users(&self) -> Result<Vec<User>, ApiError> {
        let body = self.call(Method::Get, "/users", Body::Empty, "Failed to fetch users").await?;
        decode_data(&body)
    }

    pub async fn fetch_user(&self, id: u64) -> Result<User, ApiError> {
        let path = format!("/users/{id}");
        let body = self.call(Method::Get, &path, Body::Empty, "Failed to fetch user").await?;
        decode_data(&body)
    }

    pub async fn create_user(&self, user: &User) -> Result<Option<User>, ApiError> {
        let body = self
            .call(Method::Post, "/admin/create-user", json_body(user)?, "Failed to add user")
            .await?;
        decode_record(&body)
    }

    pub async fn update_user(&self, id: u64, user: &User) -> Result<Option<User>, ApiError> {
        let path = format!("/admin/users/{id}");
        let body = self.call(Method::Put, &path, json_body(user)?, "Failed to update user").await?;
        decode_record(&body)
    }

    pub async fn delete_user(&self, id: u64) -> Result<(), ApiError> {
        let path = format!("/admin/users/{id}");
        self.call(Method::Delete, &path, Body::Empty, "Failed to delete user").await?;
        Ok(())
    }

    // ---- tasks ----

    pub async fn fetch_tasks(&self) -> Result<Vec<Task>, ApiError> {
        let body = self.call(Method::Get, "/tasks", Body::Empty, "Failed to load tasks").await?;
        decode_data(&body)
    }

    pub async fn fetch_task(&self, id: u64) -> Result<Task, ApiError> {
        let path = format!("/tasks/{id}");
        let body = self.call(Method::Get, &path, Body::Empty, "Failed to load task").await?;
        decode_data(&body)
    }

    pub async fn create_task(&self, draft: &TaskDraft) -> Result<Option<Task>, ApiError> {
        let form = Body::Form(form_fields(draft)?);
        let body = self.call(Method::Post, "/admin/tasks", form, "Failed to create task").await?;
        decode_record(&body)
    }

    /// Multipart PUT is tunnelled through POST with a `_method` field.
    pub async fn update_task(&self, id: u64, draft: &TaskDraft) -> Result<Option<Task>, ApiError> {
        let mut fields = form_fields(draft)?;
        fields.push(("_method".to_string(), "PUT".to_string()));

        let path = format!("/admin/tasks/{id}");
        let body = self
            .call(Method::Post, &path, Body::Form(fields), "Failed to update task")
            .await?;
        decode_record(&body)
    }

    pub async fn delete_task(&self, id: u64) -> Result<(), ApiError> {
        let path = format!("/admin/tasks/{id}");
        self.call(Method::Delete, &path, Body::Empty, "Failed to delete task").await?;
        Ok(())
    }

    // ---- task categories ----

    pub async fn fetch_categories(&self) -> Result<Vec<TaskCategory>, ApiError> {
        let body = self
            .call(Method::Get, "/task-categories", Body::Empty, "Failed to fetch task categories")
            .await?;
        decode_data(&body)
    }

    pub async fn fetch_category(&self, id: u64) -> Result<TaskCategory, ApiError> {
        let path = format!("/task-categories/{id}");
        let body = self.call(Method::Get, &path, Body::Empty, "Failed to fetch task category").await?;
        decode_data(&body)
    }

    pub async fn create_category(&self, draft: &CategoryDraft) -> Result<Option<TaskCategory>, ApiError> {
        let form = Body::Form(form_fields(draft)?);
        let body = self
            .call(Method::Post, "/admin/task-categories", form, "Failed to add task category")
            .await?;
        decode_record(&body)
    }

    pub async fn update_category(
        &self,
        id: u64,
        draft: &CategoryDraft,
    ) -> Result<Option<TaskCategory>, ApiError> {
        let mut fields = form_fields(draft)?;
        fields.push(("_method".to_string(), "PUT".to_string()));

        let path = format!("/admin/task-categories/{id}?_method=PUT");
        let body = self
            .call(Method::Post, &path, Body::Form(fields), "Failed to update task category")
            .await?;
        decode_record(&body)
    }

    pub async fn delete_category(&self, id: u64) -> Result<(), ApiError> {
        let path = format!("/admin/task-categories/{id}");
        self.call(Method::Delete, &path, Body::Empty, "Delete failed").await?;
        Ok(())
    }

    // ---- airdrop & wallet ----

    /// `None` when no airdrop is running.
    pub async fn active_airdrop(&self) -> Result<Option<Airdrop>, ApiError> {
        let body = self
            .call(Method::Get, "/airdrop/active", Body::Empty, "Failed to fetch airdrop")
            .await?;
        decode_record(&body)
    }

    pub async fn airdrop_criteria(&self) -> Result<Vec<AirdropCriterion>, ApiError> {
        let body = self
            .call(Method::Get, "/airdrop/criteria", Body::Empty, "Failed to fetch airdrop criteria")
            .await?;
        decode_data(&body)
    }

    pub async fn connect_wallet(&self, wallet: &WalletConnection) -> Result<Value, ApiError> {
        let body = self
            .call(Method::Post, "/wallets/connect", json_body(wallet)?, "Failed to connect wallet")
            .await?;
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }

    async fn call(
        &self,
        method: Method,
        path: &str,
        body: Body,
        fallback: &'static str,
    ) -> Result<String, ApiError> {
        let request = ApiRequest {
            method,
            url: self.config.endpoint(path),
            body,
            fallback,
        };
        self.transport.send(request).await
    }
}

fn json_body<T: Serialize>(value: &T) -> Result<Body, ApiError> {
    Ok(Body::Json(serde_json::to_string(value)?))
}

#[cfg(test)]
pub(crate) mod mock {
    //! In-memory transport for tests.

    use std::cell::RefCell;
    use std::collections::VecDeque;

    use super::*;

    #[derive(Default)]
    pub struct MockTransport {
        responses: RefCell<VecDeque<Result<String, ApiError>>>,
        pub requests: RefCell<Vec<ApiRequest>>,
        pub token: RefCell<Option<String>>,
    }

    impl MockTransport {
        pub fn reply(&self, body: &str) -> &Self {
            self.responses.borrow_mut().push_back(Ok(body.to_string()));
            self
        }

        pub fn fail(&self, err: ApiError) -> &Self {
            self.responses.borrow_mut().push_back(Err(err));
            self
        }

        pub fn urls(&self) -> Vec<(Method, String)> {
            self.requests
                .borrow()
                .iter()
                .map(|r| (r.method, r.url.clone()))
                .collect()
        }
    }

    impl Transport for MockTransport {
        async fn send(&self, request: ApiRequest) -> Result<String, ApiError> {
            self.requests.borrow_mut().push(request);
            self.responses
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Err(ApiError::Network("no scripted response".into())))
        }

        fn set_bearer_token(&self, token: Option<String>) {
            *self.token.borrow_mut() = token;
        }
    }
}

//! `fetch`-based transport for the game API.

use std::cell::RefCell;

use tapmine_core::{ApiError, ApiRequest, Body, Transport};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{FormData, Request, RequestInit, RequestMode, Response};

/// Sends [`ApiRequest`]s with the browser's `fetch`, adding the bearer
/// token once one is known.
#[derive(Debug, Default)]
pub struct FetchApi {
    /// Bearer token from the Telegram auth exchange.
    token: RefCell<Option<String>>,
}

impl FetchApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_token(&self) -> bool {
        self.token.borrow().is_some()
    }

    fn build_request(&self, request: &ApiRequest) -> Result<Request, JsValue> {
        let opts = RequestInit::new();
        opts.set_method(request.method.as_str());
        opts.set_mode(RequestMode::Cors);

        let mut content_type = None;
        match &request.body {
            Body::Empty => {}
            Body::Json(json) => {
                opts.set_body(&JsValue::from_str(json));
                content_type = Some("application/json");
            }
            Body::Form(fields) => {
                // the browser sets the multipart boundary itself
                let form = FormData::new()?;
                for (key, value) in fields {
                    form.append_with_str(key, value)?;
                }
                opts.set_body(&form);
            }
        }

        let req = Request::new_with_str_and_init(&request.url, &opts)?;
        let headers = req.headers();
        headers.set("Accept", "application/json")?;
        if let Some(content_type) = content_type {
            headers.set("Content-Type", content_type)?;
        }
        if let Some(token) = self.token.borrow().as_deref() {
            headers.set("Authorization", &format!("Bearer {}", token))?;
        }

        Ok(req)
    }
}

impl Transport for FetchApi {
    async fn send(&self, request: ApiRequest) -> Result<String, ApiError> {
        let req = self.build_request(&request).map_err(network_error)?;

        let window = web_sys::window().ok_or_else(|| ApiError::Network("No window".into()))?;
        let resp_value = JsFuture::from(window.fetch_with_request(&req))
            .await
            .map_err(network_error)?;
        let resp: Response = resp_value.dyn_into().map_err(network_error)?;

        let text_promise = resp.text().map_err(network_error)?;
        let text = JsFuture::from(text_promise)
            .await
            .map_err(network_error)?
            .as_string()
            .unwrap_or_default();

        if !resp.ok() {
            return Err(ApiError::from_body(resp.status(), &text, request.fallback));
        }

        Ok(text)
    }

    fn set_bearer_token(&self, token: Option<String>) {
        *self.token.borrow_mut() = token;
    }
}

/// Describe a rejected JS promise or failed DOM call.
fn network_error(err: JsValue) -> ApiError {
    let message = err
        .as_string()
        .or_else(|| {
            err.dyn_ref::<js_sys::Error>()
                .map(|e| String::from(e.message()))
        })
        .unwrap_or_else(|| format!("{:?}", err));
    ApiError::Network(message)
}

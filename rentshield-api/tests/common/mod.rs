//! Common test utilities for the HTTP tests
//!
//! Builds the router over a fresh in-memory store, seeds an admin, two
//! landlords and one tenant per landlord, and drives requests in-process with
//! `tower::ServiceExt::oneshot`.

#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use rentshield_api::{
    app::{build_router, AppState},
    config::Config,
};
use rentshield_shared::{
    auth::middleware::AuthContext,
    models::user::UserRole,
    services::identity::NewUser,
    store::{memory::MemoryStore, SharedStore},
};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const LANDLORD_EMAIL: &str = "lena@example.com";
pub const OTHER_LANDLORD_EMAIL: &str = "mark@example.com";
pub const TENANT_EMAIL: &str = "tom@example.com";
pub const OTHER_TENANT_EMAIL: &str = "tia@example.com";
pub const PASSWORD: &str = "password-123";

/// Multipart boundary used by [`TestContext::upload`]
const BOUNDARY: &str = "rentshield-test-boundary";

/// Response pieces a test inspects
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

/// App plus seeded accounts
pub struct TestContext {
    pub app: Router,
    pub state: AppState,
    pub admin_id: Uuid,
    pub landlord_id: Uuid,
    pub other_landlord_id: Uuid,
    pub tenant_id: Uuid,
    pub other_tenant_id: Uuid,
}

impl TestContext {
    pub async fn new() -> anyhow::Result<Self> {
        let store: SharedStore = Arc::new(MemoryStore::new());
        let state = AppState::new(store, Config::in_memory());

        let admin = state
            .identity
            .bootstrap_admin("Ada Admin", ADMIN_EMAIL, PASSWORD)
            .await?
            .ok_or_else(|| anyhow::anyhow!("admin already existed"))?;
        let admin_ctx = AuthContext::new(admin.id, UserRole::Admin, Uuid::new_v4());

        let create = |name: &str, email: &str, role: UserRole, landlord_id: Option<Uuid>| NewUser {
            name: name.to_string(),
            email: email.to_string(),
            password: PASSWORD.to_string(),
            role: Some(role),
            landlord_id,
        };

        let landlord = state
            .identity
            .create_user(&admin_ctx, create("Lena Landlord", LANDLORD_EMAIL, UserRole::Landlord, None))
            .await?;
        let other_landlord = state
            .identity
            .create_user(
                &admin_ctx,
                create("Mark Landlord", OTHER_LANDLORD_EMAIL, UserRole::Landlord, None),
            )
            .await?;
        let tenant = state
            .identity
            .create_user(
                &admin_ctx,
                create("Tom Tenant", TENANT_EMAIL, UserRole::Tenant, Some(landlord.id)),
            )
            .await?;
        let other_tenant = state
            .identity
            .create_user(
                &admin_ctx,
                create("Tia Tenant", OTHER_TENANT_EMAIL, UserRole::Tenant, Some(other_landlord.id)),
            )
            .await?;

        Ok(Self {
            app: build_router(state.clone()),
            state,
            admin_id: admin.id,
            landlord_id: landlord.id,
            other_landlord_id: other_landlord.id,
            tenant_id: tenant.id,
            other_tenant_id: other_tenant.id,
        })
    }

    /// Sends one request; `cookie` is a `name=value` pair
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        self.dispatch(request).await
    }

    /// Sends `body` verbatim as JSON, well-formed or not
    pub async fn send_raw(&self, method: Method, uri: &str, cookie: &str, body: &str) -> TestResponse {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::COOKIE, cookie)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        self.dispatch(request).await
    }

    pub async fn get(&self, uri: &str, cookie: &str) -> TestResponse {
        self.send(Method::GET, uri, Some(cookie), None).await
    }

    pub async fn post(&self, uri: &str, cookie: &str, body: Value) -> TestResponse {
        self.send(Method::POST, uri, Some(cookie), Some(body)).await
    }

    pub async fn patch(&self, uri: &str, cookie: &str, body: Value) -> TestResponse {
        self.send(Method::PATCH, uri, Some(cookie), Some(body)).await
    }

    /// Posts `count` small files in the multipart `files` field
    pub async fn upload(&self, uri: &str, cookie: &str, count: usize) -> TestResponse {
        let mut body = String::new();
        for i in 0..count {
            body.push_str(&format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"photo-{i}.jpg\"\r\nContent-Type: image/jpeg\r\n\r\nfake-jpeg-{i}\r\n"
            ));
        }
        body.push_str(&format!("--{BOUNDARY}--\r\n"));

        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::COOKIE, cookie)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();

        self.dispatch(request).await
    }

    /// Logs in and returns the `name=value` session cookie pair
    pub async fn login(&self, email: &str) -> String {
        let response = self
            .send(
                Method::POST,
                "/v1/auth/login",
                None,
                Some(serde_json::json!({ "email": email, "password": PASSWORD })),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "login failed: {}", response.body);

        session_cookie_pair(&response.headers).expect("login sets the session cookie")
    }

    async fn dispatch(&self, request: Request<Body>) -> TestResponse {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }
}

/// `rentshield_token=<value>` from a `Set-Cookie` header
pub fn session_cookie_pair(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("rentshield_token="))
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}

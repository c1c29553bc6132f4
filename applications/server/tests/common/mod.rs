/// Common test utilities and fixtures
use accounts_core::AccountStore;
use accounts_server::{api, config::ServerConfig, state::AppState};
use accounts_storage::LocalStorageContext;
use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt;

/// Router and state over a temp-file database that is removed on drop
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    _temp_dir: TempDir,
}

/// Configuration with a test secret and the cheapest bcrypt cost
pub fn test_config() -> ServerConfig {
    let mut config = ServerConfig::default();
    config.auth.jwt_secret = "test-secret-key".to_string();
    config.auth.bcrypt_cost = 4;
    config
}

/// Create a test app with migrations applied
pub async fn create_test_app() -> TestApp {
    create_test_app_with(test_config()).await
}

pub async fn create_test_app_with(config: ServerConfig) -> TestApp {
    create_test_app_with_store(config, |store| Arc::new(store) as Arc<dyn AccountStore>).await
}

/// Create a test app whose store is wrapped before the state is built
pub async fn create_test_app_with_store<F>(config: ServerConfig, wrap: F) -> TestApp
where
    F: FnOnce(LocalStorageContext) -> Arc<dyn AccountStore>,
{
    let temp_dir = TempDir::new().unwrap();
    let db_url = format!("sqlite://{}", temp_dir.path().join("test.db").display());

    let store = LocalStorageContext::open(&db_url, 5).await.unwrap();
    let state = AppState::new(wrap(store), &config);

    TestApp {
        router: api::router(state.clone()),
        state,
        _temp_dir: temp_dir,
    }
}

/// Response parts a test usually inspects
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestApp {
    /// Send a request with an optional JSON body and bearer token
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_string(&body).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        self.send(request).await
    }

    /// Send a prepared request
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
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

    /// Register a user through the API, returning its id
    pub async fn register(&self, name: &str, email: &str, password: &str, age: i64) -> String {
        let response = self
            .request(
                Method::POST,
                "/api/users/register",
                Some(serde_json::json!({
                    "name": name,
                    "email": email,
                    "password": password,
                    "age": age,
                })),
                None,
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        response.body["id"].as_str().unwrap().to_string()
    }

    /// Log in through the API, returning the access token
    pub async fn login(&self, email: &str, password: &str) -> String {
        let response = self
            .request(
                Method::POST,
                "/api/users/login",
                Some(serde_json::json!({ "email": email, "password": password })),
                None,
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.body);
        response.body["access_token"].as_str().unwrap().to_string()
    }

    /// Register a user and log in as them
    pub async fn register_and_login(&self, name: &str, email: &str) -> (String, String) {
        let id = self.register(name, email, fixtures::TEST_PASSWORD, 30).await;
        let token = self.login(email, fixtures::TEST_PASSWORD).await;
        (id, token)
    }
}

/// Test user credentials
pub mod fixtures {
    pub const TEST_PASSWORD: &str = "TestPassword123!";
}

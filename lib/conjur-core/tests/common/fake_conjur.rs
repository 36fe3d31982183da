use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use conjur_core::{AuthToken, BoxFuture, ConjurError, Credentials, Endpoints, TokenProvider};

/// Password or API key the fake authentication service refuses.
pub const WRONG_SECRET: &str = "wrong";

/// In-memory directory and secrets service.
#[derive(Debug, Default)]
pub struct FakeConjur {
    users: Mutex<HashMap<String, Value>>,
    variables: Mutex<HashMap<String, StoredVariable>>,
    secrets: Mutex<HashMap<String, String>>,
    tokens: Mutex<HashSet<String>>,
    hidden: Mutex<HashSet<String>>,
    logins: AtomicUsize,
    requests: AtomicUsize,
    sequence: AtomicUsize,
}

#[derive(Debug, Clone)]
struct StoredVariable {
    record: Value,
    values: Vec<String>,
}

impl FakeConjur {
    /// Issues a token accepted until [`FakeConjur::revoke_tokens`].
    pub fn issue_token(&self, login: &str) -> AuthToken {
        let count = self.logins.fetch_add(1, Ordering::SeqCst) + 1;
        let raw = format!(r#"{{"data":"{login}","sequence":{count}}}"#);
        self.tokens.lock().expect("lock").insert(raw.clone());
        AuthToken::new(raw)
    }

    /// Makes every issued token expire.
    pub fn revoke_tokens(&self) {
        self.tokens.lock().expect("lock").clear();
    }

    /// Answers `403` for the user or variable `id`.
    pub fn hide(&self, id: &str) {
        self.hidden.lock().expect("lock").insert(id.to_string());
    }

    /// Number of logins done through [`FakeAuthn`] or [`FakeConjur::issue_token`].
    pub fn logins(&self) -> usize {
        self.logins.load(Ordering::SeqCst)
    }

    /// Number of authenticated requests received, rejected ones included.
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// The stored secret for `id`, if any.
    pub fn secret(&self, id: &str) -> Option<String> {
        self.secrets.lock().expect("lock").get(id).cloned()
    }

    fn authorize(&self, headers: &HeaderMap) -> Result<(), Response> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let token = headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Token token=\""))
            .and_then(|value| value.strip_suffix('"'))
            .and_then(|value| STANDARD.decode(value).ok())
            .and_then(|bytes| String::from_utf8(bytes).ok());

        match token {
            Some(token) if self.tokens.lock().expect("lock").contains(&token) => Ok(()),
            _ => Err((StatusCode::UNAUTHORIZED, "Unauthorized").into_response()),
        }
    }

    fn check_visible(&self, id: &str) -> Result<(), Response> {
        if self.hidden.lock().expect("lock").contains(id) {
            return Err((StatusCode::FORBIDDEN, "Forbidden").into_response());
        }
        Ok(())
    }
}

/// Token provider logging in against [`FakeConjur`].
#[derive(Debug)]
pub struct FakeAuthn {
    state: Arc<FakeConjur>,
}

impl FakeAuthn {
    pub fn new(state: Arc<FakeConjur>) -> Self {
        Self { state }
    }
}

impl TokenProvider for FakeAuthn {
    fn login<'a>(
        &'a self,
        credentials: &'a Credentials,
    ) -> BoxFuture<'a, Result<AuthToken, ConjurError>> {
        Box::pin(async move {
            // Let concurrent callers pile up on the login
            tokio::time::sleep(Duration::from_millis(20)).await;
            let secret = match credentials {
                Credentials::Password { password, .. } => password.as_str(),
                Credentials::ApiKey { api_key, .. } => api_key.as_str(),
            };
            if secret == WRONG_SECRET {
                return Err(ConjurError::from_status(401, "Authentication failed"));
            }
            Ok(self.state.issue_token(credentials.login()))
        })
    }
}

/// Fake server bound to a random local port, stopped on drop.
#[derive(Debug)]
pub struct TestServer {
    pub base_url: String,
    pub state: Arc<FakeConjur>,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub async fn start() -> anyhow::Result<Self> {
        let state = Arc::new(FakeConjur::default());
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let address = listener.local_addr()?;
        let app = router(Arc::clone(&state));

        let handle = tokio::spawn(async move {
            if let Err(error) = axum::serve(listener, app).await {
                tracing::error!(%error, "fake conjur stopped");
            }
        });

        Ok(Self {
            base_url: format!("http://{address}"),
            state,
            handle,
        })
    }

    pub fn endpoints(&self) -> Endpoints {
        Endpoints::from_appliance_url(&self.base_url).expect("valid endpoints")
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn router(state: Arc<FakeConjur>) -> Router {
    Router::new()
        .route("/api/users", post(create_user))
        .route("/api/users/{login}", get(get_user))
        .route("/api/variables", post(create_variable))
        .route("/api/variables/{id}", get(get_variable))
        .route("/api/variables/{id}/values", post(add_value))
        .route("/api/variables/{id}/value", get(get_value))
        .route("/api/slow", get(slow))
        .route("/secrets/{*id}", get(read_secret).post(write_secret))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct NewUser {
    login: String,
    password: Option<String>,
}

async fn create_user(
    State(state): State<Arc<FakeConjur>>,
    headers: HeaderMap,
    Form(form): Form<NewUser>,
) -> Result<Response, Response> {
    state.authorize(&headers)?;
    let mut users = state.users.lock().expect("lock");
    if users.contains_key(&form.login) {
        return Err((StatusCode::CONFLICT, "login already taken").into_response());
    }
    let uidnumber = 1100 + users.len();
    let user = json!({
        "login": form.login,
        "userid": "admin",
        "ownerid": "demo:user:admin",
        "uidnumber": uidnumber,
        "roleid": format!("demo:user:{}", form.login),
        "resource_identifier": format!("demo:user:{}", form.login),
        "has_password": form.password.is_some(),
    });
    users.insert(form.login.clone(), user.clone());

    let mut created = user;
    created["api_key"] = json!(format!("api-key-for-{}", form.login));
    Ok((StatusCode::CREATED, Json(created)).into_response())
}

async fn get_user(
    State(state): State<Arc<FakeConjur>>,
    headers: HeaderMap,
    Path(login): Path<String>,
) -> Result<Response, Response> {
    state.authorize(&headers)?;
    state.check_visible(&login)?;
    let users = state.users.lock().expect("lock");
    match users.get(&login) {
        Some(user) => Ok(Json(user.clone()).into_response()),
        None => Err((StatusCode::NOT_FOUND, format!("User '{login}' not found")).into_response()),
    }
}

#[derive(Debug, Deserialize)]
struct NewVariable {
    mime_type: String,
    kind: String,
    id: Option<String>,
}

async fn create_variable(
    State(state): State<Arc<FakeConjur>>,
    headers: HeaderMap,
    Form(form): Form<NewVariable>,
) -> Result<Response, Response> {
    state.authorize(&headers)?;
    let id = form.id.unwrap_or_else(|| {
        let sequence = state.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        format!("generated-{sequence}")
    });
    let mut variables = state.variables.lock().expect("lock");
    if variables.contains_key(&id) {
        return Err((StatusCode::CONFLICT, format!("Variable '{id}' exists")).into_response());
    }
    let record = json!({
        "id": id,
        "userid": "admin",
        "mime_type": form.mime_type,
        "kind": form.kind,
        "ownerid": "demo:user:admin",
        "resource_identifier": format!("demo:variable:{id}"),
        "version_count": 0,
    });
    variables.insert(
        id,
        StoredVariable {
            record: record.clone(),
            values: Vec::new(),
        },
    );
    Ok((StatusCode::CREATED, Json(record)).into_response())
}

async fn get_variable(
    State(state): State<Arc<FakeConjur>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Response, Response> {
    state.authorize(&headers)?;
    state.check_visible(&id)?;
    let variables = state.variables.lock().expect("lock");
    let variable = variables.get(&id).ok_or_else(|| not_found(&id))?;
    let mut record = variable.record.clone();
    record["version_count"] = json!(variable.values.len());
    Ok(Json(record).into_response())
}

#[derive(Debug, Deserialize)]
struct NewValue {
    value: String,
}

async fn add_value(
    State(state): State<Arc<FakeConjur>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Form(form): Form<NewValue>,
) -> Result<Response, Response> {
    state.authorize(&headers)?;
    state.check_visible(&id)?;
    let mut variables = state.variables.lock().expect("lock");
    let variable = variables.get_mut(&id).ok_or_else(|| not_found(&id))?;
    variable.values.push(form.value);
    Ok(StatusCode::CREATED.into_response())
}

#[derive(Debug, Deserialize)]
struct ValueQuery {
    version: Option<usize>,
}

async fn get_value(
    State(state): State<Arc<FakeConjur>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(query): Query<ValueQuery>,
) -> Result<Response, Response> {
    state.authorize(&headers)?;
    state.check_visible(&id)?;
    let variables = state.variables.lock().expect("lock");
    let variable = variables.get(&id).ok_or_else(|| not_found(&id))?;
    let value = match query.version {
        Some(version) => version
            .checked_sub(1)
            .and_then(|index| variable.values.get(index)),
        None => variable.values.last(),
    };
    value
        .map(|value| value.clone().into_response())
        .ok_or_else(|| not_found(&id))
}

async fn slow(State(state): State<Arc<FakeConjur>>, headers: HeaderMap) -> Result<Response, Response> {
    state.authorize(&headers)?;
    tokio::time::sleep(Duration::from_secs(5)).await;
    Ok("finally".into_response())
}

async fn read_secret(
    State(state): State<Arc<FakeConjur>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Response, Response> {
    state.authorize(&headers)?;
    state.check_visible(&id)?;
    state
        .secret(&id)
        .map(IntoResponse::into_response)
        .ok_or_else(|| not_found(&id))
}

async fn write_secret(
    State(state): State<Arc<FakeConjur>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: String,
) -> Result<Response, Response> {
    state.authorize(&headers)?;
    state.check_visible(&id)?;
    state.secrets.lock().expect("lock").insert(id, body);
    Ok(StatusCode::CREATED.into_response())
}

fn not_found(id: &str) -> Response {
    (StatusCode::NOT_FOUND, format!("'{id}' not found")).into_response()
}

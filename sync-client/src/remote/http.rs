//! JSON-over-HTTP remote store client.
//!
//! Routes:
//!
//! | Call     | Request                      | Response        |
//! |----------|------------------------------|-----------------|
//! | `list`   | `GET /todos`                 | `[TodoItem]`    |
//! | `add`    | `POST /todos` + draft        | `{"id": "..."}` |
//! | `update` | `PUT /todos/{id}` + fields   | empty           |
//! | `toggle` | `POST /todos/{id}/toggle`    | empty           |
//! | `delete` | `DELETE /todos/{id}`         | empty           |

use super::{RemoteError, RemoteStore};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use sync_types::{Priority, TodoDraft, TodoEdit, TodoId, TodoItem};

impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() || e.is_timeout() {
            RemoteError::Unavailable(e.to_string())
        } else if e.is_decode() {
            RemoteError::Protocol(e.to_string())
        } else {
            RemoteError::Unavailable(e.to_string())
        }
    }
}

/// HTTP remote configuration.
#[derive(Debug, Clone)]
pub struct HttpRemoteConfig {
    /// Base URL, e.g. `https://todos.example.com/api`.
    pub base_url: String,
    /// Bearer token sent with every request.
    pub token: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl HttpRemoteConfig {
    /// Config with no token and a 10 second timeout.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: None,
            timeout: Duration::from_secs(10),
        }
    }

    /// Set the bearer token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Serialize)]
struct TodoFields<'a> {
    text: &'a str,
    category: &'a str,
    priority: Priority,
}

#[derive(Deserialize)]
struct AddResponse {
    id: String,
}

/// Remote store reached over HTTP.
pub struct HttpRemote {
    config: HttpRemoteConfig,
    http: reqwest::Client,
}

impl HttpRemote {
    /// Build a client.
    pub fn new(config: HttpRemoteConfig) -> Result<Self, RemoteError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RemoteError::Protocol(e.to_string()))?;
        Ok(Self { config, http })
    }

    /// The configured base URL.
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// URL of the todo collection.
    pub fn todos_url(&self) -> String {
        format!("{}/todos", self.config.base_url.trim_end_matches('/'))
    }

    /// URL of a single todo.
    pub fn todo_url(&self, id: &TodoId) -> String {
        format!("{}/{}", self.todos_url(), id.as_str())
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        target: &str,
    ) -> Result<reqwest::Response, RemoteError> {
        let response = self.authorize(request).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        tracing::debug!("Remote returned {} for {}: {}", status, target, body);
        Err(status_error(status, target, body))
    }
}

/// Map a non-success status to an error.
fn status_error(status: reqwest::StatusCode, target: &str, body: String) -> RemoteError {
    use reqwest::StatusCode;

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => RemoteError::Unauthorized,
        StatusCode::NOT_FOUND => RemoteError::NotFound(target.to_string()),
        s if s.is_client_error() => RemoteError::Rejected(body),
        s if s.is_server_error() => RemoteError::Unavailable(format!("{}: {}", s, body)),
        s => RemoteError::Protocol(format!("unexpected status {}", s)),
    }
}

#[async_trait]
impl RemoteStore for HttpRemote {
    async fn add(&self, draft: &TodoDraft) -> Result<TodoId, RemoteError> {
        let body = TodoFields {
            text: &draft.text,
            category: &draft.category,
            priority: draft.priority,
        };
        let response = self
            .send(self.http.post(self.todos_url()).json(&body), "todos")
            .await?;
        let created: AddResponse = response.json().await?;
        Ok(TodoId::server(created.id))
    }

    async fn update(&self, edit: &TodoEdit) -> Result<(), RemoteError> {
        let body = TodoFields {
            text: &edit.text,
            category: &edit.category,
            priority: edit.priority,
        };
        self.send(self.http.put(self.todo_url(&edit.id)).json(&body), edit.id.as_str())
            .await?;
        Ok(())
    }

    async fn toggle(&self, id: &TodoId) -> Result<(), RemoteError> {
        let url = format!("{}/toggle", self.todo_url(id));
        self.send(self.http.post(url), id.as_str()).await?;
        Ok(())
    }

    async fn delete(&self, id: &TodoId) -> Result<(), RemoteError> {
        self.send(self.http.delete(self.todo_url(id)), id.as_str())
            .await?;
        Ok(())
    }

    async fn list(&self) -> Result<Option<Vec<TodoItem>>, RemoteError> {
        let response = self.send(self.http.get(self.todos_url()), "todos").await?;
        let items: Vec<TodoItem> = response.json().await?;
        Ok(Some(items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    fn remote(base: &str) -> HttpRemote {
        HttpRemote::new(HttpRemoteConfig::new(base).with_timeout(Duration::from_secs(2))).unwrap()
    }

    #[test]
    fn urls_are_built_from_base() {
        let r = remote("http://localhost:8080/api/");
        assert_eq!(r.todos_url(), "http://localhost:8080/api/todos");
        assert_eq!(
            r.todo_url(&TodoId::server("abc")),
            "http://localhost:8080/api/todos/abc"
        );
    }

    #[test]
    fn status_mapping() {
        assert!(matches!(
            status_error(StatusCode::UNAUTHORIZED, "t", String::new()),
            RemoteError::Unauthorized
        ));
        assert!(matches!(
            status_error(StatusCode::NOT_FOUND, "t", String::new()),
            RemoteError::NotFound(ref t) if t == "t"
        ));
        assert!(matches!(
            status_error(StatusCode::UNPROCESSABLE_ENTITY, "t", "bad priority".into()),
            RemoteError::Rejected(ref b) if b == "bad priority"
        ));
        assert!(matches!(
            status_error(StatusCode::SERVICE_UNAVAILABLE, "t", String::new()),
            RemoteError::Unavailable(_)
        ));
    }

    #[test]
    fn fields_serialize_with_priority_name() {
        let body = TodoFields {
            text: "Buy milk",
            category: "Shopping",
            priority: Priority::High,
        };
        assert_eq!(
            serde_json::to_string(&body).unwrap(),
            r#"{"text":"Buy milk","category":"Shopping","priority":"High"}"#
        );
    }

    #[tokio::test]
    async fn unreachable_server_is_unavailable() {
        // Grab a free port, then close it so nothing is listening.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let r = remote(&format!("http://127.0.0.1:{}", port));
        let err = r.list().await.unwrap_err();
        assert!(matches!(err, RemoteError::Unavailable(_)));
    }
}

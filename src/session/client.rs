//! Client side of the session store: the `SessionApi` seam and its HTTP and in-process backends.

use crate::models::{
    CreateSessionRequest, CreatedSession, EndSessionRequest, OwnerToken, Session, SessionError,
    SessionId, SessionUpdate,
};
use crate::session::store::SessionStore;
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// Operations a client needs from the session store.
#[async_trait]
pub trait SessionApi: Send + Sync {
    async fn create(&self, request: CreateSessionRequest) -> Result<CreatedSession, SessionError>;
    async fn list(&self) -> Result<Vec<Session>, SessionError>;
    async fn get(&self, id: SessionId) -> Result<Session, SessionError>;
    async fn update(&self, id: SessionId, update: SessionUpdate) -> Result<Session, SessionError>;
    async fn end(&self, id: SessionId, owner_token: OwnerToken) -> Result<(), SessionError>;
}

#[async_trait]
impl<A: SessionApi + ?Sized> SessionApi for Arc<A> {
    async fn create(&self, request: CreateSessionRequest) -> Result<CreatedSession, SessionError> {
        (**self).create(request).await
    }

    async fn list(&self) -> Result<Vec<Session>, SessionError> {
        (**self).list().await
    }

    async fn get(&self, id: SessionId) -> Result<Session, SessionError> {
        (**self).get(id).await
    }

    async fn update(&self, id: SessionId, update: SessionUpdate) -> Result<Session, SessionError> {
        (**self).update(id, update).await
    }

    async fn end(&self, id: SessionId, owner_token: OwnerToken) -> Result<(), SessionError> {
        (**self).end(id, owner_token).await
    }
}

/// JSON error body returned by the session routes.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_revision: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_revision: Option<u64>,
}

/// Talks to the session routes over HTTP. One value per connection; pass it where needed.
#[derive(Clone)]
pub struct HttpSessionApi {
    client: Client,
    base_url: String,
}

impl HttpSessionApi {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, SessionError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SessionError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn decode<T: DeserializeOwned>(response: Response, id: SessionId) -> Result<T, SessionError> {
        let status = response.status();
        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| SessionError::Transport(e.to_string()));
        }
        let body: ErrorBody = response.json().await.unwrap_or_default();
        Err(match status {
            StatusCode::NOT_FOUND => SessionError::NotFound(id),
            StatusCode::FORBIDDEN => SessionError::Unauthorized,
            StatusCode::CONFLICT => SessionError::StaleRevision {
                current: body.current_revision.unwrap_or_default(),
                base: body.base_revision.unwrap_or_default(),
            },
            StatusCode::BAD_REQUEST => SessionError::Rejected(body.error),
            _ => SessionError::Transport(format!("{}: {}", status, body.error)),
        })
    }
}

fn transport(e: reqwest::Error) -> SessionError {
    SessionError::Transport(e.to_string())
}

#[async_trait]
impl SessionApi for HttpSessionApi {
    async fn create(&self, request: CreateSessionRequest) -> Result<CreatedSession, SessionError> {
        let response = self
            .client
            .post(self.url("/sessions"))
            .json(&request)
            .send()
            .await
            .map_err(transport)?;
        Self::decode(response, SessionId::nil()).await
    }

    async fn list(&self) -> Result<Vec<Session>, SessionError> {
        let response = self.client.get(self.url("/sessions")).send().await.map_err(transport)?;
        Self::decode(response, SessionId::nil()).await
    }

    async fn get(&self, id: SessionId) -> Result<Session, SessionError> {
        let response = self
            .client
            .get(self.url(&format!("/sessions/{}", id)))
            .send()
            .await
            .map_err(transport)?;
        Self::decode(response, id).await
    }

    async fn update(&self, id: SessionId, update: SessionUpdate) -> Result<Session, SessionError> {
        let response = self
            .client
            .put(self.url(&format!("/sessions/{}", id)))
            .json(&update)
            .send()
            .await
            .map_err(transport)?;
        Self::decode(response, id).await
    }

    async fn end(&self, id: SessionId, owner_token: OwnerToken) -> Result<(), SessionError> {
        let response = self
            .client
            .delete(self.url(&format!("/sessions/{}", id)))
            .json(&EndSessionRequest { owner_token })
            .send()
            .await
            .map_err(transport)?;
        Self::decode::<serde_json::Value>(response, id).await.map(|_| ())
    }
}

/// Uses a `SessionStore` in the same process, e.g. a host that also serves the routes.
#[derive(Clone, Default)]
pub struct InProcessSessionApi {
    store: Arc<RwLock<SessionStore>>,
}

impl InProcessSessionApi {
    pub fn new(store: Arc<RwLock<SessionStore>>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<RwLock<SessionStore>> {
        &self.store
    }

    fn with_store<T>(&self, f: impl FnOnce(&mut SessionStore) -> Result<T, SessionError>) -> Result<T, SessionError> {
        let mut g = self
            .store
            .write()
            .map_err(|_| SessionError::Transport("lock error".to_string()))?;
        f(&mut *g)
    }
}

#[async_trait]
impl SessionApi for InProcessSessionApi {
    async fn create(&self, request: CreateSessionRequest) -> Result<CreatedSession, SessionError> {
        self.with_store(|s| Ok(s.create(request, Utc::now())))
    }

    async fn list(&self) -> Result<Vec<Session>, SessionError> {
        self.with_store(|s| Ok(s.list()))
    }

    async fn get(&self, id: SessionId) -> Result<Session, SessionError> {
        self.with_store(|s| s.get(id).cloned())
    }

    async fn update(&self, id: SessionId, update: SessionUpdate) -> Result<Session, SessionError> {
        self.with_store(|s| s.update(id, update, Utc::now()).cloned())
    }

    async fn end(&self, id: SessionId, owner_token: OwnerToken) -> Result<(), SessionError> {
        self.with_store(|s| s.end(id, owner_token).map(|_| ()))
    }
}

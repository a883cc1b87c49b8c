//! Remote copies of the game data: the `/sync` endpoint and the `/storage` file backup.

use crate::persistence::{validate_filename, GameData, StorageError};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Serialize;
use std::time::Duration;

/// Where backups go and restores come from.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// `None` when the remote has nothing stored yet.
    async fn load(&self) -> Result<Option<GameData>, StorageError>;
    async fn save(&self, data: &GameData) -> Result<(), StorageError>;
}

fn remote(e: reqwest::Error) -> StorageError {
    StorageError::Remote(e.to_string())
}

fn build_client(timeout: Duration) -> Result<Client, StorageError> {
    Client::builder().timeout(timeout).build().map_err(remote)
}

async fn read_optional(response: Response) -> Result<Option<GameData>, StorageError> {
    match response.status() {
        StatusCode::NOT_FOUND => Ok(None),
        status if status.is_success() => response.json().await.map(Some).map_err(remote),
        status => Err(StorageError::Remote(format!("Server responded with {}", status))),
    }
}

fn expect_success(response: Response) -> Result<(), StorageError> {
    if response.status().is_success() {
        Ok(())
    } else {
        Err(StorageError::Remote(format!(
            "Server responded with {}",
            response.status()
        )))
    }
}

/// `GET /sync` and `POST /sync`.
#[derive(Clone)]
pub struct HttpSyncApi {
    client: Client,
    base_url: String,
}

impl HttpSyncApi {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, StorageError> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl RemoteStore for HttpSyncApi {
    async fn load(&self) -> Result<Option<GameData>, StorageError> {
        let response = self
            .client
            .get(format!("{}/sync", self.base_url))
            .send()
            .await
            .map_err(remote)?;
        read_optional(response).await
    }

    async fn save(&self, data: &GameData) -> Result<(), StorageError> {
        let response = self
            .client
            .post(format!("{}/sync", self.base_url))
            .json(data)
            .send()
            .await
            .map_err(remote)?;
        expect_success(response)
    }
}

#[derive(Serialize)]
struct SaveFile<'a> {
    filename: &'a str,
    data: &'a GameData,
}

/// One named backup file behind `/storage/save` and `/storage/load`.
#[derive(Clone)]
pub struct HttpFileBackup {
    client: Client,
    base_url: String,
    filename: String,
}

impl HttpFileBackup {
    pub fn new(
        base_url: impl Into<String>,
        filename: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, StorageError> {
        let filename = filename.into();
        validate_filename(&filename)?;
        Ok(Self {
            client: build_client(timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            filename,
        })
    }
}

#[async_trait]
impl RemoteStore for HttpFileBackup {
    async fn load(&self) -> Result<Option<GameData>, StorageError> {
        let response = self
            .client
            .get(format!("{}/storage/load", self.base_url))
            .query(&[("filename", self.filename.as_str())])
            .send()
            .await
            .map_err(remote)?;
        read_optional(response).await
    }

    async fn save(&self, data: &GameData) -> Result<(), StorageError> {
        let body = SaveFile {
            filename: &self.filename,
            data,
        };
        let response = self
            .client
            .post(format!("{}/storage/save", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(remote)?;
        expect_success(response)
    }
}

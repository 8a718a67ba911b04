use reqwest::{
    Client,
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Method,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error};

use shared_config::AppConfig;

use crate::error::StoreError;

/// Thin JSON client for a PostgREST endpoint.
pub struct PostgrestClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl PostgrestClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.postgrest_url.trim_end_matches('/').to_string(),
            api_key: config.postgrest_api_key.clone(),
        }
    }

    fn get_headers(&self, prefer: Option<&'static str>) -> Result<HeaderMap, StoreError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if !self.api_key.is_empty() {
            let key = HeaderValue::from_str(&self.api_key)
                .map_err(|e| StoreError::Configuration(format!("invalid API key header: {}", e)))?;
            let bearer = HeaderValue::from_str(&format!("Bearer {}", self.api_key))
                .map_err(|e| StoreError::Configuration(format!("invalid API key header: {}", e)))?;
            headers.insert("apikey", key);
            headers.insert(AUTHORIZATION, bearer);
        }

        if let Some(prefer) = prefer {
            headers.insert("Prefer", HeaderValue::from_static(prefer));
        }

        Ok(headers)
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        prefer: Option<&'static str>,
    ) -> Result<reqwest::Response, StoreError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let mut req = self.client.request(method, &url).headers(self.get_headers(prefer)?);

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            error!("Store API error ({}): {}", status, error_text);

            return Err(match status.as_u16() {
                404 => StoreError::NotFound(error_text),
                code => StoreError::Http {
                    status: code,
                    message: error_text,
                },
            });
        }

        Ok(response)
    }

    /// Issues a request and decodes the JSON response body.
    pub async fn request<T>(&self, method: Method, path: &str, body: Option<Value>) -> Result<T, StoreError>
    where
        T: DeserializeOwned,
    {
        let response = self.send(method, path, body, None).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Issues a write whose response body is not needed.
    pub async fn execute(&self, method: Method, path: &str, body: Option<Value>) -> Result<(), StoreError> {
        self.send(method, path, body, Some("return=minimal")).await?;
        Ok(())
    }

    /// Inserts or merges on the table's primary key.
    pub async fn upsert(&self, path: &str, body: Value) -> Result<(), StoreError> {
        self.send(
            Method::POST,
            path,
            Some(body),
            Some("resolution=merge-duplicates,return=minimal"),
        )
        .await?;
        Ok(())
    }

    /// Inserts unless the row already exists; only newly inserted rows come back.
    pub async fn insert_ignoring_duplicates<T>(&self, path: &str, body: Value) -> Result<Vec<T>, StoreError>
    where
        T: DeserializeOwned,
    {
        let response = self
            .send(
                Method::POST,
                path,
                Some(body),
                Some("resolution=ignore-duplicates,return=representation"),
            )
            .await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Issues a write and decodes the affected rows.
    pub async fn execute_returning<T>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Vec<T>, StoreError>
    where
        T: DeserializeOwned,
    {
        let response = self.send(method, path, body, Some("return=representation")).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

use super::*;
use reqwest::{Method, RequestBuilder};
use serde_json::json;
use std::time::Duration;

/// Store backed by a Supabase project, speaking the PostgREST API.
///
/// Chat lines live in the `message` table, per-content counters in the
/// `count` table.
pub struct SupabaseStore {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl SupabaseStore {
    /// Create a new store for the project at `base_url`, authenticating with
    /// `api_key`.
    pub fn new(base_url: String, api_key: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap();

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client,
        }
    }

    /// Start a request against one table, with auth headers applied.
    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        let url = format!("{}/rest/v1/{}", self.base_url, table);
        self.client
            .request(method, url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }
}

#[async_trait]
impl ChatStore for SupabaseStore {
    async fn insert_message(&self, record: &ChatRecord) -> StoreResult<()> {
        let response = self
            .request(Method::POST, "message")
            .header("Prefer", "return=minimal")
            .json(record)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(StoreError::Status(response.status()));
        }

        Ok(())
    }

    async fn find_counter(&self, id: &str) -> StoreResult<Option<CounterRecord>> {
        let filter = format!("eq.{}", id);
        let response = self
            .request(Method::GET, "count")
            .query(&[("select", "*"), ("id", filter.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(StoreError::Status(response.status()));
        }

        let rows: Vec<CounterRecord> = response.json().await?;
        Ok(rows.into_iter().next())
    }

    async fn update_counter(&self, id: &str, count: i64) -> StoreResult<()> {
        let filter = format!("eq.{}", id);
        let response = self
            .request(Method::PATCH, "count")
            .query(&[("id", filter.as_str())])
            .header("Prefer", "return=minimal")
            .json(&json!({ "count": count }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(StoreError::Status(response.status()));
        }

        Ok(())
    }

    async fn insert_counter(&self, record: &CounterRecord) -> StoreResult<()> {
        let response = self
            .request(Method::POST, "count")
            .header("Prefer", "return=minimal")
            .json(record)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(StoreError::Status(response.status()));
        }

        Ok(())
    }
}

//! Hosted table client: PostgREST-style endpoints under `/rest/v1`.
//!
//! Every request carries the project anon key plus the signed-in user's
//! bearer token; row visibility is enforced server-side.

use super::{ChatRecord, ChatStore, MessageRecord, StoreError, NEW_CHAT_TITLE};
use crate::config::StoreConfig;
use crate::conversation::Role;
use async_trait::async_trait;
use reqwest::Method;
use serde_json::json;

#[derive(Clone)]
pub struct RestStore {
    base_url: String,
    api_key: String,
    access_token: String,
    client: reqwest::Client,
}

impl RestStore {
    /// `access_token` is the signed-in session's bearer token.
    pub fn new(config: &StoreConfig, api_key: impl Into<String>, access_token: impl Into<String>) -> Self {
        let base_url = config
            .url
            .as_deref()
            .unwrap_or_default()
            .trim_end_matches('/')
            .to_string();
        Self {
            base_url,
            api_key: api_key.into(),
            access_token: access_token.into(),
            client: reqwest::Client::new(),
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn request(&self, method: Method, url: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.access_token)
    }

    async fn check(res: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        if res.status().is_success() {
            Ok(res)
        } else {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            Err(StoreError::Api(format!("{} {}", status, body)))
        }
    }
}

#[async_trait]
impl ChatStore for RestStore {
    async fn create_chat(&self, user_id: &str) -> Result<ChatRecord, StoreError> {
        let url = self.table_url("chats");
        let res = self
            .request(Method::POST, &url)
            .header("Prefer", "return=representation")
            .json(&json!({ "user_id": user_id, "title": NEW_CHAT_TITLE }))
            .send()
            .await?;
        let rows: Vec<ChatRecord> = Self::check(res).await?.json().await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::Api("chat insert returned no rows".to_string()))
    }

    async fn list_chats(&self, user_id: &str) -> Result<Vec<ChatRecord>, StoreError> {
        let url = format!(
            "{}?select=*&user_id=eq.{}&order=created_at.desc",
            self.table_url("chats"),
            user_id
        );
        let res = self.request(Method::GET, &url).send().await?;
        Ok(Self::check(res).await?.json().await?)
    }

    async fn rename_chat(&self, chat_id: &str, title: &str) -> Result<(), StoreError> {
        let url = format!("{}?id=eq.{}", self.table_url("chats"), chat_id);
        let res = self
            .request(Method::PATCH, &url)
            .json(&json!({ "title": title }))
            .send()
            .await?;
        Self::check(res).await?;
        Ok(())
    }

    async fn delete_chat(&self, chat_id: &str) -> Result<(), StoreError> {
        let url = format!("{}?id=eq.{}", self.table_url("chats"), chat_id);
        let res = self.request(Method::DELETE, &url).send().await?;
        Self::check(res).await?;
        Ok(())
    }

    async fn insert_message(
        &self,
        chat_id: &str,
        user_id: &str,
        content: &str,
        role: Role,
    ) -> Result<(), StoreError> {
        let url = self.table_url("messages");
        let res = self
            .request(Method::POST, &url)
            .json(&json!({
                "chat_id": chat_id,
                "user_id": user_id,
                "content": content,
                "role": role.as_str(),
            }))
            .send()
            .await?;
        Self::check(res).await?;
        Ok(())
    }

    async fn list_messages(&self, chat_id: &str) -> Result<Vec<MessageRecord>, StoreError> {
        let url = format!(
            "{}?select=*&chat_id=eq.{}&order=created_at.asc",
            self.table_url("messages"),
            chat_id
        );
        let res = self.request(Method::GET, &url).send().await?;
        Ok(Self::check(res).await?.json().await?)
    }

    async fn clear_messages(&self, chat_id: &str) -> Result<(), StoreError> {
        let url = format!("{}?chat_id=eq.{}", self.table_url("messages"), chat_id);
        let res = self.request(Method::DELETE, &url).send().await?;
        Self::check(res).await?;
        Ok(())
    }
}

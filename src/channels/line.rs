use super::{ContentStream, MessagingPlatform};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::types::ReplyMessage;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde_json::{json, Value};

#[derive(Clone)]
pub struct LineClient {
    http: Client,
    access_token: String,
    api_base_url: String,
    data_api_base_url: String,
}

impl LineClient {
    pub fn new(
        http: Client,
        access_token: impl Into<String>,
        api_base_url: impl Into<String>,
        data_api_base_url: impl Into<String>,
    ) -> Self {
        Self {
            http,
            access_token: access_token.into(),
            api_base_url: trim_base(api_base_url.into()),
            data_api_base_url: trim_base(data_api_base_url.into()),
        }
    }

    pub fn from_config(http: Client, cfg: &Config) -> Result<Self> {
        let token = cfg
            .channel
            .access_token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| Error::Config("channel access token is not set".to_string()))?;
        Ok(Self::new(
            http,
            token,
            cfg.platform.api_base_url.clone(),
            cfg.platform.data_api_base_url.clone(),
        ))
    }

    fn reply_url(&self) -> String {
        format!("{}/v2/bot/message/reply", self.api_base_url)
    }

    fn content_url(&self, message_id: &str) -> String {
        format!("{}/v2/bot/message/{}/content", self.data_api_base_url, message_id)
    }
}

fn trim_base(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

#[async_trait]
impl MessagingPlatform for LineClient {
    async fn reply(&self, reply_token: &str, messages: &[ReplyMessage]) -> Result<Value> {
        let payload = json!({
            "replyToken": reply_token,
            "messages": messages,
        });
        let resp = self
            .http
            .post(self.reply_url())
            .bearer_auth(&self.access_token)
            .json(&payload)
            .send()
            .await
            .map_err(|err| Error::reply_delivery(None, err))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|err| Error::reply_delivery(Some(status.as_u16()), err))?;
        if !status.is_success() {
            return Err(Error::reply_delivery(Some(status.as_u16()), body));
        }
        if body.trim().is_empty() {
            return Ok(json!({}));
        }
        serde_json::from_str(&body).map_err(|err| Error::reply_delivery(Some(status.as_u16()), err))
    }

    async fn content(&self, message_id: &str) -> Result<ContentStream> {
        let resp = self
            .http
            .get(self.content_url(message_id))
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|err| Error::content_fetch(message_id, err))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::content_fetch(
                message_id,
                format!("platform answered {status}: {body}"),
            ));
        }

        let id = message_id.to_string();
        Ok(resp
            .bytes_stream()
            .map(move |chunk| chunk.map_err(|err| Error::content_fetch(&id, err)))
            .boxed())
    }
}

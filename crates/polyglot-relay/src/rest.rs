//! REST-backed [`ChatClient`] implementation.
//!
//! Talks to a Discord-compatible HTTP API.  The base URL is configurable so
//! tests and self-hosted gateways can point it elsewhere.  Mention
//! auto-expansion is disabled on every send by passing an empty
//! `allowed_mentions.parse` list.

use async_trait::async_trait;
use polyglot_core::{ChannelId, GuildId, MessageId, UserId};
use serde_json::{json, Value};

use crate::chat::{
    ChannelInfo, ChannelKind, ChatClient, SentMessage, ThreadInfo, WebhookInfo, WebhookPost,
};
use crate::error::ChatError;

pub struct RestChatClient {
    http: reqwest::Client,
    base: String,
    token: String,
}

impl RestChatClient {
    /// `base` is the API root without trailing slash, e.g.
    /// `https://discord.com/api/v10`.
    pub fn new(base: impl Into<String>, token: impl Into<String>) -> Result<Self, ChatError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()?;
        Ok(Self {
            http,
            base: base.into(),
            token: token.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    async fn check(&self, response: reqwest::Response) -> Result<Value, ChatError> {
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ChatError::NotFound);
        }
        if status.is_client_error() || status.is_server_error() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ChatError::Status {
                status: status.as_u16(),
                detail,
            });
        }
        if status == reqwest::StatusCode::NO_CONTENT {
            return Ok(Value::Null);
        }
        Ok(response.json().await?)
    }

    async fn get(&self, path: &str) -> Result<Value, ChatError> {
        let response = self
            .http
            .get(self.url(path))
            .header("Authorization", format!("Bot {}", self.token))
            .send()
            .await?;
        self.check(response).await
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value, ChatError> {
        let response = self
            .http
            .post(self.url(path))
            .header("Authorization", format!("Bot {}", self.token))
            .json(body)
            .send()
            .await?;
        self.check(response).await
    }
}

/// Snowflakes come back as JSON strings; pull one out of `value[key]`.
fn snowflake(value: &Value, key: &str) -> Result<u64, ChatError> {
    value[key]
        .as_str()
        .and_then(|s| s.parse::<u64>().ok())
        .or_else(|| value[key].as_u64())
        .ok_or_else(|| ChatError::Malformed(format!("missing snowflake field '{key}'")))
}

fn sent_message(value: &Value) -> Result<SentMessage, ChatError> {
    Ok(SentMessage {
        id: MessageId(snowflake(value, "id")?),
        channel_id: ChannelId(snowflake(value, "channel_id")?),
    })
}

fn webhook_info(value: &Value) -> Result<WebhookInfo, ChatError> {
    Ok(WebhookInfo {
        id: snowflake(value, "id")?,
        token: value["token"].as_str().unwrap_or_default().to_string(),
        name: value["name"].as_str().unwrap_or_default().to_string(),
        owner_id: snowflake(&value["user"], "id").ok().map(UserId),
    })
}

fn thread_info(value: &Value, parent: ChannelId) -> Result<ThreadInfo, ChatError> {
    Ok(ThreadInfo {
        id: ChannelId(snowflake(value, "id")?),
        name: value["name"].as_str().unwrap_or_default().to_string(),
        parent_id: parent,
    })
}

#[async_trait]
impl ChatClient for RestChatClient {
    async fn fetch_channel(&self, channel: ChannelId) -> Result<ChannelInfo, ChatError> {
        let data = self.get(&format!("/channels/{channel}")).await?;
        let kind = match data["type"].as_u64().unwrap_or(0) {
            1 | 3 => ChannelKind::Dm,
            10 | 11 | 12 => ChannelKind::Thread,
            _ => ChannelKind::Text,
        };
        let guild_id = snowflake(&data, "guild_id").ok().map(GuildId);
        Ok(ChannelInfo {
            id: channel,
            guild_id,
            kind,
        })
    }

    async fn send_message(&self, channel: ChannelId, content: &str) -> Result<SentMessage, ChatError> {
        let body = json!({
            "content": content,
            "allowed_mentions": { "parse": [] },
        });
        let data = self.post(&format!("/channels/{channel}/messages"), &body).await?;
        sent_message(&data)
    }

    async fn create_thread(&self, channel: ChannelId, name: &str) -> Result<ThreadInfo, ChatError> {
        let body = json!({ "name": name, "type": 11 });
        let data = self.post(&format!("/channels/{channel}/threads"), &body).await?;
        thread_info(&data, channel)
    }

    async fn list_threads(&self, channel: ChannelId) -> Result<Vec<ThreadInfo>, ChatError> {
        let data = self.get(&format!("/channels/{channel}/threads")).await?;
        let items = data["threads"]
            .as_array()
            .cloned()
            .or_else(|| data.as_array().cloned())
            .unwrap_or_default();
        items.iter().map(|item| thread_info(item, channel)).collect()
    }

    async fn create_webhook(&self, channel: ChannelId, name: &str) -> Result<WebhookInfo, ChatError> {
        let body = json!({ "name": name });
        let data = self.post(&format!("/channels/{channel}/webhooks"), &body).await?;
        webhook_info(&data)
    }

    async fn list_webhooks(&self, channel: ChannelId) -> Result<Vec<WebhookInfo>, ChatError> {
        let data = self.get(&format!("/channels/{channel}/webhooks")).await?;
        data.as_array()
            .map(|items| items.iter().map(webhook_info).collect())
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn send_via_webhook(
        &self,
        webhook: &WebhookInfo,
        post: WebhookPost,
    ) -> Result<SentMessage, ChatError> {
        let body = json!({
            "content": post.content,
            "username": post.username,
            "avatar_url": post.avatar_url,
            "allowed_mentions": { "parse": [] },
        });
        let data = self
            .post(&format!("/webhooks/{}/{}?wait=true", webhook.id, webhook.token), &body)
            .await?;
        sent_message(&data)
    }

    async fn create_dm_channel(&self, user: UserId) -> Result<ChannelId, ChatError> {
        let body = json!({ "recipient_id": user.0.to_string() });
        let data = self.post("/users/@me/channels", &body).await?;
        Ok(ChannelId(snowflake(&data, "id")?))
    }

    async fn delete_message(&self, channel: ChannelId, message: MessageId) -> Result<(), ChatError> {
        let response = self
            .http
            .delete(self.url(&format!("/channels/{channel}/messages/{message}")))
            .header("Authorization", format!("Bot {}", self.token))
            .send()
            .await?;
        self.check(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snowflakes_parse_from_strings_and_numbers() {
        let value = json!({ "id": "123456789012345678", "n": 42 });
        assert_eq!(snowflake(&value, "id").unwrap(), 123456789012345678);
        assert_eq!(snowflake(&value, "n").unwrap(), 42);
        assert!(snowflake(&value, "missing").is_err());
    }

    #[test]
    fn webhook_owner_is_optional() {
        let bare = json!({ "id": "1", "token": "t", "name": "Polyglot Inline" });
        let hook = webhook_info(&bare).unwrap();
        assert_eq!(hook.owner_id, None);

        let owned = json!({ "id": "1", "token": "t", "name": "x", "user": { "id": "9" } });
        let hook = webhook_info(&owned).unwrap();
        assert_eq!(hook.owner_id, Some(UserId(9)));
    }
}

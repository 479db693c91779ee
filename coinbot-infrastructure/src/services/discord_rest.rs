use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, Method, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::warn;

use coinbot_domain::{
    parse_snowflake, snowflake_timestamp, ChannelRef, ChatPlatform, EmojiRef, HistoryMessage,
    HistoryReaction, PlatformUser,
};

/// Guild text channel type in the Discord API.
pub const GUILD_TEXT: u8 = 0;
/// Message flag that hides an interaction reply from everyone but the invoker.
pub const EPHEMERAL_FLAG: u64 = 1 << 6;
const REACTION_PAGE: usize = 100;
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

#[derive(Debug, Error)]
pub enum DiscordApiError {
    #[error("discord api {method} {path} failed with {status}: {body}")]
    Status {
        method: Method,
        path: String,
        status: StatusCode,
        body: String,
    },
    #[error("discord api {0} kept rate limiting")]
    RateLimited(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireUser {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub global_name: Option<String>,
    #[serde(default)]
    pub bot: bool,
}

impl WireUser {
    pub fn to_platform_user(&self) -> Result<PlatformUser> {
        let display_name = self
            .global_name
            .clone()
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| self.username.clone());
        Ok(PlatformUser::new(parse_snowflake(&self.id)?, display_name))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireEmoji {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub animated: bool,
}

impl WireEmoji {
    pub fn to_emoji_ref(&self) -> Result<EmojiRef> {
        let name = self.name.clone().unwrap_or_default();
        match &self.id {
            Some(id) => Ok(EmojiRef::Custom {
                id: parse_snowflake(id)?,
                name,
            }),
            None => Ok(EmojiRef::Unicode(name)),
        }
    }

    /// Inline form used inside message content.
    pub fn render(&self) -> Option<String> {
        let id = self.id.as_ref()?;
        let name = self.name.as_deref().unwrap_or("_");
        let prefix = if self.animated { "a" } else { "" };
        Some(format!("<{}:{}:{}>", prefix, name, id))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireReaction {
    pub count: u32,
    pub emoji: WireEmoji,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireMessage {
    pub id: String,
    pub channel_id: String,
    pub author: WireUser,
    #[serde(default)]
    pub reactions: Vec<WireReaction>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl WireMessage {
    pub fn to_history_message(&self) -> Result<HistoryMessage> {
        let message_id = parse_snowflake(&self.id)?;
        let reactions = self
            .reactions
            .iter()
            .map(|reaction| {
                Ok(HistoryReaction {
                    emoji: reaction.emoji.to_emoji_ref()?,
                    count: reaction.count,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(HistoryMessage {
            message_id,
            channel_id: parse_snowflake(&self.channel_id)?,
            author: self.author.to_platform_user()?,
            reactions,
            timestamp: self
                .timestamp
                .unwrap_or_else(|| snowflake_timestamp(message_id)),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireChannel {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default)]
    pub guild_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireGuild {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
struct RateLimitBody {
    retry_after: f64,
}

/// REST client for the Discord HTTP API.
pub struct DiscordRestClient {
    client: Client,
    api_base: Url,
    token: String,
    guild_names: Mutex<HashMap<u64, String>>,
    emojis: Mutex<HashMap<u64, String>>,
}

impl DiscordRestClient {
    pub fn new(api_base: &str, token: &str, timeout_seconds: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds.max(1)))
            .build()?;
        let api_base = Url::parse(api_base.trim_end_matches('/'))
            .map_err(|err| anyhow!("invalid discord api base: {}", err))?;
        if api_base.cannot_be_a_base() {
            return Err(anyhow!("discord api base must be a hierarchical url"));
        }
        Ok(Self {
            client,
            api_base,
            token: token.to_string(),
            guild_names: Mutex::new(HashMap::new()),
            emojis: Mutex::new(HashMap::new()),
        })
    }

    /// Builds an endpoint url; each segment is percent-encoded.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("discord api base cannot take path segments"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn execute(&self, method: Method, url: Url, body: Option<&Value>) -> Result<Response> {
        for _ in 0..=MAX_RATE_LIMIT_RETRIES {
            let mut request = self
                .client
                .request(method.clone(), url.clone())
                .header(AUTHORIZATION, format!("Bot {}", self.token));
            if let Some(body) = body {
                request = request.json(body);
            }
            let response = request.send().await?;
            if response.status() != StatusCode::TOO_MANY_REQUESTS {
                return Ok(response);
            }
            let retry_after = response
                .json::<RateLimitBody>()
                .await
                .map(|body| body.retry_after)
                .unwrap_or(1.0);
            warn!("discord rate limited {}, retrying in {:.2}s", url.path(), retry_after);
            tokio::time::sleep(Duration::from_secs_f64(retry_after.clamp(0.0, 60.0))).await;
        }
        Err(DiscordApiError::RateLimited(url.path().to_string()).into())
    }

    async fn check(method: Method, url: &Url, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(DiscordApiError::Status {
            method,
            path: url.path().to_string(),
            status,
            body,
        }
        .into())
    }

    /// GET returning `None` on 404.
    async fn get_optional<T: DeserializeOwned>(&self, url: Url) -> Result<Option<T>> {
        let response = self.execute(Method::GET, url.clone(), None).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = Self::check(Method::GET, &url, response).await?;
        Ok(Some(response.json().await?))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let response = self.execute(Method::GET, url.clone(), None).await?;
        let response = Self::check(Method::GET, &url, response).await?;
        Ok(response.json().await?)
    }

    async fn send_json(&self, method: Method, url: Url, body: &Value) -> Result<Response> {
        let response = self.execute(method.clone(), url.clone(), Some(body)).await?;
        Self::check(method, &url, response).await
    }

    pub async fn guilds(&self) -> Result<Vec<WireGuild>> {
        let guilds: Vec<WireGuild> = self.get_json(self.endpoint(&["users", "@me", "guilds"])?).await?;
        {
            let mut names = self.guild_names.lock().map_err(|_| anyhow!("guild cache poisoned"))?;
            for guild in &guilds {
                if let Ok(id) = parse_snowflake(&guild.id) {
                    names.insert(id, guild.name.clone());
                }
            }
        }
        Ok(guilds)
    }

    async fn guild_name(&self, guild_id: u64) -> Result<String> {
        let cached = self
            .guild_names
            .lock()
            .map_err(|_| anyhow!("guild cache poisoned"))?
            .get(&guild_id)
            .cloned();
        if let Some(name) = cached {
            return Ok(name);
        }
        let guild: WireGuild = self
            .get_json(self.endpoint(&["guilds", &guild_id.to_string()])?)
            .await?;
        self.guild_names
            .lock()
            .map_err(|_| anyhow!("guild cache poisoned"))?
            .insert(guild_id, guild.name.clone());
        Ok(guild.name)
    }

    async fn channel_ref(&self, channel: &WireChannel) -> Result<Option<ChannelRef>> {
        if channel.kind != GUILD_TEXT {
            return Ok(None);
        }
        let Some(guild_id) = channel.guild_id.as_deref() else {
            return Ok(None);
        };
        let guild_id = parse_snowflake(guild_id)?;
        Ok(Some(ChannelRef {
            guild_id,
            guild_name: self.guild_name(guild_id).await?,
            channel_id: parse_snowflake(&channel.id)?,
            channel_name: channel.name.clone().unwrap_or_default(),
        }))
    }

    /// Answers a slash command with a channel message, optionally visible
    /// only to the invoking user.
    pub async fn reply_to_interaction(
        &self,
        interaction_id: u64,
        interaction_token: &str,
        content: &str,
        ephemeral: bool,
    ) -> Result<()> {
        let url = self.endpoint(&[
            "interactions",
            &interaction_id.to_string(),
            interaction_token,
            "callback",
        ])?;
        let mut data = json!({ "content": content });
        if ephemeral {
            data["flags"] = json!(EPHEMERAL_FLAG);
        }
        let body = json!({ "type": 4, "data": data });
        self.send_json(Method::POST, url, &body).await?;
        Ok(())
    }

    /// Replaces the application's global slash commands.
    pub async fn register_commands(&self, application_id: u64, commands: &Value) -> Result<()> {
        let url = self.endpoint(&["applications", &application_id.to_string(), "commands"])?;
        self.send_json(Method::PUT, url, commands).await?;
        Ok(())
    }
}

/// Path form of an emoji for the reactions endpoints.
pub fn emoji_path_segment(emoji: &EmojiRef) -> String {
    match emoji {
        EmojiRef::Custom { id, name } => {
            let name = if name.is_empty() { "_" } else { name.as_str() };
            format!("{}:{}", name, id)
        }
        EmojiRef::Unicode(value) => value.clone(),
    }
}

#[async_trait]
impl ChatPlatform for DiscordRestClient {
    async fn history(
        &self,
        channel_id: u64,
        before: Option<u64>,
        limit: usize,
    ) -> Result<Vec<HistoryMessage>> {
        let mut url = self.endpoint(&["channels", &channel_id.to_string(), "messages"])?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("limit", &limit.clamp(1, 100).to_string());
            if let Some(before) = before {
                query.append_pair("before", &before.to_string());
            }
        }
        let messages: Vec<WireMessage> = self.get_json(url).await?;
        messages.iter().map(WireMessage::to_history_message).collect()
    }

    async fn reaction_users(
        &self,
        channel_id: u64,
        message_id: u64,
        emoji: &EmojiRef,
    ) -> Result<Vec<PlatformUser>> {
        let segment = emoji_path_segment(emoji);
        let mut users = Vec::new();
        let mut after: Option<String> = None;
        loop {
            let mut url = self.endpoint(&[
                "channels",
                &channel_id.to_string(),
                "messages",
                &message_id.to_string(),
                "reactions",
                &segment,
            ])?;
            {
                let mut query = url.query_pairs_mut();
                query.append_pair("limit", &REACTION_PAGE.to_string());
                if let Some(after) = &after {
                    query.append_pair("after", after);
                }
            }
            let page: Vec<WireUser> = self.get_json(url).await?;
            let full = page.len() == REACTION_PAGE;
            after = page.last().map(|user| user.id.clone());
            for user in &page {
                users.push(user.to_platform_user()?);
            }
            if !full || after.is_none() {
                break;
            }
        }
        Ok(users)
    }

    async fn fetch_user(&self, user_id: u64) -> Result<Option<PlatformUser>> {
        let user: Option<WireUser> = self
            .get_optional(self.endpoint(&["users", &user_id.to_string()])?)
            .await?;
        user.map(|user| user.to_platform_user()).transpose()
    }

    async fn channel(&self, channel_id: u64) -> Result<Option<ChannelRef>> {
        let channel: Option<WireChannel> = self
            .get_optional(self.endpoint(&["channels", &channel_id.to_string()])?)
            .await?;
        match channel {
            Some(channel) => self.channel_ref(&channel).await,
            None => Ok(None),
        }
    }

    async fn text_channels(&self) -> Result<Vec<ChannelRef>> {
        let mut out = Vec::new();
        for guild in self.guilds().await? {
            let channels: Vec<WireChannel> = self
                .get_json(self.endpoint(&["guilds", &guild.id, "channels"])?)
                .await?;
            for channel in &channels {
                if let Some(channel_ref) = self.channel_ref(channel).await? {
                    out.push(channel_ref);
                }
            }
        }
        Ok(out)
    }

    async fn resolve_emoji(&self, emoji_id: u64) -> Result<Option<String>> {
        if emoji_id == 0 {
            return Ok(None);
        }
        let cached = self
            .emojis
            .lock()
            .map_err(|_| anyhow!("emoji cache poisoned"))?
            .get(&emoji_id)
            .cloned();
        if cached.is_some() {
            return Ok(cached);
        }
        for guild in self.guilds().await? {
            let emojis: Vec<WireEmoji> = self
                .get_json(self.endpoint(&["guilds", &guild.id, "emojis"])?)
                .await?;
            let found = {
                let mut cache = self.emojis.lock().map_err(|_| anyhow!("emoji cache poisoned"))?;
                for emoji in &emojis {
                    let (Some(id), Some(rendered)) = (emoji.id.as_deref(), emoji.render()) else {
                        continue;
                    };
                    if let Ok(id) = parse_snowflake(id) {
                        cache.insert(id, rendered);
                    }
                }
                cache.get(&emoji_id).cloned()
            };
            if found.is_some() {
                return Ok(found);
            }
        }
        Ok(None)
    }

    async fn send_message(&self, channel_id: u64, content: &str) -> Result<()> {
        let url = self.endpoint(&["channels", &channel_id.to_string(), "messages"])?;
        self.send_json(Method::POST, url, &json!({ "content": content }))
            .await?;
        Ok(())
    }
}

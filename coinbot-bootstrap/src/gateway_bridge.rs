use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

use coinbot_application::commands::slot_commands::{self, ReelEdit};
use coinbot_application::commands::transfer_commands;
use coinbot_application::queries::{balance_queries, slot_queries};
use coinbot_application::{AppError, AppState, ChannelJob, ChannelWorkers};
use coinbot_domain::{
    mention, parse_snowflake, BotConfiguration, MessageCreated, PlatformUser, ReactionEvent,
};
use coinbot_infrastructure::{DiscordRestClient, WireEmoji, WireUser};

/// GUILDS | GUILD_MESSAGES | GUILD_MESSAGE_REACTIONS
pub const GATEWAY_INTENTS: u64 = 1 | (1 << 9) | (1 << 10);

const OP_DISPATCH: u8 = 0;
const OP_HEARTBEAT: u8 = 1;
const OP_IDENTIFY: u8 = 2;
const OP_RECONNECT: u8 = 7;
const OP_INVALID_SESSION: u8 = 9;
const OP_HELLO: u8 = 10;
const OP_HEARTBEAT_ACK: u8 = 11;

const APPLICATION_COMMAND: u8 = 2;
const OPTION_STRING: u8 = 3;
const OPTION_INTEGER: u8 = 4;
const OPTION_USER: u8 = 6;

type GatewaySocket =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

pub struct GatewayBridge {
    pub state: AppState,
    pub workers: Arc<ChannelWorkers>,
    pub rest: Arc<DiscordRestClient>,
    pub gateway_url: String,
    pub token: String,
    pub reconnect_delay: Duration,
}

pub fn spawn_gateway_bridge(bridge: GatewayBridge) -> JoinHandle<()> {
    tokio::spawn(async move {
        let shutdown = bridge.state.shutdown.clone();
        loop {
            if shutdown.is_triggered() {
                break;
            }
            tokio::select! {
                reason = shutdown.wait() => {
                    info!("gateway bridge stopping: {}", reason);
                    break;
                }
                result = bridge.run_session() => {
                    if let Err(err) = result {
                        warn!("gateway session ended: {}", err);
                    }
                }
            }
            sleep(bridge.reconnect_delay).await;
        }
    })
}

impl GatewayBridge {
    async fn run_session(&self) -> Result<()> {
        let (mut ws, _) = tokio_tungstenite::connect_async(self.gateway_url.as_str()).await?;
        info!("gateway connected: {}", self.gateway_url);

        let heartbeat_interval = loop {
            let frame = next_frame(&mut ws).await?;
            if let Some(GatewayFrame::Hello { heartbeat_interval }) = frame {
                break heartbeat_interval;
            }
        };
        ws.send(Message::Text(identify_payload(&self.token).to_string().into()))
            .await?;

        let mut heartbeat = tokio::time::interval(Duration::from_millis(heartbeat_interval.max(1)));
        heartbeat.tick().await;
        let mut sequence: Option<u64> = None;
        let mut awaiting_ack = false;

        loop {
            tokio::select! {
                _ = heartbeat.tick() => {
                    if awaiting_ack {
                        return Err(anyhow!("heartbeat was not acknowledged"));
                    }
                    send_heartbeat(&mut ws, sequence).await?;
                    awaiting_ack = true;
                }
                frame = next_frame(&mut ws) => {
                    let Some(frame) = frame? else {
                        continue;
                    };
                    match frame {
                        GatewayFrame::Dispatch { sequence: seq, event } => {
                            if seq.is_some() {
                                sequence = seq;
                            }
                            self.handle_dispatch(event).await;
                        }
                        GatewayFrame::HeartbeatRequest => send_heartbeat(&mut ws, sequence).await?,
                        GatewayFrame::HeartbeatAck => awaiting_ack = false,
                        GatewayFrame::Reconnect => return Err(anyhow!("gateway requested reconnect")),
                        GatewayFrame::InvalidSession => return Err(anyhow!("gateway invalidated the session")),
                        GatewayFrame::Hello { .. } => {}
                    }
                }
            }
        }
    }

    async fn handle_dispatch(&self, event: DispatchEvent) {
        match event {
            DispatchEvent::Ready {
                application_id,
                user_name,
            } => {
                info!("gateway ready as {}", user_name);
                let rest = self.rest.clone();
                let commands = slash_commands(&self.state.bot);
                tokio::spawn(async move {
                    match rest.register_commands(application_id, &commands).await {
                        Ok(()) => info!("slash commands synced"),
                        Err(err) => error!("error syncing commands: {}", err),
                    }
                });
                // Later dispatches for any channel wait behind its reconciliation.
                self.workers.hold_live_jobs().await;
                let state = self.state.clone();
                let workers = self.workers.clone();
                tokio::spawn(async move {
                    match workers.reconcile_all(&state).await {
                        Ok(count) => info!("reconciliation queued for {} channels", count),
                        Err(err) => error!("reconciliation could not start: {}", err),
                    }
                });
            }
            DispatchEvent::MessageCreated(message) => {
                let channel_id = message.channel_id;
                self.workers
                    .submit(&self.state, channel_id, ChannelJob::MessageCreated(message))
                    .await;
            }
            DispatchEvent::ReactionAdded(reaction) => {
                let channel_id = reaction.channel_id;
                self.workers
                    .submit(&self.state, channel_id, ChannelJob::Reaction(reaction))
                    .await;
            }
            DispatchEvent::Command(command) => {
                let state = self.state.clone();
                let rest = self.rest.clone();
                tokio::spawn(async move {
                    handle_command(&state, &rest, command).await;
                });
            }
            DispatchEvent::Ignored(name) => debug!("ignoring gateway event {}", name),
        }
    }
}

async fn next_frame(ws: &mut GatewaySocket) -> Result<Option<GatewayFrame>> {
    loop {
        let Some(next) = ws.next().await else {
            return Err(anyhow!("gateway stream ended"));
        };
        match next? {
            Message::Text(text) => return parse_frame(&text),
            Message::Ping(bytes) => ws.send(Message::Pong(bytes)).await?,
            Message::Close(frame) => return Err(anyhow!("gateway closed: {:?}", frame)),
            _ => {}
        }
    }
}

async fn send_heartbeat(ws: &mut GatewaySocket, sequence: Option<u64>) -> Result<()> {
    let payload = json!({ "op": OP_HEARTBEAT, "d": sequence });
    ws.send(Message::Text(payload.to_string().into())).await?;
    Ok(())
}

fn identify_payload(token: &str) -> Value {
    json!({
        "op": OP_IDENTIFY,
        "d": {
            "token": token,
            "intents": GATEWAY_INTENTS,
            "properties": {
                "os": std::env::consts::OS,
                "browser": "coinbot",
                "device": "coinbot",
            },
        },
    })
}

#[derive(Debug, Deserialize)]
struct RawFrame {
    op: u8,
    #[serde(default)]
    d: Value,
    #[serde(default)]
    s: Option<u64>,
    #[serde(default)]
    t: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
enum GatewayFrame {
    Hello { heartbeat_interval: u64 },
    Dispatch { sequence: Option<u64>, event: DispatchEvent },
    HeartbeatRequest,
    HeartbeatAck,
    Reconnect,
    InvalidSession,
}

#[derive(Debug, Clone, PartialEq)]
enum DispatchEvent {
    Ready { application_id: u64, user_name: String },
    MessageCreated(MessageCreated),
    ReactionAdded(ReactionEvent),
    Command(SlashCommand),
    Ignored(String),
}

#[derive(Debug, Clone, PartialEq)]
struct SlashCommand {
    interaction_id: u64,
    token: String,
    invoker: PlatformUser,
    kind: CommandKind,
}

#[derive(Debug, Clone, PartialEq)]
enum CommandKind {
    Ping,
    Balance { user: Option<PlatformUser> },
    Transfer { amount: i64, receiver: PlatformUser },
    Pull { wager: Option<i64> },
    Reels(ReelEdit),
    Unknown(String),
}

/// `Ok(None)` for frames the bridge does not act on.
fn parse_frame(text: &str) -> Result<Option<GatewayFrame>> {
    let raw: RawFrame = serde_json::from_str(text)?;
    let frame = match raw.op {
        OP_HELLO => {
            let interval = raw
                .d
                .get("heartbeat_interval")
                .and_then(Value::as_u64)
                .ok_or_else(|| anyhow!("hello without heartbeat_interval"))?;
            GatewayFrame::Hello {
                heartbeat_interval: interval,
            }
        }
        OP_DISPATCH => {
            let name = raw.t.unwrap_or_default();
            let event = match parse_dispatch(&name, &raw.d) {
                Ok(event) => event,
                Err(err) => {
                    warn!("dropping malformed {} event: {}", name, err);
                    DispatchEvent::Ignored(name)
                }
            };
            GatewayFrame::Dispatch {
                sequence: raw.s,
                event,
            }
        }
        OP_HEARTBEAT => GatewayFrame::HeartbeatRequest,
        OP_HEARTBEAT_ACK => GatewayFrame::HeartbeatAck,
        OP_RECONNECT => GatewayFrame::Reconnect,
        OP_INVALID_SESSION => GatewayFrame::InvalidSession,
        _ => return Ok(None),
    };
    Ok(Some(frame))
}

#[derive(Debug, Deserialize)]
struct WireMember {
    #[serde(default)]
    user: Option<WireUser>,
    #[serde(default)]
    nick: Option<String>,
}

impl WireMember {
    fn to_platform_user(&self) -> Result<Option<PlatformUser>> {
        let Some(user) = &self.user else {
            return Ok(None);
        };
        let mut platform_user = user.to_platform_user()?;
        if let Some(nick) = self.nick.as_ref().filter(|nick| !nick.is_empty()) {
            platform_user.display_name = nick.clone();
        }
        Ok(Some(platform_user))
    }
}

#[derive(Debug, Deserialize)]
struct WireMessageCreate {
    id: String,
    channel_id: String,
    #[serde(default)]
    guild_id: Option<String>,
    author: WireUser,
}

#[derive(Debug, Deserialize)]
struct WireReactionAdd {
    message_id: String,
    channel_id: String,
    #[serde(default)]
    guild_id: Option<String>,
    #[serde(default)]
    member: Option<WireMember>,
    emoji: WireEmoji,
    #[serde(default)]
    message_author_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireInteraction {
    id: String,
    token: String,
    #[serde(rename = "type")]
    kind: u8,
    #[serde(default)]
    member: Option<WireMember>,
    #[serde(default)]
    user: Option<WireUser>,
    #[serde(default)]
    data: Option<WireCommandData>,
}

#[derive(Debug, Deserialize)]
struct WireCommandData {
    name: String,
    #[serde(default)]
    options: Vec<WireOption>,
    #[serde(default)]
    resolved: Option<WireResolved>,
}

#[derive(Debug, Deserialize)]
struct WireOption {
    name: String,
    #[serde(rename = "type")]
    kind: u8,
    #[serde(default)]
    value: Value,
}

#[derive(Debug, Default, Deserialize)]
struct WireResolved {
    #[serde(default)]
    users: std::collections::HashMap<String, WireUser>,
    #[serde(default)]
    members: std::collections::HashMap<String, WireMember>,
}

fn parse_optional_snowflake(raw: Option<&String>) -> Result<Option<u64>> {
    raw.map(|value| parse_snowflake(value)).transpose()
}

fn parse_dispatch(name: &str, data: &Value) -> Result<DispatchEvent> {
    let event = match name {
        "READY" => {
            let application_id = data
                .pointer("/application/id")
                .and_then(Value::as_str)
                .ok_or_else(|| anyhow!("READY without application id"))?;
            let user_name = data
                .pointer("/user/username")
                .and_then(Value::as_str)
                .unwrap_or("unknown")
                .to_string();
            DispatchEvent::Ready {
                application_id: parse_snowflake(application_id)?,
                user_name,
            }
        }
        "MESSAGE_CREATE" => {
            let wire: WireMessageCreate = serde_json::from_value(data.clone())?;
            DispatchEvent::MessageCreated(MessageCreated {
                message_id: parse_snowflake(&wire.id)?,
                channel_id: parse_snowflake(&wire.channel_id)?,
                guild_id: parse_optional_snowflake(wire.guild_id.as_ref())?,
                author: wire.author.to_platform_user()?,
            })
        }
        "MESSAGE_REACTION_ADD" => parse_reaction(data)?,
        "INTERACTION_CREATE" => parse_interaction(data)?,
        other => DispatchEvent::Ignored(other.to_string()),
    };
    Ok(event)
}

/// Reactions need a guild, a member sender, a known author and a custom
/// emoji; anything else cannot earn a reward.
fn parse_reaction(data: &Value) -> Result<DispatchEvent> {
    let wire: WireReactionAdd = serde_json::from_value(data.clone())?;
    let ignored = || DispatchEvent::Ignored("MESSAGE_REACTION_ADD".to_string());
    let Some(author_id) = parse_optional_snowflake(wire.message_author_id.as_ref())? else {
        return Ok(ignored());
    };
    if wire.emoji.id.is_none() {
        return Ok(ignored());
    }
    let Some(sender) = wire
        .member
        .as_ref()
        .map(WireMember::to_platform_user)
        .transpose()?
        .flatten()
    else {
        warn!("reaction on message {} has no member sender", wire.message_id);
        return Ok(ignored());
    };
    Ok(DispatchEvent::ReactionAdded(ReactionEvent {
        message_id: parse_snowflake(&wire.message_id)?,
        channel_id: parse_snowflake(&wire.channel_id)?,
        guild_id: parse_optional_snowflake(wire.guild_id.as_ref())?,
        sender,
        receiver_id: author_id,
        receiver: None,
        emoji: wire.emoji.to_emoji_ref()?,
        timestamp: Utc::now(),
    }))
}

fn parse_interaction(data: &Value) -> Result<DispatchEvent> {
    let wire: WireInteraction = serde_json::from_value(data.clone())?;
    if wire.kind != APPLICATION_COMMAND {
        return Ok(DispatchEvent::Ignored("INTERACTION_CREATE".to_string()));
    }
    let invoker = match (&wire.member, &wire.user) {
        (Some(member), _) => member.to_platform_user()?,
        (None, Some(user)) => Some(user.to_platform_user()?),
        (None, None) => None,
    }
    .ok_or_else(|| anyhow!("interaction {} has no user", wire.id))?;
    let command = wire
        .data
        .ok_or_else(|| anyhow!("interaction {} has no command data", wire.id))?;

    let resolved = command.resolved.unwrap_or_default();
    let resolve_user = |option: &WireOption| -> Result<PlatformUser> {
        let id = option
            .value
            .as_str()
            .ok_or_else(|| anyhow!("option {} is not a user id", option.name))?;
        let user = resolved
            .users
            .get(id)
            .ok_or_else(|| anyhow!("user {} missing from resolved data", id))?;
        let mut platform_user = user.to_platform_user()?;
        if let Some(nick) = resolved
            .members
            .get(id)
            .and_then(|member| member.nick.clone())
            .filter(|nick| !nick.is_empty())
        {
            platform_user.display_name = nick;
        }
        Ok(platform_user)
    };
    let option = |name: &str, kind: u8| {
        command
            .options
            .iter()
            .find(|option| option.name == name && option.kind == kind)
    };
    let integer = |name: &str| option(name, OPTION_INTEGER).and_then(|option| option.value.as_i64());
    let string = |name: &str| {
        option(name, OPTION_STRING)
            .and_then(|option| option.value.as_str())
            .map(str::to_string)
    };

    let kind = match command.name.as_str() {
        "ping" => CommandKind::Ping,
        "balance" => CommandKind::Balance {
            user: option("user", OPTION_USER).map(resolve_user).transpose()?,
        },
        "transfer" => CommandKind::Transfer {
            amount: integer("amount").ok_or_else(|| anyhow!("transfer without amount"))?,
            receiver: option("user", OPTION_USER)
                .map(resolve_user)
                .transpose()?
                .ok_or_else(|| anyhow!("transfer without user"))?,
        },
        "pull" => CommandKind::Pull {
            wager: integer("wager"),
        },
        "reels" => CommandKind::Reels(ReelEdit {
            add_symbol: string("add_symbol"),
            remove_symbol: string("remove_symbol"),
            amount: integer("amount").and_then(|value| u32::try_from(value).ok()),
            reel: string("reel"),
        }),
        other => CommandKind::Unknown(other.to_string()),
    };

    Ok(DispatchEvent::Command(SlashCommand {
        interaction_id: parse_snowflake(&wire.id)?,
        token: wire.token,
        invoker,
        kind,
    }))
}

async fn handle_command(state: &AppState, rest: &DiscordRestClient, command: SlashCommand) {
    let invoker = &command.invoker;
    let (result, ephemeral) = match &command.kind {
        CommandKind::Ping => (Ok("Pong!".to_string()), true),
        CommandKind::Balance { user } => (
            balance_queries::balance_message(state, user.as_ref().unwrap_or(invoker)).await,
            false,
        ),
        CommandKind::Transfer { amount, receiver } => (
            transfer_commands::transfer(state, invoker, receiver, *amount).await,
            false,
        ),
        CommandKind::Pull { wager } => (
            slot_commands::pull(state, invoker, *wager)
                .await
                .map(|reply| reply.message),
            false,
        ),
        CommandKind::Reels(edit) if *edit == ReelEdit::default() => {
            (Ok(slot_queries::reels_report(state).await), false)
        }
        CommandKind::Reels(edit) => (slot_commands::edit_reels(state, edit).await, false),
        CommandKind::Unknown(name) => {
            warn!("unknown slash command {}", name);
            (Ok(format!("Unknown command {}.", name)), true)
        }
    };

    let content = match result {
        Ok(content) => content,
        Err(err) => {
            if err.is_fatal() {
                error!("command from {} hit a fatal error: {}", invoker.id, err);
            } else {
                warn!("command from {} failed: {}", invoker.id, err);
            }
            error_reply(&state.bot, &err)
        }
    };
    if let Err(err) = rest
        .reply_to_interaction(command.interaction_id, &command.token, &content, ephemeral)
        .await
    {
        warn!("interaction reply failed: {}", err);
    }
}

fn error_reply(bot: &BotConfiguration, err: &AppError) -> String {
    let administrator = mention(bot.administrator_id);
    match err {
        AppError::InsufficientBalance { balance, .. } => format!(
            "You do not have enough {}. You have {} {}.",
            bot.coins,
            balance,
            bot.unit(*balance)
        ),
        AppError::PullInProgress => "Your previous pull is still in progress.".to_string(),
        AppError::EmojiResolution { emoji_id } => {
            format!("Error: Emoji not found for {}. {} pls fix.", emoji_id, administrator)
        }
        AppError::BadRequest(message) | AppError::ConfigInvalid(message) => message.clone(),
        AppError::Slot(err) => err.to_string(),
        _ => format!("An error occurred. {} pls fix.", administrator),
    }
}

/// Global command definitions synced on every READY.
fn slash_commands(bot: &BotConfiguration) -> Value {
    json!([
        {
            "name": "pull",
            "description": "Pull the lever and test your luck",
            "options": [{
                "name": "wager",
                "description": format!("Amount of {} to wager", bot.coins),
                "type": OPTION_INTEGER,
                "required": false,
                "min_value": 1,
            }],
        },
        {
            "name": "transfer",
            "description": format!("Transfer {} to another user", bot.coins),
            "options": [
                {
                    "name": "amount",
                    "description": format!("Amount of {} to transfer", bot.coins),
                    "type": OPTION_INTEGER,
                    "required": true,
                    "min_value": 1,
                },
                {
                    "name": "user",
                    "description": format!("User to transfer the {} to", bot.coins),
                    "type": OPTION_USER,
                    "required": true,
                },
            ],
        },
        {
            "name": "balance",
            "description": "Check your balance",
            "options": [{
                "name": "user",
                "description": "User to check the balance",
                "type": OPTION_USER,
                "required": false,
            }],
        },
        {
            "name": "reels",
            "description": "Design the slot machine reels",
            "options": [
                {"name": "add_symbol", "description": "Add a symbol to the reels", "type": OPTION_STRING, "required": false},
                {"name": "remove_symbol", "description": "Remove a symbol from the reels", "type": OPTION_STRING, "required": false},
                {"name": "amount", "description": "Amount of symbols to add or remove", "type": OPTION_INTEGER, "required": false, "min_value": 1},
                {"name": "reel", "description": "The reel to modify", "type": OPTION_STRING, "required": false},
            ],
        },
        {
            "name": "ping",
            "description": "Replies with Pong!",
        },
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use coinbot_domain::{BotConfigDocument, EmojiRef};

    fn dispatch(frame: Option<GatewayFrame>) -> DispatchEvent {
        match frame {
            Some(GatewayFrame::Dispatch { event, .. }) => event,
            other => panic!("expected dispatch, got {:?}", other),
        }
    }

    #[test]
    fn intents_cover_guild_messages_and_reactions() {
        assert_eq!(GATEWAY_INTENTS, 1537);
    }

    #[test]
    fn parses_hello_and_control_frames() {
        let hello = parse_frame(r#"{"op":10,"d":{"heartbeat_interval":41250}}"#).expect("parse");
        assert_eq!(
            hello,
            Some(GatewayFrame::Hello {
                heartbeat_interval: 41250
            })
        );
        assert_eq!(
            parse_frame(r#"{"op":11}"#).expect("parse"),
            Some(GatewayFrame::HeartbeatAck)
        );
        assert_eq!(
            parse_frame(r#"{"op":7,"d":null}"#).expect("parse"),
            Some(GatewayFrame::Reconnect)
        );
        assert_eq!(
            parse_frame(r#"{"op":9,"d":false}"#).expect("parse"),
            Some(GatewayFrame::InvalidSession)
        );
        assert_eq!(parse_frame(r#"{"op":3}"#).expect("parse"), None);
    }

    #[test]
    fn parses_message_create() {
        let frame = parse_frame(
            r#"{"op":0,"s":4,"t":"MESSAGE_CREATE","d":{"id":"11","channel_id":"20","guild_id":"77","author":{"id":"9","username":"ada"},"content":"hi"}}"#,
        )
        .expect("parse");
        assert_eq!(
            dispatch(frame),
            DispatchEvent::MessageCreated(MessageCreated {
                message_id: 11,
                channel_id: 20,
                guild_id: Some(77),
                author: PlatformUser::new(9, "ada"),
            })
        );
    }

    #[test]
    fn parses_reaction_with_member_nick() {
        let frame = parse_frame(
            r#"{"op":0,"s":5,"t":"MESSAGE_REACTION_ADD","d":{
                "user_id":"2","message_id":"11","channel_id":"20","guild_id":"77",
                "message_author_id":"9",
                "member":{"nick":"Bobby","user":{"id":"2","username":"bob"}},
                "emoji":{"id":"900","name":"coin"}
            }}"#,
        )
        .expect("parse");
        let DispatchEvent::ReactionAdded(event) = dispatch(frame) else {
            panic!("expected reaction");
        };
        assert_eq!(event.sender, PlatformUser::new(2, "Bobby"));
        assert_eq!(event.receiver_id, 9);
        assert_eq!(event.guild_id, Some(77));
        assert_eq!(
            event.emoji,
            EmojiRef::Custom {
                id: 900,
                name: "coin".to_string()
            }
        );
    }

    #[test]
    fn reactions_without_author_or_custom_emoji_are_ignored() {
        let no_author = parse_frame(
            r#"{"op":0,"t":"MESSAGE_REACTION_ADD","d":{"message_id":"11","channel_id":"20","guild_id":"77","member":{"user":{"id":"2","username":"bob"}},"emoji":{"id":"900","name":"coin"}}}"#,
        )
        .expect("parse");
        assert!(matches!(dispatch(no_author), DispatchEvent::Ignored(_)));

        let unicode = parse_frame(
            r#"{"op":0,"t":"MESSAGE_REACTION_ADD","d":{"message_id":"11","channel_id":"20","guild_id":"77","message_author_id":"9","member":{"user":{"id":"2","username":"bob"}},"emoji":{"id":null,"name":"🔥"}}}"#,
        )
        .expect("parse");
        assert!(matches!(dispatch(unicode), DispatchEvent::Ignored(_)));
    }

    #[test]
    fn parses_transfer_command_with_resolved_user() {
        let frame = parse_frame(
            r#"{"op":0,"t":"INTERACTION_CREATE","d":{
                "id":"555","token":"tok","type":2,"channel_id":"20","guild_id":"77",
                "member":{"user":{"id":"2","username":"bob"}},
                "data":{"name":"transfer","options":[
                    {"name":"amount","type":4,"value":4},
                    {"name":"user","type":6,"value":"3"}
                ],"resolved":{"users":{"3":{"id":"3","username":"cy"}}}}
            }}"#,
        )
        .expect("parse");
        let DispatchEvent::Command(command) = dispatch(frame) else {
            panic!("expected command");
        };
        assert_eq!(command.interaction_id, 555);
        assert_eq!(command.invoker, PlatformUser::new(2, "bob"));
        assert_eq!(
            command.kind,
            CommandKind::Transfer {
                amount: 4,
                receiver: PlatformUser::new(3, "cy"),
            }
        );
    }

    #[test]
    fn parses_reels_and_pull_options() {
        let frame = parse_frame(
            r#"{"op":0,"t":"INTERACTION_CREATE","d":{
                "id":"556","token":"tok","type":2,
                "user":{"id":"2","username":"bob"},
                "data":{"name":"reels","options":[
                    {"name":"add_symbol","type":3,"value":"small_win"},
                    {"name":"amount","type":4,"value":3}
                ]}
            }}"#,
        )
        .expect("parse");
        let DispatchEvent::Command(command) = dispatch(frame) else {
            panic!("expected command");
        };
        assert_eq!(
            command.kind,
            CommandKind::Reels(ReelEdit {
                add_symbol: Some("small_win".to_string()),
                amount: Some(3),
                ..ReelEdit::default()
            })
        );

        let frame = parse_frame(
            r#"{"op":0,"t":"INTERACTION_CREATE","d":{"id":"557","token":"tok","type":2,"user":{"id":"2","username":"bob"},"data":{"name":"pull"}}}"#,
        )
        .expect("parse");
        let DispatchEvent::Command(command) = dispatch(frame) else {
            panic!("expected command");
        };
        assert_eq!(command.kind, CommandKind::Pull { wager: None });
    }

    #[test]
    fn ready_carries_application_id() {
        let frame = parse_frame(
            r#"{"op":0,"s":1,"t":"READY","d":{"user":{"id":"1","username":"coinbot"},"application":{"id":"4242"}}}"#,
        )
        .expect("parse");
        assert_eq!(
            dispatch(frame),
            DispatchEvent::Ready {
                application_id: 4242,
                user_name: "coinbot".to_string(),
            }
        );
    }

    #[test]
    fn malformed_dispatch_is_ignored_not_fatal() {
        let frame = parse_frame(r#"{"op":0,"t":"MESSAGE_CREATE","d":{"id":"x"}}"#).expect("parse");
        assert_eq!(
            dispatch(frame),
            DispatchEvent::Ignored("MESSAGE_CREATE".to_string())
        );
    }

    #[test]
    fn error_replies_match_bot_wording() {
        let bot = BotConfiguration::from_document(&BotConfigDocument {
            administrator_id: "1".to_string(),
            ..BotConfigDocument::default()
        })
        .expect("bot");
        assert_eq!(
            error_reply(
                &bot,
                &AppError::InsufficientBalance {
                    balance: 1,
                    required: 4
                }
            ),
            "You do not have enough coins. You have 1 coin."
        );
        assert_eq!(
            error_reply(&bot, &AppError::EmojiResolution { emoji_id: 7 }),
            "Error: Emoji not found for 7. <@1> pls fix."
        );
        assert_eq!(
            error_reply(&bot, &AppError::LedgerUnavailable("down".to_string())),
            "An error occurred. <@1> pls fix."
        );
    }

    #[test]
    fn command_definitions_use_coin_names() {
        let bot = BotConfiguration::from_document(&BotConfigDocument {
            coins: "gems".to_string(),
            ..BotConfigDocument::default()
        })
        .expect("bot");
        let commands = slash_commands(&bot);
        let names: Vec<&str> = commands
            .as_array()
            .expect("array")
            .iter()
            .filter_map(|command| command["name"].as_str())
            .collect();
        assert_eq!(names, vec!["pull", "transfer", "balance", "reels", "ping"]);
        assert_eq!(commands[1]["description"], "Transfer gems to another user");
    }
}

use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Action names the frontend may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    GithubFetch,
    GithubUpload,
    GithubDelete,
    TelegramSend,
    TelegramGetUpdates,
    GeminiChat,
}

impl ActionKind {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "github_fetch" => Some(Self::GithubFetch),
            "github_upload" => Some(Self::GithubUpload),
            "github_delete" => Some(Self::GithubDelete),
            "telegram_send" => Some(Self::TelegramSend),
            "telegram_get_updates" => Some(Self::TelegramGetUpdates),
            "gemini_chat" => Some(Self::GeminiChat),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GithubFetch => "github_fetch",
            Self::GithubUpload => "github_upload",
            Self::GithubDelete => "github_delete",
            Self::TelegramSend => "telegram_send",
            Self::TelegramGetUpdates => "telegram_get_updates",
            Self::GeminiChat => "gemini_chat",
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file in a repository's contents API.
///
/// `owner` and `repo` are single path segments and no segment may be `.` or
/// `..`, so the request URL always stays under `/repos/{owner}/{repo}/contents/`.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "RawGithubFile")]
pub struct GithubFile {
    pub owner: String,
    pub repo: String,
    pub path: String,
}

#[derive(Deserialize)]
struct RawGithubFile {
    owner: String,
    repo: String,
    path: String,
}

impl GithubFile {
    /// Non-empty segments of `path`.
    pub fn path_segments(&self) -> impl Iterator<Item = &str> {
        self.path.split('/').filter(|s| !s.is_empty())
    }
}

/// `.` or `..`, including their percent-encoded spellings such as `%2e%2E`.
fn is_dot_segment(segment: &str) -> bool {
    let decoded = segment.to_ascii_lowercase().replace("%2e", ".");
    decoded == "." || decoded == ".."
}

impl TryFrom<RawGithubFile> for GithubFile {
    type Error = String;

    fn try_from(raw: RawGithubFile) -> Result<Self, Self::Error> {
        for (field, value) in [("owner", &raw.owner), ("repo", &raw.repo)] {
            if value.is_empty() || value.contains('/') || is_dot_segment(value) {
                return Err(format!("invalid GitHub {field} `{value}`"));
            }
        }
        if let Some(segment) = raw.path.split('/').find(|s| is_dot_segment(s)) {
            return Err(format!("invalid GitHub path segment `{segment}`"));
        }
        Ok(Self {
            owner: raw.owner,
            repo: raw.repo,
            path: raw.path,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GithubUpload {
    #[serde(flatten)]
    pub file: GithubFile,
    /// Base64-encoded file content, relayed as-is.
    pub content: String,
    pub message: String,
    /// Blob sha of the file being replaced; absent when creating a new file.
    #[serde(default)]
    pub sha: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GithubDelete {
    #[serde(flatten)]
    pub file: GithubFile,
    pub sha: String,
    pub message: String,
}

/// Telegram accepts either a numeric chat id or an `@channelusername`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatId {
    Id(i64),
    Username(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelegramSend {
    pub chat_id: ChatId,
    pub text: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TelegramUpdates {
    #[serde(default, deserialize_with = "integer_or_numeric_string")]
    pub offset: Option<i64>,
}

/// Accept `5` or `"5"`; an empty string counts as absent.
fn integer_or_numeric_string<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Integer(i64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Integer(n)) => Ok(Some(n)),
        Some(Raw::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(Raw::Text(text)) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("offset must be an integer, got `{text}`"))),
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeminiChat {
    pub prompt: String,
}

/// A decoded request: one variant per upstream operation.
#[derive(Debug, Clone)]
pub enum Action {
    GithubFetch(GithubFile),
    GithubUpload(GithubUpload),
    GithubDelete(GithubDelete),
    TelegramSend(TelegramSend),
    TelegramGetUpdates(TelegramUpdates),
    GeminiChat(GeminiChat),
}

impl Action {
    /// Decode `payload` into the typed arguments for `kind`.
    /// A missing payload is read as an empty object.
    pub fn decode(kind: ActionKind, payload: Value) -> Result<Self, serde_json::Error> {
        let payload = match payload {
            Value::Null => Value::Object(Default::default()),
            other => other,
        };

        Ok(match kind {
            ActionKind::GithubFetch => Self::GithubFetch(serde_json::from_value(payload)?),
            ActionKind::GithubUpload => Self::GithubUpload(serde_json::from_value(payload)?),
            ActionKind::GithubDelete => Self::GithubDelete(serde_json::from_value(payload)?),
            ActionKind::TelegramSend => Self::TelegramSend(serde_json::from_value(payload)?),
            ActionKind::TelegramGetUpdates => {
                Self::TelegramGetUpdates(serde_json::from_value(payload)?)
            }
            ActionKind::GeminiChat => Self::GeminiChat(serde_json::from_value(payload)?),
        })
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            Self::GithubFetch(_) => ActionKind::GithubFetch,
            Self::GithubUpload(_) => ActionKind::GithubUpload,
            Self::GithubDelete(_) => ActionKind::GithubDelete,
            Self::TelegramSend(_) => ActionKind::TelegramSend,
            Self::TelegramGetUpdates(_) => ActionKind::TelegramGetUpdates,
            Self::GeminiChat(_) => ActionKind::GeminiChat,
        }
    }
}

/// The inbound JSON body: `{ action, payload, accessCode }`.
///
/// Kept as a raw value so that a malformed body still reaches the access check
/// (and is denied there) instead of failing before it.
#[derive(Debug, Default)]
pub struct InboundRequest {
    body: Value,
}

impl InboundRequest {
    pub fn parse(bytes: &[u8]) -> Self {
        Self {
            body: serde_json::from_slice(bytes).unwrap_or(Value::Null),
        }
    }

    /// The caller's access code from `accessCode`, or `code` as a fallback.
    pub fn access_code(&self) -> Option<&str> {
        self.body
            .get("accessCode")
            .or_else(|| self.body.get("code"))
            .and_then(Value::as_str)
    }

    pub fn action_name(&self) -> Option<&str> {
        self.body.get("action").and_then(Value::as_str)
    }

    pub fn into_payload(mut self) -> Value {
        self.body
            .get_mut("payload")
            .map(Value::take)
            .unwrap_or(Value::Null)
    }
}

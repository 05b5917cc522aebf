use reqwest::Url;
use std::fmt;

/// Query parameter carrying the group id in a shared menu link
pub const GROUP_QUERY_PARAM: &str = "group";

/// Name offered before the participant picks one
pub const DEFAULT_PARTICIPANT_NAME: &str = "Chủ nhóm";

/// Group order session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSession {
    pub group_id: String,
    pub participant_name: Option<String>,
    pub is_active: bool,
}

impl GroupSession {
    pub fn new(group_id: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            participant_name: None,
            is_active: false,
        }
    }

    /// Start a new group (host side) with a fresh id
    pub fn create() -> Self {
        let id = uuid::Uuid::new_v4().simple().to_string();
        Self::new(&id[..12])
    }

    /// Session for the `group` query parameter of `url`, if present.
    ///
    /// Relative URLs (`/menu?group=abc`) are accepted.
    pub fn from_url(url: &str) -> Option<Self> {
        let parsed = Url::parse(url).or_else(|_| {
            Url::parse("http://localhost/").and_then(|base| base.join(url))
        });
        let parsed = match parsed {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::debug!(url, "Unparseable page URL: {e}");
                return None;
            }
        };
        parsed
            .query_pairs()
            .find(|(key, _)| key == GROUP_QUERY_PARAM)
            .map(|(_, value)| value.trim().to_string())
            .filter(|id| is_valid_group_id(id))
            .map(Self::new)
    }

    /// Link to share with other participants
    pub fn invite_url(&self, page_url: &str) -> Option<String> {
        let mut url = Url::parse(page_url).ok()?;
        let others: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| key != GROUP_QUERY_PARAM)
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        url.query_pairs_mut()
            .clear()
            .extend_pairs(others)
            .append_pair(GROUP_QUERY_PARAM, &self.group_id);
        Some(url.to_string())
    }
}

/// Group ids end up in the channel path; keep them URL-safe
fn is_valid_group_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 64
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Normalize a participant name: trimmed, non-empty
pub fn normalize_name(name: &str) -> Option<String> {
    let name = name.trim();
    (!name.is_empty()).then(|| name.to_string())
}

/// Group sync phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupPhase {
    /// No group in play
    Idle,
    /// Group id known, waiting for a name or the first connection
    Joining,
    /// Channel open, additions are mirrored
    Connected,
    /// Channel lost; the cart keeps working locally
    Disconnected,
}

impl fmt::Display for GroupPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupPhase::Idle => write!(f, "idle"),
            GroupPhase::Joining => write!(f, "joining"),
            GroupPhase::Connected => write!(f, "connected"),
            GroupPhase::Disconnected => write!(f, "disconnected"),
        }
    }
}

use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_ACTIVITIES_API_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_MESSAGE_HIDE_MS: u64 = 5000;
pub const DEFAULT_VISITOR_IDLE_SECS: u64 = 30 * 60;
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_ASSETS_DIR: &str = "assets";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} is not a valid number: {value:?}")]
    InvalidNumber { var: &'static str, value: String },
    #[error("{var} is not a valid http(s) url: {value:?}")]
    InvalidUrl { var: &'static str, value: String },
    #[error("anchor {anchor:?} has invalid id {id:?}")]
    InvalidAnchorId { anchor: Anchor, id: String },
    #[error("anchor id {id:?} is used by both {first:?} and {second:?}")]
    DuplicateAnchorId {
        id: String,
        first: Anchor,
        second: Anchor,
    },
    #[error("could not build http client: {0}")]
    HttpClient(String),
}

/// Element ids the hosting page must provide for the board to attach to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    ActivitiesList,
    ActivitySelect,
    SignupForm,
    Message,
    EmailInput,
}

impl Anchor {
    pub const ALL: [Anchor; 5] = [
        Anchor::ActivitiesList,
        Anchor::ActivitySelect,
        Anchor::SignupForm,
        Anchor::Message,
        Anchor::EmailInput,
    ];

    pub fn default_id(self) -> &'static str {
        match self {
            Anchor::ActivitiesList => "activities-list",
            Anchor::ActivitySelect => "activity",
            Anchor::SignupForm => "signup-form",
            Anchor::Message => "message",
            Anchor::EmailInput => "email",
        }
    }

    pub fn env_var(self) -> &'static str {
        match self {
            Anchor::ActivitiesList => "BOARD_ANCHOR_ACTIVITIES_LIST",
            Anchor::ActivitySelect => "BOARD_ANCHOR_ACTIVITY_SELECT",
            Anchor::SignupForm => "BOARD_ANCHOR_SIGNUP_FORM",
            Anchor::Message => "BOARD_ANCHOR_MESSAGE",
            Anchor::EmailInput => "BOARD_ANCHOR_EMAIL_INPUT",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardAnchors {
    pub activities_list: String,
    pub activity_select: String,
    pub signup_form: String,
    pub message: String,
    pub email_input: String,
}

impl Default for BoardAnchors {
    fn default() -> Self {
        Self {
            activities_list: Anchor::ActivitiesList.default_id().to_string(),
            activity_select: Anchor::ActivitySelect.default_id().to_string(),
            signup_form: Anchor::SignupForm.default_id().to_string(),
            message: Anchor::Message.default_id().to_string(),
            email_input: Anchor::EmailInput.default_id().to_string(),
        }
    }
}

impl BoardAnchors {
    pub fn id(&self, anchor: Anchor) -> &str {
        match anchor {
            Anchor::ActivitiesList => &self.activities_list,
            Anchor::ActivitySelect => &self.activity_select,
            Anchor::SignupForm => &self.signup_form,
            Anchor::Message => &self.message,
            Anchor::EmailInput => &self.email_input,
        }
    }

    fn id_mut(&mut self, anchor: Anchor) -> &mut String {
        match anchor {
            Anchor::ActivitiesList => &mut self.activities_list,
            Anchor::ActivitySelect => &mut self.activity_select,
            Anchor::SignupForm => &mut self.signup_form,
            Anchor::Message => &mut self.message,
            Anchor::EmailInput => &mut self.email_input,
        }
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut anchors = BoardAnchors::default();
        for anchor in Anchor::ALL {
            if let Some(id) = lookup(anchor.env_var()) {
                *anchors.id_mut(anchor) = id.trim().to_string();
            }
        }
        anchors.validate()?;
        Ok(anchors)
    }

    /// Ids must be non-empty, whitespace-free, and distinct across anchors.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (i, anchor) in Anchor::ALL.iter().enumerate() {
            let id = self.id(*anchor);
            if !is_valid_element_id(id) {
                return Err(ConfigError::InvalidAnchorId {
                    anchor: *anchor,
                    id: id.to_string(),
                });
            }
            if let Some(other) = Anchor::ALL[..i].iter().find(|a| self.id(**a) == id) {
                return Err(ConfigError::DuplicateAnchorId {
                    id: id.to_string(),
                    first: *other,
                    second: *anchor,
                });
            }
        }
        Ok(())
    }
}

fn is_valid_element_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.'))
}

#[derive(Debug, Clone)]
pub struct BoardConfig {
    pub activities_api_url: String,
    pub api_timeout: Option<Duration>,
    pub message_hide_after: Duration,
    /// How long an inactive visitor's form and message are kept.
    pub visitor_idle_ttl: Duration,
    pub anchors: BoardAnchors,
    pub assets_dir: String,
    pub host: String,
    pub port: u16,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            activities_api_url: DEFAULT_ACTIVITIES_API_URL.to_string(),
            api_timeout: None,
            message_hide_after: Duration::from_millis(DEFAULT_MESSAGE_HIDE_MS),
            visitor_idle_ttl: Duration::from_secs(DEFAULT_VISITOR_IDLE_SECS),
            anchors: BoardAnchors::default(),
            assets_dir: DEFAULT_ASSETS_DIR.to_string(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl BoardConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let activities_api_url = lookup("ACTIVITIES_API_URL")
            .unwrap_or_else(|| DEFAULT_ACTIVITIES_API_URL.to_string());
        let parsed = reqwest::Url::parse(&activities_api_url).map_err(|_| {
            ConfigError::InvalidUrl {
                var: "ACTIVITIES_API_URL",
                value: activities_api_url.clone(),
            }
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidUrl {
                var: "ACTIVITIES_API_URL",
                value: activities_api_url,
            });
        }

        let api_timeout =
            parse_number::<u64>(&lookup, "ACTIVITIES_API_TIMEOUT_MS")?.map(Duration::from_millis);
        let message_hide_after = Duration::from_millis(
            parse_number::<u64>(&lookup, "BOARD_MESSAGE_HIDE_MS")?
                .unwrap_or(DEFAULT_MESSAGE_HIDE_MS),
        );
        let visitor_idle_ttl = Duration::from_secs(
            parse_number::<u64>(&lookup, "BOARD_VISITOR_IDLE_SECS")?
                .unwrap_or(DEFAULT_VISITOR_IDLE_SECS),
        );

        Ok(Self {
            activities_api_url: activities_api_url.trim_end_matches('/').to_string(),
            api_timeout,
            message_hide_after,
            visitor_idle_ttl,
            anchors: BoardAnchors::from_lookup(&lookup)?,
            assets_dir: lookup("BOARD_ASSETS_DIR").unwrap_or_else(|| DEFAULT_ASSETS_DIR.to_string()),
            host: lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: parse_number::<u16>(&lookup, "PORT")?.unwrap_or(DEFAULT_PORT),
        })
    }
}

fn parse_number<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(var) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidNumber { var, value }),
    }
}

//! Environment profile model: one named set of backend credentials.
//!
//! Profiles are exchanged as `KEY: value` text. Keys are case-insensitive and
//! stored upper-cased; values are trimmed with one surrounding quote removed.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::util::normalize_text_option;

pub const KEY_API_KEY: &str = "APIKEY";
pub const KEY_AUTH_DOMAIN: &str = "AUTHDOMAIN";
pub const KEY_PROJECT_ID: &str = "PROJECTID";
pub const KEY_STORAGE_BUCKET: &str = "STORAGEBUCKET";
pub const KEY_MESSAGING_SENDER_ID: &str = "MESSAGINGSENDERID";
pub const KEY_APP_ID: &str = "APPID";
pub const KEY_CLOUD_NAME: &str = "CLOUDNAME";
pub const KEY_UPLOAD_PRESET: &str = "UPLOADPRESET";
pub const KEY_CLOUD_API_KEY: &str = "CLOUDAPIKEY";
pub const KEY_CLOUD_API_SECRET: &str = "CLOUDAPISECRET";

/// Keys that must be present before a connection may be opened, in report order.
pub const REQUIRED_KEYS: [&str; 6] = [
    KEY_API_KEY,
    KEY_AUTH_DOMAIN,
    KEY_PROJECT_ID,
    KEY_STORAGE_BUCKET,
    KEY_MESSAGING_SENDER_ID,
    KEY_APP_ID,
];

/// Separator used between `KEY: "value"` pairs in the stored form.
pub const PROFILE_SEPARATOR: &str = ", ";

/// How pairs are delimited in profile text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    /// One pair per line (configuration files, pasted text)
    Newline,
    /// Comma-separated pairs (the stored and form-editing representation)
    Comma,
}

impl Delimiter {
    const fn as_char(self) -> char {
        match self {
            Self::Newline => '\n',
            Self::Comma => ',',
        }
    }
}

/// Credentials for the image hosting service.
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ImageServiceCredentials {
    pub cloud_name: String,
    pub upload_preset: Option<String>,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
}

impl fmt::Debug for ImageServiceCredentials {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ImageServiceCredentials")
            .field("cloud_name", &self.cloud_name)
            .field("upload_preset", &self.upload_preset)
            .field("api_key", &self.api_key)
            .field("api_secret", &self.api_secret.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// A set of backend credentials identified by its API key.
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EnvironmentProfile {
    pub api_key: Option<String>,
    pub auth_domain: Option<String>,
    pub project_id: Option<String>,
    pub storage_bucket: Option<String>,
    pub messaging_sender_id: Option<String>,
    pub app_id: Option<String>,
    pub cloud_name: Option<String>,
    pub upload_preset: Option<String>,
    pub cloud_api_key: Option<String>,
    pub cloud_api_secret: Option<String>,
}

impl fmt::Debug for EnvironmentProfile {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("EnvironmentProfile")
            .field("api_key", &self.api_key)
            .field("auth_domain", &self.auth_domain)
            .field("project_id", &self.project_id)
            .field("storage_bucket", &self.storage_bucket)
            .field("messaging_sender_id", &self.messaging_sender_id)
            .field("app_id", &self.app_id)
            .field("cloud_name", &self.cloud_name)
            .field("upload_preset", &self.upload_preset)
            .field("cloud_api_key", &self.cloud_api_key)
            .field(
                "cloud_api_secret",
                &self.cloud_api_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

/// Parse `KEY: value` pairs into an upper-cased key map.
///
/// Blank entries and entries starting with `#` are skipped. The split happens
/// at the first `:` so values such as URLs keep their own colons. In the
/// comma form a double-quoted value may itself contain commas.
#[must_use]
pub fn parse_pairs(text: &str, delimiter: Delimiter) -> BTreeMap<String, String> {
    let entries = match delimiter {
        Delimiter::Newline => text.split(delimiter.as_char()).collect::<Vec<_>>(),
        Delimiter::Comma => split_outside_quotes(text, delimiter.as_char()),
    };

    let mut pairs = BTreeMap::new();
    for entry in entries {
        let entry = entry.trim();
        if entry.is_empty() || entry.starts_with('#') {
            continue;
        }
        let Some((key, value)) = entry.split_once(':') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        pairs.insert(key.to_uppercase(), strip_quotes(value.trim()).to_string());
    }
    pairs
}

/// Split on `delimiter` except inside a value opened by `"` right after `:`.
fn split_outside_quotes(text: &str, delimiter: char) -> Vec<&str> {
    let mut entries = Vec::new();
    let mut start = 0;
    let mut quoted = false;
    let mut previous = None;
    for (index, ch) in text.char_indices() {
        if ch == '"' && (quoted || previous == Some(':')) {
            quoted = !quoted;
        } else if ch == delimiter && !quoted {
            entries.push(&text[start..index]);
            start = index + ch.len_utf8();
        }
        if !ch.is_whitespace() {
            previous = Some(ch);
        }
    }
    entries.push(&text[start..]);
    entries
}

fn strip_quotes(value: &str) -> &str {
    let value = value
        .strip_prefix(['"', '\''])
        .unwrap_or(value);
    value.strip_suffix(['"', '\'']).unwrap_or(value)
}

impl EnvironmentProfile {
    /// Parse profile text in either delimiter form.
    #[must_use]
    pub fn parse(text: &str, delimiter: Delimiter) -> Self {
        Self::from_pairs(&parse_pairs(text, delimiter))
    }

    /// Parse text whose delimiter is unknown: multi-line text is read one pair
    /// per line, single-line text as comma-separated pairs.
    #[must_use]
    pub fn parse_auto(text: &str) -> Self {
        if text.trim().contains('\n') {
            Self::parse(text, Delimiter::Newline)
        } else {
            Self::parse(text, Delimiter::Comma)
        }
    }

    /// Read a dotenv-style file (`KEY=value` lines).
    pub fn from_dotenv_path(path: &Path) -> Result<Self> {
        let mut pairs = BTreeMap::new();
        let entries = dotenvy::from_path_iter(path)
            .map_err(|error| Error::Storage(format!("failed to read {}: {error}", path.display())))?;
        for entry in entries {
            let (key, value) = entry.map_err(|error| {
                Error::Storage(format!("failed to parse {}: {error}", path.display()))
            })?;
            pairs.insert(key.trim().to_uppercase(), value.trim().to_string());
        }
        Ok(Self::from_pairs(&pairs))
    }

    /// Build a profile from an upper-cased key map; unknown keys are ignored.
    #[must_use]
    pub fn from_pairs(pairs: &BTreeMap<String, String>) -> Self {
        let get = |key: &str| normalize_text_option(pairs.get(key).cloned());
        Self {
            api_key: get(KEY_API_KEY),
            auth_domain: get(KEY_AUTH_DOMAIN),
            project_id: get(KEY_PROJECT_ID),
            storage_bucket: get(KEY_STORAGE_BUCKET),
            messaging_sender_id: get(KEY_MESSAGING_SENDER_ID),
            app_id: get(KEY_APP_ID),
            cloud_name: get(KEY_CLOUD_NAME),
            upload_preset: get(KEY_UPLOAD_PRESET),
            cloud_api_key: get(KEY_CLOUD_API_KEY),
            cloud_api_secret: get(KEY_CLOUD_API_SECRET),
        }
    }

    fn fields(&self) -> [(&'static str, Option<&str>); 10] {
        [
            (KEY_API_KEY, self.api_key.as_deref()),
            (KEY_AUTH_DOMAIN, self.auth_domain.as_deref()),
            (KEY_PROJECT_ID, self.project_id.as_deref()),
            (KEY_STORAGE_BUCKET, self.storage_bucket.as_deref()),
            (KEY_MESSAGING_SENDER_ID, self.messaging_sender_id.as_deref()),
            (KEY_APP_ID, self.app_id.as_deref()),
            (KEY_CLOUD_NAME, self.cloud_name.as_deref()),
            (KEY_UPLOAD_PRESET, self.upload_preset.as_deref()),
            (KEY_CLOUD_API_KEY, self.cloud_api_key.as_deref()),
            (KEY_CLOUD_API_SECRET, self.cloud_api_secret.as_deref()),
        ]
    }

    /// Serialize as `KEY: "value"` pairs joined with [`PROFILE_SEPARATOR`].
    #[must_use]
    pub fn to_text(&self) -> String {
        self.fields()
            .into_iter()
            .filter_map(|(key, value)| value.map(|value| format!("{key}: \"{value}\"")))
            .collect::<Vec<_>>()
            .join(PROFILE_SEPARATOR)
    }

    /// Identity of the profile.
    #[must_use]
    pub fn identity(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    /// Required keys that are missing, in report order.
    #[must_use]
    pub fn missing_required(&self) -> Vec<&'static str> {
        self.fields()
            .into_iter()
            .take(REQUIRED_KEYS.len())
            .filter(|(_, value)| value.is_none())
            .map(|(key, _)| key)
            .collect()
    }

    /// Fail with a configuration error naming every missing required key.
    pub fn validate(&self) -> Result<()> {
        let missing = self.missing_required();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::Configuration(missing.join(", ")))
        }
    }

    /// Image service credentials, when a cloud name is configured.
    #[must_use]
    pub fn image_service(&self) -> Option<ImageServiceCredentials> {
        Some(ImageServiceCredentials {
            cloud_name: self.cloud_name.clone()?,
            upload_preset: self.upload_preset.clone(),
            api_key: self.cloud_api_key.clone(),
            api_secret: self.cloud_api_secret.clone(),
        })
    }

    /// Human-readable summary without the identity line or secrets.
    #[must_use]
    pub fn summary_lines(&self) -> Vec<String> {
        self.fields()
            .into_iter()
            .skip(1)
            .filter(|(key, _)| *key != KEY_CLOUD_API_SECRET)
            .filter_map(|(key, value)| value.map(|value| format!("{key}: {value}")))
            .collect()
    }
}

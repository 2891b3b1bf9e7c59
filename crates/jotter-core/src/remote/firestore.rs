//! Firestore REST adapter.
//!
//! Talks to `firestore.googleapis.com` with the profile's web API key. Only
//! the subset of the typed value format that notes and image references use
//! is mapped; anything else reads as `null`.

use std::time::Duration;

use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::{Connector, Document, DocumentStore, NOTES_COLLECTION};
use crate::error::{Error, Result};
use crate::models::EnvironmentProfile;
use crate::util::compact_text;

const FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com/v1";
const LIST_PAGE_SIZE: u32 = 300;

#[derive(Debug, Clone)]
pub struct FirestoreConnector {
    base_url: String,
    timeout: Duration,
}

impl FirestoreConnector {
    pub fn new(timeout: Duration) -> Self {
        Self {
            base_url: FIRESTORE_BASE_URL.to_string(),
            timeout,
        }
    }

    /// Point at an emulator or proxy instead of the public endpoint.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

impl Connector for FirestoreConnector {
    type Store = FirestoreStore;

    async fn connect(&self, profile: &EnvironmentProfile) -> Result<Self::Store> {
        let (Some(api_key), Some(project_id)) = (&profile.api_key, &profile.project_id) else {
            return Err(Error::Configuration("APIKEY, PROJECTID".to_string()));
        };
        let client = reqwest::Client::builder().timeout(self.timeout).build()?;
        let store = FirestoreStore {
            client,
            documents_url: format!(
                "{}/projects/{}/databases/(default)/documents",
                self.base_url,
                urlencoding::encode(project_id)
            ),
            api_key: api_key.clone(),
        };

        // Handshake: a one-document read proves the key and project are valid.
        let response = store
            .request(Method::GET, NOTES_COLLECTION)
            .query(&[("pageSize", "1")])
            .send()
            .await
            .map_err(|error| Error::Connection(error.to_string()))?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Connection(api_error(status, &body)));
        }
        tracing::debug!(project_id = %project_id, "firestore handshake succeeded");
        Ok(store)
    }
}

#[derive(Debug, Clone)]
pub struct FirestoreStore {
    client: reqwest::Client,
    documents_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FirestoreDocument {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    documents: Vec<FirestoreDocument>,
    next_page_token: Option<String>,
}

impl FirestoreStore {
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}/{}", self.documents_url, path))
            .query(&[("key", self.api_key.as_str())])
    }

    async fn check(response: reqwest::Response, write: bool) -> Result<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = api_error(status, &body);
        if status == StatusCode::NOT_FOUND {
            Err(Error::NotFound(message))
        } else if write {
            Err(Error::RemoteWrite(message))
        } else {
            Err(Error::RemoteRead(message))
        }
    }
}

impl DocumentStore for FirestoreStore {
    async fn add_document(&self, collection: &str, record: Document) -> Result<String> {
        let response = self
            .request(Method::POST, collection)
            .json(&json!({ "fields": encode_fields(&record) }))
            .send()
            .await?;
        let document = Self::check(response, true)
            .await?
            .json::<FirestoreDocument>()
            .await?;
        Ok(document_id(&document.name))
    }

    async fn get_all_documents(&self, collection: &str) -> Result<Vec<(String, Document)>> {
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut request = self
                .request(Method::GET, collection)
                .query(&[("pageSize", LIST_PAGE_SIZE.to_string())]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token)]);
            }
            let page = Self::check(request.send().await?, false)
                .await?
                .json::<ListResponse>()
                .await?;
            documents.extend(
                page.documents
                    .into_iter()
                    .map(|document| (document_id(&document.name), decode_fields(&document.fields))),
            );
            match page.next_page_token.filter(|token| !token.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }
        Ok(documents)
    }

    async fn update_document(&self, collection: &str, id: &str, partial: Document) -> Result<()> {
        let mask = partial
            .keys()
            .map(|field| ("updateMask.fieldPaths", field.as_str()))
            .collect::<Vec<_>>();
        let response = self
            .request(
                Method::PATCH,
                &format!("{collection}/{}", urlencoding::encode(id)),
            )
            .query(&mask)
            .query(&[("currentDocument.exists", "true")])
            .json(&json!({ "fields": encode_fields(&partial) }))
            .send()
            .await?;
        Self::check(response, true).await?;
        Ok(())
    }

    async fn delete_document(&self, collection: &str, id: &str) -> Result<()> {
        let response = self
            .request(
                Method::DELETE,
                &format!("{collection}/{}", urlencoding::encode(id)),
            )
            .send()
            .await?;
        Self::check(response, true).await?;
        Ok(())
    }
}

fn document_id(name: &str) -> String {
    name.rsplit('/').next().unwrap_or(name).to_string()
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
}

fn api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(message) = payload.error.and_then(|error| error.message) {
            return format!("{} ({})", message.trim(), status.as_u16());
        }
    }
    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{trimmed} ({})", status.as_u16())
    }
}

fn encode_fields(record: &Document) -> Map<String, Value> {
    record
        .iter()
        .map(|(key, value)| (key.clone(), encode_value(value)))
        .collect()
}

fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(flag) => json!({ "booleanValue": flag }),
        Value::Number(number) => number.as_i64().map_or_else(
            || json!({ "doubleValue": number.as_f64().unwrap_or_default() }),
            |integer| json!({ "integerValue": integer.to_string() }),
        ),
        Value::String(text) => json!({ "stringValue": text }),
        Value::Array(items) => {
            json!({ "arrayValue": { "values": items.iter().map(encode_value).collect::<Vec<_>>() } })
        }
        Value::Object(fields) => json!({ "mapValue": { "fields": encode_fields(fields) } }),
    }
}

fn decode_fields(fields: &Map<String, Value>) -> Document {
    fields
        .iter()
        .map(|(key, value)| (key.clone(), decode_value(value)))
        .collect()
}

fn decode_value(value: &Value) -> Value {
    let Some((kind, inner)) = value.as_object().and_then(|object| object.iter().next()) else {
        return Value::Null;
    };
    match kind.as_str() {
        "booleanValue" => inner.as_bool().map_or(Value::Null, Value::Bool),
        "integerValue" => inner
            .as_str()
            .and_then(|raw| raw.parse::<i64>().ok())
            .or_else(|| inner.as_i64())
            .map_or(Value::Null, Value::from),
        "doubleValue" => inner.as_f64().map_or(Value::Null, Value::from),
        "stringValue" => inner.as_str().map_or(Value::Null, |text| Value::String(text.to_string())),
        // Stored as a timestamp by older clients; notes use Unix ms.
        "timestampValue" => inner
            .as_str()
            .and_then(|raw| chrono::DateTime::parse_from_rfc3339(raw).ok())
            .map_or(Value::Null, |timestamp| Value::from(timestamp.timestamp_millis())),
        "arrayValue" => Value::Array(
            inner
                .get("values")
                .and_then(Value::as_array)
                .map(|values| values.iter().map(decode_value).collect())
                .unwrap_or_default(),
        ),
        "mapValue" => Value::Object(
            inner
                .get("fields")
                .and_then(Value::as_object)
                .map(decode_fields)
                .unwrap_or_default(),
        ),
        _ => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Note;

    #[test]
    fn note_record_survives_typed_value_encoding() {
        let note = Note::new("Title", "<p>Body</p>")
            .with_category("work")
            .pinned(true)
            .at(1_700_000_000_123);
        let record = note.to_record();

        let decoded = decode_fields(&encode_fields(&record));
        assert_eq!(decoded, record);
        assert_eq!(Note::from_record("x", &decoded), note.with_id("x"));
    }

    #[test]
    fn integer_values_are_sent_as_strings() {
        let encoded = encode_value(&Value::from(42));
        assert_eq!(encoded, json!({ "integerValue": "42" }));
    }

    #[test]
    fn legacy_timestamp_values_decode_to_millis() {
        let decoded = decode_value(&json!({ "timestampValue": "2024-01-02T03:04:05.678Z" }));
        assert_eq!(decoded, Value::from(1_704_164_645_678_i64));
    }

    #[test]
    fn unknown_value_kinds_decode_to_null() {
        assert_eq!(decode_value(&json!({ "geoPointValue": {} })), Value::Null);
        assert_eq!(decode_value(&json!("bare")), Value::Null);
    }

    #[test]
    fn document_id_is_last_path_segment() {
        assert_eq!(
            document_id("projects/p/databases/(default)/documents/Notes/abc123"),
            "abc123"
        );
    }

    #[test]
    fn api_error_prefers_structured_message() {
        let body = r#"{"error":{"code":403,"message":"Permission denied","status":"PERMISSION_DENIED"}}"#;
        assert_eq!(
            api_error(StatusCode::FORBIDDEN, body),
            "Permission denied (403)"
        );
        assert_eq!(api_error(StatusCode::BAD_GATEWAY, ""), "HTTP 502");
    }
}

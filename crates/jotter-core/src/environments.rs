//! Saved environment profiles, most-recently-used first.

use crate::error::{Error, Result};
use crate::models::{Delimiter, EnvironmentProfile};
use crate::storage::LocalStore;

/// Local storage key holding the saved profiles.
pub const ENVIRONMENTS_KEY: &str = "envVariables";

/// Ordered list of environment profiles, de-duplicated by API key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentStore {
    profiles: Vec<EnvironmentProfile>,
}

impl EnvironmentStore {
    /// Load saved profiles. A missing key is an empty store; entries without
    /// an API key are dropped, as are later duplicates of an earlier key.
    pub async fn load(store: &impl LocalStore) -> Result<Self> {
        let Some(raw) = store.get(ENVIRONMENTS_KEY).await? else {
            return Ok(Self::default());
        };
        let texts: Vec<String> = serde_json::from_str(&raw)
            .map_err(|error| Error::Storage(format!("invalid saved environments: {error}")))?;

        let mut loaded = Self::default();
        for text in texts {
            let profile = EnvironmentProfile::parse(&text, Delimiter::Comma);
            let Some(key) = profile.identity() else {
                tracing::warn!("Skipping saved environment without APIKEY");
                continue;
            };
            if loaded.find(key).is_none() {
                loaded.profiles.push(profile);
            }
        }
        Ok(loaded)
    }

    pub async fn save(&self, store: &impl LocalStore) -> Result<()> {
        let texts = self
            .profiles
            .iter()
            .map(EnvironmentProfile::to_text)
            .collect::<Vec<_>>();
        store
            .set(ENVIRONMENTS_KEY, &serde_json::to_string(&texts)?)
            .await
    }

    pub fn list(&self) -> &[EnvironmentProfile] {
        &self.profiles
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Most recently used profile.
    pub fn current(&self) -> Option<&EnvironmentProfile> {
        self.profiles.first()
    }

    pub fn find(&self, api_key: &str) -> Option<&EnvironmentProfile> {
        self.profiles
            .iter()
            .find(|profile| profile.identity() == Some(api_key))
    }

    /// Place `profile` at the front, replacing any entry with the same API key.
    pub fn upsert(&mut self, profile: EnvironmentProfile) -> Result<()> {
        let Some(key) = profile.identity().map(ToString::to_string) else {
            return Err(Error::Configuration("APIKEY".to_string()));
        };
        self.profiles
            .retain(|existing| existing.identity() != Some(key.as_str()));
        self.profiles.insert(0, profile);
        Ok(())
    }

    /// Remove the profile with `api_key`; returns whether one was removed.
    pub fn remove(&mut self, api_key: &str) -> bool {
        let before = self.profiles.len();
        self.profiles
            .retain(|profile| profile.identity() != Some(api_key));
        let removed = self.profiles.len() < before;
        if removed {
            tracing::debug!(api_key, "environment removed");
        } else {
            tracing::warn!(api_key, "environment not found");
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryLocalStore;

    fn profile(key: &str, project: &str) -> EnvironmentProfile {
        EnvironmentProfile::parse(
            &format!(
                "APIKEY: {key}, AUTHDOMAIN: {project}.firebaseapp.com, PROJECTID: {project}, \
                 STORAGEBUCKET: {project}.appspot.com, MESSAGINGSENDERID: 1, APPID: app-{project}"
            ),
            Delimiter::Comma,
        )
    }

    fn keys(store: &EnvironmentStore) -> Vec<&str> {
        store.list().iter().filter_map(EnvironmentProfile::identity).collect()
    }

    #[test]
    fn upsert_moves_existing_profile_to_front_without_duplicates() {
        let mut store = EnvironmentStore::default();
        store.upsert(profile("a", "one")).unwrap();
        store.upsert(profile("b", "two")).unwrap();
        store.upsert(profile("a", "one-renamed")).unwrap();
        store.upsert(profile("a", "one-renamed")).unwrap();

        assert_eq!(keys(&store), vec!["a", "b"]);
        assert_eq!(
            store.current().unwrap().project_id.as_deref(),
            Some("one-renamed")
        );
    }

    #[test]
    fn upsert_rejects_profile_without_identity() {
        let mut store = EnvironmentStore::default();
        let error = store.upsert(EnvironmentProfile::default()).unwrap_err();
        assert!(matches!(error, Error::Configuration(_)));
        assert!(store.is_empty());
    }

    #[test]
    fn remove_reports_whether_anything_changed() {
        let mut store = EnvironmentStore::default();
        store.upsert(profile("a", "one")).unwrap();

        assert!(!store.remove("missing"));
        assert!(store.remove("a"));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn save_and_load_preserve_order() {
        let local = MemoryLocalStore::new();
        let mut store = EnvironmentStore::default();
        store.upsert(profile("a", "one")).unwrap();
        store.upsert(profile("b", "two")).unwrap();
        store.save(&local).await.unwrap();

        let loaded = EnvironmentStore::load(&local).await.unwrap();
        assert_eq!(loaded, store);
        assert_eq!(keys(&loaded), vec!["b", "a"]);
    }

    #[tokio::test]
    async fn values_with_commas_survive_save_and_load() {
        let local = MemoryLocalStore::new();
        let mut secured = profile("a", "one");
        secured.cloud_api_secret = Some("s3cr,et,,x".into());
        secured.upload_preset = Some("preset, with spaces".into());
        let mut store = EnvironmentStore::default();
        store.upsert(secured).unwrap();
        store.save(&local).await.unwrap();

        let loaded = EnvironmentStore::load(&local).await.unwrap();
        let current = loaded.current().unwrap();
        assert_eq!(current.cloud_api_secret.as_deref(), Some("s3cr,et,,x"));
        assert_eq!(current.upload_preset.as_deref(), Some("preset, with spaces"));
        assert_eq!(loaded, store);
    }

    #[tokio::test]
    async fn load_drops_duplicates_and_keyless_entries() {
        let local = MemoryLocalStore::new();
        local
            .set(
                ENVIRONMENTS_KEY,
                r#"["APIKEY: \"a\", PROJECTID: \"first\"", "PROJECTID: \"orphan\"", "apikey: 'a', PROJECTID: \"second\""]"#,
            )
            .await
            .unwrap();

        let loaded = EnvironmentStore::load(&local).await.unwrap();
        assert_eq!(keys(&loaded), vec!["a"]);
        assert_eq!(loaded.current().unwrap().project_id.as_deref(), Some("first"));
    }
}

//! # Storage Flows
//!
//! Stores declared through one `StoreContext` over a shared backend, as two
//! contexts of the same extension would see them.

#[cfg(test)]
mod tests {
    use crate::integration::within;
    use cb_02_storage::{
        AreaName, DataChange, InMemoryStorage, StorageBackend, StoreContext, StoreError,
    };
    use serde::{Deserialize, Serialize};
    use serde_json::json;
    use shared_crypto::{is_hex, EncryptionConfig};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::mpsc;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct SessionState {
        count: i64,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Credentials {
        api_token: Option<String>,
        user_name: String,
    }

    fn no_credentials() -> Credentials {
        Credentials {
            api_token: None,
            user_name: "guest".to_string(),
        }
    }

    #[tokio::test]
    async fn test_session_count_observed_once() {
        let context = StoreContext::in_memory();
        let session = context
            .session_store("session", SessionState { count: 0 }, false)
            .unwrap();

        assert_eq!(session.get::<i64>("count").await.unwrap(), 0);

        let (tx, mut rx) = mpsc::unbounded_channel();
        let _observer = session
            .observe::<i64, _>("count", move |change| {
                let _ = tx.send(change);
            })
            .unwrap();

        session.set("count", Some(5)).await.unwrap();
        assert_eq!(session.get::<i64>("count").await.unwrap(), 5);

        let change = within(rx.recv()).await.unwrap();
        assert_eq!(
            change,
            DataChange {
                old_value: Some(0),
                new_value: Some(5)
            }
        );
        let extra = tokio::time::timeout(Duration::from_millis(100), rx.recv()).await;
        assert!(extra.is_err());
    }

    #[tokio::test]
    async fn test_second_context_sees_first_contexts_writes() {
        let storage = Arc::new(InMemoryStorage::new());
        let coordinator = StoreContext::new(storage.clone());
        let view = StoreContext::new(storage.clone());

        let writer = coordinator
            .local_store("session", SessionState { count: 0 }, false)
            .unwrap();
        let reader = view
            .local_store("session", SessionState { count: 0 }, false)
            .unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let _observer = reader
            .observe::<i64, _>("count", move |change| {
                let _ = tx.send(change);
            })
            .unwrap();

        writer.set("count", Some(3)).await.unwrap();

        // The writer's initialization is the first event the reader sees.
        let first = within(rx.recv()).await.unwrap();
        assert_eq!(first.new_value, Some(0));
        let second = within(rx.recv()).await.unwrap();
        assert_eq!(second.new_value, Some(3));

        assert_eq!(reader.get::<i64>("count").await.unwrap(), 3);
        // The reader's own initialization found the key and wrote nothing.
        assert_eq!(storage.stats().set_calls(), 2);
    }

    #[tokio::test]
    async fn test_encrypted_credentials_flow() {
        let storage = Arc::new(InMemoryStorage::new());
        let config = EncryptionConfig::with_secret("extension-secret");
        let context = StoreContext::from_config(storage.clone(), &config).unwrap();
        assert!(context.has_encryption());

        let credentials = context
            .local_store("credentials", no_credentials(), true)
            .unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let _observer = credentials
            .observe::<Option<String>, _>("apiToken", move |change| {
                let _ = tx.send(change);
            })
            .unwrap();

        credentials.initialize().await.unwrap();
        credentials
            .set("apiToken", Some("tok-123"))
            .await
            .unwrap();

        let raw = storage.snapshot(AreaName::Local);
        let stored = raw["apiToken"].as_str().unwrap();
        assert!(is_hex(stored));
        assert!(!stored.contains("tok-123"));

        let initialized = within(rx.recv()).await.unwrap();
        assert_eq!(initialized.new_value, Some(None));
        let updated = within(rx.recv()).await.unwrap();
        assert_eq!(
            updated,
            DataChange {
                old_value: Some(None),
                new_value: Some(Some("tok-123".to_string()))
            }
        );

        let all = credentials.get_all().await.unwrap();
        assert_eq!(all.api_token.as_deref(), Some("tok-123"));
        assert_eq!(all.user_name, "guest");
    }

    #[tokio::test]
    async fn test_different_secret_reads_ciphertext() {
        let storage = Arc::new(InMemoryStorage::new());
        let writer_ctx = StoreContext::from_config(
            storage.clone(),
            &EncryptionConfig::with_secret("first"),
        )
        .unwrap();
        let reader_ctx = StoreContext::from_config(
            storage.clone(),
            &EncryptionConfig::with_secret("second"),
        )
        .unwrap();

        let writer = writer_ctx
            .local_store("credentials", no_credentials(), true)
            .unwrap();
        writer.set("userName", Some("alice")).await.unwrap();

        let reader = reader_ctx
            .local_store("credentials", no_credentials(), true)
            .unwrap();
        let seen = reader.get::<String>("userName").await.unwrap();
        assert_ne!(seen, "alice");
        assert!(is_hex(&seen));
    }

    #[tokio::test]
    async fn test_initialize_twice_keeps_user_writes() {
        let storage = Arc::new(InMemoryStorage::new());
        let context = StoreContext::new(storage.clone());
        let session = context
            .local_store("session", SessionState { count: 0 }, false)
            .unwrap();

        session.initialize().await.unwrap();
        session.set("count", Some(11)).await.unwrap();
        session.initialize().await.unwrap();

        assert_eq!(session.get::<i64>("count").await.unwrap(), 11);
    }

    #[tokio::test]
    async fn test_managed_policy_is_read_only() {
        let storage = Arc::new(InMemoryStorage::new());
        storage.set_managed(
            [("userName".to_string(), json!("admin"))]
                .into_iter()
                .collect(),
        );
        let context = StoreContext::new(storage.clone());
        let policy = context
            .managed_store("policy", no_credentials(), false)
            .unwrap();

        let all = policy.get_all().await.unwrap();
        assert_eq!(all.user_name, "admin");
        assert_eq!(all.api_token, None);

        let result = policy.set("userName", Some("me")).await;
        assert!(matches!(result, Err(StoreError::Area(_))));
        assert_eq!(
            storage.get(AreaName::Managed, &["userName"]).await.unwrap()["userName"],
            json!("admin")
        );
    }

    #[tokio::test]
    async fn test_quota_error_surfaces_to_caller() {
        let storage = Arc::new(InMemoryStorage::new().with_quota(AreaName::Sync, 64));
        let context = StoreContext::new(storage.clone());
        let store = context
            .sync_store("session", SessionState { count: 0 }, false)
            .unwrap();
        store.initialize().await.unwrap();

        let empty = Credentials {
            api_token: None,
            user_name: String::new(),
        };
        let notes = context.sync_store("notes", empty, false).unwrap();
        let long = "x".repeat(128);
        let result = notes.set("userName", Some(long)).await;
        assert!(matches!(result, Err(StoreError::Area(_))));
        assert_eq!(store.get::<i64>("count").await.unwrap(), 0);
    }
}

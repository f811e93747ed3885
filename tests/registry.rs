use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};

use cloudpush::models::{Item, ItemEntry};
use cloudpush::storage::{
    Agent, AgentRegistry, BatchUploader, DriverContext, DriverFactory, Entry, RemoteStore,
    Service, Uploader,
};
use cloudpush::{PushError, Result};

/// Records every batch it receives as (dir, [(path, content)])
#[derive(Clone, Default)]
struct RecordingBatch {
    batches: Arc<Mutex<Vec<(String, Vec<(String, Vec<u8>)>)>>>,
}

#[async_trait]
impl RemoteStore for RecordingBatch {
    async fn list(&self, _path: &str) -> Result<Vec<Entry>> {
        Ok(Vec::new())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        Err(PushError::Unsupported(path.to_string()))
    }
}

#[async_trait]
impl BatchUploader for RecordingBatch {
    async fn push_all(&self, items: Vec<Item>, dir: &str) -> Result<Option<String>> {
        let mut batch = Vec::new();
        for mut item in items {
            let data = item.read_all()?;
            batch.push((item.path().to_string(), data));
        }
        let mut batches = self.batches.lock();
        batches.push((dir.to_string(), batch));
        Ok(Some(format!("rev{}", batches.len())))
    }
}

struct RecordingFactory(RecordingBatch);

impl DriverFactory for RecordingFactory {
    fn service(&self) -> Service {
        Service::Github
    }

    fn create_uploader(&self, _token: &str, _options: &Value, _ctx: &DriverContext) -> Result<Uploader> {
        Ok(Uploader::Batch(Box::new(self.0.clone())))
    }
}

fn write_source(dir: &std::path::Path, name: &str, data: &[u8]) -> String {
    let path = dir.join(name);
    std::fs::write(&path, data).unwrap();
    path.to_string_lossy().to_string()
}

#[tokio::test]
async fn push_to_local_folder() {
    let sources = tempfile::tempdir().unwrap();
    let target = tempfile::tempdir().unwrap();
    let a = write_source(sources.path(), "a.txt", b"This is a test");
    let b = write_source(sources.path(), "b.bin", &[0u8, 1, 2, 255]);

    let registry = cloudpush::registry_with_drivers(DriverContext::default()).await;
    let agent = registry
        .create(
            Service::Local,
            "",
            json!({ "root": target.path().to_string_lossy(), "dir": "/backup" }),
        )
        .await
        .unwrap();
    assert_eq!(agent.dir(), "/backup");
    assert!(!registry.is_empty().await);

    let outcomes = registry
        .push(&[
            ItemEntry::from(a.as_str()),
            ItemEntry::Mapped { source: b, path: "nested/c.bin".to_string() },
        ])
        .await
        .unwrap();
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].items, 2);
    assert_eq!(outcomes[0].revision, None);

    let base = target.path().join("backup");
    assert_eq!(std::fs::read(base.join("a.txt")).unwrap(), b"This is a test");
    assert_eq!(std::fs::read(base.join("nested/c.bin")).unwrap(), vec![0u8, 1, 2, 255]);

    let files = agent.files(None).await.unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].name, "a.txt");
    assert_eq!(files[0].size, Some(14));
    let folders = agent.folders(None).await.unwrap();
    assert_eq!(folders[0].name, "nested");

    agent.delete("a.txt").await.unwrap();
    assert!(!base.join("a.txt").exists());
    assert!(matches!(agent.delete("nested").await, Err(PushError::Unsupported(_))));
}

#[tokio::test]
async fn changing_directory_redirects_pushes() {
    let sources = tempfile::tempdir().unwrap();
    let target = tempfile::tempdir().unwrap();
    let a = write_source(sources.path(), "a.txt", b"first");

    let registry = cloudpush::registry_with_drivers(DriverContext::default()).await;
    let agent = registry
        .create(Service::Local, "", json!({ "root": target.path().to_string_lossy() }))
        .await
        .unwrap();
    assert_eq!(agent.dir(), "/");

    agent.set_dir("archive\\2024/./q1/../q2/");
    assert_eq!(agent.dir(), "/archive/2024/q2");
    agent.push(&[ItemEntry::from(a.as_str())]).await.unwrap();
    assert_eq!(
        std::fs::read(target.path().join("archive/2024/q2/a.txt")).unwrap(),
        b"first"
    );
    assert!(!target.path().join("a.txt").exists());

    let files = agent.files(None).await.unwrap();
    assert_eq!(files[0].path, "/archive/2024/q2/a.txt");
}

#[tokio::test]
async fn batch_service_gets_one_call_per_push() {
    let recorder = RecordingBatch::default();
    let registry = AgentRegistry::new(DriverContext::default());
    registry.register_factory(Box::new(RecordingFactory(recorder.clone()))).await;
    registry
        .create(Service::Github, "token", json!({ "dir": "docs" }))
        .await
        .unwrap();

    let outcome = registry.agents().await[0]
        .push_items(vec![
            Item::from_bytes("one.txt", b"1".to_vec()).unwrap(),
            Item::from_bytes("two.txt", b"22".to_vec()).unwrap(),
        ])
        .await
        .unwrap();
    assert_eq!(outcome.items, 2);
    assert_eq!(outcome.revision.as_deref(), Some("rev1"));

    let batches = recorder.batches.lock().clone();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].0, "/docs");
    assert_eq!(
        batches[0].1,
        vec![("one.txt".to_string(), b"1".to_vec()), ("two.txt".to_string(), b"22".to_vec())]
    );
}

#[tokio::test]
async fn single_item_on_batch_service_falls_back_to_batch() {
    let recorder = RecordingBatch::default();
    let agent = Agent::new(Service::Github, "/", Uploader::Batch(Box::new(recorder.clone())));

    let outcome = agent
        .push_item(Item::from_bytes("solo.txt", b"solo".to_vec()).unwrap())
        .await
        .unwrap();
    assert_eq!(outcome.items, 1);
    assert_eq!(outcome.revision.as_deref(), Some("rev1"));
    assert_eq!(recorder.batches.lock()[0].1.len(), 1);
}

#[tokio::test]
async fn registry_membership() {
    let target = tempfile::tempdir().unwrap();
    let options = json!({ "root": target.path().to_string_lossy() });
    let registry = cloudpush::registry_with_drivers(DriverContext::default()).await;

    let first = registry.create(Service::Local, "", options.clone()).await.unwrap();
    let second = registry.create(Service::Local, "", options.clone()).await.unwrap();
    assert_eq!(registry.len().await, 2);
    assert_eq!(registry.summary().await, "  # 0\tLocal Folder\n  # 1\tLocal Folder");

    registry.add(first.clone()).await;
    assert_eq!(registry.len().await, 2);

    assert!(registry.remove(first.id()).await);
    assert!(!registry.remove(first.id()).await);
    assert_eq!(registry.agents().await[0].id(), second.id());

    registry.remove_service(Some(Service::Github)).await;
    assert_eq!(registry.len().await, 1);
    registry.remove_service(Some(Service::Local)).await;
    assert!(registry.is_empty().await);

    registry.create(Service::Local, "", options).await.unwrap();
    registry.reset().await;
    assert!(registry.is_empty().await);
}

#[tokio::test]
async fn empty_registry_pushes_nothing() {
    let registry = cloudpush::registry_with_drivers(DriverContext::default()).await;
    let outcomes = registry.push(&[ItemEntry::from("/does/not/matter")]).await.unwrap();
    assert!(outcomes.is_empty());
}

#[tokio::test]
async fn unknown_service_and_bad_options() {
    let registry = AgentRegistry::new(DriverContext::default());
    assert!(matches!(
        registry.create(Service::Local, "", json!({ "root": "/tmp" })).await,
        Err(PushError::InvalidService(_))
    ));

    let registry = cloudpush::registry_with_drivers(DriverContext::default()).await;
    assert!(matches!(
        registry.create(Service::Github, "token", json!({})).await,
        Err(PushError::Config(_))
    ));
    assert!(matches!(
        registry.create(Service::Dropbox, "", json!({})).await,
        Err(PushError::Config(_))
    ));
    assert!(registry.is_empty().await);
}

#[tokio::test]
async fn dropbox_agents_push_per_item() {
    let registry = cloudpush::registry_with_drivers(DriverContext::default()).await;
    let agent = registry
        .create(Service::Dropbox, "token", json!({ "dir": "/Apps/sync", "chunk_size": 1024 }))
        .await
        .unwrap();
    assert_eq!(agent.name(), "Dropbox");
    assert_eq!(agent.dir(), "/Apps/sync");
    assert!(format!("{:?}", agent).contains("batch: false"));
}

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use conduct::Store;
use conduct::domain::{BehaviorRules, DeletePolicy};
use std::path::PathBuf;

pub struct TestDb {
    pub store: Store,
    path: PathBuf,
}

impl Drop for TestDb {
    fn drop(&mut self) {
        std::fs::remove_file(&self.path).ok();
    }
}

pub async fn spawn_store_with(on_delete: DeletePolicy, rules: BehaviorRules) -> TestDb {
    let path = std::env::temp_dir().join(format!("conduct-test-{}.db", uuid::Uuid::new_v4()));

    let store = Store::with_pool_options(&format!("sqlite:{}", path.display()), 2, 1)
        .await
        .expect("failed to open test store")
        .with_policies(on_delete, rules);

    TestDb { store, path }
}

pub async fn spawn_store() -> TestDb {
    spawn_store_with(DeletePolicy::default(), BehaviorRules::default()).await
}

pub fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap()
}

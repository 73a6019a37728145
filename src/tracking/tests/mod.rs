mod autolog;
mod client;

use crate::tracking::{FileStore, TrackingClient};

/// 以临时目录为后端的客户端；返回的 TempDir 需在测试期间保持存活
fn temp_client() -> (tempfile::TempDir, TrackingClient) {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path().join("mlruns")).unwrap();
    (dir, TrackingClient::new(Box::new(store)))
}

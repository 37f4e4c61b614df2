//! Process-wide manager handle.
//!
//! Built once by the process entry point and passed by reference to every
//! consumer, instead of a mutable global. Tests swap in a fresh manager
//! with [`SessionManagerHandle::reset_for_test`] to re-initialize against a
//! clean backing store without touching shared process state.

use std::sync::Arc;

use parking_lot::RwLock;

use berth_store::SessionGateway;

use crate::manager::SessionManager;

/// Shared, resettable holder for the one [`SessionManager`] per process.
pub struct SessionManagerHandle {
    inner: RwLock<Arc<SessionManager>>,
}

impl SessionManagerHandle {
    /// Construct the handle with a manager over the given gateway.
    pub fn new(gateway: Arc<dyn SessionGateway>) -> Self {
        Self {
            inner: RwLock::new(Arc::new(SessionManager::new(gateway))),
        }
    }

    /// The current manager. Cheap to call; clones an `Arc`.
    pub fn manager(&self) -> Arc<SessionManager> {
        Arc::clone(&self.inner.read())
    }

    /// Replace the manager with a fresh one over `gateway`.
    ///
    /// Callers holding an `Arc` from [`Self::manager`] keep the old
    /// instance until they re-fetch.
    pub fn reset_for_test(&self, gateway: Arc<dyn SessionGateway>) {
        *self.inner.write() = Arc::new(SessionManager::new(gateway));
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(unused_results)]
mod tests {
    use super::*;
    use berth_store::SqliteGateway;
    use berth_store::connection::ConnectionConfig;

    fn open_gateway(dir: &tempfile::TempDir, name: &str) -> Arc<SqliteGateway> {
        let path = dir.path().join(name);
        Arc::new(
            SqliteGateway::open_file(path.to_str().unwrap(), &ConnectionConfig::default()).unwrap(),
        )
    }

    #[tokio::test]
    async fn manager_is_shared_until_reset() {
        let dir = tempfile::tempdir().unwrap();
        let handle = SessionManagerHandle::new(open_gateway(&dir, "a.db"));

        let manager = handle.manager();
        let session = manager.create_session("o_1", 60).await.unwrap();

        // Same backing store through a second fetch of the manager
        let again = handle.manager();
        let found = again.get_session(&session.session_id, "o_1").await;
        assert!(found.is_ok());
    }

    #[tokio::test]
    async fn reset_for_test_swaps_backing_store() {
        let dir = tempfile::tempdir().unwrap();
        let handle = SessionManagerHandle::new(open_gateway(&dir, "a.db"));

        let session = handle.manager().create_session("o_1", 60).await.unwrap();

        handle.reset_for_test(open_gateway(&dir, "b.db"));

        // The old session does not exist in the fresh store
        let result = handle
            .manager()
            .get_session(&session.session_id, "o_1")
            .await;
        assert!(result.is_err());

        // And the fresh store works on its own
        let fresh = handle.manager().create_session("o_2", 30).await.unwrap();
        assert_eq!(fresh.organization_id, "o_2");
    }
}

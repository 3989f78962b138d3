use parking_lot::Mutex;
use repu_core::Session;
use repu_error::{ErrorMetadataBuilder, Result};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::storage::{MemoryStorage, Storage};

pub const TOKEN_KEY: &str = "repu_token";
pub const ROLE_KEY: &str = "repu_role";

/// 会话存储
///
/// 启动时从持久化存储读取一次，之后内存中的值为准，存储只做写透镜像。
/// 所有写入都经过 `set_session` / `clear_session`，token 与 role 总是一起替换。
pub struct SessionStore {
    state: watch::Sender<Session>,
    storage: Arc<dyn Storage>,
    /// 串行化写入者，读者只经过 watch
    writer: Mutex<()>,
}

impl SessionStore {
    /// 从存储恢复会话
    pub fn load(storage: Arc<dyn Storage>) -> Result<Self> {
        let token = storage.get_item(TOKEN_KEY)?.unwrap_or_default();
        let role = storage.get_item(ROLE_KEY)?.unwrap_or_default();
        let session = Session::new(&token, &role);

        // 只有一半的记录视为未登录，并清掉残留项
        if !session.is_authenticated() && (!token.is_empty() || !role.is_empty()) {
            warn!("stored session incomplete, starting logged out");
            persist(storage.as_ref(), &session)?;
        }

        info!(
            authenticated = session.is_authenticated(),
            role = %session.role(),
            "session restored"
        );

        Ok(Self {
            state: watch::Sender::new(session),
            storage,
            writer: Mutex::new(()),
        })
    }

    /// 仅在内存中保存的会话
    pub fn in_memory() -> Self {
        Self {
            state: watch::Sender::new(Session::default()),
            storage: Arc::new(MemoryStorage::new()),
            writer: Mutex::new(()),
        }
    }

    /// 同时替换 token 和 role 并写入存储；任一为空即清除会话
    pub fn set_session(&self, token: &str, role: &str) -> Result<()> {
        self.replace(Session::new(token, role))
    }

    pub fn clear_session(&self) -> Result<()> {
        self.replace(Session::default())
    }

    /// 当前会话快照
    pub fn current_session(&self) -> Session {
        self.state.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    /// 出站请求使用的 token
    pub fn token(&self) -> Option<String> {
        let session = self.state.borrow();
        session
            .is_authenticated()
            .then(|| session.token().to_string())
    }

    /// 订阅会话变化，值未改变时不会通知
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    fn replace(&self, next: Session) -> Result<()> {
        // 写入者按顺序替换内存并落盘；落盘时不持有 watch 的锁
        let _writer = self.writer.lock();
        self.state.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next.clone();
            true
        });
        debug!(authenticated = next.is_authenticated(), "session replaced");

        let persisted = persist(self.storage.as_ref(), &next);
        if let Err(e) = &persisted {
            e.log(
                &ErrorMetadataBuilder::new("repu-auth")
                    .operation("persist_session")
                    .role(next.role())
                    .context("storage_keys", &format!("{TOKEN_KEY},{ROLE_KEY}"))
                    .build(e),
            );
        }
        persisted
    }
}

fn persist(storage: &dyn Storage, session: &Session) -> Result<()> {
    let token = write_entry(storage, TOKEN_KEY, session.token());
    let role = write_entry(storage, ROLE_KEY, session.role());
    token.and(role)
}

fn write_entry(storage: &dyn Storage, key: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        storage.remove_item(key)
    } else {
        storage.set_item(key, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use repu_error::RepuError;

    /// 写入总是失败的存储
    struct BrokenStorage;

    impl Storage for BrokenStorage {
        fn get_item(&self, _key: &str) -> Result<Option<String>> {
            Ok(None)
        }

        fn set_item(&self, key: &str, _value: &str) -> Result<()> {
            Err(RepuError::Storage {
                operation: format!("set {key}"),
                message: "read-only".to_string(),
            })
        }

        fn remove_item(&self, _key: &str) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_set_session_writes_through() {
        let storage = Arc::new(MemoryStorage::new());
        let store = SessionStore::load(storage.clone()).unwrap();
        assert!(!store.is_authenticated());

        store.set_session("abc", "PM").unwrap();
        assert!(store.is_authenticated());
        assert_eq!(store.token().as_deref(), Some("abc"));
        assert_eq!(storage.get_item(TOKEN_KEY).unwrap().as_deref(), Some("abc"));
        assert_eq!(storage.get_item(ROLE_KEY).unwrap().as_deref(), Some("PM"));
    }

    #[test]
    fn test_half_session_clears_both() {
        let storage = Arc::new(MemoryStorage::new());
        let store = SessionStore::load(storage.clone()).unwrap();

        store.set_session("abc", "PM").unwrap();
        store.set_session("def", "").unwrap();

        assert_eq!(store.current_session(), Session::default());
        assert_eq!(store.token(), None);
        assert!(storage.is_empty());
    }

    #[test]
    fn test_clear_is_idempotent() {
        let storage = Arc::new(MemoryStorage::new());
        let store = SessionStore::load(storage.clone()).unwrap();
        store.set_session("abc", "OPS").unwrap();

        store.clear_session().unwrap();
        let once = store.current_session();
        store.clear_session().unwrap();

        assert_eq!(store.current_session(), once);
        assert!(!store.is_authenticated());
        assert!(storage.is_empty());
    }

    #[test]
    fn test_restore_from_storage() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set_item(TOKEN_KEY, "abc").unwrap();
        storage.set_item(ROLE_KEY, "MARKET").unwrap();

        let store = SessionStore::load(storage.clone()).unwrap();
        assert_eq!(store.current_session(), Session::new("abc", "MARKET"));

        // 启动后不再回读存储
        storage.remove_item(TOKEN_KEY).unwrap();
        assert!(store.is_authenticated());
    }

    #[test]
    fn test_restore_incomplete_session() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set_item(TOKEN_KEY, "abc").unwrap();

        let store = SessionStore::load(storage.clone()).unwrap();
        assert!(!store.is_authenticated());
        assert_eq!(storage.get_item(TOKEN_KEY).unwrap(), None);
    }

    #[test]
    fn test_memory_stays_authoritative_when_storage_fails() {
        let store = SessionStore::load(Arc::new(BrokenStorage)).unwrap();

        let result = store.set_session("abc", "PM");
        assert!(matches!(result, Err(RepuError::Storage { .. })));
        assert_eq!(store.current_session(), Session::new("abc", "PM"));
    }

    /// 写入时回调，用于观察落盘期间的内存状态
    struct ObservedStorage {
        inner: MemoryStorage,
        on_write: Box<dyn Fn() + Send + Sync>,
    }

    impl Storage for ObservedStorage {
        fn get_item(&self, key: &str) -> Result<Option<String>> {
            self.inner.get_item(key)
        }

        fn set_item(&self, key: &str, value: &str) -> Result<()> {
            (self.on_write)();
            self.inner.set_item(key, value)
        }

        fn remove_item(&self, key: &str) -> Result<()> {
            (self.on_write)();
            self.inner.remove_item(key)
        }
    }

    #[test]
    fn test_readers_not_blocked_during_persist() {
        let slot: Arc<parking_lot::Mutex<Option<Arc<SessionStore>>>> = Arc::default();
        let seen: Arc<parking_lot::Mutex<Vec<Session>>> = Arc::default();

        let storage = {
            let slot = slot.clone();
            let seen = seen.clone();
            ObservedStorage {
                inner: MemoryStorage::new(),
                on_write: Box::new(move || {
                    if let Some(store) = slot.lock().as_ref() {
                        // 若 watch 锁被持有，这里会死锁
                        seen.lock().push(store.current_session());
                    }
                }),
            }
        };
        let store = Arc::new(SessionStore::load(Arc::new(storage)).unwrap());
        *slot.lock() = Some(store.clone());

        store.set_session("abc", "PM").unwrap();
        *slot.lock() = None;

        let seen = seen.lock();
        assert_eq!(seen.len(), 2);
        assert!(seen.iter().all(|s| *s == Session::new("abc", "PM")));
    }

    #[tokio::test]
    async fn test_subscribers_see_whole_session() {
        let store = SessionStore::in_memory();
        let mut rx = store.subscribe();

        store.set_session("abc", "PM").unwrap();
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), Session::new("abc", "PM"));

        store.clear_session().unwrap();
        rx.changed().await.unwrap();
        assert!(!rx.borrow_and_update().is_authenticated());

        // 重复清除不产生通知
        store.clear_session().unwrap();
        assert!(!rx.has_changed().unwrap());
    }
}

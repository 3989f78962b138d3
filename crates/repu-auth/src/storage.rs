use parking_lot::RwLock;
use repu_error::{RepuError, Result};
use std::collections::HashMap;
use std::path::Path;

/// 本地持久化键值存储（对应浏览器 localStorage）
pub trait Storage: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> Result<()>;
    fn remove_item(&self, key: &str) -> Result<()>;
}

/// 内存存储，进程退出即丢失
#[derive(Default)]
pub struct MemoryStorage {
    items: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.read().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.items.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.items.write().remove(key);
        Ok(())
    }
}

/// 基于 sled 的磁盘存储，每次写入后 flush
#[derive(Clone)]
pub struct SledStorage {
    db: sled::Db,
}

impl SledStorage {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let db = sled::open(path).map_err(|e| RepuError::Storage {
            operation: format!("open {}", path.display()),
            message: e.to_string(),
        })?;
        Ok(Self { db })
    }
}

impl Storage for SledStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let Some(raw) = self.db.get(key)? else {
            return Ok(None);
        };
        String::from_utf8(raw.to_vec())
            .map(Some)
            .map_err(|e| RepuError::Storage {
                operation: format!("decode {key}"),
                message: e.to_string(),
            })
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.db.insert(key, value.as_bytes())?;
        self.db.flush()?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.db.remove(key)?;
        self.db.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage() {
        let storage = MemoryStorage::new();
        assert!(storage.is_empty());

        storage.set_item("repu_token", "abc").unwrap();
        assert_eq!(storage.get_item("repu_token").unwrap().as_deref(), Some("abc"));
        assert_eq!(storage.len(), 1);

        storage.remove_item("repu_token").unwrap();
        storage.remove_item("repu_token").unwrap();
        assert_eq!(storage.get_item("repu_token").unwrap(), None);
    }

    #[test]
    fn test_sled_storage_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state");

        {
            let storage = SledStorage::open(&path).unwrap();
            storage.set_item("repu_role", "OPS").unwrap();
        }

        let storage = SledStorage::open(&path).unwrap();
        assert_eq!(storage.get_item("repu_role").unwrap().as_deref(), Some("OPS"));
        storage.remove_item("repu_role").unwrap();
        assert_eq!(storage.get_item("repu_role").unwrap(), None);
    }
}

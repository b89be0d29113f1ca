//! 模型缓存
//!
//! 按模型名称缓存已加载的模型, 容量固定; 未命中且已满时淘汰最久未使用的模型后再加载。
//! 容量为 1 时即 "先清空, 再加载"。

use std::{collections::VecDeque, sync::Arc};

use log::info;

use crate::error::Error;

/// 模型缓存
#[derive(Debug)]
pub struct ModelCache<V> {
    capacity: usize,
    /// 队首为最久未使用
    entries: VecDeque<(String, Arc<V>)>,
}

impl<V> ModelCache<V> {
    pub fn new(capacity: usize) -> Result<Self, Error> {
        if capacity == 0 {
            return Err(Error::ZeroCacheCapacity);
        }
        Ok(Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// 获取模型, 未命中时通过 `load` 加载
    ///
    /// 加载失败时不会写入缓存
    pub fn get_or_load<F>(&mut self, key: &str, load: F) -> Result<Arc<V>, Error>
    where
        F: FnOnce() -> Result<V, Error>,
    {
        if let Some(index) = self.entries.iter().position(|(k, _)| k == key) {
            if let Some(entry) = self.entries.remove(index) {
                let value = entry.1.clone();
                self.entries.push_back(entry);
                info!("using cached model '{key}'");
                return Ok(value);
            }
        }

        // 先释放旧模型, 再加载新模型
        while self.entries.len() >= self.capacity {
            if let Some((evicted, _)) = self.entries.pop_front() {
                info!("evict cached model '{evicted}'");
            }
        }

        info!("loading model '{key}'");
        let value = Arc::new(load()?);
        self.entries.push_back((key.to_string(), value.clone()));
        info!("model '{key}' loaded and cached");
        Ok(value)
    }

    /// 清空缓存
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn test_zero_capacity() {
        assert!(matches!(
            ModelCache::<u32>::new(0),
            Err(Error::ZeroCacheCapacity)
        ));
    }

    #[test]
    fn test_hit_does_not_reload() -> anyhow::Result<()> {
        let mut cache = ModelCache::new(1)?;
        let loads = Cell::new(0);
        let load = || {
            loads.set(loads.get() + 1);
            Ok(42)
        };

        assert_eq!(*cache.get_or_load("a.gguf", load)?, 42);
        assert_eq!(*cache.get_or_load("a.gguf", load)?, 42);
        assert_eq!(loads.get(), 1);
        Ok(())
    }

    #[test]
    fn test_capacity_one_replaces() -> anyhow::Result<()> {
        let mut cache = ModelCache::new(1)?;
        cache.get_or_load("a.gguf", || Ok(1))?;
        cache.get_or_load("b.gguf", || Ok(2))?;

        assert_eq!(cache.len(), 1);
        assert!(!cache.contains("a.gguf"));
        assert!(cache.contains("b.gguf"));
        Ok(())
    }

    #[test]
    fn test_evicts_least_recently_used() -> anyhow::Result<()> {
        let mut cache = ModelCache::new(2)?;
        cache.get_or_load("a", || Ok(1))?;
        cache.get_or_load("b", || Ok(2))?;
        // a 变为最近使用
        cache.get_or_load("a", || Ok(10))?;
        cache.get_or_load("c", || Ok(3))?;

        assert!(cache.contains("a"));
        assert!(!cache.contains("b"));
        assert!(cache.contains("c"));
        Ok(())
    }

    #[test]
    fn test_failed_load_is_not_cached() -> anyhow::Result<()> {
        let mut cache: ModelCache<u32> = ModelCache::new(2)?;
        let result = cache.get_or_load("broken", || {
            Err(Error::FileNotFound("broken".to_string()))
        });

        assert!(result.is_err());
        assert!(!cache.contains("broken"));
        assert!(cache.is_empty());
        Ok(())
    }

    #[test]
    fn test_clear() -> anyhow::Result<()> {
        let mut cache = ModelCache::new(3)?;
        cache.get_or_load("a", || Ok(1))?;
        cache.get_or_load("b", || Ok(2))?;
        cache.clear();
        assert!(cache.is_empty());
        Ok(())
    }
}

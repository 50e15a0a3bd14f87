//! # Registry 模块
//!
//! 脚本来源与解析缓存。
//!
//! - [`ScriptSource`]：按名称取回脚本原文，存储方式由调用方决定
//! - [`MemorySource`]：内存中的脚本表
//! - [`ScriptCache`]：调用方持有的解析缓存，以脚本名为键
//!
//! 缓存只保存可用的 AST，不可用的脚本每次都会重新解析并报告错误。

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::error::{RuleError, RuleResult};
use crate::script::{Parser, Script};

/// 脚本来源
pub trait ScriptSource {
    /// 按名称读取脚本原文
    fn load(&self, name: &str) -> Option<String>;
}

/// 内存中的脚本表
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    scripts: HashMap<String, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_script(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.insert(name, text);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, text: impl Into<String>) {
        self.scripts.insert(name.into(), text.into());
    }
}

impl ScriptSource for MemorySource {
    fn load(&self, name: &str) -> Option<String> {
        self.scripts.get(name).cloned()
    }
}

/// 解析缓存
#[derive(Debug, Clone, Default)]
pub struct ScriptCache {
    entries: HashMap<String, Arc<Script>>,
}

impl ScriptCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 命中缓存时直接返回，否则从 `source` 读取并解析
    pub fn get_or_parse(
        &mut self,
        name: &str,
        source: &impl ScriptSource,
        parser: &Parser,
    ) -> RuleResult<Arc<Script>> {
        if let Some(script) = self.entries.get(name) {
            debug!(script = name, "脚本缓存命中");
            return Ok(Arc::clone(script));
        }

        let text = source.load(name).ok_or_else(|| RuleError::ScriptNotFound {
            name: name.to_string(),
        })?;

        let report = parser.parse(&text);
        let script = report.into_result().map_err(|err| RuleError::Unusable {
            name: name.to_string(),
            source: err,
        })?;

        debug!(script = name, "脚本已解析并缓存");
        let script = Arc::new(script);
        self.entries.insert(name.to_string(), Arc::clone(&script));
        Ok(script)
    }

    pub fn get(&self, name: &str) -> Option<Arc<Script>> {
        self.entries.get(name).cloned()
    }

    /// 移除单个脚本，返回是否存在
    pub fn invalidate(&mut self, name: &str) -> bool {
        self.entries.remove(name).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::error::ParseError;

    const SCRIPT: &str = "SCENE 手机 ON_INTENT 商品推荐 IF 品牌 REPLY \"有品牌\" ELSE REPLY \"无品牌\"";

    /// 记录读取次数的来源
    struct CountingSource {
        inner: MemorySource,
        loads: Cell<usize>,
    }

    impl ScriptSource for CountingSource {
        fn load(&self, name: &str) -> Option<String> {
            self.loads.set(self.loads.get() + 1);
            self.inner.load(name)
        }
    }

    #[test]
    fn test_cache_parses_once() {
        let source = CountingSource {
            inner: MemorySource::new().with_script("phone", SCRIPT),
            loads: Cell::new(0),
        };
        let parser = Parser::default();
        let mut cache = ScriptCache::new();

        let first = cache.get_or_parse("phone", &source, &parser).unwrap();
        let second = cache.get_or_parse("phone", &source, &parser).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(source.loads.get(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_invalidate_forces_reparse() {
        let mut source = MemorySource::new().with_script("phone", SCRIPT);
        let parser = Parser::default();
        let mut cache = ScriptCache::new();

        cache.get_or_parse("phone", &source, &parser).unwrap();
        source.insert(
            "phone",
            "SCENE 平板 ON_INTENT 商品推荐 IF 品牌 REPLY \"新\"",
        );

        // 未失效前仍是旧的 AST
        assert_eq!(cache.get("phone").unwrap().scene.name, "手机");

        assert!(cache.invalidate("phone"));
        assert!(!cache.invalidate("phone"));
        let script = cache.get_or_parse("phone", &source, &parser).unwrap();
        assert_eq!(script.scene.name, "平板");
    }

    #[test]
    fn test_missing_script() {
        let mut cache = ScriptCache::new();
        let result = cache.get_or_parse("nope", &MemorySource::new(), &Parser::default());
        assert!(matches!(result, Err(RuleError::ScriptNotFound { name }) if name == "nope"));
    }

    #[test]
    fn test_unusable_script_is_not_cached() {
        let source = MemorySource::new().with_script("broken", "SCENE 手机 ON_INTENT 商品推荐 IF 品牌");
        let mut cache = ScriptCache::new();

        let result = cache.get_or_parse("broken", &source, &Parser::default());
        assert!(matches!(
            result,
            Err(RuleError::Unusable {
                source: ParseError::UnexpectedEnd { .. },
                ..
            })
        ));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_clear() {
        let source = MemorySource::new().with_script("phone", SCRIPT);
        let mut cache = ScriptCache::new();
        cache.get_or_parse("phone", &source, &Parser::default()).unwrap();
        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.get("phone").is_none());
    }
}

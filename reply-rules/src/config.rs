//! # Config 模块
//!
//! 规则引擎的配置：意图白名单、兜底回复和脚本路由。
//!
//! 配置以 JSON 形式保存，例如：
//!
//! ```json
//! {
//!   "intents": ["商品推荐", "价格查询"],
//!   "fallback_reply": "抱歉，没有找到合适的结果",
//!   "routes": {
//!     "by_intent": { "商品推荐": "recommend.dsl" },
//!     "by_category": {},
//!     "default_script": "recommend.dsl"
//!   }
//! }
//! ```

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// 默认支持的意图
pub const DEFAULT_INTENTS: [&str; 4] = ["商品推荐", "价格查询", "功能对比", "库存查询"];

/// 默认兜底回复
pub const DEFAULT_FALLBACK_REPLY: &str = "抱歉，没有找到合适的结果";

/// 意图白名单
///
/// 一个封闭集合，`ON_INTENT` 后的标识符必须属于其中。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IntentWhitelist(BTreeSet<String>);

impl IntentWhitelist {
    /// 由意图列表构建，列表为空时报错
    pub fn new<I, S>(intents: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set: BTreeSet<String> = intents.into_iter().map(Into::into).collect();
        if set.is_empty() {
            return Err(ConfigError::EmptyWhitelist);
        }
        Ok(Self(set))
    }

    pub fn contains(&self, intent: &str) -> bool {
        self.0.contains(intent)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 以 `、` 连接的意图列表，用于错误信息
    pub fn describe(&self) -> String {
        self.iter().collect::<Vec<_>>().join("、")
    }
}

impl Default for IntentWhitelist {
    fn default() -> Self {
        Self(DEFAULT_INTENTS.iter().map(|s| s.to_string()).collect())
    }
}

/// 脚本路由
///
/// 选择顺序：意图映射 → 类别映射 → 默认脚本。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptRoutes {
    /// 意图名 -> 脚本名
    #[serde(default)]
    pub by_intent: HashMap<String, String>,
    /// 类别名 -> 脚本名
    #[serde(default)]
    pub by_category: HashMap<String, String>,
    /// 都不匹配时使用的脚本
    #[serde(default)]
    pub default_script: Option<String>,
}

impl ScriptRoutes {
    /// 为一次请求选择脚本名
    pub fn select(&self, intent: &str, category: &str) -> Option<&str> {
        self.by_intent
            .get(intent)
            .or_else(|| self.by_category.get(category))
            .or(self.default_script.as_ref())
            .map(String::as_str)
    }
}

fn default_fallback_reply() -> String {
    DEFAULT_FALLBACK_REPLY.to_string()
}

/// 规则引擎配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RulesConfig {
    /// 意图白名单
    #[serde(default)]
    pub intents: IntentWhitelist,
    /// 没有命中任何分支或脚本不可用时的回复
    #[serde(default = "default_fallback_reply")]
    pub fallback_reply: String,
    /// 脚本路由
    #[serde(default)]
    pub routes: ScriptRoutes,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            intents: IntentWhitelist::default(),
            fallback_reply: default_fallback_reply(),
            routes: ScriptRoutes::default(),
        }
    }
}

impl RulesConfig {
    /// 从 JSON 文本解析配置
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        if config.intents.is_empty() {
            return Err(ConfigError::EmptyWhitelist);
        }
        Ok(config)
    }

    /// 从 JSON 文件加载配置
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&text)
    }
}

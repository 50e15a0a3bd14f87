//! # Engine 模块
//!
//! 规则引擎：把路由、脚本缓存、解析与求值串成一次完整的应答。
//!
//! ```text
//! IntentRecord + Context
//!   │
//!   ├─ ScriptRoutes::select  → 脚本名
//!   ├─ ScriptCache           → Arc<Script>（必要时经 ScriptSource + Parser）
//!   ├─ evaluate              → Outcome
//!   └─ 无回复时使用 fallback_reply
//! ```
//!
//! 引擎持有缓存，但每次应答使用的上下文都由调用方提供，不会被保留。

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::{RulesConfig, ScriptRoutes};
use crate::context::{Context, IntentRecord};
use crate::error::{RuleError, RuleResult};
use crate::registry::{ScriptCache, ScriptSource};
use crate::runtime::evaluator::evaluate;
use crate::script::Parser;

/// 一次应答的结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    /// 脚本声明的场景；未能执行脚本时为记录中的类别
    pub scene: String,
    /// 脚本声明的意图；未能执行脚本时为记录中的意图
    pub intent: String,
    /// 使用的脚本名
    pub script: Option<String>,
    /// 最终回复（可能仍包含待替换的占位符）
    pub reply: String,
    /// 回复是否来自命中的分支
    pub matched: bool,
}

/// 规则引擎
pub struct RuleEngine<S: ScriptSource> {
    parser: Parser,
    routes: ScriptRoutes,
    fallback_reply: String,
    source: S,
    cache: ScriptCache,
}

impl<S: ScriptSource> RuleEngine<S> {
    /// 由配置和脚本来源创建引擎
    pub fn new(config: RulesConfig, source: S) -> Self {
        Self {
            parser: Parser::new(config.intents),
            routes: config.routes,
            fallback_reply: config.fallback_reply,
            source,
            cache: ScriptCache::new(),
        }
    }

    /// 从 JSON 配置文件创建引擎
    pub fn from_config_file(path: impl AsRef<Path>, source: S) -> RuleResult<Self> {
        let config = RulesConfig::load(path)?;
        Ok(Self::new(config, source))
    }

    pub fn parser(&self) -> &Parser {
        &self.parser
    }

    pub fn cache(&self) -> &ScriptCache {
        &self.cache
    }

    /// 清空解析缓存，脚本原文变化后调用
    pub fn reload(&mut self) {
        self.cache.clear();
    }

    /// 根据分类记录选择脚本并在 `context` 上求值
    pub fn respond(&mut self, record: &IntentRecord, context: &Context) -> RuleResult<Response> {
        let name = self
            .routes
            .select(&record.intent, &record.category)
            .ok_or_else(|| RuleError::NoRoute {
                intent: record.intent.clone(),
                category: record.category.clone(),
            })?
            .to_string();

        let script = self
            .cache
            .get_or_parse(&name, &self.source, &self.parser)?;
        let outcome = evaluate(&script, context)?;

        let matched = outcome.reply.is_some();
        if !matched {
            info!(script = %name, "没有分支命中，使用兜底回复");
        }

        Ok(Response {
            reply: outcome.reply.unwrap_or_else(|| self.fallback_reply.clone()),
            scene: outcome.scene,
            intent: outcome.intent,
            script: Some(name),
            matched,
        })
    }

    /// 同 [`respond`](Self::respond)，出错时返回兜底回复
    pub fn respond_or_fallback(&mut self, record: &IntentRecord, context: &Context) -> Response {
        match self.respond(record, context) {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, intent = %record.intent, "规则执行失败，使用兜底回复");
                let script = match &err {
                    RuleError::ScriptNotFound { name } | RuleError::Unusable { name, .. } => {
                        Some(name.clone())
                    }
                    _ => None,
                };
                Response {
                    scene: record.category.clone(),
                    intent: record.intent.clone(),
                    script,
                    reply: self.fallback_reply.clone(),
                    matched: false,
                }
            }
        }
    }

    /// 由分类记录构建上下文后应答
    pub fn respond_to_record(&mut self, record: &IntentRecord) -> Response {
        let context = Context::from_record(record);
        self.respond_or_fallback(record, &context)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::registry::MemorySource;

    const PHONE: &str = r#"
SCENE 手机
ON_INTENT 商品推荐
IF 预算 <= 5000 AND 品牌 == "小米" REPLY "A"
ELSE REPLY "B"
"#;

    const PRICE: &str = r#"
SCENE 手机
ON_INTENT 价格查询
IF 型号 REPLY "PRICE_QUERY_TEMPLATE: {型号}"
ELSE IF 品牌 REPLY "请告诉我具体型号"
"#;

    fn engine() -> RuleEngine<MemorySource> {
        let config = RulesConfig {
            routes: ScriptRoutes {
                by_intent: HashMap::from([
                    ("商品推荐".to_string(), "phone".to_string()),
                    ("价格查询".to_string(), "price".to_string()),
                    ("库存查询".to_string(), "broken".to_string()),
                ]),
                by_category: HashMap::new(),
                default_script: Some("missing".to_string()),
            },
            ..RulesConfig::default()
        };
        let source = MemorySource::new()
            .with_script("phone", PHONE)
            .with_script("price", PRICE)
            .with_script("broken", "SCENE 手机 ON_INTENT 库存查询 IF 型号 \"缺少关键字\"");
        RuleEngine::new(config, source)
    }

    fn record(intent: &str) -> IntentRecord {
        IntentRecord {
            category: "手机".to_string(),
            intent: intent.to_string(),
            ..IntentRecord::default()
        }
    }

    #[test]
    fn test_respond_matches_branch() {
        let mut engine = engine();
        let ctx = Context::new().with("预算", 4500.0).with("品牌", "小米");

        let response = engine.respond(&record("商品推荐"), &ctx).unwrap();
        assert_eq!(response.reply, "A");
        assert!(response.matched);
        assert_eq!(response.script.as_deref(), Some("phone"));
        assert_eq!(response.scene, "手机");
    }

    #[test]
    fn test_respond_uses_fallback_when_nothing_matches() {
        let mut engine = engine();
        let response = engine
            .respond(&record("价格查询"), &Context::new())
            .unwrap();
        assert_eq!(response.reply, crate::config::DEFAULT_FALLBACK_REPLY);
        assert!(!response.matched);
    }

    #[test]
    fn test_respond_caches_scripts() {
        let mut engine = engine();
        let ctx = Context::new().with("型号", "小米14");
        engine.respond(&record("价格查询"), &ctx).unwrap();
        engine.respond(&record("价格查询"), &ctx).unwrap();
        assert_eq!(engine.cache().len(), 1);

        engine.reload();
        assert!(engine.cache().is_empty());
    }

    #[test]
    fn test_unusable_script_falls_back() {
        let mut engine = engine();
        let result = engine.respond(&record("库存查询"), &Context::new());
        assert!(matches!(result, Err(RuleError::Unusable { .. })));

        let response = engine.respond_or_fallback(&record("库存查询"), &Context::new());
        assert_eq!(response.reply, crate::config::DEFAULT_FALLBACK_REPLY);
        assert_eq!(response.script.as_deref(), Some("broken"));
        assert_eq!(response.intent, "库存查询");
    }

    #[test]
    fn test_missing_script_and_route() {
        let mut engine = engine();
        let result = engine.respond(&record("功能对比"), &Context::new());
        assert!(matches!(result, Err(RuleError::ScriptNotFound { name }) if name == "missing"));

        let mut no_default = RuleEngine::new(RulesConfig::default(), MemorySource::new());
        let result = no_default.respond(&record("功能对比"), &Context::new());
        assert!(matches!(result, Err(RuleError::NoRoute { .. })));
    }

    #[test]
    fn test_from_config_file_reports_config_error() {
        let result = RuleEngine::from_config_file("/nonexistent/rules.json", MemorySource::new());
        assert!(matches!(
            result,
            Err(RuleError::Config(crate::error::ConfigError::Io { .. }))
        ));
    }

    #[test]
    fn test_respond_to_record_builds_context() {
        let mut engine = engine();
        let record: IntentRecord = serde_json::from_str(
            r#"{"category": "手机", "intent": "商品推荐", "params": {"预算": "4 500", "品牌": "小米"}}"#,
        )
        .unwrap();
        let response = engine.respond_to_record(&record);
        assert_eq!(response.reply, "A");
    }
}

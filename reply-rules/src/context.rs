//! # Context 模块
//!
//! 求值上下文：标识符到值的只读映射，由调用方在每次求值前准备好。
//!
//! ## 值模型
//!
//! [`Value`] 是封闭的标签联合，比较与存在性语义对每种组合都有明确定义，
//! 不依赖运行时类型探测。
//!
//! ## 分类结果接入
//!
//! [`IntentRecord`] 是外部意图分类服务返回的结构化记录，
//! [`Context::from_record`] 把它转换为上下文。商品目录查询与基于正则的
//! 兜底抽取不在这里完成。

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// 上下文中的值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    String(String),
    Number(f64),
    Bool(bool),
    /// 键存在但没有值（JSON `null`）
    Absent,
}

impl Value {
    /// 类型名，用于日志
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::String(_) => "String",
            Self::Number(_) => "Number",
            Self::Bool(_) => "Bool",
            Self::Absent => "Absent",
        }
    }

    /// 存在性判定：既不是 `Absent` 也不是空字符串
    ///
    /// 数字 0 与 `false` 都算存在。
    pub fn is_present(&self) -> bool {
        match self {
            Self::Absent => false,
            Self::String(s) => !s.is_empty(),
            Self::Number(_) | Self::Bool(_) => true,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::Absent,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => n.as_f64().map_or(Self::Absent, Self::Number),
            serde_json::Value::String(s) => Self::String(s),
            other => Self::String(other.to_string()),
        }
    }
}

/// 求值上下文
///
/// 求值器只通过此 trait 读取数据，不会修改或保留上下文。
pub trait EvalContext {
    /// 按标识符查找值
    fn lookup(&self, name: &str) -> Option<&Value>;
}

impl EvalContext for HashMap<String, Value> {
    fn lookup(&self, name: &str) -> Option<&Value> {
        self.get(name)
    }
}

/// 默认的上下文实现
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Context {
    vars: HashMap<String, Value>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// 链式设置变量
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.vars.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// 从 JSON 对象构建上下文
    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        let map: serde_json::Map<String, serde_json::Value> = serde_json::from_str(text)?;
        Ok(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
    }

    /// 由意图分类记录构建上下文
    ///
    /// - `scene` ← `category`，`intent` ← `intent`
    /// - 映射形式的参数逐项写入，规则见 [`normalize_parameter`]
    /// - 文本形式的参数不做抽取
    pub fn from_record(record: &IntentRecord) -> Self {
        let mut ctx = Self::new()
            .with("scene", record.category.as_str())
            .with("intent", record.intent.as_str());

        if let Parameters::Map(params) = &record.parameters {
            for (key, value) in params {
                ctx.insert(key.as_str(), normalize_parameter(value));
            }
        }
        ctx
    }
}

impl EvalContext for Context {
    fn lookup(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Context {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl From<HashMap<String, Value>> for Context {
    fn from(vars: HashMap<String, Value>) -> Self {
        Self { vars }
    }
}

/// 意图分类服务返回的参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Parameters {
    Map(serde_json::Map<String, serde_json::Value>),
    Text(String),
}

impl Default for Parameters {
    fn default() -> Self {
        Self::Map(serde_json::Map::new())
    }
}

/// 意图分类记录
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntentRecord {
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub intent: String,
    #[serde(default, alias = "params")]
    pub parameters: Parameters,
}

/// 把一个分类参数转换为上下文值
///
/// 字符串会去掉所有空格；去掉 `.` 和 `-` 后全为数字的字符串转为数字，
/// 无法转换时保留为字符串。
pub fn normalize_parameter(value: &serde_json::Value) -> Value {
    match value {
        serde_json::Value::String(s) => {
            let cleaned: String = s.chars().filter(|c| *c != ' ').collect();
            let digits: String = cleaned.chars().filter(|c| *c != '.' && *c != '-').collect();
            if !digits.is_empty()
                && digits.chars().all(|c| c.is_ascii_digit())
                && let Ok(n) = cleaned.parse::<f64>()
            {
                return Value::Number(n);
            }
            Value::String(cleaned)
        }
        other => Value::from(other.clone()),
    }
}

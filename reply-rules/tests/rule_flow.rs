//! # 规则执行集成测试
//!
//! 测试 脚本原文 → Parser → evaluate / RuleEngine 的完整链路，
//! 以及仓库自带的示例脚本与配置。

use reply_rules::{
    Context, DEFAULT_FALLBACK_REPLY, IntentRecord, MemorySource, Parser, RuleEngine, RulesConfig,
    Value, check_source, evaluate,
};

const PHONE_SCRIPT: &str = r#"
SCENE 手机
ON_INTENT 商品推荐
IF 预算 <= 5000 AND 品牌 == "小米" REPLY "A"
ELSE REPLY "B"
"#;

const SAMPLE_SCRIPTS: [(&str, &str); 4] = [
    (
        "product_recommendation.dsl",
        include_str!("../../scripts/product_recommendation.dsl"),
    ),
    ("price_query.dsl", include_str!("../../scripts/price_query.dsl")),
    (
        "feature_compare.dsl",
        include_str!("../../scripts/feature_compare.dsl"),
    ),
    ("stock_query.dsl", include_str!("../../scripts/stock_query.dsl")),
];

const SAMPLE_CONFIG: &str = include_str!("../../scripts/rules.json");

fn sample_engine() -> RuleEngine<MemorySource> {
    let config = RulesConfig::from_json_str(SAMPLE_CONFIG).unwrap();
    let mut source = MemorySource::new();
    for (name, text) in SAMPLE_SCRIPTS {
        source.insert(name, text);
    }
    RuleEngine::new(config, source)
}

fn record(category: &str, intent: &str, params: serde_json::Value) -> IntentRecord {
    serde_json::from_value(serde_json::json!({
        "category": category,
        "intent": intent,
        "params": params,
    }))
    .unwrap()
}

/// 预算与品牌都满足时命中第一个分支
#[test]
fn test_primary_branch_selected() {
    let script = Parser::default().parse(PHONE_SCRIPT).into_result().unwrap();
    let ctx = Context::new().with("预算", 4500.0).with("品牌", "小米");

    let outcome = evaluate(&script, &ctx).unwrap();
    assert_eq!(outcome.reply.as_deref(), Some("A"));
}

/// 预算超出时落到默认分支
#[test]
fn test_default_branch_selected() {
    let script = Parser::default().parse(PHONE_SCRIPT).into_result().unwrap();
    let ctx = Context::new().with("预算", 6000.0).with("品牌", "小米");

    let outcome = evaluate(&script, &ctx).unwrap();
    assert_eq!(outcome.reply.as_deref(), Some("B"));
}

/// 没有默认分支且条件都不成立时返回无回复，而不是错误
#[test]
fn test_no_reply_without_default_branch() {
    let script = Parser::default()
        .parse(
            r#"SCENE 手机 ON_INTENT 功能对比
IF 型号 == "14" REPLY "x"
ELSE IF 型号 == "15" REPLY "y""#,
        )
        .into_result()
        .unwrap();
    let ctx = Context::new().with("型号", "13");

    let outcome = evaluate(&script, &ctx).unwrap();
    assert!(outcome.is_no_reply());
    assert_eq!(outcome.reply_or("兜底"), "兜底");
}

/// 缺少 REPLY 的脚本没有 AST
#[test]
fn test_missing_reply_has_no_script() {
    let report = Parser::default()
        .parse("SCENE 手机 ON_INTENT 商品推荐 IF 预算 <= 5000 \"A\" ELSE REPLY \"B\"");
    assert!(report.script.is_none());
    assert!(!report.errors.is_empty());
}

/// 示例脚本都能通过检查
#[test]
fn test_sample_scripts_have_no_errors() {
    let parser = Parser::default();
    for (name, text) in SAMPLE_SCRIPTS {
        let result = check_source(name, text, &parser);
        assert!(!result.has_errors(), "{}: {:?}", name, result.diagnostics);
        assert_eq!(result.warn_count(), 0, "{}: {:?}", name, result.diagnostics);
    }
}

/// 分类记录经过引擎得到回复模板
#[test]
fn test_engine_with_sample_config() {
    let mut engine = sample_engine();

    let response = engine.respond_to_record(&record(
        "手机",
        "商品推荐",
        serde_json::json!({ "预算": "4 999", "品牌": "小米" }),
    ));
    assert!(response.matched);
    assert_eq!(response.script.as_deref(), Some("product_recommendation.dsl"));
    assert_eq!(
        response.reply,
        "SEARCH_TEMPLATE:为您推荐{品牌}{型号}，价格{预算}元"
    );

    let response = engine.respond_to_record(&record(
        "手机",
        "价格查询",
        serde_json::json!({ "品牌": "华为" }),
    ));
    assert_eq!(
        response.reply,
        "请提供具体的商品品牌和型号，我将为您查询价格。"
    );
}

/// 没有默认分支的脚本未命中时使用配置中的兜底回复
#[test]
fn test_engine_fallback_reply() {
    let mut engine = sample_engine();
    let response = engine.respond_to_record(&record("手机", "功能对比", serde_json::json!({})));
    assert!(!response.matched);
    assert_eq!(response.reply, DEFAULT_FALLBACK_REPLY);
}

/// 空字符串参数视为缺失，数字 0 不视为缺失
#[test]
fn test_existence_through_record() {
    let mut engine = sample_engine();

    let response = engine.respond_to_record(&record(
        "手机",
        "库存查询",
        serde_json::json!({ "品牌": "小米", "型号": "" }),
    ));
    assert!(response.reply.starts_with("请提供"));

    let response = engine.respond_to_record(&record(
        "手机",
        "库存查询",
        serde_json::json!({ "品牌": "小米", "型号": 0 }),
    ));
    assert!(response.reply.starts_with("STOCK_QUERY_TEMPLATE"));
}

/// 上下文中 null 值与缺失的键行为一致
#[test]
fn test_null_value_behaves_like_missing_key() {
    let script = Parser::default().parse(PHONE_SCRIPT).into_result().unwrap();
    let ctx = Context::from_json_str(r#"{"预算": null, "品牌": "小米"}"#).unwrap();
    assert_eq!(ctx.get("预算"), Some(&Value::Absent));

    let outcome = evaluate(&script, &ctx).unwrap();
    assert_eq!(outcome.reply.as_deref(), Some("B"));
}

/// 同一个 Parser 在多个线程中解析、求值不同脚本，互不影响
#[test]
fn test_parallel_pipelines_share_parser() {
    const LAPTOP_SCRIPT: &str = r#"
SCENE 笔记本
ON_INTENT 价格查询
IF 型号 REPLY "PRICE: {型号}"
ELSE REPLY "请告诉我具体型号"
"#;

    let parser = Parser::default();
    let (phone, laptop) = std::thread::scope(|s| {
        let phone = s.spawn(|| {
            (0..50)
                .map(|i| {
                    let script = parser.parse(PHONE_SCRIPT).into_result().unwrap();
                    let brand = if i % 2 == 0 { "小米" } else { "苹果" };
                    let ctx = Context::new().with("预算", 4500.0).with("品牌", brand);
                    evaluate(&script, &ctx).unwrap().reply.unwrap()
                })
                .collect::<Vec<_>>()
        });
        let laptop = s.spawn(|| {
            (0..50)
                .map(|i| {
                    let script = parser.parse(LAPTOP_SCRIPT).into_result().unwrap();
                    let ctx = if i % 2 == 0 {
                        Context::new().with("型号", "X1")
                    } else {
                        Context::new()
                    };
                    let outcome = evaluate(&script, &ctx).unwrap();
                    assert_eq!(outcome.scene, "笔记本");
                    outcome.reply.unwrap()
                })
                .collect::<Vec<_>>()
        });
        (phone.join().unwrap(), laptop.join().unwrap())
    });

    for (i, reply) in phone.iter().enumerate() {
        assert_eq!(reply, if i % 2 == 0 { "A" } else { "B" });
    }
    for (i, reply) in laptop.iter().enumerate() {
        let expected = if i % 2 == 0 {
            "PRICE: {型号}"
        } else {
            "请告诉我具体型号"
        };
        assert_eq!(reply, expected);
    }
}

/// 交替对两份脚本、两个上下文求值，结果只取决于各自的输入
#[test]
fn test_interleaved_evaluations_are_independent() {
    let parser = Parser::default();
    let phone = parser.parse(PHONE_SCRIPT).into_result().unwrap();
    let price = parser.parse(SAMPLE_SCRIPTS[1].1).into_result().unwrap();

    let xiaomi = Context::new().with("预算", 4500.0).with("品牌", "小米");
    let empty = Context::new();

    let first_price = evaluate(&price, &empty).unwrap();
    for _ in 0..10 {
        assert_eq!(evaluate(&phone, &xiaomi).unwrap().reply.as_deref(), Some("A"));
        assert_eq!(evaluate(&price, &empty).unwrap(), first_price);
        assert_eq!(evaluate(&phone, &empty).unwrap().reply.as_deref(), Some("B"));
    }
}

//! 参数与规则校验
//!
//! 校验失败以列表形式返回，由调用方决定是报错（搜索）还是写入操作结果（新增规则）。

use crate::evaluator::{Multiplicity, OperatorDispatchTable, coercion};
use crate::models::{
    ConditionNode, ConditionType, ContentType, Rule, SearchArgs, ValidationFailure,
    ValueConditionNode,
};
use async_trait::async_trait;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::warn;

/// 校验器接口，空列表表示校验通过
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Validator<T: Send + Sync + 'static>: Send + Sync {
    async fn validate(&self, value: &T) -> Vec<ValidationFailure>;
}

/// 搜索参数校验器
#[derive(Debug, Clone, Copy)]
pub struct SearchArgsValidator<C> {
    _content_type: PhantomData<fn() -> C>,
}

impl<C> SearchArgsValidator<C> {
    pub fn new() -> Self {
        Self {
            _content_type: PhantomData,
        }
    }
}

impl<C> Default for SearchArgsValidator<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<C: ContentType> Validator<SearchArgs<C>> for SearchArgsValidator<C> {
    async fn validate(&self, value: &SearchArgs<C>) -> Vec<ValidationFailure> {
        let mut failures = Vec::new();

        if value.date_begin > value.date_end {
            failures.push(ValidationFailure::new(
                "date_begin",
                format!(
                    "开始时间 {} 不能晚于结束时间 {}",
                    value.date_begin, value.date_end
                ),
            ));
        }

        failures
    }
}

/// 新增规则前的结构校验
#[derive(Debug, Clone)]
pub struct RuleValidator {
    dispatch_table: Arc<OperatorDispatchTable>,
}

impl RuleValidator {
    pub fn new(dispatch_table: Arc<OperatorDispatchTable>) -> Self {
        Self { dispatch_table }
    }

    /// 校验规则，返回全部错误信息
    pub fn validate<C, K: ConditionType>(&self, rule: &Rule<C, K>) -> Vec<String> {
        let mut errors = Vec::new();

        if rule.name.trim().is_empty() {
            errors.push("规则名称不能为空".to_string());
        }

        if let Some(date_end) = rule.date_end {
            if date_end < rule.date_begin {
                errors.push(format!(
                    "规则 '{}' 的结束时间 {} 早于开始时间 {}",
                    rule.name, date_end, rule.date_begin
                ));
            }
        }

        if let Some(root) = &rule.root_condition {
            self.validate_node(root, "root", &mut errors);
        }

        errors
    }

    /// 过滤预载规则，跳过无效规则并记录警告
    pub fn retain_valid<C, K: ConditionType>(&self, rules: Vec<Rule<C, K>>) -> Vec<Rule<C, K>> {
        rules
            .into_iter()
            .filter(|rule| {
                let errors = self.validate(rule);
                if !errors.is_empty() {
                    warn!(rule_name = %rule.name, errors = ?errors, "规则无效，已跳过");
                }
                errors.is_empty()
            })
            .collect()
    }

    /// 校验条件节点
    fn validate_node<K: ConditionType>(&self, node: &ConditionNode<K>, path: &str, errors: &mut Vec<String>) {
        match node {
            ConditionNode::Value(value_node) => self.validate_value_node(value_node, path, errors),
            ConditionNode::Composite(composite) => {
                if composite.children.is_empty() {
                    errors.push(format!("逻辑组 '{}' 不能为空", path));
                }

                for (i, child) in composite.children.iter().enumerate() {
                    let child_path = format!("{}.children[{}]", path, i);
                    self.validate_node(child, &child_path, errors);
                }
            }
        }
    }

    /// 校验操作符与数据类型、操作数的兼容性
    fn validate_value_node<K: ConditionType>(
        &self,
        node: &ValueConditionNode<K>,
        path: &str,
        errors: &mut Vec<String>,
    ) {
        let registration = match self.dispatch_table.lookup(node.data_type, node.operator) {
            Ok(registration) => registration,
            Err(e) => {
                errors.push(format!("条件 '{}': {}", path, e));
                return;
            }
        };

        let coerced = match registration.multiplicity {
            Multiplicity::OneToOne => coercion::coerce(&node.operand, node.data_type),
            Multiplicity::OneToMany => coercion::coerce_many(&node.operand, node.data_type),
            Multiplicity::ManyToOne => {
                coercion::coerce(&node.operand, coercion::element_type(node.data_type))
            }
        };

        if let Err(e) = coerced {
            errors.push(format!("条件 '{}' 的操作数无效: {}", path, e));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ContentContainer;
    use crate::operators::{DataType, Operator};
    use chrono::{DateTime, TimeZone, Utc};

    fn date(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn rule(root: Option<ConditionNode<&'static str>>) -> Rule<&'static str, &'static str> {
        Rule {
            name: "rule".to_string(),
            content_container: ContentContainer::new("banner", serde_json::Value::Null),
            date_begin: date(2020, 1, 1),
            date_end: Some(date(2021, 1, 1)),
            priority: 1,
            root_condition: root,
        }
    }

    fn validator() -> RuleValidator {
        RuleValidator::new(OperatorDispatchTable::shared())
    }

    #[test]
    fn test_search_args_validator() {
        let validator = SearchArgsValidator::new();

        let valid = SearchArgs::new("banner", date(2020, 1, 1), date(2020, 1, 1));
        assert!(tokio_test::block_on(validator.validate(&valid)).is_empty());

        let invalid = SearchArgs::new("banner", date(2021, 1, 1), date(2020, 1, 1));
        let failures = tokio_test::block_on(validator.validate(&invalid));
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].field, "date_begin");
    }

    #[test]
    fn test_valid_rule() {
        let root = ConditionNode::and(vec![
            ConditionNode::value(DataType::String, "country", Operator::In, serde_json::json!(["USA"])),
            ConditionNode::value(DataType::ArrayString, "tags", Operator::Contains, "vip"),
        ]);
        assert!(validator().validate(&rule(Some(root))).is_empty());
        assert!(validator().validate(&rule(None)).is_empty());
    }

    #[test]
    fn test_collects_every_error() {
        let mut invalid = rule(Some(ConditionNode::and(vec![
            ConditionNode::or(vec![]),
            ConditionNode::value(DataType::Boolean, "is_vip", Operator::StartsWith, "t"),
            ConditionNode::value(DataType::Integer, "amount", Operator::In, 10),
        ])));
        invalid.name = " ".to_string();
        invalid.date_end = Some(date(2019, 1, 1));

        let errors = validator().validate(&invalid);
        assert_eq!(errors.len(), 5, "{errors:?}");
        assert!(errors[2].contains("root.children[0]"));
        assert!(errors[3].contains("root.children[1]"));
        assert!(errors[4].contains("root.children[2]"));
    }

    #[test]
    fn test_retain_valid_skips_preloaded_invalid_rules() {
        let mut empty_group = rule(Some(ConditionNode::and(vec![])));
        empty_group.name = "empty_group".to_string();
        let mut inverted_dates = rule(None);
        inverted_dates.name = "inverted_dates".to_string();
        inverted_dates.date_end = Some(date(2019, 1, 1));

        let kept = validator().retain_valid(vec![empty_group, rule(None), inverted_dates]);

        let names: Vec<_> = kept.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["rule"]);
    }
}

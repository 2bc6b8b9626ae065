//! 规则引擎领域模型

use crate::error::Result;
use crate::operators::{DataType, LogicalOperator, MatchMode, Operator};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Debug;
use std::hash::Hash;

/// 条件类型标识（由调用方定义，引擎只用于相等比较和哈希）
pub trait ConditionType: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

impl<T> ConditionType for T where T: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

/// 内容类型标识（由调用方定义，引擎只用于相等比较和哈希）
pub trait ContentType: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

impl<T> ContentType for T where T: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

/// 条件树节点（叶子比较或逻辑组合）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConditionNode<K> {
    Value(ValueConditionNode<K>),
    Composite(CompositeConditionNode<K>),
}

impl<K> ConditionNode<K> {
    pub fn value(
        data_type: DataType,
        condition_type: K,
        operator: Operator,
        operand: impl Into<Value>,
    ) -> Self {
        Self::Value(ValueConditionNode::new(
            data_type,
            condition_type,
            operator,
            operand,
        ))
    }

    pub fn and(children: Vec<ConditionNode<K>>) -> Self {
        Self::Composite(CompositeConditionNode::and(children))
    }

    pub fn or(children: Vec<ConditionNode<K>>) -> Self {
        Self::Composite(CompositeConditionNode::or(children))
    }
}

/// 叶子条件节点
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueConditionNode<K> {
    pub data_type: DataType,
    pub condition_type: K,
    pub operator: Operator,
    pub operand: Value,
}

impl<K> ValueConditionNode<K> {
    pub fn new(
        data_type: DataType,
        condition_type: K,
        operator: Operator,
        operand: impl Into<Value>,
    ) -> Self {
        Self {
            data_type,
            condition_type,
            operator,
            operand: operand.into(),
        }
    }
}

/// 逻辑组合节点，子节点按声明顺序求值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeConditionNode<K> {
    pub logical_operator: LogicalOperator,
    pub children: Vec<ConditionNode<K>>,
}

impl<K> CompositeConditionNode<K> {
    pub fn new(logical_operator: LogicalOperator, children: Vec<ConditionNode<K>>) -> Self {
        Self {
            logical_operator,
            children,
        }
    }

    pub fn and(children: Vec<ConditionNode<K>>) -> Self {
        Self::new(LogicalOperator::And, children)
    }

    pub fn or(children: Vec<ConditionNode<K>>) -> Self {
        Self::new(LogicalOperator::Or, children)
    }
}

/// 运行时条件 - 调用方在匹配时提供的事实
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition<K> {
    pub condition_type: K,
    pub value: Value,
}

impl<K> Condition<K> {
    pub fn new(condition_type: K, value: impl Into<Value>) -> Self {
        Self {
            condition_type,
            value: value.into(),
        }
    }
}

/// 规则内容容器
///
/// 内容以原始 JSON 保存，调用 [`ContentContainer::get_content_as`] 时才反序列化。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentContainer<C> {
    pub content_type: C,
    pub content: Value,
}

impl<C> ContentContainer<C> {
    pub fn new(content_type: C, content: impl Into<Value>) -> Self {
        Self {
            content_type,
            content: content.into(),
        }
    }

    pub fn get_content_as<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(T::deserialize(&self.content)?)
    }
}

/// 规则定义
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule<C, K> {
    pub name: String,
    pub content_container: ContentContainer<C>,
    pub date_begin: DateTime<Utc>,
    /// 为空表示规则无截止时间
    #[serde(default)]
    pub date_end: Option<DateTime<Utc>>,
    /// 数值越小优先级越高，从 1 开始
    pub priority: u32,
    /// 为空表示规则无条件成立
    #[serde(default)]
    pub root_condition: Option<ConditionNode<K>>,
}

impl<C, K> Rule<C, K> {
    pub fn content_type(&self) -> &C {
        &self.content_container.content_type
    }

    /// 规则生效区间 `[date_begin, date_end)` 是否与 `[begin, end]` 重叠
    pub fn overlaps(&self, begin: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.date_begin <= end && self.date_end.is_none_or(|date_end| date_end > begin)
    }
}

/// 单次评估的选项
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationOptions {
    pub match_mode: MatchMode,
}

impl EvaluationOptions {
    pub fn new(match_mode: MatchMode) -> Self {
        Self { match_mode }
    }
}

/// 新增规则时的优先级放置方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleAddPriorityOption {
    AtTop,
    AtBottom,
    ByPriorityNumber(u32),
}

/// 规则操作结果，校验失败不会以错误返回
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleOperationResult {
    pub is_success: bool,
    pub errors: Vec<String>,
}

impl RuleOperationResult {
    pub fn success() -> Self {
        Self {
            is_success: true,
            errors: Vec::new(),
        }
    }

    pub fn error(errors: Vec<String>) -> Self {
        Self {
            is_success: false,
            errors,
        }
    }
}

/// 单条校验失败信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationFailure {
    pub field: String,
    pub message: String,
}

impl ValidationFailure {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// 规则搜索参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchArgs<C> {
    pub content_type: C,
    pub date_begin: DateTime<Utc>,
    pub date_end: DateTime<Utc>,
}

impl<C> SearchArgs<C> {
    pub fn new(content_type: C, date_begin: DateTime<Utc>, date_end: DateTime<Utc>) -> Self {
        Self {
            content_type,
            date_begin,
            date_end,
        }
    }
}

/// 按属性过滤规则的参数，字段为空表示不过滤
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RulesFilterArgs<C> {
    pub content_type: Option<C>,
    pub name: Option<String>,
    pub priority: Option<u32>,
}

impl<C> Default for RulesFilterArgs<C> {
    fn default() -> Self {
        Self {
            content_type: None,
            name: None,
            priority: None,
        }
    }
}

impl<C: PartialEq> RulesFilterArgs<C> {
    pub fn by_content_type(content_type: C) -> Self {
        Self {
            content_type: Some(content_type),
            ..Default::default()
        }
    }

    pub fn matches<K>(&self, rule: &Rule<C, K>) -> bool {
        self.content_type
            .as_ref()
            .is_none_or(|c| c == rule.content_type())
            && self.name.as_ref().is_none_or(|n| *n == rule.name)
            && self.priority.is_none_or(|p| p == rule.priority)
    }
}

//! 规则操作符与数据类型定义

use serde::{Deserialize, Serialize};
use std::fmt;

/// 条件操作符
///
/// 左操作数为运行时条件值，右操作数为规则中声明的操作数。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    // 关系比较
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    LesserThan,
    LesserThanOrEqual,

    // 包含检查
    Contains,
    NotContains,
    In,

    // 字符串操作
    StartsWith,
    EndsWith,
    CaseInsensitiveStartsWith,
    CaseInsensitiveEndsWith,
}

impl Operator {
    pub const ALL: [Operator; 13] = [
        Self::Equal,
        Self::NotEqual,
        Self::GreaterThan,
        Self::GreaterThanOrEqual,
        Self::LesserThan,
        Self::LesserThanOrEqual,
        Self::Contains,
        Self::NotContains,
        Self::In,
        Self::StartsWith,
        Self::EndsWith,
        Self::CaseInsensitiveStartsWith,
        Self::CaseInsensitiveEndsWith,
    ];
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Equal => "equal",
            Self::NotEqual => "not_equal",
            Self::GreaterThan => "greater_than",
            Self::GreaterThanOrEqual => "greater_than_or_equal",
            Self::LesserThan => "lesser_than",
            Self::LesserThanOrEqual => "lesser_than_or_equal",
            Self::Contains => "contains",
            Self::NotContains => "not_contains",
            Self::In => "in",
            Self::StartsWith => "starts_with",
            Self::EndsWith => "ends_with",
            Self::CaseInsensitiveStartsWith => "case_insensitive_starts_with",
            Self::CaseInsensitiveEndsWith => "case_insensitive_ends_with",
        };
        write!(f, "{}", s)
    }
}

/// 逻辑操作符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogicalOperator {
    And,
    Or,
}

impl fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::And => write!(f, "AND"),
            Self::Or => write!(f, "OR"),
        }
    }
}

/// 叶子条件声明的数据类型
///
/// 决定运行时条件值与规则操作数如何转换，以及使用哪种比较策略。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Integer,
    Decimal,
    String,
    Boolean,
    ArrayString,
    Object,
}

impl DataType {
    pub const ALL: [DataType; 6] = [
        Self::Integer,
        Self::Decimal,
        Self::String,
        Self::Boolean,
        Self::ArrayString,
        Self::Object,
    ];
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Integer => "integer",
            Self::Decimal => "decimal",
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::ArrayString => "array_string",
            Self::Object => "object",
        };
        write!(f, "{}", s)
    }
}

/// 多条规则同时匹配时的优先级策略
///
/// 优先级数值越小越靠前（topmost）。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorityCriteria {
    #[default]
    TopmostRuleWins,
    BottommostRuleWins,
}

/// 条件缺失时的匹配模式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// 规则引用的每个条件都必须由调用方提供，缺失视为不匹配
    #[default]
    Exact,
    /// 缺失的条件被跳过（视为满足）
    Relaxed,
}

/// Exact 模式下条件缺失时的处理方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingConditionBehavior {
    #[default]
    Discard,
    UseDataTypeDefault,
}

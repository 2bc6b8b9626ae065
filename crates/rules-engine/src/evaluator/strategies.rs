//! 操作符求值策略
//!
//! 每个策略只接受特定类型的操作数，超出范围一律返回
//! [`RuleError::UnsupportedOperandType`]，不会伪装成 `false`。

use super::coercion::Operand;
use crate::error::{Result, RuleError};
use crate::operators::Operator;
use std::cmp::Ordering;

/// 操作符策略：`(left, right) -> bool`，left 为运行时条件值
pub type OperatorEvalStrategy = fn(&Operand, &Operand) -> Result<bool>;

fn unsupported(operator: Operator, left: &Operand, right: &Operand) -> RuleError {
    RuleError::UnsupportedOperandType {
        operator,
        left_type: left.type_name(),
        right_type: right.type_name(),
    }
}

fn ordering(operator: Operator, left: &Operand, right: &Operand) -> Result<Ordering> {
    left.compare(right)
        .ok_or_else(|| unsupported(operator, left, right))
}

pub fn equal(left: &Operand, right: &Operand) -> Result<bool> {
    left.equals(right)
        .ok_or_else(|| unsupported(Operator::Equal, left, right))
}

pub fn not_equal(left: &Operand, right: &Operand) -> Result<bool> {
    left.equals(right)
        .map(|eq| !eq)
        .ok_or_else(|| unsupported(Operator::NotEqual, left, right))
}

pub fn greater_than(left: &Operand, right: &Operand) -> Result<bool> {
    ordering(Operator::GreaterThan, left, right).map(Ordering::is_gt)
}

pub fn greater_than_or_equal(left: &Operand, right: &Operand) -> Result<bool> {
    ordering(Operator::GreaterThanOrEqual, left, right).map(Ordering::is_ge)
}

pub fn lesser_than(left: &Operand, right: &Operand) -> Result<bool> {
    ordering(Operator::LesserThan, left, right).map(Ordering::is_lt)
}

pub fn lesser_than_or_equal(left: &Operand, right: &Operand) -> Result<bool> {
    ordering(Operator::LesserThanOrEqual, left, right).map(Ordering::is_le)
}

/// 字符串子串或集合成员检查：right 是否在 left 中
fn contains_item(operator: Operator, left: &Operand, right: &Operand) -> Result<bool> {
    match (left, right) {
        (Operand::String(s), Operand::String(sub)) => Ok(s.contains(sub.as_str())),
        (Operand::Many(items), item) if !matches!(item, Operand::Many(_)) => {
            Ok(items.iter().any(|i| i.equals(item) == Some(true)))
        }
        _ => Err(unsupported(operator, left, right)),
    }
}

pub fn contains(left: &Operand, right: &Operand) -> Result<bool> {
    contains_item(Operator::Contains, left, right)
}

pub fn not_contains(left: &Operand, right: &Operand) -> Result<bool> {
    contains_item(Operator::NotContains, left, right).map(|found| !found)
}

/// left 是否在 right 集合中
pub fn in_list(left: &Operand, right: &Operand) -> Result<bool> {
    match (left, right) {
        (Operand::Many(_), _) => Err(unsupported(Operator::In, left, right)),
        (item, Operand::Many(items)) => Ok(items.iter().any(|i| item.equals(i) == Some(true))),
        _ => Err(unsupported(Operator::In, left, right)),
    }
}

fn string_operands<'a>(
    operator: Operator,
    left: &'a Operand,
    right: &'a Operand,
) -> Result<(&'a str, &'a str)> {
    match (left.as_str(), right.as_str()) {
        (Some(l), Some(r)) => Ok((l, r)),
        _ => Err(unsupported(operator, left, right)),
    }
}

pub fn starts_with(left: &Operand, right: &Operand) -> Result<bool> {
    let (s, prefix) = string_operands(Operator::StartsWith, left, right)?;
    Ok(s.starts_with(prefix))
}

pub fn ends_with(left: &Operand, right: &Operand) -> Result<bool> {
    let (s, suffix) = string_operands(Operator::EndsWith, left, right)?;
    Ok(s.ends_with(suffix))
}

pub fn case_insensitive_starts_with(left: &Operand, right: &Operand) -> Result<bool> {
    let (s, prefix) = string_operands(Operator::CaseInsensitiveStartsWith, left, right)?;
    starts_with(
        &Operand::String(s.to_lowercase()),
        &Operand::String(prefix.to_lowercase()),
    )
}

pub fn case_insensitive_ends_with(left: &Operand, right: &Operand) -> Result<bool> {
    let (s, suffix) = string_operands(Operator::CaseInsensitiveEndsWith, left, right)?;
    ends_with(
        &Operand::String(s.to_lowercase()),
        &Operand::String(suffix.to_lowercase()),
    )
}

/// 操作符对应的内置策略
pub fn for_operator(operator: Operator) -> OperatorEvalStrategy {
    match operator {
        Operator::Equal => equal,
        Operator::NotEqual => not_equal,
        Operator::GreaterThan => greater_than,
        Operator::GreaterThanOrEqual => greater_than_or_equal,
        Operator::LesserThan => lesser_than,
        Operator::LesserThanOrEqual => lesser_than_or_equal,
        Operator::Contains => contains,
        Operator::NotContains => not_contains,
        Operator::In => in_list,
        Operator::StartsWith => starts_with,
        Operator::EndsWith => ends_with,
        Operator::CaseInsensitiveStartsWith => case_insensitive_starts_with,
        Operator::CaseInsensitiveEndsWith => case_insensitive_ends_with,
    }
}

//! 操作数类型转换
//!
//! 把 JSON 形式的运行时条件值和规则操作数转换成叶子节点声明的数据类型。

use crate::error::{Result, RuleError};
use crate::operators::DataType;
use serde_json::Value;
use std::cmp::Ordering;

/// 转换后的强类型操作数
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Integer(i64),
    Decimal(f64),
    String(String),
    Boolean(bool),
    Many(Vec<Operand>),
    Object(Value),
}

impl Operand {
    /// 操作数的运行时类型名，用于错误信息
    pub fn type_name(&self) -> String {
        match self {
            Self::Integer(_) => "i64".to_string(),
            Self::Decimal(_) => "f64".to_string(),
            Self::String(_) => "String".to_string(),
            Self::Boolean(_) => "bool".to_string(),
            Self::Many(items) => match items.first() {
                Some(item) => format!("Vec<{}>", item.type_name()),
                None => "Vec<_>".to_string(),
            },
            Self::Object(_) => "serde_json::Value".to_string(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// 标量之间的自然顺序，类型不可比较时返回 None
    pub fn compare(&self, other: &Operand) -> Option<Ordering> {
        match (self, other) {
            (Self::Integer(a), Self::Integer(b)) => Some(a.cmp(b)),
            (Self::Decimal(a), Self::Decimal(b)) => a.partial_cmp(b),
            (Self::Integer(a), Self::Decimal(b)) => (*a as f64).partial_cmp(b),
            (Self::Decimal(a), Self::Integer(b)) => a.partial_cmp(&(*b as f64)),
            (Self::String(a), Self::String(b)) => Some(a.cmp(b)),
            (Self::Boolean(a), Self::Boolean(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// 相等比较，类型不可比较时返回 None
    pub fn equals(&self, other: &Operand) -> Option<bool> {
        match (self, other) {
            (Self::Object(a), Self::Object(b)) => Some(a == b),
            _ => self.compare(other).map(|o| o == Ordering::Equal),
        }
    }
}

/// 按数据类型转换单个值
pub fn coerce(value: &Value, data_type: DataType) -> Result<Operand> {
    let coerced = match data_type {
        DataType::Integer => as_i64(value).map(Operand::Integer),
        DataType::Decimal => as_f64(value).map(Operand::Decimal),
        DataType::String => as_string(value).map(Operand::String),
        DataType::Boolean => as_bool(value).map(Operand::Boolean),
        DataType::ArrayString => value.as_array().and_then(|items| {
            items
                .iter()
                .map(|item| as_string(item).map(Operand::String))
                .collect::<Option<Vec<_>>>()
                .map(Operand::Many)
        }),
        DataType::Object => Some(Operand::Object(value.clone())),
    };

    coerced.ok_or_else(|| RuleError::OperandCoercion {
        data_type,
        value: value.clone(),
    })
}

/// 把数组转换为元素类型为 `data_type` 的多值操作数
pub fn coerce_many(value: &Value, data_type: DataType) -> Result<Operand> {
    let items = value.as_array().ok_or_else(|| RuleError::OperandCoercion {
        data_type,
        value: value.clone(),
    })?;

    items
        .iter()
        .map(|item| coerce(item, data_type))
        .collect::<Result<Vec<_>>>()
        .map(Operand::Many)
}

/// 集合类型的元素类型；标量类型返回自身
pub fn element_type(data_type: DataType) -> DataType {
    match data_type {
        DataType::ArrayString => DataType::String,
        other => other,
    }
}

/// 数据类型的默认值，Exact 模式下条件缺失且配置为使用默认值时使用
pub fn default_value(data_type: DataType) -> Value {
    match data_type {
        DataType::Integer => Value::from(0),
        DataType::Decimal => Value::from(0.0),
        DataType::String => Value::from(""),
        DataType::Boolean => Value::from(false),
        DataType::ArrayString => Value::Array(Vec::new()),
        DataType::Object => Value::Null,
    }
}

fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

fn as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) if s.eq_ignore_ascii_case("true") => Some(true),
        Value::String(s) if s.eq_ignore_ascii_case("false") => Some(false),
        _ => None,
    }
}

//! 规则引擎错误类型

use crate::models::ValidationFailure;
use crate::operators::{DataType, Operator};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuleError {
    #[error(
        "不支持的操作数类型: '{operator}' 无法比较 '{left_type}' 与 '{right_type}' 类型的操作数"
    )]
    UnsupportedOperandType {
        operator: Operator,
        left_type: String,
        right_type: String,
    },

    #[error("无效的操作符: {operator} 不支持数据类型 {data_type}")]
    UnsupportedOperatorForDataType {
        operator: Operator,
        data_type: DataType,
    },

    #[error("操作数转换失败: 期望 {data_type}, 实际值 {value}")]
    OperandCoercion {
        data_type: DataType,
        value: serde_json::Value,
    },

    #[error("逻辑组 '{path}' 不能为空")]
    EmptyCompositeCondition { path: String },

    #[error("参数不能为空: {param}")]
    ArgumentNull { param: &'static str },

    #[error("指定的 '{param}' 搜索参数无效: {}", format_failures(.failures))]
    InvalidSearchArguments {
        param: &'static str,
        failures: Vec<ValidationFailure>,
    },

    #[error("引擎配置无效: {0}")]
    InvalidOptions(String),

    #[error("规则数据源错误: {0}")]
    DataSource(String),

    #[error("配置加载失败: {0}")]
    Config(#[from] config::ConfigError),

    #[error("JSON 序列化错误: {0}")]
    Json(#[from] serde_json::Error),
}

fn format_failures(failures: &[ValidationFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{}: {}", f.field, f.message))
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, RuleError>;

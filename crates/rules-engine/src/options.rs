//! 规则引擎选项

use crate::error::{Result, RuleError};
use crate::evaluator::coercion;
use crate::operators::{DataType, MatchMode, MissingConditionBehavior, PriorityCriteria};
use serde::Deserialize;
use serde_json::Value;

/// 各数据类型的默认值
///
/// 仅在 Exact 模式且 `missing_condition_behavior = use_data_type_default` 时使用。
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DataTypeDefaults {
    pub integer: i64,
    pub decimal: f64,
    pub string: String,
    pub boolean: bool,
    pub array_string: Vec<String>,
    pub object: Value,
}

impl Default for DataTypeDefaults {
    fn default() -> Self {
        Self {
            integer: 0,
            decimal: 0.0,
            string: String::new(),
            boolean: false,
            array_string: Vec::new(),
            object: coercion::default_value(DataType::Object),
        }
    }
}

impl DataTypeDefaults {
    pub fn value_for(&self, data_type: DataType) -> Value {
        match data_type {
            DataType::Integer => Value::from(self.integer),
            DataType::Decimal => Value::from(self.decimal),
            DataType::String => Value::from(self.string.as_str()),
            DataType::Boolean => Value::from(self.boolean),
            DataType::ArrayString => Value::from(self.array_string.clone()),
            DataType::Object => self.object.clone(),
        }
    }
}

/// 规则引擎选项
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RulesEngineOptions {
    pub priority_criteria: PriorityCriteria,
    /// 匹配操作未显式传入评估选项时使用的匹配模式
    pub match_mode: MatchMode,
    pub missing_condition_behavior: MissingConditionBehavior,
    pub data_type_defaults: DataTypeDefaults,
}

impl RulesEngineOptions {
    /// 校验选项，构建引擎前调用
    pub fn ensure_valid(&self) -> Result<()> {
        if !self.data_type_defaults.decimal.is_finite() {
            return Err(RuleError::InvalidOptions(format!(
                "decimal 默认值必须是有限数值，当前为 {}",
                self.data_type_defaults.decimal
            )));
        }

        for data_type in DataType::ALL {
            let value = self.data_type_defaults.value_for(data_type);
            coercion::coerce(&value, data_type).map_err(|e| {
                RuleError::InvalidOptions(format!("{} 默认值无效: {}", data_type, e))
            })?;
        }

        Ok(())
    }
}

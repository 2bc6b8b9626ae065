//! 条件评估器
//!
//! 按 `(数据类型, 操作符)` 查找求值策略，先把运行时条件值和规则操作数
//! 转换为声明的数据类型，再交给策略比较。
//!
//! 分发表在交给执行器之前构建完成，之后只读。

pub mod coercion;
pub mod strategies;

pub use coercion::Operand;
pub use strategies::OperatorEvalStrategy;

use crate::error::{Result, RuleError};
use crate::operators::{DataType, Operator};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

/// 操作数的多重性
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Multiplicity {
    /// 标量对标量
    OneToOne,
    /// 条件值为标量，操作数为集合（`in`）
    OneToMany,
    /// 条件值为集合，操作数为标量（集合上的 `contains`）
    ManyToOne,
}

/// 分发表中的一条登记
#[derive(Debug, Clone, Copy)]
pub struct StrategyRegistration {
    pub multiplicity: Multiplicity,
    pub strategy: OperatorEvalStrategy,
}

static SHARED_TABLE: LazyLock<Arc<OperatorDispatchTable>> =
    LazyLock::new(|| Arc::new(OperatorDispatchTable::new()));

/// `(数据类型, 操作符) -> 策略` 分发表
#[derive(Debug, Clone)]
pub struct OperatorDispatchTable {
    entries: HashMap<(DataType, Operator), StrategyRegistration>,
}

impl OperatorDispatchTable {
    /// 创建包含全部内置策略的分发表
    pub fn new() -> Self {
        use Multiplicity::{ManyToOne, OneToMany, OneToOne};
        use Operator::*;

        let mut table = Self::empty();

        for data_type in [DataType::Integer, DataType::Decimal, DataType::String] {
            for operator in [
                Equal,
                NotEqual,
                GreaterThan,
                GreaterThanOrEqual,
                LesserThan,
                LesserThanOrEqual,
            ] {
                table.register_builtin(data_type, operator, OneToOne);
            }
            table.register_builtin(data_type, In, OneToMany);
        }

        for operator in [
            Contains,
            NotContains,
            StartsWith,
            EndsWith,
            CaseInsensitiveStartsWith,
            CaseInsensitiveEndsWith,
        ] {
            table.register_builtin(DataType::String, operator, OneToOne);
        }

        table.register_builtin(DataType::Boolean, Equal, OneToOne);
        table.register_builtin(DataType::Boolean, NotEqual, OneToOne);
        table.register_builtin(DataType::Boolean, In, OneToMany);

        table.register_builtin(DataType::ArrayString, Contains, ManyToOne);
        table.register_builtin(DataType::ArrayString, NotContains, ManyToOne);

        table.register_builtin(DataType::Object, Equal, OneToOne);
        table.register_builtin(DataType::Object, NotEqual, OneToOne);

        table
    }

    /// 创建空分发表
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// 进程级共享的默认分发表
    pub fn shared() -> Arc<Self> {
        Arc::clone(&SHARED_TABLE)
    }

    fn register_builtin(&mut self, data_type: DataType, operator: Operator, multiplicity: Multiplicity) {
        self.register(
            data_type,
            operator,
            multiplicity,
            strategies::for_operator(operator),
        );
    }

    /// 登记（或替换）一个策略
    pub fn register(
        &mut self,
        data_type: DataType,
        operator: Operator,
        multiplicity: Multiplicity,
        strategy: OperatorEvalStrategy,
    ) -> &mut Self {
        self.entries.insert(
            (data_type, operator),
            StrategyRegistration {
                multiplicity,
                strategy,
            },
        );
        self
    }

    /// 查找策略
    pub fn lookup(&self, data_type: DataType, operator: Operator) -> Result<StrategyRegistration> {
        self.entries
            .get(&(data_type, operator))
            .copied()
            .ok_or(RuleError::UnsupportedOperatorForDataType {
                operator,
                data_type,
            })
    }

    /// 已登记的全部组合
    pub fn registered_pairs(&self) -> impl Iterator<Item = (DataType, Operator)> + '_ {
        self.entries.keys().copied()
    }

    /// 转换操作数并执行比较
    ///
    /// # Arguments
    /// * `fact` - 运行时条件值（左操作数）
    /// * `operand` - 规则中声明的操作数（右操作数）
    pub fn dispatch(
        &self,
        data_type: DataType,
        operator: Operator,
        fact: &Value,
        operand: &Value,
    ) -> Result<bool> {
        let registration = self.lookup(data_type, operator)?;

        let (left, right) = match registration.multiplicity {
            Multiplicity::OneToOne => (
                coercion::coerce(fact, data_type)?,
                coercion::coerce(operand, data_type)?,
            ),
            Multiplicity::OneToMany => (
                coercion::coerce(fact, data_type)?,
                coercion::coerce_many(operand, data_type)?,
            ),
            Multiplicity::ManyToOne => (
                coercion::coerce(fact, data_type)?,
                coercion::coerce(operand, coercion::element_type(data_type))?,
            ),
        };

        (registration.strategy)(&left, &right)
    }
}

impl Default for OperatorDispatchTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dispatch(data_type: DataType, operator: Operator, fact: Value, operand: Value) -> Result<bool> {
        OperatorDispatchTable::new().dispatch(data_type, operator, &fact, &operand)
    }

    #[test]
    fn test_numeric_comparisons() {
        assert!(dispatch(DataType::Integer, Operator::GreaterThan, json!(100), json!(50)).unwrap());
        assert!(dispatch(DataType::Integer, Operator::Equal, json!("100"), json!(100)).unwrap());
        assert!(
            dispatch(DataType::Decimal, Operator::LesserThan, json!(99.9), json!(100)).unwrap()
        );
        assert!(
            !dispatch(DataType::Decimal, Operator::NotEqual, json!(1.5), json!("1.5")).unwrap()
        );
    }

    #[test]
    fn test_string_operators() {
        assert!(dispatch(DataType::String, Operator::Equal, json!("USA"), json!("USA")).unwrap());
        assert!(
            dispatch(
                DataType::String,
                Operator::CaseInsensitiveStartsWith,
                json!("Portugal"),
                json!("port")
            )
            .unwrap()
        );
        assert!(
            dispatch(DataType::String, Operator::Contains, json!("hello world"), json!("world"))
                .unwrap()
        );
        assert!(
            dispatch(DataType::String, Operator::LesserThan, json!("abc"), json!("abd")).unwrap()
        );
    }

    #[test]
    fn test_in_uses_operand_array() {
        assert!(
            dispatch(DataType::String, Operator::In, json!("USA"), json!(["USA", "CAN"])).unwrap()
        );
        assert!(!dispatch(DataType::Integer, Operator::In, json!(5), json!([1, 2, 3])).unwrap());
        assert!(dispatch(DataType::Boolean, Operator::In, json!(true), json!([true])).unwrap());

        let err = dispatch(DataType::String, Operator::In, json!("USA"), json!("USA")).unwrap_err();
        assert!(matches!(
            err,
            RuleError::OperandCoercion {
                data_type: DataType::String,
                ..
            }
        ));
    }

    #[test]
    fn test_array_string_contains() {
        assert!(
            dispatch(
                DataType::ArrayString,
                Operator::Contains,
                json!(["vip", "frequent"]),
                json!("vip")
            )
            .unwrap()
        );
        assert!(
            dispatch(
                DataType::ArrayString,
                Operator::NotContains,
                json!(["vip", "frequent"]),
                json!("new")
            )
            .unwrap()
        );
    }

    #[test]
    fn test_object_equality() {
        assert!(
            dispatch(DataType::Object, Operator::Equal, json!({"a": 1}), json!({"a": 1})).unwrap()
        );
        assert!(
            dispatch(DataType::Object, Operator::NotEqual, json!([1]), json!([2])).unwrap()
        );
    }

    #[test]
    fn test_unregistered_pair_fails() {
        let err =
            dispatch(DataType::Boolean, Operator::GreaterThan, json!(true), json!(false)).unwrap_err();
        assert!(matches!(
            err,
            RuleError::UnsupportedOperatorForDataType {
                operator: Operator::GreaterThan,
                data_type: DataType::Boolean,
            }
        ));

        assert!(
            dispatch(DataType::Object, Operator::StartsWith, json!("a"), json!("a")).is_err()
        );
    }

    #[test]
    fn test_fact_coercion_failure() {
        let err = dispatch(DataType::Integer, Operator::Equal, json!("abc"), json!(1)).unwrap_err();
        match err {
            RuleError::OperandCoercion { data_type, value } => {
                assert_eq!(data_type, DataType::Integer);
                assert_eq!(value, json!("abc"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_every_registered_pair_dispatches() {
        let table = OperatorDispatchTable::new();
        let pairs: Vec<_> = table.registered_pairs().collect();
        assert_eq!(pairs.len(), 3 * 7 + 6 + 3 + 2 + 2);

        for (data_type, operator) in pairs {
            let registration = table.lookup(data_type, operator).unwrap();
            let value = coercion::default_value(data_type);
            let operand = match registration.multiplicity {
                Multiplicity::OneToOne => value.clone(),
                Multiplicity::OneToMany => Value::Array(vec![value.clone()]),
                Multiplicity::ManyToOne => {
                    coercion::default_value(coercion::element_type(data_type))
                }
            };

            assert!(
                table.dispatch(data_type, operator, &value, &operand).is_ok(),
                "{data_type}/{operator}"
            );
        }
    }

    #[test]
    fn test_custom_registration_replaces_builtin() {
        fn always_true(_: &Operand, _: &Operand) -> Result<bool> {
            Ok(true)
        }

        let mut table = OperatorDispatchTable::new();
        table.register(
            DataType::Boolean,
            Operator::GreaterThan,
            Multiplicity::OneToOne,
            always_true,
        );

        assert!(
            table
                .dispatch(DataType::Boolean, Operator::GreaterThan, &json!(false), &json!(true))
                .unwrap()
        );
        assert!(
            OperatorDispatchTable::shared()
                .lookup(DataType::Boolean, Operator::GreaterThan)
                .is_err()
        );
    }
}

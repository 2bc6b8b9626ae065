//! 条件树执行器
//!
//! 按声明顺序自左向右遍历条件树，逻辑组短路求值：AND 遇到 false、OR 遇到 true
//! 立即返回，之后的子节点不会被评估（也不会产生类型错误）。

use crate::error::{Result, RuleError};
use crate::evaluator::OperatorDispatchTable;
use crate::models::{
    CompositeConditionNode, Condition, ConditionNode, ConditionType, EvaluationOptions,
    ValueConditionNode,
};
use crate::operators::{LogicalOperator, MatchMode, MissingConditionBehavior};
use crate::options::{DataTypeDefaults, RulesEngineOptions};
use serde::Serialize;
use std::sync::Arc;
use tracing::trace;

/// 条件树评估接口
#[cfg_attr(test, mockall::automock)]
pub trait ConditionsEvalEngine<K: ConditionType>: Send + Sync {
    /// 对运行时条件评估条件树
    fn eval(
        &self,
        root: &ConditionNode<K>,
        conditions: &[Condition<K>],
        options: &EvaluationOptions,
    ) -> Result<bool>;
}

/// 带追踪信息的评估结果
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationTrace {
    pub matched: bool,
    pub steps: Vec<String>,
}

/// 延迟求值执行器
#[derive(Debug, Clone)]
pub struct DeferredEvaluator {
    dispatch_table: Arc<OperatorDispatchTable>,
    missing_condition_behavior: MissingConditionBehavior,
    data_type_defaults: DataTypeDefaults,
}

impl DeferredEvaluator {
    pub fn new(dispatch_table: Arc<OperatorDispatchTable>, options: &RulesEngineOptions) -> Self {
        Self {
            dispatch_table,
            missing_condition_behavior: options.missing_condition_behavior,
            data_type_defaults: options.data_type_defaults.clone(),
        }
    }

    /// 评估并记录每个被访问节点的结果
    pub fn explain<K: ConditionType>(
        &self,
        root: &ConditionNode<K>,
        conditions: &[Condition<K>],
        options: &EvaluationOptions,
    ) -> Result<EvaluationTrace> {
        let mut steps = Vec::new();
        let matched = self.evaluate_node(root, conditions, options, &mut Some(&mut steps), "root")?;
        Ok(EvaluationTrace { matched, steps })
    }

    fn evaluate_node<K: ConditionType>(
        &self,
        node: &ConditionNode<K>,
        conditions: &[Condition<K>],
        options: &EvaluationOptions,
        steps: &mut Option<&mut Vec<String>>,
        path: &str,
    ) -> Result<bool> {
        match node {
            ConditionNode::Value(value_node) => {
                self.evaluate_value(value_node, conditions, options, steps, path)
            }
            ConditionNode::Composite(composite) => {
                self.evaluate_composite(composite, conditions, options, steps, path)
            }
        }
    }

    /// 评估叶子节点，每次调用对每个叶子只查找一次条件
    fn evaluate_value<K: ConditionType>(
        &self,
        node: &ValueConditionNode<K>,
        conditions: &[Condition<K>],
        options: &EvaluationOptions,
        steps: &mut Option<&mut Vec<String>>,
        path: &str,
    ) -> Result<bool> {
        let fact = conditions
            .iter()
            .find(|c| c.condition_type == node.condition_type);

        let (matched, note) = match fact {
            Some(condition) => (
                self.dispatch_table.dispatch(
                    node.data_type,
                    node.operator,
                    &condition.value,
                    &node.operand,
                )?,
                "",
            ),
            None => match (options.match_mode, self.missing_condition_behavior) {
                (MatchMode::Relaxed, _) => (true, " (条件缺失, 跳过)"),
                (MatchMode::Exact, MissingConditionBehavior::Discard) => {
                    (false, " (条件缺失)")
                }
                (MatchMode::Exact, MissingConditionBehavior::UseDataTypeDefault) => (
                    self.dispatch_table.dispatch(
                        node.data_type,
                        node.operator,
                        &self.data_type_defaults.value_for(node.data_type),
                        &node.operand,
                    )?,
                    " (条件缺失, 使用默认值)",
                ),
            },
        };

        if let Some(steps) = steps {
            steps.push(format!(
                "{}: {:?} {} {}{} => {}",
                path,
                node.condition_type,
                node.operator,
                node.operand,
                note,
                if matched { "MATCHED" } else { "NOT_MATCHED" }
            ));
        }

        Ok(matched)
    }

    /// 评估逻辑组节点（短路求值）
    fn evaluate_composite<K: ConditionType>(
        &self,
        node: &CompositeConditionNode<K>,
        conditions: &[Condition<K>],
        options: &EvaluationOptions,
        steps: &mut Option<&mut Vec<String>>,
        path: &str,
    ) -> Result<bool> {
        if node.children.is_empty() {
            return Err(RuleError::EmptyCompositeCondition {
                path: path.to_string(),
            });
        }

        // AND 在遇到 false 时停止，OR 在遇到 true 时停止
        let stop_on = match node.logical_operator {
            LogicalOperator::And => false,
            LogicalOperator::Or => true,
        };

        for (i, child) in node.children.iter().enumerate() {
            let child_path = format!("{}.children[{}]", path, i);
            let child_matched = self.evaluate_node(child, conditions, options, steps, &child_path)?;

            if child_matched == stop_on {
                trace!(path, operator = %node.logical_operator, child = i, "short-circuit");
                if let Some(steps) = steps {
                    steps.push(format!(
                        "{}: {} 短路 - 子节点 {} => {}",
                        path, node.logical_operator, i, child_matched
                    ));
                }
                return Ok(stop_on);
            }
        }

        Ok(!stop_on)
    }
}

impl Default for DeferredEvaluator {
    fn default() -> Self {
        Self::new(
            OperatorDispatchTable::shared(),
            &RulesEngineOptions::default(),
        )
    }
}

impl<K: ConditionType> ConditionsEvalEngine<K> for DeferredEvaluator {
    fn eval(
        &self,
        root: &ConditionNode<K>,
        conditions: &[Condition<K>],
        options: &EvaluationOptions,
    ) -> Result<bool> {
        self.evaluate_node(root, conditions, options, &mut None, "root")
    }
}

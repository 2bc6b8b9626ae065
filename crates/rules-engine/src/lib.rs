//! 内容规则引擎
//!
//! 按运行时条件从一组带时间窗口和优先级的规则中选出适用的内容，支持：
//! - 条件树（值条件与 AND/OR 逻辑组）及其 JSON 定义
//! - 按 `(数据类型, 操作符)` 分发的可扩展比较策略
//! - 短路求值执行
//! - 按优先级策略选出一条或多条规则
//! - 规则新增时的优先级编排

pub mod builder;
pub mod config;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod executor;
pub mod extractor;
pub mod models;
pub mod observability;
pub mod operators;
pub mod options;
pub mod store;
pub mod validation;

pub use builder::RulesEngineBuilder;
pub use engine::RulesEngine;
pub use error::{Result, RuleError};
pub use evaluator::{Multiplicity, OperatorDispatchTable};
pub use executor::{ConditionsEvalEngine, DeferredEvaluator, EvaluationTrace};
pub use extractor::{ConditionTypeExtractor, TreeConditionTypeExtractor};
pub use models::{
    CompositeConditionNode, Condition, ConditionNode, ConditionType, ContentContainer,
    ContentType, EvaluationOptions, Rule, RuleAddPriorityOption, RuleOperationResult,
    RulesFilterArgs, SearchArgs, ValidationFailure, ValueConditionNode,
};
pub use operators::{
    DataType, LogicalOperator, MatchMode, MissingConditionBehavior, Operator, PriorityCriteria,
};
pub use options::{DataTypeDefaults, RulesEngineOptions};
pub use store::{InMemoryRulesDataSource, RulesDataSource};
pub use validation::{RuleValidator, SearchArgsValidator, Validator};

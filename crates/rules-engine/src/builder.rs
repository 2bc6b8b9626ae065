//! 规则引擎构建器

use crate::engine::RulesEngine;
use crate::error::{Result, RuleError};
use crate::evaluator::OperatorDispatchTable;
use crate::executor::DeferredEvaluator;
use crate::extractor::TreeConditionTypeExtractor;
use crate::models::{ConditionType, ContentType, SearchArgs};
use crate::options::RulesEngineOptions;
use crate::store::RulesDataSource;
use crate::validation::{RuleValidator, SearchArgsValidator, Validator};
use std::sync::Arc;
use tracing::debug;

/// 组装规则引擎及其默认协作者
///
/// ```ignore
/// let engine = RulesEngineBuilder::new()
///     .with_data_source(InMemoryRulesDataSource::new())
///     .configure(|options| options.priority_criteria = PriorityCriteria::BottommostRuleWins)
///     .build()?;
/// ```
pub struct RulesEngineBuilder<C: ContentType, K: ConditionType> {
    data_source: Option<Arc<dyn RulesDataSource<C, K>>>,
    search_args_validator: Option<Arc<dyn Validator<SearchArgs<C>>>>,
    dispatch_table: Option<Arc<OperatorDispatchTable>>,
    options: RulesEngineOptions,
}

impl<C: ContentType, K: ConditionType> RulesEngineBuilder<C, K> {
    pub fn new() -> Self {
        Self {
            data_source: None,
            search_args_validator: None,
            dispatch_table: None,
            options: RulesEngineOptions::default(),
        }
    }

    /// 设置规则数据源（必填）
    #[must_use]
    pub fn with_data_source(mut self, data_source: impl RulesDataSource<C, K> + 'static) -> Self {
        self.data_source = Some(Arc::new(data_source));
        self
    }

    /// 使用共享的数据源实例
    #[must_use]
    pub fn with_shared_data_source(mut self, data_source: Arc<dyn RulesDataSource<C, K>>) -> Self {
        self.data_source = Some(data_source);
        self
    }

    #[must_use]
    pub fn with_search_args_validator(
        mut self,
        validator: impl Validator<SearchArgs<C>> + 'static,
    ) -> Self {
        self.search_args_validator = Some(Arc::new(validator));
        self
    }

    /// 使用自定义分发表，构建后不再修改
    #[must_use]
    pub fn with_dispatch_table(mut self, dispatch_table: OperatorDispatchTable) -> Self {
        self.dispatch_table = Some(Arc::new(dispatch_table));
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: RulesEngineOptions) -> Self {
        self.options = options;
        self
    }

    /// 在当前选项上就地修改
    #[must_use]
    pub fn configure(mut self, f: impl FnOnce(&mut RulesEngineOptions)) -> Self {
        f(&mut self.options);
        self
    }

    /// 校验选项并构建引擎
    pub fn build(self) -> Result<RulesEngine<C, K>> {
        let data_source = self.data_source.ok_or(RuleError::ArgumentNull {
            param: "rules_data_source",
        })?;
        self.options.ensure_valid()?;

        let dispatch_table = self
            .dispatch_table
            .unwrap_or_else(OperatorDispatchTable::shared);
        let search_args_validator = self
            .search_args_validator
            .unwrap_or_else(|| Arc::new(SearchArgsValidator::new()));

        debug!(options = ?self.options, "构建规则引擎");

        let evaluator = DeferredEvaluator::new(Arc::clone(&dispatch_table), &self.options);

        Ok(RulesEngine::new(
            Arc::new(evaluator),
            data_source,
            search_args_validator,
            self.options,
            Arc::new(TreeConditionTypeExtractor::new()),
        )
        .with_rule_validator(RuleValidator::new(dispatch_table)))
    }
}

impl<C: ContentType, K: ConditionType> Default for RulesEngineBuilder<C, K> {
    fn default() -> Self {
        Self::new()
    }
}

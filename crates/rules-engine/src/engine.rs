//! 规则选择引擎
//!
//! 从数据源获取在指定时刻生效的候选规则，逐条评估条件树，
//! 再按优先级策略排序或选出唯一的胜出规则。

use crate::error::{Result, RuleError};
use crate::evaluator::OperatorDispatchTable;
use crate::executor::ConditionsEvalEngine;
use crate::extractor::ConditionTypeExtractor;
use crate::models::{
    Condition, ConditionType, ContentType, EvaluationOptions, Rule, RuleAddPriorityOption,
    RuleOperationResult, RulesFilterArgs, SearchArgs,
};
use crate::operators::PriorityCriteria;
use crate::options::RulesEngineOptions;
use crate::store::RulesDataSource;
use crate::validation::{RuleValidator, Validator};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// 规则选择引擎
#[derive(Clone)]
pub struct RulesEngine<C: ContentType, K: ConditionType> {
    conditions_eval_engine: Arc<dyn ConditionsEvalEngine<K>>,
    rules_data_source: Arc<dyn RulesDataSource<C, K>>,
    search_args_validator: Arc<dyn Validator<SearchArgs<C>>>,
    condition_type_extractor: Arc<dyn ConditionTypeExtractor<C, K>>,
    rule_validator: RuleValidator,
    options: RulesEngineOptions,
}

impl<C: ContentType, K: ConditionType> RulesEngine<C, K> {
    pub fn new(
        conditions_eval_engine: Arc<dyn ConditionsEvalEngine<K>>,
        rules_data_source: Arc<dyn RulesDataSource<C, K>>,
        search_args_validator: Arc<dyn Validator<SearchArgs<C>>>,
        options: RulesEngineOptions,
        condition_type_extractor: Arc<dyn ConditionTypeExtractor<C, K>>,
    ) -> Self {
        Self {
            conditions_eval_engine,
            rules_data_source,
            search_args_validator,
            condition_type_extractor,
            rule_validator: RuleValidator::new(OperatorDispatchTable::shared()),
            options,
        }
    }

    /// 使用指定的规则校验器（需与评估使用同一张分发表）
    pub fn with_rule_validator(mut self, rule_validator: RuleValidator) -> Self {
        self.rule_validator = rule_validator;
        self
    }

    pub fn options(&self) -> &RulesEngineOptions {
        &self.options
    }

    fn default_evaluation_options(&self) -> EvaluationOptions {
        EvaluationOptions::new(self.options.match_mode)
    }

    /// 返回全部匹配的规则，按优先级策略排序
    pub async fn match_many(
        &self,
        content_type: &C,
        match_date: DateTime<Utc>,
        conditions: &[Condition<K>],
    ) -> Result<Vec<Rule<C, K>>> {
        let options = self.default_evaluation_options();
        self.match_many_with(content_type, match_date, conditions, &options)
            .await
    }

    /// 使用指定评估选项返回全部匹配的规则
    #[instrument(skip(self, conditions), fields(conditions = conditions.len()))]
    pub async fn match_many_with(
        &self,
        content_type: &C,
        match_date: DateTime<Utc>,
        conditions: &[Condition<K>],
        evaluation_options: &EvaluationOptions,
    ) -> Result<Vec<Rule<C, K>>> {
        let candidates = self
            .rules_data_source
            .get_rules(content_type, match_date, match_date)
            .await?;
        let candidate_count = candidates.len();

        let mut matched = Vec::with_capacity(candidate_count);
        for rule in candidates {
            if self.is_match(&rule, conditions, evaluation_options)? {
                matched.push(rule);
            }
        }

        self.sort_by_priority(&mut matched);

        debug!(candidates = candidate_count, matched = matched.len(), "规则匹配完成");
        Ok(matched)
    }

    /// 返回优先级策略下胜出的规则，没有匹配时返回 None
    pub async fn match_one(
        &self,
        content_type: &C,
        match_date: DateTime<Utc>,
        conditions: &[Condition<K>],
    ) -> Result<Option<Rule<C, K>>> {
        let options = self.default_evaluation_options();
        self.match_one_with(content_type, match_date, conditions, &options)
            .await
    }

    /// 使用指定评估选项返回胜出的规则
    pub async fn match_one_with(
        &self,
        content_type: &C,
        match_date: DateTime<Utc>,
        conditions: &[Condition<K>],
        evaluation_options: &EvaluationOptions,
    ) -> Result<Option<Rule<C, K>>> {
        let matched = self
            .match_many_with(content_type, match_date, conditions, evaluation_options)
            .await?;

        Ok(matched.into_iter().next())
    }

    /// 获取时间窗口内规则引用的全部条件类型
    #[instrument(skip(self))]
    pub async fn get_unique_condition_types(
        &self,
        content_type: &C,
        date_begin: DateTime<Utc>,
        date_end: DateTime<Utc>,
    ) -> Result<HashSet<K>> {
        let rules = self
            .rules_data_source
            .get_rules(content_type, date_begin, date_end)
            .await?;

        Ok(self.condition_type_extractor.get_condition_types(&rules))
    }

    /// 按搜索参数直接查询规则，不做条件评估
    #[instrument(skip(self))]
    pub async fn search(&self, search_args: Option<&SearchArgs<C>>) -> Result<Vec<Rule<C, K>>> {
        let search_args = search_args.ok_or(RuleError::ArgumentNull {
            param: "search_args",
        })?;

        let failures = self.search_args_validator.validate(search_args).await;
        if !failures.is_empty() {
            warn!(failures = failures.len(), "搜索参数无效");
            return Err(RuleError::InvalidSearchArguments {
                param: "search_args",
                failures,
            });
        }

        self.rules_data_source
            .get_rules(
                &search_args.content_type,
                search_args.date_begin,
                search_args.date_end,
            )
            .await
    }

    /// 新增规则并按放置方式分配优先级
    ///
    /// 校验失败通过 [`RuleOperationResult`] 返回；只有数据源故障会以错误返回。
    #[instrument(skip(self, rule), fields(rule_name = %rule.name, content_type = ?rule.content_type()))]
    pub async fn add_rule(
        &self,
        mut rule: Rule<C, K>,
        placement: RuleAddPriorityOption,
    ) -> Result<RuleOperationResult> {
        let mut errors = self.rule_validator.validate(&rule);
        if placement == RuleAddPriorityOption::ByPriorityNumber(0) {
            errors.push("优先级必须大于等于 1".to_string());
        }
        if !errors.is_empty() {
            warn!(errors = ?errors, "规则校验失败");
            return Ok(RuleOperationResult::error(errors));
        }

        let existing = self
            .rules_data_source
            .get_rules_by(&RulesFilterArgs::by_content_type(rule.content_type().clone()))
            .await?;

        if existing.iter().any(|r| r.name == rule.name) {
            let error = format!("已存在同名规则: '{}'", rule.name);
            warn!("{}", error);
            return Ok(RuleOperationResult::error(vec![error]));
        }

        let max_priority = existing.iter().map(|r| r.priority).max().unwrap_or(0);
        // 任何放置方式都会让最低优先级加一（追加到末尾或整体下移）
        let Some(next_priority) = max_priority.checked_add(1) else {
            let error = format!("优先级已达上限 {}，无法再新增规则", max_priority);
            warn!("{}", error);
            return Ok(RuleOperationResult::error(vec![error]));
        };
        let priority = match placement {
            RuleAddPriorityOption::AtTop => 1,
            RuleAddPriorityOption::AtBottom => next_priority,
            RuleAddPriorityOption::ByPriorityNumber(n) => n.min(next_priority),
        };

        let shifted: Vec<Rule<C, K>> = existing
            .into_iter()
            .filter(|r| r.priority >= priority)
            .map(|mut r| {
                r.priority += 1;
                r
            })
            .collect();

        if !shifted.is_empty() {
            debug!(shifted = shifted.len(), "调整已有规则优先级");
            self.rules_data_source.update_rules(shifted).await?;
        }

        rule.priority = priority;
        self.rules_data_source.add_rule(rule).await?;

        info!(priority, "规则已新增");
        Ok(RuleOperationResult::success())
    }

    /// 无条件的规则恒成立
    fn is_match(
        &self,
        rule: &Rule<C, K>,
        conditions: &[Condition<K>],
        evaluation_options: &EvaluationOptions,
    ) -> Result<bool> {
        let Some(root) = &rule.root_condition else {
            return Ok(true);
        };

        let matched = self
            .conditions_eval_engine
            .eval(root, conditions, evaluation_options)?;
        debug!(rule = %rule.name, matched, "规则已评估");

        Ok(matched)
    }

    /// 稳定排序，优先级相同的规则保持数据源顺序
    fn sort_by_priority(&self, rules: &mut [Rule<C, K>]) {
        match self.options.priority_criteria {
            PriorityCriteria::TopmostRuleWins => rules.sort_by_key(|r| r.priority),
            PriorityCriteria::BottommostRuleWins => {
                rules.sort_by(|a, b| b.priority.cmp(&a.priority))
            }
        }
    }
}

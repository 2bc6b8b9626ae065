//! 规则数据源
//!
//! 定义引擎依赖的持久化接口，并提供基于 DashMap 的内存实现。

use crate::error::Result;
use crate::models::{ConditionType, ContentType, Rule, RulesFilterArgs};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, instrument};

/// 规则数据源接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RulesDataSource<C: ContentType, K: ConditionType>: Send + Sync {
    /// 获取内容类型下生效区间与 `[date_begin, date_end]` 重叠的规则，保持数据源顺序
    async fn get_rules(
        &self,
        content_type: &C,
        date_begin: DateTime<Utc>,
        date_end: DateTime<Utc>,
    ) -> Result<Vec<Rule<C, K>>>;

    /// 按属性过滤规则
    async fn get_rules_by(&self, filter: &RulesFilterArgs<C>) -> Result<Vec<Rule<C, K>>>;

    /// 新增规则
    async fn add_rule(&self, rule: Rule<C, K>) -> Result<()>;

    /// 按名称更新规则（用于优先级调整）
    async fn update_rules(&self, rules: Vec<Rule<C, K>>) -> Result<()>;
}

/// 内存规则数据源
///
/// 按内容类型分片存储；读取时先克隆再返回，不会在 `.await` 期间持有分片锁。
#[derive(Clone)]
pub struct InMemoryRulesDataSource<C: ContentType, K: ConditionType> {
    rules: Arc<DashMap<C, Vec<Rule<C, K>>>>,
}

impl<C: ContentType, K: ConditionType> InMemoryRulesDataSource<C, K> {
    pub fn new() -> Self {
        Self {
            rules: Arc::new(DashMap::new()),
        }
    }

    /// 直接载入规则（不做校验和优先级调整）
    pub fn with_rules(rules: impl IntoIterator<Item = Rule<C, K>>) -> Self {
        let source = Self::new();
        for rule in rules {
            source
                .rules
                .entry(rule.content_type().clone())
                .or_default()
                .push(rule);
        }
        source
    }

    /// 当前存储的规则总数
    pub fn len(&self) -> usize {
        self.rules.iter().map(|entry| entry.value().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<C: ContentType, K: ConditionType> Default for InMemoryRulesDataSource<C, K> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<C: ContentType, K: ConditionType> RulesDataSource<C, K> for InMemoryRulesDataSource<C, K> {
    #[instrument(skip(self))]
    async fn get_rules(
        &self,
        content_type: &C,
        date_begin: DateTime<Utc>,
        date_end: DateTime<Utc>,
    ) -> Result<Vec<Rule<C, K>>> {
        let rules: Vec<Rule<C, K>> = self
            .rules
            .get(content_type)
            .map(|entry| {
                entry
                    .iter()
                    .filter(|r| r.overlaps(date_begin, date_end))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        debug!(count = rules.len(), "规则已读取");
        Ok(rules)
    }

    async fn get_rules_by(&self, filter: &RulesFilterArgs<C>) -> Result<Vec<Rule<C, K>>> {
        let rules = match &filter.content_type {
            Some(content_type) => self
                .rules
                .get(content_type)
                .map(|entry| entry.iter().filter(|r| filter.matches(r)).cloned().collect())
                .unwrap_or_default(),
            None => self
                .rules
                .iter()
                .flat_map(|entry| {
                    entry
                        .value()
                        .iter()
                        .filter(|r| filter.matches(r))
                        .cloned()
                        .collect::<Vec<_>>()
                })
                .collect(),
        };

        Ok(rules)
    }

    async fn add_rule(&self, rule: Rule<C, K>) -> Result<()> {
        self.rules
            .entry(rule.content_type().clone())
            .or_default()
            .push(rule);
        Ok(())
    }

    async fn update_rules(&self, rules: Vec<Rule<C, K>>) -> Result<()> {
        for rule in rules {
            if let Some(mut entry) = self.rules.get_mut(rule.content_type()) {
                if let Some(existing) = entry.iter_mut().find(|r| r.name == rule.name) {
                    *existing = rule;
                }
            }
        }
        Ok(())
    }
}

//! 条件类型提取
//!
//! 收集规则条件树中引用的全部条件类型，只访问叶子节点，不做求值。

use crate::models::{ConditionNode, ConditionType, ContentType, Rule};
use std::collections::HashSet;

/// 条件类型提取接口
#[cfg_attr(test, mockall::automock)]
pub trait ConditionTypeExtractor<C: ContentType, K: ConditionType>: Send + Sync {
    fn get_condition_types(&self, rules: &[Rule<C, K>]) -> HashSet<K>;
}

/// 递归遍历条件树的默认提取器
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeConditionTypeExtractor;

impl TreeConditionTypeExtractor {
    pub fn new() -> Self {
        Self
    }

    /// 递归收集条件类型
    fn collect_condition_types<K: ConditionType>(node: &ConditionNode<K>, types: &mut HashSet<K>) {
        match node {
            ConditionNode::Value(value_node) => {
                if !types.contains(&value_node.condition_type) {
                    types.insert(value_node.condition_type.clone());
                }
            }
            ConditionNode::Composite(composite) => {
                for child in &composite.children {
                    Self::collect_condition_types(child, types);
                }
            }
        }
    }
}

impl<C: ContentType, K: ConditionType> ConditionTypeExtractor<C, K> for TreeConditionTypeExtractor {
    fn get_condition_types(&self, rules: &[Rule<C, K>]) -> HashSet<K> {
        let mut types = HashSet::new();

        for root in rules.iter().filter_map(|r| r.root_condition.as_ref()) {
            Self::collect_condition_types(root, &mut types);
        }

        types
    }
}

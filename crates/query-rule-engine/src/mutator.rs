//! 规则树变更
//!
//! 所有操作都通过 `&mut RuleSet` 原地修改传入的规则组。
//! 需要隔离（撤销/重做快照）的调用方先 `clone()` 一份，克隆保留节点标识，
//! 便于与当前树比较。

use crate::models::{Field, NodeId, Rule, RuleNode, RuleSet};
use crate::operators::{Condition, Operator};

impl RuleSet {
    /// 追加一条新规则并返回它
    ///
    /// 新规则使用字段的默认操作符（缺省为 `=`）、默认值和 entity；
    /// 未指定字段时字段名为空，需要在校验前补上。
    pub fn add_rule(&mut self, field: Option<&Field>) -> &mut Rule {
        let rule = match field {
            Some(field) => {
                let mut rule = Rule::with_optional_value(
                    field.name.clone(),
                    field.default_operator.clone().unwrap_or_default(),
                    field.default_value.clone(),
                );
                rule.entity = field.entity.clone();
                rule
            }
            None => Rule::without_value("", Operator::Eq),
        };

        self.rules.push(RuleNode::Rule(rule));
        match self.rules.last_mut() {
            Some(RuleNode::Rule(rule)) => rule,
            _ => unreachable!("刚追加的节点必定是规则"),
        }
    }

    /// 追加一个空的 `and` 规则组并返回它
    pub fn add_rule_set(&mut self) -> &mut RuleSet {
        self.rules.push(RuleNode::RuleSet(RuleSet::empty(Condition::And)));
        match self.rules.last_mut() {
            Some(RuleNode::RuleSet(set)) => set,
            _ => unreachable!("刚追加的节点必定是规则组"),
        }
    }

    /// 从直接子节点中移除规则
    ///
    /// 找不到或标识指向规则组时返回 `None`，不视为错误。
    pub fn remove_rule(&mut self, id: NodeId) -> Option<Rule> {
        let index = self
            .rules
            .iter()
            .position(|node| matches!(node, RuleNode::Rule(rule) if rule.id() == id))?;

        match self.rules.remove(index) {
            RuleNode::Rule(rule) => Some(rule),
            RuleNode::RuleSet(_) => None,
        }
    }

    /// 从直接子节点中移除规则组
    pub fn remove_rule_set(&mut self, id: NodeId) -> Option<RuleSet> {
        let index = self
            .rules
            .iter()
            .position(|node| matches!(node, RuleNode::RuleSet(set) if set.id() == id))?;

        match self.rules.remove(index) {
            RuleNode::RuleSet(set) => Some(set),
            RuleNode::Rule(_) => None,
        }
    }

    /// 叶子规则总数（包含嵌套规则组）
    pub fn count_rules(&self) -> usize {
        self.rules
            .iter()
            .map(|node| match node {
                RuleNode::Rule(_) => 1,
                RuleNode::RuleSet(set) => set.count_rules(),
            })
            .sum()
    }

    /// 任意深度都没有叶子规则
    pub fn is_empty_tree(&self) -> bool {
        self.count_rules() == 0
    }

    /// 深度优先查找规则组（包括自身）
    pub fn find_rule_set_mut(&mut self, id: NodeId) -> Option<&mut RuleSet> {
        if self.id() == id {
            return Some(self);
        }

        self.rules.iter_mut().find_map(|node| match node {
            RuleNode::RuleSet(set) => set.find_rule_set_mut(id),
            RuleNode::Rule(_) => None,
        })
    }

    /// 深度优先查找规则
    pub fn find_rule_mut(&mut self, id: NodeId) -> Option<&mut Rule> {
        self.rules.iter_mut().find_map(|node| match node {
            RuleNode::Rule(rule) if rule.id() == id => Some(rule),
            RuleNode::Rule(_) => None,
            RuleNode::RuleSet(set) => set.find_rule_mut(id),
        })
    }
}

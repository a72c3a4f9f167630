//! 规则引擎领域模型
//!
//! 字段定义（`Field`）描述可查询的数据列，规则树由 `RuleSet`（逻辑组）
//! 和 `Rule`（叶子条件）组成，二者通过 `RuleNode` 显式区分。

use crate::error::Result;
use crate::operators::{Condition, Operator};
use crate::value::RuleValue;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// 字段数据类型
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    String,
    Number,
    Date,
    Boolean,
    /// 单选，必须配合 options 使用
    Category,
    /// 多选，必须配合 options 使用
    Multiselect,
    /// 未识别的类型，解析时保留原文
    Other(String),
}

impl FieldType {
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }

    /// 该类型是否要求定义 options
    pub fn requires_options(&self) -> bool {
        matches!(self, Self::Category | Self::Multiselect)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Date => "date",
            Self::Boolean => "boolean",
            Self::Category => "category",
            Self::Multiselect => "multiselect",
            Self::Other(raw) => raw,
        };
        write!(f, "{}", s)
    }
}

impl From<&str> for FieldType {
    fn from(raw: &str) -> Self {
        match raw {
            "string" => Self::String,
            "number" => Self::Number,
            "date" => Self::Date,
            "boolean" => Self::Boolean,
            "category" => Self::Category,
            "multiselect" => Self::Multiselect,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for FieldType {
    fn from(raw: String) -> Self {
        Self::from(raw.as_str())
    }
}

impl From<FieldType> for String {
    fn from(field_type: FieldType) -> Self {
        field_type.to_string()
    }
}

/// 枚举字段的选项
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldOption {
    /// 显示标签
    pub name: String,
    /// 比较时使用的实际值
    pub value: RuleValue,
}

impl FieldOption {
    pub fn new(name: impl Into<String>, value: impl Into<RuleValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// 可查询字段定义
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    /// 字段唯一标识
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<FieldOption>,
    /// 覆盖按类型推导的默认操作符集合
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub operators: Vec<Operator>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<RuleValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_operator: Option<Operator>,
    #[serde(default)]
    pub nullable: bool,
    /// 数据来源提示，原样透传到规则
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
}

impl Field {
    pub fn new(name: impl Into<String>, field_type: impl Into<FieldType>) -> Self {
        Self {
            name: name.into(),
            field_type: field_type.into(),
            label: None,
            options: Vec::new(),
            operators: Vec::new(),
            default_value: None,
            default_operator: None,
            nullable: false,
            entity: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_options(mut self, options: Vec<FieldOption>) -> Self {
        self.options = options;
        self
    }

    pub fn with_operators(mut self, operators: Vec<Operator>) -> Self {
        self.operators = operators;
        self
    }

    pub fn with_default_value(mut self, value: impl Into<RuleValue>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn with_default_operator(mut self, operator: impl Into<Operator>) -> Self {
        self.default_operator = Some(operator.into());
        self
    }

    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// 显示名称，未配置 label 时回退到字段名
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }
}

/// 规则树节点标识
///
/// 仅存在于内存中，不参与序列化和相等比较。树变更时按标识定位节点。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(Uuid);

impl NodeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 叶子条件：`field OP value`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    #[serde(skip)]
    id: NodeId,
    pub field: String,
    pub operator: Operator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<RuleValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
}

impl Rule {
    pub fn new(
        field: impl Into<String>,
        operator: impl Into<Operator>,
        value: impl Into<RuleValue>,
    ) -> Self {
        Self::with_optional_value(field, operator, Some(value.into()))
    }

    /// 创建不带比较值的规则（如 `is null`）
    pub fn without_value(field: impl Into<String>, operator: impl Into<Operator>) -> Self {
        Self::with_optional_value(field, operator, None)
    }

    pub fn with_optional_value(
        field: impl Into<String>,
        operator: impl Into<Operator>,
        value: Option<RuleValue>,
    ) -> Self {
        Self {
            id: NodeId::new(),
            field: field.into(),
            operator: operator.into(),
            value,
            entity: None,
        }
    }

    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    /// 值是否缺失（未设置或为空字符串）
    pub fn is_value_missing(&self) -> bool {
        self.value.as_ref().is_none_or(RuleValue::is_blank)
    }
}

impl PartialEq for Rule {
    fn eq(&self, other: &Self) -> bool {
        self.field == other.field
            && self.operator == other.operator
            && self.value == other.value
            && self.entity == other.entity
    }
}

/// 逻辑组节点
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleSet {
    #[serde(skip)]
    id: NodeId,
    pub condition: Condition,
    pub rules: Vec<RuleNode>,
}

impl RuleSet {
    pub fn new(condition: Condition, rules: Vec<RuleNode>) -> Self {
        Self {
            id: NodeId::new(),
            condition,
            rules,
        }
    }

    pub fn and(rules: Vec<RuleNode>) -> Self {
        Self::new(Condition::And, rules)
    }

    pub fn or(rules: Vec<RuleNode>) -> Self {
        Self::new(Condition::Or, rules)
    }

    /// 创建空规则组
    pub fn empty(condition: Condition) -> Self {
        Self::new(condition, Vec::new())
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    /// 从 JSON 字符串解析可编辑规则树
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::empty(Condition::And)
    }
}

impl PartialEq for RuleSet {
    fn eq(&self, other: &Self) -> bool {
        self.condition == other.condition && self.rules == other.rules
    }
}

/// 规则树节点（条件或逻辑组）
///
/// 序列化时不带类型标签：含 `condition` + `rules` 的对象是逻辑组，
/// 含 `field` + `operator` 的对象是条件。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleNode {
    RuleSet(RuleSet),
    Rule(Rule),
}

impl RuleNode {
    pub fn id(&self) -> NodeId {
        match self {
            Self::Rule(rule) => rule.id(),
            Self::RuleSet(set) => set.id(),
        }
    }

    pub fn as_rule(&self) -> Option<&Rule> {
        match self {
            Self::Rule(rule) => Some(rule),
            Self::RuleSet(_) => None,
        }
    }

    pub fn as_rule_set(&self) -> Option<&RuleSet> {
        match self {
            Self::RuleSet(set) => Some(set),
            Self::Rule(_) => None,
        }
    }
}

impl From<Rule> for RuleNode {
    fn from(rule: Rule) -> Self {
        Self::Rule(rule)
    }
}

impl From<RuleSet> for RuleNode {
    fn from(set: RuleSet) -> Self {
        Self::RuleSet(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_deserialization() {
        let json = r#"
        {
            "name": "sector",
            "type": "category",
            "label": "Sector",
            "options": [{"name": "Technology", "value": "TECH"}],
            "operators": ["=", "!=", "in", "not in"],
            "defaultOperator": "=",
            "defaultValue": "TECH"
        }
        "#;

        let field: Field = serde_json::from_str(json).unwrap();
        assert_eq!(field.name, "sector");
        assert_eq!(field.field_type, FieldType::Category);
        assert_eq!(field.options.len(), 1);
        assert_eq!(field.operators[3], Operator::NotIn);
        assert_eq!(field.default_operator, Some(Operator::Eq));
        assert_eq!(field.default_value, Some(RuleValue::from("TECH")));
        assert!(!field.nullable);
    }

    #[test]
    fn test_unknown_field_type_preserved() {
        let field: Field = serde_json::from_value(json!({"name": "x", "type": "geo"})).unwrap();
        assert_eq!(field.field_type, FieldType::Other("geo".into()));
        assert!(!field.field_type.is_known());
        assert_eq!(field.display_label(), "x");
    }

    #[test]
    fn test_rule_set_deserialization() {
        let json = r#"
        {
            "condition": "and",
            "rules": [
                {"field": "marketCap", "operator": ">", "value": 1000000000},
                {
                    "condition": "or",
                    "rules": [
                        {"field": "sector", "operator": "in", "value": ["TECH", "HEALTH"]},
                        {"field": "pe", "operator": "between", "value": [5, 20]}
                    ]
                }
            ]
        }
        "#;

        let tree = RuleSet::from_json(json).unwrap();
        assert_eq!(tree.condition, Condition::And);
        assert_eq!(tree.rules.len(), 2);

        let rule = tree.rules[0].as_rule().unwrap();
        assert_eq!(rule.operator, Operator::Gt);
        assert_eq!(rule.value, Some(RuleValue::from(1_000_000_000i64)));

        let nested = tree.rules[1].as_rule_set().unwrap();
        assert_eq!(nested.condition, Condition::Or);
        assert_eq!(nested.rules.len(), 2);
    }

    #[test]
    fn test_null_value_is_absent() {
        let rule: Rule =
            serde_json::from_value(json!({"field": "pe", "operator": "=", "value": null}))
                .unwrap();
        assert!(rule.value.is_none());
        assert!(rule.is_value_missing());

        let blank = Rule::new("symbol", Operator::Eq, "");
        assert!(blank.is_value_missing());
    }

    #[test]
    fn test_serialization_has_no_discriminant() {
        let tree = RuleSet::and(vec![Rule::new("pe", Operator::Lt, 20).into()]);
        let value = serde_json::to_value(&tree).unwrap();
        assert_eq!(
            value,
            json!({"condition": "and", "rules": [{"field": "pe", "operator": "<", "value": 20}]})
        );
    }

    #[test]
    fn test_equality_ignores_node_ids() {
        let a = Rule::new("pe", Operator::Lt, 20);
        let b = Rule::new("pe", Operator::Lt, 20);
        assert_ne!(a.id(), b.id());
        assert_eq!(a, b);
    }

    #[test]
    fn test_deserialized_nodes_get_distinct_ids() {
        let tree = RuleSet::from_json(
            r#"{"condition": "and", "rules": [
                {"field": "pe", "operator": "<", "value": 20},
                {"field": "pe", "operator": "<", "value": 20}
            ]}"#,
        )
        .unwrap();
        assert_ne!(tree.rules[0].id(), tree.rules[1].id());
    }
}

//! 规则树校验器
//!
//! 结合字段注册表递归校验规则树，一次性收集所有问题。
//! 错误按深度优先、从左到右的顺序累积，相同输入总是得到相同的错误列表。

use crate::models::{Field, FieldType, Rule, RuleNode, RuleSet};
use crate::operators::Operator;
use crate::registry::FieldRegistry;
use crate::resolver;
use crate::value::RuleValue;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, instrument};

/// 错误分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    /// 字段无法解析
    Field,
    /// 操作符不适用于字段
    Operator,
    /// 值缺失或形状不符
    Value,
    /// 树结构无效
    Structure,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Field => "field",
            Self::Operator => "operator",
            Self::Value => "value",
            Self::Structure => "structure",
        };
        write!(f, "{}", s)
    }
}

/// 单条校验错误
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    #[serde(rename = "type")]
    pub kind: ErrorKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub message: String,
    /// 节点位置，如 `.rules[1].rules[0]`；根节点为空
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl ValidationError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            field: None,
            message: message.into(),
            path: None,
        }
    }

    pub fn structure(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Structure, message)
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// 设置节点位置，空路径表示根节点
    pub fn at(mut self, path: &str) -> Self {
        self.path = (!path.is_empty()).then(|| path.to_string());
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(f, "[{}] {} ({})", self.kind, self.message, path),
            None => write!(f, "[{}] {}", self.kind, self.message),
        }
    }
}

/// 校验结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    pub fn from_errors(errors: Vec<ValidationError>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }
}

/// 校验规则树
///
/// `allow_empty` 为 false 时，任何没有子节点的规则组都会产生一条 `structure` 错误。
/// 空规则组不再向下遍历。
#[instrument(skip(tree, registry), fields(field_count = registry.len()))]
pub fn validate(tree: &RuleSet, registry: &FieldRegistry, allow_empty: bool) -> ValidationResult {
    let mut errors = Vec::new();
    validate_rule_set(tree, registry, allow_empty, "", &mut errors);

    debug!(error_count = errors.len(), "规则树校验完成");
    ValidationResult::from_errors(errors)
}

fn validate_rule_set(
    set: &RuleSet,
    registry: &FieldRegistry,
    allow_empty: bool,
    path: &str,
    errors: &mut Vec<ValidationError>,
) {
    if set.rules.is_empty() {
        if !allow_empty {
            errors.push(ValidationError::structure("Ruleset cannot be empty").at(path));
        }
        return;
    }

    for (i, node) in set.rules.iter().enumerate() {
        let child_path = format!("{}.rules[{}]", path, i);
        match node {
            RuleNode::RuleSet(nested) => {
                validate_rule_set(nested, registry, allow_empty, &child_path, errors)
            }
            RuleNode::Rule(rule) => validate_rule(rule, registry, &child_path, errors),
        }
    }
}

fn validate_rule(
    rule: &Rule,
    registry: &FieldRegistry,
    path: &str,
    errors: &mut Vec<ValidationError>,
) {
    // 字段不存在时跳过后续检查，避免连带报错
    let Some(field) = registry.get(&rule.field) else {
        errors.push(
            ValidationError::new(
                ErrorKind::Field,
                format!("Field '{}' is not valid", rule.field),
            )
            .with_field(&rule.field)
            .at(path),
        );
        return;
    };

    if !resolver::get_operators(field).contains(&rule.operator) {
        errors.push(
            ValidationError::new(
                ErrorKind::Operator,
                format!(
                    "Operator '{}' is not valid for field '{}'",
                    rule.operator, rule.field
                ),
            )
            .with_field(&rule.field)
            .at(path),
        );
    }

    if !rule.operator.is_no_value() && rule.is_value_missing() {
        errors.push(
            ValidationError::new(
                ErrorKind::Value,
                format!("Value is required for operator '{}'", rule.operator),
            )
            .with_field(&rule.field)
            .at(path),
        );
    }

    if let Some(value) = rule.value.as_ref().filter(|v| !v.is_blank()) {
        for message in check_value(value, field, &rule.operator) {
            errors.push(
                ValidationError::new(ErrorKind::Value, message)
                    .with_field(&field.name)
                    .at(path),
            );
        }
    }
}

/// 按操作符约定检查值的形状，返回错误消息
fn check_value(value: &RuleValue, field: &Field, operator: &Operator) -> Vec<String> {
    match operator {
        Operator::Between => match value.as_list() {
            Some(items) if items.len() == 2 => items
                .iter()
                .filter_map(|item| check_single_value(item, field))
                .collect(),
            _ => vec!["Between operator requires two values".to_string()],
        },
        Operator::In | Operator::NotIn => match value.as_list() {
            Some(items) => items
                .iter()
                .filter_map(|item| check_single_value(item, field))
                .collect(),
            None => vec![format!("{} operator requires an array of values", operator)],
        },
        _ => check_single_value(value, field).into_iter().collect(),
    }
}

/// 按字段类型检查单个值
fn check_single_value(value: &RuleValue, field: &Field) -> Option<String> {
    match field.field_type {
        FieldType::Number if value.as_f64().is_none() => Some(format!(
            "Value must be a number for field '{}'",
            field.name
        )),
        FieldType::Boolean if !value.is_boolean_like() => Some(format!(
            "Value must be a boolean for field '{}'",
            field.name
        )),
        FieldType::Date if value.as_datetime().is_none() => Some(format!(
            "Value must be a valid date for field '{}'",
            field.name
        )),
        FieldType::Category
            if !field.options.is_empty()
                && !field.options.iter().any(|o| option_matches(&o.value, value)) =>
        {
            let valid: Vec<String> = field.options.iter().map(|o| o.value.to_string()).collect();
            Some(format!("Value must be one of: {}", valid.join(", ")))
        }
        _ => None,
    }
}

/// 选项值比较，数值按大小比较（`5` 与 `5.0` 相等）
fn option_matches(option: &RuleValue, value: &RuleValue) -> bool {
    match (option, value) {
        (RuleValue::Number(a), RuleValue::Number(b)) => a.as_f64() == b.as_f64(),
        _ => option == value,
    }
}

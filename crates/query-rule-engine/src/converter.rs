//! 查询格式转换
//!
//! 在可编辑规则树（`RuleSet`）与后端接口使用的筛选条件（`ScreenerCriteria`）之间双向转换。
//!
//! # 转换约定
//!
//! - 转换前先做结构检查，任何位置出错都整体失败，不返回部分结果
//! - 空规则树转换为 `None`，表示“没有条件”而不是“空条件”
//! - 缺失的筛选条件转换回 `{and, []}`，调用方总能拿到可渲染的树
//! - 值按操作符归一化：`in`/`not in` 的标量包装为数组，`between` 补齐或截断为两个元素
//! - 内部故障折叠为一条 `structure` 错误，不向调用方传播

use crate::error::{Result, RuleError};
use crate::models::{Rule, RuleNode, RuleSet};
use crate::operators::{Condition, Operator};
use crate::validator::{ErrorKind, ValidationError};
use crate::value::RuleValue;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

/// 默认允许的规则组嵌套深度
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// 转换结果，失败时携带完整的错误列表
pub type ConversionResult<T> = std::result::Result<T, Vec<ValidationError>>;

/// 后端接口的筛选条件组
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenerCriteria {
    pub condition: Condition,
    pub rules: Vec<ScreenerNode>,
}

/// 后端接口的单条筛选规则
///
/// 缺少 `field` / `operator` 键的规则仍能解析，由结构检查按位置报告。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenerRule {
    #[serde(default)]
    pub field: String,
    #[serde(default = "missing_operator")]
    pub operator: Operator,
    #[serde(default)]
    pub value: Option<RuleValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
}

fn missing_operator() -> Operator {
    Operator::Unknown(String::new())
}

/// 筛选条件节点，按字段结构区分，不带类型标签
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScreenerNode {
    Criteria(ScreenerCriteria),
    Rule(ScreenerRule),
}

/// 格式转换器
#[derive(Debug, Clone, Copy)]
pub struct QueryConverter {
    max_depth: usize,
}

impl Default for QueryConverter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}

impl QueryConverter {
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// 规则树转换为筛选条件
    ///
    /// 成功时 `None` 表示空规则树。
    #[instrument(skip(self, tree), fields(max_depth = self.max_depth))]
    pub fn to_screener_criteria(&self, tree: &RuleSet) -> ConversionResult<Option<ScreenerCriteria>> {
        let errors = validate_api_compatibility(tree);
        if !errors.is_empty() {
            warn!(error_count = errors.len(), "规则树结构检查未通过，拒绝转换");
            return Err(errors);
        }

        if tree.rules.is_empty() {
            debug!("空规则树，转换为空条件");
            return Ok(None);
        }

        self.criteria_from_set(tree, 0, "")
            .map(Some)
            .map_err(conversion_failed)
    }

    /// 筛选条件转换为规则树
    ///
    /// 缺失的条件得到空的 `and` 规则组，所有节点都分配新的标识。
    #[instrument(skip(self, criteria), fields(max_depth = self.max_depth))]
    pub fn from_screener_criteria(
        &self,
        criteria: Option<&ScreenerCriteria>,
    ) -> ConversionResult<RuleSet> {
        let Some(criteria) = criteria else {
            return Ok(RuleSet::default());
        };

        let mut errors = Vec::new();
        check_criteria(criteria, "", &mut errors);
        if !errors.is_empty() {
            warn!(error_count = errors.len(), "筛选条件结构检查未通过，拒绝转换");
            return Err(errors);
        }

        self.set_from_criteria(criteria, 0, "")
            .map_err(conversion_failed)
    }

    fn criteria_from_set(&self, set: &RuleSet, depth: usize, path: &str) -> Result<ScreenerCriteria> {
        self.check_depth(depth, path)?;

        let mut rules = Vec::with_capacity(set.rules.len());
        for (i, node) in set.rules.iter().enumerate() {
            let converted = match node {
                RuleNode::Rule(rule) => ScreenerNode::Rule(ScreenerRule {
                    field: rule.field.clone(),
                    operator: rule.operator.clone(),
                    value: normalize_value(rule.value.as_ref(), &rule.operator),
                    entity: rule.entity.clone(),
                }),
                RuleNode::RuleSet(nested) => ScreenerNode::Criteria(self.criteria_from_set(
                    nested,
                    depth + 1,
                    &format!("{}.rules[{}]", path, i),
                )?),
            };
            rules.push(converted);
        }

        Ok(ScreenerCriteria {
            condition: set.condition.clone(),
            rules,
        })
    }

    fn set_from_criteria(
        &self,
        criteria: &ScreenerCriteria,
        depth: usize,
        path: &str,
    ) -> Result<RuleSet> {
        self.check_depth(depth, path)?;

        let mut rules = Vec::with_capacity(criteria.rules.len());
        for (i, node) in criteria.rules.iter().enumerate() {
            let converted = match node {
                ScreenerNode::Rule(rule) => {
                    let mut converted = Rule::with_optional_value(
                        rule.field.clone(),
                        rule.operator.clone(),
                        rule.value.clone(),
                    );
                    converted.entity = rule.entity.clone();
                    RuleNode::Rule(converted)
                }
                ScreenerNode::Criteria(nested) => RuleNode::RuleSet(self.set_from_criteria(
                    nested,
                    depth + 1,
                    &format!("{}.rules[{}]", path, i),
                )?),
            };
            rules.push(converted);
        }

        Ok(RuleSet::new(criteria.condition.clone(), rules))
    }

    fn check_depth(&self, depth: usize, path: &str) -> Result<()> {
        if depth > self.max_depth {
            return Err(RuleError::NestingTooDeep {
                max_depth: self.max_depth,
                path: path.to_string(),
            });
        }
        Ok(())
    }
}

/// 使用默认嵌套深度转换规则树
pub fn to_screener_criteria(tree: &RuleSet) -> ConversionResult<Option<ScreenerCriteria>> {
    QueryConverter::default().to_screener_criteria(tree)
}

/// 使用默认嵌套深度转换筛选条件
pub fn from_screener_criteria(criteria: Option<&ScreenerCriteria>) -> ConversionResult<RuleSet> {
    QueryConverter::default().from_screener_criteria(criteria)
}

/// 提交前的结构检查，不依赖字段注册表，也不执行转换
///
/// 检查条件是否为 `and`/`or`、字段名和操作符是否非空、需要值的操作符是否带值。
/// 空字符串值视为已提供。
pub fn validate_api_compatibility(tree: &RuleSet) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    check_rule_set(tree, "", &mut errors);
    errors
}

/// 解析后端返回的筛选条件 JSON
///
/// 空字符串和 `null` 表示没有条件；解析失败折叠为一条 `structure` 错误。
pub fn criteria_from_json(raw: &str) -> ConversionResult<Option<ScreenerCriteria>> {
    if raw.trim().is_empty() {
        return Ok(None);
    }

    serde_json::from_str::<Option<ScreenerCriteria>>(raw)
        .map_err(|e| conversion_failed(RuleError::from(e)))
}

/// 序列化筛选条件，`None` 输出为 `null`
pub fn criteria_to_json(criteria: Option<&ScreenerCriteria>) -> Result<String> {
    Ok(serde_json::to_string(&criteria)?)
}

fn conversion_failed(error: RuleError) -> Vec<ValidationError> {
    warn!(error = %error, "转换过程中出现内部错误");
    vec![ValidationError::structure(format!("Conversion failed: {}", error))]
}

fn check_rule_set(set: &RuleSet, path: &str, errors: &mut Vec<ValidationError>) {
    check_condition(&set.condition, path, errors);

    for (i, node) in set.rules.iter().enumerate() {
        let child_path = format!("{}.rules[{}]", path, i);
        match node {
            RuleNode::Rule(rule) => check_leaf(
                &rule.field,
                &rule.operator,
                rule.value.as_ref(),
                &child_path,
                errors,
            ),
            RuleNode::RuleSet(nested) => check_rule_set(nested, &child_path, errors),
        }
    }
}

fn check_criteria(criteria: &ScreenerCriteria, path: &str, errors: &mut Vec<ValidationError>) {
    check_condition(&criteria.condition, path, errors);

    for (i, node) in criteria.rules.iter().enumerate() {
        let child_path = format!("{}.rules[{}]", path, i);
        match node {
            ScreenerNode::Rule(rule) => check_leaf(
                &rule.field,
                &rule.operator,
                rule.value.as_ref(),
                &child_path,
                errors,
            ),
            ScreenerNode::Criteria(nested) => check_criteria(nested, &child_path, errors),
        }
    }
}

fn check_condition(condition: &Condition, path: &str, errors: &mut Vec<ValidationError>) {
    if !condition.is_valid() {
        errors.push(
            ValidationError::structure(format!(
                "Invalid condition: {}. Must be 'and' or 'or'",
                condition
            ))
            .at(path),
        );
    }
}

fn check_leaf(
    field: &str,
    operator: &Operator,
    value: Option<&RuleValue>,
    path: &str,
    errors: &mut Vec<ValidationError>,
) {
    let with_field = |error: ValidationError| {
        if field.is_empty() {
            error
        } else {
            error.with_field(field)
        }
    };

    if field.is_empty() {
        errors.push(
            with_field(ValidationError::new(
                ErrorKind::Field,
                "Field name is required and must be a string",
            ))
            .at(path),
        );
    }

    if operator.is_blank() {
        errors.push(
            with_field(ValidationError::new(
                ErrorKind::Operator,
                "Operator is required and must be a string",
            ))
            .at(path),
        );
    }

    if !operator.is_no_value() && value.is_none() {
        errors.push(
            with_field(ValidationError::new(
                ErrorKind::Value,
                format!("Value is required for operator '{}'", operator),
            ))
            .at(path),
        );
    }
}

/// 按操作符归一化值
///
/// 不需要值的操作符原样透传，保证往返转换不丢信息。
fn normalize_value(value: Option<&RuleValue>, operator: &Operator) -> Option<RuleValue> {
    let value = value?;

    let normalized = match operator {
        Operator::In | Operator::NotIn => match value {
            RuleValue::List(_) => value.clone(),
            scalar => RuleValue::List(vec![scalar.clone()]),
        },
        Operator::Between => match value {
            RuleValue::List(items) if items.len() == 1 => {
                RuleValue::List(vec![items[0].clone(), items[0].clone()])
            }
            RuleValue::List(items) if items.len() > 2 => {
                debug!(
                    original_len = items.len(),
                    "between 取值超过两个元素，只保留前两个"
                );
                RuleValue::List(items[..2].to_vec())
            }
            RuleValue::List(_) => value.clone(),
            scalar => RuleValue::List(vec![scalar.clone(), scalar.clone()]),
        },
        _ => value.clone(),
    };

    Some(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tree(value: serde_json::Value) -> RuleSet {
        serde_json::from_value(value).unwrap()
    }

    fn wire_value(criteria: &ScreenerCriteria, index: usize) -> Option<RuleValue> {
        match &criteria.rules[index] {
            ScreenerNode::Rule(rule) => rule.value.clone(),
            ScreenerNode::Criteria(_) => None,
        }
    }

    #[test]
    fn test_scenario_market_cap_converts_unchanged() {
        let query = tree(json!({
            "condition": "and",
            "rules": [{"field": "marketCap", "operator": ">", "value": 1000000000}]
        }));

        let criteria = to_screener_criteria(&query).unwrap().unwrap();
        assert_eq!(
            serde_json::to_value(&criteria).unwrap(),
            json!({
                "condition": "and",
                "rules": [{"field": "marketCap", "operator": ">", "value": 1000000000}]
            })
        );
    }

    #[test]
    fn test_normalization() {
        let query = tree(json!({
            "condition": "and",
            "rules": [
                {"field": "sector", "operator": "in", "value": "TECH"},
                {"field": "pe", "operator": "between", "value": 5},
                {"field": "pe", "operator": "between", "value": [1, 2, 3]},
                {"field": "pe", "operator": "between", "value": [7]},
                {"field": "sector", "operator": "not in", "value": ["A", "B"]}
            ]
        }));

        let criteria = to_screener_criteria(&query).unwrap().unwrap();
        assert_eq!(wire_value(&criteria, 0), Some(RuleValue::from(vec!["TECH"])));
        assert_eq!(wire_value(&criteria, 1), Some(RuleValue::range(5, 5)));
        assert_eq!(wire_value(&criteria, 2), Some(RuleValue::range(1, 2)));
        assert_eq!(wire_value(&criteria, 3), Some(RuleValue::range(7, 7)));
        assert_eq!(wire_value(&criteria, 4), Some(RuleValue::from(vec!["A", "B"])));
    }

    #[test]
    fn test_no_value_operator_passes_through() {
        let query = tree(json!({
            "condition": "and",
            "rules": [{"field": "pe", "operator": "is null"}]
        }));

        let criteria = to_screener_criteria(&query).unwrap().unwrap();
        assert_eq!(wire_value(&criteria, 0), None);
        assert_eq!(
            serde_json::to_value(&criteria).unwrap()["rules"][0],
            json!({"field": "pe", "operator": "is null", "value": null})
        );
    }

    #[test]
    fn test_empty_tree_law() {
        assert_eq!(to_screener_criteria(&RuleSet::default()), Ok(None));

        let tree = from_screener_criteria(None).unwrap();
        assert_eq!(tree.condition, Condition::And);
        assert!(tree.rules.is_empty());
    }

    #[test]
    fn test_structural_errors_fail_atomically() {
        let query = tree(json!({
            "condition": "and",
            "rules": [
                {"field": "pe", "operator": "<", "value": 20},
                {"condition": "xor", "rules": [
                    {"field": "", "operator": "", "value": 1},
                    {"field": "pe", "operator": ">"}
                ]}
            ]
        }));

        let errors = to_screener_criteria(&query).unwrap_err();
        assert_eq!(errors.len(), 4);

        assert_eq!(errors[0].kind, ErrorKind::Structure);
        assert_eq!(errors[0].message, "Invalid condition: xor. Must be 'and' or 'or'");
        assert_eq!(errors[0].path.as_deref(), Some(".rules[1]"));

        assert_eq!(errors[1].kind, ErrorKind::Field);
        assert_eq!(errors[1].message, "Field name is required and must be a string");
        assert!(errors[1].field.is_none());
        assert_eq!(errors[2].kind, ErrorKind::Operator);
        assert_eq!(errors[2].path.as_deref(), Some(".rules[1].rules[0]"));

        assert_eq!(errors[3].kind, ErrorKind::Value);
        assert_eq!(errors[3].message, "Value is required for operator '>'");
        assert_eq!(errors[3].field.as_deref(), Some("pe"));
        assert_eq!(errors[3].path.as_deref(), Some(".rules[1].rules[1]"));
    }

    #[test]
    fn test_root_condition_error_has_no_path() {
        let query = tree(json!({"condition": "AND", "rules": []}));
        let errors = validate_api_compatibility(&query);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].path.is_none());
    }

    #[test]
    fn test_empty_string_value_counts_as_present() {
        let query = tree(json!({
            "condition": "and",
            "rules": [{"field": "symbol", "operator": "=", "value": ""}]
        }));
        assert!(validate_api_compatibility(&query).is_empty());
    }

    #[test]
    fn test_wire_to_tree_assigns_fresh_ids() {
        let criteria: ScreenerCriteria = serde_json::from_value(json!({
            "condition": "or",
            "rules": [
                {"field": "pe", "operator": "<", "value": 20, "entity": "fundamentals"},
                {"condition": "and", "rules": [
                    {"field": "sector", "operator": "in", "value": ["TECH"]}
                ]}
            ]
        }))
        .unwrap();

        let first = from_screener_criteria(Some(&criteria)).unwrap();
        let second = from_screener_criteria(Some(&criteria)).unwrap();
        assert_eq!(first, second);
        assert_ne!(first.id(), second.id());
        assert_ne!(first.rules[0].id(), second.rules[0].id());

        let rule = first.rules[0].as_rule().unwrap();
        assert_eq!(rule.entity.as_deref(), Some("fundamentals"));
        assert_eq!(first.condition, Condition::Or);
    }

    #[test]
    fn test_wire_structural_errors() {
        let criteria: ScreenerCriteria = serde_json::from_value(json!({
            "condition": "nand",
            "rules": [{"field": "pe", "operator": "<"}]
        }))
        .unwrap();

        let errors = from_screener_criteria(Some(&criteria)).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].kind, ErrorKind::Structure);
        assert_eq!(errors[1].path.as_deref(), Some(".rules[0]"));
    }

    #[test]
    fn test_depth_limit_folds_into_structure_error() {
        let mut query = RuleSet::default();
        let mut cursor = &mut query;
        for _ in 0..3 {
            cursor = cursor.add_rule_set();
        }
        let leaf = cursor.add_rule(None);
        leaf.field = "pe".to_string();
        leaf.value = Some(RuleValue::from(1));

        let errors = QueryConverter::new(2).to_screener_criteria(&query).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::Structure);
        assert!(errors[0].message.starts_with("Conversion failed: "));

        assert!(QueryConverter::new(3).to_screener_criteria(&query).is_ok());
    }

    #[test]
    fn test_json_boundary() {
        assert_eq!(criteria_from_json(""), Ok(None));
        assert_eq!(criteria_from_json("null"), Ok(None));

        let errors = criteria_from_json("{\"condition\": ").unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::Structure);
        assert!(errors[0].message.starts_with("Conversion failed: "));

        let criteria = criteria_from_json(
            r#"{"condition": "and", "rules": [{"field": "pe", "operator": "<", "value": 20}]}"#,
        )
        .unwrap()
        .unwrap();
        assert_eq!(criteria.rules.len(), 1);

        assert_eq!(criteria_to_json(None).unwrap(), "null");
        let json = criteria_to_json(Some(&criteria)).unwrap();
        assert_eq!(criteria_from_json(&json), Ok(Some(criteria)));
    }

    #[test]
    fn test_missing_wire_keys_report_positions() {
        let criteria = criteria_from_json(
            r#"{"condition": "and", "rules": [
                {"field": "pe", "value": 1},
                {"condition": "or", "rules": [{"operator": "<", "value": 2}]}
            ]}"#,
        )
        .unwrap();

        let errors = from_screener_criteria(criteria.as_ref()).unwrap_err();
        assert_eq!(errors.len(), 2);

        assert_eq!(errors[0].kind, ErrorKind::Operator);
        assert_eq!(errors[0].message, "Operator is required and must be a string");
        assert_eq!(errors[0].field.as_deref(), Some("pe"));
        assert_eq!(errors[0].path.as_deref(), Some(".rules[0]"));

        assert_eq!(errors[1].kind, ErrorKind::Field);
        assert_eq!(errors[1].path.as_deref(), Some(".rules[1].rules[0]"));
    }

    #[test]
    fn test_whitespace_names_count_as_present() {
        let query = RuleSet::and(vec![
            Rule::new("  ", Operator::Eq, 1).into(),
            Rule::new("pe", Operator::Unknown(" ".to_string()), 1).into(),
        ]);
        assert!(validate_api_compatibility(&query).is_empty());
        assert!(to_screener_criteria(&query).is_ok());

        let query = RuleSet::and(vec![Rule::new("", Operator::Unknown(String::new()), 1).into()]);
        let kinds: Vec<ErrorKind> = validate_api_compatibility(&query)
            .iter()
            .map(|e| e.kind)
            .collect();
        assert_eq!(kinds, vec![ErrorKind::Field, ErrorKind::Operator]);
    }
}

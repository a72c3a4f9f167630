//! 查询构建器
//!
//! 将字段注册表与 `QueryBuilderSettings` 组合在一起，向上层提供按字段名的解析、
//! 受配置约束的树编辑、校验和格式转换。

use crate::converter::{self, ConversionResult, QueryConverter, ScreenerCriteria};
use crate::error::{Result, RuleError};
use crate::models::{FieldOption, Rule, RuleSet};
use crate::operators::{Condition, InputType, Operator};
use crate::registry::FieldRegistry;
use crate::resolver;
use crate::validator::{self, ValidationError, ValidationResult};
use screener_shared::config::QueryBuilderSettings;
use std::sync::Arc;

/// 查询构建器
///
/// 注册表通过 `Arc` 共享，多个构建器可以使用同一份字段目录。
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    registry: Arc<FieldRegistry>,
    settings: QueryBuilderSettings,
    converter: QueryConverter,
}

impl QueryBuilder {
    pub fn new(registry: Arc<FieldRegistry>, settings: QueryBuilderSettings) -> Self {
        let converter = QueryConverter::new(settings.max_depth);
        Self {
            registry,
            settings,
            converter,
        }
    }

    /// 使用内置股票字段和默认配置
    pub fn stock() -> Self {
        Self::new(Arc::new(FieldRegistry::stock()), QueryBuilderSettings::default())
    }

    pub fn registry(&self) -> &FieldRegistry {
        &self.registry
    }

    pub fn settings(&self) -> &QueryBuilderSettings {
        &self.settings
    }

    /// 字段可用的操作符，未知字段返回 `None`
    pub fn operators(&self, field_name: &str) -> Option<Vec<Operator>> {
        self.registry.get(field_name).map(resolver::get_operators)
    }

    /// 字段与操作符对应的输入类型，未知字段回退到 `text`
    pub fn input_type(&self, field_name: &str, operator: &Operator) -> InputType {
        self.registry
            .get(field_name)
            .map_or(InputType::Text, |field| resolver::get_input_type(field, operator))
    }

    pub fn options(&self, field_name: &str) -> &[FieldOption] {
        self.registry
            .get(field_name)
            .map(resolver::get_options)
            .unwrap_or_default()
    }

    /// 新建空查询
    pub fn new_query(&self) -> RuleSet {
        RuleSet::empty(Condition::And)
    }

    /// 向规则组追加规则
    ///
    /// 未指定字段时使用注册表的第一个字段；指定了未注册的字段返回错误。
    pub fn add_rule<'a>(&self, set: &'a mut RuleSet, field_name: Option<&str>) -> Result<&'a mut Rule> {
        let field = match field_name {
            Some(name) => Some(self.registry.get(name).ok_or_else(|| RuleError::InvalidField {
                field: name.to_string(),
                reason: "字段未注册".to_string(),
            })?),
            None => self.registry.default_field(),
        };
        Ok(set.add_rule(field))
    }

    /// 向规则组追加嵌套规则组，配置禁止嵌套时返回错误
    pub fn add_rule_set<'a>(&self, set: &'a mut RuleSet) -> Result<&'a mut RuleSet> {
        if !self.settings.allow_ruleset {
            return Err(RuleError::NestingDisabled);
        }
        Ok(set.add_rule_set())
    }

    /// 按配置校验规则树
    pub fn validate(&self, tree: &RuleSet) -> ValidationResult {
        validator::validate(tree, &self.registry, self.settings.allow_empty_rulesets)
    }

    /// 提交前的结构检查
    pub fn check_compatibility(&self, tree: &RuleSet) -> Vec<ValidationError> {
        converter::validate_api_compatibility(tree)
    }

    pub fn to_wire(&self, tree: &RuleSet) -> ConversionResult<Option<ScreenerCriteria>> {
        self.converter.to_screener_criteria(tree)
    }

    pub fn from_wire(&self, criteria: Option<&ScreenerCriteria>) -> ConversionResult<RuleSet> {
        self.converter.from_screener_criteria(criteria)
    }
}

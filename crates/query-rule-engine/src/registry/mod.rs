//! 字段注册表
//!
//! 保存可查询字段的只读目录，供解析器、校验器和查询构建器按名称查找字段。
//!
//! # 主要功能
//!
//! - `FieldRegistry`: 字段目录，构建时校验字段配置并拒绝重复字段
//! - `FieldGroup`: 股票字段分组，用于界面上的分类展示
//! - `stock`: 内置的股票筛选字段目录

pub mod stock;

use crate::error::{Result, RuleError};
use crate::models::{Field, FieldType};
use crate::operators::Operator;
use crate::resolver;
use std::collections::HashMap;
use tracing::{debug, instrument};

pub use stock::FieldGroup;

/// 字段注册表
///
/// 构建后不可变，可在多个查询构建器之间共享。
#[derive(Debug, Clone, Default)]
pub struct FieldRegistry {
    fields: Vec<Field>,
    index: HashMap<String, usize>,
}

impl FieldRegistry {
    /// 从字段列表构建注册表
    ///
    /// 任一字段配置无效或字段名重复时返回错误。
    pub fn new(fields: Vec<Field>) -> Result<Self> {
        let mut index = HashMap::with_capacity(fields.len());

        for (i, field) in fields.iter().enumerate() {
            if let Some(reason) = field.check_configuration().into_iter().next() {
                return Err(RuleError::InvalidField {
                    field: field.name.clone(),
                    reason,
                });
            }

            if index.insert(field.name.clone(), i).is_some() {
                return Err(RuleError::DuplicateField(field.name.clone()));
            }
        }

        debug!(field_count = fields.len(), "字段注册表已构建");
        Ok(Self { fields, index })
    }

    /// 从 JSON 数组加载字段目录
    #[instrument(skip(json))]
    pub fn from_json(json: &str) -> Result<Self> {
        let fields: Vec<Field> = serde_json::from_str(json)?;
        Self::new(fields)
    }

    /// 内置股票筛选字段目录
    pub fn stock() -> Self {
        let fields = stock::stock_fields();
        let index = fields
            .iter()
            .enumerate()
            .map(|(i, field)| (field.name.clone(), i))
            .collect();
        Self { fields, index }
    }

    /// 按名称查找字段
    pub fn get(&self, name: &str) -> Option<&Field> {
        self.index.get(name).map(|&i| &self.fields[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// 按定义顺序返回所有字段
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// 第一个字段，作为新建规则的默认字段
    pub fn default_field(&self) -> Option<&Field> {
        self.fields.first()
    }

    /// 字段是否支持某个操作符，未知字段返回 false
    pub fn is_operator_supported(&self, name: &str, operator: &Operator) -> bool {
        self.get(name)
            .is_some_and(|field| resolver::get_operators(field).contains(operator))
    }

    /// 返回某个分组下的字段，保持注册表中的定义顺序
    pub fn fields_in_group(&self, group: FieldGroup) -> Vec<&Field> {
        let names = group.field_names();
        self.fields
            .iter()
            .filter(|field| names.contains(&field.name.as_str()))
            .collect()
    }
}

impl Field {
    /// 检查字段配置，返回所有问题的描述
    ///
    /// 检查项：名称与类型非空、类型可识别、覆盖操作符均可识别、
    /// 默认操作符属于可用集合、枚举类型定义了选项且每个选项都有名称。
    pub fn check_configuration(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.name.trim().is_empty() {
            errors.push("Field name is required".to_string());
        }

        match &self.field_type {
            FieldType::Other(raw) if raw.trim().is_empty() => {
                errors.push("Field type is required".to_string());
            }
            FieldType::Other(raw) => {
                errors.push(format!(
                    "Invalid field type: {}. Must be one of: string, number, date, boolean, category, multiselect",
                    raw
                ));
            }
            _ => {}
        }

        let invalid: Vec<String> = self
            .operators
            .iter()
            .filter(|op| !op.is_known())
            .map(ToString::to_string)
            .collect();
        if !invalid.is_empty() {
            errors.push(format!("Invalid operators: {}", invalid.join(", ")));
        }

        if let Some(default_operator) = &self.default_operator
            && !resolver::get_operators(self).contains(default_operator)
        {
            errors.push(format!(
                "Default operator '{}' is not valid for this field",
                default_operator
            ));
        }

        if self.field_type.requires_options() {
            if self.options.is_empty() {
                errors.push(format!(
                    "Field type '{}' requires options to be defined",
                    self.field_type
                ));
            }
            for (i, option) in self.options.iter().enumerate() {
                if option.name.trim().is_empty() {
                    errors.push(format!(
                        "Option at index {} must have both 'name' and 'value' properties",
                        i
                    ));
                }
            }
        }

        errors
    }
}

//! 操作符与输入类型解析
//!
//! 根据字段定义推导可用操作符、输入控件类型和选项列表。
//! 所有函数都是全函数：未知组合回退到 `text` 输入和 `=` 操作符，从不失败。

use crate::models::{Field, FieldOption, FieldType};
use crate::operators::{InputType, Operator};

/// 按字段类型给出的默认操作符集合
pub fn default_operators(field_type: &FieldType) -> Vec<Operator> {
    use Operator::*;

    match field_type {
        FieldType::String => vec![Eq, Neq, Contains],
        FieldType::Number | FieldType::Date => vec![Eq, Neq, Lt, Lte, Gt, Gte, Between],
        FieldType::Boolean => vec![Eq],
        FieldType::Category => vec![Eq, Neq, In, NotIn],
        FieldType::Multiselect => vec![In, NotIn],
        FieldType::Other(_) => vec![Eq, Neq],
    }
}

/// 字段可用的操作符
///
/// 字段显式配置了 `operators` 时原样返回，否则使用类型默认集合。
pub fn get_operators(field: &Field) -> Vec<Operator> {
    if !field.operators.is_empty() {
        return field.operators.clone();
    }
    default_operators(&field.field_type)
}

/// 字段与操作符组合对应的输入控件类型
pub fn get_input_type(field: &Field, operator: &Operator) -> InputType {
    if *operator == Operator::Between {
        return InputType::Between;
    }

    if operator.is_set_membership() {
        return if field.options.is_empty() {
            InputType::Text
        } else {
            InputType::Multiselect
        };
    }

    match field.field_type {
        FieldType::String => InputType::Text,
        FieldType::Number => InputType::Number,
        FieldType::Date => InputType::Date,
        FieldType::Boolean => InputType::Boolean,
        FieldType::Category if !field.options.is_empty() => InputType::Select,
        FieldType::Category => InputType::Text,
        FieldType::Multiselect => InputType::Multiselect,
        FieldType::Other(_) => InputType::Text,
    }
}

/// 字段的选项列表，未定义时为空
pub fn get_options(field: &Field) -> &[FieldOption] {
    &field.options
}

/// 新建规则时使用的默认操作符
pub fn default_operator(field: &Field) -> Operator {
    field.default_operator.clone().unwrap_or_default()
}

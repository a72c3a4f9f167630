//! 规则操作符定义

use serde::{Deserialize, Serialize};
use std::fmt;

/// 条件操作符
///
/// 序列化为前端和后端约定的字符串形式（如 `"!="`、`"not in"`）。
/// 无法识别的字符串保留在 `Unknown` 中，由校验器报告而不是在解析阶段丢弃。
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Operator {
    // 通用比较
    #[default]
    Eq,
    Neq,

    // 数值/日期比较
    Lt,
    Lte,
    Gt,
    Gte,
    Between,

    // 集合检查
    In,
    NotIn,

    // 字符串操作
    Contains,

    // 空值检查
    IsNull,
    IsNotNull,
    IsEmpty,
    IsNotEmpty,

    Unknown(String),
}

impl Operator {
    /// 解析操作符字符串
    ///
    /// 同时接受符号别名（`≠`、`≤`、`≥`）以及下划线拼写（`not_in`、`is_null`），
    /// 单词操作符大小写不敏感。
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "=" | "==" => return Self::Eq,
            "!=" | "≠" | "<>" => return Self::Neq,
            "<" => return Self::Lt,
            "<=" | "≤" => return Self::Lte,
            ">" => return Self::Gt,
            ">=" | "≥" => return Self::Gte,
            _ => {}
        }

        let normalized = raw.trim().to_lowercase().replace('_', " ");
        match normalized.as_str() {
            "in" => Self::In,
            "not in" => Self::NotIn,
            "contains" => Self::Contains,
            "between" => Self::Between,
            "is null" => Self::IsNull,
            "is not null" => Self::IsNotNull,
            "is empty" => Self::IsEmpty,
            "is not empty" => Self::IsNotEmpty,
            _ => Self::Unknown(raw.to_string()),
        }
    }

    /// 该操作符是否不需要比较值
    pub fn is_no_value(&self) -> bool {
        matches!(
            self,
            Self::IsNull | Self::IsNotNull | Self::IsEmpty | Self::IsNotEmpty
        )
    }

    /// 集合成员操作符（in / not in），值必须是数组
    pub fn is_set_membership(&self) -> bool {
        matches!(self, Self::In | Self::NotIn)
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }

    /// 操作符是否为空字符串（规则刚创建、尚未选择操作符）
    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Unknown(s) if s.is_empty())
    }

    /// 人类可读的操作符名称
    pub fn label(&self) -> &str {
        match self {
            Self::Eq => "equals",
            Self::Neq => "not equals",
            Self::Lt => "less than",
            Self::Lte => "less than or equal",
            Self::Gt => "greater than",
            Self::Gte => "greater than or equal",
            Self::Between => "between",
            Self::In => "in",
            Self::NotIn => "not in",
            Self::Contains => "contains",
            Self::IsNull => "is null",
            Self::IsNotNull => "is not null",
            Self::IsEmpty => "is empty",
            Self::IsNotEmpty => "is not empty",
            Self::Unknown(raw) => raw,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Eq => "=",
            Self::Neq => "!=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Between => "between",
            Self::In => "in",
            Self::NotIn => "not in",
            Self::Contains => "contains",
            Self::IsNull => "is null",
            Self::IsNotNull => "is not null",
            Self::IsEmpty => "is empty",
            Self::IsNotEmpty => "is not empty",
            Self::Unknown(raw) => raw,
        };
        write!(f, "{}", s)
    }
}

impl From<&str> for Operator {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl From<String> for Operator {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<Operator> for String {
    fn from(op: Operator) -> Self {
        op.to_string()
    }
}

/// 逻辑操作符（规则组条件）
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Condition {
    #[default]
    And,
    Or,
    /// 无法识别的条件，保留原文以便兼容性检查报告
    Unknown(String),
}

impl Condition {
    pub fn is_valid(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::And => write!(f, "and"),
            Self::Or => write!(f, "or"),
            Self::Unknown(raw) => write!(f, "{}", raw),
        }
    }
}

impl From<&str> for Condition {
    fn from(raw: &str) -> Self {
        match raw {
            "and" => Self::And,
            "or" => Self::Or,
            other => Self::Unknown(other.to_string()),
        }
    }
}

impl From<String> for Condition {
    fn from(raw: String) -> Self {
        Self::from(raw.as_str())
    }
}

impl From<Condition> for String {
    fn from(condition: Condition) -> Self {
        condition.to_string()
    }
}

/// 前端输入控件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    Text,
    Number,
    Date,
    Boolean,
    Select,
    Multiselect,
    Between,
}

impl fmt::Display for InputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Date => "date",
            Self::Boolean => "boolean",
            Self::Select => "select",
            Self::Multiselect => "multiselect",
            Self::Between => "between",
        };
        write!(f, "{}", s)
    }
}

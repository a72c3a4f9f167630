//! 规则比较值
//!
//! 规则的 `value` 是一个封闭的和类型：标量（布尔、数值、文本、日期）或数组。
//! `between` 的取值是两元素数组，`in` / `not in` 的取值是任意长度数组。

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Number;
use std::fmt;

/// 规则比较值
///
/// 反序列化时按变体顺序匹配：字符串总是解析为 `Text`，
/// `Date` 只能由调用方显式构造，序列化为 RFC 3339 字符串。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleValue {
    Bool(bool),
    Number(Number),
    Text(String),
    List(Vec<RuleValue>),
    Date(DateTime<Utc>),
}

impl RuleValue {
    /// 构造 between 使用的 `[min, max]` 区间
    pub fn range(min: impl Into<RuleValue>, max: impl Into<RuleValue>) -> Self {
        Self::List(vec![min.into(), max.into()])
    }

    /// 空字符串视为“未填写”
    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Text(s) if s.is_empty())
    }

    pub fn as_list(&self) -> Option<&[RuleValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// 按宽松规则转换为数值
    ///
    /// 数值、布尔（1/0）、日期（毫秒时间戳）以及可解析的数字字符串都可以转换，
    /// 空白字符串视为 0。数组和 NaN 不可转换。
    pub fn as_f64(&self) -> Option<f64> {
        let number = match self {
            Self::Number(n) => n.as_f64(),
            Self::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Self::Date(dt) => Some(dt.timestamp_millis() as f64),
            Self::Text(s) if s.trim().is_empty() => Some(0.0),
            Self::Text(s) => s.trim().parse::<f64>().ok(),
            Self::List(_) => None,
        };
        number.filter(|n| !n.is_nan())
    }

    /// 布尔值或字面量 "true" / "false"
    pub fn is_boolean_like(&self) -> bool {
        match self {
            Self::Bool(_) => true,
            Self::Text(s) => s == "true" || s == "false",
            _ => false,
        }
    }

    /// 解析为日期时间，`Date` 直接返回，字符串按常见格式解析
    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Date(dt) => Some(*dt),
            Self::Text(s) => parse_datetime(s),
            _ => None,
        }
    }

    /// 获取值的类型名称
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::Text(_) => "string",
            Self::List(_) => "array",
            Self::Date(_) => "date",
        }
    }
}

/// 解析日期时间字符串
///
/// 支持 RFC 3339、`%Y-%m-%dT%H:%M:%S`、`%Y-%m-%d %H:%M:%S` 以及纯日期 `%Y-%m-%d`、`%Y/%m/%d`。
pub fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }

    for format in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
        }
    }

    None
}

impl fmt::Display for RuleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{}", b),
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(s) => write!(f, "{}", s),
            Self::Date(dt) => write!(f, "{}", dt.to_rfc3339()),
            Self::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<bool> for RuleValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i32> for RuleValue {
    fn from(n: i32) -> Self {
        Self::Number(n.into())
    }
}

impl From<i64> for RuleValue {
    fn from(n: i64) -> Self {
        Self::Number(n.into())
    }
}

impl From<u64> for RuleValue {
    fn from(n: u64) -> Self {
        Self::Number(n.into())
    }
}

impl From<f64> for RuleValue {
    fn from(n: f64) -> Self {
        Number::from_f64(n)
            .map(Self::Number)
            .unwrap_or_else(|| Self::Text(n.to_string()))
    }
}

impl From<&str> for RuleValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for RuleValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<DateTime<Utc>> for RuleValue {
    fn from(dt: DateTime<Utc>) -> Self {
        Self::Date(dt)
    }
}

impl<T: Into<RuleValue>> From<Vec<T>> for RuleValue {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_variants() {
        let value: RuleValue = serde_json::from_value(json!(1000000000)).unwrap();
        assert_eq!(value, RuleValue::from(1_000_000_000i64));

        let value: RuleValue = serde_json::from_value(json!("TECH")).unwrap();
        assert_eq!(value, RuleValue::from("TECH"));

        let value: RuleValue = serde_json::from_value(json!([1, "a", true])).unwrap();
        assert_eq!(
            value,
            RuleValue::List(vec![1.into(), "a".into(), true.into()])
        );

        assert!(serde_json::from_value::<RuleValue>(json!({"a": 1})).is_err());
    }

    #[test]
    fn test_integer_and_float_preserved() {
        let int: RuleValue = serde_json::from_str("5").unwrap();
        let float: RuleValue = serde_json::from_str("2.5").unwrap();
        assert_eq!(serde_json::to_string(&int).unwrap(), "5");
        assert_eq!(serde_json::to_string(&float).unwrap(), "2.5");
    }

    #[test]
    fn test_numeric_coercion() {
        assert_eq!(RuleValue::from(42).as_f64(), Some(42.0));
        assert_eq!(RuleValue::from(" 3.5 ").as_f64(), Some(3.5));
        assert_eq!(RuleValue::from(true).as_f64(), Some(1.0));
        assert_eq!(RuleValue::from("").as_f64(), Some(0.0));
        assert_eq!(RuleValue::from("abc").as_f64(), None);
        assert_eq!(RuleValue::from("NaN").as_f64(), None);
        assert_eq!(RuleValue::from(vec![1]).as_f64(), None);
    }

    #[test]
    fn test_boolean_like() {
        assert!(RuleValue::from(false).is_boolean_like());
        assert!(RuleValue::from("true").is_boolean_like());
        assert!(!RuleValue::from("yes").is_boolean_like());
        assert!(!RuleValue::from(1).is_boolean_like());
    }

    #[test]
    fn test_parse_datetime_formats() {
        assert!(parse_datetime("2024-01-15T10:00:00Z").is_some());
        assert!(parse_datetime("2024-01-15T10:00:00+08:00").is_some());
        assert!(parse_datetime("2024-01-15 10:00:00").is_some());
        assert!(parse_datetime("2024-01-15").is_some());
        assert!(parse_datetime("2024/01/15").is_some());
        assert!(parse_datetime("yesterday").is_none());
        assert!(parse_datetime("2024-13-40").is_none());
    }

    #[test]
    fn test_display() {
        assert_eq!(RuleValue::range(1, 2).to_string(), "[1, 2]");
        assert_eq!(RuleValue::from("TECH").to_string(), "TECH");
    }

    #[test]
    fn test_blank() {
        assert!(RuleValue::from("").is_blank());
        assert!(!RuleValue::from(" ").is_blank());
        assert!(!RuleValue::from(0).is_blank());
    }
}

//! 规则引擎错误类型
//!
//! 预期内的校验失败以 [`ValidationError`](crate::validator::ValidationError) 数据返回，
//! 这里只收录配置错误和转换过程中的内部故障。

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("字段配置无效: {field} - {reason}")]
    InvalidField { field: String, reason: String },

    #[error("字段重复定义: {0}")]
    DuplicateField(String),

    #[error("规则组嵌套深度超出上限 {max_depth}: {path}")]
    NestingTooDeep { max_depth: usize, path: String },

    #[error("当前配置不允许嵌套规则组")]
    NestingDisabled,

    #[error("JSON 序列化错误: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RuleError>;

//! 查询规则引擎
//!
//! 为股票筛选器提供可嵌套的 AND/OR 规则树，支持：
//! - 字段注册表与操作符/输入类型解析
//! - 规则树的原地编辑
//! - 结合字段目录的递归校验
//! - 可编辑规则树与后端筛选条件之间的双向转换

pub mod builder;
pub mod converter;
pub mod error;
pub mod models;
pub mod mutator;
pub mod operators;
pub mod registry;
pub mod resolver;
pub mod validator;
pub mod value;

pub use builder::QueryBuilder;
pub use converter::{
    ConversionResult, QueryConverter, ScreenerCriteria, ScreenerNode, ScreenerRule,
    criteria_from_json, criteria_to_json, from_screener_criteria, to_screener_criteria,
    validate_api_compatibility,
};
pub use error::{Result, RuleError};
pub use models::{Field, FieldOption, FieldType, NodeId, Rule, RuleNode, RuleSet};
pub use operators::{Condition, InputType, Operator};
pub use registry::{FieldGroup, FieldRegistry};
pub use validator::{ErrorKind, ValidationError, ValidationResult, validate};
pub use value::RuleValue;

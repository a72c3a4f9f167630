//! 共享库
//!
//! 包含查询引擎与命令行工具共用的配置加载和日志初始化代码。

pub mod config;
pub mod observability;

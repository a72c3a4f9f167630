//! 配置管理模块
//!
//! 支持多格式配置文件加载，环境变量覆盖，以及类型安全的配置访问。

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

use crate::observability::ObservabilityConfig;

/// 查询构建器配置
///
/// 控制规则树的编辑与校验行为，由引擎的 `QueryBuilder` 消费。
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QueryBuilderSettings {
    /// 是否允许空规则组通过校验
    pub allow_empty_rulesets: bool,
    /// 是否允许嵌套规则组
    pub allow_ruleset: bool,
    /// 格式转换时允许的最大嵌套深度
    pub max_depth: usize,
}

impl Default for QueryBuilderSettings {
    fn default() -> Self {
        Self {
            allow_empty_rulesets: false,
            allow_ruleset: true,
            max_depth: 32,
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service_name: String,
    pub environment: String,
    pub query_builder: QueryBuilderSettings,
    pub observability: ObservabilityConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            service_name: "query-check".to_string(),
            environment: "development".to_string(),
            query_builder: QueryBuilderSettings::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl AppConfig {
    /// 从配置文件和环境变量加载配置
    ///
    /// 加载顺序（后加载的会覆盖先加载的同名配置项）：
    /// 1. config/default.toml（默认配置）
    /// 2. config/{environment}.toml（环境特定配置）
    /// 3. 环境变量（SCREENER_ 前缀，段与键之间用双下划线，
    ///    如 SCREENER_QUERY_BUILDER__MAX_DEPTH -> query_builder.max_depth）
    pub fn load(service_name: &str) -> Result<Self, ConfigError> {
        let env = std::env::var("SCREENER_ENV").unwrap_or_else(|_| "development".to_string());
        let config_dir = std::env::var("CONFIG_DIR").unwrap_or_else(|_| "config".to_string());

        Self::load_from(service_name, &env, Path::new(&config_dir))
    }

    /// 从指定目录加载配置，便于测试时绕开进程环境
    pub fn load_from(service_name: &str, env: &str, config_dir: &Path) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .set_default("service_name", service_name)?
            .set_default("environment", env)?
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            .add_source(File::from(config_dir.join(format!("{}.toml", env))).required(false))
            .add_source(
                Environment::with_prefix("SCREENER")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// 是否为生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

//! 查询规则检查工具
//!
//! 列出字段目录、校验规则树，以及在可编辑规则树和后端筛选条件之间转换。

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use query_engine::{
    FieldGroup, FieldRegistry, QueryBuilder, RuleSet, ValidationError, criteria_from_json,
    criteria_to_json, resolver,
};
use screener_shared::config::AppConfig;
use screener_shared::observability;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// 查询规则命令行工具
#[derive(Parser, Debug)]
#[command(name = "query-check")]
#[command(version, about = "股票筛选查询规则检查工具")]
#[command(propagate_version = true)]
struct Cli {
    /// 日志级别，覆盖配置文件 (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,

    /// 字段目录 JSON 文件，缺省使用内置股票字段
    #[arg(long, global = true)]
    fields: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 列出字段目录及每个操作符对应的输入类型
    Fields {
        /// 只列出某个分组 (basic, financial, dividend, trading, boolean)
        #[arg(short, long)]
        group: Option<String>,
    },

    /// 结合字段目录校验可编辑规则树
    Validate {
        /// 规则树 JSON 文件
        file: PathBuf,

        /// 允许空规则组
        #[arg(long)]
        allow_empty: bool,
    },

    /// 可编辑规则树转换为后端筛选条件
    ToWire {
        /// 规则树 JSON 文件
        file: PathBuf,
    },

    /// 后端筛选条件转换为可编辑规则树
    FromWire {
        /// 筛选条件 JSON 文件
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load("query-check").unwrap_or_else(|e| {
        eprintln!("Failed to load config, using defaults: {}", e);
        AppConfig::default()
    });

    let obs_config = config
        .observability
        .clone()
        .with_service_name(&config.service_name)
        .with_log_level(cli.log_level.as_deref());
    observability::init(&obs_config)?;

    let registry = match &cli.fields {
        Some(path) => {
            let json = read_file(path)?;
            FieldRegistry::from_json(&json)
                .with_context(|| format!("字段目录无效: {}", path.display()))?
        }
        None => FieldRegistry::stock(),
    };
    info!(field_count = registry.len(), "字段目录已加载");

    let mut settings = config.query_builder.clone();
    if matches!(cli.command, Commands::Validate { allow_empty: true, .. }) {
        settings.allow_empty_rulesets = true;
    }
    let builder = QueryBuilder::new(Arc::new(registry), settings);

    match cli.command {
        Commands::Fields { group } => list_fields(&builder, group.as_deref()),
        Commands::Validate { file, .. } => run_validate(&builder, &file),
        Commands::ToWire { file } => run_to_wire(&builder, &file),
        Commands::FromWire { file } => run_from_wire(&builder, &file),
    }
}

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("无法读取文件: {}", path.display()))
}

fn read_tree(path: &Path) -> Result<RuleSet> {
    let json = read_file(path)?;
    RuleSet::from_json(&json).with_context(|| format!("规则树 JSON 无效: {}", path.display()))
}

fn list_fields(builder: &QueryBuilder, group: Option<&str>) -> Result<()> {
    let fields = match group {
        Some(name) => {
            let Some(group) = FieldGroup::parse(name) else {
                bail!("未知分组: {}", name);
            };
            builder.registry().fields_in_group(group)
        }
        None => builder.registry().fields().iter().collect(),
    };

    for field in fields {
        println!("{} ({}) - {}", field.name, field.field_type, field.display_label());
        for operator in resolver::get_operators(field) {
            println!(
                "    {:<12} {:<24} {}",
                operator.to_string(),
                operator.label(),
                resolver::get_input_type(field, &operator)
            );
        }
    }
    Ok(())
}

fn run_validate(builder: &QueryBuilder, path: &Path) -> Result<()> {
    let tree = read_tree(path)?;
    let result = builder.validate(&tree);

    if result.valid {
        println!("OK: {} rule(s)", tree.count_rules());
        return Ok(());
    }
    report(&result.errors)
}

fn run_to_wire(builder: &QueryBuilder, path: &Path) -> Result<()> {
    let tree = read_tree(path)?;
    match builder.to_wire(&tree) {
        Ok(criteria) => {
            println!("{}", criteria_to_json(criteria.as_ref())?);
            Ok(())
        }
        Err(errors) => report(&errors),
    }
}

fn run_from_wire(builder: &QueryBuilder, path: &Path) -> Result<()> {
    let json = read_file(path)?;
    let converted = criteria_from_json(&json)
        .and_then(|criteria| builder.from_wire(criteria.as_ref()));

    match converted {
        Ok(tree) => {
            debug!(rule_count = tree.count_rules(), "筛选条件已转换");
            println!("{}", tree.to_json()?);
            Ok(())
        }
        Err(errors) => report(&errors),
    }
}

fn report(errors: &[ValidationError]) -> Result<()> {
    for error in errors {
        println!("{}", error);
    }
    bail!("发现 {} 个问题", errors.len())
}

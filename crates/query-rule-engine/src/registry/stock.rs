//! 股票筛选字段目录

use crate::models::{Field, FieldOption, FieldType};
use crate::operators::Operator;
use chrono::Utc;

/// 字段分组
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldGroup {
    Basic,
    Financial,
    Dividend,
    Trading,
    Boolean,
}

impl FieldGroup {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "basic" => Some(Self::Basic),
            "financial" => Some(Self::Financial),
            "dividend" => Some(Self::Dividend),
            "trading" => Some(Self::Trading),
            "boolean" => Some(Self::Boolean),
            _ => None,
        }
    }

    /// 分组包含的字段名
    pub fn field_names(self) -> &'static [&'static str] {
        match self {
            Self::Basic => &["symbol", "companyName", "sector", "exchange", "isListed"],
            Self::Financial => &[
                "marketCap",
                "pe",
                "pb",
                "roe",
                "debtToEquity",
                "currentRatio",
                "eps",
                "bookValue",
            ],
            Self::Dividend => &["dividendYield", "paysDividend"],
            Self::Trading => &["price", "volume", "lastUpdated"],
            Self::Boolean => &["hasEarnings", "paysDividend", "isListed"],
        }
    }
}

pub fn sector_options() -> Vec<FieldOption> {
    [
        ("Technology", "TECH"),
        ("Healthcare", "HEALTH"),
        ("Financial Services", "FINANCE"),
        ("Consumer Goods", "CONSUMER"),
        ("Energy", "ENERGY"),
        ("Utilities", "UTILITIES"),
        ("Materials", "MATERIALS"),
        ("Industrials", "INDUSTRIALS"),
        ("Real Estate", "REAL_ESTATE"),
        ("Communication Services", "COMMUNICATION"),
    ]
    .into_iter()
    .map(|(name, value)| FieldOption::new(name, value))
    .collect()
}

pub fn market_cap_options() -> Vec<FieldOption> {
    vec![
        FieldOption::new("Large Cap (>$10B)", 10_000_000_000u64),
        FieldOption::new("Mid Cap ($2B-$10B)", 2_000_000_000u64),
        FieldOption::new("Small Cap ($300M-$2B)", 300_000_000u64),
        FieldOption::new("Micro Cap (<$300M)", 300_000_000u64),
    ]
}

pub fn exchange_options() -> Vec<FieldOption> {
    ["NSE", "BSE", "NYSE", "NASDAQ"]
        .into_iter()
        .map(|code| FieldOption::new(code, code))
        .collect()
}

fn numeric_operators() -> Vec<Operator> {
    vec![
        Operator::Eq,
        Operator::Neq,
        Operator::Lt,
        Operator::Lte,
        Operator::Gt,
        Operator::Gte,
        Operator::Between,
    ]
}

fn text_field(name: &str, label: &str) -> Field {
    Field::new(name, FieldType::String)
        .with_label(label)
        .with_operators(vec![Operator::Eq, Operator::Neq, Operator::Contains])
        .with_default_operator(Operator::Contains)
        .with_default_value("")
}

fn number_field(name: &str, label: &str, default_operator: Operator, default_value: f64) -> Field {
    Field::new(name, FieldType::Number)
        .with_label(label)
        .with_operators(numeric_operators())
        .with_default_operator(default_operator)
        .with_default_value(default_value)
}

fn category_field(name: &str, label: &str, options: Vec<FieldOption>, default_value: &str) -> Field {
    Field::new(name, FieldType::Category)
        .with_label(label)
        .with_operators(vec![Operator::Eq, Operator::Neq, Operator::In, Operator::NotIn])
        .with_default_operator(Operator::Eq)
        .with_default_value(default_value)
        .with_options(options)
}

fn boolean_field(name: &str, label: &str) -> Field {
    Field::new(name, FieldType::Boolean)
        .with_label(label)
        .with_operators(vec![Operator::Eq])
        .with_default_operator(Operator::Eq)
        .with_default_value(true)
}

/// 内置股票筛选字段，顺序即界面展示顺序
pub fn stock_fields() -> Vec<Field> {
    vec![
        text_field("symbol", "Symbol"),
        text_field("companyName", "Company Name"),
        Field::new("marketCap", FieldType::Number)
            .with_label("Market Cap")
            .with_operators(numeric_operators())
            .with_default_operator(Operator::Gt)
            .with_default_value(1_000_000_000u64)
            .with_options(market_cap_options()),
        number_field("pe", "P/E Ratio", Operator::Lt, 20.0),
        number_field("pb", "Price to Book", Operator::Lt, 3.0),
        number_field("dividendYield", "Dividend Yield (%)", Operator::Gt, 2.0),
        number_field("roe", "Return on Equity (%)", Operator::Gt, 15.0),
        number_field("debtToEquity", "Debt to Equity", Operator::Lt, 1.0),
        number_field("currentRatio", "Current Ratio", Operator::Gt, 1.5),
        category_field("sector", "Sector", sector_options(), "TECH"),
        category_field("exchange", "Exchange", exchange_options(), "NSE"),
        number_field("price", "Current Price", Operator::Gt, 100.0),
        number_field("volume", "Volume", Operator::Gt, 100_000.0),
        number_field("eps", "Earnings Per Share", Operator::Gt, 10.0),
        number_field("bookValue", "Book Value", Operator::Gt, 50.0),
        boolean_field("hasEarnings", "Has Earnings"),
        boolean_field("paysDividend", "Pays Dividend"),
        boolean_field("isListed", "Is Listed"),
        Field::new("lastUpdated", FieldType::Date)
            .with_label("Last Updated")
            .with_operators(numeric_operators())
            .with_default_operator(Operator::Gt)
            .with_default_value(Utc::now()),
    ]
}

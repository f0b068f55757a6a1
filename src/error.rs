use std::fmt;

use thiserror::Error;

use crate::types::{CurrencyCode, RecordId, Timestamp};

/// Блок дампа, в котором обнаружена ошибка.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockRef {
    /// Блок `Employee` (нумерация с единицы, в порядке следования в дампе).
    Employee(usize),
    /// Завершающий блок `Rates`.
    Rates,
}

impl fmt::Display for BlockRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Employee(n) => write!(f, "employee block #{}", n),
            Self::Rates => write!(f, "rates block"),
        }
    }
}

/// Категория ошибки разбора.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Дамп не той формы: нет обязательной секции или запись обрезана.
    Structural,
    /// Строка внутри распознанной секции не декодируется в значение.
    Field,
    /// Источник не удалось прочитать.
    Input,
    /// Раскладка записи не согласована с её разбором; ошибка в коде, не в дампе.
    Internal,
}

/// Ошибка разбора дампа. Любая из них прерывает разбор целиком.
///
/// Номер строки `line` считается от начала блока, с единицы,
/// после нормализации пробелов.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("section `{token}` not found in dump")]
    SectionNotFound { token: &'static str },

    #[error("{block}, line {line}: `{marker}` record needs {expected} lines, found {found}")]
    TruncatedRecord {
        block: BlockRef,
        marker: &'static str,
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("{block}, line {line}: field `{field}` is not a `key: value` pair: {content:?}")]
    MissingDelimiter {
        block: BlockRef,
        field: &'static str,
        line: usize,
        content: String,
    },

    #[error("{block}, line {line}: invalid `{field}` value {value:?}: {reason}")]
    InvalidValue {
        block: BlockRef,
        field: &'static str,
        line: usize,
        value: String,
        reason: String,
    },

    #[error("`{marker}` record layout has no field `{field}`")]
    LayoutMismatch {
        marker: &'static str,
        field: &'static str,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ParseError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::SectionNotFound { .. } | Self::TruncatedRecord { .. } => ErrorKind::Structural,
            Self::MissingDelimiter { .. } | Self::InvalidValue { .. } => ErrorKind::Field,
            Self::Io(_) | Self::Json(_) => ErrorKind::Input,
            Self::LayoutMismatch { .. } => ErrorKind::Internal,
        }
    }
}

#[derive(Debug, Error)]
pub enum DumpError {
    #[error("output error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Для пожертвования не нашлось курса на точную пару (валюта, дата).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no {currency} rate recorded for {date} (donation #{donation_id})")]
pub struct LookupMiss {
    pub donation_id: RecordId,
    pub currency: CurrencyCode,
    pub date: Timestamp,
}

/// Пожертвования, для которых не нашлось курса, в строгом режиме.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} donations have no exchange rate", .0.len())]
pub struct UnconvertedDonations(pub Vec<LookupMiss>);

use std::{fmt, str::FromStr};

use bigdecimal::{BigDecimal, RoundingMode, num_bigint::Sign};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

pub type EmployeeId = u64;
pub type DepartmentId = u64;
pub type RecordId = u64;

/// Количество знаков после запятой у всех денежных сумм.
pub const MONEY_SCALE: i64 = 2;

/// Максимальная длина текстовой записи суммы.
const MAX_AMOUNT_LEN: usize = 64;

#[derive(Debug, Error)]
pub enum InvalidAmount {
    #[error("{0}")]
    Malformed(#[from] bigdecimal::ParseBigDecimalError),
    #[error("exponent notation is not allowed")]
    Exponent,
    #[error("amount is longer than {MAX_AMOUNT_LEN} characters")]
    TooLong,
}

/// Денежная сумма, всегда хранится ровно с двумя знаками после запятой.
///
/// Округление при приведении к двум знакам: половина от нуля
/// (`0.125` -> `0.13`, `-0.125` -> `-0.13`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(try_from = "String")]
pub struct Money(BigDecimal);

impl Money {
    pub fn new(value: BigDecimal) -> Self {
        Money(value.with_scale_round(MONEY_SCALE, RoundingMode::HalfUp))
    }

    /// Пересчёт суммы по курсу с округлением результата до двух знаков.
    pub fn convert(&self, rate: &Money) -> Money {
        Money::new(&self.0 * &rate.0)
    }

    pub fn as_decimal(&self) -> &BigDecimal {
        &self.0
    }
}

impl FromStr for Money {
    type Err = InvalidAmount;

    /// Экспоненциальная запись не принимается: `1e20000000` пришлось бы
    /// разворачивать в двадцать миллионов цифр.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.len() > MAX_AMOUNT_LEN {
            return Err(InvalidAmount::TooLong);
        }
        if s.contains(['e', 'E']) {
            return Err(InvalidAmount::Exponent);
        }
        Ok(Money::new(BigDecimal::from_str(s)?))
    }
}

impl TryFrom<String> for Money {
    type Error = InvalidAmount;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Display самого BigDecimal печатает ноль как `0` при любом масштабе.
        let (cents, _) = self.0.with_scale(MONEY_SCALE).as_bigint_and_exponent();
        let sign = if cents.sign() == Sign::Minus { "-" } else { "" };
        let magnitude = cents.magnitude();
        write!(f, "{}{}.{:02}", sign, magnitude / 100u32, magnitude % 100u32)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Error)]
#[error("unrecognized date format")]
pub struct InvalidDate;

/// Момент времени в UTC.
///
/// Даты без времени трактуются как полночь UTC. Каноническое
/// представление: `Tue, 02 Jan 2024 00:00:00 GMT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Timestamp(DateTime<Utc>);

const CANONICAL_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

static DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%a %b %d %Y", "%b %d %Y", "%m/%d/%Y"];

static DATE_TIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

impl Timestamp {
    /// Доли секунды отбрасываются: каноническое представление их не
    /// содержит, а сравнение дат должно совпадать со сравнением строк.
    pub fn new(value: DateTime<Utc>) -> Self {
        Timestamp(value.trunc_subsecs(0))
    }

    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(value: DateTime<Utc>) -> Self {
        Timestamp::new(value)
    }
}

impl FromStr for Timestamp {
    type Err = InvalidDate;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(Timestamp::new(dt.with_timezone(&Utc)));
        }
        if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
            return Ok(Timestamp::new(dt.with_timezone(&Utc)));
        }
        for format in DATE_TIME_FORMATS {
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
                return Ok(Timestamp::new(dt.and_utc()));
            }
        }
        for format in DATE_FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(s, format) {
                return Ok(Timestamp::new(date.and_time(NaiveTime::MIN).and_utc()));
            }
        }
        Err(InvalidDate)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(CANONICAL_FORMAT))
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Error)]
#[error("currency code must be three ASCII letters")]
pub struct InvalidCurrency;

/// Трёхбуквенный код валюты в верхнем регистре.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CurrencyCode([u8; 3]);

impl CurrencyCode {
    pub const USD: CurrencyCode = CurrencyCode(*b"USD");

    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).unwrap_or_default()
    }
}

impl FromStr for CurrencyCode {
    type Err = InvalidCurrency;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.trim().as_bytes();
        let Ok(code) = <[u8; 3]>::try_from(bytes) else {
            return Err(InvalidCurrency);
        };
        if !code.iter().all(u8::is_ascii_alphabetic) {
            return Err(InvalidCurrency);
        }
        Ok(CurrencyCode(code.map(|b| b.to_ascii_uppercase())))
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for CurrencyCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for CurrencyCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub id: DepartmentId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Salary {
    pub id: RecordId,
    pub date: Timestamp,
    pub amount: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Donation {
    pub id: RecordId,
    pub date: Timestamp,
    pub amount: Money,
    pub currency: CurrencyCode,
}

/// Курс валюты `sign` к опорной валюте, действует только на дату `date`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRate {
    pub date: Timestamp,
    pub sign: CurrencyCode,
    pub value: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub name: String,
    pub surname: String,
    pub department: Department,
    pub salaries: Vec<Salary>,
    pub donations: Vec<Donation>,
}

/// Результат разбора одного дампа.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedDump {
    pub employees: Vec<Employee>,
    pub departments: Vec<Department>,
    pub exchange_rates: Vec<ExchangeRate>,
}

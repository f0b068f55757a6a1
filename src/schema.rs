//! Декларативное описание записей дампа.
//!
//! Каждая запись начинается со строки-маркера и занимает фиксированное
//! число следующих за ним строк. Порядок строк задаётся [`Slot`]-ами в
//! [`Record::LAYOUT`], а разбор значений делает одна общая процедура
//! [`read_record`].

use std::{fmt::Display, str::FromStr};

use crate::error::{BlockRef, ParseError};
use crate::types::{
    CurrencyCode, Department, DepartmentId, Donation, EmployeeId, ExchangeRate, Money, Salary,
};
use crate::utils::value_after_colon;

/// Маркер конца блоков сотрудников и начала блока курсов.
pub(crate) const RATES_TOKEN: &str = "Rates";

/// Строка внутри записи.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Slot {
    /// Пара `key: value`, значение которой становится полем записи.
    Field(&'static str),
    /// Заголовок подсекции, содержимое не читается.
    Header,
}

/// Тип записи, извлекаемой из блока по маркеру.
pub(crate) trait Record: Sized {
    const MARKER: &'static str;
    const LAYOUT: &'static [Slot];

    fn from_fields(fields: &Fields<'_>) -> Result<Self, ParseError>;
}

/// Нормализованные строки одного блока дампа.
#[derive(Debug)]
pub(crate) struct Block<'a> {
    pub(crate) id: BlockRef,
    pub(crate) lines: Vec<&'a str>,
}

#[derive(Debug)]
struct Field<'a> {
    name: &'static str,
    /// Номер строки в блоке, с единицы.
    line: usize,
    value: &'a str,
}

/// Значения полей одной записи в порядке её раскладки.
#[derive(Debug)]
pub(crate) struct Fields<'a> {
    block: BlockRef,
    marker: &'static str,
    fields: Vec<Field<'a>>,
}

impl<'a> Fields<'a> {
    fn get(&self, name: &'static str) -> Result<&Field<'a>, ParseError> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .ok_or(ParseError::LayoutMismatch {
                marker: self.marker,
                field: name,
            })
    }

    fn invalid(&self, field: &Field<'_>, value: &str, reason: impl Display) -> ParseError {
        ParseError::InvalidValue {
            block: self.block,
            field: field.name,
            line: field.line,
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn text(&self, name: &'static str) -> Result<String, ParseError> {
        Ok(self.get(name)?.value.to_string())
    }

    pub(crate) fn parse<T>(&self, name: &'static str) -> Result<T, ParseError>
    where
        T: FromStr,
        T::Err: Display,
    {
        let field = self.get(name)?;
        field
            .value
            .parse()
            .map_err(|err| self.invalid(field, field.value, err))
    }

    /// Поле вида `50.00 EUR`: сумма и код валюты через пробел.
    pub(crate) fn money_with_currency(
        &self,
        name: &'static str,
    ) -> Result<(Money, CurrencyCode), ParseError> {
        let field = self.get(name)?;
        let mut tokens = field.value.split_whitespace();
        let amount = tokens.next().unwrap_or_default();
        let Some(currency) = tokens.next() else {
            return Err(self.invalid(field, field.value, "missing currency code"));
        };
        let amount = amount
            .parse()
            .map_err(|err| self.invalid(field, amount, err))?;
        let currency = currency
            .parse()
            .map_err(|err| self.invalid(field, currency, err))?;
        Ok((amount, currency))
    }
}

/// Читает запись, поля которой начинаются со строки `start` (с нуля).
pub(crate) fn read_record<'a>(
    block: &Block<'a>,
    start: usize,
    marker: &'static str,
    layout: &'static [Slot],
) -> Result<Fields<'a>, ParseError> {
    let available = block.lines.len().saturating_sub(start);
    if available < layout.len() {
        return Err(ParseError::TruncatedRecord {
            block: block.id,
            marker,
            line: start.max(1),
            expected: layout.len(),
            found: available,
        });
    }

    let mut fields = Vec::with_capacity(layout.len());
    for (offset, slot) in layout.iter().enumerate() {
        let Slot::Field(name) = *slot else {
            continue;
        };
        let index = start + offset;
        let content = block.lines[index];
        let Some(value) = value_after_colon(content) else {
            return Err(ParseError::MissingDelimiter {
                block: block.id,
                field: name,
                line: index + 1,
                content: content.to_string(),
            });
        };
        fields.push(Field {
            name,
            line: index + 1,
            value,
        });
    }

    Ok(Fields {
        block: block.id,
        marker,
        fields,
    })
}

/// Извлекает все записи типа `T`: ищет каждую строку, равную маркеру,
/// и разбирает следующие за ней строки.
pub(crate) fn extract_records<T: Record>(block: &Block<'_>) -> Result<Vec<T>, ParseError> {
    let mut records = Vec::new();
    let mut from = 0;
    while let Some(offset) = block.lines[from..].iter().position(|l| *l == T::MARKER) {
        let marker = from + offset;
        let fields = read_record(block, marker + 1, T::MARKER, T::LAYOUT)?;
        records.push(T::from_fields(&fields)?);
        from = marker + 1;
    }
    Ok(records)
}

/// Шапка блока сотрудника: собственные поля и отдел.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct EmployeeHead {
    pub(crate) id: EmployeeId,
    pub(crate) name: String,
    pub(crate) surname: String,
    pub(crate) department: Department,
}

impl Record for EmployeeHead {
    const MARKER: &'static str = "Employee";
    const LAYOUT: &'static [Slot] = &[
        Slot::Field("id"),
        Slot::Field("name"),
        Slot::Field("surname"),
        Slot::Header,
        Slot::Field("department id"),
        Slot::Field("department name"),
    ];

    fn from_fields(fields: &Fields<'_>) -> Result<Self, ParseError> {
        Ok(EmployeeHead {
            id: fields.parse("id")?,
            name: fields.text("name")?,
            surname: fields.text("surname")?,
            department: Department {
                id: fields.parse::<DepartmentId>("department id")?,
                name: fields.text("department name")?,
            },
        })
    }
}

impl Record for Salary {
    const MARKER: &'static str = "Salary";
    const LAYOUT: &'static [Slot] = &[Slot::Field("id"), Slot::Field("amount"), Slot::Field("date")];

    fn from_fields(fields: &Fields<'_>) -> Result<Self, ParseError> {
        Ok(Salary {
            id: fields.parse("id")?,
            amount: fields.parse("amount")?,
            date: fields.parse("date")?,
        })
    }
}

impl Record for Donation {
    const MARKER: &'static str = "Donation";
    const LAYOUT: &'static [Slot] = &[Slot::Field("id"), Slot::Field("date"), Slot::Field("amount")];

    fn from_fields(fields: &Fields<'_>) -> Result<Self, ParseError> {
        let (amount, currency) = fields.money_with_currency("amount")?;
        Ok(Donation {
            id: fields.parse("id")?,
            date: fields.parse("date")?,
            amount,
            currency,
        })
    }
}

impl Record for ExchangeRate {
    const MARKER: &'static str = "Rate";
    const LAYOUT: &'static [Slot] = &[Slot::Field("date"), Slot::Field("sign"), Slot::Field("value")];

    fn from_fields(fields: &Fields<'_>) -> Result<Self, ParseError> {
        Ok(ExchangeRate {
            date: fields.parse("date")?,
            sign: fields.parse("sign")?,
            value: fields.parse("value")?,
        })
    }
}

//! # payroll_dump
//!
//! Библиотека для разбора текстовых дампов с сотрудниками, их зарплатами и
//! пожертвованиями в разных валютах, с пересчётом пожертвований в одну
//! опорную валюту.
//!
//! Дамп состоит из блоков `Employee`, за которыми идёт блок `Rates` с
//! историческими курсами. Разбор выдаёт три коллекции: сотрудников,
//! отделы (без повторов) и курсы, см. [`types::ParsedDump`].
//!
//! ## Быстрый старт
//!
//! ```rust
//! use payroll_dump::{ingest, normalizer::NormalizeOptions};
//!
//! let data = r#"
//!     Employee
//!       id: 1
//!       name: Jane
//!       surname: Doe
//!       Department
//!         id: 10
//!         name: Engineering
//!       Donations
//!         Donation
//!           id: 1
//!           date: 2024-01-02
//!           amount: 50.00 EUR
//!     Rates
//!       Rate
//!         date: 2024-01-02
//!         sign: EUR
//!         value: 0.92
//! "#;
//!
//! let ingested = ingest(data, &NormalizeOptions::default()).expect("Ошибка парсинга");
//! let donation = &ingested.dump.employees[0].donations[0];
//! assert_eq!(donation.amount.to_string(), "46.00");
//! assert_eq!(donation.currency.as_str(), "USD");
//! ```
//!
//! ## Обработка ошибок
//! Функции разбора возвращают [`Result`] с [`error::ParseError`]; любая
//! ошибка прерывает разбор целиком. Пожертвования без курса не считаются
//! ошибкой и возвращаются как [`error::LookupMiss`].

pub mod error;
pub mod normalizer;
pub mod types;

mod json_format;
mod parser;
mod schema;
mod text_format;
mod utils;

pub use parser::{SupportedFormat, dump, parse};

pub use text_format::{dump_as_text, parse_from_text, parse_text};

use error::{LookupMiss, ParseError, UnconvertedDonations};
use normalizer::NormalizeOptions;
use types::ParsedDump;

/// Дамп с пересчитанными пожертвованиями.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ingested {
    pub dump: ParsedDump,
    pub misses: Vec<LookupMiss>,
}

impl Ingested {
    /// Строгий режим: ошибка, если хотя бы одно пожертвование осталось без курса.
    pub fn require_all_converted(self) -> Result<Self, UnconvertedDonations> {
        if self.misses.is_empty() {
            Ok(self)
        } else {
            Err(UnconvertedDonations(self.misses))
        }
    }
}

/// Пересчитывает пожертвования всех сотрудников по курсам самого дампа.
pub fn normalize_dump(dump: ParsedDump, options: &NormalizeOptions) -> Ingested {
    let (employees, misses) =
        normalizer::normalize_employees(&dump.employees, &dump.exchange_rates, options);

    log::info!(
        "normalized {} employees ({} departments, {} rates) into {}, {} donations without rate",
        employees.len(),
        dump.departments.len(),
        dump.exchange_rates.len(),
        options.reference,
        misses.len()
    );

    Ingested {
        dump: ParsedDump { employees, ..dump },
        misses,
    }
}

/// Разбирает текстовый дамп и пересчитывает пожертвования в опорную валюту.
pub fn ingest(text: &str, options: &NormalizeOptions) -> Result<Ingested, ParseError> {
    Ok(normalize_dump(parse_text(text)?, options))
}

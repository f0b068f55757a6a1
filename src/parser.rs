//! Модуль верхнего уровня для чтения и записи дампов.
//!
//! Предоставляет единый интерфейс для работы с поддерживаемыми форматами
//! через функции [`parse`] и [`dump`].

use crate::{error, types};
use std::io;

/// Поддерживаемые форматы дампа.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupportedFormat {
    /// Исходный текстовый формат с маркерами `Employee` / `Rates`.
    Text,
    /// JSON-представление [`types::ParsedDump`].
    Json,
}

/// Трейт, который должны реализовывать все форматы дампа.
pub(crate) trait DumpFormat {
    /// Читает записи дампа из потока.
    fn parse(reader: &mut impl io::Read) -> Result<types::ParsedDump, error::ParseError>;
    /// Записывает записи дампа в поток.
    fn dump(writer: &mut impl io::Write, dump: &types::ParsedDump) -> Result<(), error::DumpError>;
}

/// Читает дамп из предоставленного потока в заданном формате.
///
/// ## Аргументы
///
/// * `reader` - Поток ввода (например, файл или буфер).
/// * `format` - Формат данных ([`SupportedFormat`]), который ожидается в потоке.
///
/// ## Возвращаемое значение
///
/// Возвращает разобранный дамп [`types::ParsedDump`] или ошибку [`error::ParseError`].
///
/// # Пример
///
/// ```rust
/// use payroll_dump::{parse, SupportedFormat};
///
/// let data = "Employee\nid: 1\nname: Jane\nsurname: Doe\nDepartment\nid: 10\nname: R&D\nRates\n";
/// let mut reader = data.as_bytes();
///
/// let dump = parse(&mut reader, SupportedFormat::Text).expect("Ошибка парсинга");
/// assert_eq!(dump.employees.len(), 1);
/// assert_eq!(dump.departments[0].name, "R&D");
/// ```
pub fn parse(
    reader: &mut impl io::Read,
    format: SupportedFormat,
) -> Result<types::ParsedDump, error::ParseError> {
    match format {
        SupportedFormat::Text => crate::text_format::TextFormat::parse(reader),
        SupportedFormat::Json => crate::json_format::JsonFormat::parse(reader),
    }
}

/// Записывает дамп в предоставленный поток в указанном формате.
///
/// ## Аргументы
///
/// * `writer` - Поток вывода, куда будут записаны данные.
/// * `format` - Целевой формат данных.
/// * `dump` - Записи для записи.
///
/// ## Возвращаемое значение
///
/// Возвращает `Ok(())` в случае успеха или ошибку [`error::DumpError`].
pub fn dump(
    writer: &mut impl io::Write,
    format: SupportedFormat,
    dump: &types::ParsedDump,
) -> Result<(), error::DumpError> {
    match format {
        SupportedFormat::Text => crate::text_format::TextFormat::dump(writer, dump),
        SupportedFormat::Json => crate::json_format::JsonFormat::dump(writer, dump),
    }
}

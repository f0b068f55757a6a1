use std::io;

use crate::error::{DumpError, ParseError};
use crate::parser::DumpFormat;
use crate::types::ParsedDump;

/// JSON-представление дампа: так записи передаются дальше, в хранилище.
pub(crate) struct JsonFormat;

impl DumpFormat for JsonFormat {
    fn parse(reader: &mut impl io::Read) -> Result<ParsedDump, ParseError> {
        Ok(serde_json::from_reader(io::BufReader::new(reader))?)
    }

    fn dump(writer: &mut impl io::Write, dump: &ParsedDump) -> Result<(), DumpError> {
        serde_json::to_writer_pretty(&mut *writer, dump)?;
        writeln!(writer)?;
        Ok(())
    }
}

use std::{fs, io};

use clap::Parser;
use env_logger::Env;
use payroll_dump::{
    SupportedFormat, error,
    normalizer::{MissingRatePolicy, NormalizeOptions},
    types::CurrencyCode,
};
use thiserror::Error;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Путь до файла с дампом
    #[arg(long, required = true)]
    input_file: String,

    /// Формат исходного файла: text/json
    #[arg(long, value_enum, default_value_t = KnownFormat::Text)]
    input_format: KnownFormat,

    /// Формат вывода: text/json
    #[arg(long, value_enum, default_value_t = KnownFormat::Json)]
    output_format: KnownFormat,

    /// Валюта, в которую пересчитываются пожертвования
    #[arg(long, default_value = "USD")]
    reference_currency: CurrencyCode,

    /// Не менять валюту пожертвований, для которых нет курса
    #[arg(long)]
    keep_unconverted_currency: bool,

    /// Завершиться с ошибкой, если хотя бы для одного пожертвования нет курса
    #[arg(long)]
    strict: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum KnownFormat {
    Text,
    Json,
}

impl KnownFormat {
    fn as_supported(&self) -> SupportedFormat {
        match self {
            KnownFormat::Text => SupportedFormat::Text,
            KnownFormat::Json => SupportedFormat::Json,
        }
    }
}

#[derive(Debug, Error)]
enum Error {
    #[error("{0}")]
    Parse(#[from] error::ParseError),
    #[error("{0}")]
    Dump(#[from] error::DumpError),
    #[error("{0}")]
    Usage(String),
    #[error("IO error: {0}")]
    IO(#[from] io::Error),
    #[error("{0}")]
    Unconverted(#[from] error::UnconvertedDonations),
}

impl Error {
    fn code(&self) -> i32 {
        match self {
            Self::Parse(_) => 1,
            Self::Dump(_) => 2,
            Self::Usage(_) => 3,
            Self::IO(_) => 4,
            Self::Unconverted(_) => 5,
        }
    }
}

fn run() -> Result<(), Error> {
    let args = Args::parse();

    let mut input_file = fs::File::open(&args.input_file).map_err(|err| {
        Error::Usage(format!("невозможно открыть файл {}: {}", &args.input_file, err))
    })?;

    let options = NormalizeOptions {
        reference: args.reference_currency,
        on_missing_rate: if args.keep_unconverted_currency {
            MissingRatePolicy::KeepCurrency
        } else {
            MissingRatePolicy::Relabel
        },
    };

    let parsed = payroll_dump::parse(&mut input_file, args.input_format.as_supported())?;
    let mut ingested = payroll_dump::normalize_dump(parsed, &options);

    if args.strict {
        ingested = ingested.require_all_converted().inspect_err(|err| {
            for miss in &err.0 {
                log::error!("{}", miss);
            }
        })?;
    }

    let mut output = io::stdout().lock();
    payroll_dump::dump(
        &mut output,
        args.output_format.as_supported(),
        &ingested.dump,
    )?;

    Ok(())
}

fn main() {
    env_logger::init_from_env(Env::default().default_filter_or("payroll_dump=info"));

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(e.code());
    }
}

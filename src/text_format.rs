use std::{
    collections::{HashMap, hash_map::Entry},
    io::{self, Write},
};

use crate::error::{BlockRef, DumpError, ParseError};
use crate::parser::DumpFormat;
use crate::schema::{self, Block, EmployeeHead, RATES_TOKEN, Record};
use crate::types::{Department, Donation, Employee, ExchangeRate, ParsedDump, Salary};
use crate::utils::normalized_lines;

pub(crate) struct TextFormat;

impl DumpFormat for TextFormat {
    fn parse(reader: &mut impl io::Read) -> Result<ParsedDump, ParseError> {
        parse_from_text(reader)
    }

    fn dump(writer: &mut impl io::Write, dump: &ParsedDump) -> Result<(), DumpError> {
        dump_as_text(writer, dump)
    }
}

/// Разбирает текстовый дамп целиком.
///
/// Дамп состоит из блоков `Employee`, за которыми следует один блок
/// `Rates`. Текст до первого `Employee` игнорируется.
///
/// # Ошибки
///
/// Любая ошибка прерывает разбор, частичный результат не возвращается:
/// * [`ParseError::SectionNotFound`], если нет строки `Employee` или `Rates`;
/// * [`ParseError::TruncatedRecord`], если за маркером меньше строк, чем нужно;
/// * [`ParseError::MissingDelimiter`] и [`ParseError::InvalidValue`] для
///   строк, значение которых не удаётся прочитать.
///
/// # Пример
///
/// ```rust
/// use payroll_dump::parse_text;
///
/// let dump = r#"
///     Employee
///       id: 1
///       name: Jane
///       surname: Doe
///       Department
///         id: 10
///         name: Engineering
///     Rates
///       Rate
///         date: 2024-01-02
///         sign: EUR
///         value: 0.92
/// "#;
///
/// let parsed = parse_text(dump).expect("Ошибка парсинга");
/// assert_eq!(parsed.employees[0].department.name, "Engineering");
/// assert_eq!(parsed.exchange_rates[0].value.to_string(), "0.92");
/// ```
pub fn parse_text(text: &str) -> Result<ParsedDump, ParseError> {
    let lines = normalized_lines(text);
    let (employee_blocks, rates_block) = split_blocks(&lines)?;

    let employees = employee_blocks
        .iter()
        .map(parse_employee)
        .collect::<Result<Vec<_>, _>>()?;
    let departments = derive_departments(&employees);
    let exchange_rates = schema::extract_records::<ExchangeRate>(&rates_block)?;

    log::debug!(
        "parsed {} employees, {} departments, {} exchange rates",
        employees.len(),
        departments.len(),
        exchange_rates.len()
    );

    Ok(ParsedDump {
        employees,
        departments,
        exchange_rates,
    })
}

/// Читает дамп из потока и разбирает его через [`parse_text`].
pub fn parse_from_text<R: io::Read>(mut reader: R) -> Result<ParsedDump, ParseError> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    parse_text(&text)
}

fn split_blocks<'a>(lines: &[&'a str]) -> Result<(Vec<Block<'a>>, Block<'a>), ParseError> {
    let starts: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, line)| **line == EmployeeHead::MARKER)
        .map(|(index, _)| index)
        .collect();
    if starts.is_empty() {
        return Err(ParseError::SectionNotFound {
            token: EmployeeHead::MARKER,
        });
    }

    let mut blocks: Vec<Block<'a>> = starts
        .iter()
        .enumerate()
        .map(|(n, &start)| {
            let end = starts.get(n + 1).copied().unwrap_or(lines.len());
            Block {
                id: BlockRef::Employee(n + 1),
                lines: lines[start + 1..end].to_vec(),
            }
        })
        .collect();

    // Блок курсов приклеен к последнему сотруднику.
    let rates_at = blocks
        .last()
        .and_then(|last| last.lines.iter().position(|line| *line == RATES_TOKEN));
    let (Some(at), Some(last)) = (rates_at, blocks.last_mut()) else {
        return Err(ParseError::SectionNotFound { token: RATES_TOKEN });
    };
    let mut rates_lines = last.lines.split_off(at);
    rates_lines.remove(0);

    let rates_block = Block {
        id: BlockRef::Rates,
        lines: rates_lines,
    };
    Ok((blocks, rates_block))
}

fn parse_employee(block: &Block<'_>) -> Result<Employee, ParseError> {
    let fields = schema::read_record(block, 0, EmployeeHead::MARKER, EmployeeHead::LAYOUT)?;
    let head = EmployeeHead::from_fields(&fields)?;

    log::debug!("{}: employee #{} {} {}", block.id, head.id, head.name, head.surname);

    Ok(Employee {
        id: head.id,
        name: head.name,
        surname: head.surname,
        department: head.department,
        salaries: schema::extract_records::<Salary>(block)?,
        donations: schema::extract_records::<Donation>(block)?,
    })
}

/// Собирает отделы сотрудников без повторов по `id`. Побеждает первое
/// вхождение, порядок совпадает с порядком сотрудников в дампе.
pub(crate) fn derive_departments(employees: &[Employee]) -> Vec<Department> {
    let mut seen: HashMap<_, &str> = HashMap::new();
    let mut departments = Vec::new();
    for employee in employees {
        let department = &employee.department;
        match seen.entry(department.id) {
            Entry::Vacant(slot) => {
                slot.insert(&department.name);
                departments.push(department.clone());
            }
            Entry::Occupied(stored) if *stored.get() != department.name => {
                log::warn!(
                    "employee #{} names department #{} {:?}, keeping {:?}",
                    employee.id,
                    department.id,
                    department.name,
                    stored.get()
                );
            }
            Entry::Occupied(_) => {}
        }
    }
    departments
}

fn write_salary(w: &mut impl Write, salary: &Salary) -> io::Result<()> {
    writeln!(w, "    {}", Salary::MARKER)?;
    writeln!(w, "      id: {}", salary.id)?;
    writeln!(w, "      amount: {}", salary.amount)?;
    writeln!(w, "      date: {}", salary.date)
}

fn write_donation(w: &mut impl Write, donation: &Donation) -> io::Result<()> {
    writeln!(w, "    {}", Donation::MARKER)?;
    writeln!(w, "      id: {}", donation.id)?;
    writeln!(w, "      date: {}", donation.date)?;
    writeln!(w, "      amount: {} {}", donation.amount, donation.currency)
}

fn write_employee(w: &mut impl Write, employee: &Employee) -> io::Result<()> {
    writeln!(w, "{}", EmployeeHead::MARKER)?;
    writeln!(w, "  id: {}", employee.id)?;
    writeln!(w, "  name: {}", employee.name)?;
    writeln!(w, "  surname: {}", employee.surname)?;
    writeln!(w, "  Department")?;
    writeln!(w, "    id: {}", employee.department.id)?;
    writeln!(w, "    name: {}", employee.department.name)?;
    writeln!(w, "  Salaries")?;
    for salary in &employee.salaries {
        write_salary(w, salary)?;
    }
    writeln!(w, "  Donations")?;
    for donation in &employee.donations {
        write_donation(w, donation)?;
    }
    Ok(())
}

fn write_rate(w: &mut impl Write, rate: &ExchangeRate) -> io::Result<()> {
    writeln!(w, "  {}", ExchangeRate::MARKER)?;
    writeln!(w, "    date: {}", rate.date)?;
    writeln!(w, "    sign: {}", rate.sign)?;
    writeln!(w, "    value: {}", rate.value)
}

/// Записывает записи обратно в текстовый формат дампа.
///
/// Даты пишутся в каноническом виде, суммы с двумя знаками, так что
/// результат снова читается [`parse_text`]. Отделы отдельно не пишутся:
/// они восстанавливаются из сотрудников.
pub fn dump_as_text<W: io::Write>(writer: &mut W, dump: &ParsedDump) -> Result<(), DumpError> {
    let mut w = io::BufWriter::new(writer);
    for employee in &dump.employees {
        write_employee(&mut w, employee)?;
    }
    writeln!(w, "{}", RATES_TOKEN)?;
    for rate in &dump.exchange_rates {
        write_rate(&mut w, rate)?;
    }
    w.flush()?;
    Ok(())
}

use std::collections::HashSet;

use payroll_dump::{
    Ingested, SupportedFormat,
    error::{ErrorKind, ParseError, UnconvertedDonations},
    ingest,
    normalizer::{MissingRatePolicy, NormalizeOptions},
    parse_text,
    types::Money,
};

const DUMP: &str = r#"
E-Dump
Employee
  id: 1
  name: Jane
  surname: Doe
  Department
    id: 10
    name: Engineering
  Salaries
    Salary
      id: 1
      amount: 5000
      date: Mon Jan 01 2024
  Donations
    Donation
      id: 1
      date: Tue Jan 02 2024
      amount: 50.00 EUR
    Donation
      id: 2
      date: Wed Jan 03 2024
      amount: 19.999 GBP
Employee
  id: 2
  name: John
  surname: Smith
  Department
    id: 11
    name: Finance
  Salaries
    Salary
      id: 2
      amount: 4200.10
      date: Mon Jan 01 2024
  Donations
    Donation
      id: 3
      date: Tue Jan 02 2024
      amount: 10 CHF
Employee
  id: 3
  name: Ada
  surname: Byron
  Department
    id: 10
    name: Engineering
  Donations
    Donation
      id: 4
      date: Tue Jan 02 2024
      amount: 100 USD
    Donation
      id: 5
      date: Tue Jan 02 2024
      amount: 0.004 EUR
Rates
  Rate
    date: Tue Jan 02 2024
    sign: EUR
    value: 0.92
  Rate
    date: Wed Jan 03 2024
    sign: GBP
    value: 1.27
"#;

fn is_two_digit_amount(s: &str) -> bool {
    let digits = s.strip_prefix('-').unwrap_or(s);
    match digits.split_once('.') {
        Some((int, frac)) => {
            !int.is_empty()
                && int.chars().all(|c| c.is_ascii_digit())
                && frac.len() == 2
                && frac.chars().all(|c| c.is_ascii_digit())
        }
        None => false,
    }
}

#[test]
fn departments_match_distinct_referenced_ids() {
    let dump = parse_text(DUMP).expect("parse");
    let referenced: HashSet<u64> = dump.employees.iter().map(|e| e.department.id).collect();
    let emitted: Vec<u64> = dump.departments.iter().map(|d| d.id).collect();

    assert_eq!(referenced.len(), dump.departments.len());
    assert_eq!(emitted, vec![10, 11]);
}

#[test]
fn every_amount_has_two_fraction_digits() {
    let Ingested { dump, .. } = ingest(DUMP, &NormalizeOptions::default()).expect("ingest");

    let mut amounts: Vec<&Money> = Vec::new();
    for employee in &dump.employees {
        amounts.extend(employee.salaries.iter().map(|s| &s.amount));
        amounts.extend(employee.donations.iter().map(|d| &d.amount));
    }
    amounts.extend(dump.exchange_rates.iter().map(|r| &r.value));

    assert!(!amounts.is_empty());
    for amount in amounts {
        let rendered = amount.to_string();
        assert!(is_two_digit_amount(&rendered), "bad amount {rendered}");
    }

    // 0.004 EUR округляется до нуля, ноль тоже печатается с двумя знаками
    let ada = &dump.employees[2];
    assert_eq!(ada.donations[1].amount.to_string(), "0.00");
    let json = serde_json::to_value(&ada.donations[1]).expect("json");
    assert_eq!(json["amount"], "0.00");
}

#[test]
fn donations_convert_with_matching_rate() {
    let ingested = ingest(DUMP, &NormalizeOptions::default()).expect("ingest");
    let jane = &ingested.dump.employees[0];

    // 50.00 * 0.92
    assert_eq!(jane.donations[0].amount.to_string(), "46.00");
    assert_eq!(jane.donations[0].currency.as_str(), "USD");
    // 19.999 -> 20.00, затем 20.00 * 1.27
    assert_eq!(jane.donations[1].amount.to_string(), "25.40");
    assert_eq!(jane.donations[1].currency.as_str(), "USD");
}

#[test]
fn donation_without_rate_keeps_amount() {
    let legacy = ingest(DUMP, &NormalizeOptions::default()).expect("ingest");
    let chf = &legacy.dump.employees[1].donations[0];
    assert_eq!(chf.amount.to_string(), "10.00");
    assert_eq!(chf.currency.as_str(), "USD");
    assert_eq!(legacy.misses.len(), 1);
    assert_eq!(legacy.misses[0].donation_id, 3);

    let corrected = ingest(
        DUMP,
        &NormalizeOptions {
            on_missing_rate: MissingRatePolicy::KeepCurrency,
            ..NormalizeOptions::default()
        },
    )
    .expect("ingest");
    let chf = &corrected.dump.employees[1].donations[0];
    assert_eq!(chf.amount.to_string(), "10.00");
    assert_eq!(chf.currency.as_str(), "CHF");
}

#[test]
fn reference_currency_donation_passes_through() {
    let ingested = ingest(DUMP, &NormalizeOptions::default()).expect("ingest");
    let ada = &ingested.dump.employees[2];
    assert_eq!(ada.donations[0].amount.to_string(), "100.00");
    assert_eq!(ada.donations[0].currency.as_str(), "USD");
}

#[test]
fn single_employee_round_trip() {
    let text = r#"
        Employee
          id: 1
          name: Jane
          surname: Doe
          Department
            id: 10
            name: Engineering
          Salary
            id: 1
            amount: 100.00
            date: 2024-01-01
          Donation
            id: 1
            date: 2024-01-02
            amount: 50.00 EUR
        Rates
          Rate
            date: 2024-01-02
            sign: EUR
            value: 0.92
    "#;
    let ingested = ingest(text, &NormalizeOptions::default()).expect("ingest");

    assert_eq!(ingested.dump.employees.len(), 1);
    let employee = &ingested.dump.employees[0];
    assert_eq!(employee.salaries.len(), 1);
    assert_eq!(employee.salaries[0].amount.to_string(), "100.00");
    assert_eq!(employee.donations.len(), 1);
    assert_eq!(employee.donations[0].amount.to_string(), "46.00");
    assert_eq!(employee.donations[0].currency.as_str(), "USD");
    assert!(ingested.misses.is_empty());
}

#[test]
fn missing_employee_token_is_structural() {
    let text = DUMP.replace("Employee\n", "Person\n");
    let err = ingest(&text, &NormalizeOptions::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Structural);
    assert!(matches!(err, ParseError::SectionNotFound { token: "Employee" }));
}

#[test]
fn bad_date_is_field_error() {
    let text = DUMP.replace("date: Wed Jan 03 2024\n      amount", "date: someday\n      amount");
    let err = parse_text(&text).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Field);
    assert!(matches!(err, ParseError::InvalidValue { field: "date", .. }));
}

#[test]
fn normalized_dump_survives_text_and_json() {
    let ingested = ingest(DUMP, &NormalizeOptions::default()).expect("ingest");

    for format in [SupportedFormat::Text, SupportedFormat::Json] {
        let mut out = Vec::new();
        payroll_dump::dump(&mut out, format, &ingested.dump).expect("dump");
        let back = payroll_dump::parse(&mut out.as_slice(), format).expect("parse back");
        assert_eq!(back, ingested.dump, "format {format:?}");
    }
}

#[test]
fn exponent_amount_is_rejected() {
    let text = DUMP.replace("amount: 50.00 EUR", "amount: 1e20000000 EUR");
    let err = parse_text(&text).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Field);
    assert!(matches!(
        err,
        ParseError::InvalidValue { field: "amount", ref value, .. } if value == "1e20000000"
    ));

    let text = DUMP.replace("amount: 5000", "amount: 5E3");
    let err = parse_text(&text).unwrap_err();
    assert!(matches!(err, ParseError::InvalidValue { field: "amount", .. }));
}

#[test]
fn fractional_second_donation_uses_whole_second_rate() {
    let text = r#"
        Employee
          id: 1
          name: Jane
          surname: Doe
          Department
            id: 10
            name: Engineering
          Donation
            id: 1
            date: 2024-01-02T00:00:00.250Z
            amount: 50.00 EUR
        Rates
          Rate
            date: 2024-01-02T00:00:00Z
            sign: EUR
            value: 0.92
    "#;
    let parsed = parse_text(text).expect("parse");
    assert_eq!(
        parsed.employees[0].donations[0].date,
        parsed.exchange_rates[0].date
    );

    let mut out = Vec::new();
    payroll_dump::dump(&mut out, SupportedFormat::Text, &parsed).expect("dump");
    let back = payroll_dump::parse(&mut out.as_slice(), SupportedFormat::Text).expect("parse back");
    assert_eq!(back, parsed);

    let ingested = ingest(text, &NormalizeOptions::default()).expect("ingest");
    assert!(ingested.misses.is_empty());
    assert_eq!(ingested.dump.employees[0].donations[0].amount.to_string(), "46.00");
}

#[test]
fn strict_mode_reports_unconverted_donations() {
    let ingested = ingest(DUMP, &NormalizeOptions::default()).expect("ingest");
    let UnconvertedDonations(misses) = ingested.require_all_converted().unwrap_err();
    assert_eq!(misses.len(), 1);
    assert_eq!(misses[0].donation_id, 3);

    let text = DUMP.replace("amount: 10 CHF", "amount: 10 USD");
    let ingested = ingest(&text, &NormalizeOptions::default()).expect("ingest");
    assert!(ingested.require_all_converted().is_ok());
}

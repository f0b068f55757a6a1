//! Пересчёт пожертвований в опорную валюту.
//!
//! Курс применяется только при точном совпадении валюты и даты
//! пожертвования, никакой интерполяции между датами нет.

use std::collections::HashMap;

use crate::error::LookupMiss;
use crate::types::{CurrencyCode, Donation, Employee, ExchangeRate, Money, Timestamp};

/// Что делать с пожертвованием, для которого не нашлось курса.
///
/// Сумма в обоих случаях остаётся прежней.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MissingRatePolicy {
    /// Валюта всё равно заменяется на опорную. Так ведёт себя исходная
    /// выгрузка, но непересчитанная сумма при этом помечена как опорная.
    #[default]
    Relabel,
    /// Валюта пожертвования не меняется.
    KeepCurrency,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizeOptions {
    pub reference: CurrencyCode,
    pub on_missing_rate: MissingRatePolicy,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        NormalizeOptions {
            reference: CurrencyCode::USD,
            on_missing_rate: MissingRatePolicy::default(),
        }
    }
}

/// Курсы, проиндексированные по паре (валюта, дата). Если на одну пару
/// записано несколько курсов, действует первый.
#[derive(Debug)]
pub struct RateIndex<'a> {
    rates: HashMap<(CurrencyCode, Timestamp), &'a Money>,
}

impl<'a> RateIndex<'a> {
    pub fn new(rates: &'a [ExchangeRate]) -> Self {
        let mut index = HashMap::with_capacity(rates.len());
        for rate in rates {
            index.entry((rate.sign, rate.date)).or_insert(&rate.value);
        }
        RateIndex { rates: index }
    }

    pub fn lookup(&self, currency: CurrencyCode, date: Timestamp) -> Option<&'a Money> {
        self.rates.get(&(currency, date)).copied()
    }
}

/// Результат пересчёта: пожертвования в исходном порядке и все промахи.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Normalized {
    pub donations: Vec<Donation>,
    pub misses: Vec<LookupMiss>,
}

fn normalize_one(
    donation: &Donation,
    rates: &RateIndex<'_>,
    options: &NormalizeOptions,
) -> (Donation, Option<LookupMiss>) {
    if let Some(rate) = rates.lookup(donation.currency, donation.date) {
        let converted = Donation {
            amount: donation.amount.convert(rate),
            currency: options.reference,
            ..donation.clone()
        };
        return (converted, None);
    }

    if donation.currency == options.reference {
        return (donation.clone(), None);
    }

    let miss = LookupMiss {
        donation_id: donation.id,
        currency: donation.currency,
        date: donation.date,
    };
    log::warn!("{}, amount {} left unconverted", miss, donation.amount);

    let currency = match options.on_missing_rate {
        MissingRatePolicy::Relabel => options.reference,
        MissingRatePolicy::KeepCurrency => donation.currency,
    };
    (
        Donation {
            currency,
            ..donation.clone()
        },
        Some(miss),
    )
}

/// Пересчитывает пожертвования в опорную валюту.
///
/// Для каждого пожертвования ищется курс с той же валютой и той же датой.
/// Если курс найден, сумма умножается на него и округляется до двух
/// знаков. Если нет, сумма не меняется, промах попадает в
/// [`Normalized::misses`], а валюта выставляется согласно
/// [`MissingRatePolicy`].
///
/// # Пример
///
/// ```rust
/// use payroll_dump::normalizer::{normalize, NormalizeOptions};
/// use payroll_dump::types::{Donation, ExchangeRate};
///
/// let donation = Donation {
///     id: 1,
///     date: "2024-01-02".parse().unwrap(),
///     amount: "50.00".parse().unwrap(),
///     currency: "EUR".parse().unwrap(),
/// };
/// let rate = ExchangeRate {
///     date: "2024-01-02".parse().unwrap(),
///     sign: "EUR".parse().unwrap(),
///     value: "0.92".parse().unwrap(),
/// };
///
/// let result = normalize(&[donation], &[rate], &NormalizeOptions::default());
/// assert_eq!(result.donations[0].amount.to_string(), "46.00");
/// assert_eq!(result.donations[0].currency.as_str(), "USD");
/// assert!(result.misses.is_empty());
/// ```
pub fn normalize(
    donations: &[Donation],
    rates: &[ExchangeRate],
    options: &NormalizeOptions,
) -> Normalized {
    normalize_with_index(donations, &RateIndex::new(rates), options)
}

pub fn normalize_with_index(
    donations: &[Donation],
    rates: &RateIndex<'_>,
    options: &NormalizeOptions,
) -> Normalized {
    let mut result = Normalized {
        donations: Vec::with_capacity(donations.len()),
        misses: Vec::new(),
    };
    for donation in donations {
        let (donation, miss) = normalize_one(donation, rates, options);
        result.donations.push(donation);
        result.misses.extend(miss);
    }
    result
}

/// Пересчитывает пожертвования каждого сотрудника.
pub fn normalize_employees(
    employees: &[Employee],
    rates: &[ExchangeRate],
    options: &NormalizeOptions,
) -> (Vec<Employee>, Vec<LookupMiss>) {
    let index = RateIndex::new(rates);
    let mut misses = Vec::new();
    let employees: Vec<Employee> = employees
        .iter()
        .map(|employee| {
            let normalized = normalize_with_index(&employee.donations, &index, options);
            misses.extend(normalized.misses);
            Employee {
                donations: normalized.donations,
                ..employee.clone()
            }
        })
        .collect();
    (employees, misses)
}

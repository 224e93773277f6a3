use std::str::FromStr;

use csv::{ReaderBuilder, Trim};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::providers::ProviderError;

//NOTE: hledger joins the amounts of a multi-commodity balance with ", "
const COMMODITY_SEPARATOR: &str = ", ";

/// One row of `hledger balance -O csv`.
#[derive(Debug, Deserialize)]
struct BalanceRow {
    account: String,
    balance: String
}

/// Sums every amount in `commodity` found in a CSV balance report.
///
/// Returns `None` when the report holds no amount in that commodity.
pub fn sum_commodity(report: &str, commodity: &str) -> Result<Option<Decimal>, ProviderError> {
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(report.as_bytes());

    let mut total: Option<Decimal> = None;

    for row in reader.deserialize::<BalanceRow>() {
        let row = row?;

        if row.account.eq_ignore_ascii_case("total") || row.account.eq_ignore_ascii_case("total:") {
            continue;
        }

        for cell in row.balance.split(COMMODITY_SEPARATOR).map(str::trim) {
            if cell.is_empty() || cell == "0" {
                continue;
            }

            let (quantity, currency) = parse_report_amount(cell)?;

            if currency == commodity {
                let sum = total.unwrap_or(Decimal::ZERO).checked_add(quantity)
                    .ok_or_else(|| ProviderError::ReportAmount { input: cell.to_string() })?;
                total = Some(sum);
            }
        }
    }

    Ok(total)
}

/// Reads an amount as hledger prints it: `100.00 EUR`, `EUR 100.00`, `$-5`,
/// `-$5` or `5€`, with either `.` or `,` as the decimal mark.
pub fn parse_report_amount(cell: &str) -> Result<(Decimal, String), ProviderError> {
    let tokens: Vec<&str> = cell.split_whitespace().collect();

    let parsed = match tokens.as_slice() {
        [first, second] => parse_number(first).map(|quantity| (quantity, *second))
            .or_else(|| parse_number(second).map(|quantity| (quantity, *first))),
        [single] => split_symbol(single),
        _ => None
    };

    parsed
        .map(|(quantity, currency)| (quantity, currency.trim_matches('"').to_string()))
        .filter(|(_, currency)| !currency.is_empty())
        .ok_or_else(|| ProviderError::ReportAmount { input: cell.to_string() })
}

fn split_symbol(token: &str) -> Option<(Decimal, &str)> {
    if let Some(rest) = token.strip_prefix('-') {
        if !rest.starts_with(|character: char| character.is_ascii_digit()) {
            return split_symbol(rest).map(|(quantity, currency)| (-quantity, currency));
        }
    }

    let start = token.find(|character: char| character.is_ascii_digit() || character == '-' || character == '+')?;

    if start > 0 {
        return parse_number(&token[start..]).map(|quantity| (quantity, &token[..start]));
    }

    let end = token.rfind(|character: char| character.is_ascii_digit())? + 1;
    parse_number(&token[..end]).map(|quantity| (quantity, &token[end..]))
}

/// Parses a number in either `1,234.56` or `1.234,56` style.
///
/// The mark that appears last and only once is the decimal mark, the other one
/// groups digits. A lone comma followed by exactly three digits could be
/// either, so it is rejected rather than guessed.
fn parse_number(text: &str) -> Option<Decimal> {
    let commas = text.matches(',').count();
    let dots = text.matches('.').count();

    let decimal_mark = match (commas, dots) {
        (0, 0) => None,
        (0, 1) => Some('.'),
        (0, _) | (_, 0) if commas > 1 || dots > 1 => None,
        (1, 0) => {
            let fraction = text.rsplit(',').next()?;
            if fraction.len() == 3 {
                return None;
            }
            Some(',')
        }
        _ => {
            let mark = if text.rfind(',') > text.rfind('.') { ',' } else { '.' };
            if text.matches(mark).count() != 1 {
                return None;
            }
            Some(mark)
        }
    };

    let integer = match decimal_mark {
        Some(mark) => text.split(mark).next().unwrap_or(text),
        None => text
    };
    let well_grouped = [',', '.'].into_iter()
        .filter(|separator| Some(*separator) != decimal_mark)
        .all(|separator| integer.split(separator).skip(1).all(|group| group.len() == 3));

    if !well_grouped {
        return None;
    }

    let normalized: String = text.chars()
        .filter_map(|character| match character {
            ',' | '.' if Some(character) == decimal_mark => Some('.'),
            ',' | '.' => None,
            other => Some(other)
        })
        .collect();

    Decimal::from_str(&normalized).ok()
}

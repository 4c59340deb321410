//! Plain-text rendering of engine results.

use std::path::PathBuf;

use engine::{Aggregate, Breakdown, RecordKind, ReferenceCurrency, Summary, UserId};

pub fn aggregate(kind: RecordKind, aggregate: &Aggregate, currency: ReferenceCurrency) -> String {
    if aggregate.is_empty() {
        return format!("No valid rows in the {kind} file.");
    }
    let mut text = String::new();
    for (ticker, value) in aggregate.iter() {
        text.push_str(&format!(
            "{:<8} {}\n",
            ticker.to_uppercase(),
            value.format_in(currency)
        ));
    }
    text.push_str(&format!(
        "{:<8} {}",
        "TOTAL",
        aggregate.total().format_in(currency)
    ));
    text
}

pub fn summary(summary: &Summary, currency: ReferenceCurrency) -> String {
    format!(
        "Total Summary ({code})\n\
         Total Deposits:    {deposited}\n\
         Total Withdrawals: {withdrawn}\n\
         {status:<18} {profit}",
        code = currency.code(),
        deposited = summary.total_deposited.format_in(currency),
        withdrawn = summary.total_withdrawn.format_in(currency),
        status = format!("{}:", summary.status),
        profit = summary.profit_or_loss.format_in(currency),
    )
}

pub fn breakdown(lines: &Breakdown, currency: ReferenceCurrency) -> String {
    let mut text = String::from("Detailed Breakdown");
    for line in lines {
        let ticker = line.currency.to_uppercase();
        text.push_str(&format!(
            "\n{ticker} Deposits: {}  {ticker} Withdrawals: {}  {ticker} Profit: {}",
            line.deposited.format_in(currency),
            line.withdrawn.format_in(currency),
            line.profit_or_loss.format_in(currency),
        ));
    }
    text
}

pub fn registered(entries: &[(UserId, RecordKind, PathBuf)]) -> String {
    if entries.is_empty() {
        return "No files registered.".to_string();
    }
    entries
        .iter()
        .map(|(user_id, kind, path)| format!("{user_id}\t{kind}\t{}", path.display()))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn cleared(count: usize) -> String {
    if count > 0 {
        "Successfully deleted your deposit and withdrawal files.".to_string()
    } else {
        "No files were found to delete.".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::{CurrencyLine, Money, Status};

    fn money(cents: i64) -> Money {
        Money::from_cents(cents)
    }

    #[test]
    fn summary_shows_signed_profit() {
        let summary = Summary {
            total_deposited: money(100_000),
            total_withdrawn: money(120_000),
            profit_or_loss: money(20_000),
            status: Status::Profit,
        };
        assert_eq!(
            super::summary(&summary, ReferenceCurrency::Eur),
            "Total Summary (EUR)\n\
             Total Deposits:    €1000.00\n\
             Total Withdrawals: €1200.00\n\
             Profit:            €200.00"
        );
    }

    #[test]
    fn breakdown_lists_every_currency() {
        let lines = vec![CurrencyLine {
            currency: "btc".to_string(),
            deposited: money(50_000),
            withdrawn: money(0),
            profit_or_loss: money(-50_000),
        }];
        assert_eq!(
            breakdown(&lines, ReferenceCurrency::Eur),
            "Detailed Breakdown\nBTC Deposits: €500.00  BTC Withdrawals: €0.00  BTC Profit: -€500.00"
        );
    }

    #[test]
    fn aggregate_ends_with_total() {
        let aggregate: Aggregate = [("btc", money(50_000)), ("xyz", money(0))]
            .into_iter()
            .collect();
        assert_eq!(
            super::aggregate(RecordKind::Deposit, &aggregate, ReferenceCurrency::Eur),
            "BTC      €500.00\nXYZ      €0.00\nTOTAL    €500.00"
        );
    }

    #[test]
    fn cleared_message_depends_on_count() {
        assert_eq!(cleared(0), "No files were found to delete.");
        assert!(cleared(2).starts_with("Successfully"));
    }
}

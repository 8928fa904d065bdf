// 🔍 Deduplication - drop repeated transactions across overlapping snapshots
//
// Exact match only: two rows are the same charge when date/time, location and
// approved amount all match as printed. Requested amount is not part of the key.

use crate::model::Transaction;
use std::collections::{HashMap, HashSet};

/// Dedup identity of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransactionKey<'a> {
    pub date_time: &'a str,
    pub location: &'a str,
    pub approved_amount: &'a str,
}

impl<'a> TransactionKey<'a> {
    pub fn of(tx: &'a Transaction) -> Self {
        TransactionKey {
            date_time: &tx.date_time,
            location: &tx.location,
            approved_amount: &tx.approved_amount,
        }
    }
}

/// Outcome of a dedup pass
#[derive(Debug, Clone, PartialEq)]
pub struct DedupResult {
    pub transactions: Vec<Transaction>,
    pub removed: usize,
}

/// Keep the first occurrence of every key, preserving order
pub fn dedup_transactions(mut transactions: Vec<Transaction>) -> DedupResult {
    let total = transactions.len();
    let mut seen: HashSet<(String, String, String)> = HashSet::with_capacity(total);

    transactions.retain(|tx| {
        seen.insert((
            tx.date_time.clone(),
            tx.location.clone(),
            tx.approved_amount.clone(),
        ))
    });

    DedupResult {
        removed: total - transactions.len(),
        transactions,
    }
}

/// Index pairs (first, repeat) for every transaction whose key was already seen
pub fn find_duplicates(transactions: &[Transaction]) -> Vec<(usize, usize)> {
    let mut first_seen: HashMap<TransactionKey<'_>, usize> = HashMap::new();
    let mut matches = Vec::new();

    for (i, tx) in transactions.iter().enumerate() {
        let first = *first_seen.entry(TransactionKey::of(tx)).or_insert(i);
        if first != i {
            matches.push((first, i));
        }
    }

    matches
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(date_time: &str, location: &str, approved: &str) -> Transaction {
        Transaction::new(location, date_time, approved, approved)
    }

    #[test]
    fn test_dedup_keeps_first_occurrence_in_order() {
        let input = vec![
            tx("09/01/2024 12:00 PM", "Schatz", "1"),
            tx("09/01/2024 06:00 PM", "Exchange", "1"),
            tx("09/01/2024 12:00 PM", "Schatz", "1"),
            tx("09/02/2024 08:00 AM", "Tartan Express", "$4.50"),
        ];

        let result = dedup_transactions(input);

        assert_eq!(result.removed, 1);
        assert_eq!(result.transactions.len(), 3);
        assert_eq!(result.transactions[0].location, "Schatz");
        assert_eq!(result.transactions[1].location, "Exchange");
        assert_eq!(result.transactions[2].location, "Tartan Express");

        println!("✅ Dedup test passed: removed {}", result.removed);
    }

    #[test]
    fn test_requested_amount_is_not_part_of_key() {
        let mut a = tx("09/01/2024 12:00 PM", "Schatz", "$5.00");
        let mut b = a.clone();
        a.requested_amount = "$6.00".to_string();
        b.requested_amount = "$5.00".to_string();

        let result = dedup_transactions(vec![a.clone(), b]);
        assert_eq!(result.transactions, vec![a]);
    }

    #[test]
    fn test_different_amount_same_time_is_kept() {
        let result = dedup_transactions(vec![
            tx("09/01/2024 12:00 PM", "Schatz", "$5.00"),
            tx("09/01/2024 12:00 PM", "Schatz", "$5.50"),
        ]);
        assert_eq!(result.removed, 0);
    }

    #[test]
    fn test_find_duplicates_reports_pairs() {
        let input = vec![
            tx("a", "x", "1"),
            tx("b", "x", "1"),
            tx("a", "x", "1"),
            tx("a", "x", "1"),
        ];

        assert_eq!(find_duplicates(&input), vec![(0, 2), (0, 3)]);
        assert!(find_duplicates(&input[..2]).is_empty());
    }
}

//! Settlement engine
//!
//! Turns "who paid how much" into "who sends whom how much" so that every
//! participant ends up having paid the average. Each debtor's shortfall is
//! split across all creditors in proportion to how much each creditor is
//! owed.
//!
//! Transfer amounts are rounded to cents one by one, so the sum of a group's
//! rounded transfers can differ from its rounded net by up to a cent per
//! transfer. That drift is accepted rather than redistributed, and a share
//! smaller than half a cent is still listed (as `0.00`).

use tracing::debug;

use crate::{Contributions, SettlementError};

/// Nets closer to zero than this count as even (float noise in the average)
const EVEN_EPSILON: f64 = 1e-9;

/// A directed payment from a debtor to a creditor
#[derive(Debug, Clone, PartialEq)]
pub struct Transfer {
    pub debtor: String,
    pub creditor: String,
    /// Rounded to two decimals; the unrounded share was positive
    pub amount: f64,
}

/// Result of settling one group
#[derive(Debug, Clone, PartialEq)]
pub struct Settlement {
    /// Grouped by creditor (creditor order), then debtor order within a group
    pub transfers: Vec<Transfer>,
    pub total: f64,
    pub average: f64,
    pub participants: usize,
}

/// Transfers owed to one creditor
#[derive(Debug, Clone, PartialEq)]
pub struct CreditorGroup<'a> {
    pub creditor: &'a str,
    pub transfers: Vec<&'a Transfer>,
}

impl Settlement {
    /// True when nobody owes anybody.
    ///
    /// Every positive debt produces a transfer, even one that rounds to
    /// zero, so an empty list means everyone paid the average.
    pub fn is_even(&self) -> bool {
        self.transfers.is_empty()
    }

    /// Transfers grouped per creditor, preserving creditor order
    pub fn by_creditor(&self) -> Vec<CreditorGroup<'_>> {
        let mut groups: Vec<CreditorGroup<'_>> = Vec::new();

        for transfer in &self.transfers {
            match groups
                .iter()
                .position(|g| g.creditor == transfer.creditor.as_str())
            {
                Some(index) => groups[index].transfers.push(transfer),
                None => groups.push(CreditorGroup {
                    creditor: transfer.creditor.as_str(),
                    transfers: vec![transfer],
                }),
            }
        }

        groups
    }
}

/// Round to whole cents
pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Compute the transfers that equalize everyone's contribution
pub fn compute_settlement(contributions: &Contributions) -> Result<Settlement, SettlementError> {
    if contributions.is_empty() {
        return Err(SettlementError::EmptyContributions);
    }

    let participants = contributions.len();
    let total = contributions.total();
    let average = total / participants as f64;

    let nets: Vec<(&str, f64)> = contributions
        .iter()
        .map(|c| (c.name.as_str(), c.amount - average))
        .collect();

    let creditors: Vec<(&str, f64)> = nets
        .iter()
        .filter(|(_, net)| *net > EVEN_EPSILON)
        .copied()
        .collect();
    let debtors: Vec<(&str, f64)> = nets
        .iter()
        .filter(|(_, net)| *net < -EVEN_EPSILON)
        .map(|(name, net)| (*name, -net))
        .collect();

    let total_credit: f64 = creditors.iter().map(|(_, credit)| credit).sum();

    let mut transfers = Vec::new();
    if total_credit > 0.0 {
        // Creditor-major: transfers come out already grouped
        for (creditor, credit) in &creditors {
            let share = credit / total_credit;
            for (debtor, debt) in &debtors {
                let amount = debt * share;
                if amount > 0.0 {
                    transfers.push(Transfer {
                        debtor: (*debtor).to_string(),
                        creditor: (*creditor).to_string(),
                        amount: round_cents(amount),
                    });
                }
            }
        }
    }

    debug!(
        participants,
        total,
        average,
        creditors = creditors.len(),
        debtors = debtors.len(),
        transfers = transfers.len(),
        "Settlement computed"
    );

    Ok(Settlement {
        transfers,
        total,
        average,
        participants,
    })
}

use super::money::{self, EPSILON_CENTS};
use super::{SettlementEntity, Transfer};
use log::debug;

/// Greedy largest-creditor-versus-largest-debtor matching.
///
/// Works on an internal copy of the balances in integer cents; the input
/// entities are never mutated. Each round the biggest remaining creditor is
/// paid by the most-negative remaining debtor, the smaller of the two
/// magnitudes changes hands, and whoever reaches zero drops out. Ties go to
/// whichever entity appeared first in `entities` — the list is scanned, not
/// re-sorted, so the sequence is stable and deterministic.
///
/// If the balances do not sum to zero the loop runs out of one side early
/// and the other side keeps its residual; no error is raised.
pub fn settle(entities: &[SettlementEntity]) -> Vec<Transfer> {
    // (index into `entities`, remaining balance in cents)
    let mut open: Vec<(usize, i64)> = entities
        .iter()
        .enumerate()
        .map(|(index, entity)| (index, money::to_cents(entity.balance)))
        .filter(|(_, cents)| cents.abs() > EPSILON_CENTS)
        .collect();

    let mut transfers = Vec::new();

    loop {
        let mut creditor: Option<usize> = None;
        let mut debtor: Option<usize> = None;
        for (position, &(_, cents)) in open.iter().enumerate() {
            if cents > EPSILON_CENTS {
                if creditor.is_none_or(|c| cents > open[c].1) {
                    creditor = Some(position);
                }
            } else if debtor.is_none_or(|d| cents < open[d].1) {
                debtor = Some(position);
            }
        }

        let (creditor, debtor) = match (creditor, debtor) {
            (Some(c), Some(d)) => (c, d),
            _ => break,
        };

        let amount = open[creditor].1.min(-open[debtor].1);
        transfers.push(Transfer {
            from_entity_id: entities[open[debtor].0].entity_id.clone(),
            to_entity_id: entities[open[creditor].0].entity_id.clone(),
            amount: money::from_cents(amount),
        });

        open[creditor].1 -= amount;
        open[debtor].1 += amount;
        open.retain(|&(_, cents)| cents.abs() > EPSILON_CENTS);
    }

    debug!(
        "settled {} entities with {} transfers",
        entities.len(),
        transfers.len()
    );
    transfers
}

use crate::models::{Group, Session};
use crate::service::SessionSettlementResponse;
use log::debug;

// Renders a computed settlement into a plain-text message that can be
// pasted straight into the group chat.
pub struct WhatsAppMessage;

impl WhatsAppMessage {
    /// Builds the shareable summary for one session.
    ///
    /// # Arguments
    /// * `group` - The group the session belongs to (name and currency).
    /// * `session` - The session, with every player cashed out.
    /// * `settlement` - The computed settlement for that session.
    ///
    /// # Returns
    /// A multi-line text: header, per-player results, payment lines, and a
    /// warning when the chip counts do not balance.
    pub fn render(
        group: &Group,
        session: &Session,
        settlement: &SessionSettlementResponse,
    ) -> String {
        debug!(
            "rendering settlement message for session {} with {} lines",
            session.id,
            settlement.lines().len()
        );

        let symbol = group.currency_symbol.as_str();
        let mut message = format!(
            "🃏 {} — {} ({})\n",
            group.name,
            session.label,
            session.played_at.format("%d %b %Y")
        );

        message.push_str("\nResults:\n");
        for player in &session.players {
            if let Some(net) = player.net_result() {
                message.push_str(&format!(
                    "  {}: {}\n",
                    player.display_name,
                    Self::signed_amount(symbol, net)
                ));
            }
        }

        message.push_str("\nPayments:\n");
        if settlement.lines().is_empty() {
            message.push_str("  No payments needed — everyone is even.\n");
        } else {
            for line in settlement.lines() {
                message.push_str(&format!(
                    "  {} ➜ {}: {}{:.2}\n",
                    line.from_name, line.to_name, symbol, line.amount
                ));
            }
        }

        if !settlement.is_balanced() {
            message.push_str(&format!(
                "\n⚠️ Chip counts are off by {}{:.2} — double-check the buy-ins and cash-outs.\n",
                symbol,
                settlement.imbalance().abs()
            ));
        }

        message
    }

    /// Tally line for one player, e.g. `+$25.00` or `-$12.50`.
    fn signed_amount(symbol: &str, amount: f64) -> String {
        if amount >= 0.0 {
            format!("+{}{:.2}", symbol, amount)
        } else {
            format!("-{}{:.2}", symbol, amount.abs())
        }
    }
}

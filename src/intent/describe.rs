//! Readback phrases for confirmed intents.

use super::Intent;

/// Describe an intent as one sentence, used for spoken readback and on-screen echo.
pub fn describe(intent: &Intent) -> String {
    match intent {
        Intent::SendMoney { amount, phone } => format!("Send {amount} shillings to {phone}."),
        Intent::Pochi { amount, phone } => format!("Send {amount} shillings to the pochi of {phone}."),
        Intent::Paybill { amount, business, account } => {
            format!("Pay {amount} shillings to paybill {business}, account {account}.")
        }
        Intent::Till { amount, till } => format!("Pay {amount} shillings to till number {till}."),
        Intent::Withdraw { amount, agent, store } => {
            format!("Withdraw {amount} shillings from agent {agent}, store {store}.")
        }
    }
}

use async_trait::async_trait;
use log::warn;
use mcw_core::errors::WalletError;

const SAVE_ATTEMPTS: u32 = 3;

/// External storage for user notes attached to broadcast transactions.
/// The storage itself (file, service) is outside the engine.
#[async_trait]
pub trait NoteStore: Send + Sync {
    async fn save_note(&self, transaction_id: &str, note: &str) -> Result<(), WalletError>;
}

/// Saves a note, retrying up to three attempts before giving up. A lost
/// note must not fail the broadcast that produced it, so callers decide
/// whether to surface the final error.
pub async fn save_note_with_retries(
    store: &dyn NoteStore,
    transaction_id: &str,
    note: &str,
) -> Result<(), WalletError> {
    let mut last_error = None;
    for attempt in 1..=SAVE_ATTEMPTS {
        match store.save_note(transaction_id, note).await {
            Ok(()) => return Ok(()),
            Err(e) => {
                warn!("saving note for {transaction_id} failed (attempt {attempt}): {e}");
                last_error = Some(e);
            }
        }
    }
    Err(last_error.unwrap_or_else(|| {
        WalletError::UnexpectedResponse("note store failed without an error".to_string())
    }))
}

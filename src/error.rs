//! Error taxonomy for seating operations.

use thiserror::Error;

use crate::types::{ChairRef, TableKey};

#[derive(Debug, Error)]
pub enum SeatingError {
    /// Auto-seat cannot fit every unseated guest. Nothing was seated.
    #[error("need {shortfall} more seats to fit the rest of the guests")]
    InsufficientCapacity { shortfall: usize },

    /// The guest already sits elsewhere; the caller must confirm a move.
    #[error("guest {guest_id} is already seated at {existing}")]
    GuestAlreadySeated { guest_id: String, existing: ChairRef },

    /// A layout document is missing required fields or carries bad values.
    #[error("malformed layout document: {0}")]
    MalformedDocument(String),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no table {0}")]
    UnknownTable(TableKey),

    #[error("no chair {0}")]
    UnknownChair(ChairRef),

    #[error("no guest with id {0}")]
    UnknownGuest(String),

    #[error("no decor item at index {0}")]
    UnknownItem(usize),

    #[error("nothing to undo")]
    NothingToUndo,

    #[error("no table has been copied")]
    EmptyClipboard,
}

pub type Result<T> = std::result::Result<T, SeatingError>;

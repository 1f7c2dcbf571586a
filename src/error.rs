//! Error taxonomy for the mine engine

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Every way the engine degrades. None of these should take the host down:
/// configuration problems skip the offending record or line, a ledger outage
/// drops the current sync cycle, and a fill failure leaves the mine's counters
/// already advanced (a full reset retry is safe).
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed snapshot data, an out-of-range policy value, or an
    /// unfillable (empty) distribution.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The relational ledger could not complete a statement.
    #[error("progress ledger unavailable: {0}")]
    StoreUnavailable(#[from] rusqlite::Error),

    /// The host world surface rejected a block write during a fill.
    #[error("world write failed in '{world}' at ({x}, {y}, {z}): {message}")]
    FillSurface {
        world: String,
        x: i32,
        y: i32,
        z: i32,
        message: String,
    },

    /// Snapshot file I/O failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

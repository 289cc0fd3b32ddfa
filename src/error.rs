//! Error types
//!
//!  Interpolation itself never fails; errors only come from ingestion,
//!  parsing and writing diagnostics.

use thiserror::Error;

use crate::situation::Callsign;

#[derive(Debug, Error)]
pub enum Error {
    #[error("empty callsign")]
    EmptyCallsign,

    #[error("invalid situation for {callsign}: {reason}")]
    InvalidSituation { callsign: Callsign, reason: String },

    #[error("invalid parts for {callsign}: {reason}")]
    InvalidParts { callsign: Callsign, reason: String },

    #[error("unknown interpolator mode '{0}'")]
    UnknownMode(String),

    #[error("log I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("log serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by [`crate::SensorClient`] and the payload codec
#[derive(Error, Debug)]
pub enum Error {
    /// Any failure reported by the BLE transport, passed through unchanged
    #[error(transparent)]
    Transport(#[from] anyhow::Error),

    #[error("{what} payload too short: expected {expected} bytes, got {actual}")]
    Decode {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("unrecognized {what} value: 0x{value:02x}")]
    UnrecognizedValue { what: &'static str, value: u8 },

    #[error("history notification stream closed before the drain completed")]
    NotificationStreamClosed,

    #[error("history drain stalled after {received} records waiting for index {last_index}")]
    HistoryStalled { received: usize, last_index: u32 },

    #[error("invalid configuration: {0}")]
    Config(String),
}

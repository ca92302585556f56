use thiserror::Error;

/// The caller executing a key unwound before publishing an outcome.
///
/// The cache converts this into the key's cached failure (via `E: From<Interrupted>`)
/// so that waiters are released instead of blocking forever.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("computation for {key} was interrupted before completing")]
pub struct Interrupted {
    pub key: String,
}

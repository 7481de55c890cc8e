use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("scanner read error: {0}")]
    Read(String),
}

/// Boundary to the capture device.
///
/// Blocks until one code is decoded or the operator aborts; `Ok(None)`
/// means the attempt ended without a code. Implementations own their
/// abort condition, so the pipeline stays testable with a scripted fake.
pub trait CodeScanner {
    fn scan(&mut self) -> Result<Option<String>, ScanError>;
}

/// How the operator supplied the product identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductInput {
    /// Outcome of a scan attempt; `None` means no code was detected.
    Scanned(Option<String>),
    Manual(String),
}

/// Resolves operator input to the identifier to query, or `None` when a
/// scan produced nothing (the pipeline must not query or persist then).
///
/// Text passes through verbatim: no trimming, no case folding. Known
/// limitation, kept so new rows stay comparable with the existing audit
/// trail.
pub fn resolve(input: ProductInput) -> Option<String> {
    match input {
        ProductInput::Scanned(code) => code,
        ProductInput::Manual(name) => Some(name),
    }
}

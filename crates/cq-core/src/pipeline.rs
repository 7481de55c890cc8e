use thiserror::Error;
use tracing::{error, info};

use crate::prompt::safety_prompt;
use crate::record::QueryRecord;
use crate::resolve::{resolve, CodeScanner, ProductInput};

pub const RATE_LIMIT_SENTINEL: &str = "Error: query limit exceeded.";
pub const FAILURE_SENTINEL: &str = "Error in query.";

/// Outcome of one advisory call.
///
/// Failures are carried as data rather than raised, so callers inspect
/// the outcome and explicitly decide to continue. `text()` is total: a
/// failed call still yields a fixed, non-empty sentinel string, which is
/// what gets persisted and shown to the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advisory {
    Answer(String),
    RateLimited,
    /// Any non-quota failure, with a diagnostic for the logs.
    Failed(String),
}

impl Advisory {
    pub fn text(&self) -> &str {
        match self {
            Advisory::Answer(text) => text,
            Advisory::RateLimited => RATE_LIMIT_SENTINEL,
            Advisory::Failed(_) => FAILURE_SENTINEL,
        }
    }
}

/// Asks the AI service one safety question. Never panics and never
/// returns an error; failures are absorbed into the `Advisory` variants.
pub trait Advisor {
    fn advise(&self, prompt: &str) -> Advisory;
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("storage error: {0}")]
    Storage(String),
    #[error("io error: {0}")]
    Io(String),
}

/// A persistence target for completed queries. Each call is one atomic
/// attempt; sinks do not retry and do not depend on each other.
pub trait RecordSink {
    /// Short label for operator-facing log lines.
    fn name(&self) -> &'static str;

    fn record(&self, record: &QueryRecord) -> Result<(), SinkError>;
}

/// Runs one query end to end: resolve, build the prompt, call the
/// advisory service, then attempt each sink exactly once.
pub struct QueryPipeline<'a> {
    advisor: &'a dyn Advisor,
    store: &'a dyn RecordSink,
    audit: &'a dyn RecordSink,
}

impl<'a> QueryPipeline<'a> {
    pub fn new(
        advisor: &'a dyn Advisor,
        store: &'a dyn RecordSink,
        audit: &'a dyn RecordSink,
    ) -> Self {
        Self {
            advisor,
            store,
            audit,
        }
    }

    /// Manual path: always resolves, even for the empty string.
    pub fn run_manual(&self, product: &str) -> QueryRecord {
        self.run_resolved(product)
    }

    /// Scan path: `None` means no code was detected, in which case no
    /// query is made and nothing is persisted. A scanner I/O failure is
    /// treated the same as no code.
    pub fn run_scan(&self, scanner: &mut dyn CodeScanner) -> Option<QueryRecord> {
        let code = match scanner.scan() {
            Ok(code) => code,
            Err(err) => {
                error!("scan failed: {err}");
                None
            }
        };
        let product = resolve(ProductInput::Scanned(code))?;
        Some(self.run_resolved(&product))
    }

    /// The shared tail. Sink failures are logged and discarded; the store
    /// is attempted first, then the audit log, and a failure in either
    /// never blocks the other. Nothing is retried.
    fn run_resolved(&self, product: &str) -> QueryRecord {
        let prompt = safety_prompt(product);
        let advisory = self.advisor.advise(&prompt);
        let record = QueryRecord::new(product, advisory.text());
        for sink in [self.store, self.audit] {
            match sink.record(&record) {
                Ok(()) => info!("recorded query for {:?} in {}", record.product, sink.name()),
                Err(err) => error!("failed to record query in {}: {err}", sink.name()),
            }
        }
        record
    }
}

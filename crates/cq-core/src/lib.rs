pub mod pipeline;
pub mod prompt;
pub mod record;
pub mod resolve;

pub use pipeline::{
    Advisor, Advisory, QueryPipeline, RecordSink, SinkError, FAILURE_SENTINEL,
    RATE_LIMIT_SENTINEL,
};
pub use record::QueryRecord;
pub use resolve::{resolve, CodeScanner, ProductInput, ScanError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One completed query as persisted to the sinks.
///
/// Immutable once constructed. The timestamp is assigned when the record
/// is built for persistence, after the advisory call returns, not when the
/// query started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRecord {
    pub queried_at: DateTime<Utc>,
    pub product: String,
    pub result: String,
}

impl QueryRecord {
    pub fn new(product: impl Into<String>, result: impl Into<String>) -> Self {
        Self {
            queried_at: Utc::now(),
            product: product.into(),
            result: result.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_carries_product_and_result_verbatim() {
        let record = QueryRecord::new("  Acetone ", "flammable, keep away from heat");
        assert_eq!(record.product, "  Acetone ");
        assert_eq!(record.result, "flammable, keep away from heat");
    }
}

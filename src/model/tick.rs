use serde::{Deserialize, Serialize};

/// One row of the tick file after timestamp normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct TickRecord {
    pub timestamp_raw: String,
    pub timestamp_ms: Option<i64>,
    pub bid: Option<f64>,
}

impl TickRecord {
    /// Both required fields survived parsing.
    pub fn is_complete(&self) -> bool {
        self.timestamp_ms.is_some() && self.bid.is_some()
    }

    pub fn point(&self) -> Option<TickPoint> {
        Some(TickPoint {
            x: self.timestamp_ms?,
            y: self.bid?,
        })
    }
}

/// Wire/chart pair: `x` is epoch milliseconds, `y` the bid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TickPoint {
    pub x: i64,
    pub y: f64,
}

//! Capture-and-suspend and restore engines
//!
//! Scale-down walks the selected working set, records every non-zero
//! capacity into an accumulator, forces the live capacity to zero and
//! merge-persists the accumulator. Scale-up reads the persisted blobs
//! back and replays the exact inverse transition. Execution is fully
//! sequential; the parameter store is the only channel carrying state
//! between the two directions.

mod scale_down;
mod scale_up;

#[cfg(test)]
mod tests;

pub use scale_down::{scale_down, ScaleDownRequest, ScaleDownSummary};
pub use scale_up::{scale_up, ScaleUpSummary};

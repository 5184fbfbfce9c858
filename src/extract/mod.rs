//! Rule-based field extractors over the OCR transcript.
//!
//! Each extractor is an ordered list of independent matcher strategies
//! evaluated by [`first_success`] — precedence is data, not nested branching.
//! All extractors are pure functions over the immutable transcript; scoring
//! weights are named constants so each can be tested in isolation.

pub mod amounts;
pub mod dates;
pub mod description;
pub mod patterns;
pub mod vendor;

pub use amounts::{ExtractedAmounts, closest_known_rate, extract_amounts};
pub use dates::extract_date;
pub use description::extract_description;
pub use vendor::{extract_vendor, vendor_score};

/// Evaluate matcher stages in order; the first stage producing a value wins.
pub fn first_success<I: ?Sized, T>(stages: &[fn(&I) -> Option<T>], input: &I) -> Option<T> {
    stages.iter().find_map(|stage| stage(input))
}

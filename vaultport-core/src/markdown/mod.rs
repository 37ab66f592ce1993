//! Body-text transforms: code-span protection, math normalization, and
//! inline tag extraction.
//!
//! Ordering is a correctness invariant, owned by the pipeline: code is
//! protected before embed/link rewriting (so link-like text inside code is
//! never rewritten), restored once rewriting is done, and shielded again
//! around the math and tag passes (so dollar signs and hashtags inside
//! code are never rewritten or harvested).

pub mod code;
pub mod math;
pub mod tags;

pub use code::CodeGuard;
pub use math::{transform_math, MathOptions, MathOutcome};
pub use tags::extract_inline_tags;

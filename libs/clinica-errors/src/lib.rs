//! Problem details (RFC 9457) used as the single error body format.

pub mod problem;

pub use problem::{APPLICATION_PROBLEM_JSON, Problem};

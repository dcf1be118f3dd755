//! Code splitter engine
//!
//! Takes a blob of mixed source and splits it into separate channels:
//! - HTML input: markup, style and script, with inline styles and inline
//!   event handlers moved out into CSS rules and listener registrations
//! - component (JSX-like) input: CSS fragments and utility code found by
//!   pattern matching, with the component source passed through
//!
//! Optional formatters re-indent each channel before it is returned.

pub mod error;
pub mod extractors;
pub mod ffi;
pub mod formatters;

pub use error::ExtractError;
pub use extractors::*;
pub use ffi::*;

//! Utility Module
//!
//! - [`time`]: frame time sampling and fixed-step budgeting
//! - [`interner`]: string interning for group names
//!
//! # String Interning
//!
//! Interned strings (Symbols) can be compared in O(1) time.
//!
//! ```rust,ignore
//! use grove::utils::interner;
//!
//! let a = interner::intern("enemies");
//! let b = interner::intern("enemies");
//! assert_eq!(a, b);
//! ```

pub mod interner;
pub mod time;

pub use interner::Symbol;
pub use time::Time;

//! Disjoint-interval algebra over the 256-bit node-key space.
//!
//! Used to track which portions of the account range (and, per-account,
//! the storage-slot range) remain to be fetched during a snap sync. The
//! set never holds overlapping intervals; `merge` and `reduce` keep it in
//! minimal, sorted form.

mod interval;
mod set;

pub use interval::Interval;
pub use set::{IntervalSet, TotalCount};

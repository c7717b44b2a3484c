//! Range-partitioned row counting for a single database table.
//!
//! The id space `[1, max_id]` is split into fixed-size ranges, one
//! `COUNT(id)` query runs per range under a concurrency cap, and the results
//! are summed.

pub mod config;
pub mod logging;

pub mod aggregate;
pub mod planner;
pub mod run;
pub mod schema;
pub mod source;
pub mod table;

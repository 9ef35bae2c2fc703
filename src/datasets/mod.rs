//! Dataset pipelines: thin call sites over the metrics core.
//!
//! Each submodule reads one family of CSV exports, prepares observations,
//! runs the shared normalization and scoring routines, and writes its
//! derived CSVs. The pipelines are independent and stateless between runs.

pub mod challenges;
pub mod hiring;
pub mod oss;

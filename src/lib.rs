//! Find personal data in scanned document images.
//!
//! An image is segmented into text-sized regions, each region is read by a
//! text recognition engine, the fragments are joined into one text and a
//! pattern-based PII engine reports typed spans over it. Batches produce
//! one record per readable image plus a PDF summary report.

pub mod aggregator;
pub mod assembler;
pub mod cli;
pub mod config;
pub mod engine;
pub mod engines;
pub mod error;
pub mod pii;
pub mod pipeline;
pub mod recognition;
pub mod report;
pub mod segmentation;
pub mod server;
pub mod source;

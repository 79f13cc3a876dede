#![allow(clippy::write_with_newline)]
#![cfg_attr(test, allow(dead_code))]

//! # pdf_stamp
//!
//! Incremental PDF stamping: a structural parser for the page-description
//! layer of PDF files plus an append-only writer that splices watermark
//! images into existing pages as a strict incremental update.
//!
//! ## Reading
//!
//! - Byte-level tokenizer and recursive-descent object parser
//! - Cross-reference and trailer resolution across the whole `/Prev`
//!   revision chain, with best-effort cross-reference-stream support
//! - Lazily resolved indirect references with a session-lifetime cache
//! - Page tree traversal with attribute inheritance and cycle detection
//!
//! ## Writing
//!
//! - Append-only object allocation that never collides with the original
//!   numbering
//! - Content-stream amendment that composes with existing page content and
//!   compensates for page rotation
//! - A coalesced cross-reference table and a trailer chained to the prior
//!   revision — nothing before the original end-of-file is altered
//!
//! Encrypted input is rejected; image decoding and compression primitives
//! are external collaborators (decoded pixels in, `flate2` underneath).
//!
//! ## Quick start
//!
//! ```no_run
//! use pdf_stamp::{Anchor, Document, ImageData, PageSubset, StampConfig, Stamper};
//!
//! # fn main() -> pdf_stamp::Result<()> {
//! let doc = Document::open("report.pdf")?;
//! let logo = ImageData::new(100, 50, 8, 3, vec![0xFF; 100 * 50 * 3])?;
//! let config = StampConfig::new()
//!     .with_pages(PageSubset::All)
//!     .with_anchor(Anchor::Center)
//!     .with_rotation(45.0);
//!
//! let mut stamper = Stamper::create(doc, "report-stamped.pdf")?;
//! stamper.add_watermark(&logo, &config)?;
//! stamper.finish()?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

// Error handling
pub mod error;

// Core PDF parsing
pub mod decoders;
pub mod document;
pub mod geometry;
pub mod lexer;
pub mod names;
pub mod object;
pub mod pages;
pub mod parser;
pub mod xref;

// Watermark input and placement
pub mod config;
pub mod image;

// Incremental writing
pub mod writer;

// Re-exports
pub use config::{Anchor, PageSubset, StampConfig};
pub use document::Document;
pub use error::{Error, Result};
pub use geometry::Rect;
pub use image::ImageData;
pub use object::{Dict, Object, ObjectRef, StringFormat};
pub use writer::Stamper;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

//! Competitive Matrix Model
//!
//! Typed building blocks for per-tab competitor datasets.
//!
//! # Core Concepts
//!
//! - [`AttributeSchema`]: Ordered, duplicate-free column names of one tab
//! - [`CompetitorRecord`]: Identity fields plus a sparse attribute map
//! - [`Tab`]: A schema and the records that belong to it
//! - [`MatchScore`]: Parsed `Match Probability`, used for sorting and tie-breaks
//!
//! # Example
//!
//! ```rust
//! use matrix_model::{AttributeSchema, CompetitorRecord, Tab, MATCH_PROBABILITY};
//!
//! let mut tab = Tab::new("tab_general", "General")
//!     .with_schema(AttributeSchema::from_names(["Focus"]))
//!     .with_competitors(vec![
//!         CompetitorRecord::new("1", "Acme", "tab_general")
//!             .with_attribute(MATCH_PROBABILITY, "70%"),
//!     ]);
//!
//! tab.add_attribute("Pricing").unwrap();
//! assert_eq!(tab.competitors[0].get("Pricing"), Some(""));
//! assert_eq!(tab.competitors[0].score().value(), 70);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod error;
mod ids;
mod probability;
mod record;
mod schema;
mod tab;

pub use error::ModelError;
pub use ids::{ProjectId, RecordId, TabId};
pub use probability::MatchScore;
pub use record::{
    normalize_name, AttributeMap, CompetitorRecord, CreatorProfile, DESCRIPTION, EMPTY_SENTINEL,
    MATCH_PROBABILITY,
};
pub use schema::AttributeSchema;
pub use tab::Tab;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

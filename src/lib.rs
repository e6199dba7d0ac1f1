//! Facility and shipment CSV ingestion for map rendering.
//!
//! Each upload goes through [`pipeline::Session::ingest`]: rows are parsed
//! and normalized, every facility gets its color, then every record is turned
//! into a [`descriptor::MarkerDescriptor`] and the batch is summarized into an
//! [`aggregation::AnalyticsSnapshot`].

pub mod aggregation;
pub mod color;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod reader;
pub mod record;
pub mod schema;

#[cfg(feature = "python")]
mod python;

pub use aggregation::{aggregate, AnalyticsSnapshot, VehicleTypeCounts};
pub use color::{ColorRegistry, ColorSource, CyclingColorSource, RandomColorSource};
pub use config::PipelineConfig;
pub use descriptor::{Category, DescriptorBuilder, MarkerDescriptor};
pub use error::{FleetError, Result};
pub use pipeline::{IngestOutput, Session};
pub use record::{normalize_id, Facility, NormalizedRecord, Shipment};

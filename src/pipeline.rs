use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, info_span, warn};
use uuid::Uuid;

use crate::aggregation::{aggregate, AnalyticsSnapshot};
use crate::color::ColorRegistry;
use crate::config::PipelineConfig;
use crate::descriptor::{DescriptorBuilder, MarkerDescriptor};
use crate::error::Result;
use crate::reader::{self, RawRow};
use crate::record::NormalizedRecord;

/// Everything one ingest produces. The caller replaces whatever it rendered
/// before with `descriptors`.
#[derive(Debug, Clone, Serialize)]
pub struct IngestOutput {
    pub batch_id: Uuid,
    pub descriptors: Vec<MarkerDescriptor>,
    pub analytics: AnalyticsSnapshot,
    /// Rows dropped for unusable coordinates
    pub dropped_rows: usize,
}

/// Owns the color registry for a session and runs each upload through it.
///
/// Colors assigned in one ingest stay visible to every later ingest.
#[derive(Debug)]
pub struct Session {
    registry: ColorRegistry,
    builder: DescriptorBuilder,
}

impl Session {
    pub fn new(config: &PipelineConfig) -> Result<Self> {
        Ok(Self {
            registry: ColorRegistry::from_config(&config.palette)?,
            builder: DescriptorBuilder::new(config.display.offset()?),
        })
    }

    pub fn with_registry(registry: ColorRegistry, builder: DescriptorBuilder) -> Self {
        Self { registry, builder }
    }

    pub fn registry(&self) -> &ColorRegistry {
        &self.registry
    }

    /// Ingest raw CSV text, stamping shipments with the current time.
    pub fn ingest(&mut self, raw_text: &str) -> Result<IngestOutput> {
        self.ingest_at(raw_text, Utc::now())
    }

    /// Read and ingest a CSV file. An unreadable file fails the whole call.
    pub fn ingest_file(&mut self, path: impl AsRef<Path>) -> Result<IngestOutput> {
        let rows = reader::read_file(path)?;
        Ok(self.run(rows, Utc::now()))
    }

    /// Ingest with an explicit ingestion moment.
    pub fn ingest_at(&mut self, raw_text: &str, now: DateTime<Utc>) -> Result<IngestOutput> {
        let rows = reader::parse(raw_text)?;
        Ok(self.run(rows, now))
    }

    // Parsing is done before this point; nothing below can fail, so a bad
    // input never leaves the registry half-updated.
    fn run(&mut self, rows: Vec<RawRow>, now: DateTime<Utc>) -> IngestOutput {
        let batch_id = Uuid::new_v4();
        let _span = info_span!("ingest", %batch_id).entered();

        let row_count = rows.len();
        let records = normalize_batch(&rows, now);
        let dropped_rows = row_count - records.len();
        if records.is_empty() && row_count > 0 {
            warn!(rows = row_count, "no usable records in batch");
        }

        assign_facility_colors(&mut self.registry, &records);
        let descriptors = build_descriptors(&mut self.registry, &self.builder, &records);
        let analytics = aggregate(&records);

        info!(
            rows = row_count,
            records = records.len(),
            dropped = dropped_rows,
            facilities = analytics.facility_count,
            shipments = analytics.shipment_count,
            "ingested batch"
        );

        IngestOutput {
            batch_id,
            descriptors,
            analytics,
            dropped_rows,
        }
    }
}

/// Coerce rows into records, dropping rows without usable coordinates.
pub fn normalize_batch(rows: &[RawRow], now: DateTime<Utc>) -> Vec<NormalizedRecord> {
    rows.iter()
        .enumerate()
        .filter_map(|(i, row)| {
            let record = NormalizedRecord::from_row(row, now);
            if record.is_none() {
                debug!(row = i + 1, "dropped row with unusable coordinates");
            }
            record
        })
        .collect()
}

/// Facility pre-pass: every facility in the batch gets its color before any
/// shipment color is resolved, so a shipment listed ahead of its facility
/// still ends up with the facility's final color.
pub fn assign_facility_colors(registry: &mut ColorRegistry, records: &[NormalizedRecord]) {
    for facility in records.iter().filter_map(NormalizedRecord::as_facility) {
        registry.pre_assign(&facility.id);
    }
}

/// Main pass, in input order. Run after [`assign_facility_colors`].
pub fn build_descriptors(
    registry: &mut ColorRegistry,
    builder: &DescriptorBuilder,
    records: &[NormalizedRecord],
) -> Vec<MarkerDescriptor> {
    records
        .iter()
        .map(|record| builder.build(record, registry.resolve(record.color_key())))
        .collect()
}

//! Descriptor module: turns normalized records into renderable markers.
//!
//! A `MarkerDescriptor` is plain data: position, category, color and popup
//! text. Icon assets, clustering and the map itself belong to the renderer;
//! this module only names the icon class the category maps to. Descriptor
//! lists and registry legends can also be emitted as polars DataFrames.

use chrono::{DateTime, FixedOffset, Utc};
use polars::prelude::*;
use serde::Serialize;

use crate::color::ColorRegistry;
use crate::error::Result;
use crate::record::{NormalizedRecord, Shipment};
use crate::schema::{descriptor, legend};

/// Rendered for optional shipment fields that are absent or blank.
pub const MISSING_VALUE: &str = "N/A";

/// en-US numeric date, 2-digit year, 12-hour clock: `7/6/25, 10:59 PM`.
const TIMESTAMP_FORMAT: &str = "%-m/%-d/%y, %-I:%M %p";

// ── Category ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Facility,
    Shipment,
}

impl Category {
    pub const ICON_SIZE: (u32, u32) = (48, 48);
    pub const ICON_ANCHOR: (u32, u32) = (24, 48);

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Facility => "facility",
            Self::Shipment => "shipment",
        }
    }

    /// CSS class of the marker glyph
    pub fn icon_class(&self) -> &'static str {
        match self {
            Self::Facility => "warehouse-icon",
            Self::Shipment => "truck-icon",
        }
    }
}

// ── Descriptor ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerDescriptor {
    /// (lat, lng)
    pub position: (f64, f64),
    pub category: Category,
    pub color: String,
    pub popup_text: String,
}

/// Builds descriptors with timestamps shown at a fixed offset.
#[derive(Debug, Clone, Copy)]
pub struct DescriptorBuilder {
    offset: FixedOffset,
}

impl DescriptorBuilder {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    pub fn build(&self, record: &NormalizedRecord, color: String) -> MarkerDescriptor {
        let (category, popup_text) = match record {
            NormalizedRecord::Facility(f) => (Category::Facility, escape_html(&f.label)),
            NormalizedRecord::Shipment(s) => (Category::Shipment, self.shipment_popup(s)),
        };
        MarkerDescriptor {
            position: record.position(),
            category,
            color,
            popup_text,
        }
    }

    pub fn format_timestamp(&self, at: DateTime<Utc>) -> String {
        at.with_timezone(&self.offset)
            .format(TIMESTAMP_FORMAT)
            .to_string()
    }

    fn shipment_popup(&self, s: &Shipment) -> String {
        let label = or_missing(Some(&s.label));
        let destination = or_missing(s.destination.as_ref());
        [
            format!("<b>{label} TO {destination}</b>"),
            format!("Destination: {destination}"),
            format!("Price: {}", or_missing(s.rate_value.as_ref())),
            format!("Quantity (MT): {}", or_missing(s.quantity_mt.as_ref())),
            format!("Vehicle: {}", or_missing(s.vehicle_type.as_ref())),
            format!("Created: {}", self.format_timestamp(s.created_at)),
            format!("Updated: {}", self.format_timestamp(s.updated_at)),
        ]
        .join("<br>")
    }
}

fn or_missing(value: Option<&String>) -> String {
    match value.map(|v| v.trim()).filter(|v| !v.is_empty()) {
        Some(v) => escape_html(v),
        None => MISSING_VALUE.to_string(),
    }
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

// ── DataFrame output ────────────────────────────────────────────────────────

/// One row per descriptor: lat, lng, category, color, popup_text.
pub fn descriptors_to_frame(descriptors: &[MarkerDescriptor]) -> Result<DataFrame> {
    let lat: Vec<f64> = descriptors.iter().map(|d| d.position.0).collect();
    let lng: Vec<f64> = descriptors.iter().map(|d| d.position.1).collect();
    let category: Vec<&str> = descriptors.iter().map(|d| d.category.as_str()).collect();
    let color: Vec<&str> = descriptors.iter().map(|d| d.color.as_str()).collect();
    let popup: Vec<&str> = descriptors.iter().map(|d| d.popup_text.as_str()).collect();

    let df = DataFrame::new(vec![
        Column::new(descriptor::LAT.into(), lat),
        Column::new(descriptor::LNG.into(), lng),
        Column::new(descriptor::CATEGORY.into(), category),
        Column::new(descriptor::COLOR.into(), color),
        Column::new(descriptor::POPUP_TEXT.into(), popup),
    ])?;
    Ok(df)
}

/// The registry's id→color table as a two-column frame.
pub fn legend_to_frame(registry: &ColorRegistry) -> Result<DataFrame> {
    let (ids, colors): (Vec<&str>, Vec<&str>) = registry.legend().into_iter().unzip();
    let df = DataFrame::new(vec![
        Column::new(legend::FACILITY_ID.into(), ids),
        Column::new(legend::COLOR.into(), colors),
    ])?;
    Ok(df)
}

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::reader::RawRow;
use crate::schema::{input, record_type};

/// Canonical form of a facility identifier: trimmed and upper-cased.
pub fn normalize_id(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Fixed-location record anchoring shipments.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Facility {
    /// Normalized identifier
    pub id: String,
    pub label: String,
    pub lat: f64,
    pub lng: f64,
}

/// Movement record drawn in its origin facility's color.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Shipment {
    pub label: String,
    /// Normalized identifier of the origin facility
    pub origin_facility_id: String,
    pub destination: Option<String>,
    pub rate_value: Option<String>,
    pub quantity_mt: Option<String>,
    pub vehicle_type: Option<String>,
    pub lat: f64,
    pub lng: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NormalizedRecord {
    Facility(Facility),
    Shipment(Shipment),
}

impl NormalizedRecord {
    /// Coerce a raw row into a record.
    ///
    /// Returns `None` when `lat` or `lng` is missing or not a finite number.
    /// A `type` of `warehouse` (any case, any padding) selects a facility;
    /// every other value, including none, selects a shipment.
    pub fn from_row(row: &RawRow, ingested_at: DateTime<Utc>) -> Option<Self> {
        let lat = parse_coordinate(row.get(input::LAT))?;
        let lng = parse_coordinate(row.get(input::LNG))?;

        let label = row.get(input::LABEL).unwrap_or_default().to_string();
        let origin = row
            .get_any(&[input::ORIGIN_WAREHOUSE_ID, input::ORIGIN_FACILITY_ID])
            .map(normalize_id);

        let is_facility = row
            .get(input::TYPE)
            .is_some_and(|t| t.trim().eq_ignore_ascii_case(record_type::WAREHOUSE));

        if is_facility {
            let id = origin.unwrap_or_else(|| normalize_id(&label));
            return Some(Self::Facility(Facility { id, label, lat, lng }));
        }

        let owned = |column: &str| row.get(column).map(str::to_string);
        Some(Self::Shipment(Shipment {
            label,
            origin_facility_id: origin.unwrap_or_default(),
            destination: owned(input::DESTINATION),
            rate_value: owned(input::RATE_VALUE),
            quantity_mt: owned(input::QUANTITY_MT),
            vehicle_type: owned(input::VEHICLE_TYPE),
            lat,
            lng,
            created_at: ingested_at,
            updated_at: ingested_at,
        }))
    }

    pub fn position(&self) -> (f64, f64) {
        match self {
            Self::Facility(f) => (f.lat, f.lng),
            Self::Shipment(s) => (s.lat, s.lng),
        }
    }

    /// The facility id whose color this record is drawn in.
    pub fn color_key(&self) -> &str {
        match self {
            Self::Facility(f) => &f.id,
            Self::Shipment(s) => &s.origin_facility_id,
        }
    }

    pub fn as_facility(&self) -> Option<&Facility> {
        match self {
            Self::Facility(f) => Some(f),
            Self::Shipment(_) => None,
        }
    }

    pub fn as_shipment(&self) -> Option<&Shipment> {
        match self {
            Self::Shipment(s) => Some(s),
            Self::Facility(_) => None,
        }
    }
}

fn parse_coordinate(value: Option<&str>) -> Option<f64> {
    value?.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn row(pairs: &[(&str, &str)]) -> RawRow {
        pairs.iter().copied().collect()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 6, 14, 59, 0).unwrap()
    }

    #[test]
    fn normalizes_case_and_padding() {
        assert_eq!(normalize_id(" l07 "), "L07");
        assert_eq!(normalize_id("L07"), normalize_id("l07"));
    }

    #[test]
    fn warehouse_type_selects_facility() {
        let r = row(&[
            ("lat", "14.5"),
            ("lng", "121.0"),
            ("label", "WH1"),
            ("type", " WareHouse "),
            ("originWarehouseId", " l07"),
        ]);
        let rec = NormalizedRecord::from_row(&r, now()).unwrap();
        let facility = rec.as_facility().unwrap();
        assert_eq!(facility.id, "L07");
        assert_eq!(facility.label, "WH1");
        assert_eq!(rec.position(), (14.5, 121.0));
    }

    #[test]
    fn facility_without_origin_is_keyed_by_label() {
        let r = row(&[("lat", "1"), ("lng", "2"), ("label", "wh-north "), ("type", "warehouse")]);
        let rec = NormalizedRecord::from_row(&r, now()).unwrap();
        assert_eq!(rec.color_key(), "WH-NORTH");
    }

    #[test]
    fn any_other_type_is_a_shipment() {
        for t in ["truck", "rating", "", "Warehouses"] {
            let r = row(&[("lat", "1"), ("lng", "2"), ("type", t), ("originFacilityId", "l07")]);
            let rec = NormalizedRecord::from_row(&r, now()).unwrap();
            let shipment = rec.as_shipment().unwrap();
            assert_eq!(shipment.origin_facility_id, "L07");
            assert_eq!(shipment.created_at, now());
            assert_eq!(shipment.updated_at, now());
        }
    }

    #[test]
    fn bad_coordinates_drop_the_row() {
        for (lat, lng) in [("abc", "121"), ("14.5", ""), ("NaN", "121"), ("14.5", "inf")] {
            let r = row(&[("lat", lat), ("lng", lng), ("type", "warehouse")]);
            assert!(NormalizedRecord::from_row(&r, now()).is_none(), "{lat},{lng}");
        }
        let missing = row(&[("lng", "121"), ("type", "truck")]);
        assert!(NormalizedRecord::from_row(&missing, now()).is_none());
    }

    #[test]
    fn zero_is_a_valid_coordinate() {
        let r = row(&[("lat", "0"), ("lng", "0.0")]);
        assert!(NormalizedRecord::from_row(&r, now()).is_some());
    }
}

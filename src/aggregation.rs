use std::collections::HashSet;

use serde::Serialize;

use crate::record::NormalizedRecord;
use crate::schema::vehicle;

/// Shipments per tracked vehicle type. Other values are not tallied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct VehicleTypeCounts {
    #[serde(rename = "CARGO")]
    pub cargo: usize,
    #[serde(rename = "TRAILER")]
    pub trailer: usize,
}

impl VehicleTypeCounts {
    fn record(&mut self, vehicle_type: &str) {
        match vehicle_type.trim().to_uppercase().as_str() {
            vehicle::CARGO => self.cargo += 1,
            vehicle::TRAILER => self.trailer += 1,
            _ => {}
        }
    }
}

/// Summary counts over one full batch of records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSnapshot {
    /// Distinct normalized facility ids
    pub facility_count: usize,
    pub shipment_count: usize,
    pub vehicle_type_counts: VehicleTypeCounts,
    pub any_linked: bool,
}

/// Recompute the snapshot from scratch over `records`.
///
/// Callers that keep data across uploads pass the whole accumulated set.
pub fn aggregate(records: &[NormalizedRecord]) -> AnalyticsSnapshot {
    let mut facility_ids: HashSet<&str> = HashSet::new();
    let mut shipment_count = 0;
    let mut vehicle_type_counts = VehicleTypeCounts::default();

    for record in records {
        match record {
            NormalizedRecord::Facility(f) => {
                facility_ids.insert(&f.id);
            }
            NormalizedRecord::Shipment(s) => {
                shipment_count += 1;
                if let Some(vt) = &s.vehicle_type {
                    vehicle_type_counts.record(vt);
                }
            }
        }
    }

    AnalyticsSnapshot {
        facility_count: facility_ids.len(),
        shipment_count,
        vehicle_type_counts,
        any_linked: shipment_count > 0,
    }
}

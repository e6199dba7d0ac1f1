/// Column-name constants for fleetmap inputs and outputs.
/// Single source of truth - exported to Python via PyO3.

// ── Input columns ───────────────────────────────────────────────────────────
pub mod input {
    pub const LAT: &str = "lat";
    pub const LNG: &str = "lng";
    pub const LABEL: &str = "label";
    pub const TYPE: &str = "type";
    pub const ORIGIN_WAREHOUSE_ID: &str = "originWarehouseId";
    /// Accepted as an alias of `originWarehouseId`.
    pub const ORIGIN_FACILITY_ID: &str = "originFacilityId";
    pub const DESTINATION: &str = "destination";
    pub const RATE_VALUE: &str = "rateValue";
    pub const QUANTITY_MT: &str = "quantityMT";
    pub const VEHICLE_TYPE: &str = "vehicleType";
}

// ── Record type values ──────────────────────────────────────────────────────
pub mod record_type {
    /// The only `type` value that selects a facility; everything else is a shipment.
    pub const WAREHOUSE: &str = "warehouse";
}

// ── Tracked vehicle types ───────────────────────────────────────────────────
pub mod vehicle {
    pub const CARGO: &str = "CARGO";
    pub const TRAILER: &str = "TRAILER";
}

// ── Descriptor frame columns ────────────────────────────────────────────────
pub mod descriptor {
    pub const LAT: &str = "lat";
    pub const LNG: &str = "lng";
    pub const CATEGORY: &str = "category";
    pub const COLOR: &str = "color";
    pub const POPUP_TEXT: &str = "popup_text";
}

// ── Legend frame columns ────────────────────────────────────────────────────
pub mod legend {
    pub const FACILITY_ID: &str = "facility_id";
    pub const COLOR: &str = "color";
}

use std::collections::HashMap;

use pyo3::prelude::*;
use pyo3::types::{PyDict, PyModule};
use pyo3_polars::PyDataFrame;

use crate::color::DEFAULT_FALLBACK_COLOR;
use crate::config::{DisplayConfig, PaletteConfig, PipelineConfig};
use crate::descriptor::{descriptors_to_frame, legend_to_frame};
use crate::error::FleetError;
use crate::pipeline::{IngestOutput, Session};
use crate::schema;

#[pyclass(name = "Session", unsendable)]
pub struct PySession {
    inner: Session,
}

#[pymethods]
impl PySession {
    /// Create a session.
    ///
    /// policy: "random" (optionally seeded), "cycle" (draws from `colors`
    /// in order) or "static" (fixed `colors` table plus `fallback`).
    #[new]
    #[pyo3(signature = (
        policy = "random",
        seed = None,
        colors = None,
        fallback = None,
        utc_offset_minutes = 480,
    ))]
    fn new(
        policy: &str,
        seed: Option<u64>,
        colors: Option<Bound<'_, PyAny>>,
        fallback: Option<String>,
        utc_offset_minutes: i32,
    ) -> PyResult<Self> {
        let palette = match policy {
            "random" => PaletteConfig::Random { seed },
            "cycle" => PaletteConfig::Cycle {
                colors: colors.map(|c| c.extract()).transpose()?.unwrap_or_default(),
            },
            "static" => PaletteConfig::Static {
                colors: colors
                    .map(|c| c.extract::<HashMap<String, String>>())
                    .transpose()?
                    .unwrap_or_default(),
                fallback: fallback.unwrap_or_else(|| DEFAULT_FALLBACK_COLOR.to_string()),
            },
            other => {
                return Err(FleetError::Config(format!(
                    "Invalid policy: '{other}'. Must be 'random', 'cycle' or 'static'"
                ))
                .into())
            }
        };
        let config = PipelineConfig {
            palette,
            display: DisplayConfig { utc_offset_minutes },
        };
        Ok(Self {
            inner: Session::new(&config)?,
        })
    }

    /// Ingest raw CSV text. Returns (descriptors DataFrame, analytics dict).
    fn ingest<'py>(
        &mut self,
        py: Python<'py>,
        raw_text: &str,
    ) -> PyResult<(PyDataFrame, Bound<'py, PyDict>)> {
        let output = self.inner.ingest(raw_text)?;
        to_python(py, output)
    }

    fn ingest_file<'py>(
        &mut self,
        py: Python<'py>,
        path: &str,
    ) -> PyResult<(PyDataFrame, Bound<'py, PyDict>)> {
        let output = self.inner.ingest_file(path)?;
        to_python(py, output)
    }

    /// Facility id → color table seen so far.
    fn legend(&self) -> PyResult<PyDataFrame> {
        Ok(PyDataFrame(legend_to_frame(self.inner.registry())?))
    }
}

fn to_python(py: Python<'_>, output: IngestOutput) -> PyResult<(PyDataFrame, Bound<'_, PyDict>)> {
    let df = descriptors_to_frame(&output.descriptors)?;
    let a = &output.analytics;

    let vehicle_types = PyDict::new(py);
    vehicle_types.set_item(schema::vehicle::CARGO, a.vehicle_type_counts.cargo)?;
    vehicle_types.set_item(schema::vehicle::TRAILER, a.vehicle_type_counts.trailer)?;

    let analytics = PyDict::new(py);
    analytics.set_item("batch_id", output.batch_id.to_string())?;
    analytics.set_item("facility_count", a.facility_count)?;
    analytics.set_item("shipment_count", a.shipment_count)?;
    analytics.set_item("vehicle_type_counts", vehicle_types)?;
    analytics.set_item("any_linked", a.any_linked)?;
    analytics.set_item("dropped_rows", output.dropped_rows)?;

    Ok((PyDataFrame(df), analytics))
}

/// Export schema constants as Python submodules
fn add_schema_exports(m: &Bound<'_, PyModule>) -> PyResult<()> {
    let columns = PyModule::new(m.py(), "columns")?;
    columns.add("LAT", schema::input::LAT)?;
    columns.add("LNG", schema::input::LNG)?;
    columns.add("LABEL", schema::input::LABEL)?;
    columns.add("TYPE", schema::input::TYPE)?;
    columns.add("ORIGIN_WAREHOUSE_ID", schema::input::ORIGIN_WAREHOUSE_ID)?;
    columns.add("ORIGIN_FACILITY_ID", schema::input::ORIGIN_FACILITY_ID)?;
    columns.add("DESTINATION", schema::input::DESTINATION)?;
    columns.add("RATE_VALUE", schema::input::RATE_VALUE)?;
    columns.add("QUANTITY_MT", schema::input::QUANTITY_MT)?;
    columns.add("VEHICLE_TYPE", schema::input::VEHICLE_TYPE)?;
    m.add_submodule(&columns)?;

    let descriptor = PyModule::new(m.py(), "descriptor")?;
    descriptor.add("LAT", schema::descriptor::LAT)?;
    descriptor.add("LNG", schema::descriptor::LNG)?;
    descriptor.add("CATEGORY", schema::descriptor::CATEGORY)?;
    descriptor.add("COLOR", schema::descriptor::COLOR)?;
    descriptor.add("POPUP_TEXT", schema::descriptor::POPUP_TEXT)?;
    m.add_submodule(&descriptor)?;

    Ok(())
}

#[pymodule]
fn fleetmap(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PySession>()?;
    add_schema_exports(m)?;
    Ok(())
}

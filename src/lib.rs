//! Seatplan: event seating engine.
//!
//! Table geometry, a guest directory with party colours, a party-aware
//! auto-seating planner, and the JSON layout document used for save,
//! load and undo. `Session` is the command surface; `Layout` owns state.
//!
//! With the `python` feature the crate also builds as a Python extension
//! exposing JSON-in/JSON-out helpers.

pub mod directory;
pub mod document;
pub mod error;
pub mod geometry;
pub mod guests;
pub mod layout;
pub mod palette;
pub mod planner;
pub mod prng;
pub mod session;
pub mod types;

pub use document::LayoutDocument;
pub use error::{Result, SeatingError};
pub use layout::Layout;
pub use planner::{plan_auto_seat, SeatingPlan};
pub use session::{MoveDecision, SeatOutcome, SeatRequest, Session};
pub use types::{ChairRef, HeadSeating, LayoutParams, Shape, TableKey};

#[cfg(feature = "python")]
mod python {
    use pyo3::exceptions::PyValueError;
    use pyo3::prelude::*;

    use crate::layout::Layout;
    use crate::types::LayoutParams;

    fn load(document_json: &str, params_json: Option<&str>) -> PyResult<Layout> {
        let params: LayoutParams = match params_json {
            Some(text) => serde_json::from_str(text)
                .map_err(|e| PyValueError::new_err(format!("Invalid layout params JSON: {e}")))?,
            None => LayoutParams::default(),
        };
        let mut layout = Layout::new(params);
        layout
            .load_json(document_json)
            .map_err(|e| PyValueError::new_err(e.to_string()))?;
        Ok(layout)
    }

    fn save(layout: &Layout) -> PyResult<String> {
        layout
            .to_json()
            .map_err(|e| PyValueError::new_err(format!("Failed to serialize layout: {e}")))
    }

    /// Seat every unseated guest of a layout document.
    ///
    /// Returns the updated document. Raises `ValueError` on a malformed
    /// document or when the tables are short of seats.
    #[pyfunction]
    #[pyo3(signature = (document_json, params_json=None))]
    fn auto_seat_json(document_json: &str, params_json: Option<&str>) -> PyResult<String> {
        let mut layout = load(document_json, params_json)?;
        layout
            .auto_seat()
            .map_err(|e| PyValueError::new_err(e.to_string()))?;
        save(&layout)
    }

    /// Guest list of a layout document as CSV, with a `Table` column.
    #[pyfunction]
    fn export_guests_csv(document_json: &str) -> PyResult<String> {
        Ok(load(document_json, None)?.export_guests())
    }

    /// Replace the guest list of a layout document from CSV text.
    #[pyfunction]
    fn import_guests_json(document_json: &str, csv: &str) -> PyResult<String> {
        let mut layout = load(document_json, None)?;
        layout.import_guests(csv);
        save(&layout)
    }

    #[pymodule]
    fn seatplan(m: &Bound<'_, PyModule>) -> PyResult<()> {
        m.add_function(wrap_pyfunction!(auto_seat_json, m)?)?;
        m.add_function(wrap_pyfunction!(export_guests_csv, m)?)?;
        m.add_function(wrap_pyfunction!(import_guests_json, m)?)?;
        Ok(())
    }
}

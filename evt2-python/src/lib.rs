//! Python bindings for the EVT 2.0 encoder with numpy support.
//!
//! This module exposes the word encoders one-to-one and adds column-based
//! helpers that encode whole numpy event arrays in Rust.

use evt2_core::{
    bits, parser, writer, CdEvent, CdEventEncoder, RawEvent, RawHeader, StreamEncoder,
    TimeHighEncoder, TriggerEventEncoder,
};
use numpy::{IntoPyArray, PyArray1, PyReadonlyArray1};
use pyo3::exceptions::{PyIOError, PyValueError};
use pyo3::prelude::*;

/// A 32-bit EVT 2.0 word.
///
/// `pad` holds the 28-bit payload and `type` the 4-bit event type.
#[pyclass(name = "RawEvent")]
#[derive(Clone, Copy, Default)]
pub struct PyRawEvent {
    inner: RawEvent,
}

#[pymethods]
impl PyRawEvent {
    #[new]
    fn new() -> Self {
        Self::default()
    }

    /// Returns the 28-bit payload.
    #[getter]
    fn pad(&self) -> u32 {
        self.inner.payload()
    }

    /// Returns the 4-bit event type.
    #[getter]
    fn r#type(&self) -> u8 {
        self.inner.kind()
    }

    /// Returns the packed 32-bit word.
    #[getter]
    fn bits(&self) -> u32 {
        self.inner.bits()
    }

    /// Returns the word as it is written to disk (little-endian).
    fn to_bytes(&self) -> [u8; 4] {
        self.inner.to_le_bytes()
    }

    fn __eq__(&self, other: &Self) -> bool {
        self.inner == other.inner
    }

    fn __repr__(&self) -> String {
        format!(
            "RawEvent(type={:#x}, pad={:#09x})",
            self.inner.kind(),
            self.inner.payload()
        )
    }
}

/// Encoder for CD events.
#[pyclass(name = "CdEventEncoder")]
#[derive(Default)]
pub struct PyCdEventEncoder {
    inner: CdEventEncoder,
}

#[pymethods]
impl PyCdEventEncoder {
    #[new]
    fn new() -> Self {
        Self::default()
    }

    /// Stores the event to encode. Values are truncated to their field widths.
    fn set_event(&mut self, x: u32, y: u32, p: u32, t: u64) {
        self.inner.set_event(x, y, p, t);
    }

    /// Writes the stored event into `raw`.
    fn encode(&self, raw: &mut PyRawEvent) {
        self.inner.encode(&mut raw.inner);
    }
}

/// Encoder for external trigger events.
#[pyclass(name = "TriggerEventEncoder")]
#[derive(Default)]
pub struct PyTriggerEventEncoder {
    inner: TriggerEventEncoder,
}

#[pymethods]
impl PyTriggerEventEncoder {
    #[new]
    fn new() -> Self {
        Self::default()
    }

    /// Stores the trigger to encode. Values are truncated to their field widths.
    fn set_event(&mut self, p: u32, trigger_id: u32, t: u64) {
        self.inner.set_event(p, trigger_id, t);
    }

    /// Writes the stored trigger into `raw`.
    fn encode(&self, raw: &mut PyRawEvent) {
        self.inner.encode(&mut raw.inner);
    }
}

/// Encoder for time high words.
#[pyclass(name = "TimeHighEncoder")]
pub struct PyTimeHighEncoder {
    inner: TimeHighEncoder,
}

#[pymethods]
impl PyTimeHighEncoder {
    #[new]
    #[pyo3(signature = (base=0))]
    fn new(base: u64) -> Self {
        Self {
            inner: TimeHighEncoder::new(base),
        }
    }

    /// Returns the timestamp the next time high word is built from.
    fn peek(&self) -> u64 {
        self.inner.peek()
    }

    /// Restarts the clock at `base`.
    #[pyo3(signature = (base=0))]
    fn reset(&mut self, base: u64) {
        self.inner.reset(base);
    }

    /// Writes the next time high word into `raw` and advances the clock.
    fn encode(&mut self, raw: &mut PyRawEvent) {
        self.inner.encode(&mut raw.inner);
    }
}

/// Builds CD events from numpy columns, checking they have equal lengths
/// and that every value fits its wire field.
fn collect_events(
    x: PyReadonlyArray1<'_, u16>,
    y: PyReadonlyArray1<'_, u16>,
    p: PyReadonlyArray1<'_, u8>,
    t: PyReadonlyArray1<'_, u64>,
) -> PyResult<Vec<CdEvent>> {
    let (x, y, p, t) = (x.as_array(), y.as_array(), p.as_array(), t.as_array());
    let len = x.len();
    if y.len() != len || p.len() != len || t.len() != len {
        return Err(PyValueError::new_err(format!(
            "Column lengths differ: x={}, y={}, p={}, t={}",
            len,
            y.len(),
            p.len(),
            t.len()
        )));
    }

    let x_max = bits::mask(parser::CD_X_BITS) as u16;
    let y_max = bits::mask(parser::CD_Y_BITS) as u16;
    x.iter()
        .zip(y.iter())
        .zip(p.iter())
        .zip(t.iter())
        .enumerate()
        .map(|(i, (((&x, &y), &p), &t))| {
            if x > x_max || y > y_max || p > 1 {
                return Err(PyValueError::new_err(format!(
                    "Event {} does not fit EVT 2.0 CD fields: x={}, y={}, p={}",
                    i, x, y, p
                )));
            }
            Ok(CdEvent::new(x, y, p, t))
        })
        .collect()
}

/// Encodes time-sorted CD events into EVT 2.0 words.
///
/// Args:
///     x, y: pixel coordinates (uint16 arrays)
///     p: polarities (uint8 array)
///     t: timestamps in microseconds (uint64 array)
///
/// Returns:
///     numpy.ndarray: uint32 words, time high words included
///
/// Example:
///     >>> import evt2
///     >>> words = evt2.encode_events(x, y, p, t)
///     >>> words.tofile("events.bin")
#[pyfunction]
fn encode_events<'py>(
    py: Python<'py>,
    x: PyReadonlyArray1<'py, u16>,
    y: PyReadonlyArray1<'py, u16>,
    p: PyReadonlyArray1<'py, u8>,
    t: PyReadonlyArray1<'py, u64>,
) -> PyResult<&'py PyArray1<u32>> {
    let events = collect_events(x, y, p, t)?;

    let mut encoder = StreamEncoder::with_capacity(events.len() * 2);
    encoder.push_cd_events(&events);
    let words: Vec<u32> = encoder.words().iter().map(|w| w.bits()).collect();

    Ok(words.into_pyarray(py))
}

/// Writes time-sorted CD events to an EVT 2.0 raw file.
///
/// Args:
///     path: output .raw file path
///     x, y, p, t: event columns as for `encode_events`
///     width, height: sensor geometry written to the header
///
/// Returns:
///     int: number of words written
#[pyfunction]
#[pyo3(signature = (path, x, y, p, t, width=640, height=480))]
fn write_file(
    path: &str,
    x: PyReadonlyArray1<'_, u16>,
    y: PyReadonlyArray1<'_, u16>,
    p: PyReadonlyArray1<'_, u8>,
    t: PyReadonlyArray1<'_, u64>,
    width: u32,
    height: u32,
) -> PyResult<u64> {
    let events = collect_events(x, y, p, t)?;
    let header = RawHeader::new(width, height);

    let stats = writer::write_raw_file(path, &header, &events, &[])
        .map_err(|e| PyIOError::new_err(format!("Failed to write file: {}", e)))?;
    Ok(stats.total_words())
}

/// EVT 2.0 encoder module for Python.
#[pymodule]
fn evt2(_py: Python<'_>, m: &PyModule) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(encode_events, m)?)?;
    m.add_function(wrap_pyfunction!(write_file, m)?)?;
    m.add_class::<PyRawEvent>()?;
    m.add_class::<PyCdEventEncoder>()?;
    m.add_class::<PyTriggerEventEncoder>()?;
    m.add_class::<PyTimeHighEncoder>()?;
    Ok(())
}

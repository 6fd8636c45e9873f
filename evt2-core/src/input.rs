//! CSV event input.
//!
//! Reads the CSV layout produced by event decoders: one `x,y,p,t` line per
//! CD event (in a configurable field order), an optional `%geometry:W,H`
//! line, and `value,id,timestamp` lines for trigger events.

use crate::bits;
use crate::parser::{CD_POLARITY_BITS, CD_X_BITS, CD_Y_BITS, TRIGGER_ID_BITS, TRIGGER_VALUE_BITS};
use crate::types::{CdEvent, SensorMetadata, TriggerEvent};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while reading event input.
#[derive(Error, Debug)]
pub enum InputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("Line {line}: {message}")]
    Parse { line: usize, message: String },
}

/// Field ordering of CD event CSV lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldOrder {
    /// x, y, p, t (default)
    #[default]
    XYPT,
    /// t, x, y, p
    TXYP,
    /// x, y, t, p
    XYTP,
    /// Custom order specified by indices
    Custom([usize; 4]),
}

/// Maps a column name to the field it holds (x=0, y=1, p=2, t=3).
fn field_index(name: &str) -> Option<usize> {
    const NAMES: [&[&str]; 4] = [
        &["x"],
        &["y"],
        &["p", "pol", "polarity"],
        &["t", "ts", "time", "timestamp"],
    ];
    NAMES.iter().position(|aliases| aliases.contains(&name))
}

impl std::str::FromStr for FieldOrder {
    type Err = InputError;

    /// Parses a column list such as `x,y,p,t` or `t,x,y,p`. Every field must
    /// appear exactly once.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut indices = [0usize; 4];
        let mut seen = 0u8;
        let mut count = 0;

        for name in s.split(',').map(|n| n.trim().to_ascii_lowercase()) {
            if count == indices.len() {
                return Err(InputError::InvalidFormat(format!(
                    "'{}' has more than 4 columns",
                    s
                )));
            }
            let field = field_index(&name).ok_or_else(|| {
                InputError::InvalidFormat(format!("'{}' is not one of x, y, p, t", name))
            })?;
            if seen & (1 << field) != 0 {
                return Err(InputError::InvalidFormat(format!(
                    "column '{}' given twice",
                    name
                )));
            }
            seen |= 1 << field;
            indices[count] = field;
            count += 1;
        }

        if count != indices.len() {
            return Err(InputError::InvalidFormat(format!(
                "'{}' names {} columns, expected x, y, p and t",
                s, count
            )));
        }
        Ok(Self::from_indices(indices))
    }
}

impl FieldOrder {
    fn from_indices(indices: [usize; 4]) -> Self {
        match indices {
            [0, 1, 2, 3] => Self::XYPT,
            [3, 0, 1, 2] => Self::TXYP,
            [0, 1, 3, 2] => Self::XYTP,
            _ => Self::Custom(indices),
        }
    }

    /// Returns, for each CSV column, which field it holds (x=0, y=1, p=2, t=3).
    pub fn indices(&self) -> [usize; 4] {
        match self {
            Self::XYPT => [0, 1, 2, 3],
            Self::TXYP => [3, 0, 1, 2],
            Self::XYTP => [0, 1, 3, 2],
            Self::Custom(indices) => *indices,
        }
    }

    /// Returns the column header line for this field order.
    pub fn header(&self) -> String {
        const NAMES: [&str; 4] = ["x", "y", "polarity", "timestamp"];
        self.indices()
            .iter()
            .map(|&i| NAMES[i])
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Parses one CSV line into a CD event.
    pub fn parse_line(&self, line: &str) -> Result<CdEvent, String> {
        let mut values = [0u64; 4];
        let mut columns = line.split(',');

        for &field in self.indices().iter() {
            let column = columns
                .next()
                .ok_or_else(|| "expected 4 comma-separated values".to_string())?;
            values[field] = column
                .trim()
                .parse()
                .map_err(|e| format!("invalid value '{}': {}", column.trim(), e))?;
        }
        if columns.next().is_some() {
            return Err("expected 4 comma-separated values".to_string());
        }

        Ok(CdEvent::new(
            fit_field(values[0], "x", CD_X_BITS)? as u16,
            fit_field(values[1], "y", CD_Y_BITS)? as u16,
            fit_field(values[2], "polarity", CD_POLARITY_BITS)? as u8,
            values[3],
        ))
    }
}

/// CD events read from CSV, with the geometry line if one was present.
#[derive(Debug, Default)]
pub struct CdInput {
    /// Events in file order
    pub events: Vec<CdEvent>,
    /// Geometry from a `%geometry:W,H` line
    pub metadata: Option<SensorMetadata>,
}

/// Reads CD events from CSV lines.
///
/// Blank lines, `#` comments, the column header line and `%` lines other than
/// `%geometry:W,H` are skipped.
pub fn read_cd_events<R: BufRead>(reader: R, order: FieldOrder) -> Result<CdInput, InputError> {
    let column_header = order.header();
    let mut input = CdInput::default();

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') || line == column_header {
            continue;
        }
        if let Some(meta) = line.strip_prefix('%') {
            if let Some(geometry) = meta.strip_prefix("geometry:") {
                input.metadata = Some(parse_geometry(geometry).ok_or_else(|| {
                    InputError::Parse {
                        line: i + 1,
                        message: format!("invalid geometry '{}'", geometry),
                    }
                })?);
            }
            continue;
        }

        let event = order
            .parse_line(line)
            .map_err(|message| InputError::Parse {
                line: i + 1,
                message,
            })?;
        input.events.push(event);
    }

    Ok(input)
}

/// Reads trigger events from `value,id,timestamp` CSV lines.
pub fn read_trigger_events<R: BufRead>(reader: R) -> Result<Vec<TriggerEvent>, InputError> {
    let mut events = Vec::new();

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') || line.starts_with('%') {
            continue;
        }

        let event = parse_trigger_line(line).map_err(|message| InputError::Parse {
            line: i + 1,
            message,
        })?;
        events.push(event);
    }

    Ok(events)
}

fn parse_trigger_line(line: &str) -> Result<TriggerEvent, String> {
    let columns: Vec<&str> = line.split(',').map(str::trim).collect();
    if columns.len() != 3 {
        return Err("expected 3 comma-separated values: value,id,timestamp".to_string());
    }

    let value = columns[0]
        .parse()
        .map_err(|e| format!("invalid trigger value '{}': {}", columns[0], e))?;
    let id = columns[1]
        .parse()
        .map_err(|e| format!("invalid trigger id '{}': {}", columns[1], e))?;
    let value = fit_field(value, "trigger value", TRIGGER_VALUE_BITS)? as u8;
    let id = fit_field(id, "trigger id", TRIGGER_ID_BITS)? as u8;
    let timestamp = columns[2]
        .parse()
        .map_err(|e| format!("invalid timestamp '{}': {}", columns[2], e))?;

    Ok(TriggerEvent::new(value, id, timestamp))
}

/// Rejects values wider than their wire field.
fn fit_field(value: u64, name: &str, width: u32) -> Result<u64, String> {
    let max = bits::mask64(width);
    if value > max {
        Err(format!(
            "{} value {} does not fit in {} bits (max {})",
            name, value, width, max
        ))
    } else {
        Ok(value)
    }
}

fn parse_geometry(geometry: &str) -> Option<SensorMetadata> {
    let (w, h) = geometry.split_once(',')?;
    Some(SensorMetadata {
        width: w.trim().parse().ok()?,
        height: h.trim().parse().ok()?,
    })
}

/// Reads CD events from a CSV file.
pub fn read_cd_csv<P: AsRef<Path>>(path: P, order: FieldOrder) -> Result<CdInput, InputError> {
    let file = File::open(path)?;
    read_cd_events(BufReader::new(file), order)
}

/// Reads trigger events from a CSV file.
pub fn read_trigger_csv<P: AsRef<Path>>(path: P) -> Result<Vec<TriggerEvent>, InputError> {
    let file = File::open(path)?;
    read_trigger_events(BufReader::new(file))
}

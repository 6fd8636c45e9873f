//! Text header of EVT 2.0 raw files.
//!
//! A raw file starts with `%`-prefixed ASCII lines terminated by `% end`,
//! followed directly by the little-endian event words.

use crate::types::SensorMetadata;

/// Integrator name written when none is given.
pub const DEFAULT_INTEGRATOR: &str = "Prophesee";

/// Header fields of an EVT 2.0 raw file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawHeader {
    /// Sensor geometry
    pub metadata: SensorMetadata,
    /// Integrator name
    pub integrator: String,
    /// Creation date, already formatted (`YYYY-MM-DD HH:MM:SS`)
    pub date: Option<String>,
}

impl Default for RawHeader {
    fn default() -> Self {
        Self {
            metadata: SensorMetadata::default(),
            integrator: DEFAULT_INTEGRATOR.to_string(),
            date: None,
        }
    }
}

impl RawHeader {
    /// Creates a header for the given sensor geometry.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            metadata: SensorMetadata { width, height },
            ..Self::default()
        }
    }

    /// Returns the header lines, without line terminators.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(6);
        if let Some(date) = &self.date {
            lines.push(format!("% date {}", date));
        }
        lines.push("% evt 2.0".to_string());
        lines.push(format!(
            "% format EVT2;width={};height={}",
            self.metadata.width, self.metadata.height
        ));
        lines.push(format!(
            "% geometry {}x{}",
            self.metadata.width, self.metadata.height
        ));
        lines.push(format!("% integrator_name {}", self.integrator));
        lines.push("% end".to_string());
        lines
    }

    /// Updates the header from a single header line.
    ///
    /// Unknown or malformed lines are ignored.
    pub fn parse_line(&mut self, line: &str) {
        let line = line.trim_end();

        if let Some(format_str) = line.strip_prefix("% format ") {
            // Format: "% format EVT2;width=640;height=480"
            for part in format_str.split(';') {
                if let Some((name, value)) = part.split_once('=') {
                    match name {
                        "width" => {
                            if let Ok(w) = value.parse() {
                                self.metadata.width = w;
                            }
                        }
                        "height" => {
                            if let Ok(h) = value.parse() {
                                self.metadata.height = h;
                            }
                        }
                        _ => {}
                    }
                }
            }
        } else if let Some(geometry_str) = line.strip_prefix("% geometry ") {
            if let Some((w, h)) = geometry_str.split_once('x') {
                if let (Ok(w), Ok(h)) = (w.parse(), h.parse()) {
                    self.metadata.width = w;
                    self.metadata.height = h;
                }
            }
        } else if let Some(name) = line.strip_prefix("% integrator_name ") {
            self.integrator = name.to_string();
        } else if let Some(date) = line.strip_prefix("% date ") {
            self.date = Some(date.to_string());
        }
    }

    /// Parses header lines up to `% end`.
    pub fn parse<'a, I>(lines: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut header = Self::default();
        for line in lines {
            if line.starts_with("% end") {
                break;
            }
            header.parse_line(line);
        }
        header
    }
}

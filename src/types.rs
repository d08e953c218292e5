use chrono::NaiveDateTime;
use std::collections::HashMap;
use std::fmt;

/// A single cell read from the data file.
///
/// Delimited text only ever produces [`CellValue::Text`] and [`CellValue::Empty`];
/// spreadsheets keep their native typing.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
    Error(String),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(text) => text.is_empty(),
            _ => false,
        }
    }

    /// Text that gets written into a placeholder. Absent values become `""`.
    pub fn to_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(text) => f.write_str(text),
            CellValue::Int(value) => write!(f, "{value}"),
            CellValue::Float(value) => write_float(f, *value),
            CellValue::Bool(true) => f.write_str("TRUE"),
            CellValue::Bool(false) => f.write_str("FALSE"),
            CellValue::DateTime(value) => write!(f, "{}", value.format("%Y-%m-%d %H:%M:%S")),
            CellValue::Error(literal) => f.write_str(literal),
        }
    }
}

/// Positional notation for exponents in `-4..16`, `1.5e+20` style outside.
/// Integral values drop the fraction, as spreadsheets store whole numbers as floats.
fn write_float(f: &mut fmt::Formatter<'_>, value: f64) -> fmt::Result {
    if !value.is_finite() {
        return write!(f, "{value}");
    }

    let scientific = format!("{value:e}");
    let (mantissa, exponent) = scientific.split_once('e').unwrap_or((scientific.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    if !(-4..16).contains(&exponent) {
        let sign = if exponent < 0 { '-' } else { '+' };
        return write!(f, "{mantissa}e{sign}{:02}", exponent.abs());
    }

    if value.fract() == 0.0 {
        write!(f, "{}", value as i64)
    } else {
        write!(f, "{value}")
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(value.to_string())
        }
    }
}

/// Header row plus data rows, positional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl DataTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        Self { headers, rows }
    }
}

/// Mapping from column header to the cell value of one data row.
#[derive(Debug, Clone, Default)]
pub struct RowBinding {
    values: HashMap<String, CellValue>,
}

impl RowBinding {
    /// Zips `headers` with `row` positionally.
    ///
    /// Headers without a cell are bound to [`CellValue::Empty`], cells without a
    /// header are dropped. Empty header names are never bound; when a header name
    /// repeats, the right-most column wins.
    pub fn new(headers: &[String], row: &[CellValue]) -> Self {
        let mut values = HashMap::with_capacity(headers.len());
        for (idx, header) in headers.iter().enumerate() {
            if header.is_empty() {
                continue;
            }
            let value = row.get(idx).cloned().unwrap_or(CellValue::Empty);
            values.insert(header.clone(), value);
        }
        Self { values }
    }

    pub fn get(&self, name: &str) -> Option<&CellValue> {
        self.values.get(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// An explicit sRGB run color, e.g. `FF0000`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Parses the six hex digits used by `a:srgbClr@val`.
    pub fn from_hex(value: &str) -> Option<Rgb> {
        if value.len() != 6 || !value.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&value[range], 16).ok();
        Some(Rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }

    pub fn to_hex(self) -> String {
        format!("{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_cell_text_coercion() {
        assert_eq!(CellValue::Empty.to_text(), "");
        assert_eq!(CellValue::Float(90.0).to_text(), "90");
        assert_eq!(CellValue::Float(2.5).to_text(), "2.5");
        assert_eq!(CellValue::Float(1e15).to_text(), "1000000000000000");
        assert_eq!(CellValue::Float(1e20).to_text(), "1e+20");
        assert_eq!(CellValue::Float(-2.5e17).to_text(), "-2.5e+17");
        assert_eq!(CellValue::Float(0.0001).to_text(), "0.0001");
        assert_eq!(CellValue::Float(1.5e-5).to_text(), "1.5e-05");
        assert_eq!(CellValue::Float(0.0).to_text(), "0");
        assert_eq!(CellValue::Int(-3).to_text(), "-3");
        assert_eq!(CellValue::Bool(true).to_text(), "TRUE");
        assert_eq!(CellValue::Error("#N/A".into()).to_text(), "#N/A");

        let date = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(14, 5, 0)
            .unwrap();
        assert_eq!(CellValue::DateTime(date).to_text(), "2024-03-09 14:05:00");
    }

    #[test]
    fn test_binding_pads_short_rows() {
        let headers = vec!["Name".to_string(), "Score".to_string()];
        let binding = RowBinding::new(&headers, &[CellValue::from("Alice")]);

        assert_eq!(binding.get("Name"), Some(&CellValue::Text("Alice".into())));
        assert_eq!(binding.get("Score"), Some(&CellValue::Empty));
    }

    #[test]
    fn test_binding_ignores_extra_cells_and_blank_headers() {
        let headers = vec!["".to_string(), "Name".to_string()];
        let row = vec![
            CellValue::from("skipped"),
            CellValue::from("Bob"),
            CellValue::from("overflow"),
        ];
        let binding = RowBinding::new(&headers, &row);

        assert_eq!(binding.len(), 1);
        assert_eq!(binding.get("Name").map(CellValue::to_text), Some("Bob".into()));
        assert!(binding.get("").is_none());
    }

    #[test]
    fn test_binding_last_duplicate_header_wins() {
        let headers = vec!["Name".to_string(), "Name".to_string()];
        let binding = RowBinding::new(&headers, &[CellValue::from("a"), CellValue::from("b")]);
        assert_eq!(binding.get("Name").map(CellValue::to_text), Some("b".into()));
    }

    #[test]
    fn test_rgb_hex() {
        assert_eq!(Rgb::from_hex("FF0000"), Some(Rgb(255, 0, 0)));
        assert_eq!(Rgb::from_hex("00ff7f").map(Rgb::to_hex), Some("00FF7F".into()));
        assert_eq!(Rgb::from_hex("F00"), None);
        assert_eq!(Rgb::from_hex("GG0000"), None);
    }
}

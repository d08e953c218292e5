//! Loading the data file into a header row plus data rows.

use crate::constants::{SPREADSHEET_NAMESPACE, WORKBOOK_PATH};
use crate::parse_xml::{find_child, parse_document, xml_text};
use crate::{CellValue, DataTable, Error, Result};
use calamine::{open_workbook_auto, Data, Range, Reader};
use chrono::NaiveDateTime;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

const UTF8_BOM: &[u8] = b"\xef\xbb\xbf";

/// Loads `path` as a data table.
///
/// Files with a `.csv` extension are read as comma separated UTF-8 text with
/// every value kept as text. Anything else is opened as a spreadsheet and the
/// active worksheet is read with its native cell types.
///
/// # Errors
///
/// Malformed input is returned as [`Error::Csv`] or [`Error::Spreadsheet`]; a
/// file without a header row as [`Error::EmptyData`].
pub fn load_table(path: &Path) -> Result<DataTable> {
    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));

    let table = if is_csv {
        read_csv(File::open(path)?)?
    } else {
        read_spreadsheet(path)?
    };

    debug!(
        path = %path.display(),
        columns = table.headers.len(),
        rows = table.rows.len(),
        "loaded data table"
    );
    Ok(table)
}

/// Reads comma separated text. Rows may have any number of fields.
///
/// Blank lines between or after records are data rows without cells.
pub fn read_csv<R: Read>(mut reader: R) -> Result<DataTable> {
    let mut input = Vec::new();
    reader.read_to_end(&mut input)?;
    let data = input.strip_prefix(UTF8_BOM).unwrap_or(&input);

    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(data);
    let mut record = csv::StringRecord::new();

    if !csv_reader.read_record(&mut record)? {
        return Err(Error::EmptyData);
    }
    let headers = record.iter().map(str::to_string).collect();

    let mut rows = Vec::new();
    let mut consumed = byte_offset(&csv_reader);
    while csv_reader.read_record(&mut record)? {
        rows.extend(std::iter::repeat_with(Vec::new).take(blank_lines_at(data, consumed)));
        rows.push(record.iter().map(CellValue::from).collect());
        consumed = byte_offset(&csv_reader);
    }
    rows.extend(std::iter::repeat_with(Vec::new).take(blank_lines_at(data, consumed)));

    Ok(DataTable::new(headers, rows))
}

fn byte_offset<R: Read>(csv_reader: &csv::Reader<R>) -> usize {
    csv_reader.position().byte() as usize
}

/// Number of empty lines starting at `offset`, the end of the previous record.
/// The csv reader skips these without yielding a record.
fn blank_lines_at(data: &[u8], offset: usize) -> usize {
    let rest = data.get(offset..).unwrap_or_default();
    let mut breaks = rest
        .iter()
        .take_while(|b| matches!(b, b'\r' | b'\n'))
        .peekable();

    // a record ending on `\r` leaves the `\n` of its terminator unread
    if offset > 0 && data[offset - 1] == b'\r' && rest.first() == Some(&b'\n') {
        breaks.next();
    }

    let mut count = 0;
    while let Some(&byte) = breaks.next() {
        if byte == b'\r' {
            breaks.next_if(|next| **next == b'\n');
        }
        count += 1;
    }
    count
}

fn read_spreadsheet(path: &Path) -> Result<DataTable> {
    let mut workbook = open_workbook_auto(path)?;
    let sheet_names = workbook.sheet_names();
    if sheet_names.is_empty() {
        return Err(Error::NoWorksheet);
    }

    let index = match active_sheet_index(path) {
        Some(index) if index < sheet_names.len() => index,
        Some(index) => {
            warn!(index, "active sheet index out of range, reading the first sheet");
            0
        }
        None => 0,
    };
    debug!(sheet = %sheet_names[index], "reading worksheet");

    let range = workbook.worksheet_range(&sheet_names[index])?;
    table_from_range(&range)
}

/// Builds the table from absolute sheet positions, so row 1 is always the
/// header row even when the used range starts further down.
fn table_from_range(range: &Range<Data>) -> Result<DataTable> {
    let Some((end_row, end_col)) = range.end() else {
        return Err(Error::EmptyData);
    };

    let row_values = |row: u32| -> Vec<CellValue> {
        (0..=end_col)
            .map(|col| range.get_value((row, col)).map(cell_value).unwrap_or(CellValue::Empty))
            .collect()
    };

    let headers = row_values(0).iter().map(CellValue::to_text).collect();
    let rows = (1..=end_row).map(row_values).collect();
    Ok(DataTable::new(headers, rows))
}

fn cell_value(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::String(s) if s.is_empty() => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Int(i) => CellValue::Int(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(value) => CellValue::DateTime(value),
            None => CellValue::Float(dt.as_f64()),
        },
        Data::DateTimeIso(s) => NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
            .map(CellValue::DateTime)
            .unwrap_or_else(|_| CellValue::Text(s.clone())),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(e) => CellValue::Error(e.to_string()),
    }
}

/// Index of the worksheet that was active when an OOXML workbook was saved.
///
/// `None` for other formats or when the workbook does not record one.
fn active_sheet_index(path: &Path) -> Option<usize> {
    let file = File::open(path).ok()?;
    let mut archive = zip::ZipArchive::new(file).ok()?;
    let mut content = Vec::new();
    archive.by_name(WORKBOOK_PATH).ok()?.read_to_end(&mut content).ok()?;

    let xml_str = xml_text(&content).ok()?;
    let doc = parse_document(xml_str).ok()?;
    let book_views = find_child(&doc.root_element(), SPREADSHEET_NAMESPACE, "bookViews")?;
    let view = find_child(&book_views, SPREADSHEET_NAMESPACE, "workbookView")?;
    view.attribute("activeTab")?.parse().ok()
}

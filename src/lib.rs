mod constants;
mod container;
mod parse_rels;
mod parse_xml;
mod slide;
mod types;
mod xml_edit;

pub mod config;
pub mod merge;
pub mod resolve;
pub mod table;

pub use config::{default_output_name, ResolvedPaths, RunConfig};
pub use container::PptxContainer;
pub use merge::{merge_files, merge_rows, MergeReport};
pub use resolve::find_file;
pub use slide::{ShapeInfo, Slide};
pub use table::load_table;
pub use types::*;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML parse error: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("UTF-8 conversion error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("Invalid file pattern: {0}")]
    Pattern(#[from] globset::Error),

    #[error("Multiple {extension} files found: {}. Please specify with flag.", .candidates.join(", "))]
    AmbiguousInput {
        extension: String,
        candidates: Vec<String>,
    },

    #[error("No {expected} file found. Specify with {flag} flag.")]
    MissingInput {
        expected: String,
        flag: &'static str,
    },

    #[error("Part not found in package: {0}")]
    PartNotFound(String),

    #[error("Slide not found")]
    SlideNotFound,

    #[error("Parse error: {0}")]
    ParseError(&'static str),

    #[error("Data file is empty, expected a header row")]
    EmptyData,

    #[error("Data file has a header row but no data rows")]
    NoDataRows,

    #[error("Workbook contains no worksheets")]
    NoWorksheet,
}

pub type Result<T> = std::result::Result<T, Error>;

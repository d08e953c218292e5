pub const P_NAMESPACE: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
pub const A_NAMESPACE: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
pub const RELS_NAMESPACE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
pub const MC_NAMESPACE: &str = "http://schemas.openxmlformats.org/markup-compatibility/2006";
pub const SPREADSHEET_NAMESPACE: &str =
    "http://schemas.openxmlformats.org/spreadsheetml/2006/main";

pub const SLIDE_REL_TYPE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
pub const NOTES_SLIDE_REL_TYPE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/notesSlide";
pub const COMMENTS_REL_TYPE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/comments";
pub const MODERN_COMMENTS_REL_TYPE: &str =
    "http://schemas.microsoft.com/office/2018/10/relationships/comments";
pub const OFFICE_DOCUMENT_REL_TYPE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";

/// Relationships that belong to a single slide and are not carried over to copies.
pub const SLIDE_OWNED_REL_TYPES: &[&str] = &[NOTES_SLIDE_REL_TYPE, COMMENTS_REL_TYPE, MODERN_COMMENTS_REL_TYPE];

pub const SLIDE_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.slide+xml";

pub const CONTENT_TYPES_PATH: &str = "[Content_Types].xml";
pub const PACKAGE_RELS_PATH: &str = "_rels/.rels";
pub const DEFAULT_PRESENTATION_PATH: &str = "ppt/presentation.xml";
pub const WORKBOOK_PATH: &str = "xl/workbook.xml";

/// Lowest value PowerPoint accepts for `p:sldId@id`.
pub const MIN_SLIDE_ID: u32 = 256;

pub const TEMPLATE_EXTENSIONS: &[&str] = &[".pptx"];
pub const DATA_EXTENSIONS: &[&str] = &[".xlsx", ".csv"];

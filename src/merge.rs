//! Row-to-slide merge.
//!
//! The first data row is written into the template's first slide. Every further
//! row gets a copy of that slide, taken before any value was written, inserted
//! after the previously generated slide.

use crate::constants::SLIDE_OWNED_REL_TYPES;
use crate::parse_rels::remove_relationships_of_types;
use crate::{load_table, DataTable, Error, PptxContainer, Result, RowBinding, Slide};
use std::path::Path;
use tracing::{debug, info, warn};

/// Outcome of a merge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Part names of the populated slides, in row order.
    pub slides: Vec<String>,
    /// Number of shapes that received text, per row.
    pub filled: Vec<usize>,
}

/// Populates one slide per row of `table`.
///
/// # Errors
///
/// [`Error::NoDataRows`] when the table has only a header row,
/// [`Error::SlideNotFound`] when the template has no slides, and any parse
/// error of the template slide. No row is skipped: a short row still produces
/// a slide with empty text for its missing columns.
pub fn merge_rows(container: &mut PptxContainer, table: &DataTable) -> Result<MergeReport> {
    if table.rows.is_empty() {
        return Err(Error::NoDataRows);
    }
    if container.slide_count() > 1 {
        warn!(
            extra = container.slide_count() - 1,
            "template has more than one slide; only the first is used, the others are kept after the generated slides"
        );
    }

    let template = container.load_slide(0)?;
    let copy_xml = template.duplicate_xml()?;
    let copy_rels = copy_relationships(container, &template)?;

    let mut report = MergeReport::default();
    let mut previous = template.rel_path.clone();
    let mut template = Some(template);

    for (idx, row) in table.rows.iter().enumerate() {
        if row.len() > table.headers.len() {
            debug!(row = idx, cells = row.len(), "row is longer than the header; extra cells ignored");
        }
        let binding = RowBinding::new(&table.headers, row);

        let mut slide = match template.take() {
            Some(first) => first,
            None => {
                let path = container.add_slide_after(&previous, copy_xml.clone(), copy_rels.clone())?;
                Slide::parse(copy_xml.as_bytes(), path)?
            }
        };

        let filled = slide.fill(&binding)?;
        previous = slide.rel_path.clone();
        report.slides.push(slide.rel_path.clone());
        report.filled.push(filled);
        container.store_slide(slide);
    }

    info!(slides = report.slides.len(), "merged rows into slides");
    Ok(report)
}

/// Relationships for a copy of `slide`: the same targets (layout, images,
/// links, charts) minus speaker notes and comments, which belong to the
/// original only. Charts stay shared between the original and its copies.
fn copy_relationships(container: &PptxContainer, slide: &Slide) -> Result<Option<String>> {
    let rels_path = PptxContainer::get_rels_path(&slide.rel_path);
    if !container.has_part(&rels_path) {
        return Ok(None);
    }
    let rels_data = container.read_file_from_archive(&rels_path)?;
    Ok(Some(remove_relationships_of_types(rels_data, SLIDE_OWNED_REL_TYPES)?))
}

/// Loads both inputs, merges them and writes `output` once everything succeeded.
pub fn merge_files(template: &Path, data: &Path, output: &Path) -> Result<MergeReport> {
    let mut container = PptxContainer::open(template)?;
    let table = load_table(data)?;

    let report = merge_rows(&mut container, &table)?;
    container.save(output)?;
    debug!(output = %output.display(), "saved presentation");
    Ok(report)
}

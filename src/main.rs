//! slide-merge: fill a PowerPoint template with one slide per spreadsheet row
//!
//! Reads a `.pptx` template and an `.xlsx` or `.csv` data file, clones the
//! template's first slide for every row and writes the row's values into the
//! shapes named after the columns.

use anyhow::Result;

mod cli;

fn main() -> Result<()> {
    cli::run()
}

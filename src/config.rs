use crate::constants::{DATA_EXTENSIONS, TEMPLATE_EXTENSIONS};
use crate::{find_file, Error, Result};
use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};

/// Settings of one merge run.
///
/// Use [`RunConfig::builder()`] to create a configuration instance. Inputs
/// that are not set explicitly are looked up in the working directory.
///
/// # Configuration Options
///
/// | Parameter | Type | Default | Description |
/// |-----------|------|---------|-------------|
/// | `template` | `PathBuf` | single `.pptx` in `working_dir` | Template presentation |
/// | `data` | `PathBuf` | single `.xlsx`, else single `.csv` in `working_dir` | Data file |
/// | `output` | `String` | `output_<YYYYMMDD_HHMMSS>.<ext>` | Output file name, placed next to the template |
/// | `working_dir` | `PathBuf` | `.` | Directory searched for inputs and base of relative paths |
///
/// # Example
///
/// ```
/// use slide_merge::RunConfig;
///
/// let config = RunConfig::builder()
///     .template("certificates.pptx")
///     .output("filled.pptx")
///     .build();
/// assert!(config.data.is_none());
/// ```
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub template: Option<PathBuf>,
    pub data: Option<PathBuf>,
    pub output: Option<String>,
    pub working_dir: PathBuf,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            template: None,
            data: None,
            output: None,
            working_dir: PathBuf::from("."),
        }
    }
}

/// Input and output locations of a run once every default has been applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    pub template: PathBuf,
    pub data: PathBuf,
    pub output: PathBuf,
}

impl RunConfig {
    pub fn builder() -> RunConfigBuilder {
        RunConfigBuilder::default()
    }

    /// The explicit template, or the only `.pptx` in the working directory.
    pub fn resolve_template(&self) -> Result<PathBuf> {
        self.resolve_input(self.template.as_deref(), TEMPLATE_EXTENSIONS, "-t")
    }

    /// The explicit data file, or the only `.xlsx` (then `.csv`) in the working directory.
    pub fn resolve_data(&self) -> Result<PathBuf> {
        self.resolve_input(self.data.as_deref(), DATA_EXTENSIONS, "-d")
    }

    /// Output path inside the template's directory. `now` names the file when
    /// no output name was configured.
    pub fn resolve_output(&self, template: &Path, now: NaiveDateTime) -> PathBuf {
        let base_dir = template.parent().unwrap_or(Path::new(""));
        match &self.output {
            Some(name) => base_dir.join(name),
            None => {
                let extension = template
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .unwrap_or("pptx");
                base_dir.join(default_output_name(now, extension))
            }
        }
    }

    /// Resolves template, data file and output path, in that order.
    ///
    /// # Errors
    ///
    /// [`Error::AmbiguousInput`] or [`Error::MissingInput`] when an input has to
    /// be looked up and the working directory does not name exactly one.
    pub fn resolve(&self, now: NaiveDateTime) -> Result<ResolvedPaths> {
        let template = self.resolve_template()?;
        let data = self.resolve_data()?;
        let output = self.resolve_output(&template, now);
        Ok(ResolvedPaths { template, data, output })
    }

    fn resolve_input(&self, explicit: Option<&Path>, extensions: &[&str], flag: &'static str) -> Result<PathBuf> {
        if let Some(path) = explicit {
            return Ok(self.working_dir.join(path));
        }
        find_file(&self.working_dir, extensions)?.ok_or_else(|| Error::MissingInput {
            expected: extensions.join(" or "),
            flag,
        })
    }
}

/// `output_<YYYYMMDD_HHMMSS>.<extension>` for the given local time.
pub fn default_output_name(now: NaiveDateTime, extension: &str) -> String {
    format!("output_{}.{}", now.format("%Y%m%d_%H%M%S"), extension)
}

/// Builder for [`RunConfig`].
///
/// Allows setting individual fields while falling back to defaults for any unspecified values.
#[derive(Debug, Default)]
pub struct RunConfigBuilder {
    template: Option<PathBuf>,
    data: Option<PathBuf>,
    output: Option<String>,
    working_dir: Option<PathBuf>,
}

impl RunConfigBuilder {
    /// Sets the template presentation. Relative paths are taken from the working directory.
    pub fn template(mut self, path: impl Into<PathBuf>) -> Self {
        self.template = Some(path.into());
        self
    }

    /// Sets the data file. Relative paths are taken from the working directory.
    pub fn data(mut self, path: impl Into<PathBuf>) -> Self {
        self.data = Some(path.into());
        self
    }

    /// Sets the output file name.
    pub fn output(mut self, name: impl Into<String>) -> Self {
        self.output = Some(name.into());
        self
    }

    /// Sets the directory that is searched for inputs.
    pub fn working_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(path.into());
        self
    }

    /// Builds the final [`RunConfig`] instance, applying default values for any fields that were not set.
    pub fn build(self) -> RunConfig {
        RunConfig {
            template: self.template,
            data: self.data,
            output: self.output,
            working_dir: self.working_dir.unwrap_or_else(|| PathBuf::from(".")),
        }
    }
}

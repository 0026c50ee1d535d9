//! Batch drivers over files and directories
//!
//! Every file is processed independently: one that fails to parse or decode
//! is logged and recorded, and the run continues with the next one.

use crate::export::save_png;
use crate::grd::read_grd_file;
use crate::pac::PacArchive;
use crate::{GrdPacError, Result};
use log::{info, warn};
use std::fs;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Options shared by the batch drivers
#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    /// Replace existing output files instead of skipping them
    pub overwrite: bool,
}

/// Outcome of one directory conversion
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Output files written
    pub converted: Vec<PathBuf>,
    /// Inputs left alone: not this format, or output already present
    pub skipped: Vec<(PathBuf, String)>,
    /// Inputs that failed to read, decode or write, and unreadable paths
    pub failed: Vec<(PathBuf, GrdPacError)>,
}

impl BatchReport {
    /// Number of inputs seen
    pub fn total(&self) -> usize {
        self.converted.len() + self.skipped.len() + self.failed.len()
    }
}

/// Decode one GRD file and write it as PNG
pub fn convert_grd_to_png<P: AsRef<Path>, Q: AsRef<Path>>(input: P, output: Q) -> Result<()> {
    let image = read_grd_file(input)?;
    save_png(output, &image)
}

/// True for `*.grd` in any case
pub fn is_grd_path(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("grd"))
}

/// Walk `input_dir`, splitting GRD files from paths the walk could not read
fn walk_grd_files(input_dir: &Path) -> (Vec<PathBuf>, Vec<(PathBuf, GrdPacError)>) {
    let mut files = Vec::new();
    let mut errors = Vec::new();
    for entry in WalkDir::new(input_dir).sort_by_file_name() {
        match entry {
            Ok(entry) if entry.file_type().is_file() && is_grd_path(entry.path()) => {
                files.push(entry.into_path());
            }
            Ok(_) => {}
            Err(e) => {
                let path = e.path().unwrap_or(input_dir).to_path_buf();
                warn!("cannot read {}: {e}", path.display());
                errors.push((path, GrdPacError::Io(e.into())));
            }
        }
    }
    (files, errors)
}

/// List every GRD file below `input_dir`, sorted by path
///
/// Directories that cannot be read are logged and left out.
pub fn find_grd_files<P: AsRef<Path>>(input_dir: P) -> Vec<PathBuf> {
    walk_grd_files(input_dir.as_ref()).0
}

/// Output path for `input` below `output_dir`, mirroring its place below
/// `input_dir` with a `.png` extension
pub fn png_output_path(input_dir: &Path, output_dir: &Path, input: &Path) -> PathBuf {
    let relative = input.strip_prefix(input_dir).unwrap_or(input);
    output_dir.join(relative).with_extension("png")
}

/// Convert every GRD file below `input_dir` to PNG below `output_dir`
///
/// `on_file` is called after each input, whatever its outcome. Paths the
/// walk cannot read are recorded as failures and the walk goes on.
pub fn convert_directory<P, Q, F>(
    input_dir: P,
    output_dir: Q,
    options: &BatchOptions,
    mut on_file: F,
) -> Result<BatchReport>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
    F: FnMut(&Path),
{
    let input_dir = input_dir.as_ref();
    let output_dir = output_dir.as_ref();
    let (files, walk_errors) = walk_grd_files(input_dir);
    let mut report = BatchReport {
        failed: walk_errors,
        ..BatchReport::default()
    };

    for input in files {
        let output = png_output_path(input_dir, output_dir, &input);
        if output.exists() && !options.overwrite {
            report
                .skipped
                .push((input.clone(), format!("{} exists", output.display())));
        } else {
            match convert_one(&input, &output) {
                Ok(()) => {
                    info!("converted {} -> {}", input.display(), output.display());
                    report.converted.push(output);
                }
                Err(e) if e.is_unsupported() => {
                    warn!("skipping {}: {e}", input.display());
                    report.skipped.push((input.clone(), e.to_string()));
                }
                Err(e) => {
                    warn!("failed to convert {}: {e}", input.display());
                    report.failed.push((input.clone(), e));
                }
            }
        }
        on_file(&input);
    }

    Ok(report)
}

fn convert_one(input: &Path, output: &Path) -> Result<()> {
    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }
    convert_grd_to_png(input, output)
}

/// Reject names that would escape the output directory
fn safe_relative(name: &str) -> Result<PathBuf> {
    let path = Path::new(name);
    let clean = !name.is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if clean {
        Ok(path.to_path_buf())
    } else {
        Err(GrdPacError::InvalidData(format!(
            "entry name '{name}' is not a plain relative path"
        )))
    }
}

/// Outcome of one archive extraction
#[derive(Debug, Default)]
pub struct ExtractReport {
    /// Files written
    pub written: Vec<PathBuf>,
    /// Targets left alone because they already existed
    pub skipped: Vec<(PathBuf, String)>,
}

/// Extract every entry of an archive into `output_dir`
///
/// Entries are written under their sniffed names; scripts are written
/// de-obfuscated. Without `overwrite`, a target that already exists is
/// skipped, including one written earlier in the same run by an entry that
/// sniffed to the same name.
pub fn extract_archive<P: AsRef<Path>, Q: AsRef<Path>>(
    archive_path: P,
    output_dir: Q,
    options: &BatchOptions,
) -> Result<ExtractReport> {
    let output_dir = output_dir.as_ref();
    let mut archive = PacArchive::open(archive_path)?;
    fs::create_dir_all(output_dir)?;

    let mut report = ExtractReport::default();
    for position in 0..archive.entries().len() {
        let name = archive.entries()[position].name.clone();
        let target = output_dir.join(safe_relative(&name)?);
        if target.exists() && !options.overwrite {
            warn!("{} exists, skipping", target.display());
            let reason = if report.written.contains(&target) {
                format!("'{name}' collides with an earlier entry")
            } else {
                format!("{} exists", target.display())
            };
            report.skipped.push((target, reason));
            continue;
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = archive.read_entry(position)?;
        fs::write(&target, data)?;
        info!("extracted {name}");
        if !report.written.contains(&target) {
            report.written.push(target);
        }
    }
    Ok(report)
}

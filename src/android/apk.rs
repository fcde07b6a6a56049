use crate::dex::{read_dex, DexError};
use crate::visit::DexApkVisitor;
use log::{debug, warn};
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;
use zip::read::ZipArchive;

/// What to do when one dex entry of an APK fails to decode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Stop and return the error.
    #[default]
    Abort,
    /// Log it, keep it in the report and carry on with the next entry.
    Skip,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ApkOptions {
    pub on_error: ErrorPolicy,
}

/// Outcome of walking an APK.
#[derive(Debug, Default)]
pub struct ApkReport {
    /// Number of dex entries found, including ones that failed.
    pub dex_entries: usize,
    /// Entries skipped under [`ErrorPolicy::Skip`].
    pub failures: Vec<DexError>,
}

/// True for archive entries that hold DEX files: a name with no whitespace
/// ending in `.dex`.
pub fn is_dex_entry(name: &str) -> bool {
    match name.strip_suffix(".dex") {
        Some(stem) => !stem.is_empty() && !name.chars().any(char::is_whitespace),
        None => false,
    }
}

/// Walk every DEX file in the APK at `path`, stopping at the first failure.
pub fn read_apk(path: impl AsRef<Path>, visitor: &mut dyn DexApkVisitor) -> Result<ApkReport, DexError> {
    read_apk_with(path, visitor, ApkOptions::default())
}

pub fn read_apk_with(
    path: impl AsRef<Path>,
    visitor: &mut dyn DexApkVisitor,
    options: ApkOptions,
) -> Result<ApkReport, DexError> {
    let path = path.as_ref();
    let apk = path.display().to_string();
    let file = File::open(path).map_err(|e| in_apk(e.into(), &apk))?;
    read_apk_from(&apk, file, visitor, options)
}

/// Walk the DEX entries of an already opened archive, in archive order.
pub fn read_apk_from<R: Read + Seek>(
    apk: &str,
    reader: R,
    visitor: &mut dyn DexApkVisitor,
    options: ApkOptions,
) -> Result<ApkReport, DexError> {
    let mut archive = ZipArchive::new(reader).map_err(|e| in_apk(e.into(), apk))?;

    visitor.visit_apk(apk);
    visitor.verbose(1, format_args!("APK {} contains {} entries", apk, archive.len()));

    let mut report = ApkReport::default();
    for i in 0..archive.len() {
        // Raw access reads the name without needing to understand the compression.
        let entry_name = archive
            .by_index_raw(i)
            .map_err(|e| in_apk(e.into(), apk))?
            .name()
            .to_string();
        if !is_dex_entry(&entry_name) {
            continue;
        }
        visitor.verbose(1, format_args!("dex file {} at entry {}", entry_name, i));
        report.dex_entries += 1;

        let result = match archive.by_index(i) {
            Ok(entry) => {
                let size = entry.size();
                read_dex(Some(apk), &entry_name, entry, size, visitor)
            }
            Err(e) => Err(DexError::from(e).in_dex(&entry_name, Some(apk))),
        };

        match result {
            Ok(()) => {}
            Err(e) if options.on_error == ErrorPolicy::Skip => {
                warn!("skipping {}: {}", entry_name, e);
                report.failures.push(e);
            }
            Err(e) => return Err(e),
        }
    }

    debug!(
        "apk {}: {} dex entries, {} failed",
        apk,
        report.dex_entries,
        report.failures.len()
    );
    Ok(report)
}

fn in_apk(e: DexError, apk: &str) -> DexError {
    DexError::with_context(e, format!("apk {}", apk))
}

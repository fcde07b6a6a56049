//! APK (ZIP) traversal: finds the DEX entries of an archive and walks each one.

mod apk;

pub use apk::{is_dex_entry, read_apk, read_apk_from, read_apk_with, ApkOptions, ApkReport, ErrorPolicy};

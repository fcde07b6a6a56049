//! # dexread
//!
//! A library for examining the classes and methods of Android DEX files,
//! either standalone or packed inside an APK.
//!
//! Decoding is driven by a [`visit::DexApkVisitor`]: the reader walks the DEX
//! file top-down and calls the visitor for every dex, class and method it
//! finds.
//!
//! # Examples
//!
//! ```no_run
//!  use dexread::android::read_apk;
//!  use dexread::dump::DexApkDumper;
//!
//!  let mut dumper = DexApkDumper::stdout(0);
//!  read_apk("app.apk", &mut dumper).unwrap();
//! ```

pub mod android;
pub mod dex;
pub mod dump;
mod tests;
pub mod types;
pub mod visit;

pub use crate::android::read_apk;
pub use crate::dex::{read_dex, read_dex_bytes, read_dex_file, DexError, DexErrorKind};
pub use crate::visit::DexApkVisitor;

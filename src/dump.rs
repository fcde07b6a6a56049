/* A visitor that dumps APK/DEX contents as text */

use crate::dex::dex_file::signature_hex;
use crate::visit::{DexApkVisitor, DexEvent};
use std::fmt;
use std::io::{self, Write};

/// Writes one line per callback; verbose messages at or below `vlevel` are
/// written with a `++ ` prefix.
///
/// Visitor callbacks cannot fail, so the first write error is held until
/// [`DexApkDumper::finish`] and later output is dropped.
pub struct DexApkDumper<W: Write> {
    out: W,
    vlevel: u32,
    error: Option<io::Error>,
}

impl DexApkDumper<io::Stdout> {
    pub fn stdout(vlevel: u32) -> Self {
        DexApkDumper::new(io::stdout(), vlevel)
    }
}

impl<W: Write> DexApkDumper<W> {
    pub fn new(out: W, vlevel: u32) -> Self {
        DexApkDumper { out, vlevel, error: None }
    }

    /// Flush and hand back the writer, or the first error seen.
    pub fn finish(mut self) -> io::Result<W> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }
        self.out.flush()?;
        Ok(self.out)
    }

    fn line(&mut self, args: fmt::Arguments<'_>) {
        if self.error.is_some() {
            return;
        }
        if let Err(e) = self.out.write_fmt(args).and_then(|_| self.out.write_all(b"\n")) {
            self.error = Some(e);
        }
    }

    fn event(&mut self, event: DexEvent) {
        self.line(format_args!("{}", event));
    }
}

impl<W: Write> DexApkVisitor for DexApkDumper<W> {
    fn visit_apk(&mut self, apk: &str) {
        self.event(DexEvent::Apk { name: apk.to_string() });
    }

    fn visit_dex(&mut self, dex: &str, signature: &[u8; 20]) {
        self.event(DexEvent::Dex { name: dex.to_string(), sha1: signature_hex(signature) });
    }

    fn visit_class(&mut self, name: &str, method_count: u32) {
        self.event(DexEvent::Class { name: name.to_string(), methods: method_count });
    }

    fn visit_method(&mut self, name: &str, method_idx: u32, code_offset: u32) {
        self.event(DexEvent::Method { name: name.to_string(), id: method_idx, code_offset });
    }

    fn verbose(&mut self, level: u32, message: fmt::Arguments<'_>) {
        if self.vlevel >= level {
            self.line(format_args!("++ {}", message));
        }
    }
}

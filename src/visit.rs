//! Callbacks made while walking APK and DEX files.
//!
//! Visit order is top-down and follows the order of records in the file:
//!
//! ```text
//! visit_apk("mumble.apk")
//!   visit_dex("classes.dex", sha1)
//!     visit_class("foo", 1)
//!       visit_method("foomethod1", 0, 400)
//!     visit_class("bar", 2)
//!       visit_method("barmethod1", 1, 500)
//!       ...
//!   visit_dex("classes2.dex", sha1)
//!   ...
//! ```
//!
//! `visit_apk` is only made when the dex files come out of an archive.

use crate::dex::dex_file::signature_hex;
use serde::Serialize;
use std::fmt;

pub trait DexApkVisitor
{
    fn visit_apk(&mut self, apk: &str);

    fn visit_dex(&mut self, dex: &str, signature: &[u8; 20]);

    /// `method_count` is direct plus virtual methods, announced before any of them are visited.
    fn visit_class(&mut self, name: &str, method_count: u32);

    fn visit_method(&mut self, name: &str, method_idx: u32, code_offset: u32);

    /// Diagnostic trace output. Has no bearing on the walk itself.
    fn verbose(&mut self, level: u32, message: fmt::Arguments<'_>)
    {
        log::trace!("[v{}] {}", level, message);
    }
}

/// One visitor callback, as recorded by [`RecordingVisitor`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DexEvent
{
    Apk { name: String },
    Dex { name: String, sha1: String },
    Class { name: String, methods: u32 },
    Method { name: String, id: u32, code_offset: u32 },
}

impl fmt::Display for DexEvent
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self
        {
            DexEvent::Apk { name } => write!(f, "APK {}", name),
            DexEvent::Dex { name, sha1 } => write!(f, " DEX {} sha1 {}", name, sha1),
            DexEvent::Class { name, methods } => write!(f, "  class {} methods: {}", name, methods),
            DexEvent::Method { name, id, code_offset } =>
                write!(f, "   method id {} name '{}' code offset {}", id, name, code_offset),
        }
    }
}

/// Captures every callback in order, for inspection or serialization.
#[derive(Debug, Default)]
pub struct RecordingVisitor
{
    pub events: Vec<DexEvent>,
}

impl RecordingVisitor
{
    pub fn new() -> Self
    {
        RecordingVisitor::default()
    }

    /// The events rendered one per line in dump format.
    pub fn lines(&self) -> Vec<String>
    {
        self.events.iter().map(|e| e.to_string()).collect()
    }
}

impl DexApkVisitor for RecordingVisitor
{
    fn visit_apk(&mut self, apk: &str)
    {
        self.events.push(DexEvent::Apk { name: apk.to_string() });
    }

    fn visit_dex(&mut self, dex: &str, signature: &[u8; 20])
    {
        self.events.push(DexEvent::Dex { name: dex.to_string(), sha1: signature_hex(signature) });
    }

    fn visit_class(&mut self, name: &str, method_count: u32)
    {
        self.events.push(DexEvent::Class { name: name.to_string(), methods: method_count });
    }

    fn visit_method(&mut self, name: &str, method_idx: u32, code_offset: u32)
    {
        self.events.push(DexEvent::Method { name: name.to_string(), id: method_idx, code_offset });
    }
}

/* Walks the classes and methods of one DEX file, reporting them to a visitor */

use crate::dex::dex_file::{
    skip_encoded_field, ClassDataHeader, ClassDefItem, EncodedMethod, Header, MethodItem, ENDIAN_CONSTANT,
    REVERSE_ENDIAN_CONSTANT,
};
use crate::dex::error::DexError;
use crate::dex::strings::{read_string_pool, DexString};
use crate::dex::{read_table, FixedRecord};
use crate::types::decode_descriptor;
use crate::visit::DexApkVisitor;
use log::debug;
use std::borrow::Cow;
use std::fs::{self, File};
use std::io::Read;
use std::path::Path;

/// Examine the DEX file at `path`, which is also the name reported to the visitor.
pub fn read_dex_file(path: impl AsRef<Path>, visitor: &mut dyn DexApkVisitor) -> Result<(), DexError>
{
    let path = path.as_ref();
    let name = path.display().to_string();
    let size = fs::metadata(path).map_err(|e| DexError::from(e).in_dex(&name, None))?.len();
    let file = File::open(path).map_err(|e| DexError::from(e).in_dex(&name, None))?;
    read_dex(None, &name, file, size, visitor)
}

/// Examine the DEX data produced by `reader`, which must yield exactly
/// `expected_size` bytes.
///
/// `apk` names the enclosing archive, if any, for error reporting. Callbacks
/// made before a failure are not undone.
pub fn read_dex<R: Read>(
    apk: Option<&str>,
    dex_name: &str,
    reader: R,
    expected_size: u64,
    visitor: &mut dyn DexApkVisitor,
) -> Result<(), DexError>
{
    // The whole file is needed up front; tables are reached by absolute offset.
    let mut bytes = Vec::with_capacity(expected_size.min(64 << 20) as usize);
    // One byte past the declared size is enough to tell that the source is too long.
    reader
        .take(expected_size.saturating_add(1))
        .read_to_end(&mut bytes)
        .map_err(|e| DexError::from(e).in_dex(dex_name, apk))?;
    if bytes.len() as u64 != expected_size
    {
        return Err(err!(SizeMismatch, "expected {} bytes read {}", expected_size, bytes.len()).in_dex(dex_name, apk));
    }
    read_dex_bytes(apk, dex_name, &bytes, visitor)
}

/// Examine DEX data that is already in memory.
pub fn read_dex_bytes(
    apk: Option<&str>,
    dex_name: &str,
    bytes: &[u8],
    visitor: &mut dyn DexApkVisitor,
) -> Result<(), DexError>
{
    walk(dex_name, bytes, visitor).map_err(|e| e.in_dex(dex_name, apk))
}

fn walk(dex_name: &str, bytes: &[u8], visitor: &mut dyn DexApkVisitor) -> Result<(), DexError>
{
    let mut session = DexSession::open(bytes, visitor)?;
    session.visitor.visit_dex(dex_name, &session.header.signature);
    session.read_index_tables()?;
    session.read_strings()?;
    debug!(
        "dex {}: {} strings, {} types, {} methods, {} classes",
        dex_name,
        session.strings.len(),
        session.type_ids.len(),
        session.method_ids.len(),
        session.header.class_defs_size
    );
    session.walk_classes()
}

/// Decode state for a single DEX buffer. Each table is filled once, in
/// pipeline order, and only read afterwards.
struct DexSession<'a>
{
    bytes: &'a [u8],
    visitor: &'a mut dyn DexApkVisitor,
    header: Header,
    method_ids: Vec<MethodItem>,
    type_ids: Vec<u32>,
    strings: Vec<DexString>,
}

impl<'a> DexSession<'a>
{
    fn open(bytes: &'a [u8], visitor: &'a mut dyn DexApkVisitor) -> Result<DexSession<'a>, DexError>
    {
        let header = Header::read(bytes)?;
        if header.endian_tag == REVERSE_ENDIAN_CONSTANT
        {
            visitor.verbose(1, format_args!("byte swapped dex, reading as little endian anyway"));
        }
        else if header.endian_tag != ENDIAN_CONSTANT
        {
            visitor.verbose(1, format_args!("unexpected endian tag 0x{:08x}", header.endian_tag));
        }
        Ok(DexSession {
            bytes,
            visitor,
            header,
            method_ids: vec![],
            type_ids: vec![],
            strings: vec![],
        })
    }

    fn read_index_tables(&mut self) -> Result<(), DexError>
    {
        self.method_ids = read_table(self.bytes, self.header.method_ids_off, self.header.method_ids_size, "method id")?;
        self.visitor.verbose(1, format_args!("read {} methodids", self.method_ids.len()));

        self.type_ids = read_table(self.bytes, self.header.type_ids_off, self.header.type_ids_size, "type id")?;
        self.visitor.verbose(1, format_args!("read {} typeids", self.type_ids.len()));
        Ok(())
    }

    fn read_strings(&mut self) -> Result<(), DexError>
    {
        self.strings = read_string_pool(self.bytes, self.header.string_ids_off, self.header.string_ids_size)?;
        let raw = self.strings.iter().filter(|s| !s.is_decoded()).count();
        self.visitor.verbose(1, format_args!("read {} strings, {} not convertible", self.strings.len(), raw));
        Ok(())
    }

    fn walk_classes(&mut self) -> Result<(), DexError>
    {
        let mut ix = self.header.class_defs_off as usize;
        for cl in 0..self.header.class_defs_size
        {
            let class_def = ClassDefItem::read(self.bytes, &mut ix)
                .map_err(|e| DexError::with_context(e, format!("class def {}", cl)))?;
            self.visitor.verbose(1, format_args!("class {} type idx is {}", cl, class_def.class_idx));
            self.examine_class(&class_def)
                .map_err(|e| DexError::with_context(e, format!("class def {}", cl)))?;
        }
        Ok(())
    }

    fn class_name(&self, class_def: &ClassDefItem) -> Result<String, DexError>
    {
        let string_idx = *self.type_ids.get(class_def.class_idx as usize).ok_or_else(|| {
            err!(IndexOutOfRange, "type index {} out of range ({} type ids)", class_def.class_idx, self.type_ids.len())
        })?;
        let descriptor = lookup_string(&self.strings, string_idx)?;
        Ok(decode_descriptor(&descriptor))
    }

    fn examine_class(&mut self, class_def: &ClassDefItem) -> Result<(), DexError>
    {
        let class_name = self.class_name(class_def)?;

        // No class data, e.g. a marker interface
        if class_def.class_data_off == 0
        {
            self.visitor.visit_class(&class_name, 0);
            return Ok(());
        }

        let bytes = self.bytes;
        let mut ix = class_def.class_data_off as usize;
        let counts = ClassDataHeader::read(bytes, &mut ix)
            .map_err(|e| DexError::with_context(e, format!("class {}", class_name)))?;
        let method_count = counts.methods_size()
            .map_err(|e| DexError::with_context(e, format!("class {}", class_name)))?;

        self.visitor.visit_class(&class_name, method_count);
        self.visitor.verbose(1, format_args!("flags {:?}", class_def.access_flags));
        self.visitor.verbose(1, format_args!("num static fields is {}", counts.static_fields_size));
        self.visitor.verbose(1, format_args!("num instance fields is {}", counts.instance_fields_size));
        self.visitor.verbose(1, format_args!("num direct methods is {}", counts.direct_methods_size));
        self.visitor.verbose(1, format_args!("num virtual methods is {}", counts.virtual_methods_size));

        // Fields are not reported, but being uleb128 they have to be read to get past them
        let field_count = counts.fields_size()
            .map_err(|e| DexError::with_context(e, format!("class {}", class_name)))?;
        for _ in 0..field_count
        {
            skip_encoded_field(bytes, &mut ix)
                .map_err(|e| DexError::with_context(e, format!("class {}", class_name)))?;
        }

        // Method ids are deltas from the previous entry; each of the direct and
        // virtual lists starts over from its first raw value.
        let mut method_idx: u32 = 0;
        for i in 0..method_count
        {
            let method = EncodedMethod::read(bytes, &mut ix)
                .map_err(|e| DexError::with_context(e, format!("class {}", class_name)))?;
            method_idx = if i == 0 || i == counts.direct_methods_size
            {
                method.method_idx_diff
            }
            else
            {
                method_idx.checked_add(method.method_idx_diff).ok_or_else(|| {
                    err!(IndexOutOfRange, "method index {} + {} overflows for class {}", method_idx, method.method_idx_diff, class_name)
                })?
            };
            self.visitor.verbose(1, format_args!("method {} idx {} off {}", i, method_idx, method.code_off));

            self.examine_method(method_idx, method.code_off)
                .map_err(|e| DexError::with_context(e, format!("class {}", class_name)))?;
        }
        Ok(())
    }

    fn examine_method(&mut self, method_idx: u32, code_off: u32) -> Result<(), DexError>
    {
        let method = self.method_ids.get(method_idx as usize).ok_or_else(|| {
            err!(IndexOutOfRange, "method index {} out of range ({} method ids)", method_idx, self.method_ids.len())
        })?;
        let name = lookup_string(&self.strings, method.name_idx)?;
        self.visitor.visit_method(&name, method_idx, code_off);
        Ok(())
    }
}

fn lookup_string(strings: &[DexString], idx: u32) -> Result<Cow<'_, str>, DexError>
{
    strings
        .get(idx as usize)
        .map(|s| s.as_str())
        .ok_or_else(|| err!(IndexOutOfRange, "string index {} out of range ({} strings)", idx, strings.len()))
}

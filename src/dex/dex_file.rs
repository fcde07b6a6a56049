/* Dex file format structures */

use crate::dex::error::DexError;
use crate::dex::{read_array, read_u2, read_u4, read_uleb128, FixedRecord};
use bitflags::bitflags;

/* Constants */
pub const DEX_FILE_MAGIC: [u8; 8] = [ 0x64, 0x65, 0x78, 0x0a, 0x30, 0x33, 0x35, 0x00 ];
pub const ENDIAN_CONSTANT: u32 = 0x12345678;
pub const REVERSE_ENDIAN_CONSTANT: u32 = 0x78563412;
pub const HEADER_SIZE: usize = 0x70;
pub const CLASS_DEF_SIZE: usize = 0x20;
pub const NO_INDEX: u32 = 0xffffffff;

bitflags! {
    /// Access flags as stored on class definitions and encoded methods.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AccessFlags: u32 {
        const PUBLIC = 0x1;
        const PRIVATE = 0x2;
        const PROTECTED = 0x4;
        const STATIC = 0x8;
        const FINAL = 0x10;
        const SYNCHRONIZED = 0x20;
        const BRIDGE = 0x40;
        const VARARGS = 0x80;
        const NATIVE = 0x100;
        const INTERFACE = 0x200;
        const ABSTRACT = 0x400;
        const STRICT = 0x800;
        const SYNTHETIC = 0x1000;
        const ANNOTATION = 0x2000;
        const ENUM = 0x4000;
        const CONSTRUCTOR = 0x10000;
        const DECLARED_SYNCHRONIZED = 0x20000;
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct Header {
    pub magic: [u8; 8],
    pub checksum: u32,
    pub signature: [u8; 20],
    pub file_size: u32,
    pub header_size: u32,
    pub endian_tag: u32,
    pub link_size: u32,
    pub link_off: u32,
    pub map_off: u32,
    pub string_ids_size: u32,
    pub string_ids_off: u32,
    pub type_ids_size: u32,
    pub type_ids_off: u32,
    pub proto_ids_size: u32,
    pub proto_ids_off: u32,
    pub field_ids_size: u32,
    pub field_ids_off: u32,
    pub method_ids_size: u32,
    pub method_ids_off: u32,
    pub class_defs_size: u32,
    pub class_defs_off: u32,
    pub data_size: u32,
    pub data_off: u32,
}

impl Header
{
    /// Decode the header at the start of `bytes`. Nothing is returned unless
    /// the magic matches and every field could be read.
    pub fn read(bytes: &[u8]) -> Result<Header, DexError>
    {
        if bytes.get(..DEX_FILE_MAGIC.len()) != Some(&DEX_FILE_MAGIC[..]) {
            fail!(BadMagic, "not a DEX file");
        }
        if bytes.len() < HEADER_SIZE {
            fail!(TruncatedTable, "Not enough bytes for header ({} < {})", bytes.len(), HEADER_SIZE);
        }

        let ix = &mut 0;
        Ok(Header {
            magic: read_array(bytes, ix)?,
            checksum: read_u4(bytes, ix)?,
            signature: read_array(bytes, ix)?,
            file_size: read_u4(bytes, ix)?,
            header_size: read_u4(bytes, ix)?,
            endian_tag: read_u4(bytes, ix)?,
            link_size: read_u4(bytes, ix)?,
            link_off: read_u4(bytes, ix)?,
            map_off: read_u4(bytes, ix)?,
            string_ids_size: read_u4(bytes, ix)?,
            string_ids_off: read_u4(bytes, ix)?,
            type_ids_size: read_u4(bytes, ix)?,
            type_ids_off: read_u4(bytes, ix)?,
            proto_ids_size: read_u4(bytes, ix)?,
            proto_ids_off: read_u4(bytes, ix)?,
            field_ids_size: read_u4(bytes, ix)?,
            field_ids_off: read_u4(bytes, ix)?,
            method_ids_size: read_u4(bytes, ix)?,
            method_ids_off: read_u4(bytes, ix)?,
            class_defs_size: read_u4(bytes, ix)?,
            class_defs_off: read_u4(bytes, ix)?,
            data_size: read_u4(bytes, ix)?,
            data_off: read_u4(bytes, ix)?,
        })
    }

    /// Hex rendering of the SHA-1 signature.
    pub fn signature_hex(&self) -> String
    {
        signature_hex(&self.signature)
    }
}

pub fn signature_hex(signature: &[u8; 20]) -> String
{
    signature.iter().map(|b| format!("{:02x}", b)).collect()
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct MethodItem {
    // The method_id_item struct
    pub class_idx: u16,
    pub proto_idx: u16,
    pub name_idx: u32
}

impl FixedRecord for MethodItem
{
    const SIZE: usize = 8;

    fn read(bytes: &[u8], ix: &mut usize) -> Result<MethodItem, DexError>
    {
        Ok(MethodItem {
            class_idx: read_u2(bytes, ix)?,
            proto_idx: read_u2(bytes, ix)?,
            name_idx: read_u4(bytes, ix)?,
        })
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct ClassDefItem {
    // The class_def_item struct. Offsets are kept as-is; only class data is followed.
    pub class_idx: u32,
    pub access_flags: AccessFlags,
    pub superclass_idx: u32,
    pub interfaces_off: u32,
    pub source_file_idx: u32,
    pub annotations_off: u32,
    pub class_data_off: u32,
    pub static_values_off: u32,
}

impl FixedRecord for ClassDefItem
{
    const SIZE: usize = CLASS_DEF_SIZE;

    fn read(bytes: &[u8], ix: &mut usize) -> Result<ClassDefItem, DexError>
    {
        Ok(ClassDefItem {
            class_idx: read_u4(bytes, ix)?,
            access_flags: AccessFlags::from_bits_retain(read_u4(bytes, ix)?),
            superclass_idx: read_u4(bytes, ix)?,
            interfaces_off: read_u4(bytes, ix)?,
            source_file_idx: read_u4(bytes, ix)?,
            annotations_off: read_u4(bytes, ix)?,
            class_data_off: read_u4(bytes, ix)?,
            static_values_off: read_u4(bytes, ix)?,
        })
    }
}

/// The four counts that open a `class_data_item`.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct ClassDataHeader {
    pub static_fields_size: u32,
    pub instance_fields_size: u32,
    pub direct_methods_size: u32,
    pub virtual_methods_size: u32,
}

impl ClassDataHeader
{
    pub fn read(bytes: &[u8], ix: &mut usize) -> Result<ClassDataHeader, DexError>
    {
        Ok(ClassDataHeader {
            static_fields_size: read_uleb128(bytes, ix)?,
            instance_fields_size: read_uleb128(bytes, ix)?,
            direct_methods_size: read_uleb128(bytes, ix)?,
            virtual_methods_size: read_uleb128(bytes, ix)?,
        })
    }

    pub fn fields_size(&self) -> Result<u32, DexError>
    {
        self.static_fields_size.checked_add(self.instance_fields_size)
            .ok_or_else(|| err!(IndexOutOfRange, "field count overflow ({} static + {} instance)",
                self.static_fields_size, self.instance_fields_size))
    }

    pub fn methods_size(&self) -> Result<u32, DexError>
    {
        self.direct_methods_size.checked_add(self.virtual_methods_size)
            .ok_or_else(|| err!(IndexOutOfRange, "method count overflow ({} direct + {} virtual)",
                self.direct_methods_size, self.virtual_methods_size))
    }
}

/// Skip one `encoded_field`; neither value is interpreted.
pub fn skip_encoded_field(bytes: &[u8], ix: &mut usize) -> Result<(), DexError>
{
    read_uleb128(bytes, ix)?; // field_idx_diff
    read_uleb128(bytes, ix)?; // access_flags
    Ok(())
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct EncodedMethod
{
    pub method_idx_diff: u32,
    pub access_flags: AccessFlags,
    pub code_off: u32,
}

impl EncodedMethod
{
    pub fn read(bytes: &[u8], ix: &mut usize) -> Result<EncodedMethod, DexError>
    {
        Ok(EncodedMethod {
            method_idx_diff: read_uleb128(bytes, ix)?,
            access_flags: AccessFlags::from_bits_retain(read_uleb128(bytes, ix)?),
            code_off: read_uleb128(bytes, ix)?,
        })
    }
}

/* Builds small DEX images in memory for the scenario tests */

use crate::dex::dex_file::{CLASS_DEF_SIZE, DEX_FILE_MAGIC, ENDIAN_CONSTANT, HEADER_SIZE, NO_INDEX};
use crate::dex::leb::encode_uleb128;

pub(crate) const FIBONACCI_SHA1: &str = "fd56aced78355c305a9503d6f3dfe1f7ff6ac440";

// Header field offsets used when a test corrupts an image
pub(crate) const METHOD_IDS_SIZE_OFF: usize = 0x58;
pub(crate) const CLASS_DEFS_OFF_OFF: usize = 0x64;

#[derive(Default)]
pub(crate) struct ClassData {
    pub static_fields: Vec<u32>,
    pub instance_fields: Vec<u32>,
    /// (absolute method index, code offset)
    pub direct: Vec<(u32, u32)>,
    pub virtuals: Vec<(u32, u32)>,
}

impl ClassData {
    fn encode(&self, out: &mut Vec<u8>) {
        out.extend(encode_uleb128(self.static_fields.len() as u32));
        out.extend(encode_uleb128(self.instance_fields.len() as u32));
        out.extend(encode_uleb128(self.direct.len() as u32));
        out.extend(encode_uleb128(self.virtuals.len() as u32));

        for fields in [&self.static_fields, &self.instance_fields] {
            let mut last = 0;
            for &f in fields {
                out.extend(encode_uleb128(f - last));
                out.extend(encode_uleb128(0x1)); // access_flags
                last = f;
            }
        }

        for methods in [&self.direct, &self.virtuals] {
            let mut last = 0;
            for &(idx, code_off) in methods {
                out.extend(encode_uleb128(idx - last));
                out.extend(encode_uleb128(0x1)); // access_flags
                out.extend(encode_uleb128(code_off));
                last = idx;
            }
        }
    }
}

enum ClassBody {
    None,
    Data(ClassData),
    /// Already encoded class data, for layouts `ClassData` cannot express.
    Raw(Vec<u8>),
}

struct Class {
    type_idx: u32,
    body: ClassBody,
}

#[derive(Default)]
pub(crate) struct DexFixture {
    pub signature: [u8; 20],
    strings: Vec<String>,
    type_ids: Vec<u32>,
    method_ids: Vec<(u16, u16, u32)>,
    classes: Vec<Class>,
}

impl DexFixture {
    pub(crate) fn new() -> Self {
        DexFixture::default()
    }

    pub(crate) fn string(&mut self, s: &str) -> u32 {
        self.strings.push(s.to_string());
        (self.strings.len() - 1) as u32
    }

    pub(crate) fn type_id(&mut self, descriptor: &str) -> u32 {
        let s = self.string(descriptor);
        self.type_ids.push(s);
        (self.type_ids.len() - 1) as u32
    }

    /// Push a raw type id, which may point anywhere.
    pub(crate) fn raw_type_id(&mut self, string_idx: u32) -> u32 {
        self.type_ids.push(string_idx);
        (self.type_ids.len() - 1) as u32
    }

    pub(crate) fn method(&mut self, class_type: u32, name: &str) -> u32 {
        let n = self.string(name);
        self.method_ids.push((class_type as u16, 0, n));
        (self.method_ids.len() - 1) as u32
    }

    /// Push a method id whose name may point anywhere.
    pub(crate) fn raw_method(&mut self, class_type: u32, name_idx: u32) -> u32 {
        self.method_ids.push((class_type as u16, 0, name_idx));
        (self.method_ids.len() - 1) as u32
    }

    pub(crate) fn class(&mut self, type_idx: u32, data: Option<ClassData>) {
        let body = match data {
            Some(cd) => ClassBody::Data(cd),
            None => ClassBody::None,
        };
        self.classes.push(Class { type_idx, body });
    }

    pub(crate) fn class_raw(&mut self, type_idx: u32, class_data: Vec<u8>) {
        self.classes.push(Class { type_idx, body: ClassBody::Raw(class_data) });
    }

    pub(crate) fn build(&self) -> Vec<u8> {
        let string_ids_off = HEADER_SIZE;
        let type_ids_off = string_ids_off + 4 * self.strings.len();
        let method_ids_off = type_ids_off + 4 * self.type_ids.len();
        let class_defs_off = method_ids_off + 8 * self.method_ids.len();
        let data_off = class_defs_off + CLASS_DEF_SIZE * self.classes.len();

        let mut data = vec![];
        let mut string_offsets = vec![];
        for s in &self.strings {
            string_offsets.push((data_off + data.len()) as u32);
            data.extend(encode_uleb128(s.encode_utf16().count() as u32));
            data.extend_from_slice(&cesu8::to_java_cesu8(s));
            data.push(0);
        }

        let mut class_data_offsets = vec![];
        for c in &self.classes {
            match &c.body {
                ClassBody::None => class_data_offsets.push(0),
                ClassBody::Data(cd) => {
                    class_data_offsets.push((data_off + data.len()) as u32);
                    cd.encode(&mut data);
                }
                ClassBody::Raw(raw) => {
                    class_data_offsets.push((data_off + data.len()) as u32);
                    data.extend_from_slice(raw);
                }
            }
        }

        let file_size = data_off + data.len();
        let mut out = Vec::with_capacity(file_size);
        out.extend_from_slice(&DEX_FILE_MAGIC);
        put_u4(&mut out, 0); // checksum
        out.extend_from_slice(&self.signature);
        for w in [
            file_size,
            HEADER_SIZE,
            ENDIAN_CONSTANT as usize,
            0, // link_size
            0, // link_off
            0, // map_off
            self.strings.len(),
            string_ids_off,
            self.type_ids.len(),
            type_ids_off,
            0, // proto_ids
            0,
            0, // field_ids
            0,
            self.method_ids.len(),
            method_ids_off,
            self.classes.len(),
            class_defs_off,
            data.len(),
            data_off,
        ] {
            put_u4(&mut out, w as u32);
        }
        assert_eq!(out.len(), HEADER_SIZE);

        for off in string_offsets {
            put_u4(&mut out, off);
        }
        for t in &self.type_ids {
            put_u4(&mut out, *t);
        }
        for &(class_idx, proto_idx, name_idx) in &self.method_ids {
            out.extend_from_slice(&class_idx.to_le_bytes());
            out.extend_from_slice(&proto_idx.to_le_bytes());
            put_u4(&mut out, name_idx);
        }
        for (c, class_data_off) in self.classes.iter().zip(class_data_offsets) {
            for w in [c.type_idx, 0x1, NO_INDEX, 0, NO_INDEX, 0, class_data_off, 0] {
                put_u4(&mut out, w);
            }
        }
        out.extend(data);
        assert_eq!(out.len(), file_size);
        out
    }
}

pub(crate) fn put_u4(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_le_bytes());
}

pub(crate) fn patch_u4(bytes: &mut [u8], off: usize, v: u32) {
    bytes[off..off + 4].copy_from_slice(&v.to_le_bytes());
}

pub(crate) fn get_u4(bytes: &[u8], off: usize) -> u32 {
    u32::from_le_bytes([bytes[off], bytes[off + 1], bytes[off + 2], bytes[off + 3]])
}

pub(crate) fn signature_from_hex(hex: &str) -> [u8; 20] {
    let mut sig = [0u8; 20];
    for (i, b) in sig.iter_mut().enumerate() {
        *b = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).unwrap();
    }
    sig
}

/// One class `fibonacci` with six direct methods at known code offsets.
pub(crate) fn fibonacci_dex() -> Vec<u8> {
    let mut dex = DexFixture::new();
    dex.signature = signature_from_hex(FIBONACCI_SHA1);
    let class_type = dex.type_id("Lfibonacci;");
    let mut direct = vec![];
    for (name, code_off) in [
        ("<init>", 584),
        ("ifibonacci", 608),
        ("main", 656),
        ("rcnm1", 1008),
        ("rcnm2", 1040),
        ("rfibonacci", 1072),
    ] {
        direct.push((dex.method(class_type, name), code_off));
    }
    dex.class(class_type, Some(ClassData { direct, ..Default::default() }));
    dex.build()
}

/// Encode a sequence of uleb128 values, e.g. a hand made class data block.
pub(crate) fn uleb_seq(values: &[u32]) -> Vec<u8> {
    values.iter().flat_map(|&v| encode_uleb128(v)).collect()
}

/// Squeeze runs of whitespace so expected dumps can be written indented.
pub(crate) fn squeeze_white(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

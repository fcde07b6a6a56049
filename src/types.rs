/* Decoding of DEX type descriptors e.g. [Ljava/lang/Object; into java.lang.Object[] */

use std::fmt;

/// Represents a Java type: array, object or primitive type
///
/// # Examples
///
/// ```
///  use dexread::types::TypeSignature;
///
///  let t = TypeSignature::from_descriptor("[[B").unwrap();
///  assert_eq!(t.to_java(), "byte[][]");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeSignature {
    Array(Box<TypeSignature>),
    /// Class name in dotted java form, e.g. `java.lang.Object`
    Object(String),
    Int,
    Bool,
    Byte,
    Char,
    Short,
    Long,
    Float,
    Double,
    Void,
}

impl TypeSignature {
    /// Parse a type descriptor. Only the character after the `[` run decides the
    /// base type; `None` if it is not a known one.
    pub fn from_descriptor(d: &str) -> Option<TypeSignature> {
        let dims = d.bytes().take_while(|&c| c == b'[').count();
        let rest = &d[dims..];

        let mut base = match rest.chars().next()? {
            'L' => {
                let body = &rest[1..];
                let body = body.strip_suffix(';').unwrap_or(body);
                TypeSignature::Object(body.replace('/', "."))
            }
            'B' => TypeSignature::Byte,
            'C' => TypeSignature::Char,
            'D' => TypeSignature::Double,
            'F' => TypeSignature::Float,
            'I' => TypeSignature::Int,
            'J' => TypeSignature::Long,
            'S' => TypeSignature::Short,
            'Z' => TypeSignature::Bool,
            'V' => TypeSignature::Void,
            _ => return None,
        };

        for _ in 0..dims {
            base = TypeSignature::Array(Box::new(base));
        }
        Some(base)
    }

    /// The type as it would be written in java source.
    pub fn to_java(&self) -> String {
        match self {
            TypeSignature::Array(inner) => format!("{}[]", inner.to_java()),
            TypeSignature::Object(name) => name.clone(),
            TypeSignature::Int => "int".to_string(),
            TypeSignature::Bool => "boolean".to_string(),
            TypeSignature::Byte => "byte".to_string(),
            TypeSignature::Char => "char".to_string(),
            TypeSignature::Short => "short".to_string(),
            TypeSignature::Long => "long".to_string(),
            TypeSignature::Float => "float".to_string(),
            TypeSignature::Double => "double".to_string(),
            TypeSignature::Void => "void".to_string(),
        }
    }
}

impl fmt::Display for TypeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_java())
    }
}

/// Human readable name for a type descriptor.
///
/// Descriptors that cannot be decoded are returned unchanged rather than
/// treated as errors.
///
/// ```
///  use dexread::types::decode_descriptor;
///
///  assert_eq!(decode_descriptor("[Ljava/lang/Object;"), "java.lang.Object[]");
///  assert_eq!(decode_descriptor("<illegal>"), "<illegal>");
/// ```
pub fn decode_descriptor(d: &str) -> String {
    match TypeSignature::from_descriptor(d) {
        Some(t) => t.to_java(),
        None => d.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_descriptors() {
        let cases = [
            ("Lfrob/blar/blix;", "frob.blar.blix"),
            ("[Ljava/lang/Object;", "java.lang.Object[]"),
            ("[[B", "byte[][]"),
            ("[C", "char[]"),
            ("D", "double"),
            ("Z", "boolean"),
            ("V", "void"),
            ("[[[J", "long[][][]"),
            ("Lfibonacci;", "fibonacci"),
            ("<illegal>", "<illegal>"),
        ];
        for (raw, cooked) in cases {
            assert_eq!(decode_descriptor(raw), cooked, "decoding {}", raw);
        }
    }

    #[test]
    fn unrecognised_descriptors_pass_through() {
        assert_eq!(decode_descriptor(""), "");
        assert_eq!(decode_descriptor("[["), "[[");
        assert_eq!(decode_descriptor("[Q"), "[Q");
    }

    #[test]
    fn parsed_form() {
        let t = TypeSignature::from_descriptor("[Ljava/lang/String;").unwrap();
        assert_eq!(t, TypeSignature::Array(Box::new(TypeSignature::Object("java.lang.String".to_string()))));
        assert_eq!(t.to_string(), "java.lang.String[]");
        assert_eq!(TypeSignature::from_descriptor("X"), None);
    }
}

use std::fmt;
use std::io;

macro_rules! err {
    ($kind:ident, $msg:literal) => {
        $crate::dex::error::DexError::new($crate::dex::error::DexErrorKind::$kind, $msg)
    };
    ($kind:ident, $fmtstr:literal, $($args:tt)*) => {
        $crate::dex::error::DexError::new($crate::dex::error::DexErrorKind::$kind, &format!($fmtstr, $($args)*))
    };
}

macro_rules! fail {
    ($kind:ident, $msg:literal) => {
        return Err(err!($kind, $msg))
    };
    ($kind:ident, $fmtstr:literal, $($args:tt)*) => {
        return Err(err!($kind, $fmtstr, $($args)*))
    };
}

/// Broad classification of a decode failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DexErrorKind
{
    /// The data does not start with the DEX magic.
    BadMagic,
    /// The number of bytes read differs from the declared size.
    SizeMismatch,
    /// The buffer ended inside a fixed table, the header or a class data block.
    TruncatedTable,
    /// The buffer ended before a string's declared length was satisfied.
    TruncatedString,
    /// A method, type or string index falls outside its table.
    IndexOutOfRange,
    /// A string payload is not well formed modified UTF-8.
    InvalidString,
    /// Opening or reading the underlying file or archive failed.
    Io,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DexError
{
    kind: DexErrorKind,
    msg: String,
    contexts: Vec<String>,
}

impl DexError
{
    pub(crate) fn new(kind: DexErrorKind, msg: &str) -> Self
    {
        DexError {
            kind,
            msg: msg.to_string(),
            contexts: Vec::new(),
        }
    }

    pub(crate) fn with_context(base: DexError, context: String) -> Self
    {
        let mut contexts = base.contexts;
        contexts.push(context);
        DexError { kind: base.kind, msg: base.msg, contexts }
    }

    /// Attach the dex entry name and, when it came out of an archive, the apk name.
    pub(crate) fn in_dex(self, dex_name: &str, apk: Option<&str>) -> Self
    {
        let e = DexError::with_context(self, format!("dex {}", dex_name));
        match apk {
            Some(apk) => DexError::with_context(e, format!("apk {}", apk)),
            None => e,
        }
    }

    pub fn kind(&self) -> DexErrorKind
    {
        self.kind
    }

    pub fn message(&self) -> &str
    {
        &self.msg
    }

    /// Innermost first, e.g. `["dex classes.dex", "apk app.apk"]`.
    pub fn contexts(&self) -> &[String]
    {
        &self.contexts
    }
}

impl fmt::Display for DexError
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{}", self.msg)?;
        let mut connector = " for ";
        for context in &self.contexts
        {
            write!(f, "{}{}", connector, context)?;
            connector = " of ";
        }
        Ok(())
    }
}

impl std::error::Error for DexError {}

impl From<io::Error> for DexError
{
    fn from(e: io::Error) -> Self
    {
        DexError::new(DexErrorKind::Io, &format!("io error: {}", e))
    }
}

impl From<zip::result::ZipError> for DexError
{
    fn from(e: zip::result::ZipError) -> Self
    {
        DexError::new(DexErrorKind::Io, &format!("zip error: {}", e))
    }
}

use std::fmt;

#[derive(Debug)]
pub enum Error {
    UnknownNamespace(String),
    InvalidBreak(String),
    InvalidTable(String),
    /// A character XML 1.0 cannot carry, such as most C0 controls.
    InvalidChar(char),
    SequenceOverflow,
    EmptyContent,
    InvalidDocx(String),
    Part { part: String, source: Box<Error> },
    Zip(zip::result::ZipError),
    Xml(roxmltree::Error),
    Image(image::ImageError),
    Regex(regex::Error),
    Io(std::io::Error),
}

impl Error {
    /// Tag an error with the package part that was being produced.
    pub fn in_part(self, part: impl Into<String>) -> Self {
        Error::Part { part: part.into(), source: Box::new(self) }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnknownNamespace(prefix) => write!(f, "unknown namespace prefix: {prefix}"),
            Error::InvalidBreak(kind) => {
                write!(f, "break kind \"{kind}\" not implemented, valid kinds: page, section")
            }
            Error::InvalidTable(reason) => write!(f, "invalid table: {reason}"),
            Error::InvalidChar(c) => write!(f, "character {:?} is not allowed in XML", c),
            Error::SequenceOverflow => write!(f, "figure sequence counter exhausted"),
            Error::EmptyContent => write!(f, "content list is empty"),
            Error::InvalidDocx(reason) => write!(f, "not a valid DOCX file: {reason}"),
            Error::Part { part, source } => write!(f, "failed to write {part}: {source}"),
            Error::Zip(e) => write!(f, "ZIP error: {e}"),
            Error::Xml(e) => write!(f, "XML error: {e}"),
            Error::Image(e) => write!(f, "image error: {e}"),
            Error::Regex(e) => write!(f, "invalid pattern: {e}"),
            Error::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Part { source, .. } => Some(source.as_ref()),
            Error::Zip(e) => Some(e),
            Error::Xml(e) => Some(e),
            Error::Image(e) => Some(e),
            Error::Regex(e) => Some(e),
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(e: zip::result::ZipError) -> Self {
        Error::Zip(e)
    }
}

impl From<roxmltree::Error> for Error {
    fn from(e: roxmltree::Error) -> Self {
        Error::Xml(e)
    }
}

impl From<image::ImageError> for Error {
    fn from(e: image::ImageError) -> Self {
        Error::Image(e)
    }
}

impl From<regex::Error> for Error {
    fn from(e: regex::Error) -> Self {
        Error::Regex(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<walkdir::Error> for Error {
    fn from(e: walkdir::Error) -> Self {
        Error::Io(e.into())
    }
}

impl From<tempfile::PersistError> for Error {
    fn from(e: tempfile::PersistError) -> Self {
        Error::Io(e.error)
    }
}

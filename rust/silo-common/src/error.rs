use thiserror::Error;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.0.as_ref()
    }

    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    pub fn invalid_arg(name: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidArgument {
                name: name.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn invalid_operation(name: impl Into<String>) -> Error {
        Error(ErrorKind::InvalidOperation { name: name.into() }.into())
    }

    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::Config {
                key: key.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Error {
        Error(
            ErrorKind::Io {
                context: context.into(),
                source,
            }
            .into(),
        )
    }

    pub fn checksum_mismatch(element: impl Into<String>) -> Error {
        Error(
            ErrorKind::ChecksumMismatch {
                element: element.into(),
            }
            .into(),
        )
    }

    pub fn index_build(context: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::IndexBuild {
                context: context.into(),
                message: message.into(),
            }
            .into(),
        )
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("invalid argument {name}: {message}")]
    InvalidArgument { name: String, message: String },

    #[error("invalid operation {name}")]
    InvalidOperation { name: String },

    #[error("configuration key '{key}': {message}")]
    Config { key: String, message: String },

    #[error("I/O error ({context})")]
    Io {
        context: String,
        source: std::io::Error,
    },

    #[error("checksum mismatch for '{element}'")]
    ChecksumMismatch { element: String },

    #[error("index build failed ({context}): {message}")]
    IndexBuild { context: String, message: String },
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Error {
        Error(Box::new(kind))
    }
}

#[cfg(test)]
mod tests {
    use super::Error;

    #[test]
    fn test_error_display() {
        let e = Error::invalid_arg("path", "must not be empty");
        assert_eq!(e.to_string(), "invalid argument path: must not be empty");

        let e = Error::checksum_mismatch("data/index/segment-0000000001.seg");
        assert!(e.to_string().contains("checksum mismatch"));
    }
}

/// Result type alias for model building
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while the resource model is being built.
///
/// Both variants are configuration errors in the scanned declarations.
/// Callers may skip the affected resource and continue with the rest of the
/// contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A root resource type or a sub-resource locator lacks the required
    /// path annotation.
    MissingPathAnnotation { declaration: String },
    /// A resource method declares no HTTP verb annotation at all.
    NoHttpMethod { declaration: String },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::MissingPathAnnotation { declaration } => {
                write!(f, "{}: a path annotation is required", declaration)
            }
            Error::NoHttpMethod { declaration } => {
                write!(
                    f,
                    "{}: a resource method must declare an HTTP verb annotation",
                    declaration
                )
            }
        }
    }
}

impl std::error::Error for Error {}

use {crate::level::LogLevel, std::error::Error};

/// Type name used for errors in a `source()` chain, whose concrete type is
/// erased behind `dyn Error`.
pub const ERASED_ERROR_TYPE: &str = "Error";

/// One link in an error chain attached to a [`LogEvent`].
///
/// The outermost error is the root value; `parent` points at the error that
/// caused it (the next `source()`), and so on until the chain ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    /// The error's type name, e.g. `core::num::error::ParseIntError`.
    pub type_name: String,
    /// The error's display message.
    pub message: String,
    /// Optional stack text, written on its own line below the message.
    pub stack: Option<String>,
    /// The error that caused this one.
    pub parent: Option<Box<ErrorInfo>>,
}

impl ErrorInfo {
    pub fn new(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        ErrorInfo {
            type_name: type_name.into(),
            message: message.into(),
            stack: None,
            parent: None,
        }
    }

    /// Attach stack text, e.g. a captured [`std::backtrace::Backtrace`].
    pub fn with_stack(self, stack: impl Into<String>) -> Self {
        Self {
            stack: Some(stack.into()),
            ..self
        }
    }

    /// Attach the error that caused this one.
    pub fn with_parent(self, parent: ErrorInfo) -> Self {
        Self {
            parent: Some(Box::new(parent)),
            ..self
        }
    }

    /// Capture a typed error together with its whole `source()` chain.
    ///
    /// The outermost entry carries the concrete type name of `E`; the
    /// sources are type-erased and are recorded as [`ERASED_ERROR_TYPE`].
    pub fn from_error<E: Error + 'static>(err: &E) -> Self {
        let mut info = ErrorInfo::new(std::any::type_name::<E>(), err.to_string());
        info.parent = err.source().map(|source| Box::new(Self::from_dyn(source)));
        info
    }

    /// Capture a type-erased error together with its `source()` chain.
    pub fn from_dyn(err: &(dyn Error + 'static)) -> Self {
        let mut chain = Vec::new();
        let mut current = Some(err);
        while let Some(e) = current {
            chain.push(e);
            current = e.source();
        }
        // Build innermost first so every link owns its parent.
        chain
            .into_iter()
            .rev()
            .fold(None, |parent: Option<ErrorInfo>, e| {
                let mut info = ErrorInfo::new(ERASED_ERROR_TYPE, e.to_string());
                info.parent = parent.map(Box::new);
                Some(info)
            })
            .unwrap_or_else(|| ErrorInfo::new(ERASED_ERROR_TYPE, err.to_string()))
    }

    /// Iterate the chain, outermost first.
    pub fn chain(&self) -> impl Iterator<Item = &ErrorInfo> {
        std::iter::successors(Some(self), |info| info.parent.as_deref())
    }
}

/// A single log event as handed to a sink.
///
/// Events are immutable once built and are consumed by the formatter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    pub level: LogLevel,
    pub category: String,
    pub message: String,
    pub error: Option<ErrorInfo>,
}

impl LogEvent {
    pub fn new(level: LogLevel, category: impl Into<String>, message: impl Into<String>) -> Self {
        LogEvent {
            level,
            category: category.into(),
            message: message.into(),
            error: None,
        }
    }

    pub fn with_error(self, error: ErrorInfo) -> Self {
        Self {
            error: Some(error),
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("outer failure")]
    struct Outer {
        #[source]
        inner: std::num::ParseIntError,
    }

    #[test]
    fn from_error_walks_sources() {
        let inner = "x".parse::<i32>().unwrap_err();
        let err = Outer { inner };
        let info = ErrorInfo::from_error(&err);

        let links: Vec<&ErrorInfo> = info.chain().collect();
        assert_eq!(links.len(), 2);
        assert!(links[0].type_name.ends_with("Outer"));
        assert_eq!(links[0].message, "outer failure");
        assert_eq!(links[1].type_name, ERASED_ERROR_TYPE);
        assert_eq!(links[1].message, "invalid digit found in string");
    }

    #[test]
    fn builders_compose() {
        let info = ErrorInfo::new("Outer", "boom")
            .with_stack("at main")
            .with_parent(ErrorInfo::new("Inner", "root cause"));
        assert_eq!(info.stack.as_deref(), Some("at main"));
        assert_eq!(info.chain().map(|i| i.type_name.as_str()).collect::<Vec<_>>(), ["Outer", "Inner"]);
    }
}

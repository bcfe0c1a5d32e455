use std::fmt;

/// Errors raised by the dynamic-value layer
///
/// Most of these are fatal: the panicking accessors route them through
/// [`fatal`]. The `try_*` accessors hand the same values back as `Err`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DynError {
    /// Accessed an empty `AnyValue`, a nil `Ref`, `Trait` or `Func`
    InvalidMemory,
    /// Requested a type that doesn't match the one actually stored
    IncompatibleType {
        expected: &'static str,
        found: &'static str,
    },
    /// The allocator could not provide storage for a value
    ///
    /// Never produced by this crate: the global allocator aborts through
    /// `handle_alloc_error` before any constructor can observe a failure.
    /// Kept so hosts can report the condition with the same vocabulary.
    MemoryAllocationFailed,
}

impl fmt::Display for DynError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DynError::InvalidMemory => {
                write!(f, "invalid memory address or nil pointer deference")
            }
            DynError::IncompatibleType { expected, found } => {
                write!(f, "incompatible type: expected {}, found {}", expected, found)
            }
            DynError::MemoryAllocationFailed => write!(f, "memory allocation failed"),
        }
    }
}

impl std::error::Error for DynError {}

/// Terminates the current call path with `err`.
///
/// This is the abort primitive of the layer: there is no recovery and no
/// retry. The error is logged before unwinding so hosts that install a logger
/// see it even when the panic is caught further up.
#[cold]
#[track_caller]
pub fn fatal(err: DynError) -> ! {
    log::error!("fatal runtime error: {}", err);
    panic!("{}", err)
}

use crate::error::{fatal, DynError};
use crate::render::Render;
use std::fmt;
use std::sync::Arc;

/// A nullable function value
///
/// Wraps a shared callable, typically `dyn Fn(..) -> R + Send + Sync`.
/// Copies share the callable and whatever it captured; two function values
/// compare equal when they share one callable.
///
/// # Examples
///
/// ```
/// use rcany::Func;
///
/// let double = Func::<dyn Fn(i32) -> i32 + Send + Sync>::from_box(Box::new(|x| x * 2));
/// assert_eq!((double.get())(4), 8);
/// assert_eq!(double, double.clone());
/// ```
pub struct Func<F: ?Sized> {
    callable: Option<Arc<F>>,
}

impl<F> Func<F> {
    /// Wraps a sized callable, such as a plain `fn` pointer
    pub fn new(callable: F) -> Self {
        Self {
            callable: Some(Arc::new(callable)),
        }
    }
}

impl<F: ?Sized> Func<F> {
    /// Wraps a boxed callable, usually a closure behind `dyn Fn`
    pub fn from_box(callable: Box<F>) -> Self {
        Self {
            callable: Some(Arc::from(callable)),
        }
    }

    /// Returns a function value holding nothing
    pub fn nil() -> Self {
        Self { callable: None }
    }

    pub fn is_nil(&self) -> bool {
        self.callable.is_none()
    }

    /// Returns the callable, or `InvalidMemory` if nil
    pub fn try_get(&self) -> Result<&F, DynError> {
        self.callable.as_deref().ok_or(DynError::InvalidMemory)
    }

    /// Returns the callable
    ///
    /// # Panics
    ///
    /// Aborts with `InvalidMemory` when calling through a nil function value.
    #[track_caller]
    pub fn get(&self) -> &F {
        match self.try_get() {
            Ok(callable) => callable,
            Err(err) => fatal(err),
        }
    }

    /// Returns true if both values share the same callable
    pub fn ptr_eq(&self, other: &Func<F>) -> bool {
        match (&self.callable, &other.callable) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl<F: ?Sized> Clone for Func<F> {
    fn clone(&self) -> Self {
        Self {
            callable: self.callable.clone(),
        }
    }
}

impl<F: ?Sized> Default for Func<F> {
    fn default() -> Self {
        Self::nil()
    }
}

impl<F: ?Sized> PartialEq for Func<F> {
    fn eq(&self, other: &Self) -> bool {
        (self.is_nil() && other.is_nil()) || self.ptr_eq(other)
    }
}

impl<F: ?Sized> Render for Func<F> {
    fn render(&self, out: &mut String) {
        out.push_str("<fn>");
    }
}

impl<F: ?Sized> fmt::Debug for Func<F> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_nil() {
            write!(f, "Func(nil)")
        } else {
            write!(f, "Func(<fn>)")
        }
    }
}

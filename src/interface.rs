use crate::clone::DeepClone;
use crate::error::{fatal, DynError};
use crate::render::Render;
use crate::type_table::TypeToken;
use std::any::{type_name, Any};
use std::fmt::{self, Write};
use std::sync::Arc;

// One allocation serves both views of the implementation.
trait Implementation<D: ?Sized>: Send + Sync {
    fn interface(&self) -> &D;
    fn concrete(&self) -> &(dyn Any + Send + Sync);
    fn token(&self) -> TypeToken;
    fn deep_copy(&self) -> Arc<dyn Implementation<D>>;
}

struct Bound<U, D: ?Sized> {
    value: U,
    view: fn(&U) -> &D,
}

impl<U, D> Implementation<D> for Bound<U, D>
where
    U: DeepClone + Send + Sync + 'static,
    D: ?Sized + 'static,
{
    fn interface(&self) -> &D {
        (self.view)(&self.value)
    }

    fn concrete(&self) -> &(dyn Any + Send + Sync) {
        &self.value
    }

    fn token(&self) -> TypeToken {
        TypeToken::of::<U>()
    }

    fn deep_copy(&self) -> Arc<dyn Implementation<D>> {
        Arc::new(Bound {
            value: self.value.deep_clone(),
            view: self.view,
        })
    }
}

/// A polymorphic interface wrapper
///
/// Holds one concrete implementation of the interface `D` (usually a
/// `dyn Trait` type). The implementation is reachable both through the
/// interface, with [`get`](Self::get), and by its concrete type, with
/// [`downcast_ref`](Self::downcast_ref); both read the same value. Cloning a
/// `Trait` shares the implementation; [`deep_clone`](DeepClone::deep_clone)
/// builds an independent one.
///
/// # Examples
///
/// ```
/// use rcany::{DeepClone, Trait};
///
/// trait Shape: Send + Sync {
///     fn area(&self) -> f64;
/// }
///
/// #[derive(Clone)]
/// struct Square(f64);
///
/// impl Shape for Square {
///     fn area(&self) -> f64 { self.0 * self.0 }
/// }
///
/// impl DeepClone for Square {
///     fn deep_clone(&self) -> Self { self.clone() }
/// }
///
/// let shape = Trait::<dyn Shape>::new(Square(3.0), |square| square);
/// assert_eq!(shape.get().area(), 9.0);
/// assert!(shape.type_is::<Square>());
///
/// let copy = shape.deep_clone();
/// assert_ne!(copy, shape);
/// assert_eq!(copy.get().area(), 9.0);
/// ```
pub struct Trait<D: ?Sized + 'static> {
    imp: Option<Arc<dyn Implementation<D>>>,
}

impl<D: ?Sized + 'static> Trait<D> {
    /// Wraps `value` behind the interface `D`
    ///
    /// `view` projects the value onto the interface. For a `dyn Trait`
    /// interface the identity closure `|value| value` is enough.
    pub fn new<U>(value: U, view: fn(&U) -> &D) -> Self
    where
        U: DeepClone + Send + Sync + 'static,
    {
        Self {
            imp: Some(Arc::new(Bound { value, view })),
        }
    }

    /// Returns a wrapper holding no implementation
    pub fn nil() -> Self {
        Self { imp: None }
    }

    pub fn is_nil(&self) -> bool {
        self.imp.is_none()
    }

    /// Returns the implementation through the interface
    ///
    /// # Panics
    ///
    /// Aborts with `InvalidMemory` on a nil wrapper.
    #[track_caller]
    pub fn get(&self) -> &D {
        match &self.imp {
            Some(imp) => imp.interface(),
            None => fatal(DynError::InvalidMemory),
        }
    }

    /// Identity of the concrete implementation, if any
    pub fn type_token(&self) -> Option<TypeToken> {
        self.imp.as_ref().map(|imp| imp.token())
    }

    /// Returns true if the concrete implementation is a `U`
    pub fn type_is<U: 'static>(&self) -> bool {
        self.type_token() == Some(TypeToken::of::<U>())
    }

    /// Returns the concrete implementation if it is a `U`
    pub fn downcast_ref<U: 'static>(&self) -> Option<&U> {
        self.imp.as_ref()?.concrete().downcast_ref::<U>()
    }

    /// Returns a copy of the concrete implementation
    ///
    /// # Errors
    ///
    /// - Returns `DynError::InvalidMemory` on a nil wrapper
    /// - Returns `DynError::IncompatibleType` if the implementation is not a `U`
    pub fn try_extract<U: Clone + 'static>(&self) -> Result<U, DynError> {
        let imp = self.imp.as_ref().ok_or(DynError::InvalidMemory)?;
        imp.concrete()
            .downcast_ref::<U>()
            .cloned()
            .ok_or_else(|| DynError::IncompatibleType {
                expected: type_name::<U>(),
                found: imp.token().name(),
            })
    }

    /// Returns a copy of the concrete implementation
    ///
    /// # Panics
    ///
    /// Aborts through [`fatal`] on the same conditions that make
    /// [`try_extract`](Self::try_extract) fail.
    #[track_caller]
    pub fn extract<U: Clone + 'static>(&self) -> U {
        match self.try_extract() {
            Ok(value) => value,
            Err(err) => fatal(err),
        }
    }
}

impl<D: ?Sized + 'static> DeepClone for Trait<D> {
    fn deep_clone(&self) -> Self {
        Self {
            imp: self.imp.as_ref().map(|imp| imp.deep_copy()),
        }
    }
}

impl<D: ?Sized + 'static> Clone for Trait<D> {
    fn clone(&self) -> Self {
        Self {
            imp: self.imp.clone(),
        }
    }
}

impl<D: ?Sized + 'static> Default for Trait<D> {
    fn default() -> Self {
        Self::nil()
    }
}

/// Identity comparison: equal when both are nil or share one implementation
impl<D: ?Sized + 'static> PartialEq for Trait<D> {
    fn eq(&self, other: &Self) -> bool {
        match (&self.imp, &other.imp) {
            (None, None) => true,
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Renders `nil` or the address of the shared implementation.
impl<D: ?Sized + 'static> Render for Trait<D> {
    fn render(&self, out: &mut String) {
        match &self.imp {
            Some(imp) => {
                let _ = write!(out, "{:p}", Arc::as_ptr(imp) as *const ());
            }
            None => out.push_str("nil"),
        }
    }
}

impl<D: ?Sized + 'static> fmt::Debug for Trait<D> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.imp {
            Some(imp) => write!(f, "Trait({})", imp.token().name()),
            None => write!(f, "Trait(nil)"),
        }
    }
}

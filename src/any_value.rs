use crate::error::{fatal, DynError};
use crate::render::Render;
use crate::type_table::{table_for, DynType, Payload, TypeToken};
use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// Bound for types that can be stored in an [`AnyValue`]
///
/// Blanket-implemented for every `'static` type that is thread-safe,
/// cloneable (extraction hands out copies), comparable and renderable.
pub trait Value: Any + Send + Sync + Clone + PartialEq + Render {}

impl<T> Value for T where T: Any + Send + Sync + Clone + PartialEq + Render {}

/// The "no value" marker
///
/// Assigning it clears an [`AnyValue`]; comparing against it tests for
/// emptiness. Asking whether an `AnyValue` holds a `Nil` is always false.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Nil;

/// Heap cell shared by every copy of one `AnyValue`
struct Slot {
    payload: Payload,
    table: &'static dyn DynType,
}

impl Drop for Slot {
    fn drop(&mut self) {
        // Box<()> does not allocate
        let payload = std::mem::replace(&mut self.payload, Box::new(()));
        self.table.destroy(payload);
    }
}

/// A type-erased, reference-counted value
///
/// An `AnyValue` is either empty or holds one value of some concrete type
/// together with that type's dispatch table. Cloning an `AnyValue` shares the
/// stored value: all copies point at the same slot, and the payload is
/// destroyed exactly once, when the last copy lets go of it. Storing a fresh
/// value always allocates a fresh slot.
///
/// Individual instances are not synchronised: mutating one `AnyValue` needs
/// `&mut`. Copies may be cloned and dropped on different threads freely.
///
/// # Examples
///
/// ```
/// use rcany::{AnyValue, Nil};
///
/// let a = AnyValue::new(5i32);
/// let b = a.clone();
///
/// assert!(a.type_is::<i32>());
/// assert!(!a.type_is::<i64>());
/// assert_eq!(b.extract::<i32>(), 5);
/// assert_eq!(a.share_count(), 2);
///
/// assert_eq!(AnyValue::new(5i32), AnyValue::new(5i32));
/// assert_ne!(AnyValue::new(5i32), AnyValue::new(5.0f64));
/// assert_eq!(AnyValue::empty(), Nil);
/// assert_eq!(AnyValue::empty().to_string(), "0");
/// ```
#[derive(Default)]
pub struct AnyValue {
    slot: Option<Arc<Slot>>,
}

impl AnyValue {
    /// Creates an empty value
    pub fn empty() -> Self {
        Self { slot: None }
    }

    /// Creates a value holding `value`
    pub fn new<T: Value>(value: T) -> Self {
        let mut any = Self::empty();
        any.set(value);
        any
    }

    /// Replaces the contents with `value`
    ///
    /// The current share is released first, then `value` moves into a freshly
    /// allocated slot bound to the dispatch table for `T`. Passing another
    /// `AnyValue` shares it instead of nesting it.
    pub fn set<T: Value>(&mut self, value: T) {
        if let Some(src) = (&value as &dyn Any).downcast_ref::<AnyValue>() {
            self.assign(src);
            return;
        }

        self.release();
        self.slot = Some(Arc::new(Slot {
            payload: Box::new(value),
            table: table_for::<T>(),
        }));
    }

    /// Makes `self` share the contents of `src`
    ///
    /// Assigning a value to itself (or to a copy that already shares its slot)
    /// does nothing. Assigning an empty value clears `self`.
    pub fn assign(&mut self, src: &AnyValue) {
        if self.ptr_eq(src) {
            return;
        }

        match &src.slot {
            None => self.clear(),
            Some(slot) => {
                self.release();
                self.slot = Some(Arc::clone(slot));
            }
        }
    }

    /// Assigns the "no value" marker
    pub fn set_nil(&mut self, _: Nil) {
        self.clear();
    }

    /// Releases the current share and leaves `self` empty
    pub fn clear(&mut self) {
        self.release();
    }

    fn release(&mut self) {
        let Some(slot) = self.slot.take() else {
            return;
        };

        // Only the owner that takes the count to zero gets the slot back; its
        // drop runs the table's destroy and then frees the slot.
        if let Some(last) = Arc::into_inner(slot) {
            log::trace!("last share of {} released", last.table.identity());
            drop(last);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.slot.is_none()
    }

    /// Returns true if the stored value is of type `T`
    ///
    /// Always false for an empty value and for `T = Nil`.
    pub fn type_is<T: ?Sized + 'static>(&self) -> bool {
        if TypeId::of::<T>() == TypeId::of::<Nil>() {
            return false;
        }

        match &self.slot {
            Some(slot) => slot.table.identity() == TypeToken::of::<T>(),
            None => false,
        }
    }

    /// Identity of the stored type, if any
    pub fn type_token(&self) -> Option<TypeToken> {
        self.slot.as_ref().map(|slot| slot.table.identity())
    }

    /// Name of the stored type, if any
    pub fn type_name(&self) -> Option<&'static str> {
        self.type_token().map(|token| token.name())
    }

    /// Returns a reference to the stored value if it is of type `T`
    pub fn downcast_ref<T: Value>(&self) -> Option<&T> {
        if !self.type_is::<T>() {
            return None;
        }
        self.slot.as_ref()?.payload.downcast_ref::<T>()
    }

    /// Returns a copy of the stored value
    ///
    /// # Errors
    ///
    /// - Returns `DynError::InvalidMemory` if the value is empty
    /// - Returns `DynError::IncompatibleType` if a different type is stored
    pub fn try_extract<T: Value>(&self) -> Result<T, DynError> {
        self.with(|value: &T| value.clone())
    }

    /// Returns a copy of the stored value
    ///
    /// Callers that expect a mismatch as a normal outcome should test with
    /// [`type_is`](Self::type_is) first or use [`try_extract`](Self::try_extract).
    ///
    /// # Panics
    ///
    /// Aborts through [`fatal`] with `InvalidMemory` when empty and with
    /// `IncompatibleType` when `T` is not the stored type.
    #[track_caller]
    pub fn extract<T: Value>(&self) -> T {
        match self.try_extract() {
            Ok(value) => value,
            Err(err) => fatal(err),
        }
    }

    /// Runs `f` with a reference to the stored value
    ///
    /// # Errors
    ///
    /// Same conditions as [`try_extract`](Self::try_extract).
    pub fn with<T: Value, R>(&self, f: impl FnOnce(&T) -> R) -> Result<R, DynError> {
        let slot = self.slot.as_ref().ok_or(DynError::InvalidMemory)?;
        let value = self
            .downcast_ref::<T>()
            .ok_or_else(|| DynError::IncompatibleType {
                expected: type_name::<T>(),
                found: slot.table.identity().name(),
            })?;
        Ok(f(value))
    }

    /// Returns true if a `T` equal to `value` is stored
    pub fn equals_value<T: Value>(&self, value: &T) -> bool {
        if let Some(other) = (value as &dyn Any).downcast_ref::<AnyValue>() {
            return self == other;
        }
        self.downcast_ref::<T>().is_some_and(|stored| stored == value)
    }

    /// Number of `AnyValue`s sharing this slot, zero when empty
    pub fn share_count(&self) -> usize {
        self.slot.as_ref().map_or(0, Arc::strong_count)
    }

    /// Returns true if both values share the same slot
    pub fn ptr_eq(&self, other: &AnyValue) -> bool {
        match (&self.slot, &other.slot) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Clone for AnyValue {
    fn clone(&self) -> Self {
        Self {
            slot: self.slot.clone(),
        }
    }
}

impl Drop for AnyValue {
    fn drop(&mut self) {
        self.release();
    }
}

impl From<Nil> for AnyValue {
    fn from(_: Nil) -> Self {
        Self::empty()
    }
}

impl PartialEq for AnyValue {
    fn eq(&self, other: &Self) -> bool {
        match (&self.slot, &other.slot) {
            (None, None) => true,
            (Some(a), Some(b)) => {
                if Arc::ptr_eq(a, b) {
                    return true;
                }
                if a.table.identity() != b.table.identity() {
                    return false;
                }
                a.table.equals(&*a.payload, &*b.payload)
            }
            _ => false,
        }
    }
}

impl PartialEq<Nil> for AnyValue {
    fn eq(&self, _: &Nil) -> bool {
        self.is_empty()
    }
}

impl PartialEq<AnyValue> for Nil {
    fn eq(&self, other: &AnyValue) -> bool {
        other.is_empty()
    }
}

impl Render for AnyValue {
    fn render(&self, out: &mut String) {
        match &self.slot {
            Some(slot) => slot.table.render(&*slot.payload, out),
            None => out.push('0'),
        }
    }
}

impl fmt::Display for AnyValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl fmt::Debug for AnyValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.slot {
            Some(slot) => write!(
                f,
                "AnyValue({}: {})",
                slot.table.identity().name(),
                self.to_text()
            ),
            None => write!(f, "AnyValue(nil)"),
        }
    }
}

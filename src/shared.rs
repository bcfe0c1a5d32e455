use crate::error::{fatal, DynError};
use crate::render::Render;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A nullable, atomically counted shared reference cell
///
/// A backed `Ref` owns a heap cell that every clone of it shares; writes
/// through one clone are seen by all of them. A nil `Ref` has no cell at all,
/// and any access to its referent is fatal.
///
/// # Examples
///
/// ```
/// use rcany::Ref;
///
/// let a = Ref::new(7);
/// let b = a.clone();
/// b.set(8);
/// assert_eq!(a.get(), 8);
/// assert!(!Ref::<i32>::nil().is_real());
/// ```
pub struct Ref<T> {
    cell: Option<Arc<RwLock<T>>>,
}

impl<T> Ref<T> {
    /// Allocates a new cell holding `value`
    pub fn new(value: T) -> Self {
        Self {
            cell: Some(Arc::new(RwLock::new(value))),
        }
    }

    /// Returns a reference with no backing cell
    pub fn nil() -> Self {
        Self { cell: None }
    }

    /// Returns true if the reference is backed by a cell
    pub fn is_real(&self) -> bool {
        self.cell.is_some()
    }

    fn try_cell(&self) -> Result<&RwLock<T>, DynError> {
        self.cell.as_deref().ok_or(DynError::InvalidMemory)
    }

    #[track_caller]
    fn read(&self) -> RwLockReadGuard<'_, T> {
        match self.try_cell() {
            Ok(cell) => cell.read().unwrap_or_else(PoisonError::into_inner),
            Err(err) => fatal(err),
        }
    }

    #[track_caller]
    fn write(&self) -> RwLockWriteGuard<'_, T> {
        match self.try_cell() {
            Ok(cell) => cell.write().unwrap_or_else(PoisonError::into_inner),
            Err(err) => fatal(err),
        }
    }

    /// Runs `f` with read access to the referent
    ///
    /// The cell stays locked while `f` runs. Writing to the same cell from
    /// inside `f`, through this `Ref` or any clone of it, deadlocks; copy the
    /// value out first instead.
    ///
    /// # Panics
    ///
    /// Aborts with `InvalidMemory` on a nil reference.
    #[track_caller]
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.read())
    }

    /// Runs `f` with write access to the referent
    ///
    /// The cell stays write-locked while `f` runs, so `f` must not touch the
    /// same cell again.
    ///
    /// ```
    /// use rcany::Ref;
    ///
    /// let total = Ref::new(vec![1, 2]);
    /// let sum: i32 = total.with(|v| v.iter().sum());
    /// total.with_mut(|v| v.push(sum));
    /// assert_eq!(total.get(), vec![1, 2, 3]);
    /// ```
    ///
    /// # Panics
    ///
    /// Aborts with `InvalidMemory` on a nil reference.
    #[track_caller]
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.write())
    }

    /// Replaces the referent
    ///
    /// # Panics
    ///
    /// Aborts with `InvalidMemory` on a nil reference.
    #[track_caller]
    pub fn set(&self, value: T) {
        *self.write() = value;
    }

    /// Number of references sharing the cell, zero when nil
    pub fn share_count(&self) -> usize {
        self.cell.as_ref().map_or(0, Arc::strong_count)
    }

    /// Returns true if both references share the same cell
    pub fn ptr_eq(&self, other: &Ref<T>) -> bool {
        match (&self.cell, &other.cell) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl<T: Clone> Ref<T> {
    /// Returns a copy of the referent
    ///
    /// # Panics
    ///
    /// Aborts with `InvalidMemory` on a nil reference.
    #[track_caller]
    pub fn get(&self) -> T {
        self.read().clone()
    }
}

impl<T> Clone for Ref<T> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
        }
    }
}

impl<T> Default for Ref<T> {
    fn default() -> Self {
        Self::nil()
    }
}

impl<T: PartialEq> PartialEq for Ref<T> {
    fn eq(&self, other: &Self) -> bool {
        match (&self.cell, &other.cell) {
            (None, None) => true,
            (Some(a), Some(b)) => {
                if Arc::ptr_eq(a, b) {
                    return true;
                }
                let a = a.read().unwrap_or_else(PoisonError::into_inner);
                let b = b.read().unwrap_or_else(PoisonError::into_inner);
                *a == *b
            }
            _ => false,
        }
    }
}

impl<T: Render> Render for Ref<T> {
    fn render(&self, out: &mut String) {
        match &self.cell {
            Some(cell) => cell
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .render(out),
            None => out.push_str("nil"),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Ref<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.cell {
            Some(cell) => {
                let value = cell.read().unwrap_or_else(PoisonError::into_inner);
                f.debug_tuple("Ref").field(&*value).finish()
            }
            None => write!(f, "Ref(nil)"),
        }
    }
}

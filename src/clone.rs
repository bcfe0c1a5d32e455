//! Structural deep copy
//!
//! [`DeepClone`] produces a value that shares no ownership with its source for
//! anything the source owns. Built-in containers recurse into their elements;
//! user types supply their own implementation. Shapes that only observe data
//! (raw pointers, function values) are copied shallowly.
//!
//! Plain `fn` pointers are covered up to four arguments, but only when no
//! argument borrows: `fn(&str) -> usize` is generic over the borrow's lifetime
//! and has no impl. Wrap such a pointer in a [`Func`], which is always shared
//! on deep clone.
//!
//! The protocol assumes an acyclic ownership graph. Deep cloning a cycle of
//! [`Ref`]s never terminates; nothing here detects it.

use crate::func::Func;
use crate::shared::Ref;
use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};

/// Independent deep copy of a value
///
/// # Examples
///
/// ```
/// use rcany::{deep_clone, DeepClone, Ref};
///
/// #[derive(Debug, PartialEq)]
/// struct Account {
///     owner: String,
///     balance: Ref<i64>,
/// }
///
/// impl DeepClone for Account {
///     fn deep_clone(&self) -> Self {
///         Account {
///             owner: self.owner.deep_clone(),
///             balance: self.balance.deep_clone(),
///         }
///     }
/// }
///
/// let original = Account { owner: "ann".into(), balance: Ref::new(10) };
/// let copy = deep_clone(&original);
/// copy.balance.set(0);
/// assert_eq!(original.balance.get(), 10);
/// ```
pub trait DeepClone: Sized {
    fn deep_clone(&self) -> Self;
}

/// Returns a deep copy of `value`
pub fn deep_clone<T: DeepClone>(value: &T) -> T {
    value.deep_clone()
}

macro_rules! deep_clone_by_copy {
    ($($ty:ty),* $(,)?) => {
        $(
            impl DeepClone for $ty {
                #[inline]
                fn deep_clone(&self) -> Self {
                    self.clone()
                }
            }
        )*
    };
}

deep_clone_by_copy!(
    u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, f32, f64, bool, char, (),
    String,
);

impl DeepClone for &str {
    #[inline]
    fn deep_clone(&self) -> Self {
        *self
    }
}

// Pointers are observers: the pointee is neither copied nor claimed.
impl<T: ?Sized> DeepClone for *const T {
    #[inline]
    fn deep_clone(&self) -> Self {
        *self
    }
}

impl<T: ?Sized> DeepClone for *mut T {
    #[inline]
    fn deep_clone(&self) -> Self {
        *self
    }
}

impl<T: DeepClone> DeepClone for Vec<T> {
    fn deep_clone(&self) -> Self {
        self.iter().map(DeepClone::deep_clone).collect()
    }
}

impl<T: DeepClone, const N: usize> DeepClone for [T; N] {
    fn deep_clone(&self) -> Self {
        std::array::from_fn(|index| self[index].deep_clone())
    }
}

impl<K: DeepClone + Ord, V: DeepClone> DeepClone for BTreeMap<K, V> {
    fn deep_clone(&self) -> Self {
        self.iter()
            .map(|(key, value)| (key.deep_clone(), value.deep_clone()))
            .collect()
    }
}

impl<K, V, S> DeepClone for HashMap<K, V, S>
where
    K: DeepClone + Eq + Hash,
    V: DeepClone,
    S: BuildHasher + Clone,
{
    fn deep_clone(&self) -> Self {
        let mut copy = HashMap::with_capacity_and_hasher(self.len(), self.hasher().clone());
        for (key, value) in self {
            copy.insert(key.deep_clone(), value.deep_clone());
        }
        copy
    }
}

impl<T: DeepClone> DeepClone for Option<T> {
    fn deep_clone(&self) -> Self {
        self.as_ref().map(DeepClone::deep_clone)
    }
}

impl<T: DeepClone> DeepClone for Box<T> {
    fn deep_clone(&self) -> Self {
        Box::new((**self).deep_clone())
    }
}

macro_rules! deep_clone_tuple {
    ($(($($name:ident . $index:tt),+)),+ $(,)?) => {
        $(
            impl<$($name: DeepClone),+> DeepClone for ($($name,)+) {
                fn deep_clone(&self) -> Self {
                    ($(self.$index.deep_clone(),)+)
                }
            }
        )+
    };
}

deep_clone_tuple!(
    (A.0),
    (A.0, B.1),
    (A.0, B.1, C.2),
    (A.0, B.1, C.2, D.3),
);

/// A nil reference stays nil; a backed one gets a brand-new cell.
impl<T: DeepClone> DeepClone for Ref<T> {
    fn deep_clone(&self) -> Self {
        if !self.is_real() {
            return Ref::nil();
        }
        Ref::new(self.with(T::deep_clone))
    }
}

/// Function values and their captured state are shared, not copied.
impl<F: ?Sized> DeepClone for Func<F> {
    fn deep_clone(&self) -> Self {
        self.clone()
    }
}

macro_rules! deep_clone_fn_pointer {
    ($(($($arg:ident),*)),+ $(,)?) => {
        $(
            impl<R, $($arg),*> DeepClone for fn($($arg),*) -> R {
                #[inline]
                fn deep_clone(&self) -> Self {
                    *self
                }
            }
        )+
    };
}

deep_clone_fn_pointer!((), (A), (A, B), (A, B, C), (A, B, C, D));

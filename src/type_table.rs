use crate::any_value::Value;
use crate::render::Render;
use once_cell::sync::Lazy;
use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::{PoisonError, RwLock};

/// Type-erased payload as held by an `AnyValue` slot
pub type Payload = Box<dyn Any + Send + Sync>;

/// Runtime identity of a concrete type
///
/// Tokens compare by content (the `TypeId` hash), never by address, so two
/// tokens produced independently for the same type are always equal. The type
/// name is carried for diagnostics only and plays no part in comparison.
#[derive(Clone, Copy)]
pub struct TypeToken {
    id: TypeId,
    name: &'static str,
}

impl TypeToken {
    /// Returns the token for `T`
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Human readable type name
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeToken {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeToken {}

impl Hash for TypeToken {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeToken {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "TypeToken({})", self.name)
    }
}

impl fmt::Display for TypeToken {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Dispatch table for one concrete stored type
///
/// One table exists per type for the life of the process. The operations
/// receive type-erased payloads that are guaranteed to hold the table's own
/// type; a foreign payload compares unequal and renders nothing.
pub trait DynType: Send + Sync {
    /// Identity token of the bound type
    fn identity(&self) -> TypeToken;

    /// Drops what the value owns and frees the payload storage
    fn destroy(&self, payload: Payload);

    /// Value equality of two payloads
    fn equals(&self, a: &(dyn Any + Send + Sync), b: &(dyn Any + Send + Sync)) -> bool;

    /// Appends the text form of the payload to `out`
    fn render(&self, payload: &(dyn Any + Send + Sync), out: &mut String);
}

struct TableOf<T> {
    token: TypeToken,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Value> DynType for TableOf<T> {
    fn identity(&self) -> TypeToken {
        self.token
    }

    fn destroy(&self, payload: Payload) {
        log::trace!("destroying payload of type {}", self.token);
        drop(payload);
    }

    fn equals(&self, a: &(dyn Any + Send + Sync), b: &(dyn Any + Send + Sync)) -> bool {
        match (a.downcast_ref::<T>(), b.downcast_ref::<T>()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    fn render(&self, payload: &(dyn Any + Send + Sync), out: &mut String) {
        if let Some(value) = payload.downcast_ref::<T>() {
            value.render(out);
        }
    }
}

// Tables are leaked on purpose and never removed.
static REGISTRY: Lazy<RwLock<HashMap<TypeId, &'static dyn DynType>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Returns the dispatch table for `T`, publishing it on first use
///
/// Every call for the same `T` returns the same table instance, including
/// when several threads race on the first call.
///
/// # Examples
///
/// ```
/// use rcany::{table_for, TypeToken};
///
/// let table = table_for::<i32>();
/// assert_eq!(table.identity(), TypeToken::of::<i32>());
/// assert!(std::ptr::addr_eq(table, table_for::<i32>()));
/// ```
pub fn table_for<T: Value>() -> &'static dyn DynType {
    let id = TypeId::of::<T>();

    let cached = REGISTRY
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&id)
        .copied();
    if let Some(table) = cached {
        return table;
    }

    let mut tables = REGISTRY.write().unwrap_or_else(PoisonError::into_inner);
    *tables.entry(id).or_insert_with(|| {
        log::trace!("publishing type table for {}", type_name::<T>());
        let table: &'static dyn DynType = Box::leak(Box::new(TableOf::<T> {
            token: TypeToken::of::<T>(),
            _marker: PhantomData,
        }));
        table
    })
}

/// Number of dispatch tables published so far
pub fn registered_tables() -> usize {
    REGISTRY
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier};
    use std::thread;

    fn addr(table: &'static dyn DynType) -> usize {
        table as *const dyn DynType as *const () as usize
    }

    #[test]
    fn test_same_table_per_type() {
        let first = table_for::<u16>();
        let second = table_for::<u16>();
        assert_eq!(addr(first), addr(second));
        assert_eq!(first.identity(), TypeToken::of::<u16>());
        assert_ne!(addr(first), addr(table_for::<i16>()));
        assert!(registered_tables() >= 2);
    }

    #[test]
    fn test_tokens_compare_by_content() {
        struct Meters;
        struct Feet;

        assert_eq!(TypeToken::of::<Meters>(), TypeToken::of::<Meters>());
        assert_ne!(TypeToken::of::<Meters>(), TypeToken::of::<Feet>());
        assert_ne!(TypeToken::of::<i32>(), TypeToken::of::<u32>());
        assert!(TypeToken::of::<Meters>().name().ends_with("Meters"));
    }

    #[test]
    fn test_table_operations() {
        let table = table_for::<String>();
        let a: Payload = Box::new("abc".to_string());
        let b: Payload = Box::new("abc".to_string());
        let c: Payload = Box::new("xyz".to_string());
        let foreign: Payload = Box::new(7i32);

        assert!(table.equals(&*a, &*b));
        assert!(!table.equals(&*a, &*c));
        assert!(!table.equals(&*a, &*foreign));

        let mut out = String::new();
        table.render(&*c, &mut out);
        assert_eq!(out, "xyz");

        table.destroy(a);
    }

    #[test]
    fn test_concurrent_first_use() {
        #[derive(Clone, PartialEq)]
        struct Racer;

        impl crate::Render for Racer {
            fn render(&self, out: &mut String) {
                out.push_str("racer");
            }
        }

        let barrier = Arc::new(Barrier::new(8));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    addr(table_for::<Racer>())
                })
            })
            .collect();

        let addrs: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(addrs.iter().all(|a| *a == addrs[0]));
        assert_eq!(addrs[0], addr(table_for::<Racer>()));
    }
}

use rcany::{registered_tables, table_for, AnyValue, DynError, Nil, Ref, Render, TypeToken};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

#[derive(Debug, Clone, PartialEq)]
struct Meters(i64);

#[derive(Debug, Clone, PartialEq)]
struct Feet(i64);

impl Render for Meters {
    fn render(&self, out: &mut String) {
        out.push_str(&format!("{}m", self.0));
    }
}

impl Render for Feet {
    fn render(&self, out: &mut String) {
        out.push_str(&format!("{}ft", self.0));
    }
}

#[test]
fn test_type_identity() {
    let meters = AnyValue::new(Meters(3));

    assert!(meters.type_is::<Meters>());
    assert!(!meters.type_is::<Feet>());
    assert!(!meters.type_is::<i64>());
    assert!(!meters.type_is::<Nil>());
    assert_eq!(meters.type_token(), Some(TypeToken::of::<Meters>()));
    assert_ne!(meters, AnyValue::new(Feet(3)));
    assert_eq!(meters.to_text(), "3m");
}

#[test]
fn test_copy_shares_until_last_owner() {
    let a = AnyValue::new(5i32);
    let b = a.clone();

    assert_eq!(a.extract::<i32>(), 5);
    assert_eq!(b.extract::<i32>(), 5);

    drop(b);
    assert_eq!(a.share_count(), 1);
    assert_eq!(a.extract::<i32>(), 5);
}

#[test]
fn test_self_assignment() {
    let mut a = AnyValue::new("keep".to_string());
    let same = a.clone();
    a.assign(&same);
    drop(same);

    assert_eq!(a.extract::<String>(), "keep");
    assert_eq!(a.share_count(), 1);
}

#[test]
fn test_equality_rules() {
    assert_eq!(AnyValue::new(5i32), AnyValue::new(5i32));
    assert_ne!(AnyValue::new(5i32), AnyValue::new(5.0f64));
    assert_eq!(AnyValue::empty(), Nil);
    assert_eq!(Nil, AnyValue::empty());
    assert_eq!(AnyValue::empty(), AnyValue::empty());
    assert_eq!(AnyValue::from(Nil), AnyValue::default());
}

#[test]
fn test_rendering() {
    assert_eq!(AnyValue::empty().to_text(), "0");
    assert_eq!(AnyValue::new("hi").to_text(), "hi");
    assert_eq!(AnyValue::new(vec![1u8, 2, 3]).to_string(), "[1 2 3]");
    assert_eq!(AnyValue::new(Ref::new(7)).to_string(), "7");
    assert_eq!(AnyValue::new(Ref::<i32>::nil()).to_string(), "nil");

    let mut map = BTreeMap::new();
    map.insert(1, "one".to_string());
    map.insert(2, "two".to_string());
    assert_eq!(AnyValue::new(map).to_string(), "{1:one, 2:two}");
}

#[test]
fn test_extract_errors() {
    let empty = AnyValue::empty();
    assert!(matches!(empty.try_extract::<i32>(), Err(DynError::InvalidMemory)));

    let number = AnyValue::new(5i32);
    assert!(matches!(
        number.try_extract::<String>(),
        Err(DynError::IncompatibleType { .. })
    ));
}

#[test]
#[should_panic(expected = "invalid memory address or nil pointer deference")]
fn test_extract_from_empty_panics() {
    let empty = AnyValue::empty();
    let _: i32 = empty.extract();
}

#[test]
#[should_panic(expected = "incompatible type")]
fn test_extract_wrong_type_panics() {
    let value = AnyValue::new(Meters(1));
    let _: Feet = value.extract();
}

#[test]
fn test_tables_are_shared_across_values() {
    let a = AnyValue::new(1u64);
    let b = AnyValue::new(2u64);

    assert!(std::ptr::addr_eq(table_for::<u64>(), table_for::<u64>()));
    assert_eq!(a.type_token(), b.type_token());
    assert!(registered_tables() >= 1);
}

// Payload that counts its own drops
#[derive(Clone)]
struct Counted(Arc<AtomicUsize>);

impl PartialEq for Counted {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Render for Counted {
    fn render(&self, out: &mut String) {
        out.push_str("counted");
    }
}

impl Drop for Counted {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn test_thread_safety() {
    let drops = Arc::new(AtomicUsize::new(0));
    let value = AnyValue::new(Counted(Arc::clone(&drops)));
    let barrier = Arc::new(Barrier::new(10));

    let mut handles = vec![];
    for _ in 0..10 {
        let local = value.clone();
        let barrier = Arc::clone(&barrier);
        handles.push(thread::spawn(move || {
            barrier.wait();
            for _ in 0..100 {
                let copy = local.clone();
                assert!(copy.type_is::<Counted>());
                drop(copy);
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(value.share_count(), 1);
    assert_eq!(drops.load(Ordering::SeqCst), 0);

    drop(value);
    assert_eq!(drops.load(Ordering::SeqCst), 1);
}

#[test]
fn test_last_drop_on_another_thread() {
    let drops = Arc::new(AtomicUsize::new(0));
    let value = AnyValue::new(Counted(Arc::clone(&drops)));
    let moved = value.clone();
    drop(value);

    thread::spawn(move || drop(moved)).join().unwrap();
    assert_eq!(drops.load(Ordering::SeqCst), 1);
}

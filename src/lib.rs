//! # rcany
//!
//! A reference-counted, type-erased value container and a deep-clone protocol.
//!
//! `rcany` is the dynamic-value layer of a runtime support library. It gives
//! statically compiled code two things the host language would otherwise have
//! built in: holding a value whose type is only known at runtime, and
//! producing an independent deep copy of arbitrarily nested data.
//!
//! ## Key Features
//!
//! - **Type-erased**: [`AnyValue`] stores any [`Value`] with runtime type checks
//! - **Shared ownership**: copies of an `AnyValue` share one slot; the payload
//!   is destroyed exactly once, by the last owner
//! - **Per-type dispatch tables**: identity, destroy, equality and rendering
//!   are bound once per type and cached for the life of the process
//! - **Deep clone**: [`DeepClone`] recurses through sequences, arrays, maps,
//!   shared references and interface wrappers, and defers to user types
//!
//! ## Usage Examples
//!
//! ### Storing and Inspecting Values
//!
//! ```rust
//! use rcany::{AnyValue, DynError, Nil};
//!
//! fn main() -> Result<(), DynError> {
//!     let mut value = AnyValue::new(42i32);
//!     assert!(value.type_is::<i32>());
//!     assert_eq!(value.to_string(), "42");
//!
//!     // Copies share the stored value
//!     let copy = value.clone();
//!     assert_eq!(copy.try_extract::<i32>()?, 42);
//!     assert_eq!(value.share_count(), 2);
//!
//!     // A fresh value gets a fresh slot
//!     value.set("hello".to_string());
//!     assert_eq!(copy.share_count(), 1);
//!
//!     // Clearing leaves it empty
//!     value.set_nil(Nil);
//!     assert_eq!(value, Nil);
//!     assert_eq!(value.to_string(), "0");
//!
//!     Ok(())
//! }
//! ```
//!
//! ### Handling Type Mismatches
//!
//! ```rust
//! use rcany::{AnyValue, DynError};
//!
//! let value = AnyValue::new(vec!["a", "b"]);
//!
//! match value.try_extract::<String>() {
//!     Ok(text) => println!("Text: {}", text),
//!     Err(DynError::IncompatibleType { expected, found }) => {
//!         println!("Wanted {}, holding {}", expected, found)
//!     }
//!     Err(e) => println!("Other error: {}", e),
//! }
//!
//! // `extract` treats a mismatch as fatal, so guard it
//! if value.type_is::<Vec<&str>>() {
//!     assert_eq!(value.extract::<Vec<&str>>().len(), 2);
//! }
//! ```
//!
//! ### Deep Cloning
//!
//! ```rust
//! use rcany::{deep_clone, Ref};
//! use std::collections::BTreeMap;
//!
//! let mut scores = BTreeMap::new();
//! scores.insert("ann".to_string(), Ref::new(vec![1, 2]));
//!
//! let copy = deep_clone(&scores);
//! copy["ann"].with_mut(|v| v.push(3));
//!
//! assert_eq!(scores["ann"].get(), vec![1, 2]);
//! assert_eq!(copy["ann"].get(), vec![1, 2, 3]);
//! ```

mod any_value;
mod clone;
mod error;
mod func;
mod interface;
mod render;
mod shared;
mod type_table;


pub use any_value::{AnyValue, Nil, Value};
pub use clone::{deep_clone, DeepClone};
pub use error::{fatal, DynError};
pub use func::Func;
pub use interface::Trait;
pub use render::Render;
pub use shared::Ref;
pub use type_table::{registered_tables, table_for, DynType, Payload, TypeToken};

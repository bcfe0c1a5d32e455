use std::collections::{BTreeMap, HashMap};
use std::fmt::Write;

/// Textual rendering for runtime values
///
/// Every type that can be stored in an [`AnyValue`](crate::AnyValue) renders
/// through this trait; its dispatch table binds `to_text` as the render entry.
///
/// Sequences render space-separated inside brackets (`[1 2 3]`), maps as
/// `{k:v, k:v}`, and absent values as `nil`.
///
/// # Examples
///
/// ```
/// use rcany::Render;
///
/// assert_eq!(vec![1, 2, 3].to_text(), "[1 2 3]");
/// assert_eq!(Vec::<i32>::new().to_text(), "[]");
/// assert_eq!(Some("hi").to_text(), "hi");
/// ```
pub trait Render {
    /// Appends the text form of `self` to `out`
    fn render(&self, out: &mut String);

    /// Returns the text form of `self`
    fn to_text(&self) -> String {
        let mut out = String::new();
        self.render(&mut out);
        out
    }
}

macro_rules! render_display {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Render for $ty {
                fn render(&self, out: &mut String) {
                    let _ = write!(out, "{}", self);
                }
            }
        )*
    };
}

render_display!(
    u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, f32, f64, bool, char,
);

impl Render for str {
    fn render(&self, out: &mut String) {
        out.push_str(self);
    }
}

impl Render for String {
    fn render(&self, out: &mut String) {
        out.push_str(self);
    }
}

impl<T: Render + ?Sized> Render for &T {
    fn render(&self, out: &mut String) {
        (**self).render(out);
    }
}

impl<T: Render + ?Sized> Render for Box<T> {
    fn render(&self, out: &mut String) {
        (**self).render(out);
    }
}

impl<T: Render> Render for Option<T> {
    fn render(&self, out: &mut String) {
        match self {
            Some(value) => value.render(out),
            None => out.push_str("nil"),
        }
    }
}

impl<T: Render> Render for [T] {
    fn render(&self, out: &mut String) {
        out.push('[');
        for (index, item) in self.iter().enumerate() {
            if index > 0 {
                out.push(' ');
            }
            item.render(out);
        }
        out.push(']');
    }
}

impl<T: Render> Render for Vec<T> {
    fn render(&self, out: &mut String) {
        self.as_slice().render(out);
    }
}

impl<T: Render, const N: usize> Render for [T; N] {
    fn render(&self, out: &mut String) {
        self.as_slice().render(out);
    }
}

fn render_entries<'a, K, V>(entries: impl Iterator<Item = (&'a K, &'a V)>, out: &mut String)
where
    K: Render + 'a,
    V: Render + 'a,
{
    out.push('{');
    for (index, (key, value)) in entries.enumerate() {
        if index > 0 {
            out.push_str(", ");
        }
        key.render(out);
        out.push(':');
        value.render(out);
    }
    out.push('}');
}

impl<K: Render, V: Render> Render for BTreeMap<K, V> {
    fn render(&self, out: &mut String) {
        render_entries(self.iter(), out);
    }
}

impl<K: Render, V: Render, S> Render for HashMap<K, V, S> {
    fn render(&self, out: &mut String) {
        render_entries(self.iter(), out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalars() {
        assert_eq!(42i32.to_text(), "42");
        assert_eq!(5.0f64.to_text(), "5");
        assert_eq!(2.5f32.to_text(), "2.5");
        assert_eq!(true.to_text(), "true");
        assert_eq!('x'.to_text(), "x");
        assert_eq!("hi".to_text(), "hi");
        assert_eq!(String::from("hello").to_text(), "hello");
    }

    #[test]
    fn test_sequences() {
        assert_eq!(vec![1, 2, 3].to_text(), "[1 2 3]");
        assert_eq!(Vec::<u8>::new().to_text(), "[]");
        assert_eq!([true, false].to_text(), "[true false]");
        assert_eq!(vec![vec![1], vec![2, 3]].to_text(), "[[1] [2 3]]");
    }

    #[test]
    fn test_maps() {
        let mut map = BTreeMap::new();
        map.insert("b".to_string(), 2);
        map.insert("a".to_string(), 1);
        assert_eq!(map.to_text(), "{a:1, b:2}");
        assert_eq!(BTreeMap::<i32, i32>::new().to_text(), "{}");

        let mut single = HashMap::new();
        single.insert(1, "one");
        assert_eq!(single.to_text(), "{1:one}");
    }

    #[test]
    fn test_option() {
        assert_eq!(None::<i32>.to_text(), "nil");
        assert_eq!(Some(7).to_text(), "7");
    }
}

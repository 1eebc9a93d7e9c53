//! Cache Key Module
//!
//! Derives cache keys from a call's argument list.
//!
//! Arguments are anything `Serialize`. Tuples and `Vec`s are argument
//! lists and `()` is the empty list. Any other value counts as a single
//! argument, including `None` and unit structs, which serialize to null.
//! The default policy is:
//!
//! - no arguments: one fixed sentinel key shared by every no-arg call
//! - one primitive argument (null, bool, number, string): the argument itself
//! - anything else: the JSON encoding of the whole list, object keys sorted
//!
//! Primitives keep their JSON form, so `"1"` and `1` are different keys. The
//! same holds for numbers of different kinds: `1` and `1.0` encode as `1` and
//! `1.0` and do not share an entry.

use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::error::{CacheError, Result};

/// Text used when rendering the sentinel key.
pub const DEFAULT_KEY: &str = "__defaultKey";

// == Cache Key ==
/// Identifier for one call's argument list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// The call had no arguments
    Sentinel,
    /// Exactly one primitive argument, held as its JSON text
    Scalar(String),
    /// JSON encoding of the full argument list
    Serialized(String),
    /// Pointer identity of a shared value
    Identity(usize),
    /// Free-form key produced by a custom key function
    Custom(String),
}

impl CacheKey {
    /// Builds a key from the address of an `Arc`.
    ///
    /// Two keys are equal only if they come from the same allocation. The
    /// key does not keep the value alive, so an address can be reused once
    /// every clone of the `Arc` is gone.
    pub fn identity<T: ?Sized>(value: &Arc<T>) -> Self {
        CacheKey::Identity(Arc::as_ptr(value).cast::<()>() as usize)
    }

    /// Builds a free-form key.
    pub fn custom(key: impl Into<String>) -> Self {
        CacheKey::Custom(key.into())
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::Sentinel => f.write_str(DEFAULT_KEY),
            CacheKey::Scalar(text) | CacheKey::Serialized(text) | CacheKey::Custom(text) => {
                f.write_str(text)
            }
            CacheKey::Identity(addr) => write!(f, "@{addr:#x}"),
        }
    }
}

macro_rules! scalar_key_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for CacheKey {
                fn from(value: $ty) -> Self {
                    CacheKey::Scalar(Value::from(value).to_string())
                }
            }
        )*
    };
}

scalar_key_from!(bool, i32, i64, u32, u64, usize, String, &str);

// == Key Deriver ==
/// Turns an argument list into a cache key.
pub trait KeyDeriver<A: ?Sized>: Send + Sync {
    fn derive_key(&self, args: &A) -> Result<CacheKey>;
}

/// Structural key policy used when no custom key function is given.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultKeyDeriver;

impl<A: Serialize + ?Sized + 'static> KeyDeriver<A> for DefaultKeyDeriver {
    fn derive_key(&self, args: &A) -> Result<CacheKey> {
        // `()` serializes to null like `None` does; only the unit type means no arguments
        if TypeId::of::<A>() == TypeId::of::<()>() {
            return Ok(CacheKey::Sentinel);
        }

        let value = serde_json::to_value(args)
            .map_err(|e| CacheError::KeyDerivation(e.to_string()))?;
        Ok(key_for_arguments(argument_list(value)))
    }
}

/// Adapts a plain closure into a [`KeyDeriver`].
pub struct FnKeyDeriver<F>(pub F);

impl<A: ?Sized, F> KeyDeriver<A> for FnKeyDeriver<F>
where
    F: Fn(&A) -> CacheKey + Send + Sync,
{
    fn derive_key(&self, args: &A) -> Result<CacheKey> {
        Ok((self.0)(args))
    }
}

/// Splits a serialized argument value into the individual arguments.
///
/// A JSON array is the list itself; anything else, null included, is one
/// argument.
pub fn argument_list(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        other => vec![other],
    }
}

/// Applies the default key policy to an already split argument list.
pub fn key_for_arguments(args: Vec<Value>) -> CacheKey {
    if args.is_empty() {
        return CacheKey::Sentinel;
    }

    if args.len() == 1 && is_primitive(&args[0]) {
        return CacheKey::Scalar(args[0].to_string());
    }

    CacheKey::Serialized(Value::Array(args).to_string())
}

fn is_primitive(value: &Value) -> bool {
    !matches!(value, Value::Array(_) | Value::Object(_))
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;
    use std::collections::HashMap;

    fn derive<A: Serialize + ?Sized + 'static>(args: &A) -> CacheKey {
        DefaultKeyDeriver.derive_key(args).unwrap()
    }

    #[test]
    fn test_no_arguments_collapse_to_sentinel() {
        assert_eq!(derive(&()), CacheKey::Sentinel);
        assert_eq!(derive(&Vec::<i32>::new()), CacheKey::Sentinel);
        assert_eq!(CacheKey::Sentinel.to_string(), DEFAULT_KEY);
    }

    #[derive(Serialize)]
    struct Marker;

    #[test]
    fn test_null_values_are_one_argument() {
        let null = CacheKey::Scalar("null".to_string());
        assert_eq!(derive(&None::<u32>), null);
        assert_eq!(derive(&Marker), null);
        assert_eq!(derive(&Value::Null), null);
        assert_ne!(derive(&None::<Vec<u32>>), derive(&Some(Vec::<u32>::new())));
        assert_eq!(argument_list(Value::Null), vec![Value::Null]);
    }

    #[test]
    fn test_single_primitive_is_the_key() {
        assert_eq!(derive(&("foo",)), CacheKey::from("foo"));
        assert_eq!(derive(&(1,)), CacheKey::from(1));
        assert_eq!(derive(&vec![true]), CacheKey::from(true));
        assert_eq!(derive(&(None::<i32>,)), CacheKey::Scalar("null".to_string()));
    }

    #[test]
    fn test_string_and_number_do_not_collide() {
        assert_ne!(derive(&("1",)), derive(&(1,)));
    }

    #[test]
    fn test_integer_and_float_do_not_collide() {
        assert_eq!(derive(&(1.0,)), CacheKey::Scalar("1.0".to_string()));
        assert_ne!(derive(&(1,)), derive(&(1.0,)));
    }

    #[test]
    fn test_bare_value_is_one_argument() {
        assert_eq!(derive(&42u64), CacheKey::from(42u64));
    }

    #[test]
    fn test_multiple_arguments_are_serialized() {
        assert_eq!(
            derive(&("foo", "bar")),
            CacheKey::Serialized(r#"["foo","bar"]"#.to_string())
        );
        assert_ne!(derive(&("foo", "bar")), derive(&("bar", "foo")));
    }

    #[derive(Serialize)]
    struct Flags {
        zeta: bool,
        alpha: bool,
    }

    #[test]
    fn test_single_object_is_serialized_with_sorted_keys() {
        let key = derive(&(Flags {
            zeta: true,
            alpha: false,
        },));
        assert_eq!(
            key,
            CacheKey::Serialized(r#"[{"alpha":false,"zeta":true}]"#.to_string())
        );
    }

    #[test]
    fn test_unserializable_arguments_are_rejected() {
        let mut map = HashMap::new();
        map.insert((1, 2), "pair");

        let result = DefaultKeyDeriver.derive_key(&(map,));
        assert!(matches!(result, Err(CacheError::KeyDerivation(_))));
    }

    #[test]
    fn test_identity_keys() {
        let a = Arc::new(5);
        let b = Arc::new(5);
        assert_eq!(CacheKey::identity(&a), CacheKey::identity(&a.clone()));
        assert_ne!(CacheKey::identity(&a), CacheKey::identity(&b));
    }

    #[test]
    fn test_fn_key_deriver() {
        let deriver = FnKeyDeriver(|args: &Vec<i64>| CacheKey::from(args[0]));
        assert_eq!(
            deriver.derive_key(&vec![1, 2]).unwrap(),
            deriver.derive_key(&vec![1]).unwrap()
        );
    }
}

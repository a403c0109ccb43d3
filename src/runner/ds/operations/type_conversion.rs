use num_bigint::BigInt;
use num_traits::ToPrimitive;

use crate::runner::ds::object::ObjectType;
use crate::runner::ds::value::JsValue;

pub const TYPE_STR_UNDEFINED: &str = "undefined";
pub const TYPE_STR_NULL: &str = "null";
pub const TYPE_STR_BOOLEAN: &str = "boolean";
pub const TYPE_STR_STRING: &str = "string";
pub const TYPE_STR_NUMBER: &str = "number";
pub const TYPE_STR_BIGINT: &str = "bigint";
pub const TYPE_STR_OBJECT: &str = "object";
pub const TYPE_STR_FUNCTION: &str = "function";

pub fn get_type(a: &JsValue) -> &'static str {
    match a {
        JsValue::Undefined => TYPE_STR_UNDEFINED,
        JsValue::Null => TYPE_STR_NULL,
        JsValue::Boolean(_) => TYPE_STR_BOOLEAN,
        JsValue::String(_) => TYPE_STR_STRING,
        JsValue::Number(_) => TYPE_STR_NUMBER,
        JsValue::BigInt(_) => TYPE_STR_BIGINT,
        JsValue::Object(o) => match *o.borrow() {
            ObjectType::Ordinary(_) => TYPE_STR_OBJECT,
            ObjectType::Function(_) => TYPE_STR_FUNCTION,
            ObjectType::Array(_) => TYPE_STR_OBJECT,
        },
    }
}

/// The value of `b` as a `u64`, or `None` when that would lose information
/// (negative, or wider than 64 bits).
pub fn big_int_to_u64(b: &BigInt) -> Option<u64> {
    b.to_u64()
}

/// Read a BigInt-typed value as a `u64`. Anything else, or any lossy
/// conversion, gives `None`.
pub fn to_big_uint64_lossless(v: &JsValue) -> Option<u64> {
    match v {
        JsValue::BigInt(b) => big_int_to_u64(b),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::ds::value::JsNumberType;

    #[test]
    fn test_big_int_to_u64_bounds() {
        assert_eq!(big_int_to_u64(&BigInt::from(0u64)), Some(0));
        assert_eq!(big_int_to_u64(&BigInt::from(u64::MAX)), Some(u64::MAX));
        assert_eq!(big_int_to_u64(&(BigInt::from(u64::MAX) + 1)), None);
        assert_eq!(big_int_to_u64(&BigInt::from(-1)), None);
    }

    #[test]
    fn test_to_big_uint64_lossless_rejects_other_types() {
        assert_eq!(
            to_big_uint64_lossless(&JsValue::Number(JsNumberType::Integer(3))),
            None
        );
        assert_eq!(to_big_uint64_lossless(&JsValue::String("3".to_string())), None);
        assert_eq!(to_big_uint64_lossless(&JsValue::BigInt(BigInt::from(3))), Some(3));
    }

    #[test]
    fn test_get_type() {
        assert_eq!(get_type(&JsValue::BigInt(BigInt::from(1))), TYPE_STR_BIGINT);
        assert_eq!(get_type(&JsValue::Undefined), TYPE_STR_UNDEFINED);
        assert_eq!(get_type(&JsValue::Number(JsNumberType::NaN)), TYPE_STR_NUMBER);
    }
}

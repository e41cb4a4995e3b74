//! Property tests for numeric conversions

use core_types::{number_to_string, string_to_number, to_int32, to_uint16, to_uint32};
use proptest::prelude::*;

#[test]
fn test_to_int32_special_values() {
    assert_eq!(to_int32(f64::NAN), 0);
    assert_eq!(to_int32(f64::INFINITY), 0);
    assert_eq!(to_int32(f64::NEG_INFINITY), 0);
    assert_eq!(to_int32(4294967296.0 + 5.0), 5);
}

#[test]
fn test_to_uint32_fraction_truncates() {
    assert_eq!(to_uint32(3.99), 3);
    assert_eq!(to_uint32(-0.5), 0);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_int32_is_identity_on_i32(n in any::<i32>()) {
        prop_assert_eq!(to_int32(n as f64), n);
    }

    #[test]
    fn prop_int32_wraps_modulo_2_32(n in any::<i32>(), k in -1000i64..1000) {
        let shifted = n as f64 + (k as f64) * 4294967296.0;
        prop_assert_eq!(to_int32(shifted), n);
    }

    #[test]
    fn prop_uint32_agrees_with_int32_bits(x in -1e12f64..1e12) {
        prop_assert_eq!(to_uint32(x) as i32, to_int32(x));
    }

    #[test]
    fn prop_uint16_is_low_bits_of_uint32(x in -1e12f64..1e12) {
        prop_assert_eq!(to_uint16(x), (to_uint32(x) & 0xFFFF) as u16);
    }

    #[test]
    fn prop_number_string_round_trip(x in any::<f64>().prop_filter("finite", |v| v.is_finite())) {
        let s = number_to_string(x);
        let back = string_to_number(&s);
        prop_assert!(back == x || (x == 0.0 && back == 0.0));
    }
}

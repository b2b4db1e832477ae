//! Integration tests for value construction and conversion

use qjs_bridge::{BigInt, Runtime};

#[test]
fn test_int32_round_trip() {
    let rt = Runtime::new().unwrap();
    let ctx = rt.new_context().unwrap();

    for v in [-110011, 0, i32::MIN, i32::MAX] {
        assert_eq!(ctx.new_int32(v).to_int32().unwrap(), v);
    }
}

#[test]
fn test_uint32_round_trip() {
    let rt = Runtime::new().unwrap();
    let ctx = rt.new_context().unwrap();

    for v in [0, 7, i32::MAX as u32 + 1, u32::MAX] {
        let value = ctx.new_uint32(v);
        assert!(value.is_number());
        assert_eq!(value.to_uint32().unwrap(), v);
    }
}

#[test]
fn test_int64_precision() {
    let rt = Runtime::new().unwrap();
    let ctx = rt.new_context().unwrap();

    let exact = -9_007_199_254_740_991;
    assert_eq!(ctx.new_int64(exact).to_int64().unwrap(), exact);

    // 54 significant bits round to the nearest double
    let lossy = ctx.new_int64(18_014_398_509_481_983);
    assert_eq!(lossy.to_int64().unwrap(), 18_014_398_509_481_984);
}

#[test]
fn test_float64_extremes() {
    let rt = Runtime::new().unwrap();
    let ctx = rt.new_context().unwrap();

    for v in [
        123.456,
        1.797_693_134_862_315_7e308,
        2.225_073_858_507_201_4e-308,
        5e-324,
        f64::INFINITY,
        f64::NEG_INFINITY,
        -0.0,
    ] {
        let got = ctx.new_float64(v).to_float64().unwrap();
        assert_eq!(got.to_bits(), v.to_bits(), "{v}");
    }
    assert!(ctx.new_float64(f64::NAN).to_float64().unwrap().is_nan());
}

#[test]
fn test_integer_coercion_truncates() {
    let rt = Runtime::new().unwrap();
    let ctx = rt.new_context().unwrap();

    assert_eq!(ctx.new_float64(-3.99).to_int32().unwrap(), -3);
    assert_eq!(ctx.new_float64(4_294_967_297.0).to_int32().unwrap(), 1);
    assert_eq!(ctx.new_int32(-1).to_uint32().unwrap(), u32::MAX);
    assert_eq!(ctx.new_string("12").to_int32().unwrap(), 12);
}

#[test]
fn test_bigint64() {
    let rt = Runtime::new().unwrap();
    let ctx = rt.new_context().unwrap();

    let v = -18_014_398_509_481_983;
    let big = ctx.new_bigint64(v);
    assert!(big.is_bigint());
    assert_eq!(big.to_bigint64().unwrap(), v);
    assert_eq!(big.to_bigint().unwrap(), BigInt::from(v));
}

#[test]
fn test_biguint64_max() {
    let rt = Runtime::new().unwrap();
    let ctx = rt.new_context().unwrap();

    let big = ctx.new_biguint64(u64::MAX);
    assert_eq!(big.to_bigint().unwrap(), BigInt::from(u64::MAX));
    assert_eq!(big.to_string().unwrap(), "18446744073709551615");
    // the 64-bit accessor wraps like BigInt.asIntN(64)
    assert_eq!(big.to_bigint64().unwrap(), -1);
}

#[test]
fn test_arbitrary_bigint() {
    let rt = Runtime::new().unwrap();
    let ctx = rt.new_context().unwrap();

    for text in [
        "123456789012345678901234567890",
        "-98765432109876543210987654321098765",
        "0",
    ] {
        let v: BigInt = text.parse().unwrap();
        let big = ctx.new_bigint(&v).unwrap();
        assert!(big.is_bigint());
        assert_eq!(big.to_bigint().unwrap(), v);
    }
}

#[test]
fn test_to_bigint_rejects_numbers() {
    let rt = Runtime::new().unwrap();
    let ctx = rt.new_context().unwrap();

    let err = ctx.new_int32(1).to_bigint().unwrap_err();
    assert!(matches!(err, qjs_bridge::QjsError::TypeError { .. }));
}

#[test]
fn test_strings() {
    let rt = Runtime::new().unwrap();
    let ctx = rt.new_context().unwrap();

    for s in ["hello world!", "hello \x00 world!", "", "\x00", "a\x00b\x00c"] {
        assert_eq!(ctx.new_string(s).to_string().unwrap(), s);
    }

    // NUL also survives a trip through script code
    let s = ctx.new_string("x\x00y");
    ctx.global().set("s", s).unwrap();
    let doubled = ctx.eval("s + s").unwrap();
    assert_eq!(doubled.to_string().unwrap(), "x\x00yx\x00y");
}

#[test]
fn test_symbol_with_string_description() {
    let rt = Runtime::new().unwrap();
    let ctx = rt.new_context().unwrap();

    let desc = ctx.new_string("some unique symbol!");
    let sym = ctx.new_symbol(Some(&*desc)).unwrap();
    assert!(sym.is_symbol());
    assert_eq!(
        sym.get("description").unwrap().to_string().unwrap(),
        "some unique symbol!"
    );

    let twin = ctx.new_symbol(Some(&*desc)).unwrap();
    let global = ctx.global();
    global.set("a", sym).unwrap();
    global.set("b", twin).unwrap();
    assert!(!ctx.eval("a === b").unwrap().to_bool());
}

#[test]
fn test_symbol_with_number_description() {
    let rt = Runtime::new().unwrap();
    let ctx = rt.new_context().unwrap();

    let desc = ctx.new_int32(42);
    let sym = ctx.new_symbol(Some(&*desc)).unwrap();
    assert_eq!(sym.get("description").unwrap().to_string().unwrap(), "42");

    let anonymous = ctx.new_symbol(None).unwrap();
    assert!(anonymous.get("description").unwrap().is_undefined());
}

#[test]
fn test_values_from_script() {
    let rt = Runtime::new().unwrap();
    let ctx = rt.new_context().unwrap();

    let arr = ctx.eval("[1, 'two', 3n, null, undefined, {}, () => 0]").unwrap();
    let names: Vec<&str> = (0..7)
        .map(|i| arr.get_idx(i).unwrap().type_name())
        .collect();
    assert_eq!(
        names,
        ["number", "string", "bigint", "null", "undefined", "object", "function"]
    );
}

//! Exercises trampolines end to end against real `extern "C"` functions,
//! covering every [`TypeKind`] this crate marshals plus the re-entrancy and
//! resource-lifetime properties the crate documents.

use trampolet::{invoke, Argument, ReturnSlot, Signature, Trampoline, TypeKind};

macro_rules! identity_fn {
    ($name:ident, $ty:ty) => {
        extern "C" fn $name(v: $ty) -> $ty {
            v
        }
    };
}

identity_fn!(identity_i8, i8);
identity_fn!(identity_u8, u8);
identity_fn!(identity_i16, i16);
identity_fn!(identity_u16, u16);
identity_fn!(identity_i32, i32);
identity_fn!(identity_u32, u32);
identity_fn!(identity_i64, i64);
identity_fn!(identity_u64, u64);
identity_fn!(identity_f32, f32);
identity_fn!(identity_f64, f64);

extern "C" fn identity_i128(v: i128) -> i128 {
    v
}

extern "C" fn identity_u128(v: u128) -> u128 {
    v
}

extern "C" fn identity_bool(v: bool) -> bool {
    v
}

fn round_trip<T: Copy + PartialEq + std::fmt::Debug>(
    name: &str,
    target: extern "C" fn(T) -> T,
    ty: TypeKind,
    value: T,
) {
    let sig = Signature::new(name, target as *const (), vec![ty], ty).unwrap();
    let t = Trampoline::new(sig).unwrap();
    let args = [Argument::from_ref(&value)];
    let mut result = value;
    let slot = ReturnSlot::from_mut(&mut result);
    assert!(unsafe { invoke(&t, &args, &slot) });
    assert_eq!(result, value, "{name} did not round-trip {value:?}");
}

#[test]
fn scalar_types_round_trip_extremal_values() {
    round_trip("i8", identity_i8, TypeKind::I8, i8::MIN);
    round_trip("i8", identity_i8, TypeKind::I8, i8::MAX);
    round_trip("u8", identity_u8, TypeKind::U8, u8::MAX);
    round_trip("i16", identity_i16, TypeKind::I16, i16::MIN);
    round_trip("u16", identity_u16, TypeKind::U16, u16::MAX);
    round_trip("i32", identity_i32, TypeKind::I32, i32::MIN);
    round_trip("u32", identity_u32, TypeKind::U32, u32::MAX);
    round_trip("i64", identity_i64, TypeKind::I64, i64::MIN);
    round_trip("u64", identity_u64, TypeKind::U64, u64::MAX);
    round_trip("f32", identity_f32, TypeKind::F32, f32::MIN);
    round_trip("f64", identity_f64, TypeKind::F64, f64::MAX);
    round_trip("bool_true", identity_bool, TypeKind::Bool, true);
    round_trip("bool_false", identity_bool, TypeKind::Bool, false);
}

#[test]
fn i128_round_trips_a_value_spanning_both_halves() {
    // High and low 64-bit halves both non-zero and distinguishable, so a
    // generator that swaps or drops a half fails the assertion.
    let value: i128 = ((0x0123_4567_89AB_CDEFi128) << 64) | 0x0011_2233_4455_6677;
    round_trip("i128", identity_i128, TypeKind::I128, value);

    let uvalue: u128 = u128::MAX - 1;
    round_trip("u128", identity_u128, TypeKind::U128, uvalue);
}

extern "C" fn sum9_floats(
    a: f64,
    b: f64,
    c: f64,
    d: f64,
    e: f64,
    f: f64,
    g: f64,
    h: f64,
    i: f64,
) -> f64 {
    a + b + c + d + e + f + g + h + i
}

#[test]
fn ninth_float_argument_spills_to_the_stack() {
    let sig = Signature::new(
        "sum9_floats",
        sum9_floats as *const (),
        vec![TypeKind::F64; 9],
        TypeKind::F64,
    )
    .unwrap();
    let t = Trampoline::new(sig).unwrap();
    let values: [f64; 9] = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0];
    let args: Vec<Argument> = values.iter().map(Argument::from_ref).collect();
    let mut result = 0.0f64;
    let slot = ReturnSlot::from_mut(&mut result);
    assert!(unsafe { invoke(&t, &args, &slot) });
    assert_eq!(result, 45.0);
}

extern "C" fn void_fn() {}

#[test]
fn void_return_accepts_a_null_return_slot() {
    let sig = Signature::new("void_fn", void_fn as *const (), vec![], TypeKind::Void).unwrap();
    let t = Trampoline::new(sig).unwrap();
    let slot = unsafe { ReturnSlot::new(std::ptr::null_mut()) };
    assert!(unsafe { invoke(&t, &[], &slot) });
}

extern "C" fn identity_ptr(v: *const u8) -> *const u8 {
    v
}

extern "C" fn identity_size(v: usize) -> usize {
    v
}

extern "C" fn identity_wchar(v: u32) -> u32 {
    v
}

#[test]
fn pointer_identity_round_trips_including_null() {
    let sig = Signature::new(
        "identity_ptr",
        identity_ptr as *const (),
        vec![TypeKind::Pointer],
        TypeKind::Pointer,
    )
    .unwrap();
    let t = Trampoline::new(sig).unwrap();

    let marker = 0xABu8;
    let non_null = &marker as *const u8;
    for value in [std::ptr::null(), non_null] {
        let args = [Argument::from_ref(&value)];
        let mut result: *const u8 = std::ptr::null();
        let slot = ReturnSlot::from_mut(&mut result);
        assert!(unsafe { invoke(&t, &args, &slot) });
        assert_eq!(result, value);
    }
}

#[test]
fn size_and_wchar_round_trip() {
    let sig = Signature::new(
        "identity_size",
        identity_size as *const (),
        vec![TypeKind::Size],
        TypeKind::Size,
    )
    .unwrap();
    let t = Trampoline::new(sig).unwrap();
    let value: usize = usize::MAX;
    let args = [Argument::from_ref(&value)];
    let mut result: usize = 0;
    let slot = ReturnSlot::from_mut(&mut result);
    assert!(unsafe { invoke(&t, &args, &slot) });
    assert_eq!(result, value);

    // `identity_wchar` takes a `u32` to match `TypeKind::Wchar`'s ELF/Mach-O
    // width (4 bytes); this test only runs the marshalling logic used on
    // those targets, not Windows' 2-byte `wchar_t` convention.
    let sig = Signature::new(
        "identity_wchar",
        identity_wchar as *const (),
        vec![TypeKind::Wchar],
        TypeKind::Wchar,
    )
    .unwrap();
    let t = Trampoline::new(sig).unwrap();
    let value: u32 = 0x10FFFF;
    let args = [Argument::from_ref(&value)];
    let mut result: u32 = 0;
    let slot = ReturnSlot::from_mut(&mut result);
    assert!(unsafe { invoke(&t, &args, &slot) });
    assert_eq!(result, value);
}

extern "C" fn sum7(a: i32, b: i32, c: i32, d: i32, e: i32, f: i32, g: i32) -> i32 {
    a + b + c + d + e + f + g
}

#[test]
fn seven_integers_all_fit_in_registers() {
    let sig = Signature::new(
        "sum7",
        sum7 as *const (),
        vec![TypeKind::I32; 7],
        TypeKind::I32,
    )
    .unwrap();
    let t = Trampoline::new(sig).unwrap();

    let values: [i32; 7] = [1, 2, 3, 4, 5, 6, 7];
    let args: Vec<Argument> = values.iter().map(Argument::from_ref).collect();
    let mut result = 0i32;
    let slot = ReturnSlot::from_mut(&mut result);
    assert!(unsafe { invoke(&t, &args, &slot) });
    assert_eq!(result, 28);

    let zeros = [0i32; 7];
    let args: Vec<Argument> = zeros.iter().map(Argument::from_ref).collect();
    let mut result = -1i32;
    let slot = ReturnSlot::from_mut(&mut result);
    assert!(unsafe { invoke(&t, &args, &slot) });
    assert_eq!(result, 0);
}

extern "C" fn mixed_classes(
    a: i32,
    b: i32,
    c: i32,
    d: i32,
    e: i32,
    f: i32,
    x0: f32,
    x1: f32,
    x2: f32,
    x3: f32,
    x4: f32,
    x5: f32,
    x6: f32,
    x7: f32,
    g: i32,
    y: f64,
) -> i32 {
    let int_sum: i32 = a + b + c + d + e + f + g;
    let float_sum: f32 = x0 + x1 + x2 + x3 + x4 + x5 + x6 + x7;
    int_sum + float_sum as i32 + y as i32
}

#[test]
fn six_ints_eight_floats_then_a_spilled_int_and_double() {
    // Forces both register files to exhaust (6 int regs on SysV/AAPCS's
    // shared-nothing counters, 8 XMM/V regs) and then spill a further
    // integer and a further float to the stack in the same call.
    let sig = Signature::new(
        "mixed_classes",
        mixed_classes as *const (),
        vec![
            TypeKind::I32,
            TypeKind::I32,
            TypeKind::I32,
            TypeKind::I32,
            TypeKind::I32,
            TypeKind::I32,
            TypeKind::F32,
            TypeKind::F32,
            TypeKind::F32,
            TypeKind::F32,
            TypeKind::F32,
            TypeKind::F32,
            TypeKind::F32,
            TypeKind::F32,
            TypeKind::I32,
            TypeKind::F64,
        ],
        TypeKind::I32,
    )
    .unwrap();
    let t = Trampoline::new(sig).unwrap();

    let ints: [i32; 6] = [1, 2, 3, 4, 5, 6];
    let floats: [f32; 8] = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
    let g: i32 = 7;
    let y: f64 = 9.0;

    let mut args: Vec<Argument> = ints.iter().map(Argument::from_ref).collect();
    args.extend(floats.iter().map(Argument::from_ref));
    args.push(Argument::from_ref(&g));
    args.push(Argument::from_ref(&y));

    let mut result = 0i32;
    let slot = ReturnSlot::from_mut(&mut result);
    assert!(unsafe { invoke(&t, &args, &slot) });
    assert_eq!(result, 73);
}

#[test]
fn a_trampoline_can_be_invoked_many_times_and_from_another_thread() {
    let sig = Signature::new(
        "identity_i64",
        identity_i64 as *const (),
        vec![TypeKind::I64],
        TypeKind::I64,
    )
    .unwrap();
    let t = std::sync::Arc::new(Trampoline::new(sig).unwrap());

    let mut handles = Vec::new();
    for n in 0..4i64 {
        let t = t.clone();
        handles.push(std::thread::spawn(move || {
            for i in 0..50i64 {
                let v = n * 1000 + i;
                let args = [Argument::from_ref(&v)];
                let mut result = 0i64;
                let slot = ReturnSlot::from_mut(&mut result);
                assert!(unsafe { invoke(&t, &args, &slot) });
                assert_eq!(result, v);
            }
        }));
    }
    for h in handles {
        h.join().unwrap();
    }
}

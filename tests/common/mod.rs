//! Shared fixture types for the integration tests.
//!
//! - `mytest.Point`: 16-byte payload, `init(x, y)` storing two longs
//! - `mytest.Dummy`: no payload, `item-get` returning `index * 2`
//! - accumulator types: `init(x)` plus a caller-supplied `destroy`

#![allow(dead_code)]

use slotkit::prelude::*;

/// Route `log` output through the test harness.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Positional integer arguments.
pub fn ints(values: &[i64]) -> Args {
    Args::positional(values.iter().map(|v| Value::Int(*v)))
}

// =============================================================================
// Point
// =============================================================================

pub fn point_init(ctx: &mut CallContext<'_>, this: Handle, args: &ParsedArgs) -> Result<(), NativeError> {
    let x: i64 = args.get(0)?;
    let y: i64 = args.get(1)?;
    ctx.write(this, 0, x)?;
    ctx.write(this, 8, y)
}

pub fn point_norm2(ctx: &mut CallContext<'_>, this: Handle, _args: &ParsedArgs) -> Result<Value, NativeError> {
    let x: i64 = ctx.read(this, 0)?;
    let y: i64 = ctx.read(this, 8)?;
    Ok(Value::Int(x * x + y * y))
}

pub fn point_spec() -> TypeSpec {
    TypeSpec::new("mytest.Point")
        .payload_size(16)
        .slot(SlotDef::init(point_init).with_args(ArgSpec::with_keywords("ll", &["x", "y"]).unwrap()))
        .member(MemberDef::new("x", MemberKind::Long, 0))
        .member(MemberDef::new("y", MemberKind::Long, 8))
        .method(MethodDef::noargs("norm2", point_norm2))
}

// =============================================================================
// Dummy
// =============================================================================

pub fn dummy_item(_ctx: &mut CallContext<'_>, _this: Handle, index: isize) -> Result<Value, NativeError> {
    Ok(Value::Int(index as i64 * 2))
}

pub fn dummy_spec() -> TypeSpec {
    TypeSpec::from_slots("mytest.Dummy", 0, [SlotDef::item(dummy_item)])
}

// =============================================================================
// Accumulator
// =============================================================================

pub fn store_x(ctx: &mut CallContext<'_>, this: Handle, args: &ParsedArgs) -> Result<(), NativeError> {
    let x: i64 = args.get(0)?;
    ctx.write(this, 0, x)
}

/// A type whose `init` stores `x` at offset 0 and whose `destroy` is `destroy`.
pub fn accumulator_spec(name: &str, destroy: fn(&mut Payload)) -> TypeSpec {
    TypeSpec::new(name)
        .payload_size(8)
        .slot(SlotDef::init(store_x).with_args(ArgSpec::with_keywords("l", &["x"]).unwrap()))
        .slot(SlotDef::destroy(destroy))
        .member(MemberDef::new("x", MemberKind::Long, 0).readonly())
}

pub fn deferred_context() -> Context {
    Context::with_info(HeapCreateInfo {
        reclaim_policy: Some(ReclaimPolicy::Deferred),
        gc_threshold: Some(0),
        ..Default::default()
    })
}

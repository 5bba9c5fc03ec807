// vesper-vm - Host-provided native functions
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Native functions: clock, sleep

use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::error::{Result, RuntimeError};
use crate::value::Value;
use crate::vm::Vm;

/// Bind the standard natives into the VM's globals.
pub fn register_natives(vm: &mut Vm) {
    vm.define_native("clock", 0, native_clock);
    vm.define_native("sleep", 1, native_sleep);
}

/// (clock) - seconds since the Unix epoch, as a number
fn native_clock(_args: &[Value]) -> Result<Value> {
    let duration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| RuntimeError::internal(format!("clock: {}", e)))?;
    Ok(Value::Number(duration.as_secs_f64()))
}

/// (sleep seconds) - block the calling thread for that many seconds
fn native_sleep(args: &[Value]) -> Result<Value> {
    // args.len() matches the declared arity; the engine checks before invoking.
    let seconds = match &args[0] {
        Value::Number(n) if *n >= 0.0 && n.is_finite() => *n,
        other => {
            return Err(RuntimeError::type_error(
                "non-negative number",
                other.type_name(),
            ));
        }
    };
    thread::sleep(Duration::from_secs_f64(seconds));
    Ok(Value::Nil)
}

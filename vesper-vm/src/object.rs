// vesper-vm - Heap objects
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Heap-allocated runtime objects: functions, native functions, closures and
//! the upvalue cells that let closures outlive the frames they captured from.

use std::cell::RefCell;
use std::rc::Rc;

use crate::chunk::Chunk;
use crate::error::Result;
use crate::value::Value;

/// A compiled bytecode function.
///
/// Immutable after construction. The function owns its chunk; dropping the
/// function drops the chunk.
#[derive(Debug)]
pub struct Function {
    /// Function name, copied at construction (the synthetic top-level
    /// function is named `script`).
    pub name: String,
    /// Number of parameters.
    pub arity: u8,
    /// Number of upvalues a `Closure` instruction over this function reads.
    pub upvalue_count: u8,
    /// The function body.
    pub chunk: Chunk,
}

impl Function {
    /// Create a function with no upvalues.
    pub fn new(name: impl Into<String>, arity: u8, chunk: Chunk) -> Self {
        Self::with_upvalues(name, arity, 0, chunk)
    }

    /// Create a function declaring `upvalue_count` captured variables.
    pub fn with_upvalues(
        name: impl Into<String>,
        arity: u8,
        upvalue_count: u8,
        chunk: Chunk,
    ) -> Self {
        Self {
            name: name.into(),
            arity,
            upvalue_count,
            chunk,
        }
    }
}

/// Signature of a host-provided callable.
///
/// The engine guarantees `args.len()` equals the declared arity before
/// invoking; natives validate argument types themselves.
pub type NativeFn = fn(&[Value]) -> Result<Value>;

/// A host-provided callable.
#[derive(Debug)]
pub struct NativeFunction {
    /// Name the native is bound under, copied at construction.
    pub name: String,
    /// Number of arguments the host callable expects.
    pub arity: u8,
    /// The host callable.
    pub function: NativeFn,
}

impl NativeFunction {
    /// Create a native function record.
    pub fn new(name: impl Into<String>, function: NativeFn, arity: u8) -> Self {
        Self {
            name: name.into(),
            arity,
            function,
        }
    }
}

/// A function paired with its captured upvalues.
///
/// Closures share their function; many closures may wrap the same
/// [`Function`].
#[derive(Debug)]
pub struct Closure {
    /// The shared function.
    pub function: Rc<Function>,
    /// Captured cells, in declaration order.
    pub upvalues: Vec<Rc<UpvalueCell>>,
}

impl Closure {
    /// Create a closure over `function` with the given captures.
    pub fn new(function: Rc<Function>, upvalues: Vec<Rc<UpvalueCell>>) -> Self {
        Self { function, upvalues }
    }
}

#[derive(Debug)]
enum UpvalueState {
    /// Points at an absolute operand-stack slot while the enclosing
    /// activation is live.
    Open(usize),
    /// Holds the value itself once the captured frame has unwound.
    Closed(Value),
}

/// The indirection cell behind a captured variable.
///
/// Cells are `Rc`-shared: every closure capturing the same slot holds the
/// same cell, so writes through one closure are visible through the others,
/// before and after closing.
#[derive(Debug)]
pub struct UpvalueCell {
    state: RefCell<UpvalueState>,
}

impl UpvalueCell {
    /// Create a cell pointing at a live stack slot.
    pub fn open(slot: usize) -> Self {
        Self {
            state: RefCell::new(UpvalueState::Open(slot)),
        }
    }

    /// The stack slot this cell points at, or `None` once closed.
    pub fn slot(&self) -> Option<usize> {
        match *self.state.borrow() {
            UpvalueState::Open(slot) => Some(slot),
            UpvalueState::Closed(_) => None,
        }
    }

    /// Whether this cell is still open at exactly `slot`.
    pub fn is_open_at(&self, slot: usize) -> bool {
        self.slot() == Some(slot)
    }

    /// The captured value, or `None` while still open.
    pub fn closed_value(&self) -> Option<Value> {
        match &*self.state.borrow() {
            UpvalueState::Open(_) => None,
            UpvalueState::Closed(value) => Some(value.clone()),
        }
    }

    /// Store `value` in the cell, closing it if it was open.
    pub fn close(&self, value: Value) {
        *self.state.borrow_mut() = UpvalueState::Closed(value);
    }
}

// vesper-vm - Values, heap objects and execution engine for the Vesper virtual machine
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! # vesper-vm
//!
//! The Vesper execution engine. Programs are assembled by hand into
//! [`Chunk`]s through the chunk-building API, then handed to a [`Vm`] which
//! wraps the top-level chunk in a synthetic script function and runs it to
//! completion.
//!
//! # Quick Start
//!
//! ```
//! use vesper_bytecode::OpCode;
//! use vesper_vm::{Chunk, Interner, Interpretation, Value, Vm};
//!
//! let strings = Interner::new();
//! let mut chunk = Chunk::new();
//! let two = chunk.add_constant(Value::Number(2.0)).unwrap();
//! let three = chunk.add_constant(Value::Number(3.0)).unwrap();
//! chunk.write_opcode(OpCode::Constant, 1);
//! chunk.write_byte(two, 1);
//! chunk.write_opcode(OpCode::Constant, 1);
//! chunk.write_byte(three, 1);
//! chunk.write_opcode(OpCode::Add, 1);
//! chunk.write_opcode(OpCode::Return, 1);
//!
//! let mut vm = Vm::new(chunk, strings);
//! assert_eq!(vm.interpret(), Interpretation::Ok);
//! assert_eq!(vm.stack(), &[Value::Number(5.0)]);
//! ```

pub mod chunk;
pub mod error;
pub mod intern;
pub mod natives;
pub mod object;
pub mod value;
pub mod vm;

pub use chunk::Chunk;
pub use error::{Result, RuntimeError};
pub use intern::{Interner, StrRef};
pub use natives::register_natives;
pub use object::{Closure, Function, NativeFn, NativeFunction, UpvalueCell};
pub use value::Value;
pub use vm::{Interpretation, Vm, VmOptions};

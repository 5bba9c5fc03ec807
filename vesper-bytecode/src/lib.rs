// vesper-bytecode - Bytecode encoding primitives for the Vesper virtual machine
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! # vesper-bytecode
//!
//! Value-independent bytecode encoding primitives for the Vesper virtual
//! machine: the append-only instruction byte buffer, the one-byte opcode set,
//! and the run-length-encoded line table used for disassembly and runtime
//! diagnostics.

pub mod buffer;
pub mod lines;
pub mod opcode;

pub use buffer::ByteBuffer;
pub use lines::LineRuns;
pub use opcode::OpCode;

// vesper - Hand-assembled example programs
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Example programs assembled by hand through the chunk-building API.
//!
//! Each builder is a producer in the machine's sense: it registers its
//! constants (interning strings into the pool the VM will own), writes
//! opcodes and operands with source-line attribution, and hand-computes
//! jump offsets.

use std::rc::Rc;

use vesper_bytecode::OpCode;
use vesper_vm::{Chunk, Function, Interner, Value};

/// A selectable example program.
pub struct Program {
    pub name: &'static str,
    pub about: &'static str,
    build: fn(&mut Interner) -> Chunk,
}

impl Program {
    /// Assemble the program's top-level chunk against the given pool.
    pub fn assemble(&self, strings: &mut Interner) -> Chunk {
        (self.build)(strings)
    }
}

/// All example programs, selected by 1-based index from the CLI.
pub const PROGRAMS: &[Program] = &[
    Program {
        name: "arithmetic",
        about: "(3.4 + 2.6) * 2.0",
        build: build_arithmetic,
    },
    Program {
        name: "booleans",
        about: "strict boolean and/or/not chains",
        build: build_booleans,
    },
    Program {
        name: "globals",
        about: "define and read back a global",
        build: build_globals,
    },
    Program {
        name: "conditional",
        about: "if/else over JumpIfFalse",
        build: build_conditional,
    },
    Program {
        name: "countdown",
        about: "while loop with a local counter",
        build: build_countdown,
    },
    Program {
        name: "factorial",
        about: "recursive fac(5) through call frames",
        build: build_factorial,
    },
    Program {
        name: "counter",
        about: "a closure counting through a captured upvalue",
        build: build_counter,
    },
    Program {
        name: "timing",
        about: "clock/sleep natives measuring one second",
        build: build_timing,
    },
];

/// print (3.4 + 2.6) * 2.0
fn build_arithmetic(_strings: &mut Interner) -> Chunk {
    let mut chunk = Chunk::new();
    let a = constant(&mut chunk, Value::Number(3.4));
    let b = constant(&mut chunk, Value::Number(2.6));
    let two = constant(&mut chunk, Value::Number(2.0));

    chunk.write_opcode(OpCode::Constant, 1);
    chunk.write_byte(a, 1);
    chunk.write_opcode(OpCode::Constant, 1);
    chunk.write_byte(b, 1);
    chunk.write_opcode(OpCode::Add, 1);
    chunk.write_opcode(OpCode::Constant, 1);
    chunk.write_byte(two, 1);
    chunk.write_opcode(OpCode::Multiply, 1);
    chunk.write_opcode(OpCode::Print, 1);
    chunk.write_opcode(OpCode::Return, 2);
    chunk
}

/// print true and false; print false or true; print not true
fn build_booleans(_strings: &mut Interner) -> Chunk {
    let mut chunk = Chunk::new();
    chunk.write_opcode(OpCode::True, 1);
    chunk.write_opcode(OpCode::False, 1);
    chunk.write_opcode(OpCode::And, 1);
    chunk.write_opcode(OpCode::Print, 1);
    chunk.write_opcode(OpCode::False, 2);
    chunk.write_opcode(OpCode::True, 2);
    chunk.write_opcode(OpCode::Or, 2);
    chunk.write_opcode(OpCode::Print, 2);
    chunk.write_opcode(OpCode::True, 3);
    chunk.write_opcode(OpCode::Not, 3);
    chunk.write_opcode(OpCode::Print, 3);
    chunk.write_opcode(OpCode::Return, 4);
    chunk
}

/// myvar = 2.71828; print myvar
fn build_globals(strings: &mut Interner) -> Chunk {
    let mut chunk = Chunk::new();
    let name = constant(&mut chunk, Value::Str(strings.intern("myvar")));
    let e = constant(&mut chunk, Value::Number(2.71828));

    chunk.write_opcode(OpCode::Constant, 1);
    chunk.write_byte(e, 1);
    chunk.write_opcode(OpCode::Constant, 1);
    chunk.write_byte(name, 1);
    chunk.write_opcode(OpCode::DefineGlobal, 1);
    chunk.write_opcode(OpCode::Constant, 2);
    chunk.write_byte(name, 2);
    chunk.write_opcode(OpCode::GetGlobal, 2);
    chunk.write_opcode(OpCode::Print, 2);
    chunk.write_opcode(OpCode::Return, 3);
    chunk
}

/// if false { print "then" } else { print "else" }
fn build_conditional(strings: &mut Interner) -> Chunk {
    let mut chunk = Chunk::new();
    let then_s = constant(&mut chunk, Value::Str(strings.intern("then")));
    let else_s = constant(&mut chunk, Value::Str(strings.intern("else")));

    chunk.write_opcode(OpCode::False, 1); // 0
    chunk.write_opcode(OpCode::JumpIfFalse, 1); // 1, -> 11 (else)
    chunk.write_u16(7, 1);
    chunk.write_opcode(OpCode::Pop, 1); // 4
    chunk.write_opcode(OpCode::Constant, 2); // 5
    chunk.write_byte(then_s, 2);
    chunk.write_opcode(OpCode::Print, 2); // 7
    chunk.write_opcode(OpCode::Jump, 2); // 8, -> 15 (end)
    chunk.write_u16(4, 2);
    chunk.write_opcode(OpCode::Pop, 3); // 11
    chunk.write_opcode(OpCode::Constant, 3); // 12
    chunk.write_byte(else_s, 3);
    chunk.write_opcode(OpCode::Print, 3); // 14
    chunk.write_opcode(OpCode::Return, 4); // 15
    chunk
}

/// a = 3; while (a > 0) { a = a - 1; print a }
fn build_countdown(_strings: &mut Interner) -> Chunk {
    let mut chunk = Chunk::new();
    let three = constant(&mut chunk, Value::Number(3.0));
    let zero = constant(&mut chunk, Value::Number(0.0));
    let one = constant(&mut chunk, Value::Number(1.0));

    chunk.write_opcode(OpCode::Nil, 1); // 0: slot 0, the script callable
    chunk.write_opcode(OpCode::Constant, 1); // 1: slot 1, a = 3
    chunk.write_byte(three, 1);
    chunk.write_opcode(OpCode::GetLocal, 2); // 3: loop start
    chunk.write_byte(1, 2);
    chunk.write_opcode(OpCode::Constant, 2); // 5
    chunk.write_byte(zero, 2);
    chunk.write_opcode(OpCode::Greater, 2); // 7
    chunk.write_opcode(OpCode::JumpIfFalse, 2); // 8, -> 26 (exit)
    chunk.write_u16(15, 2);
    chunk.write_opcode(OpCode::Pop, 2); // 11
    chunk.write_opcode(OpCode::GetLocal, 3); // 12: a = a - 1
    chunk.write_byte(1, 3);
    chunk.write_opcode(OpCode::Constant, 3); // 14
    chunk.write_byte(one, 3);
    chunk.write_opcode(OpCode::Subtract, 3); // 16
    chunk.write_opcode(OpCode::SetLocal, 3); // 17
    chunk.write_byte(1, 3);
    chunk.write_opcode(OpCode::Pop, 3); // 19
    chunk.write_opcode(OpCode::GetLocal, 4); // 20: print a
    chunk.write_byte(1, 4);
    chunk.write_opcode(OpCode::Print, 4); // 22
    chunk.write_opcode(OpCode::Loop, 5); // 23, back to 3
    chunk.write_u16(23, 5);
    chunk.write_opcode(OpCode::Pop, 6); // 26: the false condition
    chunk.write_opcode(OpCode::Return, 6); // 27
    chunk
}

/// fac(n): if n == 0 { 1 } else { n * fac(n - 1) }
fn factorial_body() -> Chunk {
    let mut chunk = Chunk::new();
    let zero = constant(&mut chunk, Value::Number(0.0));
    let one = constant(&mut chunk, Value::Number(1.0));

    chunk.write_opcode(OpCode::GetLocal, 1); // 0: n
    chunk.write_byte(1, 1);
    chunk.write_opcode(OpCode::Constant, 1); // 2
    chunk.write_byte(zero, 1);
    chunk.write_opcode(OpCode::Equal, 1); // 4
    chunk.write_opcode(OpCode::JumpIfFalse, 1); // 5, -> 12 (else)
    chunk.write_u16(4, 1);
    chunk.write_opcode(OpCode::Pop, 1); // 8
    chunk.write_opcode(OpCode::Constant, 1); // 9: base case 1
    chunk.write_byte(one, 1);
    chunk.write_opcode(OpCode::Return, 1); // 11
    chunk.write_opcode(OpCode::Pop, 2); // 12
    chunk.write_opcode(OpCode::GetLocal, 2); // 13: n
    chunk.write_byte(1, 2);
    chunk.write_opcode(OpCode::GetLocal, 2); // 15: slot 0 is fac itself
    chunk.write_byte(0, 2);
    chunk.write_opcode(OpCode::GetLocal, 2); // 17: n
    chunk.write_byte(1, 2);
    chunk.write_opcode(OpCode::Constant, 2); // 19
    chunk.write_byte(one, 2);
    chunk.write_opcode(OpCode::Subtract, 2); // 21: n - 1
    chunk.write_opcode(OpCode::Call, 2); // 22: fac(n - 1)
    chunk.write_byte(1, 2);
    chunk.write_opcode(OpCode::Multiply, 2); // 24
    chunk.write_opcode(OpCode::Return, 2); // 25
    chunk
}

/// print fac(5)
fn build_factorial(_strings: &mut Interner) -> Chunk {
    let mut chunk = Chunk::new();
    let fac = Function::new("fac", 1, factorial_body());
    let fac = constant(&mut chunk, Value::Function(Rc::new(fac)));
    let five = constant(&mut chunk, Value::Number(5.0));

    chunk.write_opcode(OpCode::Nil, 1); // slot 0
    chunk.write_opcode(OpCode::Constant, 2); // slot 1: fac
    chunk.write_byte(fac, 2);
    chunk.write_opcode(OpCode::Constant, 2);
    chunk.write_byte(five, 2);
    chunk.write_opcode(OpCode::Call, 2);
    chunk.write_byte(1, 2);
    chunk.write_opcode(OpCode::Print, 2);
    chunk.write_opcode(OpCode::Return, 3);
    chunk
}

/// The increment body shared by the counter example: one captured upvalue.
fn increment_body() -> Chunk {
    let mut chunk = Chunk::new();
    let one = constant(&mut chunk, Value::Number(1.0));

    chunk.write_opcode(OpCode::GetUpvalue, 1);
    chunk.write_byte(0, 1);
    chunk.write_opcode(OpCode::Constant, 1);
    chunk.write_byte(one, 1);
    chunk.write_opcode(OpCode::Add, 1);
    chunk.write_opcode(OpCode::SetUpvalue, 1);
    chunk.write_byte(0, 1);
    chunk.write_opcode(OpCode::Return, 1);
    chunk
}

/// make_counter(): count = 0; return fn() { count = count + 1 }
fn counter_maker_body() -> Chunk {
    let mut chunk = Chunk::new();
    let zero = constant(&mut chunk, Value::Number(0.0));
    let inc = Function::with_upvalues("increment", 0, 1, increment_body());
    let inc = constant(&mut chunk, Value::Function(Rc::new(inc)));

    chunk.write_opcode(OpCode::Constant, 1); // slot 1: count = 0
    chunk.write_byte(zero, 1);
    chunk.write_opcode(OpCode::Closure, 2); // capture count
    chunk.write_byte(inc, 2);
    chunk.write_byte(1, 2); // is_local
    chunk.write_byte(1, 2); // slot 1
    chunk.write_opcode(OpCode::Return, 2);
    chunk
}

/// tick = make_counter(); print tick(); print tick()
fn build_counter(_strings: &mut Interner) -> Chunk {
    let mut chunk = Chunk::new();
    let maker = Function::new("make_counter", 0, counter_maker_body());
    let maker = constant(&mut chunk, Value::Function(Rc::new(maker)));

    chunk.write_opcode(OpCode::Nil, 1); // slot 0
    chunk.write_opcode(OpCode::Constant, 1); // slot 1: the counter closure
    chunk.write_byte(maker, 1);
    chunk.write_opcode(OpCode::Call, 1);
    chunk.write_byte(0, 1);
    for line in [2, 3] {
        chunk.write_opcode(OpCode::GetLocal, line);
        chunk.write_byte(1, line);
        chunk.write_opcode(OpCode::Call, line);
        chunk.write_byte(0, line);
        chunk.write_opcode(OpCode::Print, line);
    }
    chunk.write_opcode(OpCode::Return, 4);
    chunk
}

/// start = clock(); sleep(1); print clock() - start
fn build_timing(strings: &mut Interner) -> Chunk {
    let mut chunk = Chunk::new();
    let clock = constant(&mut chunk, Value::Str(strings.intern("clock")));
    let sleep = constant(&mut chunk, Value::Str(strings.intern("sleep")));
    let one = constant(&mut chunk, Value::Number(1.0));

    chunk.write_opcode(OpCode::Nil, 1); // slot 0
    chunk.write_opcode(OpCode::Constant, 1); // slot 1: start = clock()
    chunk.write_byte(clock, 1);
    chunk.write_opcode(OpCode::GetGlobal, 1);
    chunk.write_opcode(OpCode::Call, 1);
    chunk.write_byte(0, 1);
    chunk.write_opcode(OpCode::Constant, 2); // sleep(1)
    chunk.write_byte(sleep, 2);
    chunk.write_opcode(OpCode::GetGlobal, 2);
    chunk.write_opcode(OpCode::Constant, 2);
    chunk.write_byte(one, 2);
    chunk.write_opcode(OpCode::Call, 2);
    chunk.write_byte(1, 2);
    chunk.write_opcode(OpCode::Pop, 2);
    chunk.write_opcode(OpCode::Constant, 3); // print clock() - start
    chunk.write_byte(clock, 3);
    chunk.write_opcode(OpCode::GetGlobal, 3);
    chunk.write_opcode(OpCode::Call, 3);
    chunk.write_byte(0, 3);
    chunk.write_opcode(OpCode::GetLocal, 3);
    chunk.write_byte(1, 3);
    chunk.write_opcode(OpCode::Subtract, 3);
    chunk.write_opcode(OpCode::Print, 3);
    chunk.write_opcode(OpCode::Return, 4);
    chunk
}

fn constant(chunk: &mut Chunk, value: Value) -> u8 {
    chunk
        .add_constant(value)
        .expect("example constant pool overflow")
}

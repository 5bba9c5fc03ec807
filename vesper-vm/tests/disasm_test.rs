// vesper-vm - Disassembler tests
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! The disassembler must walk a chunk from offset 0 to the end in exactly
//! the steps the instructions were emitted in, with no gaps, including the
//! variable-width `Closure` form.

mod common;
use common::*;

#[test]
fn walk_covers_every_instruction_exactly_once() {
    let mut strings = Interner::new();

    let two_captures = {
        let mut body = Assembler::new(&mut strings);
        body.op(OpCode::GetUpvalue)
            .byte(0)
            .op(OpCode::GetUpvalue)
            .byte(1)
            .op(OpCode::Add)
            .op(OpCode::Return);
        Function::with_upvalues("adder", 0, 2, body.finish())
    };

    let mut asm = Assembler::new(&mut strings);
    let n = asm.number(1.5);
    let name = asm.string("g");
    let f = asm.function(two_captures);

    // Emit one instruction at a time, recording where each one ends.
    let mut boundaries = vec![0];
    for simple in [
        OpCode::Nil,
        OpCode::True,
        OpCode::False,
        OpCode::Pop,
        OpCode::Add,
        OpCode::Subtract,
        OpCode::Multiply,
        OpCode::Divide,
        OpCode::And,
        OpCode::Or,
        OpCode::Not,
        OpCode::Negate,
        OpCode::Equal,
        OpCode::Less,
        OpCode::Greater,
        OpCode::Print,
    ] {
        asm.op(simple);
        boundaries.push(asm.chunk.current_offset());
    }

    asm.constant(n);
    boundaries.push(asm.chunk.current_offset());
    asm.constant(name);
    boundaries.push(asm.chunk.current_offset());
    asm.op(OpCode::DefineGlobal);
    boundaries.push(asm.chunk.current_offset());
    asm.op(OpCode::SetGlobal);
    boundaries.push(asm.chunk.current_offset());
    asm.op(OpCode::GetGlobal);
    boundaries.push(asm.chunk.current_offset());
    asm.op(OpCode::SetLocal).byte(1);
    boundaries.push(asm.chunk.current_offset());
    asm.op(OpCode::GetLocal).byte(1);
    boundaries.push(asm.chunk.current_offset());
    asm.op(OpCode::Jump).u16(3);
    boundaries.push(asm.chunk.current_offset());
    asm.op(OpCode::JumpIfFalse).u16(7);
    boundaries.push(asm.chunk.current_offset());
    asm.op(OpCode::Loop).u16(9);
    boundaries.push(asm.chunk.current_offset());
    asm.op(OpCode::Call).byte(2);
    boundaries.push(asm.chunk.current_offset());
    asm.op(OpCode::Closure)
        .byte(f)
        .byte(1)
        .byte(1)
        .byte(0)
        .byte(0);
    boundaries.push(asm.chunk.current_offset());
    asm.op(OpCode::GetUpvalue).byte(0);
    boundaries.push(asm.chunk.current_offset());
    asm.op(OpCode::SetUpvalue).byte(0);
    boundaries.push(asm.chunk.current_offset());
    asm.op(OpCode::Return);
    boundaries.push(asm.chunk.current_offset());

    let chunk = asm.finish();
    assert_eq!(*boundaries.last().unwrap(), chunk.code.len());

    let mut walked = vec![0];
    let mut offset = 0;
    while offset < chunk.code.len() {
        offset = chunk.disassemble_instruction(offset);
        walked.push(offset);
    }

    assert_eq!(walked, boundaries);
}

#[test]
fn unknown_bytes_advance_the_walk() {
    let mut strings = Interner::new();
    let mut asm = Assembler::new(&mut strings);
    asm.byte(0xfe);
    asm.op(OpCode::Nil);

    let chunk = asm.finish();
    assert_eq!(chunk.disassemble_instruction(0), 1);
    assert_eq!(chunk.disassemble_instruction(1), 2);
}

#[test]
fn disassemble_prints_without_panicking() {
    let mut strings = Interner::new();
    let mut asm = Assembler::new(&mut strings);
    let n = asm.number(42.0);
    asm.at_line(1).constant(n);
    asm.at_line(1).op(OpCode::Print);
    asm.at_line(2).op(OpCode::Return);

    asm.finish().disassemble("smoke");
}

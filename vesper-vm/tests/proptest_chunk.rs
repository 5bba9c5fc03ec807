// vesper-vm - Property-based tests for chunks and the disassembler
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Property-based tests for chunk assembly.
//!
//! Tests the following properties:
//! - The line table always mirrors the code length
//! - Every instruction byte resolves to the line it was written under
//! - The disassembler walk visits exactly the emitted instruction
//!   boundaries, with no gaps, for arbitrary instruction mixes

use std::rc::Rc;

use proptest::prelude::*;
use vesper_bytecode::OpCode;
use vesper_vm::{Chunk, Function, Value};

/// An instruction to emit, paired with the line to attribute it to.
#[derive(Debug, Clone)]
enum Instr {
    Simple(OpCode),
    Byte(OpCode, u8),
    Jump(OpCode, u16),
    /// Closure over the function constant with this many captures (0..=3).
    Closure(u8),
}

const SIMPLE_OPS: &[OpCode] = &[
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
    OpCode::DefineGlobal,
    OpCode::SetGlobal,
    OpCode::GetGlobal,
    OpCode::Return,
];

const BYTE_OPS: &[OpCode] = &[
    OpCode::Constant,
    OpCode::SetLocal,
    OpCode::GetLocal,
    OpCode::Call,
    OpCode::GetUpvalue,
    OpCode::SetUpvalue,
];

const JUMP_OPS: &[OpCode] = &[OpCode::Jump, OpCode::JumpIfFalse, OpCode::Loop];

fn arb_instr() -> impl Strategy<Value = Instr> {
    prop_oneof![
        prop::sample::select(SIMPLE_OPS).prop_map(Instr::Simple),
        (prop::sample::select(BYTE_OPS), any::<u8>()).prop_map(|(op, b)| Instr::Byte(op, b)),
        (prop::sample::select(JUMP_OPS), any::<u16>()).prop_map(|(op, o)| Instr::Jump(op, o)),
        (0u8..=3).prop_map(Instr::Closure),
    ]
}

fn arb_program() -> impl Strategy<Value = Vec<(Instr, u32)>> {
    prop::collection::vec((arb_instr(), 1u32..100), 0..60)
}

/// Emit a program into a chunk, returning the expected instruction
/// boundaries (offset after each instruction) and each instruction's
/// (start offset, line).
fn emit(program: &[(Instr, u32)]) -> (Chunk, Vec<usize>, Vec<(usize, u32)>) {
    let mut chunk = Chunk::new();
    // Pool slot 0 holds a number so Constant operands always resolve;
    // slots 1..=4 hold functions declaring 0..=3 upvalues for Closure.
    chunk.add_constant(Value::Number(1.0)).unwrap();
    for captures in 0..=3u8 {
        let function = Function::with_upvalues("f", 0, captures, Chunk::new());
        chunk.add_constant(Value::Function(Rc::new(function))).unwrap();
    }

    let mut boundaries = Vec::new();
    let mut starts = Vec::new();
    for (instr, line) in program {
        starts.push((chunk.current_offset(), *line));
        match instr {
            Instr::Simple(op) => chunk.write_opcode(*op, *line),
            Instr::Byte(op, operand) => {
                chunk.write_opcode(*op, *line);
                // Constant must reference the number in slot 0.
                let operand = if *op == OpCode::Constant { 0 } else { *operand };
                chunk.write_byte(operand, *line);
            }
            Instr::Jump(op, offset) => {
                chunk.write_opcode(*op, *line);
                chunk.write_u16(*offset, *line);
            }
            Instr::Closure(captures) => {
                chunk.write_opcode(OpCode::Closure, *line);
                chunk.write_byte(1 + captures, *line);
                for i in 0..*captures {
                    chunk.write_byte(u8::from(i % 2 == 0), *line);
                    chunk.write_byte(i, *line);
                }
            }
        }
        boundaries.push(chunk.current_offset());
    }
    (chunk, boundaries, starts)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(150))]

    #[test]
    fn line_table_mirrors_code_length(program in arb_program()) {
        let (chunk, _, _) = emit(&program);
        prop_assert_eq!(chunk.lines.total_count(), chunk.code.len());
    }

    #[test]
    fn every_byte_resolves_to_its_line(program in arb_program()) {
        let (chunk, boundaries, starts) = emit(&program);
        for ((start, line), end) in starts.iter().zip(boundaries.iter()) {
            for offset in *start..*end {
                prop_assert_eq!(chunk.lines.line_at(offset), Some(*line));
            }
        }
    }

    #[test]
    fn disassembler_walk_matches_emission(program in arb_program()) {
        let (chunk, boundaries, _) = emit(&program);
        let mut offset = 0;
        let mut walked = Vec::new();
        while offset < chunk.code.len() {
            offset = chunk.disassemble_instruction(offset);
            walked.push(offset);
        }
        prop_assert_eq!(walked, boundaries);
    }
}

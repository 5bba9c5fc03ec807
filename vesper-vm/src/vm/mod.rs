// vesper-vm - The execution engine
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! The stack-based execution engine.
//!
//! A [`Vm`] wraps the top-level chunk in a synthetic `script` function of
//! arity 0 and drives a call-frame-based dispatch loop until the bottom
//! frame returns or an instruction fails. There is no in-VM recovery: a
//! program runs to completion or faults once, and the operand stack and
//! globals stay observable afterwards for diagnostics.

pub mod frame;

use std::collections::HashMap;
use std::rc::Rc;
use std::thread;
use std::time::Duration;

use vesper_bytecode::OpCode;

use crate::chunk::Chunk;
use crate::error::{Result, RuntimeError};
use crate::intern::{Interner, StrRef};
use crate::object::{Closure, Function, NativeFn, NativeFunction, UpvalueCell};
use crate::value::Value;

pub use frame::CallFrame;

/// Result of running a program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpretation {
    /// The bottom frame returned.
    Ok,
    /// Reserved for a front-end compiler; never produced by the engine.
    CompileError,
    /// An instruction faulted; the diagnostic has been reported.
    RuntimeError,
}

/// Run-time configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct VmOptions {
    /// Dump the operand stack and the next instruction before every step.
    pub trace: bool,
    /// Sleep one second between steps, for watching a trace unfold.
    pub slow: bool,
}

#[derive(Debug)]
enum Output {
    Stdout,
    Capture(String),
}

/// The Vesper virtual machine.
///
/// The operand stack lives directly on the machine: slot 0 at the bottom,
/// temporaries on top. Frames address it through their `slots_base`, and
/// every slot access goes through the helpers below so underflow surfaces
/// as a [`RuntimeError`] rather than a panic.
pub struct Vm {
    stack: Vec<Value>,
    frames: Vec<CallFrame>,
    globals: HashMap<StrRef, Value>,
    open_upvalues: Vec<Rc<UpvalueCell>>,
    interner: Interner,
    script: Rc<Function>,
    options: VmOptions,
    output: Output,
    last_error: Option<RuntimeError>,
}

impl Vm {
    /// Create a VM over a top-level chunk and the string pool its constants
    /// were interned into.
    pub fn new(chunk: Chunk, interner: Interner) -> Self {
        Self::with_options(chunk, interner, VmOptions::default())
    }

    /// Create a VM with explicit run-time options.
    pub fn with_options(chunk: Chunk, interner: Interner, options: VmOptions) -> Self {
        Self {
            stack: Vec::with_capacity(256),
            frames: Vec::new(),
            globals: HashMap::new(),
            open_upvalues: Vec::new(),
            interner,
            script: Rc::new(Function::new("script", 0, chunk)),
            options,
            output: Output::Stdout,
            last_error: None,
        }
    }

    /// Bind a host callable as a global.
    pub fn define_native(&mut self, name: &str, arity: u8, function: NativeFn) {
        let handle = self.interner.intern(name);
        let native = NativeFunction::new(name, function, arity);
        self.globals.insert(handle, Value::Native(Rc::new(native)));
    }

    /// Redirect `Print` into an in-memory buffer readable through
    /// [`Vm::captured_output`].
    pub fn capture_output(&mut self) {
        self.output = Output::Capture(String::new());
    }

    /// Everything printed since [`Vm::capture_output`], empty otherwise.
    pub fn captured_output(&self) -> &str {
        match &self.output {
            Output::Capture(buf) => buf,
            Output::Stdout => "",
        }
    }

    /// The operand stack, bottom to top.
    ///
    /// After an `Ok` interpretation this is the pre-return stack: the bottom
    /// frame's `Return` stops execution without consuming it, so the return
    /// value (when the program left one) is still on top.
    pub fn stack(&self) -> &[Value] {
        &self.stack
    }

    /// Look up a global by name contents.
    pub fn global(&self, name: &str) -> Option<Value> {
        self.globals
            .iter()
            .find(|(key, _)| key.as_str() == name)
            .map(|(_, value)| value.clone())
    }

    /// The error that ended the last interpretation, if any.
    pub fn last_error(&self) -> Option<&RuntimeError> {
        self.last_error.as_ref()
    }

    /// Run the program to completion.
    ///
    /// Pushes the bottom frame over the synthetic `script` function and
    /// dispatches until that frame returns (`Ok`) or an instruction faults
    /// (`RuntimeError`, with a one-line diagnostic on stderr). Calling
    /// `interpret` again restarts from a fresh stack; globals and the
    /// string pool persist.
    pub fn interpret(&mut self) -> Interpretation {
        self.stack.clear();
        self.frames.clear();
        self.open_upvalues.clear();
        self.last_error = None;
        self.frames
            .push(CallFrame::new(Rc::clone(&self.script), 0));

        match self.run() {
            Ok(()) => Interpretation::Ok,
            Err(error) => {
                self.report(&error);
                self.last_error = Some(error);
                Interpretation::RuntimeError
            }
        }
    }

    fn run(&mut self) -> Result<()> {
        loop {
            if self.options.trace {
                self.trace_step();
            }
            if self.options.slow {
                thread::sleep(Duration::from_secs(1));
            }

            let byte = self.read_byte()?;
            let op = OpCode::from_byte(byte).ok_or(RuntimeError::UnknownOpcode(byte))?;

            match op {
                OpCode::Nil => self.stack.push(Value::Nil),
                OpCode::True => self.stack.push(Value::Bool(true)),
                OpCode::False => self.stack.push(Value::Bool(false)),
                OpCode::Constant => {
                    let idx = self.read_byte()?;
                    let value = self.constant(idx)?;
                    self.stack.push(value);
                }
                OpCode::Pop => {
                    self.pop()?;
                }

                OpCode::Add => {
                    let right = self.pop()?;
                    let left = self.pop()?;
                    let sum = left.add(&right, &mut self.interner)?;
                    self.stack.push(sum);
                }
                OpCode::Subtract => self.binary_op(Value::sub)?,
                OpCode::Multiply => self.binary_op(Value::mul)?,
                OpCode::Divide => self.binary_op(Value::div)?,
                OpCode::And => self.binary_op(Value::and)?,
                OpCode::Or => self.binary_op(Value::or)?,
                OpCode::Less => self.binary_op(Value::lt)?,
                OpCode::Greater => self.binary_op(Value::gt)?,
                OpCode::Equal => {
                    let right = self.pop()?;
                    let left = self.pop()?;
                    self.stack.push(Value::Bool(left.equal(&right)));
                }
                OpCode::Not => {
                    let value = self.pop()?;
                    self.stack.push(value.not()?);
                }
                OpCode::Negate => {
                    let value = self.pop()?;
                    self.stack.push(value.negate()?);
                }

                OpCode::Print => {
                    let value = self.pop()?;
                    self.print_value(&value);
                }

                OpCode::DefineGlobal | OpCode::SetGlobal => {
                    let name = self.pop_name()?;
                    let value = self.pop()?;
                    self.globals.insert(name, value);
                }
                OpCode::GetGlobal => {
                    let name = self.pop_name()?;
                    let value = self
                        .globals
                        .get(&name)
                        .cloned()
                        .ok_or_else(|| RuntimeError::unbound_global(name.as_str()))?;
                    self.stack.push(value);
                }

                OpCode::SetLocal => {
                    let slot = self.local_slot()?;
                    let value = self.peek(0)?;
                    self.write_slot(slot, value)?;
                }
                OpCode::GetLocal => {
                    let slot = self.local_slot()?;
                    let value = self.read_slot(slot)?;
                    self.stack.push(value);
                }

                OpCode::Jump => {
                    let offset = self.read_u16()? as usize;
                    self.frame_mut()?.ip += offset;
                }
                OpCode::JumpIfFalse => {
                    let offset = self.read_u16()? as usize;
                    let top = self.peek(0)?;
                    if top.is_falsey()? {
                        self.frame_mut()?.ip += offset;
                    }
                }
                OpCode::Loop => {
                    let offset = self.read_u16()? as usize;
                    let frame = self.frame_mut()?;
                    frame.ip = frame
                        .ip
                        .checked_sub(offset)
                        .ok_or_else(|| RuntimeError::internal("loop offset before chunk start"))?;
                }

                OpCode::Call => {
                    let argc = self.read_byte()?;
                    self.call_value(argc)?;
                }
                OpCode::Return => {
                    if self.frames.len() <= 1 {
                        // The bottom frame leaves its return value (and the
                        // rest of the operand stack) in place.
                        return Ok(());
                    }
                    let result = self.pop()?;
                    let frame = self
                        .frames
                        .pop()
                        .ok_or_else(|| RuntimeError::internal("no active frame"))?;
                    self.close_upvalues(frame.slots_base)?;
                    self.stack.truncate(frame.slots_base);
                    self.stack.push(result);
                }

                OpCode::Closure => {
                    let idx = self.read_byte()?;
                    let function = match self.constant(idx)? {
                        Value::Function(function) => function,
                        other => {
                            return Err(RuntimeError::internal(format!(
                                "Closure constant is not a function, got {}",
                                other.type_name()
                            )));
                        }
                    };
                    let mut upvalues = Vec::with_capacity(function.upvalue_count as usize);
                    for _ in 0..function.upvalue_count {
                        let is_local = self.read_byte()? != 0;
                        let index = self.read_byte()? as usize;
                        let cell = if is_local {
                            let slot = self.frame()?.slots_base + index;
                            self.capture_upvalue(slot)
                        } else {
                            let enclosing = self.enclosing_closure()?;
                            enclosing.upvalues.get(index).cloned().ok_or_else(|| {
                                RuntimeError::internal(format!(
                                    "upvalue index {} out of range",
                                    index
                                ))
                            })?
                        };
                        upvalues.push(cell);
                    }
                    self.stack
                        .push(Value::Closure(Rc::new(Closure::new(function, upvalues))));
                }
                OpCode::GetUpvalue => {
                    let index = self.read_byte()? as usize;
                    let cell = self.upvalue_cell(index)?;
                    let value = match cell.slot() {
                        Some(slot) => self.read_slot(slot)?,
                        None => cell
                            .closed_value()
                            .ok_or_else(|| RuntimeError::internal("empty upvalue cell"))?,
                    };
                    self.stack.push(value);
                }
                OpCode::SetUpvalue => {
                    let index = self.read_byte()? as usize;
                    let cell = self.upvalue_cell(index)?;
                    let value = self.peek(0)?;
                    match cell.slot() {
                        Some(slot) => self.write_slot(slot, value)?,
                        None => cell.close(value),
                    }
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Operand-stack helpers
    // ------------------------------------------------------------------

    /// Pop the top of the operand stack.
    fn pop(&mut self) -> Result<Value> {
        self.stack.pop().ok_or(RuntimeError::StackUnderflow)
    }

    /// Clone the value `depth` entries below the top.
    fn peek(&self, depth: usize) -> Result<Value> {
        let index = self
            .stack
            .len()
            .checked_sub(depth + 1)
            .ok_or(RuntimeError::StackUnderflow)?;
        Ok(self.stack[index].clone())
    }

    /// Read an absolute operand-stack slot.
    fn read_slot(&self, slot: usize) -> Result<Value> {
        self.stack
            .get(slot)
            .cloned()
            .ok_or(RuntimeError::StackUnderflow)
    }

    /// Overwrite an absolute operand-stack slot.
    fn write_slot(&mut self, slot: usize, value: Value) -> Result<()> {
        match self.stack.get_mut(slot) {
            Some(entry) => {
                *entry = value;
                Ok(())
            }
            None => Err(RuntimeError::StackUnderflow),
        }
    }

    /// Detach the top `argc` values, bottom-first, for a native call.
    fn take_args(&mut self, argc: usize) -> Result<Vec<Value>> {
        let split = self
            .stack
            .len()
            .checked_sub(argc)
            .ok_or(RuntimeError::StackUnderflow)?;
        Ok(self.stack.split_off(split))
    }

    // ------------------------------------------------------------------
    // Dispatch helpers
    // ------------------------------------------------------------------

    fn frame(&self) -> Result<&CallFrame> {
        self.frames
            .last()
            .ok_or_else(|| RuntimeError::internal("no active frame"))
    }

    fn frame_mut(&mut self) -> Result<&mut CallFrame> {
        self.frames
            .last_mut()
            .ok_or_else(|| RuntimeError::internal("no active frame"))
    }

    fn read_byte(&mut self) -> Result<u8> {
        let frame = self
            .frames
            .last_mut()
            .ok_or_else(|| RuntimeError::internal("no active frame"))?;
        let byte = frame
            .function
            .chunk
            .code
            .at(frame.ip)
            .ok_or_else(|| RuntimeError::internal("instruction pointer past end of code"))?;
        frame.ip += 1;
        Ok(byte)
    }

    fn read_u16(&mut self) -> Result<u16> {
        let hi = self.read_byte()?;
        let lo = self.read_byte()?;
        Ok(u16::from_be_bytes([hi, lo]))
    }

    fn constant(&self, idx: u8) -> Result<Value> {
        self.frame()?
            .function
            .chunk
            .constants
            .get(idx as usize)
            .cloned()
            .ok_or_else(|| RuntimeError::internal(format!("constant index {} out of range", idx)))
    }

    fn binary_op(&mut self, op: fn(&Value, &Value) -> Result<Value>) -> Result<()> {
        let right = self.pop()?;
        let left = self.pop()?;
        self.stack.push(op(&left, &right)?);
        Ok(())
    }

    fn pop_name(&mut self) -> Result<StrRef> {
        match self.pop()? {
            Value::Str(name) => Ok(name),
            other => Err(RuntimeError::type_error("string name", other.type_name())),
        }
    }

    /// Absolute stack index of a 1-byte local-slot operand.
    fn local_slot(&mut self) -> Result<usize> {
        let slot = self.read_byte()? as usize;
        let absolute = self.frame()?.slots_base + slot;
        if absolute >= self.stack.len() {
            return Err(RuntimeError::invalid_slot(absolute, self.stack.len()));
        }
        Ok(absolute)
    }

    fn call_value(&mut self, argc: u8) -> Result<()> {
        let callee = self.peek(argc as usize)?;
        match callee {
            Value::Function(function) => self.call_function(function, None, argc),
            Value::Closure(closure) => {
                let function = Rc::clone(&closure.function);
                self.call_function(function, Some(closure), argc)
            }
            Value::Native(native) => self.call_native(native, argc),
            other => Err(RuntimeError::CallTarget(other.type_name())),
        }
    }

    fn call_function(
        &mut self,
        function: Rc<Function>,
        closure: Option<Rc<Closure>>,
        argc: u8,
    ) -> Result<()> {
        if argc != function.arity {
            return Err(RuntimeError::arity(
                function.name.as_str(),
                function.arity,
                argc,
            ));
        }
        // Slot 0 of the callee frame is the callee itself; arguments follow.
        let slots_base = self.stack.len() - argc as usize - 1;
        let frame = match closure {
            Some(closure) => CallFrame::for_closure(closure, slots_base),
            None => CallFrame::new(function, slots_base),
        };
        self.frames.push(frame);
        Ok(())
    }

    fn call_native(&mut self, native: Rc<NativeFunction>, argc: u8) -> Result<()> {
        if argc != native.arity {
            return Err(RuntimeError::arity(
                native.name.as_str(),
                native.arity,
                argc,
            ));
        }
        let args = self.take_args(argc as usize)?;
        self.pop()?;
        let result = (native.function)(&args)?;
        self.stack.push(result);
        Ok(())
    }

    fn enclosing_closure(&self) -> Result<Rc<Closure>> {
        self.frame()?
            .closure
            .clone()
            .ok_or_else(|| RuntimeError::internal("upvalue access outside a closure"))
    }

    fn upvalue_cell(&self, index: usize) -> Result<Rc<UpvalueCell>> {
        let closure = self.enclosing_closure()?;
        closure.upvalues.get(index).cloned().ok_or_else(|| {
            RuntimeError::internal(format!("upvalue index {} out of range", index))
        })
    }

    /// Reuse the open cell for `slot` if one exists, so every closure over
    /// the same variable shares one cell.
    fn capture_upvalue(&mut self, slot: usize) -> Rc<UpvalueCell> {
        if let Some(cell) = self.open_upvalues.iter().find(|cell| cell.is_open_at(slot)) {
            return Rc::clone(cell);
        }
        let cell = Rc::new(UpvalueCell::open(slot));
        self.open_upvalues.push(Rc::clone(&cell));
        cell
    }

    /// Close every open upvalue at or above `from_slot` by copying the
    /// slot's value into its cell.
    fn close_upvalues(&mut self, from_slot: usize) -> Result<()> {
        let mut still_open = Vec::new();
        for cell in std::mem::take(&mut self.open_upvalues) {
            match cell.slot() {
                Some(slot) if slot >= from_slot => {
                    let value = self.read_slot(slot)?;
                    cell.close(value);
                }
                _ => still_open.push(cell),
            }
        }
        self.open_upvalues = still_open;
        Ok(())
    }

    fn print_value(&mut self, value: &Value) {
        match &mut self.output {
            Output::Stdout => println!("{}", value),
            Output::Capture(buf) => {
                buf.push_str(&value.to_string());
                buf.push('\n');
            }
        }
    }

    fn trace_step(&self) {
        print!("          ");
        for value in &self.stack {
            print!("[ {} ]", value);
        }
        println!();
        if let Ok(frame) = self.frame() {
            frame.function.chunk.disassemble_instruction(frame.ip);
        }
    }

    fn report(&self, error: &RuntimeError) {
        if let Some(frame) = self.frames.last() {
            let at = frame.ip.saturating_sub(1);
            if let Some(line) = frame.function.chunk.lines.line_at(at) {
                eprintln!("[line {}] in {}: {}", line, frame.function.name, error);
                return;
            }
        }
        eprintln!("Runtime error: {}", error);
    }
}

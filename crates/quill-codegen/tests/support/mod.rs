//! Test support: compiling Quill source and running the generated IR.
//!
//! The interpreter models memory as one tree of cells per allocation. A
//! pointer is an allocation plus a path of struct/array indices, so struct
//! layouts never need byte offsets and prefix-compatible structs share
//! paths. Native division panics on a zero divisor or on overflow so that
//! tests notice a missing guard.

#![allow(dead_code)]

use quill_ir::{BinOp, Const, Instr, Operand, ProcId, Program, Terminator};
use rustc_hash::FxHashMap;

pub fn compile(source: &str) -> Program {
    compile_with(source, &quill_codegen::Options::default())
}

pub fn compile_with(source: &str, options: &quill_codegen::Options) -> Program {
    let program = quill_parser::parse(source)
        .into_result()
        .unwrap_or_else(|e| panic!("parse error: {e}"));
    let typeck = quill_typeck::check(&program);
    assert!(typeck.ok(), "semantic errors: {:?}", typeck.diagnostics());
    quill_codegen::translate_with(&program, &typeck, options)
        .unwrap_or_else(|e| panic!("translation failed: {e}"))
}

pub fn run_source(source: &str) -> Run {
    Interpreter::new(&compile(source)).run_main()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exit {
    Returned(i32),
    Halted(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub exit: Exit,
    pub output: Vec<i32>,
}

#[derive(Debug, Clone, PartialEq)]
enum Value {
    Int(i32),
    Bool(bool),
    Null,
    Ptr(Addr),
    Proc(ProcId),
}

#[derive(Debug, Clone, PartialEq)]
struct Addr {
    object: usize,
    path: Vec<u32>,
}

#[derive(Debug, Default)]
enum Cell {
    #[default]
    Uninit,
    Scalar(Value),
    Agg(FxHashMap<u32, Cell>),
}

struct Frame {
    args: Vec<Value>,
    temps: Vec<Option<Value>>,
}

pub struct Interpreter<'p> {
    program: &'p Program,
    objects: Vec<Cell>,
    globals: Vec<usize>,
    output: Vec<i32>,
    fuel: u64,
    depth: usize,
    allocations_left: Option<usize>,
}

impl<'p> Interpreter<'p> {
    pub fn new(program: &'p Program) -> Self {
        let mut interp = Interpreter {
            program,
            objects: Vec::new(),
            globals: Vec::new(),
            output: Vec::new(),
            fuel: 10_000_000,
            depth: 0,
            allocations_left: None,
        };
        for global in &program.globals {
            let cell = const_cell(&global.init);
            interp.objects.push(cell);
            interp.globals.push(interp.objects.len() - 1);
        }
        interp
    }

    /// Heap allocations beyond the first `n` fail.
    pub fn with_allocation_limit(mut self, n: usize) -> Self {
        self.allocations_left = Some(n);
        self
    }

    pub fn run_main(mut self) -> Run {
        let main = self.program.find_proc("main").expect("no main procedure");
        let exit = match self.call(main, Vec::new()) {
            Ok(Value::Int(n)) => Exit::Returned(n),
            Ok(other) => panic!("main returned {other:?}"),
            Err(message) => Exit::Halted(message),
        };
        Run {
            exit,
            output: self.output,
        }
    }

    fn call(&mut self, proc: ProcId, args: Vec<Value>) -> Result<Value, String> {
        let program = self.program;
        let proc = program.proc(proc).expect("unknown procedure");
        assert!(proc.is_defined(), "call to undefined procedure {}", proc.name);
        assert_eq!(args.len(), proc.params.len(), "arity of {}", proc.name);
        self.depth += 1;
        assert!(self.depth < 2_000, "call depth exceeded");
        let mut frame = Frame {
            args,
            temps: vec![None; proc.temps.len()],
        };
        let mut block = &proc.blocks[0];
        let result = loop {
            for instr in &block.instrs {
                self.tick();
                self.step(&mut frame, instr)?;
            }
            self.tick();
            match &block.terminator {
                Terminator::Branch {
                    cond,
                    then_block,
                    else_block,
                } => {
                    let target = match self.eval(&frame, cond) {
                        Value::Bool(true) => then_block,
                        Value::Bool(false) => else_block,
                        other => panic!("branch on {other:?}"),
                    };
                    block = &proc.blocks[target.0 as usize];
                }
                Terminator::Jump(target) => block = &proc.blocks[target.0 as usize],
                Terminator::Return(value) => break self.eval(&frame, value),
                Terminator::Halt(message) => return Err(message.clone()),
            }
        };
        self.depth -= 1;
        Ok(result)
    }

    fn tick(&mut self) {
        self.fuel = self.fuel.checked_sub(1).expect("out of fuel");
    }

    fn step(&mut self, frame: &mut Frame, instr: &Instr) -> Result<(), String> {
        match instr {
            Instr::Alloca { dst, .. } => {
                let object = self.fresh();
                frame.temps[dst.0 as usize] = Some(object);
            }
            Instr::Alloc { dst, size } => {
                let size = self.int(frame, size);
                assert!(size >= 0, "negative allocation size {size}");
                let value = match &mut self.allocations_left {
                    Some(0) => Value::Null,
                    Some(left) => {
                        *left -= 1;
                        self.fresh()
                    }
                    None => self.fresh(),
                };
                frame.temps[dst.0 as usize] = Some(value);
            }
            Instr::Load { dst, addr } => {
                let addr = self.addr(frame, addr);
                let value = self.load(&addr);
                frame.temps[dst.0 as usize] = Some(value);
            }
            Instr::Store { addr, value } => {
                let addr = self.addr(frame, addr);
                let value = self.eval(frame, value);
                self.store(&addr, value);
            }
            Instr::Binary { dst, op, lhs, rhs } => {
                let lhs = self.eval(frame, lhs);
                let rhs = self.eval(frame, rhs);
                frame.temps[dst.0 as usize] = Some(binary(*op, lhs, rhs));
            }
            Instr::GetElementPtr { dst, base, indices } => {
                let mut addr = self.addr(frame, base);
                assert_eq!(
                    indices.first().map(|i| self.eval(frame, i)),
                    Some(Value::Int(0)),
                    "pointer arithmetic is not supported"
                );
                for index in &indices[1..] {
                    let index = self.int(frame, index);
                    let index = u32::try_from(index).expect("negative element index");
                    addr.path.push(index);
                }
                frame.temps[dst.0 as usize] = Some(Value::Ptr(addr));
            }
            Instr::Bitcast { dst, value } => {
                let value = self.eval(frame, value);
                frame.temps[dst.0 as usize] = Some(value);
            }
            Instr::Call { dst, callee, args } => {
                let target = match self.eval(frame, callee) {
                    Value::Proc(proc) => proc,
                    other => panic!("call through {other:?}"),
                };
                let args = args.iter().map(|a| self.eval(frame, a)).collect();
                let result = self.call(target, args)?;
                frame.temps[dst.0 as usize] = Some(result);
            }
            Instr::Print { value } => {
                let value = self.int(frame, value);
                self.output.push(value);
            }
            Instr::Comment(_) => {}
        }
        Ok(())
    }

    fn fresh(&mut self) -> Value {
        self.objects.push(Cell::Uninit);
        Value::Ptr(Addr {
            object: self.objects.len() - 1,
            path: Vec::new(),
        })
    }

    fn eval(&self, frame: &Frame, operand: &Operand) -> Value {
        match operand {
            Operand::Int(n) => Value::Int(*n),
            Operand::Bool(b) => Value::Bool(*b),
            Operand::Null => Value::Null,
            Operand::Temp(t) => frame.temps[t.0 as usize]
                .clone()
                .unwrap_or_else(|| panic!("temp {} used before definition", t.0)),
            Operand::Param(i) => frame.args[*i as usize].clone(),
            Operand::Global(g) => Value::Ptr(Addr {
                object: self.globals[g.0 as usize],
                path: Vec::new(),
            }),
            Operand::Proc(p) => Value::Proc(*p),
        }
    }

    fn int(&self, frame: &Frame, operand: &Operand) -> i32 {
        match self.eval(frame, operand) {
            Value::Int(n) => n,
            other => panic!("expected an integer, found {other:?}"),
        }
    }

    fn addr(&self, frame: &Frame, operand: &Operand) -> Addr {
        match self.eval(frame, operand) {
            Value::Ptr(addr) => addr,
            other => panic!("dereferenced {other:?}"),
        }
    }

    fn load(&self, addr: &Addr) -> Value {
        let mut cell = self.objects.get(addr.object);
        for index in &addr.path {
            cell = match cell {
                Some(Cell::Agg(children)) => children.get(index),
                _ => None,
            };
        }
        match cell {
            Some(Cell::Scalar(value)) => value.clone(),
            other => panic!("load from {other:?} at {addr:?}"),
        }
    }

    fn store(&mut self, addr: &Addr, value: Value) {
        let mut cell = &mut self.objects[addr.object];
        for index in &addr.path {
            if !matches!(cell, Cell::Agg(_)) {
                *cell = Cell::Agg(FxHashMap::default());
            }
            let current = cell;
            cell = match current {
                Cell::Agg(children) => children.entry(*index).or_default(),
                _ => unreachable!(),
            };
        }
        *cell = Cell::Scalar(value);
    }
}

fn const_cell(value: &Const) -> Cell {
    match value {
        Const::Int(n) => Cell::Scalar(Value::Int(*n)),
        Const::Bool(b) => Cell::Scalar(Value::Bool(*b)),
        Const::Null => Cell::Scalar(Value::Null),
        Const::Proc(p) => Cell::Scalar(Value::Proc(*p)),
        Const::Struct(_, fields) => Cell::Agg(
            fields
                .iter()
                .enumerate()
                .map(|(i, field)| (i as u32, const_cell(field)))
                .collect(),
        ),
    }
}

fn binary(op: BinOp, lhs: Value, rhs: Value) -> Value {
    match (op, lhs, rhs) {
        (BinOp::Add, Value::Int(a), Value::Int(b)) => Value::Int(a.wrapping_add(b)),
        (BinOp::Sub, Value::Int(a), Value::Int(b)) => Value::Int(a.wrapping_sub(b)),
        (BinOp::Mul, Value::Int(a), Value::Int(b)) => Value::Int(a.wrapping_mul(b)),
        (BinOp::Div, Value::Int(a), Value::Int(b)) => {
            Value::Int(a.checked_div(b).unwrap_or_else(|| panic!("native division {a} / {b}")))
        }
        (BinOp::Lt, Value::Int(a), Value::Int(b)) => Value::Bool(a < b),
        (BinOp::And, Value::Bool(a), Value::Bool(b)) => Value::Bool(a && b),
        (BinOp::Or, Value::Bool(a), Value::Bool(b)) => Value::Bool(a || b),
        (BinOp::Eq, a, b) => Value::Bool(a == b),
        (op, a, b) => panic!("ill-typed {op}: {a:?}, {b:?}"),
    }
}

//! Expressions as values.

use quill_ir::{BinOp, Operand, ProcId, Terminator, Type};
use quill_parser::ast::{BinaryOp, Expr, ExprKind, UnaryOp};
use quill_typeck::names::{Builtin, Callee};
use quill_typeck::ty::Ty;

use super::{halt_if, FnCx};
use crate::error::CodegenError;

impl FnCx<'_, '_> {
    pub(crate) fn rvalue(&mut self, expr: &Expr) -> Result<Operand, CodegenError> {
        match &expr.kind {
            ExprKind::Int(n) => Ok(Operand::Int(*n)),
            ExprKind::Bool(b) => Ok(Operand::Bool(*b)),
            ExprKind::Null => Ok(Operand::Null),
            ExprKind::This => self.this(),
            ExprKind::Read(place) => {
                let addr = self.place_addr(place)?;
                Ok(self.b.load(&self.tr.ir, "t", addr)?)
            }
            ExprKind::ArrayLength(array) => {
                let array = self.rvalue(array)?;
                self.null_check(array.clone(), expr.pos);
                self.array_len(array)
            }
            ExprKind::Unary { op, operand } => {
                let value = self.rvalue(operand)?;
                Ok(match op {
                    UnaryOp::Minus => self.b.binary("neg", BinOp::Sub, Operand::Int(0), value),
                    UnaryOp::Negate => self.b.binary("not", BinOp::Eq, Operand::Bool(false), value),
                })
            }
            ExprKind::Binary { op, lhs, rhs } => self.binary(expr, *op, lhs, rhs),
            ExprKind::Call { name, args } => self.call(expr, name, args),
            ExprKind::MethodCall {
                receiver,
                method,
                args,
            } => self.method_call(expr, receiver, method, args),
            ExprKind::NewObject { class } => {
                let id = self
                    .tr
                    .typeck
                    .class_id(class)
                    .ok_or_else(|| CodegenError::UnknownClass(class.clone()))?;
                let proc = self.tr.new_class_proc(id)?;
                Ok(self.b.call(&self.tr.ir, "new_object", Operand::Proc(proc), Vec::new())?)
            }
            ExprKind::NewArray { size, .. } => {
                let elem = match self.tr.expr_ty(expr.id)? {
                    Ty::Array(array) => self.tr.typeck.table.elem(array),
                    other => return Err(CodegenError::NoRepresentation(self.tr.typeck.display_ty(other))),
                };
                let size = self.rvalue(size)?;
                let proc = self.tr.new_array_proc(elem)?;
                Ok(self.b.call(&self.tr.ir, "new_array", Operand::Proc(proc), vec![size])?)
            }
        }
    }

    fn binary(&mut self, expr: &Expr, op: BinaryOp, lhs: &Expr, rhs: &Expr) -> Result<Operand, CodegenError> {
        if op == BinaryOp::And {
            return self.and(lhs, rhs);
        }
        let left = self.rvalue(lhs)?;
        let right = self.rvalue(rhs)?;
        let (name, bin) = match op {
            BinaryOp::Div => return self.divide(left, right, expr),
            BinaryOp::Equals => return self.equals(left, right),
            BinaryOp::Plus => ("sum", BinOp::Add),
            BinaryOp::Minus => ("diff", BinOp::Sub),
            BinaryOp::Times => ("prod", BinOp::Mul),
            BinaryOp::Less => ("lt", BinOp::Lt),
            BinaryOp::And => ("and", BinOp::And),
        };
        Ok(self.b.binary(name, bin, left, right))
    }

    /// `lhs && rhs`; `rhs` is only evaluated when `lhs` is true.
    fn and(&mut self, lhs: &Expr, rhs: &Expr) -> Result<Operand, CodegenError> {
        let result = self.b.entry_alloca("and", Type::Bool);
        let left = self.rvalue(lhs)?;
        self.b.store(result.clone(), left.clone());
        let rhs_block = self.b.new_block("and_rhs");
        let end = self.b.new_block("and_end");
        self.b.terminate(Terminator::Branch {
            cond: left,
            then_block: rhs_block,
            else_block: end,
        });

        self.b.switch_to(rhs_block);
        let right = self.rvalue(rhs)?;
        self.b.store(result.clone(), right);
        self.b.terminate(Terminator::Jump(end));

        self.b.switch_to(end);
        Ok(self.b.load(&self.tr.ir, "and", result)?)
    }

    /// Signed division that halts on a zero divisor and yields `i32::MIN`
    /// for `i32::MIN / -1` without dividing.
    fn divide(&mut self, left: Operand, right: Operand, expr: &Expr) -> Result<Operand, CodegenError> {
        let line = self.line_of(expr.pos);
        let is_zero = self.b.binary("is_zero", BinOp::Eq, right.clone(), Operand::Int(0));
        halt_if(
            &mut self.b,
            is_zero,
            "div_by_zero",
            "div_nonzero",
            format!("Division by zero in line {line}"),
        );

        let result = self.b.entry_alloca("quotient", Type::Int);
        self.b.store(result.clone(), Operand::Int(i32::MIN));
        let minus_one = self.b.binary("is_minus_one", BinOp::Eq, right.clone(), Operand::Int(-1));
        let min = self.b.binary("is_min", BinOp::Eq, left.clone(), Operand::Int(i32::MIN));
        let overflow = self.b.binary("overflow", BinOp::And, min, minus_one);
        let divide = self.b.new_block("div");
        let end = self.b.new_block("div_end");
        self.b.terminate(Terminator::Branch {
            cond: overflow,
            then_block: end,
            else_block: divide,
        });

        self.b.switch_to(divide);
        let quotient = self.b.binary("quotient", BinOp::Div, left, right);
        self.b.store(result.clone(), quotient);
        self.b.terminate(Terminator::Jump(end));

        self.b.switch_to(end);
        Ok(self.b.load(&self.tr.ir, "quotient", result)?)
    }

    /// Operands of different reference types are compared after casting
    /// one to the other's type; `null` on the left takes the right's type.
    fn equals(&mut self, left: Operand, right: Operand) -> Result<Operand, CodegenError> {
        let left_ty = self.type_of(&left)?;
        let right_ty = self.type_of(&right)?;
        let (left, right) = if left_ty == right_ty {
            (left, right)
        } else if left_ty == Type::Null {
            (self.cast(left, &right_ty)?, right)
        } else {
            let right = self.cast(right, &left_ty)?;
            (left, right)
        };
        Ok(self.b.binary("eq", BinOp::Eq, left, right))
    }

    fn call(&mut self, expr: &Expr, name: &str, args: &[Expr]) -> Result<Operand, CodegenError> {
        let callee = self
            .tr
            .typeck
            .calls
            .get(&expr.id)
            .copied()
            .ok_or(CodegenError::MissingCallee(expr.id))?;
        match callee {
            Callee::Builtin(builtin @ Builtin::PrintInt) => {
                let [arg] = args else {
                    return Err(CodegenError::IntrinsicArity {
                        name: self.tr.typeck.functions.builtin_name(builtin).to_string(),
                        found: args.len(),
                    });
                };
                let value = self.rvalue(arg)?;
                self.b.print(value);
                Ok(Operand::Int(0))
            }
            Callee::Function(index) => {
                let proc = self.tr.function_proc(index)?;
                let values = self.args(proc, 0, args)?;
                let result = format!("{name}_result");
                Ok(self.b.call(&self.tr.ir, &result, Operand::Proc(proc), values)?)
            }
            Callee::Method(_) => Err(CodegenError::NotAFunction(name.to_string())),
        }
    }

    /// Dispatches through the receiver's vtable. The slot comes from the
    /// receiver's static class; the procedure in it is read at run time.
    fn method_call(
        &mut self,
        expr: &Expr,
        receiver: &Expr,
        method: &str,
        args: &[Expr],
    ) -> Result<Operand, CodegenError> {
        let Some(Callee::Method(method_ref)) = self.tr.typeck.calls.get(&expr.id).copied() else {
            return Err(CodegenError::MissingCallee(expr.id));
        };
        let object = self.rvalue(receiver)?;
        self.null_check(object.clone(), expr.pos);

        let class = match self.tr.expr_ty(receiver.id)? {
            Ty::Class(class) => class,
            other => return Err(CodegenError::NotAClass(self.tr.typeck.display_ty(other))),
        };
        let class_layout = self.tr.layout.class(class)?;
        let slot = class_layout
            .slot(method)
            .ok_or_else(|| CodegenError::UnknownMethod {
                class: class_layout.name.clone(),
                method: method.to_string(),
            })?;
        let proc = self.tr.layout.method_proc(method_ref)?;

        let this_ty = self
            .tr
            .ir
            .proc(proc)?
            .params
            .first()
            .map(|param| param.ty.clone())
            .ok_or_else(|| CodegenError::NoLayout(format!("receiver of `{method}`")))?;
        let mut values = vec![self.cast(object.clone(), &this_ty)?];
        values.extend(self.args(proc, 1, args)?);

        let header = self
            .b
            .gep(&self.tr.ir, "vtable_addr", object, vec![Operand::Int(0), Operand::Int(0)])?;
        let vtable = self.b.load(&self.tr.ir, "vtable", header)?;
        let entry = self.b.gep(
            &self.tr.ir,
            "method_addr",
            vtable,
            vec![Operand::Int(0), Operand::Int(slot as i32)],
        )?;
        let target = self.b.load(&self.tr.ir, "method", entry)?;
        let result = format!("{method}_result");
        Ok(self.b.call(&self.tr.ir, &result, target, values)?)
    }

    /// Evaluates `args` left to right, each cast to the declared type of
    /// parameter `skip + i` of `proc`.
    fn args(&mut self, proc: ProcId, skip: usize, args: &[Expr]) -> Result<Vec<Operand>, CodegenError> {
        let params: Vec<Type> = self
            .tr
            .ir
            .proc(proc)?
            .params
            .iter()
            .skip(skip)
            .map(|param| param.ty.clone())
            .collect();
        let mut values = Vec::with_capacity(args.len());
        for (arg, ty) in args.iter().zip(&params) {
            let value = self.rvalue(arg)?;
            values.push(self.cast(value, ty)?);
        }
        Ok(values)
    }
}

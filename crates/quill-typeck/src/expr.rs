//! Expression and place typing.
//!
//! Every expression and place gets its type recorded in the side table;
//! calls, variable uses and field accesses also record what they resolved
//! to, which is all the translator needs.

use quill_parser::ast::{BinaryOp, Expr, ExprKind, Place, PlaceKind, UnaryOp};

use crate::check::Checker;
use crate::env::ScopeEnv;
use crate::error::{TypeError, TypeRole};
use crate::hierarchy::method_decl;
use crate::names::Callee;
use crate::ty::Ty;

impl Checker<'_> {
    pub(crate) fn check_expr(&mut self, env: &ScopeEnv, expr: &Expr) -> Ty {
        let entered = self.enter(expr.pos);
        let ty = self.infer_expr(env, expr);
        self.types.insert(expr.id, ty);
        self.leave(entered);
        ty
    }

    /// Check `expr` and report it if its type is not below `expected`.
    fn expect(&mut self, env: &ScopeEnv, expr: &Expr, expected: Ty) {
        let found = self.check_expr(env, expr);
        if !self.is_subtype(found, expected) {
            let pos = self.at(expr.pos);
            self.report(TypeError::Mismatch {
                expected: self.show(expected),
                found: self.show(found),
                pos,
            });
        }
    }

    fn infer_expr(&mut self, env: &ScopeEnv, expr: &Expr) -> Ty {
        match &expr.kind {
            ExprKind::Int(_) => Ty::Int,
            ExprKind::Bool(_) => Ty::Bool,
            ExprKind::Null => Ty::Null,
            ExprKind::This => {
                let this = env.this_ty();
                if this == Ty::Any {
                    let pos = self.at(expr.pos);
                    self.report(TypeError::ThisOutsideMethod { pos });
                }
                this
            }
            ExprKind::Read(place) => self.check_place(env, place),
            ExprKind::ArrayLength(array) => {
                let found = self.check_expr(env, array);
                if !matches!(found, Ty::Array(_) | Ty::Any) {
                    let pos = self.at(array.pos);
                    self.report(TypeError::NotAnArray {
                        found: self.show(found),
                        pos,
                    });
                }
                Ty::Int
            }
            ExprKind::Unary { op, operand } => {
                let ty = match op {
                    UnaryOp::Minus => Ty::Int,
                    UnaryOp::Negate => Ty::Bool,
                };
                self.expect(env, operand, ty);
                ty
            }
            ExprKind::Binary { op, lhs, rhs } => self.infer_binary(env, expr, *op, lhs, rhs),
            ExprKind::Call { name, args } => {
                let arg_tys = self.check_args(env, args);
                match self.functions.lookup(name) {
                    Some(callee) => {
                        self.calls.insert(expr.id, callee);
                        self.apply(expr, callee, args, &arg_tys)
                    }
                    None => {
                        let pos = self.at(expr.pos);
                        self.report(TypeError::UnknownFunction {
                            name: name.clone(),
                            pos,
                        });
                        Ty::Any
                    }
                }
            }
            ExprKind::MethodCall {
                receiver,
                method,
                args,
            } => {
                let receiver_ty = self.check_expr(env, receiver);
                let arg_tys = self.check_args(env, args);
                match receiver_ty {
                    Ty::Any => Ty::Any,
                    Ty::Class(class) => {
                        let found = self.classes.info(class).and_then(|i| i.method(method));
                        match found {
                            Some(m) => {
                                let callee = Callee::Method(m);
                                self.calls.insert(expr.id, callee);
                                self.apply(expr, callee, args, &arg_tys)
                            }
                            None => {
                                let pos = self.at(expr.pos);
                                self.report(TypeError::NoSuchMethod {
                                    method: method.clone(),
                                    class: self.show(receiver_ty),
                                    pos,
                                });
                                Ty::Any
                            }
                        }
                    }
                    _ => {
                        let pos = self.at(expr.pos);
                        self.report(TypeError::NotAClassObject { pos });
                        Ty::Any
                    }
                }
            }
            ExprKind::NewObject { class } => match self.classes.lookup(class) {
                Some(id) => Ty::Class(id),
                None => {
                    let pos = self.at(expr.pos);
                    self.report(TypeError::UnresolvedType {
                        ty: class.clone(),
                        role: TypeRole::Plain,
                        pos,
                    });
                    Ty::Any
                }
            },
            ExprKind::NewArray { elem, size } => {
                self.expect(env, size, Ty::Int);
                let pos = self.at(expr.pos);
                let elem = self.resolve_reported(elem, TypeRole::Plain, pos);
                self.table.array_of(elem)
            }
        }
    }

    fn infer_binary(
        &mut self,
        env: &ScopeEnv,
        expr: &Expr,
        op: BinaryOp,
        lhs: &Expr,
        rhs: &Expr,
    ) -> Ty {
        match op {
            BinaryOp::Plus | BinaryOp::Minus | BinaryOp::Times | BinaryOp::Div => {
                self.expect(env, lhs, Ty::Int);
                self.expect(env, rhs, Ty::Int);
                Ty::Int
            }
            BinaryOp::Less => {
                self.expect(env, lhs, Ty::Int);
                self.expect(env, rhs, Ty::Int);
                Ty::Bool
            }
            BinaryOp::And => {
                self.expect(env, lhs, Ty::Bool);
                self.expect(env, rhs, Ty::Bool);
                Ty::Bool
            }
            BinaryOp::Equals => {
                let l = self.check_expr(env, lhs);
                let r = self.check_expr(env, rhs);
                if !self.is_subtype(l, r) && !self.is_subtype(r, l) {
                    let pos = self.at(expr.pos);
                    self.report(TypeError::NotComparable {
                        lhs: self.show(l),
                        rhs: self.show(r),
                        pos,
                    });
                }
                Ty::Bool
            }
        }
    }

    /// Arguments are always checked, even when the callee is unknown, so
    /// mistakes inside them still surface.
    fn check_args(&mut self, env: &ScopeEnv, args: &[Expr]) -> Vec<Ty> {
        args.iter().map(|arg| self.check_expr(env, arg)).collect()
    }

    /// Match already-typed arguments against the callee's parameters and
    /// return the callee's result type.
    fn apply(&mut self, call: &Expr, callee: Callee, args: &[Expr], arg_tys: &[Ty]) -> Ty {
        let program = self.program;
        let (params, ret) = match callee {
            Callee::Builtin(builtin) => (builtin.params(), builtin.return_type()),
            Callee::Function(i) => {
                let f = &program.functions[i];
                (
                    f.params.iter().map(|p| p.ty.clone()).collect(),
                    f.return_type.clone(),
                )
            }
            Callee::Method(m) => {
                let f = method_decl(program, m);
                (
                    f.params.iter().map(|p| p.ty.clone()).collect(),
                    f.return_type.clone(),
                )
            }
        };

        if args.len() != params.len() {
            let pos = self.at(call.pos);
            self.report(TypeError::ArityMismatch {
                expected: params.len(),
                found: args.len(),
                pos,
            });
        } else {
            for ((arg, &found), param) in args.iter().zip(arg_tys).zip(&params) {
                let expected = self.resolve_type(param).gracious();
                if !self.is_subtype(found, expected) {
                    let pos = self.at(arg.pos);
                    self.report(TypeError::Mismatch {
                        expected: self.show(expected),
                        found: self.show(found),
                        pos,
                    });
                }
            }
        }
        self.resolve_type(&ret).gracious()
    }

    pub(crate) fn check_place(&mut self, env: &ScopeEnv, place: &Place) -> Ty {
        let entered = self.enter(place.pos);
        let ty = self.infer_place(env, place);
        self.types.insert(place.id, ty);
        self.leave(entered);
        ty
    }

    fn infer_place(&mut self, env: &ScopeEnv, place: &Place) -> Ty {
        match &place.kind {
            PlaceKind::Var(name) => match env.lookup(name) {
                Some(var) => {
                    self.vars.insert(place.id, var.decl);
                    var.ty
                }
                None => {
                    let pos = self.at(place.pos);
                    self.report(TypeError::UnknownVariable {
                        name: name.clone(),
                        pos,
                    });
                    Ty::Any
                }
            },
            PlaceKind::Field { receiver, field } => {
                let receiver_ty = self.check_expr(env, receiver);
                match receiver_ty {
                    Ty::Any => Ty::Any,
                    Ty::Class(class) => {
                        let found = self.classes.info(class).and_then(|i| i.field(field));
                        match found {
                            Some(f) => {
                                self.fields.insert(place.id, f);
                                self.field_ty(f)
                            }
                            None => {
                                let pos = self.at(receiver.pos);
                                self.report(TypeError::NoSuchField {
                                    field: field.clone(),
                                    class: self.show(receiver_ty),
                                    pos,
                                });
                                Ty::Any
                            }
                        }
                    }
                    _ => {
                        let pos = self.at(receiver.pos);
                        self.report(TypeError::NotAClassObject { pos });
                        Ty::Any
                    }
                }
            }
            PlaceKind::Index { array, index } => {
                let array_ty = self.check_expr(env, array);
                self.expect(env, index, Ty::Int);
                match array_ty {
                    Ty::Array(id) => self.table.elem(id),
                    Ty::Any => Ty::Any,
                    _ => {
                        let pos = self.at(place.pos);
                        self.report(TypeError::IndexNotArray {
                            found: self.show(array_ty),
                            pos,
                        });
                        Ty::Any
                    }
                }
            }
        }
    }
}

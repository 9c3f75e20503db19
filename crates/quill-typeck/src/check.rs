//! The analyzer: declarations, functions, classes and statements.
//!
//! Work happens in a fixed order: name tables, class hierarchy, class
//! members, the `main` contract, then every function and method body.
//! Whatever fails to resolve gets type `Any`, so each mistake is reported
//! once and does not cascade.

use quill_common::span::Pos;
use quill_parser::ast::{
    Block, ClassDecl, Expr, FunctionDecl, NodeId, Program, Stmt, StmtKind, TypeExpr, VarDecl,
};
use rustc_hash::FxHashMap;

use crate::env::{DeclRef, ScopeEnv, VarInfo};
use crate::error::{ConditionOf, TypeError, TypeRole};
use crate::hierarchy::{ClassTable, FieldRef};
use crate::names::{Callee, FunctionTable};
use crate::ty::{ClassId, Ty, TypeTable};
use crate::{Options, TypeckResult};

pub(crate) struct Checker<'a> {
    pub(crate) program: &'a Program,
    pub(crate) table: TypeTable,
    pub(crate) classes: ClassTable,
    pub(crate) functions: FunctionTable,
    pub(crate) errors: Vec<TypeError>,
    /// Positions of the enclosing nodes, innermost last.
    pos_stack: Vec<Pos>,
    fallback: Pos,
    pub(crate) types: FxHashMap<NodeId, Ty>,
    pub(crate) calls: FxHashMap<NodeId, Callee>,
    pub(crate) vars: FxHashMap<NodeId, DeclRef>,
    pub(crate) fields: FxHashMap<NodeId, FieldRef>,
}

impl<'a> Checker<'a> {
    pub(crate) fn new(program: &'a Program, options: &Options) -> Self {
        let fallback = program.pos.unwrap_or(Pos::new(1, 1));
        let mut errors = Vec::new();
        let functions =
            FunctionTable::new(program, &options.print_intrinsic, fallback, &mut errors);
        let classes = ClassTable::new(program, fallback, &mut errors);
        let table = TypeTable::new(program.classes.iter().map(|c| c.name.clone()).collect());
        Self {
            program,
            table,
            classes,
            functions,
            errors,
            pos_stack: Vec::new(),
            fallback,
            types: FxHashMap::default(),
            calls: FxHashMap::default(),
            vars: FxHashMap::default(),
            fields: FxHashMap::default(),
        }
    }

    pub(crate) fn run(mut self) -> TypeckResult {
        let program = self.program;
        tracing::debug!(
            functions = program.functions.len(),
            classes = program.classes.len(),
            "type checking program"
        );

        self.classes
            .resolve_all(program, self.fallback, &mut self.errors);
        for class in &program.classes {
            self.check_members(class);
        }
        self.verify_main();
        for func in &program.functions {
            let mut env = ScopeEnv::new();
            self.check_function(&mut env, func);
        }
        for (i, class) in program.classes.iter().enumerate() {
            self.check_class(ClassId(i as u32), class);
        }

        tracing::debug!(errors = self.errors.len(), "type checking finished");
        TypeckResult {
            types: self.types,
            calls: self.calls,
            vars: self.vars,
            fields: self.fields,
            errors: self.errors,
            table: self.table,
            classes: self.classes,
            functions: self.functions,
        }
    }

    // ── Positions and reporting ────────────────────────────────────────

    /// `pos`, or the position of the nearest enclosing node that has one.
    pub(crate) fn at(&self, pos: Option<Pos>) -> Pos {
        pos.or_else(|| self.pos_stack.last().copied())
            .unwrap_or(self.fallback)
    }

    pub(crate) fn enter(&mut self, pos: Option<Pos>) -> bool {
        match pos {
            Some(pos) => {
                self.pos_stack.push(pos);
                true
            }
            None => false,
        }
    }

    pub(crate) fn leave(&mut self, entered: bool) {
        if entered {
            self.pos_stack.pop();
        }
    }

    pub(crate) fn report(&mut self, error: TypeError) {
        tracing::trace!(%error, pos = %error.pos(), "type error");
        self.errors.push(error);
    }

    pub(crate) fn show(&self, ty: Ty) -> String {
        self.table.display(ty).to_string()
    }

    // ── Types ──────────────────────────────────────────────────────────

    /// Resolve a written type. Unknown class names give `Invalid`.
    pub(crate) fn resolve_type(&mut self, ty: &TypeExpr) -> Ty {
        match ty {
            TypeExpr::Int => Ty::Int,
            TypeExpr::Bool => Ty::Bool,
            TypeExpr::Class(name) => self.classes.lookup(name).map_or(Ty::Invalid, Ty::Class),
            TypeExpr::Array(elem) => match self.resolve_type(elem) {
                Ty::Invalid => Ty::Invalid,
                elem => self.table.array_of(elem),
            },
        }
    }

    /// Resolve a written type, reporting it at `pos` when it fails.
    pub(crate) fn resolve_reported(&mut self, ty: &TypeExpr, role: TypeRole, pos: Pos) -> Ty {
        let resolved = self.resolve_type(ty);
        if resolved.is_invalid() {
            self.report(TypeError::UnresolvedType {
                ty: ty.to_string(),
                role,
                pos,
            });
        }
        resolved.gracious()
    }

    pub(crate) fn is_subtype(&self, sub: Ty, sup: Ty) -> bool {
        self.classes.is_subtype(&self.table, sub, sup)
    }

    pub(crate) fn field_ty(&mut self, field: FieldRef) -> Ty {
        let program = self.program;
        let decl = &program.classes[field.class.index()].fields[field.index];
        self.resolve_type(&decl.ty).gracious()
    }

    // ── Declarations ───────────────────────────────────────────────────

    /// Duplicate members declared directly in one class, and field types
    /// that do not resolve.
    fn check_members(&mut self, class: &ClassDecl) {
        let entered = self.enter(class.pos);
        let mut seen: FxHashMap<&str, Pos> = FxHashMap::default();
        for field in &class.fields {
            let pos = self.at(field.pos);
            self.resolve_reported(&field.ty, TypeRole::Plain, pos);
            if let Some(&previous) = seen.get(field.name.as_str()) {
                self.report(TypeError::DuplicateField {
                    name: field.name.clone(),
                    pos,
                    previous,
                });
            } else {
                seen.insert(&field.name, pos);
            }
        }
        let mut seen: FxHashMap<&str, Pos> = FxHashMap::default();
        for method in &class.methods {
            let pos = self.at(method.pos);
            if let Some(&previous) = seen.get(method.name.as_str()) {
                self.report(TypeError::DuplicateMethod {
                    name: method.name.clone(),
                    pos,
                    previous,
                });
            } else {
                seen.insert(&method.name, pos);
            }
        }
        self.leave(entered);
    }

    /// `int main()` must exist, take nothing, and end in `return`.
    fn verify_main(&mut self) {
        let program = self.program;
        let main = match self.functions.lookup("main") {
            Some(Callee::Function(i)) => &program.functions[i],
            _ => {
                let pos = self.at(program.pos);
                self.report(TypeError::MissingMain { pos });
                return;
            }
        };
        let pos = self.at(main.pos);
        if self.resolve_type(&main.return_type) != Ty::Int {
            self.report(TypeError::MainReturnType { pos });
        }
        if let Some(first) = main.params.first() {
            self.report(TypeError::MainHasParams {
                pos: first.pos.unwrap_or(pos),
            });
        }
        if !main.body.stmts.last().is_some_and(Stmt::is_return) {
            self.report(TypeError::MainMissingReturn { pos });
        }
    }

    fn check_class(&mut self, id: ClassId, class: &ClassDecl) {
        let entered = self.enter(class.pos);
        let mut env = ScopeEnv::new();
        env.set_this_ty(Ty::Class(id));

        let visible: Vec<(String, FieldRef)> = match self.classes.info(id) {
            Some(info) => info.fields.iter().map(|(n, f)| (n.clone(), *f)).collect(),
            None => Vec::new(),
        };
        for (name, field) in visible {
            let ty = self.field_ty(field);
            env.put_field(
                name,
                VarInfo {
                    ty,
                    decl: DeclRef::Field(field),
                },
            );
        }

        for method in &class.methods {
            env.push_scope();
            self.check_function(&mut env, method);
            env.pop_scope();
        }
        self.leave(entered);
    }

    /// Check one function or method body in `env`, which already holds the
    /// class scope for methods.
    fn check_function(&mut self, env: &mut ScopeEnv, func: &FunctionDecl) {
        let entered = self.enter(func.pos);
        let pos = self.at(func.pos);
        let ret = self.resolve_reported(&func.return_type, TypeRole::Return, pos);
        env.set_return_ty(ret);

        for param in &func.params {
            let pos = self.at(param.pos);
            let ty = self.resolve_reported(&param.ty, TypeRole::Parameter, pos);
            if env.lookup_var(&param.name).is_some() {
                self.report(TypeError::DuplicateParam {
                    name: param.name.clone(),
                    pos,
                });
                continue;
            }
            env.put_var(
                param.name.clone(),
                VarInfo {
                    ty,
                    decl: DeclRef::Local(param.id),
                },
            );
        }

        self.check_block(env, &func.body);
        self.leave(entered);
    }

    // ── Statements ─────────────────────────────────────────────────────

    fn check_block(&mut self, env: &mut ScopeEnv, block: &Block) {
        let entered = self.enter(block.pos);
        env.push_scope();
        for stmt in &block.stmts {
            self.check_stmt(env, stmt);
        }
        env.pop_scope();
        self.leave(entered);
    }

    /// A branch or loop body gets its own scope even when it is not a block.
    fn check_nested(&mut self, env: &mut ScopeEnv, stmt: &Stmt) {
        env.push_scope();
        self.check_stmt(env, stmt);
        env.pop_scope();
    }

    fn check_stmt(&mut self, env: &mut ScopeEnv, stmt: &Stmt) {
        let entered = self.enter(stmt.pos);
        match &stmt.kind {
            StmtKind::Block(block) => self.check_block(env, block),
            StmtKind::VarDecl(decl) => self.declare_local(env, decl),
            StmtKind::Assign { target, value } => {
                let target_ty = self.check_place(env, target);
                let value_ty = self.check_expr(env, value);
                if !self.is_subtype(value_ty, target_ty) {
                    let pos = self.at(stmt.pos);
                    self.report(TypeError::AssignMismatch {
                        target: self.show(target_ty),
                        value: self.show(value_ty),
                        pos,
                    });
                }
            }
            StmtKind::Expr(expr) => {
                self.check_expr(env, expr);
            }
            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                self.check_condition(env, cond, ConditionOf::If);
                self.check_nested(env, then_branch);
                if let Some(else_branch) = else_branch {
                    self.check_nested(env, else_branch);
                }
            }
            StmtKind::While { cond, body } => {
                self.check_condition(env, cond, ConditionOf::While);
                self.check_nested(env, body);
            }
            StmtKind::Return(value) => {
                let found = self.check_expr(env, value);
                let expected = env.return_ty();
                if !self.is_subtype(found, expected) {
                    let pos = self.at(stmt.pos);
                    self.report(TypeError::ReturnMismatch {
                        expected: self.show(expected),
                        found: self.show(found),
                        pos,
                    });
                }
            }
        }
        self.leave(entered);
    }

    fn declare_local(&mut self, env: &mut ScopeEnv, decl: &VarDecl) {
        let pos = self.at(decl.pos);
        let ty = self.resolve_reported(&decl.ty, TypeRole::Plain, pos);
        if env.lookup_var(&decl.name).is_some() {
            self.report(TypeError::DuplicateVariable {
                name: decl.name.clone(),
                pos,
            });
            return;
        }
        env.put_var(
            decl.name.clone(),
            VarInfo {
                ty,
                decl: DeclRef::Local(decl.id),
            },
        );
    }

    fn check_condition(&mut self, env: &mut ScopeEnv, cond: &Expr, of: ConditionOf) {
        let found = self.check_expr(env, cond);
        if !self.is_subtype(found, Ty::Bool) {
            let pos = self.at(cond.pos);
            self.report(TypeError::ConditionNotBool {
                of,
                found: self.show(found),
                pos,
            });
        }
    }
}

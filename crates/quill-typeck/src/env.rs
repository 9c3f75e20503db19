//! Scope environment for name resolution inside function bodies.
//!
//! Variables and fields live in separate maps so that a local may shadow a
//! field but never another local. Entering a block pushes a frame; leaving
//! drops it, so declarations made inside never become visible outside.

use quill_parser::ast::NodeId;
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::hierarchy::FieldRef;
use crate::ty::Ty;

/// Where a name was declared.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum DeclRef {
    /// A parameter or local, by the id of its declaration.
    Local(NodeId),
    /// A field reached through the implicit receiver.
    Field(FieldRef),
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct VarInfo {
    pub ty: Ty,
    pub decl: DeclRef,
}

#[derive(Debug, Default)]
struct Frame {
    vars: FxHashMap<String, VarInfo>,
    fields: FxHashMap<String, VarInfo>,
}

pub struct ScopeEnv {
    /// Index 0 is the root frame of the function (or class).
    frames: Vec<Frame>,
    return_ty: Ty,
    this_ty: Ty,
}

impl ScopeEnv {
    /// A root environment: no names, `this` unavailable.
    pub fn new() -> Self {
        Self {
            frames: vec![Frame::default()],
            return_ty: Ty::Any,
            this_ty: Ty::Any,
        }
    }

    pub fn push_scope(&mut self) {
        self.frames.push(Frame::default());
    }

    /// Drop the innermost frame. The root frame is never popped.
    pub fn pop_scope(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    pub fn lookup_var(&self, name: &str) -> Option<VarInfo> {
        self.frames.iter().rev().find_map(|f| f.vars.get(name).copied())
    }

    pub fn lookup_field(&self, name: &str) -> Option<VarInfo> {
        self.frames.iter().rev().find_map(|f| f.fields.get(name).copied())
    }

    /// Locals and parameters first, then fields.
    pub fn lookup(&self, name: &str) -> Option<VarInfo> {
        self.lookup_var(name).or_else(|| self.lookup_field(name))
    }

    pub fn put_var(&mut self, name: impl Into<String>, info: VarInfo) {
        if let Some(frame) = self.frames.last_mut() {
            frame.vars.insert(name.into(), info);
        }
    }

    pub fn put_field(&mut self, name: impl Into<String>, info: VarInfo) {
        if let Some(frame) = self.frames.last_mut() {
            frame.fields.insert(name.into(), info);
        }
    }

    pub fn return_ty(&self) -> Ty {
        self.return_ty
    }

    pub fn set_return_ty(&mut self, ty: Ty) {
        self.return_ty = ty;
    }

    pub fn this_ty(&self) -> Ty {
        self.this_ty
    }

    pub fn set_this_ty(&mut self, ty: Ty) {
        self.this_ty = ty;
    }
}

impl Default for ScopeEnv {
    fn default() -> Self {
        Self::new()
    }
}

//! Class hierarchy resolution.
//!
//! Resolving a class produces its [`ClassInfo`]: the superclass link plus
//! flattened member indices in which a subclass's declarations shadow
//! inherited fields and override inherited methods by name.
//!
//! Resolution recurses up the `extends` chain carrying the chain walked so
//! far. Meeting a class that is already on the chain means a cycle: the
//! class is reported once and, for this walk only, treated as if it had no
//! superclass. Results computed while a cycle is being unwound are handed
//! back as [`Resolution::CycleDetected`] and never cached; the frame of the
//! class that closed the cycle turns the result into a cached
//! [`Resolution::Resolved`] again. Every class therefore ends up cached
//! after one walk and each cycle is reported exactly once per re-entered
//! class.

use std::rc::Rc;

use quill_common::span::Pos;
use quill_parser::ast::{FunctionDecl, Program};
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::error::TypeError;
use crate::ty::{ClassId, Ty, TypeTable};

/// A field declaration: the class that declares it and its index in that
/// class's `fields`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct FieldRef {
    pub class: ClassId,
    pub index: usize,
}

/// A method declaration, addressed like [`FieldRef`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct MethodRef {
    pub class: ClassId,
    pub index: usize,
}

/// The resolved view of one class.
#[derive(Clone, Debug)]
pub struct ClassInfo {
    pub id: ClassId,
    pub name: String,
    /// `None` for root classes, unknown superclasses and cycle breaks.
    pub superclass: Option<ClassId>,
    /// Visible fields by name; the nearest declaration wins.
    pub fields: FxHashMap<String, FieldRef>,
    /// Visible methods by name; overrides replace inherited entries.
    pub methods: FxHashMap<String, MethodRef>,
}

impl ClassInfo {
    pub fn field(&self, name: &str) -> Option<FieldRef> {
        self.fields.get(name).copied()
    }

    pub fn method(&self, name: &str) -> Option<MethodRef> {
        self.methods.get(name).copied()
    }
}

/// Outcome of one resolution step.
enum Resolution {
    /// Final, cached.
    Resolved(Rc<ClassInfo>),
    /// Best effort while unwinding a cycle that `reentered` closes.
    CycleDetected {
        info: Rc<ClassInfo>,
        reentered: ClassId,
    },
}

/// Class name table plus the resolution cache.
#[derive(Debug, Default)]
pub struct ClassTable {
    by_name: FxHashMap<String, ClassId>,
    cache: Vec<Option<Rc<ClassInfo>>>,
}

impl ClassTable {
    /// Build the name table. A repeated class name is reported at the later
    /// declaration; the first one keeps the name.
    pub fn new(program: &Program, fallback: Pos, errors: &mut Vec<TypeError>) -> Self {
        let mut by_name: FxHashMap<String, ClassId> = FxHashMap::default();
        for (i, class) in program.classes.iter().enumerate() {
            if let Some(&previous) = by_name.get(&class.name) {
                let previous = program.classes[previous.index()].pos.unwrap_or(fallback);
                errors.push(TypeError::DuplicateClass {
                    name: class.name.clone(),
                    pos: class.pos.unwrap_or(fallback),
                    previous,
                });
                continue;
            }
            by_name.insert(class.name.clone(), ClassId(i as u32));
        }
        Self {
            by_name,
            cache: vec![None; program.classes.len()],
        }
    }

    pub fn lookup(&self, name: &str) -> Option<ClassId> {
        self.by_name.get(name).copied()
    }

    /// The cached info of a class, if it has been resolved.
    pub fn info(&self, id: ClassId) -> Option<&ClassInfo> {
        self.cache.get(id.index()).and_then(|c| c.as_deref())
    }

    pub fn superclass(&self, id: ClassId) -> Option<ClassId> {
        self.info(id).and_then(|info| info.superclass)
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Resolve every class, in declaration order.
    pub fn resolve_all(&mut self, program: &Program, fallback: Pos, errors: &mut Vec<TypeError>) {
        for i in 0..program.classes.len() {
            self.resolve(program, ClassId(i as u32), fallback, errors);
        }
    }

    /// Resolve one class, reporting hierarchy problems the first time the
    /// class is cached.
    pub fn resolve(
        &mut self,
        program: &Program,
        id: ClassId,
        fallback: Pos,
        errors: &mut Vec<TypeError>,
    ) -> Rc<ClassInfo> {
        let mut chain = Vec::new();
        match self.resolve_in(program, id, &mut chain, fallback, errors) {
            Resolution::Resolved(info) | Resolution::CycleDetected { info, .. } => info,
        }
    }

    fn resolve_in(
        &mut self,
        program: &Program,
        id: ClassId,
        chain: &mut Vec<ClassId>,
        fallback: Pos,
        errors: &mut Vec<TypeError>,
    ) -> Resolution {
        if let Some(Some(info)) = self.cache.get(id.index()) {
            tracing::trace!(class = %info.name, "class cache hit");
            return Resolution::Resolved(Rc::clone(info));
        }

        let decl = &program.classes[id.index()];
        let class_pos = decl.pos.unwrap_or(fallback);

        if chain.contains(&id) {
            tracing::debug!(class = %decl.name, "inheritance cycle");
            errors.push(TypeError::InheritanceCycle {
                class: decl.name.clone(),
                pos: class_pos,
            });
            let (info, _) = flatten(program, id, None, None, class_pos);
            return Resolution::CycleDetected {
                info: Rc::new(info),
                reentered: id,
            };
        }

        chain.push(id);
        let mut missing_superclass = None;
        let mut unwinding = None;
        let (superclass, inherited) = match &decl.extends {
            None => (None, None),
            Some(name) => match self.lookup(name) {
                None => {
                    missing_superclass = Some(name.clone());
                    (None, None)
                }
                Some(super_id) => {
                    match self.resolve_in(program, super_id, chain, fallback, errors) {
                        Resolution::Resolved(info) => (Some(super_id), Some(info)),
                        Resolution::CycleDetected { info, reentered } => {
                            unwinding = Some(reentered);
                            (Some(super_id), Some(info))
                        }
                    }
                }
            },
        };
        chain.pop();

        let (info, override_errors) =
            flatten(program, id, superclass, inherited.as_deref(), class_pos);
        let info = Rc::new(info);

        if let Some(reentered) = unwinding.filter(|&r| r != id) {
            return Resolution::CycleDetected { info, reentered };
        }

        if let Some(superclass) = missing_superclass {
            errors.push(TypeError::UnknownSuperclass {
                superclass,
                class: decl.name.clone(),
                pos: class_pos,
            });
        }
        errors.extend(override_errors);
        self.cache[id.index()] = Some(Rc::clone(&info));
        Resolution::Resolved(info)
    }

    /// Subtyping over the lattice.
    ///
    /// `Any` is compatible with everything both ways, `Null` is below every
    /// reference type, array types are related only to themselves (an `Any`
    /// element type matches any element type), and class types follow the
    /// superclass chain.
    pub fn is_subtype(&self, types: &TypeTable, sub: Ty, sup: Ty) -> bool {
        match (sub, sup) {
            (Ty::Invalid, _) | (_, Ty::Invalid) => false,
            (Ty::Any, _) | (_, Ty::Any) => true,
            (Ty::Null, Ty::Null | Ty::Array(_) | Ty::Class(_)) => true,
            (Ty::Int, Ty::Int) | (Ty::Bool, Ty::Bool) => true,
            (Ty::Array(a), Ty::Array(b)) => {
                let (ea, eb) = (types.elem(a), types.elem(b));
                a == b || ea == Ty::Any || eb == Ty::Any
            }
            (Ty::Class(a), Ty::Class(b)) => self.inherits_from(a, b),
            _ => false,
        }
    }

    /// Whether `b` is `a` or one of its ancestors. The walk is bounded by
    /// the number of classes, so superclass links that still form a loop
    /// after a reported cycle cannot hang it.
    fn inherits_from(&self, a: ClassId, b: ClassId) -> bool {
        let mut current = Some(a);
        for _ in 0..=self.len() {
            match current {
                Some(c) if c == b => return true,
                Some(c) => current = self.superclass(c),
                None => return false,
            }
        }
        false
    }
}

/// Build a class's info from its declaration and the inherited info.
/// Returns the incompatible-override errors alongside.
fn flatten(
    program: &Program,
    id: ClassId,
    superclass: Option<ClassId>,
    inherited: Option<&ClassInfo>,
    class_pos: Pos,
) -> (ClassInfo, Vec<TypeError>) {
    let decl = &program.classes[id.index()];
    let mut fields = inherited.map(|i| i.fields.clone()).unwrap_or_default();
    let mut methods = inherited.map(|i| i.methods.clone()).unwrap_or_default();
    let mut errors = Vec::new();

    for (index, field) in decl.fields.iter().enumerate() {
        fields.insert(field.name.clone(), FieldRef { class: id, index });
    }

    for (index, method) in decl.methods.iter().enumerate() {
        if let Some(prev) = methods.get(&method.name).filter(|m| m.class != id) {
            let prev_decl = method_decl(program, *prev);
            if !same_signature(prev_decl, method) {
                let prev_pos = prev_decl
                    .pos
                    .or(program.classes[prev.class.index()].pos)
                    .unwrap_or(class_pos);
                errors.push(TypeError::IncompatibleOverride {
                    name: method.name.clone(),
                    pos: method.pos.unwrap_or(class_pos),
                    previous: prev_pos,
                });
            }
        }
        methods.insert(method.name.clone(), MethodRef { class: id, index });
    }

    let info = ClassInfo {
        id,
        name: decl.name.clone(),
        superclass,
        fields,
        methods,
    };
    (info, errors)
}

pub fn method_decl(program: &Program, method: MethodRef) -> &FunctionDecl {
    &program.classes[method.class.index()].methods[method.index]
}

/// Identical return type and parameter types, compared as written.
fn same_signature(a: &FunctionDecl, b: &FunctionDecl) -> bool {
    a.return_type == b.return_type
        && a.params.len() == b.params.len()
        && a.params.iter().zip(&b.params).all(|(x, y)| x.ty == y.ty)
}

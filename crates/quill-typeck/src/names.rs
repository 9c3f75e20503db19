//! Global function name table.

use quill_common::span::Pos;
use quill_parser::ast::{Program, TypeExpr};
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::error::TypeError;
use crate::hierarchy::MethodRef;

/// Functions every program can call without declaring them.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Builtin {
    /// `int printInt(int elem)`: prints its argument, returns 0.
    PrintInt,
}

impl Builtin {
    pub const ALL: [Builtin; 1] = [Builtin::PrintInt];

    /// Name the built-in is registered under unless configured otherwise.
    pub fn default_name(self) -> &'static str {
        match self {
            Builtin::PrintInt => "printInt",
        }
    }

    pub fn params(self) -> Vec<TypeExpr> {
        match self {
            Builtin::PrintInt => vec![TypeExpr::Int],
        }
    }

    pub fn return_type(self) -> TypeExpr {
        match self {
            Builtin::PrintInt => TypeExpr::Int,
        }
    }
}

/// What a call resolved to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Callee {
    Builtin(Builtin),
    /// Index into `Program::functions`.
    Function(usize),
    Method(MethodRef),
}

#[derive(Debug, Default)]
pub struct FunctionTable {
    by_name: FxHashMap<String, Callee>,
    builtin_names: FxHashMap<Builtin, String>,
}

impl FunctionTable {
    /// Register the built-ins, then every free function. A name that is
    /// already taken is reported at the later declaration and keeps
    /// resolving to the earlier one.
    ///
    /// The print built-in is registered as `print_name`.
    pub fn new(
        program: &Program,
        print_name: &str,
        fallback: Pos,
        errors: &mut Vec<TypeError>,
    ) -> Self {
        let mut by_name = FxHashMap::default();
        let mut builtin_names = FxHashMap::default();
        for builtin in Builtin::ALL {
            let name = match builtin {
                Builtin::PrintInt => print_name.to_string(),
            };
            by_name.insert(name.clone(), Callee::Builtin(builtin));
            builtin_names.insert(builtin, name);
        }
        for (i, func) in program.functions.iter().enumerate() {
            if let Some(existing) = by_name.get(&func.name) {
                let previous = match existing {
                    Callee::Function(j) => Some(program.functions[*j].pos.unwrap_or(fallback)),
                    Callee::Builtin(_) | Callee::Method(_) => None,
                };
                errors.push(TypeError::DuplicateFunction {
                    name: func.name.clone(),
                    pos: func.pos.unwrap_or(fallback),
                    previous,
                });
                continue;
            }
            by_name.insert(func.name.clone(), Callee::Function(i));
        }
        Self {
            by_name,
            builtin_names,
        }
    }

    pub fn lookup(&self, name: &str) -> Option<Callee> {
        self.by_name.get(name).copied()
    }

    /// The name `builtin` was registered under.
    pub fn builtin_name(&self, builtin: Builtin) -> &str {
        self.builtin_names
            .get(&builtin)
            .map_or(builtin.default_name(), String::as_str)
    }
}

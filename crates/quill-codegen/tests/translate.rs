//! Shape of the generated IR.

mod support;

use quill_codegen::{translate, CodegenError, Options};
use quill_ir::{Const, Instr, Operand, Terminator, Type};
use support::{compile, Interpreter};

#[test]
fn trivial_main_is_one_block() {
    let program = compile("int main() { return 0; }");
    let main = program.proc(program.find_proc("main").unwrap()).unwrap();
    assert_eq!(main.blocks.len(), 1);
    assert!(main.blocks[0].instrs.is_empty());
    assert_eq!(main.blocks[0].terminator, Terminator::Return(Operand::Int(0)));
    insta::assert_snapshot!(program.to_string().trim(), @r"
    proc i32 @main() {
    entry:
        ret 0
    }
    ");
}

#[test]
fn locals_live_in_entry_slots() {
    let program = compile("int main() { int x; x = 2; if (x < 3) { x = x + 1; } return x; }");
    insta::assert_snapshot!(program.to_string().trim(), @r"
    proc i32 @main() {
    entry:
        %x.0 = alloca i32
        store %x.0, 0
        store %x.0, 2
        %t.1 = load %x.0
        %lt.2 = slt %t.1, 3
        br %lt.2, if_then.1, if_else.2
    if_then.1:
        %t.3 = load %x.0
        %sum.4 = add %t.3, 1
        store %x.0, %sum.4
        jump if_end.3
    if_else.2:
        jump if_end.3
    if_end.3:
        %t.5 = load %x.0
        ret %t.5
    }
    ");
}

#[test]
fn class_structs_and_vtables() {
    let program = compile(
        "class A { int x; int get() { return x; } }
         class B extends A { boolean x; int get() { return 1; } int h() { return 2; } }
         int main() { return 0; }",
    );
    let text = program.to_string();
    let header = text.split("\n\n").next().unwrap();
    insta::assert_snapshot!(header, @r"
    %class_A = type { %vtable_A*, i32 }
    %vtable_A = type { i32 (%class_A*)* }
    %class_B = type { %vtable_B*, i32, i1 }
    %vtable_B = type { i32 (%class_B*)*, i32 (%class_B*)* }
    @_vtable_A = constant %vtable_A { @A_get }
    @_vtable_B = constant %vtable_B { @B_get, @B_h }
    ");
    let names: Vec<&str> = program.procs.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["main", "A_get", "B_get", "B_h"]);
}

#[test]
fn slots_are_stable_down_the_hierarchy() {
    let program = compile(
        "class A { int f() { return 1; } int g() { return 2; } }
         class B extends A { int h() { return 3; } int g() { return 4; } }
         class C extends B { int f() { return 5; } }
         int main() { return 0; }",
    );
    let vtable = |class: &str| {
        let global = program
            .globals
            .iter()
            .find(|g| g.name == format!("_vtable_{class}"))
            .unwrap();
        let Const::Struct(_, entries) = &global.init else {
            panic!("vtable is not a struct constant");
        };
        entries
            .iter()
            .map(|entry| match entry {
                Const::Proc(p) => program.proc(*p).unwrap().name.clone(),
                other => panic!("unexpected vtable entry {other:?}"),
            })
            .collect::<Vec<_>>()
    };
    assert_eq!(vtable("A"), vec!["A_f", "A_g"]);
    assert_eq!(vtable("B"), vec!["A_f", "B_g", "B_h"]);
    assert_eq!(vtable("C"), vec!["C_f", "B_g", "B_h"]);
}

#[test]
fn hidden_fields_keep_separate_storage() {
    let program = compile(
        "class A { int x; int getA() { return x; } }
         class B extends A { boolean x; boolean getB() { return x; } }
         int main() { return 0; }",
    );
    let class_b = program.structs.iter().find(|s| s.name == "class_B").unwrap();
    let fields: Vec<(&str, &Type)> = class_b.fields.iter().map(|f| (f.name.as_str(), &f.ty)).collect();
    assert_eq!(fields.len(), 3);
    assert_eq!(fields[1], ("x", &Type::Int));
    assert_eq!(fields[2], ("x", &Type::Bool));

    let slot_used = |proc_name: &str| {
        let proc = program.proc(program.find_proc(proc_name).unwrap()).unwrap();
        proc.blocks
            .iter()
            .flat_map(|b| &b.instrs)
            .find_map(|instr| match instr {
                Instr::GetElementPtr { indices, .. } => Some(indices[1].clone()),
                _ => None,
            })
            .unwrap()
    };
    assert_eq!(slot_used("A_getA"), Operand::Int(1));
    assert_eq!(slot_used("B_getB"), Operand::Int(2));
}

#[test]
fn allocators_are_shared_per_type() {
    let program = compile(
        "class P { }
         int main() { P p; p = new P(); p = new P(); int[] a; a = new int[1]; a = new int[2];
                      boolean[] b; b = new boolean[3]; return 0; }",
    );
    let mut names: Vec<&str> = program
        .procs
        .iter()
        .map(|p| p.name.as_str())
        .filter(|name| name.starts_with("new_"))
        .collect();
    names.sort_unstable();
    assert_eq!(names, vec!["new_array_boolean", "new_array_int", "new_class_P"]);
    let array_structs: Vec<&str> = program
        .structs
        .iter()
        .map(|s| s.name.as_str())
        .filter(|name| name.starts_with("array_"))
        .collect();
    assert_eq!(array_structs, vec!["array_int", "array_boolean"]);
}

#[test]
fn nested_array_types_get_their_own_structs() {
    let program = compile("int main() { int[][] m; m = new int[2][]; m[0] = new int[3]; return 0; }");
    let names: Vec<&str> = program.structs.iter().map(|s| s.name.as_str()).collect();
    assert!(names.contains(&"array_int"), "{names:?}");
    assert!(names.contains(&"array_int_array"), "{names:?}");
    assert!(program.find_proc("new_array_int_array").is_some());
    assert!(program.find_proc("new_array_int").is_some());
}

#[test]
fn every_block_is_terminated_and_named_uniquely() {
    let program = compile(
        "int f(int n) { while (0 < n) { if (n == 3) { return n; } n = n - 1; } return 0 / 1; }
         int main() { int[] a; a = new int[2]; return f(a.length) + a[1]; }",
    );
    for proc in &program.procs {
        let mut names: Vec<&str> = proc.blocks.iter().map(|b| b.name.as_str()).collect();
        let count = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), count, "duplicate labels in {}", proc.name);
        for block in &proc.blocks {
            for target in block.terminator.successors() {
                assert!((target.0 as usize) < proc.blocks.len());
            }
        }
    }
}

#[test]
fn unchecked_programs_are_refused() {
    let program = quill_parser::parse("int main() { return true; }").into_result().unwrap();
    let typeck = quill_typeck::check(&program);
    assert_eq!(
        translate(&program, &typeck).unwrap_err(),
        CodegenError::UncheckedProgram { errors: 1 }
    );
}

#[test]
fn statement_comments_are_optional() {
    let source = "int main() {\n  int x;\n  x = 1;\n  return x;\n}";
    let count_comments = |program: &quill_ir::Program| {
        program
            .procs
            .iter()
            .flat_map(|p| &p.blocks)
            .flat_map(|b| &b.instrs)
            .filter(|i| matches!(i, Instr::Comment(_)))
            .count()
    };
    assert_eq!(count_comments(&compile(source)), 0);

    let options = Options {
        statement_comments: true,
    };
    let program = support::compile_with(source, &options);
    let main = program.proc(program.find_proc("main").unwrap()).unwrap();
    let comments: Vec<&str> = main.blocks[0]
        .instrs
        .iter()
        .filter_map(|i| match i {
            Instr::Comment(text) => Some(text.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(comments, vec!["line 2: declaration", "line 3: assignment", "line 4: return"]);
}

#[test]
fn renamed_print_builtin_lowers_to_print() {
    let analysis = quill_typeck::Options {
        print_intrinsic: "println".to_string(),
    };
    let program = quill_parser::parse("int main() { println(3); return 0; }")
        .into_result()
        .unwrap();
    let typeck = quill_typeck::check_with(&program, &analysis);
    assert!(typeck.ok(), "{:?}", typeck.diagnostics());
    let ir = translate(&program, &typeck).unwrap();
    let main = ir.proc(ir.find_proc("main").unwrap()).unwrap();
    assert_eq!(main.blocks[0].instrs, vec![Instr::Print { value: Operand::Int(3) }]);
    assert_eq!(Interpreter::new(&ir).run_main().output, vec![3]);

    let old_name = quill_parser::parse("int main() { printInt(3); return 0; }")
        .into_result()
        .unwrap();
    let typeck = quill_typeck::check_with(&old_name, &analysis);
    assert!(!typeck.ok());
    assert!(matches!(
        translate(&old_name, &typeck),
        Err(CodegenError::UncheckedProgram { .. })
    ));
}

#[test]
fn options_deserialize_with_defaults() {
    let options: Options = serde_json::from_str(r#"{ "statement_comments": true }"#).unwrap();
    assert!(options.statement_comments);
    let options: Options = serde_json::from_str("{}").unwrap();
    assert_eq!(options, Options::default());

    let analysis: quill_typeck::Options = serde_json::from_str(r#"{ "print_intrinsic": "show" }"#).unwrap();
    assert_eq!(analysis.print_intrinsic, "show");
    let analysis: quill_typeck::Options = serde_json::from_str("{}").unwrap();
    assert_eq!(analysis.print_intrinsic, "printInt");
}

#[test]
fn program_serializes_to_json() {
    let program = compile("int main() { printInt(1); return 0; }");
    let json = serde_json::to_value(&program).unwrap();
    assert_eq!(json["procs"][0]["name"], "main");
    assert_eq!(json["procs"][0]["blocks"][0]["instrs"][0]["Print"]["value"]["Int"], 1);
}

//! Generated programs, executed.

mod support;

use quill_ir::{BinOp, Instr, Operand};
use support::{compile, run_source, Exit, Interpreter};

fn output_of(source: &str) -> Vec<i32> {
    let run = run_source(source);
    assert_eq!(run.exit, Exit::Returned(0), "output so far: {:?}", run.output);
    run.output
}

fn halt_of(source: &str) -> String {
    match run_source(source).exit {
        Exit::Halted(message) => message,
        Exit::Returned(value) => panic!("expected a halt, returned {value}"),
    }
}

#[test]
fn returns_main_result() {
    assert_eq!(run_source("int main() { return 6 * 7; }").exit, Exit::Returned(42));
}

#[test]
fn arithmetic_wraps() {
    let run = run_source("int main() { return 2147483647 + 1; }");
    assert_eq!(run.exit, Exit::Returned(i32::MIN));
}

#[test]
fn min_int_divided_by_minus_one_is_min_int() {
    let run = run_source("int main() { return -2147483648 / -1; }");
    assert_eq!(run.exit, Exit::Returned(i32::MIN));
}

#[test]
fn division_truncates_toward_zero() {
    assert_eq!(output_of("int main() { printInt(-7 / 2); printInt(7 / -2); return 0; }"), vec![-3, -3]);
}

#[test]
fn division_by_zero_halts() {
    let source = "int main() {\n  int z;\n  z = 0;\n  printInt(1);\n  return 5 / z;\n}";
    let run = run_source(source);
    assert_eq!(run.output, vec![1]);
    assert_eq!(run.exit, Exit::Halted("Division by zero in line 5".to_string()));
}

#[test]
fn out_of_bounds_store_halts_before_storing() {
    let message = halt_of("int main() { int[] a; a = new int[3]; a[5] = 1; return 0; }");
    assert_eq!(message, "Index out of bounds error in line 1");
}

#[test]
fn negative_index_is_out_of_bounds() {
    let message = halt_of("int main() {\n  int[] a;\n  a = new int[3];\n  return a[0 - 1];\n}");
    assert_eq!(message, "Index out of bounds error in line 4");
}

#[test]
fn arrays_are_zero_initialized() {
    let output = output_of(
        "int main() {
           int[] a; a = new int[3];
           boolean[] b; b = new boolean[2];
           printInt(a[2]);
           if (b[1]) { printInt(1); } else { printInt(0); }
           printInt(a.length);
           return 0;
         }",
    );
    assert_eq!(output, vec![0, 0, 3]);
}

#[test]
fn negative_array_size_halts() {
    assert_eq!(
        halt_of("int main() { int[] a; a = new int[0 - 2]; return 0; }"),
        "Array size must be non-negative"
    );
}

#[test]
fn empty_arrays_are_fine() {
    assert_eq!(output_of("int main() { int[] a; a = new int[0]; printInt(a.length); return 0; }"), vec![0]);
}

#[test]
fn null_dereferences_halt() {
    let field = "class A { int x; }\nint main() {\n  A a;\n  return a.x;\n}";
    assert_eq!(halt_of(field), "Nullpointer exception in line 4");

    let method = "class A { int f() { return 1; } }\nint main() {\n  A a;\n  a = null;\n  return a.f();\n}";
    assert_eq!(halt_of(method), "Nullpointer exception in line 5");

    let length = "int main() {\n  int[] a;\n  return a.length;\n}";
    assert_eq!(halt_of(length), "Nullpointer exception in line 3");

    let index = "int main() {\n  int[] a;\n  a[0] = 1;\n  return 0;\n}";
    assert_eq!(halt_of(index), "Nullpointer exception in line 3");
}

#[test]
fn failed_allocation_halts() {
    let program = compile("class A { int x; } int main() { A a; a = new A(); return 0; }");
    let run = Interpreter::new(&program).with_allocation_limit(0).run_main();
    assert_eq!(run.exit, Exit::Halted("Out of memory exception".to_string()));

    let program = compile("int main() { int[] a; a = new int[4]; return 0; }");
    let run = Interpreter::new(&program).with_allocation_limit(0).run_main();
    assert_eq!(run.exit, Exit::Halted("Out of memory exception".to_string()));
}

#[test]
fn arrays_too_large_to_address_halt() {
    let message = halt_of("int main() { int[] a; a = new int[536870912]; return a.length; }");
    assert_eq!(message, "Out of memory exception");

    let message = halt_of("int main() { boolean[] a; a = new boolean[2147483647]; return 0; }");
    assert_eq!(message, "Out of memory exception");
}

#[test]
fn array_size_limit_leaves_room_for_the_header() {
    let program = compile("int main() { int[] a; a = new int[3]; return 0; }");
    let new_array = program.find_proc("new_array_int").unwrap();
    let body = program.proc(new_array).unwrap();
    let limit = body
        .blocks
        .iter()
        .flat_map(|block| &block.instrs)
        .find_map(|instr| match instr {
            Instr::Binary {
                op: BinOp::Lt,
                lhs: Operand::Int(limit),
                ..
            } => Some(*limit),
            _ => None,
        });
    assert_eq!(limit, Some((i32::MAX - 4) / 4));
}

#[test]
fn falling_off_a_function_halts() {
    let message = halt_of(
        "int f(boolean b) { if (b) { return 1; } }
         int main() { printInt(f(true)); return f(false); }",
    );
    assert_eq!(message, "Missing return statement in f");
}

#[test]
fn and_short_circuits() {
    let output = output_of(
        "int main() {
           int[] a;
           if (false && a.length == 0) { printInt(1); } else { printInt(2); }
           a = new int[1];
           if (true && a.length == 1) { printInt(3); }
           return 0;
         }",
    );
    assert_eq!(output, vec![2, 3]);
}

#[test]
fn unary_operators() {
    assert_eq!(
        output_of("int main() { int x; x = 5; printInt(-x); if (!(x < 3)) { printInt(1); } return 0; }"),
        vec![-5, 1]
    );
}

#[test]
fn loops_and_recursion() {
    let output = output_of(
        "int fact(int n) { if (n < 2) { return 1; } return n * fact(n - 1); }
         int main() {
           int i; i = 0;
           while (i < 5) { printInt(fact(i)); i = i + 1; }
           return 0;
         }",
    );
    assert_eq!(output, vec![1, 1, 2, 6, 24]);
}

#[test]
fn parameters_are_assignable_copies() {
    let output = output_of(
        "int bump(int n) { n = n + 1; return n; }
         int main() { int x; x = 1; printInt(bump(x)); printInt(x); return 0; }",
    );
    assert_eq!(output, vec![2, 1]);
}

#[test]
fn locals_are_reset_at_their_declaration() {
    let output = output_of(
        "int main() {
           int i; i = 0;
           while (i < 2) { int x; printInt(x); x = 7; i = i + 1; }
           return 0;
         }",
    );
    assert_eq!(output, vec![0, 0]);
}

#[test]
fn reference_equality() {
    let output = output_of(
        "class A { } class B extends A { }
         int main() {
           A a; B b; B c;
           b = new B(); c = new B();
           a = b;
           if (a == b) { printInt(1); }
           if (a == c) { printInt(2); }
           if (null == a) { printInt(3); }
           a = null;
           if (a == null) { printInt(4); }
           return 0;
         }",
    );
    assert_eq!(output, vec![1, 4]);
}

#[test]
fn multi_dimensional_arrays() {
    let output = output_of(
        "int main() {
            MultiDimArrayClass[][] a;
            a = new MultiDimArrayClass[3][];
            int i;
            i = 0;
            while (i < 3) {
                a[i] = new MultiDimArrayClass[9];
                int j;
                j = 0;
                while (j < 9) {
                    a[i][j] = new MultiDimArrayClass();
                    j = j + 1;
                }
                i = i + 1;
            }
            i = 0;
            while (i < 9) {
                a[1][i].x = i;
                i = i + 1;
            }
            i = 0;
            while (i < 9) {
                printInt(a[1][i].x);
                i = i + 1;
            }
            return 0;
        }
        class MultiDimArrayClass { int x; }",
    );
    assert_eq!(output, (0..9).collect::<Vec<_>>());
}

#[test]
fn method_overriding() {
    let output = output_of(
        "int main() {
            MethodOverridingClass1 a;
            MethodOverridingClass2 b;
            a = new MethodOverridingClass1();
            b = new MethodOverridingClass2();
            printInt(a.f());
            printInt(a.g());
            printInt(b.f());
            printInt(b.g());
            a = b;
            printInt(a.f());
            printInt(a.g());
            return 0;
        }
        class MethodOverridingClass1 {
            int f() { return 0; }
            int g() { return 0; }
        }
        class MethodOverridingClass2 extends MethodOverridingClass1 {
            int f() { return 1; }
        }",
    );
    assert_eq!(output, vec![0, 0, 1, 0, 1, 0]);
}

#[test]
fn field_hiding() {
    let output = output_of(
        "int main() {
            FieldHidingClass2 a;
            a = new FieldHidingClass2();
            a.p1(); a.p2();
            a.f();
            a.p1(); a.p2();
            a.g();
            a.p1(); a.p2();
            return 0;
        }
        class FieldHidingClass1 {
            int x;
            int f() { this.x = -1; return 0; }
            int p1() { printInt(this.x); return 0; }
        }
        class FieldHidingClass2 extends FieldHidingClass1 {
            boolean x;
            int g() { this.x = true; return 0; }
            int p2() { if (x) printInt(1); else printInt(0); return 0; }
        }",
    );
    assert_eq!(output, vec![0, 0, -1, 0, -1, 1]);
}

#[test]
fn field_shadowing_by_locals_and_parameters() {
    let output = output_of(
        "int main() {
            FieldShadowingClass a;
            a = new FieldShadowingClass();
            a.f();
            a.g(0);
            return 0;
        }
        class FieldShadowingClass {
            int x;
            int f() {
                int x;
                printInt(this.x);
                x = 1;
                printInt(x);
                printInt(this.x);
                return 0;
            }
            int g(int x) {
                printInt(this.x);
                x = 1;
                printInt(x);
                printInt(this.x);
                return 0;
            }
        }",
    );
    assert_eq!(output, vec![0, 1, 0, 0, 1, 0]);
}

#[test]
fn cross_references() {
    let output = output_of(
        "int main() {
          new CrossRefClass1().b();
          return 0;
        }
        class CrossRefClass1 {
            int x;
            CrossRefClass2 refB;
            int b() { refB = new CrossRefClass2(); this.rb(refB); return 0; }
            int rb(CrossRefClass2 b) {
                b.y = 1;
                if (x < 1) { b.c(); } else x = x;
                printInt(b.y);
                return 0;
            }
        }
        class CrossRefClass2 extends CrossRefClass1 {
            int y;
            CrossRefClass3 refC;
            int c() { refC = new CrossRefClass3(); this.rc(refC); return 0; }
            int rc(CrossRefClass3 c) { c.z = 1; c.a(); printInt(c.z); return 0; }
        }
        class CrossRefClass3 extends CrossRefClass2 {
            int z;
            CrossRefClass1 refA;
            int a() { refA = new CrossRefClass1(); this.ra(refA); return 0; }
            int ra(CrossRefClass1 a) {
                a.x = 1;
                a.b();
                printInt(a.x);
                this.x = 1;
                this.b();
                printInt(this.x);
                return 0;
            }
        }",
    );
    assert_eq!(output, vec![1; 6]);
}

#[test]
fn self_references() {
    let output = output_of(
        "int main() { new SelfRefClass().f(); return 0; }
        class SelfRefClass {
            SelfRefClass x;
            SelfRefClass[] y;
            int z;
            int f() {
                this.z = 9;
                x = new SelfRefClass();
                printInt(this.z);
                printInt(x.z);
                y = new SelfRefClass[4];
                printInt(y.length);
                return 0;
            }
        }",
    );
    assert_eq!(output, vec![9, 0, 4]);
}

#[test]
fn subclass_arguments_and_returns_are_cast() {
    let output = output_of(
        "class Shape { int area() { return 0; } }
         class Square extends Shape { int side; int area() { return side * side; } }
         int measure(Shape s) { return s.area(); }
         Shape make(int side) { Square q; q = new Square(); q.side = side; return q; }
         int main() {
           Shape[] shapes; shapes = new Shape[2];
           shapes[0] = make(3);
           shapes[1] = new Shape();
           printInt(measure(shapes[0]));
           printInt(measure(shapes[1]));
           return 0;
         }",
    );
    assert_eq!(output, vec![9, 0]);
}

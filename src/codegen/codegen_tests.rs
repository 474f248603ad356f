use super::*;
use crate::parser;

fn gen(source: &str) -> String {
    let ast = parser::parse(source).unwrap();
    CodeGenerator::new().generate(&ast).unwrap()
}

fn gen_err(source: &str) -> CodegenError {
    let ast = parser::parse(source).unwrap();
    CodeGenerator::new().generate(&ast).unwrap_err()
}

fn position(haystack: &str, needle: &str) -> usize {
    haystack
        .find(needle)
        .unwrap_or_else(|| panic!("`{needle}` not found in:\n{haystack}"))
}

#[test]
fn test_preamble() {
    let ir = gen("int main() { return 0; }");
    assert!(ir.starts_with("; LLVM IR Generated Code\n"));
    assert!(ir.contains("target triple = \"x86_64-unknown-linux-gnu\""));
    assert!(ir.contains("declare i32 @printf(i8* nocapture readonly, ...)"));
    assert!(ir.contains("declare i32 @scanf(i8* nocapture readonly, ...)"));
}

#[test]
fn test_return_constant() {
    let ir = gen("int main() { return 42; }");
    assert!(ir.contains("define i32 @main() {"));
    assert!(!ir.contains("alloca"));
    let load = position(&ir, "%t0 = add i32 42, 0");
    let ret = position(&ir, "ret i32 %t0");
    assert!(load < ret);
    // fallthrough return and closing brace after the explicit return
    let default_ret = position(&ir, "ret i32 0");
    assert!(ret < default_ret);
    assert!(ir.trim_end().ends_with('}'));
}

#[test]
fn test_one_entry_label_per_define() {
    let ir = gen("int f() { return 1; } int g() { return 2; } int main() { return 0; }");
    assert_eq!(3, ir.matches("define ").count());
    assert_eq!(3, ir.matches("entry:").count());
}

#[test]
fn test_parameters_are_ssa_names() {
    let source = "int add(int a, int b) { return a + b; } int main() { return add(2, 3); }";
    let ir = gen(source);
    assert!(ir.contains("define i32 @add(i32 %a, i32 %b) {"));
    // parameters are read directly, never through a load
    assert!(!ir.contains("load i32, i32* %a"));
    assert!(ir.contains("add i32 %a, %b"));
    assert!(ir.contains("call i32 @add(i32 %t"));
}

#[test]
fn test_local_variable_roundtrip() {
    let ir = gen("int main() { int x = 3; return x; }");
    let alloca = position(&ir, "%x = alloca i32");
    let init = position(&ir, "%t0 = add i32 3, 0");
    let store = position(&ir, "store i32 %t0, i32* %x");
    let load = position(&ir, "load i32, i32* %x");
    assert!(alloca < init && init < store && store < load);
}

#[test]
fn test_uninitialized_local_is_zeroed() {
    let ir = gen("int main() { int x; return x; }");
    assert!(ir.contains("store i32 0, i32* %x"));
}

#[test]
fn test_arithmetic_operators() {
    let ir = gen("int main() { return 1 + 2 * 3 - 4 / 2; }");
    assert!(ir.contains("mul i32"));
    assert!(ir.contains("sdiv i32"));
    assert!(ir.contains("sub i32"));
}

#[test]
fn test_comparison_feeds_branch_directly() {
    let ir = gen("int main() { if (1 == 1) return 1; else return 2; return 0; }");
    assert!(ir.contains("icmp eq i32"));
    // then/else/end are allocated in one batch
    assert!(ir.contains("br i1 %t2, label %label0, label %label1"));
    assert!(ir.contains("label0:"));
    assert!(ir.contains("label1:"));
    assert!(ir.contains("label2:"));
}

#[test]
fn test_if_without_else_branches_to_end() {
    let ir = gen("int main() { if (1) return 1; return 0; }");
    // condition is narrowed to i1, else label is allocated but unused
    assert!(ir.contains("icmp ne i32 %t0, 0"));
    assert!(ir.contains("br i1 %t1, label %label0, label %label2"));
    assert!(!ir.contains("label1:"));
}

#[test]
fn test_comparison_widens_for_integer_consumer() {
    let ir = gen("int main() { int x; x = 1 < 2; return x; }");
    let icmp = position(&ir, "%t2 = icmp slt i32 %t0, %t1");
    let zext = position(&ir, "%t3 = zext i1 %t2 to i32");
    let store = position(&ir, "store i32 %t3, i32* %x");
    assert!(icmp < zext && zext < store);
}

#[test]
fn test_while_loop_shape() {
    let ir = gen("int main() { int i = 0; while (i < 3) i = i + 1; return i; }");
    // cond, body, end in allocation order; back edge from the body
    assert!(ir.contains("br label %label0"));
    assert!(ir.contains("label0:"));
    assert!(ir.contains("br i1 %t3, label %label1, label %label2"));
    assert_eq!(2, ir.matches("br label %label0").count());
}

#[test]
fn test_for_loop_labels_in_order() {
    let source =
        "int main() { int result = 0; int i; for (i = 0; i < 5; i = i + 1) result = result + i; return result; }";
    let ir = gen(source);
    let cond = position(&ir, "label0:");
    let body = position(&ir, "label1:");
    let incr = position(&ir, "label2:");
    let end = position(&ir, "label3:");
    assert!(cond < body && body < incr && incr < end);
    // back edges to the condition from both the initial jump and the increment
    assert_eq!(2, ir.matches("br label %label0").count());
    assert!(ir.contains(", label %label1, label %label3"));
    assert!(ir.contains("br label %label2"));
}

#[test]
fn test_for_without_condition_branches_to_body() {
    let ir = gen("int main() { for (;;) ; return 0; }");
    assert!(ir.contains("label0:\n  br label %label1"));
}

#[test]
fn test_for_header_declaration() {
    let ir = gen("int main() { for (int i = 0; i < 2; i = i + 1) ; return 0; }");
    let alloca = position(&ir, "%i = alloca i32");
    let cond = position(&ir, "label0:");
    assert!(alloca < cond);
}

#[test]
fn test_string_literal_constant() {
    let ir = gen("int main() { printf(\"hi\\n\"); return 0; }");
    let constant = position(&ir, "@str.0 = private constant [4 x i8] c\"hi\\0A\\00\"");
    let gep = position(&ir, "getelementptr [4 x i8], [4 x i8]* @str.0, i32 0, i32 0");
    let call = position(&ir, "call i32 @printf(i8* %t0)");
    assert!(constant < gep && gep < call);
}

#[test]
fn test_string_escape_conversion() {
    let ir = gen("int main() { printf(\"a\\t\\\"b\\\"\\\\\"); return 0; }");
    // a, tab, quote, b, quote, backslash, nul
    assert!(ir.contains("[7 x i8] c\"a\\09\\22b\\22\\5C\\00\""));
}

#[test]
fn test_unary_lowering() {
    let ir = gen("int main() { return -(!0); }");
    let not = position(&ir, "%t1 = icmp eq i32 %t0, 0");
    let zext = position(&ir, "%t2 = zext i1 %t1 to i32");
    let neg = position(&ir, "%t3 = sub i32 0, %t2");
    assert!(not < zext && zext < neg);
}

#[test]
fn test_unsupported_unary_operators() {
    assert_eq!(
        CodegenError::UnsupportedOperator("*".to_owned()),
        gen_err("int main() { int x; return *x; }")
    );
    assert_eq!(
        CodegenError::UnsupportedOperator("&".to_owned()),
        gen_err("int main() { int x; return &x; }")
    );
}

#[test]
fn test_undefined_variable_at_emission() {
    assert_eq!(
        CodegenError::UndefinedVariable("y".to_owned()),
        gen_err("int main() { return y; }")
    );
}

#[test]
fn test_void_function_and_call() {
    let ir = gen("void report() { return; } int main() { report(); return 0; }");
    assert!(ir.contains("define void @report() {"));
    assert!(ir.contains("  ret void"));
    assert!(ir.contains("  call void @report()"));
    assert!(!ir.contains("= call void"));
}

#[test]
fn test_assignment_value_is_stored_register() {
    let ir = gen("int main() { int x; int y; y = x = 5; return y; }");
    // x = 5 stores %t0 and the outer assignment stores the same register
    let first = position(&ir, "store i32 %t0, i32* %x");
    let second = position(&ir, "store i32 %t0, i32* %y");
    assert!(first < second);
}

#[test]
fn test_branch_targets_are_defined() {
    let source = "
        int main() {
            int i;
            for (i = 0; i < 3; i = i + 1) {
                if (i == 1) i = i + 2; else i = i + 1;
                while (i > 10) i = i - 1;
            }
            return i;
        }
    ";
    let ir = gen(source);
    for line in ir.lines() {
        let trimmed = line.trim();
        for target in trimmed
            .split("label %")
            .skip(1)
            .map(|rest| rest.split([',', ' ']).next().unwrap())
        {
            assert!(
                ir.contains(&format!("{target}:")),
                "branch target {target} has no label"
            );
        }
    }
}

use super::*;
use crate::parser;

fn analyze_source(source: &str) -> Result<SymbolTable> {
    let ast = parser::parse(source).unwrap();
    analyze(&ast)
}

#[test]
fn test_valid_program_passes() {
    let source = "
        int add(int a, int b) { return a + b; }
        int main() { int x = add(2, 3); return x; }
    ";
    assert!(analyze_source(source).is_ok());
}

#[test]
fn test_undeclared_identifier() {
    let result = analyze_source("int main() { return x; }");
    let err = result.unwrap_err();
    assert_eq!(SemanticError::UndeclaredIdentifier("x".to_owned()), err);
    assert_eq!("Undeclared identifier: x", err.to_string());
}

#[test]
fn test_redeclaration_in_same_scope() {
    let err = analyze_source("int main() { int i; int i; }").unwrap_err();
    assert_eq!(SemanticError::RedeclaredSymbol("i".to_owned()), err);
    assert!(err.to_string().starts_with("Redeclaration of symbol"));
}

#[test]
fn test_shadowing_in_inner_scope_is_allowed() {
    assert!(analyze_source("int main() { int x; { int x; } }").is_ok());
}

#[test]
fn test_block_scoped_name_is_invisible_outside() {
    let err = analyze_source("int main() { { int n; } return n; }").unwrap_err();
    assert_eq!(SemanticError::UndeclaredIdentifier("n".to_owned()), err);
}

#[test]
fn test_for_header_declaration_is_loop_local() {
    let source = "int main() { for (int i = 0; i < 3; i = i + 1) i; return i; }";
    let err = analyze_source(source).unwrap_err();
    assert_eq!(SemanticError::UndeclaredIdentifier("i".to_owned()), err);
}

#[test]
fn test_parameters_are_visible_in_body() {
    assert!(analyze_source("int id(int a) { return a; }").is_ok());
}

#[test]
fn test_local_may_shadow_parameter() {
    // the body block is nested inside the parameter scope
    assert!(analyze_source("int id(int a) { int a; return a; }").is_ok());
}

#[test]
fn test_call_arity_mismatch() {
    let source = "int add(int a, int b) { return a + b; } int main() { return add(2); }";
    let err = analyze_source(source).unwrap_err();
    assert_eq!(
        SemanticError::ArgumentCountMismatch {
            name: "add".to_owned(),
            expected: 2,
            got: 1,
        },
        err
    );
}

#[test]
fn test_call_of_undeclared_function() {
    let err = analyze_source("int main() { return f(); }").unwrap_err();
    assert_eq!(SemanticError::UndeclaredFunction("f".to_owned()), err);
}

#[test]
fn test_call_of_non_function() {
    let err = analyze_source("int main() { int x; return x(); }").unwrap_err();
    assert_eq!(SemanticError::NotAFunction("x".to_owned()), err);
}

#[test]
fn test_unknown_parameter_type() {
    let err = analyze_source("int f(float x);").unwrap_err();
    assert_eq!(SemanticError::UnknownType("float".to_owned()), err);
}

#[test]
fn test_assignment_to_declared_variable() {
    assert!(analyze_source("int main() { int x; x = 5; return x; }").is_ok());
}

#[test]
fn test_assignment_to_undeclared_variable() {
    let err = analyze_source("int main() { x = 5; return 0; }").unwrap_err();
    assert_eq!(SemanticError::UndeclaredIdentifier("x".to_owned()), err);
}

#[test]
fn test_forward_declaration_allows_call() {
    let source = "int add(int a, int b); int main() { return add(1, 2); }";
    assert!(analyze_source(source).is_ok());
}

#[test]
fn test_scope_stack_directly() {
    let mut table = SymbolTable::new();
    table
        .declare_symbol("x", TypeInfo::Int, SymbolKind::Variable, true)
        .unwrap();
    table.enter_scope();
    table
        .declare_symbol("x", TypeInfo::Char, SymbolKind::Variable, true)
        .unwrap();
    assert_eq!(TypeInfo::Char, table.lookup("x").unwrap().type_info);
    table.exit_scope();
    assert_eq!(TypeInfo::Int, table.lookup("x").unwrap().type_info);
    // the global scope survives a stray exit
    table.exit_scope();
    assert!(table.lookup("x").is_some());
}

#[test]
fn test_declare_function_records_parameters() {
    let mut table = SymbolTable::new();
    table
        .declare_function("add", TypeInfo::Int, vec![TypeInfo::Int, TypeInfo::Int])
        .unwrap();
    let entry = table.lookup("add").unwrap();
    assert!(entry.is_function());
    assert_eq!(Some(2), entry.param_count());
}

#[test]
fn test_struct_registry() {
    let mut table = SymbolTable::new();
    let point = table.define_struct_type("point");
    assert!(point.add_field("x", TypeInfo::Int));
    assert!(point.add_field("y", TypeInfo::Int));
    // duplicate field names are rejected
    assert!(!point.add_field("x", TypeInfo::Int));

    let found = table.find_struct_type("point").unwrap();
    assert_eq!("struct point", found.name());
    assert_eq!(found, &table.resolve_type("struct point").unwrap());
    assert_eq!(None, table.resolve_type("struct absent"));
}

#[test]
fn test_type_names_and_ir_names() {
    let int_ptr = TypeInfo::Pointer(Box::new(TypeInfo::Int));
    assert_eq!("int*", int_ptr.name());
    assert_eq!("i32*", int_ptr.ir_name());

    let char_array = TypeInfo::Array(Box::new(TypeInfo::Char), 4);
    assert_eq!("char[4]", char_array.name());
    assert_eq!("[4 x i8]", char_array.ir_name());

    let s = TypeInfo::Struct("point".to_owned(), Vec::new());
    assert_eq!("%struct.point", s.ir_name());
    assert_eq!("void", TypeInfo::Void.ir_name());
}

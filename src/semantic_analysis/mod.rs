mod symbol_table;

#[cfg(test)]
mod sema_tests;

use crate::ast::*;
pub use symbol_table::{SymbolEntry, SymbolKind, SymbolTable, TypeInfo};

use std::fmt;

pub type Result<T> = std::result::Result<T, SemanticError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SemanticError {
    UndeclaredIdentifier(Identifier),
    RedeclaredSymbol(Identifier),
    UnknownType(Identifier),
    UndeclaredFunction(Identifier),
    NotAFunction(Identifier),
    ArgumentCountMismatch {
        name: Identifier,
        expected: usize,
        got: usize,
    },
}

impl fmt::Display for SemanticError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::UndeclaredIdentifier(name) => write!(f, "Undeclared identifier: {name}"),
            Self::RedeclaredSymbol(name) => write!(f, "Redeclaration of symbol: {name}"),
            Self::UnknownType(spelling) => write!(f, "Unknown type name: {spelling}"),
            Self::UndeclaredFunction(name) => write!(f, "Call to undeclared function {name}"),
            Self::NotAFunction(name) => {
                write!(f, "Called object is not a function: {name}")
            }
            Self::ArgumentCountMismatch {
                name,
                expected,
                got,
            } => write!(
                f,
                "Function {name} called with {got} arguments, but expected {expected}"
            ),
        }
    }
}

impl std::error::Error for SemanticError {}

/// Validates the tree and builds the symbol table. The first error stops the
/// walk; scopes opened on the way down are closed on every exit path.
pub fn analyze(ast: &Ast) -> Result<SymbolTable> {
    let mut table = SymbolTable::new();
    for item in &ast.items {
        analyze_item(&mut table, item)?;
    }
    Ok(table)
}

fn analyze_item(table: &mut SymbolTable, item: &BlockItem) -> Result<()> {
    match item {
        BlockItem::D(declaration) => analyze_declaration(table, declaration),
        BlockItem::S(statement) => analyze_statement(table, statement),
    }
}

fn analyze_declaration(table: &mut SymbolTable, declaration: &Declaration) -> Result<()> {
    match declaration {
        Declaration::Fun(fun) => analyze_fundec(table, fun),
        Declaration::Var(var) => analyze_vardec(table, var),
    }
}

fn resolve_type(table: &SymbolTable, spelling: &str) -> Result<TypeInfo> {
    table
        .resolve_type(spelling)
        .ok_or_else(|| SemanticError::UnknownType(spelling.to_owned()))
}

fn analyze_fundec(table: &mut SymbolTable, fun: &FunDec) -> Result<()> {
    let return_type = resolve_type(table, &fun.return_type)?;
    let param_types = fun
        .params
        .iter()
        .map(|param| resolve_type(table, &param.type_name))
        .collect::<Result<Vec<TypeInfo>>>()?;

    table.declare_function(&fun.name, return_type, param_types.clone())?;

    let Some(body) = &fun.body else {
        return Ok(());
    };

    // Parameters live in a scope of their own; the body block opens another
    // one inside it.
    table.enter_scope();
    let result = fun
        .params
        .iter()
        .zip(param_types)
        .try_for_each(|(param, param_type)| {
            table.declare_symbol(&param.name, param_type, SymbolKind::Parameter, true)
        })
        .and_then(|()| analyze_block(table, body));
    table.exit_scope();
    result
}

fn analyze_vardec(table: &mut SymbolTable, var: &VarDec) -> Result<()> {
    let type_info = resolve_type(table, &var.type_name)?;
    if let Some(init) = &var.init {
        analyze_exp(table, init)?;
    }
    // Declarations without initializers still count as initialized; there is
    // no definite-assignment analysis to back a stricter answer.
    table.declare_symbol(&var.name, type_info, SymbolKind::Variable, true)
}

fn analyze_block(table: &mut SymbolTable, block: &Block) -> Result<()> {
    table.enter_scope();
    let result = block
        .items
        .iter()
        .try_for_each(|item| analyze_item(table, item));
    table.exit_scope();
    result
}

fn analyze_optional_exp(table: &mut SymbolTable, exp: &Option<Exp>) -> Result<()> {
    exp.as_ref().map_or(Ok(()), |exp| analyze_exp(table, exp))
}

fn analyze_statement(table: &mut SymbolTable, statement: &Statement) -> Result<()> {
    match statement {
        Statement::Compound(block) => analyze_block(table, block),
        Statement::Exp(exp) => analyze_optional_exp(table, exp),
        Statement::Return(value) => analyze_optional_exp(table, value),
        Statement::If(if_st) => {
            analyze_exp(table, &if_st.condition)?;
            analyze_statement(table, &if_st.then)?;
            if_st
                .els
                .as_ref()
                .map_or(Ok(()), |els| analyze_statement(table, els))
        }
        Statement::While(while_st) => {
            analyze_exp(table, &while_st.condition)?;
            analyze_statement(table, &while_st.body)
        }
        Statement::For(for_st) => {
            // the header declaration is visible only within the loop
            table.enter_scope();
            let result = analyze_for(table, for_st);
            table.exit_scope();
            result
        }
    }
}

fn analyze_for(table: &mut SymbolTable, for_st: &For) -> Result<()> {
    match &for_st.init {
        ForInit::Decl(var) => analyze_vardec(table, var)?,
        ForInit::Exp(exp) => analyze_optional_exp(table, exp)?,
    }
    analyze_optional_exp(table, &for_st.condition)?;
    analyze_optional_exp(table, &for_st.post)?;
    analyze_statement(table, &for_st.body)
}

fn analyze_call(table: &mut SymbolTable, name: &str, args: &[Exp]) -> Result<()> {
    let entry = table
        .lookup(name)
        .ok_or_else(|| SemanticError::UndeclaredFunction(name.to_owned()))?;
    if !entry.is_function() {
        return Err(SemanticError::NotAFunction(name.to_owned()));
    }
    let expected = entry.param_count().unwrap_or(0);
    if expected != args.len() {
        return Err(SemanticError::ArgumentCountMismatch {
            name: name.to_owned(),
            expected,
            got: args.len(),
        });
    }
    args.iter().try_for_each(|arg| analyze_exp(table, arg))
}

fn analyze_exp(table: &mut SymbolTable, exp: &Exp) -> Result<()> {
    match exp {
        Exp::Var(name) => {
            table
                .lookup(name)
                .ok_or_else(|| SemanticError::UndeclaredIdentifier(name.clone()))?;
            Ok(())
        }
        Exp::Assignment(target, value) => {
            analyze_exp(table, target)?;
            analyze_exp(table, value)?;
            if let Exp::Var(name) = target.as_ref() {
                if let Some(entry) = table.lookup_mut(name) {
                    entry.is_initialized = true;
                }
            }
            Ok(())
        }
        Exp::Call(name, args) => analyze_call(table, name, args),
        Exp::Binary(_, left, right) => {
            analyze_exp(table, left)?;
            analyze_exp(table, right)
        }
        Exp::Unary(_, operand) => analyze_exp(table, operand),
        Exp::Number(_) | Exp::StringLit(_) => Ok(()),
    }
}

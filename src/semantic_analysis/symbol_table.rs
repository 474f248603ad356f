use crate::ast::Identifier;
use crate::semantic_analysis::{Result, SemanticError};

use std::fmt;

/// A resolved type. Constructed lazily from textual type spellings during
/// analysis; the pointer, array and struct shapes are reachable only through
/// the struct-type registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeInfo {
    Void,
    /// 32-bit signed
    Int,
    /// 8-bit
    Char,
    Pointer(Box<TypeInfo>),
    Array(Box<TypeInfo>, usize),
    Struct(Identifier, Vec<(Identifier, TypeInfo)>),
}

impl TypeInfo {
    /// The C spelling of this type, as shown in the symbol-table dump.
    pub fn name(&self) -> String {
        match self {
            Self::Void => "void".to_owned(),
            Self::Int => "int".to_owned(),
            Self::Char => "char".to_owned(),
            Self::Pointer(base) => format!("{}*", base.name()),
            Self::Array(base, size) => format!("{}[{size}]", base.name()),
            Self::Struct(name, _) => format!("struct {name}"),
        }
    }

    /// The LLVM IR spelling of this type.
    pub fn ir_name(&self) -> String {
        match self {
            Self::Void => "void".to_owned(),
            Self::Int => "i32".to_owned(),
            Self::Char => "i8".to_owned(),
            Self::Pointer(base) => format!("{}*", base.ir_name()),
            Self::Array(base, size) => format!("[{size} x {}]", base.ir_name()),
            Self::Struct(name, _) => format!("%struct.{name}"),
        }
    }

    /// Adds a field to a struct type. Fails on a duplicate field name or a
    /// non-struct receiver.
    pub fn add_field(&mut self, name: &str, field_type: TypeInfo) -> bool {
        let Self::Struct(_, fields) = self else {
            return false;
        };
        if fields.iter().any(|(existing, _)| existing == name) {
            return false;
        }
        fields.push((name.to_owned(), field_type));
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Variable,
    Function,
    Parameter,
    StructType,
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Variable => write!(f, "variable"),
            Self::Function => write!(f, "function"),
            Self::Parameter => write!(f, "parameter"),
            Self::StructType => write!(f, "struct type"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolEntry {
    pub name: Identifier,
    pub type_info: TypeInfo,
    pub kind: SymbolKind,
    pub is_initialized: bool,
    /// Parameter types, functions only.
    pub param_types: Option<Vec<TypeInfo>>,
}

impl SymbolEntry {
    #[inline]
    pub fn is_function(&self) -> bool {
        matches!(self.kind, SymbolKind::Function)
    }

    pub fn param_count(&self) -> Option<usize> {
        self.param_types.as_ref().map(Vec::len)
    }
}

#[derive(Debug, Default)]
struct Scope {
    symbols: Vec<SymbolEntry>,
}

impl Scope {
    fn get(&self, name: &str) -> Option<&SymbolEntry> {
        self.symbols.iter().find(|entry| entry.name == name)
    }
}

/// Lexically nested symbol table. Scopes form a stack rooted at the global
/// scope, which is never popped.
#[derive(Debug)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
    struct_types: Vec<TypeInfo>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::default()],
            struct_types: Vec::new(),
        }
    }

    pub fn enter_scope(&mut self) {
        self.scopes.push(Scope::default());
    }

    pub fn exit_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    /// Adds a symbol to the current scope. Fails if the scope already holds
    /// an entry with the same name; shadowing an outer scope is fine.
    pub fn declare_symbol(
        &mut self,
        name: &str,
        type_info: TypeInfo,
        kind: SymbolKind,
        is_initialized: bool,
    ) -> Result<()> {
        let scope = self.scopes.last_mut().expect("global scope always exists");
        if scope.get(name).is_some() {
            return Err(SemanticError::RedeclaredSymbol(name.to_owned()));
        }
        scope.symbols.push(SymbolEntry {
            name: name.to_owned(),
            type_info,
            kind,
            is_initialized,
            param_types: None,
        });
        Ok(())
    }

    pub fn declare_function(
        &mut self,
        name: &str,
        return_type: TypeInfo,
        param_types: Vec<TypeInfo>,
    ) -> Result<()> {
        self.declare_symbol(name, return_type, SymbolKind::Function, true)?;
        let scope = self.scopes.last_mut().expect("global scope always exists");
        let entry = scope.symbols.last_mut().expect("just declared");
        entry.param_types = Some(param_types);
        Ok(())
    }

    /// Walks from the innermost scope outward and returns the first match.
    pub fn lookup(&self, name: &str) -> Option<&SymbolEntry> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    pub fn lookup_mut(&mut self, name: &str) -> Option<&mut SymbolEntry> {
        self.scopes
            .iter_mut()
            .rev()
            .find_map(|scope| scope.symbols.iter_mut().find(|entry| entry.name == name))
    }

    /// Resolves a textual type spelling. `struct <name>` goes through the
    /// registry; the registry has no source syntax that populates it, so such
    /// spellings resolve only for types registered programmatically.
    pub fn resolve_type(&self, spelling: &str) -> Option<TypeInfo> {
        match spelling {
            "int" => Some(TypeInfo::Int),
            "char" => Some(TypeInfo::Char),
            "void" => Some(TypeInfo::Void),
            _ => spelling
                .strip_prefix("struct ")
                .and_then(|name| self.find_struct_type(name))
                .cloned(),
        }
    }

    pub fn define_struct_type(&mut self, name: &str) -> &mut TypeInfo {
        let struct_type = TypeInfo::Struct(name.to_owned(), Vec::new());
        self.struct_types.push(struct_type);
        self.struct_types.last_mut().expect("just pushed")
    }

    pub fn find_struct_type(&self, name: &str) -> Option<&TypeInfo> {
        self.struct_types
            .iter()
            .find(|t| matches!(t, TypeInfo::Struct(n, _) if n == name))
    }
}

// Snapshot of the surviving (global) scope, shown in verbose mode.
impl fmt::Display for SymbolTable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Symbol Table:")?;
        writeln!(f, "Global scope:")?;
        for entry in &self.scopes[0].symbols {
            let initialized = if entry.is_initialized {
                "initialized"
            } else {
                "uninitialized"
            };
            writeln!(
                f,
                "  {}: {} ({}, {})",
                entry.name,
                entry.type_info.name(),
                entry.kind,
                initialized
            )?;
        }
        Ok(())
    }
}

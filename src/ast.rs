use std::fmt;

pub type Identifier = String;

/// Root of the syntax tree: the ordered top-level items of one source file.
#[derive(Debug, Clone, PartialEq)]
pub struct Ast {
    pub items: Vec<BlockItem>,
}

/// A statement or a declaration. Blocks and the top level hold these.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockItem {
    S(Statement),
    D(Declaration),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Declaration {
    Fun(FunDec),
    Var(VarDec),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunDec {
    pub return_type: Identifier,
    pub name: Identifier,
    pub params: Vec<Param>,
    /// None for a forward declaration
    pub body: Option<Block>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub type_name: Identifier,
    pub name: Identifier,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarDec {
    pub type_name: Identifier,
    pub name: Identifier,
    pub init: Option<Exp>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub items: Vec<BlockItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct If {
    pub condition: Exp,
    pub then: Box<Statement>,
    pub els: Option<Box<Statement>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct While {
    pub condition: Exp,
    pub body: Box<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct For {
    pub init: ForInit,
    pub condition: Option<Exp>,
    pub post: Option<Exp>,
    pub body: Box<Statement>,
}

/// The first clause of a `for` header: a declaration, an expression, or a
/// bare semicolon.
#[derive(Debug, Clone, PartialEq)]
pub enum ForInit {
    Decl(VarDec),
    Exp(Option<Exp>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Compound(Block),
    If(If),
    While(While),
    For(For),
    Return(Option<Exp>),
    /// An expression statement; `None` is the empty statement `;`.
    Exp(Option<Exp>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Exp {
    Binary(BinaryOp, Box<Exp>, Box<Exp>),
    Unary(UnaryOp, Box<Exp>),
    /// The target must be a [`Exp::Var`]; the parser enforces this.
    Assignment(Box<Exp>, Box<Exp>),
    Call(Identifier, Vec<Exp>),
    Var(Identifier),
    /// Decimal text, kept as written.
    Number(String),
    /// Literal text, surrounding quotes and escape pairs included.
    StringLit(String),
}

impl Exp {
    #[inline]
    pub fn is_var(&self) -> bool {
        matches!(self, Self::Var(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    IsEqual,
    IsNotEqual,
    LessThan,
    LessOrEqual,
    GreaterThan,
    GreaterOrEqual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Negate,
    LogicalNot,
    AddressOf,
    Dereference,
}

impl BinaryOp {
    #[inline]
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            Self::IsEqual
                | Self::IsNotEqual
                | Self::LessThan
                | Self::LessOrEqual
                | Self::GreaterThan
                | Self::GreaterOrEqual
        )
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let lexeme = match self {
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::IsEqual => "==",
            Self::IsNotEqual => "!=",
            Self::LessThan => "<",
            Self::LessOrEqual => "<=",
            Self::GreaterThan => ">",
            Self::GreaterOrEqual => ">=",
        };
        write!(f, "{lexeme}")
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let lexeme = match self {
            Self::Negate => "-",
            Self::LogicalNot => "!",
            Self::AddressOf => "&",
            Self::Dereference => "*",
        };
        write!(f, "{lexeme}")
    }
}

// Indented tree dump, printed by the driver after a successful parse.

fn pad(f: &mut fmt::Formatter, indent: usize) -> fmt::Result {
    write!(f, "{:1$}", "", indent * 2)
}

fn write_item(f: &mut fmt::Formatter, item: &BlockItem, indent: usize) -> fmt::Result {
    match item {
        BlockItem::S(statement) => write_statement(f, statement, indent),
        BlockItem::D(declaration) => write_declaration(f, declaration, indent),
    }
}

fn write_declaration(f: &mut fmt::Formatter, dec: &Declaration, indent: usize) -> fmt::Result {
    match dec {
        Declaration::Fun(fun) => {
            pad(f, indent)?;
            write!(f, "Function: {} {}(", fun.return_type, fun.name)?;
            for (i, param) in fun.params.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{} {}", param.type_name, param.name)?;
            }
            writeln!(f, ")")?;
            if let Some(body) = &fun.body {
                write_block(f, body, indent + 1)?;
            }
            Ok(())
        }
        Declaration::Var(var) => write_vardec(f, var, indent),
    }
}

fn write_vardec(f: &mut fmt::Formatter, var: &VarDec, indent: usize) -> fmt::Result {
    pad(f, indent)?;
    writeln!(f, "Variable: {} {}", var.type_name, var.name)?;
    if let Some(init) = &var.init {
        pad(f, indent + 1)?;
        writeln!(f, "Initializer:")?;
        write_exp(f, init, indent + 2)?;
    }
    Ok(())
}

fn write_block(f: &mut fmt::Formatter, block: &Block, indent: usize) -> fmt::Result {
    pad(f, indent)?;
    writeln!(f, "Block:")?;
    for item in &block.items {
        write_item(f, item, indent + 1)?;
    }
    Ok(())
}

fn write_optional_exp(
    f: &mut fmt::Formatter,
    label: &str,
    exp: &Option<Exp>,
    indent: usize,
) -> fmt::Result {
    if let Some(exp) = exp {
        pad(f, indent)?;
        writeln!(f, "{label}:")?;
        write_exp(f, exp, indent + 1)?;
    }
    Ok(())
}

fn write_statement(f: &mut fmt::Formatter, statement: &Statement, indent: usize) -> fmt::Result {
    match statement {
        Statement::Compound(block) => write_block(f, block, indent),
        Statement::Exp(exp) => {
            pad(f, indent)?;
            writeln!(f, "Expression Statement:")?;
            match exp {
                Some(exp) => write_exp(f, exp, indent + 1),
                None => {
                    pad(f, indent + 1)?;
                    writeln!(f, "(empty)")
                }
            }
        }
        Statement::If(if_st) => {
            pad(f, indent)?;
            writeln!(f, "If Statement:")?;
            pad(f, indent + 1)?;
            writeln!(f, "Condition:")?;
            write_exp(f, &if_st.condition, indent + 2)?;
            pad(f, indent + 1)?;
            writeln!(f, "Then:")?;
            write_statement(f, &if_st.then, indent + 2)?;
            if let Some(els) = &if_st.els {
                pad(f, indent + 1)?;
                writeln!(f, "Else:")?;
                write_statement(f, els, indent + 2)?;
            }
            Ok(())
        }
        Statement::While(while_st) => {
            pad(f, indent)?;
            writeln!(f, "While Statement:")?;
            pad(f, indent + 1)?;
            writeln!(f, "Condition:")?;
            write_exp(f, &while_st.condition, indent + 2)?;
            pad(f, indent + 1)?;
            writeln!(f, "Body:")?;
            write_statement(f, &while_st.body, indent + 2)
        }
        Statement::For(for_st) => {
            pad(f, indent)?;
            writeln!(f, "For Statement:")?;
            match &for_st.init {
                ForInit::Decl(var) => {
                    pad(f, indent + 1)?;
                    writeln!(f, "Initializer:")?;
                    write_vardec(f, var, indent + 2)?;
                }
                ForInit::Exp(exp) => write_optional_exp(f, "Initializer", exp, indent + 1)?,
            }
            write_optional_exp(f, "Condition", &for_st.condition, indent + 1)?;
            write_optional_exp(f, "Increment", &for_st.post, indent + 1)?;
            pad(f, indent + 1)?;
            writeln!(f, "Body:")?;
            write_statement(f, &for_st.body, indent + 2)
        }
        Statement::Return(value) => {
            pad(f, indent)?;
            writeln!(f, "Return Statement:")?;
            match value {
                Some(exp) => write_exp(f, exp, indent + 1),
                None => {
                    pad(f, indent + 1)?;
                    writeln!(f, "(void)")
                }
            }
        }
    }
}

fn write_exp(f: &mut fmt::Formatter, exp: &Exp, indent: usize) -> fmt::Result {
    match exp {
        Exp::Binary(op, left, right) => {
            pad(f, indent)?;
            writeln!(f, "Binary Expression: {op}")?;
            pad(f, indent + 1)?;
            writeln!(f, "Left:")?;
            write_exp(f, left, indent + 2)?;
            pad(f, indent + 1)?;
            writeln!(f, "Right:")?;
            write_exp(f, right, indent + 2)
        }
        Exp::Unary(op, operand) => {
            pad(f, indent)?;
            writeln!(f, "Unary Expression: {op}")?;
            write_exp(f, operand, indent + 1)
        }
        Exp::Assignment(target, value) => {
            pad(f, indent)?;
            writeln!(f, "Assignment:")?;
            pad(f, indent + 1)?;
            writeln!(f, "Target:")?;
            write_exp(f, target, indent + 2)?;
            pad(f, indent + 1)?;
            writeln!(f, "Value:")?;
            write_exp(f, value, indent + 2)
        }
        Exp::Call(callee, args) => {
            pad(f, indent)?;
            writeln!(f, "Function Call: {callee}")?;
            for (i, arg) in args.iter().enumerate() {
                pad(f, indent + 1)?;
                writeln!(f, "Argument {}:", i + 1)?;
                write_exp(f, arg, indent + 2)?;
            }
            Ok(())
        }
        Exp::Var(name) => {
            pad(f, indent)?;
            writeln!(f, "Identifier: {name}")
        }
        Exp::Number(value) => {
            pad(f, indent)?;
            writeln!(f, "Number: {value}")
        }
        Exp::StringLit(value) => {
            pad(f, indent)?;
            writeln!(f, "String: {value}")
        }
    }
}

impl fmt::Display for Ast {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Program")?;
        for item in &self.items {
            write_item(f, item, 1)?;
        }
        Ok(())
    }
}

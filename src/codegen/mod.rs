#[cfg(test)]
mod codegen_tests;

use crate::ast::*;

use std::collections::HashMap;
use std::fmt::{self, Write};

pub type Result<T> = std::result::Result<T, CodegenError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodegenError {
    /// A node with no lowering, e.g. a bare statement at the top level.
    UnsupportedNode,
    UnsupportedOperator(String),
    UndefinedVariable(Identifier),
    InvalidAssignmentTarget,
    /// An expression with no result register was used for its value.
    MissingResult,
    Fmt,
}

impl fmt::Display for CodegenError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::UnsupportedNode => write!(f, "Unsupported node type for code generation"),
            Self::UnsupportedOperator(op) => write!(f, "Unsupported operator: {op}"),
            Self::UndefinedVariable(name) => write!(f, "Undefined variable: {name}"),
            Self::InvalidAssignmentTarget => write!(f, "Invalid assignment target"),
            Self::MissingResult => write!(f, "Missing result register for expression"),
            Self::Fmt => write!(f, "Failed to write generated code"),
        }
    }
}

impl std::error::Error for CodegenError {}

impl From<fmt::Error> for CodegenError {
    fn from(_: fmt::Error) -> Self {
        Self::Fmt
    }
}

/// An emitted value: the bare register name plus the IR type it has at the
/// point of emission. `Flag` is an `i1` comparison result that gets widened
/// only when a consumer needs an integer.
#[derive(Debug, Clone)]
enum Value {
    Int(String),
    Flag(String),
    Ptr(String),
    /// The non-value of a call to a void function.
    Void,
}

#[derive(Debug, Clone)]
struct LocalVar {
    register: String,
    /// false for parameters, which stay in their SSA names
    stack_allocated: bool,
}

fn ir_return_type(type_name: &str) -> &'static str {
    if type_name == "void" {
        "void"
    } else {
        "i32"
    }
}

/// Single-pass IR emitter. Registers `%tN` and labels `labelN` are numbered
/// monotonically across the whole run; the locals table is reset per
/// function.
pub struct CodeGenerator {
    output: String,
    temp_counter: u64,
    label_counter: u64,
    string_counter: u64,
    locals: HashMap<Identifier, LocalVar>,
    functions: HashMap<Identifier, String>,
}

impl Default for CodeGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeGenerator {
    pub fn new() -> Self {
        Self {
            output: String::new(),
            temp_counter: 0,
            label_counter: 0,
            string_counter: 0,
            locals: HashMap::new(),
            functions: HashMap::new(),
        }
    }

    /// Emits the whole module and returns its text.
    pub fn generate(mut self, ast: &Ast) -> Result<String> {
        self.emit_preamble()?;
        for item in &ast.items {
            match item {
                BlockItem::D(Declaration::Fun(fun)) => self.emit_function(fun)?,
                BlockItem::D(Declaration::Var(var)) => self.emit_vardec(var)?,
                BlockItem::S(_) => return Err(CodegenError::UnsupportedNode),
            }
        }
        Ok(self.output)
    }

    fn emit_preamble(&mut self) -> Result<()> {
        writeln!(self.output, "; LLVM IR Generated Code")?;
        writeln!(self.output, "target triple = \"x86_64-unknown-linux-gnu\"")?;
        writeln!(self.output)?;
        writeln!(self.output, "declare i32 @printf(i8* nocapture readonly, ...)")?;
        writeln!(self.output, "declare i32 @scanf(i8* nocapture readonly, ...)")?;
        writeln!(self.output)?;
        Ok(())
    }

    fn next_temp(&mut self) -> String {
        let n = self.temp_counter;
        self.temp_counter += 1;
        format!("t{n}")
    }

    fn next_label(&mut self) -> String {
        let n = self.label_counter;
        self.label_counter += 1;
        format!("label{n}")
    }

    fn next_string(&mut self) -> String {
        let n = self.string_counter;
        self.string_counter += 1;
        format!("str.{n}")
    }

    /// Widens a value to `i32` and returns its register name.
    fn as_int(&mut self, value: Value) -> Result<String> {
        match value {
            Value::Int(register) | Value::Ptr(register) => Ok(register),
            Value::Flag(flag) => {
                let register = self.next_temp();
                writeln!(self.output, "  %{register} = zext i1 %{flag} to i32")?;
                Ok(register)
            }
            Value::Void => Err(CodegenError::MissingResult),
        }
    }

    /// Narrows a value to `i1` for a branch condition.
    fn as_flag(&mut self, value: Value) -> Result<String> {
        match value {
            Value::Flag(register) => Ok(register),
            Value::Int(register) | Value::Ptr(register) => {
                let flag = self.next_temp();
                writeln!(self.output, "  %{flag} = icmp ne i32 %{register}, 0")?;
                Ok(flag)
            }
            Value::Void => Err(CodegenError::MissingResult),
        }
    }

    /// Renders a value as a typed call argument.
    fn as_argument(&mut self, value: Value) -> Result<String> {
        match value {
            Value::Ptr(register) => Ok(format!("i8* %{register}")),
            other => {
                let register = self.as_int(other)?;
                Ok(format!("i32 %{register}"))
            }
        }
    }

    fn emit_function(&mut self, fun: &FunDec) -> Result<()> {
        let return_type = ir_return_type(&fun.return_type);
        self.functions
            .insert(fun.name.clone(), return_type.to_owned());

        self.locals.clear();
        for param in &fun.params {
            self.locals.insert(
                param.name.clone(),
                LocalVar {
                    register: param.name.clone(),
                    stack_allocated: false,
                },
            );
        }

        write!(self.output, "define {return_type} @{}(", fun.name)?;
        for (i, param) in fun.params.iter().enumerate() {
            if i > 0 {
                write!(self.output, ", ")?;
            }
            write!(self.output, "i32 %{}", param.name)?;
        }
        writeln!(self.output, ") {{")?;
        writeln!(self.output, "entry:")?;

        if let Some(body) = &fun.body {
            self.emit_block(body)?;
        }

        // fallthrough return for bodies that do not end in one
        if return_type == "void" {
            writeln!(self.output, "  ret void")?;
        } else {
            writeln!(self.output, "  ret i32 0")?;
        }
        writeln!(self.output, "}}")?;
        writeln!(self.output)?;
        Ok(())
    }

    fn emit_vardec(&mut self, var: &VarDec) -> Result<()> {
        self.locals.insert(
            var.name.clone(),
            LocalVar {
                register: var.name.clone(),
                stack_allocated: true,
            },
        );
        writeln!(self.output, "  %{} = alloca i32", var.name)?;

        if let Some(init) = &var.init {
            let value = self.emit_exp(init)?;
            let register = self.as_int(value)?;
            writeln!(self.output, "  store i32 %{register}, i32* %{}", var.name)?;
        } else {
            writeln!(self.output, "  store i32 0, i32* %{}", var.name)?;
        }
        Ok(())
    }

    fn emit_block(&mut self, block: &Block) -> Result<()> {
        for item in &block.items {
            match item {
                BlockItem::S(statement) => self.emit_statement(statement)?,
                BlockItem::D(Declaration::Var(var)) => self.emit_vardec(var)?,
                BlockItem::D(Declaration::Fun(_)) => return Err(CodegenError::UnsupportedNode),
            }
        }
        Ok(())
    }

    fn emit_statement(&mut self, statement: &Statement) -> Result<()> {
        match statement {
            Statement::Compound(block) => self.emit_block(block),
            Statement::Exp(None) => Ok(()),
            Statement::Exp(Some(exp)) => self.emit_exp(exp).map(|_| ()),
            Statement::Return(None) => {
                writeln!(self.output, "  ret void")?;
                Ok(())
            }
            Statement::Return(Some(value)) => {
                let value = self.emit_exp(value)?;
                let register = self.as_int(value)?;
                writeln!(self.output, "  ret i32 %{register}")?;
                Ok(())
            }
            Statement::If(if_st) => self.emit_if(if_st),
            Statement::While(while_st) => self.emit_while(while_st),
            Statement::For(for_st) => self.emit_for(for_st),
        }
    }

    fn emit_if(&mut self, if_st: &If) -> Result<()> {
        let condition = self.emit_exp(&if_st.condition)?;
        let flag = self.as_flag(condition)?;

        let then_label = self.next_label();
        let else_label = self.next_label();
        let end_label = self.next_label();

        let false_target = if if_st.els.is_some() {
            &else_label
        } else {
            &end_label
        };
        writeln!(
            self.output,
            "  br i1 %{flag}, label %{then_label}, label %{false_target}"
        )?;

        writeln!(self.output, "{then_label}:")?;
        self.emit_statement(&if_st.then)?;
        writeln!(self.output, "  br label %{end_label}")?;

        if let Some(els) = &if_st.els {
            writeln!(self.output, "{else_label}:")?;
            self.emit_statement(els)?;
            writeln!(self.output, "  br label %{end_label}")?;
        }

        writeln!(self.output, "{end_label}:")?;
        Ok(())
    }

    fn emit_while(&mut self, while_st: &While) -> Result<()> {
        let cond_label = self.next_label();
        let body_label = self.next_label();
        let end_label = self.next_label();

        writeln!(self.output, "  br label %{cond_label}")?;
        writeln!(self.output, "{cond_label}:")?;
        let condition = self.emit_exp(&while_st.condition)?;
        let flag = self.as_flag(condition)?;
        writeln!(
            self.output,
            "  br i1 %{flag}, label %{body_label}, label %{end_label}"
        )?;

        writeln!(self.output, "{body_label}:")?;
        self.emit_statement(&while_st.body)?;
        writeln!(self.output, "  br label %{cond_label}")?;

        writeln!(self.output, "{end_label}:")?;
        Ok(())
    }

    fn emit_for(&mut self, for_st: &For) -> Result<()> {
        match &for_st.init {
            ForInit::Decl(var) => self.emit_vardec(var)?,
            ForInit::Exp(Some(exp)) => {
                self.emit_exp(exp)?;
            }
            ForInit::Exp(None) => {}
        }

        let cond_label = self.next_label();
        let body_label = self.next_label();
        let incr_label = self.next_label();
        let end_label = self.next_label();

        writeln!(self.output, "  br label %{cond_label}")?;
        writeln!(self.output, "{cond_label}:")?;
        if let Some(condition) = &for_st.condition {
            let condition = self.emit_exp(condition)?;
            let flag = self.as_flag(condition)?;
            writeln!(
                self.output,
                "  br i1 %{flag}, label %{body_label}, label %{end_label}"
            )?;
        } else {
            writeln!(self.output, "  br label %{body_label}")?;
        }

        writeln!(self.output, "{body_label}:")?;
        self.emit_statement(&for_st.body)?;
        writeln!(self.output, "  br label %{incr_label}")?;

        writeln!(self.output, "{incr_label}:")?;
        if let Some(post) = &for_st.post {
            self.emit_exp(post)?;
        }
        writeln!(self.output, "  br label %{cond_label}")?;

        writeln!(self.output, "{end_label}:")?;
        Ok(())
    }

    fn emit_exp(&mut self, exp: &Exp) -> Result<Value> {
        match exp {
            Exp::Number(value) => {
                let register = self.next_temp();
                writeln!(self.output, "  %{register} = add i32 {value}, 0")?;
                Ok(Value::Int(register))
            }
            Exp::Var(name) => self.emit_var(name),
            Exp::StringLit(lexeme) => self.emit_string(lexeme),
            Exp::Unary(op, operand) => self.emit_unary(*op, operand),
            Exp::Binary(op, left, right) => self.emit_binary(*op, left, right),
            Exp::Assignment(target, value) => self.emit_assignment(target, value),
            Exp::Call(name, args) => self.emit_call(name, args),
        }
    }

    fn emit_var(&mut self, name: &str) -> Result<Value> {
        let local = self
            .locals
            .get(name)
            .ok_or_else(|| CodegenError::UndefinedVariable(name.to_owned()))?
            .clone();
        if local.stack_allocated {
            let register = self.next_temp();
            writeln!(
                self.output,
                "  %{register} = load i32, i32* %{}",
                local.register
            )?;
            Ok(Value::Int(register))
        } else {
            // parameters are read straight from their SSA names
            Ok(Value::Int(local.register))
        }
    }

    fn emit_string(&mut self, lexeme: &str) -> Result<Value> {
        let content = lexeme.strip_prefix('"').unwrap_or(lexeme);
        let content = content.strip_suffix('"').unwrap_or(content);
        let bytes = decode_string(content);
        let len = bytes.len();
        let encoded = encode_ir_bytes(&bytes);

        let name = self.next_string();
        writeln!(
            self.output,
            "  @{name} = private constant [{len} x i8] c\"{encoded}\""
        )?;

        let register = self.next_temp();
        writeln!(
            self.output,
            "  %{register} = getelementptr [{len} x i8], [{len} x i8]* @{name}, i32 0, i32 0"
        )?;
        Ok(Value::Ptr(register))
    }

    fn emit_unary(&mut self, op: UnaryOp, operand: &Exp) -> Result<Value> {
        let operand = self.emit_exp(operand)?;
        let operand = self.as_int(operand)?;
        match op {
            UnaryOp::Negate => {
                let register = self.next_temp();
                writeln!(self.output, "  %{register} = sub i32 0, %{operand}")?;
                Ok(Value::Int(register))
            }
            UnaryOp::LogicalNot => {
                let flag = self.next_temp();
                writeln!(self.output, "  %{flag} = icmp eq i32 %{operand}, 0")?;
                let register = self.next_temp();
                writeln!(self.output, "  %{register} = zext i1 %{flag} to i32")?;
                Ok(Value::Int(register))
            }
            UnaryOp::AddressOf | UnaryOp::Dereference => {
                Err(CodegenError::UnsupportedOperator(op.to_string()))
            }
        }
    }

    fn emit_binary(&mut self, op: BinaryOp, left: &Exp, right: &Exp) -> Result<Value> {
        let left = self.emit_exp(left)?;
        let left = self.as_int(left)?;
        let right = self.emit_exp(right)?;
        let right = self.as_int(right)?;
        let register = self.next_temp();

        if op.is_comparison() {
            let condition = match op {
                BinaryOp::IsEqual => "eq",
                BinaryOp::IsNotEqual => "ne",
                BinaryOp::LessThan => "slt",
                BinaryOp::LessOrEqual => "sle",
                BinaryOp::GreaterThan => "sgt",
                BinaryOp::GreaterOrEqual => "sge",
                _ => unreachable!("checked by is_comparison"),
            };
            writeln!(
                self.output,
                "  %{register} = icmp {condition} i32 %{left}, %{right}"
            )?;
            return Ok(Value::Flag(register));
        }

        let instruction = match op {
            BinaryOp::Add => "add",
            BinaryOp::Subtract => "sub",
            BinaryOp::Multiply => "mul",
            BinaryOp::Divide => "sdiv",
            _ => unreachable!("comparisons handled above"),
        };
        writeln!(
            self.output,
            "  %{register} = {instruction} i32 %{left}, %{right}"
        )?;
        Ok(Value::Int(register))
    }

    fn emit_assignment(&mut self, target: &Exp, value: &Exp) -> Result<Value> {
        let Exp::Var(name) = target else {
            return Err(CodegenError::InvalidAssignmentTarget);
        };
        let value = self.emit_exp(value)?;
        let register = self.as_int(value)?;
        let local = self
            .locals
            .get(name)
            .ok_or_else(|| CodegenError::UndefinedVariable(name.clone()))?;
        writeln!(
            self.output,
            "  store i32 %{register}, i32* %{}",
            local.register
        )?;
        // the assignment's own value is the stored register
        Ok(Value::Int(register))
    }

    fn emit_call(&mut self, name: &str, args: &[Exp]) -> Result<Value> {
        let mut rendered = Vec::with_capacity(args.len());
        for arg in args {
            let value = self.emit_exp(arg)?;
            rendered.push(self.as_argument(value)?);
        }
        let arguments = rendered.join(", ");

        // external declarations like printf are not in the table; they
        // return i32
        let return_type = self
            .functions
            .get(name)
            .cloned()
            .unwrap_or_else(|| "i32".to_owned());

        if return_type == "void" {
            writeln!(self.output, "  call void @{name}({arguments})")?;
            Ok(Value::Void)
        } else {
            let register = self.next_temp();
            writeln!(
                self.output,
                "  %{register} = call {return_type} @{name}({arguments})"
            )?;
            Ok(Value::Int(register))
        }
    }
}

/// Resolves the escape pairs of a string lexeme into the bytes the constant
/// should hold, with the terminating zero appended.
fn decode_string(content: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(content.len() + 1);
    let mut chars = content.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            let mut buf = [0u8; 4];
            bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            continue;
        }
        match chars.next() {
            Some('n') => bytes.push(b'\n'),
            Some('t') => bytes.push(b'\t'),
            Some('r') => bytes.push(b'\r'),
            Some('0') => bytes.push(0),
            Some('\\') => bytes.push(b'\\'),
            Some('"') => bytes.push(b'"'),
            Some(other) => {
                let mut buf = [0u8; 4];
                bytes.extend_from_slice(other.encode_utf8(&mut buf).as_bytes());
            }
            None => bytes.push(b'\\'),
        }
    }
    bytes.push(0);
    bytes
}

/// Renders constant bytes in the `c"..."` form: printable ASCII as is,
/// everything else as `\XX`.
fn encode_ir_bytes(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for &b in bytes {
        let printable = (0x20..0x7f).contains(&b) && b != b'"' && b != b'\\';
        if printable {
            out.push(b as char);
        } else {
            out.push_str(&format!("\\{b:02X}"));
        }
    }
    out
}

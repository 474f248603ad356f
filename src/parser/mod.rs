mod parse_error;

use crate::ast::*;
use crate::lexer::{Token, TokenKind, Tokenizer};
pub use parse_error::{ParseDiagnostics, ParseError, ParseErrorKind, Result};

use std::mem;

/// Parser state: the streaming tokenizer, a one-token lookahead buffer, a
/// snapshot of the token just consumed, and the diagnostic sink.
pub struct Parser<'a> {
    tokens: Tokenizer<'a>,
    current: Token,
    previous: Token,
    diagnostics: Vec<ParseError>,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Self {
        let mut tokens = Tokenizer::new(source);
        let current = tokens.next_token();
        Self {
            tokens,
            current,
            previous: Token::eof(),
            diagnostics: Vec::new(),
        }
    }

    fn advance(&mut self) {
        let next = self.tokens.next_token();
        self.previous = mem::replace(&mut self.current, next);
    }

    fn check(&self, kind: TokenKind, lexeme: &str) -> bool {
        self.current.kind == kind && self.current.lexeme == lexeme
    }

    fn bump_if(&mut self, kind: TokenKind, lexeme: &str) -> bool {
        let matched = self.check(kind, lexeme);
        if matched {
            self.advance();
        }
        matched
    }

    fn expect(&mut self, kind: TokenKind, lexeme: &str, what: &'static str) -> Result<()> {
        if self.bump_if(kind, lexeme) {
            Ok(())
        } else {
            Err(self.error(ParseErrorKind::Expected(what)))
        }
    }

    /// Consumes any token of `kind` and leaves its lexeme in `previous`.
    fn expect_kind(&mut self, kind: TokenKind, what: &'static str) -> Result<()> {
        if self.current.kind == kind {
            self.advance();
            Ok(())
        } else {
            Err(self.error(ParseErrorKind::Expected(what)))
        }
    }

    fn error(&self, kind: ParseErrorKind) -> ParseError {
        ParseError::new(kind, self.current.lexeme.clone())
    }
}

/// Parses a whole source file. All top-level syntax errors found by the
/// recovery loop are returned together; a partial tree is never handed out.
pub fn parse(source: &str) -> std::result::Result<Ast, ParseDiagnostics> {
    let mut p = Parser::new(source);
    let mut items = Vec::new();

    while !p.current.is_eof() {
        match parse_toplevel(&mut p) {
            Ok(item) => items.push(item),
            Err(error) => {
                p.diagnostics.push(error);
                synchronize(&mut p);
            }
        }
    }

    if p.diagnostics.is_empty() {
        Ok(Ast { items })
    } else {
        let errors = p.diagnostics;
        Err(ParseDiagnostics { errors })
    }
}

/// Panic-mode recovery: skip to the next token that can begin a top-level
/// declaration, so one bad construct does not hide the errors after it.
fn synchronize(p: &mut Parser) {
    while !p.current.is_eof() && !p.current.is_type_keyword() {
        p.advance();
    }
}

fn parse_toplevel(p: &mut Parser) -> Result<BlockItem> {
    if p.current.is_type_keyword() {
        parse_declaration(p).map(BlockItem::D)
    } else {
        parse_statement(p).map(BlockItem::S)
    }
}

/// `type IDENT` followed by `(` commits to a function declaration; anything
/// else is a variable declaration.
fn parse_declaration(p: &mut Parser) -> Result<Declaration> {
    let (type_name, name) = parse_declaration_head(p)?;
    if p.check(TokenKind::Punctuator, "(") {
        parse_function_rest(p, type_name, name).map(Declaration::Fun)
    } else {
        parse_variable_rest(p, type_name, name).map(Declaration::Var)
    }
}

fn parse_declaration_head(p: &mut Parser) -> Result<(Identifier, Identifier)> {
    p.expect_kind(TokenKind::Keyword, "variable type")?;
    let type_name = p.previous.lexeme.clone();
    p.expect_kind(TokenKind::Identifier, "variable name")?;
    let name = p.previous.lexeme.clone();
    Ok((type_name, name))
}

fn parse_params(p: &mut Parser) -> Result<Vec<Param>> {
    let mut params = Vec::new();

    while !p.check(TokenKind::Punctuator, ")") {
        p.expect_kind(TokenKind::Keyword, "parameter type")?;
        let type_name = p.previous.lexeme.clone();
        p.expect_kind(TokenKind::Identifier, "parameter name")?;
        let name = p.previous.lexeme.clone();
        params.push(Param { type_name, name });

        if !p.bump_if(TokenKind::Punctuator, ",") && !p.check(TokenKind::Punctuator, ")") {
            return Err(p.error(ParseErrorKind::Expected("',' or ')' after parameter")));
        }
    }

    Ok(params)
}

fn parse_function_rest(p: &mut Parser, return_type: Identifier, name: Identifier) -> Result<FunDec> {
    p.expect(TokenKind::Punctuator, "(", "'(' after function name")?;
    let params = parse_params(p)?;
    p.expect(TokenKind::Punctuator, ")", "')' after parameters")?;

    if p.bump_if(TokenKind::Punctuator, ";") {
        // forward declaration
        return Ok(FunDec {
            return_type,
            name,
            params,
            body: None,
        });
    }

    if !p.check(TokenKind::Punctuator, "{") {
        let what = "'{' for function body or ';' for declaration";
        return Err(p.error(ParseErrorKind::Expected(what)));
    }

    let body = parse_compound(p)?;
    Ok(FunDec {
        return_type,
        name,
        params,
        body: Some(body),
    })
}

fn parse_variable_rest(p: &mut Parser, type_name: Identifier, name: Identifier) -> Result<VarDec> {
    let has_init = p.bump_if(TokenKind::Operator, "=");
    let init = has_init.then(|| parse_expression(p)).transpose()?;
    p.expect(TokenKind::Punctuator, ";", "';' after variable declaration")?;
    Ok(VarDec {
        type_name,
        name,
        init,
    })
}

/// A variable declaration starting at its type keyword, as allowed in a
/// `for` header.
fn parse_variable_declaration(p: &mut Parser) -> Result<VarDec> {
    let (type_name, name) = parse_declaration_head(p)?;
    parse_variable_rest(p, type_name, name)
}

fn parse_statement(p: &mut Parser) -> Result<Statement> {
    if p.check(TokenKind::Punctuator, "{") {
        return parse_compound(p).map(Statement::Compound);
    }
    if p.current.kind == TokenKind::Keyword {
        match p.current.lexeme.as_str() {
            "if" => return parse_if(p),
            "while" => return parse_while(p),
            "for" => return parse_for(p),
            "return" => return parse_return(p),
            _ => {}
        }
    }
    parse_expression_statement(p)
}

fn parse_compound(p: &mut Parser) -> Result<Block> {
    p.expect(TokenKind::Punctuator, "{", "'{' at start of block")?;

    let mut items = Vec::new();
    while !p.bump_if(TokenKind::Punctuator, "}") {
        if p.current.is_eof() {
            return Err(p.error(ParseErrorKind::UnterminatedBlock));
        }
        let item = if p.current.is_type_keyword() {
            parse_declaration(p).map(BlockItem::D)?
        } else {
            parse_statement(p).map(BlockItem::S)?
        };
        items.push(item);
    }

    Ok(Block { items })
}

fn parse_if(p: &mut Parser) -> Result<Statement> {
    p.advance();
    p.expect(TokenKind::Punctuator, "(", "'(' after 'if'")?;
    let condition = parse_expression(p)?;
    p.expect(TokenKind::Punctuator, ")", "')' after if condition")?;
    let then = parse_statement(p).map(Box::new)?;
    let else_present = p.bump_if(TokenKind::Keyword, "else");
    let els = else_present
        .then(|| parse_statement(p))
        .transpose()?
        .map(Box::new);
    Ok(Statement::If(If {
        condition,
        then,
        els,
    }))
}

fn parse_while(p: &mut Parser) -> Result<Statement> {
    p.advance();
    p.expect(TokenKind::Punctuator, "(", "'(' after 'while'")?;
    let condition = parse_expression(p)?;
    p.expect(TokenKind::Punctuator, ")", "')' after while condition")?;
    let body = parse_statement(p).map(Box::new)?;
    Ok(Statement::While(While { condition, body }))
}

fn parse_for(p: &mut Parser) -> Result<Statement> {
    p.advance();
    p.expect(TokenKind::Punctuator, "(", "'(' after 'for'")?;

    let init = if p.bump_if(TokenKind::Punctuator, ";") {
        ForInit::Exp(None)
    } else if p.current.is_type_keyword() {
        ForInit::Decl(parse_variable_declaration(p)?)
    } else {
        let exp = parse_expression(p)?;
        p.expect(TokenKind::Punctuator, ";", "';' after for initializer")?;
        ForInit::Exp(Some(exp))
    };

    let condition = if p.check(TokenKind::Punctuator, ";") {
        None
    } else {
        Some(parse_expression(p)?)
    };
    p.expect(TokenKind::Punctuator, ";", "';' after for condition")?;

    let post = if p.check(TokenKind::Punctuator, ")") {
        None
    } else {
        Some(parse_expression(p)?)
    };
    p.expect(TokenKind::Punctuator, ")", "')' after for clauses")?;

    let body = parse_statement(p).map(Box::new)?;
    Ok(Statement::For(For {
        init,
        condition,
        post,
        body,
    }))
}

fn parse_return(p: &mut Parser) -> Result<Statement> {
    p.advance();
    if p.bump_if(TokenKind::Punctuator, ";") {
        return Ok(Statement::Return(None));
    }
    let value = parse_expression(p)?;
    p.expect(TokenKind::Punctuator, ";", "';' after return value")?;
    Ok(Statement::Return(Some(value)))
}

fn parse_expression_statement(p: &mut Parser) -> Result<Statement> {
    if p.bump_if(TokenKind::Punctuator, ";") {
        return Ok(Statement::Exp(None));
    }
    let exp = parse_expression(p)?;
    p.expect(TokenKind::Punctuator, ";", "';' after expression")?;
    Ok(Statement::Exp(Some(exp)))
}

// Expression grammar, one function per precedence level:
//
//   expression  = assignment
//   assignment  = equality ( "=" assignment )?
//   equality    = comparison ( ("==" | "!=") comparison )*
//   comparison  = term ( ("<" | "<=" | ">" | ">=") term )*
//   term        = factor ( ("+" | "-") factor )*
//   factor      = unary ( ("*" | "/") unary )*
//   unary       = ("!" | "-" | "&" | "*") unary | primary
//   primary     = number | string | identifier call? | "(" expression ")"

fn binary_op(lexeme: &str) -> Option<BinaryOp> {
    match lexeme {
        "+" => Some(BinaryOp::Add),
        "-" => Some(BinaryOp::Subtract),
        "*" => Some(BinaryOp::Multiply),
        "/" => Some(BinaryOp::Divide),
        "==" => Some(BinaryOp::IsEqual),
        "!=" => Some(BinaryOp::IsNotEqual),
        "<" => Some(BinaryOp::LessThan),
        "<=" => Some(BinaryOp::LessOrEqual),
        ">" => Some(BinaryOp::GreaterThan),
        ">=" => Some(BinaryOp::GreaterOrEqual),
        _ => None,
    }
}

fn unary_op(lexeme: &str) -> Option<UnaryOp> {
    match lexeme {
        "-" => Some(UnaryOp::Negate),
        "!" => Some(UnaryOp::LogicalNot),
        "&" => Some(UnaryOp::AddressOf),
        "*" => Some(UnaryOp::Dereference),
        _ => None,
    }
}

/// Consumes the current token if it is one of `ops` in operator position.
fn bump_operator(p: &mut Parser, ops: &[&str]) -> Option<BinaryOp> {
    if p.current.kind != TokenKind::Operator {
        return None;
    }
    if !ops.contains(&p.current.lexeme.as_str()) {
        return None;
    }
    let op = binary_op(&p.current.lexeme);
    p.advance();
    op
}

fn parse_expression(p: &mut Parser) -> Result<Exp> {
    parse_assignment(p)
}

fn parse_assignment(p: &mut Parser) -> Result<Exp> {
    let exp = parse_equality(p)?;
    if !p.bump_if(TokenKind::Operator, "=") {
        return Ok(exp);
    }

    // right-associative
    let value = parse_assignment(p)?;
    if !exp.is_var() {
        return Err(p.error(ParseErrorKind::InvalidAssignmentTarget));
    }
    Ok(Exp::Assignment(Box::new(exp), Box::new(value)))
}

fn parse_equality(p: &mut Parser) -> Result<Exp> {
    let mut exp = parse_comparison(p)?;
    while let Some(op) = bump_operator(p, &["==", "!="]) {
        let right = parse_comparison(p)?;
        exp = Exp::Binary(op, Box::new(exp), Box::new(right));
    }
    Ok(exp)
}

fn parse_comparison(p: &mut Parser) -> Result<Exp> {
    let mut exp = parse_term(p)?;
    while let Some(op) = bump_operator(p, &["<", "<=", ">", ">="]) {
        let right = parse_term(p)?;
        exp = Exp::Binary(op, Box::new(exp), Box::new(right));
    }
    Ok(exp)
}

fn parse_term(p: &mut Parser) -> Result<Exp> {
    let mut exp = parse_factor(p)?;
    while let Some(op) = bump_operator(p, &["+", "-"]) {
        let right = parse_factor(p)?;
        exp = Exp::Binary(op, Box::new(exp), Box::new(right));
    }
    Ok(exp)
}

fn parse_factor(p: &mut Parser) -> Result<Exp> {
    let mut exp = parse_unary(p)?;
    while let Some(op) = bump_operator(p, &["*", "/"]) {
        let right = parse_unary(p)?;
        exp = Exp::Binary(op, Box::new(exp), Box::new(right));
    }
    Ok(exp)
}

fn parse_unary(p: &mut Parser) -> Result<Exp> {
    if p.current.kind == TokenKind::Operator {
        if let Some(op) = unary_op(&p.current.lexeme) {
            p.advance();
            let operand = parse_unary(p).map(Box::new)?;
            return Ok(Exp::Unary(op, operand));
        }
    }
    parse_primary(p)
}

fn parse_arguments(p: &mut Parser) -> Result<Vec<Exp>> {
    let mut args = Vec::new();

    while !p.check(TokenKind::Punctuator, ")") {
        let arg = parse_expression(p)?;
        args.push(arg);
        if !p.bump_if(TokenKind::Punctuator, ",") {
            break;
        }
    }

    Ok(args)
}

fn parse_call(p: &mut Parser, callee: Identifier) -> Result<Exp> {
    p.advance();
    let args = parse_arguments(p)?;
    p.expect(TokenKind::Punctuator, ")", "')' after function arguments")?;
    Ok(Exp::Call(callee, args))
}

fn parse_primary(p: &mut Parser) -> Result<Exp> {
    match p.current.kind {
        TokenKind::Number => {
            let value = p.current.lexeme.clone();
            p.advance();
            Ok(Exp::Number(value))
        }
        TokenKind::String => {
            let value = p.current.lexeme.clone();
            p.advance();
            Ok(Exp::StringLit(value))
        }
        TokenKind::Identifier => {
            let name = p.current.lexeme.clone();
            p.advance();
            if p.check(TokenKind::Punctuator, "(") {
                parse_call(p, name)
            } else {
                Ok(Exp::Var(name))
            }
        }
        TokenKind::Punctuator if p.current.lexeme == "(" => {
            p.advance();
            let exp = parse_expression(p)?;
            p.expect(TokenKind::Punctuator, ")", "')' after expression")?;
            Ok(exp)
        }
        _ => Err(p.error(ParseErrorKind::ExpectedExpression)),
    }
}

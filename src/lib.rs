/*!
A batch compiler for a small subset of C that emits textual LLVM IR for the
`x86_64-unknown-linux-gnu` target.

The accepted language covers the scalar types `int`, `char` and `void`,
variable and function declarations, blocks with lexical scoping, `if`/`else`,
`while`, `for` and `return`, the usual arithmetic, comparison and equality
operators, unary `-` and `!`, simple assignment and function calls. There is
no preprocessor and no optimization.

## Command-line usage
```shell
Usage: ccompiler <input_file> [output_file] [-v]

  input_file   - C source file to compile
  output_file  - Optional output file for LLVM IR (default: output.ll)
  -v           - Verbose output (displays tokens and debug info)
```

## Compilation stages
1. **Tokenization** - [Tokenizer](lexer::Tokenizer) turns the source bytes
   into a lazy stream of [Tokens](lexer::Token). Lexing is total: unknown
   bytes come out as single-character operator tokens for the parser to
   reject.
2. **Parsing** - [parse](parser::parse) runs a recursive-descent grammar with
   one stratum per precedence level and builds an [Ast](ast::Ast). Top-level
   errors are collected in [ParseDiagnostics](parser::ParseDiagnostics) while
   panic-mode recovery skips to the next declaration, so one run can report
   several of them.
3. **Semantic analysis** - [analyze](semantic_analysis::analyze) walks the
   tree against a scope-stack [SymbolTable](semantic_analysis::SymbolTable),
   checking declarations, identifier uses and call arity. Expression types
   are deliberately not checked; every scalar is treated as a 32-bit integer
   downstream.
4. **Code generation** - [CodeGenerator](codegen::CodeGenerator) walks the
   tree once and emits straight-line IR with monotonically numbered `%tN`
   registers and `labelN` blocks, stack slots for locals and direct SSA names
   for parameters.

Every module except [ast] sits behind a feature flag of the same name, so any
stage can be reused on its own (e.g. just lexing or parsing C code).
*/

#![deny(unused_must_use)]
#![warn(clippy::pedantic)]
#![allow(clippy::wildcard_imports)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::missing_errors_doc)]

pub mod ast;
#[cfg(feature = "codegen")]
pub mod codegen;
#[cfg(feature = "lexer")]
pub mod lexer;
#[cfg(feature = "parser")]
pub mod parser;
#[cfg(feature = "semantic_analysis")]
pub mod semantic_analysis;

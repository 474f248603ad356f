mod args;

use args::Args;

use ccompiler::codegen::CodeGenerator;
use ccompiler::lexer::Tokenizer;
use ccompiler::{parser, semantic_analysis};

use std::fs;

use anyhow::{anyhow, Result};

fn main() -> Result<()> {
    let args = Args::parse();

    let source = fs::read_to_string(&args.input)
        .map_err(|_| anyhow!("Could not open file {}", args.input.display()))?;

    if args.verbose {
        println!("\nTokens from lexical analysis:");
        for token in Tokenizer::new(&source) {
            println!("{token}");
        }
    }

    println!("Parsing {}...", args.input.display());
    let ast = match parser::parse(&source) {
        Ok(ast) => ast,
        Err(diagnostics) => {
            eprintln!("{diagnostics}");
            return Err(anyhow!("Parsing failed"));
        }
    };
    println!("Parsing successful!");

    println!("\nAbstract Syntax Tree:");
    print!("{ast}");

    println!("\nPerforming semantic analysis...");
    let symbols = match semantic_analysis::analyze(&ast) {
        Ok(symbols) => symbols,
        Err(error) => {
            eprintln!("Semantic error: {error}");
            return Err(anyhow!("Semantic analysis failed"));
        }
    };
    println!("Semantic analysis successful!");

    if args.verbose {
        println!("\n{symbols}");
    }

    println!("\nGenerating code to {}...", args.output.display());
    let ir = match CodeGenerator::new().generate(&ast) {
        Ok(ir) => ir,
        Err(error) => {
            eprintln!("Code generation error: {error}");
            return Err(anyhow!("Code generation failed"));
        }
    };
    fs::write(&args.output, ir)
        .map_err(|_| anyhow!("Could not create output file {}", args.output.display()))?;
    println!("Code generation successful!");

    if args.verbose {
        println!("\nTo run the generated LLVM IR, use:");
        println!("  llc {} -o output.s", args.output.display());
        println!("  gcc output.s -o output");
        println!("  ./output");
    }

    println!("\nCompilation completed successfully!");
    Ok(())
}

use std::env;
use std::path::PathBuf;
use std::process::exit;

pub struct Args {
    pub input: PathBuf,
    pub output: PathBuf,
    pub verbose: bool,
}

impl Args {
    pub fn parse() -> Self {
        let mut input = None;
        let mut output = None;
        let mut verbose = false;

        for arg in env::args().skip(1) {
            match arg.as_str() {
                "-v" => verbose = true,
                _ if input.is_none() => input = Some(PathBuf::from(arg)),
                _ => output = Some(PathBuf::from(arg)),
            }
        }

        let Some(input) = input else {
            eprintln!("Error: No input file specified");
            Self::usage()
        };
        let output = output.unwrap_or_else(|| PathBuf::from("output.ll"));

        Self {
            input,
            output,
            verbose,
        }
    }

    fn usage() -> ! {
        let cmd0 = env::args().next().unwrap_or_else(|| "ccompiler".to_owned());
        println!("Usage: {cmd0} <input_file> [output_file] [-v]");
        println!("  input_file   - C source file to compile");
        println!("  output_file  - Optional output file for LLVM IR (default: output.ll)");
        println!("  -v           - Verbose output (displays tokens and debug info)");
        exit(1)
    }
}

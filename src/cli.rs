use std::path::PathBuf;

use anyhow::bail;

use crate::interpreter::Interpreter;
use crate::lexer::tokenize;
use crate::parser::parse;

/// Validates that the input file has a .py extension.
fn validate_py_file(input: &PathBuf) -> anyhow::Result<()> {
    if input.extension().map_or(false, |ext| ext == "py") {
        Ok(())
    } else {
        bail!(
            "Input file must have a .py extension, but got: {}",
            input.display()
        );
    }
}

/// Runs a source file. The program's own output is the only thing written
/// on success; any host error exits non-zero.
pub fn run(input: PathBuf) -> anyhow::Result<()> {
    validate_py_file(&input)?;

    let source = std::fs::read_to_string(&input)?;
    let tokens = tokenize(&source)?;
    let program = parse(&tokens)?;

    let mut interpreter = Interpreter::new();
    interpreter.execute_program(&program)?;
    Ok(())
}

/// Dumps the token stream as JSON, for debugging the front end.
pub fn lex(input: PathBuf, output: Option<PathBuf>) -> anyhow::Result<()> {
    validate_py_file(&input)?;

    let source = std::fs::read_to_string(&input)?;
    let tokens = tokenize(&source)?;

    let token_data: Vec<serde_json::Value> = tokens
        .iter()
        .map(|token| {
            serde_json::json!({
                "type": format!("{:?}", token.token_type),
                "lexeme": token.lexeme,
                "line": token.line
            })
        })
        .collect();
    let json = serde_json::to_string_pretty(&token_data)?;

    match output {
        Some(path) => std::fs::write(path, json)?,
        None => println!("{}", json),
    }
    Ok(())
}

/// Dumps the parsed syntax tree as JSON.
pub fn gen_ast(input: PathBuf, output: Option<PathBuf>) -> anyhow::Result<()> {
    validate_py_file(&input)?;

    let source = std::fs::read_to_string(&input)?;
    let tokens = tokenize(&source)?;
    let program = parse(&tokens)?;
    let json = serde_json::to_string_pretty(&program)?;

    match output {
        Some(path) => std::fs::write(path, json)?,
        None => println!("{}", json),
    }
    Ok(())
}

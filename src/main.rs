use clap::Parser;
use jex::{eval, lex, parse, to_json, to_json_pretty, EvalError, ParseError, Value};
use std::io::{self, Read};

#[derive(Parser)]
#[command(name = "jex")]
#[command(about = "Evaluate a jex expression against a JSON message")]
#[command(version)]
struct Cli {
    /// The expression to evaluate
    expr: String,

    /// JSON message (reads from stdin if not provided)
    #[arg(short, long)]
    input: Option<String>,

    /// Pretty-print the result
    #[arg(short, long)]
    pretty: bool,

    /// Parse the expression and exit without evaluating
    #[arg(long)]
    check: bool,

    /// Print the lexed tokens
    #[arg(long)]
    tokens: bool,

    /// Print the parsed tree
    #[arg(long)]
    ast: bool,
}

enum CliError {
    Io(io::Error),
    Json(serde_json::Error),
    Parse(ParseError),
    Eval(EvalError),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Io(e) => write!(f, "io error: {}", e),
            CliError::Json(e) => write!(f, "invalid JSON input: {}", e),
            CliError::Parse(e) => write!(f, "{}", e),
            CliError::Eval(e) => write!(f, "{}", e),
        }
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let tokens = lex(&cli.expr).map_err(|e| CliError::Parse(e.into()))?;
    if cli.tokens {
        for token in &tokens {
            print!("({:?} {}) ", token.kind, token.text);
        }
        println!();
    }

    let ast = parse(tokens).map_err(CliError::Parse)?;
    if cli.ast {
        print!("{}", ast.tree_string());
    }
    if cli.check {
        println!("expression ok");
        return Ok(());
    }

    let msg = read_message(cli)?;
    let result = eval(&ast, &msg).map_err(CliError::Eval)?;

    if cli.pretty {
        println!("{}", to_json_pretty(&result));
    } else {
        println!("{}", to_json(&result));
    }
    Ok(())
}

fn read_message(cli: &Cli) -> Result<Value, CliError> {
    let raw = match &cli.input {
        Some(s) => Some(s.clone()),
        None if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .map_err(CliError::Io)?;
            Some(buffer)
        }
        None => None,
    };

    match raw {
        Some(raw) => {
            let json: serde_json::Value = serde_json::from_str(&raw).map_err(CliError::Json)?;
            Ok(Value::from(json))
        }
        None => Ok(Value::Null),
    }
}

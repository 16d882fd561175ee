use std::{fs::read_to_string, path::{Path, PathBuf}, process, rc::Rc, time::Instant};

use clap::Parser;
use dachs::{
    ast::{
        ast::GlobalDefinition,
        statements::{StatementBlock, Stmt},
    },
    errors::errors::{Error, ErrorTip},
    get_line_at_position,
    lexer::lexer::tokenize,
    parser::parser::parse,
    semantics::{analyze, AnalysisOptions},
};
use log::info;

/// Semantic analysis front end for the Dachs language.
#[derive(Parser)]
#[command(name = "dachs", version, about)]
struct Cli {
    /// Source file to analyze
    file: PathBuf,

    /// Print the resolved syntax tree
    #[arg(long = "dump-ast")]
    dump_ast: bool,

    /// Print the scope tree with every symbol
    #[arg(long = "dump-scopes")]
    dump_scopes: bool,

    /// Do not register the intrinsic functions
    #[arg(long = "no-builtins")]
    no_builtins: bool,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let file_name = cli
        .file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| cli.file.to_string_lossy().into_owned());

    let source = match read_to_string(&cli.file) {
        Ok(source) => source,
        Err(error) => {
            eprintln!("Error: cannot read {}: {}", cli.file.display(), error);
            process::exit(2);
        }
    };

    let start = Instant::now();

    let tokens = match tokenize(source.clone(), Some(file_name.clone())) {
        Ok(tokens) => tokens,
        Err(error) => fail(error, &source, &cli.file),
    };
    info!("Tokenized in {:?}", start.elapsed());

    let parse_start = Instant::now();
    let program = match parse(tokens, Rc::new(file_name)) {
        Ok(program) => program,
        Err(error) => fail(error, &source, &cli.file),
    };
    info!("Parsed in {:?}", parse_start.elapsed());

    let options = AnalysisOptions {
        builtins: !cli.no_builtins,
    };

    let analysis_start = Instant::now();
    let analysis = match analyze(program, &options) {
        Ok(analysis) => analysis,
        Err(error) => fail(error, &source, &cli.file),
    };
    info!("Analyzed in {:?}", analysis_start.elapsed());

    if cli.dump_ast {
        for definition in &analysis.program.definitions {
            println!("{}", definition.as_node().describe());
            if let GlobalDefinition::Function(def) = definition {
                dump_block(&def.body, 1);
                if let Some(ensure) = &def.ensure_body {
                    println!("  ensure");
                    dump_block(ensure, 1);
                }
            }
        }
    }

    if cli.dump_scopes {
        print!("{}", analysis.dump_scopes());
    }

    info!("Total time: {:?}", start.elapsed());
}

fn dump_block(block: &StatementBlock, depth: usize) {
    for stmt in &block.stmts {
        dump_stmt(stmt, depth);
    }
}

fn dump_stmt(stmt: &Stmt, depth: usize) {
    println!("{}{}", "  ".repeat(depth), stmt.as_node().describe());

    match stmt {
        Stmt::If(if_stmt) => {
            dump_block(&if_stmt.then_block, depth + 1);
            for (_, block) in &if_stmt.elseifs {
                dump_block(block, depth + 1);
            }
            if let Some(block) = &if_stmt.else_block {
                dump_block(block, depth + 1);
            }
        }
        Stmt::Case(case) => {
            for (_, block) in &case.whens {
                dump_block(block, depth + 1);
            }
            if let Some(block) = &case.else_block {
                dump_block(block, depth + 1);
            }
        }
        Stmt::Switch(switch) => {
            for (_, block) in &switch.whens {
                dump_block(block, depth + 1);
            }
            if let Some(block) = &switch.else_block {
                dump_block(block, depth + 1);
            }
        }
        Stmt::For(for_stmt) => dump_block(&for_stmt.body, depth + 1),
        Stmt::While(while_stmt) => dump_block(&while_stmt.body, depth + 1),
        Stmt::PostfixIf(postfix) => dump_stmt(&postfix.body, depth + 1),
        Stmt::Let(let_stmt) => dump_stmt(&let_stmt.child, depth + 1),
        Stmt::Initialize(_) | Stmt::Assign(_) | Stmt::Return(_) | Stmt::Expression(_) => {}
    }
}

fn fail(error: Error, source: &str, file: &Path) -> ! {
    display_error(&error, source, file);
    process::exit(1);
}

fn display_error(error: &Error, source: &str, file: &Path) {
    /*
        Error: TypeMatchError (...)
        -> main.dachs:2:13
           |
         2 | var x: int = "s";
           | -------------^
    */

    if let ErrorTip::None = error.get_tip() {
        eprintln!("Error: {}", error.get_error_name());
    } else {
        eprintln!("Error: {} ({})", error.get_error_name(), error.get_tip());
    }

    let position = error.get_position();
    eprintln!("-> {}:{}:{}", file.display(), position.line, position.col);
    eprintln!("   {}", error);

    let Some((line, line_text, line_pos)) = get_line_at_position(source, position.offset) else {
        return;
    };

    let line_str = line.to_string();
    let padding = line_str.len() + 2;
    eprintln!("{:>padding$}", "|");

    let (line_text_removed, removed_whitespace) = remove_starting_whitespace(&line_text);
    eprintln!("{} | {}", line_str, line_text_removed.trim_end());

    let arrows = line_pos.saturating_sub(removed_whitespace) + 1;
    eprintln!("{:>padding$} {:->arrows$}", "|", "^");
}

fn remove_starting_whitespace(string: &str) -> (String, usize) {
    let start = string
        .chars()
        .take_while(|c| *c == ' ' || *c == '\t')
        .count();

    (string.chars().skip(start).collect(), start)
}

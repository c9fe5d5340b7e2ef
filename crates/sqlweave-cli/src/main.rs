//! sqlweave CLI - Command line interface for the template compiler

use std::fs;
use std::path::{Path, PathBuf};

use ariadne::{Color, Label, Report, ReportKind, Source};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use sqlweave_builder::{CompileError, CompiledFile, CompilerConfig, CompilerContext};
use sqlweave_lexer::Lexicon;
use sqlweave_parser::{analyze_query, ParseError};
use sqlweave_schema::{JsonSchema, SchemaCache};

#[derive(Parser)]
#[command(name = "sqlweave")]
#[command(about = "Query template compiler", long_about = None)]
struct Cli {
    /// Log compiler progress (same as RUST_LOG=debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile template files and output the methods as JSON
    Compile {
        /// Input file(s)
        files: Vec<PathBuf>,
        /// Table metadata for `auto` methods (JSON)
        #[arg(short, long)]
        schema: Option<PathBuf>,
        /// Pretty print the output
        #[arg(short, long)]
        pretty: bool,
        /// Marker written in place of `${name}`
        #[arg(long, default_value = "?")]
        bind_marker: String,
        /// Marker written in place of `#{name}`
        #[arg(long, default_value = "%v")]
        substitute_marker: String,
    },
    /// Check template files for errors
    Check {
        /// Input file(s)
        files: Vec<PathBuf>,
        /// Table metadata for `auto` methods (JSON)
        #[arg(short, long)]
        schema: Option<PathBuf>,
    },
    /// Show the fields and tables of a SELECT
    Shape {
        /// Query text
        sql: String,
        /// Pretty print the output
        #[arg(short, long)]
        pretty: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Compile {
            files,
            schema,
            pretty,
            bind_marker,
            substitute_marker,
        } => {
            let config = CompilerConfig::default()
                .with_bind_marker(bind_marker)
                .with_substitute_marker(substitute_marker);
            cmd_compile(&files, schema.as_deref(), config, pretty)
        }
        Commands::Check { files, schema } => cmd_check(&files, schema.as_deref()),
        Commands::Shape { sql, pretty } => cmd_shape(&sql, pretty),
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_context(config: CompilerConfig, schema: Option<&Path>) -> CompilerContext {
    let context = CompilerContext::new(config);
    let Some(path) = schema else {
        return context;
    };
    match JsonSchema::load(path) {
        Ok(provider) => {
            debug!(path = %path.display(), "loaded schema");
            context.with_schema(SchemaCache::new(provider))
        }
        Err(e) => {
            eprintln!("Error loading schema {}: {}", path.display(), e);
            std::process::exit(1);
        }
    }
}

fn read_source(file: &Path) -> Option<String> {
    match fs::read_to_string(file) {
        Ok(s) => Some(s),
        Err(e) => {
            eprintln!("Error reading {}: {}", file.display(), e);
            None
        }
    }
}

fn print_json<T: Serialize>(value: &T, pretty: bool) {
    let json = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    match json {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error serializing output: {}", e);
            std::process::exit(1);
        }
    }
}

fn cmd_compile(files: &[PathBuf], schema: Option<&Path>, config: CompilerConfig, pretty: bool) {
    let mut context = build_context(config, schema);
    let mut compiled: Vec<CompiledFile> = Vec::with_capacity(files.len());

    for file in files {
        let Some(source) = read_source(file) else {
            std::process::exit(1);
        };
        match context.compile_file(file, &source) {
            Ok(result) => compiled.push(result),
            Err(e) => {
                report_compile_error(&source, &e);
                std::process::exit(1);
            }
        }
    }

    print_json(&compiled, pretty);
}

fn cmd_check(files: &[PathBuf], schema: Option<&Path>) {
    let mut context = build_context(CompilerConfig::default(), schema);
    let mut all_ok = true;

    for file in files {
        let Some(source) = read_source(file) else {
            all_ok = false;
            continue;
        };

        match context.compile_file(file, &source) {
            Ok(result) => {
                let mutations = result.methods.iter().filter(|m| m.is_mutation).count();
                println!(
                    "✓ {} - {} methods ({} mutations)",
                    file.display(),
                    result.methods.len(),
                    mutations
                );
            }
            Err(e) => {
                eprintln!("✗ {}", e);
                report_compile_error(&source, &e);
                all_ok = false;
            }
        }
    }

    if !all_ok {
        std::process::exit(1);
    }
}

fn cmd_shape(sql: &str, pretty: bool) {
    match analyze_query(sql, &Lexicon::sql()) {
        Ok(shape) => print_json(&shape, pretty),
        Err(e) => {
            report_parse_error(sql, &e);
            std::process::exit(1);
        }
    }
}

/// ariadne counts characters, spans count bytes
fn char_range(source: &str, start: usize, end: usize) -> std::ops::Range<usize> {
    let clamp = |offset: usize| {
        let mut offset = offset.min(source.len());
        while !source.is_char_boundary(offset) {
            offset -= 1;
        }
        source[..offset].chars().count()
    };
    clamp(start)..clamp(end)
}

fn report(source: &str, name: String, code: &str, message: String, start: usize, end: usize) {
    let range = char_range(source, start, end);
    let result = Report::build(ReportKind::Error, name.clone(), range.start)
        .with_code(code)
        .with_message(&message)
        .with_label(
            Label::new((name.clone(), range))
                .with_message(message)
                .with_color(Color::Red),
        )
        .finish()
        .eprint((name, Source::from(source)));
    if let Err(e) = result {
        eprintln!("Error writing diagnostic: {}", e);
    }
}

fn report_compile_error(source: &str, error: &CompileError) {
    let span = error.span();
    report(
        source,
        error.path.to_string_lossy().to_string(),
        error.code(),
        format!("{} error: {}", error.class(), error.error),
        span.start,
        span.end,
    );
}

fn report_parse_error(source: &str, error: &ParseError) {
    let span = error.span();
    report(
        source,
        "<query>".to_string(),
        error.code(),
        format!("{} error: {}", error.class(), error),
        span.start,
        span.end,
    );
}

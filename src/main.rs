//! Primitive CLI - query and reshape JSON data with pipelines

use anyhow::Context as _;
use clap::Parser;
use primitive::cli::{Args, SubCommand};
use primitive::{
    execute_pipeline, format_output, parse_pipeline, Container, ExecutionContext, ExecutionResult,
    JsonStyle, OutputFormat, ResultData,
};

fn main() {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    if let Err(e) = run(args) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    let ctx = ExecutionContext {
        output_format: if args.json { OutputFormat::Json } else { OutputFormat::Human },
        verbose: args.verbose,
    };

    match args.command {
        SubCommand::Query {
            source,
            pipeline,
            out,
            pretty,
        } => {
            let mut container = load(&source)?;

            let result = match pipeline.as_deref().map(str::trim) {
                Some(text) if !text.is_empty() => {
                    let pipeline = parse_pipeline(text)?;
                    execute_pipeline(&pipeline, &mut container, &ctx)?
                }
                _ => ExecutionResult {
                    data: ResultData::Items(container.clone()),
                    message: None,
                },
            };
            print!("{}", with_newline(format_output(&result, &ctx.output_format)));

            if let Some(path) = out {
                container
                    .to_file(&path, style(pretty))
                    .with_context(|| format!("writing {}", path.display()))?;
            }
            Ok(())
        }

        SubCommand::Encrypt { source } => {
            let container = load(&source)?;
            println!("{}", container.encrypt()?);
            Ok(())
        }

        SubCommand::Decrypt { payload } => {
            let container = Container::decrypt(&payload).context("decoding payload")?;
            let result = ExecutionResult {
                data: ResultData::Items(container),
                message: None,
            };
            print!("{}", with_newline(format_output(&result, &ctx.output_format)));
            Ok(())
        }

        SubCommand::Convert {
            source,
            out,
            pretty,
        } => {
            let container = load(&source)?;
            container
                .to_file(&out, style(pretty))
                .with_context(|| format!("writing {}", out.display()))?;
            if ctx.verbose {
                println!("Wrote {} item(s) to {}", container.len(), out.display());
            }
            Ok(())
        }

        SubCommand::Repl { source } => {
            let container = match source {
                Some(source) => load(&source)?,
                None => Container::new(),
            };
            primitive::repl::run_repl(container, &ctx)?;
            Ok(())
        }
    }
}

fn load(source: &str) -> anyhow::Result<Container> {
    Container::from_source(source).with_context(|| format!("loading {}", source))
}

fn style(pretty: bool) -> JsonStyle {
    if pretty {
        JsonStyle::Pretty
    } else {
        JsonStyle::Compact
    }
}

fn with_newline(mut output: String) -> String {
    if !output.ends_with('\n') {
        output.push('\n');
    }
    output
}

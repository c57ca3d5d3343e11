//! Interactive REPL implementation

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::container::{Container, JsonStyle};
use crate::engine::executor::{execute_pipeline, ExecutionContext, ExecutionResult, ResultData};
use crate::error::{ContainerError, Result};
use crate::output::format_output;
use crate::parser::parse_pipeline;

/// Run pipelines line by line against one live container
pub fn run_repl(mut container: Container, ctx: &ExecutionContext) -> Result<()> {
    let mut rl = DefaultEditor::new()
        .map_err(|e| ContainerError::IoError(std::io::Error::other(e.to_string())))?;

    println!("Primitive v{} - Interactive Mode", env!("CARGO_PKG_VERSION"));
    println!("Type 'help' for commands, 'exit' to quit\n");

    loop {
        let marker = if container.is_changed() { "*" } else { "" };
        let prompt = format!("primitive [{}{}]> ", container.len(), marker);

        match rl.readline(&prompt) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line);

                match line.to_lowercase().as_str() {
                    "exit" | "quit" | "q" => {
                        println!("Goodbye!");
                        break;
                    }
                    "help" | "?" => {
                        print_help();
                        continue;
                    }
                    "clear" | "cls" => {
                        print!("\x1B[2J\x1B[1;1H");
                        continue;
                    }
                    "show" | "ls" => {
                        show(&container, ctx);
                        continue;
                    }
                    _ => {}
                }

                if let Some(source) = line.strip_prefix("load ") {
                    match Container::from_source(source.trim()) {
                        Ok(loaded) => {
                            container = loaded;
                            println!("Loaded {} item(s)\n", container.len());
                        }
                        Err(e) => eprintln!("Error: {}\n", e),
                    }
                    continue;
                }

                if let Some(path) = line.strip_prefix("write ") {
                    match container.to_file(path.trim(), JsonStyle::Pretty) {
                        Ok(()) => println!("Wrote {} item(s) to {}\n", container.len(), path.trim()),
                        Err(e) => eprintln!("Error: {}\n", e),
                    }
                    continue;
                }

                match parse_pipeline(&expand_shortcuts(line)) {
                    Ok(pipeline) => match execute_pipeline(&pipeline, &mut container, ctx) {
                        Ok(result) => {
                            let output = format_output(&result, &ctx.output_format);
                            if !output.is_empty() {
                                println!("{}", output);
                            }
                        }
                        Err(e) => eprintln!("Error: {}\n", e),
                    },
                    Err(e) => eprintln!("Parse error: {}\n", e),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("Goodbye!");
                break;
            }
            Err(err) => {
                eprintln!("Error: {:?}", err);
                break;
            }
        }
    }

    Ok(())
}

fn show(container: &Container, ctx: &ExecutionContext) {
    let result = ExecutionResult {
        data: ResultData::Items(container.clone()),
        message: None,
    };
    println!("{}", format_output(&result, &ctx.output_format));
}

/// Expand common shortcuts to full pipelines
fn expand_shortcuts(input: &str) -> String {
    match input.to_lowercase().as_str() {
        "len" | "wc" => "count".to_string(),
        "undo" => "revert".to_string(),
        "commit" => "save".to_string(),
        _ => input.to_string(),
    }
}

fn print_help() {
    println!(
        r#"
Primitive Commands
==================

Each line is a pipeline run against the current container. Stages that
reshape the data keep their result for the next line.

SEARCH:
  where k                         - Sub-maps holding key k, keyed by parent
  where k=2 name="box"            - Sub-maps matching every pair
  where_list k=2                  - Same, as a plain list
  find_where k=2                  - First match only
  without k [recursive]           - Remove key k (everywhere by default)
  pull field                      - Every value stored under field
  grep "^a"                       - Keep values matching a pattern

RESHAPE:
  flatten | truthy [recursive] | unique | reverse [preserve_keys]
  line_keys | flip | shuffle | sort [asc|desc] | sort_keys
  take key | cut offset [length] [preserve_keys] | pad [size] [value]
  keys | values | chunk [size] | initial [n] | rest index
  column key | count_values

EDIT:
  push v ...                      - Append values
  insert k=v ...                  - Set keys
  forget k ...                    - Remove keys
  save | revert                   - Snapshot / restore

ANSWERS (last stage only):
  count | sum | first | last | has v | has_key k | find v
  implode [delim] | is_assoc | is_multi | changed | encrypt

SHORTCUTS:
  len, wc                         - Same as count
  undo                            - Same as revert
  commit                          - Same as save

REPL Commands:
  help, ?                         - Show this help
  show, ls                        - Print the container
  load <file or json>             - Replace the container
  write <path>                    - Save the container as JSON
  clear, cls                      - Clear screen
  exit, quit, q                   - Exit REPL
"#
    );
}

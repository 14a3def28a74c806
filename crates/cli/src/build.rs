//! `segment build` -- interactive filter editor.
//!
//! Reads one command per line from stdin. Conditions are numbered from 1.
//! Prompts, listings and live previews go to stderr so that stdout carries
//! only the finished filter JSON.

use std::path::Path;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use segment_client::{PreviewScheduler, PreviewSnapshot, SegmentApi};
use segment_core::{Logic, Operator, SegmentBuilder};

use crate::context::{read_filter, Globals};
use crate::render;

/// What a REPL line did to the filter.
enum Step {
    Changed,
    Unchanged,
    Quit,
}

pub(crate) async fn run_build(
    globals: &Globals,
    from: Option<&Path>,
    no_preview: bool,
    out: Option<&Path>,
) -> Result<(), String> {
    let api = if no_preview { None } else { Some(globals.api()?) };
    let api_ref: Option<&dyn SegmentApi> = match &api {
        Some((api, _)) => Some(&**api),
        None => None,
    };
    let (catalog, _) = globals.catalog(api_ref).await?;
    let catalog = Arc::new(catalog);

    let mut builder = match from {
        Some(path) => {
            let (builder, issues) = SegmentBuilder::load(Arc::clone(&catalog), read_filter(path)?);
            for issue in &issues {
                eprintln!("  {}", render::issue_line(issue));
            }
            builder
        }
        None => SegmentBuilder::new(Arc::clone(&catalog)),
    };

    let mut preview = api.map(|(api, settings)| PreviewScheduler::new(api, settings));
    let printer = preview
        .as_ref()
        .map(|p| spawn_preview_printer(p.subscribe(), globals.quiet));
    if let Some(scheduler) = preview.as_mut() {
        scheduler.schedule(builder.filter());
    }

    if !globals.quiet {
        eprintln!();
        eprintln!("  Segment builder: {} attributes", catalog.len());
        eprintln!("  Commands: help, attrs, add, remove, key, op, value, clear, logic, show, quit");
        eprintln!();
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        if !globals.quiet {
            eprint!("segment> ");
        }
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                // EOF (Ctrl-D)
                if !globals.quiet {
                    eprintln!();
                }
                break;
            }
            Err(e) => {
                eprintln!("error reading input: {}", e);
                break;
            }
        };

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        match execute(&mut builder, trimmed, preview.as_ref()) {
            Ok(Step::Changed) => {
                if let Some(scheduler) = preview.as_mut() {
                    scheduler.schedule(builder.filter());
                }
            }
            Ok(Step::Unchanged) => {}
            Ok(Step::Quit) => break,
            Err(msg) => eprintln!("  {}", msg),
        }
    }

    drop(preview);
    if let Some(printer) = printer {
        printer.abort();
    }

    finish(&builder, out, globals.quiet)
}

fn execute(
    builder: &mut SegmentBuilder,
    line: &str,
    preview: Option<&PreviewScheduler>,
) -> Result<Step, String> {
    let parts: Vec<&str> = line.splitn(3, char::is_whitespace).collect();
    let cmd = parts[0].to_lowercase();

    match cmd.as_str() {
        "help" => {
            print_help();
            Ok(Step::Unchanged)
        }
        "attrs" | "attributes" => {
            for attr in builder.catalog().iter() {
                eprintln!("  {}", render::attribute_line(attr));
            }
            Ok(Step::Unchanged)
        }
        "add" => {
            let index = builder.add_condition();
            eprintln!("  added #{}", index + 1);
            Ok(Step::Changed)
        }
        "remove" | "rm" => {
            let index = position(arg(&parts, 1, "remove <n>")?, builder)?;
            builder.remove_condition(index).map_err(|e| render::builder_error(&e))?;
            eprintln!("  removed #{}", index + 1);
            Ok(Step::Changed)
        }
        "key" => {
            let index = position(arg(&parts, 1, "key <n> <attribute>")?, builder)?;
            let key = arg(&parts, 2, "key <n> <attribute>")?;
            builder.set_key(index, key).map_err(|e| render::builder_error(&e))?;
            let operators: Vec<&str> = builder
                .catalog()
                .get(key)
                .map(|a| a.operators.iter().map(|op| op.as_str()).collect())
                .unwrap_or_default();
            eprintln!("  #{} operators: {}", index + 1, operators.join(", "));
            Ok(Step::Changed)
        }
        "op" | "operator" => {
            let index = position(arg(&parts, 1, "op <n> <operator|none>")?, builder)?;
            let raw = arg(&parts, 2, "op <n> <operator|none>")?;
            let operator = if raw.eq_ignore_ascii_case("none") {
                None
            } else {
                Some(raw.parse::<Operator>().map_err(|e| e.to_string())?)
            };
            builder
                .set_operator(index, operator)
                .map_err(|e| render::builder_error(&e))?;
            let kind = builder.input_kind(index).map_err(|e| render::builder_error(&e))?;
            eprintln!("  #{} takes {} input", index + 1, kind);
            Ok(Step::Changed)
        }
        "value" | "val" => {
            let index = position(arg(&parts, 1, "value <n> <value>")?, builder)?;
            let raw = parts.get(2).copied().unwrap_or("");
            builder
                .set_value_from_str(index, raw)
                .map_err(|e| render::builder_error(&e))?;
            Ok(Step::Changed)
        }
        "clear" => {
            let index = position(arg(&parts, 1, "clear <n>")?, builder)?;
            builder.set_key(index, "").map_err(|e| render::builder_error(&e))?;
            Ok(Step::Changed)
        }
        "logic" => {
            let logic: Logic = arg(&parts, 1, "logic <and|or>")?
                .parse()
                .map_err(|_| "logic must be 'and' or 'or'".to_string())?;
            builder.set_logic(logic);
            if !builder.logic_selectable() {
                eprintln!("  (logic applies once there are two or more conditions)");
            }
            Ok(Step::Changed)
        }
        "show" => {
            for line in render::filter_lines(builder.filter(), builder.catalog()) {
                eprintln!("  {}", line);
            }
            if let Some(snapshot) = preview.and_then(PreviewScheduler::latest) {
                for line in render::preview_lines(&snapshot.result) {
                    eprintln!("  {}", line);
                }
            }
            Ok(Step::Unchanged)
        }
        "quit" | "exit" | "done" => Ok(Step::Quit),
        other => Err(format!("unknown command '{}'; type 'help'", other)),
    }
}

fn arg<'a>(parts: &[&'a str], n: usize, usage: &str) -> Result<&'a str, String> {
    parts
        .get(n)
        .copied()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("usage: {}", usage))
}

/// Parse a 1-based condition number.
fn position(raw: &str, builder: &SegmentBuilder) -> Result<usize, String> {
    match raw.parse::<usize>() {
        Ok(n) if n >= 1 && n <= builder.len() => Ok(n - 1),
        Ok(_) | Err(_) => Err(format!(
            "'{}' is not a condition number (have {})",
            raw,
            builder.len()
        )),
    }
}

fn spawn_preview_printer(
    mut rx: watch::Receiver<Option<PreviewSnapshot>>,
    quiet: bool,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let snapshot = rx.borrow_and_update().clone();
            if let (Some(snapshot), false) = (snapshot, quiet) {
                eprintln!("  preview: {} matching contacts", snapshot.result.total_count);
            }
        }
    })
}

fn finish(builder: &SegmentBuilder, out: Option<&Path>, quiet: bool) -> Result<(), String> {
    let payload = builder.filter().payload();
    let json = serde_json::to_string_pretty(&payload).map_err(|e| e.to_string())?;
    match out {
        Some(path) => {
            std::fs::write(path, format!("{}\n", json))
                .map_err(|e| format!("error writing file '{}': {}", path.display(), e))?;
            if !quiet {
                eprintln!("  wrote {}", path.display());
            }
        }
        None => println!("{}", json),
    }

    let incomplete = builder.filter().incomplete();
    if !incomplete.is_empty() && !quiet {
        let numbers: Vec<String> = incomplete.iter().map(|i| format!("#{}", i + 1)).collect();
        eprintln!("  warning: incomplete conditions: {}", numbers.join(", "));
    }
    Ok(())
}

fn print_help() {
    eprintln!("  attrs                   list attributes and their operators");
    eprintln!("  add                     append an empty condition");
    eprintln!("  remove <n>              delete condition n");
    eprintln!("  key <n> <attribute>     choose the attribute (resets operator and value)");
    eprintln!("  op <n> <operator|none>  choose the operator");
    eprintln!("  value <n> <value>       set the value; count takes e.g. '>= 3'");
    eprintln!("  clear <n>               reset condition n");
    eprintln!("  logic <and|or>          how conditions combine");
    eprintln!("  show                    print the filter and latest preview");
    eprintln!("  quit                    finish and print the filter");
}

#[cfg(test)]
mod tests {
    use super::*;
    use segment_core::{AttributeCatalog, AttributeList, ConditionValue};

    fn builder() -> SegmentBuilder {
        let list: AttributeList = serde_json::from_value(serde_json::json!({
            "attributes": [
                {"key": "balance", "type": "number", "conditions": ["gt", "lt"]},
                {"key": "services", "type": "array", "conditions": ["count", "is_empty"]},
            ]
        }))
        .unwrap();
        let (catalog, _) = AttributeCatalog::from_wire(list.attributes);
        SegmentBuilder::new(Arc::new(catalog))
    }

    fn run(b: &mut SegmentBuilder, script: &[&str]) {
        for line in script {
            if let Err(msg) = execute(b, line, None) {
                panic!("'{}' failed: {}", line, msg);
            }
        }
    }

    #[test]
    fn script_builds_a_complete_filter() {
        let mut b = builder();
        run(
            &mut b,
            &[
                "add",
                "key 1 balance",
                "op 1 gt",
                "value 1 250",
                "add",
                "key 2 services",
                "op 2 count",
                "value 2 >= 2",
                "logic or",
            ],
        );
        assert!(b.is_previewable());
        assert_eq!(b.logic(), Logic::Or);
        assert_eq!(b.conditions()[0].value, ConditionValue::number(250));
    }

    #[test]
    fn condition_numbers_are_one_based_and_checked() {
        let mut b = builder();
        run(&mut b, &["add"]);
        assert!(execute(&mut b, "key 0 balance", None).is_err());
        assert!(execute(&mut b, "key 2 balance", None).is_err());
        assert!(execute(&mut b, "key 1 balance", None).is_ok());
    }

    #[test]
    fn rejected_edits_report_without_changing_filter() {
        let mut b = builder();
        run(&mut b, &["add", "key 1 balance"]);
        let before = b.filter().clone();

        let err = execute(&mut b, "op 1 contains", None).err().unwrap();
        assert!(err.contains("not available"), "{}", err);
        assert!(execute(&mut b, "value 1 10", None).is_err());
        assert_eq!(b.filter(), &before);
    }

    #[test]
    fn clear_resets_the_condition() {
        let mut b = builder();
        run(&mut b, &["add", "key 1 services", "op 1 is_empty", "clear 1"]);
        assert_eq!(b.conditions()[0].key, "");
        assert_eq!(b.conditions()[0].operator, None);
    }

    #[test]
    fn quit_and_unknown_commands() {
        let mut b = builder();
        assert!(matches!(execute(&mut b, "quit", None), Ok(Step::Quit)));
        assert!(execute(&mut b, "frobnicate", None).is_err());
    }
}

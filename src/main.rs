use codereplay::kernel::{load_config, PlaybackConfig, PlaybackCursor};
use codereplay::models::{AnnotationId, FileId};
use std::fmt::Write as _;
use std::io::Write as _;
use std::path::PathBuf;

mod logging;

const USAGE: &str =
    "usage: codereplay <session.json> [--to INDEX | --annotation ID] [--config FILE] [--file ID]";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Target {
    End,
    Index(usize),
    Annotation(AnnotationId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliArgs {
    session: PathBuf,
    target: Target,
    config: Option<PathBuf>,
    file: Option<FileId>,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<CliArgs, String> {
    let mut session = None;
    let mut target = Target::End;
    let mut config = None;
    let mut file = None;

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        let mut value = |flag: &str| {
            args.next()
                .ok_or_else(|| format!("{flag} needs a value\n{USAGE}"))
        };
        match arg.as_str() {
            "--to" => {
                if target != Target::End {
                    return Err(format!("--to and --annotation are exclusive\n{USAGE}"));
                }
                let raw = value("--to")?;
                let index = raw
                    .parse::<usize>()
                    .map_err(|_| format!("--to expects an event index, got {raw:?}"))?;
                target = Target::Index(index);
            }
            "--annotation" => {
                if target != Target::End {
                    return Err(format!("--to and --annotation are exclusive\n{USAGE}"));
                }
                target = Target::Annotation(AnnotationId::from(value("--annotation")?));
            }
            "--config" => config = Some(PathBuf::from(value("--config")?)),
            "--file" => file = Some(FileId::from(value("--file")?)),
            "-h" | "--help" => return Err(USAGE.to_string()),
            flag if flag.starts_with("--") => {
                return Err(format!("unknown option {flag}\n{USAGE}"));
            }
            _ if session.is_none() => session = Some(PathBuf::from(&arg)),
            _ => return Err(format!("unexpected argument {arg:?}\n{USAGE}")),
        }
    }

    Ok(CliArgs {
        session: session.ok_or_else(|| USAGE.to_string())?,
        target,
        config,
        file,
    })
}

fn render(cursor: &PlaybackCursor, file: Option<&FileId>) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "position {} of {}",
        cursor.position(),
        cursor.events().len()
    );
    if let Some(id) = cursor.active_annotation() {
        let _ = writeln!(out, "annotation {id}");
    }

    let tree = cursor.current_tree();
    for dir in &tree.directories {
        let flag = if dir.deleted { " (deleted)" } else { "" };
        let _ = writeln!(out, "d {}{flag}", dir.path);
    }
    for entry in &tree.files {
        let flag = if entry.deleted { " (deleted)" } else { "" };
        let _ = writeln!(out, "f {} [{}]{flag}", entry.path, entry.id);
    }

    let Some(file) = file.or(cursor.active_file_id()) else {
        return out;
    };
    let _ = writeln!(out, "--- {file}");
    match cursor.current_file_text(file) {
        Some(text) => {
            out.push_str(&text);
            if !text.ends_with('\n') {
                out.push('\n');
            }
        }
        None => out.push_str("(no such file)\n"),
    }
    let ranges = cursor.diff_ranges(file);
    let ranges = serde_json::to_string(&ranges).unwrap_or_else(|_| "[]".to_string());
    let _ = writeln!(out, "--- new code {ranges}");
    out
}

fn run(args: &CliArgs) -> Result<String, Box<dyn std::error::Error>> {
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => PlaybackConfig::default(),
    };
    let mut cursor = PlaybackCursor::load(&args.session, &config)?;
    tracing::info!(
        session = %args.session.display(),
        events = cursor.events().len(),
        annotations = cursor.annotations().len(),
        "session loaded"
    );

    match &args.target {
        Target::End => {
            cursor.step_forward(usize::MAX)?;
        }
        Target::Index(index) => {
            cursor.step_to(*index)?;
        }
        Target::Annotation(id) => {
            if cursor.step_to_annotation(id)?.is_none() {
                return Err(format!("no annotation {id}").into());
            }
        }
    }

    Ok(render(&cursor, args.file.as_ref()))
}

fn main() {
    let _logging = logging::init();

    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(message) => {
            eprintln!("{message}");
            std::process::exit(1);
        }
    };

    match run(&args) {
        Ok(output) => {
            let mut stdout = std::io::stdout().lock();
            let _ = stdout.write_all(output.as_bytes());
        }
        Err(err) => {
            tracing::error!(error = %err, "replay failed");
            eprintln!("codereplay: {err}");
            drop(_logging);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/cli_args.rs"]
mod tests;

//! Canonical go.mod rendering.
//!
//! The formatter owns the output grammar byte for byte: statements appear in
//! a fixed section order (module, go, require, exclude, replace, retract)
//! separated by one blank line, a block with a single entry collapses to an
//! inline directive, and larger blocks are factored with tab indentation.
//! Formatting a sorted manifest is deterministic, and parsing the result
//! yields the manifest back.

use crate::core::modfile::{ModFile, Replace, ReplaceTarget, Require, Retract};

/// Render a manifest as canonical go.mod text.
///
/// The empty manifest renders as the empty string.
pub fn format(file: &ModFile) -> String {
    let mut sections: Vec<String> = Vec::new();

    if let Some(module) = &file.module {
        sections.push(format!("module {}\n", maybe_quote(module)));
    }
    if let Some(go) = &file.go {
        sections.push(format!("go {}\n", go));
    }

    push_section(
        &mut sections,
        "require",
        file.require.iter().map(require_entry).collect(),
    );
    push_section(
        &mut sections,
        "exclude",
        file.exclude
            .iter()
            .map(|x| Entry::plain(format!("{} {}", maybe_quote(&x.path), x.version)))
            .collect(),
    );
    push_section(
        &mut sections,
        "replace",
        file.replace.iter().map(replace_entry).collect(),
    );
    push_section(
        &mut sections,
        "retract",
        file.retract.iter().map(retract_entry).collect(),
    );

    sections.join("\n")
}

/// One rendered directive: the line text plus any comment lines that sit
/// above it (multi-line retract rationales).
struct Entry {
    before: Vec<String>,
    line: String,
}

impl Entry {
    fn plain(line: String) -> Self {
        Entry {
            before: Vec::new(),
            line,
        }
    }
}

fn require_entry(req: &Require) -> Entry {
    let mut line = format!("{} {}", maybe_quote(&req.path), req.version);
    if req.indirect {
        line.push_str(" // indirect");
    }
    Entry::plain(line)
}

fn replace_entry(rep: &Replace) -> Entry {
    let mut line = maybe_quote(&rep.old_path);
    if let Some(ver) = &rep.old_version {
        line.push(' ');
        line.push_str(ver);
    }
    line.push_str(" => ");
    match &rep.new {
        ReplaceTarget::Module { path, version } => {
            line.push_str(&maybe_quote(path));
            line.push(' ');
            line.push_str(version);
        }
        ReplaceTarget::Directory { path } => line.push_str(&maybe_quote(path)),
    }
    Entry::plain(line)
}

fn retract_entry(ret: &Retract) -> Entry {
    let mut entry = Entry::plain(ret.interval.to_string());
    if ret.rationale.contains('\n') {
        entry.before = ret.rationale.lines().map(str::to_string).collect();
    } else if !ret.rationale.is_empty() {
        entry.line.push_str(" // ");
        entry.line.push_str(&ret.rationale);
    }
    entry
}

fn push_section(sections: &mut Vec<String>, verb: &str, entries: Vec<Entry>) {
    match entries.as_slice() {
        [] => {}
        [entry] => {
            let mut out = String::new();
            for line in &entry.before {
                push_comment_line(&mut out, "", line);
            }
            out.push_str(verb);
            out.push(' ');
            out.push_str(&entry.line);
            out.push('\n');
            sections.push(out);
        }
        entries => {
            let mut out = String::new();
            out.push_str(verb);
            out.push_str(" (\n");
            for entry in entries {
                for line in &entry.before {
                    push_comment_line(&mut out, "\t", line);
                }
                out.push('\t');
                out.push_str(&entry.line);
                out.push('\n');
            }
            out.push_str(")\n");
            sections.push(out);
        }
    }
}

fn push_comment_line(out: &mut String, indent: &str, line: &str) {
    out.push_str(indent);
    if line.is_empty() {
        out.push_str("//\n");
    } else {
        out.push_str("// ");
        out.push_str(line);
        out.push('\n');
    }
}

/// Quote a token when the scanner would not read it back as one bare token.
fn maybe_quote(token: &str) -> String {
    let needs_quotes = token.is_empty()
        || token.contains("//")
        || token
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '"' | '\\' | '(' | ')' | '[' | ']' | ','));
    if !needs_quotes {
        return token.to_string();
    }
    let mut quoted = String::with_capacity(token.len() + 2);
    quoted.push('"');
    for c in token.chars() {
        if matches!(c, '"' | '\\') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

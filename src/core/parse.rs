//! go.mod text parsing.
//!
//! The grammar is line oriented. Each non-blank line is one directive, or
//! one entry inside a factored `verb ( ... )` block. `//` starts a comment
//! that runs to the end of the line; a comment on its own line attaches to
//! the next retract entry as rationale. Tokens are whitespace separated,
//! with double quotes (and `\"` / `\\` escapes) available for paths the
//! scanner could not read back bare.
//!
//! Parsing builds a raw [`ModFile`]: repeated requires, excludes, and
//! replaces within one file are accumulated as written. Key invariants are
//! enforced later, when the merge engine inserts directives into its target.

use miette::Diagnostic;
use thiserror::Error;

use crate::core::modfile::{Exclude, ModFile, Replace, ReplaceTarget, VersionInterval};
use crate::core::version;

/// Error raised when manifest text does not conform to the grammar.
#[derive(Debug, Error, Diagnostic)]
#[error("{file}:{line}: {kind}")]
#[diagnostic(code(modmerge::modfile::parse))]
pub struct ParseError {
    /// Label for the input, normally its path.
    pub file: String,
    /// 1-based line the error was detected on.
    pub line: usize,
    pub kind: ParseErrorKind,
}

/// The specific grammar violation behind a [`ParseError`].
#[derive(Debug, Error)]
pub enum ParseErrorKind {
    #[error("unknown directive `{0}`")]
    UnknownDirective(String),
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error("invalid module path `{path}`: {reason}")]
    InvalidModulePath { path: String, reason: &'static str },
    #[error("invalid module version `{0}`")]
    InvalidVersion(String),
    #[error("invalid go version `{0}`: must match a version like 1.23")]
    InvalidGoVersion(String),
    #[error("unterminated quoted string")]
    UnterminatedString,
    #[error("unsupported escape `\\{0}` in quoted string")]
    BadEscape(char),
    #[error("unexpected token `{0}`")]
    UnexpectedToken(String),
    #[error("`{0}` block is never closed")]
    UnclosedBlock(String),
    #[error("replacement target without version must be a directory path (./, ../ or rooted)")]
    ReplacementNeedsDirectory,
    #[error("replacement directory path must not carry a version")]
    ReplacementDirectoryVersion,
}

/// Parse manifest text into a structured [`ModFile`].
///
/// `file` labels the input in error positions and is normally its path.
/// Empty text parses to the empty manifest.
pub fn parse(file: &str, content: &str) -> Result<ModFile, ParseError> {
    Parser {
        file,
        out: ModFile::new(),
    }
    .run(content)
}

struct Parser<'a> {
    file: &'a str,
    out: ModFile,
}

impl Parser<'_> {
    fn run(mut self, content: &str) -> Result<ModFile, ParseError> {
        let lines: Vec<&str> = content.lines().collect();
        let mut pending: Vec<String> = Vec::new();
        let mut i = 0;
        while i < lines.len() {
            let lineno = i + 1;
            let (stmt, comment) = self.split_comment(lineno, lines[i])?;
            let tokens = self.tokenize(lineno, stmt)?;
            i += 1;
            if tokens.is_empty() {
                // A lone comment starts or extends a rationale paragraph;
                // a blank line ends it.
                match comment {
                    Some(text) => pending.push(text.to_string()),
                    None => pending.clear(),
                }
                continue;
            }
            if tokens.len() >= 2 && tokens[1] == "(" {
                if tokens.len() > 2 {
                    return Err(self.err(lineno, ParseErrorKind::UnexpectedToken(tokens[2].clone())));
                }
                i = self.block(&tokens[0], lineno, &lines, i)?;
                pending.clear();
                continue;
            }
            self.statement(lineno, &tokens[0], &tokens[1..], comment, &pending)?;
            pending.clear();
        }
        Ok(self.out)
    }

    /// Parse the body of a factored `verb ( ... )` block. Returns the index
    /// of the line after the closing paren.
    fn block(
        &mut self,
        verb: &str,
        open_lineno: usize,
        lines: &[&str],
        mut i: usize,
    ) -> Result<usize, ParseError> {
        if !matches!(verb, "require" | "exclude" | "replace" | "retract") {
            return Err(self.err(open_lineno, ParseErrorKind::UnexpectedToken("(".to_string())));
        }
        let mut pending: Vec<String> = Vec::new();
        while i < lines.len() {
            let lineno = i + 1;
            let (stmt, comment) = self.split_comment(lineno, lines[i])?;
            let tokens = self.tokenize(lineno, stmt)?;
            i += 1;
            if tokens.is_empty() {
                match comment {
                    Some(text) => pending.push(text.to_string()),
                    None => pending.clear(),
                }
                continue;
            }
            if tokens.len() == 1 && tokens[0] == ")" {
                return Ok(i);
            }
            self.statement(lineno, verb, &tokens, comment, &pending)?;
            pending.clear();
        }
        Err(self.err(
            open_lineno,
            ParseErrorKind::UnclosedBlock(verb.to_string()),
        ))
    }

    /// Apply one directive. `args` are the tokens after the verb, `comment`
    /// is the trailing comment text, `pending` the comment lines directly
    /// above the directive.
    fn statement(
        &mut self,
        lineno: usize,
        verb: &str,
        args: &[String],
        comment: Option<&str>,
        pending: &[String],
    ) -> Result<(), ParseError> {
        match verb {
            "module" => {
                let path = match args {
                    [path] => path,
                    _ => return Err(self.err(lineno, ParseErrorKind::Usage("module module/path"))),
                };
                self.check_path(lineno, path)?;
                self.out.set_module(path.clone());
            }
            "go" => {
                let ver = match args {
                    [ver] => ver,
                    _ => return Err(self.err(lineno, ParseErrorKind::Usage("go 1.23"))),
                };
                if !version::is_valid_go_version(ver) {
                    return Err(self.err(lineno, ParseErrorKind::InvalidGoVersion(ver.clone())));
                }
                self.out.set_go(ver.clone());
            }
            "require" => {
                let (path, ver) = match args {
                    [path, ver] => (path, ver),
                    _ => {
                        return Err(
                            self.err(lineno, ParseErrorKind::Usage("require module/path v1.2.3"))
                        )
                    }
                };
                self.check_path(lineno, path)?;
                self.check_version(lineno, ver)?;
                let indirect = comment.map(is_indirect_comment).unwrap_or(false);
                self.out.add_require(path.clone(), ver.clone(), indirect);
            }
            "exclude" => {
                let (path, ver) = match args {
                    [path, ver] => (path, ver),
                    _ => {
                        return Err(
                            self.err(lineno, ParseErrorKind::Usage("exclude module/path v1.2.3"))
                        )
                    }
                };
                self.check_path(lineno, path)?;
                self.check_version(lineno, ver)?;
                self.out.exclude.push(Exclude {
                    path: path.clone(),
                    version: ver.clone(),
                });
            }
            "replace" => {
                let rep = self.replace_spec(lineno, args)?;
                self.out.replace.push(rep);
            }
            "retract" => {
                let interval = self.retract_spec(lineno, args)?;
                let rationale = match comment {
                    Some(text) if !text.is_empty() => text.to_string(),
                    _ => pending.join("\n"),
                };
                self.out.add_retract(interval, rationale);
            }
            _ => {
                return Err(self.err(lineno, ParseErrorKind::UnknownDirective(verb.to_string())));
            }
        }
        Ok(())
    }

    /// `old [v] => new [v]`, where an unversioned target must be a
    /// directory path.
    fn replace_spec(&self, lineno: usize, args: &[String]) -> Result<Replace, ParseError> {
        let usage = "replace module/path [v1.2.3] => other/path v1.4.5";
        let arrow = match args.iter().position(|t| t == "=>") {
            Some(pos) => pos,
            None => return Err(self.err(lineno, ParseErrorKind::Usage(usage))),
        };
        let (old_path, old_version) = match &args[..arrow] {
            [path] => (path, None),
            [path, ver] => (path, Some(ver)),
            _ => return Err(self.err(lineno, ParseErrorKind::Usage(usage))),
        };
        self.check_path(lineno, old_path)?;
        if let Some(ver) = old_version {
            self.check_version(lineno, ver)?;
        }
        let new = match &args[arrow + 1..] {
            [path] if is_directory_path(path) => ReplaceTarget::Directory { path: path.clone() },
            [_] => return Err(self.err(lineno, ParseErrorKind::ReplacementNeedsDirectory)),
            [path, ver] => {
                if is_directory_path(path) {
                    return Err(self.err(lineno, ParseErrorKind::ReplacementDirectoryVersion));
                }
                self.check_path(lineno, path)?;
                self.check_version(lineno, ver)?;
                ReplaceTarget::Module {
                    path: path.clone(),
                    version: ver.clone(),
                }
            }
            _ => return Err(self.err(lineno, ParseErrorKind::Usage(usage))),
        };
        Ok(Replace {
            old_path: old_path.clone(),
            old_version: old_version.cloned(),
            new,
        })
    }

    /// `v1.2.3` or `[v1.2.3, v1.4.5]`.
    fn retract_spec(&self, lineno: usize, args: &[String]) -> Result<VersionInterval, ParseError> {
        let usage = "retract v1.2.3 or retract [v1.2.3, v1.4.5]";
        match args {
            [ver] => {
                self.check_version(lineno, ver)?;
                Ok(VersionInterval::single(ver.clone()))
            }
            [open, low, comma, high, close]
                if open == "[" && comma == "," && close == "]" =>
            {
                self.check_version(lineno, low)?;
                self.check_version(lineno, high)?;
                Ok(VersionInterval {
                    low: low.clone(),
                    high: high.clone(),
                })
            }
            _ => Err(self.err(lineno, ParseErrorKind::Usage(usage))),
        }
    }

    /// Split a raw line into statement text and trailing comment, honoring
    /// quoted strings.
    fn split_comment<'l>(
        &self,
        lineno: usize,
        raw: &'l str,
    ) -> Result<(&'l str, Option<&'l str>), ParseError> {
        let bytes = raw.as_bytes();
        let mut in_string = false;
        let mut escaped = false;
        let mut k = 0;
        while k < bytes.len() {
            let c = bytes[k];
            if in_string {
                if escaped {
                    escaped = false;
                } else if c == b'\\' {
                    escaped = true;
                } else if c == b'"' {
                    in_string = false;
                }
            } else if c == b'"' {
                in_string = true;
            } else if c == b'/' && bytes.get(k + 1) == Some(&b'/') {
                return Ok((&raw[..k], Some(raw[k + 2..].trim())));
            }
            k += 1;
        }
        if in_string {
            return Err(self.err(lineno, ParseErrorKind::UnterminatedString));
        }
        Ok((raw, None))
    }

    /// Split statement text into tokens. Quoted strings come back unquoted;
    /// parens, brackets, and commas are single-character tokens.
    fn tokenize(&self, lineno: usize, text: &str) -> Result<Vec<String>, ParseError> {
        let mut tokens = Vec::new();
        let mut chars = text.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                c if c.is_whitespace() => {}
                '(' | ')' | '[' | ']' | ',' => tokens.push(c.to_string()),
                '"' => {
                    let mut tok = String::new();
                    loop {
                        match chars.next() {
                            None => {
                                return Err(self.err(lineno, ParseErrorKind::UnterminatedString))
                            }
                            Some('"') => break,
                            Some('\\') => match chars.next() {
                                Some(esc @ ('"' | '\\')) => tok.push(esc),
                                Some(other) => {
                                    return Err(self.err(lineno, ParseErrorKind::BadEscape(other)))
                                }
                                None => {
                                    return Err(
                                        self.err(lineno, ParseErrorKind::UnterminatedString)
                                    )
                                }
                            },
                            Some(other) => tok.push(other),
                        }
                    }
                    tokens.push(tok);
                }
                _ => {
                    let mut tok = String::new();
                    tok.push(c);
                    while let Some(&next) = chars.peek() {
                        if next.is_whitespace()
                            || matches!(next, '(' | ')' | '[' | ']' | ',' | '"')
                        {
                            break;
                        }
                        tok.push(next);
                        chars.next();
                    }
                    tokens.push(tok);
                }
            }
        }
        Ok(tokens)
    }

    fn check_path(&self, lineno: usize, path: &str) -> Result<(), ParseError> {
        version::check_module_path(path).map_err(|reason| {
            self.err(
                lineno,
                ParseErrorKind::InvalidModulePath {
                    path: path.to_string(),
                    reason,
                },
            )
        })
    }

    fn check_version(&self, lineno: usize, ver: &str) -> Result<(), ParseError> {
        if version::is_valid_module_version(ver) {
            Ok(())
        } else {
            Err(self.err(lineno, ParseErrorKind::InvalidVersion(ver.to_string())))
        }
    }

    fn err(&self, line: usize, kind: ParseErrorKind) -> ParseError {
        ParseError {
            file: self.file.to_string(),
            line,
            kind,
        }
    }
}

fn is_indirect_comment(comment: &str) -> bool {
    comment == "indirect" || comment.starts_with("indirect;")
}

/// True for replacement targets that name a directory instead of a module.
fn is_directory_path(path: &str) -> bool {
    path == "."
        || path == ".."
        || path.starts_with("./")
        || path.starts_with("../")
        || path.starts_with('/')
}

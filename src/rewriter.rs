use crate::defines::DefineTable;
use eyre::{Context, Result};
use regex::Regex;
use std::borrow::Cow;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

const DIRECTIVE_PATTERN: &str =
    r#"^\s*#\s*(?P<cmd>[a-z]+)(?:\s+(?P<name>\S+)(?:\s+(?P<value>"[^"]+"|\S+))?)?"#;

/// Counters for a processed template
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteStats {
    pub lines: usize,
    pub rewritten: usize,
}

/// Rewrites `#define`, `#undef` and `#cmakedefine` lines of a template
/// header using values from a [`DefineTable`].
///
/// Every line is handled on its own: no state carries over between lines,
/// and anything outside the substituted span is kept byte-for-byte.
pub struct Rewriter<'a> {
    defines: &'a DefineTable,
    directive_regex: Regex,
}

impl<'a> Rewriter<'a> {
    pub fn new(defines: &'a DefineTable) -> Self {
        let directive_regex = Regex::new(DIRECTIVE_PATTERN).expect("Invalid directive regex");
        Self { defines, directive_regex }
    }

    /// Rewrite a single line, borrowing it back when nothing changes
    pub fn rewrite_line<'l>(&self, line: &'l str) -> Cow<'l, str> {
        let Some(captures) = self.directive_regex.captures(line) else {
            return Cow::Borrowed(line);
        };
        let (Some(cmd), Some(name)) = (captures.name("cmd"), captures.name("name")) else {
            return Cow::Borrowed(line);
        };
        let cmd_name = cmd.as_str();

        match cmd_name {
            "define" => {
                let value = captures.name("value");
                let (Some(value), Some(resolved)) = (value, self.defines.get(name.as_str())) else {
                    return Cow::Borrowed(line);
                };
                tracing::debug!(name = name.as_str(), %resolved, "substituting value");
                Cow::Owned(format!(
                    "{}{}{}",
                    &line[..value.start()],
                    resolved,
                    &line[value.end()..]
                ))
            }
            "undef" | "cmakedefine" => {
                let rest = &line[name.end()..];
                match self.defines.get(name.as_str()) {
                    Some(resolved) => {
                        tracing::debug!(name = name.as_str(), %resolved, "{} -> define", cmd_name);
                        Cow::Owned(format!(
                            "{}define{} {}{}",
                            &line[..cmd.start()],
                            &line[cmd.end()..name.end()],
                            resolved,
                            rest
                        ))
                    }
                    None => {
                        tracing::debug!(name = name.as_str(), "{} left undefined", cmd_name);
                        Cow::Owned(format!("/* #undef {} */{}", name.as_str(), rest))
                    }
                }
            }
            _ => Cow::Borrowed(line),
        }
    }

    /// Stream a template from `reader` to `writer`, keeping line terminators.
    ///
    /// The writer is neither flushed nor closed here; lines written before
    /// a failure stay written.
    pub fn process_reader<R: BufRead, W: Write>(
        &self,
        mut reader: R,
        writer: &mut W,
    ) -> Result<RewriteStats> {
        let mut stats = RewriteStats::default();
        let mut line = String::new();

        loop {
            line.clear();
            let read = reader
                .read_line(&mut line)
                .with_context(|| format!("Failed to read line {}", stats.lines + 1))?;
            if read == 0 {
                break;
            }
            stats.lines += 1;

            let output = self.rewrite_line(&line);
            if matches!(output, Cow::Owned(_)) {
                stats.rewritten += 1;
            }
            writer.write_all(output.as_bytes()).context("Failed to write output")?;
        }

        Ok(stats)
    }

    /// Process the template at `path`, writing the result to `writer`
    pub fn process_file<P: AsRef<Path>, W: Write>(
        &self,
        path: P,
        writer: &mut W,
    ) -> Result<RewriteStats> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open template: {}", path.display()))?;

        let stats = self
            .process_reader(BufReader::new(file), writer)
            .with_context(|| format!("Failed to process template: {}", path.display()))?;

        tracing::info!(
            path = %path.display(),
            lines = stats.lines,
            rewritten = stats.rewritten,
            "processed template"
        );
        Ok(stats)
    }
}

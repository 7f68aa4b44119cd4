mod kinds;
pub use kinds::*;

use super::*;
use core::fmt;
use unicode_width::UnicodeWidthStr;

#[derive(Debug, Clone)]
pub struct ErrorContext<'a> {
    pub filename: &'a str,
    pub source: &'a str,
    /// Byte offset at which every line starts.
    pub lines: Vec<usize>,
    pub options: &'a Options,
}

pub type AError<E> = (E, Span);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severeness {
    Error,
}

#[derive(Debug, Clone)]
pub struct Marker {
    pub message: String,
    pub span: Span,
    pub style: MarkerStyle,
}

#[derive(Debug, Clone, Copy)]
pub enum MarkerStyle {
    Primary,
    Secondary,
}

impl Severeness {
    const fn as_str(self, options: &Options) -> &'static str {
        match (self, options.alt_color) {
            (Self::Error, false) => "\x1b[1;31mError",
            (Self::Error, true) => "\x1b[1;97mError",
        }
    }

    const fn plain(self) -> &'static str {
        match self {
            Self::Error => "error",
        }
    }
}

/// Renders diagnostics against the expression source they refer to. Returns
/// the rendered text and whether any of them is an error.
pub fn report<E: CompilerError>(errs: Vec<AError<E>>, filename: &str, src: &str, options: &Options) -> (String, bool) {
    let mut lines = vec![0];
    lines.extend(src.match_indices('\n').map(|(i, _)| i + 1));

    let ctx = ErrorContext {
        filename,
        source: src,
        lines,
        options,
    };

    let mut out = String::new();
    let mut have_error = false;

    for (err, span) in errs {
        let span = ctx.clamp(span);
        let written = match options.error_style {
            ErrorStyle::Simple => report_simple(&err, &ctx, span, &mut out),
            _ => report_single(&err, &ctx, span, &mut out),
        };
        // formatting into a String cannot fail
        debug_assert!(written.is_ok());
        have_error |= err.severeness() == Severeness::Error;
    }

    (out, have_error)
}

fn report_simple<E: CompilerError, W: fmt::Write>(err: &E, ctx: &ErrorContext<'_>, span: Span, out: &mut W) -> fmt::Result {
    writeln!(
        out,
        "{}:{}: {}: {}",
        ctx.filename,
        ctx.position(span.start),
        err.severeness().plain(),
        err.message()
    )
}

fn report_single<E: CompilerError, W: fmt::Write>(err: &E, ctx: &ErrorContext<'_>, span: Span, out: &mut W) -> fmt::Result {
    let markers: Vec<Marker> = err
        .markers(span.clone())
        .into_iter()
        .map(|mut m| {
            m.span = ctx.clamp(m.span);
            m
        })
        .collect();

    let start = ctx.position(span.start);
    let end = ctx.position(span.end);

    let mut important_lines = vec![start.line, end.line];
    for m in &markers {
        important_lines.push(ctx.position(m.span.start).line);
        important_lines.push(ctx.position(m.span.end).line);
    }

    important_lines.sort_unstable();
    important_lines.dedup();

    let last = important_lines.last().copied().unwrap_or(0) + 1;
    let line_no_len = last.to_string().len();

    writeln!(out, "{}: {}\x1b[0m", err.severeness().as_str(ctx.options), err.message())?;

    let empty = "";
    writeln!(
        out,
        "\x1b[1;34m{empty:<line_no_len$} ┌─\x1b[0;1m In: \x1b[0m{} \x1b[90m({start} to {end})\x1b[0m",
        ctx.filename,
    )?;
    writeln!(out, "\x1b[1;34m{empty:<line_no_len$} │\x1b[0m")?;

    for (i, l) in important_lines.iter().enumerate() {
        let l_s1 = l + 1;
        write!(out, "\x1b[1;34m{l_s1:<line_no_len$} │ \x1b[0m")?;

        let text = ctx.line_text(*l).trim_end();
        if ctx.options.error_style == ErrorStyle::NoHighlight {
            writeln!(out, "{text}")?;
        } else {
            writeln!(out, "{}\x1b[0m", highlight_line(text))?;
        }

        for m in &markers {
            m.mark_line(ctx, line_no_len, *l, out)?;
        }

        if important_lines.len() > (i + 1) && important_lines[i + 1] != l_s1 {
            let omitted = important_lines[i + 1] - l_s1;
            let s = if omitted == 1 { "" } else { "s" };
            writeln!(out, "\x1b[0;90m({omitted} line{s} omitted)\x1b[0m")?;
        }
    }

    writeln!(out, "\x1b[1;34m{empty:<line_no_len$} │\x1b[0m")?;

    if let Some(c) = err.consider() {
        writeln!(out, "\x1b[1;34m{empty:<line_no_len$} └─ \x1b[0;1mConsider:\x1b[0m {c}")?;
    }

    writeln!(out)
}

impl ErrorContext<'_> {
    /// Shrinks a span into the source; synthesized nodes may carry spans that
    /// point nowhere.
    fn clamp(&self, span: Span) -> Span {
        let end = self.floor(span.end.min(self.source.len()));
        let start = self.floor(span.start.min(end));
        start..end
    }

    fn floor(&self, mut pos: usize) -> usize {
        while !self.source.is_char_boundary(pos) {
            pos -= 1;
        }
        pos
    }

    fn line_start(&self, line: usize) -> usize { self.lines[line] }

    /// End of a line, excluding its line break.
    fn line_end(&self, line: usize) -> usize {
        self.lines.get(line + 1).map_or(self.source.len(), |next| next - 1)
    }

    fn line_text(&self, line: usize) -> &str { &self.source[self.line_start(line)..self.line_end(line)] }

    fn position(&self, pos: usize) -> Position {
        let line = self.lines.partition_point(|&start| start <= pos) - 1;
        let rel = &self.source[self.line_start(line)..pos];

        Position {
            line,
            column: UnicodeWidthStr::width_cjk(rel) + rel.matches('\t').count() * 4,
        }
    }
}

struct Position {
    line: usize,
    column: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}:{}", self.line + 1, self.column + 1) }
}

impl Marker {
    fn mark_line<W: fmt::Write>(&self, ctx: &ErrorContext<'_>, offset: usize, line: usize, out: &mut W) -> fmt::Result {
        let (line_start, line_end) = (ctx.line_start(line), ctx.line_end(line));
        if self.span.start > line_end || line_start > self.span.end {
            return Ok(());
        }

        let start = ctx.position(self.span.start.max(line_start));
        let end = ctx.position(self.span.end.min(line_end));

        let empty = "";

        let prepending = start.column;
        let length = (end.column - start.column).max(1);

        write!(out, "\x1b[1;34m{empty:<offset$} │ \x1b[0;")?;
        self.style.mark(prepending, length, out)?;

        if self.span.end <= line_end && !self.message.is_empty() {
            writeln!(out, " {}\x1b[0m", self.message)
        } else {
            writeln!(out, "\x1b[0m")
        }
    }
}

impl MarkerStyle {
    fn mark<W: fmt::Write>(self, prepending: usize, length: usize, out: &mut W) -> fmt::Result {
        let empty = "";

        match self {
            Self::Primary => write!(out, "1;33m{empty:<prepending$}{empty:^<length$}"),
            Self::Secondary => write!(out, "1;34m{empty:<prepending$}{empty:─<length$}"),
        }
    }
}

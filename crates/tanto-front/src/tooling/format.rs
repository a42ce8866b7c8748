//! Output reflow.
//!
//! The emitted text is assembled from rewrite fragments and boilerplate with
//! erratic whitespace. This pass re-lexes it and prints one statement per
//! line with four-space indentation. Token adjacency from the input is
//! preserved (a gap becomes exactly one space, no gap stays glued), so
//! constructs like `get_arg_val<uint32>(0)` survive untouched.

use logos::Logos;

use crate::{Error, Result};

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n\f]+")]
enum Tok {
    #[regex(r"//[^\n]*", allow_greedy = true)]
    LineComment,

    #[regex(r"/\*([^*]|\*[^/])*\*/")]
    BlockComment,

    #[regex(r"#[^\n]*", allow_greedy = true)]
    Preproc,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,

    #[regex(r"[0-9][0-9A-Za-z_.']*")]
    Number,

    #[regex(r#""([^"\\\n]|\\.)*""#)]
    Str,

    #[regex(r"'([^'\\\n]|\\.)'")]
    Char,

    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token(";")]
    Semi,

    #[token(",")]
    Comma,

    #[regex(r"[+\-*/%<>=!&|^~?:.\[\]]+")]
    Punct,
}

struct Printer {
    out: String,
    line: String,
    indent: usize,
    paren_depth: u32,
}

impl Printer {
    fn new() -> Self {
        Self {
            out: String::new(),
            line: String::new(),
            indent: 0,
            paren_depth: 0,
        }
    }

    fn flush(&mut self) {
        if self.line.is_empty() {
            return;
        }
        for _ in 0..self.indent {
            self.out.push_str("    ");
        }
        self.out.push_str(&self.line);
        self.out.push('\n');
        self.line.clear();
    }

    fn blank(&mut self) {
        self.flush();
        if !self.out.is_empty() && !self.out.ends_with("\n\n") {
            self.out.push('\n');
        }
    }

    fn push(&mut self, text: &str, spaced: bool) {
        if spaced && !self.line.is_empty() {
            self.line.push(' ');
        }
        self.line.push_str(text);
    }
}

/// Reflow `input` into the fixed output style. Fails with
/// [`Error::Format`] when the text cannot be tokenized.
pub fn format_code(input: &str) -> Result<String> {
    let mut printer = Printer::new();
    let mut lexer = Tok::lexer(input);
    let mut prev_end = 0usize;
    let mut prev_tok: Option<Tok> = None;

    while let Some(tok) = lexer.next() {
        let span = lexer.span();
        let tok = tok.map_err(|_| {
            let end = span.end.min(span.start + 8).min(input.len());
            let snippet = input.get(span.start..end).unwrap_or("?");
            Error::Format(format!(
                "unrecognized token `{snippet}` at byte {}",
                span.start
            ))
        })?;
        let gap = &input[prev_end..span.start];
        let newlines = gap.bytes().filter(|b| *b == b'\n').count();
        let spaced = !gap.is_empty();
        let text = lexer.slice();

        if newlines >= 2 {
            printer.blank();
        }

        // a closed brace ends its line unless the next token continues the
        // same construct (`};`, `} else`, `} while`)
        if prev_tok == Some(Tok::RBrace) {
            let keeps_line =
                matches!(tok, Tok::Semi | Tok::Comma) || (tok == Tok::Ident && matches!(text, "else" | "while"));
            if !keeps_line {
                printer.flush();
            }
        }

        match tok {
            Tok::Preproc | Tok::LineComment => {
                if newlines > 0 {
                    printer.flush();
                }
                printer.push(text, spaced);
                printer.flush();
            }
            Tok::LBrace => {
                printer.push("{", spaced);
                printer.flush();
                printer.indent += 1;
            }
            Tok::RBrace => {
                printer.flush();
                printer.indent = printer.indent.saturating_sub(1);
                printer.push("}", false);
            }
            Tok::Semi => {
                printer.push(";", false);
                if printer.paren_depth == 0 {
                    printer.flush();
                }
            }
            Tok::LParen => {
                printer.paren_depth += 1;
                printer.push("(", spaced);
            }
            Tok::RParen => {
                printer.paren_depth = printer.paren_depth.saturating_sub(1);
                printer.push(")", spaced);
            }
            _ => {
                printer.push(text, spaced);
            }
        }
        prev_end = span.end;
        prev_tok = Some(tok);
    }

    printer.flush();
    Ok(printer.out)
}

// Lilt, an interpreter for a small Scheme-like Lisp dialect.
// Copyright (C) 2026 the Lilt contributors

// Lilt is licensed under the terms of the MIT License. See the top
// level LICENSE file for the license text.

// <>

// src/parser.rs

// The reader: turns source text into cons-cell structures. Builds the
// output in place through raw slot pointers, keeping a stack of open
// lists, and rewrites the quote family of reader macros into their
// two-element list form.

// <>

use crate::core::{cons_init, list_2_init, string_init, ConsCell, Sexp};
use crate::memmgt::Heap;
use crate::symtab::SymbolTable;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("unbalanced parenthesis")]
    UnbalancedParen,

    #[error("unexpected end of input while reading {0}")]
    UnexpectedEof(&'static str),

    #[error("invalid escaped char '{0}'")]
    InvalidEscape(char),

    #[error("number literal out of range")]
    NumberOutOfRange,

    #[error("invalid #-token '#{0}'")]
    UnknownSpecial(char),

    #[error("quote with nothing to quote")]
    DanglingQuote,
}

/// One open list: where to resume the enclosing chain, the cell whose
/// car holds the list under construction, and a pending reader-macro
/// wrapper to apply once the list closes
struct ParserFrame {
    ret: *mut Sexp,
    cell: *mut ConsCell,
    wrapper: Option<Sexp>,
}

/// Parses a source string into one synthetic top-level list
///
/// The returned Sexp is a cons chain whose cars are the top-level
/// forms in source order; nil if the source contains no forms.
pub fn parse(heap: &mut Heap, tbl: &mut SymbolTable, code: &str) -> Result<Sexp, ParseError> {
    let src = code.as_bytes();

    let mut root = Sexp::nil();
    // Slot where the next chain link shall be placed
    let mut curr: *mut Sexp = &mut root;
    // Stack of open lists, pushed at `(` and popped at `)`
    let mut path: Vec<ParserFrame> = Vec::new();

    let mut next_sexp_wrapper: Option<Sexp> = None;

    let mut cursor = 0;

    // Chains a produced form onto the list under construction
    macro_rules! emit {
        ($value:expr) => {{
            let mut val: Sexp = $value;
            if let Some(wrapper) = next_sexp_wrapper.take() {
                val = list_2_init(heap, wrapper, val);
            }
            let link = cons_init(heap, val, Sexp::nil());
            let cell = link.as_obj::<ConsCell>();
            unsafe {
                *curr = link;
                curr = &mut (*cell).cdr;
            }
        }};
    }

    while cursor < src.len() {
        let c = src[cursor];

        if c.is_ascii_whitespace() {
            cursor += 1;
            continue;
        }

        // Eat comments
        if c == b';' {
            while cursor < src.len() && src[cursor] != b'\n' {
                cursor += 1;
            }
            continue;
        }

        if c == b'\'' || c == b'`' || c == b',' {
            let name = match c {
                b'\'' => "quote",
                b'`' => "quasiquote",
                _ => "unquote",
            };
            next_sexp_wrapper = Some(Sexp::symbol(tbl.get_id(name)));
            cursor += 1;
            continue;
        }

        if c == b'(' {
            let link = cons_init(heap, Sexp::nil(), Sexp::nil());
            let cell = link.as_obj::<ConsCell>();
            unsafe {
                *curr = link;
                path.push(ParserFrame {
                    ret: &mut (*cell).cdr,
                    cell,
                    wrapper: next_sexp_wrapper.take(),
                });
                curr = &mut (*cell).car;
            }

            cursor += 1;
            continue;
        }

        if c == b')' {
            if next_sexp_wrapper.is_some() {
                return Err(ParseError::DanglingQuote);
            }

            let frame = match path.pop() {
                Some(f) => f,
                None => return Err(ParseError::UnbalancedParen),
            };

            unsafe {
                if let Some(wrapper) = frame.wrapper {
                    (*frame.cell).car = list_2_init(heap, wrapper, (*frame.cell).car);
                }
            }
            curr = frame.ret;

            cursor += 1;
            continue;
        }

        if c == b'"' {
            cursor += 1;

            let mut buf: Vec<u8> = Vec::new();
            loop {
                if cursor >= src.len() {
                    return Err(ParseError::UnexpectedEof("string"));
                }

                match src[cursor] {
                    b'"' => break,
                    b'\\' => {
                        if cursor + 1 >= src.len() {
                            return Err(ParseError::UnexpectedEof("string escape"));
                        }
                        match src[cursor + 1] {
                            b'n' => buf.push(b'\n'),
                            b'\\' => buf.push(b'\\'),
                            esc => return Err(ParseError::InvalidEscape(esc as char)),
                        }
                        cursor += 2;
                    }
                    byte => {
                        buf.push(byte);
                        cursor += 1;
                    }
                }
            }
            cursor += 1;

            let text = std::str::from_utf8(&buf).unwrap();
            emit!(string_init(heap, text));

            continue;
        }

        if c == b'#' {
            if cursor + 1 >= src.len() {
                return Err(ParseError::UnexpectedEof("#-token"));
            }

            let next_c = src[cursor + 1];
            cursor += 2;

            match next_c {
                b't' => emit!(Sexp::boolean(true)),
                b'f' => emit!(Sexp::boolean(false)),
                // TODO: #: keyword arguments
                other => return Err(ParseError::UnknownSpecial(other as char)),
            }

            continue;
        }

        // Anything else begins a number or symbol token
        {
            let start = cursor;
            while cursor < src.len() && !is_delimiter(src[cursor]) {
                cursor += 1;
            }
            let token = &code[start..cursor];

            if numeric_lead(token.as_bytes()) {
                if let Ok(v) = token.parse::<f64>() {
                    if !v.is_finite() {
                        return Err(ParseError::NumberOutOfRange);
                    }
                    emit!(Sexp::number(v));
                    continue;
                }
            }

            emit!(Sexp::symbol(tbl.get_id(token)));
        }
    }

    if !path.is_empty() {
        return Err(ParseError::UnexpectedEof("list"));
    }
    if next_sexp_wrapper.is_some() {
        return Err(ParseError::DanglingQuote);
    }

    Ok(root)
}

/// A symbol token runs until whitespace or a parenthesis
#[inline(always)]
fn is_delimiter(c: u8) -> bool {
    c.is_ascii_whitespace() || c == b'(' || c == b')'
}

/// Whether a token looks like the start of a number literal
fn numeric_lead(tok: &[u8]) -> bool {
    match tok {
        [c, ..] if c.is_ascii_digit() => true,
        [b'+' | b'-' | b'.', c, ..] if c.is_ascii_digit() => true,
        _ => false,
    }
}

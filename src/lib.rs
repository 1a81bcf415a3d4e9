// Lilt, an interpreter for a small Scheme-like Lisp dialect.
// Copyright (C) 2026 the Lilt contributors

// Lilt is licensed under the terms of the MIT License. See the top
// level LICENSE file for the license text.

// <>

// src/lib.rs

// Top level lib: declares the interpreter modules, renders values
// back to text, and offers one-call entry points for running source
// strings and files.

// <>

//! Lilt, a small Scheme-like Lisp dialect
//!
//! Values are single tagged words over a bump-allocated object heap;
//! the reader, evaluator, and printer all work directly on that
//! representation. Feed source text to [`interpret`], or drive the
//! pieces separately through [`Environment`].

use std::fmt;

pub mod core;
pub mod eval;
pub mod memmgt;
pub mod parser;
pub mod stdenv;
pub mod symtab;

use crate::core::{ConsCell, ObjectType, Sexp, Tag, SYM_NONE};
use crate::symtab::SymbolTable;

pub use crate::eval::{Environment, EvalError};
pub use crate::parser::ParseError;

use thiserror::Error;

/// Any failure the core can surface to a caller
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Bundles together a value and the symbol table for display
pub struct ContextVal<'a> {
    tbl: &'a SymbolTable,
    val: Sexp,
}

pub fn context(tbl: &SymbolTable, val: Sexp) -> ContextVal<'_> {
    ContextVal { tbl, val }
}

impl fmt::Display for ContextVal<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = self.tbl;
        let value = self.val;

        if value.is_nil() {
            return write!(f, "'()");
        }

        match value.tag() {
            Tag::Nil => write!(f, "'()"),
            Tag::Int => write!(f, "{}", value.as_int()),
            Tag::Float => write!(f, "{}", value.as_float()),
            Tag::Bool => write!(f, "{}", if value.as_bool() { "#t" } else { "#f" }),
            Tag::Symbol => match table.lookup_by_id(value.as_symbol()) {
                Some(name) => write!(f, "{}", name),
                None => write!(f, "#<sym:{}>", value.as_symbol()),
            },
            Tag::Ptr => match value.obj_type() {
                Some(ObjectType::ConsCell) => {
                    write!(f, "(")?;
                    let mut elt = value;
                    loop {
                        let cell = elt.as_obj::<ConsCell>();
                        let (car, cdr) = unsafe { ((*cell).car, (*cell).cdr) };

                        write!(f, "{}", context(table, car))?;

                        if cdr.is_nil() {
                            break;
                        }
                        if cdr.as_obj::<ConsCell>().is_null() {
                            write!(f, " . {}", context(table, cdr))?;
                            break;
                        }
                        write!(f, " ")?;
                        elt = cdr;
                    }
                    write!(f, ")")
                }
                Some(ObjectType::Str) => {
                    write!(f, "\"{}\"", core::string_get(value.raw_ptr()))
                }
                Some(ObjectType::UserProc) => {
                    let proc_ = value.as_obj::<core::UserProc>();
                    let name = unsafe { (*proc_).name };
                    if name == SYM_NONE {
                        write!(f, "#PROC:<unnamed>")
                    } else {
                        write!(
                            f,
                            "#PROC:{}",
                            table.lookup_by_id(name).unwrap_or("<unknown>")
                        )
                    }
                }
                Some(ObjectType::BuiltinProc) => {
                    let proc_ = value.as_obj::<core::BuiltinProc>();
                    let name = unsafe { (*proc_).name };
                    write!(
                        f,
                        "#BUILTIN:{}",
                        table.lookup_by_id(name).unwrap_or("<unknown>")
                    )
                }
                Some(other) => write!(f, "#<{:?}>", other),
                None => write!(f, "'()"),
            },
        }
    }
}

/// Interprets a source string in a fresh environment, returning the
/// printed value of the last top-level form
pub fn interpret(code: &str) -> Result<String, Error> {
    let mut env = Environment::new();

    let forms = env.parse_source(code)?;

    let mut result = Sexp::nil();
    for form in core::list_iter(forms) {
        result = eval::eval(&mut env, form)?;
    }

    Ok(context(&env.symtab, result).to_string())
}

/// Reads and interprets a file, returning the last printed value
pub fn run_file(filename: &str) -> Result<String, Error> {
    let code = std::fs::read_to_string(filename)?;
    interpret(&code)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Parse-then-print of every top-level form, space separated
    fn roundtrip(code: &str) -> String {
        let mut env = Environment::new();
        let forms = env.parse_source(code).unwrap();
        core::list_iter(forms)
            .map(|form| context(&env.symtab, form).to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn returns() {
        assert_eq!("42", interpret("42").unwrap());
    }

    #[test]
    fn adds() {
        assert_eq!("4", interpret("(+ 2 2)").unwrap());
    }

    #[test]
    fn parses() {
        for exp in [
            "42",
            "-7",
            "3.25",
            "\"hello\"",
            "#t",
            "#f",
            "foo",
            "(a b c)",
            "(+ (* 2 2) (- 9 2))",
            "((1 2 3 4) 5)",
            "(a (b (c (d))))",
        ] {
            assert_eq!(exp, roundtrip(exp));
        }

        // comments disappear between forms
        assert_eq!("((1 2 3 4) 5)", roundtrip("((1 2 3 4) ;Comment\n5)"));

        // reader macros print in rewritten form
        assert_eq!("(quote x)", roundtrip("'x"));
        assert_eq!("(quasiquote x)", roundtrip("`x"));
        assert_eq!("(unquote x)", roundtrip(",x"));
    }

    #[test]
    fn prints_special_values() {
        assert_eq!("'()", interpret("'()").unwrap());
        assert_eq!("(1 . 2)", interpret("(cons 1 2)").unwrap());
        assert_eq!("#PROC:sq", interpret("(define (sq x) (* x x)) sq").unwrap());
        assert_eq!("#PROC:<unnamed>", interpret("(lambda (x) x)").unwrap());
        assert_eq!("#BUILTIN:+", interpret("+").unwrap());

        // strings print unescaped
        assert_eq!("\"a\nb\"", interpret("\"a\\nb\"").unwrap());
    }

    #[test]
    fn scenario_arithmetic() {
        assert_eq!("6", interpret("(+ 1 2 3)").unwrap());
    }

    #[test]
    fn scenario_square() {
        assert_eq!("49", interpret("(define (sq x) (* x x)) (sq 7)").unwrap());
    }

    #[test]
    fn scenario_let() {
        assert_eq!("3", interpret("(let ((a 1) (b 2)) (+ a b))").unwrap());
    }

    #[test]
    fn scenario_let_star() {
        assert_eq!("2", interpret("(let* ((a 1) (b (+ a 1))) b)").unwrap());
    }

    #[test]
    fn scenario_mutation() {
        assert_eq!("42", interpret("(define x 1) (set! x 42) x").unwrap());
    }

    #[test]
    fn scenario_conditional() {
        assert_eq!("\"yes\"", interpret("(if (= 1 1) \"yes\" \"no\")").unwrap());
    }

    #[test]
    fn scenario_named_let_factorial() {
        assert_eq!(
            "120",
            interpret("(let fact ((n 5) (acc 1)) (if (= n 0) acc (fact (- n 1) (* acc n))))")
                .unwrap()
        );
    }

    #[test]
    fn scenario_quoted_list() {
        assert_eq!("(1 2 3)", interpret("'(1 2 3)").unwrap());
    }

    #[test]
    fn scenario_closures() {
        let code = "
            (define (make-adder n) (lambda (x) (+ x n)))
            (define add3 (make-adder 3))
            (define n 100)
            (add3 10)";
        assert_eq!("13", interpret(code).unwrap());
    }

    #[test]
    fn error_categories() {
        assert!(matches!(interpret("(oops"), Err(Error::Parse(_))));
        assert!(matches!(interpret("(car 1)"), Err(Error::Eval(_))));
        assert!(matches!(run_file("no/such/file.lisp"), Err(Error::Io(_))));
    }
}

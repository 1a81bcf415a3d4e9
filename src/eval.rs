// Lilt, an interpreter for a small Scheme-like Lisp dialect.
// Copyright (C) 2026 the Lilt contributors

// Lilt is licensed under the terms of the MIT License. See the top
// level LICENSE file for the license text.

// <>

// src/eval.rs

// The evaluator. Owns the environment, a chain of scope frames rooted
// at the global scope, and implements the evaluation rules over the
// Sexp representation: self-evaluating atoms, symbol lookup, and the
// procedure-call form dispatching to user or built-in procedures.

// <>

use crate::core::{
    scope_create, scope_ins, scope_lookup, scope_mut, user_proc_arg, BuiltinProc, ConsCell, Scope,
    Sexp, Tag, UserProc, SYM_NONE,
};
use crate::memmgt::Heap;
use crate::parser::{self, ParseError};
use crate::stdenv;
use crate::symtab::SymbolTable;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EvalError {
    #[error("too few elements in list")]
    TooFewElements,

    #[error("too many elements in list")]
    TooManyElements,

    #[error("{0} cannot accept non-numerical parameters")]
    NonNumeric(&'static str),

    #[error("operator must be a symbol")]
    InvalidCallForm,

    #[error("'{0}' is not bound to a procedure")]
    NotAProcedure(String),

    #[error("too few arguments to '{0}'")]
    TooFewArguments(String),

    #[error("{0} expects a pair")]
    NotAPair(&'static str),

    #[error("define requires a symbol or a procedure declaration")]
    InvalidDefine,

    #[error("set! target must be a symbol")]
    InvalidMutation,

    #[error("procedure name must be a symbol")]
    InvalidProcName,

    #[error("procedure parameter must be a symbol")]
    InvalidParam,

    #[error("procedure body must have at least one form")]
    EmptyBody,

    #[error("malformed binding pair")]
    InvalidBinding,
}

/// The interpreter state: heap, symbol pool, and the scope chain
///
/// All heap objects and symbol references produced while evaluating
/// live exactly as long as this structure. Not thread-safe; distinct
/// environments are fully independent.
pub struct Environment {
    pub heap: Heap,
    pub symtab: SymbolTable,
    global_scope: *mut Scope,
    pub(crate) curr_scope: *mut Scope,
}

impl Environment {
    /// Creates the global scope and installs every built-in procedure
    /// value into it
    pub fn new() -> Self {
        let mut heap = Heap::new();
        let symtab = SymbolTable::new(256);

        let global_scope = scope_create(&mut heap, std::ptr::null_mut());

        let mut env = Environment {
            heap,
            symtab,
            global_scope,
            curr_scope: global_scope,
        };

        for (name, func) in stdenv::BUILTINS {
            let id = env.symtab.get_id(name);
            let proc_ = crate::core::builtin_proc_init(&mut env.heap, id, *func);
            scope_ins(&mut env.heap, global_scope, id, proc_);
        }

        log::debug!("environment ready, {} built-ins installed", stdenv::BUILTINS.len());

        env
    }

    /// Reads a source string into a top-level form list
    pub fn parse_source(&mut self, code: &str) -> Result<Sexp, ParseError> {
        parser::parse(&mut self.heap, &mut self.symtab, code)
    }

    /// The scope at the root of every chain
    pub fn global_scope(&self) -> *mut Scope {
        self.global_scope
    }

    /// First binding of the symbol along the scope chain
    pub fn lookup_binding(&self, sym: u32) -> Option<Sexp> {
        scope_lookup(self.curr_scope, sym)
    }

    /// Mutates the first existing binding; no-op when unbound
    pub fn set_binding(&mut self, sym: u32, val: Sexp) -> bool {
        scope_mut(self.curr_scope, sym, val)
    }

    /// Installs a binding in the current scope
    pub fn define(&mut self, sym: u32, val: Sexp) {
        scope_ins(&mut self.heap, self.curr_scope, sym, val);
    }

    /// Drops back to the global scope
    ///
    /// For callers that abandon a form partway through, where the
    /// normal exit paths never ran.
    pub fn reset_scope(&mut self) {
        self.curr_scope = self.global_scope;
    }

    pub(crate) fn sym_name(&self, sym: u32) -> String {
        self.symtab
            .lookup_by_id(sym)
            .unwrap_or("<unknown>")
            .to_owned()
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

/// The truthiness rule: only an explicit true boolean is true
#[inline(always)]
pub fn truthy(val: Sexp) -> bool {
    val.is_bool() && val.as_bool()
}

/// Evaluates one form in the given environment
///
/// Atoms other than symbols evaluate to themselves; a symbol becomes
/// its first binding along the scope chain, or nil when unbound; a
/// cons is a procedure call whose head must be a symbol bound to a
/// procedure value.
pub fn eval(env: &mut Environment, expr: Sexp) -> Result<Sexp, EvalError> {
    match expr.tag() {
        Tag::Symbol => Ok(env.lookup_binding(expr.as_symbol()).unwrap_or_default()),

        Tag::Ptr => {
            let cell = expr.as_obj::<ConsCell>();
            if cell.is_null() {
                // strings, procedure values, and the null pointer
                return Ok(expr);
            }

            let (head, args) = unsafe { ((*cell).car, (*cell).cdr) };

            if !head.is_symbol() {
                return Err(EvalError::InvalidCallForm);
            }
            let id = head.as_symbol();

            let binding = match env.lookup_binding(id) {
                Some(b) => b,
                None => return Err(EvalError::NotAProcedure(env.sym_name(id))),
            };

            let user = binding.as_obj::<UserProc>();
            if !user.is_null() {
                return apply_user_proc(env, user, args);
            }

            let native = binding.as_obj::<BuiltinProc>();
            if !native.is_null() {
                let func = unsafe { (*native).func };
                return func(args, env);
            }

            Err(EvalError::NotAProcedure(env.sym_name(id)))
        }

        _ => Ok(expr),
    }
}

/// Calls a user procedure on an unevaluated argument list
///
/// A fresh scope is chained onto the procedure's closure frame, not
/// the caller's scope; the arguments themselves are evaluated in the
/// caller's scope. Missing arguments are an error, surplus arguments
/// are dropped. The current scope is restored on every exit path.
pub(crate) fn apply_user_proc(
    env: &mut Environment,
    proc_: *mut UserProc,
    args: Sexp,
) -> Result<Sexp, EvalError> {
    let call_scope = scope_create(&mut env.heap, unsafe { (*proc_).closure });

    let argct = unsafe { (*proc_).argct };
    let mut arglist = args;
    for i in 0..argct {
        let cell = arglist.as_obj::<ConsCell>();
        if cell.is_null() {
            return Err(EvalError::TooFewArguments(proc_display_name(env, proc_)));
        }
        let value = eval(env, unsafe { (*cell).car })?;
        scope_ins(&mut env.heap, call_scope, user_proc_arg(proc_, i), value);
        arglist = unsafe { (*cell).cdr };
    }

    let saved = env.curr_scope;
    env.curr_scope = call_scope;
    let result = eval_body(env, unsafe { (*proc_).body });
    env.curr_scope = saved;

    result
}

/// Evaluates a sequence of forms, returning the value of the last
pub(crate) fn eval_body(env: &mut Environment, body: Sexp) -> Result<Sexp, EvalError> {
    let mut result = Sexp::nil();
    let mut curr = body;

    loop {
        let cell = curr.as_obj::<ConsCell>();
        if cell.is_null() {
            return Ok(result);
        }
        unsafe {
            result = eval(env, (*cell).car)?;
            curr = (*cell).cdr;
        }
    }
}

fn proc_display_name(env: &Environment, proc_: *const UserProc) -> String {
    let name = unsafe { (*proc_).name };
    if name == SYM_NONE {
        String::from("<unnamed>")
    } else {
        env.sym_name(name)
    }
}

/// Extracts the first N elements of a list; the remaining tail is
/// returned alongside them
pub fn list_get_prefix<const N: usize>(list: Sexp) -> Result<([Sexp; N], Sexp), EvalError> {
    let mut out = [Sexp::nil(); N];
    let mut curr = list;

    for slot in out.iter_mut() {
        let cell = curr.as_obj::<ConsCell>();
        if cell.is_null() {
            return Err(EvalError::TooFewElements);
        }
        unsafe {
            *slot = (*cell).car;
            curr = (*cell).cdr;
        }
    }

    Ok((out, curr))
}

/// Extracts exactly N elements; anything after them is an error
pub fn list_get_everything<const N: usize>(list: Sexp) -> Result<[Sexp; N], EvalError> {
    let (out, rest) = list_get_prefix::<N>(list)?;
    if !rest.is_nil() {
        return Err(EvalError::TooManyElements);
    }
    Ok(out)
}

// Lilt, an interpreter for a small Scheme-like Lisp dialect.
// Copyright (C) 2026 the Lilt contributors

// Lilt is licensed under the terms of the MIT License. See the top
// level LICENSE file for the license text.

// <>

// src/stdenv.rs

// The built-in procedures of the standard Lilt environment, installed
// into the global scope on environment creation. Every entry receives
// its argument list unevaluated; strict procedures evaluate each
// argument themselves, which is all that separates them from the
// special forms sharing this table.

// <>

use crate::core::{
    cons_init, list_iter, scope_create, scope_ins, user_proc_init, ConsCell, NativeFn, Sexp,
    SYM_NONE,
};
use crate::eval::{
    eval, eval_body, list_get_everything, list_get_prefix, truthy, Environment, EvalError,
};

/// Name and implementation of every built-in procedure
pub const BUILTINS: &[(&str, NativeFn)] = &[
    ("+", builtin_add),
    ("-", builtin_sub),
    ("*", builtin_mul),
    ("/", builtin_div),
    ("mod", builtin_mod),
    ("sqrt", builtin_sqrt),
    ("=", builtin_eq),
    ("<", builtin_lt),
    ("<=", builtin_le),
    (">", builtin_gt),
    (">=", builtin_ge),
    ("not", builtin_not),
    ("car", builtin_car),
    ("cdr", builtin_cdr),
    ("cons", builtin_cons),
    ("null?", builtin_is_null),
    ("print", builtin_print),
    ("quote", builtin_quote),
    ("if", builtin_if),
    ("define", builtin_define),
    ("set!", builtin_set),
    ("lambda", builtin_lambda),
    ("let", builtin_let),
    ("let*", builtin_letstar),
    ("progn", builtin_progn),
];

fn eval_to_number(
    env: &mut Environment,
    form: Sexp,
    name: &'static str,
) -> Result<f64, EvalError> {
    eval(env, form)?
        .as_f64()
        .ok_or(EvalError::NonNumeric(name))
}

fn builtin_add(params: Sexp, env: &mut Environment) -> Result<Sexp, EvalError> {
    let mut res = 0.0;
    for param in list_iter(params) {
        res += eval_to_number(env, param, "+")?;
    }
    Ok(Sexp::number(res))
}

fn builtin_sub(params: Sexp, env: &mut Environment) -> Result<Sexp, EvalError> {
    let mut res = 0.0;
    let mut param_cnt = 0;
    for param in list_iter(params) {
        let v = eval_to_number(env, param, "-")?;
        if param_cnt == 0 {
            res = v;
        } else {
            res -= v;
        }
        param_cnt += 1;
    }

    match param_cnt {
        0 => Err(EvalError::TooFewElements),
        // Unary minus
        1 => Ok(Sexp::number(-res)),
        _ => Ok(Sexp::number(res)),
    }
}

fn builtin_mul(params: Sexp, env: &mut Environment) -> Result<Sexp, EvalError> {
    let mut res = 1.0;
    for param in list_iter(params) {
        res *= eval_to_number(env, param, "*")?;
    }
    Ok(Sexp::number(res))
}

fn builtin_div(params: Sexp, env: &mut Environment) -> Result<Sexp, EvalError> {
    let mut res = 0.0;
    let mut param_cnt = 0;
    for param in list_iter(params) {
        let v = eval_to_number(env, param, "/")?;
        if param_cnt == 0 {
            res = v;
        } else {
            res /= v;
        }
        param_cnt += 1;
    }

    match param_cnt {
        0 => Err(EvalError::TooFewElements),
        // Unary division is the reciprocal
        1 => Ok(Sexp::number(1.0 / res)),
        _ => Ok(Sexp::number(res)),
    }
}

fn builtin_mod(params: Sexp, env: &mut Environment) -> Result<Sexp, EvalError> {
    let [a, b] = list_get_everything::<2>(params)?;
    let a = eval_to_number(env, a, "mod")?;
    let b = eval_to_number(env, b, "mod")?;
    Ok(Sexp::number(a % b))
}

fn builtin_sqrt(params: Sexp, env: &mut Environment) -> Result<Sexp, EvalError> {
    let [p] = list_get_everything::<1>(params)?;
    let v = eval_to_number(env, p, "sqrt")?;
    Ok(Sexp::number(v.sqrt()))
}

fn builtin_eq(params: Sexp, env: &mut Environment) -> Result<Sexp, EvalError> {
    let mut first: Option<Sexp> = None;
    let mut all_equal = true;

    for param in list_iter(params) {
        let v = eval(env, param)?;
        match first {
            None => first = Some(v),
            Some(f) => all_equal = all_equal && f == v,
        }
    }

    if first.is_none() {
        return Err(EvalError::TooFewElements);
    }
    Ok(Sexp::boolean(all_equal))
}

/// Left-to-right pairwise comparison over numeric arguments
fn fold_compare(
    params: Sexp,
    env: &mut Environment,
    name: &'static str,
    op: fn(f64, f64) -> bool,
) -> Result<Sexp, EvalError> {
    let mut prev: Option<f64> = None;
    let mut ordered = true;

    for param in list_iter(params) {
        let v = eval_to_number(env, param, name)?;
        if let Some(p) = prev {
            ordered = ordered && op(p, v);
        }
        prev = Some(v);
    }

    if prev.is_none() {
        return Err(EvalError::TooFewElements);
    }
    Ok(Sexp::boolean(ordered))
}

fn builtin_lt(params: Sexp, env: &mut Environment) -> Result<Sexp, EvalError> {
    fold_compare(params, env, "<", |a, b| a < b)
}

fn builtin_le(params: Sexp, env: &mut Environment) -> Result<Sexp, EvalError> {
    fold_compare(params, env, "<=", |a, b| a <= b)
}

fn builtin_gt(params: Sexp, env: &mut Environment) -> Result<Sexp, EvalError> {
    fold_compare(params, env, ">", |a, b| a > b)
}

fn builtin_ge(params: Sexp, env: &mut Environment) -> Result<Sexp, EvalError> {
    fold_compare(params, env, ">=", |a, b| a >= b)
}

fn builtin_not(params: Sexp, env: &mut Environment) -> Result<Sexp, EvalError> {
    let [p] = list_get_everything::<1>(params)?;
    let v = eval(env, p)?;
    Ok(Sexp::boolean(!truthy(v)))
}

fn builtin_car(params: Sexp, env: &mut Environment) -> Result<Sexp, EvalError> {
    let [p] = list_get_everything::<1>(params)?;
    let v = eval(env, p)?;
    let cell = v.as_obj::<ConsCell>();
    if cell.is_null() {
        return Err(EvalError::NotAPair("car"));
    }
    Ok(unsafe { (*cell).car })
}

fn builtin_cdr(params: Sexp, env: &mut Environment) -> Result<Sexp, EvalError> {
    let [p] = list_get_everything::<1>(params)?;
    let v = eval(env, p)?;
    let cell = v.as_obj::<ConsCell>();
    if cell.is_null() {
        return Err(EvalError::NotAPair("cdr"));
    }
    Ok(unsafe { (*cell).cdr })
}

fn builtin_cons(params: Sexp, env: &mut Environment) -> Result<Sexp, EvalError> {
    let [a, b] = list_get_everything::<2>(params)?;
    let car = eval(env, a)?;
    let cdr = eval(env, b)?;
    Ok(cons_init(&mut env.heap, car, cdr))
}

fn builtin_is_null(params: Sexp, env: &mut Environment) -> Result<Sexp, EvalError> {
    let [p] = list_get_everything::<1>(params)?;
    let v = eval(env, p)?;
    Ok(Sexp::boolean(v.is_nil()))
}

fn builtin_print(params: Sexp, env: &mut Environment) -> Result<Sexp, EvalError> {
    let [p] = list_get_everything::<1>(params)?;
    let v = eval(env, p)?;
    println!("{}", crate::context(&env.symtab, v));
    Ok(v)
}

fn builtin_quote(params: Sexp, _env: &mut Environment) -> Result<Sexp, EvalError> {
    let [v] = list_get_everything::<1>(params)?;
    Ok(v)
}

fn builtin_if(params: Sexp, env: &mut Environment) -> Result<Sexp, EvalError> {
    let [cond, true_case, false_case] = list_get_everything::<3>(params)?;

    let cond_val = eval(env, cond)?;
    if truthy(cond_val) {
        eval(env, true_case)
    } else {
        eval(env, false_case)
    }
}

fn builtin_define(params: Sexp, env: &mut Environment) -> Result<Sexp, EvalError> {
    let ([decl], body) = list_get_prefix::<1>(params)?;

    // Defining a value
    if decl.is_symbol() {
        let [expr] = list_get_everything::<1>(body)?;
        let val = eval(env, expr)?;
        env.define(decl.as_symbol(), val);
        return Ok(Sexp::nil());
    }

    // Defining a procedure
    if decl.as_obj::<ConsCell>().is_null() {
        return Err(EvalError::InvalidDefine);
    }

    let ([name], decl_params) = list_get_prefix::<1>(decl)?;
    if !name.is_symbol() {
        return Err(EvalError::InvalidProcName);
    }

    let param_ids = collect_params(decl_params)?;

    if body.as_obj::<ConsCell>().is_null() {
        return Err(EvalError::EmptyBody);
    }

    let proc_ = user_proc_init(
        &mut env.heap,
        name.as_symbol(),
        env.curr_scope,
        &param_ids,
        body,
    );
    env.define(name.as_symbol(), proc_);

    Ok(Sexp::nil())
}

fn builtin_set(params: Sexp, env: &mut Environment) -> Result<Sexp, EvalError> {
    let [target, expr] = list_get_everything::<2>(params)?;
    if !target.is_symbol() {
        return Err(EvalError::InvalidMutation);
    }

    let val = eval(env, expr)?;
    env.set_binding(target.as_symbol(), val);

    Ok(Sexp::nil())
}

fn builtin_lambda(params: Sexp, env: &mut Environment) -> Result<Sexp, EvalError> {
    let ([decl_params], body) = list_get_prefix::<1>(params)?;

    if !decl_params.is_nil() && decl_params.as_obj::<ConsCell>().is_null() {
        return Err(EvalError::InvalidParam);
    }
    let param_ids = collect_params(decl_params)?;

    if body.as_obj::<ConsCell>().is_null() {
        return Err(EvalError::EmptyBody);
    }

    Ok(user_proc_init(
        &mut env.heap,
        SYM_NONE,
        env.curr_scope,
        &param_ids,
        body,
    ))
}

fn builtin_let(params: Sexp, env: &mut Environment) -> Result<Sexp, EvalError> {
    let ([first], rest) = list_get_prefix::<1>(params)?;

    // (let proc-id ((id val) ...) body ...) is the named form
    let (proc_name, bindings, body) = if first.is_symbol() {
        let ([b], body) = list_get_prefix::<1>(rest)?;
        (Some(first.as_symbol()), b, body)
    } else {
        (None, first, rest)
    };

    if !bindings.is_nil() && bindings.as_obj::<ConsCell>().is_null() {
        return Err(EvalError::InvalidBinding);
    }
    if body.as_obj::<ConsCell>().is_null() {
        return Err(EvalError::EmptyBody);
    }

    // All value expressions evaluate in the enclosing scope
    let mut bound: Vec<(u32, Sexp)> = Vec::new();
    for pair in list_iter(bindings) {
        let [id, expr] = list_get_everything::<2>(pair).map_err(|_| EvalError::InvalidBinding)?;
        if !id.is_symbol() {
            return Err(EvalError::InvalidBinding);
        }
        bound.push((id.as_symbol(), eval(env, expr)?));
    }

    let scope = scope_create(&mut env.heap, env.curr_scope);
    for (id, val) in &bound {
        scope_ins(&mut env.heap, scope, *id, *val);
    }

    if let Some(name) = proc_name {
        // The procedure closes over the binding scope, so it can
        // reach its own binding and recurse
        let param_ids: Vec<u32> = bound.iter().map(|(id, _)| *id).collect();
        let proc_ = user_proc_init(&mut env.heap, name, scope, &param_ids, body);
        scope_ins(&mut env.heap, scope, name, proc_);
    }

    let saved = env.curr_scope;
    env.curr_scope = scope;
    let result = eval_body(env, body);
    env.curr_scope = saved;

    result
}

fn builtin_letstar(params: Sexp, env: &mut Environment) -> Result<Sexp, EvalError> {
    let ([bindings], body) = list_get_prefix::<1>(params)?;

    if !bindings.is_nil() && bindings.as_obj::<ConsCell>().is_null() {
        return Err(EvalError::InvalidBinding);
    }
    if body.as_obj::<ConsCell>().is_null() {
        return Err(EvalError::EmptyBody);
    }

    // The scope is installed up front; each pair is evaluated with
    // all previous bindings visible, then inserted
    let scope = scope_create(&mut env.heap, env.curr_scope);
    let saved = env.curr_scope;
    env.curr_scope = scope;
    let result = letstar_run(env, bindings, body);
    env.curr_scope = saved;

    result
}

fn letstar_run(env: &mut Environment, bindings: Sexp, body: Sexp) -> Result<Sexp, EvalError> {
    for pair in list_iter(bindings) {
        let [id, expr] = list_get_everything::<2>(pair).map_err(|_| EvalError::InvalidBinding)?;
        if !id.is_symbol() {
            return Err(EvalError::InvalidBinding);
        }
        let val = eval(env, expr)?;
        env.define(id.as_symbol(), val);
    }

    eval_body(env, body)
}

fn builtin_progn(params: Sexp, env: &mut Environment) -> Result<Sexp, EvalError> {
    eval_body(env, params)
}

fn collect_params(list: Sexp) -> Result<Vec<u32>, EvalError> {
    let mut out = Vec::new();
    for param in list_iter(list) {
        if !param.is_symbol() {
            return Err(EvalError::InvalidParam);
        }
        out.push(param.as_symbol());
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(env: &mut Environment, code: &str) -> Result<Sexp, EvalError> {
        let forms = env.parse_source(code).unwrap();
        let mut out = Sexp::nil();
        for form in list_iter(forms) {
            out = eval(env, form)?;
        }
        Ok(out)
    }

    #[test]
    fn arithmetic() {
        let mut env = Environment::new();

        assert_eq!(run(&mut env, "(+)").unwrap(), Sexp::int(0));
        assert_eq!(run(&mut env, "(+ 1 2 3)").unwrap(), Sexp::int(6));
        assert_eq!(run(&mut env, "(*)").unwrap(), Sexp::int(1));
        assert_eq!(run(&mut env, "(* 2 3 4)").unwrap(), Sexp::int(24));
        assert_eq!(run(&mut env, "(- 10 3 2)").unwrap(), Sexp::int(5));
        assert_eq!(run(&mut env, "(- 4)").unwrap(), Sexp::int(-4));
        assert_eq!(run(&mut env, "(/ 12 3 2)").unwrap(), Sexp::int(2));
        assert_eq!(run(&mut env, "(mod 7 3)").unwrap(), Sexp::int(1));
        assert_eq!(run(&mut env, "(-)"), Err(EvalError::TooFewElements));
    }

    #[test]
    fn numeric_promotion() {
        let mut env = Environment::new();

        // mixed int/float promotes; an integral result narrows back
        assert_eq!(run(&mut env, "(+ 1 0.5)").unwrap(), Sexp::float(1.5));
        assert_eq!(run(&mut env, "(+ 0.5 0.5)").unwrap(), Sexp::int(1));
        assert_eq!(run(&mut env, "(/ 1 2)").unwrap(), Sexp::float(0.5));
        assert_eq!(run(&mut env, "(/ 2)").unwrap(), Sexp::float(0.5));
        assert_eq!(run(&mut env, "(sqrt 2.25)").unwrap(), Sexp::float(1.5));
        assert_eq!(run(&mut env, "(sqrt 4)").unwrap(), Sexp::int(2));
    }

    #[test]
    fn arithmetic_type_errors() {
        let mut env = Environment::new();

        assert_eq!(
            run(&mut env, "(+ 1 \"two\")"),
            Err(EvalError::NonNumeric("+"))
        );
        assert_eq!(
            run(&mut env, "(sqrt #t)"),
            Err(EvalError::NonNumeric("sqrt"))
        );
    }

    #[test]
    fn equality_is_word_equality() {
        let mut env = Environment::new();

        assert_eq!(run(&mut env, "(= 1 1)").unwrap(), Sexp::boolean(true));
        assert_eq!(run(&mut env, "(= 1 1 1)").unwrap(), Sexp::boolean(true));
        assert_eq!(run(&mut env, "(= 1 2)").unwrap(), Sexp::boolean(false));
        assert_eq!(run(&mut env, "(= 1)").unwrap(), Sexp::boolean(true));
        assert_eq!(run(&mut env, "(=)"), Err(EvalError::TooFewElements));

        // an int and a float are different words
        assert_eq!(run(&mut env, "(= 1 1.0)").unwrap(), Sexp::boolean(false));

        // reflexive over any value, including symbols and nil
        assert_eq!(run(&mut env, "(= 'a 'a)").unwrap(), Sexp::boolean(true));
        assert_eq!(run(&mut env, "(= '() '())").unwrap(), Sexp::boolean(true));

        // distinct but structurally equal pairs are unequal
        assert_eq!(
            run(&mut env, "(= (cons 1 2) (cons 1 2))").unwrap(),
            Sexp::boolean(false)
        );
        assert_eq!(
            run(&mut env, "(define p (cons 1 2)) (= p p)").unwrap(),
            Sexp::boolean(true)
        );
    }

    #[test]
    fn comparisons() {
        let mut env = Environment::new();

        assert_eq!(run(&mut env, "(< 1 2 3)").unwrap(), Sexp::boolean(true));
        assert_eq!(run(&mut env, "(< 1 3 2)").unwrap(), Sexp::boolean(false));
        assert_eq!(run(&mut env, "(<= 1 1 2)").unwrap(), Sexp::boolean(true));
        assert_eq!(run(&mut env, "(> 3 2 1)").unwrap(), Sexp::boolean(true));
        assert_eq!(run(&mut env, "(>= 2 2)").unwrap(), Sexp::boolean(true));
        assert_eq!(run(&mut env, "(< 1 2.5)").unwrap(), Sexp::boolean(true));

        assert_eq!(
            run(&mut env, "(< 1 \"x\")"),
            Err(EvalError::NonNumeric("<"))
        );
        assert_eq!(run(&mut env, "(< #t 1)"), Err(EvalError::NonNumeric("<")));
    }

    #[test]
    fn list_primitives() {
        let mut env = Environment::new();

        assert_eq!(run(&mut env, "(car (cons 1 2))").unwrap(), Sexp::int(1));
        assert_eq!(run(&mut env, "(cdr (cons 1 2))").unwrap(), Sexp::int(2));
        assert_eq!(
            run(&mut env, "(car (cdr '(1 2 3)))").unwrap(),
            Sexp::int(2)
        );

        assert_eq!(
            run(&mut env, "(null? '())").unwrap(),
            Sexp::boolean(true)
        );
        assert_eq!(
            run(&mut env, "(null? (cons 1 2))").unwrap(),
            Sexp::boolean(false)
        );
        assert_eq!(run(&mut env, "(null? 0)").unwrap(), Sexp::boolean(false));

        assert_eq!(run(&mut env, "(car 1)"), Err(EvalError::NotAPair("car")));
        assert_eq!(run(&mut env, "(cdr '())"), Err(EvalError::NotAPair("cdr")));
    }

    #[test]
    fn quote_returns_argument_unevaluated() {
        let mut env = Environment::new();

        let v = run(&mut env, "(quote x)").unwrap();
        assert_eq!(v, Sexp::symbol(env.symtab.get_id("x")));

        let v = run(&mut env, "'(+ 1 2)").unwrap();
        let elems: Vec<Sexp> = list_iter(v).collect();
        assert_eq!(elems.len(), 3);
        assert_eq!(elems[0], Sexp::symbol(env.symtab.get_id("+")));
    }

    #[test]
    fn not_follows_truthiness() {
        let mut env = Environment::new();

        assert_eq!(run(&mut env, "(not #f)").unwrap(), Sexp::boolean(true));
        assert_eq!(run(&mut env, "(not #t)").unwrap(), Sexp::boolean(false));
        assert_eq!(run(&mut env, "(not 0)").unwrap(), Sexp::boolean(true));
    }

    #[test]
    fn progn_sequences() {
        let mut env = Environment::new();

        assert!(run(&mut env, "(progn)").unwrap().is_nil());
        assert_eq!(
            run(&mut env, "(progn (define a 1) (define b 2) (+ a b))").unwrap(),
            Sexp::int(3)
        );
    }

    #[test]
    fn let_forms() {
        let mut env = Environment::new();

        assert_eq!(
            run(&mut env, "(let ((a 1) (b 2)) (+ a b))").unwrap(),
            Sexp::int(3)
        );
        assert_eq!(
            run(&mut env, "(let* ((a 1) (b (+ a 1))) b)").unwrap(),
            Sexp::int(2)
        );

        // plain let evaluates values in the enclosing scope
        assert_eq!(
            run(&mut env, "(define a 10) (let ((a 1) (b a)) b)").unwrap(),
            Sexp::int(10)
        );

        // bindings vanish when the scope is left
        assert_eq!(run(&mut env, "(let ((q 5)) q) q").unwrap(), Sexp::nil());

        assert_eq!(
            run(&mut env, "(let ((a)) a)"),
            Err(EvalError::InvalidBinding)
        );
        assert_eq!(run(&mut env, "(let ((a 1)))"), Err(EvalError::EmptyBody));
    }

    #[test]
    fn named_let_recurses() {
        let mut env = Environment::new();

        assert_eq!(
            run(
                &mut env,
                "(let fact ((n 5) (acc 1)) (if (= n 0) acc (fact (- n 1) (* acc n))))"
            )
            .unwrap(),
            Sexp::int(120)
        );
    }

    #[test]
    fn define_shapes() {
        let mut env = Environment::new();

        assert!(run(&mut env, "(define x 1)").unwrap().is_nil());
        assert_eq!(run(&mut env, "(define (sq x) (* x x)) (sq 7)").unwrap(), Sexp::int(49));

        assert_eq!(run(&mut env, "(define 1 2)"), Err(EvalError::InvalidDefine));
        assert_eq!(
            run(&mut env, "(define (1) 2)"),
            Err(EvalError::InvalidProcName)
        );
        assert_eq!(
            run(&mut env, "(define (f 1) 2)"),
            Err(EvalError::InvalidParam)
        );
        assert_eq!(run(&mut env, "(define (f x))"), Err(EvalError::EmptyBody));
        assert_eq!(
            run(&mut env, "(define x 1 2)"),
            Err(EvalError::TooManyElements)
        );
    }

    #[test]
    fn lambda_shapes() {
        let mut env = Environment::new();

        assert_eq!(
            run(&mut env, "(define inc (lambda (x) (+ x 1))) (inc 41)").unwrap(),
            Sexp::int(42)
        );
        assert_eq!(
            run(&mut env, "(define f (lambda () 7)) (f)").unwrap(),
            Sexp::int(7)
        );
        assert_eq!(run(&mut env, "(lambda (x))"), Err(EvalError::EmptyBody));
        assert_eq!(run(&mut env, "(lambda 3 x)"), Err(EvalError::InvalidParam));
    }

    #[test]
    fn print_passes_value_through() {
        let mut env = Environment::new();
        assert_eq!(run(&mut env, "(print (+ 1 2))").unwrap(), Sexp::int(3));
    }
}

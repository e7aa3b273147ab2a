use crate::error::{SkeemError, SkeemResult};
use crate::eval::Interpreter;
use crate::heap::Heap;
use crate::value::{ObjId, SymbolId, Value};

/// Every native procedure and special form.
///
/// Builtins receive their argument list unevaluated; each one decides what
/// to evaluate. That is what lets `if`, `define` and friends live here next
/// to `car` and `+`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    // Special forms
    Quote,
    If,
    Cond,
    And,
    Or,
    Define,
    Lambda,
    Set,
    While,
    Begin,
    // Procedures
    Not,
    Car,
    Cdr,
    Cons,
    List,
    Length,
    Print,
    Eval,
    CurrentEnvironment,
    Exit,
    GarbageCollect,
    IntegerP,
    FloatP,
    NumberP,
    StringP,
    SymbolP,
    ListP,
    NullP,
    ProcedureP,
    BooleanP,
    ClosureP,
    EqvP,
    EqualP,
    Add,
    Sub,
    Mul,
    Div,
    Greater,
    Less,
    NumEq,
}

/// How many arguments a builtin accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    AtLeast(usize),
    Range(usize, usize),
    Any,
}

impl Arity {
    pub fn accepts(self, n: usize) -> bool {
        match self {
            Arity::Exact(k) => n == k,
            Arity::AtLeast(k) => n >= k,
            Arity::Range(lo, hi) => (lo..=hi).contains(&n),
            Arity::Any => true,
        }
    }

    fn describe(self) -> String {
        match self {
            Arity::Exact(k) => k.to_string(),
            Arity::AtLeast(k) => format!("at least {}", k),
            Arity::Range(lo, hi) => format!("{} to {}", lo, hi),
            Arity::Any => "any".to_string(),
        }
    }
}

impl Builtin {
    pub const ALL: &'static [Builtin] = &[
        Builtin::Quote,
        Builtin::If,
        Builtin::Cond,
        Builtin::And,
        Builtin::Or,
        Builtin::Define,
        Builtin::Lambda,
        Builtin::Set,
        Builtin::While,
        Builtin::Begin,
        Builtin::Not,
        Builtin::Car,
        Builtin::Cdr,
        Builtin::Cons,
        Builtin::List,
        Builtin::Length,
        Builtin::Print,
        Builtin::Eval,
        Builtin::CurrentEnvironment,
        Builtin::Exit,
        Builtin::GarbageCollect,
        Builtin::IntegerP,
        Builtin::FloatP,
        Builtin::NumberP,
        Builtin::StringP,
        Builtin::SymbolP,
        Builtin::ListP,
        Builtin::NullP,
        Builtin::ProcedureP,
        Builtin::BooleanP,
        Builtin::ClosureP,
        Builtin::EqvP,
        Builtin::EqualP,
        Builtin::Add,
        Builtin::Sub,
        Builtin::Mul,
        Builtin::Div,
        Builtin::Greater,
        Builtin::Less,
        Builtin::NumEq,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Quote => "quote",
            Builtin::If => "if",
            Builtin::Cond => "cond",
            Builtin::And => "and",
            Builtin::Or => "or",
            Builtin::Define => "define",
            Builtin::Lambda => "lambda",
            Builtin::Set => "set!",
            Builtin::While => "while",
            Builtin::Begin => "begin",
            Builtin::Not => "not",
            Builtin::Car => "car",
            Builtin::Cdr => "cdr",
            Builtin::Cons => "cons",
            Builtin::List => "list",
            Builtin::Length => "length",
            Builtin::Print => "print",
            Builtin::Eval => "eval",
            Builtin::CurrentEnvironment => "current-environment",
            Builtin::Exit => "exit",
            Builtin::GarbageCollect => "garbage-collect",
            Builtin::IntegerP => "integer?",
            Builtin::FloatP => "float?",
            Builtin::NumberP => "number?",
            Builtin::StringP => "string?",
            Builtin::SymbolP => "symbol?",
            Builtin::ListP => "list?",
            Builtin::NullP => "null?",
            Builtin::ProcedureP => "procedure?",
            Builtin::BooleanP => "boolean?",
            Builtin::ClosureP => "closure?",
            Builtin::EqvP => "eqv?",
            Builtin::EqualP => "equal?",
            Builtin::Add => "+",
            Builtin::Sub => "-",
            Builtin::Mul => "*",
            Builtin::Div => "/",
            Builtin::Greater => ">",
            Builtin::Less => "<",
            Builtin::NumEq => "=",
        }
    }

    pub fn from_name(name: &str) -> Option<Builtin> {
        Builtin::ALL.iter().copied().find(|b| b.name() == name)
    }

    pub fn arity(self) -> Arity {
        match self {
            Builtin::Quote => Arity::Exact(1),
            Builtin::If => Arity::Range(2, 3),
            Builtin::Cond | Builtin::And | Builtin::Or | Builtin::Begin => Arity::Any,
            Builtin::Define | Builtin::Lambda => Arity::AtLeast(2),
            Builtin::Set => Arity::Exact(2),
            Builtin::While => Arity::AtLeast(1),
            Builtin::List => Arity::Any,
            Builtin::Cons | Builtin::EqvP | Builtin::EqualP => Arity::Exact(2),
            Builtin::Greater | Builtin::Less | Builtin::NumEq => Arity::Exact(2),
            Builtin::Eval => Arity::Range(1, 2),
            Builtin::CurrentEnvironment | Builtin::GarbageCollect => Arity::Exact(0),
            Builtin::Exit => Arity::Range(0, 1),
            Builtin::Add | Builtin::Sub | Builtin::Mul | Builtin::Div => Arity::Any,
            Builtin::Not
            | Builtin::Car
            | Builtin::Cdr
            | Builtin::Length
            | Builtin::Print
            | Builtin::IntegerP
            | Builtin::FloatP
            | Builtin::NumberP
            | Builtin::StringP
            | Builtin::SymbolP
            | Builtin::ListP
            | Builtin::NullP
            | Builtin::ProcedureP
            | Builtin::BooleanP
            | Builtin::ClosureP => Arity::Exact(1),
        }
    }

    /// Special forms control evaluation of their own arguments; everything
    /// else gets its arguments evaluated left to right first.
    pub fn is_special_form(self) -> bool {
        matches!(
            self,
            Builtin::Quote
                | Builtin::If
                | Builtin::Cond
                | Builtin::And
                | Builtin::Or
                | Builtin::Define
                | Builtin::Lambda
                | Builtin::Set
                | Builtin::While
                | Builtin::Begin
        )
    }
}

/// Dispatch a builtin call. `args` is the unevaluated argument list.
pub fn call(interp: &mut Interpreter, builtin: Builtin, args: Value, env: ObjId) -> SkeemResult<Value> {
    let name = builtin.name();
    let forms = interp.syntax_list(name, args)?;
    let arity = builtin.arity();
    if !arity.accepts(forms.len()) {
        return Err(SkeemError::WrongNumberOfArguments {
            procedure: name.to_string(),
            expected: arity.describe(),
            got: forms.len(),
        });
    }

    if builtin.is_special_form() {
        return special_form(interp, builtin, &forms, env);
    }

    let mark = interp.pin_mark();
    let result = interp
        .eval_each(&forms, env)
        .and_then(|argv| procedure(interp, builtin, &argv, env));
    interp.unpin_to(mark);
    result
}

// ============================================================================
// Special forms
// ============================================================================

fn special_form(
    interp: &mut Interpreter,
    builtin: Builtin,
    forms: &[Value],
    env: ObjId,
) -> SkeemResult<Value> {
    match builtin {
        Builtin::Quote => Ok(forms[0]),
        Builtin::If => {
            if interp.eval(forms[0], env)?.is_truthy() {
                interp.eval(forms[1], env)
            } else if let Some(&alternate) = forms.get(2) {
                interp.eval(alternate, env)
            } else {
                Ok(Value::FALSE)
            }
        }
        Builtin::Cond => eval_cond(interp, forms, env),
        Builtin::And => {
            let mut result = Value::TRUE;
            for &form in forms {
                result = interp.eval(form, env)?;
                if !result.is_truthy() {
                    break;
                }
            }
            Ok(result)
        }
        Builtin::Or => {
            let mut result = Value::FALSE;
            for &form in forms {
                result = interp.eval(form, env)?;
                if result.is_truthy() {
                    break;
                }
            }
            Ok(result)
        }
        Builtin::Define => eval_define(interp, forms, env),
        Builtin::Lambda => {
            let params = param_list(interp, "lambda", forms[0])?;
            Ok(interp.make_closure("lambda", params, forms[1..].to_vec(), env))
        }
        Builtin::Set => {
            let name = forms[0]
                .as_symbol()
                .ok_or_else(|| SkeemError::wrong_type("set!", "symbol", forms[0].type_name()))?;
            let val = interp.eval(forms[1], env)?;
            interp.assign(env, name, val)?;
            Ok(val)
        }
        Builtin::While => {
            // The last body value stays pinned while the test runs again.
            let mark = interp.pin_mark();
            let mut result = Value::FALSE;
            while interp.eval(forms[0], env)?.is_truthy() {
                result = interp.eval_sequence(&forms[1..], env, result)?;
                interp.unpin_to(mark);
                interp.pin(result);
            }
            interp.unpin_to(mark);
            Ok(result)
        }
        Builtin::Begin => interp.eval_sequence(forms, env, Value::Nil),
        _ => procedure(interp, builtin, forms, env),
    }
}

/// Clauses are tried in order; `else` always matches. A clause with no body
/// yields its test value.
fn eval_cond(interp: &mut Interpreter, clauses: &[Value], env: ObjId) -> SkeemResult<Value> {
    let else_sym = interp.intern("else");
    for &clause in clauses {
        let parts = interp
            .heap
            .list_to_vec(clause)
            .filter(|parts| !parts.is_empty())
            .ok_or_else(|| SkeemError::wrong_type("cond", "clause", clause.type_name()))?;

        let test = if parts[0] == Value::Symbol(else_sym) {
            Value::TRUE
        } else {
            interp.eval(parts[0], env)?
        };
        if test.is_truthy() {
            return interp.eval_sequence(&parts[1..], env, test);
        }
    }
    Err(SkeemError::NoMatchingCondClause)
}

/// `(define name expr)` or `(define (name params...) body...)`.
fn eval_define(interp: &mut Interpreter, forms: &[Value], env: ObjId) -> SkeemResult<Value> {
    match forms[0] {
        Value::Symbol(name) => {
            if forms.len() != 2 {
                return Err(SkeemError::WrongNumberOfArguments {
                    procedure: "define".to_string(),
                    expected: "2".to_string(),
                    got: forms.len(),
                });
            }
            let val = interp.eval(forms[1], env)?;
            interp.define(env, name, val);
            Ok(Value::Symbol(name))
        }
        Value::Pair(id) => {
            let head = interp.heap.car(id);
            let name = head
                .as_symbol()
                .ok_or_else(|| SkeemError::wrong_type("define", "symbol", head.type_name()))?;
            let params = param_list(interp, "define", interp.heap.cdr(id))?;
            let proc_name = interp.symbols.name(name).to_string();
            let closure = interp.make_closure(&proc_name, params, forms[1..].to_vec(), env);
            interp.define(env, name, closure);
            Ok(Value::Symbol(name))
        }
        other => Err(SkeemError::wrong_type("define", "symbol", other.type_name())),
    }
}

fn param_list(interp: &Interpreter, who: &str, params: Value) -> SkeemResult<Vec<SymbolId>> {
    interp
        .syntax_list(who, params)?
        .into_iter()
        .map(|p| {
            p.as_symbol()
                .ok_or_else(|| SkeemError::wrong_type(who, "symbol", p.type_name()))
        })
        .collect()
}

// ============================================================================
// Procedures (arguments already evaluated)
// ============================================================================

fn procedure(interp: &mut Interpreter, builtin: Builtin, argv: &[Value], env: ObjId) -> SkeemResult<Value> {
    let name = builtin.name();
    match builtin {
        Builtin::Not => Ok(Value::from_bool(!argv[0].is_truthy())),
        Builtin::Car => match argv[0] {
            Value::Pair(id) => Ok(interp.heap.car(id)),
            other => Err(SkeemError::wrong_type(name, "list", other.type_name())),
        },
        Builtin::Cdr => match argv[0] {
            Value::Pair(id) => Ok(interp.heap.cdr(id)),
            other => Err(SkeemError::wrong_type(name, "list", other.type_name())),
        },
        Builtin::Cons => Ok(interp.cons(argv[0], argv[1])),
        Builtin::List => Ok(interp.list(argv)),
        Builtin::Length => interp
            .heap
            .list_length(argv[0])
            .map(|n| Value::Integer(n as i64))
            .ok_or_else(|| SkeemError::wrong_type(name, "list", argv[0].type_name())),
        Builtin::Print => {
            let text = interp.print(argv[0]);
            // A closed output stream is not a language error.
            let _ = writeln!(interp.output(), "{}", text);
            Ok(argv[0])
        }
        Builtin::Eval => {
            let target = match argv.get(1) {
                None => env,
                Some(Value::Environment(frame)) => *frame,
                Some(other) => {
                    return Err(SkeemError::wrong_type(name, "environment", other.type_name()))
                }
            };
            interp.eval(argv[0], target)
        }
        Builtin::CurrentEnvironment => Ok(Value::Environment(env)),
        Builtin::Exit => match argv.first() {
            None => Err(SkeemError::Exit(0)),
            Some(Value::Integer(n)) => Err(i32::try_from(*n).map_or_else(
                |_| SkeemError::wrong_type(name, "exit status", "integer"),
                SkeemError::Exit,
            )),
            Some(other) => Err(SkeemError::wrong_type(name, "integer", other.type_name())),
        },
        Builtin::GarbageCollect => {
            interp.collect_garbage();
            Ok(Value::TRUE)
        }
        Builtin::IntegerP => Ok(Value::from_bool(matches!(argv[0], Value::Integer(_)))),
        Builtin::FloatP => Ok(Value::from_bool(matches!(argv[0], Value::Float(_)))),
        Builtin::NumberP => Ok(Value::from_bool(argv[0].is_number())),
        Builtin::StringP => Ok(Value::from_bool(matches!(argv[0], Value::String(_)))),
        Builtin::SymbolP => Ok(Value::from_bool(matches!(argv[0], Value::Symbol(_)))),
        Builtin::ListP => Ok(Value::from_bool(matches!(argv[0], Value::Pair(_) | Value::Nil))),
        Builtin::NullP => Ok(Value::from_bool(argv[0].is_nil())),
        Builtin::ProcedureP => Ok(Value::from_bool(argv[0].is_callable())),
        Builtin::BooleanP => Ok(Value::from_bool(matches!(argv[0], Value::Boolean(_)))),
        Builtin::ClosureP => Ok(Value::from_bool(matches!(argv[0], Value::Closure(_)))),
        Builtin::EqvP => Ok(Value::from_bool(eqv(&interp.heap, argv[0], argv[1]))),
        Builtin::EqualP => Ok(Value::from_bool(equal(&interp.heap, argv[0], argv[1]))),
        Builtin::Add | Builtin::Sub | Builtin::Mul | Builtin::Div => arithmetic(builtin, argv),
        Builtin::Greater | Builtin::Less | Builtin::NumEq => compare(builtin, argv[0], argv[1]),
        _ => special_form(interp, builtin, argv, env),
    }
}

// ============================================================================
// Arithmetic
// ============================================================================

#[derive(Clone, Copy)]
enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    fn from_value(who: &str, val: Value) -> SkeemResult<Number> {
        match val {
            Value::Integer(n) => Ok(Number::Int(n)),
            Value::Float(x) => Ok(Number::Float(x)),
            other => Err(SkeemError::wrong_type(who, "number", other.type_name())),
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            Number::Int(n) => n as f64,
            Number::Float(x) => x,
        }
    }

    fn is_zero(self) -> bool {
        match self {
            Number::Int(n) => n == 0,
            Number::Float(x) => x == 0.0,
        }
    }

    fn into_value(self) -> Value {
        match self {
            Number::Int(n) => Value::Integer(n),
            Number::Float(x) => Value::Float(x),
        }
    }
}

/// Combine two numbers. Integers stay integers (wrapping on overflow); any
/// float operand makes the result a float.
fn combine(op: Builtin, a: Number, b: Number) -> SkeemResult<Number> {
    if op == Builtin::Div && b.is_zero() {
        return Err(SkeemError::DivisionByZero);
    }
    Ok(match (a, b) {
        (Number::Int(x), Number::Int(y)) => Number::Int(match op {
            Builtin::Add => x.wrapping_add(y),
            Builtin::Sub => x.wrapping_sub(y),
            Builtin::Mul => x.wrapping_mul(y),
            _ => x.wrapping_div(y),
        }),
        _ => {
            let (x, y) = (a.as_f64(), b.as_f64());
            Number::Float(match op {
                Builtin::Add => x + y,
                Builtin::Sub => x - y,
                Builtin::Mul => x * y,
                _ => x / y,
            })
        }
    })
}

/// Left fold over the arguments. With no arguments `+`/`-` give 0 and
/// `*`/`/` give 1; a single argument to `-` or `/` is negated or inverted.
fn arithmetic(op: Builtin, argv: &[Value]) -> SkeemResult<Value> {
    let name = op.name();
    let numbers = argv
        .iter()
        .map(|&v| Number::from_value(name, v))
        .collect::<SkeemResult<Vec<_>>>()?;

    let identity = match op {
        Builtin::Add | Builtin::Sub => Number::Int(0),
        _ => Number::Int(1),
    };

    let (mut acc, rest) = match (op, numbers.split_first()) {
        (_, None) => return Ok(identity.into_value()),
        (Builtin::Sub | Builtin::Div, Some((first, []))) => (identity, std::slice::from_ref(first)),
        (Builtin::Sub | Builtin::Div, Some((first, rest))) => (*first, rest),
        (_, Some(_)) => (identity, numbers.as_slice()),
    };
    for &n in rest {
        acc = combine(op, acc, n)?;
    }
    Ok(acc.into_value())
}

fn compare(op: Builtin, a: Value, b: Value) -> SkeemResult<Value> {
    let name = op.name();
    let (x, y) = (Number::from_value(name, a)?, Number::from_value(name, b)?);
    let result = match (x, y) {
        (Number::Int(x), Number::Int(y)) => match op {
            Builtin::Greater => x > y,
            Builtin::Less => x < y,
            _ => x == y,
        },
        _ => {
            let (x, y) = (x.as_f64(), y.as_f64());
            match op {
                Builtin::Greater => x > y,
                Builtin::Less => x < y,
                _ => x == y,
            }
        }
    };
    Ok(Value::from_bool(result))
}

// ============================================================================
// Equality
// ============================================================================

/// `eqv?`: numbers, chars and booleans by value; symbols and strings by
/// content; pairs and callables by identity.
pub fn eqv(heap: &Heap, a: Value, b: Value) -> bool {
    match (a, b) {
        (Value::String(x), Value::String(y)) => x == y || heap.string(x) == heap.string(y),
        (Value::Nil, Value::Nil) => true,
        (Value::Integer(x), Value::Integer(y)) => x == y,
        (Value::Float(x), Value::Float(y)) => x == y,
        (Value::Char(x), Value::Char(y)) => x == y,
        (Value::Boolean(x), Value::Boolean(y)) => x == y,
        (Value::Symbol(x), Value::Symbol(y)) => x == y,
        (Value::Primitive(x), Value::Primitive(y)) => x == y,
        (Value::Pair(x), Value::Pair(y))
        | (Value::Closure(x), Value::Closure(y))
        | (Value::Environment(x), Value::Environment(y)) => x == y,
        _ => false,
    }
}

/// `equal?`: pairs element-wise (same length required), everything else as
/// `eqv?`. Walks list spines iteratively and recurses only into heads.
pub fn equal(heap: &Heap, a: Value, b: Value) -> bool {
    let (mut a, mut b) = (a, b);
    loop {
        match (a, b) {
            (Value::Pair(x), Value::Pair(y)) => {
                if x == y {
                    return true;
                }
                if !equal(heap, heap.car(x), heap.car(y)) {
                    return false;
                }
                a = heap.cdr(x);
                b = heap.cdr(y);
            }
            _ => return eqv(heap, a, b),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn run(src: &str) -> String {
        let mut interp = Interpreter::new();
        let val = interp.eval_str(src).unwrap();
        interp.print(val)
    }

    fn run_err(src: &str) -> SkeemError {
        Interpreter::new().eval_str(src).unwrap_err()
    }

    #[test]
    fn names_round_trip() {
        for &b in Builtin::ALL {
            assert_eq!(Builtin::from_name(b.name()), Some(b));
        }
        assert_eq!(Builtin::from_name("else"), None);
    }

    #[test]
    fn arithmetic_identities() {
        assert_eq!(run("(+)"), "0");
        assert_eq!(run("(*)"), "1");
        assert_eq!(run("(-)"), "0");
        assert_eq!(run("(/)"), "1");
    }

    #[test]
    fn arithmetic_folds_left() {
        assert_eq!(run("(+ 1 2 3 4)"), "10");
        assert_eq!(run("(- 10 3 2)"), "5");
        assert_eq!(run("(* 2 3 4)"), "24");
        assert_eq!(run("(/ 100 5 2)"), "10");
        assert_eq!(run("(- 4)"), "-4");
        assert_eq!(run("(/ 7 2)"), "3");
    }

    #[test]
    fn float_operand_promotes() {
        assert_eq!(run("(+ 2 3)"), "5");
        assert_eq!(run("(+ 2 3.0)"), "5.0");
        assert_eq!(run("(* 2 0.5)"), "1.0");
        assert_eq!(run("(/ 1 4.0)"), "0.25");
    }

    #[test]
    fn division_by_zero() {
        assert_eq!(run_err("(/ 4 0)"), SkeemError::DivisionByZero);
        assert_eq!(run_err("(/ 4.0 0.0)"), SkeemError::DivisionByZero);
        assert_eq!(run_err("(/ 0)"), SkeemError::DivisionByZero);
    }

    #[test]
    fn arithmetic_type_errors() {
        assert_eq!(
            run_err("(+ 1 \"a\")"),
            SkeemError::wrong_type("+", "number", "string")
        );
    }

    #[test]
    fn comparisons() {
        assert_eq!(run("(> 3 2)"), "#t");
        assert_eq!(run("(< 3 2.5)"), "#f");
        assert_eq!(run("(= 2 2.0)"), "#t");
        assert_eq!(
            run_err("(> 1)"),
            SkeemError::WrongNumberOfArguments {
                procedure: ">".into(),
                expected: "2".into(),
                got: 1,
            }
        );
        assert_eq!(run_err("(< 1 'a)"), SkeemError::wrong_type("<", "number", "symbol"));
    }

    #[test]
    fn if_without_alternate() {
        assert_eq!(run("(if #f 1)"), "#f");
        assert_eq!(run("(if #f (car 5))"), "#f");
        assert_eq!(run("(if '() 1 2)"), "1");
    }

    #[test]
    fn and_or_short_circuit() {
        assert_eq!(run("(and 1 2 3)"), "3");
        assert_eq!(run("(and 1 #f (car 5))"), "#f");
        assert_eq!(run("(and)"), "#t");
        assert_eq!(run("(or #f 2 (car 5))"), "2");
        assert_eq!(run("(or #f #f)"), "#f");
        assert_eq!(run("(or)"), "#f");
    }

    #[test]
    fn not_negates_truthiness() {
        assert_eq!(run("(not #f)"), "#t");
        assert_eq!(run("(not 0)"), "#f");
        assert_eq!(run("(define x #f) (not x)"), "#t");
    }

    #[test]
    fn cond_clauses() {
        assert_eq!(run("(cond (#f 1) ((> 2 1) 2 3) (else 4))"), "3");
        assert_eq!(run("(cond (#f 1) (else 4))"), "4");
        assert_eq!(run("(cond (7))"), "7");
        assert_eq!(run_err("(cond (#f 1))"), SkeemError::NoMatchingCondClause);
    }

    #[test]
    fn while_loop() {
        assert_eq!(
            run("(define i 0) (define s 0) (while (< i 5) (set! s (+ s i)) (set! i (+ i 1))) s"),
            "10"
        );
        assert_eq!(run("(while #f 1)"), "#f");
    }

    #[test]
    fn set_requires_existing_binding() {
        assert_eq!(run("(define x 5) (set! x 6) x"), "6");
        assert_eq!(run_err("(set! y 1)"), SkeemError::UnboundVariable("y".into()));
    }

    #[test]
    fn define_returns_symbol_and_rejects_reserved_names() {
        assert_eq!(run("(define x 1)"), "x");
        assert_eq!(run("(define (f) 1)"), "f");
        assert_eq!(
            run_err("(define car 1)"),
            SkeemError::wrong_type("define", "symbol", "primitive")
        );
    }

    #[test]
    fn list_operations() {
        assert_eq!(run("(car '(1 2 3))"), "1");
        assert_eq!(run("(cdr '(1 2 3))"), "(2 3)");
        assert_eq!(run("(cdr '(1))"), "()");
        assert_eq!(run("(cons 1 '(2))"), "(1 2)");
        assert_eq!(run("(cons 1 2)"), "(1 . 2)");
        assert_eq!(run("(list 1 (+ 1 1) \"x\")"), "(1 2 \"x\")");
        assert_eq!(run("(length '(1 2 3))"), "3");
        assert_eq!(run("(length '())"), "0");
        assert_eq!(run_err("(length 5)"), SkeemError::wrong_type("length", "list", "integer"));
    }

    #[test]
    fn car_of_non_pair() {
        assert_eq!(run_err("(car '())"), SkeemError::wrong_type("car", "list", "list"));
        assert_eq!(run_err("(car 5)"), SkeemError::wrong_type("car", "list", "integer"));
        assert_eq!(run_err("(cdr #t)"), SkeemError::wrong_type("cdr", "list", "boolean"));
    }

    #[test]
    fn type_predicates() {
        assert_eq!(run("(integer? 1)"), "#t");
        assert_eq!(run("(integer? 1.0)"), "#f");
        assert_eq!(run("(float? 1.0)"), "#t");
        assert_eq!(run("(number? 1.0)"), "#t");
        assert_eq!(run("(string? \"s\")"), "#t");
        assert_eq!(run("(symbol? 'a)"), "#t");
        assert_eq!(run("(list? '())"), "#t");
        assert_eq!(run("(list? '(1))"), "#t");
        assert_eq!(run("(null? '())"), "#t");
        assert_eq!(run("(boolean? #f)"), "#t");
        assert_eq!(run("(procedure? car)"), "#t");
        assert_eq!(run("(procedure? (lambda (x) x))"), "#t");
        assert_eq!(run("(closure? (lambda (x) x))"), "#t");
        assert_eq!(run("(closure? car)"), "#f");
    }

    #[test]
    fn eqv_and_equal() {
        assert_eq!(run("(equal? '(1 2 (3 4)) '(1 2 (3 4)))"), "#t");
        assert_eq!(run("(equal? '(1 2) '(1 2 3))"), "#f");
        assert_eq!(run("(eqv? (cons 1 '()) (cons 1 '()))"), "#f");
        assert_eq!(run("(define p (cons 1 2)) (eqv? p p)"), "#t");
        assert_eq!(run("(eqv? \"ab\" \"ab\")"), "#t");
        assert_eq!(run("(eqv? 'a 'a)"), "#t");
        assert_eq!(run("(eqv? 1 1.0)"), "#f");
        assert_eq!(run("(eqv? car car)"), "#t");
        assert_eq!(run("(equal? \"ab\" \"ab\")"), "#t");
    }

    #[test]
    fn eval_and_environments() {
        assert_eq!(run("(eval '(+ 1 2))"), "3");
        assert_eq!(run("(define e '(* 2 3)) (eval e)"), "6");
        assert_eq!(
            run("(define (f x) (current-environment)) (eval 'x (f 42))"),
            "42"
        );
    }

    #[test]
    fn exit_unwinds_with_status() {
        assert_eq!(run_err("(exit 3)"), SkeemError::Exit(3));
        assert_eq!(run_err("(exit)"), SkeemError::Exit(0));
        assert_eq!(
            run_err("(exit \"no\")"),
            SkeemError::wrong_type("exit", "integer", "string")
        );
        assert_eq!(
            run_err("(exit 4294967296)"),
            SkeemError::wrong_type("exit", "exit status", "integer")
        );
        assert_eq!(run_err("(exit -1)"), SkeemError::Exit(-1));
    }
}

use std::fmt::Write;

use crate::heap::{Heap, Object};
use crate::symbol::SymbolTable;
use crate::value::Value;

/// Deeper nesting than this prints as `...`.
const MAX_DEPTH: usize = 1000;

/// Print a Skeem value in its external representation.
pub fn print_val(val: Value, heap: &Heap, symbols: &SymbolTable) -> String {
    let mut out = String::new();
    print_inner(val, heap, symbols, &mut out, 0);
    out
}

fn print_inner(val: Value, heap: &Heap, symbols: &SymbolTable, out: &mut String, depth: usize) {
    if depth > MAX_DEPTH {
        out.push_str("...");
        return;
    }

    match val {
        Value::Nil => out.push_str("()"),
        Value::Integer(n) => {
            let _ = write!(out, "{}", n);
        }
        // Debug keeps the fractional part on whole floats: 5.0, not 5.
        Value::Float(x) => {
            let _ = write!(out, "{:?}", x);
        }
        Value::Boolean(true) => out.push_str("#t"),
        Value::Boolean(false) => out.push_str("#f"),
        Value::Char(c) => {
            out.push_str("#\\");
            match c {
                ' ' => out.push_str("space"),
                '\n' => out.push_str("newline"),
                '\t' => out.push_str("tab"),
                c => out.push(c),
            }
        }
        Value::Symbol(id) => out.push_str(symbols.name(id)),
        // No escape processing in either direction.
        Value::String(id) => {
            out.push('"');
            out.push_str(heap.string(id));
            out.push('"');
        }
        Value::Primitive(builtin) => {
            let _ = write!(out, "<procedure {}>", builtin.name());
        }
        Value::Closure(id) => {
            let name = match heap.get(id) {
                Object::Closure { procedure, .. } => {
                    heap.procedure(*procedure).map_or("?", |p| p.name.as_str())
                }
                _ => "?",
            };
            let _ = write!(out, "<procedure {}>", name);
        }
        Value::Environment(_) => out.push_str("<environment>"),
        Value::Pair(id) => {
            out.push('(');
            print_inner(heap.car(id), heap, symbols, out, depth + 1);

            let mut current = heap.cdr(id);
            loop {
                match current {
                    Value::Nil => break,
                    Value::Pair(next) => {
                        out.push(' ');
                        print_inner(heap.car(next), heap, symbols, out, depth + 1);
                        current = heap.cdr(next);
                    }
                    tail => {
                        out.push_str(" . ");
                        print_inner(tail, heap, symbols, out, depth + 1);
                        break;
                    }
                }
            }
            out.push(')');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::Interpreter;
    use crate::primitives::Builtin;
    use pretty_assertions::assert_eq;

    #[test]
    fn atoms() {
        let interp = Interpreter::new();
        assert_eq!(interp.print(Value::Integer(-12)), "-12");
        assert_eq!(interp.print(Value::Float(5.0)), "5.0");
        assert_eq!(interp.print(Value::Float(0.25)), "0.25");
        assert_eq!(interp.print(Value::TRUE), "#t");
        assert_eq!(interp.print(Value::Nil), "()");
        assert_eq!(interp.print(Value::Char(' ')), "#\\space");
        assert_eq!(interp.print(Value::Char('x')), "#\\x");
        assert_eq!(interp.print(Value::Primitive(Builtin::Add)), "<procedure +>");
    }

    #[test]
    fn strings_print_unescaped() {
        let mut interp = Interpreter::new();
        let s = interp.alloc_string("say \\n");
        assert_eq!(interp.print(s), "\"say \\n\"");
    }

    #[test]
    fn dotted_and_nested_lists() {
        let mut interp = Interpreter::new();
        let dotted = interp.cons(Value::Integer(1), Value::Integer(2));
        assert_eq!(interp.print(dotted), "(1 . 2)");

        let val = interp.eval_str("(cons 1 (cons 2 3))").unwrap();
        assert_eq!(interp.print(val), "(1 2 . 3)");

        let val = interp.eval_str("'(a (b (c)) ())").unwrap();
        assert_eq!(interp.print(val), "(a (b (c)) ())");
    }

    #[test]
    fn callables_print_their_name() {
        let mut interp = Interpreter::new();
        let val = interp.eval_str("(define (square x) (* x x)) square").unwrap();
        assert_eq!(interp.print(val), "<procedure square>");
        let val = interp.eval_str("(lambda (x) x)").unwrap();
        assert_eq!(interp.print(val), "<procedure lambda>");
        let val = interp.eval_str("(current-environment)").unwrap();
        assert_eq!(interp.print(val), "<environment>");
    }
}

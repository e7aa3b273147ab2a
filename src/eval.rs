use std::collections::BTreeMap;
use std::io::{self, Write};

use crate::config::Config;
use crate::env;
use crate::error::{SkeemError, SkeemResult};
use crate::heap::{Frame, GcStats, Heap, Object, Procedure};
use crate::primitives::{self, Builtin};
use crate::printer;
use crate::reader::{ReadStatus, Reader};
use crate::symbol::SymbolTable;
use crate::value::{ObjId, SymbolId, Value};

/// The Skeem interpreter context.
/// All interpreter state lives here so the collector can find its roots and
/// several interpreters can coexist.
pub struct Interpreter {
    pub heap: Heap,
    pub symbols: SymbolTable,

    /// The global frame. Always `frames[0]`.
    global: ObjId,
    /// Frames of the calls currently executing, innermost last.
    frames: Vec<ObjId>,
    /// Values kept alive while not yet reachable from any frame.
    pins: Vec<Value>,

    config: Config,
    out: Box<dyn Write>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Interpreter::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Interpreter::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        let mut heap = Heap::new(config.gc_threshold.max(1));
        let global = heap.insert(Object::Frame(Frame {
            bindings: BTreeMap::new(),
            parent: None,
        }));

        let mut interp = Interpreter {
            heap,
            symbols: SymbolTable::new(),
            global,
            frames: vec![global],
            pins: Vec::new(),
            config,
            out: Box::new(io::stdout()),
        };
        interp.install_builtins();
        interp
    }

    /// Redirect `print` output.
    pub fn with_output(mut self, out: Box<dyn Write>) -> Self {
        self.out = out;
        self
    }

    /// Bind every builtin under its name in the global frame. The reader
    /// resolves these names directly, so the bindings only matter to code
    /// that looks them up by symbol.
    fn install_builtins(&mut self) {
        for &builtin in Builtin::ALL {
            let name = self.symbols.intern(builtin.name());
            env::define(&mut self.heap, self.global, name, Value::Primitive(builtin));
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn output(&mut self) -> &mut dyn Write {
        self.out.as_mut()
    }

    // ========================================================================
    // Allocation and the pin set
    // ========================================================================

    /// Allocate a heap object, running a collection first if the heap is at
    /// its threshold. The object's own references are treated as roots for
    /// that cycle.
    pub fn alloc(&mut self, object: Object) -> ObjId {
        if self.heap.should_gc() {
            self.run_gc(Some(&object));
        }
        self.heap.insert(object)
    }

    pub fn cons(&mut self, head: Value, tail: Value) -> Value {
        Value::Pair(self.alloc(Object::Pair { head, tail }))
    }

    pub fn alloc_string(&mut self, s: impl Into<String>) -> Value {
        Value::String(self.alloc(Object::Str(s.into())))
    }

    /// Build a proper list. Every element is pinned while the spine is built.
    pub fn list(&mut self, items: &[Value]) -> Value {
        let mark = self.pin_mark();
        self.pins.extend_from_slice(items);
        let mut result = Value::Nil;
        for &val in items.iter().rev() {
            result = self.cons(val, result);
            self.pin(result);
        }
        self.unpin_to(mark);
        result
    }

    /// Create a frame chained to `parent`.
    pub fn new_frame(&mut self, parent: ObjId) -> ObjId {
        self.alloc(Object::Frame(Frame {
            bindings: BTreeMap::new(),
            parent: Some(parent),
        }))
    }

    #[inline]
    pub fn pin(&mut self, val: Value) {
        if val.heap_ref().is_some() {
            self.pins.push(val);
        }
    }

    /// Current depth of the pin stack, to hand back to `unpin_to`.
    #[inline]
    pub fn pin_mark(&self) -> usize {
        self.pins.len()
    }

    #[inline]
    pub fn unpin_to(&mut self, mark: usize) {
        self.pins.truncate(mark);
    }

    pub fn pinned_count(&self) -> usize {
        self.pins.len()
    }

    pub fn frame_depth(&self) -> usize {
        self.frames.len()
    }

    // ========================================================================
    // Collector
    // ========================================================================

    /// Force a full collection cycle.
    pub fn collect_garbage(&mut self) -> usize {
        self.run_gc(None)
    }

    pub fn live_objects(&self) -> usize {
        self.heap.live_count()
    }

    pub fn gc_stats(&self) -> GcStats {
        self.heap.stats()
    }

    fn run_gc(&mut self, in_flight: Option<&Object>) -> usize {
        let mut worklist = Vec::new();

        // Roots: the global frame, every active call frame, the pin set.
        self.heap.mark_object(self.global, &mut worklist);
        for &frame in &self.frames {
            self.heap.mark_object(frame, &mut worklist);
        }
        for &val in &self.pins {
            self.heap.mark_value(val, &mut worklist);
        }
        if let Some(object) = in_flight {
            self.heap.mark_refs_of(object, &mut worklist);
        }

        self.heap.process_worklist(&mut worklist);
        let freed = self.heap.sweep();

        tracing::debug!(
            freed,
            survivors = self.heap.live_count(),
            threshold = self.heap.threshold(),
            "gc cycle complete"
        );
        freed
    }

    // ========================================================================
    // Environment
    // ========================================================================

    pub fn intern(&mut self, name: &str) -> SymbolId {
        self.symbols.intern(name)
    }

    pub fn define(&mut self, frame: ObjId, name: SymbolId, val: Value) {
        env::define(&mut self.heap, frame, name, val);
    }

    /// `set!`: mutate the nearest existing binding.
    pub fn assign(&mut self, frame: ObjId, name: SymbolId, val: Value) -> SkeemResult<()> {
        if env::assign(&mut self.heap, frame, name, val) {
            Ok(())
        } else {
            Err(SkeemError::UnboundVariable(self.symbols.name(name).to_string()))
        }
    }

    /// Look up `name`, following symbol-to-symbol bindings until a
    /// non-symbol value is reached.
    pub fn lookup(&self, name: SymbolId, frame: ObjId) -> SkeemResult<Value> {
        let mut current = name;
        for _ in 0..=self.config.max_alias_depth {
            match env::find(&self.heap, frame, current) {
                None => {
                    return Err(SkeemError::UnboundVariable(
                        self.symbols.name(current).to_string(),
                    ))
                }
                Some(Value::Symbol(next)) => current = next,
                Some(val) => return Ok(val),
            }
        }
        Err(SkeemError::CyclicBinding(self.symbols.name(name).to_string()))
    }

    // ========================================================================
    // Core evaluation entry points
    // ========================================================================

    /// Evaluate one top-level form in the global frame.
    ///
    /// On error the frame stack is cut back to the global frame and the pin
    /// set is cleared before the error is returned, so the next form starts
    /// from the same state this one did.
    pub fn eval_toplevel(&mut self, form: Value) -> SkeemResult<Value> {
        self.pin(form);
        let result = self.eval(form, self.global);
        if let Err(e) = &result {
            tracing::debug!(
                error = %e,
                frames = self.frames.len(),
                pins = self.pins.len(),
                "unwinding to top level"
            );
            self.frames.truncate(1);
        }
        self.pins.clear();
        result
    }

    /// Read and evaluate every form in `src`, returning the last value.
    ///
    /// Input is fed one line at a time and each form runs as soon as it is
    /// complete, so a later read error does not stop earlier forms.
    pub fn eval_str(&mut self, src: &str) -> SkeemResult<Value> {
        let mut reader = Reader::new();
        let mut last = Value::Nil;
        for line in src.split_inclusive('\n') {
            reader.push_line(line)?;
            while let ReadStatus::Complete(form) = reader.read_form(self)? {
                last = self.eval_toplevel(form)?;
            }
        }
        if reader.is_pending() {
            return Err(SkeemError::UnbalancedExpression);
        }
        Ok(last)
    }

    /// Render a value in its external representation.
    pub fn print(&self, val: Value) -> String {
        printer::print_val(val, &self.heap, &self.symbols)
    }

    /// Evaluate `expr` in `env`.
    pub fn eval(&mut self, expr: Value, env: ObjId) -> SkeemResult<Value> {
        match expr {
            Value::Symbol(name) => self.lookup(name, env),
            Value::Pair(id) => {
                let head = self.heap.car(id);
                let args = self.heap.cdr(id);
                let op = self.eval(head, env)?;
                self.apply(op, args, env)
            }
            _ => Ok(expr),
        }
    }

    /// Apply `op` to the unevaluated argument list `args`, evaluating
    /// arguments in `env` as the operator requires.
    pub fn apply(&mut self, op: Value, args: Value, env: ObjId) -> SkeemResult<Value> {
        match op {
            Value::Primitive(builtin) => primitives::call(self, builtin, args, env),
            Value::Closure(id) => {
                let (procedure, captured) = match self.heap.get(id) {
                    Object::Closure { procedure, env } => (*procedure, *env),
                    _ => return Err(SkeemError::InvalidFunction(self.print(op))),
                };
                let mark = self.pin_mark();
                self.pin(op);
                let result = self.apply_procedure(procedure, captured, args, env);
                self.unpin_to(mark);
                result
            }
            Value::Symbol(name) => {
                let resolved = self.lookup(name, env)?;
                self.apply(resolved, args, env)
            }
            other => Err(SkeemError::InvalidFunction(self.print(other))),
        }
    }

    /// Call a user procedure: evaluate arguments in the caller's frame, bind
    /// them in a fresh child of `captured`, run the body.
    fn apply_procedure(
        &mut self,
        procedure: ObjId,
        captured: ObjId,
        args: Value,
        env: ObjId,
    ) -> SkeemResult<Value> {
        let (name, params, body) = match self.heap.procedure(procedure) {
            Some(p) => (p.name.clone(), p.params.clone(), p.body.clone()),
            None => return Err(SkeemError::InvalidFunction("<freed procedure>".into())),
        };
        tracing::trace!(procedure = %name, "apply");

        let arg_exprs = self.syntax_list(&name, args)?;
        if arg_exprs.len() != params.len() {
            return Err(SkeemError::WrongNumberOfArguments {
                procedure: name,
                expected: params.len().to_string(),
                got: arg_exprs.len(),
            });
        }

        let mark = self.pin_mark();
        let values = self.eval_each(&arg_exprs, env)?;

        // The argument values are still pinned, so allocating the frame
        // cannot reclaim them before they are bound.
        let frame = self.new_frame(captured);
        if let Some(f) = self.heap.frame_mut(frame) {
            f.bindings.extend(params.into_iter().zip(values));
        }
        self.frames.push(frame);

        let mut result = Value::Nil;
        for form in body {
            result = self.eval(form, frame)?;
        }

        self.frames.pop();
        self.unpin_to(mark);
        Ok(result)
    }

    /// Evaluate each expression left to right, pinning each result so a
    /// collection triggered by a later sibling cannot reclaim it. The pins
    /// stay until the caller unpins.
    pub fn eval_each(&mut self, exprs: &[Value], env: ObjId) -> SkeemResult<Vec<Value>> {
        let mut values = Vec::with_capacity(exprs.len());
        for &expr in exprs {
            let val = self.eval(expr, env)?;
            self.pin(val);
            values.push(val);
        }
        Ok(values)
    }

    /// Evaluate a body in sequence, returning the last value (`default` if
    /// the body is empty).
    pub fn eval_sequence(&mut self, forms: &[Value], env: ObjId, default: Value) -> SkeemResult<Value> {
        let mut result = default;
        for &form in forms {
            result = self.eval(form, env)?;
        }
        Ok(result)
    }

    /// An argument list as a Vec; improper lists are a type error for `who`.
    pub fn syntax_list(&self, who: &str, args: Value) -> SkeemResult<Vec<Value>> {
        self.heap
            .list_to_vec(args)
            .ok_or_else(|| SkeemError::wrong_type(who, "list", args.type_name()))
    }

    /// Build a closure over `env` from a parameter list and body forms.
    pub fn make_closure(
        &mut self,
        name: &str,
        params: Vec<SymbolId>,
        body: Vec<Value>,
        env: ObjId,
    ) -> Value {
        let procedure = self.alloc(Object::Procedure(Procedure {
            name: name.to_string(),
            params,
            body,
        }));
        // The closure payload refers to the procedure, which keeps it alive
        // if this allocation collects.
        Value::Closure(self.alloc(Object::Closure { procedure, env }))
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
        let mut interp = Interpreter::new();
        interp.eval_str(src).unwrap_err()
    }

    #[test]
    fn self_evaluating_atoms() {
        assert_eq!(run("42"), "42");
        assert_eq!(run("2.5"), "2.5");
        assert_eq!(run("\"hi\""), "\"hi\"");
        assert_eq!(run("#t"), "#t");
    }

    #[test]
    fn symbol_lookup_and_unbound() {
        assert_eq!(run("(define x 5) x"), "5");
        assert_eq!(run_err("nope"), SkeemError::UnboundVariable("nope".into()));
    }

    #[test]
    fn alias_chain_resolves() {
        assert_eq!(run("(define a 1) (define b 'a) (define c 'b) c"), "1");
    }

    #[test]
    fn self_alias_is_cyclic() {
        assert_eq!(
            run_err("(define x 'x) x"),
            SkeemError::CyclicBinding("x".into())
        );
        assert_eq!(
            run_err("(define p 'q) (define q 'p) p"),
            SkeemError::CyclicBinding("p".into())
        );
    }

    #[test]
    fn procedure_arity_is_exact() {
        let err = run_err("(define (f a b) a) (f 1)");
        assert_eq!(
            err,
            SkeemError::WrongNumberOfArguments {
                procedure: "f".into(),
                expected: "2".into(),
                got: 1,
            }
        );
    }

    #[test]
    fn body_returns_last_form() {
        assert_eq!(run("(define (f) 1 2 3) (f)"), "3");
    }

    #[test]
    fn invalid_function() {
        assert_eq!(run_err("(1 2)"), SkeemError::InvalidFunction("1".into()));
    }

    #[test]
    fn quoted_symbol_operator_is_resolved() {
        assert_eq!(run("(define (sq x) (* x x)) ((quote sq) 4)"), "16");
    }

    #[test]
    fn error_unwinds_frames_and_pins() {
        let mut interp = Interpreter::new();
        interp
            .eval_str("(define (f x) (g x)) (define (g y) (car y))")
            .unwrap();
        let err = interp.eval_str("(f 5)").unwrap_err();
        assert_eq!(err, SkeemError::wrong_type("car", "list", "integer"));
        assert_eq!(interp.frame_depth(), 1);
        assert_eq!(interp.pinned_count(), 0);
        let val = interp.eval_str("(f '(7 8))").unwrap();
        assert_eq!(interp.print(val), "7");
    }

    #[test]
    fn collection_during_argument_evaluation_keeps_earlier_arguments() {
        // A threshold of one collects on nearly every allocation.
        let mut interp = Interpreter::with_config(Config::default().with_gc_threshold(1));
        let val = interp
            .eval_str(
                "(define (pair3 a b c) (cons a (cons b (cons c '()))))
                 (pair3 (cons 1 2) \"two\" (cons 3 (cons 4 '())))",
            )
            .unwrap();
        assert_eq!(interp.print(val), "((1 . 2) \"two\" (3 4))");
    }

    #[test]
    fn list_survives_collection_while_building() {
        let mut interp = Interpreter::with_config(Config::default().with_gc_threshold(1));
        let a = interp.alloc_string("a");
        interp.pin(a);
        let b = interp.alloc_string("b");
        interp.pin(b);
        let list = interp.list(&[a, b, Value::Integer(3)]);
        assert_eq!(interp.print(list), "(\"a\" \"b\" 3)");
    }
}

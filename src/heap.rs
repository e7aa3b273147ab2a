use std::collections::BTreeMap;

use crate::value::{ObjId, SymbolId, Value};

/// A user-defined procedure: name, parameters and body forms.
pub struct Procedure {
    pub name: String,
    pub params: Vec<SymbolId>,
    pub body: Vec<Value>,
}

/// One level of lexical scope.
pub struct Frame {
    pub bindings: BTreeMap<SymbolId, Value>,
    pub parent: Option<ObjId>,
}

/// Payload of a heap slot. Freed slots hold `Free` until reused.
pub enum Object {
    Free,
    Str(String),
    Pair { head: Value, tail: Value },
    Procedure(Procedure),
    Closure { procedure: ObjId, env: ObjId },
    Frame(Frame),
}

impl Object {
    /// Push every heap handle this object refers to.
    fn for_each_ref(&self, mut f: impl FnMut(ObjId)) {
        match self {
            Object::Free | Object::Str(_) => {}
            Object::Pair { head, tail } => {
                if let Some(id) = head.heap_ref() {
                    f(id);
                }
                if let Some(id) = tail.heap_ref() {
                    f(id);
                }
            }
            Object::Procedure(proc) => {
                for form in &proc.body {
                    if let Some(id) = form.heap_ref() {
                        f(id);
                    }
                }
            }
            Object::Closure { procedure, env } => {
                f(*procedure);
                f(*env);
            }
            Object::Frame(frame) => {
                for val in frame.bindings.values() {
                    if let Some(id) = val.heap_ref() {
                        f(id);
                    }
                }
                if let Some(parent) = frame.parent {
                    f(parent);
                }
            }
        }
    }
}

/// A single slot on the heap.
pub struct HeapCell {
    pub object: Object,
    pub mark: bool,
}

/// Counters for the collector, exposed for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GcStats {
    pub cycles: u64,
    pub freed: u64,
}

/// The object heap. Every non-immediate Value points here by ObjId,
/// an index into `cells`. Objects never own each other, so cycles and
/// shared structure are just more handles.
pub struct Heap {
    cells: Vec<HeapCell>,
    free_list: Vec<ObjId>,
    live: usize,
    /// Collect before the next allocation once `live` reaches this.
    threshold: usize,
    /// Lower bound for `threshold` after a cycle.
    min_threshold: usize,
    stats: GcStats,
}

impl Heap {
    pub fn new(min_threshold: usize) -> Self {
        Heap {
            cells: Vec::with_capacity(1024),
            free_list: Vec::new(),
            live: 0,
            threshold: min_threshold,
            min_threshold,
            stats: GcStats::default(),
        }
    }

    /// Store an object and return its handle. Never collects; callers that
    /// want collection go through the interpreter.
    pub fn insert(&mut self, object: Object) -> ObjId {
        self.live += 1;

        if let Some(id) = self.free_list.pop() {
            let cell = &mut self.cells[id.index()];
            cell.object = object;
            cell.mark = false;
            return id;
        }

        let id = ObjId(self.cells.len() as u32);
        self.cells.push(HeapCell {
            object,
            mark: false,
        });
        id
    }

    #[inline]
    pub fn get(&self, id: ObjId) -> &Object {
        &self.cells[id.index()].object
    }

    #[inline]
    pub fn get_mut(&mut self, id: ObjId) -> &mut Object {
        &mut self.cells[id.index()].object
    }

    /// Head of a pair; `()` for anything else.
    #[inline]
    pub fn car(&self, id: ObjId) -> Value {
        match self.get(id) {
            Object::Pair { head, .. } => *head,
            _ => Value::Nil,
        }
    }

    /// Tail of a pair; `()` for anything else.
    #[inline]
    pub fn cdr(&self, id: ObjId) -> Value {
        match self.get(id) {
            Object::Pair { tail, .. } => *tail,
            _ => Value::Nil,
        }
    }

    pub fn string(&self, id: ObjId) -> &str {
        match self.get(id) {
            Object::Str(s) => s,
            _ => "",
        }
    }

    pub fn procedure(&self, id: ObjId) -> Option<&Procedure> {
        match self.get(id) {
            Object::Procedure(proc) => Some(proc),
            _ => None,
        }
    }

    pub fn frame(&self, id: ObjId) -> Option<&Frame> {
        match self.get(id) {
            Object::Frame(frame) => Some(frame),
            _ => None,
        }
    }

    pub fn frame_mut(&mut self, id: ObjId) -> Option<&mut Frame> {
        match self.get_mut(id) {
            Object::Frame(frame) => Some(frame),
            _ => None,
        }
    }

    /// Collect a proper list into a Vec. Returns None if not a proper list.
    pub fn list_to_vec(&self, val: Value) -> Option<Vec<Value>> {
        let mut result = Vec::new();
        let mut current = val;
        loop {
            match current {
                Value::Nil => return Some(result),
                Value::Pair(id) => {
                    result.push(self.car(id));
                    current = self.cdr(id);
                }
                _ => return None,
            }
        }
    }

    /// Number of elements in a proper list, None if improper.
    pub fn list_length(&self, val: Value) -> Option<usize> {
        let mut count = 0;
        let mut current = val;
        loop {
            match current {
                Value::Nil => return Some(count),
                Value::Pair(id) => {
                    count += 1;
                    current = self.cdr(id);
                }
                _ => return None,
            }
        }
    }

    /// Returns the number of live (non-free) objects.
    pub fn live_count(&self) -> usize {
        self.live
    }

    /// Returns the number of slots ever allocated, free or not.
    pub fn total_cells(&self) -> usize {
        self.cells.len()
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    pub fn stats(&self) -> GcStats {
        self.stats
    }

    /// Returns true if the next allocation should run a cycle first.
    pub fn should_gc(&self) -> bool {
        self.live >= self.threshold
    }

    /// Check if a slot is marked.
    pub fn is_marked(&self, id: ObjId) -> bool {
        self.cells[id.index()].mark
    }

    // === GC methods ===

    /// Mark an object as reachable and queue it for scanning.
    pub fn mark_object(&mut self, id: ObjId, worklist: &mut Vec<ObjId>) {
        let cell = &mut self.cells[id.index()];
        if !cell.mark {
            cell.mark = true;
            worklist.push(id);
        }
    }

    /// Mark a value as reachable. Immediates are ignored.
    pub fn mark_value(&mut self, val: Value, worklist: &mut Vec<ObjId>) {
        if let Some(id) = val.heap_ref() {
            self.mark_object(id, worklist);
        }
    }

    /// Process the mark worklist until every reachable object is marked.
    /// Already-marked objects are never queued twice, so cycles terminate.
    pub fn process_worklist(&mut self, worklist: &mut Vec<ObjId>) {
        let mut children = Vec::new();
        while let Some(id) = worklist.pop() {
            self.cells[id.index()]
                .object
                .for_each_ref(|child| children.push(child));
            for child in children.drain(..) {
                self.mark_object(child, worklist);
            }
        }
    }

    /// Queue everything `object` refers to. Used to keep the payload of an
    /// allocation in flight alive across the cycle it triggers.
    pub fn mark_refs_of(&mut self, object: &Object, worklist: &mut Vec<ObjId>) {
        object.for_each_ref(|child| self.mark_object(child, worklist));
    }

    /// Sweep: free unmarked objects, clear marks on survivors, and grow the
    /// threshold. Returns the number of objects freed.
    pub fn sweep(&mut self) -> usize {
        let mut freed = 0;
        for i in 0..self.cells.len() {
            let cell = &mut self.cells[i];
            if matches!(cell.object, Object::Free) {
                continue;
            }
            if cell.mark {
                cell.mark = false;
            } else {
                // Dropping the payload releases string buffers, procedure
                // bodies and frame maps.
                cell.object = Object::Free;
                self.free_list.push(ObjId(i as u32));
                freed += 1;
            }
        }
        self.live -= freed;
        self.threshold = (self.live * 2).max(self.min_threshold);
        self.stats.cycles += 1;
        self.stats.freed += freed as u64;
        freed
    }
}

use crate::heap::Heap;
use crate::value::{ObjId, SymbolId, Value};

/// Insert or overwrite a binding in `frame` only.
pub fn define(heap: &mut Heap, frame: ObjId, name: SymbolId, val: Value) {
    if let Some(f) = heap.frame_mut(frame) {
        f.bindings.insert(name, val);
    }
}

/// Find the nearest frame, starting at `frame` and walking outward, that
/// binds `name`.
pub fn find_binding_frame(heap: &Heap, frame: ObjId, name: SymbolId) -> Option<ObjId> {
    let mut current = Some(frame);
    while let Some(id) = current {
        let f = heap.frame(id)?;
        if f.bindings.contains_key(&name) {
            return Some(id);
        }
        current = f.parent;
    }
    None
}

/// Mutate the nearest existing binding of `name`.
/// Returns false if no frame in the chain binds it.
pub fn assign(heap: &mut Heap, frame: ObjId, name: SymbolId, val: Value) -> bool {
    match find_binding_frame(heap, frame, name) {
        Some(owner) => {
            define(heap, owner, name, val);
            true
        }
        None => false,
    }
}

/// Look up `name` from `frame` outward. Does not resolve symbol aliases.
pub fn find(heap: &Heap, frame: ObjId, name: SymbolId) -> Option<Value> {
    let owner = find_binding_frame(heap, frame, name)?;
    heap.frame(owner)?.bindings.get(&name).copied()
}

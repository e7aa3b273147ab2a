use rustc_hash::FxHashMap;

use crate::value::SymbolId;

/// Interned symbol table. Each unique symbol name maps to a unique SymbolId,
/// so comparing ids is comparing names.
///
/// Symbols live for the lifetime of the interpreter; they are not heap
/// objects and the collector never sees them.
#[derive(Default)]
pub struct SymbolTable {
    name_to_id: FxHashMap<String, SymbolId>,
    id_to_name: Vec<String>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable::default()
    }

    /// Intern a symbol name. Returns the existing ID if already interned,
    /// or creates a new one.
    pub fn intern(&mut self, name: &str) -> SymbolId {
        if let Some(&id) = self.name_to_id.get(name) {
            return id;
        }
        let id = SymbolId(self.id_to_name.len() as u32);
        self.name_to_id.insert(name.to_string(), id);
        self.id_to_name.push(name.to_string());
        id
    }

    /// Look up a symbol name by its ID.
    pub fn name(&self, id: SymbolId) -> &str {
        self.id_to_name
            .get(id.0 as usize)
            .map(String::as_str)
            .unwrap_or("<unknown symbol>")
    }

    /// Total number of interned symbols.
    pub fn count(&self) -> usize {
        self.id_to_name.len()
    }
}

use hustle_value::Cell;
use indexmap::IndexMap;

/// Name to word bindings, kept in definition order.
#[derive(Default)]
pub struct SymbolTable {
    entries: IndexMap<String, Cell>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<Cell> {
        self.entries.get(name).copied()
    }

    /// Binds `name`, returning the previous binding if there was one.
    pub fn insert(&mut self, name: impl Into<String>, word: Cell) -> Option<Cell> {
        self.entries.insert(name.into(), word)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn mark_symbols(&mut self, visit: &mut dyn FnMut(&mut Cell)) {
        for word in self.entries.values_mut() {
            visit(word);
        }
    }
}

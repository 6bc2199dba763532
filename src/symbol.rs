use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, OnceLock};

/// An interned identifier. Method names and guest class names are interned
/// once and compared by id afterwards, so dispatch-site cache keys are a
/// single integer comparison instead of a string comparison.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Symbol(u32);

#[derive(Default)]
struct Interner {
    ids: HashMap<String, Symbol>,
    names: Vec<String>,
}

static INTERNER: OnceLock<Mutex<Interner>> = OnceLock::new();

fn interner() -> &'static Mutex<Interner> {
    INTERNER.get_or_init(|| Mutex::new(Interner::default()))
}

impl Symbol {
    /// Intern `name`, returning the existing symbol if it was seen before.
    pub fn intern(name: &str) -> Symbol {
        let mut table = interner().lock().unwrap();
        if let Some(&sym) = table.ids.get(name) {
            return sym;
        }
        let sym = Symbol(table.names.len() as u32);
        table.names.push(name.to_owned());
        table.ids.insert(name.to_owned(), sym);
        sym
    }

    /// The string this symbol was interned from.
    pub fn name(&self) -> String {
        interner().lock().unwrap().names[self.0 as usize].clone()
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = interner().lock().unwrap();
        f.write_str(&table.names[self.0 as usize])
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = interner().lock().unwrap();
        write!(f, "Symbol({}: {:?})", self.0, &table.names[self.0 as usize])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_is_idempotent() {
        assert_eq!(Symbol::intern("to_str"), Symbol::intern("to_str"));
    }

    #[test]
    fn distinct_names_get_distinct_symbols() {
        assert_ne!(Symbol::intern("to_int"), Symbol::intern("to_i"));
    }

    #[test]
    fn name_round_trips() {
        assert_eq!(Symbol::intern("coerce").name(), "coerce");
    }

    #[test]
    fn display_shows_the_name() {
        assert_eq!(Symbol::intern("respond_to?").to_string(), "respond_to?");
    }

    #[test]
    fn usable_as_hash_key() {
        let mut map = HashMap::new();
        map.insert(Symbol::intern("write"), 1);
        assert_eq!(map.get(&Symbol::intern("write")), Some(&1));
    }
}

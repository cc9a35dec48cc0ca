#![warn(
    clippy::print_stdout,
    clippy::unimplemented,
    clippy::doc_markdown,
    clippy::items_after_statements,
    clippy::match_same_arms,
    clippy::similar_names,
    clippy::single_match_else,
    clippy::use_self,
    clippy::use_debug
)]

//! Identifier table with amortised O(1) insert and pointer-compared symbols.
//!
//! Type, field and method identifiers are interned once and passed around as
//! cheap [`Symbol`] handles afterwards. Symbols own their backing string
//! (reference counted): library types are manufactured from signature
//! strings at runtime, so there is no source buffer the table could borrow
//! from.

use std::{
    collections::HashSet,
    fmt,
    hash::{Hash, Hasher},
    rc::Rc,
};

#[derive(Debug, Clone, Eq)]
pub struct Symbol(Rc<str>);

impl Symbol {
    fn as_raw(&self) -> *const u8 {
        self.0.as_ptr()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_raw().hash(state)
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Symbol) -> bool {
        // all symbols come out of one table, so pointer equality is string
        // equality
        self.as_raw() == other.as_raw()
    }
}

impl PartialEq<str> for Symbol {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&'_ str> for Symbol {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Default)]
pub struct StringTable {
    entries: HashSet<Rc<str>>,
}

const STRING_TABLE_WILDCARD_SYMBOL: &str = "?";

impl StringTable {
    pub fn new() -> Self {
        let mut st = StringTable::default();
        st.intern(STRING_TABLE_WILDCARD_SYMBOL);
        st
    }

    pub fn intern(&mut self, value: &str) -> Symbol {
        if let Some(interned) = self.entries.get(value) {
            return Symbol(Rc::clone(interned));
        }

        let entry: Rc<str> = Rc::from(value);
        self.entries.insert(Rc::clone(&entry));
        Symbol(entry)
    }

    /// The identifier every wildcard type parameter shares.
    pub fn wildcard_symbol(&self) -> Symbol {
        Symbol(Rc::clone(
            self.entries.get(STRING_TABLE_WILDCARD_SYMBOL).unwrap(),
        ))
    }

    #[cfg(test)]
    fn get(&self, value: &str) -> Option<Symbol> {
        self.entries.get(value).map(|s| Symbol(Rc::clone(s)))
    }
}

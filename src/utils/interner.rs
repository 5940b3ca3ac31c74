//! Global string interner.
//!
//! Group names are interned into compact [`Symbol`]s so the group index can
//! hash and compare them in O(1).

use std::sync::LazyLock;

use lasso::{Spur, ThreadedRodeo};

static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::new);

/// Compact integer identifier for an interned string.
pub type Symbol = Spur;

/// Interns a string, returning its symbol.
///
/// Returns the existing symbol when the string was interned before.
#[inline]
pub fn intern(s: &str) -> Symbol {
    INTERNER.get_or_intern(s)
}

/// Looks up the symbol of an already interned string without allocating.
#[inline]
pub fn get(s: &str) -> Option<Symbol> {
    INTERNER.get(s)
}

/// Resolves a symbol back to its string.
#[inline]
pub fn resolve(sym: Symbol) -> &'static str {
    INTERNER.resolve(&sym)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_and_resolve() {
        let s1 = intern("enemies");
        let s2 = intern("enemies");
        let s3 = intern("pickups");

        assert_eq!(s1, s2);
        assert_ne!(s1, s3);

        assert_eq!(resolve(s1), "enemies");
        assert_eq!(resolve(s3), "pickups");
    }

    #[test]
    fn test_get() {
        let _ = intern("existing_group");

        assert!(get("existing_group").is_some());
        assert!(get("never_interned_group").is_none());
    }
}

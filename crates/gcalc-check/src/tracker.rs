//! Undefined-Reference Tracker.
//!
//! References are never cached: every query is a set difference against the
//! registry as it is right now, so releasing a name re-flags its users the
//! next time they are checked.

use gcalc_core::{Binding, EntityRegistry, Symbol};

use crate::resolver::classify;
use crate::scanner::{free_symbols, normalize};

/// Filters the free symbols of a body down to global references.
///
/// Drops reserved symbols, the equation's own bound name, and a function's
/// argument, which is locally bound.
pub fn free_references(binding: Binding, free: &[Symbol]) -> Vec<Symbol> {
    free.iter()
        .copied()
        .filter(|s| !s.is_reserved())
        .filter(|s| Some(*s) != binding.bound_name())
        .filter(|s| Some(*s) != binding.argument())
        .collect()
}

/// The references bound in neither namespace, sorted.
pub fn undefined_references(registry: &EntityRegistry, references: &[Symbol]) -> Vec<Symbol> {
    let mut undefined: Vec<Symbol> = references
        .iter()
        .copied()
        .filter(|s| !registry.is_defined(*s))
        .collect();
    undefined.sort();
    undefined.dedup();
    undefined
}

/// Global references of arbitrary text, without registry validation.
///
/// Used to find the dependents of a name. Text whose binding is invalid still
/// reports the symbols it mentions so it is re-checked when names change.
pub fn references_of(text: &str) -> Vec<Symbol> {
    match classify(text) {
        Ok(classification) => {
            free_references(classification.binding, &free_symbols(&classification.body))
        }
        Err(_) => free_references(Binding::Implicit, &free_symbols(&normalize(text))),
    }
}

/// Returns true if `text` references any of `names`.
pub fn references_any(text: &str, names: &[Symbol]) -> bool {
    references_of(text).iter().any(|s| names.contains(s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gcalc_core::Namespace;

    #[test]
    fn difference_against_current_registry() {
        let mut reg = EntityRegistry::new();
        let a = reg.create();
        let refs = [Symbol('a'), Symbol('f')];
        assert_eq!(undefined_references(&reg, &refs), refs.to_vec());

        reg.rebind(a, Binding::Variable { name: Symbol('a') }).unwrap();
        assert_eq!(undefined_references(&reg, &refs), vec![Symbol('f')]);

        reg.remove(a).unwrap();
        assert_eq!(undefined_references(&reg, &refs), refs.to_vec());
    }

    #[test]
    fn both_namespaces_count_as_defined() {
        let mut reg = EntityRegistry::new();
        let f = reg.create();
        reg.rebind(
            f,
            Binding::Function {
                name: Symbol('f'),
                argument: Symbol::X,
            },
        )
        .unwrap();
        assert_eq!(reg.owner(Symbol('f'), Namespace::Function), Some(f));
        assert!(undefined_references(&reg, &[Symbol('f')]).is_empty());
    }

    #[test]
    fn references_of_text() {
        assert_eq!(references_of("f(x)+1"), vec![Symbol('f')]);
        assert_eq!(references_of("f(x)=x+g(x)"), vec![Symbol('g')]);
        assert_eq!(references_of("y=a*x"), vec![Symbol('a')]);
        // Invalid binding still reports mentioned symbols.
        assert_eq!(references_of("e=a"), vec![Symbol('a')]);
        assert!(references_any("y=a*x", &[Symbol('b'), Symbol('a')]));
        assert!(!references_any("y=x", &[Symbol('a')]));
    }

    #[test]
    fn function_argument_is_local() {
        let binding = Binding::Function {
            name: Symbol('f'),
            argument: Symbol::Y,
        };
        assert_eq!(
            free_references(binding, &[Symbol::Y, Symbol('c'), Symbol('f')]),
            vec![Symbol('c')]
        );
    }
}

//! Name Resolver: classifies equation text and validates its binding.
//!
//! Classification is purely textual over the normalized text:
//! - `N(a)=body` with `a` a plot axis is a function definition of `N`;
//! - `N=body` is a variable definition of `N`, unless `N` is a plot axis, in
//!   which case the text is an ordinary relation such as `y=x`;
//! - anything else is an implicit relation.
//!
//! [`resolve`] then checks the binding against the registry without touching
//! it. The Edit Protocol applies the binding only once this returns `Ok`.

use gcalc_core::{Binding, EntityRegistry, EquationId, Namespace, Symbol};
use serde::Serialize;

use crate::diagnostics::ValidationError;
use crate::scanner::{free_symbols, normalize};
use crate::tracker::free_references;

/// The binding implied by an equation's text, before registry checks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub binding: Binding,
    /// Normalized text to the right of the binding's `=`, or the whole
    /// normalized text for implicit relations.
    pub body: String,
}

/// A binding that passed every validation rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution {
    pub binding: Binding,
    pub body: String,
    /// Free symbols of the body, reserved ones included.
    pub free: Vec<Symbol>,
    /// Free global references: `free` minus reserved symbols, the bound name
    /// and the function argument.
    pub references: Vec<Symbol>,
}

/// Classifies `text` as a function, variable or implicit relation.
///
/// Fails only when the text binds a reserved name.
pub fn classify(text: &str) -> Result<Classification, ValidationError> {
    let normalized = normalize(text);
    let head: Vec<char> = normalized.chars().take(5).collect();

    match head.as_slice() {
        [name, '(', arg, ')', '=', ..] if name.is_ascii_alphabetic() && Symbol(*arg).is_axis() => {
            let name = Symbol(*name);
            if name.is_reserved() {
                return Err(ValidationError::ReservedName {
                    name,
                    namespace: Namespace::Function,
                });
            }
            Ok(Classification {
                binding: Binding::Function {
                    name,
                    argument: Symbol(*arg),
                },
                body: normalized[5..].to_string(),
            })
        }
        [name, '=', ..] if name.is_ascii_alphabetic() => {
            let name = Symbol(*name);
            if name.is_axis() {
                return Ok(Classification {
                    binding: Binding::Implicit,
                    body: normalized,
                });
            }
            if name.is_reserved() {
                return Err(ValidationError::ReservedName {
                    name,
                    namespace: Namespace::Variable,
                });
            }
            Ok(Classification {
                binding: Binding::Variable { name },
                body: normalized[2..].to_string(),
            })
        }
        _ => Ok(Classification {
            binding: Binding::Implicit,
            body: normalized,
        }),
    }
}

/// Classifies `text` for equation `id` and validates the result against the
/// current registry.
pub fn resolve(
    registry: &EntityRegistry,
    id: EquationId,
    text: &str,
) -> Result<Resolution, ValidationError> {
    let Classification { binding, body } = classify(text)?;

    if let Some((name, namespace)) = binding.slot() {
        if let Some(owner) = registry.owner(name, namespace).filter(|owner| *owner != id) {
            return Err(ValidationError::DuplicateName {
                name,
                namespace,
                owner,
            });
        }
        let existing = namespace.other();
        if let Some(owner) = registry.owner(name, existing).filter(|owner| *owner != id) {
            return Err(ValidationError::NamespaceClash {
                name,
                existing,
                owner,
            });
        }
    }

    let free = free_symbols(&body);

    if let Some(name) = binding.bound_name() {
        if free.contains(&name) {
            return Err(ValidationError::NameUsedAsValue { name });
        }
    }

    if let Binding::Variable { name } = binding {
        if let Some(&axis) = free.iter().find(|s| s.is_axis()) {
            return Err(ValidationError::NonConstantVariable { name, axis });
        }
        if let Some(&function) = free
            .iter()
            .find(|s| registry.owner(**s, Namespace::Function).is_some())
        {
            return Err(ValidationError::FunctionUsedAsValue { name, function });
        }
    }

    let references = free_references(binding, &free);
    Ok(Resolution {
        binding,
        body,
        free,
        references,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binding(text: &str) -> Binding {
        classify(text).unwrap().binding
    }

    #[test]
    fn axis_assignment_is_implicit() {
        assert_eq!(binding("y=x"), Binding::Implicit);
        assert_eq!(binding("x=3"), Binding::Implicit);
        assert_eq!(binding("x^2+y^2=1"), Binding::Implicit);
    }

    #[test]
    fn function_definitions() {
        assert_eq!(
            binding(r"f\left(x\right)=x+1"),
            Binding::Function {
                name: Symbol('f'),
                argument: Symbol::X
            }
        );
        assert_eq!(
            binding("g(y)=y"),
            Binding::Function {
                name: Symbol('g'),
                argument: Symbol::Y
            }
        );
        // Non-axis argument is not a definition.
        assert_eq!(binding("f(t)=t"), Binding::Implicit);
        // Anchored at the start.
        assert_eq!(binding("2f(x)=x"), Binding::Implicit);
        assert_eq!(classify("f(x)=x+1").unwrap().body, "x+1");
    }

    #[test]
    fn variable_definitions() {
        assert_eq!(binding("a=3"), Binding::Variable { name: Symbol('a') });
        assert_eq!(classify("a = 3 + b").unwrap().body, "3+b");
        assert_eq!(binding("ab=3"), Binding::Implicit);
    }

    #[test]
    fn reserved_names_are_rejected() {
        assert!(matches!(
            classify("e=2"),
            Err(ValidationError::ReservedName {
                namespace: Namespace::Variable,
                ..
            })
        ));
        for text in ["x(x)=1", "y(x)=1", "e(y)=1"] {
            assert!(matches!(
                classify(text),
                Err(ValidationError::ReservedName {
                    namespace: Namespace::Function,
                    ..
                })
            ));
        }
    }

    #[test]
    fn duplicate_and_clash_against_registry() {
        let mut reg = EntityRegistry::new();
        let a = reg.create();
        let b = reg.create();
        reg.rebind(a, Binding::Variable { name: Symbol('f') })
            .unwrap();

        assert!(matches!(
            resolve(&reg, b, "f=4"),
            Err(ValidationError::DuplicateName { owner, .. }) if owner == a
        ));
        assert!(matches!(
            resolve(&reg, b, "f(x)=x"),
            Err(ValidationError::NamespaceClash {
                existing: Namespace::Variable,
                ..
            })
        ));
        // The owner itself may keep or reclassify its own name.
        assert!(resolve(&reg, a, "f=5").is_ok());
        assert!(resolve(&reg, a, "f(x)=x").is_ok());
    }

    #[test]
    fn own_name_in_body_is_rejected() {
        let reg = EntityRegistry::new();
        let id = EquationId(0);
        assert_eq!(
            resolve(&reg, id, "f(x)=f+x"),
            Err(ValidationError::NameUsedAsValue { name: Symbol('f') })
        );
        assert_eq!(
            resolve(&reg, id, "a=a+1"),
            Err(ValidationError::NameUsedAsValue { name: Symbol('a') })
        );
    }

    #[test]
    fn variables_must_be_constant() {
        let reg = EntityRegistry::new();
        assert_eq!(
            resolve(&reg, EquationId(0), "a=2y"),
            Err(ValidationError::NonConstantVariable {
                name: Symbol('a'),
                axis: Symbol::Y
            })
        );
    }

    #[test]
    fn variables_cannot_use_functions_as_values() {
        let mut reg = EntityRegistry::new();
        let f = reg.create();
        reg.rebind(
            f,
            Binding::Function {
                name: Symbol('g'),
                argument: Symbol::X,
            },
        )
        .unwrap();
        let a = reg.create();
        assert_eq!(
            resolve(&reg, a, "a=g+1"),
            Err(ValidationError::FunctionUsedAsValue {
                name: Symbol('a'),
                function: Symbol('g')
            })
        );
    }

    #[test]
    fn references_exclude_reserved_and_argument() {
        let reg = EntityRegistry::new();
        let res = resolve(&reg, EquationId(0), "f(x)=a*x+e^b").unwrap();
        assert_eq!(res.free, vec![Symbol('a'), Symbol::X, Symbol::E, Symbol('b')]);
        assert_eq!(res.references, vec![Symbol('a'), Symbol('b')]);

        let res = resolve(&reg, EquationId(0), "y=k x").unwrap();
        assert_eq!(res.references, vec![Symbol('k')]);
    }
}

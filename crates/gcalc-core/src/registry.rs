//! The entity registry: equations in display order plus the two name maps.
//!
//! [`EntityRegistry`] is the single owner of every [`Equation`] in a session.
//! Equations are kept in an [`IndexMap`] so iteration order is display order;
//! function and variable names are kept in two maps pointing back at the
//! owning equation id.
//!
//! The name maps are only ever written through [`EntityRegistry::rebind`] and
//! [`EntityRegistry::remove`], which keep them consistent with the binding
//! stored on each equation. [`EntityRegistry::check_consistency`] verifies the
//! invariant and is used heavily by tests.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::Serialize;

use crate::color::HslColor;
use crate::equation::{Binding, Equation};
use crate::error::CoreError;
use crate::id::EquationId;
use crate::symbol::{Namespace, Symbol};

/// How a [`EntityRegistry::rebind`] call changed the name maps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BindingChange {
    /// The name the equation binds after the call, if any.
    pub bound: Option<(Symbol, Namespace)>,
    /// True if `bound` was not held by this equation before the call.
    pub newly_bound: bool,
    /// A name the equation held before the call and no longer holds.
    pub released: Option<(Symbol, Namespace)>,
}

impl BindingChange {
    /// Returns true if the set of defined names changed.
    pub fn mutated_names(&self) -> bool {
        self.newly_bound || self.released.is_some()
    }
}

/// Authoritative collection of equations, function names and variable names.
#[derive(Debug, Clone)]
pub struct EntityRegistry {
    /// All equations in display order.
    equations: IndexMap<EquationId, Equation>,
    /// Function name -> owning equation.
    function_names: HashMap<Symbol, EquationId>,
    /// Variable name -> owning equation.
    variable_names: HashMap<Symbol, EquationId>,
    /// Counter for generating the next EquationId.
    next_id: u32,
    /// Color handed to the next created equation.
    next_color: HslColor,
}

impl EntityRegistry {
    pub fn new() -> Self {
        EntityRegistry {
            equations: IndexMap::new(),
            function_names: HashMap::new(),
            variable_names: HashMap::new(),
            next_id: 0,
            next_color: HslColor::default(),
        }
    }

    /// Creates a new empty implicit equation at the end of the list.
    pub fn create(&mut self) -> EquationId {
        let id = EquationId(self.next_id);
        self.next_id += 1;

        let color = self.next_color;
        self.next_color = color.next_in_palette();

        self.equations.insert(id, Equation::new(id, color));
        id
    }

    pub fn get(&self, id: EquationId) -> Option<&Equation> {
        self.equations.get(&id)
    }

    pub fn equation(&self, id: EquationId) -> Result<&Equation, CoreError> {
        self.equations
            .get(&id)
            .ok_or(CoreError::EquationNotFound { id })
    }

    pub fn equation_mut(&mut self, id: EquationId) -> Result<&mut Equation, CoreError> {
        self.equations
            .get_mut(&id)
            .ok_or(CoreError::EquationNotFound { id })
    }

    pub fn contains(&self, id: EquationId) -> bool {
        self.equations.contains_key(&id)
    }

    /// Iterates equations in display order.
    pub fn iter(&self) -> impl Iterator<Item = &Equation> {
        self.equations.values()
    }

    pub fn ids(&self) -> Vec<EquationId> {
        self.equations.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.equations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.equations.is_empty()
    }

    fn names(&self, namespace: Namespace) -> &HashMap<Symbol, EquationId> {
        match namespace {
            Namespace::Function => &self.function_names,
            Namespace::Variable => &self.variable_names,
        }
    }

    fn names_mut(&mut self, namespace: Namespace) -> &mut HashMap<Symbol, EquationId> {
        match namespace {
            Namespace::Function => &mut self.function_names,
            Namespace::Variable => &mut self.variable_names,
        }
    }

    /// The equation currently binding `name` in `namespace`.
    pub fn owner(&self, name: Symbol, namespace: Namespace) -> Option<EquationId> {
        self.names(namespace).get(&name).copied()
    }

    /// Returns true if `name` is bound in either namespace.
    pub fn is_defined(&self, name: Symbol) -> bool {
        self.function_names.contains_key(&name) || self.variable_names.contains_key(&name)
    }

    /// Bound function names, sorted.
    pub fn function_names(&self) -> Vec<Symbol> {
        let mut names: Vec<Symbol> = self.function_names.keys().copied().collect();
        names.sort();
        names
    }

    /// Bound variable names, sorted.
    pub fn variable_names(&self) -> Vec<Symbol> {
        let mut names: Vec<Symbol> = self.variable_names.keys().copied().collect();
        names.sort();
        names
    }

    /// Sets the binding of `id`, updating the name maps.
    ///
    /// Fails without touching anything if the new name is reserved or held by
    /// a different equation in either namespace. An equation moving its own
    /// name from one namespace to the other is allowed.
    pub fn rebind(&mut self, id: EquationId, binding: Binding) -> Result<BindingChange, CoreError> {
        let previous = self.equation(id)?.binding();

        if let Some((name, namespace)) = binding.slot() {
            if name.is_reserved() {
                return Err(CoreError::ReservedName { name });
            }
            for ns in [namespace, namespace.other()] {
                if let Some(owner) = self.owner(name, ns) {
                    if owner != id {
                        return Err(CoreError::NameAlreadyBound {
                            name,
                            namespace: ns,
                            owner,
                        });
                    }
                }
            }
        }

        let old_slot = previous.slot();
        let new_slot = binding.slot();

        let mut change = BindingChange {
            bound: new_slot,
            newly_bound: new_slot.is_some() && new_slot != old_slot,
            released: None,
        };

        if old_slot != new_slot {
            if let Some((name, namespace)) = old_slot {
                self.names_mut(namespace).remove(&name);
                change.released = Some((name, namespace));
            }
            if let Some((name, namespace)) = new_slot {
                self.names_mut(namespace).insert(name, id);
            }
        }

        self.equation_mut(id)?.set_binding(binding);
        Ok(change)
    }

    /// Removes an equation, releasing its name if it held one.
    pub fn remove(
        &mut self,
        id: EquationId,
    ) -> Result<(Equation, Option<(Symbol, Namespace)>), CoreError> {
        let equation = self
            .equations
            .shift_remove(&id)
            .ok_or(CoreError::EquationNotFound { id })?;

        let released = equation.binding().slot();
        if let Some((name, namespace)) = released {
            self.names_mut(namespace).remove(&name);
        }
        Ok((equation, released))
    }

    /// Verifies that both name maps agree with the equations' bindings.
    pub fn check_consistency(&self) -> Result<(), CoreError> {
        for namespace in [Namespace::Function, Namespace::Variable] {
            for (&name, &owner) in self.names(namespace) {
                let equation = self.get(owner).ok_or_else(|| CoreError::RegistryInconsistency {
                    reason: format!("{} '{}' points at missing equation {}", namespace, name, owner),
                })?;
                if equation.binding().slot() != Some((name, namespace)) {
                    return Err(CoreError::RegistryInconsistency {
                        reason: format!(
                            "{} '{}' points at equation {} which binds {:?}",
                            namespace,
                            name,
                            owner,
                            equation.binding()
                        ),
                    });
                }
                if self.owner(name, namespace.other()).is_some() {
                    return Err(CoreError::RegistryInconsistency {
                        reason: format!("'{}' is bound in both namespaces", name),
                    });
                }
            }
        }

        for equation in self.iter() {
            if let Some((name, namespace)) = equation.binding().slot() {
                if self.owner(name, namespace) != Some(equation.id()) {
                    return Err(CoreError::RegistryInconsistency {
                        reason: format!(
                            "equation {} binds {} '{}' but the map disagrees",
                            equation.id(),
                            namespace,
                            name
                        ),
                    });
                }
            }
        }

        Ok(())
    }
}

impl Default for EntityRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn function(name: char) -> Binding {
        Binding::Function {
            name: Symbol(name),
            argument: Symbol::X,
        }
    }

    fn variable(name: char) -> Binding {
        Binding::Variable { name: Symbol(name) }
    }

    #[test]
    fn ids_are_monotonic_and_never_reused() {
        let mut reg = EntityRegistry::new();
        let a = reg.create();
        let b = reg.create();
        reg.remove(b).unwrap();
        let c = reg.create();
        assert_eq!((a, b, c), (EquationId(0), EquationId(1), EquationId(2)));
    }

    #[test]
    fn colors_follow_the_palette() {
        let mut reg = EntityRegistry::new();
        let a = reg.create();
        let b = reg.create();
        assert_eq!(reg.equation(a).unwrap().color().hue, 0);
        assert_eq!(reg.equation(b).unwrap().color().hue, 49);
    }

    #[test]
    fn display_order_survives_removal() {
        let mut reg = EntityRegistry::new();
        let a = reg.create();
        let b = reg.create();
        let c = reg.create();
        reg.remove(b).unwrap();
        assert_eq!(reg.ids(), vec![a, c]);
    }

    #[test]
    fn bind_and_release() {
        let mut reg = EntityRegistry::new();
        let id = reg.create();

        let change = reg.rebind(id, function('f')).unwrap();
        assert!(change.newly_bound);
        assert_eq!(reg.owner(Symbol('f'), Namespace::Function), Some(id));

        let change = reg.rebind(id, function('f')).unwrap();
        assert!(!change.newly_bound);
        assert!(!change.mutated_names());

        let change = reg.rebind(id, Binding::Implicit).unwrap();
        assert_eq!(change.released, Some((Symbol('f'), Namespace::Function)));
        assert!(!reg.is_defined(Symbol('f')));
        reg.check_consistency().unwrap();
    }

    #[test]
    fn rename_releases_old_name() {
        let mut reg = EntityRegistry::new();
        let id = reg.create();
        reg.rebind(id, variable('a')).unwrap();
        let change = reg.rebind(id, variable('c')).unwrap();
        assert_eq!(change.released, Some((Symbol('a'), Namespace::Variable)));
        assert_eq!(change.bound, Some((Symbol('c'), Namespace::Variable)));
        assert_eq!(reg.variable_names(), vec![Symbol('c')]);
    }

    #[test]
    fn duplicate_binding_is_rejected_without_mutation() {
        let mut reg = EntityRegistry::new();
        let a = reg.create();
        let b = reg.create();
        reg.rebind(a, variable('f')).unwrap();

        let err = reg.rebind(b, function('f')).unwrap_err();
        assert!(matches!(
            err,
            CoreError::NameAlreadyBound {
                namespace: Namespace::Variable,
                ..
            }
        ));
        assert_eq!(reg.variable_names(), vec![Symbol('f')]);
        assert!(reg.function_names().is_empty());
        assert_eq!(reg.equation(b).unwrap().binding(), Binding::Implicit);
    }

    #[test]
    fn equation_may_switch_namespace_for_its_own_name() {
        let mut reg = EntityRegistry::new();
        let a = reg.create();
        reg.rebind(a, variable('g')).unwrap();
        let change = reg.rebind(a, function('g')).unwrap();
        assert_eq!(change.released, Some((Symbol('g'), Namespace::Variable)));
        assert_eq!(reg.function_names(), vec![Symbol('g')]);
        assert!(reg.variable_names().is_empty());
        reg.check_consistency().unwrap();
    }

    #[test]
    fn reserved_names_never_enter_the_maps() {
        let mut reg = EntityRegistry::new();
        let a = reg.create();
        assert!(matches!(
            reg.rebind(a, variable('e')),
            Err(CoreError::ReservedName { .. })
        ));
        assert!(reg.variable_names().is_empty());
    }

    #[test]
    fn remove_releases_name() {
        let mut reg = EntityRegistry::new();
        let a = reg.create();
        reg.rebind(a, function('h')).unwrap();
        let (_, released) = reg.remove(a).unwrap();
        assert_eq!(released, Some((Symbol('h'), Namespace::Function)));
        assert!(!reg.is_defined(Symbol('h')));
        assert!(matches!(
            reg.remove(a),
            Err(CoreError::EquationNotFound { .. })
        ));
    }

    #[derive(Debug, Clone)]
    enum Op {
        Create,
        Bind(usize, Binding),
        Remove(usize),
    }

    fn binding_strategy() -> impl Strategy<Value = Binding> {
        let name = prop::sample::select(vec!['a', 'b', 'f', 'g', 'x', 'e']);
        prop_oneof![
            Just(Binding::Implicit),
            name.clone().prop_map(function),
            name.prop_map(variable),
        ]
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            Just(Op::Create),
            (0usize..6, binding_strategy()).prop_map(|(i, b)| Op::Bind(i, b)),
            (0usize..6).prop_map(Op::Remove),
        ]
    }

    proptest! {
        #[test]
        fn name_maps_stay_consistent(ops in prop::collection::vec(op_strategy(), 1..40)) {
            let mut reg = EntityRegistry::new();
            for op in ops {
                let ids = reg.ids();
                match op {
                    Op::Create => {
                        reg.create();
                    }
                    Op::Bind(i, binding) => {
                        if let Some(&id) = ids.get(i) {
                            let _ = reg.rebind(id, binding);
                        }
                    }
                    Op::Remove(i) => {
                        if let Some(&id) = ids.get(i) {
                            reg.remove(id).unwrap();
                        }
                    }
                }
                prop_assert!(reg.check_consistency().is_ok());
                for eq in reg.iter() {
                    prop_assert_eq!(
                        eq.bound_name().is_some(),
                        eq.kind() != crate::equation::EquationKind::Implicit
                    );
                    if let Some(name) = eq.bound_name() {
                        prop_assert!(!name.is_reserved());
                    }
                }
            }
        }
    }
}

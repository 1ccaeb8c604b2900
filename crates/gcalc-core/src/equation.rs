//! Equation rows and their derived binding.
//!
//! An [`Equation`] stores the last [`Binding`] the resolver produced for its
//! text; [`EquationKind`] and the bound name are always derived from it, so
//! "bound name set iff kind is Function or Variable" holds by construction.
//!
//! The registered binding only changes once a text passes every check, so it
//! can lag behind the text. The classification of the current text is kept
//! separately as the text kind.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::artifact::CompiledArtifact;
use crate::color::HslColor;
use crate::id::EquationId;
use crate::symbol::{Namespace, Symbol};

/// What an equation's text defines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Binding {
    /// A relation over the axis symbols; binds nothing.
    Implicit,
    /// `name(argument) = body`.
    Function { name: Symbol, argument: Symbol },
    /// `name = body`.
    Variable { name: Symbol },
}

/// The classification of an equation, without payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EquationKind {
    Implicit,
    Function,
    Variable,
}

impl Binding {
    pub fn kind(&self) -> EquationKind {
        match self {
            Binding::Implicit => EquationKind::Implicit,
            Binding::Function { .. } => EquationKind::Function,
            Binding::Variable { .. } => EquationKind::Variable,
        }
    }

    pub fn bound_name(&self) -> Option<Symbol> {
        match self {
            Binding::Implicit => None,
            Binding::Function { name, .. } | Binding::Variable { name } => Some(*name),
        }
    }

    pub fn namespace(&self) -> Option<Namespace> {
        match self {
            Binding::Implicit => None,
            Binding::Function { .. } => Some(Namespace::Function),
            Binding::Variable { .. } => Some(Namespace::Variable),
        }
    }

    /// The locally bound argument of a function definition.
    pub fn argument(&self) -> Option<Symbol> {
        match self {
            Binding::Function { argument, .. } => Some(*argument),
            _ => None,
        }
    }

    /// The `(name, namespace)` pair this binding occupies in the registry.
    pub fn slot(&self) -> Option<(Symbol, Namespace)> {
        self.bound_name().zip(self.namespace())
    }
}

/// One user-entered row.
#[derive(Debug, Clone)]
pub struct Equation {
    id: EquationId,
    text: String,
    binding: Binding,
    /// Classification of `text`; `None` when it binds a reserved name.
    text_kind: Option<EquationKind>,
    compiled: Option<Arc<CompiledArtifact>>,
    result: Option<f64>,
    color: HslColor,
    visible: bool,
    error: Option<String>,
    undefined_refs: SmallVec<[Symbol; 4]>,
    revision: u64,
}

impl Equation {
    pub(crate) fn new(id: EquationId, color: HslColor) -> Self {
        Equation {
            id,
            text: String::new(),
            binding: Binding::Implicit,
            text_kind: Some(EquationKind::Implicit),
            compiled: None,
            result: None,
            color,
            visible: true,
            error: None,
            undefined_refs: SmallVec::new(),
            revision: 0,
        }
    }

    pub fn id(&self) -> EquationId {
        self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn binding(&self) -> Binding {
        self.binding
    }

    pub fn kind(&self) -> EquationKind {
        self.binding.kind()
    }

    pub fn bound_name(&self) -> Option<Symbol> {
        self.binding.bound_name()
    }

    pub fn text_kind(&self) -> Option<EquationKind> {
        self.text_kind
    }

    pub fn set_text_kind(&mut self, kind: Option<EquationKind>) {
        self.text_kind = kind;
    }

    pub fn compiled(&self) -> Option<&Arc<CompiledArtifact>> {
        self.compiled.as_ref()
    }

    pub fn result(&self) -> Option<f64> {
        self.result
    }

    pub fn color(&self) -> HslColor {
        self.color
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn undefined_refs(&self) -> &[Symbol] {
        &self.undefined_refs
    }

    /// Attempt counter; bumped on every edit and every refresh.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Replaces the text and returns the new revision.
    pub fn set_text(&mut self, text: impl Into<String>) -> u64 {
        self.text = text.into();
        self.revision += 1;
        self.revision
    }

    /// Starts a new attempt on the unchanged text; any output still in
    /// flight for an earlier revision becomes stale.
    pub fn touch(&mut self) -> u64 {
        self.revision += 1;
        self.revision
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Attaches an error and drops any output of the previous text.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
        self.clear_output();
    }

    /// Records unresolved references. A non-empty set drops previous output
    /// because the current text cannot be compiled.
    pub fn set_undefined_refs(&mut self, refs: impl IntoIterator<Item = Symbol>) {
        let mut refs: SmallVec<[Symbol; 4]> = refs.into_iter().collect();
        refs.sort();
        refs.dedup();
        if !refs.is_empty() {
            self.clear_output();
        }
        self.undefined_refs = refs;
    }

    /// Stores a renderable artifact.
    pub fn set_compiled(&mut self, artifact: CompiledArtifact) {
        self.compiled = Some(Arc::new(artifact));
        self.result = None;
    }

    /// Stores a scalar result; the equation is shown, not drawn.
    pub fn set_result(&mut self, value: f64) {
        self.compiled = None;
        self.result = Some(value);
    }

    pub fn clear_output(&mut self) {
        self.compiled = None;
        self.result = None;
    }

    pub fn toggle_visible(&mut self) -> bool {
        self.visible = !self.visible;
        self.visible
    }

    pub(crate) fn set_binding(&mut self, binding: Binding) {
        self.binding = binding;
    }

    pub fn view(&self) -> EquationView {
        EquationView {
            id: self.id,
            text: self.text.clone(),
            kind: self.kind(),
            text_kind: self.text_kind,
            bound_name: self.bound_name(),
            color: self.color,
            css_color: self.color.css(),
            visible: self.visible,
            has_error: self.has_error(),
            error: self.error.clone(),
            undefined_refs: self.undefined_refs.to_vec(),
            result: self.result,
            result_display: self.result.map(format_result),
            renderable: self.compiled.is_some(),
        }
    }
}

/// Serializable read-only snapshot of an equation for the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquationView {
    pub id: EquationId,
    pub text: String,
    /// Kind of the registered binding.
    pub kind: EquationKind,
    /// Kind of the current text, which differs from `kind` while the text
    /// fails its checks.
    pub text_kind: Option<EquationKind>,
    pub bound_name: Option<Symbol>,
    pub color: HslColor,
    pub css_color: String,
    pub visible: bool,
    pub has_error: bool,
    pub error: Option<String>,
    pub undefined_refs: Vec<Symbol>,
    pub result: Option<f64>,
    pub result_display: Option<String>,
    pub renderable: bool,
}

/// Formats a scalar result with at most six fractional digits, trimming
/// trailing zeros.
pub fn format_result(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let fixed = format!("{:.6}", value);
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    match trimmed {
        "-0" => "0".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::Instruction;

    fn artifact() -> CompiledArtifact {
        CompiledArtifact::new("", vec![Instruction::PushX, Instruction::Store]).unwrap()
    }

    #[test]
    fn bound_name_follows_binding() {
        assert_eq!(Binding::Implicit.bound_name(), None);
        let f = Binding::Function {
            name: Symbol('f'),
            argument: Symbol::X,
        };
        assert_eq!(f.bound_name(), Some(Symbol('f')));
        assert_eq!(f.kind(), EquationKind::Function);
        assert_eq!(f.argument(), Some(Symbol::X));
        assert_eq!(
            Binding::Variable { name: Symbol('a') }.slot(),
            Some((Symbol('a'), Namespace::Variable))
        );
    }

    #[test]
    fn new_equation_is_empty_implicit() {
        let eq = Equation::new(EquationId(0), HslColor::default());
        assert_eq!(eq.kind(), EquationKind::Implicit);
        assert_eq!(eq.text(), "");
        assert!(eq.visible());
        assert!(!eq.has_error());
        assert!(eq.compiled().is_none());
    }

    #[test]
    fn set_text_bumps_revision() {
        let mut eq = Equation::new(EquationId(0), HslColor::default());
        assert_eq!(eq.set_text("y=x"), 1);
        assert_eq!(eq.set_text("y=2x"), 2);
        assert_eq!(eq.touch(), 3);
        assert_eq!(eq.text(), "y=2x");
    }

    #[test]
    fn fail_drops_output() {
        let mut eq = Equation::new(EquationId(0), HslColor::default());
        eq.set_compiled(artifact());
        eq.fail("boom");
        assert!(eq.compiled().is_none());
        assert_eq!(eq.error(), Some("boom"));
        eq.clear_error();
        assert!(!eq.has_error());
    }

    #[test]
    fn undefined_refs_are_sorted_and_drop_output() {
        let mut eq = Equation::new(EquationId(0), HslColor::default());
        eq.set_compiled(artifact());
        eq.set_undefined_refs([Symbol('b'), Symbol('a'), Symbol('b')]);
        assert_eq!(eq.undefined_refs(), &[Symbol('a'), Symbol('b')]);
        assert!(eq.compiled().is_none());
    }

    #[test]
    fn scalar_result_replaces_artifact() {
        let mut eq = Equation::new(EquationId(0), HslColor::default());
        eq.set_compiled(artifact());
        eq.set_result(3.0);
        assert!(eq.compiled().is_none());
        assert_eq!(eq.result(), Some(3.0));
    }

    #[test]
    fn result_formatting() {
        assert_eq!(format_result(3.0), "3");
        assert_eq!(format_result(1.5), "1.5");
        assert_eq!(format_result(1.0 / 3.0), "0.333333");
        assert_eq!(format_result(-0.0000001), "0");
        assert_eq!(format_result(-2.25), "-2.25");
    }

    #[test]
    fn view_snapshot() {
        let mut eq = Equation::new(EquationId(2), HslColor::palette(98));
        eq.set_text("a=3");
        eq.set_binding(Binding::Variable { name: Symbol('a') });
        eq.set_text_kind(Some(EquationKind::Variable));
        eq.set_result(3.0);
        insta::assert_json_snapshot!(eq.view(), @r###"
        {
          "id": 2,
          "text": "a=3",
          "kind": "variable",
          "text_kind": "variable",
          "bound_name": "a",
          "color": {
            "hue": 98,
            "saturation": 69,
            "lightness": 69
          },
          "css_color": "hsl(98 69% 69%)",
          "visible": true,
          "has_error": false,
          "error": null,
          "undefined_refs": [],
          "result": 3.0,
          "result_display": "3",
          "renderable": false
        }
        "###);
    }
}

//! Free-symbol extraction over LaTeX equation text.
//!
//! [`free_symbols`] returns every glyph the math input would render as a
//! variable, in order of first appearance. Operator names (`\sin`, or `sin`
//! typed directly and auto-promoted), the contents of `\operatorname{..}`,
//! layout commands such as `\left` and `\frac`, and the constant `\pi` are not
//! variables. Greek letter commands map to their glyph.

use gcalc_core::Symbol;

/// Operator names promoted automatically when typed as plain letters.
///
/// Sorted longest first so `cosec` wins over `cos` and `cotan` over `cos`.
const AUTO_OPERATORS: [&str; 14] = [
    "cosec", "cotan", "floor", "sqrt", "ceil", "sin", "cos", "tan", "sec", "csc", "mod", "abs",
    "log", "ln",
];

/// Greek letter commands that render as a variable glyph.
const GREEK: [(&str, char); 4] = [
    ("theta", 'θ'),
    ("rho", 'ρ'),
    ("phi", 'φ'),
    ("lambda", 'λ'),
];

/// Removes whitespace and the `\left`/`\right` delimiter sizing commands.
///
/// The result is what pattern matching in the resolver operates on, so
/// `f\left(x\right) = x` and `f(x)=x` normalize identically. A single space
/// survives where it ends a command name before a letter (`\sin x`).
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    let mut after_command = false;
    while let Some(c) = rest.chars().next() {
        if c == '\\' {
            let command = command_name(&rest[1..]);
            rest = &rest[1 + command.len()..];
            after_command = false;
            if command == "left" || command == "right" {
                continue;
            }
            out.push('\\');
            out.push_str(command);
            after_command = !command.is_empty();
            continue;
        }
        if c.is_whitespace() {
            rest = rest.trim_start();
            if after_command && rest.starts_with(|n: char| n.is_ascii_alphabetic()) {
                out.push(' ');
            }
            after_command = false;
            continue;
        }
        out.push(c);
        after_command = false;
        rest = &rest[c.len_utf8()..];
    }
    out
}

/// Extracts the free symbols of `text`, deduplicated, in first-appearance
/// order. Reserved symbols are included; callers decide what to exclude.
pub fn free_symbols(text: &str) -> Vec<Symbol> {
    let mut symbols = Vec::new();
    let mut push = |symbol: Symbol| {
        if !symbols.contains(&symbol) {
            symbols.push(symbol);
        }
    };

    let mut rest = text;
    while let Some(c) = rest.chars().next() {
        if c == '\\' {
            let command = command_name(&rest[1..]);
            if command.is_empty() {
                // Escaped punctuation such as `\{` or `\,`.
                let skip = rest[1..].chars().next().map_or(0, char::len_utf8);
                rest = &rest[1 + skip..];
                continue;
            }
            rest = &rest[1 + command.len()..];

            if command == "operatorname" {
                rest = skip_group(rest);
            } else if let Some(&(_, glyph)) = GREEK.iter().find(|(name, _)| *name == command) {
                push(Symbol(glyph));
            }
            continue;
        }

        if c.is_ascii_alphabetic() {
            if let Some(op) = AUTO_OPERATORS.iter().find(|op| rest.starts_with(**op)) {
                rest = &rest[op.len()..];
                continue;
            }
            push(Symbol(c));
        }
        rest = &rest[c.len_utf8()..];
    }

    symbols
}

/// The run of ASCII letters at the start of `s`.
fn command_name(s: &str) -> &str {
    let end = s
        .char_indices()
        .find(|(_, c)| !c.is_ascii_alphabetic())
        .map_or(s.len(), |(i, _)| i);
    &s[..end]
}

/// Skips one `{...}` group (with nesting) if `s` starts with one.
fn skip_group(s: &str) -> &str {
    let trimmed = s.trim_start();
    if !trimmed.starts_with('{') {
        return s;
    }
    let mut depth = 0usize;
    for (i, c) in trimmed.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return &trimmed[i + 1..];
                }
            }
            _ => {}
        }
    }
    ""
}

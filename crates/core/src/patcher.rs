//! Best-effort repair of generated components: declare properties the
//! template reads or writes but the script never declares.
//!
//! Three rules find referenced names, each a pure function over the
//! template's attributes:
//!
//! - click assignment: `(click)="name = ..."`
//! - conditional render: `*ngIf="name..."` (not `style`, `class`, `src`)
//! - toggle: `a = !b` anywhere in a binding
//!
//! Text interpolation (`{{label}}`) and anything inside method bodies is
//! invisible to these rules. A miss leaves the component non-compiling,
//! which only shows up at review time.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;

use crate::markup::{attributes, tokenize, Attribute, Token};

const NGIF_EXCLUDED: [&str; 3] = ["style", "class", "src"];
const TS_MODIFIERS: [&str; 7] = [
    "public",
    "private",
    "protected",
    "readonly",
    "static",
    "override",
    "declare",
];

/// Type chosen for a synthesized declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    Boolean,
    Text,
}

// ── Reference rules ──────────────────────────────────────────────────────────

/// `(click)="name = ..."` → `name`.
pub fn click_assignment_refs(attrs: &[Attribute<'_>]) -> BTreeSet<String> {
    attrs
        .iter()
        .filter(|a| a.name == "(click)")
        .filter_map(|a| match tokenize(a.value).as_slice() {
            [Token::Ident(name), Token::Assign, ..] => Some(name.to_string()),
            _ => None,
        })
        .collect()
}

/// `*ngIf="name..."` → leading identifier, minus attribute-like names.
pub fn conditional_render_refs(attrs: &[Attribute<'_>]) -> BTreeSet<String> {
    attrs
        .iter()
        .filter(|a| a.name == "*ngIf")
        .filter_map(|a| match tokenize(a.value).first() {
            Some(Token::Ident(name)) if !NGIF_EXCLUDED.contains(name) => Some(name.to_string()),
            _ => None,
        })
        .collect()
}

/// `a = !b` in any binding → `a` and `b`.
pub fn toggle_refs(attrs: &[Attribute<'_>]) -> BTreeSet<String> {
    let mut refs = BTreeSet::new();
    for attr in attrs {
        for (target, source) in toggles(&tokenize(attr.value)) {
            refs.insert(target.to_string());
            refs.insert(source.to_string());
        }
    }
    refs
}

fn toggles<'a>(tokens: &[Token<'a>]) -> Vec<(&'a str, &'a str)> {
    tokens
        .windows(4)
        .filter_map(|w| match w {
            [Token::Ident(a), Token::Assign, Token::Not, Token::Ident(b)] => Some((*a, *b)),
            _ => None,
        })
        .collect()
}

/// Union of all three rules, without `constructor`.
pub fn referenced_properties(markup: &str) -> BTreeSet<String> {
    let attrs = attributes(markup);
    let mut refs = click_assignment_refs(&attrs);
    refs.extend(conditional_render_refs(&attrs));
    refs.extend(toggle_refs(&attrs));
    refs.remove("constructor");
    refs
}

/// Boolean when toggled in place (`name = !name`) or used as a bare
/// `*ngIf="name"`; text otherwise.
pub fn property_kind(name: &str, markup: &str) -> PropertyKind {
    let attrs = attributes(markup);
    let bare_condition = attrs
        .iter()
        .any(|a| a.name == "*ngIf" && a.value.trim() == name);
    let self_toggle = attrs
        .iter()
        .any(|a| toggles(&tokenize(a.value)).iter().any(|(t, s)| *t == name && *s == name));

    if bare_condition || self_toggle {
        PropertyKind::Boolean
    } else {
        PropertyKind::Text
    }
}

// ── Script side ──────────────────────────────────────────────────────────────

/// Names that open a script line as `name:` or `name =`, after any access
/// modifiers or a single leading decorator.
pub fn declared_names(script: &str) -> BTreeSet<String> {
    script.lines().filter_map(line_declaration).collect()
}

fn line_declaration(line: &str) -> Option<String> {
    let mut rest = line.trim_start();

    if let Some(after_at) = rest.strip_prefix('@') {
        let close = after_at.find(')')?;
        rest = after_at[close + 1..].trim_start();
    }

    loop {
        let word_len = rest.find(|c: char| !(c.is_alphanumeric() || c == '_'))?;
        if word_len == 0 {
            return None;
        }
        let (word, tail) = rest.split_at(word_len);
        let tail = tail.trim_start();
        if TS_MODIFIERS.contains(&word) && tail.starts_with(|c: char| c.is_alphabetic() || c == '_') {
            rest = tail;
            continue;
        }
        let tail = tail.strip_prefix('?').unwrap_or(tail);
        return match tail.chars().next() {
            Some(':') | Some('=') => Some(word.to_string()),
            _ => None,
        };
    }
}

fn class_opening() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"export\s+class\s+\w+Component\b[^{]*\{")
            .expect("class opening pattern is valid")
    })
}

/// Render the declaration line for one property.
pub fn declaration(name: &str, kind: PropertyKind) -> String {
    match kind {
        PropertyKind::Boolean => format!("  {}: boolean = false;", name),
        PropertyKind::Text => format!("  {} = '';", name),
    }
}

// ── Entry point ──────────────────────────────────────────────────────────────

/// Insert declarations for every referenced-but-undeclared property right
/// after the component class's opening brace. Returns the script unchanged
/// when nothing is missing or no class declaration is found.
pub fn patch_properties(script: &str, markup: &str) -> String {
    let existing = declared_names(script);
    let missing: Vec<String> = referenced_properties(markup)
        .into_iter()
        .filter(|name| !existing.contains(name))
        .collect();

    if missing.is_empty() {
        tracing::debug!("all template properties already declared");
        return script.to_string();
    }

    let Some(opening) = class_opening().find(script) else {
        tracing::warn!(
            missing = %missing.join(", "),
            "could not find component class declaration; properties not injected"
        );
        return script.to_string();
    };

    let declarations: Vec<String> = missing
        .iter()
        .map(|name| declaration(name, property_kind(name, markup)))
        .collect();

    tracing::info!(
        count = missing.len(),
        properties = %missing.join(", "),
        "injected missing properties"
    );

    let at = opening.end();
    format!(
        "{}\n{}\n{}",
        &script[..at],
        declarations.join("\n"),
        &script[at..]
    )
}

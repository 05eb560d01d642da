//! Hand-rolled scanners for native type strings.

use std::sync::LazyLock;

use regex::Regex;

static TYPE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^\s*([^(]+?)\s*(?:\((.*)\)\s*(.*?))?\s*$").expect("valid type pattern")
});

const MODIFIERS: [&str; 3] = ["unsigned", "signed", "zerofill"];

/// A native type string split into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeType {
    /// Lower-cased type name, e.g. `varchar` or `double precision`.
    pub base: String,
    /// Text between the parentheses, if any.
    pub args: Option<String>,
    /// Trailing modifiers such as `unsigned`, lower-cased.
    pub modifiers: Vec<String>,
}

impl NativeType {
    /// Whether a modifier is present.
    #[must_use]
    pub fn has_modifier(&self, modifier: &str) -> bool {
        self.modifiers.iter().any(|m| m == modifier)
    }

    /// Reads `LEN[,PRECISION]` from the arguments.
    ///
    /// Returns `None` when the arguments are not numeric.
    #[must_use]
    pub fn length_and_precision(&self) -> Option<(u64, u32)> {
        let args = self.args.as_deref()?;
        let mut parts = args.split(',').map(str::trim);
        let length = parts.next()?.parse().ok()?;
        let precision = match parts.next() {
            Some(p) => p.parse().ok()?,
            None => 0,
        };
        if parts.next().is_some() {
            return None;
        }
        Some((length, precision))
    }
}

/// Splits a native type string such as `decimal(10,2) unsigned`.
#[must_use]
pub fn parse_native_type(raw: &str) -> Option<NativeType> {
    let caps = TYPE_PATTERN.captures(raw)?;
    let mut words: Vec<String> = caps
        .get(1)?
        .as_str()
        .split_whitespace()
        .map(str::to_ascii_lowercase)
        .collect();
    let mut modifiers: Vec<String> = Vec::new();
    while words.len() > 1 && words.last().is_some_and(|w| MODIFIERS.contains(&w.as_str())) {
        if let Some(word) = words.pop() {
            modifiers.insert(0, word);
        }
    }
    if let Some(rest) = caps.get(3) {
        modifiers.extend(rest.as_str().split_whitespace().map(str::to_ascii_lowercase));
    }
    Some(NativeType {
        base: words.join(" "),
        args: caps.get(2).map(|m| m.as_str().to_string()),
        modifiers,
    })
}

/// Scans a list of single-quoted values such as `'a,b','c''d'`.
///
/// A doubled quote inside a value is a literal quote, and commas inside
/// quotes belong to the value. Both MySQL column types and Oracle check
/// conditions are rendered by their catalogs with this escaping.
pub fn scan_quoted_list(list: &str) -> Result<Vec<String>, String> {
    let mut values = Vec::new();
    let mut chars = list.chars().peekable();
    loop {
        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }
        match chars.next() {
            None if values.is_empty() => return Ok(values),
            Some('\'') => {}
            Some(other) => return Err(format!("expected a quoted value, found '{other}'")),
            None => return Err(String::from("expected a quoted value after ','")),
        }

        let mut value = String::new();
        loop {
            match chars.next() {
                None => return Err(format!("unterminated quoted value '{value}")),
                Some('\'') if chars.peek() == Some(&'\'') => {
                    chars.next();
                    value.push('\'');
                }
                Some('\'') => break,
                Some(c) => value.push(c),
            }
        }
        values.push(value);

        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }
        match chars.next() {
            None => return Ok(values),
            Some(',') => {}
            Some(other) => return Err(format!("expected ',' between values, found '{other}'")),
        }
    }
}

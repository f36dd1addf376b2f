// ABOUTME: Canonical forms for column types and default expressions
// ABOUTME: Resolves engine aliases so semantically identical definitions compare equal

use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

/// A parenthesized bare literal or identifier that is not a call argument list.
static SIMPLE_PARENS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(^|[^\w])\(\s*(-?[\w.]+|'[^']*')\s*\)").expect("valid regex")
});

/// Engine spellings and their canonical names. Lookup happens after
/// lower-casing and whitespace collapsing, with any modifier removed.
const TYPE_ALIASES: &[(&str, &str)] = &[
    ("int", "integer"),
    ("int4", "integer"),
    ("serial", "integer"),
    ("serial4", "integer"),
    ("int8", "bigint"),
    ("serial8", "bigint"),
    ("bigserial", "bigint"),
    ("int2", "smallint"),
    ("serial2", "smallint"),
    ("smallserial", "smallint"),
    ("character varying", "varchar"),
    ("character", "char"),
    ("bpchar", "char"),
    ("decimal", "numeric"),
    ("float", "double precision"),
    ("float8", "double precision"),
    ("float4", "real"),
    ("bool", "boolean"),
    ("timestamp without time zone", "timestamp"),
    ("timestamp with time zone", "timestamptz"),
    ("time without time zone", "time"),
    ("time with time zone", "timetz"),
    ("bit varying", "varbit"),
];

/// Words that may continue a multi-word type name after a cast operator.
const TYPE_CONTINUATIONS: &[&str] = &["varying", "precision", "without", "with", "time", "zone"];

/// A column type split into its parts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedType {
    /// Canonical base name, e.g. `varchar`.
    pub base: String,
    /// Contents of the modifier parentheses with blanks removed, e.g. `10,2`.
    pub modifier: Option<String>,
    /// Number of array dimensions.
    pub array_dims: usize,
}

impl ParsedType {
    pub fn parse(raw: &str) -> Self {
        let mut text = collapse_whitespace(&raw.to_lowercase());

        let mut array_dims = 0;
        while let Some(open) = text.rfind('[') {
            if !text.ends_with(']') {
                break;
            }
            text.truncate(open);
            text = text.trim_end().to_string();
            array_dims += 1;
        }
        if array_dims == 0 && text.len() > 1 && text.starts_with('_') {
            // pg_type names array types with a leading underscore
            text.remove(0);
            array_dims = 1;
        }

        let (name, modifier) = match (text.find('('), text.rfind(')')) {
            (Some(open), Some(close)) if open < close => {
                let inner: String = text[open + 1..close]
                    .chars()
                    .filter(|c| !c.is_whitespace())
                    .collect();
                let name = format!("{} {}", text[..open].trim(), text[close + 1..].trim());
                (collapse_whitespace(&name), Some(inner))
            }
            _ => (text, None),
        };

        let mut modifier = modifier.filter(|m| !m.is_empty());

        // float(p) is real for p <= 24 and double precision above that
        if name == "float" {
            if let Some(precision) = modifier.as_deref().and_then(|m| m.parse::<u32>().ok()) {
                let base = if precision <= 24 { "real" } else { "double precision" };
                return Self {
                    base: base.to_string(),
                    modifier: None,
                    array_dims,
                };
            }
        }

        let base = TYPE_ALIASES
            .iter()
            .find(|(alias, _)| *alias == name)
            .map(|(_, canonical)| canonical.to_string())
            .unwrap_or(name);

        if base == "double precision" || base == "real" {
            modifier = None;
        }

        Self {
            base,
            modifier,
            array_dims,
        }
    }
}

impl fmt::Display for ParsedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.base)?;
        if let Some(modifier) = &self.modifier {
            write!(f, "({})", modifier)?;
        }
        for _ in 0..self.array_dims {
            f.write_str("[]")?;
        }
        Ok(())
    }
}

/// Canonical spelling of a column type.
///
/// ```
/// # use postgres_schema_drift::schema::normalize::canonical_type;
/// assert_eq!(canonical_type("character varying(255)"), "varchar(255)");
/// assert_eq!(canonical_type("timestamp(3) without time zone"), "timestamp(3)");
/// assert_eq!(canonical_type("_int4"), "integer[]");
/// assert_eq!(canonical_type("NUMERIC( 10, 2 )"), "numeric(10,2)");
/// ```
pub fn canonical_type(raw: &str) -> String {
    ParsedType::parse(raw).to_string()
}

/// Canonical spelling of a column default, or `None` for no default.
///
/// Casts on literals are dropped, keywords outside quotes are lower-cased,
/// and `NULL` means no default.
///
/// ```
/// # use postgres_schema_drift::schema::normalize::canonical_default;
/// assert_eq!(canonical_default(Some("'draft'::character varying")).as_deref(), Some("'draft'"));
/// let serial = canonical_default(Some("nextval('users_id_seq'::regclass)"));
/// assert_eq!(serial.as_deref(), Some("nextval('users_id_seq')"));
/// assert_eq!(canonical_default(Some("CURRENT_TIMESTAMP")).as_deref(), Some("now()"));
/// assert_eq!(canonical_default(Some("NULL::text")), None);
/// ```
pub fn canonical_default(raw: Option<&str>) -> Option<String> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }

    let value = strip_casts(&lower_outside_quotes(&collapse_outside_quotes(raw)));
    let value = strip_outer_parens(&unwrap_simple_parens(&value));

    if value == "null" {
        return None;
    }
    if value == "current_timestamp" || value == "transaction_timestamp()" {
        return Some("now()".to_string());
    }
    if let Some(inner) = value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')) {
        if !inner.is_empty() && inner.parse::<f64>().is_ok() {
            return Some(inner.to_string());
        }
    }
    Some(value)
}

/// Canonical spelling of a SQL expression such as a check condition.
///
/// ```
/// # use postgres_schema_drift::schema::normalize::canonical_expression;
/// assert_eq!(canonical_expression("((price > (0)::numeric))"), "price > 0");
/// assert_eq!(canonical_expression("PRICE  >  0"), "price > 0");
/// ```
pub fn canonical_expression(raw: &str) -> String {
    let value = strip_casts(&lower_outside_quotes(&collapse_outside_quotes(raw.trim())));
    strip_outer_parens(&unwrap_simple_parens(&value))
}

/// Type comparison rules: canonical spelling plus configured equivalence
/// classes (e.g. `json` and `jsonb` treated as one type).
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    equivalent: Vec<HashSet<String>>,
}

impl Normalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from groups of type names that should compare equal. Names are
    /// canonicalized, so `varchar` and `character varying` are the same entry.
    pub fn with_equivalent_types<I, G, S>(groups: I) -> Self
    where
        I: IntoIterator<Item = G>,
        G: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let equivalent = groups
            .into_iter()
            .map(|group| {
                group
                    .into_iter()
                    .map(|name| ParsedType::parse(name.as_ref()).base)
                    .collect::<HashSet<_>>()
            })
            .filter(|group| group.len() > 1)
            .collect();
        Self { equivalent }
    }

    pub fn canonical_type(&self, raw: &str) -> String {
        canonical_type(raw)
    }

    pub fn canonical_default(&self, raw: Option<&str>) -> Option<String> {
        canonical_default(raw)
    }

    /// Whether two declared types denote the same column type.
    ///
    /// Types in one equivalence class match regardless of their modifiers.
    pub fn types_equivalent(&self, a: &str, b: &str) -> bool {
        let a = ParsedType::parse(a);
        let b = ParsedType::parse(b);
        if a == b {
            return true;
        }
        a.array_dims == b.array_dims
            && self
                .equivalent
                .iter()
                .any(|group| group.contains(&a.base) && group.contains(&b.base))
    }

    pub fn defaults_equivalent(&self, a: Option<&str>, b: Option<&str>) -> bool {
        canonical_default(a) == canonical_default(b)
    }
}

/// Whether two types share a base name and differ only in size/precision.
pub fn differs_only_in_modifier(a: &str, b: &str) -> bool {
    let a = ParsedType::parse(a);
    let b = ParsedType::parse(b);
    a.base == b.base && a.array_dims == b.array_dims && a.modifier != b.modifier
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Run `f` over each maximal run of text outside single and double quotes.
fn map_outside_quotes(s: &str, mut f: impl FnMut(&str, &mut String)) -> String {
    let mut out = String::with_capacity(s.len());
    let mut run = String::new();
    let mut quote: Option<char> = None;

    for c in s.chars() {
        match quote {
            Some(q) => {
                out.push(c);
                if c == q {
                    quote = None;
                }
            }
            None if c == '\'' || c == '"' => {
                f(&run, &mut out);
                run.clear();
                out.push(c);
                quote = Some(c);
            }
            None => run.push(c),
        }
    }
    f(&run, &mut out);
    out
}

fn collapse_outside_quotes(s: &str) -> String {
    map_outside_quotes(s, |run, out| {
        let mut last_space = false;
        for c in run.chars() {
            if c.is_whitespace() {
                if !last_space {
                    out.push(' ');
                }
                last_space = true;
            } else {
                out.push(c);
                last_space = false;
            }
        }
    })
}

fn lower_outside_quotes(s: &str) -> String {
    map_outside_quotes(s, |run, out| out.push_str(&run.to_lowercase()))
}

/// Drop `::type` casts that follow a literal, a bare word, or a closing parenthesis.
fn strip_casts(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len());
    let mut quote: Option<char> = None;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if let Some(q) = quote {
            out.push(c);
            if c == q {
                quote = None;
            }
            i += 1;
            continue;
        }
        if c == '\'' || c == '"' {
            quote = Some(c);
            out.push(c);
            i += 1;
            continue;
        }

        let prev = out.chars().last();
        let castable =
            matches!(prev, Some(p) if p == '\'' || p == ')' || p.is_alphanumeric() || p == '_');
        if c == ':' && chars.get(i + 1) == Some(&':') && castable {
            i = skip_type_name(&chars, i + 2);
            continue;
        }

        out.push(c);
        i += 1;
    }
    out
}

/// Index just past the type name starting at `start`.
fn skip_type_name(chars: &[char], start: usize) -> usize {
    let is_word = |c: char| c.is_alphanumeric() || c == '_' || c == '.' || c == '"';
    let mut i = start;

    loop {
        while i < chars.len() && is_word(chars[i]) {
            i += 1;
        }
        if chars.get(i) == Some(&'(') {
            match chars[i..].iter().position(|&c| c == ')') {
                Some(offset) => i += offset + 1,
                None => return chars.len(),
            }
        }
        while chars.get(i) == Some(&'[') && chars.get(i + 1) == Some(&']') {
            i += 2;
        }
        if chars.get(i) == Some(&' ') {
            let word: String = chars[i + 1..].iter().take_while(|&&c| is_word(c)).collect();
            if TYPE_CONTINUATIONS.contains(&word.as_str()) {
                i += 1;
                continue;
            }
        }
        return i;
    }
}

/// `x > (0)` becomes `x > 0`; call parentheses such as `now()` stay.
fn unwrap_simple_parens(s: &str) -> String {
    let mut value = s.to_string();
    loop {
        let next = SIMPLE_PARENS.replace_all(&value, "${1}${2}").into_owned();
        if next == value {
            return value;
        }
        value = next;
    }
}

/// `(0)` becomes `0`; `(a) + (b)` is left alone.
fn strip_outer_parens(s: &str) -> String {
    let mut value = s.trim().to_string();
    while value.starts_with('(') && value.ends_with(')') {
        let mut depth = 0usize;
        let mut wraps = true;
        for (idx, c) in value.char_indices() {
            match c {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 && idx != value.len() - 1 {
                        wraps = false;
                        break;
                    }
                }
                _ => {}
            }
        }
        if !wraps {
            break;
        }
        value = value[1..value.len() - 1].trim().to_string();
    }
    value
}

//! Rule expressions: `required|string|max:255` parsed into typed rules at catalogue load.

use regex::Regex;

#[derive(Clone, Debug)]
pub enum Rule {
    Required,
    Sometimes,
    Present,
    Nullable,
    String,
    Integer,
    Boolean,
    /// Object or array (a PHP-style "array").
    Array,
    Email,
    Uuid,
    Date,
    /// `display` is the format as written in the catalogue; `pattern` its chrono equivalent.
    DateFormat { display: String, pattern: String },
    Max(u64),
    Min(u64),
    In(Vec<String>),
    Regex(Regex),
    Confirmed,
    Unique { type_name: String, field: String },
}

impl Rule {
    /// Rules that apply even when the field is absent.
    pub fn is_implicit(&self) -> bool {
        matches!(self, Rule::Required | Rule::Present)
    }
}

/// Rules for one field path, in expression order.
#[derive(Clone, Debug)]
pub struct FieldRules {
    /// Dotted path as written, e.g. `data.attributes.title`.
    pub path: String,
    pub segments: Vec<String>,
    pub rules: Vec<Rule>,
}

impl FieldRules {
    pub fn has(&self, pred: impl Fn(&Rule) -> bool) -> bool {
        self.rules.iter().any(pred)
    }

    pub fn is_sometimes(&self) -> bool {
        self.has(|r| matches!(r, Rule::Sometimes))
    }

    pub fn is_nullable(&self) -> bool {
        self.has(|r| matches!(r, Rule::Nullable))
    }

    pub fn is_confirmed(&self) -> bool {
        self.has(|r| matches!(r, Rule::Confirmed))
    }
}

/// Parse one field's expression. Errors carry the offending rule and a reason.
pub fn parse_field_rules(path: &str, expression: &str) -> Result<FieldRules, (String, String)> {
    let mut rules = Vec::new();
    for raw in expression.split('|').map(str::trim).filter(|s| !s.is_empty()) {
        rules.push(parse_rule(raw).map_err(|reason| (raw.to_string(), reason))?);
    }
    Ok(FieldRules {
        path: path.to_string(),
        segments: path.split('.').map(str::to_string).collect(),
        rules,
    })
}

fn parse_rule(raw: &str) -> Result<Rule, String> {
    let (name, arg) = match raw.split_once(':') {
        Some((n, a)) => (n.trim(), Some(a.trim())),
        None => (raw, None),
    };
    let rule = match (name, arg) {
        ("required", None) => Rule::Required,
        ("sometimes", None) => Rule::Sometimes,
        ("present", None) => Rule::Present,
        ("nullable", None) => Rule::Nullable,
        ("string", None) => Rule::String,
        ("integer", None) => Rule::Integer,
        ("boolean", None) => Rule::Boolean,
        ("array", None) => Rule::Array,
        ("email", None) => Rule::Email,
        ("uuid", None) => Rule::Uuid,
        ("date", None) => Rule::Date,
        ("confirmed", None) => Rule::Confirmed,
        ("date_format", Some(fmt)) => Rule::DateFormat {
            display: fmt.to_string(),
            pattern: php_date_format_to_chrono(fmt)?,
        },
        ("max", Some(n)) => Rule::Max(parse_bound(n)?),
        ("min", Some(n)) => Rule::Min(parse_bound(n)?),
        ("in", Some(list)) => Rule::In(list.split(',').map(|s| s.trim().to_string()).collect()),
        ("regex", Some(pattern)) => {
            let pattern = strip_delimiters(pattern);
            Rule::Regex(Regex::new(pattern).map_err(|e| e.to_string())?)
        }
        ("unique", Some(target)) => {
            let (type_name, field) = target
                .split_once(',')
                .ok_or_else(|| "unique expects <type>,<field>".to_string())?;
            Rule::Unique {
                type_name: type_name.trim().to_string(),
                field: field.trim().to_string(),
            }
        }
        (name, Some(_)) if is_argless(name) => return Err(format!("'{}' takes no argument", name)),
        (name, None) if needs_argument(name) => return Err(format!("'{}' requires an argument", name)),
        (name, _) => return Err(format!("unknown rule '{}'", name)),
    };
    Ok(rule)
}

fn is_argless(name: &str) -> bool {
    matches!(
        name,
        "required" | "sometimes" | "present" | "nullable" | "string" | "integer" | "boolean" | "array" | "email" | "uuid" | "date" | "confirmed"
    )
}

fn needs_argument(name: &str) -> bool {
    matches!(name, "date_format" | "max" | "min" | "in" | "regex" | "unique")
}

fn parse_bound(n: &str) -> Result<u64, String> {
    n.parse().map_err(|_| format!("'{}' is not a non-negative integer", n))
}

/// `/^[a-z]+$/` -> `^[a-z]+$`
fn strip_delimiters(pattern: &str) -> &str {
    if pattern.len() >= 2 && pattern.starts_with('/') && pattern.ends_with('/') {
        &pattern[1..pattern.len() - 1]
    } else {
        pattern
    }
}

/// Translate the PHP date format subset used in catalogues (`Y-m-d H:i:s`) to chrono's strftime syntax.
pub fn php_date_format_to_chrono(fmt: &str) -> Result<String, String> {
    let mut out = String::with_capacity(fmt.len() * 2);
    for c in fmt.chars() {
        match c {
            'Y' => out.push_str("%Y"),
            'y' => out.push_str("%y"),
            'm' => out.push_str("%m"),
            'd' => out.push_str("%d"),
            'H' => out.push_str("%H"),
            'i' => out.push_str("%M"),
            's' => out.push_str("%S"),
            '%' => out.push_str("%%"),
            c if c.is_ascii_alphabetic() => return Err(format!("unsupported date format character '{}'", c)),
            c => out.push(c),
        }
    }
    Ok(out)
}

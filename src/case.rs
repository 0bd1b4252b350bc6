//! Case conversion for URL segments: relationship names are camelCase in the catalogue
//! (e.g. "tasksAssigned") and kebab-case in links (e.g. "tasks-assigned").

/// Convert a single identifier from camelCase or snake_case to kebab-case.
/// e.g. "tasksAssigned" -> "tasks-assigned", "created_at" -> "created-at"
pub fn to_kebab_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    for (i, c) in s.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                out.push('-');
            }
            out.extend(c.to_lowercase());
        } else if c == '_' {
            out.push('-');
        } else {
            out.push(c);
        }
    }
    out
}

/// Convert a single identifier from kebab-case or snake_case to camelCase.
/// e.g. "tasks-assigned" -> "tasksAssigned", "user_id" -> "userId"
pub fn to_camel_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut capitalize_next = false;
    for c in s.chars() {
        if c == '_' || c == '-' {
            capitalize_next = true;
        } else if capitalize_next {
            out.extend(c.to_uppercase());
            capitalize_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

//! Sorting over whitelisted fields and page-number pagination.

use crate::config::ResourceTypeDescriptor;
use crate::error::AppError;
use serde_json::Value;
use std::cmp::Ordering;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SortField {
    pub field: String,
    pub descending: bool,
}

impl SortField {
    pub fn asc(field: impl Into<String>) -> Self {
        SortField {
            field: field.into(),
            descending: false,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        SortField {
            field: field.into(),
            descending: true,
        }
    }

    /// `-created_at,title` -> [created_at desc, title asc]. A `+` prefix is accepted as ascending.
    pub fn parse_list(raw: &str) -> Vec<SortField> {
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                if let Some(field) = s.strip_prefix('-') {
                    SortField::desc(field.trim())
                } else {
                    SortField::asc(s.strip_prefix('+').unwrap_or(s).trim())
                }
            })
            .collect()
    }

    pub fn to_param(&self) -> String {
        if self.descending {
            format!("-{}", self.field)
        } else {
            self.field.clone()
        }
    }
}

/// Anything that can be ordered by attribute: stored records and resource objects.
pub trait Sortable {
    fn sort_id(&self) -> &str;
    fn sort_attribute(&self, field: &str) -> Option<&Value>;
}

impl Sortable for crate::document::ResourceObject {
    fn sort_id(&self) -> &str {
        &self.id
    }

    fn sort_attribute(&self, field: &str) -> Option<&Value> {
        self.attributes.get(field)
    }
}

pub struct Sorter;

impl Sorter {
    pub fn validate(fields: &[SortField], descriptor: &ResourceTypeDescriptor) -> Result<(), AppError> {
        for f in fields {
            if !descriptor.is_sort_allowed(&f.field) {
                return Err(AppError::InvalidSortField {
                    type_name: descriptor.type_name.clone(),
                    field: f.field.clone(),
                });
            }
        }
        Ok(())
    }

    /// Validate `requested` against the descriptor, then order `items`. Equal keys keep their prior order.
    pub fn sort<T: Sortable>(
        mut items: Vec<T>,
        requested: &[SortField],
        descriptor: &ResourceTypeDescriptor,
    ) -> Result<Vec<T>, AppError> {
        Self::validate(requested, descriptor)?;
        Self::apply(&mut items, requested);
        Ok(items)
    }

    /// Stable multi-key sort without whitelist checks (callers validate first).
    pub fn apply<T: Sortable>(items: &mut [T], fields: &[SortField]) {
        if fields.is_empty() {
            return;
        }
        items.sort_by(|a, b| {
            for f in fields {
                let ord = if f.field == "id" {
                    compare_ids(a.sort_id(), b.sort_id())
                } else {
                    compare_values(a.sort_attribute(&f.field), b.sort_attribute(&f.field))
                };
                let ord = if f.descending { ord.reverse() } else { ord };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            Ordering::Equal
        });
    }
}

fn compare_ids(a: &str, b: &str) -> Ordering {
    match (a.parse::<i64>(), b.parse::<i64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        _ => a.cmp(b),
    }
}

/// Missing and null sort first; values of different JSON kinds order by kind.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(v: Option<&Value>) -> u8 {
        match v {
            None | Some(Value::Null) => 0,
            Some(Value::Bool(_)) => 1,
            Some(Value::Number(_)) => 2,
            Some(Value::String(_)) => 3,
            Some(Value::Array(_)) => 4,
            Some(Value::Object(_)) => 5,
        }
    }
    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

/// 1-based page request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageSpec {
    pub size: u32,
    pub number: u32,
}

impl PageSpec {
    pub fn new(size: u32, number: u32) -> Result<Self, AppError> {
        if size == 0 || number == 0 {
            return Err(AppError::InvalidPagination(
                "page[size] and page[number] must be positive integers".into(),
            ));
        }
        Ok(PageSpec { size, number })
    }

    /// `None` when neither parameter is given. A missing size uses `default_size`, a missing number is 1;
    /// sizes above `max_size` are clamped.
    pub fn parse(
        size: Option<&str>,
        number: Option<&str>,
        default_size: u32,
        max_size: u32,
    ) -> Result<Option<Self>, AppError> {
        if size.is_none() && number.is_none() {
            return Ok(None);
        }
        let size = match size {
            Some(raw) => parse_positive("page[size]", raw)?,
            None => default_size,
        };
        let number = match number {
            Some(raw) => parse_positive("page[number]", raw)?,
            None => 1,
        };
        Ok(Some(PageSpec::new(size.min(max_size.max(1)), number)?))
    }

    pub fn offset(&self) -> usize {
        (self.number as usize).saturating_sub(1).saturating_mul(self.size as usize)
    }
}

fn parse_positive(name: &str, raw: &str) -> Result<u32, AppError> {
    match raw.trim().parse::<i64>() {
        Ok(n) if n >= 1 => Ok(u32::try_from(n).unwrap_or(u32::MAX)),
        _ => Err(AppError::InvalidPagination(format!(
            "{} must be a positive integer, got '{}'",
            name, raw
        ))),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageLinks {
    pub first: PageSpec,
    pub last: PageSpec,
    pub prev: Option<PageSpec>,
    pub next: Option<PageSpec>,
}

pub struct Paginator;

impl Paginator {
    /// `last` is at least page 1 so an empty collection still has a valid last page.
    pub fn paginate(total: u64, page: &PageSpec) -> PageLinks {
        let size = u64::from(page.size.max(1));
        let last = total.div_ceil(size).max(1);
        let at = |number: u64| PageSpec {
            size: page.size,
            number: u32::try_from(number).unwrap_or(u32::MAX),
        };
        let number = u64::from(page.number);
        PageLinks {
            first: at(1),
            last: at(last),
            prev: (number > 1).then(|| at(number - 1)),
            next: (number * size < total).then(|| at(number + 1)),
        }
    }

    pub fn slice<T>(items: Vec<T>, page: &PageSpec) -> Vec<T> {
        items.into_iter().skip(page.offset()).take(page.size as usize).collect()
    }
}

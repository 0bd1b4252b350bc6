//! Query-string parameters of list and show operations.

use crate::config::Settings;
use crate::error::AppError;
use crate::service::{IncludeResolver, PageSpec, SortField};
use std::collections::HashMap;

/// Raw `sort`, `include`, `page[size]` and `page[number]` values. Parsing and whitelisting happen
/// in the operation so errors carry the resource type.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListParams {
    pub sort: Option<String>,
    pub include: Option<String>,
    pub page_size: Option<String>,
    pub page_number: Option<String>,
}

impl ListParams {
    /// Unknown keys are ignored.
    pub fn from_query(params: &HashMap<String, String>) -> Self {
        let mut out = ListParams::default();
        for (k, v) in params {
            match k.as_str() {
                "sort" => out.sort = Some(v.clone()),
                "include" => out.include = Some(v.clone()),
                "page[size]" => out.page_size = Some(v.clone()),
                "page[number]" => out.page_number = Some(v.clone()),
                _ => {}
            }
        }
        out
    }

    pub fn sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    pub fn include(mut self, include: impl Into<String>) -> Self {
        self.include = Some(include.into());
        self
    }

    pub fn page(mut self, size: u32, number: u32) -> Self {
        self.page_size = Some(size.to_string());
        self.page_number = Some(number.to_string());
        self
    }

    pub fn sort_fields(&self) -> Vec<SortField> {
        self.sort.as_deref().map(SortField::parse_list).unwrap_or_default()
    }

    pub fn include_names(&self) -> Option<Vec<String>> {
        IncludeResolver::parse(self.include.as_deref())
    }

    pub fn page_spec(&self, settings: &Settings) -> Result<Option<PageSpec>, AppError> {
        PageSpec::parse(
            self.page_size.as_deref(),
            self.page_number.as_deref(),
            settings.default_page_size,
            settings.max_page_size,
        )
    }

    /// `sort` and `include` as they should reappear in generated page links.
    pub fn link_query(&self) -> Vec<(&'static str, String)> {
        let mut extra = Vec::new();
        let sort = self.sort_fields();
        if !sort.is_empty() {
            extra.push(("sort", sort.iter().map(SortField::to_param).collect::<Vec<_>>().join(",")));
        }
        if let Some(names) = self.include_names() {
            extra.push(("include", names.join(",")));
        }
        extra
    }
}

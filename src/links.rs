//! Link generation for resources, relationships and paginated collections.

use crate::case::to_kebab_case;
use crate::document::Links;
use crate::service::{PageLinks, PageSpec};

pub struct LinkBuilder<'a> {
    base_url: &'a str,
}

impl<'a> LinkBuilder<'a> {
    pub fn new(base_url: &'a str) -> Self {
        LinkBuilder {
            base_url: base_url.trim_end_matches('/'),
        }
    }

    pub fn collection(&self, type_name: &str) -> String {
        format!("{}/{}", self.base_url, type_name)
    }

    pub fn resource(&self, type_name: &str, id: &str) -> String {
        format!("{}/{}/{}", self.base_url, type_name, id)
    }

    pub fn relationship_self(&self, type_name: &str, id: &str, relationship: &str) -> String {
        format!("{}/relationships/{}", self.resource(type_name, id), to_kebab_case(relationship))
    }

    pub fn related(&self, type_name: &str, id: &str, relationship: &str) -> String {
        format!("{}/{}", self.resource(type_name, id), to_kebab_case(relationship))
    }

    pub fn relationship_links(&self, type_name: &str, id: &str, relationship: &str) -> Links {
        Links {
            self_link: Some(self.relationship_self(type_name, id, relationship)),
            related: Some(self.related(type_name, id, relationship)),
            ..Links::default()
        }
    }

    /// `{collection}?page[size]=S&page[number]=N` followed by `extra` query pairs.
    pub fn page(&self, type_name: &str, page: &PageSpec, extra: &[(&str, String)]) -> String {
        let mut query = vec![
            ("page[size]", page.size.to_string()),
            ("page[number]", page.number.to_string()),
        ];
        query.extend(extra.iter().map(|(k, v)| (*k, v.clone())));
        with_query(self.collection(type_name), &query)
    }

    /// Top-level links for a list. Paginated lists also get first/last/prev/next, with explicit nulls.
    pub fn list_links(
        &self,
        type_name: &str,
        page: Option<(&PageSpec, &PageLinks)>,
        extra: &[(&str, String)],
    ) -> Links {
        match page {
            None => Links::self_only(with_query(self.collection(type_name), extra)),
            Some((current, links)) => Links {
                self_link: Some(self.page(type_name, current, extra)),
                first: Some(self.page(type_name, &links.first, extra)),
                last: Some(self.page(type_name, &links.last, extra)),
                prev: Some(links.prev.map(|p| self.page(type_name, &p, extra))),
                next: Some(links.next.map(|p| self.page(type_name, &p, extra))),
                ..Links::default()
            },
        }
    }
}

fn with_query(url: String, pairs: &[(&str, String)]) -> String {
    if pairs.is_empty() {
        return url;
    }
    // keys are fixed names; values come from the request
    let query: Vec<String> = pairs
        .iter()
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
        .collect();
    format!("{}?{}", url, query.join("&"))
}

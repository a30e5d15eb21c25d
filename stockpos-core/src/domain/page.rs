//! List responses: the backend answers either with a bare array or with a
//! paginated envelope, depending on the endpoint. Both decode into
//! [`Listing`] and are normalized to [`Page`] before use.

use serde::{Deserialize, Serialize};

/// Paginated envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paginated<T> {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    pub results: Vec<T>,
}

/// Raw list shape as sent by the backend
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Listing<T> {
    Paginated(Paginated<T>),
    Bare(Vec<T>),
}

/// Normalized list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Total number of records on the server
    pub total: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    /// The backend returned everything at once (bare list)
    pub complete: bool,
}

impl<T> Listing<T> {
    pub fn total(&self) -> u64 {
        match self {
            Listing::Paginated(p) => p.count,
            Listing::Bare(items) => items.len() as u64,
        }
    }

    pub fn into_page(self) -> Page<T> {
        match self {
            Listing::Paginated(p) => {
                // count can be missing on some endpoints
                let total = if p.count == 0 {
                    p.results.len() as u64
                } else {
                    p.count
                };
                Page {
                    items: p.results,
                    total,
                    next: p.next,
                    previous: p.previous,
                    complete: false,
                }
            }
            Listing::Bare(items) => Page {
                total: items.len() as u64,
                items,
                next: None,
                previous: None,
                complete: true,
            },
        }
    }

    pub fn into_items(self) -> Vec<T> {
        self.into_page().items
    }
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            next: None,
            previous: None,
            complete: true,
        }
    }

    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_bare_list() {
        let listing: Listing<u32> = serde_json::from_str("[1, 2, 3]").unwrap();
        assert_eq!(listing.total(), 3);
        let page = listing.into_page();
        assert_eq!(page.items, vec![1, 2, 3]);
        assert!(page.complete);
        assert!(!page.has_next());
    }

    #[test]
    fn test_envelope() {
        let listing: Listing<u32> = serde_json::from_str(
            r#"{"count": 42, "next": "http://x/?page=2", "previous": null, "results": [7]}"#,
        )
        .unwrap();
        assert_eq!(listing.total(), 42);
        let page = listing.into_page();
        assert_eq!(page.items, vec![7]);
        assert_eq!(page.total, 42);
        assert!(page.has_next());
        assert!(!page.complete);
    }

    #[test]
    fn test_envelope_without_count() {
        let listing: Listing<u32> = serde_json::from_str(r#"{"results": [1, 2]}"#).unwrap();
        assert_eq!(listing.into_page().total, 2);
    }

    #[test]
    fn test_unknown_shape_is_rejected() {
        assert!(serde_json::from_str::<Listing<u32>>(r#"{"items": []}"#).is_err());
    }
}

//! Captured route parameters.
//!
//! Parameters captured during route matching are exposed as an ordered
//! name-to-string map with typed conversion accessors. Constraints on a
//! route already guarantee the captured text parses, so a typed accessor
//! failing on a constrained parameter indicates a programming error in
//! the route declaration, not a runtime surprise.
//!
//! Storage is inline for typical routes (up to 8 parameters) and spills
//! to the heap only beyond that.

use smallvec::SmallVec;
use uuid::Uuid;

/// Maximum number of inline parameters before heap allocation.
pub const INLINE_PARAM_COUNT: usize = 8;

/// A single captured (name, value) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedParam {
    pub name: String,
    pub value: String,
}

/// Ordered collection of captured route parameters.
///
/// Insertion order is capture order (left to right along the path), and
/// lookups by name return the first capture with that name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteParams {
    params: SmallVec<[CapturedParam; INLINE_PARAM_COUNT]>,
}

impl RouteParams {
    /// Create an empty parameter bag.
    pub fn new() -> Self {
        Self {
            params: SmallVec::new(),
        }
    }

    /// Add a captured parameter.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.params.push(CapturedParam {
            name: name.into(),
            value: value.into(),
        });
    }

    /// Get a parameter value by name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.as_str())
    }

    /// Get a parameter as `&str`, same as [`get`](Self::get).
    pub fn as_str(&self, name: &str) -> Option<&str> {
        self.get(name)
    }

    /// Get a parameter parsed as `i32`.
    pub fn as_i32(&self, name: &str) -> Option<i32> {
        self.get(name)?.parse().ok()
    }

    /// Get a parameter parsed as `i64`.
    pub fn as_i64(&self, name: &str) -> Option<i64> {
        self.get(name)?.parse().ok()
    }

    /// Get a parameter parsed as `f64`.
    pub fn as_f64(&self, name: &str) -> Option<f64> {
        self.get(name)?.parse().ok()
    }

    /// Get a parameter parsed as `bool` ("true"/"false", case-insensitive).
    pub fn as_bool(&self, name: &str) -> Option<bool> {
        match self.get(name)?.to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        }
    }

    /// Get a parameter parsed as a UUID.
    pub fn as_uuid(&self, name: &str) -> Option<Uuid> {
        Uuid::parse_str(self.get(name)?).ok()
    }

    /// Get a parameter parsed as any `FromStr` type.
    pub fn parse<T: std::str::FromStr>(&self, name: &str) -> Option<Result<T, T::Err>> {
        self.get(name).map(|v| v.parse())
    }

    /// Check whether a parameter was captured.
    pub fn contains(&self, name: &str) -> bool {
        self.params.iter().any(|p| p.name == name)
    }

    /// Number of captured parameters.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Check if no parameters were captured.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Iterate over parameters in capture order.
    pub fn iter(&self) -> impl Iterator<Item = &CapturedParam> {
        self.params.iter()
    }
}

impl FromIterator<(String, String)> for RouteParams {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut params = RouteParams::new();
        for (name, value) in iter {
            params.push(name, value);
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_get() {
        let mut params = RouteParams::new();
        params.push("id", "123");
        params.push("name", "john");
        assert_eq!(params.get("id"), Some("123"));
        assert_eq!(params.get("name"), Some("john"));
        assert_eq!(params.get("missing"), None);
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_capture_order_preserved() {
        let mut params = RouteParams::new();
        params.push("b", "2");
        params.push("a", "1");
        let names: Vec<&str> = params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn test_typed_accessors() {
        let mut params = RouteParams::new();
        params.push("id", "42");
        params.push("price", "9.5");
        params.push("flag", "TRUE");
        params.push("uid", "550e8400-e29b-41d4-a716-446655440000");

        assert_eq!(params.as_i32("id"), Some(42));
        assert_eq!(params.as_i64("id"), Some(42));
        assert_eq!(params.as_f64("price"), Some(9.5));
        assert_eq!(params.as_bool("flag"), Some(true));
        assert!(params.as_uuid("uid").is_some());
        assert_eq!(params.as_i32("price"), None);
    }

    #[test]
    fn test_parse_generic() {
        let mut params = RouteParams::new();
        params.push("n", "7");
        let parsed: Option<Result<u8, _>> = params.parse("n");
        assert_eq!(parsed.unwrap().unwrap(), 7u8);
    }

    #[test]
    fn test_from_iterator() {
        let params: RouteParams =
            vec![("a".to_string(), "1".to_string()), ("b".to_string(), "2".to_string())]
                .into_iter()
                .collect();
        assert_eq!(params.get("a"), Some("1"));
        assert_eq!(params.get("b"), Some("2"));
    }
}

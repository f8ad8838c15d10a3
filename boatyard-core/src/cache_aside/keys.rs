//! Cache key namespaces

/// Prefix for collection query results
pub const LIST_NAMESPACE: &str = "list:";

/// Prefix for single records
pub const ENTITY_NAMESPACE: &str = "entity:";

/// A query whose result can be cached under a stable key
///
/// Two queries that select the same records must produce the same
/// `canonical_key`, regardless of how their parameters were supplied.
pub trait QueryKey {
    fn canonical_key(&self) -> String;
}

pub fn entity_key(id: &str) -> String {
    format!("{}{}", ENTITY_NAMESPACE, id)
}

pub fn list_key<Q: QueryKey + ?Sized>(query: &Q) -> String {
    format!("{}{}", LIST_NAMESPACE, query.canonical_key())
}

/// Pattern matching every cached list query
pub fn list_pattern() -> String {
    format!("{}*", LIST_NAMESPACE)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(&'static str);

    impl QueryKey for Fixed {
        fn canonical_key(&self) -> String {
            self.0.to_string()
        }
    }

    #[test]
    fn test_key_shapes() {
        assert_eq!(entity_key("42"), "entity:42");
        assert_eq!(list_key(&Fixed("all")), "list:all");
        assert_eq!(list_pattern(), "list:*");
    }
}

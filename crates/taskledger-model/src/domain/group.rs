use super::DEFAULT_GROUP;

/// Split a composite group label (`service:web`, `family:batch`) on its first colon.
///
/// Labels without a colon fall into [`DEFAULT_GROUP`] with the whole label as the name.
pub fn split_group(label: &str) -> (String, String) {
    match label.split_once(':') {
        Some((group, name)) => (group.to_string(), name.to_string()),
        None => (DEFAULT_GROUP.to_string(), label.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_colon() {
        assert_eq!(
            split_group("serviceA:worker1"),
            ("serviceA".to_string(), "worker1".to_string())
        );
    }

    #[test]
    fn defaults_group_without_colon() {
        assert_eq!(
            split_group("standalone-task"),
            ("taskgroup".to_string(), "standalone-task".to_string())
        );
    }

    #[test]
    fn only_first_colon_separates() {
        assert_eq!(
            split_group("family:batch:v2"),
            ("family".to_string(), "batch:v2".to_string())
        );
    }
}

use super::*;

#[test]
fn empty_set_allows_nothing() {
    let set = PermissionSet::new();
    assert!(!set.allows("journeys.build"));
    assert!(!set.allows(""));
    assert!(set.is_empty());
}

#[test]
fn exact_match_allows() {
    let set: PermissionSet = ["journeys.build"].into_iter().collect();
    assert!(set.allows("journeys.build"));
    assert!(!set.allows("campaigns.manage"));
}

#[test]
fn wildcard_allows_every_string() {
    let set: PermissionSet = [WILDCARD].into_iter().collect();
    for name in ["journeys.build", "campaigns.manage", "", "*", "anything at all", "iam.manage"] {
        assert!(set.allows(name), "wildcard should allow {name:?}");
    }
    assert!(set.is_unrestricted());
}

#[test]
fn no_prefix_matching() {
    let set: PermissionSet = ["journeys"].into_iter().collect();
    assert!(!set.allows("journeys.build"));

    let set: PermissionSet = ["journeys.*"].into_iter().collect();
    assert!(!set.allows("journeys.build"));
}

#[test]
fn duplicates_collapse() {
    let set: PermissionSet = vec!["a".to_owned(), "a".to_owned(), "b".to_owned()].into_iter().collect();
    assert_eq!(set.len(), 2);
    assert_eq!(set.iter().collect::<Vec<_>>(), vec!["a", "b"]);
}

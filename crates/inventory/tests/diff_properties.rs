//! Property tests for the inventory differ
//!
//! Exercises the partition, merge, idempotence and ordering guarantees over
//! hand-built collections, then over generated collections and shuffles of
//! them.

use inventory::{DiffResult, InventoryResource, ResourceKey, diff};
use proptest::prelude::*;
use k8s_openapi::api::core::v1::{Service, ServicePort, ServiceSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::BTreeSet;

fn svc(namespace: &str, name: &str, port: i32, version: Option<&str>) -> Service {
    Service {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            resource_version: version.map(str::to_string),
            ..Default::default()
        },
        spec: Some(ServiceSpec {
            ports: Some(vec![ServicePort {
                port,
                ..Default::default()
            }]),
            ..Default::default()
        }),
        status: None,
    }
}

fn observed() -> Vec<Service> {
    vec![
        svc("observability", "simplest-query", 16686, Some("10")),
        svc("observability", "simplest-collector", 14250, Some("11")),
        svc("observability", "simplest-agent", 6831, Some("12")),
        svc("tracing", "prod-query", 16686, Some("20")),
    ]
}

fn desired() -> Vec<Service> {
    vec![
        svc("observability", "simplest-query", 16687, None),
        svc("tracing", "prod-collector", 14250, None),
        svc("observability", "simplest-collector-headless", 14250, None),
        svc("tracing", "prod-query", 16686, None),
    ]
}

fn keys(objs: &[Service]) -> Vec<ResourceKey> {
    objs.iter().map(|obj| obj.key()).collect()
}

fn key_set(objs: &[Service]) -> BTreeSet<ResourceKey> {
    objs.iter().map(|obj| obj.key()).collect()
}

fn port_of(obj: &Service) -> i32 {
    obj.spec.as_ref().and_then(|s| s.ports.as_ref()).unwrap()[0].port
}

/// All rotations plus the reversal of `items`.
fn reorderings(items: &[Service]) -> Vec<Vec<Service>> {
    let mut out = Vec::new();
    for shift in 0..items.len() {
        let mut rotated = items.to_vec();
        rotated.rotate_left(shift);
        out.push(rotated);
    }
    let mut reversed = items.to_vec();
    reversed.reverse();
    out.push(reversed);
    out
}

#[test]
fn test_partition_covers_union_without_overlap() {
    let result = diff(observed(), desired());

    let create = key_set(&result.to_create);
    let update = key_set(&result.to_update);
    let delete = key_set(&result.to_delete);

    assert!(create.is_disjoint(&update));
    assert!(create.is_disjoint(&delete));
    assert!(update.is_disjoint(&delete));

    let union: BTreeSet<_> = create.union(&update).chain(delete.iter()).cloned().collect();
    let expected: BTreeSet<_> = key_set(&observed()).union(&key_set(&desired())).cloned().collect();
    assert_eq!(union, expected);
    assert_eq!(result.len(), expected.len());
}

#[test]
fn test_creates_carry_desired_spec() {
    let result = diff(observed(), desired());
    let observed_keys = key_set(&observed());

    for wanted in desired().iter().filter(|d| !observed_keys.contains(&d.key())) {
        let created = result
            .to_create
            .iter()
            .find(|c| c.key() == wanted.key())
            .unwrap();
        assert_eq!(created, wanted);
    }
}

#[test]
fn test_updates_carry_desired_spec_and_observed_version() {
    let result = diff(observed(), desired());
    let observed = observed();

    for updated in &result.to_update {
        let current = observed.iter().find(|o| o.key() == updated.key()).unwrap();
        let wanted = desired().into_iter().find(|d| d.key() == updated.key()).unwrap();

        assert_eq!(updated.spec, wanted.spec);
        assert_eq!(updated.metadata.resource_version, current.metadata.resource_version);
    }
    let query = result
        .to_update
        .iter()
        .find(|u| u.key() == ResourceKey::new("observability", "simplest-query"))
        .unwrap();
    assert_eq!(port_of(query), 16687);
    assert_eq!(query.metadata.resource_version.as_deref(), Some("10"));
}

#[test]
fn test_deletes_are_unchanged_observed() {
    let result = diff(observed(), desired());
    let desired_keys = key_set(&desired());

    let expected: Vec<_> = {
        let mut stale: Vec<_> = observed()
            .into_iter()
            .filter(|o| !desired_keys.contains(&o.key()))
            .collect();
        stale.sort_by_key(|obj| obj.key());
        stale
    };
    assert_eq!(result.to_delete, expected);
}

#[test]
fn test_diff_is_idempotent() {
    let first = diff(observed(), desired());
    let second = diff(observed(), desired());
    assert_eq!(first, second);
}

#[test]
fn test_output_order_independent_of_input_order() {
    let baseline = diff(observed(), desired());

    for observed in reorderings(&observed()) {
        for desired in reorderings(&desired()) {
            let result: DiffResult<Service> = diff(observed.clone(), desired.clone());
            assert_eq!(result, baseline);
        }
    }
}

#[test]
fn test_each_set_sorted_by_key() {
    let result = diff(observed(), desired());
    for set in [&result.to_create, &result.to_update, &result.to_delete] {
        let keys = keys(set);
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }
    assert_eq!(
        keys(&result.to_create),
        vec![
            ResourceKey::new("observability", "simplest-collector-headless"),
            ResourceKey::new("tracing", "prod-collector"),
        ]
    );
}

#[test]
fn test_create_update_delete_split() {
    let observed = vec![
        svc("default", "svc-a", 1, Some("1")),
        svc("default", "svc-b", 2, Some("2")),
    ];
    let desired = vec![svc("default", "svc-b", 22, None), svc("default", "svc-c", 3, None)];

    let result = diff(observed, desired);

    assert_eq!(result.to_create, vec![svc("default", "svc-c", 3, None)]);
    assert_eq!(result.to_update, vec![svc("default", "svc-b", 22, Some("2"))]);
    assert_eq!(result.to_delete, vec![svc("default", "svc-a", 1, Some("1"))]);
}

#[test]
fn test_empty_inputs() {
    let result: DiffResult<Service> = diff(Vec::new(), Vec::new());
    assert!(result.is_empty());

    let result = diff(Vec::new(), vec![svc("default", "svc-a", 1, None)]);
    assert_eq!(result.to_create, vec![svc("default", "svc-a", 1, None)]);
    assert!(result.to_update.is_empty() && result.to_delete.is_empty());

    let result = diff(vec![svc("default", "svc-a", 1, Some("3"))], Vec::new());
    assert_eq!(result.to_delete, vec![svc("default", "svc-a", 1, Some("3"))]);
}

/// Collections of 0 to 12 services with unique keys spread over two namespaces.
fn collection(version: Option<&'static str>) -> impl Strategy<Value = Vec<Service>> {
    prop::collection::btree_map(
        (prop::sample::select(vec!["observability", "tracing"]), "[a-f]{1,2}"),
        1..20_000i32,
        0..12,
    )
    .prop_map(move |entries| {
        entries
            .into_iter()
            .map(|((namespace, name), port)| svc(namespace, &name, port, version))
            .collect()
    })
}

/// `items` paired with a random permutation of itself.
fn with_shuffle(items: Vec<Service>) -> impl Strategy<Value = (Vec<Service>, Vec<Service>)> {
    Just(items.clone())
        .prop_shuffle()
        .prop_map(move |shuffled| (items.clone(), shuffled))
}

proptest! {
    #[test]
    fn test_generated_output_independent_of_input_order(
        (observed, observed_shuffled) in collection(Some("1")).prop_flat_map(with_shuffle),
        (desired, desired_shuffled) in collection(None).prop_flat_map(with_shuffle),
    ) {
        prop_assert_eq!(
            diff(observed, desired),
            diff(observed_shuffled, desired_shuffled)
        );
    }

    #[test]
    fn test_generated_partition_covers_union(
        observed in collection(Some("1")),
        desired in collection(None),
    ) {
        let result = diff(observed.clone(), desired.clone());
        let create = key_set(&result.to_create);
        let update = key_set(&result.to_update);
        let delete = key_set(&result.to_delete);

        prop_assert!(create.is_disjoint(&update));
        prop_assert!(create.is_disjoint(&delete));
        prop_assert!(update.is_disjoint(&delete));
        prop_assert_eq!(
            &create,
            &key_set(&desired).difference(&key_set(&observed)).cloned().collect::<BTreeSet<_>>()
        );
        prop_assert_eq!(
            &update,
            &key_set(&desired).intersection(&key_set(&observed)).cloned().collect::<BTreeSet<_>>()
        );
        prop_assert_eq!(
            &delete,
            &key_set(&observed).difference(&key_set(&desired)).cloned().collect::<BTreeSet<_>>()
        );
        for updated in &result.to_update {
            prop_assert_eq!(updated.metadata.resource_version.as_deref(), Some("1"));
        }
    }
}

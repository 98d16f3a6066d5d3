//! Tenant scoping of labels and pod (anti-)affinity
//!
//! Affinity rules written by one tenant must never match Pods of another
//! tenant sharing the host cluster, so every term's label selector is pinned
//! to the tenant label.

use k8s_openapi::api::core::v1::{Pod, PodAffinityTerm, WeightedPodAffinityTerm};
use tenancy_common::labels::LABEL_CLUSTER;

/// Set the tenant label and scope every affinity term to the tenant
pub(crate) fn inject_tenant_label(cluster: &str, mut pod: Pod) -> Pod {
    pod.metadata
        .labels
        .get_or_insert_with(Default::default)
        .insert(LABEL_CLUSTER.to_string(), cluster.to_string());

    let Some(affinity) = pod.spec.as_mut().and_then(|s| s.affinity.as_mut()) else {
        return pod;
    };

    if let Some(pod_affinity) = affinity.pod_affinity.as_mut() {
        scope_terms(
            pod_affinity.required_during_scheduling_ignored_during_execution.as_deref_mut(),
            cluster,
        );
        scope_weighted_terms(
            pod_affinity.preferred_during_scheduling_ignored_during_execution.as_deref_mut(),
            cluster,
        );
    }
    if let Some(anti_affinity) = affinity.pod_anti_affinity.as_mut() {
        scope_terms(
            anti_affinity.required_during_scheduling_ignored_during_execution.as_deref_mut(),
            cluster,
        );
        scope_weighted_terms(
            anti_affinity.preferred_during_scheduling_ignored_during_execution.as_deref_mut(),
            cluster,
        );
    }

    pod
}

fn scope_terms(terms: Option<&mut [PodAffinityTerm]>, cluster: &str) {
    for term in terms.into_iter().flatten() {
        scope_term(term, cluster);
    }
}

fn scope_weighted_terms(terms: Option<&mut [WeightedPodAffinityTerm]>, cluster: &str) {
    for weighted in terms.into_iter().flatten() {
        scope_term(&mut weighted.pod_affinity_term, cluster);
    }
}

/// Terms without a label selector match nothing and are left alone
fn scope_term(term: &mut PodAffinityTerm, cluster: &str) {
    if let Some(selector) = term.label_selector.as_mut() {
        selector
            .match_labels
            .get_or_insert_with(Default::default)
            .insert(LABEL_CLUSTER.to_string(), cluster.to_string());
    }
}

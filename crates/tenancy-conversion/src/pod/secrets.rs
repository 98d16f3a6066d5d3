//! Secret volume remapping
//!
//! Service-account token Secrets are recreated in the host cluster under
//! generated names, so every reference to them has to follow.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{Container, Pod, Volume};

/// Rewrite secret-backed volumes and the mounts that reference them
///
/// A volume whose name equals its secret name was generated by the
/// orchestrator and is renamed along with the secret. A user-named volume
/// keeps its name; only its secret reference changes.
pub(crate) fn rewrite_secret_refs(
    tenant: &Pod,
    secret_map: &BTreeMap<String, String>,
    mut pod: Pod,
) -> Pod {
    let tenant_volumes = tenant
        .spec
        .as_ref()
        .and_then(|s| s.volumes.as_deref())
        .unwrap_or_default();

    let spec = super::spec_mut(&mut pod);
    for container in spec.containers.iter_mut() {
        rewrite_mounts(container, tenant_volumes, secret_map);
    }
    for container in spec.init_containers.iter_mut().flatten() {
        rewrite_mounts(container, tenant_volumes, secret_map);
    }

    for volume in spec.volumes.iter_mut().flatten() {
        let Some(source) = volume.secret.as_mut() else {
            continue;
        };
        let Some(secret_name) = source.secret_name.clone() else {
            continue;
        };
        if let Some(host_name) = secret_map.get(&secret_name) {
            if volume.name == secret_name {
                volume.name = host_name.clone();
            }
            source.secret_name = Some(host_name.clone());
        }
    }

    pod
}

fn rewrite_mounts(
    container: &mut Container,
    tenant_volumes: &[Volume],
    secret_map: &BTreeMap<String, String>,
) {
    for mount in container.volume_mounts.iter_mut().flatten() {
        if !is_generated_secret_volume(tenant_volumes, &mount.name) {
            continue;
        }
        if let Some(host_name) = secret_map.get(&mount.name) {
            mount.name = host_name.clone();
        }
    }
}

/// Whether the tenant volume `name` is backed by a secret of the same name
fn is_generated_secret_volume(volumes: &[Volume], name: &str) -> bool {
    volumes
        .iter()
        .find(|v| v.name == name)
        .and_then(|v| v.secret.as_ref())
        .and_then(|s| s.secret_name.as_deref())
        .is_some_and(|secret| secret == name)
}

//! Service-account token Secret translation
//!
//! Token Secrets cannot be copied as `kubernetes.io/service-account-token`
//! into the host cluster: the host token controller would repopulate them
//! with host credentials. They are stored as `Opaque` under a generated name
//! instead, and Pods are pointed at the copy by the secret-ref rewriter.

use k8s_openapi::api::core::v1::Secret;
use tenancy_common::labels::{LABEL_SECRET_NAME, LABEL_SECRET_UID, SERVICE_ACCOUNT_NAME_KEY};
use tracing::debug;

/// Type given to translated token Secrets
pub const SECRET_TYPE_OPAQUE: &str = "Opaque";

/// Translates one host service-account token Secret
pub struct SecretMutator {
    host: Secret,
}

impl SecretMutator {
    /// Wrap the host Secret copy
    pub fn new(host: Secret) -> Self {
        Self { host }
    }

    /// Produce the host Secret
    pub fn mutate(self, tenant: &Secret, cluster: &str) -> Secret {
        let mut secret = self.host;
        let tenant_name = tenant.metadata.name.clone().unwrap_or_default();
        let service_account = tenant
            .metadata
            .annotations
            .as_ref()
            .and_then(|a| a.get(SERVICE_ACCOUNT_NAME_KEY))
            .cloned()
            .unwrap_or_default();

        debug!(
            cluster = %cluster,
            secret = %tenant_name,
            service_account = %service_account,
            "Translating service account token secret"
        );

        secret.type_ = Some(SECRET_TYPE_OPAQUE.to_string());
        secret
            .metadata
            .annotations
            .get_or_insert_with(Default::default)
            .insert(LABEL_SECRET_NAME.to_string(), tenant_name);
        secret
            .metadata
            .labels
            .get_or_insert_with(Default::default)
            .insert(
                LABEL_SECRET_UID.to_string(),
                tenant.metadata.uid.clone().unwrap_or_default(),
            );
        secret.metadata.name = None;
        secret.metadata.generate_name = Some(format!("{}-token-", service_account));

        secret
    }
}

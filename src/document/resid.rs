//! Resource identity: type discriminator, name and namespace.

use std::fmt;

/// Namespace assumed for namespaced resources that do not declare one.
pub const DEFAULT_NAMESPACE: &str = "default";

/// Effective namespace reported for cluster-scoped kinds.
pub const NON_NAMESPACEABLE: &str = "_non_namespaceable_";

/// Kinds that never live in a namespace.
const CLUSTER_SCOPED_KINDS: &[&str] = &[
    "APIService",
    "CSIDriver",
    "CSINode",
    "CertificateSigningRequest",
    "ClusterIssuer",
    "ClusterRole",
    "ClusterRoleBinding",
    "ComponentStatus",
    "CustomResourceDefinition",
    "IngressClass",
    "MutatingWebhookConfiguration",
    "Namespace",
    "Node",
    "PersistentVolume",
    "PodSecurityPolicy",
    "PriorityClass",
    "RuntimeClass",
    "SelfSubjectAccessReview",
    "SelfSubjectRulesReview",
    "StorageClass",
    "SubjectAccessReview",
    "TokenReview",
    "ValidatingWebhookConfiguration",
    "VolumeAttachment",
];

/// Group, version and kind of a resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Gvk {
    pub group: String,
    pub version: String,
    pub kind: String,
}

impl Gvk {
    pub fn new(group: &str, version: &str, kind: &str) -> Self {
        Self {
            group: group.to_string(),
            version: version.to_string(),
            kind: kind.to_string(),
        }
    }

    /// Splits an `apiVersion` into group and version.
    ///
    /// `apps/v1` has group `apps`; a bare `v1` belongs to the core (empty) group.
    ///
    /// # Example
    ///
    /// ```
    /// use yamlrelay::document::resid::Gvk;
    ///
    /// let gvk = Gvk::from_api_version("apps/v1", "Deployment");
    /// assert_eq!(gvk.group, "apps");
    /// assert_eq!(gvk.version, "v1");
    ///
    /// let core = Gvk::from_api_version("v1", "ConfigMap");
    /// assert_eq!(core.group, "");
    /// ```
    pub fn from_api_version(api_version: &str, kind: &str) -> Self {
        match api_version.split_once('/') {
            Some((group, version)) => Gvk::new(group, version, kind),
            None => Gvk::new("", api_version, kind),
        }
    }

    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }

    pub fn is_namespaceable(&self) -> bool {
        !CLUSTER_SCOPED_KINDS.contains(&self.kind.as_str())
    }
}

impl fmt::Display for Gvk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let group = if self.group.is_empty() { "~G" } else { &self.group };
        let version = if self.version.is_empty() { "~V" } else { &self.version };
        let kind = if self.kind.is_empty() { "~K" } else { &self.kind };
        write!(f, "{}_{}_{}", group, version, kind)
    }
}

/// Identity of a single resource within a batch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResId {
    pub gvk: Gvk,
    pub name: String,
    pub namespace: String,
}

impl ResId {
    pub fn new(gvk: Gvk, name: &str, namespace: &str) -> Self {
        Self {
            gvk,
            name: name.to_string(),
            namespace: namespace.to_string(),
        }
    }

    /// Namespace used when matching selectors against this resource.
    pub fn effective_namespace(&self) -> &str {
        self.effective_namespace_with(DEFAULT_NAMESPACE)
    }

    /// Like [`ResId::effective_namespace`] with a caller-chosen default.
    pub fn effective_namespace_with<'a>(&'a self, default_namespace: &'a str) -> &'a str {
        if !self.gvk.is_namespaceable() {
            return NON_NAMESPACEABLE;
        }
        if self.namespace.is_empty() || self.namespace == DEFAULT_NAMESPACE {
            return default_namespace;
        }
        &self.namespace
    }
}

impl fmt::Display for ResId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let namespace = if self.namespace.is_empty() {
            "~X"
        } else {
            &self.namespace
        };
        write!(f, "{}|{}|{}", self.gvk, namespace, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_version_round_trip() {
        assert_eq!(Gvk::from_api_version("apps/v1", "Deployment").api_version(), "apps/v1");
        assert_eq!(Gvk::from_api_version("v1", "Service").api_version(), "v1");
    }

    #[test]
    fn test_effective_namespace_defaults() {
        let id = ResId::new(Gvk::new("", "v1", "ConfigMap"), "cm", "");
        assert_eq!(id.effective_namespace(), "default");

        let id = ResId::new(Gvk::new("", "v1", "ConfigMap"), "cm", "prod");
        assert_eq!(id.effective_namespace(), "prod");
    }

    #[test]
    fn test_effective_namespace_cluster_scoped() {
        let id = ResId::new(Gvk::new("rbac.authorization.k8s.io", "v1", "ClusterRole"), "r", "x");
        assert_eq!(id.effective_namespace(), NON_NAMESPACEABLE);
    }

    #[test]
    fn test_effective_namespace_custom_default() {
        let id = ResId::new(Gvk::new("", "v1", "Secret"), "s", "default");
        assert_eq!(id.effective_namespace_with("team-a"), "team-a");
    }

    #[test]
    fn test_display() {
        let id = ResId::new(Gvk::new("", "v1", "ConfigMap"), "cm", "");
        assert_eq!(id.to_string(), "~G_v1_ConfigMap|~X|cm");
    }
}

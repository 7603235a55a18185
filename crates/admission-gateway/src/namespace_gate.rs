use std::{collections::BTreeSet, fmt, sync::Arc};

/// Namespace where Kubernetes keeps its own components.
pub const NAMESPACE_SYSTEM: &str = "kube-system";
/// Namespace holding publicly readable cluster data.
pub const NAMESPACE_PUBLIC: &str = "kube-public";

type NamespacePredicate = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Decides whether the requests targeting a namespace go through the
/// admission policy.
///
/// Requests made inside of an out of scope namespace are always accepted
/// without being evaluated. The rule is chosen when the gate is built and
/// never changes afterwards.
#[derive(Clone)]
pub enum NamespaceGate {
    /// Every namespace but the listed ones is in scope.
    Ignoring(BTreeSet<String>),
    /// A caller provided rule, returning `true` for in scope namespaces.
    Predicate(NamespacePredicate),
}

impl Default for NamespaceGate {
    fn default() -> Self {
        NamespaceGate::ignoring([NAMESPACE_SYSTEM, NAMESPACE_PUBLIC])
    }
}

impl NamespaceGate {
    pub fn ignoring<I, S>(namespaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        NamespaceGate::Ignoring(namespaces.into_iter().map(Into::into).collect())
    }

    pub fn with_predicate<F>(predicate: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        NamespaceGate::Predicate(Arc::new(predicate))
    }

    pub fn is_in_scope(&self, namespace: &str) -> bool {
        match self {
            NamespaceGate::Ignoring(ignored) => !ignored.contains(namespace),
            NamespaceGate::Predicate(predicate) => predicate(namespace),
        }
    }
}

impl fmt::Debug for NamespaceGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NamespaceGate::Ignoring(ignored) => f.debug_tuple("Ignoring").field(ignored).finish(),
            NamespaceGate::Predicate(_) => write!(f, "Predicate(<custom>)"),
        }
    }
}

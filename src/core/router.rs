//! Exact-match routing table.
//!
//! Built once from configuration at startup and shared read-only afterwards; there is no
//! mutation API, so no locking is needed on the hot path.
use std::collections::BTreeMap;

use crate::config::GatewayConfig;

/// Maps an inbound URL path to its ordered upstream destinations.
#[derive(Debug, Clone, Default)]
pub struct PathRouter {
    routes: BTreeMap<String, Vec<String>>,
}

impl PathRouter {
    pub fn new(routes: BTreeMap<String, Vec<String>>) -> Self {
        Self { routes }
    }

    pub fn from_config(config: &GatewayConfig) -> Self {
        Self::new(config.routes.clone())
    }

    /// Destinations for `path`, in configured order. Only exact matches count: no prefix,
    /// wildcard or trailing slash normalization.
    pub fn resolve(&self, path: &str) -> Option<&[String]> {
        self.routes.get(path).map(Vec::as_slice)
    }

    pub fn routes(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.routes
            .iter()
            .map(|(path, destinations)| (path.as_str(), destinations.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router() -> PathRouter {
        PathRouter::from_config(
            &GatewayConfig::builder()
                .route("/dl_update_cdd.php", ["b:80", "a:80"])
                .route("/dl_parameters_file.php", ["c:80"])
                .build(),
        )
    }

    #[test]
    fn resolves_exact_path_in_configured_order() {
        let router = router();
        assert_eq!(
            router.resolve("/dl_update_cdd.php"),
            Some(&["b:80".to_string(), "a:80".to_string()][..])
        );
    }

    #[test]
    fn rejects_near_misses() {
        let router = router();
        for path in [
            "/dl_update_cdd.php/",
            "/dl_update_cdd",
            "/DL_UPDATE_CDD.PHP",
            "/dl_update_cdd.php?x=1",
            "/",
            "",
        ] {
            assert!(router.resolve(path).is_none(), "{path} should not match");
        }
    }

    #[test]
    fn lists_routes() {
        let router = router();
        assert_eq!(router.len(), 2);
        assert!(!router.is_empty());
        let paths: Vec<_> = router.routes().map(|(path, _)| path).collect();
        assert_eq!(paths, vec!["/dl_parameters_file.php", "/dl_update_cdd.php"]);
    }
}

//! Module route table and the registry built from it.
//!
//! [`MODULE_ROUTES`] is the single source of truth for which modules can be
//! launched and where their launch events go. The [`ModuleRegistry`] built
//! from it backs both request validation and channel resolution, so the
//! accepted set and the routable set are the same set.

use std::collections::HashMap;

/// One entry of the route table: a module identifier and its channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleRoute {
    /// Module identifier as submitted by callers (exact, case-sensitive).
    pub module: &'static str,
    /// Name of the downstream channel consuming this module's launch events.
    pub channel: &'static str,
}

impl ModuleRoute {
    #[must_use]
    pub const fn new(module: &'static str, channel: &'static str) -> Self {
        Self { module, channel }
    }
}

/// Every launchable module and its channel.
pub const MODULE_ROUTES: &[ModuleRoute] = &[
    ModuleRoute::new("alpha-fold", "rad-lab-launch-alpha-fold"),
    ModuleRoute::new("data-science", "rad-lab-launch-data-science"),
    ModuleRoute::new("genomics-cromwell", "rad-lab-launch-genomics-cromwell"),
    ModuleRoute::new("genomics-dsub", "rad-lab-launch-genomics-dsub"),
    ModuleRoute::new("silicon-design", "rad-lab-launch-silicon-design"),
];

/// A module identifier that has no entry in the registry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown module: {0}")]
pub struct UnknownModule(pub String);

/// A route table that breaks the one-channel-per-module invariant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteTableError {
    #[error("module {module} is listed more than once")]
    DuplicateModule { module: &'static str },
    #[error("route table contains an empty module identifier")]
    EmptyModule,
    #[error("module {module} has an empty channel name")]
    EmptyChannel { module: &'static str },
}

/// Immutable lookup from module identifier to channel name.
///
/// Built once at process start and shared behind an `Arc` by the validator,
/// the dispatcher and the HTTP layer.
#[derive(Debug, Clone)]
pub struct ModuleRegistry {
    routes: Vec<ModuleRoute>,
    by_module: HashMap<&'static str, &'static str>,
}

impl ModuleRegistry {
    /// Builds a registry from a route table, preserving table order.
    ///
    /// # Errors
    ///
    /// Returns [`RouteTableError`] if a module appears twice or if a module
    /// or channel name is empty.
    pub fn from_routes(routes: &[ModuleRoute]) -> Result<Self, RouteTableError> {
        let mut by_module = HashMap::with_capacity(routes.len());
        for route in routes {
            if route.module.is_empty() {
                return Err(RouteTableError::EmptyModule);
            }
            if route.channel.is_empty() {
                return Err(RouteTableError::EmptyChannel {
                    module: route.module,
                });
            }
            if by_module.insert(route.module, route.channel).is_some() {
                return Err(RouteTableError::DuplicateModule {
                    module: route.module,
                });
            }
        }

        Ok(Self {
            routes: routes.to_vec(),
            by_module,
        })
    }

    /// Returns the channel for `module`.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownModule`] when the identifier is not in the table.
    pub fn resolve(&self, module: &str) -> Result<&'static str, UnknownModule> {
        self.by_module
            .get(module)
            .copied()
            .ok_or_else(|| UnknownModule(module.to_string()))
    }

    /// Whether `module` is a launchable module.
    #[must_use]
    pub fn contains(&self, module: &str) -> bool {
        self.by_module.contains_key(module)
    }

    /// Module identifiers in table order.
    pub fn module_ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.routes.iter().map(|route| route.module)
    }

    /// All routes in table order.
    #[must_use]
    pub fn routes(&self) -> &[ModuleRoute] {
        &self.routes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl Default for ModuleRegistry {
    /// The registry over [`MODULE_ROUTES`].
    fn default() -> Self {
        let by_module = MODULE_ROUTES
            .iter()
            .map(|route| (route.module, route.channel))
            .collect();
        Self {
            routes: MODULE_ROUTES.to_vec(),
            by_module,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_table_is_well_formed() {
        let registry = ModuleRegistry::from_routes(MODULE_ROUTES).unwrap();
        assert_eq!(registry.len(), MODULE_ROUTES.len());
    }

    #[test]
    fn default_matches_builtin_table() {
        let registry = ModuleRegistry::default();
        let ids: Vec<_> = registry.module_ids().collect();
        let expected: Vec<_> = MODULE_ROUTES.iter().map(|r| r.module).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn resolves_known_modules() {
        let registry = ModuleRegistry::default();
        assert_eq!(
            registry.resolve("alpha-fold").unwrap(),
            "rad-lab-launch-alpha-fold"
        );
        assert_eq!(
            registry.resolve("genomics-dsub").unwrap(),
            "rad-lab-launch-genomics-dsub"
        );
    }

    #[test]
    fn unknown_module_is_signalled() {
        let registry = ModuleRegistry::default();
        assert_eq!(
            registry.resolve("quantum").unwrap_err(),
            UnknownModule("quantum".to_string())
        );
    }

    #[test]
    fn builtin_table_routes_exactly_five_modules() {
        let registry = ModuleRegistry::default();
        let ids: Vec<_> = registry.module_ids().collect();
        assert_eq!(
            ids,
            [
                "alpha-fold",
                "data-science",
                "genomics-cromwell",
                "genomics-dsub",
                "silicon-design"
            ]
        );
        assert!(!registry.contains("billing-budget"));
    }

    #[test]
    fn resolve_is_case_sensitive() {
        let registry = ModuleRegistry::default();
        assert!(registry.resolve("Alpha-Fold").is_err());
        assert!(registry.resolve("alpha_fold").is_err());
        assert!(!registry.contains(" alpha-fold"));
    }

    #[test]
    fn duplicate_module_rejected() {
        let routes = [
            ModuleRoute::new("a", "chan-a"),
            ModuleRoute::new("a", "chan-b"),
        ];
        assert_eq!(
            ModuleRegistry::from_routes(&routes).unwrap_err(),
            RouteTableError::DuplicateModule { module: "a" }
        );
    }

    #[test]
    fn empty_names_rejected() {
        assert_eq!(
            ModuleRegistry::from_routes(&[ModuleRoute::new("", "chan")]).unwrap_err(),
            RouteTableError::EmptyModule
        );
        assert_eq!(
            ModuleRegistry::from_routes(&[ModuleRoute::new("a", "")]).unwrap_err(),
            RouteTableError::EmptyChannel { module: "a" }
        );
    }

    #[test]
    fn custom_table_preserves_order() {
        let routes = [ModuleRoute::new("z", "chan-z"), ModuleRoute::new("a", "chan-a")];
        let registry = ModuleRegistry::from_routes(&routes).unwrap();
        assert_eq!(registry.routes(), &routes);
        assert!(!registry.contains("alpha-fold"));
    }
}

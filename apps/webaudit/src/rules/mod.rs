//! Rule modules and the registry the orchestrator dispatches through.
//!
//! Each module inspects the shared [`Page`] and reports issues plus passed
//! checks for one [`AuditType`]. New batteries are added by registering a
//! module, not by editing the orchestrator.

pub mod accessibility;
pub mod best_practices;
pub mod performance;
pub mod pwa;
pub mod security;
pub mod seo;

use crate::audits::AuditType;
use crate::error::Result;
use crate::ids::IdGenerator;
use crate::models::AuditOutcome;
use crate::page::Page;
use async_trait::async_trait;
use std::collections::BTreeMap;

/// What a rule module gets to see during a run.
pub struct AuditContext<'a> {
    pub page: &'a Page,
    pub ids: &'a IdGenerator,
}

/// Trait implemented by every rule module.
#[async_trait(?Send)]
pub trait RuleModule {
    /// Human-readable name of this module.
    fn name(&self) -> &str;

    /// Inspect the page. Recoverable conditions should become issues; an
    /// `Err` marks the whole module as failed for this run.
    async fn audit(&self, ctx: &AuditContext<'_>) -> Result<AuditOutcome>;
}

/// Mapping from audit type to its rule module.
#[derive(Default)]
pub struct RuleRegistry {
    modules: BTreeMap<AuditType, Box<dyn RuleModule>>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the six built-in modules.
    pub fn with_defaults() -> Result<Self> {
        let mut registry = Self::new();
        registry.register(AuditType::Accessibility, accessibility::AccessibilityRules);
        registry.register(AuditType::Performance, performance::PerformanceRules);
        registry.register(AuditType::Seo, seo::SeoRules);
        registry.register(AuditType::Security, security::SecurityRules::new()?);
        registry.register(AuditType::BestPractices, best_practices::BestPracticeRules);
        registry.register(AuditType::Pwa, pwa::PwaRules);
        Ok(registry)
    }

    /// Register or replace the module for `audit`.
    pub fn register(&mut self, audit: AuditType, module: impl RuleModule + 'static) {
        self.modules.insert(audit, Box::new(module));
    }

    pub fn get(&self, audit: AuditType) -> Option<&dyn RuleModule> {
        self.modules.get(&audit).map(|m| m.as_ref())
    }

    pub fn contains(&self, audit: AuditType) -> bool {
        self.modules.contains_key(&audit)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_cover_every_audit_type() {
        let registry = RuleRegistry::with_defaults().unwrap();
        assert_eq!(registry.len(), AuditType::ALL.len());
        for audit in AuditType::ALL {
            assert!(registry.contains(audit), "missing {audit}");
        }
        assert_eq!(registry.get(AuditType::Seo).unwrap().name(), "SEO");
    }
}

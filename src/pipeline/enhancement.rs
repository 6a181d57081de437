/// Why enhancement did not run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NotRequested,
    NotConfigured,
}

/// Result of the best-effort enhancement step.
///
/// "Skipped" and "attempted but failed" stay distinct so the logs can tell a
/// misconfigured deployment from a flaky provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnhancementOutcome {
    Skipped(SkipReason),
    Enhanced(String),
    Failed { reason: String },
}

impl EnhancementOutcome {
    /// The text the pipeline continues with.
    pub fn resolve(&self, original: &str) -> String {
        match self {
            EnhancementOutcome::Enhanced(text) => text.clone(),
            EnhancementOutcome::Skipped(_) | EnhancementOutcome::Failed { .. } => {
                original.to_string()
            }
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EnhancementOutcome::Skipped(SkipReason::NotRequested) => "not_requested",
            EnhancementOutcome::Skipped(SkipReason::NotConfigured) => "not_configured",
            EnhancementOutcome::Enhanced(_) => "enhanced",
            EnhancementOutcome::Failed { .. } => "failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_falls_back_to_original() {
        let original = "pt has fever";
        assert_eq!(
            EnhancementOutcome::Enhanced("Patient has a fever.".into()).resolve(original),
            "Patient has a fever."
        );
        assert_eq!(
            EnhancementOutcome::Failed { reason: "timeout".into() }.resolve(original),
            original
        );
        assert_eq!(
            EnhancementOutcome::Skipped(SkipReason::NotConfigured).resolve(original),
            original
        );
    }
}

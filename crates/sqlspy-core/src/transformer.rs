//! The hook a host calls for every module it loads.

use parking_lot::Mutex;
use serde::Serialize;
use std::borrow::Cow;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::Level;

use sqlspy_types::{Diagnostic, LogSink, RewriteTarget};

use crate::rewriter::{ModuleRewriter, RewriteOutcome};

/// Invoked by the host for each module before it is defined.
///
/// Returning the input unchanged means "leave this module alone". An
/// implementation must never fail or unwind into the host.
pub trait ModuleTransformer: Send + Sync {
    fn transform<'a>(&self, identity: &str, bytes: &'a [u8]) -> Cow<'a, [u8]>;
}

/// Counters for what the transformer did, by outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TransformStats {
    /// Modules whose identity matched the target.
    pub inspected: usize,
    pub rewritten: usize,
    pub no_match: usize,
    pub already_rewritten: usize,
    pub failed: usize,
}

/// [`ModuleTransformer`] that redirects the configured connection method.
pub struct StatementTransformer {
    rewriter: ModuleRewriter,
    sink: Arc<dyn LogSink>,
    stats: Mutex<TransformStats>,
}

impl StatementTransformer {
    pub fn new(target: RewriteTarget, sink: Arc<dyn LogSink>) -> Self {
        Self {
            rewriter: ModuleRewriter::new(target),
            sink,
            stats: Mutex::new(TransformStats::default()),
        }
    }

    pub fn rewriter(&self) -> &ModuleRewriter {
        &self.rewriter
    }

    pub fn stats(&self) -> TransformStats {
        *self.stats.lock()
    }

    pub fn reset_stats(&self) {
        *self.stats.lock() = TransformStats::default();
    }
}

impl ModuleTransformer for StatementTransformer {
    fn transform<'a>(&self, identity: &str, bytes: &'a [u8]) -> Cow<'a, [u8]> {
        if !self.rewriter.matches_identity(identity) {
            return Cow::Borrowed(bytes);
        }
        self.stats.lock().inspected += 1;

        let outcome = catch_unwind(AssertUnwindSafe(|| self.rewriter.try_rewrite(bytes)));
        let method = &self.rewriter.target().method;
        let (diagnostic, result) = match outcome {
            Ok(Ok(RewriteOutcome::Rewritten { bytes: out, report })) => {
                self.stats.lock().rewritten += 1;
                let message = format!(
                    "redirected {}.{}{} through {} (original kept as {})",
                    report.class_name,
                    report.method,
                    report.descriptor,
                    report.proxy_class,
                    report.renamed_method
                );
                (Diagnostic::new(Level::INFO, message), Cow::Owned(out))
            }
            Ok(Ok(RewriteOutcome::NoMatch)) => {
                self.stats.lock().no_match += 1;
                let message = format!("{} declares no method {}", identity, method);
                (Diagnostic::debug(message), Cow::Borrowed(bytes))
            }
            Ok(Ok(RewriteOutcome::AlreadyRewritten)) => {
                self.stats.lock().already_rewritten += 1;
                let message = format!("{} is already rewritten, leaving it unchanged", identity);
                (Diagnostic::debug(message), Cow::Borrowed(bytes))
            }
            Ok(Err(e)) => {
                self.stats.lock().failed += 1;
                let message = format!("failed to rewrite {}: {:#}", identity, e);
                (Diagnostic::warn(message), Cow::Borrowed(bytes))
            }
            Err(_) => {
                self.stats.lock().failed += 1;
                let message = format!("rewriter panicked on {}, leaving it unchanged", identity);
                (Diagnostic::warn(message), Cow::Borrowed(bytes))
            }
        };
        self.sink.diagnostic(&diagnostic);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlspy_types::MemorySink;

    #[test]
    fn test_unrelated_modules_are_not_counted() {
        let sink = MemorySink::shared();
        let transformer = StatementTransformer::new(RewriteTarget::default(), sink.clone());
        let bytes = b"not a class";
        let out = transformer.transform("java/lang/String", bytes);
        assert!(matches!(out, Cow::Borrowed(_)));
        assert_eq!(transformer.stats(), TransformStats::default());
        assert!(sink.diagnostics().is_empty());
    }

    #[test]
    fn test_failures_are_reported_and_counted() {
        let sink = MemorySink::shared();
        let transformer = StatementTransformer::new(RewriteTarget::default(), sink.clone());
        let bytes = b"\xCA\xFE\xBA\xBE";
        let out = transformer.transform("com.mysql.jdbc.ConnectionImpl", bytes);
        assert_eq!(&*out, &bytes[..]);

        let stats = transformer.stats();
        assert_eq!(stats.inspected, 1);
        assert_eq!(stats.failed, 1);
        let diagnostics = sink.diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].level, Level::WARN);
        assert!(diagnostics[0].message.starts_with("failed to rewrite com.mysql.jdbc.ConnectionImpl"));

        transformer.reset_stats();
        assert_eq!(transformer.stats(), TransformStats::default());
    }
}

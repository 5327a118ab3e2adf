use std::error::Error;

/// Sink for every error caught at an orchestration boundary
pub trait ErrorReporter: Send + Sync {
    fn report_error(&self, tag: &str, context: serde_json::Value, error: &(dyn Error + 'static));
}

/// Default sink: structured `tracing` events carrying the full error chain
#[derive(Debug, Default, Clone)]
pub struct TracingErrorReporter;

impl ErrorReporter for TracingErrorReporter {
    fn report_error(&self, tag: &str, context: serde_json::Value, error: &(dyn Error + 'static)) {
        tracing::error!(
            error.tag = tag,
            error.context = %context,
            error.chain = %error_chain(error),
            "❌ {}: {}", tag, error
        );
    }
}

/// Renders an error and all of its sources, outermost first
pub fn error_chain(error: &(dyn Error + 'static)) -> String {
    let mut chain = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        chain.push_str("\n  caused by: ");
        chain.push_str(&cause.to_string());
        source = cause.source();
    }
    chain
}

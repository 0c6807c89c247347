// ABOUTME: Human approval channel: fire-and-forget browser launching.
// ABOUTME: Failure to open a browser never aborts the issuance workflow.

/// Side channel that puts an approval URL in front of the human.
///
/// Fire-and-forget by contract: implementations log failures and return.
/// The poll loop's bounded budget already covers the case where the human
/// never sees or never acts on the URL.
pub trait ApprovalChannel {
    fn open(&self, url: &str);
}

impl<T: ApprovalChannel> ApprovalChannel for std::sync::Arc<T> {
    fn open(&self, url: &str) {
        (**self).open(url)
    }
}

/// Production channel: opens the URL in the system browser, detached.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserApproval;

impl ApprovalChannel for BrowserApproval {
    fn open(&self, url: &str) {
        tracing::info!(%url, "opening browser");
        if let Err(e) = open::that_detached(url) {
            tracing::warn!(error = %e, %url, "could not open browser; open the URL manually");
        }
    }
}

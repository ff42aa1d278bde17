/// Output port: turn a stored photo reference into a URL clients can fetch.
pub trait PhotoUrlResolver: Send + Sync {
    fn resolve(&self, reference: &str) -> String;
}

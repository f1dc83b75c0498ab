/// Classification for retry policy.
///
/// Determines how the retry executor responds to an error from the
/// aggregator API.
///
/// | Class | Behavior |
/// |-------|----------|
/// | `RateLimit` | Exponential backoff + jitter, up to the rate-limit attempt cap |
/// | `Transient` | Gentler linear backoff, fewer attempts |
/// | `Terminal` | Propagate immediately, never retried |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// The aggregator signaled throttling (HTTP 429 or an explicit
    /// rate-limit error code). Worth waiting out with exponential backoff.
    RateLimit,

    /// A transient transport failure (timeout, connection reset) that may
    /// clear on its own. Retried a few times with linear backoff.
    Transient,

    /// Everything else: invalid credentials, malformed requests,
    /// institution-side failures. Retrying won't help.
    Terminal,
}

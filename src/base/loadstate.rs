/// The progress of a single request/response exchange.
///
/// ```text
/// Pending -> Sent -> InterceptedOutgoing -> TransportExecuted
///         -> InterceptedIncoming -> Delivered | Failed
/// ```
///
/// An exchange can move to `Failed` from any non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExchangeState {
    /// The request has been built but not handed to the pipeline.
    #[default]
    Pending,

    /// The request was resolved and entered the pipeline.
    Sent,

    /// Request interceptors have run (validators, `Accept-Encoding`).
    InterceptedOutgoing,

    /// The transport returned a response head.
    TransportExecuted,

    /// Response interceptors have run (decoding, cache update, 304 rewrite).
    InterceptedIncoming,

    /// The handler ran and the entity was released.
    Delivered,

    /// A transport error, interceptor error, status error or handler error
    /// ended the exchange. The entity, if any, was released.
    Failed,
}

impl ExchangeState {
    pub fn is_terminal(self) -> bool {
        matches!(self, ExchangeState::Delivered | ExchangeState::Failed)
    }
}

//! Base types and error handling.
//!
//! - [`NetError`](neterror::NetError): transport error codes modelled on `net_error_list.h`
//! - [`FetchError`](error::FetchError): everything `fetch`/`fetch_ok` can fail with
//! - [`ExchangeState`](loadstate::ExchangeState): lifecycle of one exchange

pub mod context;
pub mod error;
pub mod loadstate;
pub mod neterror;

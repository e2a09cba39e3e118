pub mod cachekey;
pub mod gzip;
pub mod httpcache;
pub mod interceptor;
pub mod method;
pub mod request;
pub mod requestbody;
pub mod response;
pub mod responsebody;
pub mod transaction;
pub mod transport;

// Re-exports for convenience
pub use cachekey::{ExchangeContext, RequestKey};
pub use gzip::GzipDecodingEntity;
pub use httpcache::{CacheEntry, ResponseCache};
pub use interceptor::{ConditionalCache, RequestInterceptor, ResponseInterceptor};
pub use method::Method;
pub use request::{OutgoingRequest, Request};
pub use requestbody::RequestBody;
pub use response::HttpResponse;
pub use responsebody::ResponseBody;
pub use transport::{HyperTransport, Transport};

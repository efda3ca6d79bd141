//! # memoproxy
//!
//! Memoizing prediction proxy. Wrap any model behind a cache keyed by request so that repeated
//! identical requests are answered without recomputation.
//!
//! ## Main pieces
//!
//! - [`Predictor`]: the one-method model capability (`predict(input) -> output`).
//! - [`CachingProxy`]: wraps a `Predictor`, caches successful outputs per input, and is itself
//!   a `Predictor`. Failures are returned unchanged and never cached. Concurrent requests for the
//!   same input share one model call.
//! - [`Memoized`]: the same cache in front of a plain synchronous function, usually keyed by
//!   [`CallArgs`] (positional arguments plus keyword arguments in sorted order).
//! - [`Validated`]: rejects empty or whitespace-only text with [`InvalidInput`] before anything
//!   else runs.
//! - [`EchoModel`], [`SentimentModel`]: demo models that count their invocations.
//!
//! Every cache belongs to the object that created it; there is no global state.
//!
//! ## Quick start
//!
//! ```rust
//! use memoproxy::{CacheStatus, CachingProxy, EchoModel};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let proxy = CachingProxy::new(EchoModel::new());
//! let input = "Some input text".to_string();
//!
//! let (first, status) = proxy.predict_with_status(&input).await.unwrap();
//! assert_eq!(first, "Prediction for Some input text");
//! assert_eq!(status, CacheStatus::Miss);
//!
//! let (_, status) = proxy.predict_with_status(&input).await.unwrap();
//! assert_eq!(status, CacheStatus::Hit);
//! assert_eq!(proxy.inner().calls(), 1);
//! # }
//! ```

pub mod cache;
pub mod error;
pub mod key;
pub mod models;
pub mod predictor;
pub mod validate;

pub use cache::{CacheStats, CacheStatus, CachingProxy, Memoized};
pub use error::{InvalidInput, PredictError};
pub use key::{ArgValue, CallArgs};
pub use models::{EchoModel, ModelKind, SentimentModel};
pub use predictor::{predictor_fn, FnPredictor, Predictor};
pub use validate::{validate_text, Validated};

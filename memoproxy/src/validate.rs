//! Input validation layer for text predictors.
//!
//! Place it outside a [`CachingProxy`](crate::CachingProxy) so that rejected input never reaches
//! the cache or the model:
//!
//! ```
//! # use memoproxy::{CachingProxy, EchoModel, PredictError, Predictor, Validated};
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let guarded = Validated::new(CachingProxy::new(EchoModel::new()));
//! let err = guarded.predict(&"   ".to_string()).await.unwrap_err();
//! assert!(matches!(err, PredictError::InvalidInput(_)));
//! assert!(guarded.inner().is_empty());
//! # }
//! ```

use async_trait::async_trait;

use crate::cache::{CacheStatus, CachingProxy};
use crate::error::InvalidInput;
use crate::predictor::Predictor;

/// Rejects empty and whitespace-only text before delegating to `inner`.
pub struct Validated<P> {
    inner: P,
}

impl<P> Validated<P> {
    pub fn new(inner: P) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }
}

impl<P> Validated<CachingProxy<P>>
where
    P: Predictor<Input = String>,
    P::Error: From<InvalidInput>,
{
    /// [`CachingProxy::predict_with_status`] behind the same check as [`Predictor::predict`].
    pub async fn predict_with_status(
        &self,
        input: &String,
    ) -> Result<(P::Output, CacheStatus), P::Error> {
        check(input)?;
        self.inner.predict_with_status(input).await
    }
}

/// Checks that `text` has at least one non-whitespace character.
pub fn validate_text(text: &str) -> Result<(), InvalidInput> {
    if text.trim().is_empty() {
        return Err(InvalidInput::new("input must be a non-empty string"));
    }
    Ok(())
}

#[async_trait]
impl<P> Predictor for Validated<P>
where
    P: Predictor<Input = String>,
    P::Error: From<InvalidInput>,
{
    type Input = String;
    type Output = P::Output;
    type Error = P::Error;

    async fn predict(&self, input: &String) -> Result<Self::Output, Self::Error> {
        check(input)?;
        self.inner.predict(input).await
    }
}

fn check(input: &str) -> Result<(), InvalidInput> {
    validate_text(input).map_err(|e| {
        tracing::debug!(input = %input, error = %e, "rejected input");
        e
    })
}

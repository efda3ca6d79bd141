//! The model capability: one async `predict` call from an input to an output.
//!
//! Everything in this crate is written against [`Predictor`]: the demo models implement it,
//! [`CachingProxy`](crate::CachingProxy) both consumes and implements it, and
//! [`Validated`](crate::Validated) layers on top of any implementation.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;

/// A prediction-producing capability.
///
/// Implementations decide what an input and an output are. Calling `predict` twice with equal
/// inputs may have side effects (e.g. counting invocations) but should return equal outputs for
/// caching on top of it to be sound.
#[async_trait]
pub trait Predictor: Send + Sync {
    /// Request type; also the cache key when wrapped by a proxy.
    type Input: Send + Sync;
    /// Prediction type; cloned out of the cache on every hit.
    type Output: Clone + Send + Sync;
    /// Failure type; passed through caches unchanged.
    type Error: Send;

    /// Computes the prediction for `input`.
    async fn predict(&self, input: &Self::Input) -> Result<Self::Output, Self::Error>;
}

#[async_trait]
impl<P> Predictor for Arc<P>
where
    P: Predictor + ?Sized,
{
    type Input = P::Input;
    type Output = P::Output;
    type Error = P::Error;

    async fn predict(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
        (**self).predict(input).await
    }
}

#[async_trait]
impl<P> Predictor for Box<P>
where
    P: Predictor + ?Sized,
{
    type Input = P::Input;
    type Output = P::Output;
    type Error = P::Error;

    async fn predict(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
        (**self).predict(input).await
    }
}

/// Adapts a synchronous closure into a [`Predictor`]. Build with [`predictor_fn`].
pub struct FnPredictor<F, I, O, E> {
    f: F,
    _marker: PhantomData<fn(&I) -> Result<O, E>>,
}

/// Wraps `f` so it can be handed to anything expecting a [`Predictor`].
///
/// ```
/// # use memoproxy::{predictor_fn, Predictor};
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let shout = predictor_fn(|s: &String| Ok::<_, ()>(s.to_uppercase()));
/// assert_eq!(shout.predict(&"hi".to_string()).await, Ok("HI".to_string()));
/// # }
/// ```
pub fn predictor_fn<F, I, O, E>(f: F) -> FnPredictor<F, I, O, E>
where
    F: Fn(&I) -> Result<O, E>,
{
    FnPredictor {
        f,
        _marker: PhantomData,
    }
}

#[async_trait]
impl<F, I, O, E> Predictor for FnPredictor<F, I, O, E>
where
    F: Fn(&I) -> Result<O, E> + Send + Sync,
    I: Send + Sync,
    O: Clone + Send + Sync,
    E: Send,
{
    type Input = I;
    type Output = O;
    type Error = E;

    async fn predict(&self, input: &I) -> Result<O, E> {
        (self.f)(input)
    }
}

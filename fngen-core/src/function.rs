//! Callable handle for generated functions and its composition
//!
//! Transforms composed before or after a function run outside the engine.
//! Their failures surface as [`FunctionError::Transform`] with the original
//! error untouched, so they can never be mistaken for backend failures.

use crate::errors::{BoxError, FunctionError, FunctionResult};
use async_trait::async_trait;
use std::convert::Infallible;
use std::sync::Arc;

/// Anything that can be invoked like a generated function
#[async_trait]
pub trait Callable<I, O>: Send + Sync {
    async fn call(&self, input: I) -> FunctionResult<O>;
}

type Transform<A, B> = Arc<dyn Fn(A) -> Result<B, BoxError> + Send + Sync>;

/// A configured, immutable function. Cloning is cheap and clones may be
/// invoked concurrently.
pub struct GeneratedFunction<I, O> {
    inner: Arc<dyn Callable<I, O>>,
}

impl<I, O> Clone for GeneratedFunction<I, O> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<I, O> GeneratedFunction<I, O>
where
    I: Send + 'static,
    O: Send + 'static,
{
    pub fn new(callable: impl Callable<I, O> + 'static) -> Self {
        Self { inner: Arc::new(callable) }
    }

    pub async fn call(&self, input: I) -> FunctionResult<O> {
        self.inner.call(input).await
    }

    /// Apply `transform` to the input before invoking this function
    pub fn compose<J, F>(self, transform: F) -> GeneratedFunction<J, O>
    where
        J: Send + 'static,
        F: Fn(J) -> I + Send + Sync + 'static,
    {
        self.try_compose(move |input| Ok::<I, Infallible>(transform(input)))
    }

    /// Fallible variant of [`compose`](Self::compose)
    pub fn try_compose<J, F, E>(self, transform: F) -> GeneratedFunction<J, O>
    where
        J: Send + 'static,
        F: Fn(J) -> Result<I, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        let transform: Transform<J, I> = Arc::new(move |input| transform(input).map_err(Into::into));
        GeneratedFunction::new(Before { transform, inner: self })
    }

    /// Apply `transform` to every successfully decoded output
    pub fn and_then<P, F>(self, transform: F) -> GeneratedFunction<I, P>
    where
        P: Send + 'static,
        F: Fn(O) -> P + Send + Sync + 'static,
    {
        self.try_and_then(move |output| Ok::<P, Infallible>(transform(output)))
    }

    /// Fallible variant of [`and_then`](Self::and_then)
    pub fn try_and_then<P, F, E>(self, transform: F) -> GeneratedFunction<I, P>
    where
        P: Send + 'static,
        F: Fn(O) -> Result<P, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        let transform: Transform<O, P> =
            Arc::new(move |output| transform(output).map_err(Into::into));
        GeneratedFunction::new(After { inner: self, transform })
    }
}

struct Before<J, I, O> {
    transform: Transform<J, I>,
    inner: GeneratedFunction<I, O>,
}

#[async_trait]
impl<J, I, O> Callable<J, O> for Before<J, I, O>
where
    J: Send + 'static,
    I: Send + 'static,
    O: Send + 'static,
{
    async fn call(&self, input: J) -> FunctionResult<O> {
        let mapped = (self.transform)(input).map_err(FunctionError::transform)?;
        self.inner.call(mapped).await
    }
}

struct After<I, O, P> {
    inner: GeneratedFunction<I, O>,
    transform: Transform<O, P>,
}

#[async_trait]
impl<I, O, P> Callable<I, P> for After<I, O, P>
where
    I: Send + 'static,
    O: Send + 'static,
    P: Send + 'static,
{
    async fn call(&self, input: I) -> FunctionResult<P> {
        let output = self.inner.call(input).await?;
        (self.transform)(output).map_err(FunctionError::transform)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Doubler;

    #[async_trait]
    impl Callable<i32, i32> for Doubler {
        async fn call(&self, input: i32) -> FunctionResult<i32> {
            if input < 0 {
                return Err(FunctionError::unclassified("negative"));
            }
            Ok(input * 2)
        }
    }

    #[tokio::test]
    async fn test_compose_and_then() {
        let function = GeneratedFunction::new(Doubler)
            .compose(|text: &'static str| text.len() as i32)
            .and_then(|n| format!("{} chars doubled", n));

        assert_eq!(function.call("abc").await.unwrap(), "6 chars doubled");
    }

    #[tokio::test]
    async fn test_transform_failures_are_not_reclassified() {
        let function = GeneratedFunction::new(Doubler)
            .try_compose(|text: String| text.parse::<i32>());

        match function.call("not a number".to_string()).await {
            Err(FunctionError::Transform { source }) => {
                assert!(source.downcast_ref::<std::num::ParseIntError>().is_some())
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_inner_failures_pass_through_post_transform() {
        let function = GeneratedFunction::new(Doubler).try_and_then(|n: i32| {
            if n > 100 { Err("too large") } else { Ok(n) }
        });

        assert!(matches!(
            function.call(-1).await,
            Err(FunctionError::UnclassifiedRemote { .. })
        ));
        assert!(matches!(function.call(60).await, Err(FunctionError::Transform { .. })));
        assert_eq!(function.call(5).await.unwrap(), 10);
    }
}

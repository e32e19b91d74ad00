use axum::extract::{FromRequestParts, Request};
use std::{future::Future, pin::Pin};

use crate::{context::Context, html, LiveResponse};

/// Route functions that drive a live session: they take the session's
/// [`Context`], plus at most one axum extractor, and return the rendered
/// tree.
pub trait LiveHandler<T, S>: Clone + Send + Sized + 'static {
    type Future: Future<Output = LiveResponse> + Send + 'static;

    fn call(self, req: Request, state: S, context: Context) -> Self::Future;
}

impl<F, Fut, S> LiveHandler<((),), S> for F
where
    F: FnOnce(Context) -> Fut + Clone + Send + 'static,
    Fut: Future<Output = LiveResponse> + Send,
{
    type Future = Pin<Box<dyn Future<Output = LiveResponse> + Send>>;

    fn call(self, _req: Request, _state: S, context: Context) -> Self::Future {
        Box::pin(async move { self(context).await })
    }
}

impl<F, Fut, S, T> LiveHandler<((T,),), S> for F
where
    F: FnOnce(Context, T) -> Fut + Clone + Send + 'static,
    Fut: Future<Output = LiveResponse> + Send,
    S: Send + Sync + 'static,
    T: FromRequestParts<S>,
{
    type Future = Pin<Box<dyn Future<Output = LiveResponse> + Send>>;

    fn call(self, req: Request, state: S, context: Context) -> Self::Future {
        Box::pin(async move {
            let (mut parts, _body) = req.into_parts();

            let t = match T::from_request_parts(&mut parts, &state).await {
                Ok(value) => value,
                Err(_rejection) => {
                    // an extractor refusing the request kills the session
                    // before it starts; make sure nothing loads for it
                    tracing::error!("extractor rejected the request");
                    context.lifecycle.shutdown();
                    return context.with(html::div(html::Content::Empty, Default::default()));
                }
            };

            self(context, t).await
        })
    }
}

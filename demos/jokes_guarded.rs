//! Version two: commit only while the session is still live.
//!
//! The liveness check stops writes after teardown, which is real progress.
//! But two quick presses still race each other: both requests are live, both
//! pass the check, and the one that finishes last wins regardless of which
//! press it belongs to.

use std::sync::Arc;

use axum::Router;
use punchline::{
    attrs,
    context::Context,
    html::{button, div, h1, p, Content},
    joke::JokeApi,
    live::live,
    LiveResponse,
};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "punchline=debug".into()),
        )
        .init();

    let app = Router::new().route("/", live(jokes));

    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

async fn jokes(mut ctx: Context) -> LiveResponse {
    let joke = ctx.use_state(String::new());
    let api = Arc::new(JokeApi::default());
    let lifecycle = ctx.lifecycle();

    let next = ctx.use_closure(move || {
        let api = api.clone();
        let lifecycle = lifecycle.clone();
        async move {
            match api.fetch_joke(CancellationToken::new()).await {
                Ok(text) if lifecycle.is_live() => joke.set(text),
                Ok(_) => tracing::info!("session ended before the joke arrived, dropping it"),
                Err(err) => tracing::error!(%err, "fetch failed"),
            }
        }
    });

    ctx.with(div(
        Content::List(vec![
            h1("A joke walks into a bar", Default::default()).into(),
            p(joke, Default::default()).into(),
            button("Another one", attrs!("onclick" => next)).into(),
        ]),
        Default::default(),
    ))
}

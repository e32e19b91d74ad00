//! Version one: fetch in the click closure, commit unconditionally.
//!
//! Looks fine until it doesn't. Two quick presses put two requests in
//! flight, and whichever response lands *last* wins, even if it belongs to
//! the earlier press. Nothing stops a response from landing after the
//! session is gone, either.

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

    let next = ctx.use_closure(move || {
        let api = api.clone();
        async move {
            // a token nobody ever cancels
            match api.fetch_joke(CancellationToken::new()).await {
                Ok(text) => joke.set(text),
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

//! The joke component done right: one load per button press, driven through
//! a resource, so a superseded request is cancelled and a stale response can
//! never overwrite a newer joke.

use std::sync::Arc;

use axum::{extract::State, Router};
use punchline::{
    attrs,
    context::Context,
    html::{button, div, h1, p, style, Content},
    joke::JokeApi,
    live::live,
    LiveResponse,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "punchline=debug".into()),
        )
        .init();

    let app = Router::new()
        .route("/", live(jokes))
        .with_state(Arc::new(JokeApi::default()));

    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

async fn jokes(mut ctx: Context, State(api): State<Arc<JokeApi>>) -> LiveResponse {
    // the trigger: its value never matters, only that it changed
    let refresh = ctx.use_state(0u32);

    let joke = ctx.use_resource(refresh, String::new(), move |_: u32, cancel| {
        let api = api.clone();
        async move { api.fetch_joke(cancel).await }
    });

    let next = ctx.use_closure(move || async move {
        refresh.modify(|n| n.wrapping_add(1));
    });

    ctx.with(div(
        Content::List(vec![
            style(
                Content::Raw(html_escape::encode_style(include_str!("styles.css")).to_string()),
                Default::default(),
            )
            .into(),
            h1("A joke walks into a bar", Default::default()).into(),
            p(joke, Default::default()).into(),
            button("Another one", attrs!("onclick" => next)).into(),
        ]),
        Default::default(),
    ))
}

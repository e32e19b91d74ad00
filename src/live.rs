use axum::{
    body::Body,
    extract::{
        ws::{Message, WebSocket},
        FromRequestParts, Request, WebSocketUpgrade,
    },
    http::{self, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, MethodRouter},
    Extension,
};
use serde::{Deserialize, Serialize};
use tokio::select;

use crate::{
    closures::Closures, config::Config, context::Context, handler::LiveHandler,
    random_id::RandomId,
};

/// Query parameter carrying the session seed from the rendered page back to
/// the websocket upgrade, so both runs of the handler allocate the same ids.
const SEED_PARAM: &str = "lv-seed";

/// Serves a live component on one route.
///
/// A plain GET renders the full page. The adapter script on that page opens
/// a websocket back to the same route, which re-runs the handler with the
/// same seed and then drives the session: closure calls come in, state
/// updates go out, and resources load and reload until the client goes away.
pub fn live<T, H, S>(handler: H) -> MethodRouter<S>
where
    H: LiveHandler<T, S>,
    S: Clone + Send + Sync + 'static,
{
    get(
        |axum::extract::State(state): axum::extract::State<S>,
         config: Option<Extension<Config>>,
         request: Request| async move {
            let config = config.map(|c| c.0).unwrap_or_default();

            let is_websocket = request
                .headers()
                .get("Upgrade")
                .and_then(|v| v.to_str().ok())
                == Some("websocket");

            if !is_websocket {
                let context = Context::new(rand::random());
                let response = handler.call(request, state, context).await;

                let (parts, render) = response.into_parts();
                let html = render.context.render_page(render.element, &config);

                return Response::from_parts(parts, Body::from(html));
            }

            let Some(seed) = session_seed(&request) else {
                return (StatusCode::BAD_REQUEST, "missing session seed").into_response();
            };

            let (mut parts, body) = request.into_parts();
            let upgrade = match WebSocketUpgrade::from_request_parts(&mut parts, &state).await {
                Ok(upgrade) => upgrade,
                Err(rejection) => return rejection.into_response(),
            };
            let request = Request::from_parts(parts, body);

            let response = handler.call(request, state, Context::new(seed)).await;

            upgrade
                .on_upgrade(move |socket| async move {
                    let (_parts, render) = response.into_parts();
                    session(socket, render.context).await;
                })
                .into_response()
        },
    )
}

fn session_seed<B>(request: &http::Request<B>) -> Option<u64> {
    request.uri().query()?.split('&').find_map(|pair| {
        pair.strip_prefix(SEED_PARAM)?
            .strip_prefix('=')?
            .parse()
            .ok()
    })
}

/// One websocket session: the component is mounted while this runs.
async fn session(mut socket: WebSocket, context: Context) {
    let Context {
        mut states,
        mut closures,
        mut resources,
        lifecycle,
        ..
    } = context;

    // dropping the guard is the teardown: flips the liveness flag and
    // cancels every outstanding request token, on every exit path
    let _teardown = lifecycle.guard();

    // the session starting is the component's mount
    resources.start_all();

    let mut changes = Vec::new();
    loop {
        select! {
            message = socket.recv() => {
                let Some(message) = message else {
                    tracing::debug!("client went away");
                    return;
                };

                match handle_message(message, &mut closures) {
                    Ok(()) => {}
                    Err(SessionError::Skip) => {}
                    Err(SessionError::Closed) => return,
                }
            }
            count = states.changes_rx.recv_many(&mut changes, 1024) => {
                // zero means the channel closed, which means nothing can
                // ever change again
                if count == 0 {
                    return;
                }

                // a changed state may be some resource's trigger
                for (id, _) in &changes {
                    resources.trigger(*id);
                }

                let update = serde_json::to_string(&OutMessage::Update { fields: &changes })
                    .expect("update messages always serialize");
                changes.clear();

                if socket.send(Message::Text(update)).await.is_err() {
                    return;
                }
            }
            Some(id) = closures.call_rx.recv() => {
                closures.run(id);
            }
            // an empty task set resolves to None, which just disables the
            // branch for this iteration
            Some(finished) = closures.tasks.join_next() => {
                if let Err(err) = finished {
                    if !err.is_cancelled() {
                        tracing::error!(%err, "closure task failed");
                    }
                }
            }
            Some(finished) = resources.tasks.join_next() => {
                if let Err(err) = finished {
                    if !err.is_cancelled() {
                        tracing::error!(%err, "load task failed");
                    }
                }
            }
        }
    }
}

enum SessionError {
    /// Not something we understand; drop the message, keep the session.
    Skip,
    /// The connection is done.
    Closed,
}

fn handle_message(
    message: Result<Message, axum::Error>,
    closures: &mut Closures,
) -> Result<(), SessionError> {
    let message = match message {
        Ok(Message::Text(text)) => text,
        Ok(Message::Close(_)) => return Err(SessionError::Closed),
        Ok(_) => return Err(SessionError::Skip),
        Err(_) => {
            // client disconnected
            return Err(SessionError::Closed);
        }
    };

    match serde_json::from_str(&message) {
        Ok(InMessage::Closure { closure }) => closures.run(closure),
        Err(err) => {
            tracing::warn!(%err, "unparseable message from client");
            return Err(SessionError::Skip);
        }
    }

    Ok(())
}

#[derive(Debug, Deserialize)]
#[serde(tag = "t")]
enum InMessage {
    Closure { closure: RandomId },
}

#[derive(Serialize)]
#[serde(tag = "t")]
enum OutMessage<'a> {
    Update { fields: &'a [(RandomId, String)] },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_the_seed_from_the_query() {
        let request = http::Request::builder()
            .uri("http://localhost:3000/?lv-seed=42")
            .body(())
            .unwrap();
        assert_eq!(Some(42), session_seed(&request));

        let request = http::Request::builder()
            .uri("http://localhost:3000/?other=1&lv-seed=7")
            .body(())
            .unwrap();
        assert_eq!(Some(7), session_seed(&request));

        let request = http::Request::builder()
            .uri("http://localhost:3000/")
            .body(())
            .unwrap();
        assert_eq!(None, session_seed(&request));
    }

    #[test]
    fn updates_serialize_as_id_value_pairs() {
        let fields = vec![(RandomId::parse("abcd1234").unwrap(), "ha".to_string())];

        let message = serde_json::to_string(&OutMessage::Update { fields: &fields }).unwrap();

        assert_eq!(r#"{"t":"Update","fields":[["abcd1234","ha"]]}"#, message);
    }

    #[test]
    fn parses_closure_calls() {
        let message: InMessage =
            serde_json::from_str(r#"{"t":"Closure","closure":"abcd1234"}"#).unwrap();

        let InMessage::Closure { closure } = message;
        assert_eq!(RandomId::parse("abcd1234").unwrap(), closure);
    }
}

use std::{
    fmt::{Display, Write},
    future::Future,
};

use axum::response::Response;
use rand::{rngs::StdRng, SeedableRng};
use tokio_util::sync::CancellationToken;

use crate::{
    closures::{Closure, Closures},
    config::Config,
    html::{self, Content, Element},
    lifecycle::Lifecycle,
    reactive_js::Reactivity,
    resource::{self, LoadError, Resource, Resources},
    states::{State, States},
    LiveResponse, Render,
};

/// Hook container for one live session.
///
/// A route handler runs twice with the same seed: once for the plain HTTP
/// render and once when the websocket connects. The seeded RNG makes both
/// runs hand out identical ids, which is how the rendered page and the
/// session agree on what everything is called.
pub struct Context {
    pub(crate) seed: u64,
    pub(crate) rng: StdRng,

    pub(crate) states: States,
    pub(crate) closures: Closures,
    pub(crate) resources: Resources,
    pub(crate) lifecycle: Lifecycle,
}

impl Context {
    pub(crate) fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: StdRng::seed_from_u64(seed),
            states: States::default(),
            closures: Closures::default(),
            resources: Resources::default(),
            lifecycle: Lifecycle::new(),
        }
    }

    /// A reactive cell, rendered wherever it's placed in the tree and
    /// patched in place when set.
    pub fn use_state<T: Display + Send + Sync + 'static>(&mut self, value: T) -> State<T> {
        self.states.create(&mut self.rng, value)
    }

    /// An async closure the client can invoke, usually from an `onclick`.
    pub fn use_closure<F, Fut>(&mut self, closure: F) -> Closure
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.closures.create(&mut self.rng, closure)
    }

    /// Async derived state: runs `loader` once when the session starts and
    /// again on every change of `source`, committing only results that are
    /// still wanted when they arrive. See [`crate::resource`].
    ///
    /// The loader gets the current `source` value and a cancellation token
    /// it should thread through to whatever transport it uses.
    pub fn use_resource<K, T, F, Fut>(
        &mut self,
        source: State<K>,
        initial: T,
        loader: F,
    ) -> Resource<T>
    where
        K: Clone + Display + Send + Sync + 'static,
        T: Display + Send + Sync + 'static,
        F: Fn(K, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, LoadError>> + Send + 'static,
    {
        let output = self.states.create(&mut self.rng, initial);
        let runner = resource::runner(source, output, self.lifecycle.clone(), loader);
        self.resources.insert(source.id, runner);

        Resource(output)
    }

    /// The session's liveness flag.
    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle.clone()
    }

    pub fn with(self, element: Element) -> LiveResponse {
        Response::new(Render {
            element,
            context: self,
        })
    }

    /// Renders the full document for the plain HTTP request: normalized
    /// content wrapped in the layout, next to the adapter script carrying
    /// the seed and the reactivity registrations.
    pub(crate) fn render_page(mut self, element: Element, config: &Config) -> String {
        let mut content = element;
        content.normalize();
        content.assign_ids(&mut self.rng);

        let mut reactivity = Reactivity::default();
        content.collect_reactivity(&mut reactivity);
        let registrations = reactivity.script();

        let adapter = self.adapter_script(&registrations);
        let page = config.layout.call(content, adapter);

        let mut output = String::from(html::DOCTYPE_HTML);
        page.render(&mut output);
        output
    }

    /// The `<script>` element with the client adapter. Registrations run
    /// once the DOM is there to patch.
    fn adapter_script(&self, registrations: &str) -> Element {
        let mut script = include_str!("base.js").replace("__lv_seed__", &self.seed.to_string());

        script
            .write_fmt(format_args!(
                "document.addEventListener(\"DOMContentLoaded\", () => {{ {registrations} }});"
            ))
            .unwrap();

        html::script(
            Content::Raw(html_escape::encode_script(&script).to_string()),
            Default::default(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn the_same_seed_allocates_the_same_ids() {
        let mut first = Context::new(7);
        let mut second = Context::new(7);

        assert_eq!(first.use_state(0u32).id, second.use_state(0u32).id);
        assert_eq!(
            first.use_closure(|| async {}).id,
            second.use_closure(|| async {}).id
        );
    }

    #[test]
    fn different_seeds_allocate_different_ids() {
        let mut first = Context::new(7);
        let mut second = Context::new(8);

        assert_ne!(first.use_state(0u32).id, second.use_state(0u32).id);
    }

    #[test]
    fn renders_a_full_page() {
        let mut ctx = Context::new(0);
        let joke = ctx.use_state("why did the chicken".to_string());
        let joke_id = joke.id;

        let page = ctx.render_page(
            html::p(joke, Default::default()),
            &Config::default(),
        );

        assert!(page.starts_with("<!DOCTYPE html>"));
        // initial value is server-rendered
        assert!(page.contains("why did the chicken"));
        // the paragraph is addressable and registered for patches
        assert!(page.contains("lv-id"));
        assert!(page.contains("window.Punchline.onStateChange"));
        assert!(page.contains(&joke_id.to_string()));
        // the seed makes it into the adapter
        assert!(page.contains("\"0\""));
    }
}

use std::fmt::Display;

use rand::Rng;

use crate::{
    random_id::RandomId,
    reactive_js::{self, Reactivity, ReactivityDescriptor, Target},
    resource::Resource,
    states::State,
};

use super::{attribute::StateDescriptor, element::Element};

#[derive(Default, Debug, PartialEq)]
pub enum Content {
    #[default]
    Empty,
    Raw(String),
    Text(String),
    Element(Box<Element>),
    List(Vec<Content>),
    State(StateDescriptor),
}

impl Content {
    /// Turns this content into its canonical form: nested lists are
    /// flattened, empties removed, adjacent text merged, and single-entry
    /// lists promoted.
    pub(crate) fn normalize(&mut self) {
        match self {
            Content::Element(element) => element.normalize(),
            Content::List(list) => {
                for item in list.iter_mut() {
                    item.normalize();
                }

                Self::normalize_list(list);

                match list.len() {
                    0 => *self = Content::Empty,
                    1 => *self = list.remove(0),
                    _ => {}
                }
            }
            Content::Empty | Content::Raw(_) | Content::Text(_) | Content::State(_) => {}
        }
    }

    fn normalize_list(list: &mut Vec<Content>) {
        // splice nested lists in place; they are already normalized, so their
        // entries can't be lists themselves
        let mut i = 0;
        while i < list.len() {
            if matches!(list[i], Content::List(_)) {
                let Content::List(inner) = list.remove(i) else {
                    unreachable!();
                };
                for (offset, item) in inner.into_iter().enumerate() {
                    list.insert(i + offset, item);
                }
            } else {
                i += 1;
            }
        }

        list.retain(|content| !matches!(content, Content::Empty));

        // adjacent text renders as one DOM text node, so merge it now
        let mut i = 0;
        while i + 1 < list.len() {
            if matches!(list[i], Content::Text(_) | Content::Raw(_))
                && matches!(list[i + 1], Content::Text(_) | Content::Raw(_))
            {
                let mut next = list.remove(i + 1);

                next.text_to_raw();
                list[i].text_to_raw();

                let Content::Raw(current) = &mut list[i] else {
                    unreachable!();
                };
                let Content::Raw(next) = next else {
                    unreachable!();
                };

                current.push_str(&next);
            } else {
                i += 1;
            }
        }
    }

    fn text_to_raw(&mut self) {
        if let Content::Text(string) = self {
            *self = Content::Raw(html_escape::encode_text(string).to_string());
        }
    }

    pub(crate) fn assign_ids<R: Rng>(&mut self, rng: &mut R) {
        match self {
            Content::List(list) => {
                for item in list {
                    item.assign_ids(rng);
                }
            }
            Content::Element(element) => element.assign_ids(rng),
            Content::Empty | Content::Raw(_) | Content::Text(_) | Content::State(_) => {}
        }
    }

    pub(crate) fn is_reactive(&self) -> bool {
        match self {
            Content::List(list) => list.iter().any(Self::is_reactive),
            Content::State(_) => true,

            Content::Empty => false,
            Content::Raw(_) => false,
            Content::Text(_) => false,
            Content::Element(_) => false,
        }
    }

    /// Emits one descriptor per patch target under this content.
    ///
    /// Expects a normalized tree: adjacent text entries render as a single
    /// DOM text node, so each run of text/state entries counts as one child
    /// node when computing `childNodes` indices.
    pub(crate) fn collect_reactivity<'a>(
        &'a self,
        element_id: Option<RandomId>,
        reactivity: &mut Reactivity<'a>,
    ) {
        match self {
            Content::State(descriptor) => {
                let Some(element_id) = element_id else { return };

                reactivity.add(ReactivityDescriptor {
                    element_id,
                    child_node_idx: None,
                    target: Target::Content,
                    state_descriptors: vec![descriptor],
                    content: vec![reactive_js::Content::Var(0)],
                });
            }
            Content::List(list) => {
                let mut node_idx = 0u32;
                let mut group: Vec<&'a Content> = Vec::new();

                for item in list {
                    match item {
                        Content::Raw(_) | Content::Text(_) | Content::State(_) => group.push(item),
                        Content::Element(element) => {
                            flush_group(&mut group, element_id, &mut node_idx, reactivity);
                            element.collect_reactivity(reactivity);
                            node_idx += 1;
                        }
                        Content::Empty | Content::List(_) => {}
                    }
                }

                flush_group(&mut group, element_id, &mut node_idx, reactivity);
            }
            Content::Element(element) => element.collect_reactivity(reactivity),

            Content::Empty | Content::Raw(_) | Content::Text(_) => {}
        }
    }

    pub(crate) fn render(&self, output: &mut String) {
        match self {
            Content::Empty => {}
            Content::Raw(raw) => output.push_str(raw),
            Content::Text(text) => output.push_str(&html_escape::encode_text(text)),
            Content::Element(child) => child.render(output),
            Content::List(list) => {
                for content in list {
                    content.render(output);
                }
            }
            Content::State(descriptor) => output.push_str(&descriptor.display),
        }
    }
}

/// One run of adjacent text/state entries becomes one registration patching
/// one text node.
fn flush_group<'a>(
    group: &mut Vec<&'a Content>,
    element_id: Option<RandomId>,
    node_idx: &mut u32,
    reactivity: &mut Reactivity<'a>,
) {
    if group.is_empty() {
        return;
    }

    let has_state = group.iter().any(|c| matches!(c, Content::State(_)));
    if has_state {
        if let Some(element_id) = element_id {
            let mut state_descriptors: Vec<&StateDescriptor> = Vec::new();
            for item in group.iter() {
                if let Content::State(descriptor) = item {
                    if !state_descriptors.contains(&descriptor) {
                        state_descriptors.push(descriptor);
                    }
                }
            }

            let content = group
                .iter()
                .map(|item| match item {
                    Content::Raw(text) => {
                        reactive_js::Content::Text(std::borrow::Cow::Borrowed(text.as_str()))
                    }
                    Content::Text(text) => reactive_js::Content::Text(
                        html_escape::encode_script_single_quoted_text(text),
                    ),
                    Content::State(descriptor) => reactive_js::Content::Var(
                        state_descriptors
                            .iter()
                            .position(|s| *s == descriptor)
                            .expect("every state in the group was just collected"),
                    ),
                    _ => unreachable!(),
                })
                .collect();

            reactivity.add(ReactivityDescriptor {
                element_id,
                child_node_idx: Some(*node_idx),
                target: Target::Content,
                state_descriptors,
                content,
            });
        }
    }

    group.clear();
    *node_idx += 1;
}

impl From<()> for Content {
    fn from(_: ()) -> Self {
        Self::Empty
    }
}
impl From<String> for Content {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}
impl<'a> From<&'a str> for Content {
    fn from(value: &'a str) -> Self {
        Self::Text(value.to_string())
    }
}
impl From<Element> for Content {
    fn from(element: Element) -> Self {
        Self::Element(Box::new(element))
    }
}
impl From<Vec<Content>> for Content {
    fn from(value: Vec<Content>) -> Self {
        Self::List(value)
    }
}
impl<T> From<State<T>> for Content
where
    T: Display + Send + Sync + 'static,
{
    fn from(value: State<T>) -> Self {
        Self::State(value.into())
    }
}
impl<T> From<Resource<T>> for Content
where
    T: Display + Send + Sync + 'static,
{
    fn from(value: Resource<T>) -> Self {
        Self::State(value.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_descriptor() -> StateDescriptor {
        StateDescriptor {
            display: Default::default(),
            state_id: Default::default(),
        }
    }

    #[test]
    fn normalizes_into_canonical_form() {
        macro_rules! run {
            ($provided:expr, $expect:expr) => {
                let mut content = $provided;
                content.normalize();

                assert_eq!($expect, content);
            };
        }

        run!(Content::List(vec![]), Content::Empty);
        run!(
            Content::List(vec![Content::Empty, Content::Empty, Content::Empty]),
            Content::Empty
        );
        run!(
            Content::List(vec![Content::List(vec![Content::List(vec![])])]),
            Content::Empty
        );
        run!(
            Content::List(vec![Content::Raw("hey".to_string())]),
            Content::Raw("hey".to_string())
        );
        run!(
            Content::List(vec![
                Content::List(vec![Content::Raw("hey".to_string())]),
                Content::Empty,
                Content::Text("hi".to_string())
            ]),
            Content::Raw("heyhi".to_string())
        );
        // a list inside a list is spliced into its parent
        run!(
            Content::List(vec![
                Content::List(vec![
                    Content::State(state_descriptor()),
                    Content::Text("hey".to_string())
                ]),
                Content::State(state_descriptor())
            ]),
            Content::List(vec![
                Content::State(state_descriptor()),
                Content::Text("hey".to_string()),
                Content::State(state_descriptor()),
            ])
        );
        // three adjacent texts merge into one raw
        run!(
            Content::List(vec![
                Content::Text("a".to_string()),
                Content::Text("b".to_string()),
                Content::Text("c".to_string()),
                Content::State(state_descriptor()),
            ]),
            Content::List(vec![
                Content::Raw("abc".to_string()),
                Content::State(state_descriptor()),
            ])
        );
    }

    #[test]
    fn escapes_text_on_render() {
        let content = Content::Text("don't <script> me".to_string());

        let mut output = String::new();
        content.render(&mut output);

        assert_eq!("don't &lt;script&gt; me", output);
    }

    #[test]
    fn child_node_indices_count_text_runs_and_elements() {
        // <div>"hello "{state}<p/>"tail "{state}</div>
        // └ childNodes: [text, p, text] = indices 0, 1, 2
        let list = Content::List(vec![
            Content::Text("hello ".to_string()),
            Content::State(StateDescriptor {
                display: "v".to_string(),
                state_id: "s1".to_string(),
            }),
            Content::Element(Box::new(crate::html::p(
                Content::Empty,
                Default::default(),
            ))),
            Content::Text("tail ".to_string()),
            Content::State(StateDescriptor {
                display: "v".to_string(),
                state_id: "s2".to_string(),
            }),
        ]);

        let element_id = RandomId::parse("aaaabbbb").unwrap();
        let mut reactivity = Reactivity::default();
        list.collect_reactivity(Some(element_id), &mut reactivity);

        let script = reactivity.script();
        assert!(script.contains("el.childNodes[0]"));
        assert!(script.contains("el.childNodes[2]"));
        assert!(!script.contains("el.childNodes[1]"));
    }
}

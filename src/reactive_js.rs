//! Generates the client-side registrations that patch the DOM when state
//! changes arrive over the websocket.

use std::{borrow::Cow, collections::BTreeMap, fmt::Write};

use crate::{html::StateDescriptor, random_id::RandomId};

/// Everything reactive found in one rendered tree: one descriptor per patch
/// target, plus the initial value of every state involved.
#[derive(Default)]
pub(crate) struct Reactivity<'a> {
    descriptors: Vec<ReactivityDescriptor<'a>>,

    state_initial_values: BTreeMap<&'a str, &'a str>,
}

impl<'a> Reactivity<'a> {
    pub(crate) fn add(&mut self, descriptor: ReactivityDescriptor<'a>) {
        for state_descriptor in &descriptor.state_descriptors {
            self.state_initial_values
                .insert(&state_descriptor.state_id, &state_descriptor.display);
        }
        self.descriptors.push(descriptor);
    }

    pub(crate) fn script(&self) -> String {
        let mut output = String::new();

        for descriptor in &self.descriptors {
            descriptor.script(&mut output);
        }

        for (id, value) in &self.state_initial_values {
            write!(
                output,
                "window.Punchline.state['{id}'] = '{}';",
                html_escape::encode_script_single_quoted_text(value)
            )
            .unwrap();
        }

        output
    }
}

/// What one registration patches.
pub(crate) enum Target<'a> {
    /// The element's text content (or one child node's, via
    /// `child_node_idx`).
    Content,
    /// One attribute value.
    Attribute(&'a str),
}

pub(crate) struct ReactivityDescriptor<'a> {
    /// Id of the element this descriptor applies to.
    pub(crate) element_id: RandomId,
    /// Index into `childNodes` to patch. If `None`, the whole element.
    pub(crate) child_node_idx: Option<u32>,

    pub(crate) target: Target<'a>,

    pub(crate) state_descriptors: Vec<&'a StateDescriptor>,
    pub(crate) content: Vec<Content<'a>>,
}

impl ReactivityDescriptor<'_> {
    fn script(&self, output: &mut String) {
        output.push_str("window.Punchline.onStateChange([");
        for (i, descriptor) in self.state_descriptors.iter().enumerate() {
            if i > 0 {
                output.push(',');
            }
            output.push('\'');
            output.push_str(&descriptor.state_id);
            output.push('\'');
        }
        output.push_str("], (");
        for i in 0..self.state_descriptors.len() {
            if i > 0 {
                output.push(',');
            }
            write!(output, "v{i}").unwrap();
        }

        output.push_str(") => { if (el = document.querySelector('[lv-id=\"");
        self.element_id.write_to(output).unwrap();
        output.push_str("\"]')) ");

        if let Some(child_node_idx) = self.child_node_idx {
            write!(output, "if (el = el.childNodes[{child_node_idx}]) ").unwrap();
        }

        match self.target {
            Target::Content => output.push_str("el.textContent = "),
            Target::Attribute(key) => write!(output, "el.setAttribute('{key}', ").unwrap(),
        }

        if let [only] = self.content.as_slice() {
            only.script(output);
        } else {
            output.push('[');
            for (i, item) in self.content.iter().enumerate() {
                if i > 0 {
                    output.push(',');
                }
                item.script(output);
            }
            output.push_str("].join('')");
        }

        match self.target {
            Target::Content => output.push_str("; });"),
            Target::Attribute(_) => output.push_str("); });"),
        }

        #[cfg(debug_assertions)]
        output.push('\n');
    }
}

pub(crate) enum Content<'a> {
    /// Plain text, already escaped for a single-quoted JS string.
    Text(Cow<'a, str>),
    /// Index into the registration's state array.
    Var(usize),
}

impl Content<'_> {
    fn script(&self, output: &mut String) {
        match self {
            Content::Text(text) => write!(output, "'{text}'").unwrap(),
            Content::Var(idx) => write!(output, "v{idx}").unwrap(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element_id() -> RandomId {
        RandomId::parse("aaaabbbb").unwrap()
    }

    fn state_descriptor(n: u32) -> StateDescriptor {
        StateDescriptor {
            display: format!("value{n}"),
            state_id: format!("state{n}"),
        }
    }

    #[test]
    fn patches_a_whole_element() {
        let state = state_descriptor(1);
        let descriptor = ReactivityDescriptor {
            element_id: element_id(),
            child_node_idx: None,
            target: Target::Content,
            state_descriptors: vec![&state],
            content: vec![Content::Var(0)],
        };

        let mut output = String::new();
        descriptor.script(&mut output);

        assert_eq!(
            "window.Punchline.onStateChange(['state1'], (v0) => { if (el = document.querySelector('[lv-id=\"aaaabbbb\"]')) el.textContent = v0; });\n",
            output
        );
    }

    #[test]
    fn patches_a_single_child_node() {
        let state = state_descriptor(1);
        let descriptor = ReactivityDescriptor {
            element_id: element_id(),
            child_node_idx: Some(22),
            target: Target::Content,
            state_descriptors: vec![&state],
            content: vec![Content::Text("hey".into())],
        };

        let mut output = String::new();
        descriptor.script(&mut output);

        assert_eq!(
            "window.Punchline.onStateChange(['state1'], (v0) => { if (el = document.querySelector('[lv-id=\"aaaabbbb\"]')) if (el = el.childNodes[22]) el.textContent = 'hey'; });\n",
            output
        );
    }

    #[test]
    fn joins_mixed_content() {
        let state = state_descriptor(1);
        let descriptor = ReactivityDescriptor {
            element_id: element_id(),
            child_node_idx: None,
            target: Target::Content,
            state_descriptors: vec![&state],
            content: vec![
                Content::Text("hey".into()),
                Content::Var(0),
                Content::Text("world".into()),
            ],
        };

        let mut output = String::new();
        descriptor.script(&mut output);

        assert_eq!(
            "window.Punchline.onStateChange(['state1'], (v0) => { if (el = document.querySelector('[lv-id=\"aaaabbbb\"]')) el.textContent = ['hey',v0,'world'].join(''); });\n",
            output
        );
    }

    #[test]
    fn patches_an_attribute() {
        let state = state_descriptor(1);
        let descriptor = ReactivityDescriptor {
            element_id: element_id(),
            child_node_idx: None,
            target: Target::Attribute("class"),
            state_descriptors: vec![&state],
            content: vec![Content::Var(0)],
        };

        let mut output = String::new();
        descriptor.script(&mut output);

        assert_eq!(
            "window.Punchline.onStateChange(['state1'], (v0) => { if (el = document.querySelector('[lv-id=\"aaaabbbb\"]')) el.setAttribute('class', v0); });\n",
            output
        );
    }

    #[test]
    fn initial_values_are_emitted_once_per_state() {
        let state = state_descriptor(1);
        let mut reactivity = Reactivity::default();
        reactivity.add(ReactivityDescriptor {
            element_id: element_id(),
            child_node_idx: None,
            target: Target::Content,
            state_descriptors: vec![&state],
            content: vec![Content::Var(0)],
        });
        reactivity.add(ReactivityDescriptor {
            element_id: element_id(),
            child_node_idx: None,
            target: Target::Attribute("class"),
            state_descriptors: vec![&state],
            content: vec![Content::Var(0)],
        });

        let script = reactivity.script();

        assert_eq!(
            1,
            script.matches("window.Punchline.state['state1'] = 'value1';").count()
        );
    }
}

use rand::Rng;

use crate::{random_id::RandomId, reactive_js::Reactivity};

use super::{Attributes, Content, VOID_ELEMENTS};

#[derive(Debug, PartialEq)]
pub struct Element {
    pub(crate) id: Option<RandomId>,
    pub(crate) name: String,
    pub(crate) content: Content,
    pub(crate) attributes: Attributes,
}

impl Element {
    /// Puts the whole tree into canonical form; see [`Content::normalize`].
    pub(crate) fn normalize(&mut self) {
        self.content.normalize();
        self.attributes.normalize();
    }

    pub(crate) fn is_reactive(&self) -> bool {
        self.content.is_reactive() || self.attributes.is_reactive()
    }

    /// Reactive elements need an id the client can address patches to.
    pub(crate) fn assign_ids<R: Rng>(&mut self, rng: &mut R) {
        if self.id.is_none() && self.is_reactive() {
            self.id = Some(RandomId::from_rng(rng));
        }

        self.content.assign_ids(rng);
    }

    pub(crate) fn collect_reactivity<'a>(&'a self, reactivity: &mut Reactivity<'a>) {
        self.attributes.collect_reactivity(self.id, reactivity);
        self.content.collect_reactivity(self.id, reactivity);
    }

    pub(crate) fn render(&self, output: &mut String) {
        output.push('<');
        output.push_str(&self.name);

        if !self.attributes.is_empty() {
            output.push(' ');
            self.attributes.render(output);
        }

        // void elements cannot have a closing tag
        if VOID_ELEMENTS.contains(&self.name.as_str()) {
            output.push_str(" />");
            return;
        }

        if let Some(id) = &self.id {
            output.push_str(" lv-id=\"");
            id.write_to(output).unwrap();
            output.push('"');
        }

        output.push('>');

        self.content.render(output);

        output.push_str("</");
        output.push_str(&self.name);
        output.push('>');
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::mock::StepRng;

    use crate::html::{div, p, StateDescriptor};

    use super::*;

    #[test]
    fn renders_a_tree_with_ids() {
        let el = Element {
            id: Some(RandomId::parse("el1xxxxx").unwrap()),
            name: "div".to_string(),
            content: Content::List(vec![
                Element {
                    id: Some(RandomId::parse("el2xxxxx").unwrap()),
                    name: "p".to_string(),
                    content: Content::Text("hello".to_string()),
                    attributes: Default::default(),
                }
                .into(),
                Element {
                    id: None,
                    name: "p".to_string(),
                    content: Content::Text("world".to_string()),
                    attributes: Default::default(),
                }
                .into(),
            ]),
            attributes: Default::default(),
        };

        let mut output = String::new();
        el.render(&mut output);

        assert_eq!(
            "<div lv-id=\"el1xxxxx\"><p lv-id=\"el2xxxxx\">hello</p><p>world</p></div>",
            output
        );
    }

    #[test]
    fn renders_nested_element_functions() {
        let el = div(
            Content::List(vec![p(
                Content::Text("hello".to_string()),
                Default::default(),
            )
            .into()]),
            Default::default(),
        );

        let mut output = String::new();
        el.render(&mut output);

        assert_eq!("<div><p>hello</p></div>", output);
    }

    #[test]
    fn reactive_elements_get_ids() {
        let mut el = Element {
            id: None,
            name: "div".to_string(),
            content: Content::State(StateDescriptor {
                display: "value".to_string(),
                state_id: "my_state".to_string(),
            }),
            attributes: Default::default(),
        };

        el.assign_ids(&mut StepRng::new(0, 1));

        assert!(el.content.is_reactive());
        assert!(el.id.is_some());
    }

    #[test]
    fn static_elements_stay_anonymous() {
        let mut el = Element {
            id: None,
            name: "div".to_string(),
            content: Content::Raw("value".to_string()),
            attributes: Default::default(),
        };

        el.assign_ids(&mut StepRng::new(0, 1));

        assert!(!el.content.is_reactive());
        assert!(el.id.is_none());
    }

    #[test]
    fn void_elements_have_no_closing_tag() {
        let el = crate::html::br(Default::default());

        let mut output = String::new();
        el.render(&mut output);

        assert_eq!("<br />", output);
    }
}

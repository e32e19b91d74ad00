use std::collections::HashMap;

use crate::{random_id::RandomId, reactive_js::Reactivity};

use super::Attribute;

#[derive(Default, Debug, PartialEq)]
pub struct Attributes {
    attributes: HashMap<String, Attribute>,
}

impl Attributes {
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn insert(&mut self, key: impl ToString, attribute: impl Into<Attribute>) {
        let key = key.to_string();

        // HTML doesn't allow repeated attribute keys.
        // Browsers take the first one and ignore all the rest, so we'll throw an error.
        // https://stackoverflow.com/a/43859478
        debug_assert!(
            !self.attributes.contains_key(&key),
            "trying to override attribute {}",
            key
        );

        self.attributes.insert(key, attribute.into());
    }

    pub(crate) fn is_reactive(&self) -> bool {
        self.attributes.values().any(Attribute::is_reactive)
    }

    pub(crate) fn normalize(&mut self) {
        for value in self.attributes.values_mut() {
            value.normalize();
        }
    }

    pub(crate) fn render(&self, output: &mut String) {
        #[cfg(debug_assertions)]
        let iter = {
            let mut entries = Vec::from_iter(self.attributes.iter());
            entries.sort_by_key(|entry| entry.0);
            entries.into_iter()
        };
        #[cfg(not(debug_assertions))]
        let iter = self.attributes.iter();

        for (i, (key, attribute)) in iter.enumerate() {
            if i > 0 {
                output.push(' ');
            }

            output.push_str(key);

            if matches!(attribute, Attribute::Empty) {
                continue;
            }

            output.push_str("=\"");
            attribute.render(output);
            output.push('"');
        }
    }

    pub(crate) fn collect_reactivity<'a>(
        &'a self,
        element_id: Option<RandomId>,
        reactivity: &mut Reactivity<'a>,
    ) {
        for (key, attribute) in &self.attributes {
            attribute.collect_reactivity(element_id, key, reactivity);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::attrs;

    #[test]
    fn renders_one_attribute() {
        let attrs = attrs!(
            "hi" => "hey",
        );

        let mut output = String::new();
        attrs.render(&mut output);

        // doesn't have an extra space at the end
        assert_eq!("hi=\"hey\"", output);
    }

    #[test]
    fn renders_a_value_list() {
        let attrs = attrs!(
            "greeting" => ("hello", "world"),
        );

        let mut output = String::new();
        attrs.render(&mut output);

        assert_eq!("greeting=\"helloworld\"", output);
    }

    #[test]
    fn renders_multiple_attributes() {
        let attrs = attrs!(
            "onclick" => "hey",
            "data-something" => "wow",
        );

        let mut output = String::new();
        attrs.render(&mut output);

        // has a space between the two attributes, but not at the end
        assert_eq!("data-something=\"wow\" onclick=\"hey\"", output);
    }

    #[test]
    fn escapes_attribute_text() {
        let attrs = attrs!(
            "title" => "say \"cheese\"",
        );

        let mut output = String::new();
        attrs.render(&mut output);

        assert_eq!("title=\"say &quot;cheese&quot;\"", output);
    }
}

use std::{borrow::Cow, fmt::Display};

use crate::{
    closures::Closure,
    random_id::RandomId,
    reactive_js::{self, Reactivity, ReactivityDescriptor, Target},
    resource::Resource,
    states::State,
};

#[derive(Default, Debug, PartialEq)]
pub enum Attribute {
    #[default]
    Empty,
    Value(AttributeValue),
    List(Vec<AttributeValue>),
}

impl Attribute {
    pub(crate) fn is_reactive(&self) -> bool {
        match self {
            Self::Empty => false,
            Self::Value(value) => value.is_reactive(),
            Self::List(list) => list.iter().any(AttributeValue::is_reactive),
        }
    }

    pub(crate) fn normalize(&mut self) {
        match self {
            Self::List(list) => {
                Self::normalize_list(list);

                match list.len() {
                    0 => *self = Self::Empty,
                    1 => *self = Self::Value(list.remove(0)),
                    _ => {}
                }
            }

            Self::Empty | Self::Value(_) => {}
        }
    }

    fn normalize_list(list: &mut Vec<AttributeValue>) {
        // adjacent text renders as one string, so merge it now
        let mut i = 0;
        while i + 1 < list.len() {
            if matches!(list[i], AttributeValue::Text(_) | AttributeValue::Raw(_))
                && matches!(
                    list[i + 1],
                    AttributeValue::Text(_) | AttributeValue::Raw(_)
                )
            {
                let mut next = list.remove(i + 1);

                next.text_to_raw();
                list[i].text_to_raw();

                let AttributeValue::Raw(current) = &mut list[i] else {
                    unreachable!();
                };
                let AttributeValue::Raw(next) = next else {
                    unreachable!();
                };

                current.push_str(&next);
            } else {
                i += 1;
            }
        }
    }

    pub(crate) fn render(&self, output: &mut String) {
        match self {
            Self::Empty => {}
            Self::Value(value) => value.render(output),
            Self::List(list) => {
                for item in list {
                    item.render(output);
                }
            }
        }
    }

    pub(crate) fn collect_reactivity<'a>(
        &'a self,
        element_id: Option<RandomId>,
        key: &'a str,
        reactivity: &mut Reactivity<'a>,
    ) {
        match self {
            Self::Value(AttributeValue::State(state_descriptor)) => {
                let Some(element_id) = element_id else { return };

                reactivity.add(ReactivityDescriptor {
                    element_id,
                    child_node_idx: None,
                    target: Target::Attribute(key),

                    state_descriptors: vec![state_descriptor],
                    content: vec![reactive_js::Content::Var(0)],
                });
            }
            Self::List(list) => {
                if !self.is_reactive() {
                    return;
                }
                let Some(element_id) = element_id else { return };

                let mut state_descriptors: Vec<&StateDescriptor> = Vec::new();
                for value in list {
                    if let AttributeValue::State(descriptor) = value {
                        if !state_descriptors.contains(&descriptor) {
                            state_descriptors.push(descriptor);
                        }
                    }
                }

                let content = list
                    .iter()
                    .map(|value| match value {
                        AttributeValue::Raw(text) => {
                            reactive_js::Content::Text(Cow::Borrowed(text.as_str()))
                        }
                        AttributeValue::Text(text) => reactive_js::Content::Text(
                            html_escape::encode_script_single_quoted_text(text),
                        ),
                        AttributeValue::State(descriptor) => reactive_js::Content::Var(
                            state_descriptors
                                .iter()
                                .position(|s| *s == descriptor)
                                .expect("every state in the list was just collected"),
                        ),
                        AttributeValue::Closure(descriptor) => {
                            // closures aren't reactive; their call snippet is a
                            // constant piece of the rebuilt attribute value
                            let mut call = String::new();
                            descriptor.render(&mut call);
                            reactive_js::Content::Text(Cow::Owned(
                                html_escape::encode_script_single_quoted_text(&call).into_owned(),
                            ))
                        }
                    })
                    .collect();

                reactivity.add(ReactivityDescriptor {
                    element_id,
                    child_node_idx: None,
                    target: Target::Attribute(key),

                    state_descriptors,
                    content,
                });
            }

            Self::Empty | Self::Value(_) => {}
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum AttributeValue {
    Raw(String),
    Text(String),
    State(StateDescriptor),
    Closure(ClosureDescriptor),
}

impl AttributeValue {
    fn text_to_raw(&mut self) {
        if let Self::Text(string) = self {
            *self = Self::Raw(html_escape::encode_text(string).to_string());
        }
    }

    pub(crate) fn is_reactive(&self) -> bool {
        match self {
            Self::Raw(_) => false,
            Self::Text(_) => false,
            Self::Closure(_) => false,

            Self::State(_) => true,
        }
    }

    pub(crate) fn render(&self, output: &mut String) {
        match self {
            Self::Raw(text) => output.push_str(text),
            Self::Text(text) => output.push_str(&html_escape::encode_double_quoted_attribute(text)),
            Self::State(descriptor) => output.push_str(&descriptor.display),
            Self::Closure(descriptor) => descriptor.render(output),
        }
    }
}

#[derive(Debug, PartialEq)]
pub struct StateDescriptor {
    pub(crate) display: String,
    pub(crate) state_id: String,
}

impl<T> From<State<T>> for StateDescriptor
where
    T: Display + Send + Sync + 'static,
{
    fn from(value: State<T>) -> Self {
        Self {
            display: (*value.get()).to_string(),
            state_id: value.id.to_string(),
        }
    }
}
impl<T> From<Resource<T>> for StateDescriptor
where
    T: Display + Send + Sync + 'static,
{
    fn from(value: Resource<T>) -> Self {
        value.0.into()
    }
}

#[derive(Debug, PartialEq)]
pub struct ClosureDescriptor {
    pub(crate) closure_id: RandomId,
}

impl ClosureDescriptor {
    pub(crate) fn render(&self, output: &mut String) {
        output.push_str("window.Punchline.callClosure('");
        self.closure_id.write_to(output).unwrap();
        output.push_str("')");
    }
}

impl From<Closure> for ClosureDescriptor {
    fn from(value: Closure) -> Self {
        Self {
            closure_id: value.id,
        }
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::Text(value)
    }
}
impl<'a> From<&'a str> for AttributeValue {
    fn from(value: &'a str) -> Self {
        AttributeValue::Text(value.to_string())
    }
}
impl From<Closure> for AttributeValue {
    fn from(value: Closure) -> Self {
        AttributeValue::Closure(value.into())
    }
}
impl<T> From<State<T>> for AttributeValue
where
    T: Display + Send + Sync + 'static,
{
    fn from(value: State<T>) -> Self {
        AttributeValue::State(value.into())
    }
}
impl<T> From<Resource<T>> for AttributeValue
where
    T: Display + Send + Sync + 'static,
{
    fn from(value: Resource<T>) -> Self {
        AttributeValue::State(value.into())
    }
}

impl From<()> for Attribute {
    fn from(_: ()) -> Self {
        Self::Empty
    }
}
impl<T> From<T> for Attribute
where
    AttributeValue: From<T>,
{
    fn from(value: T) -> Self {
        Self::Value(value.into())
    }
}

macro_rules! impl_into_attribute_tuple {
    (
        $($ty:ident),*
    ) => {
        #[allow(non_snake_case)]
        impl<$($ty,)*> From<($($ty,)*)> for Attribute
        where
            $( AttributeValue: From<$ty>, )*
        {
            fn from(($($ty,)*): ($($ty,)*)) -> Self {
                Self::List(vec![
                    $($ty.into(),)*
                ])
            }
        }
    };
}

#[rustfmt::skip]
macro_rules! all_the_tuples {
    ($name:ident) => {
        $name!(T1);
        $name!(T1, T2);
        $name!(T1, T2, T3);
        $name!(T1, T2, T3, T4);
        $name!(T1, T2, T3, T4, T5);
        $name!(T1, T2, T3, T4, T5, T6);
        $name!(T1, T2, T3, T4, T5, T6, T7);
        $name!(T1, T2, T3, T4, T5, T6, T7, T8);
    };
}

all_the_tuples!(impl_into_attribute_tuple);

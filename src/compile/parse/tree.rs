use crate::{helper::HelperDescriptor, region::Region, value::Value};
use indexmap::IndexMap;
use serde_json::Number;

/// A node of the syntax tree.
///
/// Every node evaluates to a [`Value`] against a
/// [`RenderingContext`][`crate::render::RenderingContext`].
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Literal text, evaluates to itself.
    Text(String),
    /// Dotted path into the variables.
    ObjectAccessor(Accessor),
    /// Number, boolean, null, array or map literal.
    Literal(Literal),
    /// Invocation of a helper, through a tag or an inline `->` call.
    HelperInvocation(Invocation),
    /// Ordered sequence of child nodes, evaluates to their concatenation.
    Root(Vec<Node>),
}

impl Node {
    /// Return true if the value of this node is escaped when it is written
    /// as part of a concatenation.
    pub fn escapes(&self) -> bool {
        match self {
            Node::Text(_) | Node::Root(_) => false,
            Node::ObjectAccessor(_) | Node::Literal(_) => true,
            Node::HelperInvocation(invocation) => invocation.descriptor.helper().escape_output(),
        }
    }

    /// Return the children if this is a [`Node::Root`], otherwise a slice
    /// containing only this node.
    pub fn children(&self) -> &[Node] {
        match self {
            Node::Root(children) => children,
            _ => std::slice::from_ref(self),
        }
    }
}

/// A dotted path such as `user.address.0.street`.
#[derive(Debug, Clone, PartialEq)]
pub struct Accessor {
    /// Path segments, the first names a variable.
    pub path: Vec<String>,
    pub region: Region,
}

/// Literal values written inside interpolations.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    Number(Number),
    Array(Vec<Node>),
    Map(Vec<(String, Node)>),
    /// A value supplied by the host, such as an argument default.
    Constant(Value),
}

/// A resolved helper call with its bound arguments and children.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub namespace: String,
    pub name: String,
    pub descriptor: HelperDescriptor,
    /// Supplied arguments followed by defaults of omitted optional arguments.
    pub arguments: IndexMap<String, Node>,
    pub children: Vec<Node>,
    /// Location of the helper name.
    pub region: Region,
}

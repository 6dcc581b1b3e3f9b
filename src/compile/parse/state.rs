use crate::{compile::tree::Node, region::Region};

/// An argument written on a tag or an inline helper call, before it is
/// checked against the helper's declarations.
#[derive(Debug)]
pub struct Argument {
    pub name: String,
    pub region: Region,
    pub value: Node,
}

/// A helper tag that has been opened and not yet closed.
#[derive(Debug)]
pub struct OpenTag {
    /// Location of the namespaced tag name.
    pub name: Region,
    pub arguments: Vec<Argument>,
    pub children: Vec<Node>,
}

impl OpenTag {
    pub fn new(name: Region, arguments: Vec<Argument>) -> Self {
        Self {
            name,
            arguments,
            children: vec![],
        }
    }
}

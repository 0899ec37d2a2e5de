//! Namespace tree of registered commands.
//!
//! Internal nodes are namespaces (domain, subdomain, ...) and leaves are
//! commands. Children keep insertion order so the generated help lists
//! commands in manifest order.

use serde::Serialize;

use super::base::Command;
use crate::errors::CommandManagerError;

/// A registered command plus the metadata captured at registration time.
pub struct CommandDescriptor {
    pub name: String,
    pub description: String,
    pub help: String,
    pub module: String,
    pub command: Box<dyn Command>,
}

impl CommandDescriptor {
    pub fn new(module: impl Into<String>, command: Box<dyn Command>) -> Self {
        Self {
            name: command.name().to_string(),
            description: command.description().to_string(),
            help: command.help().to_string(),
            module: module.into(),
            command,
        }
    }
}

impl std::fmt::Debug for CommandDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandDescriptor")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("module", &self.module)
            .finish_non_exhaustive()
    }
}

impl PartialEq for CommandDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.description == other.description
            && self.help == other.help
            && self.module == other.module
    }
}

#[derive(Debug, PartialEq)]
pub enum Node {
    Namespace(Hierarchy),
    Command(CommandDescriptor),
}

/// An ordered namespace: name → child node.
#[derive(Debug, Default, PartialEq)]
pub struct Hierarchy {
    children: Vec<(String, Node)>,
}

impl Hierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn clear(&mut self) {
        self.children.clear();
    }

    pub fn get(&self, name: &str) -> Option<&Node> {
        self.children
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, node)| node)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.children.iter().map(|(key, node)| (key.as_str(), node))
    }

    /// Look up the command at `path` (namespaces followed by the command name).
    pub fn resolve(&self, path: &[&str]) -> Option<&CommandDescriptor> {
        let (last, namespaces) = path.split_last()?;
        let mut level = self;
        for segment in namespaces {
            match level.get(segment)? {
                Node::Namespace(child) => level = child,
                Node::Command(_) => return None,
            }
        }
        match level.get(last)? {
            Node::Command(descriptor) => Some(descriptor),
            Node::Namespace(_) => None,
        }
    }

    /// Insert `descriptor` under `namespace`, creating namespaces as needed.
    ///
    /// Fails if the command name is already taken at that position, or if a
    /// namespace segment is already a command.
    pub fn insert(
        &mut self,
        namespace: &[String],
        descriptor: CommandDescriptor,
    ) -> Result<(), CommandManagerError> {
        let mut level = self;
        for (depth, segment) in namespace.iter().enumerate() {
            let index = match level.children.iter().position(|(key, _)| key == segment) {
                Some(index) => index,
                None => {
                    level
                        .children
                        .push((segment.clone(), Node::Namespace(Hierarchy::new())));
                    level.children.len() - 1
                }
            };
            level = match &mut level.children[index].1 {
                Node::Namespace(child) => child,
                Node::Command(_) => {
                    return Err(CommandManagerError::HierarchyConflict {
                        command_name: segment.clone(),
                        path: namespace[..depth].to_vec(),
                    });
                }
            };
        }

        if level.get(&descriptor.name).is_some() {
            return Err(CommandManagerError::HierarchyConflict {
                command_name: descriptor.name.clone(),
                path: namespace.to_vec(),
            });
        }
        level
            .children
            .push((descriptor.name.clone(), Node::Command(descriptor)));
        Ok(())
    }

    /// Space-separated paths of every command, depth first.
    pub fn command_paths(&self) -> Vec<String> {
        let mut paths = Vec::new();
        self.collect_paths(&mut Vec::new(), &mut paths);
        paths
    }

    fn collect_paths<'a>(&'a self, prefix: &mut Vec<&'a str>, out: &mut Vec<String>) {
        for (name, node) in self.iter() {
            prefix.push(name);
            match node {
                Node::Namespace(child) => child.collect_paths(prefix, out),
                Node::Command(_) => out.push(prefix.join(" ")),
            }
            prefix.pop();
        }
    }

    /// Indented text rendering, one node per line.
    pub fn render_tree(&self) -> String {
        let mut out = String::new();
        self.render_into(&mut out, 0);
        out
    }

    fn render_into(&self, out: &mut String, depth: usize) {
        for (name, node) in self.iter() {
            let indent = "  ".repeat(depth);
            match node {
                Node::Namespace(child) => {
                    out.push_str(&format!("{indent}{name}/\n"));
                    child.render_into(out, depth + 1);
                }
                Node::Command(descriptor) => {
                    out.push_str(&format!("{indent}{name}  {}\n", descriptor.description));
                }
            }
        }
    }

    /// Serializable view of the tree.
    pub fn summary(&self) -> Vec<NodeSummary> {
        self.iter()
            .map(|(name, node)| match node {
                Node::Namespace(child) => NodeSummary {
                    name: name.to_string(),
                    kind: NodeKind::Namespace,
                    description: None,
                    module: None,
                    children: child.summary(),
                },
                Node::Command(descriptor) => NodeSummary {
                    name: name.to_string(),
                    kind: NodeKind::Command,
                    description: Some(descriptor.description.clone()),
                    module: Some(descriptor.module.clone()),
                    children: Vec::new(),
                },
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Namespace,
    Command,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeSummary {
    pub name: String,
    pub kind: NodeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeSummary>,
}

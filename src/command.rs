use crate::graph::{LinkId, NodeId, RawLink};

/// A discrete mutation of document state. Commands are never applied
/// piecemeal by callers: the planners in [`crate::registry::policy`] group
/// them into a [`CommandBatch`] and the owning session applies the whole
/// batch as one atomic unit.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    AddLink(RawLink),
    RemoveLink { link_id: LinkId },
    SetVariable { node_id: NodeId, name: String },
    RemoveVariable { node_id: NodeId },
    ReservePort { node_id: NodeId, port: String },
    ReleasePort { node_id: NodeId, port: String },
    MoveNode { node_id: NodeId, x: f64, y: f64 },
    DeleteNode { node_id: NodeId },
}

/// An ordered group of commands applied atomically. Observers of document
/// state never see a link mutation without its paired variable-name and
/// port mutations already reflected.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandBatch {
    commands: Vec<Command>,
}

impl CommandBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, command: Command) {
        self.commands.push(command);
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl From<Vec<Command>> for CommandBatch {
    fn from(commands: Vec<Command>) -> Self {
        Self { commands }
    }
}

impl IntoIterator for CommandBatch {
    type Item = Command;
    type IntoIter = std::vec::IntoIter<Command>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.into_iter()
    }
}

//! Completeness reporting for rendered tiles.

use std::fmt;

/// How complete a rendered item is.
///
/// Variants are ordered from best to worst, so the combined status of a set
/// of items is their maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum RenderStatus {
    /// All data is present and current
    #[default]
    Complete,
    /// Data is present but expired and being refreshed
    WaitingForUpdate,
    /// Data is missing and has been requested
    WaitingForData,
    /// Data could not be requested at all
    Incomplete,
}

impl fmt::Display for RenderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RenderStatus::Complete => "complete",
            RenderStatus::WaitingForUpdate => "waiting for update",
            RenderStatus::WaitingForData => "waiting for data",
            RenderStatus::Incomplete => "incomplete",
        };
        f.write_str(name)
    }
}

/// Named tree of render statuses.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RenderState {
    name: String,
    status: RenderStatus,
    children: Vec<RenderState>,
}

impl RenderState {
    pub fn new(name: impl Into<String>, status: RenderStatus) -> Self {
        Self {
            name: name.into(),
            status,
            children: Vec::new(),
        }
    }

    pub fn add_child(&mut self, child: RenderState) {
        self.children.push(child);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn children(&self) -> &[RenderState] {
        &self.children
    }

    /// Worst status of this node and all of its descendants.
    pub fn status(&self) -> RenderStatus {
        self.children
            .iter()
            .map(RenderState::status)
            .fold(self.status, RenderStatus::max)
    }

    /// Indented, one line per node.
    pub fn format(&self) -> String {
        let mut out = String::new();
        self.format_into(&mut out, 0);
        out
    }

    fn format_into(&self, out: &mut String, depth: usize) {
        out.push_str(&"  ".repeat(depth));
        out.push_str(&format!("{}: {}\n", self.name, self.status()));
        for child in &self.children {
            child.format_into(out, depth + 1);
        }
    }
}

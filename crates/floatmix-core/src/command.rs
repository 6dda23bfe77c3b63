//! Host commands and the started/stopped state machine.

/// Commands a host can send to a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Release resources and stop.
    Suspend,
    /// Stop processing.
    Pause,
    /// Begin processing.
    Start,
    /// Enable the node.
    Enable,
    /// Disable the node.
    Disable,
    /// Discard queued data.
    Flush,
    /// Process queued data, then stop.
    Drain,
    /// Place a marker in the stream.
    Marker,
}

impl Command {
    /// Every command, in wire-id order.
    pub const ALL: [Self; 8] = [
        Self::Suspend,
        Self::Pause,
        Self::Start,
        Self::Enable,
        Self::Disable,
        Self::Flush,
        Self::Drain,
        Self::Marker,
    ];

    /// Wire id.
    pub const fn id(self) -> u32 {
        match self {
            Self::Suspend => 0,
            Self::Pause => 1,
            Self::Start => 2,
            Self::Enable => 3,
            Self::Disable => 4,
            Self::Flush => 5,
            Self::Drain => 6,
            Self::Marker => 7,
        }
    }

    /// Looks up a command by wire id.
    pub fn from_id(id: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.id() == id)
    }
}

/// Run state of the node.
///
/// The state is informational: [`FloatMix::process`](crate::FloatMix::process)
/// runs whenever it is called, and hosts only call it while started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeState {
    /// Not processing. Initial state.
    #[default]
    Stopped,
    /// Processing.
    Started,
}

impl NodeState {
    /// State after `command`, or `None` if the command is not handled.
    pub const fn transition(self, command: Command) -> Option<Self> {
        match command {
            Command::Start => Some(Self::Started),
            Command::Pause => Some(Self::Stopped),
            _ => None,
        }
    }
}

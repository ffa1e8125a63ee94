//! Command Lifecycle State Machine
//!
//! Governs which status transitions are legal and which actor may perform
//! them. The controller only ever creates commands in PENDING; every later
//! transition belongs to the target.

use crate::command::CommandStatus;

/// The two uncoordinated writers of a command document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    /// The device issuing commands
    Controller,
    /// The device executing commands
    Target,
}

/// Result of a transition attempt
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionResult {
    /// Transition was legal and the tracked status advanced
    Advanced(CommandStatus),
    /// Transition is not in the table for this actor
    Rejected {
        from: CommandStatus,
        to: CommandStatus,
        actor: Actor,
    },
}

/// Check whether `actor` may move a command from `from` to `to`
pub fn is_valid_transition(from: CommandStatus, to: CommandStatus, actor: Actor) -> bool {
    use Actor::*;
    use CommandStatus::*;

    match (from, to, actor) {
        // Claim for execution
        (Pending, Executing, Target) => true,

        // Terminal outcomes of a claimed command
        (Executing, Executed, Target) => true,
        (Executing, Failed, Target) => true,

        // A command the target cannot execute fails without ever being claimed
        (Pending, Failed, Target) => true,

        _ => false,
    }
}

/// Tracks a single command's status and enforces forward-only movement
#[derive(Debug)]
pub struct CommandLifecycle {
    current: CommandStatus,
}

impl Default for CommandLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandLifecycle {
    /// Start at PENDING, the state every command is created in
    pub fn new() -> Self {
        Self {
            current: CommandStatus::Pending,
        }
    }

    /// Track a command first observed in some later state
    pub fn observed(status: CommandStatus) -> Self {
        Self { current: status }
    }

    /// Current status
    pub fn status(&self) -> CommandStatus {
        self.current
    }

    /// Whether this command still accepts a claim.
    /// A claim is not re-entrant: anything past PENDING must be left alone.
    pub fn is_claimable(&self) -> bool {
        self.current == CommandStatus::Pending
    }

    /// Attempt a transition and return the result
    pub fn apply(&mut self, to: CommandStatus, actor: Actor) -> TransitionResult {
        if is_valid_transition(self.current, to, actor) {
            self.current = to;
            TransitionResult::Advanced(to)
        } else {
            TransitionResult::Rejected {
                from: self.current,
                to,
                actor,
            }
        }
    }
}

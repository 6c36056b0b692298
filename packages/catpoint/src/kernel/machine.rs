//! Machine trait.
//!
//! Machines are pure state machines that interpret events and decide on
//! commands. State lives inside the machine, and `decide` is synchronous:
//! no IO, no async, no notifications.
//!
//! # Key Properties
//!
//! - **State is internal**: each machine owns its state via `&mut self`
//! - **Pure decisions**: state transitions and command emission only
//! - **Ordered output**: one event may yield several commands, applied in order
//! - **All or nothing**: a rejected event leaves the state untouched

use smallvec::SmallVec;

/// Commands produced for a single event, in application order.
pub type Decision<C> = SmallVec<[C; 4]>;

/// A state machine that interprets events and decides on commands.
///
/// Machines are the decision-making layer. They:
/// 1. Receive events (facts about what happened)
/// 2. Update internal state
/// 3. Return the commands (intent for IO) the new state requires
///
/// # Example
///
/// ```ignore
/// struct CounterMachine {
///     count: i32,
/// }
///
/// impl Machine for CounterMachine {
///     type Event = CounterEvent;
///     type Command = CounterCommand;
///     type Error = std::convert::Infallible;
///
///     fn decide(&mut self, event: &CounterEvent) -> Result<Decision<CounterCommand>, Self::Error> {
///         match event {
///             CounterEvent::Increment => {
///                 self.count += 1;
///                 Ok(smallvec![CounterCommand::UpdateDisplay { value: self.count }])
///             }
///         }
///     }
/// }
/// ```
pub trait Machine: Send + Sync + 'static {
    /// The event type this machine handles.
    type Event;

    /// The command type this machine emits.
    type Command;

    /// Why an event was rejected.
    type Error;

    /// Process an event and return the resulting commands.
    ///
    /// # Guarantees
    ///
    /// - Called synchronously (no async)
    /// - Called serially (no concurrent calls)
    /// - On `Err`, internal state is unchanged
    fn decide(&mut self, event: &Self::Event) -> Result<Decision<Self::Command>, Self::Error>;
}

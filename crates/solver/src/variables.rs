//! Decision-variable capability contract.

use std::fmt::Debug;

/// A domain's decision space as seen by the solver.
///
/// The solver only ever asks for candidates, applies them, and checks completion;
/// it never inspects what a choice means.
pub trait DecisionVariables {
    /// Partial plan state the constraints and objective are evaluated on.
    type State: Clone;
    /// One resolvable choice (e.g. "visit waypoint 3 at 22 m/s").
    type Choice: Clone + PartialEq + Debug;

    /// Empty (or seeded) plan the construction starts from.
    fn initial_state(&self) -> Self::State;

    /// Candidate choices for the next decision, in the domain's preferred order.
    ///
    /// Earlier candidates win exact ties, so domains encode their tie-break here.
    fn candidates(&self, state: &Self::State) -> Vec<Self::Choice>;

    /// New state with `choice` appended. Must not mutate `state`.
    fn apply(&self, state: &Self::State, choice: &Self::Choice) -> Self::State;

    /// True once the plan resolves every mandatory decision.
    fn is_complete(&self, state: &Self::State) -> bool;

    /// Whether a plan that stops before [`is_complete`](Self::is_complete) is invalid.
    ///
    /// Routing problems must visit every waypoint; selection problems may stop
    /// when nothing admissible is left.
    fn requires_completion(&self) -> bool {
        true
    }
}

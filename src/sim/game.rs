//! The seam between one mini-game instance and the scene that hosts it

use super::pivot::{Origin, PivotEntity};
use super::state::{Effect, GameEvent, GameKind, GameSession, InstanceId, PointerEvent};

/// One independently running game instance
pub trait MiniGame {
    fn kind(&self) -> GameKind;

    fn instance(&self) -> InstanceId;

    fn origin(&self) -> &Origin;

    fn session(&self) -> &GameSession;

    /// Every host entity the instance owns, in a stable order
    fn entities(&self) -> Vec<&PivotEntity>;

    /// Advance by one host tick
    fn tick(&mut self, dt: f32);

    /// Pointer input aimed at one of this instance's entities
    fn pointer(&mut self, event: &PointerEvent);

    fn drain_events(&mut self) -> Vec<GameEvent>;

    fn drain_effects(&mut self) -> Vec<Effect>;

    /// Input a simple bot would give right now, if any
    fn autoplay(&mut self) -> Option<PointerEvent>;
}

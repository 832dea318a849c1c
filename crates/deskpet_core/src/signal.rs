use tokio::time::Instant;

/// Facial expression reported by the camera collaborator after its own debounce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expression {
    Smile,
}

/// Discrete input delivered to the signal router
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    /// A key was pressed (the input hook carries no other data)
    KeyPressed(Instant),
    ExpressionObserved(Expression),
    /// The user clicked the pet
    Pat,
    /// Periodic monitor tick
    Tick(Instant),
}

use super::InputAdapter;

/// Adapter for an empty jack.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAdapter;

impl InputAdapter for NullAdapter {}

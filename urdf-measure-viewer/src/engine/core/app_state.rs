use bevy::prelude::*;

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash, States)]
pub enum AppState {
    /// Waiting for the viewer configuration.
    #[default]
    Loading,
    Running,
}

#[derive(Component)]
pub struct FpsText;

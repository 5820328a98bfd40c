use bevy::prelude::*;

/// Root entity of the currently loaded robot model.
#[derive(Component, Debug)]
pub struct ModelRoot {
    pub path: String,
}

/// Request to replace the displayed model.
#[derive(Event, Debug, Clone)]
pub struct LoadModelEvent {
    pub path: String,
}

/// Fired after a model replaced the previous one. Measurements taken on the
/// old model are cleared in response.
#[derive(Event, Debug, Clone, Copy, Default)]
pub struct ModelReloadedEvent;

/// Last non-empty path among this frame's requests.
fn latest_model_path<'a>(paths: impl Iterator<Item = &'a str>) -> Option<&'a str> {
    paths.filter(|path| !path.trim().is_empty()).last()
}

/// Despawns every loaded model. Returns whether there was one to replace.
fn unload_models(commands: &mut Commands, roots: &Query<(Entity, &ModelRoot)>) -> bool {
    let mut replaced = false;
    for (entity, root) in roots {
        debug!("Unloading model {}", root.path);
        commands.entity(entity).despawn();
        replaced = true;
    }
    replaced
}

/// Despawns the current model and spawns the requested glTF scene in its place.
pub fn load_model_on_event(
    mut commands: Commands,
    mut events: EventReader<LoadModelEvent>,
    roots: Query<(Entity, &ModelRoot)>,
    asset_server: Res<AssetServer>,
    mut reloaded: EventWriter<ModelReloadedEvent>,
) {
    let requests: Vec<LoadModelEvent> = events.read().cloned().collect();
    let Some(path) = latest_model_path(requests.iter().map(|event| event.path.as_str())) else {
        return;
    };

    let replaced = unload_models(&mut commands, &roots);

    commands.spawn((
        SceneRoot(asset_server.load(GltfAssetLabel::Scene(0).from_asset(path.to_string()))),
        Transform::default(),
        ModelRoot {
            path: path.to_string(),
        },
    ));
    if replaced {
        reloaded.write(ModelReloadedEvent);
    }

    info!("Loading model: {}", path);
}

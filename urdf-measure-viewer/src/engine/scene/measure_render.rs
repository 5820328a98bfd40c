/// Mirrors the measurement scene graph into Bevy entities
use bevy::asset::RenderAssetUsages;
use bevy::prelude::*;
use bevy::render::mesh::{Indices, PrimitiveTopology};
use bevy::render::view::RenderLayers;
use bevy::window::{PrimaryWindow, SystemCursorIcon};
use bevy::winit::cursor::CursorIcon;
use std::collections::HashMap;

use crate::engine::camera::viewport_camera::MainCamera;
use crate::tools::measure::label::Label;
use crate::tools::measure::scene::{
    CursorStyle, FaceMesh, LineStyle, MeasureSceneGraph, ObjectId, PointStyle, SceneChange,
    SceneObject,
};
use constants::render_settings::{
    DRAW_LINE_WIDTH, DRAW_VERTEX_SIZE, FACE_OPACITY, LABEL_BACKGROUND_COLOR, LABEL_TEXT_COLOR,
    LINE_OPACITY, OVERLAY_RENDER_LAYER, POINT_OPACITY,
};

/// Tags every mesh entity drawn for a measurement. The picker skips these.
#[derive(Component)]
pub struct MeasureObject;

/// UI text node showing a measurement label.
#[derive(Component, Debug, Clone)]
pub struct MeasureLabel {
    pub id: ObjectId,
    pub anchor: Vec3,
    pub extent: Vec2,
    pub visible: bool,
    /// Centre of the label in viewport pixels, `None` when off screen.
    pub screen_center: Option<Vec2>,
}

/// Entity spawned for each scene object.
#[derive(Resource, Default)]
pub struct MeasureEntities {
    entities: HashMap<ObjectId, Entity>,
}

impl MeasureEntities {
    pub fn get(&self, id: ObjectId) -> Option<Entity> {
        self.entities.get(&id).copied()
    }
}

/// Unit meshes instanced for point markers and line segments.
#[derive(Resource)]
pub struct MeasureRenderAssets {
    sphere: Handle<Mesh>,
    segment: Handle<Mesh>,
}

pub fn setup_measure_render_assets(mut commands: Commands, mut meshes: ResMut<Assets<Mesh>>) {
    commands.insert_resource(MeasureRenderAssets {
        sphere: meshes.add(Sphere::new(1.0).mesh().ico(2).unwrap_or_else(|e| {
            warn!("Falling back to UV sphere for point markers: {}", e);
            Sphere::new(1.0).mesh().uv(16, 8)
        })),
        segment: meshes.add(Cuboid::new(1.0, 1.0, 1.0)),
    });
}

fn overlay_material(color: Color, opacity: f32) -> StandardMaterial {
    StandardMaterial {
        base_color: color.with_alpha(opacity),
        alpha_mode: AlphaMode::Blend,
        unlit: true,
        double_sided: true,
        cull_mode: None,
        ..default()
    }
}

/// Transform placing a unit cube between `start` and `end` with the given thickness.
pub fn segment_transform(start: Vec3, end: Vec3, thickness: f32) -> Option<Transform> {
    let delta = end - start;
    let length = delta.length();
    if length <= f32::EPSILON || !length.is_finite() {
        return None;
    }

    Some(Transform {
        translation: (start + end) * 0.5,
        rotation: Quat::from_rotation_arc(Vec3::X, delta / length),
        scale: Vec3::new(length, thickness, thickness),
    })
}

/// Consecutive position pairs, plus the closing pair for closed polylines.
pub fn polyline_segments(positions: &[Vec3], closed: bool) -> Vec<(Vec3, Vec3)> {
    let mut segments: Vec<(Vec3, Vec3)> = positions.windows(2).map(|w| (w[0], w[1])).collect();
    if closed && positions.len() > 2 {
        if let (Some(last), Some(first)) = (positions.last(), positions.first()) {
            segments.push((*last, *first));
        }
    }
    segments
}

/// Triangle list mesh with per-vertex normals.
pub fn build_face_mesh(faces: &FaceMesh) -> Mesh {
    let indices: Vec<u32> = faces.triangles.iter().flatten().copied().collect();
    let positions: Vec<[f32; 3]> = faces.positions.iter().map(|p| p.to_array()).collect();
    let normals: Vec<[f32; 3]> = faces.normals.iter().map(|n| n.to_array()).collect();

    Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::default())
        .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, positions)
        .with_inserted_attribute(Mesh::ATTRIBUTE_NORMAL, normals)
        .with_inserted_indices(Indices::U32(indices))
}

fn visibility_of(visible: bool) -> Visibility {
    if visible {
        Visibility::Inherited
    } else {
        Visibility::Hidden
    }
}

/// Drains scene graph changes and keeps one entity per object in step.
pub fn sync_measure_scene(
    mut commands: Commands,
    mut graph: ResMut<MeasureSceneGraph>,
    mut entities: ResMut<MeasureEntities>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    render_assets: Res<MeasureRenderAssets>,
    mut labels: Query<&mut MeasureLabel>,
    window: Query<Entity, With<PrimaryWindow>>,
) {
    for change in graph.take_changes() {
        match change {
            SceneChange::Removed(id) => {
                if let Some(entity) = entities.entities.remove(&id) {
                    commands.entity(entity).despawn();
                }
            }
            SceneChange::Upserted(id) => {
                if let Some(entity) = entities.entities.remove(&id) {
                    commands.entity(entity).despawn();
                }
                let Some(object) = graph.get(id) else {
                    continue;
                };
                let visible = graph.is_visible(id);

                let entity = match object {
                    SceneObject::Points { positions, style } => spawn_points(
                        &mut commands,
                        &render_assets,
                        &mut materials,
                        positions,
                        *style,
                    ),
                    SceneObject::Polyline {
                        positions,
                        closed,
                        style,
                    } => spawn_polyline(
                        &mut commands,
                        &render_assets,
                        &mut materials,
                        positions,
                        *closed,
                        *style,
                    ),
                    SceneObject::Faces(faces) => {
                        spawn_faces(&mut commands, &mut meshes, &mut materials, faces)
                    }
                    SceneObject::Label(label) => spawn_label(&mut commands, id, label, visible),
                };

                commands.entity(entity).insert(visibility_of(visible));
                entities.entities.insert(id, entity);
                debug!("Spawned {:?} for measurement object {:?}", entity, id);
            }
            SceneChange::Visibility(id) => {
                let Some(entity) = entities.get(id) else {
                    continue;
                };
                let visible = graph.is_visible(id);
                commands.entity(entity).insert(visibility_of(visible));
                if let Ok(mut label) = labels.get_mut(entity) {
                    label.visible = visible;
                }
            }
        }
    }

    if let Some(cursor) = graph.take_cursor_change() {
        let icon = match cursor {
            CursorStyle::Default => SystemCursorIcon::Default,
            CursorStyle::Crosshair => SystemCursorIcon::Crosshair,
        };
        if let Ok(window_entity) = window.single() {
            commands
                .entity(window_entity)
                .insert(CursorIcon::from(icon));
        }
    }
}

fn spawn_points(
    commands: &mut Commands,
    render_assets: &MeasureRenderAssets,
    materials: &mut Assets<StandardMaterial>,
    positions: &[Vec3],
    style: PointStyle,
) -> Entity {
    let material = materials.add(overlay_material(style.color, POINT_OPACITY));
    // Point size 10 maps to the base vertex radius.
    let radius = DRAW_VERTEX_SIZE * style.size / 10.0;

    commands
        .spawn((
            Transform::default(),
            Visibility::default(),
            RenderLayers::layer(OVERLAY_RENDER_LAYER),
        ))
        .with_children(|parent| {
            for position in positions {
                parent.spawn((
                    Mesh3d(render_assets.sphere.clone()),
                    MeshMaterial3d(material.clone()),
                    Transform::from_translation(*position).with_scale(Vec3::splat(radius)),
                    RenderLayers::layer(OVERLAY_RENDER_LAYER),
                    MeasureObject,
                ));
            }
        })
        .id()
}

fn spawn_polyline(
    commands: &mut Commands,
    render_assets: &MeasureRenderAssets,
    materials: &mut Assets<StandardMaterial>,
    positions: &[Vec3],
    closed: bool,
    style: LineStyle,
) -> Entity {
    let material = materials.add(overlay_material(style.color, LINE_OPACITY));
    let thickness = DRAW_LINE_WIDTH * style.width;

    commands
        .spawn((
            Transform::default(),
            Visibility::default(),
            RenderLayers::layer(OVERLAY_RENDER_LAYER),
        ))
        .with_children(|parent| {
            for (start, end) in polyline_segments(positions, closed) {
                let Some(transform) = segment_transform(start, end, thickness) else {
                    continue;
                };
                parent.spawn((
                    Mesh3d(render_assets.segment.clone()),
                    MeshMaterial3d(material.clone()),
                    transform,
                    RenderLayers::layer(OVERLAY_RENDER_LAYER),
                    MeasureObject,
                ));
            }
        })
        .id()
}

fn spawn_faces(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    faces: &FaceMesh,
) -> Entity {
    let mut entity = commands.spawn((
        Transform::default(),
        Visibility::default(),
        RenderLayers::layer(OVERLAY_RENDER_LAYER),
        MeasureObject,
    ));

    if !faces.triangles.is_empty() {
        entity.insert((
            Mesh3d(meshes.add(build_face_mesh(faces))),
            MeshMaterial3d(materials.add(overlay_material(faces.style.color, FACE_OPACITY))),
        ));
    }

    entity.id()
}

fn spawn_label(commands: &mut Commands, id: ObjectId, label: &Label, visible: bool) -> Entity {
    let padding = label.padding();
    commands
        .spawn((
            Node {
                position_type: PositionType::Absolute,
                padding: UiRect::horizontal(Val::Px(padding)),
                min_width: Val::Px(label.extent.x),
                height: Val::Px(label.extent.y),
                align_items: AlignItems::Center,
                justify_content: JustifyContent::Center,
                display: Display::None,
                ..default()
            },
            BackgroundColor(LABEL_BACKGROUND_COLOR),
            Text::new(label.text.clone()),
            TextFont {
                font_size: label.font_size,
                ..default()
            },
            TextColor(LABEL_TEXT_COLOR),
            MeasureLabel {
                id,
                anchor: label.anchor,
                extent: label.extent,
                visible,
                screen_center: None,
            },
        ))
        .id()
}

/// Projects every label anchor into the viewport and places its node there.
pub fn position_measure_labels(
    camera_query: Query<(&Camera, &GlobalTransform), With<MainCamera>>,
    mut labels: Query<(&mut MeasureLabel, &mut Node)>,
) {
    let Ok((camera, camera_transform)) = camera_query.single() else {
        return;
    };

    for (mut label, mut node) in &mut labels {
        let projected = camera
            .world_to_viewport(camera_transform, label.anchor)
            .ok();
        label.screen_center = projected;

        match projected {
            Some(center) if label.visible => {
                node.display = Display::Flex;
                node.left = Val::Px(center.x - label.extent.x * 0.5);
                node.top = Val::Px(center.y - label.extent.y * 0.5);
            }
            _ => node.display = Display::None,
        }
    }
}

use super::buffer::PointBuffer;
use super::geometry::{
    angle_bisector, arc_points, centroid, included_angle, polygon_area, vertex_normals,
};
use super::label::create_label;
use super::registry::DraggableLabelRegistry;
use super::scene::{
    CursorStyle, FaceMesh, FaceStyle, LineStyle, MeasureScene, ObjectId, PointPicker, PointStyle,
    SceneObject,
};
use super::settings::MeasurementSettings;
use bevy::prelude::*;
use constants::interaction::{
    ARC_SEGMENTS, CLICK_MOVE_TOLERANCE_PX, CLICK_SUPPRESSION_MS, MAX_MEASURE_POINTS,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasureMode {
    Coordinates,
    Distance,
    Area,
    Angle,
}

impl MeasureMode {
    pub const ALL: [MeasureMode; 4] = [
        MeasureMode::Coordinates,
        MeasureMode::Distance,
        MeasureMode::Area,
        MeasureMode::Angle,
    ];

    pub fn from_string(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "coordinates" | "coordinate" | "point" => Some(MeasureMode::Coordinates),
            "distance" => Some(MeasureMode::Distance),
            "area" => Some(MeasureMode::Area),
            "angle" => Some(MeasureMode::Angle),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MeasureMode::Coordinates => "coordinates",
            MeasureMode::Distance => "distance",
            MeasureMode::Area => "area",
            MeasureMode::Angle => "angle",
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            MeasureMode::Coordinates => 0,
            MeasureMode::Distance => 1,
            MeasureMode::Area => 2,
            MeasureMode::Angle => 3,
        }
    }

    /// Points required for a valid finalization.
    pub fn min_points(self) -> usize {
        match self {
            MeasureMode::Coordinates => 1,
            MeasureMode::Distance => 2,
            MeasureMode::Area | MeasureMode::Angle => 3,
        }
    }

    fn auto_complete_at(self) -> Option<usize> {
        match self {
            MeasureMode::Distance => Some(2),
            MeasureMode::Angle => Some(3),
            MeasureMode::Coordinates | MeasureMode::Area => None,
        }
    }
}

impl std::fmt::Display for MeasureMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    /// Listening with no committed points.
    Open,
    Collecting,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasureNotification {
    Started,
    PointAdded,
    Completed,
    Closed,
    Cancelled,
    Hover,
    Unhover,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasureKey {
    Enter,
    Escape,
}

/// Collaborators a session needs while handling one input event.
pub struct MeasureContext<'a> {
    pub scene: &'a mut dyn MeasureScene,
    pub picker: &'a mut dyn PointPicker,
    pub settings: &'a MeasurementSettings,
}

#[derive(Debug, Clone, Copy)]
pub struct SessionLimits {
    pub max_points: usize,
    pub click_suppression: Duration,
    /// Pointer travel in pixels beyond which a press/release is a drag.
    pub click_tolerance: f32,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            max_points: MAX_MEASURE_POINTS,
            click_suppression: Duration::from_millis(CLICK_SUPPRESSION_MS),
            click_tolerance: CLICK_MOVE_TOLERANCE_PX,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct SessionStyles {
    point: PointStyle,
    line: LineStyle,
    face: FaceStyle,
}

impl SessionStyles {
    fn from_settings(settings: &MeasurementSettings) -> Self {
        Self {
            point: settings.point_style(),
            line: settings.line_style(),
            face: settings.face_style(),
        }
    }
}

#[derive(Debug, Default)]
struct Preview {
    point: Option<ObjectId>,
    segment: Option<ObjectId>,
    label: Option<ObjectId>,
}

fn upsert(
    scene: &mut dyn MeasureScene,
    slot: &mut Option<ObjectId>,
    object: SceneObject,
    parent: Option<ObjectId>,
) {
    match *slot {
        Some(id) if scene.contains(id) => scene.replace(id, object),
        _ => *slot = Some(scene.add(object, parent)),
    }
}

/// One measurement mode's points, preview and finalized geometry.
///
/// Input only has an effect between `open` and `close`. Notifications are
/// queued and collected by the owner through `take_notifications`.
pub struct MeasurementSession {
    mode: MeasureMode,
    state: SessionState,
    limits: SessionLimits,
    styles: SessionStyles,
    points: PointBuffer,
    triangles: Vec<[u32; 3]>,
    marker: Option<ObjectId>,
    polyline: Option<ObjectId>,
    faces: Option<ObjectId>,
    arc: Option<ObjectId>,
    labels: Vec<ObjectId>,
    preview: Preview,
    registry: DraggableLabelRegistry,
    pressed_at: Option<Vec2>,
    last_click: Option<Duration>,
    hovering: bool,
    outbox: Vec<MeasureNotification>,
}

impl MeasurementSession {
    pub fn new(mode: MeasureMode, limits: SessionLimits) -> Self {
        Self {
            mode,
            state: SessionState::Idle,
            limits,
            styles: SessionStyles::from_settings(&MeasurementSettings::default()),
            points: PointBuffer::new(limits.max_points),
            triangles: Vec::new(),
            marker: None,
            polyline: None,
            faces: None,
            arc: None,
            labels: Vec::new(),
            preview: Preview::default(),
            registry: DraggableLabelRegistry::default(),
            pressed_at: None,
            last_click: None,
            hovering: false,
            outbox: Vec::new(),
        }
    }

    pub fn mode(&self) -> MeasureMode {
        self.mode
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_listening(&self) -> bool {
        self.state != SessionState::Idle
    }

    pub fn points(&self) -> &[Vec3] {
        self.points.as_slice()
    }

    /// Finalized labels, in creation order.
    pub fn labels(&self) -> &[ObjectId] {
        &self.labels
    }

    pub fn registry(&self) -> &DraggableLabelRegistry {
        &self.registry
    }

    pub fn take_notifications(&mut self) -> Vec<MeasureNotification> {
        std::mem::take(&mut self.outbox)
    }

    fn notify(&mut self, notification: MeasureNotification) {
        self.outbox.push(notification);
    }

    fn marker_object(&self) -> SceneObject {
        SceneObject::Points {
            positions: self.points.as_slice().to_vec(),
            style: self.styles.point,
        }
    }

    fn polyline_object(&self, closed: bool) -> SceneObject {
        SceneObject::Polyline {
            positions: self.points.as_slice().to_vec(),
            closed,
            style: self.styles.line,
        }
    }

    fn faces_object(&self) -> SceneObject {
        let positions = self.points.as_slice().to_vec();
        let normals = vertex_normals(&positions, &self.triangles);
        SceneObject::Faces(FaceMesh {
            positions,
            triangles: self.triangles.clone(),
            normals,
            style: self.styles.face,
        })
    }

    pub fn open(&mut self, scene: &mut dyn MeasureScene, settings: &MeasurementSettings) {
        if self.state != SessionState::Idle {
            debug!("{} measurement already open", self.mode);
            return;
        }

        self.styles = SessionStyles::from_settings(settings);
        self.points.clear();
        self.triangles.clear();
        self.labels.clear();
        self.registry.clear();
        self.pressed_at = None;
        self.last_click = None;
        self.hovering = false;

        self.marker = Some(scene.add(self.marker_object(), None));
        if self.mode != MeasureMode::Coordinates {
            self.polyline = Some(scene.add(self.polyline_object(false), None));
        }
        if self.mode == MeasureMode::Area {
            // Hidden until the first triangle exists.
            let faces = scene.add(self.faces_object(), None);
            scene.set_visible(faces, false);
            self.faces = Some(faces);
        }

        scene.set_cursor(CursorStyle::Crosshair);
        self.state = SessionState::Open;
        self.notify(MeasureNotification::Started);
        info!("{} measurement opened", self.mode);
    }

    pub fn pointer_down(&mut self, cursor: Vec2) {
        if self.is_listening() {
            self.pressed_at = Some(cursor);
        }
    }

    pub fn pointer_move(&mut self, cursor: Vec2, ctx: &mut MeasureContext) {
        if !self.is_listening() {
            return;
        }

        let hit = match self.state {
            SessionState::Completed => None,
            _ => ctx.picker.pick(cursor),
        };

        match hit {
            Some(hit) => {
                if !self.hovering {
                    self.hovering = true;
                    self.notify(MeasureNotification::Hover);
                }
                self.update_preview(hit.point, ctx);
            }
            None => {
                self.clear_preview(ctx.scene);
                if self.hovering {
                    self.hovering = false;
                    self.notify(MeasureNotification::Unhover);
                }
            }
        }
    }

    /// Release after a press. Counts as a click only if the pointer stayed put.
    pub fn pointer_up(&mut self, cursor: Vec2, now: Duration, ctx: &mut MeasureContext) {
        if !self.is_listening() {
            return;
        }
        let Some(pressed) = self.pressed_at.take() else {
            return;
        };
        if pressed.distance(cursor) > self.limits.click_tolerance {
            return;
        }
        self.click(cursor, now, ctx);
    }

    pub fn click(&mut self, cursor: Vec2, now: Duration, ctx: &mut MeasureContext) {
        if self.state == SessionState::Idle {
            return;
        }

        // The second release of a double click lands here too; it must not
        // restart a measurement the first release just completed.
        if let Some(last) = self.last_click {
            if now.saturating_sub(last) < self.limits.click_suppression {
                debug!("{} click suppressed", self.mode);
                return;
            }
        }

        if self.state == SessionState::Completed {
            self.restart(ctx);
            return;
        }

        let Some(hit) = ctx.picker.pick(cursor) else {
            return;
        };
        self.last_click = Some(now);

        self.commit_point(hit.point, ctx);
    }

    pub fn double_click(&mut self, ctx: &mut MeasureContext) {
        if self.is_listening() {
            self.complete(true, ctx);
        }
    }

    pub fn key_down(&mut self, key: MeasureKey, ctx: &mut MeasureContext) {
        if !self.is_listening() {
            return;
        }
        match key {
            MeasureKey::Enter => self.complete(true, ctx),
            MeasureKey::Escape => self.cancel(ctx.scene),
        }
    }

    fn commit_point(&mut self, point: Vec3, ctx: &mut MeasureContext) {
        let count = match self.points.push(point) {
            Ok(count) => count,
            Err(e) => {
                error!("{} measurement: {}", self.mode, e);
                return;
            }
        };
        self.state = SessionState::Collecting;

        if let Some(marker) = self.marker {
            ctx.scene.replace(marker, self.marker_object());
        }

        match self.mode {
            MeasureMode::Coordinates => {
                if let Some(live) = self.preview.label.take() {
                    ctx.scene.remove(live);
                }
                let text = ctx.settings.format_coordinates(point);
                let label = create_label(text, point, ctx.settings);
                let id = ctx.scene.add(SceneObject::Label(label), self.marker);
                self.labels.push(id);
            }
            MeasureMode::Distance | MeasureMode::Area | MeasureMode::Angle => {
                if let Some(polyline) = self.polyline {
                    ctx.scene.replace(polyline, self.polyline_object(false));
                }
                if self.mode == MeasureMode::Area && count >= 3 {
                    self.triangles
                        .push([0, (count - 2) as u32, (count - 1) as u32]);
                    if let Some(faces) = self.faces {
                        ctx.scene.replace(faces, self.faces_object());
                        ctx.scene.set_visible(faces, true);
                    }
                }
            }
        }

        self.notify(MeasureNotification::PointAdded);
        debug!("{} point {} at {:?}", self.mode, count, point);

        if self.mode.auto_complete_at() == Some(count) {
            self.complete(false, ctx);
        }
    }

    fn update_preview(&mut self, point: Vec3, ctx: &mut MeasureContext) {
        let marker = SceneObject::Points {
            positions: vec![point],
            style: self.styles.point,
        };
        upsert(ctx.scene, &mut self.preview.point, marker, None);

        match self.mode {
            MeasureMode::Coordinates => {
                let text = ctx.settings.format_coordinates(point);
                let label = create_label(text, point, ctx.settings);
                self.replace_live_label(ctx.scene, SceneObject::Label(label), self.preview.point);
            }
            MeasureMode::Distance | MeasureMode::Area | MeasureMode::Angle => {
                let Some(last) = self.points.last() else {
                    return;
                };

                let mut positions = vec![last, point];
                if self.mode == MeasureMode::Area && self.points.len() >= 2 {
                    if let Some(first) = self.points.first() {
                        positions.push(first);
                    }
                }
                let segment = SceneObject::Polyline {
                    positions,
                    closed: false,
                    style: self.styles.line,
                };
                upsert(ctx.scene, &mut self.preview.segment, segment, None);

                if self.mode == MeasureMode::Distance {
                    let text = ctx.settings.format_length(last.distance(point));
                    let label = create_label(text, (last + point) * 0.5, ctx.settings);
                    self.replace_live_label(
                        ctx.scene,
                        SceneObject::Label(label),
                        self.preview.segment,
                    );
                }
            }
        }
    }

    fn replace_live_label(
        &mut self,
        scene: &mut dyn MeasureScene,
        label: SceneObject,
        parent: Option<ObjectId>,
    ) {
        if let Some(old) = self.preview.label.take() {
            scene.remove(old);
        }
        self.preview.label = Some(scene.add(label, parent));
    }

    fn clear_preview(&mut self, scene: &mut dyn MeasureScene) {
        let preview = [
            self.preview.label.take(),
            self.preview.segment.take(),
            self.preview.point.take(),
        ];
        for id in preview.into_iter().flatten() {
            scene.remove(id);
        }
    }

    /// Finalizes the measurement. Repeated calls after completion do nothing.
    ///
    /// With too few points, `check_and_reload` restarts the session; otherwise
    /// the partial geometry is dropped and the session still completes.
    pub fn complete(&mut self, check_and_reload: bool, ctx: &mut MeasureContext) {
        if !matches!(self.state, SessionState::Open | SessionState::Collecting) {
            return;
        }

        if self.points.len() < self.mode.min_points() {
            if check_and_reload {
                info!(
                    "{} measurement needs {} points, restarting",
                    self.mode,
                    self.mode.min_points()
                );
                self.restart(ctx);
                return;
            }
            self.drop_incomplete(ctx.scene);
        } else {
            self.finalize(ctx);
        }

        for label in self.labels.iter().copied() {
            self.registry.register(label);
        }
        self.clear_preview(ctx.scene);
        ctx.scene.set_cursor(CursorStyle::Default);
        self.state = SessionState::Completed;
        self.notify(MeasureNotification::Completed);
        info!(
            "{} measurement completed with {} points",
            self.mode,
            self.points.len()
        );
    }

    fn drop_incomplete(&mut self, scene: &mut dyn MeasureScene) {
        let mut dropped = vec![self.marker.take()];
        if matches!(self.mode, MeasureMode::Area | MeasureMode::Angle) {
            dropped.push(self.polyline.take());
            dropped.push(self.faces.take());
        }
        for id in dropped.into_iter().flatten() {
            scene.remove(id);
        }
        self.labels.retain(|id| scene.contains(*id));
    }

    fn finalize(&mut self, ctx: &mut MeasureContext) {
        let points = self.points.as_slice().to_vec();
        match self.mode {
            MeasureMode::Coordinates => {}
            MeasureMode::Distance => {
                let [start, end, ..] = points[..] else {
                    return;
                };
                let text = ctx.settings.format_length(start.distance(end));
                self.add_final_label(ctx, text, (start + end) * 0.5);
            }
            MeasureMode::Area => {
                if let Some(polyline) = self.polyline {
                    ctx.scene.replace(polyline, self.polyline_object(true));
                }
                let text = ctx.settings.format_area(polygon_area(&points));
                self.add_final_label(ctx, text, centroid(&points));
            }
            MeasureMode::Angle => {
                let [start, vertex, end, ..] = points[..] else {
                    return;
                };
                self.finalize_angle(start, vertex, end, ctx);
            }
        }
    }

    fn finalize_angle(&mut self, start: Vec3, vertex: Vec3, end: Vec3, ctx: &mut MeasureContext) {
        let (dir0, bisector, dir2) = angle_bisector(start, vertex, end);
        let angle = included_angle(dir0, dir2);
        let reach = 0.5 * start.distance(vertex).min(end.distance(vertex));

        let mut anchor = vertex + bisector * reach;
        if !anchor.is_finite() {
            warn!("Degenerate angle corner, placing label at the vertex");
            anchor = vertex;
        }
        let text = ctx.settings.format_angle(angle);
        self.add_final_label(ctx, text, anchor);

        let arc = arc_points(dir0, dir2, vertex, reach, ARC_SEGMENTS);
        if arc.iter().all(|p| p.is_finite()) {
            let object = SceneObject::Polyline {
                positions: arc,
                closed: false,
                style: self.styles.line,
            };
            self.arc = Some(ctx.scene.add(object, None));
        } else {
            warn!("Degenerate angle corner, arc skipped");
        }
    }

    /// Final labels hang off the polyline so they go away with it.
    fn add_final_label(&mut self, ctx: &mut MeasureContext, text: String, anchor: Vec3) {
        let label = create_label(text, anchor, ctx.settings);
        let id = ctx.scene.add(SceneObject::Label(label), self.polyline);
        self.labels.push(id);
    }

    fn restart(&mut self, ctx: &mut MeasureContext) {
        self.close(ctx.scene);
        self.open(ctx.scene, ctx.settings);
    }

    pub fn cancel(&mut self, scene: &mut dyn MeasureScene) {
        if self.state == SessionState::Idle {
            return;
        }
        self.notify(MeasureNotification::Cancelled);
        self.close(scene);
    }

    pub fn close(&mut self, scene: &mut dyn MeasureScene) {
        if self.state == SessionState::Idle {
            return;
        }

        self.clear_preview(scene);
        let owned = [
            self.arc.take(),
            self.faces.take(),
            self.polyline.take(),
            self.marker.take(),
        ];
        for id in owned.into_iter().flatten() {
            scene.remove(id);
        }
        for id in self.labels.drain(..) {
            scene.remove(id);
        }

        self.points.clear();
        self.triangles.clear();
        self.registry.clear();
        self.pressed_at = None;
        self.last_click = None;
        self.hovering = false;

        scene.set_cursor(CursorStyle::Default);
        self.state = SessionState::Idle;
        self.notify(MeasureNotification::Closed);
        info!("{} measurement closed", self.mode);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::tools::measure::scene::{MeasureSceneGraph, PickHit};
    use approx::assert_relative_eq;

    /// Returns a fixed hit, or nothing.
    #[derive(Default)]
    pub(crate) struct ScriptedPicker {
        pub hit: Option<Vec3>,
    }

    impl PointPicker for ScriptedPicker {
        fn pick(&mut self, _cursor: Vec2) -> Option<PickHit> {
            self.hit.map(|point| PickHit {
                point,
                distance: 1.0,
            })
        }
    }

    struct Harness {
        scene: MeasureSceneGraph,
        picker: ScriptedPicker,
        settings: MeasurementSettings,
        now: Duration,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                scene: MeasureSceneGraph::default(),
                picker: ScriptedPicker::default(),
                settings: MeasurementSettings::default(),
                now: Duration::from_secs(10),
            }
        }

        fn ctx(&mut self) -> MeasureContext<'_> {
            MeasureContext {
                scene: &mut self.scene,
                picker: &mut self.picker,
                settings: &self.settings,
            }
        }

        fn open(&mut self, mode: MeasureMode) -> MeasurementSession {
            let mut session = MeasurementSession::new(mode, SessionLimits::default());
            session.open(&mut self.scene, &self.settings);
            session
        }

        /// Press and release on `point`, one second after the previous click.
        fn click(&mut self, session: &mut MeasurementSession, point: Vec3) {
            self.picker.hit = Some(point);
            self.now += Duration::from_secs(1);
            let now = self.now;
            session.pointer_down(Vec2::new(100.0, 100.0));
            session.pointer_up(Vec2::new(100.0, 100.0), now, &mut self.ctx());
        }

        fn move_to(&mut self, session: &mut MeasurementSession, hit: Option<Vec3>) {
            self.picker.hit = hit;
            session.pointer_move(Vec2::new(50.0, 50.0), &mut self.ctx());
        }

        fn label_texts(&self) -> Vec<String> {
            self.scene
                .labels()
                .map(|(_, label)| label.text.clone())
                .collect()
        }
    }

    #[test]
    fn distance_produces_one_formatted_label() {
        let mut h = Harness::new();
        let mut session = h.open(MeasureMode::Distance);
        h.click(&mut session, Vec3::ZERO);
        h.click(&mut session, Vec3::new(3.0, 4.0, 0.0));

        assert_eq!(session.state(), SessionState::Completed);
        assert_eq!(h.label_texts(), vec!["5.00 m".to_string()]);
        assert_eq!(session.registry().len(), 1);
        assert_eq!(
            session.take_notifications(),
            vec![
                MeasureNotification::Started,
                MeasureNotification::PointAdded,
                MeasureNotification::PointAdded,
                MeasureNotification::Completed,
            ]
        );
    }

    #[test]
    fn completing_twice_changes_nothing() {
        let mut h = Harness::new();
        let mut session = h.open(MeasureMode::Distance);
        h.click(&mut session, Vec3::ZERO);
        h.click(&mut session, Vec3::X);
        session.take_notifications();
        let objects = h.scene.len();

        session.complete(true, &mut h.ctx());
        session.complete(false, &mut h.ctx());

        assert_eq!(h.scene.len(), objects);
        assert_eq!(h.label_texts().len(), 1);
        assert_eq!(session.registry().len(), 1);
        assert!(session.take_notifications().is_empty());
    }

    #[test]
    fn point_past_capacity_is_rejected() {
        let mut h = Harness::new();
        let mut session = h.open(MeasureMode::Coordinates);
        for i in 0..=MAX_MEASURE_POINTS {
            h.click(&mut session, Vec3::new(i as f32, 0.0, 0.0));
        }

        assert_eq!(session.points().len(), MAX_MEASURE_POINTS);
        assert_eq!(session.labels().len(), MAX_MEASURE_POINTS);
        assert_eq!(session.state(), SessionState::Collecting);
    }

    #[test]
    fn coordinate_label_lists_all_axes() {
        let mut h = Harness::new();
        let mut session = h.open(MeasureMode::Coordinates);
        h.click(&mut session, Vec3::new(1.234, 5.0, -0.5));
        h.click(&mut session, Vec3::new(2.0, 0.0, 0.0));

        let mut texts = h.label_texts();
        texts.sort();
        assert_eq!(texts, vec!["(1.23, 5.00, -0.50) m", "(2.00, 0, 0) m"]);
        assert_eq!(session.state(), SessionState::Collecting);
    }

    #[test]
    fn angle_completes_on_third_point() {
        let mut h = Harness::new();
        let mut session = h.open(MeasureMode::Angle);
        h.click(&mut session, Vec3::X);
        h.click(&mut session, Vec3::ZERO);
        h.click(&mut session, Vec3::Y);

        assert_eq!(session.state(), SessionState::Completed);
        assert_eq!(h.label_texts(), vec!["90.0 °".to_string()]);

        let (_, label) = h.scene.labels().next().unwrap();
        let expected = Vec3::new(1.0, 1.0, 0.0).normalize() * 0.5;
        assert_relative_eq!(label.anchor.x, expected.x, epsilon = 1e-5);
        assert_relative_eq!(label.anchor.y, expected.y, epsilon = 1e-5);

        let arc = session.arc.and_then(|id| h.scene.get(id)).unwrap();
        match arc {
            SceneObject::Polyline { positions, .. } => {
                assert_eq!(positions.len(), ARC_SEGMENTS + 1);
                for point in positions {
                    assert_relative_eq!(point.length(), 0.5, epsilon = 1e-4);
                }
            }
            other => panic!("arc should be a polyline, got {:?}", other),
        }
    }

    #[test]
    fn angle_in_radians() {
        let mut h = Harness::new();
        h.settings
            .set_angle_unit(crate::tools::measure::settings::AngleUnit::Radian);
        let mut session = h.open(MeasureMode::Angle);
        h.click(&mut session, Vec3::X);
        h.click(&mut session, Vec3::ZERO);
        h.click(&mut session, Vec3::Y);

        assert_eq!(h.label_texts(), vec!["1.57 rad".to_string()]);
    }

    #[test]
    fn degenerate_angle_surfaces_nan_without_arc() {
        let mut h = Harness::new();
        let mut session = h.open(MeasureMode::Angle);
        h.click(&mut session, Vec3::X);
        h.click(&mut session, Vec3::ZERO);
        h.click(&mut session, Vec3::ZERO);

        assert_eq!(session.state(), SessionState::Completed);
        assert_eq!(h.label_texts(), vec!["NaN °".to_string()]);
        assert!(session.arc.is_none());
    }

    #[test]
    fn escape_right_after_open_leaves_nothing() {
        for mode in MeasureMode::ALL {
            let mut h = Harness::new();
            let mut session = h.open(mode);
            assert!(!h.scene.is_empty());
            session.take_notifications();

            session.key_down(MeasureKey::Escape, &mut h.ctx());

            assert!(h.scene.is_empty(), "{} left objects behind", mode);
            assert_eq!(session.state(), SessionState::Idle);
            assert_eq!(
                session.take_notifications(),
                vec![MeasureNotification::Cancelled, MeasureNotification::Closed]
            );
        }
    }

    #[test]
    fn quick_second_click_is_suppressed() {
        let mut h = Harness::new();
        let mut session = h.open(MeasureMode::Coordinates);
        h.picker.hit = Some(Vec3::ONE);

        let cursor = Vec2::new(10.0, 10.0);
        session.pointer_down(cursor);
        session.pointer_up(cursor, Duration::from_millis(1000), &mut h.ctx());
        session.pointer_down(cursor);
        session.pointer_up(cursor, Duration::from_millis(1200), &mut h.ctx());
        assert_eq!(session.points().len(), 1);

        session.pointer_down(cursor);
        session.pointer_up(cursor, Duration::from_millis(1600), &mut h.ctx());
        assert_eq!(session.points().len(), 2);
    }

    #[test]
    fn dragging_is_not_a_click() {
        let mut h = Harness::new();
        let mut session = h.open(MeasureMode::Coordinates);
        h.picker.hit = Some(Vec3::ONE);

        session.pointer_down(Vec2::new(10.0, 10.0));
        session.pointer_up(Vec2::new(40.0, 10.0), Duration::from_secs(1), &mut h.ctx());

        assert!(session.points().is_empty());
    }

    #[test]
    fn miss_adds_no_point() {
        let mut h = Harness::new();
        let mut session = h.open(MeasureMode::Distance);
        h.picker.hit = None;
        session.pointer_down(Vec2::ZERO);
        session.pointer_up(Vec2::ZERO, Duration::from_secs(1), &mut h.ctx());

        assert!(session.points().is_empty());
        assert_eq!(session.state(), SessionState::Open);
    }

    #[test]
    fn area_closes_polyline_and_triangulates() {
        let mut h = Harness::new();
        let mut session = h.open(MeasureMode::Area);
        for corner in [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(2.0, 0.0, 2.0),
            Vec3::new(0.0, 0.0, 2.0),
        ] {
            h.click(&mut session, corner);
        }
        assert_eq!(session.state(), SessionState::Collecting);

        session.key_down(MeasureKey::Enter, &mut h.ctx());
        assert_eq!(session.state(), SessionState::Completed);

        let polyline = session.polyline.and_then(|id| h.scene.get(id)).unwrap();
        assert!(matches!(polyline, SceneObject::Polyline { closed: true, .. }));

        let faces_id = session.faces.unwrap();
        assert!(h.scene.is_visible(faces_id));
        match h.scene.get(faces_id).unwrap() {
            SceneObject::Faces(mesh) => {
                assert_eq!(mesh.triangles, vec![[0, 1, 2], [0, 2, 3]]);
                assert_eq!(mesh.normals.len(), 4);
            }
            other => panic!("expected faces, got {:?}", other),
        }

        let (_, label) = h.scene.labels().next().unwrap();
        assert_eq!(label.text, "4.00 m²");
        assert_relative_eq!(label.anchor.x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(label.anchor.z, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn click_after_completion_restarts() {
        let mut h = Harness::new();
        let mut session = h.open(MeasureMode::Distance);
        h.click(&mut session, Vec3::ZERO);
        h.click(&mut session, Vec3::X);
        session.take_notifications();

        h.click(&mut session, Vec3::Y);

        assert_eq!(session.state(), SessionState::Open);
        assert!(session.points().is_empty());
        assert!(h.label_texts().is_empty());
        assert_eq!(h.scene.len(), 2);
        assert!(session.registry().is_empty());
        assert_eq!(
            session.take_notifications(),
            vec![MeasureNotification::Closed, MeasureNotification::Started]
        );
    }

    #[test]
    fn strict_completion_with_too_few_points_reopens() {
        let mut h = Harness::new();
        let mut session = h.open(MeasureMode::Distance);
        h.click(&mut session, Vec3::ZERO);
        session.take_notifications();

        session.double_click(&mut h.ctx());

        assert_eq!(session.state(), SessionState::Open);
        assert!(session.points().is_empty());
        assert_eq!(
            session.take_notifications(),
            vec![MeasureNotification::Closed, MeasureNotification::Started]
        );
    }

    #[test]
    fn strict_completion_reopens_area_and_angle() {
        for mode in [MeasureMode::Area, MeasureMode::Angle] {
            let mut h = Harness::new();
            let mut session = h.open(mode);
            h.click(&mut session, Vec3::ZERO);
            h.click(&mut session, Vec3::X);
            session.take_notifications();

            session.key_down(MeasureKey::Enter, &mut h.ctx());

            assert_eq!(session.state(), SessionState::Open, "{}", mode);
            assert!(session.points().is_empty());
            assert!(h.label_texts().is_empty());
            assert_eq!(
                session.take_notifications(),
                vec![MeasureNotification::Closed, MeasureNotification::Started]
            );
        }
    }

    #[test]
    fn strict_completion_of_empty_coordinates_reopens() {
        let mut h = Harness::new();
        let mut session = h.open(MeasureMode::Coordinates);
        session.take_notifications();

        session.complete(true, &mut h.ctx());

        assert_eq!(session.state(), SessionState::Open);
        assert!(session.points().is_empty());
        assert!(session.marker.is_some());
        assert_eq!(
            session.take_notifications(),
            vec![MeasureNotification::Closed, MeasureNotification::Started]
        );
    }

    #[test]
    fn lenient_completion_of_short_angle_drops_polyline() {
        let mut h = Harness::new();
        let mut session = h.open(MeasureMode::Angle);
        h.click(&mut session, Vec3::X);
        h.click(&mut session, Vec3::ZERO);
        assert!(session.polyline.is_some());

        session.complete(false, &mut h.ctx());

        assert_eq!(session.state(), SessionState::Completed);
        assert!(session.polyline.is_none());
        assert!(session.arc.is_none());
        assert!(session.marker.is_none());
        assert!(h.scene.is_empty());
    }

    #[test]
    fn double_click_on_the_auto_completing_point_keeps_the_result() {
        let mut h = Harness::new();
        let mut session = h.open(MeasureMode::Angle);
        h.click(&mut session, Vec3::X);
        h.click(&mut session, Vec3::ZERO);
        h.click(&mut session, Vec3::Y);
        assert_eq!(session.state(), SessionState::Completed);

        // Second release of the double click, 150 ms after the first.
        let second = h.now + Duration::from_millis(150);
        session.pointer_down(Vec2::new(100.0, 100.0));
        session.pointer_up(Vec2::new(100.0, 100.0), second, &mut h.ctx());
        session.double_click(&mut h.ctx());

        assert_eq!(session.state(), SessionState::Completed);
        assert_eq!(h.label_texts(), vec!["90.0 °".to_string()]);
        assert!(session.arc.and_then(|id| h.scene.get(id)).is_some());

        // A later click starts over.
        h.click(&mut session, Vec3::Z);
        assert_eq!(session.state(), SessionState::Open);
        assert!(session.points().is_empty());
    }

    #[test]
    fn lenient_completion_drops_partial_geometry() {
        let mut h = Harness::new();
        let mut session = h.open(MeasureMode::Area);
        h.click(&mut session, Vec3::ZERO);
        h.click(&mut session, Vec3::X);

        session.complete(false, &mut h.ctx());

        assert_eq!(session.state(), SessionState::Completed);
        assert!(h.scene.is_empty());
        assert!(session.registry().is_empty());
    }

    #[test]
    fn preview_tracks_pointer_and_replaces_live_label() {
        let mut h = Harness::new();
        let mut session = h.open(MeasureMode::Distance);
        h.click(&mut session, Vec3::ZERO);
        session.take_notifications();

        h.move_to(&mut session, Some(Vec3::new(0.0, 2.0, 0.0)));
        let first_live = session.preview.label.unwrap();
        assert_eq!(h.label_texts(), vec!["2.00 m".to_string()]);

        h.move_to(&mut session, Some(Vec3::new(0.0, 3.0, 0.0)));
        let second_live = session.preview.label.unwrap();
        assert_ne!(first_live, second_live);
        assert!(!h.scene.contains(first_live));
        assert_eq!(h.label_texts(), vec!["3.00 m".to_string()]);

        h.move_to(&mut session, None);
        assert!(h.label_texts().is_empty());
        assert!(session.preview.point.is_none());
        assert!(session.preview.segment.is_none());
        assert_eq!(
            session.take_notifications(),
            vec![MeasureNotification::Hover, MeasureNotification::Unhover]
        );
    }

    #[test]
    fn area_preview_closes_back_to_first_point() {
        let mut h = Harness::new();
        let mut session = h.open(MeasureMode::Area);
        h.click(&mut session, Vec3::ZERO);
        h.click(&mut session, Vec3::X);

        h.move_to(&mut session, Some(Vec3::Z));
        let segment = session.preview.segment.and_then(|id| h.scene.get(id)).unwrap();
        match segment {
            SceneObject::Polyline { positions, .. } => {
                assert_eq!(positions, &vec![Vec3::X, Vec3::Z, Vec3::ZERO]);
            }
            other => panic!("expected polyline, got {:?}", other),
        }
    }

    #[test]
    fn settings_changes_do_not_restyle_open_session() {
        let mut h = Harness::new();
        let mut session = h.open(MeasureMode::Distance);
        let original = h.settings.line_style();
        h.settings.set_line_color("#00ff00").unwrap();
        h.click(&mut session, Vec3::ZERO);

        match session.polyline.and_then(|id| h.scene.get(id)).unwrap() {
            SceneObject::Polyline { style, .. } => assert_eq!(*style, original),
            other => panic!("expected polyline, got {:?}", other),
        }
    }

    #[test]
    fn input_is_ignored_while_idle() {
        let mut h = Harness::new();
        let mut session = MeasurementSession::new(MeasureMode::Distance, SessionLimits::default());
        h.picker.hit = Some(Vec3::ONE);
        session.pointer_down(Vec2::ZERO);
        session.pointer_up(Vec2::ZERO, Duration::from_secs(1), &mut h.ctx());
        session.key_down(MeasureKey::Escape, &mut h.ctx());

        assert!(session.points().is_empty());
        assert!(h.scene.is_empty());
        assert!(session.take_notifications().is_empty());
    }
}

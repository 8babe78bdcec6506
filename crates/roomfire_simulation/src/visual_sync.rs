//! Render-physics synchronizer
//!
//! Каждая сущность песочницы = пара entities:
//! - physics body (Rapier `RigidBody` + `Collider`) — владеет transform
//! - visual node (`VisualShape`) — то, что рисует хост
//!
//! Связь двусторонняя: `HasVisual(visual)` на body, `VisualOf(body)` на visual.
//! Копирование ТОЛЬКО body → visual, никогда наоборот.

use bevy::prelude::*;
use bevy_rapier3d::prelude::RigidBody;

use crate::logger;

/// Link: physics body → visual entity
#[derive(Component, Debug, Clone, Copy)]
pub struct HasVisual(pub Entity);

/// Link: visual entity → physics body
#[derive(Component, Debug, Clone, Copy)]
pub struct VisualOf(pub Entity);

/// Что хост должен нарисовать для visual entity
#[derive(Component, Debug, Clone, PartialEq)]
pub enum VisualShape {
    Sphere {
        radius: f32,
    },
    Box {
        half_extents: Vec3,
        alpha: f32,
    },
    /// Debug-сетка пола
    Grid {
        half_extent: f32,
    },
    /// Debug wireframe room-mesh collider (local space)
    TriMesh {
        vertices: Vec<Vec3>,
        indices: Vec<[u32; 3]>,
    },
}

/// Visibility toggle для debug визуалов (хост маппит на свой visibility)
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebugVisible(pub bool);

/// Spawn visual entity, привязанной к body. Возвращает visual entity.
pub fn spawn_paired_visual(
    commands: &mut Commands,
    body: Entity,
    shape: VisualShape,
    transform: Transform,
) -> Entity {
    let visual = commands.spawn((shape, transform, VisualOf(body))).id();
    commands.entity(body).insert(HasVisual(visual));
    visual
}

/// Despawn body + visual одной пачкой commands (атомарно для следующего flush)
pub fn despawn_pair(commands: &mut Commands, body: Entity, visual: Option<Entity>) {
    if let Some(visual) = visual {
        commands.entity(visual).try_despawn();
    }
    commands.entity(body).try_despawn();
}

/// Система: body transform → visual transform
pub fn sync_visual_transforms(
    bodies: Query<(&Transform, &HasVisual), (With<RigidBody>, Changed<Transform>)>,
    mut visuals: Query<&mut Transform, (With<VisualOf>, Without<HasVisual>)>,
) {
    for (body_transform, has_visual) in bodies.iter() {
        if let Ok(mut visual_transform) = visuals.get_mut(has_visual.0) {
            *visual_transform = *body_transform;
        }
    }
}

/// Система: visual без живого body удаляется
///
/// Штатно pair удаляется целиком; sweep ловит body, удалённый в обход менеджеров.
pub fn despawn_orphan_visuals(
    mut commands: Commands,
    visuals: Query<(Entity, &VisualOf)>,
    bodies: Query<(), With<HasVisual>>,
) {
    for (visual, link) in visuals.iter() {
        if bodies.get(link.0).is_err() {
            logger::log_warning(&format!(
                "Orphan visual {:?} (body {:?} is gone), despawning",
                visual, link.0
            ));
            commands.entity(visual).try_despawn();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sync_app() -> App {
        let mut app = App::new();
        app.add_systems(Update, (sync_visual_transforms, despawn_orphan_visuals).chain());
        app
    }

    #[test]
    fn test_body_transform_copied_to_visual() {
        let mut app = sync_app();

        let body = app
            .world_mut()
            .spawn((RigidBody::Dynamic, Transform::from_xyz(1.0, 2.0, 3.0)))
            .id();
        let visual = app
            .world_mut()
            .spawn((VisualShape::Sphere { radius: 0.1 }, Transform::default(), VisualOf(body)))
            .id();
        app.world_mut().entity_mut(body).insert(HasVisual(visual));

        app.update();

        let visual_transform = app.world().get::<Transform>(visual).copied();
        assert_eq!(visual_transform.map(|t| t.translation), Some(Vec3::new(1.0, 2.0, 3.0)));
    }

    #[test]
    fn test_visual_never_pushes_back_to_body() {
        let mut app = sync_app();

        let body = app
            .world_mut()
            .spawn((RigidBody::Fixed, Transform::from_xyz(0.0, 1.0, 0.0)))
            .id();
        let visual = app
            .world_mut()
            .spawn((VisualShape::Sphere { radius: 0.1 }, Transform::default(), VisualOf(body)))
            .id();
        app.world_mut().entity_mut(body).insert(HasVisual(visual));
        app.update();

        // Хост подвинул visual — body не должен сдвинуться
        if let Some(mut t) = app.world_mut().get_mut::<Transform>(visual) {
            t.translation = Vec3::splat(9.0);
        }
        app.update();

        let body_y = app.world().get::<Transform>(body).map(|t| t.translation.y);
        assert_eq!(body_y, Some(1.0));
    }

    #[test]
    fn test_orphan_visual_is_swept() {
        let mut app = sync_app();

        let body = app.world_mut().spawn((RigidBody::Fixed, Transform::default())).id();
        let visual = app
            .world_mut()
            .spawn((VisualShape::Sphere { radius: 0.1 }, Transform::default(), VisualOf(body)))
            .id();
        app.world_mut().entity_mut(body).insert(HasVisual(visual));
        app.update();

        app.world_mut().despawn(body);
        app.update();

        assert!(app.world().get_entity(visual).is_err());
    }
}

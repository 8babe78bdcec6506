use bevy::prelude::*;
use roomfire_simulation::{CapabilityNotice, DebugVisible, InteractionHint, ProjectileManager, RoomMeshStats, VisualShape};

pub struct RenderingPlugin;

impl Plugin for RenderingPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, spawn_hud).add_systems(
            Update,
            (
                attach_meshes_to_new_visuals,
                draw_debug_visuals,
                remember_notices.pipe(update_hud),
            )
                .chain()
                .after(roomfire_simulation::SandboxFrameSet),
        );
    }
}

/// HUD строка (hint + статистика + последний notice)
#[derive(Component)]
pub struct HudText;

/// Последний capability notice (висит на HUD)
#[derive(Default)]
struct LastNotice(Option<&'static str>);

/// Mesh для новых visual entities (Sphere / Box)
///
/// Grid и TriMesh — debug визуалы, рисуются gizmos каждый кадр.
fn attach_meshes_to_new_visuals(
    mut commands: Commands,
    query: Query<(Entity, &VisualShape), Added<VisualShape>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    for (visual, shape) in query.iter() {
        match shape {
            VisualShape::Sphere { radius } => {
                commands.entity(visual).insert((
                    Mesh3d(meshes.add(Sphere::new(*radius))),
                    MeshMaterial3d(materials.add(Color::srgb(0.95, 0.45, 0.1))),
                ));
            }
            VisualShape::Box { half_extents, alpha } => {
                commands.entity(visual).insert((
                    Mesh3d(meshes.add(Cuboid::from_size(*half_extents * 2.0))),
                    MeshMaterial3d(materials.add(StandardMaterial {
                        base_color: Color::srgba(0.2, 0.6, 0.9, *alpha),
                        alpha_mode: AlphaMode::Blend,
                        ..default()
                    })),
                ));
            }
            VisualShape::Grid { .. } | VisualShape::TriMesh { .. } => {}
        }
    }
}

fn draw_debug_visuals(query: Query<(&VisualShape, &Transform, Option<&DebugVisible>)>, mut gizmos: Gizmos) {
    for (shape, transform, visible) in query.iter() {
        if visible.is_some_and(|v| !v.0) {
            continue;
        }

        match shape {
            VisualShape::Grid { half_extent } => {
                // Gizmo grid лежит в XY — кладём на пол
                let cells = (half_extent * 2.0).max(1.0) as u32;
                gizmos.grid(
                    bevy::math::Isometry3d::new(
                        transform.translation,
                        transform.rotation * Quat::from_rotation_x(std::f32::consts::FRAC_PI_2),
                    ),
                    UVec2::splat(cells),
                    Vec2::splat(1.0),
                    Color::srgba(0.3, 0.9, 0.4, 0.6),
                );
            }
            VisualShape::TriMesh { vertices, indices } => {
                let color = Color::srgba(0.9, 0.2, 0.8, 0.7);
                for triangle in indices {
                    let [a, b, c] = triangle.map(|i| {
                        vertices
                            .get(i as usize)
                            .map(|v| transform.transform_point(*v))
                            .unwrap_or(transform.translation)
                    });
                    gizmos.linestrip([a, b, c, a], color);
                }
            }
            VisualShape::Sphere { .. } | VisualShape::Box { .. } => {}
        }
    }
}

fn spawn_hud(mut commands: Commands) {
    commands.spawn((
        Text::new(""),
        TextFont {
            font_size: 18.0,
            ..default()
        },
        Node {
            position_type: PositionType::Absolute,
            top: Val::Px(10.0),
            left: Val::Px(10.0),
            ..default()
        },
        HudText,
    ));
}

fn remember_notices(mut notices: EventReader<CapabilityNotice>, mut last: Local<LastNotice>) -> Option<&'static str> {
    if let Some(notice) = notices.read().last() {
        last.0 = Some(notice.message());
    }
    last.0
}

fn update_hud(
    In(notice): In<Option<&'static str>>,
    hint: Res<InteractionHint>,
    stats: Res<RoomMeshStats>,
    projectiles: Res<ProjectileManager>,
    mut hud: Query<&mut Text, With<HudText>>,
) {
    let Ok(mut text) = hud.single_mut() else {
        return;
    };

    let mut line = format!(
        "{}\nprojectiles: {} | room surfaces: {}\n[LMB] right hand  [Shift+LMB] left hand  [RMB] look  [WASD/QE] walk\n[F1] start  [F2] end  [C] clear  [M] mesh debug  [H] hit-test on/off",
        hint.message(),
        projectiles.len(),
        stats.tracked,
    );
    if let Some(notice) = notice {
        line.push('\n');
        line.push_str(notice);
    }
    text.0 = line;
}

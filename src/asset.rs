use std::path::Path;

use anyhow::Context;
use glam::{EulerRot, Quat, Vec3};

use crate::math::Aabb;
use crate::scene_graph::{Object3D, ObjectId, Scene};

/// Spawns the default scene of a glTF file under a new root object.
///
/// Only the node hierarchy and accessor bounds are read; vertex data stays on
/// disk, which is all the framing logic needs.
pub fn import_gltf(scene: &mut Scene, path: &Path) -> anyhow::Result<ObjectId> {
    let gltf = gltf::Gltf::open(path)
        .with_context(|| format!("Failed to open glTF {}", path.display()))?;
    let gltf_scene = gltf
        .default_scene()
        .or_else(|| gltf.scenes().next())
        .context("No scenes in gltf")?;

    let name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Asset".to_string());
    let root = scene.add_object(Object3D::named(name));

    for node in gltf_scene.nodes() {
        spawn_gltf_node(scene, &node, root);
    }

    log::info!(
        "Imported {} ({} nodes)",
        path.display(),
        gltf.nodes().count()
    );

    Ok(root)
}

fn spawn_gltf_node(scene: &mut Scene, node: &gltf::Node, parent: ObjectId) -> ObjectId {
    let mut object = Object3D::named(node.name().unwrap_or("Unnamed"));
    let (translation, rotation, scale) = node.transform().decomposed();
    let (x, y, z) = Quat::from_array(rotation).to_euler(EulerRot::XYZ);

    object
        .transform
        .set_transform(translation.into(), Vec3::new(x, y, z), scale.into());

    if let Some(mesh) = node.mesh() {
        object.local_bounds = mesh
            .primitives()
            .map(|primitive| {
                let bounds = primitive.bounding_box();
                Aabb::new(bounds.min.into(), bounds.max.into())
            })
            .reduce(|a, b| a.union(&b));
    }

    let object_id = scene.add_object(object);
    scene.set_object_parent(object_id, Some(parent));

    for child in node.children() {
        spawn_gltf_node(scene, &child, object_id);
    }

    object_id
}

/// A box-shaped stand-in for an asset, with geometry centered on `center`.
pub fn spawn_placeholder(scene: &mut Scene, name: &str, center: Vec3, size: Vec3) -> ObjectId {
    scene.add_object(Object3D::named(name).with_bounds(Aabb::from_center_size(center, size)))
}

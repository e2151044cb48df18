use std::collections::BTreeMap;
use std::path::Path;

use tracing::{debug, info};

use crate::instruction::{present_look, BindError};
use crate::look_keys::validate_look_file_name;
use crate::program::Program;
use crate::resources::ImageCache;
use crate::stage::{SceneDirectory, SceneHandle, StageWorld};

/// Places every object in its scene, in program order, and shows each
/// object's first look when its image can be read.
pub fn build_scenes(
    program: &Program,
    images: &ImageCache,
    image_dir: &Path,
) -> Result<SceneDirectory, BindError> {
    let mut stages = BTreeMap::<String, StageWorld>::new();
    for (id, object) in program.objects() {
        let Some(scene_name) = object.scene.as_deref() else {
            debug!(object = %object.name, "object_not_placed_in_scene");
            continue;
        };
        stages
            .entry(scene_name.to_string())
            .or_default()
            .add_sprite(id, object.name.as_str(), object.background);
    }

    let mut scenes = SceneDirectory::new();
    for (name, stage) in stages {
        scenes.insert(SceneHandle::new(&name, stage));
    }

    for (id, object) in program.objects() {
        let (Some(scene_name), Some(first_look)) = (object.scene.as_deref(), object.looks.first())
        else {
            continue;
        };
        validate_look_file_name(&first_look.file_name).map_err(|source| {
            BindError::InvalidLookFile {
                object: object.name.clone(),
                look: first_look.name.clone(),
                source,
            }
        })?;
        if let Some(scene) = scenes.get(scene_name) {
            let path = image_dir.join(&first_look.file_name);
            present_look(scene, id, images, first_look, &path);
        }
    }

    info!(
        program = program.name(),
        scene_count = scenes.len(),
        "scenes_built"
    );
    Ok(scenes)
}

#[cfg(test)]
mod tests {
    use image::{Rgba, RgbaImage};
    use tempfile::TempDir;

    use super::*;
    use crate::program::{Look, ObjectDef};
    use crate::stage::{layers_are_contiguous, BACKGROUND_LAYER};

    fn object(name: &str, scene: Option<&str>, background: bool, looks: Vec<Look>) -> ObjectDef {
        ObjectDef {
            name: name.to_string(),
            background,
            scene: scene.map(ToString::to_string),
            looks,
        }
    }

    #[test]
    fn objects_land_in_their_scenes_in_program_order() {
        let temp = TempDir::new().expect("temp");
        let mut program = Program::new("demo");
        let background = program.add_object(object("Background", Some("Scene 1"), true, Vec::new()));
        let cat = program.add_object(object("Cat", Some("Scene 1"), false, Vec::new()));
        let dog = program.add_object(object("Dog", Some("Scene 1"), false, Vec::new()));
        let bird = program.add_object(object("Bird", Some("Scene 2"), false, Vec::new()));
        program.add_object(object("Nowhere", None, false, Vec::new()));

        let scenes = build_scenes(&program, &ImageCache::new(), temp.path()).expect("scenes");
        assert_eq!(scenes.len(), 2);

        let first = scenes.get("Scene 1").expect("scene 1");
        first.with_graph(|graph| {
            assert_eq!(graph.layer(background), Some(BACKGROUND_LAYER));
            assert_eq!(graph.layer(cat), Some(0.0));
            assert_eq!(graph.layer(dog), Some(1.0));
            assert!(!graph.has_render_node(bird));
            assert!(layers_are_contiguous(&*graph));
        });
        let second = scenes.get("Scene 2").expect("scene 2");
        assert_eq!(second.with_graph(|graph| graph.layer(bird)), Some(0.0));
    }

    #[test]
    fn first_readable_look_is_shown() {
        let temp = TempDir::new().expect("temp");
        RgbaImage::from_pixel(1, 1, Rgba([9, 9, 9, 255]))
            .save(temp.path().join("idle.png"))
            .expect("save png");
        let mut program = Program::new("demo");
        let cat = program.add_object(object(
            "Cat",
            Some("Scene 1"),
            false,
            vec![Look::new("Idle", "idle.png"), Look::new("Walk", "walk.png")],
        ));
        let dog = program.add_object(object(
            "Dog",
            Some("Scene 1"),
            false,
            vec![Look::new("Missing", "missing.png")],
        ));
        let images = ImageCache::new();

        let scenes = build_scenes(&program, &images, temp.path()).expect("scenes");
        let scene = scenes.get("Scene 1").expect("scene");
        scene.with_graph(|graph| {
            assert_eq!(graph.current_look(cat), Some(Look::new("Idle", "idle.png")));
            assert!(graph.displayed_image(cat).is_some());
            assert_eq!(graph.current_look(dog), None);
        });
        assert_eq!(images.len(), 1);
    }

    #[test]
    fn invalid_first_look_file_is_rejected() {
        let temp = TempDir::new().expect("temp");
        let mut program = Program::new("demo");
        program.add_object(object(
            "Cat",
            Some("Scene 1"),
            false,
            vec![Look::new("Sneaky", "../../etc/passwd")],
        ));
        assert!(matches!(
            build_scenes(&program, &ImageCache::new(), temp.path()),
            Err(BindError::InvalidLookFile { .. })
        ));
    }
}

use super::*;
use serde_json::json;

fn scene(blur: bool) -> SceneSnapshot {
    serde_json::from_value(json!({
        "settings": { "motion_blur": blur, "motion_segments": 2, "frame_current": 1 },
        "camera": "Cam",
        "world": { "atmosphere": { "shader": "fog" } },
        "objects": [
            { "name": "Cam", "data": { "type": "camera" } },
            { "name": "Cam2", "data": { "type": "camera" } },
            {
                "name": "Cube",
                "transform": { "keys": [
                    { "frame": 1.0, "location": [0, 0, 0] },
                    { "frame": 2.0, "location": [4, 0, 0] }
                ] },
                "data": {
                    "type": "mesh",
                    "points": [[0,0,0],[1,0,0],[1,1,0],[0,1,0],[2,0,0]],
                    "faces": [[0,1,2,3],[1,4,2]],
                    "face_materials": [1, 0],
                    "prim_vars": [
                        { "name": "wear", "data_source": "vertex_group", "data_name": "Wear" }
                    ]
                },
                "material_slots": ["Red", "Blue"],
                "particle_systems": [{
                    "name": "Sparks",
                    "settings": { "particle_type": { "type": "sphere" }, "material_id": 2 },
                    "keys": [
                        { "frame": 1.0, "particles": [ { "location": [0,0,0] }, { "location": [1,0,0] } ] },
                        { "frame": 2.0, "particles": [ { "location": [0,1,0] }, { "location": [1,1,0] } ] }
                    ]
                }]
            },
            { "name": "Key", "data": { "type": "lamp", "kind": "point" },
              "transform": { "keys": [
                  { "frame": 1.0, "location": [0, 0, 5] },
                  { "frame": 2.0, "location": [0, 0, 9] }
              ] } },
            { "name": "Ball", "data": { "type": "empty" },
              "geometry_source": { "kind": "primitive",
                                   "primitive": { "shape": "sphere", "radius": 1, "zmin": -1, "zmax": 1 } } },
            { "name": "Crowd", "data": { "type": "empty" },
              "geometry_source": { "kind": "delayed_load_archive", "path": "/lib/crowd.rib" } }
        ],
        "materials": {
            "Red": { "surface": { "shader": "plastic" } },
            "Blue": { "color": [0, 0, 1] }
        }
    }))
    .unwrap()
}

fn names(c: &Collection) -> Vec<&str> {
    c.renderables.iter().map(|r| r.name.as_str()).collect()
}

#[test]
fn full_scene_order_and_active_camera_only() {
    let scene = scene(false);
    let resolver = PathResolver::default();
    let mut cache = ShaderTypeCache::new();
    let mut w = SceneWalker::new(&scene, &resolver, &mut cache);
    let c = w
        .collect(&Selection::All, &FrameSamples::from_scene(&scene, Frame(1), true))
        .unwrap();
    assert_eq!(
        names(&c),
        ["world", "Cam", "Cube", "Cube:Sparks", "Key", "Ball"]
    );
    // Crowd has automatic bounds but no mesh.
    assert!(c.issues.iter().any(|i| i.entity.as_deref() == Some("Crowd")));
    // Missing vertex group is local to the variable.
    assert!(
        c.issues
            .iter()
            .any(|i| matches!(&i.error, RibError::MissingData { channel, .. } if channel == "Wear"))
    );
}

#[test]
fn collection_is_deterministic() {
    let scene = scene(true);
    let resolver = PathResolver::default();
    let mut cache = ShaderTypeCache::new();
    let samples = FrameSamples::from_scene(&scene, Frame(1), true);
    let a = SceneWalker::new(&scene, &resolver, &mut cache)
        .collect(&Selection::All, &samples)
        .unwrap();
    let b = SceneWalker::new(&scene, &resolver, &mut cache)
        .collect(&Selection::All, &samples)
        .unwrap();
    assert_eq!(a.renderables, b.renderables);
}

#[test]
fn mesh_faces_split_by_slot_in_slot_order() {
    let scene = scene(false);
    let resolver = PathResolver::default();
    let mut cache = ShaderTypeCache::new();
    let c = SceneWalker::new(&scene, &resolver, &mut cache)
        .collect(
            &Selection::Objects(vec!["Cube".to_owned()]),
            &FrameSamples::from_scene(&scene, Frame(1), true),
        )
        .unwrap();
    let cube = &c.renderables[0];
    let RenderableKind::Mesh(mesh) = &cube.kind else {
        panic!("expected mesh");
    };
    assert_eq!(mesh.parts.len(), 2);
    assert_eq!(mesh.parts[0].nverts, vec![3]);
    assert_eq!(mesh.parts[0].corners, vec![4, 5, 6]);
    assert_eq!(mesh.parts[0].material, Some(0));
    assert_eq!(mesh.parts[1].verts, vec![0, 1, 2, 3]);
    assert_eq!(cube.materials[mesh.parts[1].material.unwrap()].name, "Blue");
    // Particle system uses slot 2 (Blue).
    assert_eq!(c.renderables[1].materials[0].name, "Blue");
}

#[test]
fn motion_blur_samples_transforms_but_not_lights() {
    let scene = scene(true);
    let resolver = PathResolver::default();
    let mut cache = ShaderTypeCache::new();
    let c = SceneWalker::new(&scene, &resolver, &mut cache)
        .collect(&Selection::All, &FrameSamples::from_scene(&scene, Frame(1), true))
        .unwrap();
    let by_name = |n: &str| c.renderables.iter().find(|r| r.name == n).unwrap();
    let cube = by_name("Cube");
    assert_eq!(cube.transform.len(), 2);
    assert_eq!(cube.transform[0].time, 1.0);
    assert_eq!(cube.transform[1].time, 2.0);
    assert_eq!(by_name("Key").transform.len(), 1);
    // Static primitive collapses to one sample.
    assert_eq!(by_name("Ball").transform.len(), 1);
    let RenderableKind::Particles(p) = &by_name("Cube:Sparks").kind else {
        panic!("expected particles");
    };
    assert_eq!(p.positions.len(), 2);
    assert_eq!(
        p.style,
        ParticleStyle::Points {
            point_type: Some("sphere"),
            constant_width: Some(0.01),
        }
    );
}

#[test]
fn per_object_override_replans_samples() {
    let mut scene = scene(true);
    scene.objects[2].motion_segments_override = Some(3);
    let resolver = PathResolver::default();
    let mut cache = ShaderTypeCache::new();
    let c = SceneWalker::new(&scene, &resolver, &mut cache)
        .collect(
            &Selection::Objects(vec!["Cube".to_owned()]),
            &FrameSamples::from_scene(&scene, Frame(1), true),
        )
        .unwrap();
    assert_eq!(c.renderables[0].transform.len(), 3);
}

#[test]
fn archive_selection_excludes_world_and_cameras() {
    let scene = scene(false);
    let resolver = PathResolver::default();
    let mut cache = ShaderTypeCache::new();
    let c = SceneWalker::new(&scene, &resolver, &mut cache)
        .collect(
            &Selection::Objects(vec!["Ball".to_owned(), "Cam".to_owned(), "Ghost".to_owned()]),
            &FrameSamples::from_scene(&scene, Frame(1), true),
        )
        .unwrap();
    assert_eq!(names(&c), ["Ball"]);
    assert_eq!(c.warnings.len(), 1);
    assert!(c.issues.iter().any(|i| i.entity.as_deref() == Some("Ghost")));
}

#[test]
fn particle_count_change_across_samples_is_fatal() {
    let mut scene = scene(true);
    scene.objects[2].particle_systems[0].keys[1].particles.push(
        serde_json::from_value(json!({ "location": [2, 2, 2] })).unwrap(),
    );
    let resolver = PathResolver::default();
    let mut cache = ShaderTypeCache::new();
    let err = SceneWalker::new(&scene, &resolver, &mut cache)
        .collect(&Selection::All, &FrameSamples::from_scene(&scene, Frame(1), true))
        .unwrap_err();
    assert!(matches!(err, RibError::MotionTopology { expected: 2, found: 3, .. }));
}

#[test]
fn manual_bounds_and_archive_paths_for_procedurals() {
    let mut scene = scene(false);
    scene.objects[5].geometry_source = GeometrySource::DelayedLoadArchive {
        path: "/lib/crowd.rib".to_owned(),
        anim: Default::default(),
        bounds: ProceduralBounds::Manual {
            min: [-1.0, -2.0, -3.0],
            max: [1.0, 2.0, 3.0],
        },
    };
    let resolver = PathResolver::default();
    let mut cache = ShaderTypeCache::new();
    let c = SceneWalker::new(&scene, &resolver, &mut cache)
        .collect(
            &Selection::Objects(vec!["Crowd".to_owned()]),
            &FrameSamples::from_scene(&scene, Frame(1), true),
        )
        .unwrap();
    assert_eq!(
        c.renderables[0].kind,
        RenderableKind::Procedural {
            kind: ProceduralKind::DelayedReadArchive {
                path: "/lib/crowd.rib".into(),
            },
            bounds: [-1.0, 1.0, -2.0, 2.0, -3.0, 3.0],
        }
    );
}

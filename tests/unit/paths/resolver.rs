use super::*;
use crate::scene::model::{AnimTransform, ObjectData};

fn texture(path: &str, anim: SequenceAnim) -> TextureDef {
    serde_json::from_value(serde_json::json!({
        "file_path": path,
        "anim": anim,
    }))
    .unwrap()
}

fn seq(blender_start: i64, sequence_in: i64, sequence_out: i64) -> SequenceAnim {
    SequenceAnim {
        animated_sequence: true,
        blender_start,
        sequence_in,
        sequence_out,
    }
}

fn empty_object(name: &str) -> ObjectDef {
    ObjectDef {
        name: name.to_owned(),
        transform: AnimTransform::default(),
        data: ObjectData::Empty,
        material_slots: Vec::new(),
        particle_systems: Vec::new(),
        vertex_groups: Vec::new(),
        geometry_source: GeometrySource::SceneData,
        export_archive: false,
        visibility: Default::default(),
        shading: Default::default(),
        motion_segments_override: None,
        export_coordsys: false,
    }
}

#[test]
fn sequence_frame_clamps_never_wraps() {
    let a = seq(1, 1, 10);
    assert_eq!(sequence_frame(&a, Frame(5)), 5);
    assert_eq!(sequence_frame(&a, Frame(-3)), 1);
    assert_eq!(sequence_frame(&a, Frame(42)), 10);
}

#[test]
fn frame_substitution_rules() {
    assert_eq!(substitute_frame("tex.####.png", 7), "tex.0007.png");
    assert_eq!(substitute_frame("wood_001.tif", 12), "wood_012.tif");
    assert_eq!(substitute_frame("v2_shot_0100.exr", 101), "v2_shot_0101.exr");
    assert_eq!(substitute_frame("plain.png", 3), "plain.0003.png");
    assert_eq!(substitute_frame("noext", 3), "noext.0003");
}

#[test]
fn static_texture_ignores_frame() {
    let r = PathResolver::default();
    let t = texture("/tex/wood.png", SequenceAnim::default());
    let a = r.resolve_source_path("Wood", &t, Frame(1)).unwrap();
    let b = r.resolve_source_path("Wood", &t, Frame(99)).unwrap();
    assert_eq!(a, b);
    assert_eq!(a, PathBuf::from("/tex/wood.png"));
}

#[test]
fn animated_texture_uses_clamped_frame() {
    let r = PathResolver::default();
    let t = texture("/tex/fire.####.png", seq(1, 1, 3));
    assert_eq!(
        r.resolve_source_path("Fire", &t, Frame(2)).unwrap(),
        PathBuf::from("/tex/fire.0002.png")
    );
    assert_eq!(
        r.resolve_source_path("Fire", &t, Frame(8)).unwrap(),
        PathBuf::from("/tex/fire.0003.png")
    );
}

#[test]
fn project_relative_paths_join_root() {
    let r = PathResolver::new(PathConfig {
        project_root: Some(PathBuf::from("/proj")),
        ..PathConfig::default()
    });
    let t = texture("//maps/a.png", SequenceAnim::default());
    assert_eq!(
        r.resolve_source_path("A", &t, Frame(1)).unwrap(),
        PathBuf::from("/proj/maps/a.png")
    );
}

#[test]
fn missing_source_path_is_path_resolution_error() {
    let r = PathResolver::default();
    let t: TextureDef = serde_json::from_str("{}").unwrap();
    let err = r.resolve_source_path("Ghost", &t, Frame(1)).unwrap_err();
    assert!(matches!(err, RibError::PathResolution { ref asset, .. } if asset == "Ghost"));
}

#[test]
fn optimized_path_without_cache_dir_sits_next_to_source() {
    let r = PathResolver::default();
    let t = texture("/tex/wood.png", SequenceAnim::default());
    assert_eq!(
        r.resolve_optimized_path("Wood", &t, Frame(1), &[]).unwrap(),
        PathBuf::from("/tex/wood.tdl")
    );
}

#[test]
fn optimized_path_in_cache_dir_is_fingerprinted_and_pure() {
    let r = PathResolver::new(PathConfig {
        texture_dir: Some(PathBuf::from("/cache")),
        optimized_ext: "tex".to_owned(),
        ..PathConfig::default()
    });
    let t = texture("/tex/fire.####.png", seq(1, 1, 3));
    let a1 = r.resolve_optimized_path("Fire", &t, Frame(1), &[]).unwrap();
    let a2 = r.resolve_optimized_path("Fire", &t, Frame(1), &[]).unwrap();
    let b = r.resolve_optimized_path("Fire", &t, Frame(2), &[]).unwrap();
    let flagged = r
        .resolve_optimized_path("Fire", &t, Frame(1), &["-blur".to_owned(), "2".to_owned()])
        .unwrap();
    assert_eq!(a1, a2);
    assert_ne!(a1, b);
    assert_ne!(a1, flagged);
    assert_eq!(a1.parent(), Some(Path::new("/cache")));
    let name = a1.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("fire.0001."));
    assert!(name.ends_with(".tex"));
}

#[test]
fn archive_paths() {
    let r = PathResolver::new(PathConfig {
        archive_dir: PathBuf::from("/arch"),
        ..PathConfig::default()
    });
    let mut obj = empty_object("Tree");
    assert!(r.resolve_archive_path(&obj, Frame(1)).is_err());

    obj.export_archive = true;
    assert_eq!(
        r.resolve_archive_path(&obj, Frame(3)).unwrap(),
        PathBuf::from("/arch/Tree.0003.rib")
    );

    obj.geometry_source = GeometrySource::Archive {
        path: "/lib/tree.0001.rib".to_owned(),
        anim: seq(1, 1, 2),
    };
    assert_eq!(
        r.resolve_archive_path(&obj, Frame(5)).unwrap(),
        PathBuf::from("/lib/tree.0002.rib")
    );
}

#[test]
fn output_path_for_sequence_frames() {
    assert_eq!(
        sequence_output_path(Path::new("/out/scene.rib"), Frame(3)),
        PathBuf::from("/out/scene.0003.rib")
    );
    assert_eq!(
        sequence_output_path(Path::new("scene"), Frame(12)),
        PathBuf::from("scene.0012")
    );
}

#[test]
fn shader_search_path_appends_default_marker() {
    let r = PathResolver::new(PathConfig {
        shader_paths: vec![PathBuf::from("/shaders"), PathBuf::from("/more/")],
        ..PathConfig::default()
    });
    assert_eq!(r.shader_search_path(), "/shaders:/more/:&");
    assert!(r.contains_shader_dir(Path::new("/more")));
    assert!(r.contains_shader_dir(Path::new("/shaders/./")));
    assert!(!r.contains_shader_dir(Path::new("/other")));
    assert_eq!(PathResolver::default().shader_search_path(), "&");
}

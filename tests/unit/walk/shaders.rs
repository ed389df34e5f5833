use super::*;
use serde_json::json;

fn scene() -> SceneSnapshot {
    serde_json::from_value(json!({
        "shaders": {
            "plastic": { "params": [
                { "name": "Ks", "type": "float", "default": 0.5 },
                { "name": "Kd", "type": "float", "default": 0.5 },
                { "name": "specularcolor", "type": "color", "default": [1, 1, 1] },
                { "name": "texturename", "type": "texture", "default": "" },
                { "name": "unset", "type": "string" }
            ] }
        },
        "textures": { "Wood": { "file_path": "/tex/wood.png" } }
    }))
    .unwrap()
}

fn shader_ref(v: serde_json::Value) -> ShaderRef {
    serde_json::from_value(v).unwrap()
}

#[test]
fn schema_order_and_types_are_applied() {
    let scene = scene();
    let mut cache = ShaderTypeCache::new();
    let r = shader_ref(json!({
        "shader": "plastic",
        "params": { "texturename": "Wood", "Kd": 0.8 }
    }));
    let b = bind_shader(&scene, &mut cache, ShaderKind::Surface, &r);
    assert!(b.warnings.is_empty());
    let names: Vec<_> = b.value.params.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, ["Ks", "Kd", "specularcolor", "texturename"]);
    assert_eq!(b.value.params[1].1, ParamValue::Float(0.8));
    assert_eq!(b.value.params[2].1, ParamValue::Color([1.0, 1.0, 1.0]));
    assert_eq!(b.value.params[3].1, ParamValue::Texture("Wood".to_owned()));
}

#[test]
fn typing_is_derived_once_per_shader() {
    let scene = scene();
    let mut cache = ShaderTypeCache::new();
    let r = shader_ref(json!({ "shader": "plastic" }));
    for _ in 0..3 {
        bind_shader(&scene, &mut cache, ShaderKind::Surface, &r);
    }
    assert_eq!(cache.derivations(), 1);
    assert_eq!(cache.len(), 1);
}

#[test]
fn undeclared_params_are_inferred_with_warning() {
    let scene = scene();
    let mut cache = ShaderTypeCache::new();
    let r = shader_ref(json!({
        "shader": "custom",
        "params": { "amount": 2, "tint": [0.1, 0.2, 0.3], "map": "/abs/path.tdl", "bad": {} }
    }));
    let b = bind_shader(&scene, &mut cache, ShaderKind::Displacement, &r);
    assert_eq!(b.value.params.len(), 3);
    assert_eq!(b.warnings.len(), 4);
    assert!(
        b.value
            .params
            .contains(&("map".to_owned(), ParamValue::String("/abs/path.tdl".to_owned())))
    );
}

#[test]
fn mistyped_value_is_dropped_with_warning() {
    let scene = scene();
    let mut cache = ShaderTypeCache::new();
    let r = shader_ref(json!({ "shader": "plastic", "params": { "Ks": "shiny" } }));
    let b = bind_shader(&scene, &mut cache, ShaderKind::Surface, &r);
    assert_eq!(b.warnings.len(), 1);
    assert!(b.value.params.iter().all(|(n, _)| n != "Ks"));
}

#[test]
fn default_light_shaders_follow_lamp_kind() {
    let scene = scene();
    let mut cache = ShaderTypeCache::new();
    let spot: LampDef = serde_json::from_value(json!({
        "kind": "spot", "energy": 2.0, "spot_size": 1.0, "spot_blend": 0.5
    }))
    .unwrap();
    let b = bind_light(&scene, &mut cache, &spot);
    assert_eq!(b.value.shader, "spotlight");
    assert_eq!(b.value.kind, ShaderKind::Light);
    let cone = b
        .value
        .params
        .iter()
        .find(|(n, _)| n == "conedeltaangle")
        .map(|(_, v)| v.clone());
    assert_eq!(cone, Some(ParamValue::Float(0.25)));

    let sun: LampDef = serde_json::from_value(json!({ "kind": "sun" })).unwrap();
    assert_eq!(bind_light(&scene, &mut cache, &sun).value.shader, "distantlight");
}

#[test]
fn material_binds_slots_in_fixed_order() {
    let scene = scene();
    let mut cache = ShaderTypeCache::new();
    let m: MaterialDef = serde_json::from_value(json!({
        "displacement": { "shader": "bumpy" },
        "surface": { "shader": "plastic" }
    }))
    .unwrap();
    let b = bind_material(&scene, &mut cache, "Red", &m);
    let kinds: Vec<_> = b.value.shaders.iter().map(|s| s.kind).collect();
    assert_eq!(kinds, [ShaderKind::Surface, ShaderKind::Displacement]);
    assert_eq!(b.value.name, "Red");
}

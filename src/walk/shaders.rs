use crate::{
    foundation::error::RibError,
    scene::model::{
        LampDef, LampKind, MaterialDef, ParamSchema, ParamType, SceneSnapshot, ShaderRef,
    },
    walk::renderable::{MaterialBinding, ParamValue, ShaderBinding, ShaderKind},
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Parameter typing derived once per shader name.
#[derive(Debug, Default)]
pub struct ShaderTypeCache {
    types: HashMap<String, Arc<[ParamSchema]>>,
    misses: u64,
}

impl ShaderTypeCache {
    /// Empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declared parameters of `shader`; unknown shaders have none.
    pub fn params(&mut self, scene: &SceneSnapshot, shader: &str) -> Arc<[ParamSchema]> {
        if let Some(p) = self.types.get(shader) {
            return Arc::clone(p);
        }
        self.misses += 1;
        let params: Arc<[ParamSchema]> = scene
            .shaders
            .get(shader)
            .map(|s| s.params.clone())
            .unwrap_or_default()
            .into();
        self.types.insert(shader.to_owned(), Arc::clone(&params));
        params
    }

    /// Number of shaders typed so far.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Return `true` when nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Number of schema derivations performed (cache misses).
    pub fn derivations(&self) -> u64 {
        self.misses
    }
}

/// Binder output: the binding plus non-fatal notes about dropped or inferred parameters.
#[derive(Debug)]
pub struct Bound<T> {
    /// Result.
    pub value: T,
    /// Non-fatal issues.
    pub warnings: Vec<RibError>,
}

/// Type `shader_ref`'s parameters against its schema.
///
/// Schema parameters come first in declaration order (override or default value); overrides the
/// schema does not declare follow in name order with their type inferred from the JSON shape.
pub fn bind_shader(
    scene: &SceneSnapshot,
    cache: &mut ShaderTypeCache,
    kind: ShaderKind,
    shader_ref: &ShaderRef,
) -> Bound<ShaderBinding> {
    let schema = cache.params(scene, &shader_ref.shader);
    let mut params = Vec::with_capacity(schema.len() + shader_ref.params.len());
    let mut warnings = Vec::new();

    for decl in schema.iter() {
        let raw = shader_ref.params.get(&decl.name).unwrap_or(&decl.default);
        if raw.is_null() {
            continue;
        }
        match typed_value(scene, decl.ty, raw) {
            Some(v) => params.push((decl.name.clone(), v)),
            None => warnings.push(RibError::validation(format!(
                "shader '{}' parameter '{}' has a value that is not a {:?}",
                shader_ref.shader, decl.name, decl.ty
            ))),
        }
    }

    for (name, raw) in &shader_ref.params {
        if schema.iter().any(|d| &d.name == name) {
            continue;
        }
        match inferred_value(scene, raw) {
            Some(v) => {
                warnings.push(RibError::validation(format!(
                    "shader '{}' does not declare '{name}', type inferred from value",
                    shader_ref.shader
                )));
                params.push((name.clone(), v));
            }
            None => warnings.push(RibError::validation(format!(
                "shader '{}' parameter '{name}' has an unsupported value",
                shader_ref.shader
            ))),
        }
    }

    Bound {
        value: ShaderBinding {
            kind,
            shader: shader_ref.shader.clone(),
            params,
        },
        warnings,
    }
}

/// Resolve a material's shader slots.
pub fn bind_material(
    scene: &SceneSnapshot,
    cache: &mut ShaderTypeCache,
    name: &str,
    material: &MaterialDef,
) -> Bound<MaterialBinding> {
    let mut warnings = Vec::new();
    let mut shaders = Vec::new();
    for (kind, slot) in [
        (ShaderKind::Surface, &material.surface),
        (ShaderKind::Displacement, &material.displacement),
        (ShaderKind::Interior, &material.interior),
        (ShaderKind::Atmosphere, &material.atmosphere),
    ] {
        if let Some(r) = slot {
            let b = bind_shader(scene, cache, kind, r);
            warnings.extend(b.warnings);
            shaders.push(b.value);
        }
    }
    Bound {
        value: MaterialBinding {
            name: name.to_owned(),
            color: material.color,
            opacity: material.opacity,
            shaders,
            displacement_bound: material.displacement_bound,
        },
        warnings,
    }
}

/// Light shader for a lamp: its custom shader, or a standard shader derived from its kind.
pub fn bind_light(
    scene: &SceneSnapshot,
    cache: &mut ShaderTypeCache,
    lamp: &LampDef,
) -> Bound<ShaderBinding> {
    if let Some(r) = &lamp.shader {
        return bind_shader(scene, cache, ShaderKind::Light, r);
    }

    let intensity = ParamValue::Float(f64::from(lamp.energy));
    let color = ParamValue::Color(lamp.color.map(f64::from));
    let origin = ParamValue::Point([0.0, 0.0, 0.0]);
    let down = ParamValue::Point([0.0, 0.0, -1.0]);
    let (shader, params) = match lamp.kind {
        LampKind::Point | LampKind::Area => (
            "pointlight",
            vec![
                ("intensity", intensity),
                ("lightcolor", color),
                ("from", origin),
            ],
        ),
        LampKind::Spot => {
            let half = f64::from(lamp.spot_size) * 0.5;
            (
                "spotlight",
                vec![
                    ("intensity", intensity),
                    ("lightcolor", color),
                    ("from", origin),
                    ("to", down),
                    ("coneangle", ParamValue::Float(half)),
                    (
                        "conedeltaangle",
                        ParamValue::Float(half * f64::from(lamp.spot_blend.clamp(0.0, 1.0))),
                    ),
                ],
            )
        }
        LampKind::Sun => (
            "distantlight",
            vec![
                ("intensity", intensity),
                ("lightcolor", color),
                ("from", origin),
                ("to", down),
            ],
        ),
        LampKind::Hemi => (
            "ambientlight",
            vec![("intensity", intensity), ("lightcolor", color)],
        ),
    };
    Bound {
        value: ShaderBinding {
            kind: ShaderKind::Light,
            shader: shader.to_owned(),
            params: params
                .into_iter()
                .map(|(n, v)| (n.to_owned(), v))
                .collect(),
        },
        warnings: Vec::new(),
    }
}

fn typed_value(scene: &SceneSnapshot, ty: ParamType, raw: &Value) -> Option<ParamValue> {
    match ty {
        ParamType::Float => number(raw).map(ParamValue::Float),
        ParamType::Color => triple(raw).map(ParamValue::Color),
        ParamType::Point => triple(raw).map(ParamValue::Point),
        ParamType::Vector => triple(raw).map(ParamValue::Vector),
        ParamType::Normal => triple(raw).map(ParamValue::Normal),
        ParamType::String => raw.as_str().map(|s| ParamValue::String(s.to_owned())),
        ParamType::Texture => raw.as_str().map(|s| texture_or_string(scene, s)),
    }
}

fn inferred_value(scene: &SceneSnapshot, raw: &Value) -> Option<ParamValue> {
    match raw {
        Value::Number(_) | Value::Bool(_) => number(raw).map(ParamValue::Float),
        Value::String(s) => Some(texture_or_string(scene, s)),
        Value::Array(a) if a.len() == 3 => triple(raw).map(ParamValue::Color),
        _ => None,
    }
}

fn texture_or_string(scene: &SceneSnapshot, s: &str) -> ParamValue {
    if scene.textures.contains_key(s) {
        ParamValue::Texture(s.to_owned())
    } else {
        ParamValue::String(s.to_owned())
    }
}

fn number(raw: &Value) -> Option<f64> {
    match raw {
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        v => v.as_f64(),
    }
}

fn triple(raw: &Value) -> Option<[f64; 3]> {
    match raw {
        Value::Array(a) if a.len() == 3 => {
            Some([a[0].as_f64()?, a[1].as_f64()?, a[2].as_f64()?])
        }
        v => v.as_f64().map(|x| [x, x, x]),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/walk/shaders.rs"]
mod tests;

use crate::{
    foundation::core::{Frame, FrameRange, Shutter},
    foundation::error::{RibError, RibResult},
    scene::model::{AnimTransform, ObjectData, ObjectDef, SceneSnapshot},
};
use anyhow::Context;
use std::collections::BTreeSet;
use std::path::Path;

impl SceneSnapshot {
    /// Parse a snapshot from JSON text.
    pub fn from_json_str(s: &str) -> RibResult<Self> {
        serde_json::from_str(s).map_err(|e| RibError::serde(format!("scene snapshot: {e}")))
    }

    /// Read and parse a snapshot JSON file.
    pub fn from_file(path: &Path) -> RibResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read scene snapshot '{}'", path.display()))?;
        Self::from_json_str(&text)
    }

    /// Look up an object by name.
    pub fn object(&self, name: &str) -> Option<&ObjectDef> {
        self.objects.iter().find(|o| o.name == name)
    }

    /// Active camera object, if it names a camera.
    pub fn camera_object(&self) -> Option<&ObjectDef> {
        let name = self.camera.as_deref()?;
        self.object(name)
            .filter(|o| matches!(o.data, ObjectData::Camera(_)))
    }

    /// Shutter interval and efficiency from render settings.
    pub fn shutter(&self) -> Shutter {
        let s = &self.settings;
        Shutter {
            open: s.shutter_open,
            close: s.shutter_close,
            efficiency_open: s.shutter_efficiency_open,
            efficiency_close: s.shutter_efficiency_close,
        }
    }

    /// Scene frame range.
    pub fn frame_range(&self) -> RibResult<FrameRange> {
        FrameRange::new(
            Frame(self.settings.frame_start),
            Frame(self.settings.frame_end),
        )
    }

    /// Validate structural invariants the exporter relies on.
    ///
    /// Missing materials, textures or primitive-variable sources are not validation failures; the
    /// walker reports them per entity.
    pub fn validate(&self) -> RibResult<()> {
        let s = &self.settings;
        self.frame_range()?;
        if !s.fps.is_finite() || s.fps <= 0.0 {
            return Err(RibError::validation("fps must be finite and > 0"));
        }
        if s.resolution[0] == 0 || s.resolution[1] == 0 {
            return Err(RibError::validation("resolution must be > 0"));
        }
        if s.resolution_percentage == 0 {
            return Err(RibError::validation("resolution_percentage must be > 0"));
        }
        if s.pixel_samples[0] == 0 || s.pixel_samples[1] == 0 {
            return Err(RibError::validation("pixel_samples must be > 0"));
        }
        if !s.shading_rate.is_finite() || s.shading_rate <= 0.0 {
            return Err(RibError::validation("shading_rate must be finite and > 0"));
        }
        self.shutter().validate()?;

        if let Some(cam) = &self.camera {
            match self.object(cam) {
                None => {
                    return Err(RibError::validation(format!(
                        "active camera '{cam}' does not exist"
                    )));
                }
                Some(o) if !matches!(o.data, ObjectData::Camera(_)) => {
                    return Err(RibError::validation(format!(
                        "active camera '{cam}' is not a camera object"
                    )));
                }
                Some(_) => {}
            }
        }

        let mut names = BTreeSet::new();
        for obj in &self.objects {
            if obj.name.trim().is_empty() {
                return Err(RibError::validation("object name must be non-empty"));
            }
            if !names.insert(obj.name.as_str()) {
                return Err(RibError::validation(format!(
                    "duplicate object name '{}'",
                    obj.name
                )));
            }
            validate_object(obj)?;
        }
        Ok(())
    }
}

fn validate_object(obj: &ObjectDef) -> RibResult<()> {
    if let AnimTransform::Keyed { keys } = &obj.transform
        && !keys.windows(2).all(|w| w[0].frame <= w[1].frame)
    {
        return Err(RibError::validation(format!(
            "object '{}' transform keys must be sorted by frame",
            obj.name
        )));
    }
    if obj.motion_segments_override == Some(0) {
        return Err(RibError::validation(format!(
            "object '{}' motion_segments_override must be > 0",
            obj.name
        )));
    }

    if let ObjectData::Mesh(mesh) = &obj.data {
        let n = mesh.points.len() as u32;
        let mut corners = 0usize;
        for face in &mesh.faces {
            if face.len() < 3 {
                return Err(RibError::validation(format!(
                    "object '{}' has a face with fewer than 3 vertices",
                    obj.name
                )));
            }
            if face.iter().any(|&i| i >= n) {
                return Err(RibError::validation(format!(
                    "object '{}' face index out of range",
                    obj.name
                )));
            }
            corners += face.len();
        }
        if !mesh.face_materials.is_empty() && mesh.face_materials.len() != mesh.faces.len() {
            return Err(RibError::validation(format!(
                "object '{}' face_materials must have one entry per face",
                obj.name
            )));
        }
        if !mesh.normals.is_empty() && mesh.normals.len() != mesh.points.len() {
            return Err(RibError::validation(format!(
                "object '{}' normals must have one entry per point",
                obj.name
            )));
        }
        for uv in &mesh.uv_layers {
            if uv.uvs.len() != corners {
                return Err(RibError::validation(format!(
                    "object '{}' uv layer '{}' must have one entry per face corner",
                    obj.name, uv.name
                )));
            }
        }
        for col in &mesh.vertex_colors {
            if col.colors.len() != corners {
                return Err(RibError::validation(format!(
                    "object '{}' color layer '{}' must have one entry per face corner",
                    obj.name, col.name
                )));
            }
        }
        if !mesh.deform_keys.windows(2).all(|w| w[0].frame <= w[1].frame) {
            return Err(RibError::validation(format!(
                "object '{}' deform keys must be sorted by frame",
                obj.name
            )));
        }
        for group in &obj.vertex_groups {
            if group.weights.len() != mesh.points.len() {
                return Err(RibError::validation(format!(
                    "object '{}' vertex group '{}' must have one weight per point",
                    obj.name, group.name
                )));
            }
        }
    }

    for psys in &obj.particle_systems {
        if !psys.keys.windows(2).all(|w| w[0].frame <= w[1].frame) {
            return Err(RibError::validation(format!(
                "particle system '{}' on '{}' keys must be sorted by frame",
                psys.name, obj.name
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/scene/snapshot.rs"]
mod tests;

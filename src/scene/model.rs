//! Boundary data model for host scene snapshots.
//!
//! Everything here is plain serde data as supplied by the host application. Nothing in this
//! module is mutated during export; the walker derives typed [`crate::walk::Renderable`]s from it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Global render settings of the host scene.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Frame the host is currently displaying.
    pub frame_current: i64,
    /// First frame of the scene range.
    pub frame_start: i64,
    /// Last frame of the scene range (inclusive).
    pub frame_end: i64,
    /// Frames per second.
    pub fps: f64,
    /// Output resolution in pixels.
    pub resolution: [u32; 2],
    /// Resolution scale in percent.
    pub resolution_percentage: u32,
    /// Pixel samples in x and y.
    pub pixel_samples: [u32; 2],
    /// Pixel filter name (`gaussian`, `box`, `catmull-rom`, `sinc`, ...).
    pub pixel_filter: String,
    /// Pixel filter width in x and y.
    pub pixel_filter_width: [f32; 2],
    /// Global shading rate.
    pub shading_rate: f32,
    /// Hidden surface algorithm.
    pub hider: Hider,
    /// Enable depth of field.
    pub depth_of_field: bool,
    /// Lens f-stop used when depth of field is enabled.
    pub fstop: f32,
    /// Enable motion blur.
    pub motion_blur: bool,
    /// Number of motion samples per blurred entity.
    pub motion_segments: u32,
    /// Shutter open offset from the frame time (frames).
    pub shutter_open: f64,
    /// Shutter close offset from the frame time (frames).
    pub shutter_close: f64,
    /// Shutter opening efficiency.
    pub shutter_efficiency_open: f64,
    /// Shutter closing efficiency.
    pub shutter_efficiency_close: f64,
    /// Display driver name.
    pub display_driver: String,
    /// Display output image name.
    pub display_image: String,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            frame_current: 1,
            frame_start: 1,
            frame_end: 1,
            fps: 24.0,
            resolution: [640, 480],
            resolution_percentage: 100,
            pixel_samples: [2, 2],
            pixel_filter: "gaussian".to_owned(),
            pixel_filter_width: [2.0, 2.0],
            shading_rate: 1.0,
            hider: Hider::Hidden,
            depth_of_field: false,
            fstop: 4.0,
            motion_blur: false,
            motion_segments: 2,
            shutter_open: 0.0,
            shutter_close: 1.0,
            shutter_efficiency_open: 1.0,
            shutter_efficiency_close: 1.0,
            display_driver: "framebuffer".to_owned(),
            display_image: "render.tif".to_owned(),
        }
    }
}

/// Hidden surface algorithm.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Hider {
    /// REYES scanline hider.
    #[default]
    Hidden,
    /// Ray traced hider.
    Raytrace,
}

impl Hider {
    /// Hider name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hidden => "hidden",
            Self::Raytrace => "raytrace",
        }
    }
}

/// World-level settings exported once per full scene frame.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorldDef {
    /// Global atmosphere shader.
    #[serde(default)]
    pub atmosphere: Option<ShaderRef>,
}

/// Reference to a shader plus overridden parameter values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShaderRef {
    /// Shader name as known to the renderer.
    pub shader: String,
    /// Parameter overrides, typed through the shader's schema.
    #[serde(default)]
    pub params: BTreeMap<String, serde_json::Value>,
}

/// Parameter schema for one shader, as reported by shader introspection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShaderSchema {
    /// Parameters in declaration order.
    #[serde(default)]
    pub params: Vec<ParamSchema>,
}

/// One declared shader parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamSchema {
    /// Parameter name.
    pub name: String,
    /// Declared type.
    #[serde(rename = "type")]
    pub ty: ParamType,
    /// Default value used when the binding does not override it.
    #[serde(default)]
    pub default: serde_json::Value,
}

/// Shader parameter types understood by the exporter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamType {
    /// Scalar float.
    Float,
    /// RGB color.
    Color,
    /// Point in space.
    Point,
    /// Direction vector.
    Vector,
    /// Surface normal.
    Normal,
    /// Plain string.
    String,
    /// String naming a texture; resolved to an optimized texture path at export time.
    Texture,
}

/// Material with its shader bindings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialDef {
    /// Base color.
    #[serde(default = "default_color")]
    pub color: [f32; 3],
    /// Opacity.
    #[serde(default = "default_opacity")]
    pub opacity: [f32; 3],
    /// Surface shader.
    #[serde(default)]
    pub surface: Option<ShaderRef>,
    /// Displacement shader.
    #[serde(default)]
    pub displacement: Option<ShaderRef>,
    /// Interior volume shader.
    #[serde(default)]
    pub interior: Option<ShaderRef>,
    /// Atmosphere volume shader.
    #[serde(default)]
    pub atmosphere: Option<ShaderRef>,
    /// Displacement bound (object space sphere), only written with a displacement shader.
    #[serde(default)]
    pub displacement_bound: f32,
}

fn default_color() -> [f32; 3] {
    [0.8, 0.8, 0.8]
}

fn default_opacity() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

/// Animated-sequence mapping shared by textures and archives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceAnim {
    /// The asset is an image/archive sequence with one file per frame.
    pub animated_sequence: bool,
    /// Host frame that anchors the sequence.
    pub blender_start: i64,
    /// First frame available on disk.
    pub sequence_in: i64,
    /// Last frame available on disk.
    pub sequence_out: i64,
}

impl Default for SequenceAnim {
    fn default() -> Self {
        Self {
            animated_sequence: false,
            blender_start: 1,
            sequence_in: 1,
            sequence_out: 1,
        }
    }
}

/// Image texture and its optimization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextureDef {
    /// Source image path; `//` prefix means project-relative.
    #[serde(default)]
    pub file_path: Option<String>,
    /// Sequence mapping for animated textures.
    #[serde(default)]
    pub anim: SequenceAnim,
    /// Master switch for automatic regeneration.
    #[serde(default = "yes")]
    pub auto_generate: bool,
    /// Generate when the optimized file is missing.
    #[serde(default = "yes")]
    pub generate_if_nonexistent: bool,
    /// Generate when the optimized file is older than the source.
    #[serde(default = "yes")]
    pub generate_if_older: bool,
    /// Sampling and conversion settings forwarded to the optimizer when enabled.
    #[serde(default)]
    pub sampling: TextureSampling,
}

/// Texture sampling settings that map onto optimizer flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextureSampling {
    /// Wrap mode along s.
    pub wrap_s: WrapMode,
    /// Wrap mode along t.
    pub wrap_t: WrapMode,
    /// Downsampling filter name.
    pub filter: String,
    /// Extra blur.
    pub blur: f32,
    /// Flip along s.
    pub flip_s: bool,
    /// Flip along t.
    pub flip_t: bool,
    /// Output color depth.
    pub color_depth: ColorDepth,
    /// Output compression.
    pub compression: Compression,
}

impl Default for TextureSampling {
    fn default() -> Self {
        Self {
            wrap_s: WrapMode::Periodic,
            wrap_t: WrapMode::Periodic,
            filter: "gaussian".to_owned(),
            blur: 0.0,
            flip_s: false,
            flip_t: false,
            color_depth: ColorDepth::Byte,
            compression: Compression::None,
        }
    }
}

/// Texture wrap mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WrapMode {
    /// Outside values are black.
    Black,
    /// Repeat.
    Periodic,
    /// Clamp to edge.
    Clamp,
}

impl WrapMode {
    /// Optimizer flag value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Black => "black",
            Self::Periodic => "periodic",
            Self::Clamp => "clamp",
        }
    }
}

/// Optimized texture color depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorDepth {
    /// 8 bits per channel.
    Byte,
    /// 16 bits per channel.
    Short,
    /// 32-bit float.
    Float,
}

/// Optimized texture compression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Compression {
    /// Uncompressed.
    None,
    /// LZW.
    Lzw,
    /// Deflate.
    Zip,
}

/// Translation/rotation/scale transform; rotation is XYZ euler in radians.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformDef {
    /// Translation.
    pub location: [f32; 3],
    /// XYZ euler rotation in radians.
    pub rotation: [f32; 3],
    /// Scale.
    pub scale: [f32; 3],
}

impl Default for TransformDef {
    fn default() -> Self {
        Self {
            location: [0.0; 3],
            rotation: [0.0; 3],
            scale: [1.0; 3],
        }
    }
}

/// One transform keyframe.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TransformKey {
    /// Host frame (fractional for sub-frame keys).
    pub frame: f64,
    /// Transform at `frame`.
    #[serde(flatten)]
    pub transform: TransformDef,
}

/// Object transform, either constant or keyframed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnimTransform {
    /// Keyframes sorted by frame, sampled with linear/spherical interpolation.
    Keyed {
        /// Keys sorted by frame.
        keys: Vec<TransformKey>,
    },
    /// Constant transform.
    Static(TransformDef),
}

impl Default for AnimTransform {
    fn default() -> Self {
        Self::Static(TransformDef::default())
    }
}

/// Point positions at one keyed frame, used for deformation blur.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointKey {
    /// Host frame.
    pub frame: f64,
    /// Point positions; count must match the base mesh.
    pub points: Vec<[f32; 3]>,
}

/// Named per-corner UV layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UvLayerDef {
    /// Layer name.
    pub name: String,
    /// Active layer, exported as the default `st`.
    #[serde(default)]
    pub active: bool,
    /// One UV per face corner.
    pub uvs: Vec<[f32; 2]>,
}

/// Named per-corner vertex color layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColorLayerDef {
    /// Layer name.
    pub name: String,
    /// Active layer, exported as the default `Cs`.
    #[serde(default)]
    pub active: bool,
    /// One color per face corner.
    pub colors: Vec<[f32; 3]>,
}

/// Named per-vertex weight group (owned by the object, not the mesh).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VertexGroupDef {
    /// Group name.
    pub name: String,
    /// One weight per mesh point; unassigned points are zero.
    pub weights: Vec<f32>,
}

/// Where a mesh primitive variable takes its data from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeshDataSource {
    /// Vertex color layer (facevarying color).
    VertexColor,
    /// UV layer (facevarying float[2]).
    UvTexture,
    /// Vertex group (vertex float).
    VertexGroup,
}

/// User-declared mesh primitive variable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrimVarDef {
    /// Exported variable name.
    pub name: String,
    /// Data source kind.
    pub data_source: MeshDataSource,
    /// Name of the layer or group to read.
    pub data_name: String,
}

/// Polygon mesh data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeshDef {
    /// Point positions in object space.
    pub points: Vec<[f32; 3]>,
    /// Polygons as point index lists.
    pub faces: Vec<Vec<u32>>,
    /// Material slot index per face; empty means slot 0 everywhere.
    #[serde(default)]
    pub face_materials: Vec<u32>,
    /// Smooth per-point normals.
    #[serde(default)]
    pub normals: Vec<[f32; 3]>,
    /// UV layers.
    #[serde(default)]
    pub uv_layers: Vec<UvLayerDef>,
    /// Vertex color layers.
    #[serde(default)]
    pub vertex_colors: Vec<ColorLayerDef>,
    /// Deformation keys for deformation blur.
    #[serde(default)]
    pub deform_keys: Vec<PointKey>,
    /// Declared primitive variables.
    #[serde(default)]
    pub prim_vars: Vec<PrimVarDef>,
    /// Export the active UV layer as `st`.
    #[serde(default = "yes")]
    pub export_default_uv: bool,
    /// Export the active vertex color layer as `Cs`.
    #[serde(default = "yes")]
    pub export_default_vcol: bool,
    /// Export smooth normals as `N`.
    #[serde(default = "yes")]
    pub export_smooth_normals: bool,
}

/// Lamp type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LampKind {
    /// Omni light.
    Point,
    /// Spot light pointing down local -Z.
    Spot,
    /// Distant light pointing down local -Z.
    Sun,
    /// Ambient hemisphere.
    Hemi,
    /// Area light, approximated by a point light.
    Area,
}

/// Lamp data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LampDef {
    /// Lamp type.
    pub kind: LampKind,
    /// Light color.
    #[serde(default = "white")]
    pub color: [f32; 3],
    /// Intensity.
    #[serde(default = "one")]
    pub energy: f32,
    /// Full spot cone angle in radians.
    #[serde(default = "default_spot_size")]
    pub spot_size: f32,
    /// Spot edge softness in `[0, 1]`.
    #[serde(default = "default_spot_blend")]
    pub spot_blend: f32,
    /// Custom light shader; when absent a default shader is derived from `kind`.
    #[serde(default)]
    pub shader: Option<ShaderRef>,
    /// Emit photons from this light.
    #[serde(default)]
    pub emit_photons: bool,
}

/// Camera projection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraKind {
    /// Perspective projection.
    #[default]
    Perspective,
    /// Orthographic projection.
    Orthographic,
}

/// Camera data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraDef {
    /// Projection kind.
    pub kind: CameraKind,
    /// Focal length in millimetres.
    pub lens: f32,
    /// Sensor width in millimetres.
    pub sensor_width: f32,
    /// Orthographic view width.
    pub ortho_scale: f32,
    /// Near clip.
    pub clip_start: f32,
    /// Far clip.
    pub clip_end: f32,
    /// Focus distance for depth of field.
    pub focus_distance: f32,
}

impl Default for CameraDef {
    fn default() -> Self {
        Self {
            kind: CameraKind::Perspective,
            lens: 35.0,
            sensor_width: 32.0,
            ortho_scale: 7.0,
            clip_start: 0.1,
            clip_end: 100.0,
            focus_distance: 10.0,
        }
    }
}

/// Object payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ObjectData {
    /// Polygon mesh.
    Mesh(MeshDef),
    /// Lamp.
    Lamp(LampDef),
    /// Camera.
    Camera(CameraDef),
    /// Transform-only object (particle emitters, archive holders).
    Empty,
}

/// Built-in quadric and point primitives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum PrimitiveDef {
    /// `Sphere radius zmin zmax sweep`.
    Sphere {
        /// Radius.
        radius: f32,
        /// Lower z clip.
        zmin: f32,
        /// Upper z clip.
        zmax: f32,
        /// Sweep angle in degrees.
        #[serde(default = "full_sweep")]
        sweep: f32,
    },
    /// `Cylinder radius zmin zmax sweep`.
    Cylinder {
        /// Radius.
        radius: f32,
        /// Lower z.
        zmin: f32,
        /// Upper z.
        zmax: f32,
        /// Sweep angle in degrees.
        #[serde(default = "full_sweep")]
        sweep: f32,
    },
    /// `Cone height radius sweep`.
    Cone {
        /// Height.
        height: f32,
        /// Base radius.
        radius: f32,
        /// Sweep angle in degrees.
        #[serde(default = "full_sweep")]
        sweep: f32,
    },
    /// `Disk height radius sweep`.
    Disk {
        /// Height along z.
        height: f32,
        /// Radius.
        radius: f32,
        /// Sweep angle in degrees.
        #[serde(default = "full_sweep")]
        sweep: f32,
    },
    /// `Torus major minor phimin phimax sweep`.
    Torus {
        /// Major radius.
        major_radius: f32,
        /// Minor radius.
        minor_radius: f32,
        /// Start of the tube sweep in degrees.
        #[serde(default)]
        phimin: f32,
        /// End of the tube sweep in degrees.
        #[serde(default = "full_sweep")]
        phimax: f32,
        /// Sweep angle in degrees.
        #[serde(default = "full_sweep")]
        sweep: f32,
    },
    /// The owning mesh's points as a point cloud.
    Points {
        /// Constant point width.
        width: f32,
    },
}

/// Bounding box for procedurals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ProceduralBounds {
    /// Derive from the owning mesh's points.
    #[default]
    Auto,
    /// Explicit object-space bounds.
    Manual {
        /// Minimum corner.
        min: [f32; 3],
        /// Maximum corner.
        max: [f32; 3],
    },
}

/// Where an object's renderable geometry comes from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GeometrySource {
    /// The object's own host data.
    #[default]
    SceneData,
    /// A built-in primitive.
    Primitive {
        /// Primitive shape.
        primitive: PrimitiveDef,
    },
    /// Inline `ReadArchive` of a pre-exported archive.
    Archive {
        /// Archive path.
        path: String,
        /// Sequence mapping.
        #[serde(default)]
        anim: SequenceAnim,
    },
    /// `DelayedReadArchive` procedural.
    DelayedLoadArchive {
        /// Archive path.
        path: String,
        /// Sequence mapping.
        #[serde(default)]
        anim: SequenceAnim,
        /// Procedural bounds.
        #[serde(default)]
        bounds: ProceduralBounds,
    },
    /// `RunProgram` procedural.
    RunProgram {
        /// Program path.
        program: String,
        /// Argument string passed to the program.
        #[serde(default)]
        args: String,
        /// Procedural bounds.
        #[serde(default)]
        bounds: ProceduralBounds,
    },
    /// `DynamicLoad` procedural.
    DynamicLoadDso {
        /// Shared object path.
        dso: String,
        /// Initial data string.
        #[serde(default)]
        initial_data: String,
        /// Procedural bounds.
        #[serde(default)]
        bounds: ProceduralBounds,
    },
}

/// Ray hit mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HitMode {
    /// Use the primitive's color/opacity.
    Primitive,
    /// Run the surface shader.
    Shader,
    /// Use cached shading.
    Cache,
    /// Fully opaque.
    Opaque,
}

impl HitMode {
    /// Attribute value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Primitive => "primitive",
            Self::Shader => "shader",
            Self::Cache => "cache",
            Self::Opaque => "opaque",
        }
    }
}

/// Ray and camera visibility flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisibilityDef {
    /// Visible to camera rays.
    pub camera: bool,
    /// Visible to diffuse rays.
    pub trace_diffuse: bool,
    /// Diffuse ray hit mode.
    pub diffuse_hitmode: HitMode,
    /// Visible to specular rays.
    pub trace_specular: bool,
    /// Specular ray hit mode.
    pub specular_hitmode: HitMode,
    /// Visible to transmission rays.
    pub trace_transmission: bool,
    /// Transmission ray hit mode.
    pub transmission_hitmode: HitMode,
    /// Visible to photons.
    pub photons: bool,
    /// Casts shadows in shadow maps.
    pub shadow_maps: bool,
    /// Holdout object.
    pub matte: bool,
    /// Trace displaced geometry.
    pub trace_displacements: bool,
    /// Trace motion-blurred geometry.
    pub trace_samplemotion: bool,
}

impl Default for VisibilityDef {
    fn default() -> Self {
        Self {
            camera: true,
            trace_diffuse: false,
            diffuse_hitmode: HitMode::Primitive,
            trace_specular: false,
            specular_hitmode: HitMode::Shader,
            trace_transmission: false,
            transmission_hitmode: HitMode::Shader,
            photons: false,
            shadow_maps: true,
            matte: false,
            trace_displacements: false,
            trace_samplemotion: false,
        }
    }
}

/// Shading interpolation mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShadingInterpolation {
    /// Flat shading per micropolygon.
    Constant,
    /// Gouraud shading.
    #[default]
    Smooth,
}

impl ShadingInterpolation {
    /// Keyword used by `ShadingInterpolation`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Constant => "constant",
            Self::Smooth => "smooth",
        }
    }
}

/// Per-object shading overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadingDef {
    /// Shading rate override.
    pub shading_rate: Option<f32>,
    /// Shading interpolation.
    pub interpolation: ShadingInterpolation,
    /// Geometric approximation motion factor.
    pub geometric_approx_motion: f32,
    /// Geometric approximation focus factor; negative disables.
    pub geometric_approx_focus: f32,
}

impl Default for ShadingDef {
    fn default() -> Self {
        Self {
            shading_rate: None,
            interpolation: ShadingInterpolation::Smooth,
            geometric_approx_motion: 1.0,
            geometric_approx_focus: -1.0,
        }
    }
}

/// Particle render type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ParticleType {
    /// Screen-facing points.
    Points,
    /// Spheres.
    Sphere,
    /// Disks.
    Disk,
    /// Instances of another mesh object.
    Object {
        /// Instanced object name.
        instance_object: String,
    },
}

/// Particle attribute usable as a primitive variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticleDataSource {
    /// Particle size.
    Size,
    /// Velocity vector.
    Velocity,
    /// Age in frames.
    Age,
    /// Lifetime in frames.
    Lifetime,
}

/// User-declared particle primitive variable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticlePrimVarDef {
    /// Exported variable name.
    pub name: String,
    /// Data source.
    pub data_source: ParticleDataSource,
}

/// Particle render settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticleSettingsDef {
    /// Render type.
    #[serde(default = "default_particle_type")]
    pub particle_type: ParticleType,
    /// 1-based material slot of the emitter object.
    #[serde(default = "default_material_id")]
    pub material_id: u32,
    /// Use `width` for all particles instead of per-particle size.
    #[serde(default = "yes")]
    pub constant_width: bool,
    /// Constant width.
    #[serde(default = "default_particle_width")]
    pub width: f32,
    /// Declared primitive variables.
    #[serde(default)]
    pub prim_vars: Vec<ParticlePrimVarDef>,
}

/// One particle's state at a keyed frame.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ParticleDef {
    /// World-space location.
    pub location: [f32; 3],
    /// Size.
    #[serde(default = "one")]
    pub size: f32,
    /// Velocity, when the host provides it.
    #[serde(default)]
    pub velocity: Option<[f32; 3]>,
    /// Age in frames, when the host provides it.
    #[serde(default)]
    pub age: Option<f32>,
    /// Lifetime in frames, when the host provides it.
    #[serde(default)]
    pub lifetime: Option<f32>,
}

/// Particle states at one keyed frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticleKey {
    /// Host frame.
    pub frame: f64,
    /// Alive particles.
    pub particles: Vec<ParticleDef>,
}

/// Particle system attached to an object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticleSystemDef {
    /// System name, unique within its object.
    pub name: String,
    /// Render settings.
    pub settings: ParticleSettingsDef,
    /// Keys sorted by frame.
    pub keys: Vec<ParticleKey>,
}

/// One host object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectDef {
    /// Unique object name.
    pub name: String,
    /// World transform.
    #[serde(default)]
    pub transform: AnimTransform,
    /// Object payload.
    pub data: ObjectData,
    /// Material names by slot.
    #[serde(default)]
    pub material_slots: Vec<String>,
    /// Particle systems in declared order.
    #[serde(default)]
    pub particle_systems: Vec<ParticleSystemDef>,
    /// Vertex groups.
    #[serde(default)]
    pub vertex_groups: Vec<VertexGroupDef>,
    /// Geometry source override.
    #[serde(default)]
    pub geometry_source: GeometrySource,
    /// Write this object's geometry to its own archive and reference it.
    #[serde(default)]
    pub export_archive: bool,
    /// Visibility flags.
    #[serde(default)]
    pub visibility: VisibilityDef,
    /// Shading overrides.
    #[serde(default)]
    pub shading: ShadingDef,
    /// Per-object motion sample count.
    #[serde(default)]
    pub motion_segments_override: Option<u32>,
    /// Declare a coordinate system named after the object.
    #[serde(default)]
    pub export_coordsys: bool,
}

/// Immutable view of the host scene at export time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneSnapshot {
    /// Global render settings.
    #[serde(default)]
    pub settings: RenderSettings,
    /// Active camera object name.
    #[serde(default)]
    pub camera: Option<String>,
    /// World settings.
    #[serde(default)]
    pub world: Option<WorldDef>,
    /// Objects in scene-list order.
    #[serde(default)]
    pub objects: Vec<ObjectDef>,
    /// Materials by name.
    #[serde(default)]
    pub materials: BTreeMap<String, MaterialDef>,
    /// Textures by name.
    #[serde(default)]
    pub textures: BTreeMap<String, TextureDef>,
    /// Shader parameter schemas by shader name.
    #[serde(default)]
    pub shaders: BTreeMap<String, ShaderSchema>,
}

fn yes() -> bool {
    true
}

fn one() -> f32 {
    1.0
}

fn white() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

fn full_sweep() -> f32 {
    360.0
}

fn default_spot_size() -> f32 {
    std::f32::consts::FRAC_PI_4
}

fn default_spot_blend() -> f32 {
    0.15
}

fn default_particle_type() -> ParticleType {
    ParticleType::Points
}

fn default_material_id() -> u32 {
    1
}

fn default_particle_width() -> f32 {
    0.01
}

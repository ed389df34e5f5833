use crate::{
    foundation::core::Mat4,
    scene::model::{CameraDef, PrimitiveDef, ShadingDef, VisibilityDef},
    stream::params::Detail,
};
use std::path::PathBuf;

/// One time-tagged value of an animated quantity.
#[derive(Clone, Debug, PartialEq)]
pub struct MotionSample<T> {
    /// Absolute host time (frames).
    pub time: f64,
    /// Value at `time`.
    pub value: T,
}

/// Time-ordered motion samples; a single entry means no motion.
pub type Motion<T> = Vec<MotionSample<T>>;

/// Shader slot a binding occupies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShaderKind {
    /// `Surface`.
    Surface,
    /// `Displacement`.
    Displacement,
    /// `Interior`.
    Interior,
    /// `Atmosphere`.
    Atmosphere,
    /// `LightSource`.
    Light,
}

impl ShaderKind {
    /// Request keyword for this slot.
    pub fn request(self) -> &'static str {
        match self {
            Self::Surface => "Surface",
            Self::Displacement => "Displacement",
            Self::Interior => "Interior",
            Self::Atmosphere => "Atmosphere",
            Self::Light => "LightSource",
        }
    }
}

/// Typed shader parameter value.
#[derive(Clone, Debug, PartialEq)]
pub enum ParamValue {
    /// `float`.
    Float(f64),
    /// `color`.
    Color([f64; 3]),
    /// `point`.
    Point([f64; 3]),
    /// `vector`.
    Vector([f64; 3]),
    /// `normal`.
    Normal([f64; 3]),
    /// `string`.
    String(String),
    /// Texture name, resolved to an optimized file path when written.
    Texture(String),
}

/// Shader with its typed parameters in schema declaration order.
#[derive(Clone, Debug, PartialEq)]
pub struct ShaderBinding {
    /// Slot.
    pub kind: ShaderKind,
    /// Shader name.
    pub shader: String,
    /// Parameters in declaration order.
    pub params: Vec<(String, ParamValue)>,
}

/// Material resolved for one slot.
#[derive(Clone, Debug, PartialEq)]
pub struct MaterialBinding {
    /// Material name.
    pub name: String,
    /// Base color.
    pub color: [f32; 3],
    /// Opacity.
    pub opacity: [f32; 3],
    /// Bound shaders in surface/displacement/interior/atmosphere order.
    pub shaders: Vec<ShaderBinding>,
    /// Displacement bound, written only with a displacement shader.
    pub displacement_bound: f32,
}

/// Primitive variable data ready to be written.
#[derive(Clone, Debug, PartialEq)]
pub struct PrimVar {
    /// Variable name.
    pub name: String,
    /// Storage class.
    pub detail: Detail,
    /// Declared type (`float`, `color`, `float[2]`, `vector`, `normal`).
    pub ty: &'static str,
    /// Flattened values.
    pub values: Vec<f64>,
    /// Floats per element.
    pub arity: usize,
}

/// Faces drawn with one material slot.
#[derive(Clone, Debug, PartialEq)]
pub struct MeshPart {
    /// Index into [`Renderable::materials`], `None` for no material.
    pub material: Option<usize>,
    /// Vertex count per face.
    pub nverts: Vec<i64>,
    /// Point indices, face after face.
    pub verts: Vec<i64>,
    /// Face-corner indices into the full mesh's corner list, for facevarying data.
    pub corners: Vec<usize>,
}

/// Polygon mesh geometry.
#[derive(Clone, Debug, PartialEq)]
pub struct MeshGeometry {
    /// Point positions per motion sample; all samples share one point count.
    pub points: Motion<Vec<[f32; 3]>>,
    /// Face groups by material.
    pub parts: Vec<MeshPart>,
    /// Primitive variables over the full mesh.
    pub prim_vars: Vec<PrimVar>,
}

/// Light source.
#[derive(Clone, Debug, PartialEq)]
pub struct LightData {
    /// Light handle used by `Illuminate`.
    pub handle: String,
    /// Light shader.
    pub shader: ShaderBinding,
}

/// Particle render style.
#[derive(Clone, Debug, PartialEq)]
pub enum ParticleStyle {
    /// `Points`, optionally typed as `sphere` or `disk`.
    Points {
        /// Renderer point type (`None` for flat points).
        point_type: Option<&'static str>,
        /// Constant width, or `None` to use per-particle widths.
        constant_width: Option<f32>,
    },
    /// Instanced object geometry.
    Instance {
        /// Handle for `ObjectBegin` / `ObjectInstance`.
        handle: String,
        /// Instanced geometry (static).
        geometry: MeshGeometry,
    },
}

/// Particle system geometry in world space.
#[derive(Clone, Debug, PartialEq)]
pub struct ParticleGeometry {
    /// Positions per motion sample; all samples share one particle count.
    pub positions: Motion<Vec<[f32; 3]>>,
    /// Per-particle widths (first sample).
    pub widths: Vec<f32>,
    /// Render style.
    pub style: ParticleStyle,
    /// Primitive variables.
    pub prim_vars: Vec<PrimVar>,
}

/// Procedural request kind.
#[derive(Clone, Debug, PartialEq)]
pub enum ProceduralKind {
    /// `DelayedReadArchive [path]`.
    DelayedReadArchive {
        /// Archive path.
        path: PathBuf,
    },
    /// `RunProgram [program args]`.
    RunProgram {
        /// Program.
        program: String,
        /// Argument string.
        args: String,
    },
    /// `DynamicLoad [dso data]`.
    DynamicLoad {
        /// Shared object.
        dso: String,
        /// Initial data string.
        initial_data: String,
    },
}

/// Quadric surface request with its positional arguments.
#[derive(Clone, Debug, PartialEq)]
pub struct Quadric {
    /// Request name (`Sphere`, `Cylinder`, `Cone`, `Disk`, `Torus`).
    pub request: &'static str,
    /// Positional arguments in request order.
    pub args: Vec<f32>,
}

impl Quadric {
    /// Quadric for a surface primitive. Point primitives have no surface and give `None`.
    pub fn from_primitive(prim: &PrimitiveDef) -> Option<Self> {
        let (request, args) = match *prim {
            PrimitiveDef::Sphere {
                radius,
                zmin,
                zmax,
                sweep,
            } => ("Sphere", vec![radius, zmin, zmax, sweep]),
            PrimitiveDef::Cylinder {
                radius,
                zmin,
                zmax,
                sweep,
            } => ("Cylinder", vec![radius, zmin, zmax, sweep]),
            PrimitiveDef::Cone {
                height,
                radius,
                sweep,
            } => ("Cone", vec![height, radius, sweep]),
            PrimitiveDef::Disk {
                height,
                radius,
                sweep,
            } => ("Disk", vec![height, radius, sweep]),
            PrimitiveDef::Torus {
                major_radius,
                minor_radius,
                phimin,
                phimax,
                sweep,
            } => (
                "Torus",
                vec![major_radius, minor_radius, phimin, phimax, sweep],
            ),
            PrimitiveDef::Points { .. } => return None,
        };
        Some(Self { request, args })
    }
}

/// Exportable entity payload.
#[derive(Clone, Debug, PartialEq)]
pub enum RenderableKind {
    /// Polygon mesh.
    Mesh(MeshGeometry),
    /// Quadric surface.
    Quadric(Quadric),
    /// Point cloud from mesh points.
    PointCloud {
        /// Points per motion sample.
        points: Motion<Vec<[f32; 3]>>,
        /// Constant width.
        width: f32,
    },
    /// Light source.
    Light(LightData),
    /// Render camera.
    Camera(CameraDef),
    /// Particle system.
    Particles(ParticleGeometry),
    /// Inline `ReadArchive`.
    Archive {
        /// Archive path for the frame.
        path: PathBuf,
    },
    /// Deferred procedural.
    Procedural {
        /// Procedural request.
        kind: ProceduralKind,
        /// Bounds `[xmin xmax ymin ymax zmin zmax]`.
        bounds: [f32; 6],
    },
    /// World atmosphere.
    Atmosphere(ShaderBinding),
}

impl RenderableKind {
    /// Short kind label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Mesh(_) => "mesh",
            Self::Quadric(_) => "quadric",
            Self::PointCloud { .. } => "points",
            Self::Light(_) => "light",
            Self::Camera(_) => "camera",
            Self::Particles(_) => "particles",
            Self::Archive { .. } => "archive",
            Self::Procedural { .. } => "procedural",
            Self::Atmosphere(_) => "atmosphere",
        }
    }
}

/// One exportable scene entity.
#[derive(Clone, Debug, PartialEq)]
pub struct Renderable {
    /// Unique name (`object` or `object:particle_system`).
    pub name: String,
    /// Payload.
    pub kind: RenderableKind,
    /// Object-to-world transform samples.
    pub transform: Motion<Mat4>,
    /// Materials in slot order.
    pub materials: Vec<MaterialBinding>,
    /// Visibility flags.
    pub visibility: VisibilityDef,
    /// Shading overrides.
    pub shading: ShadingDef,
    /// Declare a coordinate system named after the entity.
    pub export_coordsys: bool,
    /// Archive this entity's geometry is written to and read back from, when set.
    pub archive_output: Option<PathBuf>,
}

/// Drop trailing samples when every sample equals the first, so static data is written once.
pub fn collapse_static<T: PartialEq>(mut samples: Motion<T>) -> Motion<T> {
    if samples.len() > 1 && samples.iter().all(|s| s.value == samples[0].value) {
        samples.truncate(1);
    }
    samples
}

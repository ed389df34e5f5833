//! Renderable-to-request translation for full scene frames and archives.

use crate::{
    export::output::write_atomic,
    export::textures::TextureCache,
    foundation::core::{Frame, Mat4, Vec3},
    foundation::error::RibResult,
    foundation::issue::ExportIssue,
    paths::resolver::{DEFAULT_SEARCH_MARKER, PathResolver, substitute_frame},
    scene::model::{CameraDef, CameraKind, SceneSnapshot, ShadingDef, VisibilityDef},
    stream::params::{Detail, ParamList, ParamValues, RibArg},
    stream::writer::{BlockKind, RibWriter},
    texture::optimizer::TextureOptimizer,
    walk::renderable::{
        LightData, MaterialBinding, MeshGeometry, MeshPart, Motion, MotionSample, ParamValue,
        ParticleGeometry, ParticleStyle, PrimVar, ProceduralKind, Renderable, RenderableKind,
        ShaderBinding, ShaderKind,
    },
    walk::walker::FrameSamples,
};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Version written at the top of full scene streams.
pub const RIB_VERSION: f64 = 3.04;

/// Issues and side outputs produced while writing one frame.
#[derive(Debug, Default)]
pub struct FrameReport {
    /// Degraded output (unoptimized texture fallbacks).
    pub warnings: Vec<ExportIssue>,
    /// Entity-local errors.
    pub errors: Vec<ExportIssue>,
    /// Per-object archive files written for this frame.
    pub archives: Vec<PathBuf>,
}

/// Writes collected renderables for one frame.
pub(crate) struct Emitter<'a> {
    scene: &'a SceneSnapshot,
    resolver: &'a PathResolver,
    optimizer: &'a TextureOptimizer<'a>,
    textures: &'a mut TextureCache,
    frame: Frame,
    report: &'a mut FrameReport,
}

impl<'a> Emitter<'a> {
    pub(crate) fn new(
        scene: &'a SceneSnapshot,
        optimizer: &'a TextureOptimizer<'a>,
        textures: &'a mut TextureCache,
        frame: Frame,
        report: &'a mut FrameReport,
    ) -> Self {
        Self {
            scene,
            resolver: optimizer.resolver(),
            optimizer,
            textures,
            frame,
            report,
        }
    }

    /// Full scene: header options, camera, then the world with atmosphere, lights and geometry.
    pub(crate) fn write_scene<W: Write>(
        &mut self,
        w: &mut RibWriter<W>,
        renderables: &[Renderable],
        samples: &FrameSamples,
    ) -> RibResult<()> {
        w.comment("RenderMan RIB")?;
        w.write_leaf("version", &[RibArg::Float(RIB_VERSION)], &ParamList::new())?;
        self.write_search_paths(w)?;

        w.open_block(BlockKind::Frame, &[RibArg::Int(self.frame.0)])?;
        let format = self.write_options(w, samples)?;
        for r in renderables {
            if let RenderableKind::Camera(cam) = &r.kind {
                self.write_camera(w, r, cam, format)?;
            }
        }

        w.open_block(BlockKind::World, &[])?;
        for r in renderables {
            if let RenderableKind::Atmosphere(shader) = &r.kind {
                self.write_shader(w, shader)?;
            }
        }
        self.write_lights_and_geometry(w, renderables, true)?;
        w.close_block(BlockKind::World)?;
        w.close_block(BlockKind::Frame)
    }

    /// Archive: the selected objects' blocks only, no frame or world scope.
    pub(crate) fn write_archive<W: Write>(
        &mut self,
        w: &mut RibWriter<W>,
        renderables: &[Renderable],
    ) -> RibResult<()> {
        w.comment(&format!("archive, frame {}", self.frame))?;
        self.write_lights_and_geometry(w, renderables, false)
    }

    fn write_lights_and_geometry<W: Write>(
        &mut self,
        w: &mut RibWriter<W>,
        renderables: &[Renderable],
        redirect_archives: bool,
    ) -> RibResult<()> {
        for r in renderables {
            if let RenderableKind::Light(light) = &r.kind {
                self.write_light(w, r, light)?;
            }
        }
        for r in renderables {
            match r.kind {
                RenderableKind::Light(_)
                | RenderableKind::Camera(_)
                | RenderableKind::Atmosphere(_) => {}
                _ => self.write_object(w, r, redirect_archives)?,
            }
        }
        Ok(())
    }

    fn write_search_paths<W: Write>(&self, w: &mut RibWriter<W>) -> RibResult<()> {
        let mut p = ParamList::new();
        p.string(None, "shader", self.resolver.shader_search_path());
        if let Some(dir) = &self.resolver.config().texture_dir {
            p.string(
                None,
                "texture",
                format!("{}:{DEFAULT_SEARCH_MARKER}", dir.display()),
            );
        }
        w.write_option("searchpath", &p)
    }

    /// Frame options; returns the output resolution.
    fn write_options<W: Write>(
        &self,
        w: &mut RibWriter<W>,
        samples: &FrameSamples,
    ) -> RibResult<[u64; 2]> {
        let st = &self.scene.settings;
        let none = ParamList::new();
        let pct = u64::from(st.resolution_percentage);
        let format = st.resolution.map(|r| (u64::from(r) * pct / 100).max(1));

        w.write_leaf(
            "Format",
            &[
                RibArg::Int(format[0] as i64),
                RibArg::Int(format[1] as i64),
                RibArg::Float(1.0),
            ],
            &none,
        )?;
        w.write_leaf(
            "PixelSamples",
            &[
                RibArg::Int(i64::from(st.pixel_samples[0])),
                RibArg::Int(i64::from(st.pixel_samples[1])),
            ],
            &none,
        )?;
        w.write_leaf(
            "PixelFilter",
            &[
                RibArg::str(&st.pixel_filter),
                RibArg::from(st.pixel_filter_width[0]),
                RibArg::from(st.pixel_filter_width[1]),
            ],
            &none,
        )?;
        w.write_leaf("ShadingRate", &[RibArg::from(st.shading_rate)], &none)?;
        w.write_leaf("Hider", &[RibArg::str(st.hider.as_str())], &none)?;

        let image = if st.display_image.contains('#') {
            substitute_frame(&st.display_image, self.frame.0)
        } else {
            st.display_image.clone()
        };
        w.write_leaf(
            "Display",
            &[
                RibArg::str(image),
                RibArg::str(&st.display_driver),
                RibArg::str("rgba"),
            ],
            &none,
        )?;

        if samples.motion {
            let sh = samples.shutter;
            w.write_leaf(
                "Shutter",
                &[RibArg::Float(sh.open), RibArg::Float(sh.close)],
                &none,
            )?;
            let mut eff = ParamList::new();
            eff.floats(None, "float", "efficiency", [sh.efficiency_open, sh.efficiency_close]);
            w.write_option("shutter", &eff)?;
        }
        Ok(format)
    }

    fn write_camera<W: Write>(
        &self,
        w: &mut RibWriter<W>,
        r: &Renderable,
        cam: &CameraDef,
        format: [u64; 2],
    ) -> RibResult<()> {
        let none = ParamList::new();
        let (xres, yres) = (format[0] as f64, format[1] as f64);
        match cam.kind {
            CameraKind::Perspective => {
                let mut p = ParamList::new();
                p.float(None, "fov", perspective_fov(cam, xres, yres));
                w.write_leaf("Projection", &[RibArg::str("perspective")], &p)?;
            }
            CameraKind::Orthographic => {
                w.write_leaf("Projection", &[RibArg::str("orthographic")], &none)?;
                let s = f64::from(cam.ortho_scale) / 2.0;
                let (sx, sy) = if xres >= yres {
                    (s, s * yres / xres)
                } else {
                    (s * xres / yres, s)
                };
                w.write_leaf(
                    "ScreenWindow",
                    &[
                        RibArg::Float(-sx),
                        RibArg::Float(sx),
                        RibArg::Float(-sy),
                        RibArg::Float(sy),
                    ],
                    &none,
                )?;
            }
        }
        w.write_leaf(
            "Clipping",
            &[RibArg::from(cam.clip_start), RibArg::from(cam.clip_end)],
            &none,
        )?;
        let st = &self.scene.settings;
        if st.depth_of_field {
            w.write_leaf(
                "DepthOfField",
                &[
                    RibArg::from(st.fstop),
                    RibArg::Float(f64::from(cam.lens) * 0.001),
                    RibArg::from(cam.focus_distance),
                ],
                &none,
            )?;
        }
        w.write_leaf(
            "Scale",
            &[RibArg::Float(1.0), RibArg::Float(1.0), RibArg::Float(-1.0)],
            &none,
        )?;
        self.write_transform(w, &r.transform, true)
    }

    fn write_light<W: Write>(
        &mut self,
        w: &mut RibWriter<W>,
        r: &Renderable,
        light: &LightData,
    ) -> RibResult<()> {
        w.open_block(BlockKind::Attribute, &[])?;
        write_identifier(w, &r.name)?;
        self.write_transform(w, &r.transform, false)?;
        let params = self.shader_params(&light.shader);
        w.write_leaf(
            "LightSource",
            &[RibArg::str(&light.shader.shader), RibArg::str(&light.handle)],
            &params,
        )?;
        w.close_block(BlockKind::Attribute)?;
        w.write_leaf(
            "Illuminate",
            &[RibArg::str(&light.handle), RibArg::Int(1)],
            &ParamList::new(),
        )
    }

    fn write_object<W: Write>(
        &mut self,
        w: &mut RibWriter<W>,
        r: &Renderable,
        redirect_archives: bool,
    ) -> RibResult<()> {
        w.open_block(BlockKind::Attribute, &[])?;
        write_identifier(w, &r.name)?;
        self.write_transform(w, &r.transform, false)?;
        if r.export_coordsys {
            w.write_leaf(
                "CoordinateSystem",
                &[RibArg::str(&r.name)],
                &ParamList::new(),
            )?;
        }
        write_visibility(w, &r.visibility)?;
        write_shading(w, &r.shading)?;

        match &r.archive_output {
            Some(path) if redirect_archives => {
                self.write_archive_file(path, r)?;
                w.write_leaf(
                    "ReadArchive",
                    &[RibArg::str(path.to_string_lossy())],
                    &ParamList::new(),
                )?;
            }
            _ => self.write_body(w, r)?,
        }
        w.close_block(BlockKind::Attribute)
    }

    fn write_archive_file(&mut self, path: &Path, r: &Renderable) -> RibResult<()> {
        write_atomic(path, |sink| {
            let mut aw = RibWriter::new(sink);
            aw.comment(&format!("{}, frame {}", r.name, self.frame))?;
            self.write_body(&mut aw, r)?;
            aw.finish()
        })?;
        tracing::debug!(entity = %r.name, path = %path.display(), "wrote object archive");
        self.report.archives.push(path.to_path_buf());
        Ok(())
    }

    /// Materials and geometry requests of an object.
    fn write_body<W: Write>(&mut self, w: &mut RibWriter<W>, r: &Renderable) -> RibResult<()> {
        let none = ParamList::new();
        if let RenderableKind::Mesh(mesh) = &r.kind {
            return self.write_mesh(w, r, mesh);
        }
        if let Some(m) = r.materials.first() {
            self.write_material(w, m)?;
        }

        match &r.kind {
            RenderableKind::Quadric(q) => {
                let args: Vec<RibArg> = q.args.iter().copied().map(RibArg::from).collect();
                w.write_leaf(q.request, &args, &none)
            }
            RenderableKind::PointCloud { points, width } => {
                let mut extra = ParamList::new();
                extra.float(Some(Detail::Constant), "constantwidth", *width);
                write_points(w, self.frame, points, &extra)
            }
            RenderableKind::Particles(p) => self.write_particles(w, r, p),
            RenderableKind::Archive { path } => w.write_leaf(
                "ReadArchive",
                &[RibArg::str(path.to_string_lossy())],
                &none,
            ),
            RenderableKind::Procedural { kind, bounds } => {
                let (name, data) = match kind {
                    ProceduralKind::DelayedReadArchive { path } => (
                        "DelayedReadArchive",
                        vec![path.to_string_lossy().into_owned()],
                    ),
                    ProceduralKind::RunProgram { program, args } => {
                        ("RunProgram", vec![program.clone(), args.clone()])
                    }
                    ProceduralKind::DynamicLoad { dso, initial_data } => {
                        ("DynamicLoad", vec![dso.clone(), initial_data.clone()])
                    }
                };
                w.write_leaf(
                    "Procedural",
                    &[
                        RibArg::str(name),
                        RibArg::Strs(data),
                        RibArg::floats(*bounds),
                    ],
                    &none,
                )
            }
            RenderableKind::Mesh(_)
            | RenderableKind::Light(_)
            | RenderableKind::Camera(_)
            | RenderableKind::Atmosphere(_) => Ok(()),
        }
    }

    fn write_mesh<W: Write>(
        &mut self,
        w: &mut RibWriter<W>,
        r: &Renderable,
        mesh: &MeshGeometry,
    ) -> RibResult<()> {
        let material = |part: &MeshPart| part.material.and_then(|i| r.materials.get(i));
        if let [part] = mesh.parts.as_slice() {
            if let Some(m) = material(part) {
                self.write_material(w, m)?;
            }
            return write_mesh_part(w, self.frame, mesh, part);
        }
        for part in &mesh.parts {
            w.open_block(BlockKind::Attribute, &[])?;
            if let Some(m) = material(part) {
                self.write_material(w, m)?;
            }
            write_mesh_part(w, self.frame, mesh, part)?;
            w.close_block(BlockKind::Attribute)?;
        }
        Ok(())
    }

    fn write_particles<W: Write>(
        &mut self,
        w: &mut RibWriter<W>,
        r: &Renderable,
        p: &ParticleGeometry,
    ) -> RibResult<()> {
        match &p.style {
            ParticleStyle::Points {
                point_type,
                constant_width,
            } => {
                let mut extra = ParamList::new();
                match constant_width {
                    Some(width) => {
                        extra.float(Some(Detail::Constant), "constantwidth", *width);
                    }
                    None => {
                        extra.floats(Some(Detail::Varying), "float", "width", p.widths.iter().copied());
                    }
                }
                if let Some(ty) = point_type {
                    extra.string(Some(Detail::Uniform), "type", *ty);
                }
                push_prim_vars(&mut extra, &p.prim_vars, None);
                write_points(w, self.frame, &p.positions, &extra)
            }
            ParticleStyle::Instance { handle, geometry } => {
                w.open_block(BlockKind::Object, &[RibArg::str(handle)])?;
                for part in &geometry.parts {
                    write_mesh_part(w, self.frame, geometry, part)?;
                }
                w.close_block(BlockKind::Object)?;

                let count = p.positions.first().map_or(0, |s| s.value.len());
                tracing::debug!(entity = %r.name, count, "instancing particles");
                for i in 0..count {
                    let width = p.widths.get(i).copied().unwrap_or(1.0);
                    let placement: Motion<Mat4> = p
                        .positions
                        .iter()
                        .map(|s| MotionSample {
                            time: s.time,
                            value: Mat4::from_translation(Vec3::from_array(s.value[i]))
                                * Mat4::from_scale(Vec3::splat(width)),
                        })
                        .collect();
                    w.open_block(BlockKind::Attribute, &[])?;
                    self.write_transform(w, &placement, false)?;
                    w.write_leaf(
                        "ObjectInstance",
                        &[RibArg::str(handle)],
                        &ParamList::new(),
                    )?;
                    w.close_block(BlockKind::Attribute)?;
                }
                Ok(())
            }
        }
    }

    fn write_material<W: Write>(
        &mut self,
        w: &mut RibWriter<W>,
        m: &MaterialBinding,
    ) -> RibResult<()> {
        let none = ParamList::new();
        w.write_leaf("Color", &[RibArg::floats(m.color)], &none)?;
        w.write_leaf("Opacity", &[RibArg::floats(m.opacity)], &none)?;
        for shader in &m.shaders {
            self.write_shader(w, shader)?;
        }
        if m.shaders.iter().any(|s| s.kind == ShaderKind::Displacement) {
            let mut bound = ParamList::new();
            bound.float(None, "sphere", m.displacement_bound);
            w.write_attribute("displacementbound", &bound)?;
        }
        Ok(())
    }

    fn write_shader<W: Write>(
        &mut self,
        w: &mut RibWriter<W>,
        shader: &ShaderBinding,
    ) -> RibResult<()> {
        let params = self.shader_params(shader);
        w.write_leaf(shader.kind.request(), &[RibArg::str(&shader.shader)], &params)
    }

    /// Typed shader parameters; texture references resolve to optimized paths on first use.
    fn shader_params(&mut self, shader: &ShaderBinding) -> ParamList {
        let uniform = Some(Detail::Uniform);
        let mut p = ParamList::new();
        for (name, value) in &shader.params {
            match value {
                ParamValue::Float(v) => {
                    p.float(uniform, name, *v);
                }
                ParamValue::Color(v) => {
                    p.floats(uniform, "color", name, *v);
                }
                ParamValue::Point(v) => {
                    p.floats(uniform, "point", name, *v);
                }
                ParamValue::Vector(v) => {
                    p.floats(uniform, "vector", name, *v);
                }
                ParamValue::Normal(v) => {
                    p.floats(uniform, "normal", name, *v);
                }
                ParamValue::String(v) => {
                    p.string(uniform, name, v.clone());
                }
                ParamValue::Texture(texture) => {
                    let path = self.textures.resolve(
                        self.scene,
                        self.optimizer,
                        texture,
                        self.frame,
                        self.report,
                    );
                    p.string(uniform, name, path);
                }
            }
        }
        p
    }

    /// `ConcatTransform` per sample, at frame-relative times.
    fn write_transform<W: Write>(
        &self,
        w: &mut RibWriter<W>,
        motion: &Motion<Mat4>,
        invert: bool,
    ) -> RibResult<()> {
        let times = relative_times(motion, self.frame);
        w.write_motion(&times, |w, i| {
            let m = if invert {
                motion[i].value.inverse()
            } else {
                motion[i].value
            };
            w.write_leaf(
                "ConcatTransform",
                &[RibArg::floats(m.to_cols_array())],
                &ParamList::new(),
            )
        })
    }
}

/// Sample times relative to the frame, as written in `MotionBegin`.
pub fn relative_times<T>(motion: &Motion<T>, frame: Frame) -> Vec<f64> {
    let base = frame.as_time();
    motion.iter().map(|s| s.time - base).collect()
}

/// Perspective field of view in degrees, measured across the image's shorter side.
pub fn perspective_fov(cam: &CameraDef, xres: f64, yres: f64) -> f64 {
    let lens = f64::from(cam.lens).max(1e-6);
    let half = f64::from(cam.sensor_width) / 2.0 / lens;
    let ratio = if xres >= yres { yres / xres } else { xres / yres };
    2.0 * (half * ratio).atan().to_degrees()
}

fn write_identifier<W: Write>(w: &mut RibWriter<W>, name: &str) -> RibResult<()> {
    let mut p = ParamList::new();
    p.string(None, "name", name);
    w.write_attribute("identifier", &p)
}

fn write_visibility<W: Write>(w: &mut RibWriter<W>, v: &VisibilityDef) -> RibResult<()> {
    let mut vis = ParamList::new();
    vis.flag("camera", v.camera)
        .flag("diffuse", v.trace_diffuse)
        .flag("specular", v.trace_specular)
        .flag("transmission", v.trace_transmission)
        .flag("photon", v.photons);
    w.write_attribute("visibility", &vis)?;

    let mut shade = ParamList::new();
    shade
        .string(None, "diffusehitmode", v.diffuse_hitmode.as_str())
        .string(None, "specularhitmode", v.specular_hitmode.as_str())
        .string(None, "transmissionhitmode", v.transmission_hitmode.as_str());
    w.write_attribute("shade", &shade)?;

    let mut trace = ParamList::new();
    trace
        .flag("displacements", v.trace_displacements)
        .flag("samplemotion", v.trace_samplemotion);
    w.write_attribute("trace", &trace)?;

    if v.matte {
        w.write_leaf("Matte", &[RibArg::Int(1)], &ParamList::new())?;
    }
    Ok(())
}

fn write_shading<W: Write>(w: &mut RibWriter<W>, s: &ShadingDef) -> RibResult<()> {
    let none = ParamList::new();
    if let Some(rate) = s.shading_rate {
        w.write_leaf("ShadingRate", &[RibArg::from(rate)], &none)?;
    }
    w.write_leaf(
        "ShadingInterpolation",
        &[RibArg::str(s.interpolation.as_str())],
        &none,
    )?;
    w.write_leaf(
        "GeometricApproximation",
        &[
            RibArg::str("motionfactor"),
            RibArg::from(s.geometric_approx_motion),
        ],
        &none,
    )?;
    if s.geometric_approx_focus >= 0.0 {
        w.write_leaf(
            "GeometricApproximation",
            &[
                RibArg::str("focusfactor"),
                RibArg::from(s.geometric_approx_focus),
            ],
            &none,
        )?;
    }
    Ok(())
}

/// `PointsPolygons` for one material part, one request per deformation sample.
fn write_mesh_part<W: Write>(
    w: &mut RibWriter<W>,
    frame: Frame,
    mesh: &MeshGeometry,
    part: &MeshPart,
) -> RibResult<()> {
    let mut vars = ParamList::new();
    push_prim_vars(&mut vars, &mesh.prim_vars, Some(&part.corners));
    let times = relative_times(&mesh.points, frame);
    w.write_motion(&times, |w, i| {
        let mut params = ParamList::new();
        params.push("P", ParamValues::Floats(flatten_points(&mesh.points[i].value)));
        for v in vars.iter() {
            params.push(v.decl.clone(), v.values.clone());
        }
        w.write_leaf(
            "PointsPolygons",
            &[
                RibArg::Ints(part.nverts.clone()),
                RibArg::Ints(part.verts.clone()),
            ],
            &params,
        )
    })
}

fn write_points<W: Write>(
    w: &mut RibWriter<W>,
    frame: Frame,
    points: &Motion<Vec<[f32; 3]>>,
    extra: &ParamList,
) -> RibResult<()> {
    let times = relative_times(points, frame);
    w.write_motion(&times, |w, i| {
        let mut params = ParamList::new();
        params.push("P", ParamValues::Floats(flatten_points(&points[i].value)));
        for v in extra.iter() {
            params.push(v.decl.clone(), v.values.clone());
        }
        w.write_leaf("Points", &[], &params)
    })
}

/// Append primitive variables; face-varying data is restricted to `corners` when given.
fn push_prim_vars(dst: &mut ParamList, vars: &[PrimVar], corners: Option<&[usize]>) {
    for v in vars {
        let values: Vec<f64> = match (v.detail, corners) {
            (Detail::FaceVarying, Some(corners)) => corners
                .iter()
                .flat_map(|&c| {
                    v.values
                        .get(c * v.arity..(c + 1) * v.arity)
                        .unwrap_or_default()
                        .iter()
                        .copied()
                })
                .collect(),
            _ => v.values.clone(),
        };
        dst.floats(Some(v.detail), v.ty, &v.name, values);
    }
}

fn flatten_points(points: &[[f32; 3]]) -> Vec<f64> {
    points.iter().flat_map(|p| p.map(f64::from)).collect()
}

#[cfg(test)]
#[path = "../../tests/unit/export/emit.rs"]
mod tests;

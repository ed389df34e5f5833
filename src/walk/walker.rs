use crate::{
    foundation::core::{Frame, Mat4, Shutter},
    foundation::error::{RibError, RibResult},
    foundation::issue::ExportIssue,
    paths::resolver::PathResolver,
    scene::anim::{sample_particles, sample_points},
    scene::model::{
        GeometrySource, MeshDef, ObjectData, ObjectDef, ParticleSystemDef, ParticleType,
        PrimitiveDef, ProceduralBounds, SceneSnapshot, ShadingDef, VisibilityDef,
    },
    sequence::samples::{SampleTimes, plan_samples},
    walk::primvars::{mesh_prim_vars, particle_prim_vars},
    walk::renderable::{
        LightData, MaterialBinding, MeshGeometry, MeshPart, Motion, MotionSample,
        ParticleGeometry, ParticleStyle, ProceduralKind, Quadric, Renderable, RenderableKind,
        collapse_static,
    },
    walk::renderable::ShaderKind,
    walk::shaders::{ShaderTypeCache, bind_light, bind_material, bind_shader},
};
use std::collections::BTreeMap;

/// Which entities a collection includes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Selection {
    /// Full scene: active camera, world atmosphere, lights and geometry.
    All,
    /// Archive export: only these objects and their dependencies.
    Objects(Vec<String>),
}

/// Motion sampling inputs for one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameSamples {
    /// Frame being exported.
    pub frame: Frame,
    /// Shutter interval and efficiency.
    pub shutter: Shutter,
    /// Default motion sample count.
    pub segments: u32,
    /// Motion blur enabled.
    pub motion: bool,
    times: SampleTimes,
}

impl FrameSamples {
    /// Plan default sample times for `frame`.
    pub fn new(frame: Frame, shutter: Shutter, segments: u32, motion: bool) -> Self {
        let mut s = Self {
            frame,
            shutter,
            segments,
            motion,
            times: SampleTimes::new(),
        };
        s.times = s.times_for(None);
        s
    }

    /// Sampling for `frame` from the scene's render settings.
    pub fn from_scene(scene: &SceneSnapshot, frame: Frame, motion_allowed: bool) -> Self {
        Self::new(
            frame,
            scene.shutter(),
            scene.settings.motion_segments,
            scene.settings.motion_blur && motion_allowed,
        )
    }

    /// Default sample times.
    pub fn times(&self) -> &SampleTimes {
        &self.times
    }

    /// Sample times with an optional per-object segment override.
    pub fn times_for(&self, segments_override: Option<u32>) -> SampleTimes {
        if !self.motion {
            return plan_samples(self.frame.as_time(), 0.0, 0.0, 1, 1.0, 1.0);
        }
        plan_samples(
            self.frame.as_time(),
            self.shutter.open,
            self.shutter.close,
            segments_override.unwrap_or(self.segments),
            self.shutter.efficiency_open,
            self.shutter.efficiency_close,
        )
    }
}

/// Renderables for one frame plus entity-local issues.
#[derive(Debug, Default)]
pub struct Collection {
    /// Renderables in export order.
    pub renderables: Vec<Renderable>,
    /// Entity-local errors; the affected entity or variable was skipped.
    pub issues: Vec<ExportIssue>,
    /// Degraded but exported data (inferred or dropped shader parameters, excluded selections).
    pub warnings: Vec<ExportIssue>,
}

/// Deterministic traversal of a scene snapshot into typed renderables.
pub struct SceneWalker<'a> {
    scene: &'a SceneSnapshot,
    resolver: &'a PathResolver,
    shaders: &'a mut ShaderTypeCache,
}

impl<'a> SceneWalker<'a> {
    /// Create a walker sharing the session's shader type cache.
    pub fn new(
        scene: &'a SceneSnapshot,
        resolver: &'a PathResolver,
        shaders: &'a mut ShaderTypeCache,
    ) -> Self {
        Self {
            scene,
            resolver,
            shaders,
        }
    }

    /// Collect renderables for one frame.
    ///
    /// Objects come in scene-list order, each followed by its particle systems. Motion topology
    /// mismatches are returned as errors since they invalidate the whole frame.
    #[tracing::instrument(skip_all, fields(frame = samples.frame.0))]
    pub fn collect(
        &mut self,
        selection: &Selection,
        samples: &FrameSamples,
    ) -> RibResult<Collection> {
        let mut out = Collection::default();
        let frame = samples.frame;

        if let Selection::Objects(names) = selection {
            for name in names {
                if self.scene.object(name).is_none() {
                    out.issues.push(
                        ExportIssue::new(RibError::validation(format!(
                            "selected object '{name}' does not exist"
                        )))
                        .at_frame(frame)
                        .for_entity(name.as_str()),
                    );
                }
            }
        }

        if *selection == Selection::All
            && let Some(world) = &self.scene.world
            && let Some(atmo) = &world.atmosphere
        {
            let b = bind_shader(self.scene, self.shaders, ShaderKind::Atmosphere, atmo);
            push_warnings(&mut out.warnings, frame, "world", b.warnings);
            out.renderables.push(Renderable {
                name: "world".to_owned(),
                kind: RenderableKind::Atmosphere(b.value),
                transform: static_transform(frame, Mat4::IDENTITY),
                materials: Vec::new(),
                visibility: VisibilityDef::default(),
                shading: ShadingDef::default(),
                export_coordsys: false,
                archive_output: None,
            });
        }

        let active_camera = self.scene.camera.as_deref();
        for obj in &self.scene.objects {
            match selection {
                Selection::All => {
                    if matches!(obj.data, ObjectData::Camera(_))
                        && active_camera != Some(obj.name.as_str())
                    {
                        continue;
                    }
                }
                Selection::Objects(names) => {
                    if !names.iter().any(|n| n == &obj.name) {
                        continue;
                    }
                    if matches!(obj.data, ObjectData::Camera(_)) {
                        out.warnings.push(
                            ExportIssue::new(RibError::validation(
                                "cameras are not exported to archives",
                            ))
                            .at_frame(frame)
                            .for_entity(obj.name.as_str()),
                        );
                        continue;
                    }
                }
            }

            let times = samples.times_for(obj.motion_segments_override);
            let (materials, slot_map) = self.bind_slots(obj, frame, &mut out);
            let own = self.object_renderable(
                obj,
                &times,
                materials.clone(),
                &slot_map,
                frame,
                &mut out,
            )?;
            if let Some(r) = own {
                tracing::debug!(entity = %r.name, kind = r.kind.label(), "collected");
                out.renderables.push(r);
            }
            for psys in &obj.particle_systems {
                let particles = self.particle_renderable(
                    obj, psys, &times, &materials, &slot_map, frame, &mut out,
                )?;
                if let Some(r) = particles {
                    tracing::debug!(entity = %r.name, kind = r.kind.label(), "collected");
                    out.renderables.push(r);
                }
            }
        }

        Ok(out)
    }

    fn bind_slots(
        &mut self,
        obj: &ObjectDef,
        frame: Frame,
        out: &mut Collection,
    ) -> (Vec<MaterialBinding>, Vec<Option<usize>>) {
        let mut bound: BTreeMap<&str, usize> = BTreeMap::new();
        let mut materials = Vec::new();
        let mut slot_map = Vec::with_capacity(obj.material_slots.len());
        for slot in &obj.material_slots {
            if let Some(&idx) = bound.get(slot.as_str()) {
                slot_map.push(Some(idx));
                continue;
            }
            match self.scene.materials.get(slot) {
                Some(def) => {
                    let b = bind_material(self.scene, self.shaders, slot, def);
                    push_warnings(&mut out.warnings, frame, &obj.name, b.warnings);
                    bound.insert(slot.as_str(), materials.len());
                    slot_map.push(Some(materials.len()));
                    materials.push(b.value);
                }
                None => {
                    out.issues.push(
                        ExportIssue::new(RibError::missing_data(&obj.name, slot))
                            .at_frame(frame)
                            .for_entity(obj.name.as_str()),
                    );
                    slot_map.push(None);
                }
            }
        }
        (materials, slot_map)
    }

    fn object_renderable(
        &mut self,
        obj: &ObjectDef,
        times: &SampleTimes,
        materials: Vec<MaterialBinding>,
        slot_map: &[Option<usize>],
        frame: Frame,
        out: &mut Collection,
    ) -> RibResult<Option<Renderable>> {
        let transform = collapse_static(
            times
                .iter()
                .map(|&t| MotionSample {
                    time: t,
                    value: obj.transform.sample(t).to_mat4(),
                })
                .collect(),
        );

        let mut archive_output = None;
        let kind = match &obj.data {
            ObjectData::Camera(cam) => RenderableKind::Camera(cam.clone()),
            ObjectData::Lamp(lamp) => {
                let b = bind_light(self.scene, self.shaders, lamp);
                push_warnings(&mut out.warnings, frame, &obj.name, b.warnings);
                return Ok(Some(Renderable {
                    name: obj.name.clone(),
                    kind: RenderableKind::Light(LightData {
                        handle: obj.name.clone(),
                        shader: b.value,
                    }),
                    transform: transform.into_iter().take(1).collect(),
                    materials: Vec::new(),
                    visibility: obj.visibility.clone(),
                    shading: obj.shading.clone(),
                    export_coordsys: obj.export_coordsys,
                    archive_output: None,
                }));
            }
            ObjectData::Mesh(_) | ObjectData::Empty => {
                let Some(kind) = self.geometry_kind(obj, times, slot_map, frame, out)? else {
                    return Ok(None);
                };
                if obj.export_archive
                    && matches!(
                        obj.geometry_source,
                        GeometrySource::SceneData | GeometrySource::Primitive { .. }
                    )
                {
                    match self.resolver.resolve_archive_path(obj, frame) {
                        Ok(p) => archive_output = Some(p),
                        Err(e) => out.issues.push(
                            ExportIssue::new(e)
                                .at_frame(frame)
                                .for_entity(obj.name.as_str()),
                        ),
                    }
                }
                kind
            }
        };

        Ok(Some(Renderable {
            name: obj.name.clone(),
            kind,
            transform,
            materials,
            visibility: obj.visibility.clone(),
            shading: obj.shading.clone(),
            export_coordsys: obj.export_coordsys,
            archive_output,
        }))
    }

    fn geometry_kind(
        &mut self,
        obj: &ObjectDef,
        times: &SampleTimes,
        slot_map: &[Option<usize>],
        frame: Frame,
        out: &mut Collection,
    ) -> RibResult<Option<RenderableKind>> {
        let mesh = match &obj.data {
            ObjectData::Mesh(m) => Some(m),
            _ => None,
        };
        let local_issue = |out: &mut Collection, e: RibError| {
            out.issues.push(
                ExportIssue::new(e)
                    .at_frame(frame)
                    .for_entity(obj.name.as_str()),
            );
        };

        Ok(Some(match &obj.geometry_source {
            GeometrySource::SceneData => match mesh {
                Some(m) => {
                    let (geom, missing) = mesh_geometry(obj, m, times, slot_map)?;
                    for e in missing {
                        local_issue(out, e);
                    }
                    RenderableKind::Mesh(geom)
                }
                None => return Ok(None),
            },
            GeometrySource::Primitive {
                primitive: PrimitiveDef::Points { width },
            } => match mesh {
                Some(m) => RenderableKind::PointCloud {
                    points: deformed_points(obj, m, times)?,
                    width: *width,
                },
                None => {
                    local_issue(out, RibError::missing_data(&obj.name, "points"));
                    return Ok(None);
                }
            },
            GeometrySource::Primitive { primitive } => {
                let Some(quadric) = Quadric::from_primitive(primitive) else {
                    return Ok(None);
                };
                RenderableKind::Quadric(quadric)
            }
            GeometrySource::Archive { .. } => match self.resolver.resolve_archive_path(obj, frame) {
                Ok(path) => RenderableKind::Archive { path },
                Err(e) => {
                    local_issue(out, e);
                    return Ok(None);
                }
            },
            GeometrySource::DelayedLoadArchive { bounds, .. } => {
                let path = match self.resolver.resolve_archive_path(obj, frame) {
                    Ok(p) => p,
                    Err(e) => {
                        local_issue(out, e);
                        return Ok(None);
                    }
                };
                let Some(bounds) = procedural_bounds(obj, mesh, bounds, out, frame) else {
                    return Ok(None);
                };
                RenderableKind::Procedural {
                    kind: ProceduralKind::DelayedReadArchive { path },
                    bounds,
                }
            }
            GeometrySource::RunProgram {
                program,
                args,
                bounds,
            } => {
                let Some(bounds) = procedural_bounds(obj, mesh, bounds, out, frame) else {
                    return Ok(None);
                };
                RenderableKind::Procedural {
                    kind: ProceduralKind::RunProgram {
                        program: program.clone(),
                        args: args.clone(),
                    },
                    bounds,
                }
            }
            GeometrySource::DynamicLoadDso {
                dso,
                initial_data,
                bounds,
            } => {
                let Some(bounds) = procedural_bounds(obj, mesh, bounds, out, frame) else {
                    return Ok(None);
                };
                RenderableKind::Procedural {
                    kind: ProceduralKind::DynamicLoad {
                        dso: dso.clone(),
                        initial_data: initial_data.clone(),
                    },
                    bounds,
                }
            }
        }))
    }

    #[allow(clippy::too_many_arguments)]
    fn particle_renderable(
        &mut self,
        obj: &ObjectDef,
        psys: &ParticleSystemDef,
        times: &SampleTimes,
        materials: &[MaterialBinding],
        slot_map: &[Option<usize>],
        frame: Frame,
        out: &mut Collection,
    ) -> RibResult<Option<Renderable>> {
        let entity = format!("{}:{}", obj.name, psys.name);
        let mut positions: Motion<Vec<[f32; 3]>> = Vec::with_capacity(times.len());
        let mut first = Vec::new();
        for (i, &t) in times.iter().enumerate() {
            let particles = sample_particles(&psys.keys, t);
            if let Some(expected) = positions.first().map(|s| s.value.len())
                && particles.len() != expected
            {
                return Err(RibError::MotionTopology {
                    entity,
                    expected,
                    found: particles.len(),
                });
            }
            positions.push(MotionSample {
                time: t,
                value: particles.iter().map(|p| p.location).collect(),
            });
            if i == 0 {
                first = particles;
            }
        }
        if first.is_empty() {
            tracing::debug!(entity = %entity, "no live particles, skipped");
            return Ok(None);
        }

        let settings = &psys.settings;
        let style = match &settings.particle_type {
            ParticleType::Points => ParticleStyle::Points {
                point_type: None,
                constant_width: settings.constant_width.then_some(settings.width),
            },
            ParticleType::Sphere => ParticleStyle::Points {
                point_type: Some("sphere"),
                constant_width: settings.constant_width.then_some(settings.width),
            },
            ParticleType::Disk => ParticleStyle::Points {
                point_type: Some("disk"),
                constant_width: settings.constant_width.then_some(settings.width),
            },
            ParticleType::Object { instance_object } => {
                let instance = self.scene.object(instance_object).and_then(|o| match &o.data {
                    ObjectData::Mesh(m) => Some((o, m)),
                    _ => None,
                });
                let Some((inst_obj, inst_mesh)) = instance else {
                    out.issues.push(
                        ExportIssue::new(RibError::missing_data(&entity, instance_object))
                            .at_frame(frame)
                            .for_entity(entity.as_str()),
                    );
                    return Ok(None);
                };
                let still: SampleTimes = times.iter().take(1).copied().collect();
                let (geometry, missing) = mesh_geometry(inst_obj, inst_mesh, &still, &[])?;
                push_warnings(&mut out.warnings, frame, &entity, missing);
                ParticleStyle::Instance {
                    handle: format!("{entity}:{instance_object}"),
                    geometry,
                }
            }
        };

        let (prim_vars, missing) = particle_prim_vars(&entity, &settings.prim_vars, &first);
        for e in missing {
            out.issues.push(
                ExportIssue::new(e)
                    .at_frame(frame)
                    .for_entity(entity.as_str()),
            );
        }

        let material = usize::try_from(settings.material_id)
            .ok()
            .and_then(|id| id.checked_sub(1))
            .and_then(|slot| slot_map.get(slot).copied().flatten())
            .and_then(|idx| materials.get(idx).cloned());

        Ok(Some(Renderable {
            name: entity,
            kind: RenderableKind::Particles(ParticleGeometry {
                positions: collapse_static(positions),
                widths: first.iter().map(|p| p.size).collect(),
                style,
                prim_vars,
            }),
            transform: static_transform(frame, Mat4::IDENTITY),
            materials: material.into_iter().collect(),
            visibility: obj.visibility.clone(),
            shading: obj.shading.clone(),
            export_coordsys: false,
            archive_output: None,
        }))
    }
}

fn static_transform(frame: Frame, m: Mat4) -> Motion<Mat4> {
    vec![MotionSample {
        time: frame.as_time(),
        value: m,
    }]
}

fn push_warnings(dst: &mut Vec<ExportIssue>, frame: Frame, entity: &str, errs: Vec<RibError>) {
    dst.extend(
        errs.into_iter()
            .map(|e| ExportIssue::new(e).at_frame(frame).for_entity(entity)),
    );
}

/// Deformed point positions per sample time, collapsed when static.
fn deformed_points(
    obj: &ObjectDef,
    mesh: &MeshDef,
    times: &SampleTimes,
) -> RibResult<Motion<Vec<[f32; 3]>>> {
    let samples = times
        .iter()
        .map(|&t| {
            Ok(MotionSample {
                time: t,
                value: sample_points(&obj.name, &mesh.points, &mesh.deform_keys, t)?,
            })
        })
        .collect::<RibResult<Vec<_>>>()?;
    Ok(collapse_static(samples))
}

/// Mesh geometry with faces grouped by material slot, in ascending slot order.
pub(crate) fn mesh_geometry(
    obj: &ObjectDef,
    mesh: &MeshDef,
    times: &SampleTimes,
    slot_map: &[Option<usize>],
) -> RibResult<(MeshGeometry, Vec<RibError>)> {
    let points = deformed_points(obj, mesh, times)?;

    let mut groups: BTreeMap<u32, MeshPart> = BTreeMap::new();
    let mut corner = 0usize;
    for (fi, face) in mesh.faces.iter().enumerate() {
        let slot = mesh.face_materials.get(fi).copied().unwrap_or(0);
        let part = groups.entry(slot).or_insert_with(|| MeshPart {
            material: slot_map.get(slot as usize).copied().flatten(),
            nverts: Vec::new(),
            verts: Vec::new(),
            corners: Vec::new(),
        });
        part.nverts.push(face.len() as i64);
        part.verts.extend(face.iter().map(|&v| i64::from(v)));
        part.corners.extend(corner..corner + face.len());
        corner += face.len();
    }

    let (prim_vars, missing) = mesh_prim_vars(obj, mesh);
    Ok((
        MeshGeometry {
            points,
            parts: groups.into_values().collect(),
            prim_vars,
        },
        missing,
    ))
}

fn procedural_bounds(
    obj: &ObjectDef,
    mesh: Option<&MeshDef>,
    bounds: &ProceduralBounds,
    out: &mut Collection,
    frame: Frame,
) -> Option<[f32; 6]> {
    match bounds {
        ProceduralBounds::Manual { min, max } => {
            Some([min[0], max[0], min[1], max[1], min[2], max[2]])
        }
        ProceduralBounds::Auto => {
            let pts = mesh.map(|m| m.points.as_slice()).filter(|p| !p.is_empty());
            let Some(pts) = pts else {
                out.issues.push(
                    ExportIssue::new(RibError::missing_data(&obj.name, "points"))
                        .at_frame(frame)
                        .for_entity(obj.name.as_str()),
                );
                return None;
            };
            let mut lo = [f32::INFINITY; 3];
            let mut hi = [f32::NEG_INFINITY; 3];
            for p in pts {
                for k in 0..3 {
                    lo[k] = lo[k].min(p[k]);
                    hi[k] = hi[k].max(p[k]);
                }
            }
            Some([lo[0], hi[0], lo[1], hi[1], lo[2], hi[2]])
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/walk/walker.rs"]
mod tests;

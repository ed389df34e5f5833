use crate::{
    foundation::error::RibError,
    scene::model::{
        MeshDataSource, MeshDef, ObjectDef, ParticleDataSource, ParticleDef, ParticlePrimVarDef,
    },
    stream::params::Detail,
    walk::renderable::PrimVar,
};

/// Primitive variables of a mesh: defaults (`st`, `Cs`, `N`) then declared variables.
///
/// Unresolvable declared variables are skipped and reported; the mesh still exports.
pub fn mesh_prim_vars(object: &ObjectDef, mesh: &MeshDef) -> (Vec<PrimVar>, Vec<RibError>) {
    let mut vars = Vec::new();
    let mut missing = Vec::new();

    if mesh.export_default_uv
        && let Some(layer) = mesh.uv_layers.iter().find(|l| l.active)
    {
        vars.push(uv_var("st", &layer.uvs));
    }
    if mesh.export_default_vcol
        && let Some(layer) = mesh.vertex_colors.iter().find(|l| l.active)
    {
        vars.push(color_var("Cs", &layer.colors));
    }
    if mesh.export_smooth_normals && !mesh.normals.is_empty() {
        vars.push(PrimVar {
            name: "N".to_owned(),
            detail: Detail::Varying,
            ty: "normal",
            values: flatten3(&mesh.normals),
            arity: 3,
        });
    }

    for decl in &mesh.prim_vars {
        let found = match decl.data_source {
            MeshDataSource::UvTexture => mesh
                .uv_layers
                .iter()
                .find(|l| l.name == decl.data_name)
                .map(|l| uv_var(&decl.name, &l.uvs)),
            MeshDataSource::VertexColor => mesh
                .vertex_colors
                .iter()
                .find(|l| l.name == decl.data_name)
                .map(|l| color_var(&decl.name, &l.colors)),
            MeshDataSource::VertexGroup => object
                .vertex_groups
                .iter()
                .find(|g| g.name == decl.data_name)
                .map(|g| PrimVar {
                    name: decl.name.clone(),
                    detail: Detail::Vertex,
                    ty: "float",
                    values: g.weights.iter().copied().map(f64::from).collect(),
                    arity: 1,
                }),
        };
        match found {
            Some(v) => vars.push(v),
            None => missing.push(RibError::missing_data(&object.name, &decl.data_name)),
        }
    }
    (vars, missing)
}

/// Primitive variables of a particle system, read from the first motion sample's particles.
pub fn particle_prim_vars(
    entity: &str,
    decls: &[ParticlePrimVarDef],
    particles: &[ParticleDef],
) -> (Vec<PrimVar>, Vec<RibError>) {
    let mut vars = Vec::new();
    let mut missing = Vec::new();
    for decl in decls {
        let var = match decl.data_source {
            ParticleDataSource::Size => {
                scalar_var(&decl.name, particles.iter().map(|p| Some(p.size)))
            }
            ParticleDataSource::Age => scalar_var(&decl.name, particles.iter().map(|p| p.age)),
            ParticleDataSource::Lifetime => {
                scalar_var(&decl.name, particles.iter().map(|p| p.lifetime))
            }
            ParticleDataSource::Velocity => particles
                .iter()
                .map(|p| p.velocity)
                .collect::<Option<Vec<_>>>()
                .map(|v| PrimVar {
                    name: decl.name.clone(),
                    detail: Detail::Varying,
                    ty: "vector",
                    values: flatten3(&v),
                    arity: 3,
                }),
        };
        match var {
            Some(v) => vars.push(v),
            None => missing.push(RibError::missing_data(
                entity,
                source_label(decl.data_source),
            )),
        }
    }
    (vars, missing)
}

fn scalar_var<I>(name: &str, values: I) -> Option<PrimVar>
where
    I: Iterator<Item = Option<f32>>,
{
    let values = values
        .map(|v| v.map(f64::from))
        .collect::<Option<Vec<_>>>()?;
    Some(PrimVar {
        name: name.to_owned(),
        detail: Detail::Varying,
        ty: "float",
        values,
        arity: 1,
    })
}

fn source_label(src: ParticleDataSource) -> &'static str {
    match src {
        ParticleDataSource::Size => "size",
        ParticleDataSource::Velocity => "velocity",
        ParticleDataSource::Age => "age",
        ParticleDataSource::Lifetime => "lifetime",
    }
}

fn uv_var(name: &str, uvs: &[[f32; 2]]) -> PrimVar {
    PrimVar {
        name: name.to_owned(),
        detail: Detail::FaceVarying,
        ty: "float[2]",
        values: uvs
            .iter()
            .flat_map(|[u, v]| [f64::from(*u), 1.0 - f64::from(*v)])
            .collect(),
        arity: 2,
    }
}

fn color_var(name: &str, colors: &[[f32; 3]]) -> PrimVar {
    PrimVar {
        name: name.to_owned(),
        detail: Detail::FaceVarying,
        ty: "color",
        values: flatten3(colors),
        arity: 3,
    }
}

pub(crate) fn flatten3(v: &[[f32; 3]]) -> Vec<f64> {
    v.iter().flat_map(|p| p.map(f64::from)).collect()
}

#[cfg(test)]
#[path = "../../tests/unit/walk/primvars.rs"]
mod tests;

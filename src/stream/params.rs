use crate::stream::format::{push_float_array, push_int_array, push_string_array, quote};

/// Storage class of an inline parameter declaration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Detail {
    /// One value for the whole primitive.
    Constant,
    /// One value per face.
    Uniform,
    /// One value per vertex, linearly interpolated.
    Varying,
    /// One value per vertex, interpolated like positions.
    Vertex,
    /// One value per face corner.
    FaceVarying,
}

impl Detail {
    /// Keyword used in declarations.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Constant => "constant",
            Self::Uniform => "uniform",
            Self::Varying => "varying",
            Self::Vertex => "vertex",
            Self::FaceVarying => "facevarying",
        }
    }
}

/// Value payload of one parameter.
#[derive(Clone, Debug, PartialEq)]
pub enum ParamValues {
    /// Float tuple data (float, color, point, vector, normal, matrix).
    Floats(Vec<f64>),
    /// Integer data.
    Ints(Vec<i64>),
    /// String data.
    Strings(Vec<String>),
}

/// One parameter with its inline declaration, e.g. `"uniform float Ks" [0.5]`.
#[derive(Clone, Debug, PartialEq)]
pub struct Param {
    /// Full inline declaration.
    pub decl: String,
    /// Values.
    pub values: ParamValues,
}

/// Ordered parameter list appended to a request.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParamList {
    params: Vec<Param>,
}

/// Build an inline declaration `"[detail ]type name"`.
pub fn declaration(detail: Option<Detail>, ty: &str, name: &str) -> String {
    match detail {
        Some(d) => format!("{} {ty} {name}", d.as_str()),
        None => format!("{ty} {name}"),
    }
}

impl ParamList {
    /// Empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Return `true` when the list has no parameters.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Parameters in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Param> {
        self.params.iter()
    }

    /// Append a parameter with an explicit declaration.
    pub fn push(&mut self, decl: impl Into<String>, values: ParamValues) -> &mut Self {
        self.params.push(Param {
            decl: decl.into(),
            values,
        });
        self
    }

    /// Append float tuple data of type `ty` (`float`, `color`, `point`, `float[2]`, ...).
    pub fn floats<I>(&mut self, detail: Option<Detail>, ty: &str, name: &str, values: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Into<f64>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.push(declaration(detail, ty, name), ParamValues::Floats(values))
    }

    /// Append a single float.
    pub fn float(&mut self, detail: Option<Detail>, name: &str, v: impl Into<f64>) -> &mut Self {
        self.floats(detail, "float", name, [v.into()])
    }

    /// Append a color.
    pub fn color(&mut self, detail: Option<Detail>, name: &str, rgb: [f32; 3]) -> &mut Self {
        self.floats(detail, "color", name, rgb)
    }

    /// Append a single integer.
    pub fn int(&mut self, name: &str, v: i64) -> &mut Self {
        self.push(declaration(None, "integer", name), ParamValues::Ints(vec![v]))
    }

    /// Append a boolean as a 0/1 integer.
    pub fn flag(&mut self, name: &str, v: bool) -> &mut Self {
        self.int(name, i64::from(v))
    }

    /// Append a single string.
    pub fn string(&mut self, detail: Option<Detail>, name: &str, v: impl Into<String>) -> &mut Self {
        self.push(
            declaration(detail, "string", name),
            ParamValues::Strings(vec![v.into()]),
        )
    }

    /// Append this list's tokens (leading space included) to `out`.
    pub fn render_into(&self, out: &mut String) {
        for p in &self.params {
            out.push(' ');
            out.push_str(&quote(&p.decl));
            out.push(' ');
            match &p.values {
                ParamValues::Floats(v) => push_float_array(out, v.iter().copied()),
                ParamValues::Ints(v) => push_int_array(out, v.iter().copied()),
                ParamValues::Strings(v) => push_string_array(out, v.iter().map(String::as_str)),
            }
        }
    }
}

/// Positional request argument.
#[derive(Clone, Debug, PartialEq)]
pub enum RibArg {
    /// Integer token.
    Int(i64),
    /// Float token.
    Float(f64),
    /// Quoted string token.
    Str(String),
    /// Bracketed float array.
    Floats(Vec<f64>),
    /// Bracketed integer array.
    Ints(Vec<i64>),
    /// Bracketed string array.
    Strs(Vec<String>),
}

impl RibArg {
    /// String argument.
    pub fn str(s: impl Into<String>) -> Self {
        Self::Str(s.into())
    }

    /// Float array from any float-like iterator.
    pub fn floats<I>(values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<f64>,
    {
        Self::Floats(values.into_iter().map(Into::into).collect())
    }

    /// Append this argument's tokens (leading space included) to `out`.
    pub fn render_into(&self, out: &mut String) {
        out.push(' ');
        match self {
            Self::Int(v) => out.push_str(&v.to_string()),
            Self::Float(v) => out.push_str(&crate::stream::format::format_float(*v)),
            Self::Str(s) => out.push_str(&quote(s)),
            Self::Floats(v) => push_float_array(out, v.iter().copied()),
            Self::Ints(v) => push_int_array(out, v.iter().copied()),
            Self::Strs(v) => push_string_array(out, v.iter().map(String::as_str)),
        }
    }
}

impl From<f64> for RibArg {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<f32> for RibArg {
    fn from(v: f32) -> Self {
        Self::Float(f64::from(v))
    }
}

impl From<i64> for RibArg {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<&str> for RibArg {
    fn from(v: &str) -> Self {
        Self::Str(v.to_owned())
    }
}

impl From<String> for RibArg {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

use crate::{
    foundation::error::{RibError, RibResult},
    stream::format::push_float_array,
    stream::params::{ParamList, RibArg},
};
use anyhow::Context as _;
use std::io::Write;

/// Nested block kinds of the description stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockKind {
    /// `FrameBegin` / `FrameEnd`.
    Frame,
    /// `WorldBegin` / `WorldEnd`.
    World,
    /// `AttributeBegin` / `AttributeEnd`.
    Attribute,
    /// `TransformBegin` / `TransformEnd`.
    Transform,
    /// `MotionBegin` / `MotionEnd`; only opened through [`RibWriter::write_motion`].
    Motion,
    /// `ObjectBegin` / `ObjectEnd`.
    Object,
}

impl BlockKind {
    /// Opening request keyword.
    pub fn begin(self) -> &'static str {
        match self {
            Self::Frame => "FrameBegin",
            Self::World => "WorldBegin",
            Self::Attribute => "AttributeBegin",
            Self::Transform => "TransformBegin",
            Self::Motion => "MotionBegin",
            Self::Object => "ObjectBegin",
        }
    }

    /// Closing request keyword.
    pub fn end(self) -> &'static str {
        match self {
            Self::Frame => "FrameEnd",
            Self::World => "WorldEnd",
            Self::Attribute => "AttributeEnd",
            Self::Transform => "TransformEnd",
            Self::Motion => "MotionEnd",
            Self::Object => "ObjectEnd",
        }
    }
}

/// Text-encoded description stream writer with LIFO block discipline.
///
/// Every opened block must be closed exactly once, innermost first. Violations are reported as
/// [`RibError::Structural`] and leave the writer unusable for the current frame.
pub struct RibWriter<W: Write> {
    out: W,
    stack: Vec<BlockKind>,
    line: String,
    requests: u64,
    in_motion: bool,
}

impl<W: Write> RibWriter<W> {
    /// Wrap a byte sink.
    pub fn new(out: W) -> Self {
        Self {
            out,
            stack: Vec::new(),
            line: String::new(),
            requests: 0,
            in_motion: false,
        }
    }

    /// Current nesting depth.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Innermost open block.
    pub fn current_block(&self) -> Option<BlockKind> {
        self.stack.last().copied()
    }

    /// Total leaf requests written so far.
    pub fn request_count(&self) -> u64 {
        self.requests
    }

    /// Write a `#` comment line.
    pub fn comment(&mut self, text: &str) -> RibResult<()> {
        self.begin_line();
        self.line.push_str("# ");
        self.line.push_str(text);
        self.flush_line()
    }

    /// Open a block with positional arguments, e.g. `FrameBegin 1`.
    pub fn open_block(&mut self, kind: BlockKind, args: &[RibArg]) -> RibResult<()> {
        if kind == BlockKind::Motion {
            return Err(RibError::structural(
                "motion blocks are opened through write_motion",
            ));
        }
        self.reject_in_motion(kind.begin())?;
        self.begin_line();
        self.line.push_str(kind.begin());
        for a in args {
            a.render_into(&mut self.line);
        }
        self.flush_line()?;
        self.stack.push(kind);
        Ok(())
    }

    /// Close the innermost block, which must be of `kind`.
    pub fn close_block(&mut self, kind: BlockKind) -> RibResult<()> {
        if kind == BlockKind::Motion {
            return Err(RibError::structural(
                "motion blocks are closed through write_motion",
            ));
        }
        self.reject_in_motion(kind.end())?;
        self.pop(kind)?;
        self.begin_line();
        self.line.push_str(kind.end());
        self.flush_line()
    }

    /// Write `Attribute "name" params...`.
    pub fn write_attribute(&mut self, name: &str, params: &ParamList) -> RibResult<()> {
        self.reject_in_motion("Attribute")?;
        self.named_request("Attribute", name, params)
    }

    /// Write `Option "name" params...`.
    pub fn write_option(&mut self, name: &str, params: &ParamList) -> RibResult<()> {
        self.reject_in_motion("Option")?;
        self.named_request("Option", name, params)
    }

    /// Write a leaf request: `Request args... params...`.
    pub fn write_leaf(&mut self, request: &str, args: &[RibArg], params: &ParamList) -> RibResult<()> {
        self.begin_line();
        self.line.push_str(request);
        for a in args {
            a.render_into(&mut self.line);
        }
        params.render_into(&mut self.line);
        self.requests += 1;
        self.flush_line()
    }

    /// Write one request per motion sample.
    ///
    /// With two or more `times` (strictly ascending), the requests are wrapped in a single
    /// `MotionBegin [t...]` / `MotionEnd` block; a single time writes its request unwrapped.
    /// `per_sample(writer, i)` must write exactly one leaf request for sample `i`.
    pub fn write_motion<F>(&mut self, times: &[f64], mut per_sample: F) -> RibResult<()>
    where
        F: FnMut(&mut Self, usize) -> RibResult<()>,
    {
        self.reject_in_motion("MotionBegin")?;
        if times.is_empty() {
            return Err(RibError::structural("motion block needs at least one sample"));
        }
        if !times.windows(2).all(|w| w[0] < w[1]) {
            return Err(RibError::structural(
                "motion sample times must be strictly ascending",
            ));
        }

        let wrapped = times.len() > 1;
        if wrapped {
            self.begin_line();
            self.line.push_str(BlockKind::Motion.begin());
            self.line.push(' ');
            push_float_array(&mut self.line, times.iter().copied());
            self.flush_line()?;
            self.stack.push(BlockKind::Motion);
        }

        self.in_motion = true;
        let result = (0..times.len()).try_for_each(|i| {
            let before = self.requests;
            per_sample(self, i)?;
            let written = self.requests - before;
            if written != 1 {
                return Err(RibError::structural(format!(
                    "motion sample {i} wrote {written} requests, expected exactly 1"
                )));
            }
            Ok(())
        });
        self.in_motion = false;
        result?;

        if wrapped {
            self.pop(BlockKind::Motion)?;
            self.begin_line();
            self.line.push_str(BlockKind::Motion.end());
            self.flush_line()?;
        }
        Ok(())
    }

    /// Verify every block is closed, flush and return the sink.
    pub fn finish(mut self) -> RibResult<W> {
        if let Some(open) = self.stack.last() {
            return Err(RibError::structural(format!(
                "{} block(s) left open at end of stream (innermost: {})",
                self.stack.len(),
                open.begin()
            )));
        }
        self.out.flush().context("flush description stream")?;
        Ok(self.out)
    }

    fn named_request(&mut self, request: &str, name: &str, params: &ParamList) -> RibResult<()> {
        self.write_leaf(request, &[RibArg::str(name)], params)
    }

    fn reject_in_motion(&self, what: &str) -> RibResult<()> {
        if self.in_motion {
            return Err(RibError::structural(format!(
                "{what} is not allowed inside a motion block"
            )));
        }
        Ok(())
    }

    fn pop(&mut self, kind: BlockKind) -> RibResult<()> {
        match self.stack.last() {
            None => Err(RibError::structural(format!(
                "{} without matching {}",
                kind.end(),
                kind.begin()
            ))),
            Some(&open) if open != kind => Err(RibError::structural(format!(
                "{} closes an open {} block",
                kind.end(),
                open.begin()
            ))),
            Some(_) => {
                self.stack.pop();
                Ok(())
            }
        }
    }

    fn begin_line(&mut self) {
        self.line.clear();
        for _ in 0..self.stack.len() {
            self.line.push_str("  ");
        }
    }

    fn flush_line(&mut self) -> RibResult<()> {
        self.line.push('\n');
        self.out
            .write_all(self.line.as_bytes())
            .context("write description stream")?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/stream/writer.rs"]
mod tests;
